//! Built-in table of resource kinds the engine knows how to look up.
//!
//! A kind listed here is not automatically verifiable: a provider still has
//! to register a [`Verifier`](crate::Verifier) for it.

use crate::ports::{Lookup, VerifyError};
use driftcheck_types::WorkItem;
use serde::Deserialize;

/// Whether any one or all of a kind's lookup attributes must be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    #[default]
    Any,
    All,
}

/// What an item lacking its identifying attributes is reported as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenMissing {
    /// Verification fails (ERROR).
    #[default]
    Fail,
    /// Left for manual verification (WARNING).
    ManualCheck,
}

/// Identifying attributes of a resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupSpec {
    pub attributes: Vec<String>,
    #[serde(default)]
    pub require: Requirement,
    /// Alternative attribute sets, tried in order when `attributes` is not
    /// satisfied. Every attribute of an alternative must be present.
    #[serde(default)]
    pub fallbacks: Vec<Vec<String>>,
    #[serde(default)]
    pub when_missing: WhenMissing,
}

impl LookupSpec {
    pub fn any(attributes: &[&str]) -> Self {
        Self::new(attributes, Requirement::Any)
    }

    pub fn all(attributes: &[&str]) -> Self {
        Self::new(attributes, Requirement::All)
    }

    fn new(attributes: &[&str], require: Requirement) -> Self {
        Self {
            attributes: owned(attributes),
            require,
            fallbacks: Vec::new(),
            when_missing: WhenMissing::Fail,
        }
    }

    /// Accept `attributes` (all of them) when the primary set is not satisfied.
    pub fn or_all(mut self, attributes: &[&str]) -> Self {
        self.fallbacks.push(owned(attributes));
        self
    }

    /// Report items without identifying attributes as needing manual checks.
    pub fn manual_when_missing(mut self) -> Self {
        self.when_missing = WhenMissing::ManualCheck;
        self
    }

    /// Collect the identifying values of `item`.
    pub fn lookup_for(&self, item: &WorkItem) -> Result<Lookup, VerifyError> {
        let primary = present_values(&self.attributes, item);
        let satisfied = match self.require {
            Requirement::Any => !primary.is_empty(),
            Requirement::All => primary.len() == self.attributes.len(),
        };

        let values = if satisfied {
            Some(primary)
        } else {
            self.fallbacks.iter().find_map(|set| {
                let values = present_values(set, item);
                (values.len() == set.len()).then_some(values)
            })
        };

        match values {
            Some(values) => Ok(Lookup {
                kind: item.kind.clone(),
                address: item.address.clone(),
                declared_id: item.declared_id.clone(),
                values,
            }),
            None if self.when_missing == WhenMissing::ManualCheck => {
                Err(VerifyError::ManualVerificationRequired {
                    kind: item.kind.clone(),
                    expected: self.attributes.clone(),
                })
            }
            None => Err(VerifyError::MissingIdentifyingAttribute {
                kind: item.kind.clone(),
                expected: self.attributes.clone(),
                all: self.require == Requirement::All,
            }),
        }
    }
}

fn owned(attributes: &[&str]) -> Vec<String> {
    attributes.iter().map(|a| a.to_string()).collect()
}

fn present_values(names: &[String], item: &WorkItem) -> Vec<(String, String)> {
    names
        .iter()
        .filter_map(|name| {
            item.attributes
                .non_empty(name)
                .map(|v| (name.clone(), v.to_string()))
        })
        .collect()
}

/// Data and local-only kinds that never need a remote check.
pub const PASSIVE_KINDS: &[&str] = &[
    "aws_caller_identity",
    "aws_iam_policy_document",
    "archive_file",
    "local_file",
    "random_password",
];

/// Data sources whose attribute states a region, checked in-process.
pub const REGION_DECLARING_KINDS: &[(&str, &str)] = &[("aws_region", "name")];

const S3_BUCKET_SUBRESOURCES: &[&str] = &[
    "aws_s3_bucket_policy",
    "aws_s3_bucket_acl",
    "aws_s3_bucket_ownership_controls",
    "aws_s3_bucket_public_access_block",
    "aws_s3_bucket_website_configuration",
    "aws_s3_bucket_cors_configuration",
    "aws_s3_bucket_notification",
];

/// Lookup specification for a known kind.
pub fn builtin_lookup(kind: &str) -> Option<LookupSpec> {
    if S3_BUCKET_SUBRESOURCES.contains(&kind) {
        return Some(LookupSpec::any(&["bucket"]));
    }
    let spec = match kind {
        "aws_s3_bucket" => LookupSpec::any(&["bucket"]),
        "aws_s3_object" => LookupSpec::all(&["bucket", "key"]),
        "aws_cloudwatch_log_group" => LookupSpec::any(&["name"]),
        "aws_cloudwatch_metric_alarm" => LookupSpec::any(&["alarm_name"]),
        "aws_key_pair" => LookupSpec::any(&["key_name"]),
        "aws_security_group" => LookupSpec::any(&["id", "name"]),
        "aws_security_group_rule" => {
            LookupSpec::any(&["security_group_rule_id"]).manual_when_missing()
        }
        "aws_route53_zone" => LookupSpec::any(&["zone_id", "name"]),
        "aws_route53_record" => LookupSpec::all(&["zone_id", "name", "type"]),
        "aws_lb" => LookupSpec::any(&["arn", "name"]),
        "aws_lb_listener" => LookupSpec::any(&["arn", "load_balancer_arn"]),
        "aws_lb_target_group" => LookupSpec::any(&["arn", "name"]),
        "aws_lb_listener_rule" => LookupSpec::any(&["arn", "listener_arn"]),
        "aws_lb_listener_certificate" => LookupSpec::all(&["listener_arn", "certificate_arn"]),
        "aws_acm_certificate" => LookupSpec::any(&["arn"]),
        "aws_acm_certificate_validation" => LookupSpec::any(&["certificate_arn"]),
        "aws_ami" => LookupSpec::any(&["id"]),
        "aws_ecs_cluster" => LookupSpec::any(&["name", "cluster_name"]),
        "aws_ecs_service" => LookupSpec::all(&["cluster", "name"]),
        "aws_ecs_task_definition" => LookupSpec::any(&["arn"]),
        "aws_ssm_parameter" => LookupSpec::any(&["name"]),
        "aws_secretsmanager_secret" => LookupSpec::any(&["id"]),
        "aws_secretsmanager_secret_version" => LookupSpec::all(&["secret_id", "version_id"]),
        "aws_eip" => LookupSpec::any(&["allocation_id"]),
        "aws_internet_gateway" => LookupSpec::any(&["id"]),
        "aws_nat_gateway" => LookupSpec::any(&["id"]),
        "aws_route" => LookupSpec::all(&["route_table_id", "destination_cidr_block"])
            .or_all(&["route_table_id", "destination_ipv6_cidr_block"]),
        "aws_route_table" => LookupSpec::any(&["id"]),
        "aws_route_table_association" => LookupSpec::any(&["id"]),
        "aws_subnet" => LookupSpec::any(&["id"]),
        "aws_vpc" => LookupSpec::any(&["id"]),
        "aws_instance" => LookupSpec::any(&["id"]),
        "aws_launch_template" => LookupSpec::any(&["id", "name"]),
        "aws_autoscaling_group" => LookupSpec::any(&["name"]),
        "aws_autoscaling_policy" => {
            LookupSpec::any(&["arn"]).or_all(&["name", "autoscaling_group_name"])
        }
        "aws_iam_instance_profile" => LookupSpec::any(&["name"]),
        "aws_iam_role" => LookupSpec::any(&["name"]),
        "aws_iam_role_policy" => LookupSpec::all(&["role", "name"]),
        "aws_lambda_function" => LookupSpec::any(&["function_name"]),
        "aws_lambda_permission" => LookupSpec::all(&["function_name", "statement_id"]),
        "aws_cloudfront_distribution" => LookupSpec::any(&["id"]),
        "aws_cloudfront_origin_access_identity" => LookupSpec::any(&["id"]),
        _ => return None,
    };
    Some(spec)
}

/// Every kind with a built-in lookup specification, sorted.
pub fn builtin_kinds() -> Vec<&'static str> {
    let mut kinds: Vec<&'static str> = BUILTIN_KIND_NAMES
        .iter()
        .chain(S3_BUCKET_SUBRESOURCES)
        .copied()
        .collect();
    kinds.sort_unstable();
    kinds
}

const BUILTIN_KIND_NAMES: &[&str] = &[
    "aws_s3_bucket",
    "aws_s3_object",
    "aws_cloudwatch_log_group",
    "aws_cloudwatch_metric_alarm",
    "aws_key_pair",
    "aws_security_group",
    "aws_security_group_rule",
    "aws_route53_zone",
    "aws_route53_record",
    "aws_lb",
    "aws_lb_listener",
    "aws_lb_target_group",
    "aws_lb_listener_rule",
    "aws_lb_listener_certificate",
    "aws_acm_certificate",
    "aws_acm_certificate_validation",
    "aws_ami",
    "aws_ecs_cluster",
    "aws_ecs_service",
    "aws_ecs_task_definition",
    "aws_ssm_parameter",
    "aws_secretsmanager_secret",
    "aws_secretsmanager_secret_version",
    "aws_eip",
    "aws_internet_gateway",
    "aws_nat_gateway",
    "aws_route",
    "aws_route_table",
    "aws_route_table_association",
    "aws_subnet",
    "aws_vpc",
    "aws_instance",
    "aws_launch_template",
    "aws_autoscaling_group",
    "aws_autoscaling_policy",
    "aws_iam_instance_profile",
    "aws_iam_role",
    "aws_iam_role_policy",
    "aws_lambda_function",
    "aws_lambda_permission",
    "aws_cloudfront_distribution",
    "aws_cloudfront_origin_access_identity",
];
