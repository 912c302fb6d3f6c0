//! Region fast path: decide from embedded identifiers whether a work item
//! belongs to another region before any remote call is made.

use crate::kinds::REGION_DECLARING_KINDS;
use driftcheck_types::{AttributeMap, WorkItem};

/// Attributes that may hold a region-qualified identifier, highest priority first.
pub const ARN_ATTRIBUTE_PRECEDENCE: &[&str] = &[
    "arn",
    "load_balancer_arn",
    "target_group_arn",
    "rule_arn",
    "certificate_arn",
    "instance_profile_arn",
    "role_arn",
    "function_arn",
    "distribution_arn",
    "autoscaling_group_arn",
    "policy_arn",
    "alarm_arn",
    "bucket_arn",
    "service_arn",
    "task_definition_arn",
];

/// First non-empty identifier in precedence order. Later attributes are
/// ignored once one matches; empty or non-string values do not match.
pub fn embedded_identifier(attributes: &AttributeMap) -> Option<String> {
    ARN_ATTRIBUTE_PRECEDENCE
        .iter()
        .find_map(|name| attributes.non_empty(name))
        .map(str::to_string)
}

/// Region segment of `arn:partition:service:region:account:resource`.
///
/// Global resources carry an empty region segment and yield `None`.
pub fn region_from_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(3).filter(|r| !r.is_empty())
}

/// Fast-path verdict for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionCheck {
    /// No in-process decision; continue to the verifier.
    Proceed,
    Mismatch { claimed_region: String },
    /// A region-declaring data source names the target region.
    Confirmed { region: String },
    /// A region-declaring data source has no usable region attribute.
    Unreadable { message: String },
}

pub fn check(item: &WorkItem, target_region: &str) -> RegionCheck {
    if let Some((_, attr)) = REGION_DECLARING_KINDS
        .iter()
        .find(|(kind, _)| *kind == item.kind)
    {
        return match item.attributes.non_empty(attr) {
            Some(region) if region == target_region => RegionCheck::Confirmed {
                region: region.to_string(),
            },
            Some(region) => RegionCheck::Mismatch {
                claimed_region: region.to_string(),
            },
            None => RegionCheck::Unreadable {
                message: format!(
                    "data source '{}' has no valid '{}' attribute for region",
                    item.address, attr
                ),
            },
        };
    }

    match item.embedded_identifier.as_deref().and_then(region_from_arn) {
        Some(region) if region != target_region => RegionCheck::Mismatch {
            claimed_region: region.to_string(),
        },
        _ => RegionCheck::Proceed,
    }
}
