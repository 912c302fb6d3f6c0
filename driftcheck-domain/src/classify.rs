use crate::region::RegionCheck;
use driftcheck_types::{Category, ClassifiedResult, VerificationOutcome, WorkItem};

/// Everything known about a work item once the concurrent phase is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// The fast path found a foreign region; no remote call was made.
    RegionMismatch { claimed_region: String },
    /// A region-declaring data source names the target region.
    RegionConfirmed { region: String },
    /// Data or local-only kind.
    Passive,
    /// No verifier registered for the kind.
    Unregistered,
    /// Registered, but the item lacks what the verifier needs.
    ManualCheck { reason: String },
    Verified(VerificationOutcome),
}

impl Assessment {
    /// Assessment decided by the region fast path, if any.
    pub fn from_region_check(check: RegionCheck) -> Option<Self> {
        match check {
            RegionCheck::Proceed => None,
            RegionCheck::Mismatch { claimed_region } => {
                Some(Assessment::RegionMismatch { claimed_region })
            }
            RegionCheck::Confirmed { region } => Some(Assessment::RegionConfirmed { region }),
            RegionCheck::Unreadable { message } => {
                Some(Assessment::Verified(VerificationOutcome::failed(message)))
            }
        }
    }
}

/// Map an assessment to exactly one category.
///
/// Pure: the same inputs always produce the same result.
pub fn classify(item: &WorkItem, assessment: &Assessment, target_region: &str) -> ClassifiedResult {
    let address = item.address.as_str();
    let mut result = ClassifiedResult {
        address: item.address.clone(),
        kind: item.kind.clone(),
        mode: item.mode,
        category: Category::Ok,
        message: String::new(),
        command: None,
        declared_id: item.declared_id.clone(),
        live_id: String::new(),
        claimed_region: None,
    };

    match assessment {
        Assessment::RegionMismatch { claimed_region } => {
            result.category = Category::RegionMismatch;
            result.message = format!(
                "{address} (state file claims in '{claimed_region}') not found in '{target_region}'. \
                 Suggest `terraform state rm {address}` if resource moved."
            );
            result.command = Some(state_rm(address));
            result.claimed_region = Some(claimed_region.clone());
        }
        Assessment::RegionConfirmed { region } => {
            result.category = Category::Ok;
            result.message =
                format!("{address} (ID: {region}) resolves to current region and is in state.");
            result.live_id = region.clone();
        }
        Assessment::Passive => {
            result.category = Category::Info;
            result.message =
                format!("Data/Local resource '{address}'. No external verification needed.");
        }
        Assessment::Unregistered => {
            result.category = Category::Warning;
            result.message = format!(
                "Resource type '{}' not supported by this checker. Manual verification needed.",
                item.kind
            );
        }
        Assessment::ManualCheck { reason } => {
            result.category = Category::Warning;
            result.message = format!(
                "Resource type '{}' (ID: {}) {reason}. Manual verification recommended.",
                item.kind, item.declared_id
            );
        }
        Assessment::Verified(outcome) => classify_outcome(&mut result, outcome),
    }

    result
}

fn classify_outcome(result: &mut ClassifiedResult, outcome: &VerificationOutcome) {
    let address = result.address.clone();

    if let Some(err) = &outcome.error {
        result.category = Category::Error;
        result.message = format!("Failed to verify {address}: {err}");
        return;
    }

    if !outcome.exists {
        result.category = Category::Dangerous;
        result.message = format!(
            "{address} (ID: {}) is in state but NOT FOUND in AWS.",
            result.declared_id
        );
        result.command = Some(state_rm(&address));
        return;
    }

    result.live_id = outcome.live_id.clone();
    if ids_match(&result.declared_id, &outcome.live_id) {
        result.category = Category::Ok;
        result.message = format!(
            "{address} (ID: {}) exists in state and AWS.",
            outcome.live_id
        );
    } else {
        result.category = Category::PotentialImport;
        result.message = format!(
            "{address} exists in AWS with ID '{}'. State ID: '{}'.",
            outcome.live_id, result.declared_id
        );
        result.command = Some(format!("terraform import {address} {}", outcome.live_id));
    }
}

/// An empty declared id makes no claim and matches anything.
fn ids_match(declared: &str, live: &str) -> bool {
    declared.is_empty() || declared.eq_ignore_ascii_case(live)
}

fn state_rm(address: &str) -> String {
    format!("terraform state rm {address}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REGION: &str = "us-west-2";

    fn sg(declared: &str) -> WorkItem {
        WorkItem::new("aws_security_group.web", "aws_security_group").with_declared_id(declared)
    }

    fn verified(outcome: VerificationOutcome) -> Assessment {
        Assessment::Verified(outcome)
    }

    #[test]
    fn matching_ids_are_ok() {
        let r = classify(&sg("sg-123"), &verified(VerificationOutcome::found("sg-123")), REGION);
        assert_eq!(r.category, Category::Ok);
        assert_eq!(r.command, None);
        assert_eq!(r.live_id, "sg-123");
        assert_eq!(
            r.message,
            "aws_security_group.web (ID: sg-123) exists in state and AWS."
        );
    }

    #[test]
    fn id_comparison_ignores_case() {
        let r = classify(&sg("SG-ABC"), &verified(VerificationOutcome::found("sg-abc")), REGION);
        assert_eq!(r.category, Category::Ok);
    }

    #[test]
    fn empty_declared_id_defaults_to_ok() {
        let r = classify(&sg(""), &verified(VerificationOutcome::found("sg-999")), REGION);
        assert_eq!(r.category, Category::Ok);
        assert_eq!(r.command, None);
    }

    #[test]
    fn different_live_id_is_potential_import() {
        let r = classify(&sg("sg-123"), &verified(VerificationOutcome::found("sg-456")), REGION);
        assert_eq!(r.category, Category::PotentialImport);
        assert_eq!(
            r.command.as_deref(),
            Some("terraform import aws_security_group.web sg-456")
        );
        assert!(r.message.contains("sg-456"));
        assert!(r.message.contains("State ID: 'sg-123'"));
    }

    #[test]
    fn missing_resource_is_dangerous() {
        let r = classify(&sg("sg-123"), &verified(VerificationOutcome::missing()), REGION);
        assert_eq!(r.category, Category::Dangerous);
        assert_eq!(
            r.command.as_deref(),
            Some("terraform state rm aws_security_group.web")
        );
        assert_eq!(
            r.message,
            "aws_security_group.web (ID: sg-123) is in state but NOT FOUND in AWS."
        );
    }

    #[test]
    fn errors_carry_no_command() {
        let r = classify(
            &sg("sg-123"),
            &verified(VerificationOutcome::failed("throttled")),
            REGION,
        );
        assert_eq!(r.category, Category::Error);
        assert_eq!(r.command, None);
        assert_eq!(r.message, "Failed to verify aws_security_group.web: throttled");
    }

    #[test]
    fn region_mismatch_suggests_removal() {
        let r = classify(
            &sg("sg-123"),
            &Assessment::RegionMismatch {
                claimed_region: "eu-west-1".to_string(),
            },
            REGION,
        );
        assert_eq!(r.category, Category::RegionMismatch);
        assert_eq!(
            r.command.as_deref(),
            Some("terraform state rm aws_security_group.web")
        );
        assert_eq!(r.claimed_region.as_deref(), Some("eu-west-1"));
        assert!(r.message.contains("not found in 'us-west-2'"));
    }

    #[test]
    fn passive_and_unregistered_kinds() {
        let info = classify(
            &WorkItem::new("data.local_file.cfg", "local_file"),
            &Assessment::Passive,
            REGION,
        );
        assert_eq!(info.category, Category::Info);

        let warn = classify(
            &WorkItem::new("aws_glue_job.etl", "aws_glue_job"),
            &Assessment::Unregistered,
            REGION,
        );
        assert_eq!(warn.category, Category::Warning);
        assert_eq!(
            warn.message,
            "Resource type 'aws_glue_job' not supported by this checker. Manual verification needed."
        );
    }

    #[test]
    fn manual_check_is_a_warning_without_command() {
        let item = WorkItem::new("aws_security_group_rule.ingress", "aws_security_group_rule")
            .with_declared_id("sgrule-123");
        let r = classify(
            &item,
            &Assessment::ManualCheck {
                reason: "verification is complex and 'security_group_rule_id' not found in state attributes"
                    .to_string(),
            },
            REGION,
        );
        assert_eq!(r.category, Category::Warning);
        assert_eq!(r.command, None);
        assert_eq!(
            r.message,
            "Resource type 'aws_security_group_rule' (ID: sgrule-123) verification is complex and \
             'security_group_rule_id' not found in state attributes. Manual verification recommended."
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let item = sg("sg-123");
        let assessments = [
            Assessment::Passive,
            Assessment::Unregistered,
            Assessment::ManualCheck {
                reason: "no rule id".to_string(),
            },
            Assessment::RegionMismatch {
                claimed_region: "ap-south-1".to_string(),
            },
            Assessment::RegionConfirmed {
                region: REGION.to_string(),
            },
            verified(VerificationOutcome::found("sg-123")),
            verified(VerificationOutcome::found("sg-456")),
            verified(VerificationOutcome::missing()),
            verified(VerificationOutcome::failed("boom")),
        ];
        for a in &assessments {
            assert_eq!(classify(&item, a, REGION), classify(&item, a, REGION));
        }
    }

    #[test]
    fn unreadable_region_becomes_error() {
        let a = Assessment::from_region_check(RegionCheck::Unreadable {
            message: "no name".to_string(),
        });
        let r = classify(&sg(""), &a.expect("decided"), REGION);
        assert_eq!(r.category, Category::Error);
        assert!(Assessment::from_region_check(RegionCheck::Proceed).is_none());
    }
}
