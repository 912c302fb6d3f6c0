//! Clap-free settings for the reconciliation pipeline.

use camino::Utf8PathBuf;
use driftcheck_artifacts::PublishGate;

/// Settings for one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Snapshot to reconcile.
    pub state_path: Utf8PathBuf,
    /// Region every resource is expected to live in.
    pub region: String,
    /// Maximum number of concurrent verifications.
    pub concurrency: usize,
    pub backups_dir: Utf8PathBuf,

    // Remediation
    /// Run suggested commands after classification.
    pub execute: bool,
    /// Working directory for remediation commands.
    pub tf_dir: Utf8PathBuf,
    pub terraform_bin: String,

    // Publishing
    pub publish_to: Option<Utf8PathBuf>,
    pub publish_on: PublishGate,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            state_path: Utf8PathBuf::from("terraform.tfstate"),
            region: "us-west-2".to_string(),
            concurrency: 10,
            backups_dir: Utf8PathBuf::from("./backups"),
            execute: false,
            tf_dir: Utf8PathBuf::from("."),
            terraform_bin: "terraform".to_string(),
            publish_to: None,
            publish_on: PublishGate::default(),
        }
    }
}

impl RunSettings {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.state_path.as_str().trim().is_empty() {
            return Err("state path must not be empty".to_string());
        }
        if self.region.trim().is_empty() {
            return Err("region must not be empty".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than zero".to_string());
        }
        if self.execute && self.terraform_bin.trim().is_empty() {
            return Err("terraform binary must not be empty when executing commands".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = RunSettings::default();
        assert_eq!(s.concurrency, 10);
        assert_eq!(s.region, "us-west-2");
        assert_eq!(s.backups_dir.as_str(), "./backups");
        assert!(!s.execute);
        assert_eq!(s.publish_on, PublishGate::ContentChanged);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let s = RunSettings {
            concurrency: 0,
            ..Default::default()
        };
        assert_eq!(
            s.validate(),
            Err("concurrency must be greater than zero".to_string())
        );
    }

    #[test]
    fn blank_region_is_rejected() {
        let s = RunSettings {
            region: "  ".to_string(),
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }
}
