//! Configuration file loading for driftcheck.
//!
//! Discovers and loads `driftcheck.toml` from the working directory (or the
//! directory given with `--config-dir`). Merges config file settings with CLI
//! arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use driftcheck_core::PublishGate;
use driftcheck_core::settings::RunSettings;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "driftcheck.toml";

/// Top-level configuration from driftcheck.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriftcheckConfig {
    pub check: CheckConfig,
    pub remediation: RemediationConfig,
    pub publish: PublishConfig,
}

/// `[check]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Snapshot to reconcile.
    pub state: Option<Utf8PathBuf>,
    /// Region every resource is expected to live in.
    pub region: Option<String>,
    pub concurrency: Option<usize>,
    pub backups_dir: Option<Utf8PathBuf>,
    /// Inventory file consulted by the verifiers.
    pub inventory: Option<Utf8PathBuf>,
    /// Print the JSON summary instead of the text report.
    pub json: bool,
}

/// `[remediation]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    pub execute: bool,
    pub tf_dir: Option<Utf8PathBuf>,
    pub terraform_bin: Option<String>,
}

/// `[publish]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub to: Option<Utf8PathBuf>,
    /// `content-changed` or `mutation-attempted`.
    pub on: Option<String>,
}

/// Discover the driftcheck.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a driftcheck.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DriftcheckConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<DriftcheckConfig> {
    let config: DriftcheckConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<DriftcheckConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(DriftcheckConfig::default()),
    }
}

/// Values given on the command line for `driftcheck check`.
///
/// `None` (or `false` for switches) means "not given".
#[derive(Debug, Clone, Default)]
pub struct CheckOverrides {
    pub state: Option<Utf8PathBuf>,
    pub region: Option<String>,
    pub concurrency: Option<usize>,
    pub backups_dir: Option<Utf8PathBuf>,
    pub inventory: Option<Utf8PathBuf>,
    pub json: bool,
    pub execute: bool,
    pub tf_dir: Option<Utf8PathBuf>,
    pub terraform_bin: Option<String>,
    pub publish_to: Option<Utf8PathBuf>,
    pub publish_on: Option<PublishGate>,
}

/// Settings for one `check` run after merging.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: RunSettings,
    pub inventory: Option<Utf8PathBuf>,
    pub json: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DriftcheckConfig,
}

impl ConfigMerger {
    pub fn new(config: DriftcheckConfig) -> Self {
        Self { config }
    }

    /// CLI values win; config file values fill the gaps; the rest are defaults.
    /// Switches are on when either source turns them on.
    pub fn merge_check_args(self, cli: CheckOverrides) -> anyhow::Result<MergedConfig> {
        let DriftcheckConfig {
            check,
            remediation,
            publish,
        } = self.config;
        let defaults = RunSettings::default();

        let publish_on = match (cli.publish_on, publish.on) {
            (Some(gate), _) => gate,
            (None, Some(raw)) => raw
                .parse::<PublishGate>()
                .map_err(anyhow::Error::msg)
                .context("invalid publish.on in config")?,
            (None, None) => defaults.publish_on,
        };

        let settings = RunSettings {
            state_path: cli.state.or(check.state).unwrap_or(defaults.state_path),
            region: cli.region.or(check.region).unwrap_or(defaults.region),
            concurrency: cli
                .concurrency
                .or(check.concurrency)
                .unwrap_or(defaults.concurrency),
            backups_dir: cli
                .backups_dir
                .or(check.backups_dir)
                .unwrap_or(defaults.backups_dir),
            execute: cli.execute || remediation.execute,
            tf_dir: cli.tf_dir.or(remediation.tf_dir).unwrap_or(defaults.tf_dir),
            terraform_bin: cli
                .terraform_bin
                .or(remediation.terraform_bin)
                .unwrap_or(defaults.terraform_bin),
            publish_to: cli.publish_to.or(publish.to),
            publish_on,
        };

        Ok(MergedConfig {
            settings,
            inventory: cli.inventory.or(check.inventory),
            json: cli.json || check.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_config() {
        let config = parse_config(
            r#"
[check]
state = "envs/prod.tfstate"
region = "eu-west-1"
concurrency = 4
backups_dir = "/var/backups/driftcheck"
inventory = "inventory.json"
json = true

[remediation]
execute = true
tf_dir = "envs"
terraform_bin = "tofu"

[publish]
to = "/mnt/shared/prod.tfstate"
on = "mutation-attempted"
"#,
        )
        .unwrap();

        assert_eq!(config.check.state.as_deref(), Some(Utf8Path::new("envs/prod.tfstate")));
        assert_eq!(config.check.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.check.concurrency, Some(4));
        assert!(config.check.json);
        assert!(config.remediation.execute);
        assert_eq!(config.remediation.terraform_bin.as_deref(), Some("tofu"));
        assert_eq!(config.publish.on.as_deref(), Some("mutation-attempted"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.check.state.is_none());
        assert!(!config.remediation.execute);
        assert!(config.publish.to.is_none());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse_config("[check]\nconcurrency = \"many\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML"));
    }

    #[test]
    fn test_defaults_when_nothing_given() {
        let merged = ConfigMerger::new(DriftcheckConfig::default())
            .merge_check_args(CheckOverrides::default())
            .unwrap();
        let defaults = RunSettings::default();

        assert_eq!(merged.settings.state_path, defaults.state_path);
        assert_eq!(merged.settings.region, "us-west-2");
        assert_eq!(merged.settings.concurrency, 10);
        assert_eq!(merged.settings.backups_dir, Utf8PathBuf::from("./backups"));
        assert_eq!(merged.settings.publish_on, PublishGate::ContentChanged);
        assert!(!merged.settings.execute);
        assert!(merged.inventory.is_none());
        assert!(!merged.json);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = parse_config(
            r#"
[check]
region = "eu-west-1"
concurrency = 4

[publish]
on = "content-changed"
"#,
        )
        .unwrap();
        let merged = ConfigMerger::new(config)
            .merge_check_args(CheckOverrides {
                region: Some("us-east-1".to_string()),
                publish_on: Some(PublishGate::MutationAttempted),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(merged.settings.region, "us-east-1");
        assert_eq!(merged.settings.concurrency, 4);
        assert_eq!(merged.settings.publish_on, PublishGate::MutationAttempted);
    }

    #[test]
    fn test_config_switch_used_when_cli_false() {
        let config = parse_config("[remediation]\nexecute = true\n[check]\njson = true\n").unwrap();
        let merged = ConfigMerger::new(config)
            .merge_check_args(CheckOverrides::default())
            .unwrap();
        assert!(merged.settings.execute);
        assert!(merged.json);
    }

    #[test]
    fn test_invalid_publish_gate_in_config() {
        let config = parse_config("[publish]\non = \"always\"\n").unwrap();
        let err = ConfigMerger::new(config)
            .merge_check_args(CheckOverrides::default())
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("invalid publish.on"), "{msg}");
        assert!(msg.contains("unknown publish gate 'always'"), "{msg}");
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        assert!(discover_config(&root).is_none());
        fs::write(root.join(CONFIG_FILE_NAME), "[check]\nregion = \"ap-south-1\"\n").unwrap();
        assert_eq!(discover_config(&root), Some(root.join(CONFIG_FILE_NAME)));

        let loaded = load_or_default(&root).unwrap();
        assert_eq!(loaded.check.region.as_deref(), Some("ap-south-1"));
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let config = load_or_default(&root).unwrap();
        assert!(config.check.region.is_none());
    }
}
