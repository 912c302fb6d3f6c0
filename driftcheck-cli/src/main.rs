mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{CheckOverrides, ConfigMerger};
use driftcheck_core::adapters::{FsSnapshotPublisher, FsSnapshotSource, ProcessCommandRunner};
use driftcheck_core::context::RunContext;
use driftcheck_core::inventory::{InventoryFile, verifiable_kinds};
use driftcheck_core::pipeline::{RunPorts, ToolError, render_report_json, run_reconcile};
use driftcheck_core::ports::SnapshotPublisher;
use driftcheck_core::{FsArtifactWriter, PublishGate, VerifierRegistry};
use driftcheck_domain::kinds::{PASSIVE_KINDS, REGION_DECLARING_KINDS, builtin_kinds, builtin_lookup};
use driftcheck_domain::{LookupSpec, Requirement, WhenMissing};
use std::collections::BTreeSet;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "driftcheck",
    version,
    about = "Reconcile a Terraform state snapshot against live cloud inventory."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify every resource in a state snapshot and report drift.
    Check(CheckArgs),
    /// List the resource kinds driftcheck knows how to look up.
    Kinds(KindsArgs),
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// State snapshot to reconcile (default: terraform.tfstate).
    #[arg(long)]
    state: Option<Utf8PathBuf>,

    /// Region every resource is expected to live in (default: us-west-2).
    #[arg(long)]
    region: Option<String>,

    /// Maximum number of concurrent verifications (default: 10).
    #[arg(long)]
    concurrency: Option<usize>,

    /// Directory for backups and reports (default: ./backups).
    #[arg(long)]
    backups_dir: Option<Utf8PathBuf>,

    /// JSON inventory of live resources used to verify the snapshot.
    #[arg(long)]
    inventory: Option<Utf8PathBuf>,

    /// Print the machine-readable summary instead of the text report.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Run the suggested remediation commands. If omitted, they are only reported.
    #[arg(long, default_value_t = false)]
    execute: bool,

    /// Working directory for remediation commands (default: current directory).
    #[arg(long)]
    tf_dir: Option<Utf8PathBuf>,

    /// Binary used for `terraform` commands (default: terraform).
    #[arg(long)]
    terraform_bin: Option<String>,

    /// Copy the updated snapshot here after the run.
    #[arg(long)]
    publish_to: Option<Utf8PathBuf>,

    /// When to publish: content-changed or mutation-attempted.
    #[arg(long)]
    publish_on: Option<PublishGate>,

    /// Directory containing driftcheck.toml (default: current directory).
    #[arg(long, default_value = ".")]
    config_dir: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct KindsArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only list kinds this inventory file can verify.
    #[arg(long)]
    inventory: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> Result<(), ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Kinds(args) => cmd_kinds(args).map_err(ToolError::from),
    }
}

fn cmd_check(args: CheckArgs) -> Result<(), ToolError> {
    let file_config =
        config::load_or_default(&args.config_dir).context("load driftcheck.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_check_args(CheckOverrides {
        state: args.state,
        region: args.region,
        concurrency: args.concurrency,
        backups_dir: args.backups_dir,
        inventory: args.inventory,
        json: args.json,
        execute: args.execute,
        tf_dir: args.tf_dir,
        terraform_bin: args.terraform_bin,
        publish_to: args.publish_to,
        publish_on: args.publish_on,
    })?;
    debug!(settings = ?merged.settings, inventory = ?merged.inventory, "merged config");

    let registry = match &merged.inventory {
        Some(path) => InventoryFile::load(path)?.into_registry(),
        None => {
            info!("no inventory given; managed resources will be reported as unsupported");
            VerifierRegistry::new()
        }
    };

    let settings = merged.settings;
    let source = FsSnapshotSource::new(settings.state_path.clone());
    let runner = ProcessCommandRunner::new(settings.tf_dir.clone(), settings.terraform_bin.clone());
    let writer = FsArtifactWriter;
    let publisher = settings.publish_to.clone().map(FsSnapshotPublisher::new);
    let ports = RunPorts {
        source: &source,
        runner: &runner,
        writer: &writer,
        publisher: publisher.as_ref().map(|p| p as &dyn SnapshotPublisher),
    };

    let ctx = RunContext::new(settings);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let outcome = runtime.block_on(run_reconcile(&ctx, Arc::new(registry), &ports))?;

    if merged.json {
        println!("{}", render_report_json(&outcome.report)?);
    } else {
        print!("{}", outcome.text);
    }

    match outcome.commands_failed() {
        0 => Ok(()),
        failed => Err(ToolError::CommandsFailed { failed }),
    }
}

fn cmd_kinds(args: KindsArgs) -> anyhow::Result<()> {
    let only: Option<BTreeSet<String>> = match &args.inventory {
        Some(path) => {
            let inventory = InventoryFile::load(path)?;
            Some(
                verifiable_kinds(&inventory)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            )
        }
        None => None,
    };

    let kinds: Vec<(&str, LookupSpec)> = builtin_kinds()
        .into_iter()
        .filter(|k| only.as_ref().is_none_or(|set| set.contains(*k)))
        .filter_map(|k| builtin_lookup(k).map(|spec| (k, spec)))
        .collect();

    match args.format {
        OutputFormat::Text => {
            println!("Verifiable kinds:\n");
            println!("  {:<44} {:<5} ATTRIBUTES", "KIND", "NEED");
            println!("  {:<44} {:<5} ----------", "----", "----");
            for (kind, spec) in &kinds {
                let mut line = spec.attributes.join(", ");
                for alt in &spec.fallbacks {
                    line.push_str(&format!(" | all of {}", alt.join(", ")));
                }
                if spec.when_missing == WhenMissing::ManualCheck {
                    line.push_str(" (manual check if missing)");
                }
                println!("  {:<44} {:<5} {}", kind, requirement_str(spec.require), line);
            }
            if only.is_none() {
                println!();
                println!("Passive kinds (no check): {}", PASSIVE_KINDS.join(", "));
                let regional: Vec<&str> = REGION_DECLARING_KINDS.iter().map(|(k, _)| *k).collect();
                println!("Region-declaring kinds: {}", regional.join(", "));
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = kinds
                .iter()
                .map(|(kind, spec)| {
                    serde_json::json!({
                        "kind": kind,
                        "attributes": spec.attributes,
                        "require": requirement_str(spec.require),
                        "alternatives": spec.fallbacks,
                        "manual_check_if_missing": spec.when_missing == WhenMissing::ManualCheck,
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "verifiable": entries,
                "passive": PASSIVE_KINDS,
                "region_declaring": REGION_DECLARING_KINDS
                    .iter()
                    .map(|(kind, attr)| serde_json::json!({ "kind": kind, "attribute": attr }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn requirement_str(require: Requirement) -> &'static str {
    match require {
        Requirement::Any => "any",
        Requirement::All => "all",
    }
}
