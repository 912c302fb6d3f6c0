//! End-to-end CLI tests against temporary snapshot directories.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn driftcheck() -> Command {
    Command::cargo_bin("driftcheck").expect("driftcheck binary")
}

const STATE: &str = r#"{
  "version": 4,
  "terraform_version": "1.9.5",
  "serial": 7,
  "lineage": "3f1c0d4e",
  "resources": [
    {"mode": "managed", "type": "aws_instance", "name": "web", "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
     "instances": [{"attributes": {"id": "i-0abc"}}]},
    {"mode": "managed", "type": "aws_instance", "name": "gone", "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
     "instances": [{"attributes": {"id": "i-0dead"}}]},
    {"mode": "managed", "type": "aws_vpc", "name": "main", "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
     "instances": [{"attributes": {"id": "vpc-1", "arn": "arn:aws:ec2:us-west-2:123:vpc/vpc-1"}}]},
    {"mode": "data", "type": "aws_caller_identity", "name": "me", "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
     "instances": [{"attributes": {"id": "123"}}]}
  ]
}"#;

const INVENTORY: &str = r#"{
  "resources": {
    "aws_instance": {"i-0abc": "i-0abc"},
    "aws_vpc": {"vpc-1": "vpc-1"}
  }
}"#;

fn create_temp_dir() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    fs::write(td.path().join("terraform.tfstate"), STATE).unwrap();
    fs::write(td.path().join("inventory.json"), INVENTORY).unwrap();
    td
}

fn files_under(dir: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in fs::read_dir(&d).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path.file_name().unwrap().to_string_lossy().into_owned());
            }
        }
    }
    out.sort();
    out
}

#[test]
fn test_version_flag() {
    driftcheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("driftcheck"));
}

#[test]
fn test_check_requires_valid_publish_gate() {
    driftcheck()
        .args(["check", "--publish-on", "always"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown publish gate 'always'"));
}

#[test]
fn test_kinds_text_lists_builtin_and_passive() {
    driftcheck()
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("aws_s3_bucket"))
        .stdout(predicate::str::contains("aws_route53_record"))
        .stdout(predicate::str::contains("Passive kinds (no check): aws_caller_identity"))
        .stdout(predicate::str::contains("Region-declaring kinds: aws_region"));
}

#[test]
fn test_kinds_json_is_parseable() {
    let output = driftcheck()
        .args(["kinds", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let verifiable = doc["verifiable"].as_array().unwrap();
    let record = verifiable
        .iter()
        .find(|k| k["kind"] == "aws_route53_record")
        .unwrap();
    assert_eq!(record["require"], "all");
    assert_eq!(record["attributes"], serde_json::json!(["zone_id", "name", "type"]));
    assert_eq!(doc["region_declaring"][0]["attribute"], "name");

    let route = verifiable.iter().find(|k| k["kind"] == "aws_route").unwrap();
    assert_eq!(
        route["alternatives"],
        serde_json::json!([["route_table_id", "destination_ipv6_cidr_block"]])
    );
    let rule = verifiable
        .iter()
        .find(|k| k["kind"] == "aws_security_group_rule")
        .unwrap();
    assert_eq!(rule["manual_check_if_missing"], true);
}

#[test]
fn test_kinds_filtered_by_inventory() {
    let temp = create_temp_dir();
    let output = driftcheck()
        .current_dir(temp.path())
        .args(["kinds", "--format", "json", "--inventory", "inventory.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = doc["verifiable"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["aws_instance", "aws_vpc"]);
}

#[test]
fn test_unsupported_version_aborts_without_artifacts() {
    let temp = create_temp_dir();
    fs::write(
        temp.path().join("terraform.tfstate"),
        r#"{"version": 99, "terraform_version": "9.0.0"}"#,
    )
    .unwrap();

    driftcheck()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("format version 99"));

    assert!(!temp.path().join("backups").exists());
}

#[test]
fn test_missing_state_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    driftcheck()
        .current_dir(temp.path())
        .args(["check", "--state", "nope.tfstate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.tfstate"));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let temp = create_temp_dir();
    driftcheck()
        .current_dir(temp.path())
        .args(["check", "--concurrency", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("concurrency must be greater than zero"));
}

#[test]
fn test_check_text_report_and_artifacts() {
    let temp = create_temp_dir();

    driftcheck()
        .current_dir(temp.path())
        .args(["check", "--inventory", "inventory.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--- Terraform State Reconciliation Report ---",
        ))
        .stdout(predicate::str::contains("State File Content Changed: NO"))
        .stdout(predicate::str::contains(
            "OK: aws_instance.web (ID: i-0abc) exists in state and AWS.",
        ))
        .stdout(predicate::str::contains(
            "DANGEROUS: aws_instance.gone (ID: i-0dead) is in state but NOT FOUND in AWS.",
        ))
        .stdout(predicate::str::contains("   terraform state rm aws_instance.gone"));

    assert_eq!(
        files_under(&temp.path().join("backups")),
        vec![
            "original.terraform.tfstate",
            "original.terraform.tfstate.sha256",
            "report.terraform.json",
            "report.terraform.json.sha256",
            "report.terraform.txt",
            "report.terraform.txt.sha256",
        ]
    );
}

#[test]
fn test_check_json_summary() {
    let temp = create_temp_dir();
    let output = driftcheck()
        .current_dir(temp.path())
        .args([
            "check",
            "--inventory",
            "inventory.json",
            "--json",
            "--backups-dir",
            "out",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["schema"], "driftcheck.report.v1");
    assert_eq!(report["region"], "us-west-2");
    assert_eq!(report["state_version"], 4);
    assert_eq!(report["content_changed"], false);
    assert_eq!(report["results"]["OK"].as_array().unwrap().len(), 2);
    assert_eq!(report["results"]["INFO"][0]["resource"], "data.aws_caller_identity.me");
    assert_eq!(report["results"]["DANGEROUS"][0]["tf_id"], "i-0dead");
    assert_eq!(
        report["commands"],
        serde_json::json!(["terraform state rm aws_instance.gone"])
    );
    assert!(temp.path().join("out").is_dir());
}

#[test]
fn test_config_file_sets_region_and_json() {
    let temp = create_temp_dir();
    fs::write(
        temp.path().join("driftcheck.toml"),
        "[check]\nregion = \"eu-west-1\"\njson = true\ninventory = \"inventory.json\"\n",
    )
    .unwrap();

    let output = driftcheck()
        .current_dir(temp.path())
        .arg("check")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["region"], "eu-west-1");
    assert_eq!(report["region_mismatches"], 1);
    assert_eq!(report["results"]["REGION_MISMATCH"][0]["resource"], "aws_vpc.main");
}

#[test]
fn test_cli_region_overrides_config() {
    let temp = create_temp_dir();
    fs::write(
        temp.path().join("driftcheck.toml"),
        "[check]\nregion = \"eu-west-1\"\njson = true\n",
    )
    .unwrap();

    let output = driftcheck()
        .current_dir(temp.path())
        .args(["check", "--region", "us-west-2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["region"], "us-west-2");
    assert_eq!(report["region_mismatches"], 0);
}

#[cfg(unix)]
#[test]
fn test_failing_remediation_exits_two() {
    let temp = create_temp_dir();

    let output = driftcheck()
        .current_dir(temp.path())
        .args([
            "check",
            "--inventory",
            "inventory.json",
            "--json",
            "--execute",
            "--terraform-bin",
            "false",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let logs = report["execution_logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    let state = fs::canonicalize(temp.path().join("terraform.tfstate")).unwrap();
    assert_eq!(
        logs[0]["command"],
        format!("terraform state rm -state={} aws_instance.gone", state.display())
    );
    assert_eq!(logs[0]["exit_code"], 1);
    assert!(
        report["application_error"]
            .as_str()
            .unwrap()
            .starts_with("1 remediation command(s) failed")
    );
}

#[cfg(unix)]
#[test]
fn test_publish_on_mutation_attempted() {
    let temp = create_temp_dir();

    driftcheck()
        .current_dir(temp.path())
        .args([
            "check",
            "--inventory",
            "inventory.json",
            "--execute",
            "--terraform-bin",
            "true",
            "--publish-to",
            "shared/terraform.tfstate",
            "--publish-on",
            "mutation-attempted",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("shared/terraform.tfstate")).unwrap(),
        STATE
    );
}

#[cfg(unix)]
#[test]
fn test_remediation_in_other_tf_dir_edits_the_checked_state() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_temp_dir();
    fs::rename(
        temp.path().join("terraform.tfstate"),
        temp.path().join("dev.tfstate"),
    )
    .unwrap();
    fs::create_dir(temp.path().join("infra")).unwrap();

    // Stand-in terraform: appends a newline to the -state file, resolved
    // against its own working directory.
    let script = temp.path().join("fake-terraform.sh");
    fs::write(
        &script,
        "#!/bin/sh\nfor a in \"$@\"; do case \"$a\" in -state=*) echo >> \"${a#-state=}\";; esac; done\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let output = driftcheck()
        .current_dir(temp.path())
        .args([
            "check",
            "--state",
            "dev.tfstate",
            "--inventory",
            "inventory.json",
            "--json",
            "--execute",
            "--tf-dir",
            "infra",
            "--terraform-bin",
        ])
        .arg(&script)
        .args(["--publish-to", "shared/dev.tfstate"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["content_changed"], true);
    assert_eq!(report["published"], true);
    assert!(report["backup"]["new_path"].is_string());
    assert!(!temp.path().join("infra/dev.tfstate").exists());

    let updated = format!("{STATE}\n");
    assert_eq!(fs::read_to_string(temp.path().join("dev.tfstate")).unwrap(), updated);
    assert_eq!(
        fs::read_to_string(temp.path().join("shared/dev.tfstate")).unwrap(),
        updated
    );
}
