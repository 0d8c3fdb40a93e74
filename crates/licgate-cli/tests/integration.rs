#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn licgate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("licgate").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("LICGATE_CONFIG")
        .env_remove("SLBSLS_LICENSE_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_config(dir: &TempDir, lmutil: &Path) -> PathBuf {
    let state = dir.path().join("state/last-check");
    write(
        dir,
        "licgate.yaml",
        &format!(
            "lmutil: {}\nmanaged_features: [eclipse, compositional, networks]\nthrottle_state_path: {}\ninterval_seconds: 15\ndelay_seconds: 60\n",
            lmutil.display(),
            state.display()
        ),
    )
}

fn write_job(dir: &TempDir, name: &str, yaml: &str) -> PathBuf {
    write(dir, name, yaml)
}

const PLAIN_JOB: &str = "\
id: 1001.head
alternatives: eclipse=1
variables:
  SLBSLS_LICENSE_FILE: 27000@lic01
";

// ---------------------------------------------------------------------------
// licgate parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_alternatives() {
    let dir = TempDir::new().unwrap();
    licgate(&dir)
        .args(["parse", "eclipse=1:compositional=2+eclipse=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compositional"))
        .stdout(predicate::str::contains("FEATURE"));
}

#[test]
fn parse_json_keeps_order() {
    let dir = TempDir::new().unwrap();
    let out = licgate(&dir)
        .args(["--json", "parse", "lgr=1+eclipse=3"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value[0][0]["feature"], "lgr");
    assert_eq!(value[1][0]["feature"], "eclipse");
    assert_eq!(value[1][0]["count"], 3);
}

#[test]
fn parse_malformed_fails() {
    let dir = TempDir::new().unwrap();
    licgate(&dir)
        .args(["parse", "eclipse=two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed"));
}

// ---------------------------------------------------------------------------
// licgate evaluate (no license server needed)
// ---------------------------------------------------------------------------

#[test]
fn evaluate_job_without_requirement_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let job = write_job(&dir, "job.yaml", "id: 7.head\nalternatives: ''\n");
    licgate(&dir)
        .args(["--config", "/nonexistent/licgate.yaml", "evaluate", "--job"])
        .arg(&job)
        .assert()
        .success()
        .stdout(predicate::str::contains("no decision"));
}

#[test]
fn rust_log_enables_debug_output() {
    let dir = TempDir::new().unwrap();
    let job = write_job(&dir, "job.yaml", "id: 7.head\nalternatives: ''\n");
    licgate(&dir)
        .env("RUST_LOG", "debug")
        .args(["--config", "/nonexistent/licgate.yaml", "evaluate", "--job"])
        .arg(&job)
        .assert()
        .success()
        .stderr(predicate::str::contains("no license requirement"));

    licgate(&dir)
        .args(["--config", "/nonexistent/licgate.yaml", "evaluate", "--job"])
        .arg(&job)
        .assert()
        .success()
        .stderr(predicate::str::contains("no license requirement").not());
}

#[test]
fn evaluate_missing_config_rejects() {
    let dir = TempDir::new().unwrap();
    let job = write_job(&dir, "job.yaml", PLAIN_JOB);
    licgate(&dir)
        .args(["--config", "/nonexistent/licgate.yaml", "evaluate", "--job"])
        .arg(&job)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("reject"));
}

#[test]
fn evaluate_unreadable_job_fails() {
    let dir = TempDir::new().unwrap();
    licgate(&dir)
        .args(["evaluate", "--job", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yaml"));
}

// ---------------------------------------------------------------------------
// licgate config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_accepts_good_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, Path::new("/bin/sh"));
    // Found by walking up from the working directory.
    licgate(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_flags_missing_tool() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, Path::new("/nonexistent/lmutil"));
    licgate(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_show_includes_defaults() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, Path::new("/bin/sh"));
    licgate(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor_daemon: slbsls"));
}

#[test]
fn throttle_show_before_any_check() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, Path::new("/bin/sh"));
    licgate(&dir)
        .args(["throttle", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Last check: never"));
}

// ---------------------------------------------------------------------------
// End to end against a fake lmutil
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod lmutil {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// eclipse: 8 free, compositional: 0 free, networks: 1 free.
    const FAKE_LMUTIL: &str = r#"#!/bin/sh
[ "$1" = "lmstat" ] || exit 2
case "$5" in
  eclipse) echo "Users of eclipse:  (Total of 10 licenses issued;  Total of 2 licenses in use)" ;;
  compositional) echo "Users of compositional:  (Total of 2 licenses issued;  Total of 2 licenses in use)" ;;
  networks) echo "Users of networks:  (Total of 1 license issued;  Total of 0 licenses in use)" ;;
  *) echo "Users of features: none" ;;
esac
"#;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let tool = write(&dir, "lmutil", FAKE_LMUTIL);
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = write_config(&dir, &tool);
        (dir, config)
    }

    fn evaluate(dir: &TempDir, config: &Path, job: &Path) -> Command {
        let mut cmd = licgate(dir);
        cmd.arg("--config")
            .arg(config)
            .args(["--json", "evaluate", "--job"])
            .arg(job);
        cmd
    }

    fn decision(cmd: &mut Command) -> serde_json::Value {
        let out = cmd.output().unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        serde_json::from_slice(&out.stdout).unwrap()
    }

    #[test]
    fn available_license_accepts_then_throttles() {
        let (dir, config) = setup();
        let job = write_job(&dir, "job.yaml", PLAIN_JOB);

        let first = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(first["decision"], "accept");
        assert!(dir.path().join("state/last-check").exists());

        let second = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(second["decision"], "defer");
        assert!(second["reason"]
            .as_str()
            .unwrap()
            .contains("last license check"));
    }

    #[test]
    fn short_license_defers() {
        let (dir, config) = setup();
        let job = write_job(
            &dir,
            "job.yaml",
            "id: 1002.head\nalternatives: eclipse=1:compositional=1+eclipse=9\nvariables:\n  SLBSLS_LICENSE_FILE: 27000@lic01\n",
        );
        let value = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(value["decision"], "defer");
        assert!(value["reason"]
            .as_str()
            .unwrap()
            .contains("compositional, eclipse"));
        assert!(!dir.path().join("state/last-check").exists());
    }

    #[test]
    fn unknown_feature_in_report_rejects() {
        let (dir, config) = setup();
        std::fs::write(
            &config,
            std::fs::read_to_string(&config)
                .unwrap()
                .replace("networks]", "networks, gaslift]"),
        )
        .unwrap();
        let job = write_job(
            &dir,
            "job.yaml",
            "id: 1003.head\nalternatives: gaslift=1\nvariables:\n  SLBSLS_LICENSE_FILE: 27000@lic01\n",
        );
        let value = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(value["decision"], "reject");
        assert!(value["reason"].as_str().unwrap().contains("gaslift"));
    }

    #[test]
    fn missing_server_variable_rejects() {
        let (dir, config) = setup();
        let job = write_job(&dir, "job.yaml", "id: 1004.head\nalternatives: eclipse=1\n");
        let value = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(value["decision"], "reject");
        assert!(value["reason"]
            .as_str()
            .unwrap()
            .contains("SLBSLS_LICENSE_FILE"));
    }

    #[test]
    fn multiple_realization_representative_rejected_when_secondary_short() {
        let (dir, config) = setup();
        let job = write_job(
            &dir,
            "job.yaml",
            "id: 1005.head\nalternatives: eclipse=1\nmr_key: grp-3\nvariables:\n  SLBSLS_LICENSE_FILE: 27000@lic01\n  ECL_LICS_REQD: networks=2\n",
        );
        let value = decision(&mut evaluate(&dir, &config, &job));
        assert_eq!(value["decision"], "reject");
    }

    #[test]
    fn multiple_realization_with_running_peer_accepts() {
        let (dir, config) = setup();
        let job = write_job(
            &dir,
            "job.yaml",
            "id: 1006.head\nalternatives: eclipse=1\nmr_key: grp-3\nvariables:\n  SLBSLS_LICENSE_FILE: 27000@lic01\n  ECL_LICS_REQD: networks=2\n",
        );
        let running = write(
            &dir,
            "running.yaml",
            "- id: 1000.head\n  state: running\n  mr_key: grp-3\n",
        );
        let value = decision(evaluate(&dir, &config, &job).arg("--running").arg(&running));
        assert_eq!(value["decision"], "accept");
    }

    #[test]
    fn query_reports_free_count() {
        let (dir, config) = setup();
        licgate(&dir)
            .arg("--config")
            .arg(&config)
            .args(["query", "eclipse", "--server", "27000@lic01"])
            .assert()
            .success()
            .stdout(predicate::str::contains("8"));
    }
}
