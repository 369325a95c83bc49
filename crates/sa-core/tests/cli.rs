//! End-to-end tests for the seqaudit binary.
//!
//! Each test writes its inputs into a temp dir and isolates config
//! discovery so a user's own config never leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// 500 reports: cell "a" in 40%, "b" in 10%, "c" in 50%.
    fn new() -> Self {
        const CYCLE: [&str; 10] = ["a", "a", "a", "a", "b", "c", "c", "c", "c", "c"];
        let reports: Vec<Value> = (0..500)
            .map(|i| json!({ "cell": CYCLE[i % 10], "weekend": i % 7 >= 5 }))
            .collect();
        Self::with_inputs(
            json!(reports),
            json!([{ "cell": "a" }, { "cell": "b" }, { "cell": "c" }]),
            json!([0.1, 0.1, 0.5]),
        )
    }

    fn with_inputs(reports: Value, groups: Value, base_rates: Value) -> Self {
        let dir = TempDir::new().unwrap();
        let fixture = Fixture { dir };
        fixture.write("reports.json", &reports.to_string());
        fixture.write("groups.json", &groups.to_string());
        fixture.write("base_rates.json", &base_rates.to_string());
        fixture
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("seqaudit").expect("seqaudit binary should exist");
        cmd.env_remove("SEQAUDIT_CONFIG")
            .env_remove("SEQAUDIT_LOG")
            .env_remove("SEQAUDIT_LOG_FORMAT")
            .env_remove("RUST_LOG")
            .env("SEQAUDIT_CONFIG_DIR", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path());
        cmd
    }

    /// A command with the three input flags filled in.
    fn with_inputs_cmd(&self, subcommand: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.arg(subcommand)
            .arg("--reports")
            .arg(self.path("reports.json"))
            .arg("--groups")
            .arg(self.path("groups.json"))
            .arg("--base-rates")
            .arg(self.path("base_rates.json"));
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn last_stderr_json(output: &std::process::Output) -> Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("stderr should carry a JSON record");
    serde_json::from_str(line).unwrap()
}

// ============================================================================
// run
// ============================================================================

mod run {
    use super::*;

    #[test]
    fn flags_overreported_group_with_exit_1() {
        let fx = Fixture::new();
        let output = fx.with_inputs_cmd("run").output().unwrap();
        assert_eq!(output.status.code(), Some(1));

        let payload = stdout_json(&output);
        assert_eq!(payload["schema_version"], "1.0.0");
        assert_eq!(payload["outcome"]["algorithm"], "eval-ons");
        assert_eq!(payload["outcome"]["table"][0]["group_id"], 0);
        assert_eq!(payload["outcome"]["table"].as_array().unwrap().len(), 1);
        assert_eq!(payload["groups"][0], "cell=a");
        assert_eq!(payload["config"]["source"], "builtin default");
    }

    #[test]
    fn clean_stream_exits_0() {
        let fx = Fixture::new();
        fx.write("base_rates.json", "[0.5, 0.1, 0.5]");
        fx.with_inputs_cmd("run")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\"table\": []"));
    }

    #[test]
    fn each_method_runs() {
        let fx = Fixture::new();
        for method in ["eval", "sprt", "lil"] {
            let output = fx
                .with_inputs_cmd("run")
                .args(["--method", method])
                .output()
                .unwrap();
            assert_eq!(output.status.code(), Some(1), "method {method}");
        }
    }

    #[test]
    fn first_alarm_stops_early() {
        let fx = Fixture::new();
        let output = fx
            .with_inputs_cmd("run")
            .arg("--first-alarm")
            .output()
            .unwrap();
        let payload = stdout_json(&output);
        assert_eq!(payload["outcome"]["stopped_early"], true);
        assert!(payload["outcome"]["steps"].as_u64().unwrap() < 500);
    }

    #[test]
    fn max_iter_override() {
        let fx = Fixture::new();
        let output = fx
            .with_inputs_cmd("run")
            .args(["--max-iter", "3"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout_json(&output)["outcome"]["steps"], 3);
    }

    #[test]
    fn config_file_is_applied() {
        let fx = Fixture::new();
        let config = fx.write("audit.toml", "method = \"sprt\"\nalpha = 0.01\n");
        let output = fx
            .with_inputs_cmd("run")
            .arg("--config")
            .arg(&config)
            .output()
            .unwrap();
        let payload = stdout_json(&output);
        assert_eq!(payload["outcome"]["algorithm"], "sprt");
        assert_eq!(payload["config"]["effective"]["alpha"], 0.01);
        assert_eq!(payload["config"]["source"], "CLI argument");
    }

    #[test]
    fn summary_format_is_one_line() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("run")
            .args(["--format", "summary"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("1 of 3 groups flagged after 500 reports"));
    }

    #[test]
    fn markdown_format_has_table() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("run")
            .args(["-f", "md"])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("# seqaudit run"))
            .stdout(predicate::str::contains("| 0 | cell=a |"));
    }

    #[test]
    fn jsonl_format_ends_with_summary_row() {
        let fx = Fixture::new();
        let output = fx
            .with_inputs_cmd("run")
            .args(["-f", "jsonl"])
            .output()
            .unwrap();
        let rows: Vec<Value> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.last().unwrap()["kind"], "summary");
    }
}

// ============================================================================
// errors and exit codes
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn missing_feature_is_input_error() {
        let fx = Fixture::with_inputs(
            json!([{ "cell": "a" }]),
            json!([{ "zip": "02139" }]),
            json!([0.1]),
        );
        let output = fx.with_inputs_cmd("run").output().unwrap();
        assert_eq!(output.status.code(), Some(12));
        let record = last_stderr_json(&output);
        assert_eq!(record["event"], "input.error");
        assert_eq!(record["fields"]["error"]["context"]["feature"], "zip");
    }

    #[test]
    fn length_mismatch_is_input_error() {
        let fx = Fixture::new();
        fx.write("base_rates.json", "[0.1, 0.2]");
        fx.with_inputs_cmd("run").assert().code(12);
    }

    #[test]
    fn malformed_json_is_input_error() {
        let fx = Fixture::new();
        fx.write("reports.json", "[{\"cell\": ");
        fx.with_inputs_cmd("run").assert().code(12);
    }

    #[test]
    fn missing_file_is_io_error() {
        let fx = Fixture::new();
        std::fs::remove_file(fx.path("groups.json")).unwrap();
        fx.with_inputs_cmd("run").assert().code(21);
    }

    #[test]
    fn bad_alpha_is_config_error() {
        let fx = Fixture::new();
        let output = fx
            .with_inputs_cmd("run")
            .args(["--alpha", "1.5"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(11));
        assert_eq!(last_stderr_json(&output)["event"], "config.error");
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn unknown_config_key_is_config_error() {
        let fx = Fixture::new();
        let config = fx.write("audit.toml", "gamma = 2\n");
        fx.with_inputs_cmd("run")
            .arg("--config")
            .arg(config)
            .assert()
            .code(11);
    }

    #[test]
    fn human_errors_outside_json_mode() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("run")
            .args(["--alpha", "0", "--format", "summary", "--no-color"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("alpha"));
    }

    #[test]
    fn unknown_command_is_args_error() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn unknown_method_is_args_error() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("run")
            .args(["--method", "bayes"])
            .assert()
            .code(10);
    }

    #[test]
    fn help_exits_0() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("--help")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("trial"));
    }
}

// ============================================================================
// trial and oracle
// ============================================================================

mod trial {
    use super::*;

    #[test]
    fn trial_rows_and_summaries() {
        let fx = Fixture::new();
        let output = fx
            .with_inputs_cmd("trial")
            .args(["--trials", "3", "--algorithms", "eval,lil", "--seed-base", "7"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));

        let payload = stdout_json(&output);
        assert_eq!(payload["trials"], 3);
        assert_eq!(payload["algorithms"], json!(["eval-ons", "lil"]));
        assert_eq!(payload["oracle_flagged"], json!([0]));
        assert_eq!(payload["summaries"].as_array().unwrap().len(), 2);
        let rows = payload["rows"].as_array().unwrap();
        assert!(!rows.is_empty());
        for row in rows {
            assert!(row["t_inv"].as_u64().unwrap() <= row["t"].as_u64().unwrap());
        }
    }

    #[test]
    fn trial_is_reproducible_with_seed() {
        let fx = Fixture::new();
        let run = || {
            let output = fx
                .with_inputs_cmd("trial")
                .args(["--trials", "2", "--seed-base", "11"])
                .output()
                .unwrap();
            stdout_json(&output)["rows"].clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn bad_trial_alpha_is_config_error() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("trial")
            .args(["--alphas", "0.05,2"])
            .assert()
            .code(11);
    }

    #[test]
    fn unknown_algorithm_is_args_error() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("trial")
            .args(["--algorithms", "eval,bogus"])
            .assert()
            .code(10);
    }

    #[test]
    fn oracle_reports_rates() {
        let fx = Fixture::new();
        let output = fx.with_inputs_cmd("oracle").output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        let payload = stdout_json(&output);
        assert_eq!(payload["beta"], 1.5);
        assert_eq!(payload["rows"][0]["report_rate"], 0.4);
        assert_eq!(payload["rows"][0]["flagged"], true);
        assert_eq!(payload["rows"][1]["flagged"], false);
        assert!(payload["rows"][0]["expected_growth"].as_f64().unwrap() > 0.0);
        assert!(payload["rows"][0]["detection_delay"].is_number());
        assert!(payload["rows"][1]["detection_delay"].is_null());
    }

    #[test]
    fn oracle_beta_override() {
        let fx = Fixture::new();
        fx.with_inputs_cmd("oracle")
            .args(["--beta", "5", "-f", "summary"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("0 of 3 groups exceed beta=5"));
    }
}

// ============================================================================
// config and version
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn show_defaults() {
        let fx = Fixture::new();
        let output = fx.cmd().args(["config", "show"]).output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        let payload = stdout_json(&output);
        assert_eq!(payload["config"]["effective"]["alpha"], 0.05);
        assert_eq!(payload["config"]["effective"]["method"], "eval");
    }

    #[test]
    fn show_preset() {
        let fx = Fixture::new();
        let output = fx
            .cmd()
            .args(["config", "show", "--preset", "conservative"])
            .output()
            .unwrap();
        assert_eq!(stdout_json(&output)["config"]["effective"]["alpha"], 0.01);
    }

    #[test]
    fn validate_good_and_bad_files() {
        let fx = Fixture::new();
        let good = fx.write("good.json", r#"{"alpha": 0.1, "method": "lil"}"#);
        fx.cmd()
            .args(["config", "validate"])
            .arg(good)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\"status\": \"valid\""));

        let bad = fx.write("bad.toml", "beta = -1.0\n");
        fx.cmd().args(["config", "validate"]).arg(bad).assert().code(11);
    }

    #[test]
    fn schema_describes_audit_config() {
        let fx = Fixture::new();
        let output = fx.cmd().args(["config", "schema"]).output().unwrap();
        let schema = stdout_json(&output);
        assert!(schema["properties"]["alpha"].is_object());
        assert!(schema["properties"]["stop_at_first"].is_object());
    }

    #[test]
    fn version_json() {
        let fx = Fixture::new();
        let output = fx.cmd().arg("version").output().unwrap();
        let payload = stdout_json(&output);
        assert_eq!(payload["seqaudit_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(payload["schema_version"], "1.0.0");
    }
}
