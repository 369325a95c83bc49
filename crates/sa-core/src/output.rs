//! Rendering command payloads for stdout.
//!
//! Every payload renders to each [`OutputFormat`]: a pretty JSON document,
//! JSON lines (one object per row), a Markdown report, or a one-line summary.

use crate::audit::AuditOutcome;
use crate::oracle::OracleRow;
use crate::trial::{TrialRow, TrialSummary};
use chrono::{DateTime, Utc};
use sa_common::{Group, OutputFormat, Result};
use sa_config::ConfigSnapshot;
use serde::Serialize;
use std::fmt::Write as _;

/// Output schema version, bumped on breaking payload changes.
pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// A payload that can be printed in every output format.
pub trait Render: Serialize {
    /// Rows for JSONL output.
    fn jsonl_rows(&self) -> Vec<serde_json::Value>;

    fn markdown(&self) -> String;

    fn summary(&self) -> String;

    fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Jsonl => {
                let mut out = String::new();
                for row in self.jsonl_rows() {
                    out.push_str(&serde_json::to_string(&row)?);
                    out.push('\n');
                }
                out.trim_end().to_string()
            }
            OutputFormat::Md => self.markdown(),
            OutputFormat::Summary => self.summary(),
        })
    }
}

/// Payload of `seqaudit run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    /// Group definitions, indexed like the rejection table.
    pub groups: Vec<String>,
    pub outcome: AuditOutcome,
}

impl RunReport {
    pub fn new(run_id: String, config: ConfigSnapshot, groups: &[Group], outcome: AuditOutcome) -> Self {
        RunReport {
            schema_version: OUTPUT_SCHEMA_VERSION,
            run_id,
            generated_at: Utc::now(),
            config,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            outcome,
        }
    }

    fn group_label(&self, id: usize) -> &str {
        self.groups.get(id).map(String::as_str).unwrap_or("?")
    }
}

impl Render for RunReport {
    fn jsonl_rows(&self) -> Vec<serde_json::Value> {
        let mut rows: Vec<serde_json::Value> = self
            .outcome
            .table
            .records()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "kind": "rejection",
                    "run_id": self.run_id,
                    "group_id": r.group_id,
                    "group": self.group_label(r.group_id),
                    "rejection_time": r.rejection_time,
                    "uncorrected_crossing_time": r.uncorrected_crossing_time,
                })
            })
            .collect();
        rows.push(serde_json::json!({
            "kind": "summary",
            "run_id": self.run_id,
            "algorithm": self.outcome.algorithm,
            "steps": self.outcome.steps,
            "flagged": self.outcome.table.len(),
            "uncorrected_flagged": self.outcome.uncorrected_flagged,
            "stopped_early": self.outcome.stopped_early,
        }));
        rows
    }

    fn markdown(&self) -> String {
        let cfg = &self.config.effective;
        let mut out = String::new();
        let _ = writeln!(out, "# seqaudit run");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Run: `{}`", self.run_id);
        let _ = writeln!(out, "- Algorithm: {}", self.outcome.algorithm);
        let _ = writeln!(out, "- alpha = {}, beta = {}, max_iter = {}", cfg.alpha, cfg.beta, cfg.max_iter);
        let _ = writeln!(out, "- Config: {} (`{}`)", self.config.source, self.config.short_id());
        let _ = writeln!(
            out,
            "- Reports consumed: {}{}",
            self.outcome.steps,
            if self.outcome.stopped_early { " (stopped at first alarm)" } else { "" }
        );
        let _ = writeln!(
            out,
            "- Flagged: {} of {} groups ({} without multiplicity correction)",
            self.outcome.table.len(),
            self.groups.len(),
            self.outcome.uncorrected_flagged
        );
        let _ = writeln!(out);

        if self.outcome.table.is_empty() {
            let _ = writeln!(out, "No group crossed the corrected threshold.");
        } else {
            let _ = writeln!(out, "| group | definition | rejected at | uncorrected at |");
            let _ = writeln!(out, "|------:|------------|------------:|---------------:|");
            for r in &self.outcome.table {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    r.group_id,
                    self.group_label(r.group_id),
                    r.rejection_time,
                    r.uncorrected_crossing_time
                );
            }
        }
        out.trim_end().to_string()
    }

    fn summary(&self) -> String {
        format!(
            "[{}] {}: {} of {} groups flagged after {} reports",
            self.run_id,
            self.outcome.algorithm,
            self.outcome.table.len(),
            self.groups.len(),
            self.outcome.steps
        )
    }
}

/// Payload of `seqaudit trial`.
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub trials: usize,
    pub alphas: Vec<f64>,
    pub algorithms: Vec<String>,
    /// Groups the oracle flags on the full stream.
    pub oracle_flagged: Vec<usize>,
    pub rows: Vec<TrialRow>,
    pub summaries: Vec<TrialSummary>,
}

impl Render for TrialReport {
    fn jsonl_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .filter_map(|row| serde_json::to_value(row).ok())
            .collect()
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# seqaudit trial");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Run: `{}`", self.run_id);
        let _ = writeln!(out, "- Trials: {}", self.trials);
        let _ = writeln!(out, "- Oracle-flagged groups: {:?}", self.oracle_flagged);
        let _ = writeln!(out);
        let _ = writeln!(out, "| alg | alpha | discoveries | false | FWER | power | mean t |");
        let _ = writeln!(out, "|-----|------:|------------:|------:|-----:|------:|-------:|");
        for s in &self.summaries {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {:.3} | {} | {} |",
                s.alg,
                s.alpha,
                s.discoveries,
                s.false_discoveries,
                s.fwer,
                s.power.map(|p| format!("{p:.3}")).unwrap_or_else(|| "n/a".into()),
                s.mean_detection_time
                    .map(|t| format!("{t:.1}"))
                    .unwrap_or_else(|| "n/a".into())
            );
        }
        out.trim_end().to_string()
    }

    fn summary(&self) -> String {
        self.summaries
            .iter()
            .map(|s| {
                format!(
                    "{} alpha={}: {} discoveries, {} false, fwer={:.3}",
                    s.alg, s.alpha, s.discoveries, s.false_discoveries, s.fwer
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Payload of `seqaudit oracle`.
#[derive(Debug, Clone, Serialize)]
pub struct OracleReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub beta: f64,
    /// Level used for the detection-delay threshold.
    pub alpha: f64,
    pub reports: usize,
    pub rows: Vec<OracleRow>,
}

impl OracleReport {
    pub fn new(run_id: String, beta: f64, alpha: f64, reports: usize, rows: Vec<OracleRow>) -> Self {
        OracleReport {
            schema_version: OUTPUT_SCHEMA_VERSION,
            run_id,
            generated_at: Utc::now(),
            beta,
            alpha,
            reports,
            rows,
        }
    }

    pub fn flagged(&self) -> usize {
        self.rows.iter().filter(|r| r.flagged).count()
    }
}

impl Render for OracleReport {
    fn jsonl_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .filter_map(|row| serde_json::to_value(row).ok())
            .collect()
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# seqaudit oracle");
        let _ = writeln!(out);
        let _ = writeln!(out, "{} reports, beta = {}, alpha = {}", self.reports, self.beta, self.alpha);
        let _ = writeln!(out);
        let _ = writeln!(out, "| group | definition | matches | rate | base | ratio | flagged | growth | delay |");
        let _ = writeln!(out, "|------:|------------|--------:|-----:|-----:|------:|:-------:|-------:|------:|");
        for r in &self.rows {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.4} | {:.4} | {:.3} | {} | {:.4} | {} |",
                r.group_id,
                r.group,
                r.matches,
                r.report_rate,
                r.base_rate,
                r.ratio,
                if r.flagged { "yes" } else { "" },
                r.expected_growth,
                r.detection_delay
                    .map(|d| format!("{d:.0}"))
                    .unwrap_or_else(|| "n/a".into())
            );
        }
        out.trim_end().to_string()
    }

    fn summary(&self) -> String {
        format!(
            "{} of {} groups exceed beta={} over {} reports",
            self.flagged(),
            self.rows.len(),
            self.beta,
            self.reports
        )
    }
}
