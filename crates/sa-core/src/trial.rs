//! Permuted multi-trial evaluation.
//!
//! Each trial shuffles the report stream with a seed derived from the trial
//! index, then runs every algorithm at every alpha over the shuffled stream.
//! Rows from all trials are scored against the oracle to estimate power,
//! family-wise error, and detection time.

use crate::audit::{drive, AuditRun};
use crate::input::InputBundle;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sa_common::{Error, GroupId, Result};
use sa_config::{validate_alpha, AuditConfig, ConfigError, LambdaRule, Method};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One algorithm variant evaluated by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialAlgorithm {
    pub method: Method,
    pub lambda_rule: LambdaRule,
    pub asymptotic: bool,
}

impl TrialAlgorithm {
    pub const fn new(method: Method, lambda_rule: LambdaRule, asymptotic: bool) -> Self {
        TrialAlgorithm {
            method,
            lambda_rule,
            asymptotic,
        }
    }

    /// `base` with this algorithm's selectors and the given alpha.
    pub fn configure(&self, base: &AuditConfig, alpha: f64) -> AuditConfig {
        AuditConfig {
            alpha,
            method: self.method,
            lambda_rule: self.lambda_rule,
            asymptotic: self.asymptotic,
            ..base.clone()
        }
    }

    pub fn label(&self) -> String {
        self.configure(&AuditConfig::default(), 0.05).algorithm_label()
    }
}

impl fmt::Display for TrialAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TrialAlgorithm {
    type Err = ConfigError;

    /// Accepts `eval`, `eval-ons`, `eval-agrapa`, `sprt`, `lil`, `lil-asymptotic`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (method, variant) = match s.split_once('-') {
            Some((m, v)) => (m, Some(v)),
            None => (s.as_str(), None),
        };
        let method: Method = method.parse()?;
        match (method, variant) {
            (Method::Eval, None) => Ok(TrialAlgorithm::new(method, LambdaRule::Ons, false)),
            (Method::Eval, Some(rule)) => {
                Ok(TrialAlgorithm::new(method, rule.parse()?, false))
            }
            (Method::Sprt, None) | (Method::Lil, None) => {
                Ok(TrialAlgorithm::new(method, LambdaRule::Ons, false))
            }
            (Method::Lil, Some("asymptotic")) => {
                Ok(TrialAlgorithm::new(method, LambdaRule::Ons, true))
            }
            _ => Err(ConfigError::UnknownMethod(s.clone())),
        }
    }
}

/// Algorithms run when none are named: the e-process with ONS, the SPRT,
/// and both LIL variants.
pub fn default_algorithms() -> Vec<TrialAlgorithm> {
    vec![
        TrialAlgorithm::new(Method::Eval, LambdaRule::Ons, false),
        TrialAlgorithm::new(Method::Sprt, LambdaRule::Ons, false),
        TrialAlgorithm::new(Method::Lil, LambdaRule::Ons, false),
        TrialAlgorithm::new(Method::Lil, LambdaRule::Ons, true),
    ]
}

/// Harness parameters.
#[derive(Debug, Clone)]
pub struct TrialConfig {
    pub trials: usize,
    pub alphas: Vec<f64>,
    pub algorithms: Vec<TrialAlgorithm>,
    /// Trial `k` shuffles with seed `seed_base * k`; defaults to `max_iter`.
    pub seed_base: Option<u64>,
    /// Shared settings (beta, max_iter, stop_at_first).
    pub base: AuditConfig,
}

impl TrialConfig {
    pub fn new(base: AuditConfig) -> Self {
        TrialConfig {
            trials: 10,
            alphas: vec![base.alpha],
            algorithms: default_algorithms(),
            seed_base: None,
            base,
        }
    }

    pub fn seed(&self, trial: usize) -> u64 {
        self.seed_base
            .unwrap_or(self.base.max_iter)
            .wrapping_mul(trial as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidInput("trial count must be at least 1".to_string()));
        }
        if self.alphas.is_empty() {
            return Err(Error::InvalidInput("no alpha levels given".to_string()));
        }
        if self.algorithms.is_empty() {
            return Err(Error::InvalidInput("no algorithms given".to_string()));
        }
        for &alpha in &self.alphas {
            validate_alpha(alpha).map_err(ConfigError::from)?;
        }
        Ok(())
    }
}

/// One corrected rejection observed in one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRow {
    pub trial: usize,
    pub alpha: f64,
    pub alg: String,
    pub group: GroupId,
    pub t: u64,
    pub t_inv: u64,
}

/// Shuffled report order for one trial.
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

/// Run every algorithm at every alpha over one shuffled stream.
pub fn run_trial(
    bundle: &InputBundle,
    config: &TrialConfig,
    trial: usize,
    ctx: &LogContext,
) -> Result<Vec<TrialRow>> {
    let order = permutation(bundle.reports.len(), config.seed(trial));
    let mut rows = Vec::new();

    for &alpha in &config.alphas {
        for algorithm in &config.algorithms {
            let audit = algorithm.configure(&config.base, alpha);
            let run = AuditRun::new(bundle.groups.clone(), &bundle.base_rates, &audit)?
                .with_log_context(ctx.clone());
            let outcome = drive(run, order.iter().map(|&i| &bundle.reports[i]))?;
            rows.extend(outcome.table.records().iter().map(|r| TrialRow {
                trial,
                alpha,
                alg: outcome.algorithm.clone(),
                group: r.group_id,
                t: r.rejection_time,
                t_inv: r.uncorrected_crossing_time,
            }));
        }
    }
    Ok(rows)
}

/// Run all trials sequentially and concatenate their rows.
pub fn run_trials(bundle: &InputBundle, config: &TrialConfig, ctx: &LogContext) -> Result<Vec<TrialRow>> {
    config.validate()?;
    let mut rows = Vec::new();
    for trial in 0..config.trials {
        log_event!(
            ctx,
            INFO,
            event_names::TRIAL_STARTED,
            Stage::Trial,
            "Trial started",
            trial = trial,
            seed = config.seed(trial)
        );
        let trial_rows = run_trial(bundle, config, trial, ctx)?;
        log_event!(
            ctx,
            INFO,
            event_names::TRIAL_FINISHED,
            Stage::Trial,
            "Trial finished",
            trial = trial,
            rejections = trial_rows.len()
        );
        rows.extend(trial_rows);
    }
    Ok(rows)
}

/// Scores for one (algorithm, alpha) cell across all trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub alg: String,
    pub alpha: f64,
    pub trials: usize,
    /// Rejections across all trials.
    pub discoveries: usize,
    /// Rejections of groups the oracle does not flag.
    pub false_discoveries: usize,
    /// Mean rejection step over all rejections.
    pub mean_detection_time: Option<f64>,
    /// Fraction of trials with at least one false discovery.
    pub fwer: f64,
    /// Fraction of oracle-flagged groups found, averaged over trials.
    pub power: Option<f64>,
}

/// Aggregate rows per (algorithm, alpha), in configuration order.
pub fn summarize(rows: &[TrialRow], truth: &[GroupId], config: &TrialConfig) -> Vec<TrialSummary> {
    let truth: BTreeSet<GroupId> = truth.iter().copied().collect();
    let mut summaries = Vec::new();

    for &alpha in &config.alphas {
        for algorithm in &config.algorithms {
            let alg = algorithm.label();
            let cell: Vec<&TrialRow> = rows
                .iter()
                .filter(|r| r.alg == alg && r.alpha == alpha)
                .collect();

            let false_discoveries = cell.iter().filter(|r| !truth.contains(&r.group)).count();
            let true_discoveries = cell.len() - false_discoveries;
            let trials_with_false: BTreeSet<usize> = cell
                .iter()
                .filter(|r| !truth.contains(&r.group))
                .map(|r| r.trial)
                .collect();

            let mean_detection_time = if cell.is_empty() {
                None
            } else {
                Some(cell.iter().map(|r| r.t as f64).sum::<f64>() / cell.len() as f64)
            };
            let power = if truth.is_empty() {
                None
            } else {
                Some(true_discoveries as f64 / (truth.len() * config.trials) as f64)
            };

            summaries.push(TrialSummary {
                alg,
                alpha,
                trials: config.trials,
                discoveries: cell.len(),
                false_discoveries,
                mean_detection_time,
                fwer: trials_with_false.len() as f64 / config.trials as f64,
                power,
            });
        }
    }
    summaries
}
