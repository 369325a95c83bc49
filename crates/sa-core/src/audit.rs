//! Audit orchestration.
//!
//! [`AuditRun`] pulls reports one at a time, turns each into a membership
//! vector, advances the selected engine, and records the first step at which
//! each group crosses the multiplicity-corrected threshold. The first
//! crossing of the uncorrected per-group threshold is tracked alongside as a
//! diagnostic; it never causes a rejection.

use crate::engine::Engine;
use crate::log_event;
use crate::logging::{event_names, generate_run_id, LogContext, Stage};
use crate::matcher::GroupMatcher;
use sa_common::{BaseRates, Error, Group, GroupId, RejectionRecord, RejectionTable, Report, Result};
use sa_config::{validate_config, AuditConfig, ConfigError, Method};
use serde::Serialize;

/// What happened on one step of a streaming audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Step index (1-based); equals the number of reports consumed.
    pub t: u64,
    /// Groups recorded as rejected on this step, in ascending index order.
    pub newly_flagged: Vec<GroupId>,
    /// No further reports will be consumed.
    pub halted: bool,
}

/// Final state of an audit run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditOutcome {
    /// Algorithm label, e.g. `eval-ons` or `lil-asymptotic`.
    pub algorithm: String,
    pub table: RejectionTable,
    /// Reports consumed.
    pub steps: u64,
    /// The run halted on a first alarm rather than on exhaustion or `max_iter`.
    pub stopped_early: bool,
    /// Statistic per group after the last step.
    pub statistics: Vec<f64>,
    /// Corrected threshold per group at the last step.
    pub corrected_thresholds: Vec<f64>,
    pub uncorrected_threshold: f64,
    /// Groups that crossed the uncorrected threshold at some step.
    pub uncorrected_flagged: usize,
}

impl AuditOutcome {
    pub fn flagged(&self) -> bool {
        !self.table.is_empty()
    }
}

/// A streaming audit over one report sequence.
#[derive(Debug)]
pub struct AuditRun {
    config: AuditConfig,
    matcher: GroupMatcher,
    engine: Engine,
    flags: Vec<f64>,
    uncorrected: Vec<Option<u64>>,
    table: RejectionTable,
    t: u64,
    halted: bool,
    stopped_early: bool,
    log: LogContext,
}

impl AuditRun {
    /// Validate the configuration and inputs and allocate fresh state.
    pub fn new(groups: Vec<Group>, base_rates: &BaseRates, config: &AuditConfig) -> Result<Self> {
        validate_config(config).map_err(ConfigError::from)?;
        if groups.is_empty() {
            return Err(Error::InvalidInput("group list is empty".to_string()));
        }
        base_rates.validate(groups.len())?;

        let null_rates: Vec<f64> = base_rates
            .as_slice()
            .iter()
            .map(|&rate| config.null_rate(rate))
            .collect();
        // The SPRT null has no miss probability left at beta * base_rate >= 1
        if config.method == Method::Sprt {
            if let Some((group, mu)) = null_rates.iter().enumerate().find(|(_, mu)| **mu >= 1.0) {
                return Err(Error::InvalidInput(format!(
                    "group {group}: null rate beta * base_rate = {mu} must be below 1 for the SPRT"
                )));
            }
        }
        let count = groups.len();

        Ok(AuditRun {
            config: config.clone(),
            matcher: GroupMatcher::new(groups),
            engine: Engine::new(config, null_rates),
            flags: vec![0.0; count],
            uncorrected: vec![None; count],
            table: RejectionTable::new(),
            t: 0,
            halted: false,
            stopped_early: false,
            log: LogContext::new(generate_run_id()),
        })
    }

    /// Attach the invocation's log context so events correlate with it.
    pub fn with_log_context(mut self, ctx: LogContext) -> Self {
        self.log = ctx;
        self
    }

    pub fn steps(&self) -> u64 {
        self.t
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn table(&self) -> &RejectionTable {
        &self.table
    }

    pub fn statistics(&self) -> &[f64] {
        self.engine.statistics()
    }

    /// First step each group crossed the uncorrected threshold, if any.
    pub fn uncorrected_crossings(&self) -> &[Option<u64>] {
        &self.uncorrected
    }

    /// Consume one report.
    ///
    /// Once halted, further reports are ignored and the outcome repeats the
    /// last step index with `halted` set. A matching error leaves the state
    /// untouched.
    pub fn observe(&mut self, report: &Report) -> Result<StepOutcome> {
        if self.halted {
            return Ok(StepOutcome {
                t: self.t,
                newly_flagged: Vec::new(),
                halted: true,
            });
        }

        let report_index = self.t as usize;
        if self.t == 0 {
            self.matcher.validate_against(report_index, report)?;
            let label = self.config.algorithm_label();
            log_event!(
                self.log,
                DEBUG,
                event_names::AUDIT_STARTED,
                Stage::Audit,
                "Audit started",
                algorithm = label.as_str(),
                groups = self.matcher.len(),
                alpha = self.config.alpha,
                beta = self.config.beta,
                max_iter = self.config.max_iter
            );
        }
        self.matcher
            .membership(report_index, report, &mut self.flags)?;

        let t = self.t + 1;
        self.t = t;
        self.engine.step(t, &self.flags);

        let alpha = self.config.alpha;
        let uncorrected = self.engine.uncorrected_threshold(alpha);
        let stats = self.engine.statistics();
        for (slot, &stat) in self.uncorrected.iter_mut().zip(stats) {
            if slot.is_none() && stat > uncorrected {
                *slot = Some(t);
            }
        }

        let crossing: Vec<GroupId> = (0..stats.len())
            .filter(|&id| stats[id] > self.engine.corrected_threshold(id, alpha))
            .collect();

        let mut newly_flagged = Vec::new();
        if self.config.stop_at_first && !crossing.is_empty() {
            let mut best = crossing[0];
            for &id in &crossing[1..] {
                if stats[id] > stats[best] {
                    best = id;
                }
            }
            if self.record(best, t) {
                newly_flagged.push(best);
            }
            self.halted = true;
            self.stopped_early = true;
            log_event!(
                self.log,
                DEBUG,
                event_names::AUDIT_FIRST_ALARM,
                Stage::Audit,
                "First alarm",
                group = best,
                t = t,
                crossing = crossing.len()
            );
        } else {
            for id in crossing {
                if self.record(id, t) {
                    newly_flagged.push(id);
                }
            }
        }

        if t >= self.config.max_iter {
            self.halted = true;
        }

        Ok(StepOutcome {
            t,
            newly_flagged,
            halted: self.halted,
        })
    }

    /// Record a corrected crossing; false if the group was already recorded.
    fn record(&mut self, id: GroupId, t: u64) -> bool {
        if self.table.contains(id) {
            return false;
        }
        // LIL rejects on its count boundary but checks the uncorrected
        // crossing as count > ln(1/alpha), so the two can land in either order.
        let uncorrected_time = *self.uncorrected[id].get_or_insert(t);
        let statistic = self.engine.statistics()[id];
        log_event!(
            self.log,
            DEBUG,
            event_names::AUDIT_GROUP_FLAGGED,
            Stage::Audit,
            "Group flagged",
            group = id,
            t = t,
            t_uncorrected = uncorrected_time,
            statistic = statistic
        );
        self.table.record(RejectionRecord {
            group_id: id,
            rejection_time: t,
            uncorrected_crossing_time: uncorrected_time,
        })
    }

    /// Close the run and summarize it.
    pub fn finish(self) -> AuditOutcome {
        let alpha = self.config.alpha;
        let corrected_thresholds = (0..self.engine.groups())
            .map(|id| self.engine.corrected_threshold(id, alpha))
            .collect();
        let outcome = AuditOutcome {
            algorithm: self.config.algorithm_label(),
            steps: self.t,
            stopped_early: self.stopped_early,
            statistics: self.engine.statistics().to_vec(),
            corrected_thresholds,
            uncorrected_threshold: self.engine.uncorrected_threshold(alpha),
            uncorrected_flagged: self.uncorrected.iter().filter(|t| t.is_some()).count(),
            table: self.table,
        };
        log_event!(
            self.log,
            DEBUG,
            event_names::AUDIT_FINISHED,
            Stage::Audit,
            "Audit finished",
            algorithm = outcome.algorithm.as_str(),
            steps = outcome.steps,
            flagged = outcome.table.len(),
            uncorrected_flagged = outcome.uncorrected_flagged,
            stopped_early = outcome.stopped_early
        );
        outcome
    }
}

/// Run a complete audit over `reports` in iteration order.
///
/// Stops at stream exhaustion, `max_iter`, or a first alarm.
pub fn run_audit<'a, I>(
    reports: I,
    groups: &[Group],
    base_rates: &BaseRates,
    config: &AuditConfig,
) -> Result<AuditOutcome>
where
    I: IntoIterator<Item = &'a Report>,
{
    let run = AuditRun::new(groups.to_vec(), base_rates, config)?;
    drive(run, reports)
}

/// Feed `reports` into `run` until it halts or the stream ends.
pub fn drive<'a, I>(mut run: AuditRun, reports: I) -> Result<AuditOutcome>
where
    I: IntoIterator<Item = &'a Report>,
{
    for report in reports {
        if run.observe(report)?.halted {
            break;
        }
    }
    Ok(run.finish())
}
