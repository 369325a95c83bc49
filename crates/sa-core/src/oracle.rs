//! Offline ground truth for scoring audits.
//!
//! A group is truly overreported when its empirical share of all reports,
//! divided by its base rate, exceeds `beta`. Computing this needs the whole
//! stream, so it is only used to evaluate sequential runs after the fact.
//!
//! Each row also carries the expected per-report log-wealth growth of a
//! constant bet at the observed rate, and the rough number of reports the
//! e-process would need to reach the corrected threshold.

use crate::matcher::GroupMatcher;
use sa_common::{BaseRates, GroupId, Report, Result};
use sa_math::{bonferroni_log_threshold, expected_log_wealth};
use serde::Serialize;

/// Ground-truth row for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRow {
    pub group_id: GroupId,
    pub group: String,
    pub matches: u64,
    pub report_rate: f64,
    pub base_rate: f64,
    pub ratio: f64,
    pub flagged: bool,
    /// Expected log-wealth gained per report at the observed rate.
    pub expected_growth: f64,
    /// Reports needed to reach `ln(G/alpha)` at that growth; `None` without growth.
    pub detection_delay: Option<f64>,
}

/// Share of `reports` that belong to group `id`; 0 for an empty stream.
pub fn report_rate(matcher: &GroupMatcher, reports: &[Report], id: GroupId) -> Result<f64> {
    let count = match_count(matcher, reports, id)?;
    Ok(share(count, reports.len()))
}

/// Report share of every group.
pub fn report_rates(matcher: &GroupMatcher, reports: &[Report]) -> Result<Vec<f64>> {
    (0..matcher.len())
        .map(|id| report_rate(matcher, reports, id))
        .collect()
}

/// Groups whose report share exceeds `beta` times their base rate.
pub fn flagged_groups(
    matcher: &GroupMatcher,
    reports: &[Report],
    base_rates: &BaseRates,
    beta: f64,
) -> Result<Vec<GroupId>> {
    base_rates.validate(matcher.len())?;
    let mut flagged = Vec::new();
    for (id, &base_rate) in base_rates.as_slice().iter().enumerate() {
        let rate = share(match_count(matcher, reports, id)?, reports.len());
        if rate / base_rate > beta {
            flagged.push(id);
        }
    }
    Ok(flagged)
}

/// Full ground-truth table; `alpha` sets the threshold for detection delays.
pub fn oracle_report(
    matcher: &GroupMatcher,
    reports: &[Report],
    base_rates: &BaseRates,
    beta: f64,
    alpha: f64,
) -> Result<Vec<OracleRow>> {
    base_rates.validate(matcher.len())?;
    let log_threshold = bonferroni_log_threshold(matcher.len(), alpha);
    matcher
        .groups()
        .iter()
        .zip(base_rates.as_slice())
        .enumerate()
        .map(|(id, (group, &base_rate))| {
            let matches = match_count(matcher, reports, id)?;
            let report_rate = share(matches, reports.len());
            let ratio = report_rate / base_rate;
            let growth = expected_log_wealth(report_rate, beta, base_rate);
            Ok(OracleRow {
                group_id: id,
                group: group.to_string(),
                matches,
                report_rate,
                base_rate,
                ratio,
                flagged: ratio > beta,
                expected_growth: growth.growth,
                detection_delay: growth.detection_delay(log_threshold),
            })
        })
        .collect()
}

fn match_count(matcher: &GroupMatcher, reports: &[Report], id: GroupId) -> Result<u64> {
    let mut count = 0;
    for (index, report) in reports.iter().enumerate() {
        if matcher.matches(index, report, id)? {
            count += 1;
        }
    }
    Ok(count)
}

fn share(count: u64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
