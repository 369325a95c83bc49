//! Fuzz target for the audit loop.
//!
//! Drives every engine over an arbitrary stream of flag reports and checks
//! the rejection table stays consistent.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sa_common::{BaseRates, Group, Report};
use sa_config::{AuditConfig, LambdaRule, Method};
use sa_core::run_audit;

#[derive(Debug, Arbitrary)]
struct Input {
    method: u8,
    agrapa: bool,
    asymptotic: bool,
    stop_at_first: bool,
    alpha: f64,
    beta: f64,
    rates: [f64; 3],
    rows: Vec<[bool; 3]>,
}

const FLAGS: [&str; 3] = ["f0", "f1", "f2"];

fuzz_target!(|input: Input| {
    let config = AuditConfig {
        alpha: input.alpha,
        beta: input.beta,
        method: match input.method % 3 {
            0 => Method::Eval,
            1 => Method::Sprt,
            _ => Method::Lil,
        },
        lambda_rule: if input.agrapa { LambdaRule::Agrapa } else { LambdaRule::Ons },
        asymptotic: input.asymptotic,
        stop_at_first: input.stop_at_first,
        ..AuditConfig::default()
    };
    let groups: Vec<Group> = FLAGS.iter().map(|f| Group::new().with(*f, true)).collect();
    let reports: Vec<Report> = input
        .rows
        .iter()
        .map(|row| {
            FLAGS
                .iter()
                .zip(row)
                .fold(Report::new(), |r, (f, v)| r.with(*f, *v))
        })
        .collect();

    // Bad alpha, beta, or rates are rejected up front
    let Ok(outcome) = run_audit(&reports, &groups, &BaseRates::new(input.rates.to_vec()), &config)
    else {
        return;
    };
    assert!(outcome.steps <= reports.len() as u64);
    for record in &outcome.table {
        assert!(record.uncorrected_crossing_time <= record.rejection_time);
        assert!(record.rejection_time <= outcome.steps);
    }
    if outcome.stopped_early {
        assert_eq!(outcome.table.len(), 1);
    }
});
