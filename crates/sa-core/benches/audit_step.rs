//! Criterion benchmarks for the audit hot path.
//!
//! Benchmarks `AuditRun::observe` per engine and full `run_audit` passes
//! over a fixed stream, varying the number of groups.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sa_common::{BaseRates, Group, Report};
use sa_config::{AuditConfig, LambdaRule, Method};
use sa_core::{run_audit, AuditRun};

// ── Helpers ──────────────────────────────────────────────────────────

/// Reports over `features` binary features, deterministic and mixed.
fn reports(n: usize, features: usize) -> Vec<Report> {
    (0..n)
        .map(|i| {
            (0..features).fold(Report::new(), |r, f| {
                r.with(format!("f{f}"), (i * (f + 3)) % 7 < 2)
            })
        })
        .collect()
}

/// One group per feature plus one pairwise group per adjacent pair.
fn groups(features: usize) -> Vec<Group> {
    let singles = (0..features).map(|f| Group::new().with(format!("f{f}"), true));
    let pairs = (1..features).map(|f| {
        Group::new()
            .with(format!("f{}", f - 1), true)
            .with(format!("f{f}"), true)
    });
    singles.chain(pairs).collect()
}

fn configs() -> Vec<(&'static str, AuditConfig)> {
    // Far from any rejection so every step does full work
    let base = AuditConfig {
        beta: 3.0,
        ..AuditConfig::default()
    };
    vec![
        ("eval_ons", base.clone()),
        (
            "eval_agrapa",
            AuditConfig {
                lambda_rule: LambdaRule::Agrapa,
                ..base.clone()
            },
        ),
        (
            "sprt",
            AuditConfig {
                method: Method::Sprt,
                ..base.clone()
            },
        ),
        (
            "lil",
            AuditConfig {
                method: Method::Lil,
                ..base
            },
        ),
    ]
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe");
    let stream = reports(1_000, 8);
    let groups = groups(8);
    let rates = BaseRates::new(vec![0.2; groups.len()]);

    for (name, config) in configs() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || AuditRun::new(groups.clone(), &rates, &config).unwrap(),
                |mut run| {
                    for report in &stream {
                        black_box(run.observe(report).unwrap());
                    }
                    run
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_run_audit_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_audit");
    let config = AuditConfig {
        beta: 3.0,
        ..AuditConfig::default()
    };

    for features in [2usize, 8, 32] {
        let stream = reports(2_000, features);
        let groups = groups(features);
        let rates = BaseRates::new(vec![0.2; groups.len()]);
        group.bench_with_input(
            BenchmarkId::new("groups", groups.len()),
            &groups,
            |b, groups| {
                b.iter(|| black_box(run_audit(&stream, groups, &rates, &config).unwrap()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_observe, bench_run_audit_scaling);
criterion_main!(benches);
