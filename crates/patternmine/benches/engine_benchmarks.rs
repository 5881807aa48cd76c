//! Engine performance benchmarks.
//!
//! Measures normalization, grouping with rule synthesis, and outlier
//! detection over synthetic project records.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use patternmine::agents::{DomainConfig, PatternAgent, RuleAgent};
use patternmine::engine::{group_by_key, synthesize, OutlierDetector};
use patternmine::{Normalizer, Record};

/// Generate ERP-like records with a few missing values and duplicates.
fn generate_records(rows: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    let departments = ["Tech", "Ops", "Finance", "HR", "Sales"];
    let projects = ["X", "Y", "Z", "W"];
    let statuses = ["Delayed", "On time", "Completed"];

    (0..rows)
        .filter_map(|i| {
            let cost = if i % 97 == 0 {
                json!(null)
            } else {
                json!(rng.gen_range(10_000.0..200_000.0))
            };
            Record::from_value(json!({
                "department": departments[rng.gen_range(0..departments.len())],
                "project": projects[rng.gen_range(0..projects.len())],
                "status": statuses[rng.gen_range(0..statuses.len())],
                "cost": cost,
                "duration_months": rng.gen_range(1..24),
            }))
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for rows in [100, 1_000, 10_000] {
        let records = generate_records(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &records, |b, records| {
            let normalizer = Normalizer::new();
            b.iter(|| normalizer.normalize(black_box(records)))
        });
    }

    group.finish();
}

fn bench_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("rules");
    let config = DomainConfig::erp();

    for rows in [1_000, 10_000] {
        let records = generate_records(rows);
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("synthesize", rows), &records, |b, records| {
            b.iter(|| {
                let groups = group_by_key(black_box(records), &config.key);
                synthesize(&groups.aggregate(&config.metric), &config.rule)
            })
        });

        let agent = RuleAgent::erp(records.clone());
        group.bench_function(BenchmarkId::new("agent", rows), |b| b.iter(|| agent.detect()));
    }

    group.finish();
}

fn bench_outliers(c: &mut Criterion) {
    let records = generate_records(10_000);
    let detector = OutlierDetector::new();

    c.bench_function("outliers_10k", |b| {
        b.iter(|| detector.detect(black_box(&records), &["cost", "duration_months"]))
    });
}

criterion_group!(benches, bench_normalize, bench_rules, bench_outliers);
criterion_main!(benches);
