//! Deduplication, missing-value fill and type coercion.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use crate::engine::{median, FLAG_FIELD};
use crate::record::{canonical_text, FieldSchema, Record};

/// What a normalization pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Records dropped as exact duplicates.
    pub duplicates_removed: usize,
    /// Missing values replaced by a median or most frequent value.
    pub values_filled: usize,
    /// Declared-type casts that failed and kept the original value.
    pub coercion_failures: usize,
    /// Fields left unset because every record lacks them.
    pub unfilled_fields: Vec<String>,
}

/// Normalized records with a summary of the changes.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub report: NormalizeReport,
}

/// Coerces field values, fills gaps and removes duplicate records.
///
/// Never fails on data-quality issues: an empty input yields an empty
/// output and failed casts keep the original value. Normalizing twice is
/// the same as normalizing once.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    schema: Option<FieldSchema>,
}

impl Normalizer {
    /// Create a normalizer without a field schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer that coerces fields to declared types.
    pub fn with_schema(schema: FieldSchema) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    /// Run the full pass and return only the records.
    pub fn normalize(&self, records: &[Record]) -> Vec<Record> {
        self.run(records).records
    }

    /// Run the full pass: dedupe, fill, coerce, dedupe again.
    pub fn run(&self, records: &[Record]) -> Normalized {
        let mut report = NormalizeReport::default();

        let (mut out, dropped) = dedupe(records.to_vec());
        report.duplicates_removed += dropped;

        self.fill_missing(&mut out, &mut report);

        if let Some(ref schema) = self.schema {
            report.coercion_failures = coerce(&mut out, schema);
        }

        // Filling and coercion can make distinct records identical.
        let (out, dropped) = dedupe(out);
        report.duplicates_removed += dropped;

        debug!(
            input = records.len(),
            output = out.len(),
            duplicates = report.duplicates_removed,
            filled = report.values_filled,
            coercion_failures = report.coercion_failures,
            "normalized records"
        );

        Normalized {
            records: out,
            report,
        }
    }

    fn fill_missing(&self, records: &mut [Record], report: &mut NormalizeReport) {
        // Outlier tags describe individual records, never fill them.
        let fields: IndexSet<String> = records
            .iter()
            .flat_map(|r| r.fields().filter(|f| *f != FLAG_FIELD).map(str::to_string))
            .collect();

        for field in fields {
            let present: Vec<&Value> = records.iter().filter_map(|r| r.value(&field)).collect();
            if present.is_empty() {
                report.unfilled_fields.push(field);
                continue;
            }
            if present.len() == records.len() {
                continue;
            }

            let Some(fill) = fill_value(&present) else {
                continue;
            };

            for record in records.iter_mut() {
                if record.is_missing(&field) {
                    record.insert(field.clone(), fill.clone());
                    report.values_filled += 1;
                }
            }
        }
    }
}

/// Median when every present value is numeric, otherwise the most
/// frequent value (ties go to the first seen).
fn fill_value(present: &[&Value]) -> Option<Value> {
    if present.iter().all(|v| v.is_number()) {
        let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
        return median(&numbers)
            .and_then(Number::from_f64)
            .map(Value::Number);
    }

    let mut counts: IndexMap<String, (usize, &Value)> = IndexMap::new();
    for &value in present {
        counts
            .entry(canonical_text(value))
            .or_insert((0, value))
            .0 += 1;
    }

    let mut best: Option<(usize, &Value)> = None;
    for &(count, value) in counts.values() {
        if best.is_none_or(|(c, _)| count > c) {
            best = Some((count, value));
        }
    }
    best.map(|(_, v)| v.clone())
}

/// Drop later duplicates, keeping first-seen order.
fn dedupe(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let total = records.len();
    let unique: Vec<Record> = records
        .into_iter()
        .filter(|r| seen.insert(r.canonical()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

/// Cast declared fields in place. Returns the number of failed casts.
fn coerce(records: &mut [Record], schema: &FieldSchema) -> usize {
    let mut failures = 0;
    for record in records.iter_mut() {
        for (field, field_type) in schema.iter() {
            let Some(value) = record.value(field) else {
                continue;
            };
            match field_type.coerce(value) {
                Some(cast) => {
                    record.insert(field, cast);
                }
                None => failures += 1,
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldType;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().filter_map(Record::from_value).collect()
    }

    #[test]
    fn test_empty_input() {
        let out = Normalizer::new().run(&[]);
        assert!(out.records.is_empty());
        assert_eq!(out.report, NormalizeReport::default());
    }

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let data = records(vec![
            json!({"id": 2, "a": "x"}),
            json!({"id": 1}),
            json!({"a": "x", "id": 2}),
        ]);
        let out = Normalizer::new().run(&data);
        assert_eq!(out.report.duplicates_removed, 1);
        assert_eq!(out.records[0].number("id"), Some(2.0));
        assert_eq!(out.records[1].number("id"), Some(1.0));
    }

    #[test]
    fn test_numeric_fill_uses_median() {
        let data = records(vec![
            json!({"id": 1, "cost": 10}),
            json!({"id": 2, "cost": null}),
            json!({"id": 3, "cost": 30}),
            json!({"id": 4}),
        ]);
        let out = Normalizer::new().run(&data);
        assert_eq!(out.records[1].number("cost"), Some(20.0));
        assert_eq!(out.records[3].number("cost"), Some(20.0));
        assert_eq!(out.report.values_filled, 2);
    }

    #[test]
    fn test_categorical_fill_uses_mode() {
        let data = records(vec![
            json!({"id": 1, "dept": "Tech"}),
            json!({"id": 2, "dept": "Ops"}),
            json!({"id": 3, "dept": "Ops"}),
            json!({"id": 4, "dept": null}),
        ]);
        let out = Normalizer::new().run(&data);
        assert_eq!(out.records[3].text("dept"), Some("Ops"));
    }

    #[test]
    fn test_all_null_field_left_unset() {
        let data = records(vec![json!({"id": 1, "x": null}), json!({"id": 2})]);
        let out = Normalizer::new().run(&data);
        assert!(out.records.iter().all(|r| r.is_missing("x")));
        assert_eq!(out.report.unfilled_fields, vec!["x".to_string()]);
    }

    #[test]
    fn test_schema_coercion_best_effort() {
        let schema = FieldSchema::new()
            .field("hours", FieldType::Integer)
            .field("churned", FieldType::Boolean);
        let data = records(vec![
            json!({"hours": "120", "churned": "yes"}),
            json!({"hours": "n/a", "churned": false}),
        ]);
        let out = Normalizer::with_schema(schema).run(&data);
        assert_eq!(out.records[0].get("hours"), Some(&json!(120)));
        assert_eq!(out.records[0].flag("churned"), Some(true));
        assert_eq!(out.records[1].text("hours"), Some("n/a"));
        assert_eq!(out.report.coercion_failures, 1);
    }

    #[test]
    fn test_idempotent_after_fill_collision() {
        // Filling makes the two records identical; the second dedupe catches it.
        let data = records(vec![
            json!({"a": 1, "b": "x"}),
            json!({"a": 1, "b": null}),
            json!({"a": 2, "b": "y"}),
            json!({"a": 2, "b": "x"}),
        ]);
        let normalizer = Normalizer::new();
        let once = normalizer.normalize(&data);
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_flag_tags_are_not_filled() {
        let data = records(vec![
            json!({"id": 1, "cost": 10}),
            json!({"id": 2, "cost": 10, "_flagged": ["outlier_cost"]}),
            json!({"id": 3, "cost": 10}),
        ]);
        let out = Normalizer::new().run(&data);
        assert_eq!(out.report.values_filled, 0);
        assert!(out.records[0].get(FLAG_FIELD).is_none());
        assert!(out.records[2].get(FLAG_FIELD).is_none());
    }
}
