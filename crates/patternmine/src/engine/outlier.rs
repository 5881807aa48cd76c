//! Z-score outlier detection over numeric fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::record::Record;

use super::stats::StreamingStats;

/// Field that carries outlier tags in flag mode.
pub const FLAG_FIELD: &str = "_flagged";

/// A record whose value lies beyond the z-score threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierFlag {
    /// Field the value was read from.
    pub field: String,
    /// Index of the record in the input slice.
    pub record: usize,
    /// The offending value.
    pub value: f64,
    /// Signed z-score of the value.
    pub z_score: f64,
}

impl OutlierFlag {
    /// Tag attached to a record in flag mode.
    pub fn tag(&self) -> String {
        format!("outlier_{}", self.field)
    }
}

/// Outliers found per field, in field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Fields with at least one flagged record.
    pub by_field: IndexMap<String, Vec<OutlierFlag>>,
    /// Fields skipped for having too few numeric observations.
    pub skipped: Vec<String>,
}

impl OutlierReport {
    /// Total number of flags across fields.
    pub fn total(&self) -> usize {
        self.by_field.values().map(Vec::len).sum()
    }

    /// Returns true if nothing was flagged.
    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Flags for one field.
    pub fn flags(&self, field: &str) -> &[OutlierFlag] {
        self.by_field.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve the flagged records of a field against the input slice.
    pub fn flagged_records<'a>(&self, field: &str, records: &'a [Record]) -> Vec<&'a Record> {
        self.flags(field)
            .iter()
            .filter_map(|f| records.get(f.record))
            .collect()
    }
}

/// Flags records whose absolute z-score exceeds a threshold.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    /// Z-score threshold for outlier detection.
    threshold: f64,
    /// Fields with fewer numeric observations are skipped.
    min_observations: usize,
}

impl OutlierDetector {
    /// Create a detector with threshold 3 and a minimum of 5 observations.
    pub fn new() -> Self {
        Self {
            threshold: 3.0,
            min_observations: 5,
        }
    }

    /// Set the z-score threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the minimum number of numeric observations per field.
    pub fn with_min_observations(mut self, min: usize) -> Self {
        self.min_observations = min;
        self
    }

    /// The z-score threshold in use.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Report mode: return the flagged records per field.
    pub fn detect<S: AsRef<str>>(&self, records: &[Record], fields: &[S]) -> OutlierReport {
        let mut report = OutlierReport::default();

        for field in fields {
            let field = field.as_ref();
            let stats: StreamingStats = records.iter().filter_map(|r| r.number(field)).collect();

            if stats.count() < self.min_observations {
                debug!(
                    field,
                    observations = stats.count(),
                    required = self.min_observations,
                    "skipping outlier detection: insufficient data"
                );
                report.skipped.push(field.to_string());
                continue;
            }

            let flags: Vec<OutlierFlag> = records
                .iter()
                .enumerate()
                .filter_map(|(idx, record)| {
                    let value = record.number(field)?;
                    let z = stats.z_score(value)?;
                    (z.abs() > self.threshold).then(|| OutlierFlag {
                        field: field.to_string(),
                        record: idx,
                        value,
                        z_score: z,
                    })
                })
                .collect();

            if !flags.is_empty() {
                report.by_field.insert(field.to_string(), flags);
            }
        }

        report
    }

    /// Flag mode: return copies of the records with outlier tags attached.
    pub fn flag<S: AsRef<str>>(&self, records: &[Record], fields: &[S]) -> (Vec<Record>, OutlierReport) {
        let report = self.detect(records, fields);
        let mut tagged = records.to_vec();

        for flag in report.by_field.values().flatten() {
            if let Some(record) = tagged.get_mut(flag.record) {
                attach_tag(record, flag.tag());
            }
        }

        (tagged, report)
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a tag to a record's flag list, creating it if needed.
fn attach_tag(record: &mut Record, tag: String) {
    let mut tags = match record.get(FLAG_FIELD) {
        Some(Value::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    if !tags.iter().any(|t| t.as_str() == Some(tag.as_str())) {
        tags.push(Value::String(tag));
    }
    record.insert(FLAG_FIELD, Value::Array(tags));
}

/// True if a record carries at least one flag tag.
pub fn is_flagged(record: &Record) -> bool {
    record.list(FLAG_FIELD).is_some_and(|tags| !tags.is_empty())
}
