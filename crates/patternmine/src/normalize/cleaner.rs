//! The full cleaning pipeline: normalize, then handle outliers.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{OutlierDetector, OutlierReport, FLAG_FIELD};
use crate::record::{FieldSchema, Record};

use super::normalizer::{NormalizeReport, Normalizer};

/// What to do with an outlying value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Keep the value and tag the record.
    #[default]
    Flag,
    /// Replace the value with null.
    Clear,
}

/// Output of a cleaning run.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub records: Vec<Record>,
    pub normalize: NormalizeReport,
    pub outliers: OutlierReport,
}

/// Normalizer plus z-score outlier handling over every numeric field.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    normalizer: Normalizer,
    detector: OutlierDetector,
    policy: OutlierPolicy,
}

impl Cleaner {
    /// Create a cleaner that flags outliers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce fields to declared types before outlier detection.
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.normalizer = Normalizer::with_schema(schema);
        self
    }

    /// Use a custom outlier detector.
    pub fn with_detector(mut self, detector: OutlierDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Choose how outliers are handled.
    pub fn with_policy(mut self, policy: OutlierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Clean a record set.
    pub fn clean(&self, records: &[Record]) -> Cleaned {
        let normalized = self.normalizer.run(records);

        let fields: Vec<String> = normalized
            .records
            .iter()
            .flat_map(|r| {
                r.iter()
                    .filter(|(k, v)| *k != FLAG_FIELD && v.is_number())
                    .map(|(k, _)| k.to_string())
            })
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        let (records, outliers) = match self.policy {
            OutlierPolicy::Flag => self.detector.flag(&normalized.records, &fields),
            OutlierPolicy::Clear => {
                let report = self.detector.detect(&normalized.records, &fields);
                let mut records = normalized.records;
                for flag in report.by_field.values().flatten() {
                    if let Some(record) = records.get_mut(flag.record) {
                        record.insert(flag.field.clone(), Value::Null);
                    }
                }
                (records, report)
            }
        };

        Cleaned {
            records,
            normalize: normalized.report,
            outliers,
        }
    }
}
