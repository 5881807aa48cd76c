//! Seasonality: how sales spread over the months of the year.

use std::sync::Arc;

use super::result::{Distribution, PatternKind, PatternPayload, PatternResult};
use super::PatternAgent;
use crate::engine::{most_common, value_counts};
use crate::error::Result;
use crate::record::Record;

/// Distribution of sales over months.
#[derive(Debug, Clone)]
pub struct SeasonalityAgent {
    records: Arc<[Record]>,
    field: String,
    top: usize,
}

impl SeasonalityAgent {
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
            field: "sales_month".to_string(),
            top: 3,
        }
    }

    /// Count a different month field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn distribution(&self) -> Distribution {
        let counts = value_counts(self.records.iter(), &self.field);
        let top = most_common(&counts, self.top);
        Distribution {
            field: self.field.clone(),
            counts,
            top,
        }
    }
}

impl PatternAgent for SeasonalityAgent {
    fn name(&self) -> &str {
        "seasonality"
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        Ok(PatternResult::new(
            PatternKind::Seasonality,
            PatternPayload::Distribution(self.distribution()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_month_distribution() {
        let records: Vec<Record> = [3, 1, 3, 12, 1, 3]
            .iter()
            .filter_map(|m| Record::from_value(json!({ "sales_month": m })))
            .collect();
        let dist = SeasonalityAgent::new(records).distribution();
        assert_eq!(dist.counts.keys().collect::<Vec<_>>(), vec!["3", "1", "12"]);
        assert_eq!(dist.top[0], ("3".to_string(), 3));
        assert_eq!(dist.top[1], ("1".to_string(), 2));
    }
}
