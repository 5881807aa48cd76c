//! Repeat business: mean profit of returning clients against first-time ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::result::{PatternKind, PatternPayload, PatternResult};
use super::PatternAgent;
use crate::engine::{format_thousands, mean};
use crate::error::Result;
use crate::record::Record;

/// Mean profit of repeat versus new clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatClientSummary {
    pub repeat_projects: usize,
    pub new_projects: usize,
    /// 0 when there are no repeat projects.
    pub avg_profit_repeat: f64,
    /// 0 when there are no new-client projects.
    pub avg_profit_new: f64,
}

impl RepeatClientSummary {
    pub fn repeat_more_profitable(&self) -> bool {
        self.avg_profit_repeat > self.avg_profit_new
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "Repeat clients: {} projects, avg profit: {}",
                self.repeat_projects,
                format_thousands(self.avg_profit_repeat)
            ),
            format!(
                "New clients: {} projects, avg profit: {}",
                self.new_projects,
                format_thousands(self.avg_profit_new)
            ),
            format!(
                "Repeat clients are {} profitable on average.",
                if self.repeat_more_profitable() { "more" } else { "less" }
            ),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct RepeatClientAgent {
    records: Arc<[Record]>,
}

impl RepeatClientAgent {
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn summarize(&self) -> RepeatClientSummary {
        let (repeat, new): (Vec<&Record>, Vec<&Record>) = self
            .records
            .iter()
            .partition(|r| r.flag("is_repeat_client").unwrap_or(false));

        let avg_profit = |projects: &[&Record]| {
            let profits: Vec<f64> = projects.iter().filter_map(|r| r.number("profit")).collect();
            mean(&profits).unwrap_or(0.0)
        };

        RepeatClientSummary {
            repeat_projects: repeat.len(),
            new_projects: new.len(),
            avg_profit_repeat: avg_profit(&repeat),
            avg_profit_new: avg_profit(&new),
        }
    }
}

impl PatternAgent for RepeatClientAgent {
    fn name(&self) -> &str {
        "repeat_clients"
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        Ok(PatternResult::new(
            PatternKind::RepeatClients,
            PatternPayload::RepeatClients(self.summarize()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeat_vs_new() {
        let records: Vec<Record> = vec![
            json!({"is_repeat_client": true, "profit": 200000}),
            json!({"is_repeat_client": true, "profit": 100000}),
            json!({"is_repeat_client": false, "profit": 90000}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect();

        let summary = RepeatClientAgent::new(records).summarize();
        assert_eq!(summary.repeat_projects, 2);
        assert_eq!(summary.avg_profit_repeat, 150000.0);
        let lines = summary.lines();
        assert_eq!(lines[0], "Repeat clients: 2 projects, avg profit: 150,000");
        assert_eq!(lines[2], "Repeat clients are more profitable on average.");
    }
}
