//! CRM analyses: churn, high-value clients and satisfaction trends.
//!
//! `detect` answers the configured query (churn by default); routed
//! messages may pick another one with a free-text prompt.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::message::{Message, MessageKind, Reply};
use super::result::{PatternKind, PatternPayload, PatternResult};
use super::{match_prompt, unsupported, PatternAgent};
use crate::engine::{format_percent, format_thousands, value_counts, Predicate, StreamingStats};
use crate::error::{PatternError, Result};
use crate::record::{Record, UNKNOWN};

/// Minimum `project_value` of a high-value client.
pub const HIGH_VALUE_THRESHOLD: f64 = 500_000.0;
const HIGH_VALUE_LIMIT: usize = 10;

static PROMPT_PATTERNS: Lazy<Vec<(CrmQuery, Regex)>> = Lazy::new(|| {
    vec![
        (CrmQuery::Churn, Regex::new(r"(?i)churn").unwrap()),
        (CrmQuery::HighValueClients, Regex::new(r"(?i)high[- ]value").unwrap()),
        (CrmQuery::SatisfactionTrends, Regex::new(r"(?i)satisfaction").unwrap()),
    ]
});

/// Which CRM analysis to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrmQuery {
    Churn,
    HighValueClients,
    SatisfactionTrends,
}

impl CrmQuery {
    /// Pick a query from a free-text prompt by keyword.
    pub fn from_prompt(prompt: &str) -> Result<Self> {
        match_prompt(&PROMPT_PATTERNS, prompt).ok_or_else(|| {
            PatternError::UnknownQuery(format!(
                "'{}'. Try one of: 'churn', 'high-value clients', or 'satisfaction'",
                prompt.trim()
            ))
        })
    }
}

/// Overall churn figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub total: usize,
    /// Churned fraction; 0 for an empty input.
    pub churn_rate: f64,
    pub churned: usize,
    pub retained: usize,
    /// Churned clients per industry, first-seen order.
    pub churned_by_industry: IndexMap<String, usize>,
}

impl ChurnSummary {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Churn rate: {}% ({}/{} clients, {} retained)",
            format_percent(self.churn_rate),
            self.churned,
            self.total,
            self.retained
        )];
        lines.extend(
            self.churned_by_industry
                .iter()
                .map(|(industry, count)| format!("  {}: {} churned", industry, count)),
        );
        lines
    }
}

/// Clients whose project value reaches a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighValueClients {
    pub threshold: f64,
    /// Every matching record, before truncation.
    pub total: usize,
    /// The first matching records, in input order.
    pub clients: Vec<Record>,
}

impl HighValueClients {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "High-value clients (project_value >= {}): {}",
            format_thousands(self.threshold),
            self.total
        )];
        lines.extend(self.clients.iter().map(|c| {
            let value = c.number("project_value").map(format_thousands).unwrap_or_default();
            format!("  {} ({})", c.key_text("client_name"), value)
        }));
        lines
    }
}

/// Mean satisfaction per client cohort year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionTrends {
    /// Year taken from the client id, first-seen order.
    pub average_by_year: IndexMap<String, f64>,
}

impl SatisfactionTrends {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec!["Average satisfaction by year:".to_string()];
        lines.extend(
            self.average_by_year
                .iter()
                .map(|(year, avg)| format!("  {}: {:.2}", year, avg)),
        );
        lines
    }
}

/// CRM agent; registered as `churn`.
#[derive(Debug, Clone)]
pub struct ChurnAgent {
    records: Arc<[Record]>,
    query: CrmQuery,
}

impl ChurnAgent {
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
            query: CrmQuery::Churn,
        }
    }

    /// Query answered by `detect`.
    pub fn with_query(mut self, query: CrmQuery) -> Self {
        self.query = query;
        self
    }

    /// Answer a free-text prompt.
    pub fn ask(&self, prompt: &str) -> Result<PatternResult> {
        Ok(self.run(CrmQuery::from_prompt(prompt)?))
    }

    /// Run one analysis.
    pub fn run(&self, query: CrmQuery) -> PatternResult {
        match query {
            CrmQuery::Churn => PatternResult::new(PatternKind::Churn, PatternPayload::Churn(self.summarize())),
            CrmQuery::HighValueClients => PatternResult::new(
                PatternKind::HighValueClients,
                PatternPayload::HighValueClients(self.high_value_clients(HIGH_VALUE_THRESHOLD)),
            ),
            CrmQuery::SatisfactionTrends => PatternResult::new(
                PatternKind::SatisfactionTrends,
                PatternPayload::SatisfactionTrends(self.satisfaction_trends()),
            ),
        }
    }

    /// Compute the churn summary without wrapping it.
    pub fn summarize(&self) -> ChurnSummary {
        let churned_flag = Predicate::IsTrue {
            field: "churned".to_string(),
        };
        let churned: Vec<&Record> = self.records.iter().filter(|r| churned_flag.test(r)).collect();

        let total = self.records.len();
        let churn_rate = if total == 0 {
            0.0
        } else {
            churned.len() as f64 / total as f64
        };

        ChurnSummary {
            total,
            churn_rate,
            churned: churned.len(),
            retained: total - churned.len(),
            churned_by_industry: value_counts(churned.iter().copied(), "industry"),
        }
    }

    /// Records with `project_value >= threshold`; at most ten are kept.
    pub fn high_value_clients(&self, threshold: f64) -> HighValueClients {
        let matching: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.number("project_value").is_some_and(|v| v >= threshold))
            .collect();

        HighValueClients {
            threshold,
            total: matching.len(),
            clients: matching.into_iter().take(HIGH_VALUE_LIMIT).cloned().collect(),
        }
    }

    /// Mean `satisfaction` grouped by the year embedded in `client_id`.
    ///
    /// Records without a numeric satisfaction are skipped.
    pub fn satisfaction_trends(&self) -> SatisfactionTrends {
        let mut by_year: IndexMap<String, StreamingStats> = IndexMap::new();
        for record in self.records.iter() {
            if let Some(score) = record.number("satisfaction") {
                by_year.entry(client_year(record)).or_default().add(score);
            }
        }

        SatisfactionTrends {
            average_by_year: by_year
                .into_iter()
                .filter_map(|(year, stats)| Some((year, stats.mean()?)))
                .collect(),
        }
    }
}

impl PatternAgent for ChurnAgent {
    fn name(&self) -> &str {
        "churn"
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        Ok(self.run(self.query))
    }

    fn handle(&self, message: &Message) -> Result<Reply> {
        match (&message.kind, &message.prompt) {
            (MessageKind::RequestPattern, Some(prompt)) => self.ask(prompt).map(Reply::Pattern),
            (MessageKind::RequestPattern, None) => self.detect().map(Reply::Pattern),
            (MessageKind::FetchLatestData, _) => Ok(Reply::Records(self.records.to_vec())),
            (other, _) => Err(unsupported(self.name(), other)),
        }
    }
}

// Client ids carry the onboarding year after a one-letter prefix ("C2021-004").
fn client_year(record: &Record) -> String {
    let year: String = record
        .text("client_id")
        .map(|id| id.chars().skip(1).take(4).collect())
        .unwrap_or_default();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year
    } else {
        UNKNOWN.to_string()
    }
}
