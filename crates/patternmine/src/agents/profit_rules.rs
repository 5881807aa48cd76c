//! Top profit rules with an in-memory result history.
//!
//! The history is bounded: once `history_limit` runs are stored, each new
//! run evicts the oldest one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Message, MessageKind, Reply};
use super::result::{PatternKind, PatternPayload, PatternResult};
use super::{unsupported, PatternAgent};
use crate::engine::{format_thousands, group_by_key, top_n, KeyExtractor, Metric, RuleCandidate, Template};
use crate::error::Result;
use crate::record::Record;

const RULE_TEMPLATE: &str =
    "Si le projet est '{k0}' pour '{k1}' avec une équipe de {k2}, le profit moyen est {mean}.";
const NO_PATTERN: &str = "Aucun pattern de profit élevé détecté.";
const SUMMARY_LINES: usize = 30;
/// Default number of past runs kept.
pub const HISTORY_LIMIT: usize = 20;

/// One past detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Per-group digest the rules were mined from.
    pub summary: Vec<String>,
    pub rules: Vec<RuleCandidate>,
    pub recorded_at: DateTime<Utc>,
}

/// Ranks (project type, industry, team size) groups by mean profit.
#[derive(Debug)]
pub struct ProfitRulesAgent {
    records: Arc<[Record]>,
    key: KeyExtractor,
    limit: usize,
    history_limit: usize,
    history: Mutex<VecDeque<HistoryEntry>>,
}

impl ProfitRulesAgent {
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
            key: KeyExtractor::fields(&["project_type", "industry", "team_size"]),
            limit: 3,
            history_limit: HISTORY_LIMIT,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of rules kept per run.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Number of past runs kept; at least one.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Per-group mean profit lines, first-seen order, at most 30.
    pub fn summarize(&self) -> Vec<String> {
        let groups = group_by_key(&self.records, &self.key);
        groups
            .aggregate(&Self::metric())
            .iter()
            .filter_map(|agg| {
                let mean = agg.observed?;
                Some(format!(
                    "{} | {} | taille équipe {} : profit moyen {} sur {} projets",
                    agg.key.part(0).unwrap_or_default(),
                    agg.key.part(1).unwrap_or_default(),
                    agg.key.part(2).unwrap_or_default(),
                    format_thousands(mean),
                    agg.support
                ))
            })
            .take(SUMMARY_LINES)
            .collect()
    }

    /// Retained runs, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn metric() -> Metric {
        Metric::Mean {
            field: "profit".to_string(),
        }
    }
}

impl PatternAgent for ProfitRulesAgent {
    fn name(&self) -> &str {
        "profit_rules"
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        let groups = group_by_key(&self.records, &self.key);
        let aggregates = groups.aggregate(&Self::metric());
        let rules = top_n(&aggregates, self.limit, &Template::new(RULE_TEMPLATE), NO_PATTERN);

        let entry = HistoryEntry {
            summary: self.summarize(),
            rules: rules.clone(),
            recorded_at: Utc::now(),
        };
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(entry);
        drop(history);

        Ok(PatternResult::new(
            PatternKind::ProfitRules,
            PatternPayload::Rules { rules },
        ))
    }

    fn handle(&self, message: &Message) -> Result<Reply> {
        match message.kind {
            MessageKind::RequestPattern => self.detect().map(Reply::Pattern),
            MessageKind::FetchLatestData => Ok(Reply::Records(self.records.to_vec())),
            MessageKind::GetHistory => Ok(Reply::History(self.history())),
            ref other => Err(unsupported(self.name(), other)),
        }
    }
}
