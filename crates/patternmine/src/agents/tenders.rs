//! Call-for-tenders statistics selected by a free-text query.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::message::{Message, MessageKind, Reply};
use super::result::{PatternKind, PatternPayload, PatternResult};
use super::{match_prompt, unsupported, PatternAgent};
use crate::engine::{format_percent, format_thousands, StreamingStats};
use crate::error::{PatternError, Result};
use crate::record::Record;

/// Keyword patterns in match order; the first hit wins.
static PROMPT_PATTERNS: Lazy<Vec<(TenderQuery, Regex)>> = Lazy::new(|| {
    vec![
        (
            TenderQuery::SuccessRate,
            Regex::new(r"(?i)success rate|tender success").unwrap(),
        ),
        (
            TenderQuery::BidAmounts,
            Regex::new(r"(?i)bid amount|bids").unwrap(),
        ),
        (
            TenderQuery::ResponderActivity,
            Regex::new(r"(?i)responder activity|responder patterns").unwrap(),
        ),
        (
            TenderQuery::StatusDistribution,
            Regex::new(r"(?i)status distribution|tender status").unwrap(),
        ),
    ]
});

/// Which tender statistic to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderQuery {
    SuccessRate,
    BidAmounts,
    ResponderActivity,
    StatusDistribution,
}

impl TenderQuery {
    /// Pick a query from a free-text prompt by keyword.
    pub fn from_prompt(prompt: &str) -> Result<Self> {
        match_prompt(&PROMPT_PATTERNS, prompt).ok_or_else(|| {
            PatternError::UnknownQuery(format!(
                "'{}'. Try one of: 'success rate', 'bid amount', 'responder activity', or 'status distribution'",
                prompt.trim()
            ))
        })
    }
}

/// Bid amount statistics over tender responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidStats {
    /// Rounded to two decimals.
    pub average_bid: f64,
    pub max_bid: f64,
    pub min_bid: f64,
    pub num_bids: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderActivity {
    pub total_responders: usize,
    pub bids_per_responder: IndexMap<String, usize>,
    pub accepted_bids_per_responder: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderOutcome {
    SuccessRates {
        /// Rounded to three decimals.
        overall_success_rate: f64,
        success_by_type: IndexMap<String, usize>,
        total_tenders: usize,
        awarded_tenders: usize,
    },
    /// `None` when no response carries a bid amount.
    BidAmounts(Option<BidStats>),
    ResponderActivity(ResponderActivity),
    StatusDistribution {
        status_counts: IndexMap<String, usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderReport {
    pub query: TenderQuery,
    pub outcome: TenderOutcome,
}

impl TenderReport {
    pub fn lines(&self) -> Vec<String> {
        match &self.outcome {
            TenderOutcome::SuccessRates {
                overall_success_rate,
                success_by_type,
                total_tenders,
                awarded_tenders,
            } => {
                let mut lines = vec![format!(
                    "Tender success rate: {}% ({}/{} awarded)",
                    format_percent(*overall_success_rate),
                    awarded_tenders,
                    total_tenders
                )];
                lines.extend(success_by_type.iter().map(|(t, n)| format!("  {}: {} awarded", t, n)));
                lines
            }
            TenderOutcome::BidAmounts(None) => vec!["No bid amounts available.".to_string()],
            TenderOutcome::BidAmounts(Some(stats)) => vec![format!(
                "Bids: {} (avg {:.2}, min {}, max {})",
                stats.num_bids,
                stats.average_bid,
                format_thousands(stats.min_bid),
                format_thousands(stats.max_bid)
            )],
            TenderOutcome::ResponderActivity(activity) => {
                let mut lines = vec![format!("Responders: {}", activity.total_responders)];
                lines.extend(activity.bids_per_responder.iter().map(|(name, bids)| {
                    let accepted = activity.accepted_bids_per_responder.get(name).copied().unwrap_or(0);
                    format!("  {}: {} bids, {} accepted", name, bids, accepted)
                }));
                lines
            }
            TenderOutcome::StatusDistribution { status_counts } => status_counts
                .iter()
                .map(|(status, n)| format!("{}: {}", status, n))
                .collect(),
        }
    }
}

/// Tender and response statistics.
#[derive(Debug, Clone)]
pub struct TendersAgent {
    tenders: Arc<[Record]>,
    responses: Arc<[Record]>,
    query: TenderQuery,
}

impl TendersAgent {
    /// Create an agent answering `SuccessRate` by default.
    pub fn new(tenders: impl Into<Arc<[Record]>>, responses: impl Into<Arc<[Record]>>) -> Self {
        Self {
            tenders: tenders.into(),
            responses: responses.into(),
            query: TenderQuery::SuccessRate,
        }
    }

    /// Query answered by `detect`.
    pub fn with_query(mut self, query: TenderQuery) -> Self {
        self.query = query;
        self
    }

    /// Answer a free-text prompt.
    pub fn ask(&self, prompt: &str) -> Result<PatternResult> {
        Ok(self.run(TenderQuery::from_prompt(prompt)?))
    }

    /// Compute one statistic.
    pub fn run(&self, query: TenderQuery) -> PatternResult {
        let outcome = match query {
            TenderQuery::SuccessRate => self.success_rates(),
            TenderQuery::BidAmounts => TenderOutcome::BidAmounts(self.bid_stats()),
            TenderQuery::ResponderActivity => TenderOutcome::ResponderActivity(self.responder_activity()),
            TenderQuery::StatusDistribution => TenderOutcome::StatusDistribution {
                status_counts: count_by(self.tenders.iter(), "status"),
            },
        };
        PatternResult::new(PatternKind::Tenders, PatternPayload::Tenders(TenderReport { query, outcome }))
    }

    fn success_rates(&self) -> TenderOutcome {
        let awarded: Vec<&Record> = self
            .tenders
            .iter()
            .filter(|t| has_status(t, "awarded"))
            .collect();
        let rate = if self.tenders.is_empty() {
            0.0
        } else {
            awarded.len() as f64 / self.tenders.len() as f64
        };

        TenderOutcome::SuccessRates {
            overall_success_rate: (rate * 1000.0).round() / 1000.0,
            success_by_type: count_by(awarded.iter().copied(), "tender_type"),
            total_tenders: self.tenders.len(),
            awarded_tenders: awarded.len(),
        }
    }

    fn bid_stats(&self) -> Option<BidStats> {
        let mut stats = StreamingStats::new();
        let mut max_bid = f64::NEG_INFINITY;
        let mut min_bid = f64::INFINITY;
        for bid in self.responses.iter().filter_map(|r| r.number("bid_amount")) {
            stats.add(bid);
            max_bid = max_bid.max(bid);
            min_bid = min_bid.min(bid);
        }

        let average = stats.mean()?;
        Some(BidStats {
            average_bid: (average * 100.0).round() / 100.0,
            max_bid,
            min_bid,
            num_bids: stats.count(),
        })
    }

    fn responder_activity(&self) -> ResponderActivity {
        let bids_per_responder = count_by(self.responses.iter(), "responder");
        let accepted_bids_per_responder = count_by(
            self.responses.iter().filter(|r| has_status(r, "accepted")),
            "responder",
        );
        ResponderActivity {
            total_responders: bids_per_responder.len(),
            bids_per_responder,
            accepted_bids_per_responder,
        }
    }
}

impl PatternAgent for TendersAgent {
    fn name(&self) -> &str {
        "tenders"
    }

    fn records(&self) -> &[Record] {
        &self.tenders
    }

    fn detect(&self) -> Result<PatternResult> {
        Ok(self.run(self.query))
    }

    fn handle(&self, message: &Message) -> Result<Reply> {
        match (&message.kind, &message.prompt) {
            (MessageKind::RequestPattern, Some(prompt)) => self.ask(prompt).map(Reply::Pattern),
            (MessageKind::RequestPattern, None) => self.detect().map(Reply::Pattern),
            (MessageKind::FetchLatestData, _) => Ok(Reply::Records(self.tenders.to_vec())),
            (other, _) => Err(unsupported(self.name(), other)),
        }
    }
}

fn has_status(record: &Record, status: &str) -> bool {
    record.text("status").is_some_and(|s| s.eq_ignore_ascii_case(status))
}

/// Count rendered values of a field; missing values count as `Unknown`.
fn count_by<'a>(records: impl Iterator<Item = &'a Record>, field: &str) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for record in records {
        *counts.entry(record.key_text(field)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().filter_map(Record::from_value).collect()
    }

    fn agent() -> TendersAgent {
        let tenders = records(vec![
            json!({"status": "Awarded", "tender_type": "Public"}),
            json!({"status": "open", "tender_type": "Private"}),
            json!({"status": "awarded", "tender_type": "Public"}),
        ]);
        let responses = records(vec![
            json!({"responder": "Acme", "bid_amount": 1000, "status": "accepted"}),
            json!({"responder": "Beta", "bid_amount": 2500.5, "status": "rejected"}),
            json!({"responder": "Acme", "status": "Accepted"}),
        ]);
        TendersAgent::new(tenders, responses)
    }

    #[test]
    fn test_prompt_keywords() {
        assert_eq!(TenderQuery::from_prompt("Show tender success rate").unwrap(), TenderQuery::SuccessRate);
        assert_eq!(TenderQuery::from_prompt("Give me BID AMOUNT stats").unwrap(), TenderQuery::BidAmounts);
        assert_eq!(
            TenderQuery::from_prompt("Analyze responder activity").unwrap(),
            TenderQuery::ResponderActivity
        );
        assert_eq!(
            TenderQuery::from_prompt("Display tender status distribution").unwrap(),
            TenderQuery::StatusDistribution
        );
        assert!(matches!(
            TenderQuery::from_prompt("What's the win rate by type?"),
            Err(PatternError::UnknownQuery(_))
        ));
    }

    #[test]
    fn test_success_rate_is_case_insensitive() {
        let result = agent().run(TenderQuery::SuccessRate);
        let PatternPayload::Tenders(report) = result.payload else {
            panic!("expected tender report");
        };
        match report.outcome {
            TenderOutcome::SuccessRates {
                overall_success_rate,
                success_by_type,
                awarded_tenders,
                ..
            } => {
                assert_eq!(awarded_tenders, 2);
                assert_eq!(overall_success_rate, 0.667);
                assert_eq!(success_by_type.get("Public"), Some(&2));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_bid_stats() {
        let stats = agent().bid_stats().unwrap();
        assert_eq!(stats.num_bids, 2);
        assert_eq!(stats.average_bid, 1750.25);
        assert_eq!(stats.max_bid, 2500.5);
        assert_eq!(stats.min_bid, 1000.0);

        let empty = TendersAgent::new(Vec::<Record>::new(), Vec::<Record>::new());
        assert!(empty.bid_stats().is_none());
    }

    #[test]
    fn test_responder_activity() {
        let activity = agent().responder_activity();
        assert_eq!(activity.total_responders, 2);
        assert_eq!(activity.bids_per_responder.get("Acme"), Some(&2));
        assert_eq!(activity.accepted_bids_per_responder.get("Acme"), Some(&2));
        assert_eq!(activity.accepted_bids_per_responder.get("Beta"), None);
    }

    #[test]
    fn test_prompt_message_routes_query() {
        let msg = Message::request_pattern("cli", "tenders").with_prompt("tender status please");
        let reply = agent().handle(&msg).unwrap().into_pattern().unwrap();
        let PatternPayload::Tenders(report) = reply.payload else {
            panic!("expected tender report");
        };
        assert_eq!(report.query, TenderQuery::StatusDistribution);
    }
}
