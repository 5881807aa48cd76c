//! Domain pattern agents and message dispatch.
//!
//! Each agent holds a shared, read-only view of its records and wires a
//! per-domain configuration into the engine. Agents are `Send + Sync`, so
//! `detect` may be called from several threads at once.

mod churn;
mod config;
mod message;
mod profit_rules;
mod profitability;
mod registry;
mod repeat_client;
mod result;
mod rule_agent;
mod seasonality;
mod tenders;

pub use churn::{ChurnAgent, ChurnSummary, CrmQuery, HighValueClients, SatisfactionTrends};
pub use config::DomainConfig;
pub use message::{Message, MessageKind, Reply};
pub use profit_rules::{HistoryEntry, ProfitRulesAgent};
pub use profitability::{ProfitabilityAgent, ProfitabilitySummary};
pub use registry::Registry;
pub use repeat_client::{RepeatClientAgent, RepeatClientSummary};
pub use result::{Distribution, PatternKind, PatternPayload, PatternResult};
pub use rule_agent::RuleAgent;
pub use seasonality::SeasonalityAgent;
pub use tenders::{BidStats, ResponderActivity, TenderOutcome, TenderQuery, TenderReport, TendersAgent};

use regex::Regex;

use crate::error::{PatternError, Result};
use crate::record::Record;

/// A detector reachable through the [`Registry`].
pub trait PatternAgent: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Records this agent analyzes.
    fn records(&self) -> &[Record];

    /// Run detection over the held records.
    fn detect(&self) -> Result<PatternResult>;

    /// Answer a routed message.
    ///
    /// The default handles `RequestPattern` and `FetchLatestData`; every
    /// other kind is an [`PatternError::UnsupportedMessageKind`].
    fn handle(&self, message: &Message) -> Result<Reply> {
        match message.kind {
            MessageKind::RequestPattern => self.detect().map(Reply::Pattern),
            MessageKind::FetchLatestData => Ok(Reply::Records(self.records().to_vec())),
            ref other => Err(unsupported(self.name(), other)),
        }
    }
}

pub(crate) fn unsupported(receiver: &str, kind: &MessageKind) -> PatternError {
    PatternError::UnsupportedMessageKind {
        receiver: receiver.to_string(),
        kind: kind.to_string(),
    }
}

/// First query whose pattern matches the prompt.
pub(crate) fn match_prompt<Q: Copy>(patterns: &[(Q, Regex)], prompt: &str) -> Option<Q> {
    patterns
        .iter()
        .find(|(_, re)| re.is_match(prompt))
        .map(|(query, _)| *query)
}
