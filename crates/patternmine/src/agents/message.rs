//! Messages exchanged between the dispatcher and pattern agents.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::profit_rules::HistoryEntry;
use super::result::PatternResult;
use crate::record::Record;

/// What a message asks the receiver to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Run pattern detection.
    RequestPattern,
    /// Return the records the agent holds.
    FetchLatestData,
    /// Return prior results, for agents that keep them.
    GetHistory,
    /// Any other request type.
    Other(String),
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::RequestPattern => write!(f, "REQUEST_PATTERN"),
            MessageKind::FetchLatestData => write!(f, "FETCH_LATEST_DATA"),
            MessageKind::GetHistory => write!(f, "GET_HISTORY"),
            MessageKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// A routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub receiver: String,
    pub kind: MessageKind,
    /// Free-text query for agents that accept one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Message {
    /// Create a message without a prompt.
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            kind,
            prompt: None,
        }
    }

    /// Shorthand for a `RequestPattern` message.
    pub fn request_pattern(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self::new(sender, receiver, MessageKind::RequestPattern)
    }

    /// Attach a free-text query.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// An agent's answer to a message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", content = "data", rename_all = "snake_case")]
pub enum Reply {
    Pattern(PatternResult),
    Records(Vec<Record>),
    History(Vec<HistoryEntry>),
}

impl Reply {
    /// The pattern result, if this is one.
    pub fn into_pattern(self) -> Option<PatternResult> {
        match self {
            Reply::Pattern(result) => Some(result),
            _ => None,
        }
    }
}
