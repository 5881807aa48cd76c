//! Structured output of a pattern agent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::churn::{ChurnSummary, HighValueClients, SatisfactionTrends};
use super::profitability::ProfitabilitySummary;
use super::repeat_client::RepeatClientSummary;
use super::tenders::TenderReport;
use crate::engine::RuleCandidate;

/// Which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Churn,
    HighValueClients,
    SatisfactionTrends,
    Seasonality,
    Profitability,
    RepeatClients,
    SuccessRecipe,
    ErpDelay,
    HrTurnover,
    FinancialProfit,
    Tenders,
    ProfitRules,
}

impl PatternKind {
    /// Stable snake_case label.
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::Churn => "churn",
            PatternKind::HighValueClients => "high_value_clients",
            PatternKind::SatisfactionTrends => "satisfaction_trends",
            PatternKind::Seasonality => "seasonality",
            PatternKind::Profitability => "profitability",
            PatternKind::RepeatClients => "repeat_clients",
            PatternKind::SuccessRecipe => "success_recipe",
            PatternKind::ErpDelay => "erp_delay_rules",
            PatternKind::HrTurnover => "hr_turnover_rules",
            PatternKind::FinancialProfit => "financial_profit_rules",
            PatternKind::Tenders => "tenders",
            PatternKind::ProfitRules => "profit_rules",
        }
    }
}

/// Count distribution of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub field: String,
    /// Counts in first-seen order.
    pub counts: IndexMap<String, usize>,
    /// Most frequent values, descending.
    pub top: Vec<(String, usize)>,
}

/// Detector-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternPayload {
    Rules { rules: Vec<RuleCandidate> },
    Churn(ChurnSummary),
    HighValueClients(HighValueClients),
    SatisfactionTrends(SatisfactionTrends),
    Distribution(Distribution),
    Profitability(ProfitabilitySummary),
    RepeatClients(RepeatClientSummary),
    Tenders(TenderReport),
}

/// What a pattern agent returns for `RequestPattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub kind: PatternKind,
    pub payload: PatternPayload,
}

impl PatternResult {
    pub fn new(kind: PatternKind, payload: PatternPayload) -> Self {
        Self { kind, payload }
    }

    /// Rule candidates, for rule-producing detectors.
    pub fn rules(&self) -> Option<&[RuleCandidate]> {
        match &self.payload {
            PatternPayload::Rules { rules } => Some(rules),
            _ => None,
        }
    }

    /// Human-readable lines for terminal output.
    pub fn lines(&self) -> Vec<String> {
        match &self.payload {
            PatternPayload::Rules { rules } => rules.iter().map(|r| r.statement.clone()).collect(),
            PatternPayload::Churn(summary) => summary.lines(),
            PatternPayload::HighValueClients(high) => high.lines(),
            PatternPayload::SatisfactionTrends(trends) => trends.lines(),
            PatternPayload::Distribution(dist) => {
                let mut lines: Vec<String> = dist
                    .counts
                    .iter()
                    .map(|(value, count)| format!("{} = {}: {}", dist.field, value, count))
                    .collect();
                if !dist.top.is_empty() {
                    let top: Vec<String> = dist.top.iter().map(|(v, c)| format!("{} ({})", v, c)).collect();
                    lines.push(format!("Most active: {}", top.join(", ")));
                }
                lines
            }
            PatternPayload::Profitability(summary) => summary.lines.clone(),
            PatternPayload::RepeatClients(summary) => summary.lines(),
            PatternPayload::Tenders(report) => report.lines(),
        }
    }
}
