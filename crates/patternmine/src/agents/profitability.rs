//! Best and worst project types and industries by mean profit.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::result::{PatternKind, PatternPayload, PatternResult};
use super::PatternAgent;
use crate::engine::{compare, group_by_key, mean, Comparison, KeyExtractor, Metric, Template};
use crate::error::Result;
use crate::record::Record;

const TYPE_TEMPLATE: &str = "Most profitable project type: {best} (avg profit: {best_mean})\n\
                             Least profitable project type: {worst} (avg profit: {worst_mean})";
const INDUSTRY_TEMPLATE: &str = "Most profitable industry: {best} (avg profit: {best_mean})\n\
                                 Least profitable industry: {worst} (avg profit: {worst_mean})";

/// Comparative profitability figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilitySummary {
    pub by_type: Option<Comparison>,
    pub by_industry: Option<Comparison>,
    pub avg_profit_by_type: IndexMap<String, f64>,
    pub avg_profit_by_industry: IndexMap<String, f64>,
    /// Mean profit margin over records carrying one.
    pub avg_margin: Option<f64>,
    /// `Profit ≈ m × Revenue`.
    pub equation: Option<String>,
    pub lines: Vec<String>,
}

/// Comparative mode over project type and industry.
#[derive(Debug, Clone)]
pub struct ProfitabilityAgent {
    records: Arc<[Record]>,
}

impl ProfitabilityAgent {
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn summarize(&self) -> ProfitabilitySummary {
        let profit = Metric::Mean {
            field: "profit".to_string(),
        };

        let (by_type, avg_profit_by_type) = self.compare_on("project_type", &profit, TYPE_TEMPLATE);
        let (by_industry, avg_profit_by_industry) =
            self.compare_on("industry", &profit, INDUSTRY_TEMPLATE);

        let margins: Vec<f64> = self.records.iter().filter_map(|r| r.number("profit_margin")).collect();
        let avg_margin = mean(&margins);
        let equation = avg_margin.map(|m| format!("Profit ≈ {:.2} × Revenue", m));

        let mut lines: Vec<String> = [&by_type, &by_industry]
            .into_iter()
            .flatten()
            .flat_map(|c| c.summary.lines().map(str::to_string).collect::<Vec<_>>())
            .collect();
        if let Some(ref eq) = equation {
            lines.push(format!("General profit equation: {}", eq));
        }

        ProfitabilitySummary {
            by_type,
            by_industry,
            avg_profit_by_type,
            avg_profit_by_industry,
            avg_margin,
            equation,
            lines,
        }
    }

    fn compare_on(
        &self,
        field: &str,
        metric: &Metric,
        template: &str,
    ) -> (Option<Comparison>, IndexMap<String, f64>) {
        let groups = group_by_key(&self.records, &KeyExtractor::fields(&[field]));
        let aggregates = groups.aggregate(metric);
        let means = aggregates
            .iter()
            .filter_map(|a| Some((a.key.part(0)?.to_string(), a.observed?)))
            .collect();
        (compare(&aggregates, &Template::new(template)), means)
    }
}

impl PatternAgent for ProfitabilityAgent {
    fn name(&self) -> &str {
        "profitability"
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        Ok(PatternResult::new(
            PatternKind::Profitability,
            PatternPayload::Profitability(self.summarize()),
        ))
    }
}
