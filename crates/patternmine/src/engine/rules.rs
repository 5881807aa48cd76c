//! Turning group aggregates into ranked, human-readable rules.
//!
//! Two synthesis modes are supported:
//!
//! - **Threshold**: keep groups meeting both a minimum support and a value
//!   threshold, render each through a template, rank by observed value.
//!   When nothing qualifies a single "no pattern" sentinel is returned.
//! - **Comparative**: pick the best and worst group by observed mean and
//!   render a fixed summary, without any gating.

use serde::{Deserialize, Serialize};

use super::aggregate::{Aggregate, GroupKey};
use super::template::{format_thousands, Template};

/// Whether a candidate is a real rule or the "no pattern" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Rule,
    NoPattern,
}

/// A synthesized rule statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCandidate {
    pub kind: CandidateKind,
    /// Group the rule was derived from (absent for the sentinel).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<GroupKey>,
    /// Condition description derived from the group key.
    pub condition: String,
    /// Rendered rule text.
    pub statement: String,
    /// Rate or mean the rule is ranked on.
    pub observed: f64,
    /// Number of records backing the rule.
    pub support: usize,
    /// Predicate true-rate, for rate rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RuleCandidate {
    /// Build a rule from an aggregate and its rendered statement.
    fn from_aggregate(aggregate: &Aggregate, observed: f64, statement: String) -> Self {
        Self {
            kind: CandidateKind::Rule,
            key: Some(aggregate.key.clone()),
            condition: aggregate.key.to_string(),
            statement,
            observed,
            support: aggregate.support,
            confidence: aggregate.confidence,
        }
    }

    /// The "no significant pattern" sentinel.
    pub fn no_pattern(message: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::NoPattern,
            key: None,
            condition: String::new(),
            statement: message.into(),
            observed: 0.0,
            support: 0,
            confidence: None,
        }
    }

    /// Returns true for the sentinel candidate.
    pub fn is_sentinel(&self) -> bool {
        self.kind == CandidateKind::NoPattern
    }
}

/// Threshold-mode parameters for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Minimum group size.
    pub min_support: usize,
    /// Observed value must be strictly above this.
    pub threshold: f64,
    /// Statement template.
    pub template: Template,
    /// Sentinel text when no group qualifies.
    pub no_pattern: String,
}

impl RuleSpec {
    /// Create a rule specification.
    pub fn new(
        min_support: usize,
        threshold: f64,
        template: impl Into<String>,
        no_pattern: impl Into<String>,
    ) -> Self {
        Self {
            min_support,
            threshold,
            template: Template::new(template),
            no_pattern: no_pattern.into(),
        }
    }

    /// The observed value if the aggregate meets both thresholds.
    pub fn qualifies(&self, aggregate: &Aggregate) -> Option<f64> {
        if aggregate.support < self.min_support {
            return None;
        }
        aggregate.observed.filter(|v| *v > self.threshold)
    }
}

/// Threshold mode: qualifying rules ranked by observed value, descending.
///
/// Equal values keep group-encounter order. Returns exactly one sentinel
/// candidate when no aggregate qualifies.
pub fn synthesize(aggregates: &[Aggregate], spec: &RuleSpec) -> Vec<RuleCandidate> {
    let mut rules: Vec<RuleCandidate> = aggregates
        .iter()
        .filter_map(|agg| {
            let observed = spec.qualifies(agg)?;
            Some(RuleCandidate::from_aggregate(agg, observed, spec.template.render(agg)))
        })
        .collect();

    if rules.is_empty() {
        return vec![RuleCandidate::no_pattern(spec.no_pattern.clone())];
    }

    rank(&mut rules);
    rules
}

/// Rank every aggregate by observed value and keep the first `limit`.
///
/// Aggregates without an observed value are ignored. Returns the sentinel
/// when nothing can be ranked.
pub fn top_n(
    aggregates: &[Aggregate],
    limit: usize,
    template: &Template,
    no_pattern: &str,
) -> Vec<RuleCandidate> {
    let mut rules: Vec<RuleCandidate> = aggregates
        .iter()
        .filter_map(|agg| {
            let observed = agg.observed?;
            Some(RuleCandidate::from_aggregate(agg, observed, template.render(agg)))
        })
        .collect();

    if rules.is_empty() || limit == 0 {
        return vec![RuleCandidate::no_pattern(no_pattern)];
    }

    rank(&mut rules);
    rules.truncate(limit);
    rules
}

// Vec::sort_by is stable, so ties keep encounter order.
fn rank(rules: &mut [RuleCandidate]) {
    rules.sort_by(|a, b| b.observed.total_cmp(&a.observed));
}

/// Best and worst group of a comparative synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub best: Aggregate,
    pub worst: Aggregate,
    /// Rendered summary.
    pub summary: String,
}

/// Comparative mode: select the maximum- and minimum-mean aggregates.
///
/// On ties the first encountered aggregate wins. The template may use
/// `{best}`, `{best_mean}`, `{best_support}`, `{worst}`, `{worst_mean}`,
/// `{worst_support}`. Returns `None` when no aggregate has a mean.
pub fn compare(aggregates: &[Aggregate], template: &Template) -> Option<Comparison> {
    let mut scored = aggregates
        .iter()
        .filter_map(|agg| agg.observed.map(|v| (agg, v)));

    let first = scored.next()?;
    let (mut best, mut worst) = (first, first);
    for candidate in scored {
        if candidate.1 > best.1 {
            best = candidate;
        }
        if candidate.1 < worst.1 {
            worst = candidate;
        }
    }

    let (best, best_mean) = best;
    let (worst, worst_mean) = worst;
    let summary = template.render_with(|name| match name {
        "best" => Some(best.key.parts().join(" / ")),
        "best_mean" => Some(format_thousands(best_mean)),
        "best_support" => Some(best.support.to_string()),
        "worst" => Some(worst.key.parts().join(" / ")),
        "worst_mean" => Some(format_thousands(worst_mean)),
        "worst_support" => Some(worst.support.to_string()),
        _ => None,
    });

    Some(Comparison {
        best: best.clone(),
        worst: worst.clone(),
        summary,
    })
}
