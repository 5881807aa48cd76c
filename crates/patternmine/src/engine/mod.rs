//! The pattern-mining engine: grouping, statistics, outliers and rules.

mod aggregate;
mod correlation;
mod outlier;
mod rules;
mod stats;
mod template;

pub use aggregate::{
    group_by, group_by_key, most_common, value_counts, Aggregate, Group, GroupKey, Groups,
    KeyExtractor, KeyPart, Metric, Predicate,
};
pub use correlation::{pearson, Correlation, MIN_PAIRS};
pub use outlier::{is_flagged, OutlierDetector, OutlierFlag, OutlierReport, FLAG_FIELD};
pub use rules::{compare, synthesize, top_n, CandidateKind, Comparison, RuleCandidate, RuleSpec};
pub use stats::{mean, median, NumericSummary, StreamingStats};
pub use template::{format_percent, format_thousands, Template};
