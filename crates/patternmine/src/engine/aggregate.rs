//! Grouping records by composite keys and summarizing each group.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{render_value, Record, UNKNOWN};

/// A fixed-arity tuple of rendered field values partitioning a record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(Vec<String>);

impl GroupKey {
    /// Create a key from its parts.
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    /// Key parts in order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// A single part by position.
    pub fn part(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(|s| s.as_str())
    }

    /// Number of parts.
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(" | "))
    }
}

impl<S: Into<String>> FromIterator<S> for GroupKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// One component of a declarative grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyPart {
    /// The field's value as-is.
    Field { field: String },
    /// Split a numeric field into two labelled buckets.
    Bucket {
        field: String,
        below: f64,
        low: String,
        high: String,
    },
    /// A list field reduced to its distinct items, sorted.
    SortedSet { field: String },
}

impl KeyPart {
    /// Shorthand for [`KeyPart::Field`].
    pub fn field(name: impl Into<String>) -> Self {
        KeyPart::Field { field: name.into() }
    }

    /// The record field this part reads.
    pub fn source_field(&self) -> &str {
        match self {
            KeyPart::Field { field } | KeyPart::Bucket { field, .. } | KeyPart::SortedSet { field } => {
                field
            }
        }
    }

    fn extract(&self, record: &Record) -> String {
        match self {
            KeyPart::Field { field } => record.key_text(field),
            KeyPart::Bucket { field, below, low, high } => match record.number(field) {
                Some(v) if v < *below => low.clone(),
                Some(_) => high.clone(),
                None => UNKNOWN.to_string(),
            },
            KeyPart::SortedSet { field } => match record.value(field) {
                Some(Value::Array(items)) => {
                    let mut distinct: Vec<String> = items.iter().map(render_value).collect();
                    distinct.sort();
                    distinct.dedup();
                    distinct.join(", ")
                }
                Some(other) => render_value(other),
                None => UNKNOWN.to_string(),
            },
        }
    }
}

/// A declarative `Record -> GroupKey` function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyExtractor {
    pub parts: Vec<KeyPart>,
}

impl KeyExtractor {
    /// Create an extractor from its parts.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    /// Group by plain fields.
    pub fn fields(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| KeyPart::field(*n)).collect())
    }

    /// Compute the key of a record.
    pub fn extract(&self, record: &Record) -> GroupKey {
        GroupKey(self.parts.iter().map(|p| p.extract(record)).collect())
    }

    /// Fields read by this extractor.
    pub fn source_fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(KeyPart::source_field)
    }
}

/// A boolean test over one record. Missing fields evaluate to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals a value.
    Equals { field: String, value: Value },
    /// Boolean field is true.
    IsTrue { field: String },
    /// Numeric field strictly above a threshold.
    Above { field: String, threshold: f64 },
}

impl Predicate {
    /// Evaluate against a record.
    pub fn test(&self, record: &Record) -> bool {
        match self {
            Predicate::Equals { field, value } => match (record.get(field), value) {
                (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
                (Some(actual), expected) => actual == expected,
                (None, _) => false,
            },
            Predicate::IsTrue { field } => record.flag(field).unwrap_or(false),
            Predicate::Above { field, threshold } => {
                record.number(field).is_some_and(|v| v > *threshold)
            }
        }
    }

    /// The record field this predicate reads.
    pub fn source_field(&self) -> &str {
        match self {
            Predicate::Equals { field, .. }
            | Predicate::IsTrue { field }
            | Predicate::Above { field, .. } => field,
        }
    }
}

/// Per-group quantity a rule is judged on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    /// Fraction of members satisfying a predicate.
    Rate { predicate: Predicate },
    /// Mean of a numeric field over members.
    Mean { field: String },
}

impl Metric {
    /// The record field this metric reads.
    pub fn source_field(&self) -> &str {
        match self {
            Metric::Rate { predicate } => predicate.source_field(),
            Metric::Mean { field } => field,
        }
    }
}

/// A group of records sharing one key. Never empty.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub members: Vec<&'a Record>,
}

impl<'a> Group<'a> {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: groups are created with their first member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members satisfying a predicate.
    pub fn hits(&self, predicate: &Predicate) -> usize {
        self.members.iter().filter(|r| predicate.test(r)).count()
    }

    /// Fraction of members satisfying a predicate.
    pub fn rate(&self, predicate: &Predicate) -> f64 {
        self.hits(predicate) as f64 / self.len() as f64
    }

    /// Mean of a numeric field over members carrying it.
    pub fn mean(&self, field: &str) -> Option<f64> {
        let values: Vec<f64> = self.members.iter().filter_map(|r| r.number(field)).collect();
        super::stats::mean(&values)
    }

    /// Summarize this group under a metric.
    pub fn aggregate(&self, metric: &Metric) -> Aggregate {
        let (hits, observed, confidence) = match metric {
            Metric::Rate { predicate } => {
                let hits = self.hits(predicate);
                let rate = hits as f64 / self.len() as f64;
                (hits, Some(rate), Some(rate))
            }
            Metric::Mean { field } => (0, self.mean(field), None),
        };
        Aggregate {
            key: self.key.clone(),
            support: self.len(),
            hits,
            observed,
            confidence,
        }
    }
}

/// Numeric summary of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub key: GroupKey,
    /// Member count.
    pub support: usize,
    /// Members satisfying the predicate (rate metrics only).
    pub hits: usize,
    /// Rate or mean; `None` when no member carries the metric field.
    pub observed: Option<f64>,
    /// Predicate true-rate, for rate metrics.
    pub confidence: Option<f64>,
}

/// Groups in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct Groups<'a> {
    groups: IndexMap<GroupKey, Group<'a>>,
}

impl<'a> Groups<'a> {
    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Look up a group by key.
    pub fn get(&self, key: &GroupKey) -> Option<&Group<'a>> {
        self.groups.get(key)
    }

    /// Iterate over groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Group<'a>> {
        self.groups.values()
    }

    /// Total number of grouped records.
    pub fn total_members(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    /// Summarize every group under a metric, in group order.
    pub fn aggregate(&self, metric: &Metric) -> Vec<Aggregate> {
        self.groups.values().map(|g| g.aggregate(metric)).collect()
    }
}

/// Partition records by a grouping function.
pub fn group_by<'a, F>(records: &'a [Record], key_fn: F) -> Groups<'a>
where
    F: Fn(&Record) -> GroupKey,
{
    let mut groups: IndexMap<GroupKey, Group<'a>> = IndexMap::new();
    for record in records {
        let key = key_fn(record);
        groups
            .entry(key.clone())
            .or_insert_with(|| Group {
                key,
                members: Vec::new(),
            })
            .members
            .push(record);
    }
    Groups { groups }
}

/// Partition records by a declarative extractor.
pub fn group_by_key<'a>(records: &'a [Record], extractor: &KeyExtractor) -> Groups<'a> {
    group_by(records, |r| extractor.extract(r))
}

/// Occurrences of each rendered value of a field, in first-seen order.
/// Records missing the field are skipped.
pub fn value_counts<'a, I>(records: I, field: &str) -> IndexMap<String, usize>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        if let Some(value) = record.value(field) {
            *counts.entry(render_value(value)).or_insert(0) += 1;
        }
    }
    counts
}

/// The `n` most frequent entries. Ties keep first-seen order.
pub fn most_common(counts: &IndexMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}
