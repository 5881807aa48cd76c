//! Pearson correlation between two numeric fields.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Minimum paired observations for a correlation to be reported.
pub const MIN_PAIRS: usize = 5;

/// Correlation between two fields across a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub field_a: String,
    pub field_b: String,
    /// Records where both fields are numeric.
    pub pairs: usize,
    /// `None` when undetermined: too few pairs or a constant side.
    pub coefficient: Option<f64>,
}

impl Correlation {
    /// Returns true if a coefficient could be computed.
    pub fn is_determined(&self) -> bool {
        self.coefficient.is_some()
    }
}

/// Compute the Pearson correlation of two fields over paired observations.
pub fn pearson(records: &[Record], field_a: &str, field_b: &str) -> Correlation {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.number(field_a)?, r.number(field_b)?)))
        .collect();

    let coefficient = if pairs.len() < MIN_PAIRS {
        None
    } else {
        coefficient(&pairs)
    };

    Correlation {
        field_a: field_a.to_string(),
        field_b: field_b.to_string(),
        pairs: pairs.len(),
        coefficient,
    }
}

fn coefficient(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for &(a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        Some((cov / denom).clamp(-1.0, 1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(data: &[(f64, f64)]) -> Vec<Record> {
        data.iter()
            .map(|(a, b)| Record::from_value(json!({"a": a, "b": b})).unwrap())
            .collect()
    }

    #[test]
    fn test_perfect_positive() {
        let records = pairs(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0), (5.0, 10.0)]);
        let c = pearson(&records, "a", "b");
        assert_eq!(c.pairs, 5);
        assert!((c.coefficient.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_negative() {
        let records = pairs(&[(1.0, 5.0), (2.0, 4.0), (3.0, 3.0), (4.0, 2.0), (5.0, 1.0)]);
        let c = pearson(&records, "a", "b");
        assert!((c.coefficient.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_undetermined_under_five_pairs() {
        let records = pairs(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)]);
        let c = pearson(&records, "a", "b");
        assert!(!c.is_determined());
        assert_eq!(c.pairs, 4);
    }

    #[test]
    fn test_unpaired_records_ignored() {
        let mut records = pairs(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        records.push(Record::from_value(json!({"a": 9})).unwrap());
        assert_eq!(pearson(&records, "a", "b").pairs, 4);
    }

    #[test]
    fn test_constant_side_undetermined() {
        let records = pairs(&[(1.0, 3.0), (2.0, 3.0), (3.0, 3.0), (4.0, 3.0), (5.0, 3.0)]);
        assert_eq!(pearson(&records, "a", "b").coefficient, None);
    }
}
