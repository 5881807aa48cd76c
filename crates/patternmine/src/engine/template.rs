//! Placeholder templates for rule statements.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::aggregate::Aggregate;

// `{name}` placeholders; names are lowercase words optionally followed by digits.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+[0-9]*)\}").unwrap());

/// Rule text with `{placeholder}` slots.
///
/// Recognized placeholders when rendering an [`Aggregate`]:
///
/// - `{k0}`, `{k1}`, …: group key parts
/// - `{rate}`: observed rate as a rounded percentage
/// - `{hits}` / `{support}`: predicate hits and group size
/// - `{mean}`: observed mean with thousands separators
/// - `{value}`: observed value with two decimals
///
/// Unknown placeholders are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    /// Create a template from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render with an arbitrary placeholder lookup.
    pub fn render_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        PLACEHOLDER
            .replace_all(&self.0, |caps: &Captures| {
                lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Render for one group aggregate.
    pub fn render(&self, aggregate: &Aggregate) -> String {
        self.render_with(|name| aggregate_var(aggregate, name))
    }

    /// Names of the placeholders used by this template.
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.0)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

fn aggregate_var(aggregate: &Aggregate, name: &str) -> Option<String> {
    match name {
        "rate" => aggregate.observed.map(format_percent),
        "hits" => Some(aggregate.hits.to_string()),
        "support" => Some(aggregate.support.to_string()),
        "mean" => aggregate.observed.map(format_thousands),
        "value" => aggregate.observed.map(|v| format!("{:.2}", v)),
        _ => {
            let index: usize = name.strip_prefix('k')?.parse().ok()?;
            aggregate.key.part(index).map(str::to_string)
        }
    }
}

/// Format a fraction as a rounded percentage without the sign, e.g. `0.667 -> "67"`.
pub fn format_percent(rate: f64) -> String {
    format!("{}", (rate * 100.0).round() as i64)
}

/// Format a number rounded to an integer with comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
