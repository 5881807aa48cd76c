//! Cross-dataset report: outliers, active months, correlation, flagged
//! records, and the at-risk project scenario.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::{
    format_percent, is_flagged, mean, most_common, pearson, value_counts, Correlation,
    NumericSummary, OutlierDetector,
};
use crate::record::{FieldSchema, FieldType, Record};

/// Which fields of a dataset the report looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub dataset: String,
    pub numeric_fields: Vec<String>,
    pub month_field: String,
}

impl DatasetProfile {
    pub fn new(dataset: &str, numeric_fields: &[&str], month_field: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            numeric_fields: numeric_fields.iter().map(|f| f.to_string()).collect(),
            month_field: month_field.to_string(),
        }
    }

    /// Profiles of the standard internal datasets.
    pub fn standard() -> Vec<Self> {
        vec![
            Self::new("crm_data", &["project_value", "billable_hours", "satisfaction"], "project_month"),
            Self::new("erp_data", &["cost", "duration_months"], "project_month"),
            Self::new(
                "financial_data",
                &["revenue", "expenses", "billable_hours", "profit"],
                "month",
            ),
            Self::new(
                "hr_data",
                &["age", "years_at_company", "billable_hours", "performance_score"],
                "hire_month",
            ),
            Self::new(
                "project_data",
                &["revenue", "profit", "profit_margin", "duration_months", "team_size"],
                "sales_month",
            ),
            Self::new("call_for_tenders", &["estimated_value"], "tender_month"),
        ]
    }
}

/// Declared field types of a standard dataset file, keyed by file stem.
///
/// Returns `None` for files without a declared schema.
pub fn standard_schema(file_stem: &str) -> Option<FieldSchema> {
    use FieldType::{Boolean, Float, Integer};

    let fields: &[(&str, FieldType)] = match file_stem {
        "crm_data" => &[
            ("project_value", Float),
            ("billable_hours", Integer),
            ("satisfaction", Integer),
            ("churned", Boolean),
            ("project_month", Integer),
        ],
        "erp_data" => &[
            ("cost", Float),
            ("duration_months", Integer),
            ("project_month", Integer),
        ],
        "financial_data" => &[
            ("revenue", Float),
            ("expenses", Float),
            ("billable_hours", Integer),
            ("project_margin", Float),
            ("profit", Float),
            ("month", Integer),
        ],
        "hr_data" => &[
            ("age", Integer),
            ("years_at_company", Integer),
            ("billable_hours", Integer),
            ("performance_score", Integer),
            ("left_company", Boolean),
            ("hire_month", Integer),
        ],
        "project_data" => &[
            ("revenue", Float),
            ("profit", Float),
            ("profit_margin", Float),
            ("duration_months", Integer),
            ("sales_month", Integer),
            ("team_size", Integer),
        ],
        "call_for_tenders" => &[("estimated_value", Float), ("tender_month", Integer)],
        "tender_responses" => &[("bid_amount", Float)],
        _ => return None,
    };

    Some(
        fields
            .iter()
            .fold(FieldSchema::new(), |schema, (name, ty)| schema.field(*name, *ty)),
    )
}

/// Per-dataset findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub record_count: usize,
    /// Count, spread and range of each numeric field that has values.
    pub summaries: IndexMap<String, NumericSummary>,
    /// Outlier count per field, only for fields with at least one.
    pub outliers: IndexMap<String, usize>,
    /// Fields with too few observations to evaluate.
    pub skipped_fields: Vec<String>,
    pub month_field: String,
    /// Three most active months.
    pub top_months: Vec<(String, usize)>,
    /// Correlation of the first two numeric fields.
    pub correlation: Option<Correlation>,
    /// Records already carrying a flag tag.
    pub flagged_records: usize,
}

impl DatasetReport {
    pub fn build(profile: &DatasetProfile, records: &[Record], detector: &OutlierDetector) -> Self {
        let report = detector.detect(records, profile.numeric_fields.as_slice());
        let outliers = report
            .by_field
            .iter()
            .map(|(field, flags)| (field.clone(), flags.len()))
            .collect();

        let summaries = profile
            .numeric_fields
            .iter()
            .filter_map(|field| {
                let values: Vec<f64> = records.iter().filter_map(|r| r.number(field)).collect();
                Some((field.clone(), NumericSummary::from_values(&values)?))
            })
            .collect();

        let months = value_counts(records.iter(), &profile.month_field);
        let correlation = match profile.numeric_fields.as_slice() {
            [a, b, ..] => Some(pearson(records, a, b)),
            _ => None,
        };

        debug!(dataset = %profile.dataset, records = records.len(), "built dataset report");

        Self {
            dataset: profile.dataset.clone(),
            record_count: records.len(),
            summaries,
            outliers,
            skipped_fields: report.skipped,
            month_field: profile.month_field.clone(),
            top_months: most_common(&months, 3),
            correlation,
            flagged_records: records.iter().filter(|r| is_flagged(r)).count(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Loaded {} records.", self.record_count)];
        for (field, s) in &self.summaries {
            lines.push(format!(
                "{}: mean {:.2}, median {:.2}, range {} to {}",
                field, s.mean, s.median, s.min, s.max
            ));
        }
        for (field, count) in &self.outliers {
            lines.push(format!("Outliers in {}: {} records flagged.", field, count));
        }
        if !self.top_months.is_empty() {
            let months: Vec<String> = self
                .top_months
                .iter()
                .map(|(m, n)| format!("{} ({})", m, n))
                .collect();
            lines.push(format!("Most active months ({}): {}", self.month_field, months.join(", ")));
        }
        if let Some(Correlation {
            field_a,
            field_b,
            coefficient: Some(r),
            ..
        }) = &self.correlation
        {
            lines.push(format!("Correlation between {} and {}: {:.2}", field_a, field_b, r));
        }
        if self.flagged_records > 0 {
            lines.push(format!(
                "{} records flagged as suspicious/anomalous.",
                self.flagged_records
            ));
        }
        lines
    }
}

/// Projects matching the at-risk configuration and how they compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskReport {
    pub at_risk: usize,
    /// Identifiers of the first few at-risk projects.
    pub sample_ids: Vec<String>,
    pub avg_margin: f64,
    pub avg_risk_margin: f64,
    /// Relative margin shortfall; 0 when the baseline margin is 0.
    pub margin_drop: f64,
    pub delay_rate: f64,
    pub risk_delay_rate: f64,
    pub avg_complaints: f64,
    pub avg_risk_complaints: f64,
}

const SAMPLE_IDS: usize = 5;
const SHORT_DURATION_MONTHS: f64 = 1.5;
const JUNIOR_YEARS: f64 = 2.0;

/// Flag projects staffed with a junior consultant, spread over several
/// sites and planned for under six weeks.
///
/// Returns `None` when no project matches.
pub fn detect_at_risk(projects: &[Record]) -> Option<AtRiskReport> {
    let at_risk: Vec<&Record> = projects.iter().filter(|p| is_at_risk(p)).collect();
    if at_risk.is_empty() {
        return None;
    }

    let all: Vec<&Record> = projects.iter().collect();
    let margin = |set: &[&Record]| {
        let values: Vec<f64> = set.iter().filter_map(|p| p.number("profit_margin")).collect();
        mean(&values).unwrap_or(0.0)
    };
    let delay = |set: &[&Record]| {
        let flags: Vec<f64> = set
            .iter()
            .map(|p| {
                let delayed = p.text("status").is_some_and(|s| s.eq_ignore_ascii_case("delayed"));
                if delayed { 1.0 } else { 0.0 }
            })
            .collect();
        mean(&flags).unwrap_or(0.0)
    };
    let complaints = |set: &[&Record]| {
        let counts: Vec<f64> = set
            .iter()
            .map(|p| p.number("client_complaints").unwrap_or(0.0))
            .collect();
        mean(&counts).unwrap_or(0.0)
    };

    let avg_margin = margin(&all);
    let avg_risk_margin = margin(&at_risk);
    let margin_drop = if avg_margin != 0.0 {
        (avg_margin - avg_risk_margin) / avg_margin
    } else {
        0.0
    };

    Some(AtRiskReport {
        at_risk: at_risk.len(),
        sample_ids: at_risk
            .iter()
            .take(SAMPLE_IDS)
            .map(|p| p.key_text("project_id"))
            .collect(),
        avg_margin,
        avg_risk_margin,
        margin_drop,
        delay_rate: delay(&all),
        risk_delay_rate: delay(&at_risk),
        avg_complaints: complaints(&all),
        avg_risk_complaints: complaints(&at_risk),
    })
}

impl AtRiskReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("At-risk projects: {}", self.at_risk),
            format!(
                "Average margin {:.2} vs {:.2} ({}% lower)",
                self.avg_risk_margin,
                self.avg_margin,
                format_percent(self.margin_drop.max(0.0))
            ),
            format!(
                "Delay rate {}% vs {}%",
                format_percent(self.risk_delay_rate),
                format_percent(self.delay_rate)
            ),
            format!(
                "Average client complaints {:.2} vs {:.2}",
                self.avg_risk_complaints, self.avg_complaints
            ),
        ];
        if !self.sample_ids.is_empty() {
            lines.push(format!("Projects: {}", self.sample_ids.join(", ")));
        }
        lines
    }
}

fn is_at_risk(project: &Record) -> bool {
    let junior = project.list("team_roles").is_some_and(|members| {
        members.iter().any(|m| match m {
            Value::Object(member) => member
                .get("years_experience")
                .and_then(Value::as_f64)
                .is_some_and(|y| y < JUNIOR_YEARS),
            _ => false,
        })
    });

    let multi_site = match project.get("locations") {
        Some(Value::Array(sites)) => sites.len() > 1,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n > 1.0),
        _ => false,
    };

    let short = project
        .number("duration_months")
        .is_some_and(|d| d < SHORT_DURATION_MONTHS);

    junior && multi_site && short
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().filter_map(Record::from_value).collect()
    }

    #[test]
    fn test_at_risk_scenario() {
        let projects = records(vec![
            json!({
                "project_id": "P1",
                "team_roles": [{"role": "Consultant", "years_experience": 1}],
                "locations": ["Paris", "Lyon"],
                "duration_months": 1,
                "profit_margin": 0.1,
                "status": "Delayed",
                "client_complaints": 3
            }),
            json!({
                "project_id": "P2",
                "team_roles": [{"role": "Manager", "years_experience": 8}],
                "locations": 3,
                "duration_months": 1,
                "profit_margin": 0.3,
                "status": "On time",
                "client_complaints": 1
            }),
            json!({
                "project_id": "P3",
                "team_roles": ["Consultant"],
                "locations": 1,
                "duration_months": 6,
                "profit_margin": 0.2,
                "status": "Completed"
            }),
        ]);

        let report = detect_at_risk(&projects).unwrap();
        assert_eq!(report.at_risk, 1);
        assert_eq!(report.sample_ids, vec!["P1"]);
        assert!((report.avg_margin - 0.2).abs() < 1e-9);
        assert!((report.margin_drop - 0.5).abs() < 1e-9);
        assert_eq!(report.risk_delay_rate, 1.0);
        assert!((report.delay_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((report.avg_complaints - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_standard_schema_table() {
        let hr = standard_schema("hr_data").unwrap();
        assert_eq!(hr.get("left_company"), Some(FieldType::Boolean));
        assert_eq!(hr.get("years_at_company"), Some(FieldType::Integer));
        assert_eq!(standard_schema("tender_responses").unwrap().get("bid_amount"), Some(FieldType::Float));
        assert!(standard_schema("unknown_data").is_none());

        for profile in DatasetProfile::standard() {
            assert!(standard_schema(&profile.dataset).is_some(), "{}", profile.dataset);
        }
    }

    #[test]
    fn test_no_at_risk_projects() {
        let projects = records(vec![json!({"team_roles": ["Consultant"], "duration_months": 1})]);
        assert!(detect_at_risk(&projects).is_none());
    }

    #[test]
    fn test_dataset_report() {
        let mut values: Vec<Value> = (0..20)
            .map(|i| json!({"cost": 100 + i, "duration_months": 2 * i, "project_month": i % 3}))
            .collect();
        values.push(json!({"cost": 100000, "duration_months": 40, "project_month": 1, "_flagged": ["manual"]}));
        let records = records(values);

        let profile = DatasetProfile::new("erp_data", &["cost", "duration_months"], "project_month");
        let report = DatasetReport::build(&profile, &records, &OutlierDetector::new());

        assert_eq!(report.record_count, 21);
        let cost = &report.summaries["cost"];
        assert_eq!(cost.count, 21);
        assert_eq!(cost.min, 100.0);
        assert_eq!(cost.max, 100000.0);
        assert_eq!(cost.median, 110.0);
        assert_eq!(report.outliers.get("cost"), Some(&1));
        assert_eq!(report.top_months[0], ("1".to_string(), 8));
        assert!(report.correlation.as_ref().unwrap().is_determined());
        assert_eq!(report.flagged_records, 1);
    }
}
