//! Threshold-mode rule agents: ERP delays, HR turnover, success recipes,
//! financial profit.

use std::sync::Arc;

use tracing::debug;

use super::config::DomainConfig;
use super::result::{PatternPayload, PatternResult};
use super::PatternAgent;
use crate::engine::{group_by_key, synthesize};
use crate::error::Result;
use crate::record::Record;

/// Groups records by a domain key and keeps groups clearing both the
/// support and value thresholds.
#[derive(Debug, Clone)]
pub struct RuleAgent {
    config: DomainConfig,
    records: Arc<[Record]>,
}

impl RuleAgent {
    /// Create an agent for an arbitrary domain configuration.
    pub fn new(config: DomainConfig, records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            config,
            records: records.into(),
        }
    }

    pub fn erp(records: impl Into<Arc<[Record]>>) -> Self {
        Self::new(DomainConfig::erp(), records)
    }

    pub fn hr(records: impl Into<Arc<[Record]>>) -> Self {
        Self::new(DomainConfig::hr(), records)
    }

    pub fn success_recipe(records: impl Into<Arc<[Record]>>) -> Self {
        Self::new(DomainConfig::success_recipe(), records)
    }

    pub fn financial(records: impl Into<Arc<[Record]>>) -> Self {
        Self::new(DomainConfig::financial(), records)
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }
}

impl PatternAgent for RuleAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn detect(&self) -> Result<PatternResult> {
        self.config.validate(&self.records)?;

        let groups = group_by_key(&self.records, &self.config.key);
        let aggregates = groups.aggregate(&self.config.metric);
        let rules = synthesize(&aggregates, &self.config.rule);

        debug!(
            agent = %self.config.name,
            groups = groups.len(),
            rules = rules.iter().filter(|r| !r.is_sentinel()).count(),
            "rule detection finished"
        );

        Ok(PatternResult::new(
            self.config.kind,
            PatternPayload::Rules { rules },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().filter_map(Record::from_value).collect()
    }

    #[test]
    fn test_hr_turnover_rule() {
        let data = records(vec![
            json!({"role": "Consultant", "years_at_company": 1, "left_company": true}),
            json!({"role": "Consultant", "years_at_company": 0.5, "left_company": true}),
            json!({"role": "Consultant", "years_at_company": 1.5, "left_company": false}),
            json!({"role": "Consultant", "years_at_company": 5, "left_company": true}),
        ]);
        let result = RuleAgent::hr(data).detect().unwrap();
        let rules = result.rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].statement,
            "Si le rôle est 'Consultant' (junior), le taux de départ est de 67% (2/3 employés)."
        );
    }

    #[test]
    fn test_success_recipe_sorts_team_roles() {
        let mut values = Vec::new();
        for i in 0..5 {
            let roles = if i % 2 == 0 {
                json!(["Manager", "Analyst", "Manager"])
            } else {
                json!(["Analyst", "Manager"])
            };
            values.push(json!({
                "project_type": "Audit",
                "industry": "Banking",
                "team_roles": roles,
                "profit_margin": 0.3
            }));
        }
        let result = RuleAgent::success_recipe(records(values)).detect().unwrap();
        let rules = result.rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].statement.contains("Analyst, Manager"));
        assert!(rules[0].statement.contains("100% de succès"));
        assert!(rules[0].statement.contains("sur 5 projets"));
    }

    #[test]
    fn test_missing_metric_field_is_an_error() {
        let data = records(vec![json!({"department": "Tech", "project": "X"})]);
        assert!(RuleAgent::erp(data).detect().is_err());
    }
}
