//! Per-domain rule mining configuration.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::result::PatternKind;
use crate::engine::{KeyExtractor, KeyPart, Metric, Predicate, RuleSpec};
use crate::error::{PatternError, Result};
use crate::record::Record;

/// Grouping key, metric and thresholds for one threshold-mode domain.
///
/// The stock configurations are independent of each other; changing one
/// domain's thresholds never affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Registry name of the agent.
    pub name: String,
    pub kind: PatternKind,
    pub key: KeyExtractor,
    pub metric: Metric,
    pub rule: RuleSpec,
    /// Key fields that may be absent from every record.
    #[serde(default)]
    pub optional_fields: Vec<String>,
}

impl DomainConfig {
    /// Project delay risk by department and project.
    pub fn erp() -> Self {
        Self {
            name: "erp".to_string(),
            kind: PatternKind::ErpDelay,
            key: KeyExtractor::fields(&["department", "project"]),
            metric: Metric::Rate {
                predicate: Predicate::Equals {
                    field: "status".to_string(),
                    value: json!("Delayed"),
                },
            },
            rule: RuleSpec::new(
                3,
                0.5,
                "Si le projet '{k1}' est mené par le département '{k0}', le risque de retard est de {rate}% ({hits}/{support} projets).",
                "Aucun pattern de risque de retard significatif détecté.",
            ),
            optional_fields: Vec::new(),
        }
    }

    /// Turnover by role and seniority (under two years is junior).
    pub fn hr() -> Self {
        Self {
            name: "hr".to_string(),
            kind: PatternKind::HrTurnover,
            key: KeyExtractor::new(vec![
                KeyPart::field("role"),
                KeyPart::Bucket {
                    field: "years_at_company".to_string(),
                    below: 2.0,
                    low: "junior".to_string(),
                    high: "senior".to_string(),
                },
            ]),
            metric: Metric::Rate {
                predicate: Predicate::IsTrue {
                    field: "left_company".to_string(),
                },
            },
            rule: RuleSpec::new(
                3,
                0.5,
                "Si le rôle est '{k0}' ({k1}), le taux de départ est de {rate}% ({hits}/{support} employés).",
                "Aucun pattern de turnover significatif détecté.",
            ),
            optional_fields: Vec::new(),
        }
    }

    /// High-margin offers by project type, industry and team composition.
    pub fn success_recipe() -> Self {
        Self {
            name: "success_recipe".to_string(),
            kind: PatternKind::SuccessRecipe,
            key: KeyExtractor::new(vec![
                KeyPart::field("project_type"),
                KeyPart::field("industry"),
                KeyPart::SortedSet {
                    field: "team_roles".to_string(),
                },
            ]),
            metric: Metric::Rate {
                predicate: Predicate::Above {
                    field: "profit_margin".to_string(),
                    threshold: 0.25,
                },
            },
            rule: RuleSpec::new(
                5,
                0.8,
                "Une offre de {k0} pour {k1}, avec une équipe composée de {k2}, a eu {rate}% de succès (profit margin > 25%) sur {support} projets.",
                "Aucun pattern de succès fort n'a été détecté dans les données.",
            ),
            optional_fields: Vec::new(),
        }
    }

    /// High mean profit by client and month.
    pub fn financial() -> Self {
        Self {
            name: "financial".to_string(),
            kind: PatternKind::FinancialProfit,
            key: KeyExtractor::fields(&["client", "month"]),
            metric: Metric::Mean {
                field: "profit".to_string(),
            },
            rule: RuleSpec::new(
                2,
                150_000.0,
                "Si le client est '{k0}' et le mois est {k1}, le profit moyen est élevé: {mean}.",
                "Aucun pattern de profit élevé détecté.",
            ),
            optional_fields: vec!["client".to_string()],
        }
    }

    /// Check that every required field appears in at least one record.
    ///
    /// An empty record set is always valid.
    pub fn validate(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let required = self
            .key
            .source_fields()
            .chain(std::iter::once(self.metric.source_field()))
            .filter(|f| !self.optional_fields.iter().any(|o| o == f));

        for field in required {
            if !records.iter().any(|r| r.get(field).is_some()) {
                return Err(PatternError::MissingField {
                    dataset: self.name.clone(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
