//! Main entry point tying loading, cleaning and agents together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agents::{
    ChurnAgent, ProfitRulesAgent, ProfitabilityAgent, Registry, RepeatClientAgent, RuleAgent,
    SeasonalityAgent, TendersAgent,
};
use crate::engine::OutlierDetector;
use crate::error::{PatternError, Result};
use crate::input::{DatasetLoader, LoadedDataset};
use crate::normalize::{Cleaner, OutlierPolicy};
use crate::record::Record;
use crate::report::{detect_at_risk, standard_schema, AtRiskReport, DatasetProfile, DatasetReport};

/// Configuration for a mining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Directory holding `<dataset>/<year>/<file>.json`.
    pub data_root: PathBuf,
    /// Years to load (None = every numeric subdirectory).
    pub years: Option<Vec<String>>,
    /// Absolute z-score above which a value is an outlier.
    pub outlier_threshold: f64,
    /// Observations a field needs before outliers are evaluated.
    pub min_observations: usize,
    /// Normalize records before handing them to agents.
    pub clean: bool,
    /// Outlier handling while cleaning.
    pub outlier_policy: OutlierPolicy,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            years: None,
            outlier_threshold: 3.0,
            min_observations: 5,
            clean: false,
            outlier_policy: OutlierPolicy::Flag,
        }
    }
}

impl MinerConfig {
    /// Read a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PatternError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.outlier_threshold.is_nan() || self.outlier_threshold <= 0.0 {
            return Err(PatternError::Config(format!(
                "outlier_threshold must be positive, got {}",
                self.outlier_threshold
            )));
        }
        if self.min_observations < 2 {
            return Err(PatternError::Config(format!(
                "min_observations must be at least 2, got {}",
                self.min_observations
            )));
        }
        Ok(())
    }

    pub fn detector(&self) -> OutlierDetector {
        OutlierDetector::new()
            .with_threshold(self.outlier_threshold)
            .with_min_observations(self.min_observations)
    }
}

/// Report over every standard dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningReport {
    pub datasets: Vec<DatasetReport>,
    /// `None` when no project matches the at-risk configuration.
    pub at_risk: Option<AtRiskReport>,
}

/// Loads datasets and wires them into agents.
#[derive(Debug, Clone)]
pub struct Miner {
    config: MinerConfig,
    loader: DatasetLoader,
}

impl Miner {
    pub fn new() -> Self {
        Self::with_config(MinerConfig::default())
    }

    pub fn with_config(config: MinerConfig) -> Self {
        let mut loader = DatasetLoader::new(&config.data_root);
        if let Some(ref years) = config.years {
            loader = loader.with_years(years);
        }
        Self { config, loader }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Load a dataset, cleaning it when configured to.
    pub fn load(&self, dataset: &str) -> Result<LoadedDataset> {
        self.load_file(dataset, dataset)
    }

    /// Load a named file of a dataset, cleaning it when configured to.
    ///
    /// Cleaning coerces the file's declared field types first.
    pub fn load_file(&self, dataset: &str, file_stem: &str) -> Result<LoadedDataset> {
        let mut loaded = self.loader.load_file(dataset, file_stem)?;
        if self.config.clean {
            let cleaned = self.cleaner(file_stem).clean(&loaded.records);
            info!(
                dataset,
                duplicates = cleaned.normalize.duplicates_removed,
                filled = cleaned.normalize.values_filled,
                coercion_failures = cleaned.normalize.coercion_failures,
                outliers = cleaned.outliers.total(),
                "cleaned dataset"
            );
            loaded.records = cleaned.records;
        }
        Ok(loaded)
    }

    /// The cleaning pipeline for one dataset file under this configuration.
    pub fn cleaner(&self, file_stem: &str) -> Cleaner {
        let cleaner = Cleaner::new()
            .with_detector(self.config.detector())
            .with_policy(self.config.outlier_policy);
        match standard_schema(file_stem) {
            Some(schema) => cleaner.with_schema(schema),
            None => cleaner,
        }
    }

    /// Build a registry holding every agent over its dataset.
    pub fn registry(&self) -> Result<Registry> {
        let crm = self.shared("crm_data")?;
        let projects = self.shared("project_data")?;
        let erp = self.shared("erp_data")?;
        let hr = self.shared("hr_data")?;
        let financial = self.shared("financial_data")?;
        let tenders = self.shared("call_for_tenders")?;
        let responses: Arc<[Record]> = self
            .load_file("call_for_tenders", "tender_responses")?
            .records
            .into();

        let mut registry = Registry::new();
        registry.register(ChurnAgent::new(crm));
        registry.register(SeasonalityAgent::new(Arc::clone(&projects)));
        registry.register(ProfitabilityAgent::new(Arc::clone(&projects)));
        registry.register(RepeatClientAgent::new(Arc::clone(&projects)));
        registry.register(RuleAgent::success_recipe(Arc::clone(&projects)));
        registry.register(ProfitRulesAgent::new(projects));
        registry.register(RuleAgent::erp(erp));
        registry.register(RuleAgent::hr(hr));
        registry.register(RuleAgent::financial(financial));
        registry.register(TendersAgent::new(tenders, responses));
        Ok(registry)
    }

    /// Outlier, seasonality and correlation report over the standard datasets.
    pub fn report(&self) -> Result<MiningReport> {
        let detector = self.config.detector();
        let mut datasets = Vec::new();
        let mut at_risk = None;

        for profile in DatasetProfile::standard() {
            let loaded = self.load(&profile.dataset)?;
            datasets.push(DatasetReport::build(&profile, &loaded.records, &detector));
            if profile.dataset == "project_data" {
                at_risk = detect_at_risk(&loaded.records);
            }
        }

        Ok(MiningReport { datasets, at_risk })
    }

    fn shared(&self, dataset: &str) -> Result<Arc<[Record]>> {
        Ok(self.load(dataset)?.records.into())
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}
