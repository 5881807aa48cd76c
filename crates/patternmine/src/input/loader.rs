//! Year-partitioned JSON dataset loader.
//!
//! Datasets live under `<root>/<dataset>/<year>/<file>.json`, each file a
//! JSON array of objects. Missing years and unreadable files are skipped
//! with a warning so one bad partition never hides the rest.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::source::SourceMetadata;
use crate::error::{PatternError, Result};
use crate::record::Record;

/// Records of one dataset concatenated across years, with their sources.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    /// Dataset name.
    pub name: String,
    /// Records in year order, then file order.
    pub records: Vec<Record>,
    /// One entry per file that loaded successfully.
    pub sources: Vec<SourceMetadata>,
}

impl LoadedDataset {
    /// Number of loaded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads datasets from a directory tree.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    root: PathBuf,
    years: Option<Vec<String>>,
}

impl DatasetLoader {
    /// Create a loader that discovers years from the directory tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            years: None,
        }
    }

    /// Restrict loading to the given years, in this order.
    pub fn with_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.years = Some(years.into_iter().map(|y| y.to_string()).collect());
        self
    }

    /// The data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load `<dataset>.json` for every year.
    pub fn load(&self, dataset: &str) -> Result<LoadedDataset> {
        self.load_file(dataset, dataset)
    }

    /// Load `<file_stem>.json` from each year directory of a dataset.
    ///
    /// Missing or unreadable partitions are skipped, so a dataset that is
    /// absent altogether loads as empty.
    pub fn load_file(&self, dataset: &str, file_stem: &str) -> Result<LoadedDataset> {
        let years = match self.years {
            Some(ref years) => years.clone(),
            None => self.discover_years(dataset).unwrap_or_else(|e| {
                warn!(dataset, error = %e, "cannot list dataset years");
                Vec::new()
            }),
        };

        let mut loaded = LoadedDataset {
            name: dataset.to_string(),
            ..Default::default()
        };

        for year in &years {
            let path = self
                .root
                .join(dataset)
                .join(year)
                .join(format!("{}.json", file_stem));

            if !path.is_file() {
                debug!(path = %path.display(), "skipping missing partition");
                continue;
            }

            match read_records(&path, year) {
                Ok((records, source)) => {
                    loaded.records.extend(records);
                    loaded.sources.push(source);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable dataset file");
                }
            }
        }

        info!(
            dataset,
            file = file_stem,
            years = years.len(),
            files = loaded.sources.len(),
            records = loaded.records.len(),
            "loaded dataset"
        );

        Ok(loaded)
    }

    /// Numeric subdirectories of a dataset, sorted ascending.
    pub fn discover_years(&self, dataset: &str) -> Result<Vec<String>> {
        let dir = self.root.join(dataset);
        let entries = fs::read_dir(&dir).map_err(|e| PatternError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let mut years: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
            .collect();
        years.sort();
        Ok(years)
    }
}

/// Read one JSON array file. Non-object elements are dropped.
fn read_records(path: &Path, year: &str) -> Result<(Vec<Record>, SourceMetadata)> {
    let contents = fs::read(path).map_err(|e| PatternError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    let hash = format!("sha256:{:x}", hasher.finalize());

    let values: Vec<serde_json::Value> = serde_json::from_slice(&contents)?;
    let total = values.len();
    let records: Vec<Record> = values.into_iter().filter_map(Record::from_value).collect();
    if records.len() < total {
        debug!(
            path = %path.display(),
            dropped = total - records.len(),
            "dropped non-object entries"
        );
    }

    let source = SourceMetadata::new(
        path.to_path_buf(),
        year,
        hash,
        contents.len() as u64,
        records.len(),
    );
    Ok((records, source))
}
