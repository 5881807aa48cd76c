//! CLI command implementations.

pub mod agents;
pub mod clean;
pub mod detect;
pub mod report;

use std::path::Path;

use patternmine::MinerConfig;

use crate::cli::DataArgs;

/// Build the run configuration: file (or defaults), then command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    data: &DataArgs,
) -> Result<MinerConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => MinerConfig::from_file(path)?,
        None => MinerConfig::default(),
    };

    if let Some(ref root) = data.data {
        config.data_root = root.clone();
    }
    if let Some(ref years) = data.years {
        config.years = Some(years.clone());
    }
    if data.clean {
        config.clean = true;
    }

    Ok(config)
}
