//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use patternmine::normalize::OutlierPolicy;

/// patternmine: pattern mining over business records
#[derive(Parser)]
#[command(name = "patternmine")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Options shared by commands that load datasets.
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Data root holding <dataset>/<year>/<dataset>.json
    #[arg(short, long, value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// Years to load (default: every year directory found)
    #[arg(short, long, value_delimiter = ',')]
    pub years: Option<Vec<String>>,

    /// Normalize records before analysis
    #[arg(long)]
    pub clean: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one pattern agent and print its findings
    Detect {
        /// Agent name (see `patternmine agents`)
        #[arg(value_name = "AGENT")]
        agent: String,

        #[command(flatten)]
        data: DataArgs,

        /// Free-text query for agents that accept one (e.g. tenders)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Outlier, seasonality and correlation report over all datasets
    Report {
        #[command(flatten)]
        data: DataArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize one dataset and write the cleaned records
    Clean {
        /// Dataset name (e.g. erp_data)
        #[arg(value_name = "DATASET")]
        dataset: String,

        #[command(flatten)]
        data: DataArgs,

        /// Output path (default: <dataset>.cleaned.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to do with outlying values
        #[arg(long, default_value = "flag")]
        outliers: PolicyChoice,
    },

    /// List available agents
    Agents,
}

/// Outlier policy for the clean command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyChoice {
    /// Keep values and tag records
    Flag,
    /// Replace outlying values with null
    Clear,
}

impl From<PolicyChoice> for OutlierPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Flag => OutlierPolicy::Flag,
            PolicyChoice::Clear => OutlierPolicy::Clear,
        }
    }
}
