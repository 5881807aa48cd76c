//! Report command - dataset-level findings and the at-risk scenario.

use std::path::Path;

use colored::Colorize;
use patternmine::Miner;

use crate::cli::DataArgs;

pub fn run(
    data: DataArgs,
    json_output: bool,
    config_path: Option<&Path>,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path, &data)?;
    let report = Miner::with_config(config).report()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Pattern Detection Report".cyan().bold());
    println!("{}", "=".repeat(50));

    for dataset in &report.datasets {
        println!();
        println!("{}", format!("--- {} ---", dataset.dataset.to_uppercase()).bold());
        for line in dataset.lines() {
            println!("  {}", line);
        }
    }

    println!();
    println!("{}", "At-risk projects".cyan().bold());
    println!("  Junior consultant (< 2 years), multi-site, planned duration under 6 weeks.");
    match report.at_risk {
        Some(ref at_risk) => {
            for line in at_risk.lines() {
                println!("  {}", line.yellow());
            }
        }
        None => println!("  {}", "No at-risk projects detected.".green()),
    }

    Ok(())
}
