//! Clean command - normalize a dataset and export it.

use std::path::{Path, PathBuf};

use colored::Colorize;
use patternmine::{Miner, Record};

use crate::cli::{DataArgs, PolicyChoice};

pub fn run(
    dataset: String,
    data: DataArgs,
    output: Option<PathBuf>,
    policy: PolicyChoice,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path, &data)?;
    // Load raw records; cleaning happens below with the chosen policy.
    config.clean = false;
    config.outlier_policy = policy.into();
    let data_root = config.data_root.clone();
    let miner = Miner::with_config(config);

    let loaded = miner.load(&dataset)?;
    if loaded.is_empty() {
        return Err(format!(
            "No records found for '{}' under {}",
            dataset,
            data_root.display()
        )
        .into());
    }

    let cleaned = miner.cleaner(&dataset).clean(&loaded.records);

    let output_path = output.unwrap_or_else(|| PathBuf::from(format!("{}.cleaned.json", dataset)));
    let values: Vec<serde_json::Value> = cleaned.records.into_iter().map(Record::into_value).collect();
    std::fs::write(&output_path, serde_json::to_string_pretty(&values)?)?;

    let report = &cleaned.normalize;
    println!("{} {}", "Cleaned".green().bold(), dataset.white().bold());
    println!("  Records in:          {}", loaded.records.len());
    println!("  Records out:         {}", values.len());
    println!("  Duplicates removed:  {}", report.duplicates_removed);
    println!("  Values filled:       {}", report.values_filled);
    println!("  Coercion failures:   {}", report.coercion_failures);
    println!("  Outliers:            {}", cleaned.outliers.total());

    if verbose {
        for (field, flags) in &cleaned.outliers.by_field {
            println!("    {}: {}", field, flags.len());
        }
        if !report.unfilled_fields.is_empty() {
            println!("  {} {}", "Unfilled:".dimmed(), report.unfilled_fields.join(", "));
        }
        for source in &loaded.sources {
            println!("  {} {} ({})", "Source:".dimmed(), source.path.display(), source.hash);
        }
    }

    println!();
    println!("Written to {}", output_path.display().to_string().cyan());

    Ok(())
}
