//! Detect command - run one agent through the registry.

use std::path::Path;

use colored::Colorize;
use patternmine::{Message, Miner};
use tracing::debug;

use crate::cli::DataArgs;

pub fn run(
    agent: String,
    data: DataArgs,
    prompt: Option<String>,
    json_output: bool,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path, &data)?;
    let miner = Miner::with_config(config);
    let registry = miner.registry()?;
    debug!(agents = registry.len(), "registry ready");

    let mut message = Message::request_pattern("cli", agent.as_str());
    if let Some(prompt) = prompt {
        message = message.with_prompt(prompt);
    }

    let result = registry
        .send(&message)?
        .into_pattern()
        .ok_or("agent did not return a pattern")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Patterns from".cyan().bold(),
        agent.white().bold()
    );
    println!();

    match result.rules() {
        Some(rules) => {
            for rule in rules {
                if rule.is_sentinel() {
                    println!("  {}", rule.statement.dimmed());
                } else {
                    println!("  {} {}", "•".green(), rule.statement);
                    if verbose {
                        println!(
                            "    {} support {}, observed {:.3}",
                            rule.condition.dimmed(),
                            rule.support,
                            rule.observed
                        );
                    }
                }
            }
        }
        None => {
            for line in result.lines() {
                println!("  {}", line);
            }
        }
    }

    Ok(())
}
