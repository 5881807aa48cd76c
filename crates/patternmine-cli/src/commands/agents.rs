//! Agents command - list what `detect` can run.

use colored::Colorize;

const AGENTS: &[(&str, &str, &str)] = &[
    ("churn", "crm_data", "Churn, high-value clients or satisfaction trends; pass --prompt to choose"),
    ("seasonality", "project_data", "Sales distribution over months"),
    ("profitability", "project_data", "Best and worst project types and industries"),
    ("repeat_clients", "project_data", "Mean profit of repeat versus new clients"),
    ("success_recipe", "project_data", "Offers with a high share of profitable projects"),
    ("profit_rules", "project_data", "Top groups by mean profit, with history"),
    ("erp", "erp_data", "Delay risk by department and project"),
    ("hr", "hr_data", "Turnover by role and seniority"),
    ("financial", "financial_data", "High mean profit by client and month"),
    ("tenders", "call_for_tenders", "Tender statistics; pass --prompt to choose one"),
];

pub fn run(_verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Available agents".cyan().bold());
    println!();
    for (name, dataset, about) in AGENTS {
        println!("  {:<16} {:<18} {}", name.white().bold(), dataset.dimmed(), about);
    }
    Ok(())
}
