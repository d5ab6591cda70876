//! Rules command - lists the active rule catalog

use std::env;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use colored::Colorize;
use glint_core::rules::{RuleCategory, RuleTable};

use super::{load_config, load_rule_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryFilter {
    Security,
    Lint,
    A11y,
}

impl CategoryFilter {
    fn matches(&self, category: RuleCategory) -> bool {
        matches!(
            (self, category),
            (CategoryFilter::Security, RuleCategory::Security)
                | (CategoryFilter::Lint, RuleCategory::Lint)
                | (CategoryFilter::A11y, RuleCategory::A11y)
        )
    }
}

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Only list rules in this category
    #[arg(long, value_enum)]
    pub category: Option<CategoryFilter>,

    /// Rule catalog replacing the built-in rules
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

impl RulesArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config(&cwd)?;
        let table = load_rule_table(&config, self.catalog.as_deref())?;
        let active = table.clone().configured(&config.rules);

        print!("{}", list_rules(&table, &active, self.category));
        Ok(())
    }
}

/// One row per catalog rule, in catalog order. Severity reflects config
/// overrides; rules missing from `active` are marked disabled.
fn list_rules(table: &RuleTable, active: &RuleTable, category: Option<CategoryFilter>) -> String {
    let rules: Vec<_> = table
        .rules()
        .filter(|rule| category.is_none_or(|c| c.matches(rule.category)))
        .collect();
    let id_width = rules.iter().map(|r| r.id.len()).max().unwrap_or(0);

    let mut out = String::new();
    for rule in &rules {
        let (severity, status) = match active.get(&rule.id) {
            Some(effective) => (effective.severity.to_string(), String::new()),
            None => (rule.severity.to_string(), format!(" {}", "(disabled)".dimmed())),
        };
        out.push_str(&format!(
            "{}  {:<8}  {:<8}  {}{}\n",
            format!("{:<id_width$}", rule.id).bold(),
            rule.category.to_string(),
            severity,
            rule.scope,
            status,
        ));
    }
    out.push_str(&format!("\n{} rule(s)\n", rules.len()));
    out
}
