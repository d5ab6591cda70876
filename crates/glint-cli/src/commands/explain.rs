//! Explain command - provides detailed explanation of a rule

use std::env;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use glint_core::rules::{Rule, RuleKind, RuleTable, Severity};

use super::{load_config, load_rule_table};

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(value_name = "RULE_ID", help = "Rule ID to explain (e.g., \"no-eval\")")]
    pub rule_id: String,

    /// Rule catalog replacing the built-in rules
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

impl ExplainArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config(&cwd)?;
        let table = load_rule_table(&config, self.catalog.as_deref())?;

        let Some(rule) = table.get(&self.rule_id) else {
            eprintln!(
                "{} Unknown rule '{}'",
                "error:".red().bold(),
                self.rule_id
            );
            eprintln!();
            eprintln!("Available rules:");
            for rule in table.rules() {
                eprintln!("  {} ({})", rule.id, rule.category);
            }
            std::process::exit(1);
        };

        let active = table.clone().configured(&config.rules);
        let effective = active.get(&rule.id);
        print!("{}", describe(rule, effective, &table));

        Ok(())
    }
}

/// Multi-line description of `rule`. `effective` is the rule after config
/// overrides, `None` when configuration disables it.
fn describe(rule: &Rule, effective: Option<&Rule>, table: &RuleTable) -> String {
    let mut lines = vec![
        String::new(),
        format!("Rule {}", rule.id).bold().to_string(),
        String::new(),
        format!("  {}: {}", "Category".cyan(), rule.category),
        format!(
            "  {}: {}",
            "Severity".cyan(),
            format_severity(effective.map_or(rule.severity, |r| r.severity))
        ),
        format!("  {}: {}", "Scope".cyan(), rule.scope),
        format!("  {}: {}", "Pattern".cyan(), rule.pattern.as_str()),
    ];

    match &rule.kind {
        RuleKind::Line { repeat } => {
            let reports = if *repeat { "every match" } else { "first match" };
            lines.push(format!("  {}: line ({} per line)", "Kind".cyan(), reports));
        }
        RuleKind::Multiline { companion } => {
            lines.push(format!("  {}: multi-line", "Kind".cyan()));
            if let Some(companion) = companion {
                lines.push(format!(
                    "  {}: {}",
                    "Safe when containing".cyan(),
                    companion.as_str()
                ));
            }
        }
    }

    if rule.validator.is_some() {
        lines.push(format!("  {}: yes", "Validated".cyan()));
    }

    let skipped_in = table.exclusions().tags(&rule.id);
    if !skipped_in.is_empty() {
        let tags: Vec<String> = skipped_in.iter().map(ToString::to_string).collect();
        lines.push(format!("  {}: {}", "Skipped in".cyan(), tags.join(", ")));
    }

    if !rule.suggestion.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}: {}", "Suggestion".cyan(), rule.suggestion));
    }

    lines.push(String::new());
    let status = if effective.is_some() {
        "enabled".green()
    } else {
        "disabled".red()
    };
    lines.push(format!("  {}: {}", "Status".cyan(), status));
    lines.push(String::new());

    lines.join("\n")
}

fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".red().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::config::{RulesConfig, SeverityValue};
    use glint_core::rules::catalog::default_catalog;

    #[test]
    fn explain_known_rule_lists_its_fields() {
        colored::control::set_override(false);
        let table = default_catalog().unwrap();
        let rule = table.get("no-console").expect("no-console should exist");

        let text = describe(rule, Some(rule), &table);

        assert!(text.contains("Rule no-console"));
        assert!(text.contains("Scope: script"));
        assert!(text.contains("Skipped in: test"));
        assert!(text.contains("Status: enabled"));
    }

    #[test]
    fn explain_multiline_rule_shows_companion() {
        colored::control::set_override(false);
        let table = default_catalog().unwrap();
        let rule = table.get("img-alt").expect("img-alt should exist");

        let text = describe(rule, Some(rule), &table);

        assert!(text.contains("Kind: multi-line"));
        assert!(text.contains("Safe when containing"));
    }

    #[test]
    fn explain_reflects_configuration() {
        colored::control::set_override(false);
        let table = default_catalog().unwrap();
        let mut rules = RulesConfig::default();
        rules.disabled.push("no-eval".to_string());
        rules
            .severity
            .insert("no-console".to_string(), SeverityValue::Error);
        let active = table.clone().configured(&rules);

        let disabled = describe(table.get("no-eval").unwrap(), active.get("no-eval"), &table);
        let overridden = describe(
            table.get("no-console").unwrap(),
            active.get("no-console"),
            &table,
        );

        assert!(disabled.contains("Status: disabled"));
        assert!(overridden.contains("Severity: error"));
    }

    #[test]
    fn explain_unknown_rule_is_absent() {
        let table = default_catalog().unwrap();

        assert!(table.get("no-such-rule").is_none());
    }
}
