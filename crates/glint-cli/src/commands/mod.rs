//! CLI command implementations

pub mod check;
pub mod explain;
pub mod rules;

pub use check::CheckArgs;
pub use explain::ExplainArgs;
pub use rules::RulesArgs;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use glint_core::config::{Config, discover_config};
use glint_core::rules::RuleTable;
use glint_core::rules::catalog::{default_catalog, load_catalog};
use glint_core::rules::validators::ValidatorRegistry;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan component, script and style files for findings
    Check(CheckArgs),

    /// List the rules in the active catalog
    Rules(RulesArgs),

    /// Show detailed explanation for a specific rule
    Explain(ExplainArgs),
}

/// Loads `glint.toml` from `start` or its ancestors, printing any warnings.
/// Defaults apply only when no config file exists.
pub(crate) fn load_config(start: &Path) -> Result<Config> {
    let result = discover_config(start)
        .with_context(|| format!("Failed to load configuration for {}", start.display()))?;
    for warning in &result.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
        tracing::warn!(%warning, "configuration");
    }
    Ok(result.config)
}

/// The catalog named on the command line, else the one named in config, else
/// the built-in rules. Configuration overrides are not applied.
pub(crate) fn load_rule_table(config: &Config, catalog: Option<&Path>) -> Result<RuleTable> {
    match catalog.or(config.catalog.as_deref()) {
        Some(path) => {
            tracing::debug!(catalog = %path.display(), "loading rule catalog");
            load_catalog(path, &ValidatorRegistry::builtin())
                .with_context(|| format!("Failed to load rule catalog {}", path.display()))
        }
        None => Ok(default_catalog()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn broken_config_file_fails_instead_of_defaulting() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("glint.toml"),
            "[rules]\ndisabled = [\"no-console\"]\n\n[rules.severity]\nno-eval = \"fatal\"\n",
        )
        .unwrap();

        let err = load_config(dir.path()).unwrap_err();

        assert!(format!("{err:#}").contains("glint.toml"));
    }

    #[test]
    fn config_settings_are_loaded_and_missing_config_defaults() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("project");
        let bare = dir.path().join("bare");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&bare).unwrap();
        fs::write(project.join("glint.toml"), "[rules]\ndisabled = [\"no-console\"]\n").unwrap();

        assert_eq!(load_config(&project).unwrap().rules.disabled, ["no-console"]);
        assert_eq!(load_config(&bare).unwrap(), Config::default());
    }

    #[test]
    fn rule_table_defaults_to_builtin_catalog() {
        let table = load_rule_table(&Config::default(), None).unwrap();

        assert!(table.get("no-eval").is_some());
    }

    #[test]
    fn cli_catalog_wins_over_config_catalog() {
        let dir = tempdir().unwrap();
        let from_cli = dir.path().join("cli.toml");
        fs::write(
            &from_cli,
            "[[rule]]\nid = \"from-cli\"\npattern = 'x'\nscope = \"all\"\nseverity = \"info\"\nsuggestion = \"\"\n",
        )
        .unwrap();
        let config = Config {
            catalog: Some(dir.path().join("missing.toml")),
            ..Config::default()
        };

        let table = load_rule_table(&config, Some(&from_cli)).unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.get("from-cli").is_some());
        assert!(load_rule_table(&config, None).is_err());
    }
}
