//! Rule catalog loading
//!
//! A catalog is a TOML file with one `[[rule]]` table per rule:
//!
//! ```toml
//! [[rule]]
//! id = "no-inner-html"
//! pattern = '\.innerHTML\s*='
//! scope = "script"
//! severity = "error"
//! category = "security"
//! suggestion = "Assign textContent or sanitize the HTML first"
//! ```
//!
//! Every pattern is compiled up front; the first bad entry fails the load
//! with an error naming its rule id.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::validators::ValidatorRegistry;
use super::{Rule, RuleCategory, RuleKind, RuleTable, Scope, Severity, compile};
use crate::classify::{ClassTag, ExclusionTable};

/// Catalog shipped with the scanner.
pub const DEFAULT_CATALOG: &str = include_str!("../../catalog/default.toml");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read rule catalog '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in rule catalog '{origin}': {message}")]
    ParseError { origin: String, message: String },
    #[error("Rule '{rule_id}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule_id: String,
        source: regex::Error,
    },
    #[error("Rule '{rule_id}' refers to unknown validator '{name}'")]
    UnknownValidator { rule_id: String, name: String },
    #[error("Rule id '{rule_id}' is defined more than once")]
    DuplicateId { rule_id: String },
    #[error("Rule '{rule_id}' sets a companion pattern but is not multiline")]
    CompanionOnLineRule { rule_id: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    rule: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    id: String,
    pattern: String,
    scope: Scope,
    severity: Severity,
    #[serde(default)]
    suggestion: String,
    #[serde(default = "default_category")]
    category: RuleCategory,
    #[serde(default = "default_repeat")]
    repeat: bool,
    #[serde(default)]
    multiline: bool,
    companion: Option<String>,
    validator: Option<String>,
    #[serde(default)]
    skip_in: Vec<ClassTag>,
}

fn default_category() -> RuleCategory {
    RuleCategory::Lint
}

fn default_repeat() -> bool {
    true
}

impl RuleEntry {
    fn into_rule(self, validators: &ValidatorRegistry) -> Result<Rule, CatalogError> {
        let pattern = compile(&self.id, &self.pattern)?;

        let kind = if self.multiline {
            RuleKind::Multiline {
                companion: self
                    .companion
                    .as_deref()
                    .map(|companion| compile(&self.id, companion))
                    .transpose()?,
            }
        } else if self.companion.is_some() {
            return Err(CatalogError::CompanionOnLineRule { rule_id: self.id });
        } else {
            RuleKind::Line {
                repeat: self.repeat,
            }
        };

        let validator = match self.validator {
            Some(name) => Some(validators.get(&name).ok_or_else(|| {
                CatalogError::UnknownValidator {
                    rule_id: self.id.clone(),
                    name,
                }
            })?),
            None => None,
        };

        Ok(Rule {
            id: self.id,
            pattern,
            scope: self.scope,
            severity: self.severity,
            category: self.category,
            suggestion: self.suggestion,
            kind,
            validator,
        })
    }
}

/// Parses catalog source text. `origin` names the source in errors.
pub fn parse_catalog(
    source: &str,
    origin: &str,
    validators: &ValidatorRegistry,
) -> Result<RuleTable, CatalogError> {
    let file: CatalogFile = toml::from_str(source).map_err(|e| CatalogError::ParseError {
        origin: origin.to_string(),
        message: e.message().to_string(),
    })?;

    let mut exclusions = ExclusionTable::new();
    let mut rules = Vec::with_capacity(file.rule.len());

    for entry in file.rule {
        for tag in &entry.skip_in {
            exclusions.insert(&entry.id, *tag);
        }
        rules.push(entry.into_rule(validators)?);
    }

    let table = RuleTable::new(rules)?.with_exclusions(exclusions);
    tracing::debug!(origin, rules = table.len(), "loaded rule catalog");
    Ok(table)
}

pub fn load_catalog(path: &Path, validators: &ValidatorRegistry) -> Result<RuleTable, CatalogError> {
    let source = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&source, &path.display().to_string(), validators)
}

pub fn default_catalog() -> Result<RuleTable, CatalogError> {
    parse_catalog(
        DEFAULT_CATALOG,
        "<built-in>",
        &ValidatorRegistry::builtin(),
    )
}
