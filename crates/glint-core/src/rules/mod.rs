//! Rule table for pattern-based scanning
//!
//! Rules are declarative: a compiled pattern, the part of a file it applies
//! to, a severity and suggestion text, plus an optional validator that can
//! veto individual matches. A [`RuleTable`] is built once and shared
//! read-only across every file in a run.

pub mod catalog;
pub mod validators;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classify::{ExclusionTable, FileClass};
use crate::config::RulesConfig;
use crate::tokenizer::Mode;

pub use catalog::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Security,
    Lint,
    A11y,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Security => write!(f, "security"),
            RuleCategory::Lint => write!(f, "lint"),
            RuleCategory::A11y => write!(f, "a11y"),
        }
    }
}

/// The part of a file a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Script,
    Markup,
    Style,
    ServerOnly,
    Config,
    All,
}

impl Scope {
    pub fn applies(&self, mode: Mode, class: FileClass) -> bool {
        match self {
            Scope::All => true,
            Scope::Script => mode == Mode::Script,
            Scope::Markup => mode == Mode::Markup,
            Scope::Style => mode == Mode::Style,
            Scope::ServerOnly => mode == Mode::Script && class.server_only,
            Scope::Config => class.config,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Script => "script",
            Scope::Markup => "markup",
            Scope::Style => "style",
            Scope::ServerOnly => "server-only",
            Scope::Config => "config",
            Scope::All => "all",
        };
        f.write_str(name)
    }
}

/// What a validator gets to see about a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchContext<'a> {
    pub file_path: &'a str,
    /// 1-based line in the outer file.
    pub line: usize,
    /// The comment-stripped line (or matched region for multi-line rules).
    pub content: &'a str,
}

/// Vetoes a single match. Returning `false` drops that match only.
pub trait Validator: Send + Sync {
    fn validate(&self, matched: &str, ctx: MatchContext<'_>) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&str, MatchContext<'_>) -> bool + Send + Sync,
{
    fn validate(&self, matched: &str, ctx: MatchContext<'_>) -> bool {
        self(matched, ctx)
    }
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Applied line by line to comment-stripped text. With `repeat = false`
    /// only the first match on a line is reported.
    Line { repeat: bool },
    /// Applied once to the whole masked file; a match containing `companion`
    /// is considered safe.
    Multiline { companion: Option<Regex> },
}

#[derive(Clone)]
pub struct Rule {
    pub id: String,
    pub pattern: Regex,
    pub scope: Scope,
    pub severity: Severity,
    pub category: RuleCategory,
    pub suggestion: String,
    pub kind: RuleKind,
    pub validator: Option<Arc<dyn Validator>>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_str())
            .field("scope", &self.scope)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .field("kind", &self.kind)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl Rule {
    /// A repeating line rule with `all` scope and `warning` severity.
    pub fn line(id: impl Into<String>, pattern: &str) -> Result<Self, CatalogError> {
        let id = id.into();
        let pattern = compile(&id, pattern)?;
        Ok(Self {
            id,
            pattern,
            scope: Scope::All,
            severity: Severity::Warning,
            category: RuleCategory::Lint,
            suggestion: String::new(),
            kind: RuleKind::Line { repeat: true },
            validator: None,
        })
    }

    pub fn multiline(
        id: impl Into<String>,
        pattern: &str,
        companion: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let pattern = compile(&id, pattern)?;
        let companion = companion.map(|c| compile(&id, c)).transpose()?;
        Ok(Self {
            id,
            pattern,
            scope: Scope::Markup,
            severity: Severity::Warning,
            category: RuleCategory::Lint,
            suggestion: String::new(),
            kind: RuleKind::Multiline { companion },
            validator: None,
        })
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Reports only the first match per line.
    pub fn single(mut self) -> Self {
        if let RuleKind::Line { repeat } = &mut self.kind {
            *repeat = false;
        }
        self
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self.kind, RuleKind::Multiline { .. })
    }

    pub fn accepts(&self, matched: &str, ctx: MatchContext<'_>) -> bool {
        self.validator
            .as_ref()
            .is_none_or(|validator| validator.validate(matched, ctx))
    }
}

pub(crate) fn compile(rule_id: &str, pattern: &str) -> Result<Regex, CatalogError> {
    Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
        rule_id: rule_id.to_string(),
        source,
    })
}

/// Ordered, immutable set of rules plus the per-rule file exclusions.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    exclusions: ExclusionTable,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }
        }
        Ok(Self {
            rules,
            exclusions: ExclusionTable::default(),
        })
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionTable) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Applies user configuration: drops disabled rules and categories and
    /// overrides severities.
    pub fn configured(self, config: &RulesConfig) -> Self {
        let disabled: HashSet<&str> = config.disabled.iter().map(String::as_str).collect();
        let overrides: HashMap<&str, Severity> = config
            .severity
            .iter()
            .map(|(id, value)| (id.as_str(), Severity::from(*value)))
            .collect();

        let category_enabled = |category: RuleCategory| match category {
            RuleCategory::Security => config.security.unwrap_or(true),
            RuleCategory::Lint => config.lint.unwrap_or(true),
            RuleCategory::A11y => config.a11y.unwrap_or(true),
        };

        let rules = self
            .rules
            .into_iter()
            .filter(|rule| !disabled.contains(rule.id.as_str()) && category_enabled(rule.category))
            .map(|mut rule| {
                if let Some(severity) = overrides.get(rule.id.as_str()) {
                    rule.severity = *severity;
                }
                rule
            })
            .collect();

        Self {
            rules,
            exclusions: self.exclusions,
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn line_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !rule.is_multiline())
    }

    pub fn multiline_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_multiline())
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn exclusions(&self) -> &ExclusionTable {
        &self.exclusions
    }

    /// Whether `rule` runs for a pass in `mode` over a file of `class`.
    pub fn is_active(&self, rule: &Rule, mode: Mode, class: FileClass) -> bool {
        rule.scope.applies(mode, class) && !self.exclusions.is_excluded(&rule.id, class)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassTag;
    use crate::config::SeverityValue;

    fn class(server_only: bool, config: bool) -> FileClass {
        FileClass {
            server_only,
            config,
            ..FileClass::default()
        }
    }

    #[test]
    fn scope_matches_pass_mode() {
        let plain = FileClass::default();

        assert!(Scope::Script.applies(Mode::Script, plain));
        assert!(!Scope::Script.applies(Mode::Markup, plain));
        assert!(Scope::Style.applies(Mode::Style, plain));
        assert!(Scope::Markup.applies(Mode::Markup, plain));
        assert!(Scope::All.applies(Mode::Style, plain));
    }

    #[test]
    fn server_only_scope_needs_server_file_and_script_pass() {
        assert!(!Scope::ServerOnly.applies(Mode::Script, class(false, false)));
        assert!(Scope::ServerOnly.applies(Mode::Script, class(true, false)));
        assert!(!Scope::ServerOnly.applies(Mode::Markup, class(true, false)));
    }

    #[test]
    fn config_scope_follows_file_class() {
        assert!(Scope::Config.applies(Mode::Script, class(false, true)));
        assert!(!Scope::Config.applies(Mode::Script, class(false, false)));
    }

    #[test]
    fn invalid_pattern_names_rule() {
        let err = Rule::line("broken-rule", "(unclosed").unwrap_err();

        assert!(err.to_string().contains("broken-rule"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let rules = vec![
            Rule::line("dup", "a").unwrap(),
            Rule::line("dup", "b").unwrap(),
        ];

        match RuleTable::new(rules) {
            Err(CatalogError::DuplicateId { rule_id }) => assert_eq!(rule_id, "dup"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    #[test]
    fn single_only_affects_line_rules() {
        let rule = Rule::line("r", "x").unwrap().single();
        assert!(matches!(rule.kind, RuleKind::Line { repeat: false }));

        let multi = Rule::multiline("m", "x", None).unwrap().single();
        assert!(multi.is_multiline());
    }

    fn reject_bare_x(matched: &str, _ctx: MatchContext<'_>) -> bool {
        matched != "x"
    }

    #[test]
    fn validator_can_veto() {
        let rule = Rule::line("r", "x")
            .unwrap()
            .with_validator(Arc::new(reject_bare_x));
        let ctx = MatchContext {
            file_path: "a.js",
            line: 1,
            content: "x",
        };

        assert!(!rule.accepts("x", ctx));
        assert!(rule.accepts("xx", ctx));
    }

    #[test]
    fn table_splits_line_and_multiline_rules() {
        let table = RuleTable::new(vec![
            Rule::line("a", "a").unwrap(),
            Rule::multiline("b", "b", Some("c")).unwrap(),
        ])
        .unwrap();

        assert_eq!(table.line_rules().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["a"]);
        assert_eq!(
            table.multiline_rules().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["b"]
        );
        assert_eq!(table.len(), 2);
        assert!(table.get("b").is_some());
        assert!(table.get("z").is_none());
    }

    #[test]
    fn configured_applies_disabled_and_overrides() {
        let table = RuleTable::new(vec![
            Rule::line("keep", "a").unwrap(),
            Rule::line("drop", "b").unwrap(),
            Rule::line("a11y-rule", "c")
                .unwrap()
                .with_category(RuleCategory::A11y),
        ])
        .unwrap();

        let mut config = RulesConfig {
            disabled: vec!["drop".to_string()],
            a11y: Some(false),
            ..RulesConfig::default()
        };
        config
            .severity
            .insert("keep".to_string(), SeverityValue::Error);

        let table = table.configured(&config);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("keep").unwrap().severity, Severity::Error);
    }

    #[test]
    fn exclusions_make_rule_inactive() {
        let table = RuleTable::new(vec![Rule::line("r", "x").unwrap().with_scope(Scope::Script)])
            .unwrap()
            .with_exclusions(ExclusionTable::new().with("r", [ClassTag::Test]));
        let rule = table.get("r").unwrap();
        let test_file = FileClass {
            test: true,
            ..FileClass::default()
        };

        assert!(table.is_active(rule, Mode::Script, FileClass::default()));
        assert!(!table.is_active(rule, Mode::Script, test_file));
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
