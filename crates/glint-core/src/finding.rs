//! A single reported violation

use serde::{Deserialize, Serialize};

use crate::rules::{Rule, RuleCategory, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    /// 1-based, in outer-file coordinates.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
    pub rule_id: String,
    pub severity: Severity,
    pub category: RuleCategory,
    pub matched: String,
}

impl Finding {
    pub fn new(rule: &Rule, file: &str, line: usize, column: usize, matched: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            line,
            column,
            rule_id: rule.id.clone(),
            severity: rule.severity,
            category: rule.category,
            matched: matched.into(),
        }
    }

    /// The aggregation order: category, file, line, column, then rule id.
    pub fn sort_key(&self) -> (RuleCategory, &str, usize, usize, &str) {
        (
            self.category,
            self.file.as_str(),
            self.line,
            self.column,
            self.rule_id.as_str(),
        )
    }
}
