//! Inline suppression directives
//!
//! Directives live in comments of any syntax and name the rules to silence:
//! - `// glint-ignore no-eval` - suppress `no-eval` on this line
//! - `/* glint-ignore: no-eval, no-new-function */` - several rules at once
//! - `<!-- glint-ignore-next-line img-alt -->` - suppress on the following line
//!
//! Ids are required; a bare `glint-ignore` suppresses nothing. Directives are
//! read from the raw line because stripping blanks the comments they live in.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

const DIRECTIVE_MARKER: &str = "glint-ignore";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"glint-ignore(?P<next>-next-line)?(?:[ \t]*:[ \t]*|[ \t]+)(?P<ids>[A-Za-z0-9_-]+(?:[ \t]*,[ \t]*[A-Za-z0-9_-]+)*)",
    )
    .expect("Invalid suppression directive pattern")
});

/// Rule ids named by directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionSet {
    ids: HashSet<String>,
}

impl SuppressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids suppressed on `raw` itself by `glint-ignore` directives.
    pub fn from_line(raw: &str) -> Self {
        LineDirectives::parse(raw).same_line
    }

    pub fn insert(&mut self, rule_id: impl Into<String>) {
        self.ids.insert(rule_id.into());
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.ids.contains(rule_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Directives found on one physical line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDirectives {
    pub same_line: SuppressionSet,
    pub next_line: SuppressionSet,
}

impl LineDirectives {
    pub fn parse(raw: &str) -> Self {
        let mut directives = Self::default();
        if !raw.contains(DIRECTIVE_MARKER) {
            return directives;
        }

        for caps in DIRECTIVE.captures_iter(raw) {
            let target = if caps.name("next").is_some() {
                &mut directives.next_line
            } else {
                &mut directives.same_line
            };
            for id in caps["ids"].split(',') {
                let id = id.trim();
                if !id.is_empty() {
                    target.insert(id);
                }
            }
        }

        directives
    }

    pub fn is_empty(&self) -> bool {
        self.same_line.is_empty() && self.next_line.is_empty()
    }
}

/// Directives for a run of consecutive lines, indexed by 0-based position in
/// that run.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    by_line: Vec<LineDirectives>,
}

impl Suppressions {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            by_line: lines.into_iter().map(LineDirectives::parse).collect(),
        }
    }

    /// Suppressed by a directive on the line itself or a next-line directive
    /// on the line above.
    pub fn is_suppressed(&self, line: usize, rule_id: &str) -> bool {
        self.same_line(line, rule_id)
            || line
                .checked_sub(1)
                .and_then(|above| self.by_line.get(above))
                .is_some_and(|d| d.next_line.contains(rule_id))
    }

    /// For a match spanning `first..=last`: any directive on a spanned line,
    /// or any directive on the line directly above.
    pub fn is_span_suppressed(&self, first: usize, last: usize, rule_id: &str) -> bool {
        if (first..=last).any(|line| self.same_line(line, rule_id)) {
            return true;
        }
        first
            .checked_sub(1)
            .and_then(|above| self.by_line.get(above))
            .is_some_and(|d| d.same_line.contains(rule_id) || d.next_line.contains(rule_id))
    }

    pub fn is_empty(&self) -> bool {
        self.by_line.iter().all(LineDirectives::is_empty)
    }

    fn same_line(&self, line: usize, rule_id: &str) -> bool {
        self.by_line
            .get(line)
            .is_some_and(|d| d.same_line.contains(rule_id))
    }
}
