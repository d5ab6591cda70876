//! Line-by-line rule application
//!
//! [`RuleEngine::apply`] runs every active line rule over a run of
//! consecutive lines: each line is comment-stripped with state threaded from
//! the line before, then matched. Suppression directives are read from the
//! raw lines.

use std::ops::Range;
use std::sync::Arc;

use regex::{Match, Regex};

use crate::classify::FileClass;
use crate::finding::Finding;
use crate::rules::{MatchContext, Rule, RuleKind, RuleTable};
use crate::suppression::Suppressions;
use crate::tokenizer::{LineStripper, Mode};

/// Where a run of lines sits and how to scan it.
#[derive(Debug, Clone, Copy)]
pub struct LineScan<'a> {
    pub file_path: &'a str,
    pub mode: Mode,
    pub class: FileClass,
    /// 0-based outer line of the first line in the run.
    pub line_offset: usize,
    /// Half-open ranges of run-relative line indices to leave alone. Tokenizer
    /// state is reset after each skipped range.
    pub skip_ranges: &'a [Range<usize>],
}

impl<'a> LineScan<'a> {
    pub fn new(file_path: &'a str, mode: Mode, class: FileClass) -> Self {
        Self {
            file_path,
            mode,
            class,
            line_offset: 0,
            skip_ranges: &[],
        }
    }

    pub fn with_offset(mut self, line_offset: usize) -> Self {
        self.line_offset = line_offset;
        self
    }

    pub fn with_skip_ranges(mut self, skip_ranges: &'a [Range<usize>]) -> Self {
        self.skip_ranges = skip_ranges;
        self
    }

    fn skips(&self, index: usize) -> bool {
        self.skip_ranges.iter().any(|range| range.contains(&index))
    }
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    table: Arc<RuleTable>,
}

impl RuleEngine {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn apply(&self, lines: &[&str], scan: &LineScan<'_>) -> Vec<Finding> {
        let rules: Vec<&Rule> = self
            .table
            .line_rules()
            .filter(|rule| self.table.is_active(rule, scan.mode, scan.class))
            .collect();
        if rules.is_empty() {
            return Vec::new();
        }

        let suppressions = Suppressions::from_lines(lines.iter().copied());
        let mut stripper = LineStripper::new(scan.mode);
        let mut findings = Vec::new();
        let mut skipping = false;

        for (index, raw) in lines.iter().enumerate() {
            if scan.skips(index) {
                skipping = true;
                continue;
            }
            if skipping {
                stripper.reset();
                skipping = false;
            }

            let cleaned = stripper.strip(raw);
            if cleaned.trim().is_empty() {
                continue;
            }

            let line = scan.line_offset + index + 1;
            let ctx = MatchContext {
                file_path: scan.file_path,
                line,
                content: &cleaned,
            };

            for rule in &rules {
                if suppressions.is_suppressed(index, &rule.id) {
                    continue;
                }
                let repeat = matches!(rule.kind, RuleKind::Line { repeat: true });

                for found in find_matches(&rule.pattern, &cleaned, repeat) {
                    if !rule.accepts(found.as_str(), ctx) {
                        continue;
                    }
                    findings.push(Finding::new(
                        rule,
                        scan.file_path,
                        line,
                        char_column(raw, found.start()),
                        found.as_str(),
                    ));
                }
            }
        }

        findings
    }
}

/// 1-based character column of byte offset `index` in `raw`. Stripping keeps
/// byte offsets, so offsets into the cleaned line are valid here too.
fn char_column(raw: &str, index: usize) -> usize {
    let mut index = index.min(raw.len());
    while !raw.is_char_boundary(index) {
        index -= 1;
    }
    raw[..index].chars().count() + 1
}

/// Non-overlapping matches of `regex` in `text`, or just the first when
/// `repeat` is false.
pub fn find_matches<'r, 't>(regex: &'r Regex, text: &'t str, repeat: bool) -> Matches<'r, 't> {
    Matches {
        regex,
        text,
        cursor: 0,
        repeat,
        done: false,
    }
}

/// Match iterator that owns its cursor, so a shared [`Regex`] carries no scan
/// state between callers.
#[derive(Debug)]
pub struct Matches<'r, 't> {
    regex: &'r Regex,
    text: &'t str,
    cursor: usize,
    repeat: bool,
    done: bool,
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor > self.text.len() {
            return None;
        }

        let Some(found) = self.regex.find_at(self.text, self.cursor) else {
            self.done = true;
            return None;
        };

        // An empty match would be found again at the same cursor.
        self.cursor = if found.is_empty() {
            found.end()
                + self.text[found.end()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8)
        } else {
            found.end()
        };
        self.done = !self.repeat;

        Some(found)
    }
}
