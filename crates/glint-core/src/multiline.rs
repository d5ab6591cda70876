//! Structural matching across line breaks
//!
//! Some violations only show up once a whole construct is visible, such as a
//! tag whose safe companion attribute sits a few lines below the attribute
//! that triggers the rule. Multi-line rules run once over the markup residue
//! (script and style bodies already blanked), with markup comments blanked as
//! well.

use crate::classify::FileClass;
use crate::engine::find_matches;
use crate::finding::Finding;
use crate::position::LineIndex;
use crate::rules::{MatchContext, Rule, RuleKind, RuleTable};
use crate::suppression::Suppressions;
use crate::tokenizer::{LineStripper, Mode};

const PREVIEW_CHARS: usize = 80;

/// Runs every active multi-line rule over `residue`.
pub fn apply_multiline(
    table: &RuleTable,
    residue: &str,
    file_path: &str,
    class: FileClass,
) -> Vec<Finding> {
    let rules: Vec<&Rule> = table
        .multiline_rules()
        .filter(|rule| table.is_active(rule, Mode::Markup, class))
        .collect();
    if rules.is_empty() {
        return Vec::new();
    }

    let cleaned = strip_markup_comments(residue);
    let index = LineIndex::new(&cleaned);
    let suppressions = Suppressions::from_lines(residue.split('\n'));
    let mut findings = Vec::new();

    for rule in rules {
        let companion = match &rule.kind {
            RuleKind::Multiline { companion } => companion.as_ref(),
            RuleKind::Line { .. } => continue,
        };

        for found in find_matches(&rule.pattern, &cleaned, true) {
            let matched = found.as_str();
            if companion.is_some_and(|companion| companion.is_match(matched)) {
                continue;
            }

            let (line, column) = index.line_col(residue, found.start());
            let last_line = index.line_of(found.end().saturating_sub(1).max(found.start()));
            if suppressions.is_span_suppressed(line - 1, last_line - 1, &rule.id) {
                continue;
            }

            let ctx = MatchContext {
                file_path,
                line,
                content: matched,
            };
            if !rule.accepts(matched, ctx) {
                continue;
            }

            findings.push(Finding::new(rule, file_path, line, column, preview(matched)));
        }
    }

    findings
}

fn strip_markup_comments(text: &str) -> String {
    let mut stripper = LineStripper::new(Mode::Markup);
    text.split('\n')
        .map(|line| stripper.strip(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line, length-bounded rendering of a match.
pub fn preview(matched: &str) -> String {
    let collapsed = matched.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(PREVIEW_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    fn table() -> RuleTable {
        RuleTable::new(vec![
            Rule::multiline(
                "target-blank-noopener",
                r#"<a\b[^>]*\btarget\s*=\s*["']?_blank\b[^>]*>"#,
                Some(r#"\brel\s*=\s*["'][^"']*\bno(?:opener|referrer)\b"#),
            )
            .unwrap(),
            Rule::line("line-rule", "<a").unwrap(),
        ])
        .unwrap()
    }

    fn run(text: &str) -> Vec<Finding> {
        apply_multiline(&table(), text, "src/Link.svelte", FileClass::default())
    }

    #[test]
    fn companion_on_a_later_line_makes_the_tag_safe() {
        let text = "<p>hi</p>\n<a\n  href=\"https://example.com\"\n  target=\"_blank\"\n  rel=\"noopener\"\n>x</a>\n";

        assert!(run(text).is_empty());
    }

    #[test]
    fn missing_companion_reports_the_opening_line() {
        let text = "<p>hi</p>\n<a\n  href=\"https://example.com\"\n  target=\"_blank\"\n  class=\"ext\"\n>x</a>\n";

        let findings = run(text);

        assert_eq!(findings.len(), 1);
        assert_eq!((findings[0].line, findings[0].column), (2, 1));
        assert_eq!(findings[0].rule_id, "target-blank-noopener");
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0].matched,
            "<a href=\"https://example.com\" target=\"_blank\" class=\"ext\" >"
        );
    }

    #[test]
    fn columns_and_lines_use_outer_coordinates() {
        let text = "<div>\n  <span>x</span> <a target=\"_blank\" href=\"/y\">y</a>\n</div>";

        let findings = run(text);

        assert_eq!((findings[0].line, findings[0].column), (2, 18));
    }

    #[test]
    fn commented_out_markup_is_ignored() {
        let text = "<!--\n<a target=\"_blank\" href=\"/x\">x</a>\n-->\n";

        assert!(run(text).is_empty());
    }

    #[test]
    fn directive_on_spanned_line_or_line_above_suppresses() {
        let inside = "<a\n  target=\"_blank\" <!-- glint-ignore target-blank-noopener -->\n  href=\"/x\">x</a>";
        let above = "<!-- glint-ignore-next-line target-blank-noopener -->\n<a target=\"_blank\"\n href=\"/x\">x</a>";
        let other = "<!-- glint-ignore-next-line img-alt -->\n<a target=\"_blank\" href=\"/x\">x</a>";

        assert!(run(inside).is_empty());
        assert!(run(above).is_empty());
        assert_eq!(run(other).len(), 1);
    }

    #[test]
    fn line_rules_are_left_to_the_engine() {
        assert!(run("<a href=\"/x\">x</a>").is_empty());
    }

    #[test]
    fn inactive_scope_is_skipped() {
        let table = RuleTable::new(vec![
            Rule::multiline("styled", "<b>", None)
                .unwrap()
                .with_scope(crate::rules::Scope::Style),
        ])
        .unwrap();

        assert!(apply_multiline(&table, "<b>", "a.svelte", FileClass::default()).is_empty());
    }

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        assert_eq!(preview("<a\n   target=\"_blank\"\n>"), "<a target=\"_blank\" >");

        let long = format!("<a {}>", "x".repeat(200));
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with("..."));
    }
}
