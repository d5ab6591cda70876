//! Plain-text report, one line per finding

use std::fmt::Write;

use colored::Colorize;
use glint_core::rules::RuleTable;
use glint_core::{Report, Severity};

pub struct TextFormatter<'a> {
    table: &'a RuleTable,
}

impl<'a> TextFormatter<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    pub fn format(&self, report: &Report) -> String {
        let mut out = String::new();

        for finding in report.findings() {
            let severity = match finding.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
            };

            let _ = writeln!(
                out,
                "{}:{}:{}: {} [{}] {}",
                finding.file,
                finding.line,
                finding.column,
                severity,
                finding.rule_id.dimmed(),
                finding.matched.trim_end()
            );

            let suggestion = self
                .table
                .get(&finding.rule_id)
                .map(|rule| rule.suggestion.as_str())
                .filter(|s| !s.is_empty());
            if let Some(suggestion) = suggestion {
                let _ = writeln!(out, "  {} {}", "suggestion:".green(), suggestion);
            }
        }

        for skipped in report.skipped() {
            let _ = writeln!(
                out,
                "{} {}: {}",
                "skipped:".yellow(),
                skipped.path,
                skipped.reason
            );
        }

        if !report.findings().is_empty() || !report.skipped().is_empty() {
            out.push('\n');
        }

        let counts = report.counts();
        if counts.total() == 0 {
            let _ = write!(out, "No findings in {} file(s)", report.files_scanned());
        } else {
            let _ = write!(
                out,
                "Found {} error(s), {} warning(s) and {} info in {} file(s)",
                counts.error,
                counts.warning,
                counts.info,
                report.files_scanned()
            );
        }
        if report.files_skipped() > 0 {
            let _ = write!(out, " ({} skipped)", report.files_skipped());
        }
        out.push('\n');

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Finding;
    use glint_core::report::SkippedFile;
    use glint_core::rules::{Rule, RuleCategory, Scope};
    use insta::assert_snapshot;

    fn table() -> RuleTable {
        RuleTable::new(vec![
            Rule::line("no-inner-html", r"\.innerHTML\s*=\s*")
                .unwrap()
                .with_scope(Scope::Script)
                .with_severity(Severity::Error)
                .with_category(RuleCategory::Security)
                .with_suggestion("Assign textContent or sanitize the HTML first"),
            Rule::line("no-console", r"\bconsole\.log\(").unwrap(),
        ])
        .unwrap()
    }

    fn finding(file: &str, line: usize, column: usize, rule_id: &str, severity: Severity, matched: &str) -> Finding {
        Finding {
            file: file.to_string(),
            line,
            column,
            rule_id: rule_id.to_string(),
            severity,
            category: if rule_id == "no-console" {
                RuleCategory::Lint
            } else {
                RuleCategory::Security
            },
            matched: matched.to_string(),
        }
    }

    #[test]
    fn formats_findings_suggestions_and_summary() {
        colored::control::set_override(false);
        let report = Report::from_findings(
            vec![
                finding("src/lib/log.ts", 4, 3, "no-console", Severity::Info, "console.log("),
                finding("src/App.svelte", 5, 7, "no-inner-html", Severity::Error, ".innerHTML = "),
            ],
            2,
            Vec::new(),
        );

        assert_snapshot!(TextFormatter::new(&table()).format(&report), @r"
        src/App.svelte:5:7: error [no-inner-html] .innerHTML =
          suggestion: Assign textContent or sanitize the HTML first
        src/lib/log.ts:4:3: info [no-console] console.log(

        Found 1 error(s), 0 warning(s) and 1 info in 2 file(s)
        ");
    }

    #[test]
    fn empty_report_still_prints_a_summary() {
        colored::control::set_override(false);
        let report = Report::from_findings(
            Vec::new(),
            3,
            vec![SkippedFile {
                path: "bad.js".to_string(),
                reason: "invalid UTF-8".to_string(),
            }],
        );

        assert_snapshot!(TextFormatter::new(&table()).format(&report), @r"
        skipped: bad.js: invalid UTF-8

        No findings in 3 file(s) (1 skipped)
        ");
    }
}
