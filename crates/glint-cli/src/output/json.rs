//! JSON output formatter
//!
//! Provides structured JSON and NDJSON output formats for programmatic integration.

use std::io::{self, Write};

use glint_core::report::{SeverityCounts, SkippedFile};
use glint_core::rules::{RuleCategory, RuleTable};
use glint_core::{Finding, Report};
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub findings: Vec<JsonFinding<'a>>,
    pub skipped: &'a [SkippedFile],
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub glint_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_with_findings: usize,
    pub total_findings: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
}

#[derive(Serialize, Default)]
pub struct CategoryCounts {
    pub security: usize,
    pub lint: usize,
    pub a11y: usize,
}

#[derive(Serialize)]
pub struct JsonFinding<'a> {
    pub rule_id: &'a str,
    pub category: RuleCategory,
    pub severity: glint_core::Severity,
    pub location: JsonLocation<'a>,
    pub matched: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'a str>,
}

#[derive(Serialize)]
pub struct JsonLocation<'a> {
    pub file: &'a str,
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub enum NdjsonRecord<'a> {
    #[serde(rename = "metadata")]
    Metadata(JsonMetadata),
    #[serde(rename = "finding")]
    Finding(JsonFinding<'a>),
    #[serde(rename = "skipped")]
    Skipped(&'a SkippedFile),
    #[serde(rename = "summary")]
    Summary(JsonSummary),
}

pub struct JsonFormatter<'a> {
    table: &'a RuleTable,
}

impl<'a> JsonFormatter<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    pub fn format(&self, report: &'a Report, analyzed_path: &str) -> serde_json::Result<String> {
        let output = JsonOutput {
            version: "1.0",
            metadata: build_metadata(analyzed_path),
            summary: build_summary(report),
            findings: report
                .findings()
                .iter()
                .map(|f| self.convert_finding(f))
                .collect(),
            skipped: report.skipped(),
        };
        serde_json::to_string_pretty(&output)
    }

    pub fn format_ndjson<W: Write>(
        &self,
        report: &'a Report,
        analyzed_path: &str,
        writer: &mut W,
    ) -> io::Result<()> {
        let metadata = NdjsonRecord::Metadata(build_metadata(analyzed_path));
        writeln!(writer, "{}", serde_json::to_string(&metadata)?)?;

        for finding in report.findings() {
            let record = NdjsonRecord::Finding(self.convert_finding(finding));
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        }

        for skipped in report.skipped() {
            let record = NdjsonRecord::Skipped(skipped);
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        }

        let summary = NdjsonRecord::Summary(build_summary(report));
        writeln!(writer, "{}", serde_json::to_string(&summary)?)?;

        Ok(())
    }

    fn convert_finding(&self, finding: &'a Finding) -> JsonFinding<'a> {
        JsonFinding {
            rule_id: &finding.rule_id,
            category: finding.category,
            severity: finding.severity,
            location: JsonLocation {
                file: &finding.file,
                line: finding.line,
                column: finding.column,
            },
            matched: &finding.matched,
            suggestion: self
                .table
                .get(&finding.rule_id)
                .map(|rule| rule.suggestion.as_str())
                .filter(|s| !s.is_empty()),
        }
    }
}

fn build_metadata(analyzed_path: &str) -> JsonMetadata {
    JsonMetadata {
        glint_version: env!("CARGO_PKG_VERSION"),
        working_directory: std::env::current_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default(),
        analyzed_path: analyzed_path.to_string(),
    }
}

fn build_summary(report: &Report) -> JsonSummary {
    let mut by_category = CategoryCounts::default();
    for finding in report.findings() {
        match finding.category {
            RuleCategory::Security => by_category.security += 1,
            RuleCategory::Lint => by_category.lint += 1,
            RuleCategory::A11y => by_category.a11y += 1,
        }
    }

    JsonSummary {
        files_scanned: report.files_scanned(),
        files_skipped: report.files_skipped(),
        files_with_findings: report.files_with_findings(),
        total_findings: report.findings().len(),
        by_severity: report.counts(),
        by_category,
    }
}
