//! Aggregation of findings from every scanned file
//!
//! Findings arrive in whatever order the workers finish; [`Report`] sorts them
//! so that output is identical across runs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::finding::Finding;
use crate::rules::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    findings: Vec<Finding>,
    files_scanned: usize,
    skipped: Vec<SkippedFile>,
}

impl Report {
    pub fn from_findings(
        mut findings: Vec<Finding>,
        files_scanned: usize,
        mut skipped: Vec<SkippedFile>,
    ) -> Self {
        sort_findings(&mut findings);
        skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            findings,
            files_scanned,
            skipped,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn files_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn files_with_findings(&self) -> usize {
        self.findings
            .iter()
            .map(|f| f.file.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// 1 iff an error finding exists, or a warning when `fail_on_warnings`.
    pub fn exit_code(&self, fail_on_warnings: bool) -> i32 {
        let counts = self.counts();
        if counts.error > 0 || (fail_on_warnings && counts.warning > 0) {
            1
        } else {
            0
        }
    }
}

/// Stable sort by category, file, line, column and rule id.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
