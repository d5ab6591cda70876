//! Per-file scanning
//!
//! A component file is split into script blocks, style blocks and the markup
//! residue. Each block is scanned on its own with fresh tokenizer state and
//! its outer line offset, the residue gets a markup pass, and the multi-line
//! rules run over the residue last. Script and style files are a single pass.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::blocks::{CodeBlock, split_component};
use crate::classify::{FileClass, FileClassifier, FileKind};
use crate::engine::{LineScan, RuleEngine};
use crate::finding::Finding;
use crate::multiline::apply_multiline;
use crate::rules::RuleTable;
use crate::tokenizer::Mode;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported file type: '{path}'")]
    Unsupported { path: PathBuf },
}

/// A file's path, contents and kind. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
    pub kind: FileKind,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            kind,
        }
    }

    /// Reads `path` as UTF-8. Invalid UTF-8 is a read failure.
    pub fn read(path: &Path) -> Result<Self, ScanError> {
        let kind = FileKind::from_path(path).ok_or_else(|| ScanError::Unsupported {
            path: path.to_path_buf(),
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self::new(path.display().to_string(), text, kind))
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    engine: RuleEngine,
    classifier: FileClassifier,
}

impl Scanner {
    pub fn new(table: Arc<RuleTable>, classifier: FileClassifier) -> Self {
        Self {
            engine: RuleEngine::new(table),
            classifier,
        }
    }

    pub fn table(&self) -> &RuleTable {
        self.engine.table()
    }

    pub fn classifier(&self) -> &FileClassifier {
        &self.classifier
    }

    /// Scans `file`, classifying it by its own path.
    pub fn scan(&self, file: &SourceFile) -> Vec<Finding> {
        self.scan_classified(file, &file.path)
    }

    /// Scans `file`, classifying it by `class_path` instead of the path
    /// findings report.
    fn scan_classified(&self, file: &SourceFile, class_path: &str) -> Vec<Finding> {
        let class = self.classifier.classify(class_path, file.kind);

        let findings = match file.kind {
            FileKind::Component => self.scan_component(file, class),
            FileKind::Script => self.scan_whole(file, Mode::Script, class),
            FileKind::Style => self.scan_whole(file, Mode::Style, class),
        };

        tracing::debug!(file = %file.path, findings = findings.len(), "scanned file");
        findings
    }

    /// Reads and scans `path`. Classification sees only the part of the path
    /// below `root`, so directories above the project never change a file's
    /// class. Findings keep the full path.
    pub fn scan_path(&self, path: &Path, root: &Path) -> Result<Vec<Finding>, ScanError> {
        let file = SourceFile::read(path)?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        Ok(self.scan_classified(&file, &relative.to_string_lossy()))
    }

    fn scan_whole(&self, file: &SourceFile, mode: Mode, class: FileClass) -> Vec<Finding> {
        let lines: Vec<&str> = file.text.split('\n').collect();
        self.engine
            .apply(&lines, &LineScan::new(&file.path, mode, class))
    }

    fn scan_component(&self, file: &SourceFile, class: FileClass) -> Vec<Finding> {
        let parts = split_component(&file.text);
        let mut findings = Vec::new();

        let blocks = parts
            .scripts
            .iter()
            .map(|block| (block, Mode::Script))
            .chain(parts.styles.iter().map(|block| (block, Mode::Style)));
        for (block, mode) in blocks {
            findings.extend(self.scan_block(file, block, mode, class));
        }

        let skip: Vec<Range<usize>> = parts
            .scripts
            .iter()
            .chain(&parts.styles)
            .filter_map(body_lines)
            .collect();
        let residue: Vec<&str> = parts.residue.split('\n').collect();
        let markup = LineScan::new(&file.path, Mode::Markup, class).with_skip_ranges(&skip);
        findings.extend(self.engine.apply(&residue, &markup));

        findings.extend(apply_multiline(
            self.engine.table(),
            &parts.residue,
            &file.path,
            class,
        ));

        findings
    }

    fn scan_block(
        &self,
        file: &SourceFile,
        block: &CodeBlock,
        mode: Mode,
        class: FileClass,
    ) -> Vec<Finding> {
        let lines: Vec<&str> = block.text.split('\n').collect();
        let scan = LineScan::new(&file.path, mode, class).with_offset(block.start_line);
        self.engine.apply(&lines, &scan)
    }
}

/// Outer lines holding nothing but block body, between the opening and
/// closing tag lines.
fn body_lines(block: &CodeBlock) -> Option<Range<usize>> {
    let inner = block.start_line + 1..block.end_line.saturating_sub(1);
    (inner.start < inner.end).then_some(inner)
}
