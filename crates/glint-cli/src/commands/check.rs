//! Check command - scans component, script and style files

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glint_core::classify::{FileClassifier, FileKind, PathFilter};
use glint_core::config::Config;
use glint_core::report::SkippedFile;
use glint_core::rules::{RuleTable, Severity};
use glint_core::scan::ScanError;
use glint_core::{Finding, Report, Scanner};
use rayon::prelude::*;
use walkdir::WalkDir;

use super::{load_config, load_rule_table};
use crate::output::json::JsonFormatter;
use crate::output::text::TextFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Ndjson,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rule catalog replacing the built-in rules
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Number of files scanned in parallel (default 16)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Filter findings by minimum severity level (error, warning, info)
    #[arg(long, value_name = "LEVEL")]
    pub severity: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();
        let min_severity = self.parse_severity()?;

        if !self.path.exists() {
            anyhow::bail!("Path does not exist: {}", self.path.display());
        }

        let config = load_config(&self.path)?;
        let table = Arc::new(load_rule_table(&config, self.catalog.as_deref())?.configured(&config.rules));
        let classifier = FileClassifier::from_config(&config.classify)?;
        let scanner = Scanner::new(Arc::clone(&table), classifier);

        let files = discover_files(&self.path, &config)?;
        let root = scan_root(&self.path);
        let concurrency = self.concurrency.filter(|n| *n > 0).unwrap_or(config.concurrency());
        tracing::debug!(files = files.len(), concurrency, "discovered files");

        let report = scan_files(&scanner, &files, root, concurrency, min_severity)?;
        let counts = report.counts();
        tracing::info!(
            files_scanned = report.files_scanned(),
            files_skipped = report.files_skipped(),
            errors = counts.error,
            warnings = counts.warning,
            infos = counts.info,
            "scan complete"
        );

        self.write_report(&report, &table)?;

        let code = report.exit_code(self.fail_on_warnings);
        if code != 0 {
            process::exit(code);
        }

        Ok(())
    }

    fn parse_severity(&self) -> Result<Severity> {
        match self.severity.as_deref() {
            Some("error") => Ok(Severity::Error),
            Some("warning") => Ok(Severity::Warning),
            Some("info") | None => Ok(Severity::Info),
            Some(other) => anyhow::bail!(
                "Invalid severity '{}'. Valid values: error, warning, info",
                other
            ),
        }
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env || self.output.is_some() {
            colored::control::set_override(false);
        }
    }

    /// Writes the whole report once, to `--output` or stdout.
    fn write_report(&self, report: &Report, table: &RuleTable) -> Result<()> {
        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create output file {}", path.display())
            })?)),
            None => Box::new(io::stdout().lock()),
        };

        let analyzed_path = self.path.to_string_lossy();
        match self.format {
            OutputFormat::Text => write!(writer, "{}", TextFormatter::new(table).format(report))?,
            OutputFormat::Json => writeln!(
                writer,
                "{}",
                JsonFormatter::new(table).format(report, &analyzed_path)?
            )?,
            OutputFormat::Ndjson => {
                JsonFormatter::new(table).format_ndjson(report, &analyzed_path, &mut writer)?
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// Directory that file classification is relative to: the scanned directory,
/// or the parent of a single scanned file.
fn scan_root(path: &Path) -> &Path {
    if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    }
}

/// Scans `files` on a pool of `concurrency` threads, classifying each by its
/// path below `root`. A file that cannot be read is recorded as skipped and
/// never aborts the batch.
fn scan_files(
    scanner: &Scanner,
    files: &[PathBuf],
    root: &Path,
    concurrency: usize,
    min_severity: Severity,
) -> Result<Report> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .build()
        .context("Failed to start scan workers")?;

    let results: Vec<(&PathBuf, Result<Vec<Finding>, ScanError>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| (file, scanner.scan_path(file, root)))
            .collect()
    });

    let mut findings = Vec::new();
    let mut skipped = Vec::new();
    for (path, result) in results {
        match result {
            Ok(found) => findings.extend(found.into_iter().filter(|f| f.severity >= min_severity)),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "skipping file");
                skipped.push(SkippedFile {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let files_scanned = files.len() - skipped.len();
    Ok(Report::from_findings(findings, files_scanned, skipped))
}

fn discover_files(path: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let filter = PathFilter::new(&config.include, &config.exclude)?;

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .filter(|e| {
            let relative = e.path().strip_prefix(path).unwrap_or(e.path());
            filter.matches(&relative.to_string_lossy())
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    Ok(files)
}

fn is_supported_file(path: &Path) -> bool {
    FileKind::from_path(path).is_some()
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "node_modules")
        .unwrap_or(false)
}
