//! Line-oriented static analysis for component-based front-end sources
//!
//! Files are split into script, style and markup passes, each comment-stripped
//! by a small mode-aware tokenizer and matched against a declarative rule
//! table. Findings always carry outer-file line and column numbers.

pub mod blocks;
pub mod classify;
pub mod config;
pub mod engine;
pub mod finding;
pub mod multiline;
pub mod position;
pub mod report;
pub mod rules;
pub mod scan;
pub mod suppression;
pub mod tokenizer;

pub use finding::Finding;
pub use report::Report;
pub use rules::{RuleTable, Severity};
pub use scan::{Scanner, SourceFile};
