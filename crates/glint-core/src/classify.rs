//! File kinds and path-based classification
//!
//! The kind decides how a file is split into passes; the class decides which
//! scoped rules run and which per-rule exclusions apply.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::config::{ClassifyConfig, ConfigError};

const COMPONENT_EXTENSIONS: &[&str] = &["svelte", "vue", "html", "htm"];
const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "pcss", "postcss"];

pub const DEFAULT_SERVER_ONLY: &[&str] = &["*.server.*", "*/server/*", "server/*"];
pub const DEFAULT_TEST: &[&str] = &["*.test.*", "*.spec.*", "*__tests__/*", "tests/*", "*/tests/*"];
pub const DEFAULT_CONFIG: &[&str] = &[
    "*.config.*",
    ".*rc.js",
    "*/.*rc.js",
    ".*rc.cjs",
    "*/.*rc.cjs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Markup-first template with embedded `<script>` / `<style>` blocks.
    Component,
    Script,
    Style,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if COMPONENT_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Component)
        } else if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Script)
        } else if STYLE_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Style)
        } else {
            None
        }
    }
}

/// Classification flags a per-rule exclusion can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassTag {
    ServerOnly,
    Test,
    Config,
    Component,
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassTag::ServerOnly => "server-only",
            ClassTag::Test => "test",
            ClassTag::Config => "config",
            ClassTag::Component => "component",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileClass {
    pub server_only: bool,
    pub test: bool,
    pub config: bool,
    pub component: bool,
}

impl FileClass {
    pub fn has(&self, tag: ClassTag) -> bool {
        match tag {
            ClassTag::ServerOnly => self.server_only,
            ClassTag::Test => self.test,
            ClassTag::Config => self.config,
            ClassTag::Component => self.component,
        }
    }
}

/// Rule id to the file classes where that rule is skipped.
#[derive(Debug, Clone, Default)]
pub struct ExclusionTable {
    by_rule: HashMap<String, Vec<ClassTag>>,
}

impl ExclusionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule_id: &str, tag: ClassTag) {
        let tags = self.by_rule.entry(rule_id.to_string()).or_default();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    pub fn with(mut self, rule_id: &str, tags: impl IntoIterator<Item = ClassTag>) -> Self {
        for tag in tags {
            self.insert(rule_id, tag);
        }
        self
    }

    pub fn is_excluded(&self, rule_id: &str, class: FileClass) -> bool {
        self.by_rule
            .get(rule_id)
            .is_some_and(|tags| tags.iter().any(|tag| class.has(*tag)))
    }

    pub fn tags(&self, rule_id: &str) -> &[ClassTag] {
        self.by_rule.get(rule_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_rule.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileClassifier {
    server_only: Vec<Pattern>,
    test: Vec<Pattern>,
    config: Vec<Pattern>,
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self {
            server_only: compile_defaults(DEFAULT_SERVER_ONLY),
            test: compile_defaults(DEFAULT_TEST),
            config: compile_defaults(DEFAULT_CONFIG),
        }
    }
}

fn compile_defaults(patterns: &[&str]) -> Vec<Pattern> {
    patterns.iter().filter_map(|p| Pattern::new(p).ok()).collect()
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| ConfigError::InvalidGlob {
                pattern: p.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

impl FileClassifier {
    /// Uses configured pattern lists, falling back to the defaults for any
    /// list left unset.
    pub fn from_config(config: &ClassifyConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_only: match &config.server_only {
                Some(patterns) => compile_patterns(patterns)?,
                None => defaults.server_only,
            },
            test: match &config.test {
                Some(patterns) => compile_patterns(patterns)?,
                None => defaults.test,
            },
            config: match &config.config {
                Some(patterns) => compile_patterns(patterns)?,
                None => defaults.config,
            },
        })
    }

    pub fn classify(&self, path: &str, kind: FileKind) -> FileClass {
        let normalized = normalize(path);
        let matches_any =
            |patterns: &[Pattern]| patterns.iter().any(|p| p.matches(normalized.as_str()));

        FileClass {
            server_only: matches_any(&self.server_only),
            test: matches_any(&self.test),
            config: matches_any(&self.config),
            component: kind == FileKind::Component,
        }
    }
}

/// Project-level include/exclude globs. An empty include list admits every
/// path.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let normalized = normalize(path);
        let hit = |patterns: &[Pattern]| patterns.iter().any(|p| p.matches(normalized.as_str()));

        (self.include.is_empty() || hit(&self.include)) && !hit(&self.exclude)
    }
}

fn normalize(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    normalized.trim_start_matches("./").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str) -> FileClass {
        FileClassifier::default().classify(path, FileKind::Script)
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(
            FileKind::from_path(Path::new("src/App.svelte")),
            Some(FileKind::Component)
        );
        assert_eq!(
            FileKind::from_path(Path::new("src/Card.VUE")),
            Some(FileKind::Component)
        );
        assert_eq!(FileKind::from_path(Path::new("a.ts")), Some(FileKind::Script));
        assert_eq!(FileKind::from_path(Path::new("a.scss")), Some(FileKind::Style));
        assert_eq!(FileKind::from_path(Path::new("README.md")), None);
        assert_eq!(FileKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn server_only_paths() {
        assert!(classify("src/routes/+page.server.ts").server_only);
        assert!(classify("src/hooks.server.js").server_only);
        assert!(classify("src/lib/server/db.ts").server_only);
        assert!(!classify("src/lib/client/db.ts").server_only);
        assert!(!classify("src/routes/+page.ts").server_only);
    }

    #[test]
    fn test_and_config_paths() {
        assert!(classify("src/lib/math.test.ts").test);
        assert!(classify("src/__tests__/a.js").test);
        assert!(!classify("src/lib/math.ts").test);
        assert!(classify("vite.config.ts").config);
        assert!(classify("./svelte.config.js").config);
        assert!(!classify("src/app.ts").config);
    }

    #[test]
    fn rc_files_must_be_dotfiles() {
        assert!(classify(".eslintrc.cjs").config);
        assert!(classify("app/.prettierrc.js").config);
        assert!(!classify("src/lib/arc.js").config);
        assert!(!classify("src/src.js").config);
    }

    #[test]
    fn windows_separators_are_normalized() {
        assert!(classify("src\\lib\\server\\db.ts").server_only);
    }

    #[test]
    fn component_flag_follows_kind() {
        let classifier = FileClassifier::default();
        assert!(classifier.classify("a.svelte", FileKind::Component).component);
        assert!(!classifier.classify("a.js", FileKind::Script).component);
    }

    #[test]
    fn configured_patterns_replace_defaults() {
        let config = ClassifyConfig {
            server_only: Some(vec!["api/*".to_string()]),
            ..ClassifyConfig::default()
        };
        let classifier = FileClassifier::from_config(&config).unwrap();

        assert!(classifier.classify("api/users.ts", FileKind::Script).server_only);
        assert!(!classifier.classify("a.server.ts", FileKind::Script).server_only);
        assert!(classifier.classify("a.test.ts", FileKind::Script).test);
    }

    #[test]
    fn invalid_glob_is_reported() {
        let config = ClassifyConfig {
            test: Some(vec!["[".to_string()]),
            ..ClassifyConfig::default()
        };

        let err = FileClassifier::from_config(&config).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidGlob { ref pattern, .. } if pattern == "["));
    }

    #[test]
    fn exclusion_table_matches_class_tags() {
        let table = ExclusionTable::new().with("no-console", [ClassTag::Test, ClassTag::Test]);
        let test_file = FileClass {
            test: true,
            ..FileClass::default()
        };

        assert!(table.is_excluded("no-console", test_file));
        assert!(!table.is_excluded("no-console", FileClass::default()));
        assert!(!table.is_excluded("other", test_file));
        assert_eq!(table.tags("no-console"), [ClassTag::Test]);
        assert!(table.tags("other").is_empty());
    }

    #[test]
    fn path_filter_applies_include_then_exclude() {
        let filter = PathFilter::new(
            &["src/*".to_string()],
            &["*.d.ts".to_string(), "src/vendor/*".to_string()],
        )
        .unwrap();

        assert!(filter.matches("src/app.ts"));
        assert!(filter.matches("./src/lib/a.svelte"));
        assert!(!filter.matches("src/types.d.ts"));
        assert!(!filter.matches("src/vendor/jquery.js"));
        assert!(!filter.matches("scripts/build.js"));
    }

    #[test]
    fn empty_path_filter_admits_everything() {
        let filter = PathFilter::default();

        assert!(filter.matches("anything/at/all.js"));
    }
}
