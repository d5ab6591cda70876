//! Built-in match validators, referenced by name from rule catalogs

use std::collections::HashMap;
use std::sync::Arc;

use super::{MatchContext, Validator};

/// Rejects calls whose whole argument is a single plain string literal,
/// e.g. `eval("1 + 1")`. Template literals with interpolation still count as
/// dynamic.
pub fn non_literal_argument(matched: &str, _ctx: MatchContext<'_>) -> bool {
    let Some(open) = matched.find('(') else {
        return true;
    };
    let argument = matched[open + 1..].trim().trim_end_matches(')').trim();
    !is_plain_string_literal(argument)
}

fn is_plain_string_literal(text: &str) -> bool {
    let mut chars = text.chars();
    let (Some(first), Some(last)) = (chars.next(), text.chars().next_back()) else {
        return false;
    };
    if text.len() < 2 || first != last || !matches!(first, '"' | '\'' | '`') {
        return false;
    }

    let inner = &text[1..text.len() - 1];
    if inner.contains(first) && !inner.contains('\\') {
        return false;
    }
    !(first == '`' && inner.contains("${"))
}

/// Rejects URLs that point at the local machine.
pub fn not_localhost_url(matched: &str, _ctx: MatchContext<'_>) -> bool {
    let lower = matched.to_ascii_lowercase();
    !["localhost", "127.0.0.1", "0.0.0.0", "[::1]"]
        .iter()
        .any(|host| lower.contains(&format!("//{host}")))
}

/// Name to validator lookup used when loading a catalog.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    by_name: HashMap<String, Arc<dyn Validator>>,
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry")
            .field("names", &names)
            .finish()
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("non-literal-argument", Arc::new(non_literal_argument));
        registry.register("not-localhost-url", Arc::new(not_localhost_url));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, validator: Arc<dyn Validator>) {
        self.by_name.insert(name.into(), validator);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Validator>> {
        self.by_name.get(name).cloned()
    }
}
