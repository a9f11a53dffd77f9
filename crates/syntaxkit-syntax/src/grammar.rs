//! Language grammars.
//!
//! A grammar is loaded from a JSON document:
//!
//! ```json
//! {
//!     "name": "Swift",
//!     "suffix": "swift",
//!     "appearance": "default-dark",
//!     "features": [
//!         { "key": "keyword", "pattern": "\\bfunc\\b", "colorkey": "keyword" },
//!         { "key": "todo", "pattern": "TODO", "color": "#FF8800" }
//!     ],
//!     "completion": [
//!         {
//!             "name": "func",
//!             "description": "Function declaration",
//!             "search-tags": ["function"],
//!             "insertion-text": "func <#name#>() {\n\t<#code#>\n}",
//!             "scope": null
//!         }
//!     ]
//! }
//! ```
//!
//! Loading is all-or-nothing: the first missing or ill-typed field aborts
//! the load with a `GrammarError::Format` naming where it happened.
//!
//! Rule patterns are compiled once here, when the grammar is built. A
//! pattern that does not compile is reported and the rule stays inert; the
//! rest of the grammar still highlights.

use fancy_regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use syntaxkit_buffer::Color;

use crate::store::DEFAULT_DARK_THEME;
use crate::{ColorKey, GrammarError, Theme, ThemeStore};

const SWIFT_JSON: &str = include_str!("../grammars/swift.json");
const JAVA_JSON: &str = include_str!("../grammars/java.json");

/// Names accepted by `Grammar::builtin`.
pub const BUILTIN_GRAMMARS: &[&str] = &["swift", "java"];

#[derive(Deserialize)]
struct RawGrammar {
    name: String,
    suffix: String,
    appearance: Option<String>,
    features: Vec<serde_json::Value>,
    completion: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawFeature {
    key: String,
    pattern: String,
    colorkey: Option<String>,
    color: Option<String>,
}

#[derive(Deserialize)]
struct RawCompletion {
    name: String,
    description: String,
    #[serde(rename = "search-tags")]
    search_tags: Vec<String>,
    #[serde(rename = "insertion-text")]
    insertion_text: String,
    scope: Option<String>,
}

/// One highlighting rule: a pattern and the color its matches get.
#[derive(Clone)]
pub struct GrammarRule {
    key: String,
    pattern: String,
    regex: Option<Arc<Regex>>,
    color: Color,
    color_key: Option<ColorKey>,
}

impl GrammarRule {
    /// A rule colored by a theme key, with black as its direct color.
    pub fn with_key(key: impl Into<String>, pattern: impl Into<String>, color_key: ColorKey) -> Self {
        Self::build(key.into(), pattern.into(), Color::BLACK, Some(color_key))
    }

    /// A rule with a fixed color.
    pub fn with_color(key: impl Into<String>, pattern: impl Into<String>, color: Color) -> Self {
        Self::build(key.into(), pattern.into(), color, None)
    }

    fn build(key: String, pattern: String, color: Color, color_key: Option<ColorKey>) -> Self {
        let regex = match Regex::new(&pattern) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(e) => {
                tracing::warn!("Pattern for rule {} could not be compiled: {}", key, e);
                None
            }
        };

        Self {
            key,
            pattern,
            regex,
            color,
            color_key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled pattern, or `None` if it failed to compile.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_deref()
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn color_key(&self) -> Option<ColorKey> {
        self.color_key
    }

    /// The color for this rule's matches under `theme`.
    ///
    /// The theme color of the rule's key wins; a rule without a key, or
    /// whose key the theme cannot resolve, uses its direct color.
    pub fn resolve_color(&self, theme: &Theme) -> Color {
        match self.color_key.and_then(|key| theme.color(key)) {
            Some(color) => color,
            None => {
                tracing::debug!("Rule {} uses its direct color {}", self.key, self.color);
                self.color
            }
        }
    }

    fn from_raw(raw: RawFeature, stage: &str) -> Result<Self, GrammarError> {
        let direct = match raw.color.as_deref() {
            Some(hex) => Color::from_hex(hex).ok_or_else(|| {
                GrammarError::format(stage, format!("invalid color {hex:?} for rule {}", raw.key))
            })?,
            None => Color::BLACK,
        };

        let color_key = match raw.colorkey.as_deref() {
            None => None,
            Some(raw_key) => match raw_key.parse::<ColorKey>() {
                Ok(ColorKey::Custom) => None,
                Ok(key) => Some(key),
                Err(e) => return Err(GrammarError::format(stage, e.to_string())),
            },
        };

        Ok(Self::build(raw.key, raw.pattern, direct, color_key))
    }
}

impl PartialEq for GrammarRule {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.pattern == other.pattern
            && self.color == other.color
            && self.color_key == other.color_key
    }
}

impl fmt::Debug for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarRule")
            .field("key", &self.key)
            .field("pattern", &self.pattern)
            .field("compiled", &self.regex.is_some())
            .field("color", &self.color)
            .field("color_key", &self.color_key)
            .finish()
    }
}

/// An autocomplete entry. Its insertion text may contain placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub name: String,
    pub description: String,
    pub search_tags: Vec<String>,
    pub insertion_text: String,
    pub scope: Option<String>,
}

impl CompletionItem {
    fn matches(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        self.name.to_lowercase().starts_with(&prefix)
            || self
                .search_tags
                .iter()
                .any(|tag| tag.to_lowercase().starts_with(&prefix))
    }
}

impl From<RawCompletion> for CompletionItem {
    fn from(raw: RawCompletion) -> Self {
        Self {
            name: raw.name,
            description: raw.description,
            search_tags: raw.search_tags,
            insertion_text: raw.insertion_text,
            scope: raw.scope,
        }
    }
}

/// A language definition: ordered rules, completions and a theme.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    suffix: String,
    theme: Theme,
    rules: Vec<GrammarRule>,
    completions: Vec<CompletionItem>,
}

impl Grammar {
    /// Creates a grammar from already-built parts.
    pub fn new(
        name: impl Into<String>,
        suffix: impl Into<String>,
        theme: Theme,
        rules: Vec<GrammarRule>,
        completions: Vec<CompletionItem>,
    ) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
            theme,
            rules,
            completions,
        }
    }

    /// Parses a grammar document and resolves its theme from `store`.
    pub fn from_json(source: &str, store: &ThemeStore) -> Result<Self, GrammarError> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        let raw: RawGrammar = serde_json::from_value(value)
            .map_err(|e| GrammarError::format("grammar", e.to_string()))?;

        let rules = raw
            .features
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let stage = format!("feature #{i}");
                let feature: RawFeature = serde_json::from_value(value)
                    .map_err(|e| GrammarError::format(&stage, e.to_string()))?;
                GrammarRule::from_raw(feature, &stage)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let completions = raw
            .completion
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value::<RawCompletion>(value)
                    .map(CompletionItem::from)
                    .map_err(|e| GrammarError::format(&format!("completion #{i}"), e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let theme_name = raw.appearance.as_deref().unwrap_or(DEFAULT_DARK_THEME);
        let theme = store.theme(theme_name)?;

        tracing::debug!(
            "Loaded grammar {} ({} rules, {} completions, theme {})",
            raw.name,
            rules.len(),
            completions.len(),
            theme_name
        );

        Ok(Self::new(raw.name, raw.suffix, theme, rules, completions))
    }

    /// Loads a grammar document from a file.
    pub fn load(path: impl AsRef<Path>, store: &ThemeStore) -> Result<Self, GrammarError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&source, store)
    }

    /// Loads one of the grammars compiled into this crate.
    pub fn builtin(name: &str, store: &ThemeStore) -> Result<Self, GrammarError> {
        let source = match name.to_lowercase().as_str() {
            "swift" => SWIFT_JSON,
            "java" => JAVA_JSON,
            _ => return Err(GrammarError::UnknownBuiltin(name.to_string())),
        };
        Self::from_json(source, store)
    }

    /// Finds the built-in grammar for a file suffix.
    pub fn builtin_for_suffix(suffix: &str, store: &ThemeStore) -> Result<Self, GrammarError> {
        for name in BUILTIN_GRAMMARS {
            let grammar = Self::builtin(name, store)?;
            if grammar.suffix.eq_ignore_ascii_case(suffix) {
                return Ok(grammar);
            }
        }
        Err(GrammarError::UnknownBuiltin(suffix.to_string()))
    }

    /// Replaces the grammar's theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Theme snapshot taken when the grammar was loaded.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_name(&self) -> &str {
        self.theme.name()
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    pub fn completion_items(&self) -> &[CompletionItem] {
        &self.completions
    }

    /// Completion items whose name or a search tag starts with `prefix`
    /// (case-insensitive), in declaration order.
    ///
    /// With a scope, unscoped items and items of that scope are returned.
    pub fn completions(&self, prefix: &str, scope: Option<&str>) -> Vec<&CompletionItem> {
        self.completions
            .iter()
            .filter(|item| match (scope, item.scope.as_deref()) {
                (Some(wanted), Some(item_scope)) => wanted == item_scope,
                _ => true,
            })
            .filter(|item| item.matches(prefix))
            .collect()
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.suffix == other.suffix
            && self.rules == other.rules
            && self.completions == other.completions
    }
}
