//! # SyntaxKit Syntax
//!
//! Regex-driven syntax highlighting with themed colors.
//!
//! ## Pieces
//!
//! - `ColorKey`: the closed set of token roles, with fallbacks
//! - `ThemeStore` / `Theme`: layered color resolution over a key/value store
//! - `Grammar`: ordered pattern→color rules plus completion items
//! - `Highlighter`: repaints a `StyledText` buffer after every edit
//! - `placeholder`: finds `<#...#>` template holes
//!
//! ## Why full re-scans?
//!
//! Every pass re-runs every rule over the whole document. That costs
//! O(document length × rule count) per keystroke, which is fine for source
//! files but does not scale to very large documents. In exchange there is
//! no incremental state to get out of sync with the text.

pub mod color_key;
pub mod grammar;
pub mod highlighter;
pub mod placeholder;
pub mod store;
pub mod theme;

pub use color_key::{ColorKey, UnknownColorKey};
pub use grammar::{CompletionItem, Grammar, GrammarRule};
pub use highlighter::Highlighter;
pub use store::{
    ColorStore, DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME, DefaultsLoader, MemoryColorStore,
    PackagedDefaults,
};
pub use theme::{FontSpec, Theme, ThemeStore};

/// Errors raised while loading theme data.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("No packaged defaults for theme: {0}")]
    UnknownBuiltin(String),

    #[error("Packaged defaults for {theme} are invalid: {message}")]
    Defaults { theme: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid theme file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while loading a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("Grammar is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid grammar format in {stage}: {message}")]
    Format { stage: String, message: String },

    #[error("Unknown built-in grammar: {0}")]
    UnknownBuiltin(String),

    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrammarError {
    pub(crate) fn format(stage: &str, message: impl Into<String>) -> Self {
        GrammarError::Format {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}
