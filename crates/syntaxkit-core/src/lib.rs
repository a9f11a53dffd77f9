//! # SyntaxKit Core
//!
//! The editing session that sits between a host text view and the
//! highlighter.
//!
//! ```text
//! keystroke ──► should_change_text ──► buffer edit ──► text_did_change
//!                  │ (veto: skip-over,                   │
//!                  │  tab to placeholder)                ├─► Highlighter
//!                  ▼                                     └─► SmartEdit
//!              selection                                      (synthetic
//!                                                              inserts)
//! ```
//!
//! `SyntaxEditor` owns the buffer, the grammar and the smart-edit state.
//! Hosts drive it with the three notifications above, or with the
//! convenience `insert_text` / `type_text` entry points, and observe it
//! through the `EventBus`.

pub mod config;
pub mod editor;
pub mod event;
pub mod smart_edit;

pub use config::{AppearanceConfig, Config, ConfigError, EditorConfig};
pub use editor::SyntaxEditor;
pub use event::{EditorEvent, EventBus};
pub use smart_edit::{AutoInsertion, Interception, SmartEdit, indentation_level};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Buffer error: {0}")]
    Buffer(#[from] syntaxkit_buffer::BufferError),

    #[error("Grammar error: {0}")]
    Grammar(#[from] syntaxkit_syntax::GrammarError),

    #[error("Theme error: {0}")]
    Theme(#[from] syntaxkit_syntax::ThemeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown completion: {0}")]
    UnknownCompletion(String),
}
