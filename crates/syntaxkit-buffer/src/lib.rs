//! # SyntaxKit Buffer
//!
//! The text model the highlighting engine paints on.
//!
//! ## Key Concepts
//!
//! ### Styled text
//! - `StyledBuffer` owns a rope plus one style slot per character
//! - Foreground and background colors are set and cleared over
//!   character ranges, the way an attributed string works
//! - `StyledText` is the contract the engine codes against, so a host
//!   text component can stand in for `StyledBuffer`
//!
//! ### Character offsets
//! - Every range in this crate is a half-open range of `char` indices
//! - Byte offsets (what regex engines report) are converted with
//!   `StyledText::byte_to_char`

mod buffer;
mod color;
mod selection;
mod styled;

pub use buffer::StyledBuffer;
pub use color::Color;
pub use selection::Selection;
pub use styled::{Attribute, AttributeKind, CharStyle, StyleRun, StyledText};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("Invalid range {start}..{end} for buffer of {len} characters")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Line {0} is out of bounds")]
    LineOutOfBounds(usize),
}
