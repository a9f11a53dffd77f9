//! The styled-text contract between the engine and its host.
//!
//! The highlighting and smart-edit code never touch a concrete buffer. They
//! talk to `StyledText`, which is the minimal surface a host text component
//! has to expose: the text, positional color attributes, edits, and the
//! selection.

use std::borrow::Cow;
use std::ops::Range;

use crate::{BufferResult, Color, Selection};

/// Which color attribute an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Foreground,
    Background,
}

/// A color attribute with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Foreground(Color),
    Background(Color),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Foreground(_) => AttributeKind::Foreground,
            Attribute::Background(_) => AttributeKind::Background,
        }
    }
}

/// The attributes attached to one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharStyle {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl CharStyle {
    pub fn apply(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Foreground(color) => self.foreground = Some(color),
            Attribute::Background(color) => self.background = Some(color),
        }
    }

    pub fn clear(&mut self, kind: AttributeKind) {
        match kind {
            AttributeKind::Foreground => self.foreground = None,
            AttributeKind::Background => self.background = None,
        }
    }
}

/// A maximal run of characters sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub style: CharStyle,
}

/// A mutable text with color attributes and a selection.
///
/// All ranges are half-open character ranges. Attribute operations clamp
/// out-of-range ends instead of failing, matching how an attributed string
/// is repainted after the text underneath has already changed.
pub trait StyledText {
    /// Returns the full text.
    fn text(&self) -> Cow<'_, str>;

    /// Number of characters.
    fn len_chars(&self) -> usize;

    /// Converts a byte offset of `text()` to a character index.
    fn byte_to_char(&self, byte_idx: usize) -> usize;

    /// Converts a character index to a byte offset of `text()`.
    fn char_to_byte(&self, char_idx: usize) -> usize;

    /// Returns the character at an index, or `None` past the end.
    fn char_at(&self, char_idx: usize) -> Option<char>;

    /// Index of the first character of a line.
    fn line_to_char(&self, line_idx: usize) -> BufferResult<usize>;

    /// Line containing a character index.
    fn char_to_line(&self, char_idx: usize) -> BufferResult<usize>;

    fn len_lines(&self) -> usize;

    fn set_attribute(&mut self, attribute: Attribute, range: Range<usize>);

    fn remove_attribute(&mut self, kind: AttributeKind, range: Range<usize>);

    fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()>;

    /// Replaces a range, returning the removed text.
    fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<String>;

    fn selection(&self) -> Selection;

    /// Sets the selection; ends past the buffer are clamped.
    fn set_selection(&mut self, selection: Selection);

    /// Char range of a line, including its line break.
    fn line_range(&self, line_idx: usize) -> BufferResult<Range<usize>> {
        let start = self.line_to_char(line_idx)?;
        let end = if line_idx + 1 < self.len_lines() {
            self.line_to_char(line_idx + 1)?
        } else {
            self.len_chars()
        };
        Ok(start..end)
    }
}
