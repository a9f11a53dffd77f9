//! Rope-backed styled buffer.
//!
//! ## Why Rope?
//!
//! Every keystroke inserts into the middle of the document and every
//! highlighting pass converts regex byte offsets to character indices.
//! A rope gives O(log n) for both, where a `String` would need a linear
//! scan per conversion.
//!
//! Styles are kept as one `CharStyle` per character in a `Vec` that is
//! spliced alongside the rope, so attributes stay attached to the
//! characters they were set on when text moves around them.

use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;

use crate::styled::{Attribute, AttributeKind, CharStyle, StyleRun, StyledText};
use crate::{BufferError, BufferResult, Selection};

/// A text buffer with per-character color attributes and a selection.
///
/// # Thread Safety
///
/// `StyledBuffer` is `Send` but not `Sync`; the editing engine drives it
/// from a single event loop.
#[derive(Debug, Clone, Default)]
pub struct StyledBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// One entry per character, always `rope.len_chars()` long
    styles: Vec<CharStyle>,

    /// Current selection, always within bounds
    selection: Selection,
}

impl StyledBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use syntaxkit_buffer::StyledBuffer;
    ///
    /// let buffer = StyledBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the style of one character.
    pub fn style_at(&self, char_idx: usize) -> Option<CharStyle> {
        self.styles.get(char_idx).copied()
    }

    /// Collapses the per-character styles into maximal runs.
    pub fn style_runs(&self) -> Vec<StyleRun> {
        let mut runs: Vec<StyleRun> = Vec::new();
        for (idx, style) in self.styles.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.style == *style => run.range.end = idx + 1,
                _ => runs.push(StyleRun {
                    range: idx..idx + 1,
                    style: *style,
                }),
            }
        }
        runs
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).into())
    }

    /// Replaces the whole text, dropping styles and resetting the selection.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.styles = vec![CharStyle::default(); self.rope.len_chars()];
        self.selection = Selection::caret(self.rope.len_chars());
    }

    fn check_range(&self, range: &Range<usize>) -> BufferResult<()> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
                len: self.len_chars(),
            });
        }
        Ok(())
    }

    fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.len_chars());
        range.start.min(end)..end
    }

    /// Shifts the selection to account for `removed` characters being
    /// replaced by `inserted` characters at `at`.
    fn shift_selection(&mut self, at: usize, removed: usize, inserted: usize) {
        let adjust = |pos: usize| {
            if pos <= at {
                pos
            } else if pos < at + removed {
                at + inserted
            } else {
                pos - removed + inserted
            }
        };
        self.selection = Selection::new(adjust(self.selection.start), adjust(self.selection.end));
    }
}

impl StyledText for StyledBuffer {
    #[inline]
    fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    #[inline]
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn byte_to_char(&self, byte_idx: usize) -> usize {
        self.rope.byte_to_char(byte_idx.min(self.rope.len_bytes()))
    }

    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.rope.char_to_byte(char_idx.min(self.rope.len_chars()))
    }

    fn char_at(&self, char_idx: usize) -> Option<char> {
        (char_idx < self.len_chars()).then(|| self.rope.char(char_idx))
    }

    fn line_to_char(&self, line_idx: usize) -> BufferResult<usize> {
        if line_idx >= self.rope.len_lines() {
            return Err(BufferError::LineOutOfBounds(line_idx));
        }
        Ok(self.rope.line_to_char(line_idx))
    }

    fn char_to_line(&self, char_idx: usize) -> BufferResult<usize> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        Ok(self.rope.char_to_line(char_idx))
    }

    #[inline]
    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn set_attribute(&mut self, attribute: Attribute, range: Range<usize>) {
        let range = self.clamp_range(range);
        for style in &mut self.styles[range] {
            style.apply(attribute);
        }
    }

    fn remove_attribute(&mut self, kind: AttributeKind, range: Range<usize>) {
        let range = self.clamp_range(range);
        for style in &mut self.styles[range] {
            style.clear(kind);
        }
    }

    /// Inserts text at a character index.
    ///
    /// New characters start unstyled; the next highlighting pass paints
    /// them. The selection shifts if it lies after the insertion point.
    fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }

        let inserted = text.chars().count();
        self.rope.insert(char_idx, text);
        self.styles.splice(
            char_idx..char_idx,
            std::iter::repeat_n(CharStyle::default(), inserted),
        );
        self.shift_selection(char_idx, 0, inserted);

        Ok(())
    }

    fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<String> {
        self.check_range(&range)?;

        let removed: String = self.rope.slice(range.clone()).into();
        let inserted = text.chars().count();

        self.rope.remove(range.clone());
        self.rope.insert(range.start, text);
        self.styles.splice(
            range.clone(),
            std::iter::repeat_n(CharStyle::default(), inserted),
        );
        self.shift_selection(range.start, range.len(), inserted);

        Ok(removed)
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.len_chars());
    }
}

impl From<&str> for StyledBuffer {
    fn from(s: &str) -> Self {
        let mut buffer = Self::new();
        buffer.set_text(s);
        buffer.selection = Selection::caret(0);
        buffer
    }
}

impl From<String> for StyledBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
