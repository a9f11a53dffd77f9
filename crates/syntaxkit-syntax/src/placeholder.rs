//! Template placeholders.
//!
//! Completion insertion texts carry editable holes written `<#name#>`. The
//! highlighter paints them, tab jumps to the next one, and a selection
//! that lands strictly inside one is widened to cover it.
//!
//! The pattern is fixed. It failing to compile is a build defect, so it
//! panics instead of being reported like a grammar rule.

use fancy_regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use syntaxkit_buffer::{Selection, StyledText};

/// Opening delimiter, non-greedy body, closing delimiter. The body does not
/// cross line breaks.
pub const PLACEHOLDER_PATTERN: &str = r"<#(.*?)#>";

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern must compile")
    })
}

/// Byte ranges of every placeholder in `text`.
pub fn placeholder_byte_ranges(text: &str) -> Vec<Range<usize>> {
    placeholder_regex()
        .find_iter(text)
        .filter_map(Result::ok)
        .map(|m| m.start()..m.end())
        .collect()
}

/// Character ranges of every placeholder in the buffer.
pub fn placeholders<B: StyledText + ?Sized>(buffer: &B) -> Vec<Range<usize>> {
    let text = buffer.text();
    placeholder_byte_ranges(&text)
        .into_iter()
        .map(|range| buffer.byte_to_char(range.start)..buffer.byte_to_char(range.end))
        .collect()
}

/// The first placeholder that starts at or after `from`.
///
/// The search begins at `from`, so a placeholder that starts earlier is
/// never returned even if it extends past `from`.
pub fn next_placeholder<B: StyledText + ?Sized>(buffer: &B, from: usize) -> Option<Range<usize>> {
    if from >= buffer.len_chars() {
        return None;
    }

    let text = buffer.text();
    let start_byte = buffer.char_to_byte(from);
    match placeholder_regex().find_from_pos(&text, start_byte) {
        Ok(Some(m)) => Some(buffer.byte_to_char(m.start())..buffer.byte_to_char(m.end())),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Placeholder search failed: {}", e);
            None
        }
    }
}

/// The first placeholder that strictly encloses `selection`: it starts
/// before the selection and ends after it.
pub fn enclosing_placeholder<B: StyledText + ?Sized>(
    buffer: &B,
    selection: Selection,
) -> Option<Range<usize>> {
    placeholders(buffer)
        .into_iter()
        .find(|range| Selection::from(range.clone()).strictly_contains(&selection))
}
