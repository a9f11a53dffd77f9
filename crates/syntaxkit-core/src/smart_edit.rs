//! Smart editing: auto-closing, auto-indent and skip-over.
//!
//! Two hooks around every insertion:
//!
//! - `should_change_text` runs before the text is committed and may veto
//!   it (typing over an existing closer, tab to a placeholder)
//! - `auto_insertion` runs after the commit and plans the synthetic text
//!   to add, keyed on what was just typed and what was typed before that
//!
//! Synthetic insertions run while the state is suppressed so they do not
//! trigger another round of auto-insertion.

use std::ops::Range;
use syntaxkit_buffer::StyledText;
use syntaxkit_syntax::placeholder;

use crate::config::EditorConfig;

const OPENERS: [char; 3] = ['{', '[', '('];
const CLOSERS: [char; 3] = ['}', ']', ')'];

/// Closers that are typed over instead of duplicated.
pub const SKIPPABLE: [char; 5] = ['}', ']', ')', '"', '\''];

/// Bracket depth before `location`: openers minus closers.
///
/// Counts every bracket, including those inside strings and comments, and
/// may be negative.
pub fn indentation_level<B: StyledText + ?Sized>(buffer: &B, location: usize) -> isize {
    let location = location.min(buffer.len_chars());
    buffer
        .text()
        .chars()
        .take(location)
        .fold(0, |level, c| {
            if OPENERS.contains(&c) {
                level + 1
            } else if CLOSERS.contains(&c) {
                level - 1
            } else {
                level
            }
        })
}

/// `level` copies of `unit`; nothing for zero or negative levels.
pub fn indentation(unit: &str, level: isize) -> String {
    unit.repeat(level.max(0) as usize)
}

/// Outcome of `SmartEdit::should_change_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Commit the text as typed
    Allow,
    /// Drop the text and move the caret here
    SkipOver { caret: usize },
    /// Drop the text and select this placeholder
    SelectPlaceholder(Range<usize>),
}

/// Text to insert at the caret after a committed insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoInsertion {
    pub text: String,
    /// How far the caret moves back from the end of `text`
    pub caret_back: usize,
}

impl AutoInsertion {
    fn closing(text: &str) -> Self {
        Self {
            caret_back: text.chars().count(),
            text: text.to_string(),
        }
    }
}

/// Keystroke state: the last two insertions and the reentrancy flag.
#[derive(Debug, Clone, Default)]
pub struct SmartEdit {
    last_inserted: String,
    previous_inserted: Option<String>,
    suppressed: bool,
}

impl SmartEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_inserted(&self) -> &str {
        &self.last_inserted
    }

    pub fn previous_inserted(&self) -> Option<&str> {
        self.previous_inserted.as_deref()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Marks the start or end of a synthetic insertion.
    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    /// Forgets both recorded insertions.
    pub fn reset(&mut self) {
        self.last_inserted.clear();
        self.previous_inserted = None;
    }

    /// Decides whether `text` replacing `range` should be committed.
    ///
    /// Records `text` as the last insertion when it is allowed. A closer
    /// that is typed over becomes the previous insertion, as if it had been
    /// committed. While suppressed everything is allowed and the empty
    /// string is recorded.
    pub fn should_change_text<B: StyledText + ?Sized>(
        &mut self,
        buffer: &B,
        range: Range<usize>,
        text: &str,
        config: &EditorConfig,
    ) -> Interception {
        if self.suppressed {
            self.last_inserted.clear();
            return Interception::Allow;
        }

        if config.auto_close && range.is_empty() && is_skippable(text) {
            let next = buffer.char_at(range.start);
            if next.is_some_and(|c| text.starts_with(c)) {
                self.last_inserted.clear();
                self.previous_inserted = Some(text.to_string());
                return Interception::SkipOver {
                    caret: range.start + 1,
                };
            }
        }

        if text == "\t" && config.placeholder_navigation {
            let from = buffer.selection().end;
            if let Some(found) = placeholder::next_placeholder(buffer, from) {
                return Interception::SelectPlaceholder(found);
            }
        }

        self.last_inserted = text.to_string();
        Interception::Allow
    }

    /// Plans the synthetic text that follows the last insertion, with the
    /// caret at `caret`.
    pub fn auto_insertion<B: StyledText + ?Sized>(
        &self,
        buffer: &B,
        caret: usize,
        config: &EditorConfig,
    ) -> Option<AutoInsertion> {
        if self.suppressed {
            return None;
        }

        match self.last_inserted.as_str() {
            "{" if config.auto_close => Some(AutoInsertion::closing("}")),
            "(" if config.auto_close => Some(AutoInsertion::closing(")")),
            "[" if config.auto_close => Some(AutoInsertion::closing("]")),
            "\"" if config.auto_close => Some(AutoInsertion::closing("\"")),
            "'" if config.auto_close => Some(AutoInsertion::closing("'")),
            "*" if config.auto_close => {
                let before = caret.checked_sub(2).and_then(|idx| buffer.char_at(idx));
                (before == Some('/')).then(|| AutoInsertion::closing("*/"))
            }
            "\n" if config.auto_indent => {
                let unit = config.indent_unit();
                let level = indentation_level(buffer, caret);
                let inner = indentation(&unit, level);

                if matches!(self.previous_inserted(), Some("{" | "(" | "[")) {
                    let outer = indentation(&unit, level - 1);
                    Some(AutoInsertion {
                        caret_back: 1 + outer.chars().count(),
                        text: format!("{inner}\n{outer}"),
                    })
                } else if inner.is_empty() {
                    None
                } else {
                    Some(AutoInsertion {
                        text: inner,
                        caret_back: 0,
                    })
                }
            }
            _ => None,
        }
    }

    /// Ends a post-insertion pass that started with `typed` as the last
    /// insertion.
    pub fn finish(&mut self, typed: String) {
        self.previous_inserted = Some(typed);
    }
}

fn is_skippable(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if SKIPPABLE.contains(&c))
}
