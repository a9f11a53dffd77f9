//! The highlighting pass.
//!
//! Runs on every edit notification and repaints the whole buffer:
//!
//! 1. clear every background color
//! 2. paint everything in the theme's plain-text color
//! 3. run each rule in declaration order; later rules overwrite earlier
//!    ones where their matches overlap
//! 4. paint placeholders last so nothing overwrites them
//!
//! The theme is rebuilt from the store at the start of every pass, so a
//! color changed through any `ThemeStore` handle shows up on the next
//! keystroke.

use std::ops::Range;
use syntaxkit_buffer::{Attribute, AttributeKind, Color, StyleRun, StyledBuffer, StyledText};

use crate::{ColorKey, Grammar, Theme, ThemeStore, placeholder};

/// Background of placeholder spans.
pub const PLACEHOLDER_BACKGROUND: Color = Color::rgba(128, 204, 230, 128);

/// Foreground of placeholder spans.
pub const PLACEHOLDER_FOREGROUND: Color = Color::WHITE;

/// Repaints buffers according to a grammar.
#[derive(Debug, Clone)]
pub struct Highlighter {
    store: ThemeStore,
}

impl Highlighter {
    pub fn new(store: ThemeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ThemeStore {
        &self.store
    }

    /// Repaints the full buffer.
    pub fn highlight<B: StyledText + ?Sized>(&self, buffer: &mut B, grammar: &Grammar) {
        let theme = self.current_theme(grammar);
        let text = buffer.text().into_owned();
        let full = 0..buffer.len_chars();

        buffer.remove_attribute(AttributeKind::Background, full.clone());
        match theme.color(ColorKey::PlainText) {
            Some(color) => buffer.set_attribute(Attribute::Foreground(color), full),
            None => buffer.remove_attribute(AttributeKind::Foreground, full),
        }

        let mut painted = 0usize;
        for rule in grammar.rules() {
            let Some(regex) = rule.regex() else {
                tracing::trace!("Skipping rule {} without a compiled pattern", rule.key());
                continue;
            };

            let color = rule.resolve_color(&theme);
            for found in regex.find_iter(&text) {
                match found {
                    Ok(m) => {
                        let range = char_range(buffer, m.start()..m.end());
                        buffer.set_attribute(Attribute::Foreground(color), range);
                        painted += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Rule {} stopped matching: {}", rule.key(), e);
                        break;
                    }
                }
            }
        }

        let placeholders = placeholder::placeholder_byte_ranges(&text);
        for range in &placeholders {
            let range = char_range(buffer, range.clone());
            buffer.set_attribute(Attribute::Background(PLACEHOLDER_BACKGROUND), range.clone());
            buffer.set_attribute(Attribute::Foreground(PLACEHOLDER_FOREGROUND), range);
        }

        tracing::debug!(
            "Highlighted {} chars with {}: {} matches, {} placeholders",
            buffer.len_chars(),
            grammar.name(),
            painted,
            placeholders.len()
        );
    }

    /// Highlights `text` on a scratch buffer and returns the style runs.
    pub fn style_runs(&self, text: &str, grammar: &Grammar) -> Vec<StyleRun> {
        let mut buffer = StyledBuffer::from(text);
        self.highlight(&mut buffer, grammar);
        buffer.style_runs()
    }

    fn current_theme(&self, grammar: &Grammar) -> Theme {
        match self.store.theme(grammar.theme_name()) {
            Ok(theme) => theme.with_font(grammar.theme().font().clone()),
            Err(e) => {
                tracing::warn!(
                    "Could not refresh theme {}, using the loaded snapshot: {}",
                    grammar.theme_name(),
                    e
                );
                grammar.theme().clone()
            }
        }
    }
}

fn char_range<B: StyledText + ?Sized>(buffer: &B, bytes: Range<usize>) -> Range<usize> {
    buffer.byte_to_char(bytes.start)..buffer.byte_to_char(bytes.end)
}
