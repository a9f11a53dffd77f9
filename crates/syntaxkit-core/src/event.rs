//! Editor notifications.
//!
//! A `tokio::sync::broadcast` channel. Sending is synchronous, so the
//! editor emits without a runtime; subscribers can be async tasks or plain
//! `try_recv` loops.

use std::ops::Range;
use syntaxkit_buffer::Selection;
use tokio::sync::broadcast;

/// Events produced by a `SyntaxEditor`.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The text changed; carries the new length in characters
    TextChanged { len_chars: usize },
    /// A highlighting pass finished
    Highlighted { grammar: String },
    /// The selection moved
    SelectionChanged(Selection),
    /// A placeholder was selected by tab or by snapping
    PlaceholderSelected(Range<usize>),
    /// Smart edit inserted text on its own
    AutoInserted(String),
    /// A different grammar is in use
    GrammarChanged(String),
}

/// Event bus for broadcasting editor events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
