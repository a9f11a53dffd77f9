//! The editing session.
//!
//! `SyntaxEditor` plays the delegate of a host text view. The host calls
//! `should_change_text` before committing typed text, `text_did_change`
//! after, and `selection_did_change` whenever the selection moves. Hosts
//! without their own text storage can use `insert_text` and `type_text`,
//! which run the same protocol against the editor's buffer.

use std::ops::Range;
use syntaxkit_buffer::{Selection, StyledBuffer, StyledText};
use syntaxkit_syntax::{CompletionItem, FontSpec, Grammar, Highlighter, ThemeStore, placeholder};

use crate::config::{Config, EditorConfig};
use crate::event::{EditorEvent, EventBus};
use crate::smart_edit::{Interception, SmartEdit, SKIPPABLE};
use crate::{CoreError, CoreResult};

/// A highlighted buffer with smart editing.
///
/// Owned by one thread. Other editors may share the same `ThemeStore`;
/// color changes made through any handle show up on the next pass.
#[derive(Debug)]
pub struct SyntaxEditor {
    buffer: StyledBuffer,
    grammar: Grammar,
    highlighter: Highlighter,
    smart: SmartEdit,
    config: EditorConfig,
    event_bus: EventBus,
}

impl SyntaxEditor {
    /// Creates an empty editor with default settings.
    pub fn new(grammar: Grammar, store: ThemeStore) -> Self {
        Self::with_config(grammar, store, EditorConfig::default())
    }

    pub fn with_config(grammar: Grammar, store: ThemeStore, config: EditorConfig) -> Self {
        Self {
            buffer: StyledBuffer::new(),
            grammar,
            highlighter: Highlighter::new(store),
            smart: SmartEdit::new(),
            config,
            event_bus: EventBus::new(),
        }
    }

    /// Creates an editor for files ending in `suffix`.
    ///
    /// A grammar file registered in `config.grammars` wins over the
    /// built-in grammars, and `config.appearance.theme` wins over the
    /// grammar's own theme.
    pub fn for_suffix(config: &Config, suffix: &str, store: ThemeStore) -> CoreResult<Self> {
        let grammar = match config.grammar_path(suffix) {
            Some(path) => Grammar::load(path, &store)?,
            None => Grammar::builtin_for_suffix(suffix, &store)?,
        };
        let grammar = match &config.appearance.theme {
            Some(name) => {
                let font = FontSpec {
                    family: config.appearance.font_family.clone(),
                    size: config.appearance.font_size,
                };
                let theme = store.theme(name)?.with_font(font);
                grammar.with_theme(theme)
            }
            None => grammar,
        };

        tracing::info!("Editing .{} files with {}", suffix, grammar.name());
        Ok(Self::with_config(grammar, store, config.editor.clone()))
    }

    // ==================== Accessors ====================

    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text().into_owned()
    }

    pub fn selection(&self) -> Selection {
        self.buffer.selection()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        self.config = config;
    }

    pub fn smart_edit(&self) -> &SmartEdit {
        &self.smart
    }

    /// Subscribes to editor events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EditorEvent> {
        self.event_bus.subscribe()
    }

    /// Switches grammars and repaints.
    pub fn set_grammar(&mut self, grammar: Grammar) {
        self.event_bus
            .emit(EditorEvent::GrammarChanged(grammar.name().to_string()));
        self.grammar = grammar;
        self.highlight();
    }

    // ==================== Host notifications ====================

    /// Text is about to replace `range`. Returns `false` to veto it.
    ///
    /// A veto may move the selection: over an existing closer, or onto the
    /// next placeholder when `text` is a tab.
    pub fn should_change_text(&mut self, range: Range<usize>, text: &str) -> bool {
        match self
            .smart
            .should_change_text(&self.buffer, range, text, &self.config)
        {
            Interception::Allow => true,
            Interception::SkipOver { caret } => {
                tracing::trace!("Typed over {:?}", text);
                self.set_selection(Selection::caret(caret));
                false
            }
            Interception::SelectPlaceholder(found) => {
                self.select_placeholder(found);
                false
            }
        }
    }

    /// Text was committed. Repaints, then runs the smart-edit rules for
    /// the last typed text.
    pub fn text_did_change(&mut self) -> CoreResult<()> {
        self.event_bus.emit(EditorEvent::TextChanged {
            len_chars: self.buffer.len_chars(),
        });
        self.highlight();

        if self.smart.is_suppressed() {
            return Ok(());
        }

        let typed = self.smart.last_inserted().to_string();
        let caret = self.selection().end;
        if let Some(insertion) = self.smart.auto_insertion(&self.buffer, caret, &self.config) {
            self.smart.set_suppressed(true);
            let inserted = self.insert_text(&insertion.text);
            self.smart.set_suppressed(false);
            inserted?;

            let caret = self.selection().end - insertion.caret_back;
            self.event_bus.emit(EditorEvent::AutoInserted(insertion.text));
            self.set_selection(Selection::caret(caret));
        }

        self.smart.finish(typed);
        Ok(())
    }

    /// The selection moved. Snaps it to a placeholder that strictly
    /// encloses it.
    pub fn selection_did_change(&mut self) {
        let selection = self.selection();
        if self.config.placeholder_navigation {
            if let Some(found) = placeholder::enclosing_placeholder(&self.buffer, selection) {
                self.select_placeholder(found);
                return;
            }
        }
        self.event_bus.emit(EditorEvent::SelectionChanged(selection));
    }

    // ==================== Editing ====================

    /// Inserts `text` over the selection the way a host text view does:
    /// interception, commit, then the did-change pass.
    ///
    /// Returns `false` if the insertion was vetoed.
    pub fn insert_text(&mut self, text: &str) -> CoreResult<bool> {
        let range = self.selection().range();
        if !self.should_change_text(range.clone(), text) {
            return Ok(false);
        }

        self.buffer.replace(range.clone(), text)?;
        self.buffer
            .set_selection(Selection::caret(range.start + text.chars().count()));
        self.text_did_change()?;
        Ok(true)
    }

    /// Types `keys` one character at a time.
    pub fn type_text(&mut self, keys: &str) -> CoreResult<()> {
        let mut key = [0u8; 4];
        for c in keys.chars() {
            self.insert_text(c.encode_utf8(&mut key))?;
        }
        Ok(())
    }

    /// Replaces the whole document. Smart-edit history is dropped.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.smart.reset();
        self.event_bus.emit(EditorEvent::TextChanged {
            len_chars: self.buffer.len_chars(),
        });
        self.highlight();
    }

    /// Moves the selection, then applies placeholder snapping.
    pub fn set_selection(&mut self, selection: Selection) {
        self.buffer.set_selection(selection);
        self.selection_did_change();
    }

    /// Tab key: selects the next placeholder, or inserts a tab.
    pub fn tab(&mut self) -> CoreResult<()> {
        self.insert_text("\t").map(|_| ())
    }

    /// Moves the caret past the closer right after it. Returns whether the
    /// caret moved.
    pub fn skip_closing_character(&mut self) -> bool {
        let caret = self.selection().end;
        match self.buffer.char_at(caret) {
            Some(c) if SKIPPABLE.contains(&c) => {
                self.set_selection(Selection::caret(caret + 1));
                true
            }
            _ => false,
        }
    }

    /// Adds one indent level to every line the selection touches.
    pub fn indent_right(&mut self) -> CoreResult<()> {
        let unit = self.config.indent_unit();
        let unit_len = unit.chars().count();
        let (first, lines) = self.selected_lines()?;
        let end = self.selection().end;

        for &line_start in lines.iter().rev() {
            self.apply_edit(line_start..line_start, &unit)?;
        }

        let added = unit_len * lines.len();
        self.set_selection(Selection::new(first, end + added));
        Ok(())
    }

    /// Removes one indent level from every line the selection touches.
    ///
    /// A leading tab, or up to `tab_size` leading spaces, counts as one
    /// level. Lines without leading whitespace are left alone.
    pub fn indent_left(&mut self) -> CoreResult<()> {
        let (first, lines) = self.selected_lines()?;
        let end = self.selection().end;

        let mut removed = 0;
        for &line_start in lines.iter().rev() {
            let width = self.leading_indent_width(line_start);
            if width > 0 {
                self.apply_edit(line_start..line_start + width, "")?;
                removed += width;
            }
        }

        let end = end.saturating_sub(removed).max(first);
        self.set_selection(Selection::new(first, end));
        Ok(())
    }

    // ==================== Completion ====================

    /// Completion items matching `prefix`.
    pub fn completions(&self, prefix: &str) -> Vec<&CompletionItem> {
        self.grammar.completions(prefix, None)
    }

    /// Inserts the completion named `name` over the selection and selects
    /// its first placeholder.
    pub fn insert_completion(&mut self, name: &str) -> CoreResult<()> {
        let text = self
            .grammar
            .completion_items()
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.insertion_text.clone())
            .ok_or_else(|| CoreError::UnknownCompletion(name.to_string()))?;

        let range = self.selection().range();
        self.apply_edit(range.clone(), &text)?;
        self.smart.reset();

        match placeholder::next_placeholder(&self.buffer, range.start) {
            Some(found) => self.select_placeholder(found),
            None => self.set_selection(Selection::caret(range.start + text.chars().count())),
        }
        Ok(())
    }

    // ==================== Internals ====================

    fn highlight(&mut self) {
        self.highlighter.highlight(&mut self.buffer, &self.grammar);
        self.event_bus.emit(EditorEvent::Highlighted {
            grammar: self.grammar.name().to_string(),
        });
    }

    fn select_placeholder(&mut self, found: Range<usize>) {
        tracing::debug!("Selecting placeholder {:?}", found);
        self.buffer.set_selection(found.clone().into());
        self.event_bus
            .emit(EditorEvent::PlaceholderSelected(found.clone()));
        self.event_bus
            .emit(EditorEvent::SelectionChanged(found.into()));
    }

    /// Replaces `range` without interception or auto-insertion.
    fn apply_edit(&mut self, range: Range<usize>, text: &str) -> CoreResult<()> {
        self.smart.set_suppressed(true);
        let result = self
            .buffer
            .replace(range, text)
            .map_err(CoreError::from)
            .and_then(|_| self.text_did_change());
        self.smart.set_suppressed(false);
        result
    }

    /// Start of the first selected line, and the start of every line the
    /// selection intersects. A caret touches only its own line.
    fn selected_lines(&self) -> CoreResult<(usize, Vec<usize>)> {
        let selection = self.selection();
        let first_line = self.buffer.char_to_line(selection.start)?;
        let last_line = self.buffer.char_to_line(selection.end)?;

        let mut lines = Vec::with_capacity(last_line - first_line + 1);
        for line in first_line..=last_line {
            let range = self.buffer.line_range(line)?;
            if line == first_line || selection.intersects(&range) {
                lines.push(range.start);
            }
        }
        Ok((lines[0], lines))
    }

    fn leading_indent_width(&self, line_start: usize) -> usize {
        match self.buffer.char_at(line_start) {
            Some('\t') => 1,
            Some(' ') => (0..self.config.tab_size.max(1))
                .take_while(|offset| self.buffer.char_at(line_start + offset) == Some(' '))
                .count(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntaxkit_buffer::Color;
    use syntaxkit_syntax::ColorKey;

    fn editor() -> SyntaxEditor {
        let store = ThemeStore::in_memory();
        let grammar = Grammar::builtin("swift", &store).unwrap();
        SyntaxEditor::new(grammar, store)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<EditorEvent>) -> Vec<EditorEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_brace_auto_closes_and_is_typed_over() {
        let mut editor = editor();
        editor.type_text("{").unwrap();
        assert_eq!(editor.text(), "{}");
        assert_eq!(editor.selection(), Selection::caret(1));

        editor.type_text("}").unwrap();
        assert_eq!(editor.text(), "{}");
        assert_eq!(editor.selection(), Selection::caret(2));
    }

    #[test]
    fn test_newline_after_opener_opens_block() {
        let mut editor = editor();
        editor.type_text("if (x) {").unwrap();
        assert_eq!(editor.text(), "if (x) {}");

        editor.type_text("\n").unwrap();
        assert_eq!(editor.text(), "if (x) {\n\t\n}");
        assert_eq!(editor.selection(), Selection::caret(10));
    }

    #[test]
    fn test_nested_blocks_keep_depth() {
        let mut editor = editor();
        editor.type_text("{\n{\n").unwrap();
        assert_eq!(editor.text(), "{\n\t{\n\t\t\n\t}\n}");
        assert_eq!(editor.selection(), Selection::caret(7));
    }

    #[test]
    fn test_newline_after_typed_over_closer_adds_no_blank_line() {
        let mut editor = editor();
        editor.type_text("f()\n").unwrap();
        assert_eq!(editor.text(), "f()\n");
        assert_eq!(editor.selection(), Selection::caret(4));
    }

    #[test]
    fn test_newline_after_closed_pair() {
        for pair in ["()", "[]", "{}"] {
            let mut editor = editor();
            editor.type_text(&format!("{pair}\n")).unwrap();
            assert_eq!(editor.text(), format!("{pair}\n"), "pair {pair}");
            assert_eq!(editor.selection(), Selection::caret(3));
        }
    }

    #[test]
    fn test_newline_after_bare_opener() {
        let mut editor = editor();
        editor.type_text("{\n").unwrap();
        assert_eq!(editor.text(), "{\n\t\n}");
        assert_eq!(editor.selection(), Selection::caret(3));
    }

    #[test]
    fn test_call_inside_block_keeps_depth_without_blank_line() {
        let mut editor = editor();
        editor.type_text("{\nf()\n").unwrap();
        assert_eq!(editor.text(), "{\n\tf()\n\t\n}");
        assert_eq!(editor.selection(), Selection::caret(9));
    }

    #[test]
    fn test_newline_indents_continuation_lines() {
        let mut editor = editor();
        editor.type_text("{\nlet a = 1\n").unwrap();
        assert_eq!(editor.text(), "{\n\tlet a = 1\n\t\n}");
    }

    #[test]
    fn test_quotes_and_brackets_pair() {
        let mut editor = editor();
        editor.type_text("f(\"a\", [1])").unwrap();
        assert_eq!(editor.text(), "f(\"a\", [1])");
        assert_eq!(editor.selection(), Selection::caret(editor.buffer().len_chars()));
    }

    #[test]
    fn test_block_comment_closes() {
        let mut editor = editor();
        editor.type_text("/*").unwrap();
        assert_eq!(editor.text(), "/**/");
        assert_eq!(editor.selection(), Selection::caret(2));
    }

    #[test]
    fn test_tab_selects_placeholder() {
        let mut editor = editor();
        editor.set_text("call(<#param#>)");
        editor.set_selection(Selection::caret(0));

        editor.tab().unwrap();
        assert_eq!(editor.text(), "call(<#param#>)");
        assert_eq!(editor.selection(), Selection::new(5, 14));
    }

    #[test]
    fn test_tab_without_placeholder_inserts_tab() {
        let mut editor = editor();
        editor.set_text("x");
        editor.tab().unwrap();
        assert_eq!(editor.text(), "x\t");
    }

    #[test]
    fn test_selection_snaps_to_enclosing_placeholder() {
        let mut editor = editor();
        editor.set_text("a <#param#> b");

        editor.set_selection(Selection::caret(5));
        assert_eq!(editor.selection(), Selection::new(2, 11));

        editor.set_selection(Selection::caret(1));
        assert_eq!(editor.selection(), Selection::caret(1));
    }

    #[test]
    fn test_skip_closing_character() {
        let mut editor = editor();
        editor.set_text("(x)");
        editor.set_selection(Selection::caret(2));
        assert!(editor.skip_closing_character());
        assert_eq!(editor.selection(), Selection::caret(3));

        // end of document
        assert!(!editor.skip_closing_character());
        assert_eq!(editor.selection(), Selection::caret(3));

        editor.set_selection(Selection::caret(1));
        assert!(!editor.skip_closing_character());
    }

    #[test]
    fn test_indent_right_then_left_round_trips() {
        let mut editor = editor();
        let original = "a\n\tb\nc\nd";
        editor.set_text(original);
        editor.set_selection(Selection::new(0, 6));

        editor.indent_right().unwrap();
        assert_eq!(editor.text(), "\ta\n\t\tb\n\tc\nd");
        assert_eq!(editor.selection(), Selection::new(0, 9));

        editor.indent_left().unwrap();
        assert_eq!(editor.text(), original);
        assert_eq!(editor.selection(), Selection::new(0, 6));
    }

    #[test]
    fn test_indent_left_with_spaces() {
        let store = ThemeStore::in_memory();
        let grammar = Grammar::builtin("java", &store).unwrap();
        let config = EditorConfig {
            use_spaces: true,
            tab_size: 2,
            ..EditorConfig::default()
        };
        let mut editor = SyntaxEditor::with_config(grammar, store, config);
        editor.set_text("   x\ny");
        editor.set_selection(Selection::caret(4));

        editor.indent_left().unwrap();
        assert_eq!(editor.text(), " x\ny");
    }

    #[test]
    fn test_selection_ending_at_line_start_skips_that_line() {
        let mut editor = editor();
        editor.set_text("a\nb");
        editor.set_selection(Selection::new(0, 2));
        editor.indent_right().unwrap();
        assert_eq!(editor.text(), "\ta\nb");
    }

    #[test]
    fn test_caret_at_line_start_indents_only_its_line() {
        let mut editor = editor();
        editor.set_text("a\nb");
        editor.set_selection(Selection::caret(2));
        editor.indent_right().unwrap();
        assert_eq!(editor.text(), "a\n\tb");
        assert_eq!(editor.selection(), Selection::new(2, 3));
    }

    #[test]
    fn test_text_is_highlighted_after_typing() {
        let mut editor = editor();
        editor.type_text("let x = 1").unwrap();

        let keyword = editor.grammar().theme().color(ColorKey::Keyword);
        assert_eq!(editor.buffer().style_at(0).unwrap().foreground, keyword);
    }

    #[test]
    fn test_theme_change_visible_on_next_edit() {
        let store = ThemeStore::in_memory();
        let grammar = Grammar::builtin("swift", &store).unwrap();
        let theme = grammar.theme_name().to_string();
        let mut editor = SyntaxEditor::new(grammar, store.clone());

        let pink = Color::rgb(255, 0, 128);
        store.set_color(pink, ColorKey::Keyword, &theme);
        editor.type_text("return").unwrap();
        assert_eq!(editor.buffer().style_at(0).unwrap().foreground, Some(pink));
    }

    #[test]
    fn test_completion_inserts_and_selects_placeholder() {
        let mut editor = editor();
        let names: Vec<_> = editor.completions("fu").iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, ["func"]);

        editor.insert_completion("if").unwrap();
        assert!(editor.text().starts_with("if <#condition#> {"));
        assert_eq!(editor.selection(), Selection::new(3, 16));

        assert!(matches!(
            editor.insert_completion("nope"),
            Err(CoreError::UnknownCompletion(_))
        ));
    }

    #[test]
    fn test_events() {
        let mut editor = editor();
        let mut rx = editor.subscribe();

        editor.type_text("(").unwrap();
        let events = drain(&mut rx);
        assert!(events.contains(&EditorEvent::AutoInserted(")".to_string())));
        assert!(events.contains(&EditorEvent::Highlighted {
            grammar: "Swift".to_string()
        }));
        assert_eq!(
            events.last(),
            Some(&EditorEvent::SelectionChanged(Selection::caret(1)))
        );

        editor.set_text("<#a#>");
        editor.set_selection(Selection::caret(0));
        drain(&mut rx);
        editor.tab().unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                EditorEvent::PlaceholderSelected(0..5),
                EditorEvent::SelectionChanged(Selection::new(0, 5)),
            ]
        );
    }

    #[test]
    fn test_for_suffix_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.json");
        std::fs::write(
            &path,
            r#"{"name": "Mini", "suffix": "mini", "features": [], "completion": []}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.grammars.insert("mini".to_string(), path);
        config.appearance.theme = Some("default-light".to_string());

        let editor = SyntaxEditor::for_suffix(&config, "mini", ThemeStore::in_memory()).unwrap();
        assert_eq!(editor.grammar().name(), "Mini");
        assert_eq!(editor.grammar().theme_name(), "default-light");

        let editor = SyntaxEditor::for_suffix(&Config::default(), "java", ThemeStore::in_memory()).unwrap();
        assert_eq!(editor.grammar().name(), "Java");

        assert!(SyntaxEditor::for_suffix(&Config::default(), "cob", ThemeStore::in_memory()).is_err());
    }
}
