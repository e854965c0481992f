//! The editor session: the boundary-facing controller.
//!
//! A `Session` exclusively owns the live `(Document, Selection, History)`
//! triple for one editing session and routes raw input events into the
//! editing core. It never decides what formatting means; it only commits
//! the edits the autoformat and mutation engines hand back, replacing the
//! triple wholesale with each engine's return value. One event is
//! processed to completion before the next is admitted, so no locking is
//! needed even if a shell moves rendering elsewhere.

use std::collections::BTreeSet;

use crate::editing::{
    autoformat,
    commands::{self, ChangeLabel, Cmd, Edit, Outcome},
    document::{BlockKind, Document, InlineStyle},
    history::{HistoryEntry, HistoryStack},
    selection::Selection,
    snapshot::{self, Snapshot},
    EditError,
};
use crate::io::{self, RawDocument, Store, StoreError};

/// Result of an input handler: `NotHandled` tells the shell to fall
/// through to its default behavior (it is not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Handled,
    NotHandled,
}

/// Result of an explicit save action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Every block was blank after trimming; nothing was written.
    NothingToSave,
}

/// One editing session: live state, history and the caret style override.
///
/// The override set holds inline styles toggled at a collapsed caret; they
/// apply to subsequently typed characters and reset when the selection is
/// moved explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    document: Document,
    selection: Selection,
    history: HistoryStack,
    caret_styles: BTreeSet<InlineStyle>,
    last_label: Option<ChangeLabel>,
    version: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session over the empty document, caret in the empty block.
    pub fn new() -> Self {
        let document = Document::new();
        let selection = Selection::caret(document.blocks()[0].id, 0);
        Self {
            document,
            selection,
            history: HistoryStack::new(),
            caret_styles: BTreeSet::new(),
            last_label: None,
            version: 0,
        }
    }

    /// Session over an existing document, caret at the end of the last
    /// block.
    pub fn from_document(document: Document) -> Self {
        let last = document
            .blocks()
            .last()
            .expect("document is never empty");
        let selection = Selection::caret(last.id, last.char_len());
        Self {
            document,
            selection,
            history: HistoryStack::new(),
            caret_styles: BTreeSet::new(),
            last_label: None,
            version: 0,
        }
    }

    /// Load the saved session, if any. A corrupt blob downgrades to an
    /// empty document — a broken saved session must never block editing —
    /// and the blob is left on disk untouched until the next save.
    /// Filesystem errors other than "not found" are surfaced.
    pub fn from_store(store: &Store) -> Result<Self, StoreError> {
        match store.load() {
            Ok(Some(raw)) => match io::document_from_raw(&raw) {
                Ok(document) => Ok(Self::from_document(document)),
                Err(_) => Ok(Self::new()),
            },
            Ok(None) => Ok(Self::new()),
            Err(StoreError::Json(_)) | Err(StoreError::Invalid(_)) => Ok(Self::new()),
            Err(err) => Err(err),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Incremented on every committed change; shells use it both for
    /// re-render detection and as the autosave trigger.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Styles that will apply to the next typed character.
    pub fn caret_styles(&self) -> &BTreeSet<InlineStyle> {
        &self.caret_styles
    }

    /// Immutable state for the rendering collaborator.
    pub fn snapshot(&self) -> Snapshot {
        snapshot::create_snapshot(&self.document, self.selection, self.version)
    }

    /// Move the selection (caret placement, shift-select from the shell).
    /// Ends the insertion burst and drops the caret style override.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditError> {
        selection.validate(&self.document)?;
        self.selection = selection;
        self.caret_styles.clear();
        self.history.break_burst();
        Ok(())
    }

    /// Route one about-to-be-inserted character: autoformat first, then
    /// the default insert path with the caret style override applied.
    pub fn on_before_input(&mut self, ch: char) -> Result<InputResult, EditError> {
        if let Some(matched) = autoformat::scan(&self.document, &self.selection, ch)? {
            let caret_style = matched.caret_style;
            self.commit(matched.edit);
            if let Some(style) = caret_style {
                self.toggle_caret_style(style);
            }
            return Ok(InputResult::Handled);
        }

        match commands::apply(&self.document, &self.selection, &Cmd::InsertChar(ch))? {
            Outcome::Applied(mut edit) => {
                if !self.caret_styles.is_empty() {
                    let caret = edit.selection;
                    for style in self.caret_styles.iter().copied() {
                        edit.document = edit.document.add_style(
                            caret.focus_block,
                            caret.focus_offset - 1,
                            caret.focus_offset,
                            style,
                        )?;
                    }
                }
                self.commit(edit);
                Ok(InputResult::Handled)
            }
            Outcome::NotHandled => Ok(InputResult::NotHandled),
        }
    }

    /// Map a named key command to an engine call. Unknown names are
    /// `NotHandled` so the shell can layer its own bindings on top.
    pub fn on_key_command(&mut self, command: &str) -> Result<InputResult, EditError> {
        match command {
            "undo" => Ok(self.undo()),
            "redo" => Ok(self.redo()),
            "bold" => self.toggle_style_command(InlineStyle::Bold),
            "red" => self.toggle_style_command(InlineStyle::ColorRed),
            "underline" => self.toggle_style_command(InlineStyle::Underline),
            "header" => self.run(Cmd::ToggleBlockKind(BlockKind::Header)),
            "backspace" => self.run(Cmd::DeleteBackward),
            "split-block" => self.run(Cmd::SplitBlock),
            _ => Ok(InputResult::NotHandled),
        }
    }

    /// Paste plain text at the selection.
    pub fn on_paste(&mut self, text: &str) -> Result<InputResult, EditError> {
        self.run(Cmd::InsertText(text.to_string()))
    }

    /// The whole document as the serializable blob.
    pub fn to_raw(&self) -> RawDocument {
        io::document_to_raw(&self.document)
    }

    /// Explicit save: skips the write entirely when the document is blank.
    pub fn save_to(&self, store: &Store) -> Result<SaveOutcome, StoreError> {
        if self.document.is_blank() {
            return Ok(SaveOutcome::NothingToSave);
        }
        store.save(&self.to_raw())?;
        Ok(SaveOutcome::Saved)
    }

    fn run(&mut self, cmd: Cmd) -> Result<InputResult, EditError> {
        match commands::apply(&self.document, &self.selection, &cmd)? {
            Outcome::Applied(edit) => {
                self.commit(edit);
                Ok(InputResult::Handled)
            }
            Outcome::NotHandled => Ok(InputResult::NotHandled),
        }
    }

    /// Replace the live state with an engine result, recording what it
    /// replaced.
    fn commit(&mut self, edit: Edit) {
        let prior_document = std::mem::replace(&mut self.document, edit.document);
        let prior_selection = std::mem::replace(&mut self.selection, edit.selection);
        self.history.record(HistoryEntry {
            document: prior_document,
            selection: prior_selection,
            label: edit.label,
        });
        self.last_label = Some(edit.label);
        self.version += 1;
    }

    fn toggle_style_command(&mut self, style: InlineStyle) -> Result<InputResult, EditError> {
        if self.selection.is_collapsed() {
            // No document change for a caret; flip the override instead.
            self.toggle_caret_style(style);
            self.history.break_burst();
            return Ok(InputResult::Handled);
        }
        self.run(Cmd::ToggleStyle(style))
    }

    fn toggle_caret_style(&mut self, style: InlineStyle) {
        if !self.caret_styles.remove(&style) {
            self.caret_styles.insert(style);
        }
    }

    fn current_entry(&self) -> HistoryEntry {
        HistoryEntry {
            document: self.document.clone(),
            selection: self.selection,
            label: self.last_label.unwrap_or(ChangeLabel::InsertCharacters),
        }
    }

    fn undo(&mut self) -> InputResult {
        if !self.history.can_undo() {
            return InputResult::NotHandled;
        }
        let current = self.current_entry();
        if let Some(entry) = self.history.undo(current) {
            self.restore(entry);
            InputResult::Handled
        } else {
            InputResult::NotHandled
        }
    }

    fn redo(&mut self) -> InputResult {
        if !self.history.can_redo() {
            return InputResult::NotHandled;
        }
        let current = self.current_entry();
        if let Some(entry) = self.history.redo(current) {
            self.restore(entry);
            InputResult::Handled
        } else {
            InputResult::NotHandled
        }
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.document = entry.document;
        self.selection = entry.selection;
        self.last_label = Some(entry.label);
        self.caret_styles.clear();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::BlockKind;
    use crate::tests::type_str;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_characters_are_inserted() {
        let mut session = Session::new();
        type_str(&mut session, "hi");
        assert_eq!(session.document().blocks()[0].text(), "hi");
        assert_eq!(session.selection().focus_offset, 2);
        assert_eq!(session.version(), 2);
    }

    #[test]
    fn test_autoformat_consumes_marker_and_space() {
        let mut session = Session::new();
        type_str(&mut session, "# ");
        let block = &session.document().blocks()[0];
        assert_eq!(block.kind, BlockKind::Header);
        assert_eq!(block.text(), "");
    }

    #[test]
    fn test_caret_style_override_styles_typed_text() {
        let mut session = Session::new();
        // "* " toggles bold at the caret; the next characters come out bold.
        type_str(&mut session, "* ab");
        let block = &session.document().blocks()[0];
        assert_eq!(block.text(), "ab");
        assert_eq!(block.style_ranges().len(), 1);
        assert_eq!(block.style_ranges()[0].style, InlineStyle::Bold);
        assert_eq!(block.style_ranges()[0].start, 0);
        assert_eq!(block.style_ranges()[0].end, 2);
    }

    #[test]
    fn test_double_asterisk_is_red_not_bold() {
        let mut session = Session::new();
        type_str(&mut session, "** x");
        let block = &session.document().blocks()[0];
        assert_eq!(block.text(), "x");
        assert_eq!(block.style_ranges()[0].style, InlineStyle::ColorRed);
    }

    #[test]
    fn test_set_selection_resets_caret_styles() {
        let mut session = Session::new();
        type_str(&mut session, "* ");
        assert!(!session.caret_styles().is_empty());
        let id = session.document().blocks()[0].id;
        session.set_selection(Selection::caret(id, 0)).unwrap();
        assert!(session.caret_styles().is_empty());
    }

    #[test]
    fn test_style_command_on_caret_flips_override() {
        let mut session = Session::new();
        assert_eq!(
            session.on_key_command("bold").unwrap(),
            InputResult::Handled
        );
        assert!(session.caret_styles().contains(&InlineStyle::Bold));
        session.on_key_command("bold").unwrap();
        assert!(session.caret_styles().is_empty());
    }

    #[test]
    fn test_unknown_command_is_not_handled() {
        let mut session = Session::new();
        assert_eq!(
            session.on_key_command("sparkle").unwrap(),
            InputResult::NotHandled
        );
    }

    #[test]
    fn test_undo_on_empty_history_is_not_handled() {
        let mut session = Session::new();
        assert_eq!(
            session.on_key_command("undo").unwrap(),
            InputResult::NotHandled
        );
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn test_undo_restores_exact_prior_state() {
        let mut session = Session::new();
        type_str(&mut session, "abc");
        let before = (session.document().clone(), session.selection());

        session.on_key_command("split-block").unwrap();
        assert_eq!(session.document().blocks().len(), 2);

        session.on_key_command("undo").unwrap();
        assert_eq!((session.document().clone(), session.selection()), before);

        session.on_key_command("redo").unwrap();
        assert_eq!(session.document().blocks().len(), 2);
    }

    #[test]
    fn test_insert_burst_is_one_undo_step() {
        let mut session = Session::new();
        type_str(&mut session, "hello");
        session.on_key_command("undo").unwrap();
        assert_eq!(session.document().blocks()[0].text(), "");
    }

    #[test]
    fn test_header_scenario_undoes_in_two_steps() {
        // Typing "# " then "Title": the trigger and the insertion burst
        // are separate history steps.
        let mut session = Session::new();
        type_str(&mut session, "# Title");
        let block = &session.document().blocks()[0];
        assert_eq!(block.kind, BlockKind::Header);
        assert_eq!(block.text(), "Title");

        session.on_key_command("undo").unwrap();
        let block = &session.document().blocks()[0];
        assert_eq!(block.kind, BlockKind::Header);
        assert_eq!(block.text(), "");

        session.on_key_command("undo").unwrap();
        let block = &session.document().blocks()[0];
        assert_eq!(block.kind, BlockKind::Paragraph);
        assert_eq!(block.text(), "#");
    }

    #[test]
    fn test_paste_inserts_blocks() {
        let mut session = Session::new();
        session.on_paste("one\ntwo").unwrap();
        let texts: Vec<&str> = session
            .document()
            .blocks()
            .iter()
            .map(|b| b.text())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_backspace_at_document_start_is_not_handled() {
        let mut session = Session::new();
        assert_eq!(
            session.on_key_command("backspace").unwrap(),
            InputResult::NotHandled
        );
    }
}
