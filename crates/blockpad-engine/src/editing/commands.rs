use std::fmt;

use crate::editing::{
    document::{BlockKind, Document, InlineStyle},
    selection::Selection,
    EditError,
};

/// High-level editing intents, compiled by [`apply`] into a coordinated
/// `(Document, Selection)` update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Type one character at the caret (a range selection is replaced).
    InsertChar(char),
    /// Paste plain text; newlines split blocks.
    InsertText(String),
    /// Backspace: one char before the caret, a block merge at offset 0,
    /// or collapsing a range selection to its start.
    DeleteBackward,
    /// Enter: split the caret block in two.
    SplitBlock,
    /// Toggle an inline style over the selected range.
    ToggleStyle(InlineStyle),
    /// Toggle the block kind of every block touched by the selection.
    ToggleBlockKind(BlockKind),
}

/// Change tag attached to every committed edit. Drives history coalescing
/// and identifies which autoformat trigger produced an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeLabel {
    InsertCharacters,
    DeleteCharacter,
    Paste,
    SplitBlock,
    ChangeInlineStyle,
    ChangeBlockType,
    RemoveHashtag,
    RemoveAsterisk,
    RemoveDoubleAsterisk,
    RemoveTripleAsterisk,
}

impl ChangeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLabel::InsertCharacters => "insert-characters",
            ChangeLabel::DeleteCharacter => "delete-character",
            ChangeLabel::Paste => "paste",
            ChangeLabel::SplitBlock => "split-block",
            ChangeLabel::ChangeInlineStyle => "change-inline-style",
            ChangeLabel::ChangeBlockType => "change-block-type",
            ChangeLabel::RemoveHashtag => "remove-hashtag",
            ChangeLabel::RemoveAsterisk => "remove-asterisk",
            ChangeLabel::RemoveDoubleAsterisk => "remove-double-asterisk",
            ChangeLabel::RemoveTripleAsterisk => "remove-triple-asterisk",
        }
    }
}

impl fmt::Display for ChangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed mutation: the new document/selection pair plus its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub document: Document,
    pub selection: Selection,
    pub label: ChangeLabel,
}

/// Result of compiling a command. `NotHandled` is the designed no-op
/// signal, not an error: the caller falls through to default behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(Edit),
    NotHandled,
}

/// Translate an editing intent into a pure `(Document, Selection)` update.
///
/// The inputs are never altered; the caller commits the returned [`Edit`]
/// (and pushes it into history) or drops it. Offsets and block ids must be
/// derived from the `(doc, sel)` pair passed in, otherwise this fails with
/// an [`EditError`].
pub fn apply(doc: &Document, sel: &Selection, cmd: &Cmd) -> Result<Outcome, EditError> {
    sel.validate(doc)?;
    match cmd {
        Cmd::InsertChar(ch) => {
            let mut buf = [0u8; 4];
            insert_plain(doc, sel, ch.encode_utf8(&mut buf), ChangeLabel::InsertCharacters)
        }
        Cmd::InsertText(text) => paste(doc, sel, text),
        Cmd::DeleteBackward => delete_backward(doc, sel),
        Cmd::SplitBlock => split_block(doc, sel),
        Cmd::ToggleStyle(style) => toggle_style(doc, sel, *style),
        Cmd::ToggleBlockKind(kind) => toggle_block_kind(doc, sel, *kind),
    }
}

/// Replace a range selection with nothing, collapsing the caret to its
/// start. Cross-block ranges drop the blocks in between and merge the two
/// edge blocks.
fn delete_selection(doc: &Document, sel: &Selection) -> Result<(Document, Selection), EditError> {
    let ((start_index, start_offset), (end_index, end_offset)) = sel.ordered(doc)?;
    let start_id = doc.blocks()[start_index].id;

    if start_index == end_index {
        let new_doc = doc.delete_range(start_id, start_offset, end_offset)?;
        return Ok((new_doc, Selection::caret(start_id, start_offset)));
    }

    let end_id = doc.blocks()[end_index].id;
    let start_len = doc.blocks()[start_index].char_len();
    let mut new_doc = doc.delete_range(start_id, start_offset, start_len)?;
    new_doc = new_doc.delete_range(end_id, 0, end_offset)?;

    // Swallow the blocks strictly between the two ends, then the end block.
    while new_doc.index_of(end_id)? > new_doc.index_of(start_id)? + 1 {
        let mid_index = new_doc.index_of(start_id)? + 1;
        let mid_id = new_doc.blocks()[mid_index].id;
        let mid_len = new_doc.blocks()[mid_index].char_len();
        new_doc = new_doc.delete_range(mid_id, 0, mid_len)?;
        new_doc = new_doc.merge_blocks(start_id, mid_id)?;
    }
    new_doc = new_doc.merge_blocks(start_id, end_id)?;

    Ok((new_doc, Selection::caret(start_id, start_offset)))
}

/// Collapse a range selection by deleting it; a caret passes through.
fn collapse_selection(doc: &Document, sel: &Selection) -> Result<(Document, Selection), EditError> {
    if sel.is_collapsed() {
        Ok((doc.clone(), *sel))
    } else {
        delete_selection(doc, sel)
    }
}

fn insert_plain(
    doc: &Document,
    sel: &Selection,
    text: &str,
    label: ChangeLabel,
) -> Result<Outcome, EditError> {
    let (doc, caret) = collapse_selection(doc, sel)?;
    let new_doc = doc.insert_text(caret.focus_block, caret.focus_offset, text)?;
    let inserted = text.chars().count();
    let selection = Selection::caret(caret.focus_block, caret.focus_offset + inserted);
    Ok(Outcome::Applied(Edit {
        document: new_doc,
        selection,
        label,
    }))
}

fn paste(doc: &Document, sel: &Selection, text: &str) -> Result<Outcome, EditError> {
    let text = text.replace("\r\n", "\n");
    let (mut doc, caret) = collapse_selection(doc, sel)?;
    let mut block = caret.focus_block;
    let mut offset = caret.focus_offset;

    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            doc = doc.split_block(block, offset)?;
            let next_index = doc.index_of(block)? + 1;
            block = doc.blocks()[next_index].id;
            offset = 0;
        }
        if !segment.is_empty() {
            doc = doc.insert_text(block, offset, segment)?;
            offset += segment.chars().count();
        }
    }

    Ok(Outcome::Applied(Edit {
        document: doc,
        selection: Selection::caret(block, offset),
        label: ChangeLabel::Paste,
    }))
}

fn delete_backward(doc: &Document, sel: &Selection) -> Result<Outcome, EditError> {
    if !sel.is_collapsed() {
        let (document, selection) = delete_selection(doc, sel)?;
        return Ok(Outcome::Applied(Edit {
            document,
            selection,
            label: ChangeLabel::DeleteCharacter,
        }));
    }

    let block = sel.focus_block;
    let offset = sel.focus_offset;
    if offset > 0 {
        let document = doc.delete_range(block, offset - 1, offset)?;
        return Ok(Outcome::Applied(Edit {
            document,
            selection: Selection::caret(block, offset - 1),
            label: ChangeLabel::DeleteCharacter,
        }));
    }

    let index = doc.index_of(block)?;
    if index == 0 {
        // Caret at the very start of the document: nothing to delete.
        return Ok(Outcome::NotHandled);
    }
    let previous = doc.blocks()[index - 1].id;
    let previous_len = doc.blocks()[index - 1].char_len();
    let document = doc.merge_blocks(previous, block)?;
    Ok(Outcome::Applied(Edit {
        document,
        selection: Selection::caret(previous, previous_len),
        label: ChangeLabel::DeleteCharacter,
    }))
}

fn split_block(doc: &Document, sel: &Selection) -> Result<Outcome, EditError> {
    let (doc, caret) = collapse_selection(doc, sel)?;
    let document = doc.split_block(caret.focus_block, caret.focus_offset)?;
    let next_index = document.index_of(caret.focus_block)? + 1;
    let selection = Selection::caret(document.blocks()[next_index].id, 0);
    Ok(Outcome::Applied(Edit {
        document,
        selection,
        label: ChangeLabel::SplitBlock,
    }))
}

/// Per-block sub-ranges of the selection, skipping empty spans.
fn touched_spans(
    doc: &Document,
    sel: &Selection,
) -> Result<Vec<(crate::editing::BlockId, usize, usize)>, EditError> {
    let ((start_index, start_offset), (end_index, end_offset)) = sel.ordered(doc)?;
    let mut spans = Vec::new();
    for index in start_index..=end_index {
        let block = &doc.blocks()[index];
        let from = if index == start_index { start_offset } else { 0 };
        let to = if index == end_index {
            end_offset
        } else {
            block.char_len()
        };
        if from < to {
            spans.push((block.id, from, to));
        }
    }
    Ok(spans)
}

fn toggle_style(doc: &Document, sel: &Selection, style: InlineStyle) -> Result<Outcome, EditError> {
    if sel.is_collapsed() {
        // Style toggles only apply to a non-empty range; a caret-level
        // override is the session's concern.
        return Ok(Outcome::NotHandled);
    }
    let spans = touched_spans(doc, sel)?;
    if spans.is_empty() {
        return Ok(Outcome::NotHandled);
    }

    // Uniform toggle across the whole selection: remove only when every
    // touched span is already fully covered, otherwise style everything.
    let mut covered = true;
    for (id, from, to) in &spans {
        if !doc.style_covers(*id, *from, *to, style)? {
            covered = false;
            break;
        }
    }

    let mut document = doc.clone();
    for (id, from, to) in &spans {
        document = if covered {
            document.remove_style(*id, *from, *to, style)?
        } else {
            document.add_style(*id, *from, *to, style)?
        };
    }
    Ok(Outcome::Applied(Edit {
        document,
        selection: *sel,
        label: ChangeLabel::ChangeInlineStyle,
    }))
}

fn toggle_block_kind(
    doc: &Document,
    sel: &Selection,
    kind: BlockKind,
) -> Result<Outcome, EditError> {
    let ((start_index, _), (end_index, _)) = sel.ordered(doc)?;
    let all_already = doc.blocks()[start_index..=end_index]
        .iter()
        .all(|b| b.kind == kind);
    let target = if all_already {
        BlockKind::Paragraph
    } else {
        kind
    };

    let mut document = doc.clone();
    for index in start_index..=end_index {
        let id = document.blocks()[index].id;
        document = document.set_block_kind(id, target)?;
    }
    Ok(Outcome::Applied(Edit {
        document,
        selection: *sel,
        label: ChangeLabel::ChangeBlockType,
    }))
}
