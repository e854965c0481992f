use crate::editing::{document::Document, BlockId, EditError};

/// Anchor/focus pair describing the caret or a highlighted range.
///
/// A collapsed selection (anchor == focus) is the caret. Anchor-vs-focus
/// ordering encodes direction for shift-select in a shell; the mutation
/// engine only cares about the document-order span, obtained via
/// [`Selection::ordered`]. Offsets count Unicode scalar values and must be
/// within the addressed block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor_block: BlockId,
    pub anchor_offset: usize,
    pub focus_block: BlockId,
    pub focus_offset: usize,
}

impl Selection {
    /// Collapsed selection at `(block, offset)`.
    pub fn caret(block: BlockId, offset: usize) -> Self {
        Self {
            anchor_block: block,
            anchor_offset: offset,
            focus_block: block,
            focus_offset: offset,
        }
    }

    /// Range selection from anchor to focus.
    pub fn range(
        anchor_block: BlockId,
        anchor_offset: usize,
        focus_block: BlockId,
        focus_offset: usize,
    ) -> Self {
        Self {
            anchor_block,
            anchor_offset,
            focus_block,
            focus_offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_block == self.focus_block && self.anchor_offset == self.focus_offset
    }

    /// Move both ends to `(block, offset)`.
    pub fn collapse_to(&mut self, block: BlockId, offset: usize) {
        *self = Self::caret(block, offset);
    }

    /// Move the focus end only, keeping the anchor (shift-select).
    pub fn extend_to(&mut self, block: BlockId, offset: usize) {
        self.focus_block = block;
        self.focus_offset = offset;
    }

    /// Check both ends against the current document.
    pub fn validate(&self, doc: &Document) -> Result<(), EditError> {
        for (block, offset) in [
            (self.anchor_block, self.anchor_offset),
            (self.focus_block, self.focus_offset),
        ] {
            let len = doc.block(block)?.char_len();
            if offset > len {
                return Err(EditError::OffsetOutOfBounds { block, offset, len });
            }
        }
        Ok(())
    }

    /// The selection's span in document order, as
    /// `((start_block_index, start_offset), (end_block_index, end_offset))`.
    pub(crate) fn ordered(
        &self,
        doc: &Document,
    ) -> Result<((usize, usize), (usize, usize)), EditError> {
        self.validate(doc)?;
        let anchor = (doc.index_of(self.anchor_block)?, self.anchor_offset);
        let focus = (doc.index_of(self.focus_block)?, self.focus_offset);
        if anchor <= focus {
            Ok((anchor, focus))
        } else {
            Ok((focus, anchor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_is_collapsed() {
        let block = BlockId::new();
        let sel = Selection::caret(block, 3);
        assert!(sel.is_collapsed());

        let mut extended = sel;
        extended.extend_to(block, 5);
        assert!(!extended.is_collapsed());

        extended.collapse_to(block, 5);
        assert!(extended.is_collapsed());
    }

    #[test]
    fn test_ordered_swaps_backwards_selection() {
        let doc = Document::new();
        let id = doc.blocks()[0].id;
        let doc = doc.insert_text(id, 0, "hello").unwrap();

        // Focus before anchor (a leftwards shift-select).
        let sel = Selection::range(id, 4, id, 1);
        let ((si, so), (ei, eo)) = sel.ordered(&doc).unwrap();
        assert_eq!((si, so), (0, 1));
        assert_eq!((ei, eo), (0, 4));
    }

    #[test]
    fn test_validate_rejects_dangling_selection() {
        let doc = Document::new();
        let stray = BlockId::new();
        let sel = Selection::caret(stray, 0);
        assert_eq!(sel.validate(&doc), Err(EditError::UnknownBlock(stray)));

        let id = doc.blocks()[0].id;
        let past_end = Selection::caret(id, 1);
        assert!(past_end.validate(&doc).is_err());
    }
}
