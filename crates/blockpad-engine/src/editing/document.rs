use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::EditError;

/// Stable identifier for a block.
///
/// Ids survive every edit and round-trip through persistence, so rendering
/// shells can key UI elements by them across re-renders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Structural kind of a block.
///
/// Serialized with the legacy wire names (`unstyled` / `header-one`) so
/// saved blobs stay compatible across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "unstyled")]
    Paragraph,
    #[serde(rename = "header-one")]
    Header,
}

/// Abstract inline style tag.
///
/// The core never assigns visual meaning to these; the rendering shell owns
/// the style map (tag -> visual attributes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum InlineStyle {
    #[serde(rename = "BOLD")]
    Bold,
    #[serde(rename = "COLOR_RED")]
    ColorRed,
    #[serde(rename = "UNDERLINE")]
    Underline,
}

/// Half-open interval of styled text within one block.
///
/// Offsets count Unicode scalar values. Invariant: `start < end <= len` of
/// the owning block's text. Ranges of different styles may overlap; ranges
/// of the same style are kept disjoint and maximal by [`normalize_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRange {
    pub start: usize,
    pub end: usize,
    pub style: InlineStyle,
}

/// One structural unit of the document: a paragraph or header line holding
/// text and inline style ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub(crate) text: String,
    pub(crate) style_ranges: Vec<StyleRange>,
}

impl Block {
    pub(crate) fn empty(kind: BlockKind) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            text: String::new(),
            style_ranges: Vec::new(),
        }
    }

    /// Build a block from already-validated parts, normalizing style ranges.
    pub(crate) fn from_parts(
        id: BlockId,
        kind: BlockKind,
        text: String,
        style_ranges: Vec<StyleRange>,
    ) -> Self {
        Self {
            id,
            kind,
            text,
            style_ranges: normalize_ranges(style_ranges),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style_ranges(&self) -> &[StyleRange] {
        &self.style_ranges
    }

    /// Text length in Unicode scalar values (the unit of every offset).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ordered, non-empty sequence of blocks: the ground truth for content.
///
/// An empty document is represented by exactly one empty paragraph block.
/// Block ids are unique within a document. All mutation primitives are
/// pure: they return a new `Document` and never alter the input, so the
/// owner can keep cheap snapshots for history and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::empty(BlockKind::Paragraph)],
        }
    }
}

impl Document {
    /// The empty document: one empty paragraph block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from blocks, restoring the non-empty invariant.
    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::default()
        } else {
            Self { blocks }
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Position of a block in the document's structural spine.
    pub fn index_of(&self, id: BlockId) -> Result<usize, EditError> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(EditError::UnknownBlock(id))
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, EditError> {
        self.index_of(id).map(|index| &self.blocks[index])
    }

    /// Styles whose range contains `offset` (start inclusive, end exclusive).
    pub fn styles_at(&self, id: BlockId, offset: usize) -> Result<Vec<InlineStyle>, EditError> {
        let block = self.block(id)?;
        let len = block.char_len();
        if offset > len {
            return Err(EditError::OffsetOutOfBounds {
                block: id,
                offset,
                len,
            });
        }
        let mut styles: Vec<InlineStyle> = block
            .style_ranges
            .iter()
            .filter(|r| r.start <= offset && offset < r.end)
            .map(|r| r.style)
            .collect();
        styles.sort_unstable();
        styles.dedup();
        Ok(styles)
    }

    /// True when every block is blank after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|b| b.text.trim().is_empty())
    }

    /// Insert `text` at a char offset within a block.
    ///
    /// Style bookkeeping: ranges ending at or before the insertion point
    /// are unaffected, ranges starting at or after it shift right, and a
    /// range grows only when the insertion lands strictly inside it —
    /// boundary insertions do not inherit the adjacent style.
    pub fn insert_text(
        &self,
        id: BlockId,
        offset: usize,
        text: &str,
    ) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        let len = self.blocks[index].char_len();
        if offset > len {
            return Err(EditError::OffsetOutOfBounds {
                block: id,
                offset,
                len,
            });
        }

        let inserted = text.chars().count();
        let mut doc = self.clone();
        let target = &mut doc.blocks[index];
        let at = byte_offset(&target.text, offset);
        target.text.insert_str(at, text);
        for range in &mut target.style_ranges {
            if range.start >= offset {
                range.start += inserted;
                range.end += inserted;
            } else if range.end > offset {
                range.end += inserted;
            }
        }
        Ok(doc)
    }

    /// Delete the char range `start..end` within a block.
    ///
    /// Ranges straddling the deletion are truncated to the surviving text
    /// and dropped when nothing survives.
    pub fn delete_range(
        &self,
        id: BlockId,
        start: usize,
        end: usize,
    ) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        let len = self.blocks[index].char_len();
        if start > end || end > len {
            return Err(EditError::InvalidRange {
                block: id,
                start,
                end,
                len,
            });
        }
        if start == end {
            return Ok(self.clone());
        }

        let removed = end - start;
        let remap = |offset: usize| {
            if offset <= start {
                offset
            } else if offset >= end {
                offset - removed
            } else {
                start
            }
        };

        let mut doc = self.clone();
        let target = &mut doc.blocks[index];
        let from = byte_offset(&target.text, start);
        let to = byte_offset(&target.text, end);
        target.text.replace_range(from..to, "");
        let remapped: Vec<StyleRange> = target
            .style_ranges
            .iter()
            .map(|r| StyleRange {
                start: remap(r.start),
                end: remap(r.end),
                style: r.style,
            })
            .collect();
        target.style_ranges = normalize_ranges(remapped);
        Ok(doc)
    }

    pub fn set_block_kind(&self, id: BlockId, kind: BlockKind) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        let mut doc = self.clone();
        doc.blocks[index].kind = kind;
        Ok(doc)
    }

    /// Toggle `style` over `start..end`: when the style already fully
    /// covers the range it is removed from it, otherwise it is extended to
    /// cover the whole range. An empty range is a no-op.
    pub fn apply_style(
        &self,
        id: BlockId,
        start: usize,
        end: usize,
        style: InlineStyle,
    ) -> Result<Document, EditError> {
        if self.style_covers(id, start, end, style)? {
            self.remove_style(id, start, end, style)
        } else {
            self.add_style(id, start, end, style)
        }
    }

    /// True when `style` is active over every char of `start..end`.
    pub fn style_covers(
        &self,
        id: BlockId,
        start: usize,
        end: usize,
        style: InlineStyle,
    ) -> Result<bool, EditError> {
        let block = self.block(id)?;
        self.check_range(block, start, end)?;
        // Same-style ranges are kept disjoint and maximal, so coverage
        // means a single range contains the whole interval.
        Ok(start < end
            && block
                .style_ranges
                .iter()
                .any(|r| r.style == style && r.start <= start && end <= r.end))
    }

    /// Unconditionally style `start..end` (no toggle).
    pub(crate) fn add_style(
        &self,
        id: BlockId,
        start: usize,
        end: usize,
        style: InlineStyle,
    ) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        self.check_range(&self.blocks[index], start, end)?;
        if start == end {
            return Ok(self.clone());
        }
        let mut doc = self.clone();
        let target = &mut doc.blocks[index];
        let mut ranges = target.style_ranges.clone();
        ranges.push(StyleRange { start, end, style });
        target.style_ranges = normalize_ranges(ranges);
        Ok(doc)
    }

    /// Unconditionally unstyle `start..end`, splitting covering ranges.
    pub(crate) fn remove_style(
        &self,
        id: BlockId,
        start: usize,
        end: usize,
        style: InlineStyle,
    ) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        self.check_range(&self.blocks[index], start, end)?;
        if start == end {
            return Ok(self.clone());
        }
        let mut doc = self.clone();
        let target = &mut doc.blocks[index];
        let mut kept = Vec::with_capacity(target.style_ranges.len() + 1);
        for r in &target.style_ranges {
            if r.style != style || r.end <= start || r.start >= end {
                kept.push(*r);
                continue;
            }
            if r.start < start {
                kept.push(StyleRange {
                    start: r.start,
                    end: start,
                    style: r.style,
                });
            }
            if r.end > end {
                kept.push(StyleRange {
                    start: end,
                    end: r.end,
                    style: r.style,
                });
            }
        }
        target.style_ranges = normalize_ranges(kept);
        Ok(doc)
    }

    /// Split a block at a char offset; the tail becomes a new block of the
    /// same kind directly after it. Straddling style ranges are split.
    pub fn split_block(&self, id: BlockId, offset: usize) -> Result<Document, EditError> {
        let index = self.index_of(id)?;
        let block = &self.blocks[index];
        let len = block.char_len();
        if offset > len {
            return Err(EditError::OffsetOutOfBounds {
                block: id,
                offset,
                len,
            });
        }

        let at = byte_offset(&block.text, offset);
        let (head_text, tail_text) = block.text.split_at(at);
        let mut head_ranges = Vec::new();
        let mut tail_ranges = Vec::new();
        for r in &block.style_ranges {
            if r.end <= offset {
                head_ranges.push(*r);
            } else if r.start >= offset {
                tail_ranges.push(StyleRange {
                    start: r.start - offset,
                    end: r.end - offset,
                    style: r.style,
                });
            } else {
                head_ranges.push(StyleRange {
                    start: r.start,
                    end: offset,
                    style: r.style,
                });
                tail_ranges.push(StyleRange {
                    start: 0,
                    end: r.end - offset,
                    style: r.style,
                });
            }
        }

        let tail = Block::from_parts(BlockId::new(), block.kind, tail_text.to_string(), tail_ranges);
        let head_text = head_text.to_string();
        let mut doc = self.clone();
        doc.blocks[index].text = head_text;
        doc.blocks[index].style_ranges = normalize_ranges(head_ranges);
        doc.blocks.insert(index + 1, tail);
        Ok(doc)
    }

    /// Merge `second` into `first`; they must be adjacent in that order.
    /// The merged block keeps `first`'s kind; `second`'s style ranges
    /// shift past `first`'s text.
    pub fn merge_blocks(&self, first: BlockId, second: BlockId) -> Result<Document, EditError> {
        let first_index = self.index_of(first)?;
        let second_index = self.index_of(second)?;
        if second_index != first_index + 1 {
            return Err(EditError::NotAdjacent { first, second });
        }

        let shift = self.blocks[first_index].char_len();
        let mut doc = self.clone();
        let absorbed = doc.blocks.remove(second_index);
        let target = &mut doc.blocks[first_index];
        target.text.push_str(&absorbed.text);
        let mut ranges = target.style_ranges.clone();
        ranges.extend(absorbed.style_ranges.iter().map(|r| StyleRange {
            start: r.start + shift,
            end: r.end + shift,
            style: r.style,
        }));
        target.style_ranges = normalize_ranges(ranges);
        Ok(doc)
    }

    fn check_range(&self, block: &Block, start: usize, end: usize) -> Result<(), EditError> {
        let len = block.char_len();
        if start > end || end > len {
            return Err(EditError::InvalidRange {
                block: block.id,
                start,
                end,
                len,
            });
        }
        Ok(())
    }
}

/// Byte position of a char offset, saturating at the end of the text.
fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(at, _)| at)
        .unwrap_or(text.len())
}

/// Canonicalize style ranges: drop empty ranges, merge overlapping or
/// abutting ranges of the same style, order by (start, end, style).
/// Keeps each `(start, end, style)` triple unique per block.
fn normalize_ranges(mut ranges: Vec<StyleRange>) -> Vec<StyleRange> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_unstable_by_key(|r| (r.style, r.start, r.end));
    let mut merged: Vec<StyleRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if last.style == r.style && r.start <= last.end => {
                last.end = last.end.max(r.end);
            }
            _ => merged.push(r),
        }
    }
    merged.sort_unstable_by_key(|r| (r.start, r.end, r.style));
    merged
}
