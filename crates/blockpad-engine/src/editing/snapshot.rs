//! Immutable render snapshots.
//!
//! The snapshot is the core's read API: a shell renders from it and never
//! touches the document directly. Each block's text is pre-split into
//! style runs at every style-range boundary, so the shell maps abstract
//! style tags to visual attributes without interpreting ranges itself.

use std::ops::Range;

use crate::editing::{
    document::{Block, BlockId, BlockKind, Document, InlineStyle},
    selection::Selection,
};

/// Maximal span of text over which the same set of styles is active.
/// Offsets count Unicode scalar values within the owning block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub styles: Vec<InlineStyle>,
}

/// One block prepared for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBlock {
    /// Stable identifier that persists across edits.
    pub id: BlockId,
    pub kind: BlockKind,
    pub text: String,
    /// Partition of `text` into style runs; empty for an empty block.
    pub runs: Vec<StyleRun>,
}

impl RenderBlock {
    /// The text slice a run covers.
    pub fn run_text(&self, run: &StyleRun) -> String {
        self.text
            .chars()
            .skip(run.range.start)
            .take(run.range.end - run.range.start)
            .collect()
    }
}

/// Immutable view of the document plus the selection, with a version
/// counter so shells can detect changes cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub blocks: Vec<RenderBlock>,
    pub selection: Selection,
}

pub fn create_snapshot(document: &Document, selection: Selection, version: u64) -> Snapshot {
    Snapshot {
        version,
        blocks: document.blocks().iter().map(render_block).collect(),
        selection,
    }
}

fn render_block(block: &Block) -> RenderBlock {
    let len = block.char_len();
    let mut cuts: Vec<usize> = Vec::with_capacity(block.style_ranges().len() * 2 + 2);
    cuts.push(0);
    cuts.push(len);
    for range in block.style_ranges() {
        cuts.push(range.start);
        cuts.push(range.end);
    }
    cuts.sort_unstable();
    cuts.dedup();

    let runs = cuts
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let mut styles: Vec<InlineStyle> = block
                .style_ranges()
                .iter()
                .filter(|r| r.start <= start && end <= r.end)
                .map(|r| r.style)
                .collect();
            styles.sort_unstable();
            styles.dedup();
            StyleRun {
                range: start..end,
                styles,
            }
        })
        .collect();

    RenderBlock {
        id: block.id,
        kind: block.kind,
        text: block.text().to_string(),
        runs,
    }
}
