/*!
 * # Editing Core Module
 *
 * This module implements the editing core of blockpad: a block-structured
 * rich-text model with selection-aware mutations, undo/redo history and
 * an autoformat engine that rewrites typed marker prefixes into formatting.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the block list
 * - The document is an ordered, non-empty list of **blocks** (paragraphs
 *   and headers), each holding text plus inline **style ranges**
 * - Every mutation primitive is pure: it takes `&Document` and returns a
 *   new `Document`, the input is never altered
 * - Offsets are counted in Unicode scalar values, so style ranges and the
 *   selection never land inside a multi-byte character
 *
 * ### 2. Command-Based Editing
 * - High-level intents (typed character, backspace, paste, style/block
 *   toggles) are represented as a `Cmd` enum
 * - `commands::apply` translates a `Cmd` into a coordinated
 *   `(Document, Selection)` update tagged with a `ChangeLabel`
 * - A command that has nothing to do reports `Outcome::NotHandled` so the
 *   caller can fall through to default behavior
 *
 * ### 3. Autoformat on Input
 * - `autoformat::scan` inspects the caret block *before* a character is
 *   committed; when a whole-block trigger (`***`, `**`, `*`, `#`) is
 *   followed by a space, the marker text is consumed and replaced by a
 *   formatting action
 *
 * ### 4. Snapshot-Based History
 * - `HistoryStack` keeps past/future snapshots of `(Document, Selection)`
 *   labeled with the change that replaced them; consecutive plain
 *   character insertions coalesce into one undo step
 *
 * ### 5. Read API: Immutable Snapshots
 * - The core exposes `Snapshot`s describing how to render without handing
 *   out mutable document access; each block is pre-split into style runs
 *   so shells never interpret style ranges themselves
 *
 * ## Module Structure
 *
 * - **`document`**: block list, style ranges and the pure mutation primitives
 * - **`selection`**: anchor/focus pair addressing blocks by stable id
 * - **`commands`**: `Cmd` enum and the mutation engine
 * - **`autoformat`**: trigger table and prefix-pattern detection
 * - **`history`**: undo/redo stack with insertion coalescing
 * - **`snapshot`**: immutable view generation for rendering shells
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockpad_engine::editing::*;
 *
 * // 1. Start from the empty document (one empty paragraph)
 * let doc = Document::new();
 * let block = doc.blocks()[0].id;
 *
 * // 2. Apply pure mutations; the original document is untouched
 * let doc = doc.insert_text(block, 0, "Hello").unwrap();
 * let doc = doc.apply_style(block, 0, 5, InlineStyle::Bold).unwrap();
 *
 * // 3. Or drive edits through the command layer
 * let caret = Selection::caret(block, 5);
 * let outcome = commands::apply(&doc, &caret, &Cmd::InsertChar('!')).unwrap();
 *
 * // 4. Project a snapshot for the rendering shell
 * if let Outcome::Applied(edit) = outcome {
 *     let snap = snapshot::create_snapshot(&edit.document, edit.selection, 1);
 *     assert_eq!(snap.blocks[0].text, "Hello!");
 * }
 * ```
 */

// Module exports
pub mod autoformat;
pub mod commands;
pub mod document;
pub mod history;
pub mod selection;
pub mod snapshot;

// Public API re-exports
pub use autoformat::AutoformatMatch;
pub use commands::{ChangeLabel, Cmd, Edit, Outcome};
pub use document::{Block, BlockId, BlockKind, Document, InlineStyle, StyleRange};
pub use history::{HistoryEntry, HistoryStack};
pub use selection::Selection;
pub use snapshot::{RenderBlock, Snapshot, StyleRun};

/// Caller contract violations raised by the mutation primitives.
///
/// Every variant means an operation addressed a block or offset that does
/// not exist in the document it was given. This is a programming fault in
/// the integration (the caller derived offsets from a stale document), so
/// it is raised rather than silently clamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("unknown block id {0}")]
    UnknownBlock(BlockId),
    #[error("offset {offset} out of bounds in block {block} ({len} chars)")]
    OffsetOutOfBounds {
        block: BlockId,
        offset: usize,
        len: usize,
    },
    #[error("range {start}..{end} is not valid in block {block} ({len} chars)")]
    InvalidRange {
        block: BlockId,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("blocks {first} and {second} are not adjacent")]
    NotAdjacent { first: BlockId, second: BlockId },
}
