//! Persistence: the saved-blob wire format and the file-backed store.
//!
//! The whole document is serialized as one JSON blob under a fixed storage
//! key, mirroring the browser-localStorage model it replaces: blocks carry
//! their kind, text and `inlineStyleRanges` (offset + length in chars).
//! Round-trips are lossless for kind, text, style ranges and ordering.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editing::document::{Block, BlockId, BlockKind, Document, InlineStyle, StyleRange};

/// Fixed storage key the blob is filed under.
pub const STORAGE_KEY: &str = "editor-content";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt saved document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt saved document: {0}")]
    Invalid(String),
}

/// Serialized style range: `offset` + `length` in chars, wire-compatible
/// with the legacy `inlineStyleRanges` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub key: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
    #[serde(rename = "inlineStyleRanges")]
    pub inline_style_ranges: Vec<RawStyleRange>,
}

/// The persisted blob: the full block sequence, nothing else.
/// Selection and history are session state and are not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub blocks: Vec<RawBlock>,
}

pub fn document_to_raw(document: &Document) -> RawDocument {
    RawDocument {
        blocks: document
            .blocks()
            .iter()
            .map(|block| RawBlock {
                key: block.id,
                kind: block.kind,
                text: block.text().to_string(),
                inline_style_ranges: block
                    .style_ranges()
                    .iter()
                    .map(|r| RawStyleRange {
                        offset: r.start,
                        length: r.end - r.start,
                        style: r.style,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Rebuild a document from a saved blob, validating its invariants.
///
/// A blob that references offsets past its own text, zero-length ranges or
/// duplicate block keys is corrupt; the caller decides whether to
/// propagate or fall back to an empty document.
pub fn document_from_raw(raw: &RawDocument) -> Result<Document, StoreError> {
    let mut seen = HashSet::new();
    let mut blocks = Vec::with_capacity(raw.blocks.len());
    for raw_block in &raw.blocks {
        if !seen.insert(raw_block.key) {
            return Err(StoreError::Invalid(format!(
                "duplicate block key {}",
                raw_block.key
            )));
        }
        let len = raw_block.text.chars().count();
        let mut ranges = Vec::with_capacity(raw_block.inline_style_ranges.len());
        for r in &raw_block.inline_style_ranges {
            // offset and length come straight from disk; their sum can overflow
            let end = match r.offset.checked_add(r.length) {
                Some(end) if r.length > 0 && end <= len => end,
                _ => {
                    return Err(StoreError::Invalid(format!(
                        "style range {}+{} out of bounds in block {} ({len} chars)",
                        r.offset, r.length, raw_block.key
                    )));
                }
            };
            ranges.push(StyleRange {
                start: r.offset,
                end,
                style: r.style,
            });
        }
        blocks.push(Block::from_parts(
            raw_block.key,
            raw_block.kind,
            raw_block.text.clone(),
            ranges,
        ));
    }
    Ok(Document::from_blocks(blocks))
}

/// File-backed blob store: one JSON document per storage key inside a
/// data directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob for the fixed storage key.
    pub fn blob_path(&self) -> PathBuf {
        self.dir.join(format!("{STORAGE_KEY}.json"))
    }

    /// Write the blob, creating the data directory if needed.
    pub fn save(&self, raw: &RawDocument) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(raw)?;
        fs::write(self.blob_path(), json)?;
        Ok(())
    }

    /// Read the blob; `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<RawDocument>, StoreError> {
        let content = match fs::read_to_string(self.blob_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}
