//! Digest rendering.
//!
//! One item renders as:
//!
//! ```text
//! Got a pain cover?
//!   [Simple] Perfect, ⛓ +20
//!   [Hard] FullChain
//!
//! ```
//!
//! Batches concatenate item renderings. The chunked variant packs whole items
//! greedily under a length limit for transports that cap message size; an item
//! is never split, so a single oversized item becomes its own (oversized) chunk.

use std::fmt;

use gcs_schemas::Tier;
use serde::{Deserialize, Serialize};

use crate::diff::{Note, TierChange};

/// Per-record digest entry. Only records with at least one change are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestItem {
    pub title: String,
    pub changes: Vec<TierChange>,
}

impl DigestItem {
    pub fn new(title: impl Into<String>, changes: Vec<TierChange>) -> Self {
        Self {
            title: title.into(),
            changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn render(&self) -> String {
        format_item(&self.title, &self.changes)
    }
}

/// Shown in place of a blank title.
pub const UNTITLED: &str = "(untitled)";

/// Title as it appears in rendered text: one line, no surrounding whitespace
/// (so it can never read as an indented tier line), never blank.
pub fn display_title(title: &str) -> String {
    let line = title.replace(['\r', '\n'], " ");
    match line.trim() {
        "" => UNTITLED.to_string(),
        t => t.to_string(),
    }
}

/// Render one record: title line, one line per tier change, trailing blank line.
/// The title goes through [`display_title`].
pub fn format_item(title: &str, changes: &[TierChange]) -> String {
    let mut out = display_title(title);
    out.push('\n');
    for c in changes {
        out.push_str(&format!("  [{}] {}\n", c.label(), c.joined_notes()));
    }
    out.push('\n');
    out
}

/// Render every non-empty item into one text, trailing whitespace trimmed.
pub fn format_batch(items: &[DigestItem]) -> String {
    let text: String = items
        .iter()
        .filter(|i| !i.is_empty())
        .map(DigestItem::render)
        .collect();
    text.trim_end().to_string()
}

/// Pack non-empty item renderings into chunks of at most `max_chunk_len`
/// characters (Unicode scalar values), flushing whenever the next item would
/// overflow the current chunk. Chunks are emitted with trailing whitespace trimmed.
pub fn format_chunks(items: &[DigestItem], max_chunk_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;

    for rendered in items.iter().filter(|i| !i.is_empty()).map(DigestItem::render) {
        let len = rendered.chars().count();
        if !buf.is_empty() && buf_len + len > max_chunk_len {
            chunks.push(buf.trim_end().to_string());
            buf.clear();
            buf_len = 0;
        }
        buf.push_str(&rendered);
        buf_len += len;
    }

    if !buf.is_empty() {
        chunks.push(buf.trim_end().to_string());
    }
    chunks
}

/// Batch entry point: one text when `max_chunk_len` is `None`, else packed chunks.
/// An empty digest yields no texts at all.
pub fn format_digest(items: &[DigestItem], max_chunk_len: Option<usize>) -> Vec<String> {
    match max_chunk_len {
        Some(max) => format_chunks(items, max),
        None => {
            let text = format_batch(items);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Re-parse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestParseError {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for DigestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "digest line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for DigestParseError {}

/// Recover items from rendered digest text (single text or concatenated chunks).
pub fn parse_digest(text: &str) -> Result<Vec<DigestItem>, DigestParseError> {
    let mut items: Vec<DigestItem> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let Some(body) = line.strip_prefix("  [") else {
            items.push(DigestItem::new(line, Vec::new()));
            continue;
        };

        let err = |reason: String| DigestParseError {
            line: line_no,
            reason,
        };
        let (label, notes) = body
            .split_once("] ")
            .ok_or_else(|| err("missing ']' after tier label".to_string()))?;
        let tier =
            Tier::from_label(label).ok_or_else(|| err(format!("unknown tier '{label}'")))?;
        let notes = notes
            .split(", ")
            .map(|n| Note::parse(n).ok_or_else(|| err(format!("unknown note '{n}'"))))
            .collect::<Result<Vec<_>, _>>()?;

        let item = items
            .last_mut()
            .ok_or_else(|| err("tier line before any title".to_string()))?;
        item.changes.push(TierChange { tier, notes });
    }

    Ok(items)
}
