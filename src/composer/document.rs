//! Document: text runs interleaved with atomic mention markers
//!
//! The authoritative representation of composed content. All mutation is
//! funneled through `insert_text`, `delete_range`, and `commit_mention` so
//! the atomic-mention invariant can never be broken from outside:
//! - A mention is never decomposed back into editable characters
//! - A deletion touching any part of a mention removes the whole marker
//! - Failed operations leave the document untouched (no partial mutation)
//!
//! Linear positions count characters. A mention contributes its display
//! name length plus one for the trigger character.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Entity;

// =============================================================================
// Types
// =============================================================================

/// Recoverable mutation errors. Every failure is a rejected operation,
/// never a crash of the session.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ComposeError {
    /// Mutation addressed outside current bounds or inside an atomic
    /// mention span.
    #[error("position {position} is out of bounds or inside an atomic mention (length {len})")]
    InvalidPosition { position: usize, len: usize },
    /// A commit referenced a trigger span invalidated by an intervening
    /// edit.
    #[error("span [{trigger_position}, {cursor_position}) no longer matches an active mention trigger")]
    StaleSpan {
        trigger_position: usize,
        cursor_position: usize,
    },
}

/// One run of the document: literal characters or a committed mention
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Literal characters, never empty
    Text { content: String },
    /// Atomic reference to one catalog entity
    Mention { entity: Entity },
}

impl Segment {
    /// Character count this segment contributes to the linear stream
    pub fn char_len(&self) -> usize {
        match self {
            Segment::Text { content } => content.chars().count(),
            Segment::Mention { entity } => entity.display_name.chars().count() + 1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    Text,
    Mention,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Text => "text",
            SegmentKind::Mention => "mention",
        }
    }
}

/// Flat read-only projection of a segment for the render boundary.
/// The UI paints `text` views as plain characters and `mention` views as
/// inline chips; it never mutates through this surface.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SegmentView {
    pub kind: String,
    pub content: String,
    pub entity: Option<Entity>,
}

/// Where an insertion lands after position resolution
enum InsertPoint {
    /// Inside an existing text segment, at a char offset
    Within(usize, usize),
    /// Between segments, as a fresh text segment at this index
    Between(usize),
}

// =============================================================================
// Document
// =============================================================================

/// Mention-aware document model
#[derive(Clone, Debug)]
pub struct Document {
    segments: Vec<Segment>,
    trigger_char: char,
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new('@')
    }
}

impl Document {
    pub fn new(trigger_char: char) -> Self {
        Self {
            segments: Vec::new(),
            trigger_char,
            revision: 0,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn trigger_char(&self) -> char {
        self.trigger_char
    }

    /// Monotonic mutation counter. Bumped by every successful mutation,
    /// untouched by rejected ones.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total character count of the linearized document
    pub fn linear_length(&self) -> usize {
        self.segments.iter().map(Segment::char_len).sum()
    }

    pub fn mention_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Mention { .. }))
            .count()
    }

    /// Read-only segment views for the render boundary
    pub fn segment_views(&self) -> Vec<SegmentView> {
        self.segments
            .iter()
            .map(|seg| match seg {
                Segment::Text { content } => SegmentView {
                    kind: SegmentKind::Text.as_str().to_string(),
                    content: content.clone(),
                    entity: None,
                },
                Segment::Mention { entity } => SegmentView {
                    kind: SegmentKind::Mention.as_str().to_string(),
                    content: format!("{}{}", self.trigger_char, entity.display_name),
                    entity: Some(entity.clone()),
                },
            })
            .collect()
    }

    /// Insert literal text at a linear position.
    ///
    /// Rejects positions beyond the current length and positions strictly
    /// inside a mention. Mention boundaries are legal insertion points.
    pub fn insert_text(&mut self, position: usize, text: &str) -> Result<(), ComposeError> {
        let len = self.linear_length();
        if position > len {
            return Err(ComposeError::InvalidPosition { position, len });
        }
        if text.is_empty() {
            return Ok(());
        }

        let mut point = InsertPoint::Between(self.segments.len());
        let mut seg_start = 0usize;
        for (idx, seg) in self.segments.iter().enumerate() {
            let seg_end = seg_start + seg.char_len();
            if position == seg_start {
                point = match seg {
                    Segment::Text { .. } => InsertPoint::Within(idx, 0),
                    Segment::Mention { .. } => InsertPoint::Between(idx),
                };
                break;
            }
            if position < seg_end {
                match seg {
                    Segment::Text { .. } => point = InsertPoint::Within(idx, position - seg_start),
                    // Strictly inside the atomic span: rejected, not redirected.
                    Segment::Mention { .. } => {
                        return Err(ComposeError::InvalidPosition { position, len })
                    }
                }
                break;
            }
            seg_start = seg_end;
        }

        match point {
            InsertPoint::Within(idx, offset) => {
                if let Segment::Text { content } = &mut self.segments[idx] {
                    let byte = byte_offset(content, offset);
                    content.insert_str(byte, text);
                }
            }
            InsertPoint::Between(idx) => {
                self.segments.insert(
                    idx,
                    Segment::Text {
                        content: text.to_string(),
                    },
                );
            }
        }

        self.coalesce();
        self.revision += 1;
        Ok(())
    }

    /// Delete the span `[start, end)`.
    ///
    /// A mention overlapped by any part of the span is removed whole.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), ComposeError> {
        let len = self.linear_length();
        if end > len {
            return Err(ComposeError::InvalidPosition { position: end, len });
        }
        if start > end {
            return Err(ComposeError::InvalidPosition {
                position: start,
                len,
            });
        }
        if start == end {
            return Ok(());
        }

        let mut out: Vec<Segment> = Vec::with_capacity(self.segments.len());
        let mut seg_start = 0usize;
        for seg in std::mem::take(&mut self.segments) {
            let seg_end = seg_start + seg.char_len();
            let overlaps = seg_start < end && start < seg_end;
            if !overlaps {
                out.push(seg);
            } else if let Segment::Text { content } = seg {
                let keep_head = start.saturating_sub(seg_start);
                let drop_until = end.min(seg_end) - seg_start;
                let mut kept: String = content.chars().take(keep_head).collect();
                kept.extend(content.chars().skip(drop_until));
                if !kept.is_empty() {
                    out.push(Segment::Text { content: kept });
                }
            }
            // An overlapped mention is dropped whole (atomic-unit rule).
            seg_start = seg_end;
        }

        self.segments = out;
        self.coalesce();
        self.revision += 1;
        Ok(())
    }

    /// Replace the trigger span `[trigger_position, cursor_position)` with
    /// a mention bound to `entity`.
    ///
    /// The span must still sit inside a single text segment and start with
    /// the trigger character; anything else means the document was mutated
    /// since the span was captured.
    pub fn commit_mention(
        &mut self,
        trigger_position: usize,
        cursor_position: usize,
        entity: Entity,
    ) -> Result<(), ComposeError> {
        let stale = || ComposeError::StaleSpan {
            trigger_position,
            cursor_position,
        };

        if trigger_position >= cursor_position || cursor_position > self.linear_length() {
            return Err(stale());
        }

        let mut found: Option<(usize, usize)> = None;
        let mut seg_start = 0usize;
        for (idx, seg) in self.segments.iter().enumerate() {
            let seg_end = seg_start + seg.char_len();
            if trigger_position < seg_end {
                if cursor_position > seg_end {
                    // Span crosses a segment boundary.
                    return Err(stale());
                }
                match seg {
                    Segment::Text { .. } => found = Some((idx, seg_start)),
                    Segment::Mention { .. } => return Err(stale()),
                }
                break;
            }
            seg_start = seg_end;
        }
        let (idx, seg_start) = match found {
            Some(f) => f,
            None => return Err(stale()),
        };

        let (head, tail) = match &self.segments[idx] {
            Segment::Text { content } => {
                let local_start = trigger_position - seg_start;
                let local_end = cursor_position - seg_start;
                if content.chars().nth(local_start) != Some(self.trigger_char) {
                    return Err(stale());
                }
                let head: String = content.chars().take(local_start).collect();
                let tail: String = content.chars().skip(local_end).collect();
                (head, tail)
            }
            Segment::Mention { .. } => return Err(stale()),
        };

        let mut replacement: Vec<Segment> = Vec::with_capacity(3);
        if !head.is_empty() {
            replacement.push(Segment::Text { content: head });
        }
        replacement.push(Segment::Mention { entity });
        if !tail.is_empty() {
            replacement.push(Segment::Text { content: tail });
        }
        self.segments.splice(idx..=idx, replacement);

        self.coalesce();
        self.revision += 1;
        Ok(())
    }

    /// Drop empty text segments and merge adjacent text runs.
    fn coalesce(&mut self) {
        self.segments
            .retain(|s| !matches!(s, Segment::Text { content } if content.is_empty()));

        let mut merged: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for seg in std::mem::take(&mut self.segments) {
            match seg {
                Segment::Text { content } => {
                    if let Some(Segment::Text { content: prev }) = merged.last_mut() {
                        prev.push_str(&content);
                    } else {
                        merged.push(Segment::Text { content });
                    }
                }
                mention => merged.push(mention),
            }
        }
        self.segments = merged;
    }
}

/// Byte index of a char offset inside `content`
fn byte_offset(content: &str, char_offset: usize) -> usize {
    content
        .char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(content.len())
}

// =============================================================================
// Tests (TDD - written first!)
// =============================================================================
