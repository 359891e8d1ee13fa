//! Extraction: plain text + referenced entities from a finalized document
//!
//! A pure read over the segment sequence. Text runs contribute their
//! characters verbatim, mentions contribute the trigger character plus the
//! display name. Entities are collected in walk order and deduplicated by
//! display-name equality, keeping the first occurrence's position.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::catalog::Entity;
use super::document::{Document, Segment};

/// Save/export payload for the external caller
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExtractionResult {
    pub plain_text: String,
    pub entities: Vec<Entity>,
}

/// Derive the plain-text rendering and the deduplicated entity list.
///
/// Idempotent: an identical document always yields a byte-identical
/// result, so callers may cache it keyed on the document revision.
pub fn extract(document: &Document) -> ExtractionResult {
    let mut plain_text = String::new();
    let mut entities: Vec<Entity> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for seg in document.segments() {
        match seg {
            Segment::Text { content } => plain_text.push_str(content),
            Segment::Mention { entity } => {
                plain_text.push(document.trigger_char());
                plain_text.push_str(&entity.display_name);
                if seen.insert(entity.display_name.as_str()) {
                    entities.push(entity.clone());
                }
            }
        }
    }

    ExtractionResult {
        plain_text,
        entities,
    }
}

// =============================================================================
// Tests
// =============================================================================
