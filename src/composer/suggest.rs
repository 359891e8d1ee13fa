//! Suggestion filtering: pure catalog lookup for the active query
//!
//! Case-insensitive contiguous substring match against display name and
//! secondary label. No relevance scoring; matches keep catalog order so
//! the dropdown is stable while the user types.

use serde::{Deserialize, Serialize};

use super::catalog::Entity;

/// Derived state of the suggestion dropdown. Recomputed on every query
/// change, never persisted.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SuggestionList {
    pub open: bool,
    pub candidates: Vec<Entity>,
}

impl SuggestionList {
    pub fn closed() -> Self {
        Self {
            open: false,
            candidates: Vec::new(),
        }
    }
}

/// Filter the catalog down to entities matching `query`.
///
/// An entity qualifies when the query is a case-insensitive substring of
/// its display name or secondary label. An empty query returns the full
/// catalog unchanged; an empty catalog returns an empty list rather than
/// an error so the dropdown stays resilient. Deterministic and
/// side-effect-free, so callers may memoize results per query.
pub fn filter_candidates(catalog: &[Entity], query: &str) -> Vec<Entity> {
    if query.is_empty() {
        return catalog.to_vec();
    }
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|entity| {
            entity.display_name.to_lowercase().contains(&needle)
                || entity
                    .secondary_label
                    .as_deref()
                    .map_or(false, |label| label.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
