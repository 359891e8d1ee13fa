//! Catalog: session-fixed list of mentionable entities
//!
//! Hydrated once per composition session from the UI layer and read-only
//! afterwards. Entities carry no synthetic IDs; two entries with the same
//! display name are indistinguishable downstream.

use serde::{Deserialize, Serialize};

// =============================================================================
// Entity
// =============================================================================

/// A mentionable entity supplied by the UI layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    /// Primary display name, also the deduplication key
    pub display_name: String,
    /// Optional secondary attribute shown in suggestion entries (e.g. an email)
    #[serde(default)]
    pub secondary_label: Option<String>,
}

impl Entity {
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            secondary_label: None,
        }
    }

    pub fn with_label(display_name: &str, secondary_label: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            secondary_label: Some(secondary_label.to_string()),
        }
    }

    /// Whether two entities refer to the same target.
    /// Identity is display-name equality only.
    pub fn same_reference(&self, other: &Entity) -> bool {
        self.display_name == other.display_name
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Ordered collection of mentionable entities for one composition session
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<Entity>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replace the catalog contents. Hydration order is preserved and
    /// drives suggestion ranking.
    pub fn hydrate(&mut self, entries: Vec<Entity>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
