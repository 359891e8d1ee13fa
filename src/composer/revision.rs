//! RevisionGate: revision-stamped skip detection
//!
//! Lets the save path skip re-extraction when the document has not been
//! mutated since the last save. The document's revision counter is the
//! change signal, so there is nothing to hash.

use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// Result of a revision check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionCheck {
    /// True if the revision moved since the last check
    pub has_changed: bool,
    /// Current revision stamp
    pub revision: u64,
    /// Previous revision stamp (if any)
    pub previous: Option<u64>,
}

// =============================================================================
// RevisionGate
// =============================================================================

/// Tracks the last-seen document revision and skip statistics
#[derive(Debug, Clone, Default)]
pub struct RevisionGate {
    last: Option<u64>,
    check_count: u64,
    skip_count: u64,
}

impl RevisionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a revision stamp and return a detailed result
    pub fn check(&mut self, revision: u64) -> RevisionCheck {
        self.check_count += 1;

        let previous = self.last;
        let has_changed = match previous {
            None => true, // First check always counts as changed
            Some(prev) => prev != revision,
        };

        if !has_changed {
            self.skip_count += 1;
        }
        self.last = Some(revision);

        RevisionCheck {
            has_changed,
            revision,
            previous,
        }
    }

    /// Skip rate as a percentage of all checks
    pub fn skip_rate(&self) -> f64 {
        if self.check_count == 0 {
            return 0.0;
        }
        (self.skip_count as f64 / self.check_count as f64) * 100.0
    }

    pub fn check_count(&self) -> u64 {
        self.check_count
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    pub fn last_revision(&self) -> Option<u64> {
        self.last
    }

    /// Reset the gate state
    pub fn reset(&mut self) {
        self.last = None;
        self.check_count = 0;
        self.skip_count = 0;
    }
}

// =============================================================================
// Tests
// =============================================================================
