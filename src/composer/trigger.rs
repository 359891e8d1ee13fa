//! TriggerDetector: incremental mention-query tracking
//!
//! On every text-change or cursor event, scans backward from the cursor
//! through the containing text run for the nearest trigger character. The
//! scan never leaves the current run, so a committed mention naturally
//! terminates it. Query state is transient and lives for one editing
//! gesture only.

use serde::{Deserialize, Serialize};

use super::document::{Document, Segment};

// =============================================================================
// Types
// =============================================================================

/// Backward-scan configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TriggerConfig {
    /// Character that opens a mention query
    pub trigger_char: char,
    /// Permit whitespace inside the typed substring (multi-word names)
    pub allow_internal_whitespace: bool,
    /// Longest run of consecutive whitespace tolerated inside the substring
    pub max_whitespace_run: usize,
    /// Hard cap on scanned characters, guards against runaway scans
    pub max_query_len: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trigger_char: '@',
            allow_internal_whitespace: true,
            max_whitespace_run: 1,
            max_query_len: 64,
        }
    }
}

/// Transient state of the in-progress mention query
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    pub active: bool,
    /// Linear position of the trigger character when active
    pub trigger_position: usize,
    /// Characters typed between the trigger and the cursor
    pub substring: String,
}

impl QueryState {
    pub fn inactive() -> Self {
        Self {
            active: false,
            trigger_position: 0,
            substring: String::new(),
        }
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::inactive()
    }
}

// =============================================================================
// TriggerDetector
// =============================================================================

/// Tracks the active mention query at the cursor
#[derive(Clone, Debug, Default)]
pub struct TriggerDetector {
    config: TriggerConfig,
    state: QueryState,
}

impl TriggerDetector {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            state: QueryState::inactive(),
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Recompute query state for the cursor at linear position `cursor`.
    pub fn update(&mut self, document: &Document, cursor: usize) -> &QueryState {
        self.state = Self::scan(&self.config, document, cursor);
        &self.state
    }

    /// Reset to inactive (commit, Escape, focus loss).
    pub fn cancel(&mut self) {
        self.state = QueryState::inactive();
    }

    fn scan(config: &TriggerConfig, document: &Document, cursor: usize) -> QueryState {
        if cursor == 0 {
            return QueryState::inactive();
        }

        // Resolve the cursor into its containing text run.
        let mut seg_start = 0usize;
        for seg in document.segments() {
            let seg_end = seg_start + seg.char_len();
            if cursor <= seg_end {
                match seg {
                    Segment::Text { content } => {
                        return Self::scan_run(config, content, seg_start, cursor - seg_start)
                    }
                    // Cursor at a mention edge or inside it: no query.
                    Segment::Mention { .. } => return QueryState::inactive(),
                }
            }
            seg_start = seg_end;
        }

        // Cursor beyond the document.
        QueryState::inactive()
    }

    /// Backward scan within one text run. `local_cursor` is a char offset.
    fn scan_run(
        config: &TriggerConfig,
        content: &str,
        seg_start: usize,
        local_cursor: usize,
    ) -> QueryState {
        let chars: Vec<char> = content.chars().collect();
        let mut whitespace_run = 0usize;
        let mut scanned = 0usize;
        let mut i = local_cursor;

        while i > 0 {
            let c = chars[i - 1];
            if c == config.trigger_char {
                // The trigger must start a token. A trigger glued to a word
                // (emails, handles mid-word) opens no query, and neither
                // does a nested second trigger.
                if i >= 2 && !chars[i - 2].is_whitespace() {
                    return QueryState::inactive();
                }
                let substring: String = chars[i..local_cursor].iter().collect();
                return QueryState {
                    active: true,
                    trigger_position: seg_start + i - 1,
                    substring,
                };
            }
            if c.is_whitespace() {
                if !config.allow_internal_whitespace {
                    return QueryState::inactive();
                }
                whitespace_run += 1;
                if whitespace_run > config.max_whitespace_run {
                    return QueryState::inactive();
                }
            } else {
                whitespace_run = 0;
            }
            scanned += 1;
            if scanned > config.max_query_len {
                return QueryState::inactive();
            }
            i -= 1;
        }

        QueryState::inactive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::catalog::Entity;

    fn doc(text: &str) -> Document {
        let mut d = Document::new('@');
        d.insert_text(0, text).unwrap();
        d
    }

    #[test]
    fn test_basic_query() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("Hello @an");

        let state = detector.update(&d, 9);
        assert!(state.active);
        assert_eq!(state.trigger_position, 6);
        assert_eq!(state.substring, "an");
    }

    #[test]
    fn test_trigger_at_document_start() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("@ve");

        let state = detector.update(&d, 3);
        assert!(state.active);
        assert_eq!(state.trigger_position, 0);
        assert_eq!(state.substring, "ve");
    }

    #[test]
    fn test_empty_substring() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("Hi @");

        let state = detector.update(&d, 4);
        assert!(state.active);
        assert_eq!(state.substring, "");
    }

    #[test]
    fn test_no_trigger_means_inactive() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("Hello there");

        assert!(!detector.update(&d, 11).active);
    }

    #[test]
    fn test_mid_word_trigger_is_ignored() {
        // Email-style text must not open the dropdown
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("mail me at a@b");

        assert!(!detector.update(&d, 14).active);
    }

    #[test]
    fn test_whitespace_disallowed() {
        let config = TriggerConfig {
            allow_internal_whitespace: false,
            ..TriggerConfig::default()
        };
        let mut detector = TriggerDetector::new(config);
        let d = doc("Hey @Ana G");

        assert!(!detector.update(&d, 10).active);
    }

    #[test]
    fn test_whitespace_allowed_keeps_query() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("Hey @Ana G");

        let state = detector.update(&d, 10);
        assert!(state.active);
        assert_eq!(state.substring, "Ana G");
    }

    #[test]
    fn test_whitespace_run_terminates() {
        // Default tolerates single spaces only
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("Hey @Ana  G");

        assert!(!detector.update(&d, 11).active);
    }

    #[test]
    fn test_max_query_len_guard() {
        let config = TriggerConfig {
            max_query_len: 4,
            ..TriggerConfig::default()
        };
        let mut detector = TriggerDetector::new(config);
        let d = doc("@abcdef");

        assert!(!detector.update(&d, 7).active);
    }

    #[test]
    fn test_cursor_after_mention_is_inactive() {
        let mut d = doc("@an");
        d.commit_mention(0, 3, Entity::new("Ana Gibson")).unwrap();

        let mut detector = TriggerDetector::new(TriggerConfig::default());
        // Cursor sits right after the committed mention
        assert!(!detector.update(&d, d.linear_length()).active);
    }

    #[test]
    fn test_scan_stops_at_mention_boundary() {
        let mut d = doc("@an");
        d.commit_mention(0, 3, Entity::new("Ana Gibson")).unwrap();
        d.insert_text(d.linear_length(), " ok").unwrap();

        let mut detector = TriggerDetector::new(TriggerConfig::default());
        // Scanning backward from the tail run never reaches the mention
        assert!(!detector.update(&d, d.linear_length()).active);
    }

    #[test]
    fn test_cursor_at_zero_and_past_end() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("@a");

        assert!(!detector.update(&d, 0).active);
        assert!(!detector.update(&d, 99).active);
    }

    #[test]
    fn test_cancel_resets_state() {
        let mut detector = TriggerDetector::new(TriggerConfig::default());
        let d = doc("@an");

        assert!(detector.update(&d, 3).active);
        detector.cancel();
        assert!(!detector.state().active);
    }

    #[test]
    fn test_custom_trigger_char() {
        let config = TriggerConfig {
            trigger_char: '#',
            ..TriggerConfig::default()
        };
        let mut detector = TriggerDetector::new(config);
        let mut d = Document::new('#');
        d.insert_text(0, "see #topic").unwrap();

        let state = detector.update(&d, 10);
        assert!(state.active);
        assert_eq!(state.trigger_position, 4);
        assert_eq!(state.substring, "topic");
    }
}
