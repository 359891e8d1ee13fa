//! ComposerCortex - Unified mention composition facade
//!
//! Single entry point wiring the catalog, document, trigger detector, and
//! suggestion filter together for the UI layer. The UI reports raw edits
//! and cursor moves; the cortex keeps the mention query and suggestion
//! list current and serves the save/export boundary with cached
//! extraction.
//!
//! # Usage (JavaScript)
//! ```javascript
//! import init, { ComposerCortex } from 'mentioncore';
//!
//! await init();
//! const cortex = new ComposerCortex(null);
//! cortex.hydrateCatalog(entitiesJson);
//! cortex.insertText(0, 'Hello @an');
//! cortex.commitSuggestion(0);
//! const result = cortex.save();
//! ```

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use super::catalog::{Catalog, Entity};
use super::document::{ComposeError, Document, SegmentView};
use super::extract::{extract, ExtractionResult};
use super::revision::RevisionGate;
use super::suggest::{filter_candidates, SuggestionList};
use super::trigger::{QueryState, TriggerConfig, TriggerDetector};

// ==================== TYPE DEFINITIONS ====================

/// Configuration for the ComposerCortex
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ComposerConfig {
    #[serde(default = "default_trigger_char")]
    pub trigger_char: char,
    #[serde(default = "default_true")]
    pub allow_internal_whitespace: bool,
    #[serde(default = "default_whitespace_run")]
    pub max_whitespace_run: usize,
    #[serde(default = "default_query_len")]
    pub max_query_len: usize,
}

fn default_trigger_char() -> char {
    '@'
}

fn default_true() -> bool {
    true
}

fn default_whitespace_run() -> usize {
    1
}

fn default_query_len() -> usize {
    64
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            trigger_char: default_trigger_char(),
            allow_internal_whitespace: true,
            max_whitespace_run: default_whitespace_run(),
            max_query_len: default_query_len(),
        }
    }
}

impl ComposerConfig {
    fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            trigger_char: self.trigger_char,
            allow_internal_whitespace: self.allow_internal_whitespace,
            max_whitespace_run: self.max_whitespace_run,
            max_query_len: self.max_query_len,
        }
    }
}

/// Statistics for one save call
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SaveStats {
    pub was_skipped: bool,
    pub revision: u64,
    pub extract_us: u64,
    pub segment_count: usize,
    pub mention_count: usize,
}

/// Save/export payload with stats
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveResult {
    pub plain_text: String,
    pub entities: Vec<Entity>,
    pub stats: SaveStats,
}

// ==================== MAIN IMPLEMENTATION ====================

/// ComposerCortex - Mention-aware composition engine
///
/// Owns the document and all transient query state. Single-writer: one
/// cortex per editor instance, driven by one event stream.
#[wasm_bindgen]
pub struct ComposerCortex {
    config: ComposerConfig,
    catalog: Catalog,
    document: Document,
    trigger: TriggerDetector,
    suggestions: SuggestionList,
    gate: RevisionGate,
    last_extraction: Option<ExtractionResult>,
}

impl Default for ComposerCortex {
    fn default() -> Self {
        Self::with_config(ComposerConfig::default())
    }
}

#[wasm_bindgen]
impl ComposerCortex {
    /// Create a new ComposerCortex with optional configuration
    ///
    /// # Arguments
    /// * `config` - Optional JSON configuration object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ComposerCortex, JsValue> {
        let config: ComposerConfig = if config.is_null() || config.is_undefined() {
            ComposerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        Ok(Self::with_config(config))
    }

    /// Hydrate the cortex with the mentionable entities for this session
    ///
    /// # Arguments
    /// * `entities` - JSON array of { display_name, secondary_label? }
    #[wasm_bindgen(js_name = hydrateCatalog)]
    pub fn js_hydrate_catalog(&mut self, entities: JsValue) -> Result<(), JsValue> {
        let entries: Vec<Entity> = serde_wasm_bindgen::from_value(entities)
            .map_err(|e| JsValue::from_str(&format!("Invalid entities: {}", e)))?;

        self.hydrate_catalog(entries);
        Ok(())
    }

    /// Insert literal text at a linear position (JS binding)
    #[wasm_bindgen(js_name = insertText)]
    pub fn js_insert_text(&mut self, position: usize, text: &str) -> Result<(), JsValue> {
        self.insert_text(position, text)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Delete the span `[start, end)` (JS binding)
    #[wasm_bindgen(js_name = deleteRange)]
    pub fn js_delete_range(&mut self, start: usize, end: usize) -> Result<(), JsValue> {
        self.delete_range(start, end)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Report a pure cursor move (JS binding)
    #[wasm_bindgen(js_name = setCursor)]
    pub fn js_set_cursor(&mut self, cursor: usize) {
        self.set_cursor(cursor);
    }

    /// Current mention query state (JS binding)
    #[wasm_bindgen(js_name = queryState)]
    pub fn js_query_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.query_state()).unwrap_or(JsValue::NULL)
    }

    /// Current suggestion list (JS binding)
    #[wasm_bindgen(js_name = suggestions)]
    pub fn js_suggestions(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.suggestions()).unwrap_or(JsValue::NULL)
    }

    /// Commit the candidate at `index` of the current suggestion list
    #[wasm_bindgen(js_name = commitSuggestion)]
    pub fn js_commit_suggestion(&mut self, index: usize) -> Result<(), JsValue> {
        self.commit_suggestion(index)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Commit a mention over an explicit span (raw commit boundary)
    ///
    /// # Arguments
    /// * `entity` - JSON object { display_name, secondary_label? }
    #[wasm_bindgen(js_name = commitMention)]
    pub fn js_commit_mention(
        &mut self,
        trigger_position: usize,
        cursor_position: usize,
        entity: JsValue,
    ) -> Result<(), JsValue> {
        let entity: Entity = serde_wasm_bindgen::from_value(entity)
            .map_err(|e| JsValue::from_str(&format!("Invalid entity: {}", e)))?;

        self.commit_mention(trigger_position, cursor_position, entity)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Cancel the in-flight mention query (Escape, focus loss)
    #[wasm_bindgen(js_name = cancelQuery)]
    pub fn js_cancel_query(&mut self) {
        self.cancel_query();
    }

    /// Read-only segment views for the render boundary (JS binding)
    #[wasm_bindgen(js_name = segments)]
    pub fn js_segments(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.segment_views()).unwrap_or(JsValue::NULL)
    }

    /// Total character count of the linearized document
    #[wasm_bindgen(js_name = linearLength)]
    pub fn js_linear_length(&self) -> usize {
        self.linear_length()
    }

    /// Plain text + deduplicated entity list (JS binding)
    #[wasm_bindgen(js_name = save)]
    pub fn js_save(&mut self) -> JsValue {
        let result = self.save();
        match serde_wasm_bindgen::to_value(&result) {
            Ok(v) => v,
            Err(e) => {
                web_sys::console::error_1(
                    &format!("[ComposerCortex] Serialization failed: {:?}", e).into(),
                );
                JsValue::NULL
            }
        }
    }

    /// Get cortex status
    #[wasm_bindgen(js_name = getStatus)]
    pub fn js_get_status(&self) -> JsValue {
        let status = serde_json::json!({
            "catalog_size": self.catalog.len(),
            "revision": self.document.revision(),
            "linear_length": self.linear_length(),
            "mention_count": self.document.mention_count(),
            "query_active": self.trigger.state().active,
            "save_skip_rate": self.gate.skip_rate(),
            "config": {
                "trigger_char": self.config.trigger_char,
                "allow_internal_whitespace": self.config.allow_internal_whitespace,
                "max_whitespace_run": self.config.max_whitespace_run,
                "max_query_len": self.config.max_query_len,
            }
        });

        JsValue::from_str(&status.to_string())
    }
}

impl ComposerCortex {
    pub fn with_config(config: ComposerConfig) -> Self {
        let trigger = TriggerDetector::new(config.trigger_config());
        let document = Document::new(config.trigger_char);

        Self {
            config,
            catalog: Catalog::new(),
            document,
            trigger,
            suggestions: SuggestionList::closed(),
            gate: RevisionGate::new(),
            last_extraction: None,
        }
    }

    /// Replace the session catalog. Cancels any in-flight query so stale
    /// candidates can never be committed.
    pub fn hydrate_catalog(&mut self, entries: Vec<Entity>) {
        self.catalog.hydrate(entries);
        self.trigger.cancel();
        self.suggestions = SuggestionList::closed();
    }

    /// Insert text and refresh the query at the post-insert cursor
    pub fn insert_text(&mut self, position: usize, text: &str) -> Result<(), ComposeError> {
        self.document.insert_text(position, text)?;
        self.refresh_query(position + text.chars().count());
        Ok(())
    }

    /// Delete a span and refresh the query at the deletion start
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), ComposeError> {
        self.document.delete_range(start, end)?;
        self.refresh_query(start);
        Ok(())
    }

    /// Pure cursor move. Moving outside the trigger span cancels the
    /// query as a side effect of recomputation.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.refresh_query(cursor);
    }

    pub fn query_state(&self) -> &QueryState {
        self.trigger.state()
    }

    pub fn suggestions(&self) -> &SuggestionList {
        &self.suggestions
    }

    /// Commit the candidate at `index` over the active query span
    pub fn commit_suggestion(&mut self, index: usize) -> Result<(), String> {
        let state = self.trigger.state().clone();
        if !state.active {
            return Err("No active mention query".to_string());
        }
        let entity = self
            .suggestions
            .candidates
            .get(index)
            .cloned()
            .ok_or_else(|| format!("Suggestion index {} out of range", index))?;

        let cursor = state.trigger_position + 1 + state.substring.chars().count();
        self.document
            .commit_mention(state.trigger_position, cursor, entity)
            .map_err(|e| e.to_string())?;

        self.trigger.cancel();
        self.suggestions = SuggestionList::closed();
        Ok(())
    }

    /// Raw commit boundary: the UI supplies the span and entity itself
    pub fn commit_mention(
        &mut self,
        trigger_position: usize,
        cursor_position: usize,
        entity: Entity,
    ) -> Result<(), ComposeError> {
        self.document
            .commit_mention(trigger_position, cursor_position, entity)?;
        self.trigger.cancel();
        self.suggestions = SuggestionList::closed();
        Ok(())
    }

    /// Cancel the in-flight query synchronously
    pub fn cancel_query(&mut self) {
        self.trigger.cancel();
        self.suggestions = SuggestionList::closed();
    }

    pub fn segment_views(&self) -> Vec<SegmentView> {
        self.document.segment_views()
    }

    pub fn linear_length(&self) -> usize {
        self.document.linear_length()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Save the composition: plain text plus referenced entities.
    ///
    /// Extraction is skipped and served from cache when the document
    /// revision has not moved since the last save.
    pub fn save(&mut self) -> SaveResult {
        let start = instant::Instant::now();
        let check = self.gate.check(self.document.revision());

        if !check.has_changed {
            if let Some(cached) = &self.last_extraction {
                return SaveResult {
                    plain_text: cached.plain_text.clone(),
                    entities: cached.entities.clone(),
                    stats: SaveStats {
                        was_skipped: true,
                        revision: check.revision,
                        extract_us: start.elapsed().as_micros() as u64,
                        segment_count: self.document.segments().len(),
                        mention_count: self.document.mention_count(),
                    },
                };
            }
        }

        let extraction = extract(&self.document);
        self.last_extraction = Some(extraction.clone());

        SaveResult {
            plain_text: extraction.plain_text,
            entities: extraction.entities,
            stats: SaveStats {
                was_skipped: false,
                revision: check.revision,
                extract_us: start.elapsed().as_micros() as u64,
                segment_count: self.document.segments().len(),
                mention_count: self.document.mention_count(),
            },
        }
    }

    /// Recompute query state and suggestion list for a cursor position
    fn refresh_query(&mut self, cursor: usize) {
        let previous = self.trigger.state().clone();
        let state = self.trigger.update(&self.document, cursor).clone();

        if !state.active {
            self.suggestions = SuggestionList::closed();
            return;
        }
        // Unchanged substring: the filter is pure, reuse the last list.
        if previous.active && previous.substring == state.substring && self.suggestions.open {
            return;
        }
        self.suggestions = SuggestionList {
            open: true,
            candidates: filter_candidates(self.catalog.entries(), &state.substring),
        };
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn example_catalog() -> Vec<Entity> {
        vec![
            Entity::with_label("Francisco Watson", "fwatson@example.com"),
            Entity::with_label("Ana Gibson", "agibson@example.com"),
            Entity::with_label("Vera Bell", "vbell@example.com"),
            Entity::with_label("Rosemary Flores", "rflores@example.com"),
        ]
    }

    fn cortex() -> ComposerCortex {
        let mut cortex = ComposerCortex::default();
        cortex.hydrate_catalog(example_catalog());
        cortex
    }

    #[test]
    fn test_config_defaults() {
        let config = ComposerConfig::default();
        assert_eq!(config.trigger_char, '@');
        assert!(config.allow_internal_whitespace);
        assert_eq!(config.max_whitespace_run, 1);
        assert_eq!(config.max_query_len, 64);
    }

    #[test]
    fn test_config_parsing_with_defaults() {
        let json = r##"{"trigger_char": "#"}"##;
        let config: ComposerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.trigger_char, '#');
        assert!(config.allow_internal_whitespace);
        assert_eq!(config.max_query_len, 64);
    }

    // -------------------------------------------------------------------------
    // Scenario: type "Hello @an", commit Ana Gibson, save
    // -------------------------------------------------------------------------
    #[test]
    fn test_type_commit_save_flow() {
        let mut cortex = cortex();
        cortex.insert_text(0, "Hello @an").unwrap();

        let state = cortex.query_state();
        assert!(state.active);
        assert_eq!(state.substring, "an");

        let list = cortex.suggestions();
        assert!(list.open);
        // "an" matches Francisco (fr-an-cisco) and Ana, catalog order
        assert_eq!(list.candidates.len(), 2);
        assert_eq!(list.candidates[1].display_name, "Ana Gibson");

        cortex.commit_suggestion(1).unwrap();
        assert!(!cortex.query_state().active);
        assert!(!cortex.suggestions().open);

        let result = cortex.save();
        assert_eq!(result.plain_text, "Hello @Ana Gibson");
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].display_name, "Ana Gibson");
        assert_eq!(result.entities[0].secondary_label.as_deref(), Some("agibson@example.com"));
    }

    // -------------------------------------------------------------------------
    // Scenario: the same entity mentioned twice deduplicates to one
    // -------------------------------------------------------------------------
    #[test]
    fn test_duplicate_mention_dedup() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@ve").unwrap();
        cortex.commit_suggestion(0).unwrap();

        let end = cortex.linear_length();
        cortex.insert_text(end, " and @ve").unwrap();
        assert_eq!(cortex.query_state().substring, "ve");
        cortex.commit_suggestion(0).unwrap();

        let result = cortex.save();
        assert_eq!(result.plain_text, "@Vera Bell and @Vera Bell");
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.stats.mention_count, 2);
    }

    #[test]
    fn test_empty_query_lists_full_catalog() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@").unwrap();

        let list = cortex.suggestions();
        assert!(list.open);
        assert_eq!(list.candidates.len(), 4);
        assert_eq!(list.candidates[0].display_name, "Francisco Watson");
    }

    #[test]
    fn test_empty_catalog_yields_empty_candidates() {
        let mut cortex = ComposerCortex::default();
        cortex.insert_text(0, "@an").unwrap();

        let list = cortex.suggestions();
        assert!(list.open);
        assert!(list.candidates.is_empty());
    }

    #[test]
    fn test_cursor_move_outside_span_cancels() {
        let mut cortex = cortex();
        cortex.insert_text(0, "Hello @an").unwrap();
        assert!(cortex.query_state().active);

        cortex.set_cursor(3);
        assert!(!cortex.query_state().active);
        assert!(!cortex.suggestions().open);
    }

    #[test]
    fn test_cancel_query() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@an").unwrap();
        assert!(cortex.query_state().active);

        cortex.cancel_query();
        assert!(!cortex.query_state().active);
        assert!(!cortex.suggestions().open);
    }

    #[test]
    fn test_commit_without_query_fails() {
        let mut cortex = cortex();
        cortex.insert_text(0, "plain text").unwrap();

        assert!(cortex.commit_suggestion(0).is_err());
    }

    #[test]
    fn test_commit_index_out_of_range() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@vera").unwrap();

        let err = cortex.commit_suggestion(5).unwrap_err();
        assert!(err.contains("out of range"));
        // The query survives a bad index so the UI can retry
        assert!(cortex.query_state().active);
    }

    #[test]
    fn test_raw_commit_boundary() {
        let mut cortex = cortex();
        cortex.insert_text(0, "Hi @v").unwrap();

        cortex
            .commit_mention(3, 5, Entity::with_label("Vera Bell", "vbell@example.com"))
            .unwrap();

        let result = cortex.save();
        assert_eq!(result.plain_text, "Hi @Vera Bell");
        assert_eq!(result.entities.len(), 1);
    }

    #[test]
    fn test_rejected_edit_leaves_state_unchanged() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@v").unwrap();
        cortex.commit_suggestion(0).unwrap();

        let length = cortex.linear_length();
        let views = cortex.segment_views().len();

        // Inside the atomic mention span
        assert!(cortex.insert_text(1, "x").is_err());
        assert_eq!(cortex.linear_length(), length);
        assert_eq!(cortex.segment_views().len(), views);
    }

    #[test]
    fn test_save_skips_unchanged_document() {
        let mut cortex = cortex();
        cortex.insert_text(0, "Hello @an").unwrap();
        cortex.commit_suggestion(1).unwrap();

        let first = cortex.save();
        assert!(!first.stats.was_skipped);

        let second = cortex.save();
        assert!(second.stats.was_skipped);
        assert_eq!(second.plain_text, first.plain_text);
        assert_eq!(second.entities, first.entities);

        // A mutation re-arms extraction
        let end = cortex.linear_length();
        cortex.insert_text(end, "!").unwrap();
        let third = cortex.save();
        assert!(!third.stats.was_skipped);
        assert_eq!(third.plain_text, "Hello @Ana Gibson!");
    }

    #[test]
    fn test_delete_through_mention_updates_save() {
        let mut cortex = cortex();
        cortex.insert_text(0, "Hello @an").unwrap();
        cortex.commit_suggestion(1).unwrap();
        // "Hello @Ana Gibson" (17 chars)

        cortex.delete_range(5, 8).unwrap();

        let result = cortex.save();
        assert_eq!(result.plain_text, "Hello");
        assert!(result.entities.is_empty());
        assert_eq!(result.stats.mention_count, 0);
    }

    #[test]
    fn test_suggestions_follow_typing() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@").unwrap();
        assert_eq!(cortex.suggestions().candidates.len(), 4);

        cortex.insert_text(1, "v").unwrap();
        assert_eq!(cortex.suggestions().candidates.len(), 1);
        assert_eq!(cortex.suggestions().candidates[0].display_name, "Vera Bell");

        cortex.insert_text(2, "zz").unwrap();
        assert!(cortex.suggestions().open);
        assert!(cortex.suggestions().candidates.is_empty());
    }

    #[test]
    fn test_hydrate_cancels_query() {
        let mut cortex = cortex();
        cortex.insert_text(0, "@an").unwrap();
        assert!(cortex.query_state().active);

        cortex.hydrate_catalog(vec![Entity::new("Someone Else")]);
        assert!(!cortex.query_state().active);
        assert!(!cortex.suggestions().open);
    }
}
