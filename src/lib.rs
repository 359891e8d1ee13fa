//! MentionCore: Mention-aware composer state engine
//!
//! A Rust/WASM implementation of the KittClouds mention composition core.
//! The UI layer owns rendering, styling, and focus handling; this crate owns
//! the state model behind it.
//!
//! # Architecture
//!
//! ## Composer Components
//! - `core.rs` - ComposerCortex: **Unified facade** - single entry point for the UI layer
//! - `document.rs` - Document: text runs + atomic mention markers, all mutation funneled here
//! - `trigger.rs` - TriggerDetector: backward scan for an active mention query at the cursor
//! - `suggest.rs` - Suggestion filter: pure catalog filtering, stable catalog order
//! - `extract.rs` - Extraction: plain text + first-occurrence-deduplicated entity list
//! - `catalog.rs` - Catalog: session-fixed, ordered list of mentionable entities
//! - `revision.rs` - RevisionGate: revision-stamped skip detection for repeated saves
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ComposerCortex } from 'mentioncore';
//!
//! await init();
//!
//! const cortex = new ComposerCortex(null);
//!
//! // Hydrate with the mentionable entities for this session
//! cortex.hydrateCatalog([
//!   { display_name: 'Ana Gibson', secondary_label: 'agibson@example.com' },
//!   { display_name: 'Vera Bell', secondary_label: 'vbell@example.com' },
//! ]);
//!
//! // UI reports raw edits; the cortex tracks the active mention query
//! cortex.insertText(0, 'Hello @an');
//! console.log(cortex.queryState());   // { active: true, trigger_position: 6, substring: 'an' }
//! console.log(cortex.suggestions());  // { open: true, candidates: [Ana Gibson] }
//!
//! // Commit the highlighted candidate, then save
//! cortex.commitSuggestion(0);
//! const result = cortex.save();
//! console.log(result.plain_text);     // 'Hello @Ana Gibson'
//! console.log(result.entities);       // [{ display_name: 'Ana Gibson', ... }]
//! ```

pub mod composer;

pub use composer::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("mentioncore v{}", env!("CARGO_PKG_VERSION"))
}
