//! WASM bindings for Hearth.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmHearth } from 'hearth';
//!
//! await init();
//!
//! const hearth = new WasmHearth();
//! hearth.check("turn on the kitchen fan");            // true
//! hearth.trace_lines("turn living on lights");        // ["Expanding COMMAND → ACTION", ...]
//! JSON.parse(hearth.handle("remind me to read the book at 8 pm", "2026-10-18T10:00:00"));
//! ```

use std::sync::Arc;

use chrono::NaiveDateTime;
use wasm_bindgen::prelude::*;

use crate::config::AssistantConfig;
use crate::dispatch::{Assistant, Services};
use crate::error::HearthError;
use crate::grammar::Grammar;
use crate::parser::{parse, tokenize};
use crate::semantics::{DeviceClass, RuleBasedClassifier, SemanticExtractor};
use crate::services::{InMemoryDeviceRegistry, MemoryEventStore, RecordingTimer};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Command interpreter for the browser.
///
/// Devices live in memory and reminders are recorded rather than fired; the
/// page decides what to do with a `scheduled` outcome.
#[wasm_bindgen]
pub struct WasmHearth {
    assistant: Assistant,
    registry: Arc<InMemoryDeviceRegistry>,
}

#[wasm_bindgen]
impl WasmHearth {
    /// Create an interpreter with the built-in home grammar.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmHearth, JsValue> {
        Self::build(Grammar::home_automation().map_err(to_js)?, false)
    }

    /// Create an interpreter from grammar DSL text.
    ///
    /// # Arguments
    /// * `grammar_dsl` - Grammar in the Hearth grammar format
    /// * `fallback` - Enable the rule-based fallback classifier
    #[wasm_bindgen]
    pub fn from_grammar(grammar_dsl: &str, fallback: bool) -> Result<WasmHearth, JsValue> {
        Self::build(Grammar::from_dsl(grammar_dsl).map_err(to_js)?, fallback)
    }

    /// Whether the grammar accepts a command.
    #[wasm_bindgen]
    pub fn check(&self, command: &str) -> bool {
        self.assistant.check(command).accepted
    }

    /// Human-readable derivation trace for a command.
    #[wasm_bindgen]
    pub fn trace_lines(&self, command: &str) -> Vec<String> {
        parse(self.assistant.grammar(), &tokenize(command)).trace.lines()
    }

    /// Handle a command and return the response as JSON.
    ///
    /// # Arguments
    /// * `command` - Raw command text
    /// * `now` - Local time as `YYYY-MM-DDTHH:MM:SS`, used for relative times
    #[wasm_bindgen]
    pub fn handle(&self, command: &str, now: &str) -> Result<String, JsValue> {
        let now: NaiveDateTime = now.parse().map_err(|e| {
            to_js(HearthError::WasmError {
                message: format!("invalid time '{}': {}", now, e),
            })
        })?;
        let response = self.assistant.handle_at(command, now);
        serde_json::to_string(&response).map_err(|e| to_js(e.into()))
    }

    /// Current device states as a JSON object.
    #[wasm_bindgen]
    pub fn devices(&self) -> Result<String, JsValue> {
        let states: serde_json::Map<String, serde_json::Value> = self
            .registry
            .devices()
            .into_iter()
            .map(|(name, state)| (name, serde_json::Value::from(state.as_str())))
            .collect();
        serde_json::to_string(&states).map_err(|e| to_js(e.into()))
    }

    /// Device class nouns the interpreter understands.
    #[wasm_bindgen]
    pub fn device_classes() -> Vec<String> {
        DeviceClass::ALL.iter().map(|c| c.noun().to_string()).collect()
    }
}

impl WasmHearth {
    fn build(grammar: Grammar, fallback: bool) -> Result<WasmHearth, JsValue> {
        let config = AssistantConfig::new().with_fallback(fallback);
        let resolver = config.device_resolver();
        let mut extractor = SemanticExtractor::new(resolver.clone()).map_err(to_js)?;
        if fallback {
            extractor = extractor
                .with_fallback(Box::new(RuleBasedClassifier::new(resolver).map_err(to_js)?));
        }

        let registry = Arc::new(InMemoryDeviceRegistry::with_home_devices());
        let services = Services::new(
            registry.clone(),
            Arc::new(MemoryEventStore::new()),
            Arc::new(RecordingTimer::new()),
        );
        Ok(WasmHearth {
            assistant: Assistant::new(grammar, extractor, services),
            registry,
        })
    }
}

fn to_js(err: HearthError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
