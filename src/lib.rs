//! # Hearth
//!
//! A grammar-checked smart home command interpreter.
//!
//! This library provides:
//! - A small DSL for writing context-free command grammars
//! - A backtracking recursive-descent parser that records a derivation trace
//! - Semantic extraction of device toggles and reminders, with a pluggable
//!   fallback classifier
//! - A dispatcher that acts on the result through a device registry, an event
//!   store and a reminder timer
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Parser for the grammar description language
//! - [`grammar`] - Grammar table representation and load-time validation
//! - [`parser`] - Tokenizer, backtracking parser and trace
//! - [`semantics`] - Intent extraction (patterns, time phrases, classifiers)
//! - [`services`] - Device registry, event stores and reminder timers
//! - [`dispatch`] - The [`Assistant`] that ties everything together
//! - [`repl`] - Console front end (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! hearth --trace turn on the kitchen fan
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hearth::config::AssistantConfig;
//! use hearth::dispatch::{Assistant, Services};
//! use hearth::services::{InMemoryDeviceRegistry, MemoryEventStore, RecordingTimer};
//!
//! let services = Services::new(
//!     Arc::new(InMemoryDeviceRegistry::with_home_devices()),
//!     Arc::new(MemoryEventStore::new()),
//!     Arc::new(RecordingTimer::new()),
//! );
//! let assistant = Assistant::from_config(&AssistantConfig::default(), services)?;
//! let response = assistant.handle("turn on the kitchen fan");
//! println!("{}", response.outcome);
//! # Ok::<(), hearth::HearthError>(())
//! ```
//!
//! ## Pipeline
//!
//! For each command:
//!
//! 1. Tokenize: lowercase, strip `. , ; ! ?`, split on whitespace
//! 2. Parse the tokens against the grammar, producing a verdict and a trace
//! 3. Independently extract an intent from the text
//! 4. Act on the intent and persist an action record
//!
//! The grammar verdict never blocks an action: a command the extractor
//! understands is carried out even if the grammar rejects it, and the
//! response reports both.

pub mod config;
pub mod dispatch;
pub mod dsl;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod semantics;
pub mod services;

#[cfg(feature = "cli")]
pub mod repl;

// Re-export main types for convenience
pub use config::AssistantConfig;
pub use dispatch::{Assistant, Outcome, Response};
pub use error::{HearthError, Result};
pub use grammar::Grammar;
pub use parser::{ParseResult, Trace};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmHearth;

/// Built-in home automation grammar
pub const HOME_GRAMMAR: &str = include_str!("grammar/home.cfg");

/// Default minimum confidence for fallback classifications
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
