//! Error types for the Hearth command interpreter.
//!
//! This module provides a unified error type [`HearthError`] that covers
//! grammar DSL parsing, grammar validation, semantic extraction, command
//! dispatch and the I/O performed by the bundled collaborators.
//!
//! Command-level failures (a rejected parse, an unknown device, a time phrase
//! that cannot be resolved) are never fatal: the dispatcher reports them to
//! the caller inside a rejected [`Outcome`](crate::dispatch::Outcome).

use thiserror::Error;

use crate::parser::Trace;

/// Result type alias using [`HearthError`].
pub type Result<T> = std::result::Result<T, HearthError>;

/// Unified error type for all Hearth operations.
#[derive(Error, Debug)]
pub enum HearthError {
    // ============ Grammar DSL Errors ============
    /// Error during lexical analysis of a grammar file
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error while parsing a grammar file
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    // ============ Grammar Validation Errors ============
    /// Grammar defines no rules at all
    #[error("Grammar has no rules")]
    EmptyGrammar,

    /// Start symbol has no rule
    #[error("Start symbol '{symbol}' has no rule")]
    UndefinedStart { symbol: String },

    /// A production references a nonterminal that has no rule
    #[error("Rule '{rule}' references undefined nonterminal '{symbol}'")]
    UndefinedNonterminal { rule: String, symbol: String },

    /// A nonterminal was declared without any production
    #[error("Nonterminal '{name}' has no productions")]
    EmptyNonterminal { name: String },

    /// A nonterminal can reach itself without consuming input
    #[error("Left-recursive cycle without consuming input: {cycle}")]
    LeftRecursion { cycle: String },

    // ============ Command Errors ============
    /// Token sequence was rejected by the grammar
    #[error("Command does not match the grammar (consumed {consumed} of {length} tokens)")]
    GrammarMismatch {
        consumed: usize,
        length: usize,
        trace: Trace,
    },

    /// A device was mentioned but no room could be determined for it
    #[error("Device '{device}' mentioned without a room and no default room is configured")]
    UnresolvedDevice { device: String },

    /// Device name is not known to the registry
    #[error("Unknown device '{name}'")]
    UnknownDevice { name: String },

    /// Time or duration phrase is not in a recognized form
    #[error("Cannot resolve time expression '{phrase}'")]
    AmbiguousTimeExpression { phrase: String },

    /// Neither the grammar nor the extractor produced an actionable intent
    #[error("No grammatical or semantic match")]
    Unrecognized { trace: Trace },

    // ============ Configuration Errors ============
    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Built-in extraction pattern failed to compile
    #[error("Invalid extraction pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // ============ I/O Errors ============
    /// Error reading a grammar or configuration file
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to the event store
    #[error("Event store error for '{path}': {source}")]
    EventStoreError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error serializing a record or response
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reading commands or writing results on the console
    #[error("Console error: {message}")]
    ConsoleError { message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl HearthError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an ambiguous time expression error
    pub fn ambiguous_time(phrase: impl Into<String>) -> Self {
        Self::AmbiguousTimeExpression {
            phrase: phrase.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Short, stable reason shown to users when a command is rejected.
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            Self::UnresolvedDevice { .. } | Self::UnknownDevice { .. } => "unknown device",
            Self::AmbiguousTimeExpression { .. } => "ambiguous time expression",
            Self::GrammarMismatch { .. } | Self::Unrecognized { .. } => {
                "no grammatical or semantic match"
            }
            _ => "internal error",
        }
    }

    /// Parser trace attached to this error, if any.
    pub fn trace(&self) -> Option<&Trace> {
        match self {
            Self::GrammarMismatch { trace, .. } | Self::Unrecognized { trace } => Some(trace),
            _ => None,
        }
    }
}
