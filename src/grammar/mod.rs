//! Grammar table representation and validation.
//!
//! This module provides the internal representation of a command grammar
//! after the DSL has been parsed. The [`Grammar`] struct maps nonterminal
//! names to their ordered productions in a form the backtracking parser can
//! walk directly.

mod table;
mod types;
mod validate;

pub use table::{Grammar, GrammarBuilder};
pub use types::*;
pub use validate::{nullable_nonterminals, validate_grammar};
