//! Backtracking command parser.
//!
//! This module checks a tokenized command against a [`Grammar`] and records
//! every step of the search.
//!
//! ## Algorithm
//!
//! `evaluate(symbol, position)` is defined recursively:
//!
//! 1. A terminal succeeds and advances by one iff the token at `position`
//!    equals its literal.
//! 2. A nonterminal tries its productions in declared order. Each attempt
//!    threads the position through its members; on the first failing member
//!    the attempt is abandoned, the position restored and the next production
//!    tried. The first production to succeed wins.
//! 3. If every production fails, the nonterminal fails at its original
//!    position.
//!
//! A command is accepted only if the start symbol succeeds *and* consumes
//! every token. Every expansion, terminal match, mismatch and backtrack is
//! appended to a [`Trace`] as it happens, so the trace for a given grammar
//! and input is reproducible exactly.
//!
//! [`Grammar`]: crate::grammar::Grammar

mod backtrack;
mod tokenizer;
mod trace;

pub use backtrack::{parse, parse_from, ParseResult};
pub use tokenizer::{normalize, tokenize, STRIPPED_PUNCTUATION};
pub use trace::{Trace, TraceEvent};
