//! Core types for grammar representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A grammar symbol.
///
/// Terminals match one input token literally; nonterminals expand through
/// the grammar table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Symbol {
    /// A literal token
    Terminal(String),
    /// A rule name
    Nonterminal(String),
}

impl Symbol {
    /// Create a terminal symbol.
    pub fn terminal(literal: impl Into<String>) -> Self {
        Self::Terminal(literal.into())
    }

    /// Create a nonterminal symbol.
    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self::Nonterminal(name.into())
    }

    /// The literal or rule name.
    pub fn name(&self) -> &str {
        match self {
            Self::Terminal(name) | Self::Nonterminal(name) => name,
        }
    }

    /// Check if this is a terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered sequence of symbols. Empty means ε.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Production(Vec<Symbol>);

impl Production {
    /// Create a production from its symbols.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    /// The empty production.
    pub fn epsilon() -> Self {
        Self(Vec::new())
    }

    /// Symbols in order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Check if this is the empty production.
    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Symbol> for Production {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("ε");
        }
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
