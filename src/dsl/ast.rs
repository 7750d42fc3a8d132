//! Abstract Syntax Tree types for the grammar DSL.

/// Complete AST representation of a parsed grammar file.
#[derive(Debug, Clone, Default)]
pub struct GrammarAst {
    /// Explicit start symbol from a `%start` directive, with its line
    pub start: Option<(String, usize)>,
    /// Rule definitions in declaration order
    pub rules: Vec<RuleDef>,
}

impl GrammarAst {
    /// Create a new empty grammar AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all rules, in first-declaration order, without duplicates.
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !names.contains(&rule.name.as_str()) {
                names.push(&rule.name);
            }
        }
        names
    }
}

/// A rule line: a left-hand side and its ordered alternatives.
#[derive(Debug, Clone)]
pub struct RuleDef {
    /// Left-hand side name
    pub name: String,
    /// Alternatives in declared order; an empty alternative is ε
    pub alternatives: Vec<Vec<SymbolRef>>,
    /// Source line number for error reporting
    pub line: usize,
}

/// A symbol as written, before terminals and nonterminals are told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    /// Bare word: a nonterminal if some rule defines it, otherwise a terminal
    Word(String),
    /// Quoted literal: always a terminal
    Literal(String),
}

impl SymbolRef {
    /// The written text of the symbol.
    pub fn text(&self) -> &str {
        match self {
            Self::Word(text) | Self::Literal(text) => text,
        }
    }
}
