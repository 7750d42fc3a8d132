//! Grammar table structure.

use std::collections::HashMap;
use std::fmt;

use super::types::{Production, Symbol};
use super::validate::validate_grammar;
use crate::dsl::{self, GrammarAst, SymbolRef};
use crate::error::{HearthError, Result};

/// A validated context-free grammar.
///
/// Maps each nonterminal to its productions in declared order. A `Grammar`
/// can only be obtained through [`GrammarBuilder::build`] or the DSL loaders,
/// both of which run load-time validation, so every value is free of
/// undefined references and left-recursive cycles.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Start symbol name
    start: String,
    /// Productions keyed by nonterminal name
    rules: HashMap<String, Vec<Production>>,
    /// Nonterminal names in declaration order (for display and validation)
    order: Vec<String>,
}

impl Grammar {
    /// Start building a grammar with the given start symbol.
    pub fn builder(start: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder::new(start)
    }

    /// Build a grammar from a parsed AST.
    pub fn from_ast(ast: GrammarAst) -> Result<Self> {
        let names = ast.rule_names();
        let start = match &ast.start {
            Some((name, _)) => name.clone(),
            None => names
                .first()
                .map(|name| name.to_string())
                .ok_or(HearthError::EmptyGrammar)?,
        };

        let mut builder = GrammarBuilder::new(start);
        for rule in &ast.rules {
            let productions = rule
                .alternatives
                .iter()
                .map(|alternative| {
                    alternative
                        .iter()
                        .map(|symbol| match symbol {
                            SymbolRef::Word(word) if names.contains(&word.as_str()) => {
                                Symbol::nonterminal(word.as_str())
                            }
                            other => Symbol::terminal(other.text()),
                        })
                        .collect()
                })
                .collect();
            builder = builder.rule(rule.name.as_str(), productions);
        }

        builder.build()
    }

    /// Parse and validate a grammar written in the DSL.
    pub fn from_dsl(input: &str) -> Result<Self> {
        Self::from_ast(dsl::parse(input)?)
    }

    /// Load and validate a grammar file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        Self::from_ast(dsl::parse_file(path)?)
    }

    /// The built-in home automation grammar.
    pub fn home_automation() -> Result<Self> {
        Self::from_dsl(crate::HOME_GRAMMAR)
    }

    /// Start symbol name.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Productions for a nonterminal, in declared order.
    pub fn productions(&self, name: &str) -> Option<&[Production]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    /// Check if a name is defined by the table.
    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Resolve a name to a symbol by table membership.
    pub fn symbol(&self, name: &str) -> Symbol {
        if self.is_nonterminal(name) {
            Symbol::nonterminal(name)
        } else {
            Symbol::terminal(name)
        }
    }

    /// Nonterminal names in declaration order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of nonterminals.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the grammar has no rules.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "%start {}", self.start)?;
        for name in &self.order {
            let productions = self.rules.get(name).map(Vec::as_slice).unwrap_or_default();
            write!(f, "{} ->", name)?;
            for (i, production) in productions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                for symbol in production.symbols() {
                    match symbol {
                        Symbol::Nonterminal(name) => write!(f, " {}", name)?,
                        Symbol::Terminal(literal) => write!(f, " \"{}\"", literal)?,
                    }
                }
                if production.is_epsilon() {
                    write!(f, " ε")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Incremental constructor for [`Grammar`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    start: String,
    rules: HashMap<String, Vec<Production>>,
    order: Vec<String>,
}

impl GrammarBuilder {
    /// Create a builder with the given start symbol.
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            rules: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Append productions for a nonterminal.
    ///
    /// Calling this twice for the same name appends to the existing list.
    pub fn rule(mut self, name: impl Into<String>, productions: Vec<Production>) -> Self {
        let name = name.into();
        if !self.rules.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.rules.entry(name).or_default().extend(productions);
        self
    }

    /// Validate and produce the grammar.
    pub fn build(self) -> Result<Grammar> {
        let grammar = Grammar {
            start: self.start,
            rules: self.rules,
            order: self.order,
        };
        validate_grammar(&grammar)?;
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dsl_classifies_symbols() {
        let grammar = Grammar::from_dsl("S -> VERB fan\nVERB -> turn | \"VERB\"").unwrap();
        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.len(), 2);

        let s = grammar.productions("S").unwrap();
        assert_eq!(
            s[0].symbols(),
            &[Symbol::nonterminal("VERB"), Symbol::terminal("fan")]
        );

        // Quoted literal stays a terminal even when it spells a rule name
        let verb = grammar.productions("VERB").unwrap();
        assert_eq!(verb[1].symbols(), &[Symbol::terminal("VERB")]);
    }

    #[test]
    fn test_explicit_start_and_append() {
        let grammar = Grammar::from_dsl("A -> a\n%start B\nB -> A\nB -> b").unwrap();
        assert_eq!(grammar.start(), "B");
        assert_eq!(grammar.productions("B").unwrap().len(), 2);
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_symbol_resolution() {
        let grammar = Grammar::from_dsl("S -> x").unwrap();
        assert_eq!(grammar.symbol("S"), Symbol::nonterminal("S"));
        assert_eq!(grammar.symbol("x"), Symbol::terminal("x"));
    }

    #[test]
    fn test_empty_grammar() {
        assert!(matches!(
            Grammar::from_dsl("# nothing here\n"),
            Err(HearthError::EmptyGrammar)
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let grammar = Grammar::from_dsl("S -> A \"6\" | ε\nA -> a").unwrap();
        let text = grammar.to_string();
        let reparsed = Grammar::from_dsl(&text).unwrap();
        assert_eq!(reparsed.productions("S"), grammar.productions("S"));
    }

    #[test]
    fn test_home_grammar_loads() {
        let grammar = Grammar::home_automation().unwrap();
        assert_eq!(grammar.start(), "COMMAND");
        assert!(grammar.is_nonterminal("SCHEDULE"));
        assert!(!grammar.is_nonterminal("kitchen"));
    }
}
