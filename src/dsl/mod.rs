//! DSL (Domain Specific Language) parser for command grammars.
//!
//! Grammars are written in a small line-oriented BNF dialect so that the
//! command language can be edited without recompiling.
//!
//! # Grammar Overview
//!
//! ```text
//! grammar     = { line }
//! line        = comment | directive | rule | continuation | empty
//! comment     = '#' { any_char }
//! directive   = '%start' word
//! rule        = word arrow alternatives
//! continuation = '|' alternatives
//! alternatives = alternative { '|' alternative }
//! alternative = symbol { symbol } | epsilon
//!
//! arrow       = '->' | '→'
//! epsilon     = 'ε' | 'epsilon'
//! symbol      = word | '"' { any_char } '"'
//! word        = (letter | digit | '_' | '\'') { letter | digit | '_' | '\'' }
//! ```
//!
//! A bare word is a nonterminal when some rule defines it and a terminal
//! otherwise. Quoted literals are always terminals. Rules with the same name
//! append their alternatives in order. Without `%start`, the first rule names
//! the start symbol.
//!
//! # Example
//!
//! ```text
//! # Switch a device on or off
//! ACTION   -> VERB SWITCH DEVICE
//! VERB     -> turn | switch
//! SWITCH   -> on | off
//! DEVICE   -> the ROOM fan
//!           | fan
//! ROOM     -> living room | kitchen
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a grammar DSL string into an AST.
pub fn parse(input: &str) -> Result<GrammarAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    parser.parse()
}

/// Parse a grammar DSL file.
pub fn parse_file(path: &std::path::Path) -> Result<GrammarAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::HearthError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
