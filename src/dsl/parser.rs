//! Parser for the grammar DSL.

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{HearthError, Result};

/// Parser for grammar DSL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            current: Token {
                kind: TokenKind::Newline,
                text: String::new(),
                line: 1,
                column: 1,
            },
        }
    }

    /// Parse the entire grammar description.
    pub fn parse(&mut self) -> Result<GrammarAst> {
        let mut ast = GrammarAst::new();
        self.advance()?;

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Word => {
                    let rule = self.parse_rule()?;
                    ast.rules.push(rule);
                }
                TokenKind::Pipe => {
                    // Continuation line: more alternatives for the previous rule
                    let line = self.current.line;
                    self.advance()?;
                    let alternatives = self.parse_alternatives()?;
                    let rule = ast.rules.last_mut().ok_or_else(|| {
                        HearthError::parse(line, "'|' continuation without a preceding rule")
                    })?;
                    rule.alternatives.extend(alternatives);
                }
                _ => {
                    return Err(HearthError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            self.end_of_line()?;
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(HearthError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(HearthError::parse(
                self.current.line,
                format!("unexpected {:?} at end of line", self.current.text),
            )),
        }
    }

    fn parse_directive(&mut self, ast: &mut GrammarAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.as_str() {
            "%start" => {
                let name = self.expect(TokenKind::Word)?.text;
                if ast.start.is_some() {
                    return Err(HearthError::parse(line, "duplicate %start directive"));
                }
                ast.start = Some((name, line));
            }
            _ => {
                return Err(HearthError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    fn parse_rule(&mut self) -> Result<RuleDef> {
        let name = self.expect(TokenKind::Word)?;
        self.expect(TokenKind::Arrow)?;
        let alternatives = self.parse_alternatives()?;

        Ok(RuleDef {
            name: name.text,
            alternatives,
            line: name.line,
        })
    }

    fn parse_alternatives(&mut self) -> Result<Vec<Vec<SymbolRef>>> {
        let line = self.current.line;
        let mut alternatives = Vec::new();
        let mut symbols = Vec::new();
        let mut epsilon = false;

        loop {
            match self.current.kind {
                TokenKind::Word | TokenKind::Literal => {
                    if epsilon {
                        return Err(HearthError::parse(line, "ε must stand alone"));
                    }
                    let text = self.current.text.clone();
                    symbols.push(if self.current.kind == TokenKind::Word {
                        SymbolRef::Word(text)
                    } else {
                        SymbolRef::Literal(text)
                    });
                    self.advance()?;
                }
                TokenKind::Epsilon => {
                    if epsilon || !symbols.is_empty() {
                        return Err(HearthError::parse(line, "ε must stand alone"));
                    }
                    epsilon = true;
                    self.advance()?;
                }
                TokenKind::Pipe => {
                    alternatives.push(finish_alternative(line, &mut symbols, &mut epsilon)?);
                    self.advance()?;
                }
                TokenKind::Newline | TokenKind::Eof => {
                    alternatives.push(finish_alternative(line, &mut symbols, &mut epsilon)?);
                    break;
                }
                _ => {
                    return Err(HearthError::parse(
                        line,
                        format!("unexpected {:?} in rule body", self.current.text),
                    ));
                }
            }
        }

        Ok(alternatives)
    }
}

fn finish_alternative(
    line: usize,
    symbols: &mut Vec<SymbolRef>,
    epsilon: &mut bool,
) -> Result<Vec<SymbolRef>> {
    if symbols.is_empty() && !*epsilon {
        return Err(HearthError::parse(line, "empty alternative; write ε"));
    }
    *epsilon = false;
    Ok(std::mem::take(symbols))
}
