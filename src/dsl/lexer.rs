//! Lexer (tokenizer) for the grammar DSL.

use crate::error::{HearthError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text (quotes stripped for literals)
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A bare word (nonterminal name or terminal literal)
    Word,
    /// A double-quoted literal, always a terminal
    Literal,
    /// The empty production marker `ε` or `epsilon`
    Epsilon,
    /// A directive (starts with '%')
    Directive,
    /// Rule arrow `->` or `→`
    Arrow,
    /// Alternative separator `|`
    Pipe,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing grammar DSL input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text: &str| Token {
            kind,
            text: text.to_string(),
            line,
            column,
        };

        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(token(TokenKind::Eof, "")),
        };

        match ch {
            '\n' => {
                self.advance();
                Ok(token(TokenKind::Newline, "\n"))
            }
            '|' => {
                self.advance();
                Ok(token(TokenKind::Pipe, "|"))
            }
            '→' => {
                self.advance();
                Ok(token(TokenKind::Arrow, "->"))
            }
            'ε' => {
                self.advance();
                Ok(token(TokenKind::Epsilon, "ε"))
            }
            '-' => {
                self.advance();
                if self.chars.peek() == Some(&'>') {
                    self.advance();
                    Ok(token(TokenKind::Arrow, "->"))
                } else {
                    Err(HearthError::lexer(line, column, "expected '>' after '-'"))
                }
            }
            '%' => {
                self.advance();
                let text = self.read_word();
                if text.is_empty() {
                    return Err(HearthError::lexer(line, column, "empty directive"));
                }
                Ok(token(TokenKind::Directive, &format!("%{}", text)))
            }
            '"' => {
                self.advance();
                let text = self.read_literal(line, column)?;
                Ok(token(TokenKind::Literal, &text))
            }
            _ if is_word_char(ch) => {
                let text = self.read_word();
                if text == "epsilon" {
                    Ok(token(TokenKind::Epsilon, "ε"))
                } else {
                    Ok(token(TokenKind::Word, &text))
                }
            }
            _ => Err(HearthError::lexer(
                line,
                column,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' {
                // Skip comment until end of line
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if is_word_char(ch) {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_literal(&mut self, line: usize, column: usize) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.chars.peek().copied() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\n') | None => {
                    return Err(HearthError::lexer(line, column, "unterminated literal"));
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
        if text.is_empty() {
            return Err(HearthError::lexer(
                line,
                column,
                "empty literal; use ε for the empty production",
            ));
        }
        Ok(text)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let done = tok.kind == TokenKind::Eof;
            kinds.push(tok.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn test_lexer_rule() {
        let mut lexer = Lexer::new("VERB -> turn | switch");

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Word);
        assert_eq!(tok.text, "VERB");

        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Arrow);

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, "turn");
        assert_eq!(tok.column, 9);
    }

    #[test]
    fn test_lexer_unicode_arrow_and_epsilon() {
        assert_eq!(
            kinds("A → x | ε\n"),
            vec![
                TokenKind::Word,
                TokenKind::Arrow,
                TokenKind::Word,
                TokenKind::Pipe,
                TokenKind::Epsilon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("A -> epsilon")[2], TokenKind::Epsilon);
    }

    #[test]
    fn test_lexer_comments_and_directives() {
        let mut lexer = Lexer::new("# header\n%start COMMAND # trailing");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Directive);
        assert_eq!(tok.text, "%start");
        assert_eq!(tok.line, 2);

        assert_eq!(lexer.next_token().unwrap().text, "COMMAND");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lexer_literal() {
        let mut lexer = Lexer::new("TIME -> \"6\" \"p.m.\"");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Literal);
        assert_eq!(tok.text, "6");

        assert_eq!(lexer.next_token().unwrap().text, "p.m.");
    }

    #[test]
    fn test_lexer_errors() {
        let mut lexer = Lexer::new("A -> \"open");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        match lexer.next_token() {
            Err(HearthError::LexerError { line, column, .. }) => {
                assert_eq!((line, column), (1, 6));
            }
            other => panic!("expected lexer error, got {:?}", other),
        }

        assert!(Lexer::new("A - x").nth_error(2));
        assert!(Lexer::new("A -> $").nth_error(3));
    }

    impl Lexer<'_> {
        /// True if the `n`th token (1-indexed) fails to lex.
        fn nth_error(&mut self, n: usize) -> bool {
            for _ in 1..n {
                if self.next_token().is_err() {
                    return false;
                }
            }
            self.next_token().is_err()
        }
    }
}
