//! Backtracking recursive-descent recognizer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trace::{Trace, TraceEvent};
use crate::grammar::{Grammar, Symbol};

/// Outcome of checking one token sequence against a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// True iff the start symbol matched and every token was consumed
    pub accepted: bool,
    /// Position reached by the start symbol (never past the last token)
    pub consumed: usize,
    /// Search log in temporal order
    pub trace: Trace,
}

/// Parse from the grammar's start symbol.
pub fn parse(grammar: &Grammar, tokens: &[String]) -> ParseResult {
    parse_from(grammar, grammar.start(), tokens)
}

/// Parse from an explicit start symbol.
///
/// `start` is resolved by table membership: a name the grammar does not
/// define is treated as a single terminal.
///
/// Alternatives are tried in declared order and the first production that
/// succeeds is kept; a later failure never reopens an earlier choice. There
/// is no memoization, so the worst case is exponential in the input length.
/// The grammars this crate targets are small and fixed, and a chart parser
/// would not reproduce this trace.
pub fn parse_from(grammar: &Grammar, start: &str, tokens: &[String]) -> ParseResult {
    let recognizer = Recognizer { grammar, tokens };
    let mut trace = Trace::new();
    let symbol = grammar.symbol(start);

    let (matched, consumed) = match recognizer.evaluate(&symbol, 0, &mut trace) {
        Some(position) => (true, position),
        None => (false, 0),
    };
    let accepted = matched && consumed == tokens.len();

    debug!(
        start,
        tokens = tokens.len(),
        consumed,
        accepted,
        events = trace.len(),
        backtracks = trace.backtracks(),
        "parsed token sequence"
    );

    ParseResult {
        accepted,
        consumed,
        trace,
    }
}

struct Recognizer<'g, 't> {
    grammar: &'g Grammar,
    tokens: &'t [String],
}

impl Recognizer<'_, '_> {
    /// Match `symbol` at `position`, returning the position after it.
    fn evaluate(&self, symbol: &Symbol, position: usize, trace: &mut Trace) -> Option<usize> {
        match symbol {
            Symbol::Terminal(literal) => self.match_terminal(literal, position, trace),
            Symbol::Nonterminal(name) => self.expand(name, position, trace),
        }
    }

    fn match_terminal(&self, literal: &str, position: usize, trace: &mut Trace) -> Option<usize> {
        match self.tokens.get(position) {
            Some(token) if token == literal => {
                trace.push(TraceEvent::MatchTerminal {
                    symbol: literal.to_string(),
                });
                Some(position + 1)
            }
            found => {
                trace.push(TraceEvent::MismatchTerminal {
                    symbol: literal.to_string(),
                    found: found.cloned(),
                });
                None
            }
        }
    }

    fn expand(&self, name: &str, position: usize, trace: &mut Trace) -> Option<usize> {
        for production in self.grammar.productions(name).unwrap_or_default() {
            trace.push(TraceEvent::Expand {
                symbol: name.to_string(),
                production: production.clone(),
            });

            let mut cursor = Some(position);
            for member in production.symbols() {
                cursor = cursor.and_then(|at| self.evaluate(member, at, trace));
                if cursor.is_none() {
                    break;
                }
            }

            if let Some(end) = cursor {
                return Some(end);
            }

            trace.push(TraceEvent::Backtrack {
                symbol: name.to_string(),
                production: production.clone(),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grammar::Production;
    use crate::parser::tokenize;

    fn home() -> Grammar {
        Grammar::home_automation().unwrap()
    }

    fn check(grammar: &Grammar, text: &str) -> ParseResult {
        parse(grammar, &tokenize(text))
    }

    #[test]
    fn test_accepts_device_commands() {
        let grammar = home();
        for command in [
            "turn on the living room lights",
            "turn off the kitchen fan",
            "switch off the bathroom lights",
            "turn off all lights",
            "switch on the heater in bedroom",
            "turn off the light in kitchen",
            "turn on the air conditioner in living room",
            "turn on fan",
        ] {
            let result = check(&grammar, command);
            assert!(result.accepted, "expected '{}' to be accepted", command);
        }
    }

    #[test]
    fn test_accepts_schedule_commands() {
        let grammar = home();
        for command in [
            "remind me to take medicine at 3 pm",
            "schedule a water the plants after 2 hours",
            "set alarm for meeting with team tomorrow at 9 am",
            "set an alarm for read the book in 30 minutes",
        ] {
            assert!(check(&grammar, command).accepted, "expected '{}' to be accepted", command);
        }
    }

    #[test]
    fn test_rejects_malformed_commands() {
        let grammar = home();
        for command in [
            "switch on the lights in garden",
            "turn off all heater",
            "remind me to take medicine",
            "",
        ] {
            assert!(!check(&grammar, command).accepted, "expected '{}' to be rejected", command);
        }
    }

    #[test]
    fn test_malformed_word_order_backtracks() {
        let result = check(&home(), "turn living on lights");
        assert!(!result.accepted);
        assert!(!result.trace.is_empty());
        assert!(result.trace.backtracks() >= 1);
        assert!(result.trace.iter().any(|e| matches!(
            e,
            TraceEvent::MismatchTerminal { symbol, found: Some(found) }
                if symbol == "on" && found == "living"
        )));
    }

    #[test]
    fn test_matched_terminals_reconstruct_input() {
        let grammar = home();
        for command in [
            "turn on the kitchen fan",
            "switch on the heater in bedroom",
            "remind me to take medicine at 3 pm",
        ] {
            let tokens = tokenize(command);
            let result = parse(&grammar, &tokens);
            assert!(result.accepted);
            assert_eq!(result.consumed, tokens.len());
            assert_eq!(
                result.trace.derived_terminals(),
                tokens.iter().map(String::as_str).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let grammar = home();
        let tokens = tokenize("turn on the air conditioner in living room");
        assert_eq!(parse(&grammar, &tokens), parse(&grammar, &tokens));
    }

    #[test]
    fn test_first_match_wins() {
        // Both alternatives of X match "a"; the first must be chosen.
        let grammar = Grammar::from_dsl("S -> X\nX -> A | B\nA -> a\nB -> a").unwrap();
        let result = parse(&grammar, &tokenize("a"));
        assert!(result.accepted);

        let expanded: Vec<&str> = result
            .trace
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Expand { symbol, .. } => Some(symbol.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(expanded, vec!["S", "X", "A"]);
    }

    #[test]
    fn test_prefix_match_is_rejected() {
        // X commits to "a" and never retries "a b" once it has succeeded.
        let grammar = Grammar::from_dsl("S -> X\nX -> a | a b").unwrap();
        let result = parse(&grammar, &tokenize("a b"));
        assert!(!result.accepted);
        assert_eq!(result.consumed, 1);
    }

    #[test]
    fn test_exact_trace() {
        let grammar = Grammar::from_dsl("S -> OPT x\nOPT -> y | ε").unwrap();
        let result = parse(&grammar, &tokenize("x"));
        assert!(result.accepted);

        let y = Production::new(vec![Symbol::terminal("y")]);
        let expected = vec![
            TraceEvent::Expand {
                symbol: "S".to_string(),
                production: Production::new(vec![Symbol::nonterminal("OPT"), Symbol::terminal("x")]),
            },
            TraceEvent::Expand {
                symbol: "OPT".to_string(),
                production: y.clone(),
            },
            TraceEvent::MismatchTerminal {
                symbol: "y".to_string(),
                found: Some("x".to_string()),
            },
            TraceEvent::Backtrack {
                symbol: "OPT".to_string(),
                production: y,
            },
            TraceEvent::Expand {
                symbol: "OPT".to_string(),
                production: Production::epsilon(),
            },
            TraceEvent::MatchTerminal {
                symbol: "x".to_string(),
            },
        ];
        assert_eq!(result.trace.events(), expected.as_slice());
    }

    #[test]
    fn test_backtrack_pairs_with_expand() {
        let result = check(&home(), "turn on the kitchen fan please");
        assert!(!result.accepted);

        // Every Backtrack undoes the latest Expand of the same rule.
        let events = result.trace.events();
        for (i, event) in events.iter().enumerate() {
            if let TraceEvent::Backtrack { symbol, production } = event {
                let opened = events[..i].iter().rev().find_map(|e| match e {
                    TraceEvent::Expand {
                        symbol: s,
                        production: p,
                    } if s == symbol => Some(p),
                    _ => None,
                });
                assert_eq!(opened, Some(production));
            }
        }
    }

    #[test]
    fn test_terminal_start_and_empty_input() {
        let grammar = Grammar::from_dsl("S -> ε").unwrap();
        assert!(parse(&grammar, &[]).accepted);
        assert!(!parse(&grammar, &tokenize("x")).accepted);

        let result = parse_from(&grammar, "hello", &tokenize("hello"));
        assert!(result.accepted);
        assert_eq!(result.consumed, 1);
    }
}
