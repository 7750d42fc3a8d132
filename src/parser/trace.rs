//! Derivation trace recorded during a parse.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grammar::Production;

/// One step of the backtracking search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A nonterminal started trying one of its productions
    Expand {
        symbol: String,
        production: Production,
    },
    /// A terminal matched the token at the current position
    MatchTerminal { symbol: String },
    /// A terminal did not match; `found` is `None` at end of input
    MismatchTerminal {
        symbol: String,
        found: Option<String>,
    },
    /// A production failed and its position was restored
    Backtrack {
        symbol: String,
        production: Production,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expand { symbol, production } => {
                write!(f, "Expanding {} → {}", symbol, production)
            }
            Self::MatchTerminal { symbol } => write!(f, "Matched '{}'", symbol),
            Self::MismatchTerminal { symbol, found } => write!(
                f,
                "Expected '{}', got '{}'",
                symbol,
                found.as_deref().unwrap_or("EOF")
            ),
            Self::Backtrack { symbol, production } => {
                write!(f, "Backtrack on {} → {}", symbol, production)
            }
        }
    }
}

/// Ordered log of trace events.
///
/// Events are only ever appended; the log is never reordered or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Events in temporal order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Iterate over the events.
    pub fn iter(&self) -> std::slice::Iter<'_, TraceEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the trace is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of backtrack events.
    pub fn backtracks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Backtrack { .. }))
            .count()
    }

    /// Terminals of the derivation that survived the search, in order.
    ///
    /// Replays the log: a match inside a production that later backtracks is
    /// discarded, so for an accepted parse this spells out the input tokens.
    pub fn derived_terminals(&self) -> Vec<&str> {
        struct Frame {
            len: usize,
            next: usize,
            start: usize,
        }

        fn complete(stack: &mut Vec<Frame>) {
            while stack.last().is_some_and(|top| top.next >= top.len) {
                stack.pop();
                match stack.last_mut() {
                    Some(parent) => parent.next += 1,
                    None => break,
                }
            }
        }

        let mut stack: Vec<Frame> = Vec::new();
        let mut matched: Vec<&str> = Vec::new();
        for event in &self.events {
            match event {
                TraceEvent::Expand { production, .. } => {
                    stack.push(Frame {
                        len: production.symbols().len(),
                        next: 0,
                        start: matched.len(),
                    });
                    complete(&mut stack);
                }
                TraceEvent::MatchTerminal { symbol } => {
                    matched.push(symbol);
                    if let Some(top) = stack.last_mut() {
                        top.next += 1;
                    }
                    complete(&mut stack);
                }
                TraceEvent::MismatchTerminal { .. } => {}
                TraceEvent::Backtrack { .. } => {
                    if let Some(frame) = stack.pop() {
                        matched.truncate(frame.start);
                    }
                }
            }
        }
        matched
    }

    /// Render one human-readable line per event.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceEvent;
    type IntoIter = std::slice::Iter<'a, TraceEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol;

    #[test]
    fn test_event_display() {
        let production = Production::new(vec![Symbol::nonterminal("VERB"), Symbol::terminal("on")]);
        let expand = TraceEvent::Expand {
            symbol: "ACTION".to_string(),
            production: production.clone(),
        };
        assert_eq!(expand.to_string(), "Expanding ACTION → VERB on");

        let eof = TraceEvent::MismatchTerminal {
            symbol: "fan".to_string(),
            found: None,
        };
        assert_eq!(eof.to_string(), "Expected 'fan', got 'EOF'");

        let backtrack = TraceEvent::Backtrack {
            symbol: "OPT".to_string(),
            production: Production::epsilon(),
        };
        assert_eq!(backtrack.to_string(), "Backtrack on OPT → ε");
    }

    #[test]
    fn test_trace_json() {
        let mut trace = Trace::new();
        trace.push(TraceEvent::MatchTerminal {
            symbol: "turn".to_string(),
        });
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "event": "match_terminal", "symbol": "turn" }])
        );
    }
}
