//! Grammar validation.

use std::collections::{HashMap, HashSet};

use super::types::Symbol;
use super::Grammar;
use crate::error::{HearthError, Result};

/// Validate a grammar for parsing.
///
/// Checks:
/// - The start symbol has a rule
/// - Every referenced nonterminal has a rule with at least one production
/// - No nonterminal can expand to itself without consuming a token
///
/// The last check is what guarantees that backtracking descent terminates,
/// so it runs here at load time rather than during a parse.
pub fn validate_grammar(grammar: &Grammar) -> Result<()> {
    if grammar.is_empty() {
        return Err(HearthError::EmptyGrammar);
    }

    if !grammar.is_nonterminal(grammar.start()) {
        return Err(HearthError::UndefinedStart {
            symbol: grammar.start().to_string(),
        });
    }

    for name in grammar.nonterminals() {
        let productions = grammar.productions(name).unwrap_or_default();
        if productions.is_empty() {
            return Err(HearthError::EmptyNonterminal {
                name: name.to_string(),
            });
        }
        for symbol in productions.iter().flat_map(|p| p.symbols()) {
            if let Symbol::Nonterminal(target) = symbol {
                if !grammar.is_nonterminal(target) {
                    return Err(HearthError::UndefinedNonterminal {
                        rule: name.to_string(),
                        symbol: target.clone(),
                    });
                }
            }
        }
    }

    let nullable = nullable_nonterminals(grammar);
    let edges = left_edges(grammar, &nullable);
    if let Some(cycle) = find_cycle(grammar, &edges) {
        return Err(HearthError::LeftRecursion {
            cycle: cycle.join(" → "),
        });
    }

    Ok(())
}

/// Nonterminals that can derive the empty string.
pub fn nullable_nonterminals(grammar: &Grammar) -> HashSet<String> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for name in grammar.nonterminals() {
            if nullable.contains(name) {
                continue;
            }
            let derives_empty = grammar
                .productions(name)
                .unwrap_or_default()
                .iter()
                .any(|production| {
                    production.symbols().iter().all(|symbol| match symbol {
                        Symbol::Nonterminal(n) => nullable.contains(n.as_str()),
                        Symbol::Terminal(_) => false,
                    })
                });
            if derives_empty {
                nullable.insert(name.to_string());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// For each nonterminal, the nonterminals it may call at the same position:
/// every nonterminal reachable in a production through a nullable prefix.
fn left_edges<'g>(
    grammar: &'g Grammar,
    nullable: &HashSet<String>,
) -> HashMap<&'g str, Vec<&'g str>> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for name in grammar.nonterminals() {
        let targets = edges.entry(name).or_default();
        for production in grammar.productions(name).unwrap_or_default() {
            for symbol in production.symbols() {
                match symbol {
                    Symbol::Nonterminal(target) => {
                        if !targets.contains(&target.as_str()) {
                            targets.push(target);
                        }
                        if !nullable.contains(target) {
                            break;
                        }
                    }
                    Symbol::Terminal(_) => break,
                }
            }
        }
    }
    edges
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Depth-first search for a cycle, reported as the path that closes it.
fn find_cycle<'g>(grammar: &'g Grammar, edges: &HashMap<&'g str, Vec<&'g str>>) -> Option<Vec<String>> {
    let mut marks: HashMap<&str, Mark> = grammar.nonterminals().map(|n| (n, Mark::Unvisited)).collect();
    let mut path = Vec::new();

    for name in grammar.nonterminals() {
        if marks.get(name) == Some(&Mark::Unvisited) {
            if let Some(cycle) = visit(name, edges, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'g>(
    name: &'g str,
    edges: &HashMap<&'g str, Vec<&'g str>>,
    marks: &mut HashMap<&'g str, Mark>,
    path: &mut Vec<&'g str>,
) -> Option<Vec<String>> {
    marks.insert(name, Mark::OnPath);
    path.push(name);

    for &next in edges.get(name).map(Vec::as_slice).unwrap_or_default() {
        match marks.get(next).copied().unwrap_or(Mark::Done) {
            Mark::OnPath => {
                let from = path.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[from..].iter().map(|n| n.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(next, edges, marks, path) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    path.pop();
    marks.insert(name, Mark::Done);
    None
}
