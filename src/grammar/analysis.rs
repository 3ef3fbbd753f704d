//! Lookahead analysis over a grammar's expression arena.
//!
//! FIRST sets and nullability drive the one-token "expects" predicate used by
//! the matcher. The same nullability feeds left-recursion detection, which
//! rejects grammars whose matching would not terminate.

use rustc_hash::FxHashSet;

use super::syntax::{Expr, ExprId, Rule, RuleId, TerminalId};

pub(super) struct FirstSets {
    pub(super) nullable: Vec<bool>,
    pub(super) first: Vec<FxHashSet<TerminalId>>,
}

/// Compute nullability and FIRST sets for every expression by fixed point.
pub(super) fn first_sets(exprs: &[Expr], rules: &[Rule]) -> FirstSets {
    let mut nullable = vec![false; exprs.len()];
    let mut first: Vec<FxHashSet<TerminalId>> = vec![FxHashSet::default(); exprs.len()];

    // Both properties only ever grow, so comparing sizes detects change.
    let mut changed = true;
    while changed {
        changed = false;
        for (index, expr) in exprs.iter().enumerate() {
            let (is_nullable, set) = match expr {
                Expr::Blank => (true, FxHashSet::default()),
                Expr::Terminal(terminal) => (false, std::iter::once(*terminal).collect()),
                Expr::NonTerminal(rule) => {
                    let body = rules[rule.index()].body().index();
                    (nullable[body], first[body].clone())
                }
                Expr::Sequence(items) => {
                    let mut set = FxHashSet::default();
                    let mut all_nullable = true;
                    for item in items {
                        set.extend(first[item.index()].iter().copied());
                        if !nullable[item.index()] {
                            all_nullable = false;
                            break;
                        }
                    }
                    (all_nullable, set)
                }
                Expr::Choice(branches) => {
                    let mut set = FxHashSet::default();
                    for branch in branches {
                        set.extend(first[branch.index()].iter().copied());
                    }
                    (branches.iter().any(|b| nullable[b.index()]), set)
                }
                Expr::Optional(body) | Expr::Multiple(body) => (true, first[body.index()].clone()),
            };

            if is_nullable != nullable[index] || set.len() != first[index].len() {
                nullable[index] = is_nullable;
                first[index] = set;
                changed = true;
            }
        }
    }

    FirstSets { nullable, first }
}

/// First rule found that can reach itself without consuming input.
pub(super) fn left_recursive_rule(exprs: &[Expr], rules: &[Rule], nullable: &[bool]) -> Option<RuleId> {
    let edges: Vec<Vec<RuleId>> = rules
        .iter()
        .map(|rule| {
            let mut out = Vec::new();
            left_edge(exprs, nullable, rule.body(), &mut out);
            out
        })
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit(rule: RuleId, edges: &[Vec<RuleId>], marks: &mut [Mark]) -> Option<RuleId> {
        match marks[rule.index()] {
            Mark::InProgress => return Some(rule),
            Mark::Done => return None,
            Mark::Unvisited => {}
        }
        marks[rule.index()] = Mark::InProgress;
        for &next in &edges[rule.index()] {
            if let Some(found) = visit(next, edges, marks) {
                return Some(found);
            }
        }
        marks[rule.index()] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; rules.len()];
    (0..rules.len()).find_map(|index| visit(RuleId::new(index), &edges, &mut marks))
}

/// Rules that may be entered at the left edge of `id`.
fn left_edge(exprs: &[Expr], nullable: &[bool], id: ExprId, out: &mut Vec<RuleId>) {
    match &exprs[id.index()] {
        Expr::NonTerminal(rule) => out.push(*rule),
        Expr::Sequence(items) => {
            for item in items {
                left_edge(exprs, nullable, *item, out);
                if !nullable[item.index()] {
                    break;
                }
            }
        }
        Expr::Choice(branches) => {
            for branch in branches {
                left_edge(exprs, nullable, *branch, out);
            }
        }
        Expr::Optional(body) | Expr::Multiple(body) => left_edge(exprs, nullable, *body, out),
        Expr::Terminal(_) | Expr::Blank => {}
    }
}
