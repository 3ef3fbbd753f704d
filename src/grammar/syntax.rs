//! Compiled grammar representation.
//!
//! A [`Grammar`] is an arena of expressions. Every rule body and every nested
//! sub-expression gets an [`ExprId`], and the lookahead sets computed at compile
//! time are indexed by the same id. Terminals live in their own table and are
//! shared by every expression that refers to them.

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::{Anchored, Input, MatchKind};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::analysis;
use super::error::GrammarCompileError;
use super::lexer::{Token, TokenKind};

// ============================================================================
// IDS
// ============================================================================

/// Index of a terminal in its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(u32);

/// Index of a rule (non-terminal) in its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

/// Index of an expression in its grammar's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

macro_rules! impl_index {
    ($($ty:ident),*) => {$(
        impl $ty {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

impl_index!(TerminalId, RuleId, ExprId);

// ============================================================================
// TERMINALS
// ============================================================================

/// What a terminal matches.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    /// `source` is the pattern as written. The DFA reports every match, so an
    /// anchored search ends at the longest one.
    Regex { source: String, dfa: dense::DFA<Vec<u32>> },
}

#[derive(Debug, Clone)]
pub struct Terminal {
    name: SmolStr,
    pattern: Pattern,
}

impl Terminal {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.pattern, Pattern::Literal(_))
    }

    /// Length in bytes of the longest non-empty match at the start of `input`.
    pub fn match_len(&self, input: &str) -> Option<usize> {
        match &self.pattern {
            Pattern::Literal(literal) => {
                (!literal.is_empty() && input.starts_with(literal.as_str())).then(|| literal.len())
            }
            Pattern::Regex { dfa, .. } => dfa
                .try_search_fwd(&Input::new(input).anchored(Anchored::Yes))
                .ok()
                .flatten()
                .map(|end| end.offset())
                .filter(|&len| len > 0),
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Sequence(Vec<ExprId>),
    /// Alternatives, tried in order.
    Choice(Vec<ExprId>),
    Optional(ExprId),
    /// Zero or more repetitions.
    Multiple(ExprId),
    Terminal(TerminalId),
    NonTerminal(RuleId),
    /// Matches nothing and consumes nothing.
    Blank,
}

#[derive(Debug, Clone)]
pub struct Rule {
    name: SmolStr,
    body: ExprId,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> ExprId {
        self.body
    }
}

/// One-token lookahead verdict of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The token can start the expression.
    Accept,
    /// The token cannot start it, but the expression may match nothing.
    SkippableReject,
    /// The expression cannot match here.
    HardReject,
}

// ============================================================================
// GRAMMAR
// ============================================================================

/// An immutable, compiled grammar.
///
/// The first rule of the description is the start rule. Build one with
/// [`Grammar::compile`].
#[derive(Debug, Clone)]
pub struct Grammar {
    terminals: Vec<Terminal>,
    rules: Vec<Rule>,
    exprs: Vec<Expr>,
    nullable: Vec<bool>,
    first: Vec<FxHashSet<TerminalId>>,
    rule_names: FxHashMap<SmolStr, RuleId>,
}

impl Grammar {
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_def(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rule_names.get(name).copied()
    }

    pub fn start_rule(&self) -> RuleId {
        RuleId::new(0)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn is_nullable(&self, id: ExprId) -> bool {
        self.nullable[id.index()]
    }

    /// Terminals that can begin a match of `id`.
    pub fn first_set(&self, id: ExprId) -> &FxHashSet<TerminalId> {
        &self.first[id.index()]
    }

    /// Lookahead verdict for `id` given the next token (`None` at end of input).
    pub fn expects(&self, id: ExprId, token: Option<&Token>) -> Expectation {
        let accepted = match token.map(|t| t.kind) {
            Some(TokenKind::Terminal(terminal)) => self.first[id.index()].contains(&terminal),
            Some(TokenKind::Unknown) | None => false,
        };
        if accepted {
            Expectation::Accept
        } else if self.nullable[id.index()] {
            Expectation::SkippableReject
        } else {
            Expectation::HardReject
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Incremental construction of a [`Grammar`].
///
/// Rules are declared before they are defined so that bodies can refer to rules
/// that appear later in the description.
#[derive(Debug, Default)]
pub(crate) struct GrammarBuilder {
    terminals: Vec<Terminal>,
    terminal_names: FxHashMap<SmolStr, TerminalId>,
    rules: Vec<(SmolStr, Option<ExprId>)>,
    rule_names: FxHashMap<SmolStr, RuleId>,
    exprs: Vec<Expr>,
}

impl GrammarBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn literal(
        &mut self,
        name: &str,
        literal: &str,
        line: u32,
    ) -> Result<TerminalId, GrammarCompileError> {
        self.add_terminal(name, Pattern::Literal(literal.to_string()), line)
    }

    pub(crate) fn regex(
        &mut self,
        name: &str,
        source: &str,
        line: u32,
    ) -> Result<TerminalId, GrammarCompileError> {
        let dfa = dense::DFA::builder()
            .configure(
                dense::DFA::config()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .build(source)
            .map_err(|error| GrammarCompileError::InvalidRegex {
                name: name.to_string(),
                line,
                source: Box::new(error),
            })?;
        self.add_terminal(
            name,
            Pattern::Regex {
                source: source.to_string(),
                dfa,
            },
            line,
        )
    }

    fn add_terminal(
        &mut self,
        name: &str,
        pattern: Pattern,
        line: u32,
    ) -> Result<TerminalId, GrammarCompileError> {
        if self.terminal_names.contains_key(name) {
            return Err(GrammarCompileError::DuplicateTerminal {
                name: name.to_string(),
                line,
            });
        }
        let id = TerminalId::new(self.terminals.len());
        let name = SmolStr::new(name);
        self.terminal_names.insert(name.clone(), id);
        self.terminals.push(Terminal { name, pattern });
        Ok(id)
    }

    /// Terminal for an inline literal, reusing any literal terminal with the same value.
    pub(crate) fn literal_terminal(&mut self, value: &str) -> TerminalId {
        let existing = self.terminals.iter().position(|terminal| {
            matches!(&terminal.pattern, Pattern::Literal(literal) if literal == value)
        });
        if let Some(index) = existing {
            return TerminalId::new(index);
        }
        let id = TerminalId::new(self.terminals.len());
        let name = SmolStr::new(format!("'{value}'"));
        self.terminal_names.insert(name.clone(), id);
        self.terminals.push(Terminal {
            name,
            pattern: Pattern::Literal(value.to_string()),
        });
        id
    }

    pub(crate) fn terminal_named(&self, name: &str) -> Option<TerminalId> {
        self.terminal_names.get(name).copied()
    }

    pub(crate) fn declare_rule(&mut self, name: &str, line: u32) -> Result<RuleId, GrammarCompileError> {
        if self.rule_names.contains_key(name) || self.terminal_names.contains_key(name) {
            return Err(GrammarCompileError::DuplicateNonTerminal {
                name: name.to_string(),
                line,
            });
        }
        let id = RuleId::new(self.rules.len());
        let name = SmolStr::new(name);
        self.rule_names.insert(name.clone(), id);
        self.rules.push((name, None));
        Ok(id)
    }

    pub(crate) fn rule_named(&self, name: &str) -> Option<RuleId> {
        self.rule_names.get(name).copied()
    }

    pub(crate) fn define_rule(&mut self, rule: RuleId, body: ExprId) {
        self.rules[rule.index()].1 = Some(body);
    }

    pub(crate) fn expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len());
        self.exprs.push(expr);
        id
    }

    pub(crate) fn term(&mut self, terminal: TerminalId) -> ExprId {
        self.expr(Expr::Terminal(terminal))
    }

    pub(crate) fn rule_ref(&mut self, rule: RuleId) -> ExprId {
        self.expr(Expr::NonTerminal(rule))
    }

    /// A sequence; a single item is returned as is.
    pub(crate) fn seq(&mut self, mut items: Vec<ExprId>) -> ExprId {
        if items.len() == 1 {
            return items.remove(0);
        }
        self.expr(Expr::Sequence(items))
    }

    /// A choice; a single branch is returned as is.
    pub(crate) fn choice(&mut self, mut branches: Vec<ExprId>) -> ExprId {
        if branches.len() == 1 {
            return branches.remove(0);
        }
        self.expr(Expr::Choice(branches))
    }

    pub(crate) fn optional(&mut self, body: ExprId) -> ExprId {
        self.expr(Expr::Optional(body))
    }

    pub(crate) fn multiple(&mut self, body: ExprId) -> ExprId {
        self.expr(Expr::Multiple(body))
    }

    /// Finish the grammar: compute lookahead sets and reject left recursion.
    pub(crate) fn build(self) -> Result<Grammar, GrammarCompileError> {
        if self.rules.is_empty() {
            return Err(GrammarCompileError::Empty);
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (name, body) in self.rules {
            let Some(body) = body else {
                return Err(GrammarCompileError::UndefinedNonTerminal {
                    name: name.to_string(),
                    line: 0,
                });
            };
            rules.push(Rule { name, body });
        }

        let sets = analysis::first_sets(&self.exprs, &rules);
        if let Some(rule) = analysis::left_recursive_rule(&self.exprs, &rules, &sets.nullable) {
            return Err(GrammarCompileError::LeftRecursion {
                name: rules[rule.index()].name.to_string(),
            });
        }

        tracing::debug!(
            terminals = self.terminals.len(),
            rules = rules.len(),
            exprs = self.exprs.len(),
            "grammar built"
        );

        Ok(Grammar {
            terminals: self.terminals,
            rules,
            exprs: self.exprs,
            nullable: sets.nullable,
            first: sets.first,
            rule_names: self.rule_names,
        })
    }
}
