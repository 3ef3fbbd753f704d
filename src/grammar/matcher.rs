//! Recursive-descent matching of token streams against a compiled grammar.
//!
//! Matching works on an immutable token-index [`Cursor`]; backtracking in a
//! choice is just retrying the next branch from the same cursor. Optional and
//! repeated elements only attempt their body when the next token is in the
//! body's FIRST set. Internal failures surface as `None`.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::lexer::{self, Token, TokenKind};
use super::syntax::{Expectation, Expr, ExprId, Grammar, RuleId};
use super::tree::{Node, NodeKind, ParseTree};

impl Grammar {
    /// Tokenize `text` with this grammar's terminals.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        lexer::tokenize(self.terminals(), text)
    }

    /// Matcher for the start rule.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(self, self.start_rule())
    }

    /// Matcher for the rule called `name`.
    pub fn rule(&self, name: &str) -> Option<Matcher<'_>> {
        self.rule_id(name).map(|rule| Matcher::new(self, rule))
    }

    pub fn match_exact(&self, text: &str) -> Option<ParseTree> {
        self.matcher().match_exact(text)
    }

    pub fn find(&self, text: &str, from: TextSize) -> Option<ParseTree> {
        self.matcher().find(text, from)
    }

    pub fn find_all<'t>(&self, text: &'t str) -> Matches<'_, 't> {
        self.matcher().find_all(text)
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// Matches text against one rule of a grammar.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'g> {
    grammar: &'g Grammar,
    rule: RuleId,
    /// Explicit bound on nested rule activations.
    max_depth: Option<usize>,
}

impl<'g> Matcher<'g> {
    pub fn new(grammar: &'g Grammar, rule: RuleId) -> Self {
        Self {
            grammar,
            rule,
            max_depth: None,
        }
    }

    /// Bound nesting below what the grammar and input allow. Without it,
    /// the bound is `(tokens + 1) * rules + 1`: left recursion is rejected at
    /// compile time, so no rule repeats on the stack at one token position
    /// and a valid match never gets deeper than that.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn rule_name(&self) -> &'g str {
        self.grammar.rule_def(self.rule).name()
    }

    /// Match only if the rule consumes all of `text`.
    pub fn match_exact(&self, text: &str) -> Option<ParseTree> {
        let tokens = self.grammar.tokenize(text);
        self.match_tokens(&tokens).ok()
    }

    /// Like [`Matcher::match_exact`], but a failure reports the range of the
    /// furthest token reached, or an empty range at the end of `text`.
    pub fn try_match(&self, text: &str) -> Result<ParseTree, TextRange> {
        let tokens = self.grammar.tokenize(text);
        self.match_tokens(&tokens).map_err(|furthest| match tokens.get(furthest) {
            Some(token) => token.range,
            None => TextRange::empty(TextSize::of(text)),
        })
    }

    /// First non-empty match starting at or after the byte offset `from`.
    pub fn find(&self, text: &str, from: TextSize) -> Option<ParseTree> {
        let tokens = self.grammar.tokenize(text);
        let start = tokens.partition_point(|token| token.range.start() < from);
        self.find_in(&tokens, start).map(|(tree, _)| tree)
    }

    /// All successive matches in `text`, each search resuming after the
    /// previous match. The result can be iterated any number of times.
    pub fn find_all<'t>(&self, text: &'t str) -> Matches<'g, 't> {
        Matches {
            matcher: *self,
            text,
            tokens: self.grammar.tokenize(text),
        }
    }

    /// Match a whole token stream. On failure, returns the index of the
    /// furthest token the match reached.
    pub(crate) fn match_tokens(&self, tokens: &[Token]) -> Result<ParseTree, usize> {
        let mut state = State::new(self, tokens);
        match state.rule(self.rule, Cursor(0)) {
            Some((tree, end)) if end.0 == tokens.len() => Ok(tree),
            Some((_, end)) => Err(state.furthest.max(end.0)),
            None => Err(state.furthest),
        }
    }

    fn find_in(&self, tokens: &[Token], start: usize) -> Option<(ParseTree, usize)> {
        let body = self.grammar.rule_def(self.rule).body();
        for index in start..tokens.len() {
            if self.grammar.expects(body, tokens.get(index)) != Expectation::Accept {
                continue;
            }
            let mut state = State::new(self, tokens);
            if let Some((tree, end)) = state.rule(self.rule, Cursor(index)) {
                if end.0 > index {
                    return Some((tree, end.0));
                }
            }
        }
        None
    }
}

// ============================================================================
// FIND-ALL
// ============================================================================

/// Lazy sequence of matches over one text.
#[derive(Debug)]
pub struct Matches<'g, 't> {
    matcher: Matcher<'g>,
    text: &'t str,
    tokens: Vec<Token>,
}

impl<'g, 't> Matches<'g, 't> {
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// A fresh iterator starting from the beginning of the text.
    pub fn iter(&self) -> MatchIter<'_, 'g> {
        MatchIter {
            matcher: &self.matcher,
            tokens: &self.tokens,
            next: 0,
        }
    }
}

impl<'m, 'g, 't> IntoIterator for &'m Matches<'g, 't> {
    type Item = ParseTree;
    type IntoIter = MatchIter<'m, 'g>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct MatchIter<'m, 'g> {
    matcher: &'m Matcher<'g>,
    tokens: &'m [Token],
    next: usize,
}

impl Iterator for MatchIter<'_, '_> {
    type Item = ParseTree;

    fn next(&mut self) -> Option<ParseTree> {
        match self.matcher.find_in(self.tokens, self.next) {
            Some((tree, end)) => {
                self.next = end;
                Some(tree)
            }
            None => {
                self.next = self.tokens.len();
                None
            }
        }
    }
}

// ============================================================================
// MATCH STATE
// ============================================================================

/// Position in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cursor(usize);

impl Cursor {
    fn next(self) -> Self {
        Cursor(self.0 + 1)
    }
}

struct State<'a> {
    grammar: &'a Grammar,
    tokens: &'a [Token],
    depth: usize,
    max_depth: usize,
    /// Furthest token index examined.
    furthest: usize,
}

impl<'a> State<'a> {
    fn new(matcher: &Matcher<'a>, tokens: &'a [Token]) -> Self {
        Self {
            grammar: matcher.grammar,
            tokens,
            depth: 0,
            max_depth: matcher
                .max_depth
                .unwrap_or_else(|| (tokens.len() + 1) * matcher.grammar.rules().len() + 1),
            furthest: 0,
        }
    }

    fn peek(&mut self, at: Cursor) -> Option<&'a Token> {
        self.furthest = self.furthest.max(at.0);
        self.tokens.get(at.0)
    }

    fn accepts(&mut self, expr: ExprId, at: Cursor) -> bool {
        let token = self.peek(at);
        self.grammar.expects(expr, token) == Expectation::Accept
    }

    fn rule(&mut self, rule: RuleId, at: Cursor) -> Option<(ParseTree, Cursor)> {
        if self.depth >= self.max_depth {
            tracing::trace!(depth = self.depth, "match depth limit reached");
            return None;
        }
        let grammar = self.grammar;
        let def = grammar.rule_def(rule);

        self.depth += 1;
        let result = self.expr(def.body(), at);
        self.depth -= 1;

        let (tree, end) = result?;
        let children = match tree {
            ParseTree::Node(Node {
                kind: NodeKind::Sequence,
                children,
            }) => children,
            other => vec![other],
        };
        Some((
            ParseTree::node(NodeKind::Rule(SmolStr::new(def.name())), children),
            end,
        ))
    }

    fn expr(&mut self, id: ExprId, at: Cursor) -> Option<(ParseTree, Cursor)> {
        let grammar = self.grammar;
        match grammar.expr(id) {
            Expr::Blank => Some((ParseTree::blank(), at)),
            Expr::Terminal(terminal) => {
                let token = self.peek(at)?;
                (token.kind == TokenKind::Terminal(*terminal))
                    .then(|| (ParseTree::leaf(token.clone()), at.next()))
            }
            Expr::NonTerminal(rule) => self.rule(*rule, at),
            Expr::Sequence(items) => {
                let mut children = Vec::with_capacity(items.len());
                let mut cursor = at;
                for item in items {
                    let (tree, next) = self.expr(*item, cursor)?;
                    children.push(tree);
                    cursor = next;
                }
                Some((ParseTree::node(NodeKind::Sequence, children), cursor))
            }
            Expr::Choice(branches) => {
                let token = self.peek(at);
                for branch in branches {
                    if grammar.expects(*branch, token) == Expectation::HardReject {
                        continue;
                    }
                    if let Some(matched) = self.expr(*branch, at) {
                        return Some(matched);
                    }
                }
                None
            }
            Expr::Optional(body) => {
                if self.accepts(*body, at) {
                    if let Some(matched) = self.expr(*body, at) {
                        return Some(matched);
                    }
                }
                Some((ParseTree::blank(), at))
            }
            Expr::Multiple(body) => {
                let mut children = Vec::new();
                let mut cursor = at;
                while self.accepts(*body, cursor) {
                    match self.expr(*body, cursor) {
                        Some((tree, next)) if next > cursor => {
                            children.push(tree);
                            cursor = next;
                        }
                        _ => break,
                    }
                }
                Some((ParseTree::node(NodeKind::Repetition, children), cursor))
            }
        }
    }
}
