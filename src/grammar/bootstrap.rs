//! The meta-grammar that reads grammar descriptions.
//!
//! It is an ordinary [`Grammar`] assembled by hand through the builder:
//!
//! ```text
//! Grammar  :== Rule { Rule } .
//! Rule     :== IDENT ':==' Expr '.' .
//! Expr     :== Sequence { '|' Sequence } .
//! Sequence :== Item { Item } .
//! Item     :== IDENT | STRING | '[' Expr ']' | '{' Expr '}' | '(' Expr ')' .
//! ```
//!
//! Terminal lines (`NAME = ...`) never reach it; they are read line by line
//! before the rule text is tokenized.

use once_cell::sync::Lazy;

use super::error::GrammarCompileError;
use super::syntax::{Grammar, GrammarBuilder};

pub(super) const IDENT: &str = "IDENT";
pub(super) const STRING: &str = "STRING";

pub(super) const RULE: &str = "Rule";
pub(super) const EXPR: &str = "Expr";
pub(super) const SEQUENCE: &str = "Sequence";
pub(super) const ITEM: &str = "Item";

static META_GRAMMAR: Lazy<Result<Grammar, String>> = Lazy::new(|| build().map_err(|err| err.to_string()));

/// The shared meta-grammar instance.
pub(super) fn meta_grammar() -> Result<&'static Grammar, GrammarCompileError> {
    META_GRAMMAR
        .as_ref()
        .map_err(|message| GrammarCompileError::malformed(0, 0, format!("meta-grammar: {message}")))
}

fn build() -> Result<Grammar, GrammarCompileError> {
    let mut b = GrammarBuilder::new();

    let ident = b.regex(IDENT, r"[A-Za-z_][A-Za-z0-9_]*", 0)?;
    let string = b.regex(STRING, r#"'[^']*'|"[^"]*""#, 0)?;
    let define = b.literal_terminal(":==");
    let dot = b.literal_terminal(".");
    let bar = b.literal_terminal("|");
    let brackets = [
        (b.literal_terminal("["), b.literal_terminal("]")),
        (b.literal_terminal("{"), b.literal_terminal("}")),
        (b.literal_terminal("("), b.literal_terminal(")")),
    ];

    let grammar = b.declare_rule("Grammar", 0)?;
    let rule = b.declare_rule(RULE, 0)?;
    let expr = b.declare_rule(EXPR, 0)?;
    let sequence = b.declare_rule(SEQUENCE, 0)?;
    let item = b.declare_rule(ITEM, 0)?;

    // Grammar :== Rule { Rule } .
    let first = b.rule_ref(rule);
    let next = b.rule_ref(rule);
    let more = b.multiple(next);
    let body = b.seq(vec![first, more]);
    b.define_rule(grammar, body);

    // Rule :== IDENT ':==' Expr '.' .
    let name = b.term(ident);
    let define = b.term(define);
    let value = b.rule_ref(expr);
    let end = b.term(dot);
    let body = b.seq(vec![name, define, value, end]);
    b.define_rule(rule, body);

    // Expr :== Sequence { '|' Sequence } .
    let first = b.rule_ref(sequence);
    let bar = b.term(bar);
    let next = b.rule_ref(sequence);
    let alternative = b.seq(vec![bar, next]);
    let more = b.multiple(alternative);
    let body = b.seq(vec![first, more]);
    b.define_rule(expr, body);

    // Sequence :== Item { Item } .
    let first = b.rule_ref(item);
    let next = b.rule_ref(item);
    let more = b.multiple(next);
    let body = b.seq(vec![first, more]);
    b.define_rule(sequence, body);

    // Item :== IDENT | STRING | '[' Expr ']' | '{' Expr '}' | '(' Expr ')' .
    let mut branches = vec![b.term(ident), b.term(string)];
    for (open, close) in brackets {
        let open = b.term(open);
        let inner = b.rule_ref(expr);
        let close = b.term(close);
        branches.push(b.seq(vec![open, inner, close]));
    }
    let body = b.choice(branches);
    b.define_rule(item, body);

    b.build()
}
