//! Compiling a grammar description into a [`Grammar`].
//!
//! Terminal lines are read first, line by line, and blanked out so that the
//! positions of everything else stay valid. The remaining rule text is matched
//! against the meta-grammar and the resulting tree is lowered into the
//! expression arena.

use once_cell::sync::Lazy;
use regex::Regex;

use super::bootstrap::{self, EXPR, IDENT, ITEM, RULE, SEQUENCE, STRING};
use super::error::GrammarCompileError;
use super::lexer::Token;
use super::syntax::{ExprId, Grammar, GrammarBuilder, RuleId};
use super::tree::ParseTree;
use crate::base::LineIndex;

static TERMINAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=(.*)$").expect("terminal line regex")
});

impl Grammar {
    /// Compile a grammar description.
    ///
    /// ```text
    /// Sum :== INT '+' INT .
    /// INT = [0-9]+
    /// ```
    pub fn compile(source: &str) -> Result<Grammar, GrammarCompileError> {
        let mut builder = GrammarBuilder::new();
        let rule_text = read_terminals(source, &mut builder)?;

        let meta = bootstrap::meta_grammar()?;
        let tokens = meta.tokenize(&rule_text);
        if tokens.is_empty() {
            return Err(GrammarCompileError::Empty);
        }
        let tree = meta
            .matcher()
            .match_tokens(&tokens)
            .map_err(|furthest| malformed_at(&rule_text, &tokens, furthest))?;

        lower(&tree, &mut builder)?;
        let grammar = builder.build()?;
        tracing::debug!(start = grammar.rule_def(grammar.start_rule()).name(), "grammar compiled");
        Ok(grammar)
    }
}

/// Register every terminal line and return the rule text with those lines,
/// and all `//` comments, blanked.
fn read_terminals(source: &str, builder: &mut GrammarBuilder) -> Result<String, GrammarCompileError> {
    let mut rule_text = String::with_capacity(source.len());

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let line_no = index as u32 + 1;
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        let content = content.strip_suffix('\r').unwrap_or(content);

        if content.trim_start().starts_with("//") {
            rule_text.push_str(newline);
            continue;
        }

        if let Some(captures) = TERMINAL_LINE.captures(content) {
            let name = &captures[1];
            let value = captures[2].trim();
            match unquote(value) {
                Some(literal) if !literal.is_empty() => {
                    builder.literal(name, literal, line_no)?;
                }
                _ if value.is_empty() || unquote(value).is_some() => {
                    return Err(GrammarCompileError::malformed(
                        line_no,
                        1,
                        format!("terminal `{name}` has an empty pattern"),
                    ));
                }
                _ => {
                    builder.regex(name, value, line_no)?;
                }
            }
            rule_text.push_str(newline);
            continue;
        }

        rule_text.push_str(strip_comment(content));
        rule_text.push_str(newline);
    }

    Ok(rule_text)
}

/// Contents of a `'...'` or `"..."` value.
fn unquote(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = value.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(quote)).then_some(inner)
}

/// Cut a trailing `//` comment that is not inside a quoted literal.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    let mut previous = None;
    for (index, ch) in line.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '/' && previous == Some('/') => return &line[..index - 1],
            None => {}
        }
        previous = Some(ch);
    }
    line
}

fn malformed_at(text: &str, tokens: &[Token], furthest: usize) -> GrammarCompileError {
    match tokens.get(furthest) {
        Some(token) => GrammarCompileError::malformed(
            token.position.line,
            token.position.column,
            format!("unexpected `{}`", token.text),
        ),
        None => {
            let end = LineIndex::new(text).line_col(text, text_size::TextSize::of(text));
            GrammarCompileError::malformed(end.line, end.column, "unexpected end of grammar")
        }
    }
}

// ============================================================================
// LOWERING
// ============================================================================

fn lower(tree: &ParseTree, builder: &mut GrammarBuilder) -> Result<(), GrammarCompileError> {
    let rules: Vec<&ParseTree> = tree.find_rules(RULE).collect();

    let mut declared: Vec<RuleId> = Vec::with_capacity(rules.len());
    for rule in &rules {
        let name = leading_token(rule)?;
        declared.push(builder.declare_rule(&name.text, name.position.line)?);
    }

    for (rule, id) in rules.iter().zip(declared) {
        let body = child_rule(rule, EXPR)?;
        let body = lower_expr(body, builder)?;
        builder.define_rule(id, body);
    }
    Ok(())
}

fn lower_expr(node: &ParseTree, builder: &mut GrammarBuilder) -> Result<ExprId, GrammarCompileError> {
    let mut branches = Vec::new();
    for sequence in node.items().into_iter().filter(|c| c.rule_name() == Some(SEQUENCE)) {
        let mut items = Vec::new();
        for item in sequence.items().into_iter().filter(|c| c.rule_name() == Some(ITEM)) {
            items.push(lower_item(item, builder)?);
        }
        branches.push(builder.seq(items));
    }
    Ok(builder.choice(branches))
}

fn lower_item(node: &ParseTree, builder: &mut GrammarBuilder) -> Result<ExprId, GrammarCompileError> {
    let token = leading_token(node)?;

    if token.name == IDENT {
        let name = token.text.as_str();
        if let Some(terminal) = builder.terminal_named(name) {
            return Ok(builder.term(terminal));
        }
        if let Some(rule) = builder.rule_named(name) {
            return Ok(builder.rule_ref(rule));
        }
        return Err(GrammarCompileError::UndefinedNonTerminal {
            name: name.to_string(),
            line: token.position.line,
        });
    }

    if token.name == STRING {
        let literal = unquote(&token.text).unwrap_or_default();
        if literal.is_empty() {
            return Err(GrammarCompileError::malformed(
                token.position.line,
                token.position.column,
                "empty literal",
            ));
        }
        let terminal = builder.literal_terminal(literal);
        return Ok(builder.term(terminal));
    }

    let inner = lower_expr(child_rule(node, EXPR)?, builder)?;
    Ok(match token.text.as_str() {
        "[" => builder.optional(inner),
        "{" => builder.multiple(inner),
        _ => inner,
    })
}

fn leading_token(node: &ParseTree) -> Result<&Token, GrammarCompileError> {
    node.items()
        .first()
        .and_then(|item| item.token())
        .ok_or_else(|| GrammarCompileError::malformed(0, 0, "rule without a leading token"))
}

fn child_rule<'a>(node: &'a ParseTree, name: &str) -> Result<&'a ParseTree, GrammarCompileError> {
    node.items()
        .into_iter()
        .find(|item| item.rule_name() == Some(name))
        .ok_or_else(|| GrammarCompileError::malformed(0, 0, format!("missing {name}")))
}
