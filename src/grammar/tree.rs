//! Parse trees produced by the matcher.
//!
//! A rule match becomes a [`Node`] named after the rule. Nested sequences and
//! repetitions become anonymous nodes, a choice yields the tree of the branch
//! that matched, and an optional that did not match yields a blank leaf. Range
//! queries skip blank leaves.

use std::fmt;

use smol_str::SmolStr;
use text_size::TextRange;

use super::lexer::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Rule(SmolStr),
    Sequence,
    Repetition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<ParseTree>,
}

/// A leaf holds a token, or nothing when it stands for a blank match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub token: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Node(Node),
    Leaf(Leaf),
}

impl ParseTree {
    pub fn blank() -> Self {
        ParseTree::Leaf(Leaf { token: None })
    }

    pub fn leaf(token: Token) -> Self {
        ParseTree::Leaf(Leaf { token: Some(token) })
    }

    pub fn node(kind: NodeKind, children: Vec<ParseTree>) -> Self {
        ParseTree::Node(Node { kind, children })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, ParseTree::Leaf(Leaf { token: None }))
    }

    /// Name of the rule this node matched, if it is a rule node.
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            ParseTree::Node(Node {
                kind: NodeKind::Rule(name),
                ..
            }) => Some(name),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseTree::Leaf(leaf) => leaf.token.as_ref(),
            ParseTree::Node(_) => None,
        }
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Node(node) => &node.children,
            ParseTree::Leaf(_) => &[],
        }
    }

    /// Children with anonymous sequence and repetition nodes flattened away.
    pub fn items(&self) -> Vec<&ParseTree> {
        fn collect<'a>(tree: &'a ParseTree, out: &mut Vec<&'a ParseTree>) {
            for child in tree.children() {
                match child {
                    ParseTree::Node(Node {
                        kind: NodeKind::Sequence | NodeKind::Repetition,
                        ..
                    }) => collect(child, out),
                    _ => out.push(child),
                }
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder {
            stack: vec![(self, false)],
        }
    }

    /// Tokens of all non-blank leaves, in order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.pre_order().filter_map(ParseTree::token)
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.tokens().next()
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.tokens().last()
    }

    /// Span from the first token's start to the last token's end.
    pub fn range(&self) -> Option<TextRange> {
        let first = self.first_token()?;
        let last = self.last_token()?;
        Some(TextRange::new(first.range.start(), last.range.end()))
    }

    /// The matched slice of `source`; empty when nothing was consumed.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.range().map_or("", |range| &source[range])
    }

    /// Rebuild the matched text from the leaves, keeping the original
    /// whitespace between tokens.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::new();
        let mut previous_end = None;
        for token in self.tokens() {
            if let Some(end) = previous_end {
                out.push_str(&source[TextRange::new(end, token.range.start())]);
            }
            out.push_str(&token.text);
            previous_end = Some(token.range.end());
        }
        out
    }

    /// First node (pre-order, including `self`) matching the rule `name`.
    pub fn find_rule(&self, name: &str) -> Option<&ParseTree> {
        self.pre_order().find(|tree| tree.rule_name() == Some(name))
    }

    /// All nodes matching the rule `name`, in pre-order.
    pub fn find_rules<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ParseTree> + 'a {
        self.pre_order().filter(move |tree| tree.rule_name() == Some(name))
    }

    /// All tokens of the terminal `name`, in order.
    pub fn find_terminals<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Token> + 'a {
        self.tokens().filter(move |token| token.name == name)
    }
}

/// Pre-order traversal: a node before its children, children left to right.
pub struct PreOrder<'a> {
    stack: Vec<&'a ParseTree>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a ParseTree;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.stack.pop()?;
        self.stack.extend(tree.children().iter().rev());
        Some(tree)
    }
}

/// Post-order traversal: children left to right, then the node.
pub struct PostOrder<'a> {
    stack: Vec<(&'a ParseTree, bool)>,
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = &'a ParseTree;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (tree, expanded) = self.stack.pop()?;
            if expanded || tree.children().is_empty() {
                return Some(tree);
            }
            self.stack.push((tree, true));
            self.stack
                .extend(tree.children().iter().rev().map(|child| (child, false)));
        }
    }
}

/// S-expression rendering, e.g. `(Sum INT"12" '+'"+" INT"7")`.
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTree::Leaf(Leaf { token: Some(token) }) => write!(f, "{}{:?}", token.name, token.text.as_str()),
            ParseTree::Leaf(Leaf { token: None }) => f.write_str("_"),
            ParseTree::Node(node) => {
                match &node.kind {
                    NodeKind::Rule(name) => write!(f, "({name}")?,
                    NodeKind::Sequence => f.write_str("(")?,
                    NodeKind::Repetition => f.write_str("(*")?,
                }
                for (i, child) in node.children.iter().enumerate() {
                    if i > 0 || !matches!(node.kind, NodeKind::Sequence) {
                        f.write_str(" ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
