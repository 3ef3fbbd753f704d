//! Greedy longest-match tokenizer driven by a grammar's terminal set.
//!
//! Whitespace always separates tokens and is never part of one: the input is
//! split into whitespace-free chunks, and each chunk is cut into the longest
//! terminal matches. On a tie a literal terminal wins over a regex terminal,
//! then the terminal declared first wins. Characters no terminal matches are
//! coalesced into a single [`TokenKind::Unknown`] token, which no grammar
//! element accepts.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::syntax::{Terminal, TerminalId};
use crate::base::{LineCol, LineIndex};

/// Name given to unknown tokens.
pub const UNKNOWN_TOKEN: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Terminal(TerminalId),
    Unknown,
}

/// A lexeme tagged with its offset and 1-based line/column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Name of the matched terminal, or [`UNKNOWN_TOKEN`].
    pub name: SmolStr,
    pub text: SmolStr,
    pub range: TextRange,
    pub position: LineCol,
}

impl Token {
    pub fn is_unknown(&self) -> bool {
        self.kind == TokenKind::Unknown
    }
}

pub(crate) fn tokenize(terminals: &[Terminal], text: &str) -> Vec<Token> {
    let index = LineIndex::new(text);
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        let chunk_end = rest.find(char::is_whitespace).map_or(text.len(), |i| pos + i);
        let start = pos;
        let kind = match longest_match(terminals, &text[pos..chunk_end]) {
            Some((terminal, len)) => {
                pos += len;
                TokenKind::Terminal(terminal)
            }
            None => {
                pos += ch.len_utf8();
                while pos < chunk_end && longest_match(terminals, &text[pos..chunk_end]).is_none() {
                    pos += text[pos..].chars().next().map_or(1, char::len_utf8);
                }
                TokenKind::Unknown
            }
        };

        let range = TextRange::new(TextSize::new(start as u32), TextSize::new(pos as u32));
        let name = match kind {
            TokenKind::Terminal(terminal) => SmolStr::new(terminals[terminal.index()].name()),
            TokenKind::Unknown => SmolStr::new_static(UNKNOWN_TOKEN),
        };
        tokens.push(Token {
            kind,
            name,
            text: SmolStr::new(&text[start..pos]),
            range,
            position: index.line_col(text, range.start()),
        });
    }

    tokens
}

fn longest_match(terminals: &[Terminal], input: &str) -> Option<(TerminalId, usize)> {
    let mut best: Option<(TerminalId, usize, bool)> = None;
    for (index, terminal) in terminals.iter().enumerate() {
        let Some(len) = terminal.match_len(input) else {
            continue;
        };
        let literal = terminal.is_literal();
        let better = match best {
            None => true,
            Some((_, best_len, best_literal)) => {
                len > best_len || (len == best_len && literal && !best_literal)
            }
        };
        if better {
            best = Some((TerminalId::new(index), len, literal));
        }
    }
    best.map(|(terminal, len, _)| (terminal, len))
}
