//! Grammar description compilation and its errors.

use mapper::grammar::{Grammar, GrammarCompileError, Pattern};
use rstest::rstest;

// =============================================================================
// Accepted descriptions
// =============================================================================

#[rstest]
#[case("S :== A .\nA = 'a'", "single rule")]
#[case("// arithmetic\nS :== A . // trailing\nA = 'a'\n", "comments")]
#[case("S :==\n  A\n  | B\n  .\nA = 'a'\nB = 'b'", "rule over several lines")]
#[case("S :== ( A | B ) { A } [ B ] .\nA = 'a'\nB = 'b'", "groups and brackets")]
#[case("S :== \"a\" 'b' .", "inline literals of both quote styles")]
#[case("S :== T T .\nT :== A .\nA = [a-z]+", "rules defined after use")]
fn test_grammar_compiles(#[case] source: &str, #[case] desc: &str) {
    let result = Grammar::compile(source);
    assert!(result.is_ok(), "{desc}: {:?}", result.err());
}

#[test]
fn test_first_rule_is_start_rule() {
    let grammar = Grammar::compile("Pair :== Item ',' Item .\nItem :== NUM .\nNUM = [0-9]+").unwrap();
    assert_eq!(grammar.rule_def(grammar.start_rule()).name(), "Pair");
    assert!(grammar.match_exact("1, 2").is_some());
    assert!(grammar.match_exact("1").is_none());
}

#[test]
fn test_terminal_patterns() {
    let grammar = Grammar::compile("S :== KW ID .\nKW = 'let'\nID = [a-z_][a-z0-9_]*").unwrap();
    let patterns: Vec<(&str, bool)> = grammar
        .terminals()
        .iter()
        .map(|t| (t.name(), matches!(t.pattern(), Pattern::Literal(_))))
        .collect();
    assert_eq!(patterns, vec![("KW", true), ("ID", false)]);
    assert!(grammar.match_exact("let x_1").is_some());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_undefined_non_terminal() {
    let err = Grammar::compile("S :== A Missing .\nA = 'a'").unwrap_err();
    assert!(
        matches!(err, GrammarCompileError::UndefinedNonTerminal { ref name, .. } if name == "Missing"),
        "{err}"
    );
}

#[test]
fn test_duplicate_terminal() {
    let err = Grammar::compile("S :== A .\nA = 'a'\nA = 'b'").unwrap_err();
    assert!(
        matches!(err, GrammarCompileError::DuplicateTerminal { ref name, line: 3 } if name == "A"),
        "{err}"
    );
}

#[test]
fn test_duplicate_non_terminal() {
    let err = Grammar::compile("S :== A .\nS :== A A .\nA = 'a'").unwrap_err();
    assert!(
        matches!(err, GrammarCompileError::DuplicateNonTerminal { ref name, .. } if name == "S"),
        "{err}"
    );
}

#[test]
fn test_invalid_regex() {
    let err = Grammar::compile("S :== A .\nA = [a-").unwrap_err();
    assert!(matches!(err, GrammarCompileError::InvalidRegex { ref name, line: 2, .. } if name == "A"), "{err}");
}

#[rstest]
#[case("S :== A\nA = 'a'", "missing terminating dot")]
#[case("S :== [ A .\nA = 'a'", "unclosed bracket")]
#[case("S :== | A .\nA = 'a'", "leading bar")]
#[case(":== A .", "missing rule name")]
fn test_malformed(#[case] source: &str, #[case] desc: &str) {
    let err = Grammar::compile(source).unwrap_err();
    assert!(
        matches!(err, GrammarCompileError::Malformed { .. }),
        "{desc}: expected a malformed error, got {err}"
    );
}

#[test]
fn test_malformed_reports_furthest_position() {
    let err = Grammar::compile("S :== A\n  B ] C .\nA = 'a'\nB = 'b'\nC = 'c'").unwrap_err();
    let GrammarCompileError::Malformed { line, column, .. } = err else {
        panic!("expected a malformed error, got {err}");
    };
    assert_eq!((line, column), (2, 5));
}

#[rstest]
#[case("")]
#[case("// only a comment\n")]
#[case("A = 'a'\n")]
fn test_empty(#[case] source: &str) {
    assert!(matches!(Grammar::compile(source), Err(GrammarCompileError::Empty)));
}
