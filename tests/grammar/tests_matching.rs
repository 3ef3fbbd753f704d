//! Matching, searching and parse tree queries through the public API.

use mapper::TextSize;
use mapper::grammar::{Grammar, NodeKind, ParseTree};
use rstest::rstest;

fn compile(source: &str) -> Grammar {
    Grammar::compile(source).expect("grammar should compile")
}

fn sum() -> Grammar {
    compile("Sum :== INT '+' INT .\nINT = [0-9]+\n")
}

// =============================================================================
// Exact matching
// =============================================================================

#[test]
fn test_sum_matches_exactly() {
    let text = "12+7";
    let tree = sum().match_exact(text).expect("12+7 should match");

    assert_eq!(tree.rule_name(), Some("Sum"));
    assert_eq!(tree.reconstruct(text), "12+7");
    let tokens: Vec<&str> = tree.tokens().map(|t| t.text.as_str()).collect();
    assert_eq!(tokens, vec!["12", "+", "7"]);
}

#[rstest]
#[case("12+", "missing operand")]
#[case("12+7+1", "trailing tokens")]
#[case("12 + x", "unknown token")]
#[case("", "empty input")]
fn test_sum_rejects(#[case] input: &str, #[case] desc: &str) {
    assert!(sum().match_exact(input).is_none(), "{desc} should not match");
}

#[rstest]
#[case("12 + 7")]
#[case("  12\n+\t7 ")]
#[case("1+2")]
fn test_reconstruct_keeps_inner_whitespace(#[case] input: &str) {
    let tree = sum().match_exact(input).expect("should match");
    assert_eq!(tree.reconstruct(input), input.trim());
    assert_eq!(tree.text(input), input.trim());
}

#[test]
fn test_choice_backtracks_to_later_branch() {
    let grammar = compile(
        "S :== Call | Index .\n\
         Call :== ID '(' ')' .\n\
         Index :== ID '[' INT ']' .\n\
         ID = [a-z]+\n\
         INT = [0-9]+\n",
    );
    let tree = grammar.match_exact("xs [ 3 ]").expect("index branch should match");
    assert!(tree.find_rule("Index").is_some());
    assert!(tree.find_rule("Call").is_none());
}

#[test]
fn test_optional_not_taken_is_blank_leaf() {
    let grammar = compile("Decl :== [CONST] TYPE ID ';' .\nCONST = 'const'\nTYPE = 'int'\nID = [a-z]+\n");

    let plain = grammar.match_exact("int x;").expect("should match");
    assert!(plain.children()[0].is_blank());
    assert_eq!(plain.first_token().map(|t| t.text.as_str()), Some("int"));

    let constant = grammar.match_exact("const int x;").expect("should match");
    assert!(!constant.children()[0].is_blank());
    assert_eq!(constant.last_token().map(|t| t.text.as_str()), Some(";"));
}

#[test]
fn test_repetition_and_traversal_orders() {
    let grammar = compile("List :== ID { ',' ID } .\nID = [a-z]+\n");
    let tree = grammar.match_exact("a, b, c").expect("should match");

    assert!(matches!(
        &tree.children()[1],
        ParseTree::Node(node) if node.kind == NodeKind::Repetition
    ));
    let ids: Vec<&str> = tree.find_terminals("ID").map(|t| t.text.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let pre = tree.pre_order().count();
    let post = tree.post_order().count();
    assert_eq!(pre, post);
    assert_eq!(tree.pre_order().next().and_then(ParseTree::rule_name), Some("List"));
    assert_eq!(tree.post_order().last().and_then(ParseTree::rule_name), Some("List"));
}

#[test]
fn test_named_rule_matcher() {
    let grammar = compile("Assign :== ID '=' Expr .\nExpr :== INT | ID .\nID = [a-z]+\nINT = [0-9]+\n");
    let expr = grammar.rule("Expr").expect("Expr exists");
    assert!(expr.match_exact("42").is_some());
    assert!(expr.match_exact("x = 1").is_none());
    assert!(grammar.rule("Missing").is_none());
}

// =============================================================================
// Searching
// =============================================================================

#[test]
fn test_find_skips_to_first_match() {
    let grammar = sum();
    let text = "x = 1 + 2; y = 30 + 4;";

    let first = grammar.find(text, TextSize::new(0)).expect("first sum");
    assert_eq!(first.text(text), "1 + 2");

    let second = grammar.find(text, TextSize::new(10)).expect("second sum");
    assert_eq!(second.text(text), "30 + 4");

    assert!(grammar.find(text, TextSize::new(21)).is_none());
}

#[test]
fn test_find_all_is_restartable() {
    let grammar = sum();
    let text = "1+2 3+4 + 5+6";
    let matches = grammar.find_all(text);

    let first: Vec<String> = matches.iter().map(|m| m.text(text).to_string()).collect();
    assert_eq!(first, vec!["1+2", "3+4", "5+6"]);

    let again: Vec<String> = (&matches).into_iter().map(|m| m.text(text).to_string()).collect();
    assert_eq!(again, first);
}

#[test]
fn test_find_all_on_text_without_matches() {
    let grammar = sum();
    assert_eq!(grammar.find_all("nothing here").iter().count(), 0);
    assert_eq!(grammar.find_all("").iter().count(), 0);
}

// =============================================================================
// Depth guard
// =============================================================================

#[test]
fn test_depth_guard_bounds_nesting() {
    let grammar = compile("E :== '(' E ')' | X .\nX = 'x'\n");
    let text = format!("{}x{}", "(".repeat(100), ")".repeat(100));

    assert!(grammar.matcher().match_exact(&text).is_some());
    assert!(grammar.matcher().with_max_depth(50).match_exact(&text).is_none());
    assert!(grammar.matcher().with_max_depth(50).match_exact("((x))").is_some());
}

#[rstest]
#[case(10)]
#[case(40)]
#[case(60)]
fn test_deep_nesting_under_precedence_levels(#[case] nesting: usize) {
    let grammar = compile(
        "E :== A { '+' A } .\n\
         A :== B { '-' B } .\n\
         B :== C { '*' C } .\n\
         C :== D { '/' D } .\n\
         D :== F { '%' F } .\n\
         F :== G { '^' G } .\n\
         G :== H { '&' H } .\n\
         H :== P { '~' P } .\n\
         P :== INT | '(' E ')' .\n\
         INT = [0-9]+\n",
    );
    let text = format!("1 + {}2 * 3{} - 4", "(".repeat(nesting), ")".repeat(nesting));

    let tree = grammar.match_exact(&text).expect("nested expression should match");
    assert_eq!(tree.find_rules("P").count(), nesting + 4);
    assert!(grammar.matcher().try_match(&text).is_ok());
}
