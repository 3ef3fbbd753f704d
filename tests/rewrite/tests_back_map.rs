//! Back-mapping diagnostics through a rewriter, over multi-line text.

use mapper::base::{LineCol, LineColRange, TextRange, TextSize};
use mapper::diagnostics::Diagnostic;
use mapper::rewrite::{ActivationRule, BackMapOutcome, RewriteError, Rewriter};
use rstest::rstest;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

fn at(range: LineColRange) -> Diagnostic {
    Diagnostic::non_breaking("nta/declaration", range, "unused")
}

const DECLARATIONS: &str = "int a;\nint b;\nint c;";

/// `const ` before the first line, `b` renamed, one declaration appended.
fn declarations() -> Rewriter {
    let mut rewriter = Rewriter::new(DECLARATIONS);
    rewriter.insert(TextSize::new(0), "const ").unwrap();
    rewriter.replace(range(11, 12), "beta").unwrap();
    rewriter.append("\nint d;");
    rewriter
}

// =============================================================================
// Simple back-maps
// =============================================================================

#[test]
fn test_replaced_character_maps_back() {
    let mut rewriter = Rewriter::new("abc");
    rewriter.replace(range(1, 2), "XYZ").unwrap();
    assert_eq!(rewriter.rewritten_text(), "aXYZc");

    let mut diagnostic = at(LineColRange::from_coords(1, 2, 1, 5));
    assert_eq!(
        rewriter.back_map_diagnostic(&mut diagnostic).unwrap(),
        BackMapOutcome::Applied
    );
    assert_eq!(diagnostic.range, LineColRange::from_coords(1, 2, 1, 3));
    assert_eq!(diagnostic.message, "unused");
}

#[test]
fn test_rewritten_text_of_mixed_edits() {
    let mut rewriter = declarations();
    assert_eq!(rewriter.rewritten_text(), "const int a;\nint beta;\nint c;\nint d;");
}

#[rstest]
#[case(LineColRange::from_coords(1, 11, 1, 12), LineColRange::from_coords(1, 5, 1, 6), "a after the insert")]
#[case(LineColRange::from_coords(3, 5, 3, 6), LineColRange::from_coords(3, 5, 3, 6), "c on an untouched line")]
#[case(LineColRange::from_coords(2, 5, 2, 9), LineColRange::from_coords(2, 5, 2, 6), "the replacement")]
#[case(LineColRange::from_coords(2, 6, 2, 7), LineColRange::from_coords(2, 5, 2, 6), "inside the replacement")]
#[case(LineColRange::from_coords(1, 1, 1, 6), LineColRange::from_coords(1, 1, 1, 1), "the insert itself")]
fn test_mixed_edits_map_back(
    #[case] rewritten: LineColRange,
    #[case] expected: LineColRange,
    #[case] desc: &str,
) {
    let mut rewriter = declarations();
    rewriter.rewritten_text();

    let mut diagnostic = at(rewritten);
    rewriter.back_map_diagnostic(&mut diagnostic).unwrap();
    assert_eq!(diagnostic.range, expected, "{desc}");
}

#[test]
fn test_untouched_text_keeps_its_text() {
    let mut rewriter = declarations();
    let rewritten = rewriter.rewritten_text().to_string();

    for needle in ["int a;", "int c;", "\nint "] {
        let start = rewritten.find(needle).unwrap() as u32;
        let mapped = rewriter.map_range(range(start, start + needle.len() as u32)).unwrap();
        assert_eq!(&DECLARATIONS[mapped], needle);
    }
}

#[test]
fn test_appended_declaration_points_at_end() {
    let mut rewriter = declarations();
    rewriter.rewritten_text();

    let mut diagnostic = at(LineColRange::from_coords(4, 1, 4, 6));
    assert_eq!(
        rewriter.back_map_diagnostic(&mut diagnostic).unwrap(),
        BackMapOutcome::Applied
    );
    assert_eq!(diagnostic.range, LineColRange::empty(LineCol::new(3, 7)));
    assert_eq!(diagnostic.message, "unused (in generated code)");
}

// =============================================================================
// Advanced back-maps
// =============================================================================

#[test]
fn test_priority_wins_regardless_of_registration_order() {
    for low_first in [true, false] {
        let mut rewriter = Rewriter::new("chan c[2];");
        let edit = rewriter.replace(range(5, 9), "c_0, c_1").unwrap();
        let priorities = if low_first { [0, 10] } else { [10, 0] };
        let messages = if low_first { ["low", "high"] } else { ["high", "low"] };
        for (priority, message) in priorities.into_iter().zip(messages) {
            edit.add_back_map(range(0, 8), ActivationRule::Intersects, |ctx| {
                ctx.original_line_col(ctx.edit_original_range())
            })
            .unwrap()
            .with_priority(priority)
            .override_error_message(move |_| message.to_string());
        }
        rewriter.rewritten_text();

        let mut diagnostic = at(LineColRange::from_coords(1, 11, 1, 14));
        rewriter.back_map_diagnostic(&mut diagnostic).unwrap();
        assert_eq!(diagnostic.message, "high");
        assert_eq!(diagnostic.range, LineColRange::from_coords(1, 6, 1, 10));
    }
}

#[test]
fn test_discarded_inside_activation_only() {
    let mut rewriter = Rewriter::new("int x;");
    rewriter
        .append("\nvoid helper() {}")
        .add_back_map(range(1, 17), ActivationRule::ActivationContainsError, |ctx| {
            ctx.edit_line_col()
        })
        .unwrap()
        .discard_error(|_| true);
    rewriter.rewritten_text();

    let mut helper = at(LineColRange::from_coords(2, 6, 2, 12));
    assert_eq!(
        rewriter.back_map_diagnostic(&mut helper).unwrap(),
        BackMapOutcome::Discard
    );
    let mut declared = at(LineColRange::from_coords(1, 5, 1, 6));
    assert_eq!(
        rewriter.back_map_diagnostic(&mut declared).unwrap(),
        BackMapOutcome::Unchanged
    );
}

// =============================================================================
// Overlaps
// =============================================================================

#[test]
fn test_overlap_leaves_rewriter_unchanged() {
    let mut rewriter = declarations();
    let before = rewriter.rewritten_text().to_string();

    let err = rewriter.replace(range(10, 13), "b2").unwrap_err();
    let RewriteError::Overlap(violation) = err else {
        panic!("expected an overlap, got {err}");
    };
    assert!(violation.to_string().contains("overlaps"));

    assert!(rewriter.is_compiled());
    assert_eq!(rewriter.edits().len(), 3);
    assert_eq!(rewriter.rewritten_text(), before);
}
