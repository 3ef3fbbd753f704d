//! Model passes: rewriting, rejection, diagnostic folding and faults.

use mapper::base::{LineCol, LineColRange};
use mapper::diagnostics::{Diagnostic, Severity};
use mapper::mapper::{Mapper, MapperConfig, ModelOutcome, PassState};
use mapper::phase::PhaseHandle;

use crate::helpers::{AppendHelper, Faulty, OutOfBounds, Prefix, Reject, Rename, TestPlugin, model};

fn mapper_with(phases: impl Fn() -> Vec<PhaseHandle> + 'static) -> Mapper {
    Mapper::default().with_plugin(TestPlugin::new("test", phases)).unwrap()
}

fn translated(outcome: ModelOutcome) -> (String, Vec<Diagnostic>) {
    match outcome {
        ModelOutcome::Translated { text, pending } => (text, pending),
        ModelOutcome::Rejected { diagnostics } => panic!("pass rejected: {diagnostics:?}"),
    }
}

fn rejected(outcome: ModelOutcome) -> Vec<Diagnostic> {
    match outcome {
        ModelOutcome::Rejected { diagnostics } => diagnostics,
        ModelOutcome::Translated { text, .. } => panic!("pass translated: {text}"),
    }
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_plugins_append_phases_in_order() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Rename { from: "a", to: "b" })]);
    mapper
        .register(TestPlugin::new("second", || {
            vec![
                PhaseHandle::new(Prefix { prefix: "const " }),
                PhaseHandle::new(AppendHelper),
            ]
        }))
        .unwrap();

    let names: Vec<&str> = mapper.phases().iter().map(PhaseHandle::name).collect();
    assert_eq!(names, vec!["rename", "prefix", "append-helper"]);
    assert_eq!(mapper.plugins(), ["test".to_string(), "second".to_string()]);
}

// =============================================================================
// Translation
// =============================================================================

#[test]
fn test_translated_text_carries_rewrites() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Rename { from: "old", to: "new" })]);
    let (text, pending) = translated(mapper.map_model(&model("int old;", "clock old;", "old == 1")));

    assert!(pending.is_empty());
    assert!(text.contains("<declaration>int new;</declaration>"), "{text}");
    assert!(text.contains("<declaration>clock new;</declaration>"), "{text}");
    assert!(text.contains("new == 1"), "{text}");
    assert!(!text.contains("old"), "{text}");
    assert_eq!(mapper.session().state(), PassState::Completed);
}

#[test]
fn test_later_phase_sees_earlier_rewrite() {
    let mut mapper = mapper_with(|| {
        vec![
            PhaseHandle::new(Rename { from: "x", to: "bad" }),
            PhaseHandle::new(Reject {
                needle: "bad",
                severity: Severity::Warning,
            }),
        ]
    });
    let (_, pending) = translated(mapper.map_model(&model("int x;", "int y;", "true")));

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].path, "nta/declaration");
    assert_eq!(pending[0].phase_index, 1);
    assert_eq!(pending[0].range, LineColRange::from_coords(1, 5, 1, 8));
}

// =============================================================================
// Diagnostic folding
// =============================================================================

#[test]
fn test_phase_diagnostic_not_mapped_by_its_own_phase() {
    let mut mapper = mapper_with(|| {
        vec![
            PhaseHandle::new(Reject {
                needle: "bad",
                severity: Severity::NonBreaking,
            }),
            PhaseHandle::new(Prefix { prefix: "const " }),
        ]
    });
    let (text, pending) = translated(mapper.map_model(&model("int bad;", "int y;", "true")));
    assert!(text.contains("<declaration>const int bad;</declaration>"), "{text}");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].phase_index, 0);

    let engine = Diagnostic::non_breaking(
        "nta/declaration",
        LineColRange::from_coords(1, 11, 1, 14),
        "unknown type",
    );
    let mapped = mapper.map_model_diagnostics(vec![engine], pending);

    assert_eq!(mapped.len(), 2);
    assert_eq!(mapped[0].message, "`bad` is not allowed");
    assert_eq!(mapped[0].range, LineColRange::from_coords(1, 5, 1, 8));
    assert_eq!(mapped[1].message, "unknown type");
    assert!(mapped[1].is_from_engine());
    assert_eq!(mapped[1].range, LineColRange::from_coords(1, 5, 1, 8));
}

#[test]
fn test_engine_diagnostics_elsewhere_untouched() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Prefix { prefix: "const " })]);
    translated(mapper.map_model(&model("int x;", "int y;", "true")));

    let engine = vec![
        Diagnostic::non_breaking("nta/template[0]/declaration", LineColRange::from_coords(1, 5, 1, 6), "unused"),
        Diagnostic::warning("nta/system", LineColRange::from_coords(1, 8, 1, 9), "unknown process"),
    ];
    let mapped = mapper.map_model_diagnostics(engine.clone(), Vec::new());
    assert_eq!(mapped, engine);
}

#[test]
fn test_discarded_engine_diagnostic_removed() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(AppendHelper)]);
    let (text, _) = translated(mapper.map_model(&model("int x;", "int y;", "true")));
    assert!(text.contains("void helper() {}"), "{text}");

    let engine = vec![
        Diagnostic::non_breaking("nta/declaration", LineColRange::from_coords(2, 6, 2, 12), "helper unused"),
        Diagnostic::non_breaking("nta/declaration", LineColRange::from_coords(1, 5, 1, 6), "x unused"),
    ];
    let mapped = mapper.map_model_diagnostics(engine, Vec::new());

    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0].message, "x unused");
    assert_eq!(mapped[0].range, LineColRange::from_coords(1, 5, 1, 6));
}

#[test]
fn test_cleared_cache_leaves_diagnostics_unmapped() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Prefix { prefix: "const " })]);
    translated(mapper.map_model(&model("int x;", "int y;", "true")));
    mapper.clear_cache();
    assert_eq!(mapper.session().state(), PassState::Idle);

    let engine = vec![Diagnostic::non_breaking(
        "nta/declaration",
        LineColRange::from_coords(1, 11, 1, 12),
        "x unused",
    )];
    assert_eq!(mapper.map_model_diagnostics(engine.clone(), Vec::new()), engine);
}

// =============================================================================
// Rejection
// =============================================================================

#[test]
fn test_unrecoverable_diagnostic_rejects_pass() {
    let mut mapper = mapper_with(|| {
        vec![
            PhaseHandle::new(Prefix { prefix: "const " }),
            PhaseHandle::new(Reject {
                needle: "bad",
                severity: Severity::Unrecoverable,
            }),
        ]
    });
    let diagnostics = rejected(mapper.map_model(&model("int bad;", "int y;", "true")));

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert!(diagnostic.is_unrecoverable());
    assert_eq!(diagnostic.path, "nta/declaration");
    assert_eq!(diagnostic.phase_index, 1);
    assert_eq!(diagnostic.range, LineColRange::from_coords(1, 5, 1, 8));
    assert_eq!(mapper.session().state(), PassState::Aborted);
}

#[test]
fn test_unrecoverable_stops_later_phases() {
    let mut mapper = mapper_with(|| {
        vec![
            PhaseHandle::new(Reject {
                needle: "bad",
                severity: Severity::Unrecoverable,
            }),
            PhaseHandle::new(Faulty),
        ]
    });
    let diagnostics = rejected(mapper.map_model(&model("int bad;", "int y;", "true")));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "`bad` is not allowed");
}

#[test]
fn test_non_breaking_diagnostics_do_not_stop_pass() {
    let mut mapper = mapper_with(|| {
        vec![PhaseHandle::new(Reject {
            needle: "bad",
            severity: Severity::NonBreaking,
        })]
    });
    let (_, pending) = translated(mapper.map_model(&model("int bad;", "int bad;", "true")));

    let paths: Vec<&str> = pending.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec!["nta/declaration", "nta/template[0]/declaration"]);
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn test_fault_becomes_single_fatal_diagnostic_with_dump() {
    let directory = tempfile::tempdir().unwrap();
    let config = MapperConfig::default().with_dump_directory(directory.path());
    let mut mapper = Mapper::new(config)
        .with_plugin(TestPlugin::new("test", || {
            vec![PhaseHandle::new(Prefix { prefix: "const " }), PhaseHandle::new(Faulty)]
        }))
        .unwrap();

    let diagnostics = rejected(mapper.map_model(&model("int x;", "int y;", "true")));

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Unrecoverable);
    assert_eq!(diagnostic.path, "nta");
    assert_eq!(diagnostic.range, LineColRange::empty(LineCol::origin()));
    assert!(diagnostic.message.contains("system element not supported"), "{}", diagnostic.message);
    assert!(diagnostic.context.starts_with("fault dump written to"), "{}", diagnostic.context);

    let dumps: Vec<_> = std::fs::read_dir(directory.path()).unwrap().collect();
    assert_eq!(dumps.len(), 1);
    assert_eq!(mapper.session().state(), PassState::Idle);
}

#[test]
fn test_panicking_phase_becomes_fault() {
    let directory = tempfile::tempdir().unwrap();
    let config = MapperConfig::default().with_dump_directory(directory.path());
    let mut mapper = Mapper::new(config)
        .with_plugin(TestPlugin::new("test", || {
            vec![PhaseHandle::new(Prefix { prefix: "const " }), PhaseHandle::new(OutOfBounds)]
        }))
        .unwrap();

    let diagnostics = rejected(mapper.map_model(&model("int boom;", "int y;", "true")));

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Unrecoverable);
    assert_eq!(diagnostic.path, "nta");
    assert!(diagnostic.message.contains("out-of-bounds"), "{}", diagnostic.message);
    assert!(diagnostic.message.contains("index out of bounds"), "{}", diagnostic.message);
    assert!(diagnostic.context.starts_with("fault dump written to"), "{}", diagnostic.context);
    assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 1);
    assert_eq!(mapper.session().state(), PassState::Idle);

    let (text, pending) = translated(mapper.map_model(&model("int x;", "int y;", "true")));
    assert!(text.contains("const int x;"));
    assert!(pending.is_empty());
    assert_eq!(mapper.session().state(), PassState::Completed);
}

#[test]
fn test_fault_without_dump_directory() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Faulty)]);
    let diagnostics = rejected(mapper.map_model(&model("int x;", "int y;", "true")));

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].is_unrecoverable());
    assert!(diagnostics[0].context.is_empty());
}

#[test]
fn test_malformed_document_is_fault() {
    let mut mapper = mapper_with(|| vec![PhaseHandle::new(Rename { from: "a", to: "b" })]);
    let diagnostics = rejected(mapper.map_model("<model/>"));

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].is_unrecoverable());
    assert!(diagnostics[0].message.starts_with("internal mapper error"));
}
