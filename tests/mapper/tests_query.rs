//! Query translation and simulator traffic.

use mapper::base::LineColRange;
use mapper::diagnostics::{Diagnostic, Severity};
use mapper::mapper::{Mapper, MapperError, Plugin};
use mapper::phase::{PhaseHandle, QueryPhase, SimulatorPhase};

use crate::helpers::{Always, NoQuestionMarks, QueryOutOfBounds, TestPlugin};

fn always() -> Box<dyn QueryPhase> {
    Box::new(Always)
}

fn no_question_marks() -> Box<dyn QueryPhase> {
    Box::new(NoQuestionMarks)
}

fn query_out_of_bounds() -> Box<dyn QueryPhase> {
    Box::new(QueryOutOfBounds)
}

fn query_mapper() -> Mapper {
    Mapper::default()
        .with_plugin(TestPlugin::new("always", Vec::new).with_query(always))
        .unwrap()
        .with_plugin(TestPlugin::new("strict", Vec::new).with_query(no_question_marks))
        .unwrap()
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_query_rewritten() {
    let mut mapper = query_mapper();
    assert_eq!(mapper.map_query("always (x > 1)").unwrap(), "A[] (x > 1)");
    assert_eq!(mapper.map_query("E<> done").unwrap(), "E<> done");
}

#[test]
fn test_query_without_phases_is_unchanged() {
    let mut mapper = Mapper::default();
    assert_eq!(mapper.map_query("A[] not deadlock").unwrap(), "A[] not deadlock");
}

#[test]
fn test_engine_query_diagnostic_mapped_back() {
    let mut mapper = query_mapper();
    mapper.map_query("always (x > 1)").unwrap();

    let on_operator = Diagnostic::non_breaking("query", LineColRange::from_coords(1, 1, 1, 4), "bad quantifier");
    let mapped = mapper.map_query_diagnostic(on_operator).unwrap();
    assert_eq!(mapped.range, LineColRange::from_coords(1, 1, 1, 7));
    assert_eq!(mapped.message, "bad quantifier");

    let on_variable = Diagnostic::non_breaking("query", LineColRange::from_coords(1, 6, 1, 7), "unknown name");
    let mapped = mapper.map_query_diagnostic(on_variable).unwrap();
    assert_eq!(mapped.range, LineColRange::from_coords(1, 9, 1, 10));
}

#[test]
fn test_rejection_mapped_through_earlier_phases() {
    let mut mapper = query_mapper();
    let rejection = mapper.map_query("always ??").unwrap_err();

    let diagnostic = rejection.diagnostic;
    assert_eq!(diagnostic.path, "query");
    assert_eq!(diagnostic.severity, Severity::NonBreaking);
    assert_eq!(diagnostic.phase_index, 1);
    assert_eq!(diagnostic.message, "unexpected `??`");
    assert_eq!(diagnostic.range, LineColRange::from_coords(1, 8, 1, 10));
}

#[test]
fn test_rejection_display() {
    let mut mapper = query_mapper();
    let rejection = mapper.map_query("??").unwrap_err();
    assert_eq!(rejection.to_string(), "query rejected: error query:1:1: unexpected `??`");
}

#[test]
fn test_panicking_query_phase_becomes_fault() {
    let mut mapper = query_mapper()
        .with_plugin(TestPlugin::new("panicky", Vec::new).with_query(query_out_of_bounds))
        .unwrap();

    let rejection = mapper.map_query("always boom").unwrap_err();
    let diagnostic = rejection.diagnostic;
    assert_eq!(diagnostic.path, "query");
    assert_eq!(diagnostic.severity, Severity::Unrecoverable);
    assert!(diagnostic.message.contains("query-out-of-bounds"), "{}", diagnostic.message);

    assert_eq!(mapper.map_query("always done").unwrap(), "A[] done");
}

// =============================================================================
// Simulator
// =============================================================================

struct Tag(&'static str);

impl SimulatorPhase for Tag {
    fn name(&self) -> &str {
        self.0
    }

    fn map_request(&mut self, request: &str) -> Result<String, MapperError> {
        Ok(format!("{request}+{}", self.0))
    }

    fn map_response(&mut self, response: &str) -> Result<String, MapperError> {
        Ok(format!("{response}-{}", self.0))
    }
}

struct Identity;

impl SimulatorPhase for Identity {
    fn name(&self) -> &str {
        "identity"
    }
}

fn tag_a() -> Box<dyn SimulatorPhase> {
    Box::new(Tag("a"))
}

fn tag_b() -> Box<dyn SimulatorPhase> {
    Box::new(Tag("b"))
}

fn identity() -> Box<dyn SimulatorPhase> {
    Box::new(Identity)
}

struct SimulatorPlugin(fn() -> Box<dyn SimulatorPhase>);

impl Plugin for SimulatorPlugin {
    fn name(&self) -> &str {
        "simulator"
    }

    fn model_phases(&self) -> Result<Vec<PhaseHandle>, MapperError> {
        Ok(Vec::new())
    }

    fn simulator_phase(&self) -> Option<Box<dyn SimulatorPhase>> {
        Some((self.0)())
    }
}

#[test]
fn test_simulator_traffic_runs_both_ways() {
    let mut mapper = Mapper::default()
        .with_plugin(SimulatorPlugin(tag_a))
        .unwrap()
        .with_plugin(SimulatorPlugin(identity))
        .unwrap()
        .with_plugin(SimulatorPlugin(tag_b))
        .unwrap();

    assert_eq!(mapper.map_simulator_request("step").unwrap(), "step+a+b");
    assert_eq!(mapper.map_simulator_response("state").unwrap(), "state-b-a");
}

#[test]
fn test_simulator_without_phases_is_identity() {
    let mut mapper = Mapper::default();
    assert_eq!(mapper.map_simulator_request("step").unwrap(), "step");
    assert_eq!(mapper.map_simulator_response("state").unwrap(), "state");
}
