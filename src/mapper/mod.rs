//! The orchestrator between the GUI and the engine.
//!
//! A [`Mapper`] holds the phases contributed by every registered [`Plugin`],
//! in registration order. [`Mapper::map_model`] runs one pass over a model
//! document: each phase walks the whole document in turn, and an
//! unrecoverable diagnostic stops the pass. Diagnostics are folded back
//! through the phases in reverse order, each phase only seeing diagnostics
//! introduced after it ran.
//!
//! The phases of the last completed pass are kept so that engine diagnostics
//! about the translated model can still be mapped. [`Mapper::clear_cache`]
//! drops them.

mod config;
mod dump;
mod error;
mod session;

pub use config::{DUMP_DIR_ENV, MapperConfig};
pub use dump::FaultDump;
pub use error::QueryRejection;
pub use session::{PassState, Session};

pub use crate::phase::MapperError;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::base::{LineCol, LineColRange};
use crate::diagnostics::{Diagnostic, ENGINE_PHASE_INDEX, ElementPath};
use crate::document::Document;
use crate::phase::{PassOptions, PhaseHandle, QUERY_PATH, QueryPhase, SimulatorPhase, VisitError};
use crate::rewrite::{BackMapOutcome, RewriteError, Rewriter};

/// A syntax extension: phases for models, and optionally for queries and
/// simulator traffic.
pub trait Plugin {
    fn name(&self) -> &str;

    /// Model phases, in the order they run. Grammar compilation belongs here,
    /// so a broken grammar fails at registration.
    fn model_phases(&self) -> Result<Vec<PhaseHandle>, MapperError>;

    fn query_phase(&self) -> Result<Option<Box<dyn QueryPhase>>, MapperError> {
        Ok(None)
    }

    fn simulator_phase(&self) -> Option<Box<dyn SimulatorPhase>> {
        None
    }
}

/// Result of [`Mapper::map_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// The translated document, ready for the engine. `pending` holds the
    /// non-fatal mapper diagnostics, still in phase coordinates; pass them to
    /// [`Mapper::map_model_diagnostics`] with the engine's diagnostics.
    Translated { text: String, pending: Vec<Diagnostic> },
    /// The pass stopped. The diagnostics are already mapped back and the
    /// engine must not be invoked.
    Rejected { diagnostics: Vec<Diagnostic> },
}

impl ModelOutcome {
    pub fn is_translated(&self) -> bool {
        matches!(self, ModelOutcome::Translated { .. })
    }
}

/// A fault, with the phase it happened in.
struct PassFault {
    phase: Option<String>,
    error: MapperError,
}

impl From<MapperError> for PassFault {
    fn from(error: MapperError) -> Self {
        Self { phase: None, error }
    }
}

enum PassEnd {
    Completed { text: String, diagnostics: Vec<Diagnostic> },
    Aborted { diagnostics: Vec<Diagnostic> },
}

pub struct Mapper {
    config: MapperConfig,
    plugins: Vec<String>,
    phases: Vec<PhaseHandle>,
    query_phases: Vec<Box<dyn QueryPhase>>,
    simulator_phases: Vec<Box<dyn SimulatorPhase>>,
    /// One per query phase, from the last successful query.
    query_rewriters: Vec<Rewriter>,
    session: Session,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            phases: Vec::new(),
            query_phases: Vec::new(),
            simulator_phases: Vec::new(),
            query_rewriters: Vec::new(),
            session: Session::new(),
        }
    }

    pub fn with_plugin(mut self, plugin: impl Plugin) -> Result<Self, MapperError> {
        self.register(plugin)?;
        Ok(self)
    }

    /// Append a plugin's phases after those already registered.
    pub fn register(&mut self, plugin: impl Plugin) -> Result<(), MapperError> {
        let phases = plugin.model_phases()?;
        let query = plugin.query_phase()?;
        tracing::debug!(
            plugin = plugin.name(),
            model_phases = phases.len(),
            query = query.is_some(),
            "plugin registered"
        );
        self.clear_cache();
        self.phases.extend(phases);
        self.query_phases.extend(query);
        self.simulator_phases.extend(plugin.simulator_phase());
        self.plugins.push(plugin.name().to_string());
        Ok(())
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Model phases in running order.
    pub fn phases(&self) -> &[PhaseHandle] {
        &self.phases
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Drop every retained phase and rewriter state.
    pub fn clear_cache(&mut self) {
        self.session.invalidate();
        for phase in &mut self.phases {
            phase.invalidate();
        }
        self.query_rewriters.clear();
    }

    // ========================================================================
    // MODEL
    // ========================================================================

    /// Translate a model document.
    pub fn map_model(&mut self, raw: &str) -> ModelOutcome {
        let pass = self.session.begin_pass();
        tracing::debug!(pass, phases = self.phases.len(), "model pass started");

        match self.run_model_pass(raw) {
            Ok(PassEnd::Completed { text, diagnostics }) => {
                self.session.commit_pass();
                tracing::debug!(pass, pending = diagnostics.len(), "model pass completed");
                ModelOutcome::Translated {
                    text,
                    pending: diagnostics,
                }
            }
            Ok(PassEnd::Aborted { diagnostics }) => {
                tracing::debug!(pass, diagnostics = diagnostics.len(), "model pass aborted");
                match self.fold_back(diagnostics) {
                    Ok(diagnostics) => {
                        self.session.abort_pass();
                        ModelOutcome::Rejected { diagnostics }
                    }
                    Err(error) => ModelOutcome::Rejected {
                        diagnostics: vec![self.fault(PassFault::from(MapperError::from(error)), raw)],
                    },
                }
            }
            Err(fault) => ModelOutcome::Rejected {
                diagnostics: vec![self.fault(fault, raw)],
            },
        }
    }

    fn run_model_pass(&mut self, raw: &str) -> Result<PassEnd, PassFault> {
        let mut document = Document::parse(raw).map_err(MapperError::from)?;
        let entries = document.walk();
        let options = PassOptions {
            generated_code_note: &self.config.generated_code_note,
            max_match_depth: self.config.max_match_depth,
        };

        for (index, phase) in self.phases.iter_mut().enumerate() {
            phase.begin_pass(index);
        }

        let mut diagnostics = Vec::new();
        for phase in &mut self.phases {
            tracing::trace!(phase = phase.name(), index = phase.index(), "phase started");
            for entry in &entries {
                let element = document.root.at_mut(&entry.locator).ok_or_else(|| PassFault {
                    phase: Some(phase.name().to_string()),
                    error: MapperError::runtime(phase.name(), format!("element {} disappeared", entry.path)),
                })?;
                panic::catch_unwind(AssertUnwindSafe(|| {
                    phase.visit(&entry.path, element, &mut diagnostics, options)
                }))
                .unwrap_or_else(|payload| Err(MapperError::runtime(phase.name(), panic_message(payload.as_ref()))))
                .map_err(|error| PassFault {
                    phase: Some(phase.name().to_string()),
                    error,
                })?;
                if diagnostics.iter().any(Diagnostic::is_unrecoverable) {
                    tracing::debug!(phase = phase.name(), path = %entry.path, "unrecoverable diagnostic");
                    return Ok(PassEnd::Aborted { diagnostics });
                }
            }
        }

        let text = document.to_xml().map_err(MapperError::from)?;
        Ok(PassEnd::Completed { text, diagnostics })
    }

    /// Map engine diagnostics about the last translated model, together with
    /// the pending mapper diagnostics of that pass, back onto the user's model.
    ///
    /// Without a completed pass there is nothing to map with; the
    /// diagnostics are returned as given.
    pub fn map_model_diagnostics(&mut self, engine: Vec<Diagnostic>, pending: Vec<Diagnostic>) -> Vec<Diagnostic> {
        if !self.session.is_committed() {
            tracing::warn!(
                engine = engine.len(),
                pending = pending.len(),
                "no completed model pass; diagnostics left unmapped"
            );
            return engine.into_iter().chain(pending).collect();
        }

        let all: Vec<Diagnostic> = pending
            .into_iter()
            .chain(
                engine
                    .into_iter()
                    .map(|diagnostic| diagnostic.with_phase_index(ENGINE_PHASE_INDEX)),
            )
            .collect();
        match self.fold_back(all.clone()) {
            Ok(mapped) => mapped,
            Err(error) => {
                let input = serde_json::to_string(&all).unwrap_or_default();
                vec![self.fault(PassFault::from(MapperError::from(error)), &input)]
            }
        }
    }

    /// Fold diagnostics back through the phases in reverse order. Phase `i`
    /// only maps diagnostics whose phase index is greater than `i`.
    fn fold_back(&self, diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, RewriteError> {
        let mut live = diagnostics;
        for phase in self.phases.iter().rev() {
            let index = phase.index();
            let mut kept = Vec::with_capacity(live.len());
            for mut diagnostic in live {
                if diagnostic.phase_index > index && phase.back_map(&mut diagnostic)? == BackMapOutcome::Discard {
                    tracing::trace!(phase = phase.name(), path = %diagnostic.path, "diagnostic discarded");
                    continue;
                }
                kept.push(diagnostic);
            }
            live = kept;
        }
        live.sort_by_key(|diagnostic| diagnostic.phase_index);
        Ok(live)
    }

    /// Invalidate everything and describe the fault as one unrecoverable
    /// diagnostic, writing a dump when configured.
    fn fault(&mut self, fault: PassFault, input: &str) -> Diagnostic {
        tracing::error!(phase = ?fault.phase, error = %fault.error, "mapping faulted");
        self.clear_cache();
        let mut diagnostic = Diagnostic::unrecoverable(
            ElementPath::root().key(),
            LineColRange::empty(LineCol::origin()),
            format!("internal mapper error: {}", fault.error),
        );
        if let Some(directory) = &self.config.dump_directory {
            let dump = FaultDump {
                error: fault.error.to_string(),
                phase: fault.phase.clone(),
                input: input.to_string(),
            };
            match dump.write_to(directory) {
                Ok(path) => diagnostic.context = format!("fault dump written to {}", path.display()),
                Err(error) => tracing::warn!(%error, directory = %directory.display(), "could not write fault dump"),
            }
        }
        diagnostic
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Translate a query through every plugin's query phase.
    pub fn map_query(&mut self, raw: &str) -> Result<String, QueryRejection> {
        self.query_rewriters.clear();
        let note = self.config.generated_code_note.clone();
        let mut text = raw.to_string();

        for index in 0..self.query_phases.len() {
            let mut rewriter = Rewriter::new(text.as_str()).with_generated_code_note(note.as_str());
            let phase = &mut self.query_phases[index];
            tracing::trace!(phase = phase.name(), index, "query phase started");
            let result = panic::catch_unwind(AssertUnwindSafe(|| phase.map_query(&mut rewriter)))
                .unwrap_or_else(|payload| {
                    Err(VisitError::Fault(MapperError::runtime(phase.name(), panic_message(payload.as_ref()))))
                });
            match result {
                Ok(()) => {}
                Err(VisitError::Rejected(diagnostic)) => {
                    let diagnostic = query_diagnostic(diagnostic, index);
                    return match self.fold_query(diagnostic) {
                        Ok(Some(diagnostic)) => Err(QueryRejection { diagnostic }),
                        Ok(None) => Err(QueryRejection {
                            diagnostic: Diagnostic::unrecoverable(
                                QUERY_PATH,
                                LineColRange::empty(LineCol::origin()),
                                "query rejected",
                            ),
                        }),
                        Err(error) => Err(self.query_fault(PassFault::from(MapperError::from(error)), raw)),
                    };
                }
                Err(VisitError::Fault(error)) => {
                    let fault = PassFault {
                        phase: Some(self.query_phases[index].name().to_string()),
                        error,
                    };
                    return Err(self.query_fault(fault, raw));
                }
            }
            text = rewriter.rewritten_text().to_string();
            self.query_rewriters.push(rewriter);
        }
        Ok(text)
    }

    /// Map an engine diagnostic about the last translated query back onto
    /// the query as written. `None` if a phase discards it.
    pub fn map_query_diagnostic(&mut self, engine: Diagnostic) -> Option<Diagnostic> {
        let diagnostic = engine.with_phase_index(ENGINE_PHASE_INDEX);
        match self.fold_query(diagnostic.clone()) {
            Ok(mapped) => mapped,
            Err(error) => {
                let input = diagnostic.to_wire_json().unwrap_or_default();
                Some(self.query_fault(PassFault::from(MapperError::from(error)), &input).diagnostic)
            }
        }
    }

    fn fold_query(&self, mut diagnostic: Diagnostic) -> Result<Option<Diagnostic>, RewriteError> {
        for (index, rewriter) in self.query_rewriters.iter().enumerate().rev() {
            if diagnostic.phase_index > index && rewriter.back_map_diagnostic(&mut diagnostic)? == BackMapOutcome::Discard {
                return Ok(None);
            }
        }
        Ok(Some(diagnostic))
    }

    fn query_fault(&mut self, fault: PassFault, input: &str) -> QueryRejection {
        let diagnostic = self.fault(fault, input).with_path(QUERY_PATH);
        QueryRejection { diagnostic }
    }

    // ========================================================================
    // SIMULATOR
    // ========================================================================

    /// Pass a simulator request through every simulator phase, in plugin order.
    pub fn map_simulator_request(&mut self, request: &str) -> Result<String, MapperError> {
        let mut text = request.to_string();
        for phase in &mut self.simulator_phases {
            text = phase.map_request(&text)?;
        }
        Ok(text)
    }

    /// Pass a simulator response back through the simulator phases, in
    /// reverse plugin order.
    pub fn map_simulator_response(&mut self, response: &str) -> Result<String, MapperError> {
        let mut text = response.to_string();
        for phase in self.simulator_phases.iter_mut().rev() {
            text = phase.map_response(&text)?;
        }
        Ok(text)
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .field("phases", &self.phases)
            .field("query_phases", &self.query_phases.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field(
                "simulator_phases",
                &self.simulator_phases.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("session", &self.session)
            .finish()
    }
}

/// Stamp a query phase rejection with its phase and the query path.
/// The message a panicking phase left behind.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

fn query_diagnostic(diagnostic: Diagnostic, index: usize) -> Diagnostic {
    let diagnostic = diagnostic.with_phase_index(index);
    if diagnostic.path.is_empty() {
        diagnostic.with_path(QUERY_PATH)
    } else {
        diagnostic
    }
}
