//! Pass lifecycle.

/// Where the current model pass stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    /// No pass, or the last one was invalidated.
    #[default]
    Idle,
    Running,
    /// The pass finished; its phases can still map engine diagnostics.
    Completed,
    /// An unrecoverable diagnostic stopped the pass.
    Aborted,
}

/// Tracks model passes: `begin_pass`, then `commit_pass` or `abort_pass`,
/// and `invalidate` whenever retained phase state stops being valid.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: PassState,
    passes: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Number of passes begun so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Whether a completed pass is available to map engine diagnostics.
    pub fn is_committed(&self) -> bool {
        self.state == PassState::Completed
    }

    /// Start a pass and return its number, counting from 1.
    pub fn begin_pass(&mut self) -> u64 {
        self.passes += 1;
        self.state = PassState::Running;
        self.passes
    }

    pub fn commit_pass(&mut self) {
        if self.state == PassState::Running {
            self.state = PassState::Completed;
        }
    }

    pub fn abort_pass(&mut self) {
        if self.state == PassState::Running {
            self.state = PassState::Aborted;
        }
    }

    pub fn invalidate(&mut self) {
        self.state = PassState::Idle;
    }
}
