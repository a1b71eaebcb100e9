/// The engine worker's lifecycle state. Transitions are driven by
/// [`crate::Engine`]'s command methods and by inbound protocol messages
/// (`uciok`, `bestmove`, `stop`'s acknowledgement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No child process spawned yet.
    Unloaded,
    /// Child spawned, `uci` not yet sent.
    Loaded,
    /// `uciok` received; accepts setup commands.
    Idle,
    /// A position has been set; accepts `go`.
    Ready,
    /// `go` has been sent; waiting for `bestmove`.
    Thinking,
}

impl WorkerState {
    /// Whether `debug`/`is_ready`/`new_game`/`set_option` may be sent
    /// outside of a `position`/`go` transition (valid in `Idle` and,
    /// for `set_option`, also `Ready`).
    pub fn accepts_setup(self) -> bool {
        matches!(self, WorkerState::Idle | WorkerState::Ready)
    }
}
