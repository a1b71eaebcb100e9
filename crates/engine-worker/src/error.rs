/// Errors spawning, driving, or talking to a UCI engine subprocess.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn engine process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("{state:?} does not accept {message}")]
    WrongState { state: crate::state::WorkerState, message: &'static str },
    #[error("engine worker has shut down")]
    WorkerGone,
    #[error("engine protocol error: {0}")]
    Protocol(String),
}
