//! Async child-process driver for a UCI-speaking chess engine.
//!
//! This crate provides:
//! - [`Engine`] - spawns the subprocess, owns its stdin/stdout queues,
//!   and enforces the `unloaded`/`loaded`/`idle`/`ready`/`thinking`
//!   state machine
//! - [`WorkerState`] - the state machine's values
//! - [`CancellationToken`] - the hand-rolled quit signal `Engine` and
//!   its background I/O task share
//! - [`WorkerError`] - everything that can go wrong spawning, driving,
//!   or talking to the subprocess
//!
//! `worker` and `pv` are private: `worker::run` is the background task
//! [`Engine::spawn`] starts, and `pv` resolves `info`/`bestmove` wire
//! text into flagged moves. Neither is meant to be driven directly.
//!
//! # Example
//!
//! ```no_run
//! use engine_worker::Engine;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), engine_worker::WorkerError> {
//! let mut engine = Engine::spawn("/usr/bin/stockfish")?;
//! engine.init(Duration::from_secs(5)).await?;
//! engine.position(None, vec![]).await?;
//! engine.go(uci::GoOptions { movetime: Some(1000), ..Default::default() }).await?;
//! let bestmove = engine.recv_within(Duration::from_secs(10)).await;
//! # Ok(())
//! # }
//! ```

mod pv;
mod worker;

pub mod cancellation;
pub mod engine;
pub mod error;
pub mod state;

pub use cancellation::CancellationToken;
pub use engine::Engine;
pub use error::WorkerError;
pub use state::WorkerState;
