//! The owner-facing handle: typed command methods that enforce the
//! state machine, the dual bounded queues, and the position-while-
//! thinking/pending-set_option special cases spec §4.8 calls out.
//!
//! Grounded on `bot-arena::uci_client::UciClient`'s synchronous
//! `spawn`/`init`/`set_position`/`go`/`quit` surface, generalized from
//! its one-shot "send command, block for the one reply we want" style
//! into a queue-backed async handle that also exposes the engine's
//! unsolicited `info`/`id`/`option` traffic to the owner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chess_core::Move;
use chess_engine::{Game, TimeControl, TimeTracker};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uci::{EngineMessage, GoOptions, GuiCommand, IdField, Register};

use crate::cancellation::CancellationToken;
use crate::error::WorkerError;
use crate::pv;
use crate::state::WorkerState;
use crate::worker;

const QUEUE_CAPACITY: usize = 64;

/// A handle to one running (or not-yet-spawned) UCI engine subprocess.
pub struct Engine {
    state: WorkerState,
    cmd_tx: mpsc::Sender<GuiCommand>,
    msg_rx: mpsc::Receiver<EngineMessage>,
    /// Messages pulled off `msg_rx` while draining toward a specific
    /// reply (the discarded `bestmove` during a position-while-thinking
    /// reorder, or the handshake's `uciok`/`readyok`) that weren't the
    /// reply being waited for, and so are owed back to the next `recv`.
    buffered: VecDeque<EngineMessage>,
    quit: CancellationToken,
    worker_handle: JoinHandle<()>,
    /// The position last sent via `position`, kept only to resolve
    /// `pv`/`bestmove` wire text into flagged `Move`s.
    shadow: Game,
    pending_options: Vec<(String, Option<String>)>,
    last_go: Option<GoOptions>,
    think_started: Option<Instant>,
    time_tracker: Option<TimeTracker>,
    last_best_move: Option<(Move, Option<Move>)>,
    /// The engine's self-reported name, filled in by [`Engine::init`].
    pub name: String,
}

impl Engine {
    /// Spawns the child process and starts its background I/O worker.
    /// The engine starts in [`WorkerState::Loaded`]; call [`Engine::init`]
    /// to complete the `uci`/`isready` handshake.
    pub fn spawn(path: &str) -> Result<Self, WorkerError> {
        let child = worker::spawn_child(path).map_err(WorkerError::Spawn)?;
        let (cmd_tx, cmd_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (msg_tx, msg_rx) = mpsc::channel(QUEUE_CAPACITY);
        let quit = CancellationToken::new();

        let worker_handle = tokio::spawn(worker::run(child, cmd_rx, msg_tx, quit.clone()));

        Ok(Engine {
            state: WorkerState::Loaded,
            cmd_tx,
            msg_rx,
            buffered: VecDeque::new(),
            quit,
            worker_handle,
            shadow: Game::new(),
            pending_options: Vec::new(),
            last_go: None,
            think_started: None,
            time_tracker: None,
            last_best_move: None,
            name: String::new(),
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Sends `uci`, waits for `uciok` (capturing the `id name` along the
    /// way), then sends `isready` and waits for `readyok`. Mirrors
    /// `UciClient::init`, with each wait bounded by `timeout`.
    pub async fn init(&mut self, timeout: Duration) -> Result<(), WorkerError> {
        if self.state != WorkerState::Loaded {
            return Err(self.wrong_state("uci"));
        }
        self.send(GuiCommand::Uci).await?;
        loop {
            match self.recv_within(timeout).await {
                EngineMessage::Id(IdField::Name(name)) => self.name = name,
                EngineMessage::UciOk => break,
                EngineMessage::Error(e) => return Err(WorkerError::Protocol(e)),
                _ => {}
            }
        }
        self.state = WorkerState::Idle;

        self.send(GuiCommand::IsReady).await?;
        loop {
            match self.recv_within(timeout).await {
                EngineMessage::ReadyOk => break,
                EngineMessage::Error(e) => return Err(WorkerError::Protocol(e)),
                _ => {}
            }
        }
        Ok(())
    }

    pub async fn debug(&mut self, on: bool) -> Result<(), WorkerError> {
        self.require(WorkerState::Idle, "debug")?;
        self.send(GuiCommand::Debug(on)).await
    }

    pub async fn is_ready(&mut self) -> Result<(), WorkerError> {
        self.require(WorkerState::Idle, "is_ready")?;
        self.send(GuiCommand::IsReady).await
    }

    pub async fn register(&mut self, reg: Register) -> Result<(), WorkerError> {
        self.require(WorkerState::Idle, "register")?;
        self.send(GuiCommand::Register(reg)).await
    }

    pub async fn new_game(&mut self) -> Result<(), WorkerError> {
        self.require(WorkerState::Idle, "new_game")?;
        self.send(GuiCommand::NewGame).await
    }

    /// Sets an engine option. Sent immediately in `Idle`/`Ready`; queued
    /// and flushed on the next completed think while `Thinking`.
    pub async fn set_option(&mut self, name: impl Into<String>, value: Option<String>) -> Result<(), WorkerError> {
        let name = name.into();
        match self.state {
            WorkerState::Idle | WorkerState::Ready => {
                self.send(GuiCommand::SetOption { name, value }).await
            }
            WorkerState::Thinking => {
                self.pending_options.push((name, value));
                Ok(())
            }
            _ => Err(self.wrong_state("set_option")),
        }
    }

    /// Sets the position to search from. While `Thinking`, this is the
    /// atomic reorder spec describes: stop, discard the next `bestmove`,
    /// send the new position, then resend the last `go`.
    pub async fn position(&mut self, fen: Option<String>, moves: Vec<String>) -> Result<(), WorkerError> {
        match self.state {
            WorkerState::Idle | WorkerState::Ready => {
                self.send(GuiCommand::Position { fen: fen.clone(), moves: moves.clone() }).await?;
                self.shadow = pv::apply_position(fen.as_deref(), &moves);
                self.state = WorkerState::Ready;
                Ok(())
            }
            WorkerState::Thinking => {
                self.send(GuiCommand::Stop).await?;
                self.discard_next_best_move().await?;
                self.state = WorkerState::Ready;
                self.flush_pending_options().await?;

                self.send(GuiCommand::Position { fen: fen.clone(), moves: moves.clone() }).await?;
                self.shadow = pv::apply_position(fen.as_deref(), &moves);
                let go = self.last_go.clone().unwrap_or_default();
                self.send(GuiCommand::Go(go)).await?;
                self.think_started = Some(Instant::now());
                self.state = WorkerState::Thinking;
                Ok(())
            }
            _ => Err(self.wrong_state("position")),
        }
    }

    /// Drains messages until (and discarding) the next `bestmove`,
    /// buffering everything else so `recv` still sees it afterward.
    async fn discard_next_best_move(&mut self) -> Result<(), WorkerError> {
        loop {
            let msg = self.next_raw().await?;
            if matches!(msg, EngineMessage::BestMove { .. }) {
                return Ok(());
            }
            self.buffered.push_back(msg);
        }
    }

    pub async fn go(&mut self, opts: GoOptions) -> Result<(), WorkerError> {
        self.require(WorkerState::Ready, "go")?;
        self.send(GuiCommand::Go(opts.clone())).await?;
        self.last_go = Some(opts);
        self.think_started = Some(Instant::now());
        self.state = WorkerState::Thinking;
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), WorkerError> {
        self.require(WorkerState::Thinking, "stop")?;
        self.send(GuiCommand::Stop).await
    }

    pub async fn ponder_hit(&mut self) -> Result<(), WorkerError> {
        self.require(WorkerState::Thinking, "ponder_hit")?;
        self.send(GuiCommand::PonderHit).await
    }

    pub async fn quit(&mut self) -> Result<(), WorkerError> {
        self.send(GuiCommand::Quit).await?;
        self.quit.cancel();
        self.state = WorkerState::Unloaded;
        Ok(())
    }

    /// Sets the clock this engine is playing under. Cleared (and
    /// restarted) on the next call; `go`'s per-clock times should
    /// usually be derived from [`Engine::time_left_ms`] rather than
    /// tracked independently by the caller.
    pub fn set_time_control(&mut self, control: TimeControl) {
        self.time_tracker = Some(TimeTracker::new(control));
    }

    pub fn time_left_ms(&self) -> Option<u64> {
        self.time_tracker.as_ref().map(TimeTracker::time_left_ms)
    }

    pub fn out_of_time(&self) -> Option<bool> {
        self.time_tracker.as_ref().map(TimeTracker::out_of_time)
    }

    /// The most recently resolved `bestmove`/`ponder` pair, as flagged
    /// [`Move`]s rather than wire text. `None` until the first `bestmove`
    /// arrives, or if it failed to resolve against the last known position.
    pub fn last_best_move(&self) -> Option<(Move, Option<Move>)> {
        self.last_best_move
    }

    /// Waits for the next message, applying state transitions and the
    /// pending-option flush/time-tracking side effects a `bestmove`
    /// triggers. Blocks indefinitely; use [`Engine::recv_within`] to
    /// bound the wait.
    pub async fn recv(&mut self) -> Result<EngineMessage, WorkerError> {
        let mut msg = self.next_raw().await?;

        if let EngineMessage::InfoSearch(ref mut info) = msg {
            info.pv = pv::truncate_pv(&self.shadow, &info.pv);
        }

        if let EngineMessage::Id(IdField::Name(ref name)) = msg {
            self.name = name.clone();
        }

        if matches!(msg, EngineMessage::UciOk) && self.state == WorkerState::Loaded {
            self.state = WorkerState::Idle;
        }

        if let EngineMessage::BestMove { ref best, ref ponder } = msg {
            if self.state == WorkerState::Thinking {
                if let Some(started) = self.think_started.take() {
                    if let Some(tracker) = self.time_tracker.as_mut() {
                        tracker.record_think(started.elapsed().as_millis() as u64);
                    }
                }
                let (resolved_best, resolved_ponder) =
                    pv::resolve_best_move(&self.shadow, best, ponder.as_deref());
                if let Some(mv) = resolved_best {
                    self.shadow.make_move_uci(&mv.to_uci()).ok();
                }
                self.last_best_move = resolved_best.map(|b| (b, resolved_ponder));
                self.state = WorkerState::Ready;
                self.flush_pending_options().await?;
            }
        }

        Ok(msg)
    }

    /// Like [`Engine::recv`], but returns a synthetic `error` message
    /// instead of blocking past `timeout` — the worker stays alive, per
    /// spec's "a wait that returns timed-out is an error condition
    /// surfaced to the caller" rule.
    pub async fn recv_within(&mut self, timeout: Duration) -> EngineMessage {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Ok(msg)) => msg,
            Ok(Err(e)) => EngineMessage::Error(e.to_string()),
            Err(_) => EngineMessage::Error("timed out waiting for engine reply".to_string()),
        }
    }

    async fn flush_pending_options(&mut self) -> Result<(), WorkerError> {
        let pending = std::mem::take(&mut self.pending_options);
        for (name, value) in pending {
            self.send(GuiCommand::SetOption { name, value }).await?;
        }
        Ok(())
    }

    async fn next_raw(&mut self) -> Result<EngineMessage, WorkerError> {
        if let Some(msg) = self.buffered.pop_front() {
            return Ok(msg);
        }
        self.msg_rx.recv().await.ok_or(WorkerError::WorkerGone)
    }

    async fn send(&self, cmd: GuiCommand) -> Result<(), WorkerError> {
        self.cmd_tx.send(cmd).await.map_err(|_| WorkerError::WorkerGone)
    }

    fn require(&self, expected: WorkerState, message: &'static str) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.wrong_state(message))
        }
    }

    fn wrong_state(&self, message: &'static str) -> WorkerError {
        WorkerError::WrongState { state: self.state, message }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.quit.cancel();
        self.worker_handle.abort();
    }
}
