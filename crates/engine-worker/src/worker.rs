//! The background task that owns the child process's pipes. Rewritten
//! from `bot-arena::uci_client::UciClient`'s synchronous
//! `Command`/`Child`/`BufReader` pair onto `tokio::process`, and onto a
//! cooperative `select!` loop in place of its blocking `read_line`
//! calls, per the three-wait-source design: the outbound command queue,
//! the child's stdout, and the quit token.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, warn};
use uci::{EngineMessage, GuiCommand};

use crate::cancellation::CancellationToken;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub fn spawn_child(path: &str) -> std::io::Result<Child> {
    Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}

/// Drives one child process until the quit token fires or the child's
/// stdout closes. Never suspends mid-parse: each wake reads whatever
/// line arrived and hands it to `EngineMessage::parse` in one step.
pub async fn run(mut child: Child, mut outbound_rx: mpsc::Receiver<GuiCommand>, inbound_tx: mpsc::Sender<EngineMessage>, quit: CancellationToken) {
    let mut stdin = match child.stdin.take() {
        Some(s) => s,
        None => return,
    };
    let stdout = match child.stdout.take() {
        Some(s) => s,
        None => return,
    };
    let mut lines = BufReader::new(stdout).lines();
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            cmd = outbound_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        if let Err(e) = send_line(&mut stdin, &cmd.to_uci()).await {
                            warn!(error = %e, "failed writing to engine stdin");
                            let _ = inbound_tx.send(EngineMessage::Error(format!("write failed: {e}"))).await;
                        }
                        if matches!(cmd, GuiCommand::Quit) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        debug!(line = %text, "engine -> worker");
                        if let Some(msg) = EngineMessage::parse(&text) {
                            if inbound_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        let _ = inbound_tx.send(EngineMessage::Error("engine process closed stdout".to_string())).await;
                        break;
                    }
                    Err(e) => {
                        let _ = inbound_tx.send(EngineMessage::Error(format!("read failed: {e}"))).await;
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                let _ = inbound_tx.try_send(EngineMessage::MainloopAlive);
            }
            _ = quit.cancelled() => {
                debug!("quit token set, shutting down engine worker");
                break;
            }
        }
    }

    shutdown(&mut child, &mut stdin).await;
}

async fn send_line(stdin: &mut tokio::process::ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

/// Best-effort `quit`, then a bounded wait for the child to exit on its
/// own, then `kill()`. Stands in for the platform SIGINT-then-SIGKILL
/// escalation spec describes: there's no signal-sending dependency in
/// this workspace's stack, so the graceful step is the wire-level
/// `quit` command rather than a raw SIGINT.
async fn shutdown(child: &mut Child, stdin: &mut tokio::process::ChildStdin) {
    let _ = send_line(stdin, "quit").await;
    match tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, child.wait()).await {
        Ok(_) => {}
        Err(_) => {
            warn!("engine did not exit after quit, killing process");
            let _ = child.kill().await;
        }
    }
}
