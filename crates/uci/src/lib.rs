//! UCI (Universal Chess Interface) wire protocol: the vocabulary an
//! engine worker exchanges with a child engine process over its stdio
//! pipes.
//!
//! # GUI to engine
//!
//! [`GuiCommand`] covers `uci`, `debug`, `isready`, `register`,
//! `setoption`, `ucinewgame`, `position`, `go`, `stop`, `ponderhit`, and
//! `quit`.
//!
//! # Engine to GUI
//!
//! [`EngineMessage`] covers `id`, `uciok`, `readyok`, registration
//! errors, `option` descriptors, `info` search progress and free-text
//! strings, and `bestmove`.

mod command;
mod info;

pub use command::{GoOptions, GuiCommand, Register};
pub use info::{InfoBuilder, OptionDescriptor, OptionType, Score, SearchInfo};

use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// `id` sub-field: name or author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdField {
    Name(String),
    Author(String),
}

/// Messages sent from engine to GUI (or, inside the worker, enqueued on
/// its inbound queue — `Error` and `MainloopAlive` are synthesized
/// internally and never appear on the wire).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    Id(IdField),
    UciOk,
    ReadyOk,
    RegistrationError(String),
    Option(OptionDescriptor),
    /// Search progress: depth, score, pv, etc.
    InfoSearch(SearchInfo),
    /// A bare `info string ...` line: free text for the operator.
    InfoString(String),
    BestMove {
        best: String,
        ponder: Option<String>,
    },
    /// Synthesized by the worker itself on a protocol or timeout failure;
    /// never parsed off the wire.
    Error(String),
    /// Synthesized heartbeat so the owner can tell the worker loop is
    /// still alive during a long search.
    MainloopAlive,
}

impl EngineMessage {
    /// Formats this message for output (used by test doubles standing in
    /// for a real engine).
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id(IdField::Name(n)) => format!("id name {n}"),
            EngineMessage::Id(IdField::Author(a)) => format!("id author {a}"),
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::RegistrationError(msg) => format!("registration error {msg}"),
            EngineMessage::Option(opt) => render_option(opt),
            EngineMessage::InfoSearch(info) => info.to_uci(),
            EngineMessage::InfoString(s) => format!("info string {s}"),
            EngineMessage::BestMove { best, ponder } => match ponder {
                Some(p) => format!("bestmove {best} ponder {p}"),
                None => format!("bestmove {best}"),
            },
            EngineMessage::Error(msg) => format!("error {msg}"),
            EngineMessage::MainloopAlive => "mainloop alive".to_string(),
        }
    }

    /// Parses a single line received from the child engine's stdout.
    /// Unrecognized lines return `None` rather than an error: the worker
    /// is expected to silently skip lines it doesn't understand, per the
    /// protocol's forward-compatibility stance.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let head = parts.next()?;
        let rest: Vec<&str> = parts.collect();

        match head {
            "uciok" => Some(EngineMessage::UciOk),
            "readyok" => Some(EngineMessage::ReadyOk),
            "id" => match rest.first() {
                Some(&"name") => Some(EngineMessage::Id(IdField::Name(rest[1..].join(" ")))),
                Some(&"author") => Some(EngineMessage::Id(IdField::Author(rest[1..].join(" ")))),
                _ => None,
            },
            "registration" if rest.first() == Some(&"error") => {
                Some(EngineMessage::RegistrationError(rest[1..].join(" ")))
            }
            "option" => OptionDescriptor::parse(&rest).map(EngineMessage::Option),
            "info" => {
                if rest.first() == Some(&"string") {
                    Some(EngineMessage::InfoString(rest[1..].join(" ")))
                } else {
                    Some(EngineMessage::InfoSearch(SearchInfo::parse(&rest)))
                }
            }
            "bestmove" => {
                if rest.is_empty() {
                    return None;
                }
                let best = rest[0].to_string();
                let ponder = rest
                    .iter()
                    .position(|&t| t == "ponder")
                    .and_then(|i| rest.get(i + 1))
                    .map(|s| s.to_string());
                Some(EngineMessage::BestMove { best, ponder })
            }
            _ => None,
        }
    }
}

fn render_option(opt: &OptionDescriptor) -> String {
    let type_str = match opt.option_type {
        OptionType::Check => "check",
        OptionType::Spin => "spin",
        OptionType::Combo => "combo",
        OptionType::Button => "button",
        OptionType::String => "string",
    };
    let mut s = format!("option name {} type {}", opt.name, type_str);
    if let Some(ref d) = opt.default {
        s.push_str(&format!(" default {d}"));
    }
    if let Some(min) = opt.min {
        s.push_str(&format!(" min {min}"));
    }
    if let Some(max) = opt.max {
        s.push_str(&format!(" max {max}"));
    }
    for v in &opt.vars {
        s.push_str(&format!(" var {v}"));
    }
    s
}

/// A minimal line-oriented UCI endpoint over arbitrary reader/writer
/// pairs. The engine worker drives a real child process directly; this
/// is for test doubles and simple scripted engines.
pub struct UciEngine<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciEngine<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads and parses the next command from the GUI side.
    pub fn read_command(&mut self) -> Result<GuiCommand, UciError> {
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        GuiCommand::parse(&line)
    }

    /// Sends a message to the GUI side.
    pub fn send(&mut self, msg: &EngineMessage) -> Result<(), UciError> {
        writeln!(self.writer, "{}", msg.to_uci())?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn send_id(&mut self, name: &str, author: &str) -> Result<(), UciError> {
        self.send(&EngineMessage::Id(IdField::Name(name.to_string())))?;
        self.send(&EngineMessage::Id(IdField::Author(author.to_string())))
    }

    pub fn send_uciok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::UciOk)
    }

    pub fn send_readyok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::ReadyOk)
    }

    pub fn send_bestmove(&mut self, best: &str, ponder: Option<&str>) -> Result<(), UciError> {
        self.send(&EngineMessage::BestMove {
            best: best.to_string(),
            ponder: ponder.map(str::to_string),
        })
    }

    pub fn send_info(&mut self, info: SearchInfo) -> Result<(), UciError> {
        self.send(&EngineMessage::InfoSearch(info))
    }
}

/// Creates a UCI endpoint using stdin/stdout.
pub fn stdio_engine() -> UciEngine<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    UciEngine::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bestmove_with_ponder() {
        let msg = EngineMessage::parse("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(
            msg,
            EngineMessage::BestMove {
                best: "e2e4".to_string(),
                ponder: Some("e7e5".to_string())
            }
        );
    }

    #[test]
    fn parse_bestmove_without_ponder() {
        let msg = EngineMessage::parse("bestmove e2e4").unwrap();
        assert_eq!(
            msg,
            EngineMessage::BestMove {
                best: "e2e4".to_string(),
                ponder: None
            }
        );
    }

    #[test]
    fn parse_id_name_and_author() {
        assert_eq!(
            EngineMessage::parse("id name Deep Thought").unwrap(),
            EngineMessage::Id(IdField::Name("Deep Thought".to_string()))
        );
        assert_eq!(
            EngineMessage::parse("id author The Minds").unwrap(),
            EngineMessage::Id(IdField::Author("The Minds".to_string()))
        );
    }

    #[test]
    fn parse_uciok_and_readyok() {
        assert_eq!(EngineMessage::parse("uciok").unwrap(), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("readyok").unwrap(), EngineMessage::ReadyOk);
    }

    #[test]
    fn parse_info_string_vs_info_search() {
        assert_eq!(
            EngineMessage::parse("info string mate solver engaged").unwrap(),
            EngineMessage::InfoString("mate solver engaged".to_string())
        );
        match EngineMessage::parse("info depth 4 score cp 12").unwrap() {
            EngineMessage::InfoSearch(info) => {
                assert_eq!(info.depth, Some(4));
            }
            other => panic!("expected InfoSearch, got {other:?}"),
        }
    }

    #[test]
    fn parse_option_descriptor() {
        let msg = EngineMessage::parse("option name Hash type spin default 16 min 1 max 1024").unwrap();
        match msg {
            EngineMessage::Option(opt) => {
                assert_eq!(opt.name, "Hash");
                assert_eq!(opt.option_type, OptionType::Spin);
            }
            other => panic!("expected Option, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_line_returns_none() {
        assert_eq!(EngineMessage::parse("copyprotection checking"), None);
    }
}
