//! GUI-to-engine command vocabulary and outbound wire rendering.

use crate::UciError;

/// Commands the worker sends to its child engine process.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Switch the engine into UCI mode.
    Uci,
    /// Toggle debug output.
    Debug(bool),
    /// Check if the engine is ready.
    IsReady,
    /// Register the engine (or defer registration).
    Register(Register),
    /// Set an engine option.
    SetOption { name: String, value: Option<String> },
    /// Tell the engine a new game is starting.
    NewGame,
    /// Set up the position to search from.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start searching.
    Go(GoOptions),
    /// Stop searching immediately.
    Stop,
    /// Tell the engine the move it was pondering was played.
    PonderHit,
    /// Terminate the engine.
    Quit,
    /// Anything not recognized above, kept verbatim for forward compatibility.
    Unknown(String),
}

/// The `register` command's two forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Register {
    Later,
    NameCode { name: String, code: String },
}

/// Options for the `go` command. Only one search mode is ever sent on the
/// wire; `to_uci` selects infinite, then depth, then per-clock times, then
/// fixed move time, in that priority order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    pub movetime: Option<u64>,
    pub depth: Option<u32>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub infinite: bool,
}

impl GoOptions {
    fn to_uci_body(&self) -> String {
        if self.infinite {
            return "infinite".to_string();
        }
        if let Some(d) = self.depth {
            return format!("depth {d}");
        }
        if self.wtime.is_some() || self.btime.is_some() || self.winc.is_some() || self.binc.is_some()
        {
            let mut parts = Vec::new();
            if let Some(w) = self.wtime {
                parts.push(format!("wtime {w}"));
            }
            if let Some(b) = self.btime {
                parts.push(format!("btime {b}"));
            }
            if let Some(w) = self.winc {
                parts.push(format!("winc {w}"));
            }
            if let Some(b) = self.binc {
                parts.push(format!("binc {b}"));
            }
            if let Some(m) = self.movestogo {
                parts.push(format!("movestogo {m}"));
            }
            return parts.join(" ");
        }
        if let Some(mt) = self.movetime {
            return format!("movetime {mt}");
        }
        String::new()
    }
}

impl GuiCommand {
    /// Renders the outbound wire form sent to the child process's stdin.
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::Debug(on) => format!("debug {}", if *on { "on" } else { "off" }),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::Register(Register::Later) => "register later".to_string(),
            GuiCommand::Register(Register::NameCode { name, code }) => {
                format!("register name {name} code {code}")
            }
            GuiCommand::SetOption { name, value } => match value {
                Some(v) => format!("setoption name {name} value {v}"),
                None => format!("setoption name {name}"),
            },
            GuiCommand::NewGame => "ucinewgame".to_string(),
            GuiCommand::Position { fen, moves } => {
                let mut s = match fen {
                    Some(f) => format!("position fen {f}"),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    s.push_str(" moves ");
                    s.push_str(&moves.join(" "));
                }
                s
            }
            GuiCommand::Go(opts) => {
                let body = opts.to_uci_body();
                if body.is_empty() {
                    "go".to_string()
                } else {
                    format!("go {body}")
                }
            }
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::PonderHit => "ponderhit".to_string(),
            GuiCommand::Quit => "quit".to_string(),
            GuiCommand::Unknown(s) => s.clone(),
        }
    }

    /// Parses a line received from the GUI side of the connection. Used by
    /// test doubles that stand in for a real engine.
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "uci" => Ok(GuiCommand::Uci),
            "isready" => Ok(GuiCommand::IsReady),
            "ucinewgame" => Ok(GuiCommand::NewGame),
            "stop" => Ok(GuiCommand::Stop),
            "ponderhit" => Ok(GuiCommand::PonderHit),
            "quit" => Ok(GuiCommand::Quit),
            "debug" => match parts.next() {
                Some("on") => Ok(GuiCommand::Debug(true)),
                Some("off") => Ok(GuiCommand::Debug(false)),
                other => Err(UciError::ParseError(format!(
                    "expected 'on' or 'off' after debug, got {other:?}"
                ))),
            },
            "register" => Self::parse_register(parts),
            "setoption" => Self::parse_setoption(parts),
            "position" => Self::parse_position(parts),
            "go" => Self::parse_go(parts),
            "" => Ok(GuiCommand::Unknown(String::new())),
            _ => Ok(GuiCommand::Unknown(input.to_string())),
        }
    }

    fn parse_register<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        match parts.next() {
            Some("later") => Ok(GuiCommand::Register(Register::Later)),
            Some("name") => {
                let mut name_parts = Vec::new();
                let mut code = String::new();
                for part in parts.by_ref() {
                    if part == "code" {
                        break;
                    }
                    name_parts.push(part);
                }
                let code_parts: Vec<&str> = parts.collect();
                code.push_str(&code_parts.join(" "));
                Ok(GuiCommand::Register(Register::NameCode {
                    name: name_parts.join(" "),
                    code,
                }))
            }
            other => Err(UciError::ParseError(format!(
                "expected 'later' or 'name' after register, got {other:?}"
            ))),
        }
    }

    fn parse_setoption<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        if parts.next() != Some("name") {
            return Err(UciError::ParseError("expected 'name' after setoption".to_string()));
        }
        let mut name_parts = Vec::new();
        let mut value = None;
        for part in parts.by_ref() {
            if part == "value" {
                let rest: Vec<&str> = parts.collect();
                value = Some(rest.join(" "));
                break;
            }
            name_parts.push(part);
        }
        Ok(GuiCommand::SetOption {
            name: name_parts.join(" "),
            value,
        })
    }

    fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut fen = None;

        match parts.next() {
            Some("startpos") => {}
            Some("fen") => {
                let mut fen_parts = Vec::new();
                for part in parts.by_ref() {
                    if part == "moves" {
                        break;
                    }
                    fen_parts.push(part);
                }
                if !fen_parts.is_empty() {
                    fen = Some(fen_parts.join(" "));
                }
            }
            Some(other) => {
                return Err(UciError::ParseError(format!(
                    "expected 'startpos' or 'fen', got '{other}'"
                )));
            }
            None => {
                return Err(UciError::ParseError("expected 'startpos' or 'fen'".to_string()));
            }
        }

        let remaining: Vec<&str> = parts.collect();
        let moves_start = remaining.iter().position(|&s| s == "moves");
        let moves = match moves_start {
            Some(idx) => remaining[idx + 1..].iter().map(|s| s.to_string()).collect(),
            None if fen.is_some() => remaining.iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        };

        Ok(GuiCommand::Position { fen, moves })
    }

    fn parse_go<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut opts = GoOptions::default();
        let parts: Vec<&str> = parts.collect();
        let mut i = 0;

        while i < parts.len() {
            match parts[i] {
                "movetime" => {
                    i += 1;
                    if i < parts.len() {
                        opts.movetime = parts[i].parse().ok();
                    }
                }
                "depth" => {
                    i += 1;
                    if i < parts.len() {
                        opts.depth = parts[i].parse().ok();
                    }
                }
                "wtime" => {
                    i += 1;
                    if i < parts.len() {
                        opts.wtime = parts[i].parse().ok();
                    }
                }
                "btime" => {
                    i += 1;
                    if i < parts.len() {
                        opts.btime = parts[i].parse().ok();
                    }
                }
                "winc" => {
                    i += 1;
                    if i < parts.len() {
                        opts.winc = parts[i].parse().ok();
                    }
                }
                "binc" => {
                    i += 1;
                    if i < parts.len() {
                        opts.binc = parts[i].parse().ok();
                    }
                }
                "movestogo" => {
                    i += 1;
                    if i < parts.len() {
                        opts.movestogo = parts[i].parse().ok();
                    }
                }
                "infinite" => opts.infinite = true,
                _ => {}
            }
            i += 1;
        }

        Ok(GuiCommand::Go(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_mode_priority_infinite_beats_everything() {
        let opts = GoOptions {
            infinite: true,
            depth: Some(5),
            movetime: Some(1000),
            ..Default::default()
        };
        assert_eq!(GuiCommand::Go(opts).to_uci(), "go infinite");
    }

    #[test]
    fn go_mode_priority_depth_beats_clocks() {
        let opts = GoOptions {
            depth: Some(8),
            wtime: Some(5000),
            btime: Some(5000),
            ..Default::default()
        };
        assert_eq!(GuiCommand::Go(opts).to_uci(), "go depth 8");
    }

    #[test]
    fn go_mode_priority_clocks_beat_movetime() {
        let opts = GoOptions {
            wtime: Some(30000),
            btime: Some(28000),
            winc: Some(500),
            movetime: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            GuiCommand::Go(opts).to_uci(),
            "go wtime 30000 btime 28000 winc 500"
        );
    }

    #[test]
    fn go_mode_falls_back_to_movetime() {
        let opts = GoOptions {
            movetime: Some(2500),
            ..Default::default()
        };
        assert_eq!(GuiCommand::Go(opts).to_uci(), "go movetime 2500");
    }

    #[test]
    fn position_startpos_with_moves_renders_and_parses() {
        let cmd = GuiCommand::Position {
            fen: None,
            moves: vec!["e2e4".to_string(), "e7e5".to_string()],
        };
        assert_eq!(cmd.to_uci(), "position startpos moves e2e4 e7e5");
        assert_eq!(GuiCommand::parse("position startpos moves e2e4 e7e5").unwrap(), cmd);
    }

    #[test]
    fn position_fen_parses() {
        let cmd = GuiCommand::parse(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert_eq!(
            cmd,
            GuiCommand::Position {
                fen: Some(
                    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string()
                ),
                moves: vec![]
            }
        );
    }

    #[test]
    fn setoption_with_and_without_value() {
        assert_eq!(
            GuiCommand::parse("setoption name Hash value 256").unwrap(),
            GuiCommand::SetOption {
                name: "Hash".to_string(),
                value: Some("256".to_string())
            }
        );
        assert_eq!(
            GuiCommand::parse("setoption name Clear Hash").unwrap(),
            GuiCommand::SetOption {
                name: "Clear Hash".to_string(),
                value: None
            }
        );
    }

    #[test]
    fn register_later_and_named() {
        assert_eq!(
            GuiCommand::parse("register later").unwrap(),
            GuiCommand::Register(Register::Later)
        );
        assert_eq!(
            GuiCommand::parse("register name John Doe code 1234-ABCD").unwrap(),
            GuiCommand::Register(Register::NameCode {
                name: "John Doe".to_string(),
                code: "1234-ABCD".to_string()
            })
        );
    }
}
