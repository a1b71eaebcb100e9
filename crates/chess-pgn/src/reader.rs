//! Parses one game's worth of PGN tokens into a [`Game`].
//!
//! Ported from `PgnDatabase.cpp`'s `read()`/`readRoster()`: headers are
//! collected until the first non-header token, at which point the game
//! (and, if a `[FEN]`/`[SetUp "1"]` pair was seen, its custom starting
//! position) is constructed; the remainder of the token stream is then
//! fed through move-by-move, tracking the move just played so trailing
//! comments/NAGs/symbolic evaluators attach to it, and comments seen
//! before any move in the current line latch as that line's first
//! move's pre-annotation instead.

use std::io::BufRead;

use chess_engine::{Game, PlayerRecord, Roster, RosterDate, RosterResult, RosterRound, TimeControl};

use crate::error::PgnError;
use crate::nag::{from_pgn_nag, from_symbolic_evaluator};
use crate::tokenizer::{HeaderName, Token, Tokenizer};

/// Reads one game, starting at the tokenizer's current position.
/// Stops after the result token (or at end of input for an unterminated
/// game). Returns `Err(PgnError::Empty)` if no tokens were read at all,
/// matching `PgnDatabase::read`'s `tokenCount == 0` check.
pub fn read_game<R: BufRead>(tok: &mut Tokenizer<R>) -> Result<Game, PgnError> {
    let mut roster = Roster::default();
    let mut fen: Option<String> = None;
    let mut token_count = 0u32;

    let first_move_token = loop {
        let line = tok.line_number();
        let Some(token) = tok.next_token()? else {
            if token_count == 0 {
                return Err(PgnError::Empty);
            }
            break None;
        };
        token_count += 1;

        match token {
            Token::Header(HeaderName::Fen, value) => fen = Some(value),
            Token::Header(name, value) => apply_header(&mut roster, name, value, line)?,
            other => break Some(other),
        }
    };

    let mut game = match fen {
        Some(fen) => Game::from_fen(&fen).map_err(|_| PgnError::InvalidFen(fen))?,
        None => Game::new(),
    };
    game.set_roster(roster);

    let mut pending_pre: Option<String> = None;
    let mut have_move = false;
    let mut next_token = first_move_token;

    loop {
        let line = tok.line_number();
        let token = match next_token.take() {
            Some(t) => t,
            None => match tok.next_token()? {
                Some(t) => t,
                None => break,
            },
        };

        match token {
            Token::Header(..) => {
                // Headers only precede moves; a stray one mid-game is ignored.
            }
            Token::MoveNumber(..) => {
                // Consumed but not strictly validated: many real PGN files
                // renumber sloppily after hand edits, and the move stream
                // itself is authoritative.
            }
            Token::Move(san) => {
                game.make_move_san(&san).map_err(|e| {
                    PgnError::Parse(line, format!("failed to make move '{san}': {e}"))
                })?;
                if let Some(pre) = pending_pre.take() {
                    game.set_current_pre_annotation(pre);
                }
                have_move = true;
            }
            Token::Comment(text) | Token::RestOfLineComment(text) => {
                if have_move {
                    game.set_current_post_annotation(text);
                } else {
                    pending_pre = Some(text);
                }
            }
            Token::Nag(code) => {
                if have_move {
                    game.add_current_nag(from_pgn_nag(code));
                }
            }
            Token::SymbolicEval(sym) => {
                if have_move {
                    if let Some(nag) = from_symbolic_evaluator(&sym) {
                        game.add_current_nag(nag);
                    }
                }
            }
            Token::VarStart => {
                game.start_variation();
                have_move = false;
                pending_pre = None;
            }
            Token::VarEnd => {
                game.end_variation();
                have_move = true;
            }
            Token::Result(text) => {
                verify_result(&text, game.roster().result, line)?;
                break;
            }
        }
    }

    Ok(game)
}

fn verify_result(text: &str, header_result: RosterResult, line: u32) -> Result<(), PgnError> {
    let parsed = parse_result(text).ok_or_else(|| {
        PgnError::Parse(line, format!("invalid result '{text}'"))
    })?;
    if parsed != header_result {
        return Err(PgnError::ResultMismatch);
    }
    Ok(())
}

fn parse_result(text: &str) -> Option<RosterResult> {
    match text {
        "1-0" => Some(RosterResult::WhiteWins),
        "0-1" => Some(RosterResult::BlackWins),
        "1/2-1/2" => Some(RosterResult::Draw),
        "*" => Some(RosterResult::Unfinished),
        _ => None,
    }
}

fn apply_header(roster: &mut Roster, name: HeaderName, value: String, line: u32) -> Result<(), PgnError> {
    if value.is_empty() || value == "?" {
        return Ok(());
    }

    match name {
        HeaderName::Event => roster.event = value,
        HeaderName::Site => roster.site = value,
        HeaderName::Date => roster.date = parse_date(&value),
        HeaderName::Round => roster.round = parse_round(&value),
        HeaderName::White => roster.white = parse_player(&value),
        HeaderName::Black => roster.black = parse_player(&value),
        HeaderName::Result => {
            roster.result = parse_result(&value)
                .ok_or_else(|| PgnError::Parse(line, format!("invalid result in header: '{value}'")))?;
        }
        HeaderName::Annotator => roster.annotator = Some(value),
        HeaderName::Eco | HeaderName::Opening | HeaderName::Variation => {
            // `Opening`/`Variation` are the ChessCore eco.pgn hack for
            // building an opening classification database; this reader
            // folds both onto the roster's single ECO field.
            roster.eco = Some(value);
        }
        HeaderName::WhiteElo => {
            roster.white.elo = value.parse().ok();
        }
        HeaderName::BlackElo => {
            roster.black.elo = value.parse().ok();
        }
        HeaderName::TimeControl => {
            roster.time_control = TimeControl::parse_pgn(&value).ok();
        }
        HeaderName::SetUp | HeaderName::Fen | HeaderName::Unknown(_) => {}
    }

    Ok(())
}

/// Splits a PGN player tag's conventional `Lastname, Firstnames` form.
/// A tag with no comma is stored entirely as the last name.
fn parse_player(data: &str) -> PlayerRecord {
    let mut record = PlayerRecord::default();
    match data.split_once(',') {
        Some((last, first)) => {
            record.last_name = last.trim().to_string();
            record.first_names = first.trim().to_string();
        }
        None => record.last_name = data.trim().to_string(),
    }
    record
}

/// Parses a `[Date]` tag (`YYYY.MM.DD`, with any trailing fields allowed
/// to be `??`). A partially-unknown date leaves the later fields `None`;
/// a fully-specified but invalid calendar date (e.g. `2024.02.30`) is
/// treated as entirely unknown rather than stored as garbage.
fn parse_date(data: &str) -> RosterDate {
    let parts: Vec<&str> = data.split('.').collect();
    let field = |s: &str| s.parse::<i32>().ok();
    let year = parts.first().and_then(|s| field(s));
    let month = parts.get(1).and_then(|s| field(s)).map(|v| v as u32);
    let day = parts.get(2).and_then(|s| field(s)).map(|v| v as u32);

    if let (Some(y), Some(m), Some(d)) = (year, month, day) {
        if chrono::NaiveDate::from_ymd_opt(y, m, d).is_none() {
            return RosterDate::default();
        }
    }

    RosterDate { year, month, day }
}

/// Parses a `[Round]` tag (`major[.minor]`, either half allowed `?`).
fn parse_round(data: &str) -> Option<RosterRound> {
    let parts: Vec<&str> = data.split('.').collect();
    let major: Option<u32> = parts.first().and_then(|s| s.parse().ok());
    let minor: Option<u32> = parts.get(1).and_then(|s| s.parse().ok());
    match (major, minor) {
        (None, None) => None,
        (Some(major), minor) => Some(RosterRound { major, minor }),
        (None, Some(minor)) => Some(RosterRound { major: 0, minor: Some(minor) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::RosterResult;

    fn read(pgn: &str) -> Game {
        let mut tok = Tokenizer::new(pgn.as_bytes());
        read_game(&mut tok).unwrap()
    }

    #[test]
    fn reads_headers_and_mainline() {
        let game = read(
            "[Event \"Test\"]\n[Site \"Here\"]\n[Date \"2024.01.02\"]\n[Round \"1\"]\n\
             [White \"Smith, John\"]\n[Black \"Doe, Jane\"]\n[Result \"1-0\"]\n\n\
             1. e4 e5 2. Nf3 Nc6 1-0\n",
        );
        assert_eq!(game.roster().event, "Test");
        assert_eq!(game.roster().white.last_name, "Smith");
        assert_eq!(game.roster().white.first_names, "John");
        assert_eq!(game.roster().date.year, Some(2024));
        assert_eq!(game.roster().round.unwrap().major, 1);
        assert_eq!(game.roster().result, RosterResult::WhiteWins);
        assert_eq!(game.move_history().len(), 4);
    }

    #[test]
    fn reads_nags_and_comments() {
        let game = read(
            "[Event \"Test\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"?\"]\n[Black \"?\"]\n[Result \"*\"]\n\n\
             1. e4! {good} $1 e5 *\n",
        );
        assert_eq!(game.move_history().len(), 2);
    }

    #[test]
    fn reads_variation() {
        let game = read(
            "[Event \"Test\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"?\"]\n[Black \"?\"]\n[Result \"*\"]\n\n\
             1. e4 e5 (1... c5 {Sicilian}) 2. Nf3 *\n",
        );
        let root = game.tree().root().unwrap();
        let e5 = game.tree().next(root).unwrap();
        let sicilian = game.tree().variation(e5).unwrap();
        assert_eq!(game.tree().mov(sicilian).to_uci(), "c7c5");
        assert_eq!(game.tree().post_annotation(sicilian), "Sicilian");
    }

    #[test]
    fn custom_start_position_from_fen() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let game = read(&format!(
            "[Event \"Test\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"?\"]\n[Black \"?\"]\n[SetUp \"1\"]\n[FEN \"{fen}\"]\n[Result \"*\"]\n\n\
             1. O-O *\n"
        ));
        assert_eq!(game.start_position().to_fen(), fen);
    }

    #[test]
    fn mismatched_result_is_an_error() {
        let mut tok = Tokenizer::new(
            "[Event \"Test\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"?\"]\n[Black \"?\"]\n[Result \"1-0\"]\n\n1. e4 0-1\n"
                .as_bytes(),
        );
        let err = read_game(&mut tok).unwrap_err();
        assert!(matches!(err, PgnError::ResultMismatch));
    }
}
