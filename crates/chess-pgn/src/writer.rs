//! Renders a [`Game`] back to PGN text.
//!
//! Ported from `PgnDatabase.cpp`'s `write()`/`writeMoves()`/`writeText()`:
//! headers are written in a fixed order (the "Seven Tag Roster" plus the
//! optional extras this engine tracks), followed by a blank line and the
//! movetext, word-wrapped at 79 columns. Variations are always written
//! out fully inline (ChessCore's "embedded variations" mode is not
//! supported, matching the binary database's tree model).

use std::io::Write;

use chess_core::Color;
use chess_engine::{make_move, move_to_san, Game, MoveTree, Nag, NodeId, Notation, Position, Roster, RosterResult, RosterRound};

use crate::error::PgnError;
use crate::nag::to_pgn_nag;

const WRAP_COLUMN: usize = 79;

/// Writes `game` as a complete PGN game record (headers, blank line,
/// movetext, trailing newline) to `w`.
pub fn write_game<W: Write>(w: &mut W, game: &Game) -> Result<(), PgnError> {
    let header_block = format_headers(game.roster(), game.start_position());
    w.write_all(header_block.as_bytes())?;
    w.write_all(b"\n")?;

    let tokens = collect_tokens(game);
    let movetext = wrap_tokens(&tokens);
    w.write_all(movetext.as_bytes())?;
    Ok(())
}

fn format_headers(roster: &Roster, start: &Position) -> String {
    let mut out = String::new();
    tag(&mut out, "Event", &non_empty(&roster.event));
    tag(&mut out, "Site", &non_empty(&roster.site));
    tag(&mut out, "Date", &format_date(roster));
    tag(&mut out, "Round", &format_round(&roster.round));
    tag(&mut out, "White", &format_player(&roster.white));
    tag(&mut out, "Black", &format_player(&roster.black));

    if *start != Position::startpos() {
        tag(&mut out, "SetUp", "1");
        tag(&mut out, "FEN", &start.to_fen());
    }

    tag(&mut out, "Result", format_result(roster.result));

    if let Some(annotator) = &roster.annotator {
        tag(&mut out, "Annotator", annotator);
    }
    if let Some(eco) = &roster.eco {
        tag(&mut out, "ECO", eco);
    }
    if let Some(elo) = roster.white.elo {
        tag(&mut out, "WhiteElo", &elo.to_string());
    }
    if let Some(elo) = roster.black.elo {
        tag(&mut out, "BlackElo", &elo.to_string());
    }
    if let Some(tc) = &roster.time_control {
        tag(&mut out, "TimeControl", &tc.notation(Notation::Pgn));
    }

    out
}

fn tag(out: &mut String, name: &str, value: &str) {
    out.push('[');
    out.push_str(name);
    out.push_str(" \"");
    out.push_str(&escape_tag_string(value));
    out.push_str("\"]\n");
}

fn escape_tag_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        "?"
    } else {
        s
    }
}

fn format_date(roster: &Roster) -> String {
    let d = &roster.date;
    if let (Some(y), Some(m), Some(day)) = (d.year, d.month, d.day) {
        if let Some(date) = chrono::NaiveDate::from_ymd_opt(y, m, day) {
            return date.format("%Y.%m.%d").to_string();
        }
    }
    let year = d.year.map(|y| format!("{y:04}")).unwrap_or_else(|| "????".to_string());
    let month = d.month.map(|m| format!("{m:02}")).unwrap_or_else(|| "??".to_string());
    let day = d.day.map(|d| format!("{d:02}")).unwrap_or_else(|| "??".to_string());
    format!("{year}.{month}.{day}")
}

fn format_round(round: &Option<RosterRound>) -> String {
    match round {
        None => "?".to_string(),
        Some(RosterRound { major: 0, minor: Some(minor) }) => format!("?.{minor}"),
        Some(RosterRound { major: 0, minor: None }) => "?".to_string(),
        Some(RosterRound { major, minor: Some(minor) }) => format!("{major}.{minor}"),
        Some(RosterRound { major, minor: None }) => major.to_string(),
    }
}

fn format_player(player: &chess_engine::PlayerRecord) -> String {
    if player.last_name.is_empty() {
        return "?".to_string();
    }
    if player.first_names.is_empty() {
        player.last_name.clone()
    } else {
        format!("{}, {}", player.last_name, player.first_names)
    }
}

fn format_result(result: RosterResult) -> &'static str {
    match result {
        RosterResult::WhiteWins => "1-0",
        RosterResult::BlackWins => "0-1",
        RosterResult::Draw => "1/2-1/2",
        RosterResult::Unfinished => "*",
    }
}

/// Flattens the move tree into movetext tokens (move numbers, SAN, NAGs,
/// braced annotations, and `(`/`)` variation delimiters), mirroring
/// `writeMoves`'s traversal but collecting into a flat list so wrapping
/// can be done as a separate pass, as `writeText` does.
fn collect_tokens(game: &Game) -> Vec<String> {
    let mut tokens = Vec::new();
    if let Some(root) = game.tree().root() {
        collect(game.tree(), root, game.start_position().clone(), true, &mut tokens);
    }
    let result = format_result(game.roster().result);
    tokens.push(result.to_string());
    tokens
}

fn collect(tree: &MoveTree, start: NodeId, mut pos: Position, mut line_head: bool, tokens: &mut Vec<String>) {
    let mut node = Some(start);
    while let Some(id) = node {
        let pre = tree.pre_annotation(id);
        if line_head && !pre.is_empty() {
            tokens.push(format!("{{{pre}}}"));
        }

        if line_head || pos.side_to_move == Color::White {
            tokens.push(format!("{}.", pos.fullmove_number));
        }

        let mov = tree.mov(id);
        tokens.push(move_to_san(&pos, mov));

        for &nag in tree.nags(id) {
            if nag != Nag::NONE {
                if let Some(code) = to_pgn_nag(nag) {
                    tokens.push(format!("${code}"));
                }
            }
        }

        let post = tree.post_annotation(id);
        if !post.is_empty() {
            tokens.push(format!("{{{post}}}"));
        }

        let mut variation = tree.variation(id);
        while let Some(vid) = variation {
            tokens.push("(".to_string());
            collect(tree, vid, pos.clone(), true, tokens);
            tokens.push(")".to_string());
            variation = tree.variation(vid);
        }

        pos = make_move(&pos, mov);
        node = tree.next(id);
        line_head = false;
    }
}

/// Joins tokens with spaces, breaking to a new line before the column
/// width would exceed [`WRAP_COLUMN`], matching `writeText`'s wrapping.
fn wrap_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && width + 1 + token.len() > WRAP_COLUMN {
            out.push('\n');
            width = 0;
        } else if i > 0 {
            out.push(' ');
            width += 1;
        }
        out.push_str(token);
        width += token.len();
    }
    out.push('\n');
    out
}
