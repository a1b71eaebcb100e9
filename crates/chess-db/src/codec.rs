//! Conversions between a [`Roster`]'s fields and the row representation
//! used by the `game` table: a `YYYYMMDD` integer date (0 if the year is
//! unknown; unknown month/day are zero-filled) and a small integer for
//! [`RosterResult`].

use chess_engine::{RosterResult, RosterRound};

pub fn encode_date(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> i64 {
    let Some(y) = year else { return 0 };
    let m = month.unwrap_or(0);
    let d = day.unwrap_or(0);
    y as i64 * 10_000 + m as i64 * 100 + d as i64
}

pub fn decode_date(encoded: i64) -> (Option<i32>, Option<u32>, Option<u32>) {
    if encoded == 0 {
        return (None, None, None);
    }
    let year = (encoded / 10_000) as i32;
    let month = ((encoded / 100) % 100) as u32;
    let day = (encoded % 100) as u32;
    (Some(year), if month == 0 { None } else { Some(month) }, if day == 0 { None } else { Some(day) })
}

pub fn encode_result(result: RosterResult) -> i64 {
    match result {
        RosterResult::Unfinished => 0,
        RosterResult::WhiteWins => 1,
        RosterResult::BlackWins => 2,
        RosterResult::Draw => 3,
    }
}

pub fn decode_result(encoded: i64) -> RosterResult {
    match encoded {
        1 => RosterResult::WhiteWins,
        2 => RosterResult::BlackWins,
        3 => RosterResult::Draw,
        _ => RosterResult::Unfinished,
    }
}

/// Signed score recorded against an opening-tree entry, derived from a
/// game's header result: the player to move at the tree depth gains no
/// information the mainline result doesn't already give, so the score
/// is white's-result-relative for every row of a given game.
pub fn result_score(result: RosterResult) -> i8 {
    match result {
        RosterResult::WhiteWins => 1,
        RosterResult::BlackWins => -1,
        RosterResult::Draw | RosterResult::Unfinished => 0,
    }
}

pub fn encode_round(round: Option<RosterRound>) -> (i64, Option<i64>) {
    match round {
        None => (0, None),
        Some(RosterRound { major, minor }) => (major as i64, minor.map(|m| m as i64)),
    }
}

pub fn decode_round(major: i64, minor: Option<i64>) -> Option<RosterRound> {
    if major == 0 && minor.is_none() {
        return None;
    }
    Some(RosterRound { major: major as u32, minor: minor.map(|m| m as u32) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_roundtrips_full() {
        let encoded = encode_date(Some(2024), Some(3), Some(7));
        assert_eq!(encoded, 20_240_307);
        assert_eq!(decode_date(encoded), (Some(2024), Some(3), Some(7)));
    }

    #[test]
    fn date_roundtrips_year_only() {
        let encoded = encode_date(Some(2024), None, None);
        assert_eq!(encoded, 20_240_000);
        assert_eq!(decode_date(encoded), (Some(2024), None, None));
    }

    #[test]
    fn unknown_date_is_zero() {
        assert_eq!(encode_date(None, None, None), 0);
        assert_eq!(decode_date(0), (None, None, None));
    }

    #[test]
    fn result_roundtrips() {
        for r in [RosterResult::WhiteWins, RosterResult::BlackWins, RosterResult::Draw, RosterResult::Unfinished] {
            assert_eq!(decode_result(encode_result(r)), r);
        }
    }

    #[test]
    fn round_roundtrips() {
        let round = Some(RosterRound { major: 3, minor: Some(2) });
        let (major, minor) = encode_round(round);
        assert_eq!(decode_round(major, minor), round);
        assert_eq!(decode_round(0, None), None);
    }
}
