//! PGN integer NAG (`$n`) mapping onto the engine's internal [`Nag`] set,
//! and the handful of symbolic move evaluators (`!`, `?`, `!!`, ...) PGN
//! writers use instead of the numeric form.
//!
//! The table is the published NAG list (Annex A of the PGN standard,
//! plus the non-standard-but-common extensions in the 140-255 range)
//! collapsed onto this crate's smaller internal vocabulary. Several PGN
//! codes intentionally collapse onto the same internal NAG (e.g. $16
//! through $21 are all shades of "advantage" and all map to one of
//! `WHITE_ADV`/`BLACK_ADV`/`WHITE_DECISIVE_ADV`/`BLACK_DECISIVE_ADV`),
//! and many fall back to `Nag::NONE` because this crate has no matching
//! internal symbol for them.

use chess_engine::Nag;

const N: Nag = Nag::NONE;

/// Index `i` holds the internal NAG that PGN code `$i` maps onto.
#[rustfmt::skip]
const PGN_NAG_TABLE: [Nag; 256] = [
    N, Nag::GOOD_MOVE, Nag::MISTAKE, Nag::EXCELLENT_MOVE, Nag::BLUNDER,
    Nag::INTERESTING_MOVE, Nag::DUBIOUS_MOVE, Nag::ONLY_MOVE, Nag::ONLY_MOVE, Nag::BLUNDER,
    Nag::EVEN, Nag::EVEN, Nag::EVEN, Nag::UNCLEAR, Nag::WHITE_SLIGHT_ADV,
    Nag::BLACK_SLIGHT_ADV, Nag::WHITE_ADV, Nag::BLACK_ADV, Nag::WHITE_DECISIVE_ADV, Nag::BLACK_DECISIVE_ADV,
    Nag::WHITE_DECISIVE_ADV, Nag::BLACK_DECISIVE_ADV, Nag::ZUGZWANG, Nag::ZUGZWANG, Nag::SPACE_ADV,
    Nag::SPACE_ADV, Nag::SPACE_ADV, Nag::SPACE_ADV, Nag::SPACE_ADV, Nag::SPACE_ADV,
    Nag::DEVELOPMENT_ADV, Nag::DEVELOPMENT_ADV, Nag::DEVELOPMENT_ADV, Nag::DEVELOPMENT_ADV, Nag::DEVELOPMENT_ADV,
    Nag::DEVELOPMENT_ADV, Nag::WITH_INITIATIVE, Nag::WITH_INITIATIVE, Nag::WITH_INITIATIVE, Nag::WITH_INITIATIVE,
    Nag::WITH_ATTACK, Nag::WITH_ATTACK, N, N, Nag::COMP_FOR_MATERIAL,
    Nag::COMP_FOR_MATERIAL, Nag::COMP_FOR_MATERIAL, Nag::COMP_FOR_MATERIAL, Nag::CENTRE, Nag::CENTRE,
    Nag::CENTRE, Nag::CENTRE, Nag::CENTRE, Nag::CENTRE, Nag::KINGSIDE,
    Nag::KINGSIDE, Nag::KINGSIDE, Nag::KINGSIDE, Nag::KINGSIDE, Nag::KINGSIDE,
    Nag::QUEENSIDE, Nag::QUEENSIDE, Nag::QUEENSIDE, Nag::QUEENSIDE, Nag::QUEENSIDE,
    Nag::QUEENSIDE, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    Nag::WITH_COUNTER_PLAY, Nag::WITH_COUNTER_PLAY, Nag::WITH_COUNTER_PLAY, Nag::WITH_COUNTER_PLAY, Nag::WITH_COUNTER_PLAY,
    Nag::WITH_COUNTER_PLAY, Nag::TIME, Nag::TIME, Nag::TIME, Nag::TIME,
    Nag::WITH_THE_IDEA, N, Nag::BETTER_IS, Nag::WORSE_IS, N,
    Nag::EDITORIAL_COMMENT, Nag::NOVELTY, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    Nag::DIAGRAM, Nag::DIAGRAM_FLIPPED, N, N, N,
    N, N, N, N, N,
    N, N, N, N, N,
    N, N, N, Nag::SPACE_ADV, Nag::FILE,
    Nag::DIAGONAL, Nag::CENTRE, Nag::KINGSIDE, Nag::QUEENSIDE, Nag::WEAK_POINT,
    Nag::ENDING, Nag::BISHOP_PAIR, Nag::OPP_COLOURED_BISHOP_PAIR, Nag::SAME_COLOURED_BISHOP_PAIR, Nag::UNITED_PAWNS,
    Nag::SEPARATED_PAWNS, Nag::DOUBLED_PAWNS, Nag::PASSED_PAWN, Nag::PAWN_ADV, Nag::WITH,
    Nag::WITHOUT,
];

/// Maps a PGN `$n` code onto this crate's internal NAG vocabulary.
/// Out-of-range or unmapped codes collapse to [`Nag::NONE`].
pub fn from_pgn_nag(code: u8) -> Nag {
    PGN_NAG_TABLE[code as usize]
}

/// Inverse of [`from_pgn_nag`]: the first (lowest) PGN code whose entry
/// in the published table names this NAG. Returns `None` only for
/// `Nag::NONE`, which is never written out.
pub fn to_pgn_nag(nag: Nag) -> Option<u8> {
    if nag == Nag::NONE {
        return None;
    }
    PGN_NAG_TABLE
        .iter()
        .position(|&candidate| candidate == nag)
        .map(|i| i as u8)
}

/// The traditional `!`/`?` family of symbolic move evaluators, each a
/// shorthand for one numeric NAG.
pub fn from_symbolic_evaluator(symbol: &str) -> Option<Nag> {
    match symbol {
        "!" => Some(Nag::GOOD_MOVE),
        "?" => Some(Nag::MISTAKE),
        "!!" => Some(Nag::EXCELLENT_MOVE),
        "??" => Some(Nag::BLUNDER),
        "!?" => Some(Nag::INTERESTING_MOVE),
        "?!" => Some(Nag::DUBIOUS_MOVE),
        "N" => Some(Nag::NOVELTY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_table_matches_published_values() {
        assert_eq!(from_pgn_nag(1), Nag::GOOD_MOVE);
        assert_eq!(from_pgn_nag(4), Nag::BLUNDER);
        assert_eq!(from_pgn_nag(146), Nag::NOVELTY);
        assert_eq!(from_pgn_nag(220), Nag::DIAGRAM);
        assert_eq!(from_pgn_nag(66), Nag::NONE);
    }

    #[test]
    fn inverse_roundtrips_through_lowest_code() {
        assert_eq!(to_pgn_nag(Nag::GOOD_MOVE), Some(1));
        assert_eq!(to_pgn_nag(Nag::BLUNDER), Some(4));
        assert_eq!(to_pgn_nag(Nag::NONE), None);
    }

    #[test]
    fn symbolic_evaluators_match_their_numeric_equivalents() {
        assert_eq!(from_symbolic_evaluator("!"), Some(Nag::GOOD_MOVE));
        assert_eq!(from_symbolic_evaluator("??"), Some(Nag::BLUNDER));
        assert_eq!(from_symbolic_evaluator("+"), None);
    }
}
