//! Resolves UCI move text received from the child engine against the
//! position last sent to it, mirroring `Game::make_move_uci`'s
//! from-square-lookup-then-legal-match approach but applied to a shadow
//! `Game` the worker keeps purely to track what was sent, not to record
//! a playable game (no roster, no annotations).

use chess_core::Move;
use chess_engine::Game;

/// Rebuilds the shadow position for an outbound `position` command.
pub fn apply_position(fen: Option<&str>, moves: &[String]) -> Game {
    let mut game = match fen {
        Some(f) => Game::from_fen(f).unwrap_or_else(|_| Game::new()),
        None => Game::new(),
    };
    for mv in moves {
        if game.make_move_uci(mv).is_err() {
            break;
        }
    }
    game
}

/// Replays `pv` against a clone of `shadow`, stopping at (and excluding)
/// the first move that doesn't apply. Does not mutate `shadow`: a
/// principal variation is a hypothetical future line, not a move
/// actually played.
pub fn truncate_pv(shadow: &Game, pv: &[String]) -> Vec<String> {
    let mut probe = shadow.clone();
    let mut kept = Vec::with_capacity(pv.len());
    for mv in pv {
        if probe.make_move_uci(mv).is_err() {
            break;
        }
        kept.push(mv.clone());
    }
    kept
}

/// Resolves a `bestmove`/`ponder` pair into [`Move`]s, applying `best`
/// to a clone of `shadow` first so `ponder` (if present) is parsed
/// against the post-bestmove position, exactly as the wire format
/// intends. Returns `None` for either half that doesn't parse as a
/// legal move from `shadow`'s position.
pub fn resolve_best_move(shadow: &Game, best: &str, ponder: Option<&str>) -> (Option<Move>, Option<Move>) {
    let mut probe = shadow.clone();
    if probe.make_move_uci(best).is_err() {
        return (None, None);
    }
    let best_move = find_applied_move(&probe, best);

    let ponder_move = ponder.and_then(|p| {
        if probe.make_move_uci(p).is_err() {
            return None;
        }
        find_applied_move(&probe, p)
    });

    (best_move, ponder_move)
}

fn find_applied_move(game: &Game, uci: &str) -> Option<Move> {
    game.move_history().last().filter(|gm| gm.mov.to_uci() == uci).map(|gm| gm.mov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_position_replays_moves_from_startpos() {
        let game = apply_position(None, &["e2e4".to_string(), "e7e5".to_string()]);
        assert_eq!(game.ply_count(), 2);
    }

    #[test]
    fn truncate_pv_stops_at_illegal_move() {
        let shadow = apply_position(None, &[]);
        let pv = vec!["e2e4".to_string(), "e7e5".to_string(), "zz99".to_string(), "g1f3".to_string()];
        assert_eq!(truncate_pv(&shadow, &pv), vec!["e2e4".to_string(), "e7e5".to_string()]);
    }

    #[test]
    fn truncate_pv_does_not_mutate_shadow() {
        let shadow = apply_position(None, &[]);
        let pv = vec!["e2e4".to_string()];
        truncate_pv(&shadow, &pv);
        assert_eq!(shadow.ply_count(), 0);
    }

    #[test]
    fn resolve_best_move_with_ponder() {
        let shadow = apply_position(None, &[]);
        let (best, ponder) = resolve_best_move(&shadow, "e2e4", Some("e7e5"));
        assert!(best.is_some());
        assert!(ponder.is_some());
        assert_eq!(best.unwrap().to_uci(), "e2e4");
        assert_eq!(ponder.unwrap().to_uci(), "e7e5");
    }

    #[test]
    fn resolve_best_move_rejects_illegal_move() {
        let shadow = apply_position(None, &[]);
        let (best, ponder) = resolve_best_move(&shadow, "e2e5", None);
        assert!(best.is_none());
        assert!(ponder.is_none());
    }
}
