//! Opening-tree construction: one `optree` row per mainline position
//! reached within the first `depth` half-moves of each game in a
//! `game_id` range, keyed by the position's Zobrist hash.
//!
//! A move is stored as its UCI text (`chess_core::Move::to_uci`/
//! `from_uci`) rather than a bespoke packed encoding: the move codec's
//! own bit-packed format (`chess-engine`'s `movecodec`) is relative to a
//! position's legal-move list and isn't meaningful standalone, and
//! `Move` exposes no public raw-integer accessor to pack directly.

use crate::codec::result_score;
use crate::database::BinaryDatabase;
use crate::error::DbError;

/// Rebuilds the opening tree for every game whose id falls in
/// `game_id_range` (inclusive), first deleting any rows already
/// recorded for those games. Games are read out (each a read-only
/// borrow of `db`) before the delete-and-rebuild transaction opens, so
/// a missing id in the range is simply skipped rather than failing the
/// whole rebuild.
pub fn build_opening_tree(
    db: &mut BinaryDatabase,
    game_id_range: std::ops::RangeInclusive<i64>,
    depth: usize,
) -> Result<(), DbError> {
    let mut games = Vec::new();
    for game_id in game_id_range.clone() {
        match db.read_game(game_id) {
            Ok(g) => games.push((game_id, g)),
            Err(DbError::NoSuchGame(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    let conn = db.connection_mut();
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM optree WHERE game_id >= ?1 AND game_id <= ?2",
        [*game_id_range.start(), *game_id_range.end()],
    )?;

    for (game_id, game) in &games {
        let score = result_score(game.roster().result);
        let moves = game.move_history();
        let reached = moves.len().min(depth);

        for (i, gm) in moves.iter().take(reached).enumerate() {
            let last_move = i + 1 == reached;
            tx.execute(
                "INSERT INTO optree (pos_hash, mov, score, last_move, game_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                (gm.hash_before as i64, gm.mov.to_uci(), score as i64, last_move as i64, *game_id),
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::{Game, RosterResult};

    fn db_with_game(moves: &[&str], result: RosterResult) -> (crate::database::BinaryDatabase, i64) {
        let mut db = crate::database::BinaryDatabase::open(":memory:", false).unwrap();
        let mut game = Game::new();
        for mv in moves {
            game.make_move_san(mv).unwrap();
        }
        game.roster_mut().result = result;
        let id = db.insert_game(&game).unwrap();
        (db, id)
    }

    #[test]
    fn build_inserts_one_row_per_half_move_up_to_depth() {
        let (mut db, id) = db_with_game(&["e4", "e5", "Nf3", "Nc6"], RosterResult::WhiteWins);
        build_opening_tree(&mut db, id..=id, 2).unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM optree WHERE game_id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let last_move_count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM optree WHERE game_id = ?1 AND last_move = 1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(last_move_count, 1);
    }

    #[test]
    fn rebuild_clears_previous_entries() {
        let (mut db, id) = db_with_game(&["e4", "e5"], RosterResult::Draw);
        build_opening_tree(&mut db, id..=id, 10).unwrap();
        build_opening_tree(&mut db, id..=id, 1).unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM optree WHERE game_id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn score_reflects_header_result() {
        let (mut db, id) = db_with_game(&["e4"], RosterResult::BlackWins);
        build_opening_tree(&mut db, id..=id, 5).unwrap();

        let score: i64 = db
            .connection()
            .query_row("SELECT score FROM optree WHERE game_id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(score, -1);
    }
}
