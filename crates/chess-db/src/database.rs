//! The relational game database: one row per game plus its dimension
//! tables, built on top of [`crate::schema`], [`crate::dimension`], and
//! [`crate::codec`]. Read/write are each a single transaction, following
//! `storage.rs`'s "one connection, parameterized `execute`/`query_row`"
//! idiom but wrapped in an explicit `rusqlite::Transaction` so a failed
//! step rolls back instead of leaving a half-written game (rusqlite rolls
//! back an uncommitted transaction on drop).

use chess_engine::{decode_game, decode_position, encode_game, encode_position, Game, Notation, Position, TimeControl};
use rusqlite::{Connection, OptionalExtension};

use crate::codec::{decode_date, decode_result, decode_round, encode_date, encode_result, encode_round};
use crate::dimension::{lookup_or_insert_named, lookup_or_insert_player, resolve_name, resolve_player};
use crate::error::DbError;

/// An open relational game database.
pub struct BinaryDatabase {
    conn: Connection,
}

impl BinaryDatabase {
    /// Opens (or creates) the database at `path`. `":memory:"` opens a
    /// private in-memory database, as with any `rusqlite::Connection`.
    pub fn open(path: &str, read_only: bool) -> Result<Self, DbError> {
        Ok(BinaryDatabase { conn: crate::schema::open(path, read_only)? })
    }

    /// Direct access to the underlying connection, for [`crate::opening`]
    /// and [`crate::search`], which need it for statements this type
    /// doesn't otherwise expose.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Reads game `game_id`, resolving its dimension rows and rehydrating
    /// the move tree. Missing dimension rows (id 0, or a deleted row)
    /// yield empty strings, per the data model.
    pub fn read_game(&self, game_id: i64) -> Result<Game, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT white_player_id, black_player_id, event_id, site_id, date, \
                        round_major, round_minor, result, annotator_id, eco, \
                        white_elo, black_elo, time_control, start_position, moves, annotations \
                 FROM game WHERE game_id = ?1",
                [game_id],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, i64>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, i64>(3)?,
                        r.get::<_, i64>(4)?,
                        r.get::<_, i64>(5)?,
                        r.get::<_, Option<i64>>(6)?,
                        r.get::<_, i64>(7)?,
                        r.get::<_, i64>(8)?,
                        r.get::<_, Option<String>>(9)?,
                        r.get::<_, Option<i64>>(10)?,
                        r.get::<_, Option<i64>>(11)?,
                        r.get::<_, Option<String>>(12)?,
                        r.get::<_, Option<Vec<u8>>>(13)?,
                        r.get::<_, Vec<u8>>(14)?,
                        r.get::<_, Vec<u8>>(15)?,
                    ))
                },
            )
            .optional()?
            .ok_or(DbError::NoSuchGame(game_id))?;

        let (white_id, black_id, event_id, site_id, date, round_major, round_minor, result, annotator_id, eco, white_elo, black_elo, time_control, start_position, moves, annotations) = row;

        let start_pos = match start_position {
            Some(blob) => decode_position(&blob)?,
            None => Position::startpos(),
        };

        let mut game = decode_game(start_pos, &moves, &annotations)?;

        let (white_last, white_first, white_country) = resolve_player(&self.conn, white_id)?;
        let (black_last, black_first, black_country) = resolve_player(&self.conn, black_id)?;

        let roster = game.roster_mut();
        roster.white.last_name = white_last;
        roster.white.first_names = white_first;
        roster.white.country_code = white_country;
        roster.white.elo = white_elo.map(|e| e as u32);
        roster.black.last_name = black_last;
        roster.black.first_names = black_first;
        roster.black.country_code = black_country;
        roster.black.elo = black_elo.map(|e| e as u32);
        roster.event = resolve_name(&self.conn, "event", event_id)?;
        roster.site = resolve_name(&self.conn, "site", site_id)?;
        roster.annotator = {
            let name = resolve_name(&self.conn, "annotator", annotator_id)?;
            if name.is_empty() { None } else { Some(name) }
        };
        let (year, month, day) = decode_date(date);
        roster.date.year = year;
        roster.date.month = month;
        roster.date.day = day;
        roster.round = decode_round(round_major, round_minor);
        roster.result = decode_result(result);
        roster.eco = eco;
        roster.time_control = time_control.as_deref().and_then(|s| TimeControl::parse_pgn(s).ok());

        Ok(game)
    }

    /// Inserts `game` as a new row, returning its assigned `game_id`.
    pub fn insert_game(&mut self, game: &Game) -> Result<i64, DbError> {
        let tx = self.conn.transaction()?;
        let params = row_params(&tx, game)?;
        tx.execute(
            "INSERT INTO game (white_player_id, black_player_id, event_id, site_id, date, \
                                round_major, round_minor, result, annotator_id, eco, \
                                white_elo, black_elo, time_control, halfmoves, start_position, moves, annotations) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            rusqlite::params_from_iter(params.as_dyn_params()),
        )?;
        let game_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(game_id)
    }

    /// Overwrites the row for an existing `game_id`.
    pub fn update_game(&mut self, game_id: i64, game: &Game) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let params = row_params(&tx, game)?;
        let mut all = params.as_dyn_params();
        all.push(&game_id);
        let changed = tx.execute(
            "UPDATE game SET white_player_id = ?1, black_player_id = ?2, event_id = ?3, site_id = ?4, \
                             date = ?5, round_major = ?6, round_minor = ?7, result = ?8, annotator_id = ?9, \
                             eco = ?10, white_elo = ?11, black_elo = ?12, time_control = ?13, halfmoves = ?14, \
                             start_position = ?15, moves = ?16, annotations = ?17 \
             WHERE game_id = ?18",
            rusqlite::params_from_iter(all),
        )?;
        if changed == 0 {
            return Err(DbError::NoSuchGame(game_id));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_game(&mut self, game_id: i64) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM game WHERE game_id = ?1", [game_id])?;
        tx.execute("DELETE FROM optree WHERE game_id = ?1", [game_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn count_games(&self) -> Result<i64, DbError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM game", [], |r| r.get(0))?)
    }

    /// Longest mainline recorded in the database, in halfmoves.
    pub fn longest_line(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COALESCE(MAX(halfmoves), 0) FROM game", [], |r| r.get(0))?)
    }

    /// Number of `optree` rows recorded for `hash`.
    pub fn opening_occurrences(&self, hash: u64) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM optree WHERE pos_hash = ?1",
            [hash as i64],
            |r| r.get(0),
        )?)
    }
}

/// The bound parameter values shared by insert and update, computed
/// once (dimension resolution plus blob encoding) so both call sites
/// stay in lockstep with the column list above.
struct RowParams {
    white_player_id: i64,
    black_player_id: i64,
    event_id: i64,
    site_id: i64,
    date: i64,
    round_major: i64,
    round_minor: Option<i64>,
    result: i64,
    annotator_id: i64,
    eco: Option<String>,
    white_elo: Option<i64>,
    black_elo: Option<i64>,
    time_control: Option<String>,
    halfmoves: i64,
    start_position: Option<Vec<u8>>,
    moves: Vec<u8>,
    annotations: Vec<u8>,
}

impl RowParams {
    fn as_dyn_params(&self) -> Vec<&dyn rusqlite::ToSql> {
        vec![
            &self.white_player_id,
            &self.black_player_id,
            &self.event_id,
            &self.site_id,
            &self.date,
            &self.round_major,
            &self.round_minor,
            &self.result,
            &self.annotator_id,
            &self.eco,
            &self.white_elo,
            &self.black_elo,
            &self.time_control,
            &self.halfmoves,
            &self.start_position,
            &self.moves,
            &self.annotations,
        ]
    }
}

fn row_params(tx: &rusqlite::Transaction, game: &Game) -> Result<RowParams, DbError> {
    let roster = game.roster();

    let white_player_id =
        lookup_or_insert_player(tx, &roster.white.last_name, &roster.white.first_names, roster.white.country_code.as_deref())?;
    let black_player_id =
        lookup_or_insert_player(tx, &roster.black.last_name, &roster.black.first_names, roster.black.country_code.as_deref())?;
    let event_id = lookup_or_insert_named(tx, "event", &roster.event)?;
    let site_id = lookup_or_insert_named(tx, "site", &roster.site)?;
    let annotator_id = lookup_or_insert_named(tx, "annotator", roster.annotator.as_deref().unwrap_or(""))?;

    let (round_major, round_minor) = encode_round(roster.round);
    let start_position = if *game.start_position() == Position::startpos() {
        None
    } else {
        Some(encode_position(game.start_position()))
    };
    let (moves, annotations) = encode_game(game);

    Ok(RowParams {
        white_player_id,
        black_player_id,
        event_id,
        site_id,
        date: encode_date(roster.date.year, roster.date.month, roster.date.day),
        round_major,
        round_minor,
        result: encode_result(roster.result),
        annotator_id,
        eco: roster.eco.clone(),
        white_elo: roster.white.elo.map(i64::from),
        black_elo: roster.black.elo.map(i64::from),
        time_control: roster.time_control.as_ref().map(|tc| tc.notation(Notation::Pgn)),
        halfmoves: game.move_history().len() as i64,
        start_position,
        moves,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::RosterResult;

    fn sample_game() -> Game {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        game.make_move_san("Nf3").unwrap();
        {
            let roster = game.roster_mut();
            roster.white.last_name = "Carlsen".into();
            roster.white.first_names = "Magnus".into();
            roster.black.last_name = "Caruana".into();
            roster.black.first_names = "Fabiano".into();
            roster.event = "Candidates".into();
            roster.site = "Berlin".into();
            roster.result = RosterResult::WhiteWins;
            roster.date.year = Some(2024);
            roster.date.month = Some(4);
            roster.date.day = Some(1);
        }
        game
    }

    #[test]
    fn insert_and_read_back_game() {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();
        let game = sample_game();
        let id = db.insert_game(&game).unwrap();

        let read = db.read_game(id).unwrap();
        assert_eq!(read.roster().white.last_name, "Carlsen");
        assert_eq!(read.roster().black.first_names, "Fabiano");
        assert_eq!(read.roster().event, "Candidates");
        assert_eq!(read.roster().result, RosterResult::WhiteWins);
        assert_eq!(read.roster().date.year, Some(2024));
        assert_eq!(read.move_history().len(), 3);
    }

    #[test]
    fn update_overwrites_existing_row() {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();
        let id = db.insert_game(&sample_game()).unwrap();

        let mut game2 = Game::new();
        game2.make_move_san("d4").unwrap();
        db.update_game(id, &game2).unwrap();

        let read = db.read_game(id).unwrap();
        assert_eq!(read.move_history().len(), 1);
        assert_eq!(read.roster().white.last_name, "");
    }

    #[test]
    fn update_missing_game_is_an_error() {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();
        let err = db.update_game(999, &sample_game()).unwrap_err();
        assert!(matches!(err, DbError::NoSuchGame(999)));
    }

    #[test]
    fn dimension_rows_are_shared_across_games() {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();
        db.insert_game(&sample_game()).unwrap();
        db.insert_game(&sample_game()).unwrap();

        let event_rows: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM event", [], |r| r.get(0))
            .unwrap();
        assert_eq!(event_rows, 1);
    }

    #[test]
    fn counting_helpers() {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();
        db.insert_game(&sample_game()).unwrap();
        let mut game2 = Game::new();
        for mv in ["d4", "d5", "c4", "e6", "Nc3"] {
            game2.make_move_san(mv).unwrap();
        }
        db.insert_game(&game2).unwrap();

        assert_eq!(db.count_games().unwrap(), 2);
        assert_eq!(db.longest_line().unwrap(), 5);
    }
}
