//! Schema creation, pragmas, and the open-mode logic that decides
//! whether a path names a fresh database, an existing one, or a
//! failure, mirroring `ChessDatabase::open`'s existence/writability
//! checks (see [`crate::database::BinaryDatabase::open`]).

use rusqlite::Connection;

use crate::error::DbError;

pub const SCHEMA_VERSION: i64 = 1;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player (
    player_id    INTEGER PRIMARY KEY,
    last_name    TEXT NOT NULL,
    first_names  TEXT NOT NULL,
    country_code TEXT,
    UNIQUE (last_name, first_names)
);

CREATE TABLE IF NOT EXISTS event (
    event_id INTEGER PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS site (
    site_id INTEGER PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS annotator (
    annotator_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS game (
    game_id          INTEGER PRIMARY KEY,
    white_player_id  INTEGER NOT NULL DEFAULT 0,
    black_player_id  INTEGER NOT NULL DEFAULT 0,
    event_id         INTEGER NOT NULL DEFAULT 0,
    site_id          INTEGER NOT NULL DEFAULT 0,
    date             INTEGER NOT NULL DEFAULT 0,
    round_major      INTEGER NOT NULL DEFAULT 0,
    round_minor      INTEGER,
    result           INTEGER NOT NULL DEFAULT 0,
    annotator_id     INTEGER NOT NULL DEFAULT 0,
    eco              TEXT,
    white_elo        INTEGER,
    black_elo        INTEGER,
    time_control     TEXT,
    halfmoves        INTEGER NOT NULL DEFAULT 0,
    start_position   BLOB,
    moves            BLOB NOT NULL,
    annotations      BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_game_white ON game (white_player_id);
CREATE INDEX IF NOT EXISTS idx_game_black ON game (black_player_id);
CREATE INDEX IF NOT EXISTS idx_game_date ON game (date);

CREATE TABLE IF NOT EXISTS optree (
    pos_hash  INTEGER NOT NULL,
    mov       TEXT NOT NULL,
    score     INTEGER NOT NULL,
    last_move INTEGER NOT NULL,
    game_id   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_optree_hash ON optree (pos_hash);
CREATE INDEX IF NOT EXISTS idx_optree_game ON optree (game_id);
";

/// Opens `path`, creating and initializing a fresh schema if it doesn't
/// exist and `read_only` is false. Fails on a missing read-only open or
/// an existing database whose `metadata.schema_version` isn't 1.
pub fn open(path: &str, read_only: bool) -> Result<Connection, DbError> {
    let exists = path == ":memory:" || std::path::Path::new(path).exists();
    if !exists && read_only {
        return Err(DbError::NotOpen);
    }

    let conn = if read_only {
        Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?
    } else {
        Connection::open(path)?
    };

    set_pragmas(&conn)?;

    if exists {
        check_schema_version(&conn)?;
    } else {
        init_schema(&conn)?;
    }

    Ok(conn)
}

fn set_pragmas(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch("PRAGMA synchronous = OFF; PRAGMA journal_mode = MEMORY;")?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(DDL)?;
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

fn check_schema_version(conn: &Connection) -> Result<(), DbError> {
    let version: i64 = conn
        .query_row("SELECT value FROM metadata WHERE key = 'schema_version'", [], |row| {
            row.get::<_, String>(0)
        })
        .map(|v| v.parse().unwrap_or(-1))
        .unwrap_or(-1);
    if version != SCHEMA_VERSION {
        return Err(DbError::WrongSchemaVersion(version));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_memory_db_gets_schema_version_one() {
        let conn = open(":memory:", false).unwrap();
        let version: String = conn
            .query_row("SELECT value FROM metadata WHERE key = 'schema_version'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, "1");
    }

    #[test]
    fn tables_exist_after_open() {
        let conn = open(":memory:", false).unwrap();
        for table in ["game", "player", "event", "site", "annotator", "optree", "metadata"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[test]
    fn missing_read_only_fails() {
        let err = open("/nonexistent/path/does-not-exist.db", true).unwrap_err();
        assert!(matches!(err, DbError::NotOpen));
    }
}
