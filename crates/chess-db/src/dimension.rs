//! Dimension-table lookups: `event`/`site`/`annotator` are deduplicated
//! by name, `player` by (last name, first names). Each lookup-or-insert
//! runs inside the caller's transaction, mirroring `storage.rs`'s
//! `ensure_bot`'s `INSERT OR IGNORE`-then-lookup idiom, generalized to a
//! numeric id rather than a caller-supplied key.

use rusqlite::Transaction;

use crate::error::DbError;

/// Looks up or inserts a named dimension row, returning 0 if `name` is
/// empty (the game table's convention for "this field is absent").
pub fn lookup_or_insert_named(tx: &Transaction, table: &str, name: &str) -> Result<i64, DbError> {
    if name.is_empty() {
        return Ok(0);
    }

    let id_column = format!("{table}_id");
    tx.execute(
        &format!("INSERT OR IGNORE INTO {table} (name) VALUES (?1)"),
        [name],
    )?;
    let id = tx.query_row(
        &format!("SELECT {id_column} FROM {table} WHERE name = ?1"),
        [name],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Looks up or inserts a `player` row by (last name, first names),
/// returning 0 if both are empty. `country_code` is only written on
/// insert; an existing row's country is never overwritten by a later
/// game with the same name and a blank country.
pub fn lookup_or_insert_player(
    tx: &Transaction,
    last_name: &str,
    first_names: &str,
    country_code: Option<&str>,
) -> Result<i64, DbError> {
    if last_name.is_empty() && first_names.is_empty() {
        return Ok(0);
    }

    tx.execute(
        "INSERT OR IGNORE INTO player (last_name, first_names, country_code) VALUES (?1, ?2, ?3)",
        (last_name, first_names, country_code),
    )?;
    let id = tx.query_row(
        "SELECT player_id FROM player WHERE last_name = ?1 AND first_names = ?2",
        (last_name, first_names),
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Resolves a dimension id back to its name, or an empty string if the
/// id is 0 (absent) or the row no longer exists.
pub fn resolve_name(tx: &rusqlite::Connection, table: &str, id: i64) -> Result<String, DbError> {
    if id == 0 {
        return Ok(String::new());
    }
    let id_column = format!("{table}_id");
    let name = tx
        .query_row(&format!("SELECT name FROM {table} WHERE {id_column} = ?1"), [id], |row| {
            row.get(0)
        })
        .unwrap_or_default();
    Ok(name)
}

/// Resolves a player id back to (last name, first names, country code).
pub fn resolve_player(conn: &rusqlite::Connection, id: i64) -> Result<(String, String, Option<String>), DbError> {
    if id == 0 {
        return Ok((String::new(), String::new(), None));
    }
    let row = conn
        .query_row(
            "SELECT last_name, first_names, country_code FROM player WHERE player_id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap_or_default();
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn memory_db() -> Connection {
        crate::schema::open(":memory:", false).unwrap()
    }

    #[test]
    fn named_dimension_is_deduplicated() {
        let conn = memory_db();
        let tx = conn.unchecked_transaction().unwrap();
        let first = lookup_or_insert_named(&tx, "event", "World Open").unwrap();
        let second = lookup_or_insert_named(&tx, "event", "World Open").unwrap();
        assert_eq!(first, second);
        assert_eq!(resolve_name(&tx, "event", first).unwrap(), "World Open");
    }

    #[test]
    fn empty_name_is_absent() {
        let conn = memory_db();
        let tx = conn.unchecked_transaction().unwrap();
        assert_eq!(lookup_or_insert_named(&tx, "site", "").unwrap(), 0);
        assert_eq!(resolve_name(&tx, "site", 0).unwrap(), "");
    }

    #[test]
    fn player_is_deduplicated_by_name() {
        let conn = memory_db();
        let tx = conn.unchecked_transaction().unwrap();
        let first = lookup_or_insert_player(&tx, "Carlsen", "Magnus", Some("NO")).unwrap();
        let second = lookup_or_insert_player(&tx, "Carlsen", "Magnus", None).unwrap();
        assert_eq!(first, second);
        let (last, given, country) = resolve_player(&tx, first).unwrap();
        assert_eq!(last, "Carlsen");
        assert_eq!(given, "Magnus");
        assert_eq!(country, Some("NO".to_string()));
    }
}
