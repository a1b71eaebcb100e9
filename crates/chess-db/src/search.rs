//! The search query planner: turns a criteria list, a sort list, an
//! offset/limit, and a callback into one parameterized `SELECT`, mirroring
//! `storage.rs`'s parameterized-`execute`/`prepare` idiom but building the
//! statement text dynamically since the predicate set varies per call.
//!
//! Dimension lookups are expressed as `IN (SELECT ... WHERE ...)`
//! subqueries against `player`/`event`/`site`/`annotator` rather than
//! conditional `JOIN`s: the result set is identical, and a subquery per
//! predicate is simpler to assemble than tracking which joins a given
//! criteria list needs.

use rusqlite::{Connection, ToSql};

use crate::error::DbError;

/// Which column (or virtual "both players" column) a [`StringCriterion`]
/// matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringField {
    White,
    Black,
    /// Matches if either player matches.
    Player,
    Event,
    Site,
    Annotator,
    Eco,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Equals,
    StartsWith,
    Contains,
}

#[derive(Debug, Clone)]
pub struct StringCriterion {
    pub field: StringField,
    pub kind: MatchKind,
    pub value: String,
    pub case_sensitive: bool,
}

/// A date criterion matches by calendar granularity inferred from the
/// text length: `YYYY` (year range), `YYYYMM` (month range), or
/// `YYYYMMDD` (exact), all with equals semantics only.
#[derive(Debug, Clone)]
pub struct DateCriterion {
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Criterion {
    String(StringCriterion),
    Date(DateCriterion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    GameId,
    Date,
    WhiteElo,
    BlackElo,
}

#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub criteria: Vec<Criterion>,
    pub sort: Vec<SortKey>,
    pub offset: i64,
    pub limit: Option<i64>,
}

/// Runs `query` and calls `callback` with each matching `game_id` in
/// order. A callback returning `false` ends the search early without
/// this being an error.
pub fn search(
    conn: &Connection,
    query: &SearchQuery,
    mut callback: impl FnMut(i64) -> bool,
) -> Result<(), DbError> {
    let mut clauses = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    for criterion in &query.criteria {
        match criterion {
            Criterion::String(c) => push_string_clause(c, &mut clauses, &mut params),
            Criterion::Date(d) => push_date_clause(d, &mut clauses, &mut params)?,
        }
    }

    let where_clause =
        if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
    let order_clause = order_by(&query.sort);

    let mut sql = format!("SELECT game_id FROM game {where_clause} {order_clause}");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(Box::new(limit));
        sql.push_str(" OFFSET ?");
        params.push(Box::new(query.offset));
    } else if query.offset != 0 {
        // SQLite requires a LIMIT to use OFFSET; -1 means unbounded.
        sql.push_str(" LIMIT -1 OFFSET ?");
        params.push(Box::new(query.offset));
    }

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(param_refs))?;

    while let Some(row) = rows.next()? {
        let game_id: i64 = row.get(0)?;
        if !callback(game_id) {
            break;
        }
    }

    Ok(())
}

fn push_string_clause(c: &StringCriterion, clauses: &mut Vec<String>, params: &mut Vec<Box<dyn ToSql>>) {
    let name_expr = |table: &str| format!("(SELECT last_name || ', ' || first_names FROM player WHERE player_id = game.{table}_player_id)");

    let (expr, expr2) = match c.field {
        StringField::White => (name_expr("white"), None),
        StringField::Black => (name_expr("black"), None),
        StringField::Player => (name_expr("white"), Some(name_expr("black"))),
        StringField::Event => ("(SELECT name FROM event WHERE event_id = game.event_id)".to_string(), None),
        StringField::Site => ("(SELECT name FROM site WHERE site_id = game.site_id)".to_string(), None),
        StringField::Annotator => {
            ("(SELECT name FROM annotator WHERE annotator_id = game.annotator_id)".to_string(), None)
        }
        StringField::Eco => ("game.eco".to_string(), None),
    };

    let (op, value) = match (c.kind, c.case_sensitive) {
        (MatchKind::Equals, true) => ("= ?", c.value.clone()),
        (MatchKind::Equals, false) => ("= UPPER(?)", c.value.clone()),
        (MatchKind::StartsWith, true) => ("LIKE ?||'%'", c.value.clone()),
        (MatchKind::StartsWith, false) => ("LIKE UPPER(?)||'%'", c.value.clone()),
        (MatchKind::Contains, true) => ("LIKE '%'||?||'%'", c.value.clone()),
        (MatchKind::Contains, false) => ("LIKE '%'||UPPER(?)||'%'", c.value.clone()),
    };
    let lhs = |e: &str| if c.case_sensitive { e.to_string() } else { format!("UPPER({e})") };

    let clause = match expr2 {
        None => {
            params.push(Box::new(value));
            format!("{} {op}", lhs(&expr))
        }
        Some(expr2) => {
            params.push(Box::new(value.clone()));
            params.push(Box::new(value));
            format!("({} {op} OR {} {op})", lhs(&expr), lhs(&expr2))
        }
    };
    clauses.push(clause);
}

fn push_date_clause(c: &DateCriterion, clauses: &mut Vec<String>, params: &mut Vec<Box<dyn ToSql>>) -> Result<(), DbError> {
    if !c.value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DbError::InvalidDateCriterion(c.value.clone()));
    }
    let digits: i64 = c.value.parse().map_err(|_| DbError::InvalidDateCriterion(c.value.clone()))?;

    match c.value.len() {
        8 => {
            clauses.push("game.date = ?".to_string());
            params.push(Box::new(digits));
        }
        6 => {
            clauses.push("game.date >= ? AND game.date <= ?".to_string());
            params.push(Box::new(digits * 100));
            params.push(Box::new(digits * 100 + 99));
        }
        4 => {
            clauses.push("game.date >= ? AND game.date <= ?".to_string());
            params.push(Box::new(digits * 10_000));
            params.push(Box::new(digits * 10_000 + 9999));
        }
        _ => return Err(DbError::InvalidDateCriterion(c.value.clone())),
    }
    Ok(())
}

fn order_by(sort: &[SortKey]) -> String {
    if sort.is_empty() {
        return "ORDER BY game_id ASC".to_string();
    }
    let parts: Vec<String> = sort
        .iter()
        .map(|k| {
            let column = match k.field {
                SortField::GameId => "game_id",
                SortField::Date => "date",
                SortField::WhiteElo => "white_elo",
                SortField::BlackElo => "black_elo",
            };
            format!("{column} {}", if k.descending { "DESC" } else { "ASC" })
        })
        .collect();
    format!("ORDER BY {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::BinaryDatabase;
    use chess_engine::Game;

    fn seeded_db() -> BinaryDatabase {
        let mut db = BinaryDatabase::open(":memory:", false).unwrap();

        let mut carlsen_white = Game::new();
        carlsen_white.roster_mut().white.last_name = "Carlsen".into();
        carlsen_white.roster_mut().white.first_names = "Magnus".into();
        carlsen_white.roster_mut().black.last_name = "Nepomniachtchi".into();
        carlsen_white.roster_mut().date.year = Some(2023);
        carlsen_white.roster_mut().date.month = Some(5);
        carlsen_white.roster_mut().date.day = Some(2);
        db.insert_game(&carlsen_white).unwrap();

        let mut carlsen_black = Game::new();
        carlsen_black.roster_mut().white.last_name = "Caruana".into();
        carlsen_black.roster_mut().black.last_name = "Carlsen".into();
        carlsen_black.roster_mut().black.first_names = "Magnus".into();
        carlsen_black.roster_mut().date.year = Some(2024);
        db.insert_game(&carlsen_black).unwrap();

        let mut unrelated = Game::new();
        unrelated.roster_mut().white.last_name = "Smith".into();
        unrelated.roster_mut().black.last_name = "Jones".into();
        db.insert_game(&unrelated).unwrap();

        db
    }

    fn collect_ids(conn: &Connection, query: &SearchQuery) -> Vec<i64> {
        let mut ids = Vec::new();
        search(conn, query, |id| {
            ids.push(id);
            true
        })
        .unwrap();
        ids
    }

    #[test]
    fn player_field_matches_either_side() {
        let db = seeded_db();
        let query = SearchQuery {
            criteria: vec![Criterion::String(StringCriterion {
                field: StringField::Player,
                kind: MatchKind::Equals,
                value: "Carlsen, Magnus".to_string(),
                case_sensitive: true,
            })],
            ..Default::default()
        };
        assert_eq!(collect_ids(db.connection(), &query), vec![1, 2]);
    }

    #[test]
    fn white_field_is_one_sided() {
        let db = seeded_db();
        let query = SearchQuery {
            criteria: vec![Criterion::String(StringCriterion {
                field: StringField::White,
                kind: MatchKind::Contains,
                value: "carlsen".to_string(),
                case_sensitive: false,
            })],
            ..Default::default()
        };
        assert_eq!(collect_ids(db.connection(), &query), vec![1]);
    }

    #[test]
    fn date_year_range_matches() {
        let db = seeded_db();
        let query = SearchQuery {
            criteria: vec![Criterion::Date(DateCriterion { value: "2023".to_string() })],
            ..Default::default()
        };
        assert_eq!(collect_ids(db.connection(), &query), vec![1]);
    }

    #[test]
    fn callback_returning_false_stops_early() {
        let db = seeded_db();
        let mut seen = Vec::new();
        search(db.connection(), &SearchQuery::default(), |id| {
            seen.push(id);
            false
        })
        .unwrap();
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn offset_and_limit_apply() {
        let db = seeded_db();
        let query = SearchQuery { offset: 1, limit: Some(1), ..Default::default() };
        assert_eq!(collect_ids(db.connection(), &query), vec![2]);
    }
}
