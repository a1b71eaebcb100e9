//! SQLite-backed relational game database.
//!
//! This crate provides:
//! - [`BinaryDatabase`] - schema creation, open-mode checks, and
//!   per-game read/insert/update/delete
//! - [`dimension`]/[`codec`] - the dedup-by-natural-key dimension tables
//!   and roster-field <-> row-column conversions `BinaryDatabase` is
//!   built on
//! - [`opening`] - opening-tree construction from a range of games
//! - [`search`] - the criteria/sort/offset/limit query planner
//!
//! # Example
//!
//! ```no_run
//! use chess_db::BinaryDatabase;
//!
//! let mut db = BinaryDatabase::open("games.db", false).unwrap();
//! let game = chess_engine::Game::new();
//! let id = db.insert_game(&game).unwrap();
//! let read_back = db.read_game(id).unwrap();
//! ```

pub mod codec;
pub mod database;
pub mod dimension;
pub mod error;
pub mod opening;
pub mod schema;
pub mod search;

pub use database::BinaryDatabase;
pub use error::DbError;
pub use opening::build_opening_tree;
pub use search::{search, Criterion, DateCriterion, MatchKind, SearchQuery, SortField, SortKey, StringCriterion, StringField};
