//! A PGN-backed [`Game`] database, reading and writing games to a flat
//! text file with an optional sidecar index for random access.
//!
//! Ported from `PgnDatabase.cpp`'s `open()`/`close()`/`read()`/`write()`.
//! Mid-file insertion is unsupported, matching the C++ original, whose
//! own random-access insert path is explicitly `#if 0`'d out with the
//! comment "Not implemented" -- this database can only append.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chess_engine::Game;

use crate::error::PgnError;
use crate::index::PgnIndex;
use crate::reader::read_game;
use crate::tokenizer::Tokenizer;
use crate::writer::write_game;

/// Whether a database was opened for read-only or read-write access,
/// mirroring `PgnDatabase`'s `ACCESS_READONLY`/`ACCESS_READWRITE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// An open PGN database file.
pub struct PgnDatabase {
    path: PathBuf,
    file: File,
    access: Access,
    index: Option<PgnIndex>,
}

impl PgnDatabase {
    /// Opens `path`, creating it if it doesn't exist and `read_only` is
    /// false. A `read_only` open of a missing file fails; a non-writable
    /// existing file downgrades silently to read-only, as in
    /// `PgnDatabase::open`.
    pub fn open(path: impl AsRef<Path>, read_only: bool) -> Result<Self, PgnError> {
        let path = path.as_ref().to_path_buf();
        let exists = path.exists();

        let (file, access) = if exists {
            if !read_only && is_writable(&path) {
                (OpenOptions::new().read(true).append(true).open(&path)?, Access::ReadWrite)
            } else {
                (OpenOptions::new().read(true).open(&path)?, Access::ReadOnly)
            }
        } else if read_only {
            return Err(PgnError::NotOpen);
        } else {
            (
                OpenOptions::new().read(true).write(true).create(true).open(&path)?,
                Access::ReadWrite,
            )
        };

        Ok(PgnDatabase { path, file, access, index: None })
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Number of games, if the database has been indexed.
    pub fn num_games(&self) -> Option<u32> {
        self.index.as_ref().map(PgnIndex::num_games)
    }

    /// Builds (or reuses a valid on-disk) sidecar index, enabling
    /// random-access [`read`](Self::read). Mirrors `hasValidIndex()` +
    /// `index()`.
    pub fn build_index(&mut self) -> Result<(), PgnError> {
        let index = PgnIndex::open_or_build(&self.path, &mut self.file)?;
        self.index = Some(index);
        Ok(())
    }

    /// Reads game `game_num` (1-based) by seeking directly to it.
    /// Requires [`build_index`](Self::build_index) to have been called.
    pub fn read(&mut self, game_num: u32) -> Result<Game, PgnError> {
        let index = self.index.as_mut().ok_or(PgnError::NotIndexed)?;
        let entry = index.read_entry(game_num)?;

        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut tok = Tokenizer::new(BufReader::new(&self.file));
        tok.set_line_number(entry.line_number);
        read_game(&mut tok)
    }

    /// Reads every game from the start of the file in order, without
    /// requiring an index.
    pub fn read_all(&mut self) -> Result<Vec<Game>, PgnError> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut tok = Tokenizer::new(BufReader::new(&self.file));
        let mut games = Vec::new();
        loop {
            match read_game(&mut tok) {
                Ok(game) => games.push(game),
                Err(PgnError::Empty) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(games)
    }

    /// Appends `game` to the end of the database, separating it from
    /// any previous game with a blank line, and extends the index (if
    /// built) to match. Returns the new game's 1-based number.
    pub fn append(&mut self, game: &Game) -> Result<u32, PgnError> {
        if self.access != Access::ReadWrite {
            return Err(PgnError::ReadOnly);
        }
        if self.index.is_none() {
            self.build_index()?;
        }

        let mut rendered = Vec::new();
        write_game(&mut rendered, game)?;

        let end = self.file.seek(SeekFrom::End(0))?;
        let separator_lines = if end > 0 {
            self.file.write_all(b"\n")?;
            1
        } else {
            0
        };
        let offset = self.file.stream_position()?;
        self.file.write_all(&rendered)?;
        self.file.flush()?;

        let new_lines = separator_lines + rendered.iter().filter(|&&b| b == b'\n').count() as u32;
        let index = self.index.as_mut().expect("index built above");
        index.append_entry(offset, new_lines)
    }
}

fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::Game;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chess-pgn-database-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn open_missing_read_only_fails() {
        let path = temp_path("missing");
        std::fs::remove_file(&path).ok();
        assert!(matches!(PgnDatabase::open(&path, true), Err(PgnError::NotOpen)));
    }

    #[test]
    fn append_and_read_back_sequentially() {
        let path = temp_path("append");
        std::fs::remove_file(&path).ok();

        let mut db = PgnDatabase::open(&path, false).unwrap();
        assert_eq!(db.access(), Access::ReadWrite);

        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        assert_eq!(db.append(&game).unwrap(), 1);

        let mut game2 = Game::new();
        game2.make_move_san("d4").unwrap();
        assert_eq!(db.append(&game2).unwrap(), 2);

        let games = db.read_all().unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].move_history().len(), 2);
        assert_eq!(games[1].move_history().len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn append_and_read_back_randomly() {
        let path = temp_path("random");
        std::fs::remove_file(&path).ok();

        let mut db = PgnDatabase::open(&path, false).unwrap();
        let mut game = Game::new();
        game.make_move_san("c4").unwrap();
        db.append(&game).unwrap();

        let mut game2 = Game::new();
        game2.make_move_san("Nf3").unwrap();
        db.append(&game2).unwrap();

        db.build_index().unwrap();
        assert_eq!(db.num_games(), Some(2));

        let second = db.read(2).unwrap();
        assert_eq!(second.move_history()[0].san, "Nf3");

        std::fs::remove_file(&path).ok();
    }
}
