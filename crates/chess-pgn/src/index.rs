//! Sidecar random-access index for a PGN file.
//!
//! Ported from `PgnDatabase.cpp`'s `index()`/`hasValidIndex()`/
//! `readIndex()`/`writeIndex()`/`seekGameNum()`. The index is a flat
//! file of 12-byte records, one per game: a little-endian `u64` byte
//! offset of the game's first header line, followed by a little-endian
//! `u32` 1-based line number. The index is considered stale (and is
//! rebuilt) unless it is non-empty and at least as new as the PGN file
//! it indexes.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::PgnError;

const RECORD_SIZE: u64 = 12;

/// The on-disk location of one game within its PGN file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u64,
    pub line_number: u32,
}

/// An open sidecar index, either reused from disk or freshly built.
pub struct PgnIndex {
    file: File,
    num_games: u32,
    total_lines: u32,
}

impl PgnIndex {
    /// Opens the valid on-disk index for `pgn_path` if one exists,
    /// otherwise rebuilds it by scanning `pgn_file` from the start.
    /// Leaves `pgn_file`'s position unspecified; callers must seek
    /// before reading a game off it.
    pub fn open_or_build(pgn_path: &Path, pgn_file: &mut File) -> Result<Self, PgnError> {
        let idx_path = index_path(pgn_path);
        if let Some(reused) = Self::try_open_valid(pgn_path, &idx_path)? {
            return Ok(reused);
        }
        Self::build(&idx_path, pgn_file)
    }

    fn try_open_valid(pgn_path: &Path, idx_path: &Path) -> Result<Option<Self>, PgnError> {
        let pgn_meta = std::fs::metadata(pgn_path)?;
        let idx_meta = match std::fs::metadata(idx_path) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };
        if pgn_meta.len() == 0 || idx_meta.len() == 0 {
            return Ok(None);
        }
        if idx_meta.modified()? < pgn_meta.modified()? {
            return Ok(None);
        }

        let file = OpenOptions::new().read(true).write(true).open(idx_path)?;
        let num_games = (idx_meta.len() / RECORD_SIZE) as u32;
        let total_lines = count_lines(pgn_path)?;
        Ok(Some(PgnIndex { file, num_games, total_lines }))
    }

    /// Scans the whole PGN file for lines starting with `[` that open a
    /// new header block (a header block is a run of such lines; a blank
    /// line or a non-`[` line ends it), recording each block's start as
    /// one game.
    fn build(idx_path: &Path, pgn_file: &mut File) -> Result<Self, PgnError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(idx_path)?;

        pgn_file.seek(SeekFrom::Start(0))?;
        let mut reader = std::io::BufReader::new(&mut *pgn_file);

        let mut offset = 0u64;
        let mut linenum = 0u32;
        let mut in_header = false;
        let mut num_games = 0u32;
        let mut line = Vec::new();

        loop {
            line.clear();
            let start_offset = offset;
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            linenum += 1;
            offset += read as u64;

            let mut content = &line[..];
            while matches!(content.last(), Some(b'\n') | Some(b'\r')) {
                content = &content[..content.len() - 1];
            }

            if !content.is_empty() {
                if content[0] == b'[' {
                    if !in_header {
                        num_games += 1;
                        write_record(&mut file, num_games, start_offset, linenum)?;
                        in_header = true;
                    }
                } else if in_header {
                    in_header = false;
                }
            }
        }

        Ok(PgnIndex { file, num_games, total_lines: linenum })
    }

    pub fn num_games(&self) -> u32 {
        self.num_games
    }

    /// Looks up the location of game `game_num` (1-based).
    pub fn read_entry(&mut self, game_num: u32) -> Result<IndexEntry, PgnError> {
        if game_num == 0 || game_num > self.num_games {
            return Err(PgnError::OutOfRange(game_num, self.num_games));
        }

        let pos = (game_num as u64 - 1) * RECORD_SIZE;
        self.file.seek(SeekFrom::Start(pos))?;
        let mut buf = [0u8; RECORD_SIZE as usize];
        self.file.read_exact(&mut buf)?;

        let offset = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        let line_number = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        if line_number == 0 {
            return Err(PgnError::Parse(0, format!("index entry for game {game_num} has line number 0")));
        }

        Ok(IndexEntry { offset, line_number })
    }

    /// Appends an entry for the next game in sequence, returning its
    /// 1-based game number. `lines_written` is how many lines the new
    /// game (plus any separating blank line) added to the PGN file, used
    /// to keep track of the next entry's line number without rescanning
    /// the file. The sequential-access database is the only caller; it
    /// has no way to insert a game anywhere but the end.
    pub fn append_entry(&mut self, offset: u64, lines_written: u32) -> Result<u32, PgnError> {
        let game_num = self.num_games + 1;
        let linenum = self.total_lines + 1;
        write_record(&mut self.file, game_num, offset, linenum)?;
        self.num_games = game_num;
        self.total_lines += lines_written;
        Ok(game_num)
    }
}

fn count_lines(path: &Path) -> std::io::Result<u32> {
    let data = std::fs::read(path)?;
    Ok(data.iter().filter(|&&b| b == b'\n').count() as u32)
}

fn write_record(file: &mut File, game_num: u32, offset: u64, linenum: u32) -> Result<(), PgnError> {
    let pos = (game_num as u64 - 1) * RECORD_SIZE;
    file.seek(SeekFrom::Start(pos))?;
    let mut buf = [0u8; RECORD_SIZE as usize];
    buf[0..8].copy_from_slice(&offset.to_le_bytes());
    buf[8..12].copy_from_slice(&linenum.to_le_bytes());
    file.write_all(&buf)?;
    Ok(())
}

/// Derives the sidecar index path for a PGN file. When the file already
/// exists, the index is keyed by device and inode (not just the
/// filename) so a renamed PGN file still finds its index; for a
/// brand-new file there is no inode yet, so the index is named from the
/// PGN path directly.
fn index_path(pgn_path: &Path) -> PathBuf {
    match std::fs::metadata(pgn_path) {
        Ok(meta) => {
            let dir = pgn_path.parent().unwrap_or_else(|| Path::new("."));
            dir.join(format!(".{:x}-{:x}.pgnindex", meta.dev(), meta.ino()))
        }
        Err(_) => {
            let mut name = pgn_path.as_os_str().to_owned();
            name.push(".pgnindex");
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pgn(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("games.pgn");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn builds_index_for_two_games() {
        let dir = std::env::temp_dir().join(format!("chess-pgn-index-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_pgn(
            &dir,
            "[Event \"A\"]\n[Site \"?\"]\n\n1. e4 *\n\n[Event \"B\"]\n[Site \"?\"]\n\n1. d4 *\n",
        );

        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut index = PgnIndex::open_or_build(&path, &mut file).unwrap();
        assert_eq!(index.num_games(), 2);

        let first = index.read_entry(1).unwrap();
        assert_eq!(first.offset, 0);
        let second = index.read_entry(2).unwrap();
        assert!(second.offset > first.offset);

        assert!(index.read_entry(3).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reuses_valid_index_on_second_open() {
        let dir = std::env::temp_dir().join(format!("chess-pgn-index-test-reuse-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_pgn(&dir, "[Event \"A\"]\n[Site \"?\"]\n\n1. e4 *\n");

        {
            let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
            PgnIndex::open_or_build(&path, &mut file).unwrap();
        }

        let idx_path = index_path(&path);
        let first_build_len = std::fs::metadata(&idx_path).unwrap().len();

        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let reused = PgnIndex::open_or_build(&path, &mut file).unwrap();
        assert_eq!(reused.num_games(), 1);
        assert_eq!(std::fs::metadata(&idx_path).unwrap().len(), first_build_len);

        std::fs::remove_dir_all(&dir).ok();
    }
}
