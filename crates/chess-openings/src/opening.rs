//! Core opening-tree types.

use chess_core::Move;

/// One row of the opening tree: a move played from a position, with the
/// outcome it led to and which game it came from. Mirrors the `optree`
/// table's row shape so a classifier built from a database dump and one
/// built from [`builtin`](crate::builtin) share the same representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningTreeEntry {
    /// Zobrist hash of the position this move was played from.
    pub hash_key: u64,
    /// The move played.
    pub mov: Move,
    /// Game outcome from the mover's side: -1 loss, 0 draw, +1 win.
    pub score: i8,
    /// True if this move is the last one the cataloged theory covers for
    /// this line (i.e. the position it leads to carries an ECO label).
    pub last_move: bool,
    /// Source game id, 0 when there is no backing game (built-in entries).
    pub game_id: u64,
}

/// The ECO classification attached to a known position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningLabel {
    pub eco: String,
    pub name: String,
    pub variation: Option<String>,
}

impl OpeningLabel {
    pub fn new(eco: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            eco: eco.into(),
            name: name.into(),
            variation: None,
        }
    }

    #[must_use]
    pub fn with_variation(mut self, variation: impl Into<String>) -> Self {
        self.variation = Some(variation.into());
        self
    }
}

/// The deepest opening classification found for a game, with the ply at
/// which it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub eco: String,
    pub name: String,
    pub variation: Option<String>,
    pub ply: usize,
}
