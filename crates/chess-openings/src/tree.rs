//! The opening tree itself: an index from position hash to the moves
//! played from it, plus the ECO labels attached to known theory
//! endpoints.

use std::collections::HashMap;

use chess_engine::{make_move, Game};

use crate::opening::{Classification, OpeningLabel, OpeningTreeEntry};

/// A hash-keyed index over opening theory, built either from
/// [`builtin`](crate::builtin) data or from a database's `optree` table.
#[derive(Debug, Clone, Default)]
pub struct OpeningTree {
    entries: HashMap<u64, Vec<OpeningTreeEntry>>,
    labels: HashMap<u64, OpeningLabel>,
}

impl OpeningTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes one `optree` row under the position it was played from.
    pub fn insert_entry(&mut self, entry: OpeningTreeEntry) {
        self.entries.entry(entry.hash_key).or_default().push(entry);
    }

    /// Attaches an ECO label to a position reached by known theory.
    pub fn label_position(&mut self, hash_key: u64, label: OpeningLabel) {
        self.labels.insert(hash_key, label);
    }

    /// Returns every recorded continuation from `hash_key`.
    #[must_use]
    pub fn entries_from(&self, hash_key: u64) -> &[OpeningTreeEntry] {
        self.entries.get(&hash_key).map_or(&[], Vec::as_slice)
    }

    /// Returns the ECO label attached to a position, if it is a known
    /// theory endpoint.
    #[must_use]
    pub fn label_for(&self, hash_key: u64) -> Option<&OpeningLabel> {
        self.labels.get(&hash_key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Classifies a game by probing successive positions of its mainline
    /// against the index, preferring (by construction: only last-move
    /// theory endpoints are labeled) entries flagged `last_move`, and
    /// latching the deepest match found.
    #[must_use]
    pub fn classify(&self, game: &Game) -> Option<Classification> {
        let mut best: Option<Classification> = None;
        let mut pos = game.start_position().clone();

        if let Some(label) = self.label_for(pos.zobrist_hash()) {
            best = Some(to_classification(label, 0));
        }

        for (ply, gm) in game.move_history().into_iter().enumerate() {
            pos = make_move(&pos, gm.mov);
            if let Some(label) = self.label_for(pos.zobrist_hash()) {
                best = Some(to_classification(label, ply + 1));
            }
        }

        best
    }
}

fn to_classification(label: &OpeningLabel, ply: usize) -> Classification {
    Classification {
        eco: label.eco.clone(),
        name: label.name.clone(),
        variation: label.variation.clone(),
        ply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opening::OpeningTreeEntry;
    use chess_core::{Piece, Square};

    #[test]
    fn classify_empty_tree_returns_none() {
        let tree = OpeningTree::new();
        let game = Game::new();
        assert_eq!(tree.classify(&game), None);
    }

    #[test]
    fn classify_matches_labeled_position() {
        let mut tree = OpeningTree::new();
        let mut game = Game::new();
        let start_hash = game.position().zobrist_hash();
        game.make_move_uci("e2e4").unwrap();
        let after_hash = game.position().zobrist_hash();

        tree.insert_entry(OpeningTreeEntry {
            hash_key: start_hash,
            mov: chess_core::Move::new(
                Square::from_algebraic("e2").unwrap(),
                Square::from_algebraic("e4").unwrap(),
                Piece::Pawn,
            ),
            score: 0,
            last_move: true,
            game_id: 0,
        });
        tree.label_position(after_hash, OpeningLabel::new("C20", "King's Pawn Game"));

        let classification = tree.classify(&game).unwrap();
        assert_eq!(classification.eco, "C20");
        assert_eq!(classification.ply, 1);
    }

    #[test]
    fn classify_prefers_deepest_match() {
        let mut tree = OpeningTree::new();
        let mut game = Game::new();
        game.make_move_uci("e2e4").unwrap();
        let after_e4 = game.position().zobrist_hash();
        game.make_move_uci("c7c5").unwrap();
        let after_sicilian = game.position().zobrist_hash();

        tree.label_position(after_e4, OpeningLabel::new("B00", "King's Pawn"));
        tree.label_position(after_sicilian, OpeningLabel::new("B20", "Sicilian Defense"));

        let classification = tree.classify(&game).unwrap();
        assert_eq!(classification.eco, "B20");
        assert_eq!(classification.ply, 2);
    }
}
