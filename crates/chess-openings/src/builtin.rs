//! Seed data for the opening tree: a sampling of named lines across the
//! ECO ranges, keyed by the Zobrist hash of the position each line
//! reaches.

use chess_engine::Game;

use crate::opening::{OpeningLabel, OpeningTreeEntry};
use crate::tree::OpeningTree;

struct Line {
    eco: &'static str,
    name: &'static str,
    variation: Option<&'static str>,
    moves: &'static [&'static str],
}

const LINES: &[Line] = &[
    Line { eco: "C50", name: "Italian Game", variation: None, moves: &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4"] },
    Line { eco: "C53", name: "Giuoco Piano", variation: None, moves: &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5"] },
    Line { eco: "C60", name: "Ruy Lopez", variation: None, moves: &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"] },
    Line { eco: "C65", name: "Ruy Lopez", variation: Some("Morphy Defense"), moves: &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"] },
    Line { eco: "C45", name: "Scotch Game", variation: None, moves: &["e2e4", "e7e5", "g1f3", "b8c6", "d2d4"] },
    Line { eco: "C30", name: "King's Gambit", variation: None, moves: &["e2e4", "e7e5", "f2f4"] },
    Line { eco: "C33", name: "King's Gambit", variation: Some("Accepted"), moves: &["e2e4", "e7e5", "f2f4", "e5f4"] },
    Line { eco: "C42", name: "Petrov Defense", variation: None, moves: &["e2e4", "e7e5", "g1f3", "g8f6"] },
    Line { eco: "C47", name: "Four Knights Game", variation: None, moves: &["e2e4", "e7e5", "g1f3", "b8c6", "b1c3", "g8f6"] },
    Line { eco: "C25", name: "Vienna Game", variation: None, moves: &["e2e4", "e7e5", "b1c3"] },
    Line { eco: "C23", name: "Bishop's Opening", variation: None, moves: &["e2e4", "e7e5", "f1c4"] },
    Line { eco: "C41", name: "Philidor Defense", variation: None, moves: &["e2e4", "e7e5", "g1f3", "d7d6"] },
    Line { eco: "B20", name: "Sicilian Defense", variation: None, moves: &["e2e4", "c7c5"] },
    Line { eco: "B30", name: "Sicilian Defense", variation: Some("Open"), moves: &["e2e4", "c7c5", "g1f3", "b8c6"] },
    Line {
        eco: "B90",
        name: "Sicilian Defense",
        variation: Some("Najdorf Variation"),
        moves: &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "a7a6"],
    },
    Line {
        eco: "B70",
        name: "Sicilian Defense",
        variation: Some("Dragon Variation"),
        moves: &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "g7g6"],
    },
    Line { eco: "C00", name: "French Defense", variation: None, moves: &["e2e4", "e7e6"] },
    Line { eco: "C02", name: "French Defense", variation: Some("Advance Variation"), moves: &["e2e4", "e7e6", "d2d4", "d7d5", "e4e5"] },
    Line { eco: "B10", name: "Caro-Kann Defense", variation: None, moves: &["e2e4", "c7c6"] },
    Line { eco: "B18", name: "Caro-Kann Defense", variation: Some("Classical Variation"), moves: &["e2e4", "c7c6", "d2d4", "d7d5", "b1c3", "d5e4", "c3e4", "c8f5"] },
    Line { eco: "B07", name: "Pirc Defense", variation: None, moves: &["e2e4", "d7d6", "d2d4", "g8f6"] },
    Line { eco: "B02", name: "Alekhine's Defense", variation: None, moves: &["e2e4", "g8f6"] },
    Line { eco: "B01", name: "Scandinavian Defense", variation: None, moves: &["e2e4", "d7d5"] },
    Line { eco: "D06", name: "Queen's Gambit", variation: None, moves: &["d2d4", "d7d5", "c2c4"] },
    Line { eco: "D30", name: "Queen's Gambit Declined", variation: None, moves: &["d2d4", "d7d5", "c2c4", "e7e6"] },
    Line { eco: "D10", name: "Slav Defense", variation: None, moves: &["d2d4", "d7d5", "c2c4", "c7c6"] },
    Line { eco: "D00", name: "London System", variation: None, moves: &["d2d4", "d7d5", "c1f4"] },
    Line { eco: "E60", name: "King's Indian Defense", variation: None, moves: &["d2d4", "g8f6", "c2c4", "g7g6"] },
    Line { eco: "E20", name: "Nimzo-Indian Defense", variation: None, moves: &["d2d4", "g8f6", "c2c4", "e7e6", "b1c3", "f8b4"] },
    Line { eco: "D80", name: "Grunfeld Defense", variation: None, moves: &["d2d4", "g8f6", "c2c4", "g7g6", "b1c3", "d7d5"] },
    Line { eco: "A10", name: "English Opening", variation: None, moves: &["c2c4"] },
    Line { eco: "A07", name: "Reti Opening", variation: Some("King's Indian Attack"), moves: &["g1f3", "d7d5", "g2g3"] },
];

/// Builds the seeded opening tree from [`LINES`].
#[must_use]
pub fn builtin_tree() -> OpeningTree {
    let mut tree = OpeningTree::new();
    for line in LINES {
        add_line(&mut tree, line);
    }
    tree
}

fn add_line(tree: &mut OpeningTree, line: &Line) {
    let mut game = Game::new();
    let mut hash_before = game.position().zobrist_hash();

    for (i, uci) in line.moves.iter().enumerate() {
        game.make_move_uci(uci)
            .unwrap_or_else(|e| panic!("builtin line {} has illegal move {uci}: {e}", line.name));
        let is_last = i + 1 == line.moves.len();
        let mov = game.current_move().expect("move was just played");
        let hash_after = game.position().zobrist_hash();

        tree.insert_entry(OpeningTreeEntry {
            hash_key: hash_before,
            mov,
            score: 0,
            last_move: is_last,
            game_id: 0,
        });

        if is_last {
            let mut label = OpeningLabel::new(line.eco, line.name);
            if let Some(variation) = line.variation {
                label = label.with_variation(variation);
            }
            tree.label_position(hash_after, label);
        }

        hash_before = hash_after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tree_is_not_empty() {
        let tree = builtin_tree();
        assert!(!tree.is_empty());
        assert_eq!(tree.len(), LINES.len());
    }

    #[test]
    fn classifies_italian_game() {
        let tree = builtin_tree();
        let mut game = Game::new();
        for mv in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4"] {
            game.make_move_uci(mv).unwrap();
        }
        let classification = tree.classify(&game).unwrap();
        assert_eq!(classification.eco, "C50");
        assert_eq!(classification.name, "Italian Game");
    }

    #[test]
    fn classifies_sicilian_najdorf_deeper_than_plain_sicilian() {
        let tree = builtin_tree();
        let mut game = Game::new();
        for mv in ["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "a7a6"] {
            game.make_move_uci(mv).unwrap();
        }
        let classification = tree.classify(&game).unwrap();
        assert_eq!(classification.eco, "B90");
        assert_eq!(classification.variation.as_deref(), Some("Najdorf Variation"));
    }

    #[test]
    fn unrecognized_line_returns_none() {
        let tree = builtin_tree();
        let mut game = Game::new();
        game.make_move_uci("g2g3").unwrap();
        game.make_move_uci("g7g6").unwrap();
        game.make_move_uci("g1f3").unwrap();
        assert!(tree.classify(&game).is_none());
    }
}
