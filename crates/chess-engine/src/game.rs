//! Full game management: owns a move tree and the canonical position cursor.
//!
//! Unlike [`Position`], which represents a single board state, [`Game`] tracks
//! the whole played-out tree (mainline plus variations) and keeps a cursor
//! (`current`) pointing at whichever move is "now". Moves are appended,
//! branched into variations, navigated, and unmade by walking the tree
//! rather than by mutating a flat history vector.

use crate::movegen::{generate_moves, is_king_attacked, make_move};
use crate::movetree::{MoveTree, NodeId};
use crate::rules::{DrawReason, GameResult, RuleSet, StandardChess};
use crate::san::{move_to_san, san_to_move, SanError};
use crate::timecontrol::TimeControl;
use crate::{MoveList, Position};
use chess_core::Move;
use std::fmt;

/// One player's entry in a [`Roster`]. Elo is kept here, per-game, rather
/// than on a shared player dictionary, since a player's rating at the time
/// of one game has no bearing on their rating in another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub last_name: String,
    pub first_names: String,
    pub country_code: Option<String>,
    pub elo: Option<u32>,
}

/// The outcome recorded against a game's roster. Distinct from
/// [`GameResult`]/[`DrawReason`], which describe *why* the rules engine
/// ended the game; this is the header-level fact PGN/database consumers
/// read (and the only field of the two that can be set on an unfinished
/// or adjudicated game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Unfinished,
}

/// A date recorded on a game's roster. PGN allows any field to be
/// unknown (written as `?`), so each is optional independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RosterDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// A tournament round, with an optional sub-round (e.g. `3.2` for
/// round 3, board/game 2 of a playoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterRound {
    pub major: u32,
    pub minor: Option<u32>,
}

/// The non-move bookkeeping a game carries: players, venue, timing, and
/// outcome. Separate from [`Game`]'s move tree because none of it
/// affects move legality.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub white: PlayerRecord,
    pub black: PlayerRecord,
    pub event: String,
    pub site: String,
    pub date: RosterDate,
    pub round: Option<RosterRound>,
    pub result: RosterResult,
    pub annotator: Option<String>,
    pub eco: Option<String>,
    pub time_control: Option<TimeControl>,
}

/// A move read back off the tree, with the SAN notation and pre-move hash
/// recomputed by replaying from the start position.
#[derive(Debug, Clone)]
pub struct GameMove {
    /// The move in internal format.
    pub mov: Move,
    /// SAN notation for the move.
    pub san: String,
    /// Zobrist hash of the position before the move.
    pub hash_before: u64,
}

/// Error type for game operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The move is not legal in the current position.
    IllegalMove(String),
    /// The SAN string could not be parsed.
    InvalidSan(SanError),
    /// The game has already ended.
    GameAlreadyOver,
    /// Cannot claim draw (conditions not met).
    CannotClaimDraw,
    /// The move-list index was out of range.
    NoSuchMove(usize),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::IllegalMove(s) => write!(f, "illegal move: {}", s),
            GameError::InvalidSan(e) => write!(f, "invalid SAN: {}", e),
            GameError::GameAlreadyOver => write!(f, "game has already ended"),
            GameError::CannotClaimDraw => write!(f, "cannot claim draw: conditions not met"),
            GameError::NoSuchMove(i) => write!(f, "no legal move at index {}", i),
        }
    }
}

impl std::error::Error for GameError {}

impl From<SanError> for GameError {
    fn from(e: SanError) -> Self {
        GameError::InvalidSan(e)
    }
}

/// A complete chess game: a move tree plus a cursor into it.
#[derive(Debug, Clone)]
pub struct Game {
    tree: MoveTree,
    start_pos: Position,
    /// The move the cursor is sitting on; `None` means "at the start position".
    current: Option<NodeId>,
    /// Position at the cursor.
    position: Position,
    /// Set by [`start_variation`](Self::start_variation); makes the next
    /// move attach as a sibling of the current move rather than extend it.
    pending_variation: bool,
    result: Option<GameResult>,
    draw_claimed: bool,
    roster: Roster,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        Self::from_position(StandardChess.initial_position())
    }

    /// Creates a game from a custom starting position.
    pub fn from_position(position: Position) -> Self {
        let mut game = Game {
            tree: MoveTree::new(),
            start_pos: position.clone(),
            current: None,
            position,
            pending_variation: false,
            result: None,
            draw_claimed: false,
            roster: Roster::default(),
        };
        game.check_game_end();
        game
    }

    /// Returns the game's roster (players, venue, timing, outcome).
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Returns a mutable reference to the game's roster.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Replaces the game's roster wholesale.
    pub fn set_roster(&mut self, roster: Roster) {
        self.roster = roster;
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, chess_core::FenError> {
        let position = Position::from_fen(fen)?;
        Ok(Self::from_position(position))
    }

    /// Direct read access to the underlying move tree, for callers (PGN/
    /// binary database writers) that need to walk the whole tree rather
    /// than just the cursor.
    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    /// Mutable access to the underlying move tree, for annotating moves
    /// (pre/post comments, NAGs) outside of move-entry.
    pub(crate) fn tree_mut(&mut self) -> &mut MoveTree {
        &mut self.tree
    }

    /// Sets the comment that precedes the move at the cursor in PGN text.
    /// No-op if the cursor is at the start position.
    pub fn set_current_pre_annotation(&mut self, text: impl Into<String>) {
        if let Some(cur) = self.current {
            self.tree.set_pre_annotation(cur, text);
        }
    }

    /// Sets the comment that follows the move at the cursor in PGN text.
    /// No-op if the cursor is at the start position.
    pub fn set_current_post_annotation(&mut self, text: impl Into<String>) {
        if let Some(cur) = self.current {
            self.tree.set_post_annotation(cur, text);
        }
    }

    /// Attaches a NAG to the move at the cursor. No-op if the cursor is at
    /// the start position.
    pub fn add_current_nag(&mut self, nag: crate::movetree::Nag) {
        if let Some(cur) = self.current {
            self.tree.add_nag(cur, nag);
        }
    }

    /// Builds a game from a tree already fully constructed (by the
    /// bitstream decoder) and its starting position. The cursor is left on
    /// the last mainline move, mirroring where sequential `make_move` calls
    /// would have left it.
    pub(crate) fn from_decoded(tree: MoveTree, start_pos: Position) -> Self {
        let mut game = Game {
            tree,
            start_pos: start_pos.clone(),
            current: None,
            position: start_pos,
            pending_variation: false,
            result: None,
            draw_claimed: false,
            roster: Roster::default(),
        };

        let mut last = None;
        let mut cur = game.tree.root();
        while let Some(id) = cur {
            last = Some(id);
            cur = game.tree.next(id);
        }
        game.set_current_move(last);
        game.check_game_end();
        game
    }

    /// Returns a reference to the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Returns the starting position.
    pub fn start_position(&self) -> &Position {
        &self.start_pos
    }

    /// Returns all legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        generate_moves(&self.position)
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        is_king_attacked(&self.position, self.position.side_to_move)
    }

    /// Returns the game result if the game is over. Never mutates state.
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Returns true if the game has ended.
    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    /// Returns the move that led to the current position, if any.
    pub fn current_move(&self) -> Option<Move> {
        self.current.map(|id| self.tree.mov(id))
    }

    /// Returns the number of half-moves (plies) from the start to the cursor.
    pub fn ply_count(&self) -> usize {
        self.path_to(self.current).len()
    }

    /// Returns the current full move number.
    pub fn fullmove_number(&self) -> u32 {
        self.position.fullmove_number
    }

    /// Returns the moves from the start position to the cursor, with SAN
    /// and pre-move hash recomputed by replaying from [`start_position`](Self::start_position).
    pub fn move_history(&self) -> Vec<GameMove> {
        let moves = self.path_to(self.current);
        let mut pos = self.start_pos.clone();
        let mut out = Vec::with_capacity(moves.len());
        for mov in moves {
            let san = move_to_san(&pos, mov);
            let hash_before = pos.zobrist_hash();
            out.push(GameMove {
                mov,
                san,
                hash_before,
            });
            pos = make_move(&pos, mov);
        }
        out
    }

    /// Replays from the start position up to (but not including) `id`'s
    /// own move, yielding the position `id` was played from.
    fn position_before(&self, id: NodeId) -> Position {
        let moves = self.path_to(self.predecessor(id));
        let mut pos = self.start_pos.clone();
        for mov in moves {
            pos = make_move(&pos, mov);
        }
        pos
    }

    /// A node's predecessor in *time*: the move played immediately before
    /// it. For a plain continuation that's `prev`; for the head of a
    /// variation chain, every sibling shares the same preceding move, so
    /// this walks `mainline` down to the chain's original member and uses
    /// its `prev` (or `None` if that member is the tree root).
    fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        loop {
            if let Some(p) = self.tree.prev(cur) {
                break Some(p);
            }
            match self.tree.mainline_of(cur) {
                Some(m) => cur = m,
                None => break None,
            }
        }
    }

    /// Collects the moves from the start position down to (and including)
    /// `id`, oldest first.
    fn path_to(&self, id: Option<NodeId>) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut cur = id;
        while let Some(n) = cur {
            moves.push(self.tree.mov(n));
            cur = self.predecessor(n);
        }
        moves.reverse();
        moves
    }

    /// Rebuilds the position cursor by replaying from the start to `id`.
    pub fn set_current_move(&mut self, id: Option<NodeId>) {
        let moves = self.path_to(id);
        let mut pos = self.start_pos.clone();
        for mov in moves {
            pos = make_move(&pos, mov);
        }
        self.position = pos;
        self.current = id;
        self.pending_variation = false;
    }

    /// Moves the cursor back one ply. Returns false if already at the start.
    pub fn go_back(&mut self) -> bool {
        match self.current {
            None => false,
            Some(cur) => {
                self.set_current_move(self.predecessor(cur));
                true
            }
        }
    }

    /// Moves the cursor forward one ply along the mainline of the current
    /// branch. Returns false if there is no next move.
    pub fn go_forward(&mut self) -> bool {
        let next = match self.current {
            None => self.tree.root(),
            Some(cur) => self.tree.next(cur),
        };
        match next {
            Some(n) => {
                self.set_current_move(Some(n));
                true
            }
            None => false,
        }
    }

    /// Brackets an upcoming move as a new variation rather than a
    /// continuation of the current line.
    pub fn start_variation(&mut self) {
        self.pending_variation = true;
    }

    /// Restores the mainline position, undoing any pending variation bracket
    /// and snapping the cursor back onto the move the open variation is an
    /// alternative to.
    pub fn end_variation(&mut self) {
        self.pending_variation = false;
        let Some(cur) = self.current else {
            return;
        };
        let head = self.line_head(cur);
        match self.tree.mainline_of(head) {
            Some(varied) => {
                let prior = self
                    .tree
                    .prior_position(head)
                    .cloned()
                    .unwrap_or_else(|| self.start_pos.clone());
                self.position = make_move(&prior, self.tree.mov(varied));
                self.current = Some(varied);
            }
            None => {
                self.position = self.start_pos.clone();
                self.current = None;
            }
        }
    }

    /// Walks `prev` pointers back to the node that leads its line.
    fn line_head(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(p) = self.tree.prev(cur) {
            cur = p;
        }
        cur
    }

    /// Attaches a resolved, already-legal move to the tree, returning its
    /// node id. With `as_variation` set, branches off as a sibling
    /// variation of the cursor's own move (or of the tree root, if the
    /// cursor is at the start); otherwise extends the current line, or
    /// (if the cursor already has a continuation) branches off as a
    /// sibling variation of that existing move.
    fn attach(&mut self, mov: Move, hash: u64, as_variation: bool) -> NodeId {
        match self.current {
            None => match self.tree.root() {
                None => self.tree.add_move(None, mov, hash),
                Some(root) => self.tree.add_variation(root, mov, hash, true),
            },
            Some(cur) if as_variation => self.tree.add_variation(cur, mov, hash, true),
            Some(cur) => match self.tree.next(cur) {
                None => self.tree.add_move(Some(cur), mov, hash),
                Some(existing) => self.tree.add_variation(existing, mov, hash, true),
            },
        }
    }

    /// If a variation was requested via `start_variation`, rewinds
    /// `self.position` to the position the cursor's own move was played
    /// from. The cursor itself is left alone (still on the move being
    /// varied), since `attach` needs it there to branch off that move's
    /// sibling chain; only the position callers parse/validate the next
    /// move text against needs to move back a ply.
    fn sync_pending_variation(&mut self) {
        if self.pending_variation {
            self.position = match self.current {
                Some(cur) => self.position_before(cur),
                None => self.start_pos.clone(),
            };
        }
    }

    /// Applies an already-legal move: attaches it to the tree, advances the
    /// cursor, and updates the game result.
    fn apply_move(&mut self, mov: Move) {
        let as_variation = self.pending_variation;
        self.pending_variation = false;

        let prior = self.position.clone();
        let new_position = make_move(&self.position, mov);
        let hash = new_position.zobrist_hash();

        let node = self.attach(mov, hash, as_variation);
        if self.tree.prev(node).is_none() {
            self.tree.set_prior_position(node, prior);
        }

        self.current = Some(node);
        self.position = new_position;
        self.check_game_end();
    }

    /// Makes a move given in internal format.
    pub fn make_move(&mut self, m: Move) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        self.sync_pending_variation();

        let legal_moves = self.legal_moves();
        if !legal_moves.as_slice().contains(&m) {
            return Err(GameError::IllegalMove(m.to_uci()));
        }

        self.apply_move(m);
        Ok(())
    }

    /// Makes a move given in SAN notation.
    pub fn make_move_san(&mut self, san: &str) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        self.sync_pending_variation();

        let m = san_to_move(&self.position, san)?;
        self.apply_move(m);
        Ok(())
    }

    /// Makes a move given in UCI notation.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        self.sync_pending_variation();

        if uci.len() < 4 {
            return Err(GameError::IllegalMove(format!("invalid UCI: {}", uci)));
        }
        let from = chess_core::Square::from_algebraic(&uci[0..2])
            .ok_or_else(|| GameError::IllegalMove(format!("invalid UCI: {}", uci)))?;
        let piece = self
            .position
            .piece_at(from)
            .map(|(piece, _)| piece)
            .ok_or_else(|| GameError::IllegalMove(format!("no piece on source square: {}", uci)))?;
        let m = Move::from_uci(uci, piece)
            .ok_or_else(|| GameError::IllegalMove(format!("invalid UCI: {}", uci)))?;

        let legal_moves = self.legal_moves();
        let matching = legal_moves.as_slice().iter().find(|lm| {
            lm.from() == m.from()
                && lm.to() == m.to()
                && (!m.is_promotion() || lm.promotion_piece() == m.promotion_piece())
        });

        match matching {
            Some(&legal_move) => {
                self.apply_move(legal_move);
                Ok(())
            }
            None => Err(GameError::IllegalMove(uci.to_string())),
        }
    }

    /// Makes the `index`-th move from [`legal_moves`](Self::legal_moves).
    pub fn make_move_at_index(&mut self, index: usize) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        self.sync_pending_variation();

        let legal_moves = self.legal_moves();
        let m = *legal_moves
            .as_slice()
            .get(index)
            .ok_or(GameError::NoSuchMove(index))?;
        self.apply_move(m);
        Ok(())
    }

    /// Checks if the game has ended and updates the result. Excludes
    /// repetition counts immediately after a capture, castle, or promotion,
    /// since those can never recur.
    fn check_game_end(&mut self) {
        self.result = self.compute_game_end();
        self.sync_roster_result();
    }

    fn compute_game_end(&mut self) -> Option<GameResult> {
        if self.position.halfmove_clock >= 150 {
            return Some(GameResult::Draw(DrawReason::SeventyFiveMoveRule));
        }

        if StandardChess.is_insufficient_material(&self.position) {
            return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
        }

        if self.position_count() >= 5 {
            return Some(GameResult::Draw(DrawReason::FivefoldRepetition));
        }

        let moves = self.legal_moves();
        if moves.is_empty() {
            return Some(if self.is_check() {
                match self.position.side_to_move {
                    chess_core::Color::White => GameResult::BlackWins,
                    chess_core::Color::Black => GameResult::WhiteWins,
                }
            } else {
                GameResult::Draw(DrawReason::Stalemate)
            });
        }
        None
    }

    /// Keeps the roster's header-level result in step with the rules
    /// engine's verdict. A resignation or draw agreement sets `self.result`
    /// directly without going through `compute_game_end`, so this is also
    /// called from those paths rather than only from `check_game_end`.
    fn sync_roster_result(&mut self) {
        self.roster.result = match self.result {
            None => RosterResult::Unfinished,
            Some(GameResult::WhiteWins) => RosterResult::WhiteWins,
            Some(GameResult::BlackWins) => RosterResult::BlackWins,
            Some(GameResult::Draw(_)) => RosterResult::Draw,
        };
    }

    /// Counts how many times the current position has occurred, walking the
    /// tree backwards along `prev`/`mainline` from the cursor. The start
    /// position itself (which has no tree node) counts as one occurrence
    /// when it matches.
    pub fn position_count(&self) -> usize {
        let current_hash = self.position.zobrist_hash();
        let mut count = match self.current {
            Some(cur) => self.tree.count_repeated_positions(cur, current_hash) as usize,
            None => 0,
        };
        if self.start_pos.zobrist_hash() == current_hash {
            count += 1;
        }
        count
    }

    /// Returns true if a draw can be claimed (threefold repetition or 50-move rule).
    pub fn can_claim_draw(&self) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.position_count() >= 3 || self.position.halfmove_clock >= 100
    }

    /// Claims a draw if conditions are met.
    pub fn claim_draw(&mut self) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }

        if self.position_count() >= 3 {
            self.result = Some(GameResult::Draw(DrawReason::ThreefoldRepetition));
            self.draw_claimed = true;
            self.sync_roster_result();
            return Ok(());
        }

        if self.position.halfmove_clock >= 100 {
            self.result = Some(GameResult::Draw(DrawReason::FiftyMoveRule));
            self.draw_claimed = true;
            self.sync_roster_result();
            return Ok(());
        }

        Err(GameError::CannotClaimDraw)
    }

    /// Agrees to a draw (both players must agree in real chess).
    pub fn agree_draw(&mut self) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }

        self.result = Some(GameResult::Draw(DrawReason::Agreement));
        self.draw_claimed = true;
        self.sync_roster_result();
        Ok(())
    }

    /// Resigns the game for the side to move.
    pub fn resign(&mut self) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }

        self.result = Some(match self.position.side_to_move {
            chess_core::Color::White => GameResult::BlackWins,
            chess_core::Color::Black => GameResult::WhiteWins,
        });
        self.sync_roster_result();
        Ok(())
    }

    /// Returns true if a draw has been claimed or agreed.
    pub fn draw_claimed(&self) -> bool {
        self.draw_claimed
    }

    /// Returns the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Generates SAN for a move in the current position.
    pub fn move_to_san(&self, m: Move) -> String {
        move_to_san(&self.position, m)
    }

    /// Parses SAN and returns the corresponding move.
    pub fn san_to_move(&self, san: &str) -> Result<Move, SanError> {
        san_to_move(&self.position, san)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{File, Piece, Rank, Square};

    #[test]
    fn new_game() {
        let game = Game::new();
        assert_eq!(game.ply_count(), 0);
        assert!(!game.is_game_over());
        assert!(!game.is_check());
    }

    #[test]
    fn make_move_uci() {
        let mut game = Game::new();
        game.make_move_uci("e2e4").unwrap();
        assert_eq!(game.ply_count(), 1);
        assert_eq!(game.move_history()[0].san, "e4");
    }

    #[test]
    fn make_move_san() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        assert_eq!(game.ply_count(), 1);
        game.make_move_san("e5").unwrap();
        assert_eq!(game.ply_count(), 2);
    }

    #[test]
    fn illegal_move() {
        let mut game = Game::new();
        let result = game.make_move_uci("e2e5"); // Can't move pawn 3 squares
        assert!(result.is_err());
    }

    #[test]
    fn checkmate_fools_mate() {
        let mut game = Game::new();
        game.make_move_san("f3").unwrap();
        game.make_move_san("e5").unwrap();
        game.make_move_san("g4").unwrap();
        game.make_move_san("Qh4").unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.result(), Some(GameResult::BlackWins));
    }

    #[test]
    fn stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.result(), Some(GameResult::Draw(DrawReason::Stalemate)));
    }

    #[test]
    fn threefold_repetition() {
        let mut game = Game::new();
        game.make_move_san("Nf3").unwrap();
        game.make_move_san("Nf6").unwrap();
        game.make_move_san("Ng1").unwrap();
        game.make_move_san("Ng8").unwrap();
        assert_eq!(game.position_count(), 2);
        assert!(!game.can_claim_draw());

        game.make_move_san("Nf3").unwrap();
        game.make_move_san("Nf6").unwrap();
        game.make_move_san("Ng1").unwrap();
        game.make_move_san("Ng8").unwrap();
        assert_eq!(game.position_count(), 3);
        assert!(game.can_claim_draw());

        game.claim_draw().unwrap();
        assert!(game.is_game_over());
        assert_eq!(
            game.result(),
            Some(GameResult::Draw(DrawReason::ThreefoldRepetition))
        );
    }

    #[test]
    fn fifty_move_rule() {
        let mut game = Game::from_fen("8/8/8/8/8/8/8/R3K2k w Q - 99 1").unwrap();
        let a1 = Square::new(File::A, Rank::R1);
        let a2 = Square::new(File::A, Rank::R2);
        let m = Move::new(a1, a2, Piece::Rook);
        game.make_move(m).unwrap();
        assert!(game.can_claim_draw());

        game.claim_draw().unwrap();
        assert_eq!(
            game.result(),
            Some(GameResult::Draw(DrawReason::FiftyMoveRule))
        );
    }

    #[test]
    fn seventy_five_move_rule_automatic() {
        let game = Game::from_fen("8/8/8/8/8/8/8/R3K2k w Q - 150 1").unwrap();
        assert!(game.is_game_over());
        assert_eq!(
            game.result(),
            Some(GameResult::Draw(DrawReason::SeventyFiveMoveRule))
        );
    }

    #[test]
    fn insufficient_material() {
        let game = Game::from_fen("8/8/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert!(game.is_game_over());
        assert_eq!(
            game.result(),
            Some(GameResult::Draw(DrawReason::InsufficientMaterial))
        );
    }

    #[test]
    fn resign() {
        let mut game = Game::new();
        game.resign().unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.result(), Some(GameResult::BlackWins));
    }

    #[test]
    fn agree_draw() {
        let mut game = Game::new();
        game.agree_draw().unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.result(), Some(GameResult::Draw(DrawReason::Agreement)));
    }

    #[test]
    fn cannot_move_after_game_over() {
        let mut game = Game::new();
        game.resign().unwrap();
        let result = game.make_move_san("e4");
        assert!(matches!(result, Err(GameError::GameAlreadyOver)));
    }

    #[test]
    fn move_history() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        game.make_move_san("Nf3").unwrap();

        let history = game.move_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].san, "e4");
        assert_eq!(history[1].san, "e5");
        assert_eq!(history[2].san, "Nf3");
    }

    #[test]
    fn go_back_and_forward() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        assert_eq!(game.ply_count(), 2);

        assert!(game.go_back());
        assert_eq!(game.ply_count(), 1);
        assert_eq!(game.current_move().map(|m| m.to_uci()), Some("e2e4".into()));

        assert!(game.go_forward());
        assert_eq!(game.ply_count(), 2);

        assert!(game.go_back());
        assert!(game.go_back());
        assert!(!game.go_back());
        assert_eq!(game.ply_count(), 0);
    }

    #[test]
    fn variation_branches_off_current_move() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        assert!(game.go_back());
        assert!(game.go_back());
        assert_eq!(game.ply_count(), 0);

        game.start_variation();
        game.make_move_san("d4").unwrap();
        assert_eq!(game.ply_count(), 1);

        let mut expected = Game::new();
        expected.make_move_san("d4").unwrap();
        assert_eq!(game.to_fen(), expected.to_fen());

        // end_variation snaps back onto the move the variation was an
        // alternative to (1.e4), not all the way back to the start.
        game.end_variation();
        assert_eq!(game.current_move().map(|m| m.to_uci()), Some("e2e4".to_string()));
        let mut mainline = Game::new();
        mainline.make_move_san("e4").unwrap();
        assert_eq!(game.to_fen(), mainline.to_fen());
    }

    #[test]
    fn roster_defaults_to_unfinished() {
        let game = Game::new();
        assert_eq!(game.roster().result, RosterResult::Unfinished);
    }

    #[test]
    fn roster_tracks_players_and_syncs_result_on_checkmate() {
        let mut game = Game::new();
        game.roster_mut().white = PlayerRecord {
            last_name: "Carlsen".to_string(),
            first_names: "Magnus".to_string(),
            country_code: Some("NOR".to_string()),
            elo: Some(2830),
        };
        game.roster_mut().event = "Test Round".to_string();

        game.make_move_san("f3").unwrap();
        game.make_move_san("e5").unwrap();
        game.make_move_san("g4").unwrap();
        game.make_move_san("Qh4").unwrap();

        assert_eq!(game.roster().white.last_name, "Carlsen");
        assert_eq!(game.roster().result, RosterResult::BlackWins);
    }

    #[test]
    fn roster_result_tracks_resignation_and_draw_agreement() {
        let mut game = Game::new();
        game.resign().unwrap();
        assert_eq!(game.roster().result, RosterResult::BlackWins);

        let mut drawn = Game::new();
        drawn.agree_draw().unwrap();
        assert_eq!(drawn.roster().result, RosterResult::Draw);
    }
}
