//! Move/annotation bitstream codec.
//!
//! A [`Game`]'s mainline-plus-variations tree is encoded as two blobs: a
//! bitstream of 2-bit-tagged move items, and a companion byte stream of
//! NUL-terminated annotation strings and NAG runs, appended in the exact
//! order their flag bits are set. A move's payload is its index into
//! [`generate_moves`]'s output for the position it was played from, so
//! the codec depends on nothing but the move generator itself: any
//! change to generation order is a format-compatibility break.
//!
//! Each bitstream item is one of:
//! - `00` MOVE, followed by an 8-bit move index.
//! - `01` ANNOT_MOVE, followed by an 8-bit move index and 3 flag bits
//!   (pre-annotation present, post-annotation present, NAGs present).
//! - `10` VAR_START, `11` VAR_END: bracket a variation, recursively
//!   encoded the same way, rooted at the position before the move it is
//!   an alternative to.
//!
//! An ANNOT_MOVE with all 11 trailing bits zero is the end-of-game
//! sentinel and always appears exactly once, at the very end.

use crate::bitstream::{BitReader, BitWriter};
use crate::movegen::{generate_moves, make_move};
use crate::movetree::{MoveTree, Nag, NodeId};
use crate::{Game, Position};

const TYPE_BITS: u32 = 2;
const TYPE_MOVE: u32 = 0b00;
const TYPE_ANNOTMOVE: u32 = 0b01;
const TYPE_VARSTART: u32 = 0b10;
const TYPE_VAREND: u32 = 0b11;

const MOVE_BITS: u32 = 8;
const ANNOTMOVE_BITS: u32 = 11;
const MOVE_INDEX_MASK: u32 = 0x00ff;
const PRE_ANNOT_BIT: u32 = 0x0100;
const POST_ANNOT_BIT: u32 = 0x0200;
const NAGS_BIT: u32 = 0x0400;

/// Errors decoding a move/annotation blob pair produced elsewhere (or
/// corrupted in storage).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveCodecError {
    #[error("move bitstream ended before the end-of-game marker")]
    TruncatedBitstream,
    #[error("move index {index} has no matching legal move ({available} available)")]
    IllegalMoveIndex { index: usize, available: usize },
    #[error("annotation blob ended before a NUL-terminated string was closed")]
    TruncatedAnnotationString,
    #[error("annotation blob ended before a NAG run's terminating byte")]
    TruncatedNagRun,
    #[error("annotation blob contains out-of-range NAG byte {0}")]
    InvalidNag(u8),
    #[error("VAR_END with no matching VAR_START")]
    UnmatchedVarEnd,
    #[error("bitstream ended with {0} variation(s) still open")]
    UnterminatedVariation(usize),
}

/// Encodes a game's move tree into (moves blob, annotations blob).
#[must_use]
pub fn encode_game(game: &Game) -> (Vec<u8>, Vec<u8>) {
    let mut bits = BitWriter::new();
    let mut annotations = Vec::new();

    if let Some(root) = game.tree().root() {
        encode_line(game.tree(), root, game.start_position(), &mut bits, &mut annotations);
    }

    bits.write(TYPE_ANNOTMOVE, TYPE_BITS);
    bits.write(0, ANNOTMOVE_BITS);

    (bits.into_bytes(), annotations)
}

/// Encodes one line (mainline or variation body) starting at `start`,
/// played from `start_pos`, plus every variation branching off a move in
/// that line, recursively.
fn encode_line(
    tree: &MoveTree,
    start: NodeId,
    start_pos: &Position,
    bits: &mut BitWriter,
    annotations: &mut Vec<u8>,
) {
    let mut pos = start_pos.clone();
    let mut cur = Some(start);

    while let Some(id) = cur {
        let moves = generate_moves(&pos);
        let index = moves
            .as_slice()
            .iter()
            .position(|m| *m == tree.mov(id))
            .expect("recorded move must be legal in its own recorded position");

        let mut encoded = index as u32;
        let mut is_annot = false;

        let pre = tree.pre_annotation(id);
        if !pre.is_empty() {
            annotations.extend_from_slice(pre.as_bytes());
            annotations.push(0);
            encoded |= PRE_ANNOT_BIT;
            is_annot = true;
        }

        let post = tree.post_annotation(id);
        if !post.is_empty() {
            annotations.extend_from_slice(post.as_bytes());
            annotations.push(0);
            encoded |= POST_ANNOT_BIT;
            is_annot = true;
        }

        let nags: Vec<Nag> = tree.nags(id).iter().copied().filter(|n| *n != Nag::NONE).collect();
        if !nags.is_empty() {
            for nag in &nags {
                annotations.push(nag.value());
            }
            annotations.push(Nag::NONE.value());
            encoded |= NAGS_BIT;
            is_annot = true;
        }

        if is_annot {
            bits.write(TYPE_ANNOTMOVE, TYPE_BITS);
            bits.write(encoded, ANNOTMOVE_BITS);
        } else {
            bits.write(TYPE_MOVE, TYPE_BITS);
            bits.write(encoded, MOVE_BITS);
        }

        pos = make_move(&pos, tree.mov(id));

        // Every alternative move recorded at this point in the line, in
        // sibling order, regardless of whether `id` is itself one such
        // alternative (a variation can have its own co-variations).
        let mut sib = tree.variation(id);
        while let Some(s) = sib {
            let sib_start = tree
                .prior_position(s)
                .cloned()
                .expect("variation head must carry its prior position");
            bits.write(TYPE_VARSTART, TYPE_BITS);
            encode_line(tree, s, &sib_start, bits, annotations);
            bits.write(TYPE_VAREND, TYPE_BITS);
            sib = tree.variation(s);
        }

        cur = tree.next(id);
    }
}

/// One in-progress line while decoding: the position to generate the next
/// move's index against, the last node appended, and (if a move was just
/// appended) the position it was played from, needed if a variation
/// immediately follows.
struct Frame {
    pos: Position,
    last: Option<NodeId>,
    last_pre_pos: Option<Position>,
}

/// Decodes a move/annotation blob pair into a [`Game`] starting from
/// `start_pos`.
pub fn decode_game(
    start_pos: Position,
    moves: &[u8],
    annotations: &[u8],
) -> Result<Game, MoveCodecError> {
    let mut tree = MoveTree::new();
    let mut reader = BitReader::new(moves);
    let mut annot_pos = 0usize;
    let mut stack = vec![Frame { pos: start_pos.clone(), last: None, last_pre_pos: None }];

    loop {
        let item_type = reader.read(TYPE_BITS).ok_or(MoveCodecError::TruncatedBitstream)?;

        match item_type {
            TYPE_VARSTART => {
                let parent = stack.last().expect("stack is never empty");
                parent.last.expect("VAR_START must follow a move in the enclosing line");
                let anchor_pre_pos = parent
                    .last_pre_pos
                    .clone()
                    .expect("anchor move must have a recorded pre-position");
                stack.push(Frame { pos: anchor_pre_pos, last: None, last_pre_pos: None });
            }
            TYPE_VAREND => {
                if stack.len() <= 1 {
                    return Err(MoveCodecError::UnmatchedVarEnd);
                }
                stack.pop();
            }
            TYPE_MOVE | TYPE_ANNOTMOVE => {
                let bits = if item_type == TYPE_MOVE { MOVE_BITS } else { ANNOTMOVE_BITS };
                let payload = reader.read(bits).ok_or(MoveCodecError::TruncatedBitstream)?;

                if item_type == TYPE_ANNOTMOVE && payload == 0 {
                    if stack.len() > 1 {
                        return Err(MoveCodecError::UnterminatedVariation(stack.len() - 1));
                    }
                    break;
                }

                let index = (payload & MOVE_INDEX_MASK) as usize;
                let frame = stack.last_mut().expect("stack is never empty");
                let pre_pos = frame.pos.clone();
                let candidates = generate_moves(&pre_pos);
                let mov = *candidates.as_slice().get(index).ok_or(
                    MoveCodecError::IllegalMoveIndex { index, available: candidates.len() },
                )?;
                let new_pos = make_move(&pre_pos, mov);
                let hash = new_pos.zobrist_hash();

                let node = match frame.last {
                    Some(prev) => tree.add_move(Some(prev), mov, hash),
                    None => {
                        if stack.len() == 1 {
                            tree.add_move(None, mov, hash)
                        } else {
                            let anchor_idx = stack.len() - 2;
                            let anchor = stack[anchor_idx]
                                .last
                                .expect("variation anchor must exist in the enclosing frame");
                            tree.add_variation(anchor, mov, hash, true)
                        }
                    }
                };

                if tree.prev(node).is_none() {
                    tree.set_prior_position(node, pre_pos.clone());
                }

                if item_type == TYPE_ANNOTMOVE {
                    if payload & PRE_ANNOT_BIT != 0 {
                        let (text, next) = read_cstr(annotations, annot_pos)?;
                        tree.set_pre_annotation(node, text);
                        annot_pos = next;
                    }
                    if payload & POST_ANNOT_BIT != 0 {
                        let (text, next) = read_cstr(annotations, annot_pos)?;
                        tree.set_post_annotation(node, text);
                        annot_pos = next;
                    }
                    if payload & NAGS_BIT != 0 {
                        let next = read_nag_run(annotations, annot_pos, &mut tree, node)?;
                        annot_pos = next;
                    }
                }

                let frame = stack.last_mut().expect("stack is never empty");
                frame.last = Some(node);
                frame.last_pre_pos = Some(pre_pos);
                frame.pos = new_pos;
            }
            _ => unreachable!("2-bit field can only hold these four values"),
        }
    }

    Ok(Game::from_decoded(tree, start_pos))
}

fn read_cstr(annotations: &[u8], start: usize) -> Result<(String, usize), MoveCodecError> {
    let end = annotations[start..]
        .iter()
        .position(|b| *b == 0)
        .ok_or(MoveCodecError::TruncatedAnnotationString)?;
    let text = String::from_utf8_lossy(&annotations[start..start + end]).into_owned();
    Ok((text, start + end + 1))
}

fn read_nag_run(
    annotations: &[u8],
    start: usize,
    tree: &mut MoveTree,
    node: NodeId,
) -> Result<usize, MoveCodecError> {
    let mut pos = start;
    loop {
        let byte = *annotations.get(pos).ok_or(MoveCodecError::TruncatedNagRun)?;
        pos += 1;
        if byte == Nag::NONE.value() {
            return Ok(pos);
        }
        let nag = Nag::from_value(byte).ok_or(MoveCodecError::InvalidNag(byte))?;
        tree.add_nag(node, nag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movetree::Nag;
    use crate::Position;

    #[test]
    fn roundtrip_plain_mainline() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        game.make_move_san("Nf3").unwrap();

        let (moves, annotations) = encode_game(&game);
        assert!(annotations.is_empty());

        let decoded = decode_game(Position::startpos(), &moves, &annotations).unwrap();
        assert_eq!(decoded.to_fen(), game.to_fen());
        assert_eq!(decoded.move_history().len(), 3);
        assert_eq!(decoded.move_history()[2].san, "Nf3");
    }

    #[test]
    fn roundtrip_with_annotations_and_nags() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();

        let e4 = game.tree().root().unwrap();
        let e5 = game.tree().next(e4).unwrap();
        game.tree_mut().set_pre_annotation(e5, "forced");
        game.tree_mut().set_post_annotation(e5, "the only reasonable reply");
        game.tree_mut().add_nag(e5, Nag::GOOD_MOVE);
        game.tree_mut().add_nag(e5, Nag::ONLY_MOVE);

        let (moves, annotations) = encode_game(&game);
        assert!(!annotations.is_empty());

        let decoded = decode_game(Position::startpos(), &moves, &annotations).unwrap();
        assert_eq!(decoded.move_history().len(), 2);

        let decoded_e4 = decoded.tree().root().unwrap();
        let decoded_e5 = decoded.tree().next(decoded_e4).unwrap();
        assert_eq!(decoded.tree().pre_annotation(decoded_e5), "forced");
        assert_eq!(decoded.tree().post_annotation(decoded_e5), "the only reasonable reply");
        assert_eq!(decoded.tree().nags(decoded_e5)[0], Nag::GOOD_MOVE);
        assert_eq!(decoded.tree().nags(decoded_e5)[1], Nag::ONLY_MOVE);
    }

    #[test]
    fn roundtrip_with_variation() {
        let mut game = Game::new();
        game.make_move_san("e4").unwrap();
        game.make_move_san("e5").unwrap();
        game.start_variation();
        game.make_move_san("c5").unwrap();
        game.end_variation();

        let (moves, annotations) = encode_game(&game);
        let decoded = decode_game(Position::startpos(), &moves, &annotations).unwrap();

        // Mainline is still 1.e4 e5.
        assert_eq!(decoded.move_history().len(), 2);
        assert_eq!(decoded.move_history()[1].san, "e5");

        let root = decoded.tree().root().unwrap();
        let mainline_e5 = decoded.tree().next(root).unwrap();
        let sicilian = decoded.tree().variation(mainline_e5).unwrap();
        assert_eq!(decoded.tree().mov(sicilian).to_uci(), "c7c5");
    }

    #[test]
    fn truncated_bitstream_is_an_error() {
        let err = decode_game(Position::startpos(), &[], &[]).unwrap_err();
        assert_eq!(err, MoveCodecError::TruncatedBitstream);
    }

    #[test]
    fn illegal_move_index_is_an_error() {
        // One MOVE item pointing far past the 20 legal opening moves,
        // followed by the end-of-game marker.
        let mut bits = BitWriter::new();
        bits.write(TYPE_MOVE, TYPE_BITS);
        bits.write(0xff, MOVE_BITS);
        bits.write(TYPE_ANNOTMOVE, TYPE_BITS);
        bits.write(0, ANNOTMOVE_BITS);

        let err = decode_game(Position::startpos(), &bits.into_bytes(), &[]).unwrap_err();
        assert!(matches!(err, MoveCodecError::IllegalMoveIndex { .. }));
    }

    #[test]
    fn nag_value_roundtrips_through_codec() {
        assert_eq!(Nag::GOOD_MOVE.value(), 1);
    }
}
