//! 38-byte binary encoding of a [`Position`], for the `game.partial`
//! column (optional non-standard start position) and any other storage
//! that wants a position without a FEN round-trip.
//!
//! Layout (MSB-first bitstream):
//! - 64 nibbles, one per square: 0 = empty, low 3 bits = piece index + 1,
//!   bit 3 = colour (1 = black).
//! - 1 bit side to move (0 = white).
//! - 4 bits castling rights (WKS|WQS|BKS|BQS).
//! - 4 bits en passant file (0 = none, else 1..8).
//! - 16 bits halfmove clock.
//! - 16 bits fullmove number.
//!
//! 64*4 + 1 + 4 + 4 + 16 + 16 = 297 bits, padded to 38 bytes (304 bits).

use chess_core::{Color, Piece, Square};

use crate::bitstream::{BitReader, BitWriter};
use crate::movegen::checkers;
use crate::position::CastlingRights;
use crate::Position;

/// Size in bytes of an encoded position blob.
pub const POSITION_BLOB_SIZE: usize = 38;

/// Errors decoding a position blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    #[error("position blob is {0} bytes, expected at least {POSITION_BLOB_SIZE}")]
    WrongSize(usize),
    #[error("position blob ended before it was fully decoded")]
    Truncated,
    #[error("blob nibble {0:#x} does not name a valid piece")]
    InvalidPiece(u32),
    #[error("position is illegal: {0}")]
    IllegalPosition(&'static str),
}

/// Encodes a position into its 38-byte blob form.
#[must_use]
pub fn encode_position(position: &Position) -> Vec<u8> {
    let mut bits = BitWriter::new();

    for sq_index in 0..64u8 {
        let sq = unsafe { Square::from_index_unchecked(sq_index) };
        let nibble = match position.piece_at(sq) {
            None => 0,
            Some((piece, color)) => {
                let value = (piece.index() as u32 + 1) & 0x7;
                value | if color == Color::Black { 0x8 } else { 0x0 }
            }
        };
        bits.write(nibble, 4);
    }

    bits.write(if position.side_to_move == Color::White { 0 } else { 1 }, 1);
    bits.write(u32::from(position.castling.raw()), 4);
    bits.write(
        match position.en_passant {
            Some(sq) => u32::from(sq.file() as u8) + 1,
            None => 0,
        },
        4,
    );
    bits.write(position.halfmove_clock, 16);
    bits.write(position.fullmove_number, 16);

    let mut bytes = bits.into_bytes();
    bytes.resize(POSITION_BLOB_SIZE, 0);
    bytes
}

/// Decodes a 38-byte blob into a [`Position`], re-verifying legality.
pub fn decode_position(blob: &[u8]) -> Result<Position, BlobError> {
    if blob.len() < POSITION_BLOB_SIZE {
        return Err(BlobError::WrongSize(blob.len()));
    }

    let mut reader = BitReader::new(blob);
    let mut position = Position::empty();

    for sq_index in 0..64u8 {
        let nibble = reader.read(4).ok_or(BlobError::Truncated)?;
        if nibble == 0 {
            continue;
        }
        let color = if nibble & 0x8 != 0 { Color::Black } else { Color::White };
        let piece_index = (nibble & 0x7) as usize;
        let piece = *Piece::ALL
            .get(piece_index.wrapping_sub(1))
            .ok_or(BlobError::InvalidPiece(nibble))?;

        let sq = unsafe { Square::from_index_unchecked(sq_index) };
        position.pieces[piece.index()].set(sq);
        position.colors[color.index()].set(sq);
        position.mailbox[sq_index as usize] = Some((piece, color));
    }

    let wtm = reader.read(1).ok_or(BlobError::Truncated)? == 0;
    position.side_to_move = if wtm { Color::White } else { Color::Black };

    let castling = reader.read(4).ok_or(BlobError::Truncated)?;
    position.castling = CastlingRights::new(castling as u8);

    let ep_field = reader.read(4).ok_or(BlobError::Truncated)?;
    position.en_passant = if ep_field == 0 {
        None
    } else {
        let file = (ep_field - 1) as u8;
        let rank = if wtm { 5u8 } else { 2u8 };
        Some(unsafe { Square::from_index_unchecked(rank * 8 + file) })
    };

    position.halfmove_clock = reader.read(16).ok_or(BlobError::Truncated)?;
    position.fullmove_number = reader.read(16).ok_or(BlobError::Truncated)?;
    position.ply = position.fullmove_number.saturating_sub(1) * 2
        + if position.side_to_move == Color::Black { 1 } else { 0 };

    validate_legality(&position)?;

    position.hash_key = position.recompute_hash();
    let own_checkers = checkers(&position, position.side_to_move);
    position.in_check = own_checkers.is_not_empty();
    position.double_check = own_checkers.count() >= 2;

    Ok(position)
}

/// Checks the legality invariants a decoded position must satisfy
/// before it can be trusted: one king per side, no more than 16 pieces
/// per side, castling rights backed by a king and rook still on their
/// home squares, and the side not to move must not be in check.
fn validate_legality(position: &Position) -> Result<(), BlobError> {
    for color in [Color::White, Color::Black] {
        let kings = position.pieces_of(Piece::King, color);
        if kings.count() != 1 {
            return Err(BlobError::IllegalPosition("each side must have exactly one king"));
        }
        if position.colors[color.index()].count() > 16 {
            return Err(BlobError::IllegalPosition("a side cannot have more than 16 pieces"));
        }
    }

    let home_rank = |color: Color| if color == Color::White { 0u8 } else { 7u8 };
    let king_home = |color: Color| unsafe { Square::from_index_unchecked(home_rank(color) * 8 + 4) };
    let rook_home = |color: Color, kingside: bool| unsafe {
        Square::from_index_unchecked(home_rank(color) * 8 + if kingside { 7 } else { 0 })
    };

    let has_piece = |sq: Square, piece: Piece, color: Color| position.piece_at(sq) == Some((piece, color));

    for color in [Color::White, Color::Black] {
        let kingside = position.castling.can_castle_kingside(color);
        let queenside = position.castling.can_castle_queenside(color);
        if (kingside || queenside) && !has_piece(king_home(color), Piece::King, color) {
            return Err(BlobError::IllegalPosition(
                "castling rights require the king on its home square",
            ));
        }
        if kingside && !has_piece(rook_home(color, true), Piece::Rook, color) {
            return Err(BlobError::IllegalPosition(
                "kingside castling rights require a rook on the h-file home square",
            ));
        }
        if queenside && !has_piece(rook_home(color, false), Piece::Rook, color) {
            return Err(BlobError::IllegalPosition(
                "queenside castling rights require a rook on the a-file home square",
            ));
        }
    }

    if let Some(ep) = position.en_passant {
        let mover = position.side_to_move;
        let pawn_rank = if mover == Color::White { 4u8 } else { 3u8 };
        let pawn_sq = unsafe { Square::from_index_unchecked(pawn_rank * 8 + ep.file() as u8) };
        if !has_piece(pawn_sq, Piece::Pawn, mover.opposite()) {
            return Err(BlobError::IllegalPosition(
                "en passant file has no pawn to capture behind it",
            ));
        }
    }

    let opponent_checkers = checkers(position, position.side_to_move.opposite());
    if opponent_checkers.is_not_empty() {
        return Err(BlobError::IllegalPosition(
            "the side not to move cannot be in check",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_startpos() {
        let pos = Position::startpos();
        let blob = encode_position(&pos);
        assert_eq!(blob.len(), POSITION_BLOB_SIZE);
        let decoded = decode_position(&blob).unwrap();
        assert_eq!(decoded.to_fen(), pos.to_fen());
    }

    #[test]
    fn roundtrip_with_en_passant_and_partial_castling() {
        let fen = "r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 12 34";
        let pos = Position::from_fen(fen).unwrap();
        let blob = encode_position(&pos);
        let decoded = decode_position(&blob).unwrap();
        assert_eq!(decoded.to_fen(), fen);
    }

    #[test]
    fn wrong_size_is_an_error() {
        let err = decode_position(&[0u8; 10]).unwrap_err();
        assert_eq!(err, BlobError::WrongSize(10));
    }

    #[test]
    fn two_white_kings_is_illegal() {
        let fen = "4k3/8/8/8/8/8/8/4KK2 w - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        let blob = encode_position(&pos);
        let err = decode_position(&blob).unwrap_err();
        assert_eq!(
            err,
            BlobError::IllegalPosition("each side must have exactly one king")
        );
    }

    #[test]
    fn castling_rights_without_rook_is_illegal() {
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        pos.castling = CastlingRights::new(CastlingRights::WHITE_KINGSIDE);
        let blob = encode_position(&pos);
        let err = decode_position(&blob).unwrap_err();
        assert!(matches!(err, BlobError::IllegalPosition(_)));
    }
}
