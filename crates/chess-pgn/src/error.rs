use crate::tokenizer::TokenizerError;

/// Errors reading or writing PGN game text or a PGN database.
#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("{0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("line {0}: {1}")]
    Parse(u32, String),
    #[error("game has no moves")]
    Empty,
    #[error("result token does not match the header's result")]
    ResultMismatch,
    #[error("database is not open")]
    NotOpen,
    #[error("database has no index; call index() before a random-access read")]
    NotIndexed,
    #[error("database is read-only")]
    ReadOnly,
    #[error("game number {0} is out of range (database has {1} games)")]
    OutOfRange(u32, u32),
    #[error("sequential-access databases can only be appended to")]
    AppendOnly,
    #[error("in-place editing of an existing game is not supported")]
    InPlaceEditUnsupported,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid FEN in header: {0}")]
    InvalidFen(String),
    #[error(transparent)]
    Game(#[from] chess_engine::GameError),
}
