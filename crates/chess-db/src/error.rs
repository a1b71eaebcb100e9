/// Errors opening or operating on a relational game database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database does not exist and was opened read-only")]
    NotOpen,
    #[error("database schema version is {0}, expected 1")]
    WrongSchemaVersion(i64),
    #[error("no game with id {0}")]
    NoSuchGame(i64),
    #[error("date criterion {0:?} is not YYYY, YYYYMM, or YYYYMMDD")]
    InvalidDateCriterion(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Blob(#[from] chess_engine::BlobError),
    #[error(transparent)]
    MoveCodec(#[from] chess_engine::MoveCodecError),
}
