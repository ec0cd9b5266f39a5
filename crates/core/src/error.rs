use thiserror::Error;

/// Errors that can occur anywhere in the caissa stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Null move while in check")]
    IllegalNullMove,

    #[error("Invalid PGN at byte {offset}: {message}")]
    InvalidPgn { message: String, offset: usize },

    #[error("Invalid SAN {san:?} at move index {index}")]
    InvalidSan { san: String, index: usize },

    #[error("Invalid suffix annotation: {0}")]
    InvalidSuffix(String),

    #[error("Header contract violation: {0}")]
    HeaderContract(String),

    #[error("Worker transport failure: {0}")]
    WorkerTransport(String),
}

/// Convenience Result type for caissa operations
pub type Result<T> = std::result::Result<T, ChessError>;
