//! Caissa core - shared vocabulary and error types
//!
//! This crate provides the error enum used across the workspace and the
//! fundamental chess types (`Color`, `PieceKind`, `Piece`, `Square`).

mod error;
mod types;

pub use error::{ChessError, Result};
pub use types::{Color, Piece, PieceKind, Square};
