//! Caissa engine - 0x88 move generation, SAN, FEN, games and PGN
//!
//! The engine keeps a mutable [`Position`] with an incrementally maintained
//! Zobrist hash; [`Game`] layers history, headers, comments and suffix
//! annotations on top and speaks PGN in both directions.

mod board;
mod fen;
mod game;
mod grammar;
mod movegen;
mod moves;
mod position;
mod san;
mod zobrist;

pub use caissa_core::{ChessError, Color, Piece, PieceKind, Result, Square};
pub use fen::{expand as expand_fen, validate as validate_fen};
pub use game::{Game, LoadPgnOptions, PgnOptions, SquareShade};
pub use grammar::{parse as parse_pgn, MoveNode, ParsedGame};
pub use moves::{InternalMove, Move, MoveFilter, MoveFlags};
pub use position::{CastlingRights, Position, STARTING_FEN};
pub use san::{move_from_san, move_to_san};
