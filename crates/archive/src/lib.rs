//! Caissa archive - two-phase reading of multi-game PGN archives
//!
//! Phase one indexes the text: one O(N) pass produces byte offsets and
//! permissively scanned headers per game. Phase two parses lazily through
//! a [`GameCursor`] with a bounded cache, or in parallel via [`parse_all`]
//! or the cursor's worker-backed streaming iterator.

mod cursor;
mod index;
mod scanner;
mod workers;

use rayon::prelude::*;

pub use caissa_core::{ChessError, Result};
pub use caissa_engine::{Game, LoadPgnOptions, PgnOptions};
pub use cursor::{CursorOptions, ErrorCallback, GameCursor, Games, Workers};
pub use index::{index_games, GameIndex};
pub use scanner::scan_headers;

/// Index `text` and parse every game across a rayon pool, preserving
/// archive order. Per-game failures are returned in place, never
/// propagated.
pub fn parse_all(text: &str) -> Vec<Result<Game>> {
    index_games(text)
        .par_iter()
        .map(|idx| cursor::parse_slice(&text[idx.start..idx.end], false).game)
        .collect()
}
