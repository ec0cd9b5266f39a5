//! Static attack and ray tables for the 0x88 board.
//!
//! Two squares `from` and `to` have a unique difference `from - to` in
//! [-119, 119], so one 239-entry table answers "could piece kind X attack
//! across this difference" and a second gives the step increment for the
//! sliding ray between them. Both are derived once at startup.

use std::sync::OnceLock;

use caissa_core::{Color, PieceKind};

/// Per-kind bit used to test membership in an `ATTACKS` entry.
#[inline]
pub(crate) const fn piece_mask(kind: PieceKind) -> u8 {
    1 << kind.index()
}

/// Pawn move offsets: single push, double push, capture left, capture right.
/// White pawns move toward rank 8, which is decreasing 0x88 index.
pub(crate) const PAWN_OFFSETS: [[i16; 4]; 2] = [[-16, -32, -17, -15], [16, 32, 17, 15]];

const KNIGHT_OFFSETS: [i16; 8] = [-18, -33, -31, -14, 18, 33, 31, 14];
const BISHOP_OFFSETS: [i16; 4] = [-17, -15, 17, 15];
const ROOK_OFFSETS: [i16; 4] = [-16, 1, 16, -1];
const ROYAL_OFFSETS: [i16; 8] = [-17, -16, -15, 1, 17, 16, 15, -1];

/// Step offsets for the non-pawn piece kinds.
pub(crate) fn piece_offsets(kind: PieceKind) -> &'static [i16] {
    match kind {
        PieceKind::Knight => &KNIGHT_OFFSETS,
        PieceKind::Bishop => &BISHOP_OFFSETS,
        PieceKind::Rook => &ROOK_OFFSETS,
        PieceKind::Queen | PieceKind::King => &ROYAL_OFFSETS,
        PieceKind::Pawn => &[],
    }
}

/// Second rank (pawn double-push origin) as a 0x88 row index, per color.
pub(crate) const fn second_row(color: Color) -> i16 {
    match color {
        Color::White => 6,
        Color::Black => 1,
    }
}

/// Promotion row as a 0x88 row index, per color.
pub(crate) const fn last_row(color: Color) -> i16 {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

struct BoardTables {
    attacks: [u8; 239],
    rays: [i16; 239],
}

static TABLES: OnceLock<BoardTables> = OnceLock::new();

fn tables() -> &'static BoardTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> BoardTables {
    let mut attacks = [0u8; 239];
    let mut rays = [0i16; 239];

    for from in 0i16..128 {
        if from & 0x88 != 0 {
            continue;
        }
        for to in 0i16..128 {
            if to & 0x88 != 0 || to == from {
                continue;
            }
            let entry = (from - to + 119) as usize;
            let row_diff = (to >> 4) - (from >> 4);
            let file_diff = (to & 0x0F) - (from & 0x0F);

            // Leapers
            if KNIGHT_OFFSETS.contains(&(to - from)) {
                attacks[entry] |= piece_mask(PieceKind::Knight);
            }
            if ROYAL_OFFSETS.contains(&(to - from)) {
                attacks[entry] |= piece_mask(PieceKind::King);
            }

            // Pawn captures in either direction share one bit; the attack
            // test disambiguates by the sign of the difference.
            if (to - from).abs() == 15 || (to - from).abs() == 17 {
                attacks[entry] |= piece_mask(PieceKind::Pawn);
            }

            // Sliders and the ray between the squares
            let step = if row_diff == 0 {
                file_diff.signum()
            } else if file_diff == 0 {
                16 * row_diff.signum()
            } else if row_diff == file_diff {
                17 * row_diff.signum()
            } else if row_diff == -file_diff {
                15 * row_diff.signum()
            } else {
                0
            };
            if step != 0 {
                rays[entry] = step;
                if row_diff == 0 || file_diff == 0 {
                    attacks[entry] |= piece_mask(PieceKind::Rook);
                } else {
                    attacks[entry] |= piece_mask(PieceKind::Bishop);
                }
                attacks[entry] |= piece_mask(PieceKind::Queen);
            }
        }
    }

    BoardTables { attacks, rays }
}

/// Can a piece of `kind` attack across the difference `from - to`,
/// ignoring occupancy and pawn direction?
#[inline]
pub(crate) fn kind_attacks_across(kind: PieceKind, difference: i16) -> bool {
    tables().attacks[(difference + 119) as usize] & piece_mask(kind) != 0
}

/// The per-step increment of the sliding ray for the difference
/// `from - to`, walking from the attacker toward the target. Zero when the
/// squares are not aligned.
#[inline]
pub(crate) fn ray_step(difference: i16) -> i16 {
    tables().rays[(difference + 119) as usize]
}
