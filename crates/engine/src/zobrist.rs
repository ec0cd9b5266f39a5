//! Zobrist keys for position identity and repetition tracking.
//!
//! The keys come from a xoroshiro128** stream seeded at a fixed constant so
//! hashes are stable across runs and across builds. The fill order is part
//! of the contract: piece keys color-major, then kind, then 0x88 square
//! (all 128 slots), then the eight en-passant file keys, the sixteen
//! castling-rights keys and finally the side-to-move key.

use std::sync::OnceLock;

use caissa_core::{Color, PieceKind, Square};

const SEED: u64 = 0x7A31_98F4_5DD0_3C7B;

/// xoroshiro128** with a splitmix64-expanded seed.
struct Xoroshiro128 {
    s0: u64,
    s1: u64,
}

impl Xoroshiro128 {
    fn seeded(seed: u64) -> Self {
        let mut state = seed;
        let s0 = splitmix64(&mut state);
        let s1 = splitmix64(&mut state);
        Xoroshiro128 { s0, s1 }
    }

    fn next_u64(&mut self) -> u64 {
        let result = self.s0.wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.s1 ^ self.s0;
        self.s0 = self.s0.rotate_left(24) ^ t ^ (t << 16);
        self.s1 = t.rotate_left(37);
        result
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

struct ZobristTables {
    pieces: [[[u64; 128]; 6]; 2],
    ep_file: [u64; 8],
    castling: [u64; 16],
    side: u64,
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(|| {
        let mut rng = Xoroshiro128::seeded(SEED);

        let mut pieces = [[[0u64; 128]; 6]; 2];
        for color in &mut pieces {
            for kind in color {
                for sq in kind.iter_mut() {
                    *sq = rng.next_u64();
                }
            }
        }

        let mut ep_file = [0u64; 8];
        for key in &mut ep_file {
            *key = rng.next_u64();
        }

        let mut castling = [0u64; 16];
        for key in &mut castling {
            *key = rng.next_u64();
        }

        let side = rng.next_u64();

        ZobristTables {
            pieces,
            ep_file,
            castling,
            side,
        }
    })
}

/// Key for a `(color, kind, square)` occupancy term.
#[inline]
pub(crate) fn piece_key(color: Color, kind: PieceKind, square: Square) -> u64 {
    tables().pieces[color.index()][kind.index()][square.index()]
}

/// Key for a capturable en-passant square, by file.
#[inline]
pub(crate) fn ep_key(file: u8) -> u64 {
    tables().ep_file[file as usize]
}

/// Key for the combined castling-rights nibble (0..=15).
#[inline]
pub(crate) fn castling_key(rights: u8) -> u64 {
    tables().castling[(rights & 0x0F) as usize]
}

/// Key XORed in while Black is to move.
#[inline]
pub(crate) fn side_key() -> u64 {
    tables().side
}
