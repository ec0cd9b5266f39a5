//! Move encodings: the internal generator move and the public move record.

use std::fmt;

use serde::Serialize;

use caissa_core::{Color, PieceKind, Square};

/// Move flags as a bitset; a capture-promotion carries both bits.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct MoveFlags(pub(crate) u8);

impl MoveFlags {
    pub const NORMAL: MoveFlags = MoveFlags(1);
    pub const CAPTURE: MoveFlags = MoveFlags(2);
    /// Pawn two-square push
    pub const BIG_PAWN: MoveFlags = MoveFlags(4);
    pub const EP_CAPTURE: MoveFlags = MoveFlags(8);
    pub const PROMOTION: MoveFlags = MoveFlags(16);
    pub const KSIDE_CASTLE: MoveFlags = MoveFlags(32);
    pub const QSIDE_CASTLE: MoveFlags = MoveFlags(64);
    pub const NULL_MOVE: MoveFlags = MoveFlags(128);

    #[inline]
    pub const fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: MoveFlags) -> MoveFlags {
        MoveFlags(self.0 | other.0)
    }

    /// One letter per set flag, in flag order (e.g. "cp" for a
    /// capture-promotion).
    pub fn to_letters(self) -> String {
        let mut out = String::new();
        for (flag, letter) in [
            (MoveFlags::NORMAL, 'n'),
            (MoveFlags::CAPTURE, 'c'),
            (MoveFlags::BIG_PAWN, 'b'),
            (MoveFlags::EP_CAPTURE, 'e'),
            (MoveFlags::PROMOTION, 'p'),
            (MoveFlags::KSIDE_CASTLE, 'k'),
            (MoveFlags::QSIDE_CASTLE, 'q'),
            (MoveFlags::NULL_MOVE, '-'),
        ] {
            if self.contains(flag) {
                out.push(letter);
            }
        }
        out
    }
}

impl fmt::Display for MoveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_letters())
    }
}

/// The generator's move representation. Everything needed to make the move
/// and, together with a scalar snapshot, to unmake it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InternalMove {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl InternalMove {
    /// The null move: turn passes, nothing touches the board. `from`/`to`
    /// hold the mover's king square purely as a placeholder.
    pub(crate) fn null(color: Color, king: Square) -> Self {
        InternalMove {
            color,
            from: king,
            to: king,
            piece: PieceKind::King,
            captured: None,
            promotion: None,
            flags: MoveFlags::NULL_MOVE,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.flags.contains(MoveFlags::NULL_MOVE)
    }

    /// Long algebraic notation ("e2e4", "e7e8q", "--" for the null move).
    pub fn lan(&self) -> String {
        if self.is_null() {
            return "--".to_string();
        }
        let mut out = format!("{}{}", self.from, self.to);
        if let Some(promo) = self.promotion {
            out.push(promo.to_char().to_ascii_lowercase());
        }
        out
    }
}

/// A filter for move generation: restrict to one origin square and/or one
/// piece kind. The default filters nothing.
#[derive(Clone, Copy, Default, Debug)]
pub struct MoveFilter {
    pub square: Option<Square>,
    pub piece: Option<PieceKind>,
}

impl MoveFilter {
    pub fn square(sq: Square) -> Self {
        MoveFilter {
            square: Some(sq),
            piece: None,
        }
    }

    pub fn piece(kind: PieceKind) -> Self {
        MoveFilter {
            square: None,
            piece: Some(kind),
        }
    }
}

/// The public move record returned by the game API.
///
/// `before` and `after` are the FENs on either side of the move; `san` and
/// `lan` are rendered against `before`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Move {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub san: String,
    pub lan: String,
    pub before: String,
    pub after: String,
    #[serde(serialize_with = "serialize_flags")]
    pub flags: MoveFlags,
}

fn serialize_flags<S: serde::Serializer>(flags: &MoveFlags, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&flags.to_letters())
}

impl Move {
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE)
    }

    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.flags.contains(MoveFlags::PROMOTION)
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags.contains(MoveFlags::EP_CAPTURE)
    }

    #[inline]
    pub fn is_kingside_castle(&self) -> bool {
        self.flags.contains(MoveFlags::KSIDE_CASTLE)
    }

    #[inline]
    pub fn is_queenside_castle(&self) -> bool {
        self.flags.contains(MoveFlags::QSIDE_CASTLE)
    }

    #[inline]
    pub fn is_big_pawn(&self) -> bool {
        self.flags.contains(MoveFlags::BIG_PAWN)
    }

    #[inline]
    pub fn is_null_move(&self) -> bool {
        self.flags.contains(MoveFlags::NULL_MOVE)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.san)
    }
}
