//! Standard Algebraic Notation.
//!
//! Encoding renders a move against the full legal-move set so the
//! disambiguator is minimal (file, then rank, then full square). Decoding
//! runs a strict pass first (compare against generated SAN) and falls back
//! to a permissive scanner accepting long-algebraic and over-disambiguated
//! forms unless strict mode is requested.

use caissa_core::{PieceKind, Square};

use crate::moves::{InternalMove, MoveFilter, MoveFlags};
use crate::position::Position;

/// Render `mv` in SAN. `moves` must be the full legal-move set of `pos`.
pub fn move_to_san(pos: &Position, mv: &InternalMove, moves: &[InternalMove]) -> String {
    let mut out = String::new();

    if mv.flags.contains(MoveFlags::KSIDE_CASTLE) {
        out.push_str("O-O");
    } else if mv.flags.contains(MoveFlags::QSIDE_CASTLE) {
        out.push_str("O-O-O");
    } else if mv.is_null() {
        return "--".to_string();
    } else {
        if mv.piece != PieceKind::Pawn {
            out.push(mv.piece.to_char());
            out.push_str(&disambiguator(mv, moves));
        }
        if mv.flags.contains(MoveFlags::CAPTURE) || mv.flags.contains(MoveFlags::EP_CAPTURE) {
            if mv.piece == PieceKind::Pawn {
                out.push(mv.from.file_char());
            }
            out.push('x');
        }
        out.push_str(&mv.to.to_string());
        if let Some(promo) = mv.promotion {
            out.push('=');
            out.push(promo.to_char());
        }
    }

    let mut probe = pos.clone();
    probe.make_move(mv);
    if probe.in_check() {
        if probe.legal_moves(MoveFilter::default()).is_empty() {
            out.push('#');
        } else {
            out.push('+');
        }
    }
    out
}

/// The minimal source disambiguator for a non-pawn move: empty, file, rank
/// or the full square.
fn disambiguator(mv: &InternalMove, moves: &[InternalMove]) -> String {
    let mut ambiguities = 0;
    let mut same_rank = 0;
    let mut same_file = 0;

    for other in moves {
        if other.piece == mv.piece && other.from != mv.from && other.to == mv.to {
            ambiguities += 1;
            if other.from.rank() == mv.from.rank() {
                same_rank += 1;
            }
            if other.from.file() == mv.from.file() {
                same_file += 1;
            }
        }
    }

    if ambiguities == 0 {
        String::new()
    } else if same_rank > 0 && same_file > 0 {
        mv.from.to_string()
    } else if same_file > 0 {
        // the file alone would still be ambiguous
        mv.from.rank_char().to_string()
    } else {
        mv.from.file_char().to_string()
    }
}

/// Strip decorations that never affect which move is meant: `=`, a trailing
/// check or mate marker and trailing annotation glyphs.
pub(crate) fn stripped_san(san: &str) -> String {
    let replaced = san.replace('=', "");
    let mut s = replaced.trim_end_matches(['?', '!']);
    if let Some(stripped) = s.strip_suffix(['+', '#']) {
        s = stripped;
    }
    s.to_string()
}

fn normalize_castling(san: &str) -> String {
    match san {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        _ => san.to_string(),
    }
}

/// Resolve SAN against the legal moves of `pos`. The permissive pass is
/// only tried when `strict` is false; when several legal moves satisfy a
/// permissive form, the first one generated wins.
pub fn move_from_san(
    pos: &Position,
    san: &str,
    strict: bool,
    moves: &[InternalMove],
) -> Option<InternalMove> {
    let clean = normalize_castling(&stripped_san(san));

    for mv in moves {
        if clean == stripped_san(&move_to_san(pos, mv, moves)) {
            return Some(*mv);
        }
    }

    if strict {
        return None;
    }
    permissive_match(&clean, moves)
}

/// A parsed permissive move form:
/// `[PNBRQK]? ([a-h][1-8]|[a-h]|[1-8])? x? -? [a-h][1-8] [qrbnQRBN]?`
struct PermissiveForm {
    piece: Option<PieceKind>,
    any_piece: bool,
    from_square: Option<Square>,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    to: Square,
    promotion: Option<PieceKind>,
}

fn parse_permissive(san: &str) -> Option<PermissiveForm> {
    if !san.is_ascii() {
        return None;
    }
    let mut s = san;

    let mut piece = None;
    if let Some(first) = s.chars().next() {
        if "PNBRQK".contains(first) {
            piece = PieceKind::from_char(first);
            s = &s[1..];
        }
    }

    let mut promotion = None;
    if let Some(last) = s.chars().last() {
        if "qrbnQRBN".contains(last) && s.len() > 2 {
            promotion = PieceKind::from_char(last);
            s = &s[..s.len() - 1];
        }
    }

    if s.len() < 2 {
        return None;
    }
    let to = Square::from_algebraic(&s[s.len() - 2..])?;
    let mut middle = &s[..s.len() - 2];

    middle = middle.strip_suffix('-').unwrap_or(middle);
    middle = middle.strip_suffix('x').unwrap_or(middle);

    let mut form = PermissiveForm {
        piece,
        any_piece: false,
        from_square: None,
        from_file: None,
        from_rank: None,
        to,
        promotion,
    };

    match middle.len() {
        0 => {}
        1 => {
            let c = middle.as_bytes()[0];
            if (b'a'..=b'h').contains(&c) {
                form.from_file = Some(c - b'a');
            } else if (b'1'..=b'8').contains(&c) {
                form.from_rank = Some(c - b'1');
            } else {
                return None;
            }
        }
        2 => form.from_square = Some(Square::from_algebraic(middle)?),
        _ => return None,
    }

    // A bare from-square + to-square form names no piece at all.
    if form.piece.is_none() && form.from_square.is_some() {
        form.any_piece = true;
    }
    Some(form)
}

fn permissive_match(clean: &str, moves: &[InternalMove]) -> Option<InternalMove> {
    let form = parse_permissive(clean)?;
    moves
        .iter()
        .find(|mv| {
            if mv.to != form.to || mv.promotion != form.promotion {
                return false;
            }
            match form.piece {
                Some(kind) => {
                    if mv.piece != kind {
                        return false;
                    }
                }
                None if !form.any_piece && mv.piece != PieceKind::Pawn => return false,
                None => {}
            }
            if let Some(from) = form.from_square {
                if mv.from != from {
                    return false;
                }
            }
            if let Some(file) = form.from_file {
                if mv.from.file() != file {
                    return false;
                }
            }
            if let Some(rank) = form.from_rank {
                if mv.from.rank() != rank {
                    return false;
                }
            }
            true
        })
        .copied()
}
