//! Structural FEN validation and trailing-field expansion.
//!
//! Validation is purely structural; beyond one-king-each and the pawn rank
//! rule it makes no judgement about whether a position is reachable.

use caissa_core::{ChessError, Result};

/// Expand a 2-6 field FEN into the canonical six fields by appending the
/// documented defaults for the missing trailing fields: castling `-`,
/// en passant `-`, half-move clock `0`, move number `1`.
pub fn expand(fen: &str) -> Result<String> {
    let tokens: Vec<&str> = fen.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(ChessError::InvalidFen(
            "must contain at least piece placement and side to move".into(),
        ));
    }
    if tokens.len() > 6 {
        return Err(ChessError::InvalidFen("more than six fields".into()));
    }
    const DEFAULTS: [&str; 4] = ["-", "-", "0", "1"];
    let mut fields: Vec<&str> = tokens;
    let missing = 6 - fields.len();
    fields.extend_from_slice(&DEFAULTS[4 - missing..]);
    Ok(fields.join(" "))
}

/// Validate a six-field FEN against the structural rules.
pub fn validate(fen: &str) -> Result<()> {
    let fields: Vec<&str> = fen.split_whitespace().collect();

    if fields.len() != 6 {
        return Err(ChessError::InvalidFen(
            "must contain six space-delimited fields".into(),
        ));
    }

    match fields[5].parse::<i64>() {
        Ok(n) if n > 0 => {}
        _ => {
            return Err(ChessError::InvalidFen(
                "move number must be a positive integer".into(),
            ))
        }
    }

    match fields[4].parse::<i64>() {
        Ok(n) if n >= 0 => {}
        _ => {
            return Err(ChessError::InvalidFen(
                "half-move counter must be a non-negative integer".into(),
            ))
        }
    }

    let ep = fields[3];
    let ep_ok = ep == "-"
        || (ep.len() == 2
            && ep.as_bytes()[0].is_ascii_lowercase()
            && (b'a'..=b'h').contains(&ep.as_bytes()[0])
            && (ep.as_bytes()[1] == b'3' || ep.as_bytes()[1] == b'6'));
    if !ep_ok {
        return Err(ChessError::InvalidFen("invalid en-passant square".into()));
    }

    if fields[2] != "-" && fields[2].chars().any(|c| !"kKqQ".contains(c)) {
        return Err(ChessError::InvalidFen("invalid castling availability".into()));
    }

    if fields[1] != "w" && fields[1] != "b" {
        return Err(ChessError::InvalidFen("side to move is invalid".into()));
    }

    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFen(
            "piece placement does not contain 8 ranks".into(),
        ));
    }

    for rank in &ranks {
        let mut sum = 0u32;
        let mut previous_was_digit = false;
        for c in rank.chars() {
            if let Some(d) = c.to_digit(10) {
                if previous_was_digit {
                    return Err(ChessError::InvalidFen(
                        "piece placement has consecutive digits".into(),
                    ));
                }
                if d == 0 || d > 8 {
                    return Err(ChessError::InvalidFen("invalid empty-square count".into()));
                }
                sum += d;
                previous_was_digit = true;
            } else if "prnbqkPRNBQK".contains(c) {
                sum += 1;
                previous_was_digit = false;
            } else {
                return Err(ChessError::InvalidFen(format!(
                    "invalid piece character '{c}'"
                )));
            }
        }
        if sum != 8 {
            return Err(ChessError::InvalidFen(
                "piece placement rank is too large or too small".into(),
            ));
        }
    }

    // EP rank must agree with the side to move.
    if ep != "-" {
        let rank = ep.as_bytes()[1];
        let side = fields[1];
        if (rank == b'3' && side == "w") || (rank == b'6' && side == "b") {
            return Err(ChessError::InvalidFen(
                "en-passant square does not match side to move".into(),
            ));
        }
    }

    let white_kings = fields[0].matches('K').count();
    let black_kings = fields[0].matches('k').count();
    if white_kings != 1 || black_kings != 1 {
        return Err(ChessError::InvalidFen(
            "board must contain exactly one king per color".into(),
        ));
    }

    if ranks[0].contains('p') || ranks[0].contains('P') || ranks[7].contains('p') || ranks[7].contains('P')
    {
        return Err(ChessError::InvalidFen(
            "pawns cannot stand on the first or eighth rank".into(),
        ));
    }

    Ok(())
}
