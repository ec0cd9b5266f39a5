//! Move generation for chess.
//!
//! Pseudo-legal moves come straight off the offset tables; the legality
//! filter then makes each move, tests the mover's king and unmakes. When a
//! side has no king on the board (partial positions in tests) the filter is
//! skipped.

use caissa_core::{Color, PieceKind, Square};

use crate::board::{self, last_row, second_row, PAWN_OFFSETS};
use crate::moves::{InternalMove, MoveFilter, MoveFlags};
use crate::position::Position;

impl Position {
    /// Generate all legal moves, optionally restricted by `filter`.
    pub fn legal_moves(&self, filter: MoveFilter) -> Vec<InternalMove> {
        let pseudo = self.pseudo_legal_moves(filter);
        let us = self.turn();
        if self.king_square(us).is_none() {
            return pseudo;
        }
        let mut probe = self.clone();
        pseudo
            .into_iter()
            .filter(|mv| {
                let snap = probe.make_move(mv);
                let legal = !probe.king_attacked(us);
                probe.unmake_move(mv, &snap);
                legal
            })
            .collect()
    }

    /// Generate pseudo-legal moves (the king may be left in check).
    pub(crate) fn pseudo_legal_moves(&self, filter: MoveFilter) -> Vec<InternalMove> {
        let us = self.turn();
        let mut moves = Vec::with_capacity(64);

        for from in Square::all() {
            if let Some(only) = filter.square {
                if only != from {
                    continue;
                }
            }
            let Some(piece) = self.board_slot(from.index()) else {
                continue;
            };
            if piece.color != us {
                continue;
            }
            if let Some(only) = filter.piece {
                if only != piece.kind {
                    continue;
                }
            }
            if piece.kind == PieceKind::Pawn {
                self.pawn_moves(from, us, &mut moves);
            } else {
                self.leaper_slider_moves(from, piece.kind, us, &mut moves);
            }
        }

        if filter.piece.is_none() || filter.piece == Some(PieceKind::King) {
            if let Some(king) = self.king_square(us) {
                if filter.square.is_none() || filter.square == Some(king) {
                    self.castling_moves(king, us, &mut moves);
                }
            }
        }

        moves
    }

    fn pawn_moves(&self, from: Square, us: Color, moves: &mut Vec<InternalMove>) {
        let offsets = PAWN_OFFSETS[us.index()];
        let from_i = from.index() as i16;
        let them = us.opposite();

        // Single push, and the double push behind it.
        let single = from_i + offsets[0];
        if single & 0x88 == 0 && self.board_slot(single as usize).is_none() {
            push_pawn_move(moves, us, from, sq(single), None, MoveFlags::NORMAL);
            if from_i >> 4 == second_row(us) {
                let double = from_i + offsets[1];
                if self.board_slot(double as usize).is_none() {
                    push_pawn_move(moves, us, from, sq(double), None, MoveFlags::BIG_PAWN);
                }
            }
        }

        // Diagonal captures, including en passant.
        for offset in [offsets[2], offsets[3]] {
            let to = from_i + offset;
            if to & 0x88 != 0 {
                continue;
            }
            match self.board_slot(to as usize) {
                Some(target) if target.color == them => {
                    push_pawn_move(moves, us, from, sq(to), Some(target.kind), MoveFlags::CAPTURE);
                }
                None if self.ep_square() == Some(sq(to)) => {
                    moves.push(InternalMove {
                        color: us,
                        from,
                        to: sq(to),
                        piece: PieceKind::Pawn,
                        captured: Some(PieceKind::Pawn),
                        promotion: None,
                        flags: MoveFlags::EP_CAPTURE,
                    });
                }
                _ => {}
            }
        }
    }

    fn leaper_slider_moves(
        &self,
        from: Square,
        kind: PieceKind,
        us: Color,
        moves: &mut Vec<InternalMove>,
    ) {
        let from_i = from.index() as i16;
        let single_step = matches!(kind, PieceKind::Knight | PieceKind::King);
        for &offset in board::piece_offsets(kind) {
            let mut to = from_i;
            loop {
                to += offset;
                if to & 0x88 != 0 {
                    break;
                }
                match self.board_slot(to as usize) {
                    None => moves.push(InternalMove {
                        color: us,
                        from,
                        to: sq(to),
                        piece: kind,
                        captured: None,
                        promotion: None,
                        flags: MoveFlags::NORMAL,
                    }),
                    Some(target) => {
                        if target.color != us {
                            moves.push(InternalMove {
                                color: us,
                                from,
                                to: sq(to),
                                piece: kind,
                                captured: Some(target.kind),
                                promotion: None,
                                flags: MoveFlags::CAPTURE,
                            });
                        }
                        break;
                    }
                }
                if single_step {
                    break;
                }
            }
        }
    }

    fn castling_moves(&self, king: Square, us: Color, moves: &mut Vec<InternalMove>) {
        let them = us.opposite();
        let king_i = king.index() as i16;

        if self.castling().kingside(us) {
            let path = king_i + 1;
            let to = king_i + 2;
            if self.board_slot(path as usize).is_none()
                && self.board_slot(to as usize).is_none()
                && !self.is_attacked(king, them)
                && !self.is_attacked(sq(path), them)
                && !self.is_attacked(sq(to), them)
            {
                moves.push(InternalMove {
                    color: us,
                    from: king,
                    to: sq(to),
                    piece: PieceKind::King,
                    captured: None,
                    promotion: None,
                    flags: MoveFlags::KSIDE_CASTLE,
                });
            }
        }

        if self.castling().queenside(us) {
            let path = king_i - 1;
            let to = king_i - 2;
            let rook_path = king_i - 3;
            if self.board_slot(path as usize).is_none()
                && self.board_slot(to as usize).is_none()
                && self.board_slot(rook_path as usize).is_none()
                && !self.is_attacked(king, them)
                && !self.is_attacked(sq(path), them)
                && !self.is_attacked(sq(to), them)
            {
                moves.push(InternalMove {
                    color: us,
                    from: king,
                    to: sq(to),
                    piece: PieceKind::King,
                    captured: None,
                    promotion: None,
                    flags: MoveFlags::QSIDE_CASTLE,
                });
            }
        }
    }

    /// Count leaf nodes of the legal move tree at the given depth.
    pub fn perft(&self, depth: u32) -> u64 {
        fn walk(pos: &mut Position, depth: u32) -> u64 {
            let us = pos.turn();
            let mut nodes = 0;
            for mv in pos.pseudo_legal_moves(MoveFilter::default()) {
                let snap = pos.make_move(&mv);
                if !pos.king_attacked(us) {
                    nodes += if depth == 1 { 1 } else { walk(pos, depth - 1) };
                }
                pos.unmake_move(&mv, &snap);
            }
            nodes
        }
        if depth == 0 {
            return 1;
        }
        walk(&mut self.clone(), depth)
    }

    /// Checkmate: in check with no legal move.
    pub fn is_checkmate(&self) -> bool {
        self.in_check() && self.legal_moves(MoveFilter::default()).is_empty()
    }

    /// Stalemate: not in check but no legal move either.
    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && self.legal_moves(MoveFilter::default()).is_empty()
    }

    /// Fifty-move rule: one hundred half-moves without a pawn move or a
    /// capture.
    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.half_moves() >= 100
    }

    /// K vs K, K+minor vs K, and kings with same-colored bishops only.
    pub fn is_insufficient_material(&self) -> bool {
        let mut counts = [0usize; 6];
        let mut bishop_parities: Vec<u8> = Vec::new();
        let mut num_pieces = 0usize;
        let mut square_parity = 0u8;

        let mut i = 0usize;
        while i <= 0x77 {
            square_parity = (square_parity + 1) % 2;
            if i & 0x88 != 0 {
                i += 8;
                continue;
            }
            if let Some(piece) = self.board_slot(i) {
                counts[piece.kind.index()] += 1;
                if piece.kind == PieceKind::Bishop {
                    bishop_parities.push(square_parity);
                }
                num_pieces += 1;
            }
            i += 1;
        }

        if num_pieces == 2 {
            return true;
        }
        if num_pieces == 3
            && (counts[PieceKind::Bishop.index()] == 1 || counts[PieceKind::Knight.index()] == 1)
        {
            return true;
        }
        if num_pieces == counts[PieceKind::Bishop.index()] + 2 {
            let sum: usize = bishop_parities.iter().map(|&p| p as usize).sum();
            if sum == 0 || sum == bishop_parities.len() {
                return true;
            }
        }
        false
    }
}

#[inline]
fn sq(index: i16) -> Square {
    Square::new_unchecked(index as u8)
}

fn push_pawn_move(
    moves: &mut Vec<InternalMove>,
    us: Color,
    from: Square,
    to: Square,
    captured: Option<PieceKind>,
    flags: MoveFlags,
) {
    if (to.index() as i16) >> 4 == last_row(us) {
        for promo in PieceKind::PROMOTIONS {
            moves.push(InternalMove {
                color: us,
                from,
                to,
                piece: PieceKind::Pawn,
                captured,
                promotion: Some(promo),
                flags: flags.union(MoveFlags::PROMOTION),
            });
        }
    } else {
        moves.push(InternalMove {
            color: us,
            from,
            to,
            piece: PieceKind::Pawn,
            captured,
            promotion: None,
            flags,
        });
    }
}
