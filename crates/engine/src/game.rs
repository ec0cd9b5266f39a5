//! A full game: position, history, headers, comments and suffix
//! annotations, with PGN emission and loading.
//!
//! Comments and suffix annotations are keyed by the FEN of the position
//! they follow, so they survive undo and branch traversal; two transposing
//! move orders share a slot. Repetition counting lives here because only
//! real game moves (not legality probes) reach a position.

use std::collections::{HashMap, HashSet};
use std::fmt;

use caissa_core::{ChessError, Color, Piece, PieceKind, Result, Square};

use crate::grammar;
use crate::moves::{InternalMove, Move, MoveFilter};
use crate::position::{Position, Snapshot, STARTING_FEN};
use crate::san;

const SEVEN_TAG_ROSTER: [(&str, &str); 7] = [
    ("Event", "?"),
    ("Site", "?"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "?"),
    ("Black", "?"),
    ("Result", "*"),
];

/// Emission order for well-known supplemental tags, after the roster and
/// before any remaining tags in insertion order.
const SUPPLEMENTAL_TAG_ORDER: [&str; 30] = [
    "WhiteTitle",
    "BlackTitle",
    "WhiteElo",
    "BlackElo",
    "WhiteUSCF",
    "BlackUSCF",
    "WhiteNA",
    "BlackNA",
    "WhiteType",
    "BlackType",
    "EventDate",
    "EventSponsor",
    "Section",
    "Stage",
    "Board",
    "Opening",
    "Variation",
    "SubVariation",
    "ECO",
    "NIC",
    "Time",
    "UTCTime",
    "UTCDate",
    "TimeControl",
    "SetUp",
    "FEN",
    "Termination",
    "Annotator",
    "Mode",
    "PlyCount",
];

const SUFFIX_GLYPHS: [&str; 6] = ["!", "?", "!!", "!?", "?!", "??"];

fn is_roster_tag(key: &str) -> bool {
    SEVEN_TAG_ROSTER.iter().any(|(k, _)| *k == key)
}

fn roster_default(key: &str) -> Option<&'static str> {
    SEVEN_TAG_ROSTER
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// The shade of a board square.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SquareShade {
    Light,
    Dark,
}

impl SquareShade {
    pub const fn as_str(self) -> &'static str {
        match self {
            SquareShade::Light => "light",
            SquareShade::Dark => "dark",
        }
    }
}

/// Options for [`Game::pgn`].
#[derive(Clone, Debug)]
pub struct PgnOptions {
    pub newline: String,
    /// Wrap movetext at this width; zero disables wrapping.
    pub max_width: usize,
}

impl Default for PgnOptions {
    fn default() -> Self {
        PgnOptions {
            newline: "\n".to_string(),
            max_width: 0,
        }
    }
}

/// Options for [`Game::load_pgn`].
#[derive(Clone, Debug, Default)]
pub struct LoadPgnOptions {
    pub strict: bool,
    /// Newline sequence used by the source text, when it is not "\n".
    pub newline_char: Option<String>,
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    mv: InternalMove,
    snapshot: Snapshot,
}

/// A chess game.
#[derive(Clone)]
pub struct Game {
    position: Position,
    history: Vec<HistoryEntry>,
    headers: Vec<(String, Option<String>)>,
    comments: HashMap<String, String>,
    suffixes: HashMap<String, String>,
    position_counts: HashMap<u64, u32>,
}

impl Game {
    /// A game from the standard starting position.
    pub fn new() -> Self {
        let position = Position::starting();
        let mut counts = HashMap::new();
        counts.insert(position.hash(), 1);
        Game {
            position,
            history: Vec::new(),
            headers: seed_headers(),
            comments: HashMap::new(),
            suffixes: HashMap::new(),
            position_counts: counts,
        }
    }

    /// A game starting from the given FEN.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut game = Game::new();
        game.load(fen, false, false)?;
        Ok(game)
    }

    /// Load a position, discarding history, comments and annotations. The
    /// `SetUp`/`FEN` headers are rewritten to describe the new position
    /// whether or not other headers are preserved.
    pub fn load(&mut self, fen: &str, skip_validation: bool, preserve_headers: bool) -> Result<()> {
        self.position.load(fen, skip_validation)?;
        self.history.clear();
        self.comments.clear();
        self.suffixes.clear();
        self.position_counts.clear();
        self.position_counts.insert(self.position.hash(), 1);
        if !preserve_headers {
            self.headers = seed_headers();
        }
        if self.position.fen(true) == STARTING_FEN {
            self.remove_header("SetUp");
            self.remove_header("FEN");
        } else {
            self.set_header("SetUp", Some("1"));
            let fen = self.position.fen(true);
            self.set_header("FEN", Some(fen.as_str()));
        }
        Ok(())
    }

    /// Back to the starting position.
    pub fn reset(&mut self, preserve_headers: bool) {
        self.load(STARTING_FEN, false, preserve_headers)
            .expect("starting position is valid");
    }

    /// Empty the board. `SetUp` and `FEN` headers never survive a clear.
    pub fn clear(&mut self, preserve_headers: bool) {
        self.position = Position::empty();
        self.history.clear();
        self.comments.clear();
        self.suffixes.clear();
        self.position_counts.clear();
        self.position_counts.insert(self.position.hash(), 1);
        if preserve_headers {
            self.remove_header("SetUp");
            self.remove_header("FEN");
        } else {
            self.headers = seed_headers();
        }
    }

    /// Current position as FEN. The en-passant field is emitted only when a
    /// capture is actually legal.
    pub fn fen(&self) -> String {
        self.position.fen(false)
    }

    /// Current position as FEN with the en-passant field always emitted
    /// after a two-square push.
    pub fn fen_forced(&self) -> String {
        self.position.fen(true)
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    #[inline]
    pub fn move_number(&self) -> u32 {
        self.position.move_number()
    }

    #[inline]
    pub fn half_moves(&self) -> u32 {
        self.position.half_moves()
    }

    /// Switch the side to move; see [`Position::set_turn`].
    pub fn set_turn(&mut self, color: Color) -> bool {
        self.position.set_turn(color)
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.position.get(sq)
    }

    pub fn put(&mut self, piece: Piece, sq: Square) -> bool {
        self.position.put(piece, sq)
    }

    pub fn remove(&mut self, sq: Square) -> Option<Piece> {
        self.position.remove(sq)
    }

    pub fn find_piece(&self, piece: Piece) -> Vec<Square> {
        self.position.find_piece(piece)
    }

    /// The board as an 8x8 grid, eighth rank first.
    pub fn board(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (i, sq) in Square::all().enumerate() {
            grid[i / 8][i % 8] = self.position.get(sq);
        }
        grid
    }

    /// A text diagram of the board.
    pub fn ascii(&self) -> String {
        let mut out = String::from("   +------------------------+\n");
        for (i, sq) in Square::all().enumerate() {
            if i % 8 == 0 {
                out.push_str(&format!(" {} |", sq.rank_char()));
            }
            match self.position.get(sq) {
                Some(piece) => out.push_str(&format!(" {} ", piece.to_char())),
                None => out.push_str(" . "),
            }
            if i % 8 == 7 {
                out.push_str("|\n");
            }
        }
        out.push_str("   +------------------------+\n");
        out.push_str("     a  b  c  d  e  f  g  h");
        out
    }

    /// The shade of a square.
    pub fn square_color(sq: Square) -> SquareShade {
        if (sq.file() + (sq.index() as u8 >> 4)) % 2 == 0 {
            SquareShade::Light
        } else {
            SquareShade::Dark
        }
    }

    /// All legal moves in SAN.
    pub fn moves(&self) -> Vec<String> {
        self.moves_filtered(MoveFilter::default())
    }

    /// Legal moves in SAN, restricted by `filter`.
    pub fn moves_filtered(&self, filter: MoveFilter) -> Vec<String> {
        let all = self.position.legal_moves(MoveFilter::default());
        let selected = if filter.square.is_some() || filter.piece.is_some() {
            self.position.legal_moves(filter)
        } else {
            all.clone()
        };
        selected
            .iter()
            .map(|mv| san::move_to_san(&self.position, mv, &all))
            .collect()
    }

    /// Legal moves as full records, restricted by `filter`.
    pub fn moves_verbose(&self, filter: MoveFilter) -> Vec<Move> {
        let all = self.position.legal_moves(MoveFilter::default());
        let selected = if filter.square.is_some() || filter.piece.is_some() {
            self.position.legal_moves(filter)
        } else {
            all.clone()
        };
        selected
            .iter()
            .map(|mv| {
                let mut pos = self.position.clone();
                record_move(&mut pos, mv, &all).0
            })
            .collect()
    }

    /// Play a move given in SAN. Permissive spellings are accepted unless
    /// `strict` is set.
    pub fn make_move_san(&mut self, san_text: &str, strict: bool) -> Result<Move> {
        if san_text == "--" {
            return self.make_null_move();
        }
        let moves = self.position.legal_moves(MoveFilter::default());
        let mv = san::move_from_san(&self.position, san_text, strict, &moves)
            .ok_or_else(|| ChessError::InvalidMove(san_text.to_string()))?;
        Ok(self.apply(mv))
    }

    /// Play a move given as source and target squares.
    pub fn make_move_coords(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<PieceKind>,
    ) -> Result<Move> {
        let from: Square = from.parse()?;
        let to: Square = to.parse()?;
        let moves = self.position.legal_moves(MoveFilter::default());
        let mv = moves
            .iter()
            .find(|m| m.from == from && m.to == to && m.promotion == promotion)
            .copied()
            .ok_or_else(|| ChessError::InvalidMove(format!("{from}{to}")))?;
        Ok(self.apply(mv))
    }

    /// Pass the turn. Rejected while in check.
    pub fn make_null_move(&mut self) -> Result<Move> {
        if self.position.in_check() {
            return Err(ChessError::IllegalNullMove);
        }
        let king = self
            .position
            .king_square(self.turn())
            .unwrap_or(Square::A8);
        let mv = InternalMove::null(self.turn(), king);
        Ok(self.apply(mv))
    }

    fn apply(&mut self, mv: InternalMove) -> Move {
        let moves = self.position.legal_moves(MoveFilter::default());
        let (record, snapshot) = record_move(&mut self.position, &mv, &moves);
        self.history.push(HistoryEntry { mv, snapshot });
        *self
            .position_counts
            .entry(self.position.hash())
            .or_insert(0) += 1;
        record
    }

    /// Take back the last move, returning its record.
    pub fn undo_move(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;

        let hash = self.position.hash();
        if let Some(count) = self.position_counts.get_mut(&hash) {
            *count -= 1;
            if *count == 0 {
                self.position_counts.remove(&hash);
            }
        }

        let after = self.position.fen(false);
        self.position.unmake_move(&entry.mv, &entry.snapshot);
        let moves = self.position.legal_moves(MoveFilter::default());
        let san = san::move_to_san(&self.position, &entry.mv, &moves);
        Some(Move {
            color: entry.mv.color,
            from: entry.mv.from,
            to: entry.mv.to,
            piece: entry.mv.piece,
            captured: entry.mv.captured,
            promotion: entry.mv.promotion,
            san,
            lan: entry.mv.lan(),
            before: self.position.fen(false),
            after,
            flags: entry.mv.flags,
        })
    }

    /// Moves played so far, in SAN.
    pub fn history_san(&self) -> Vec<String> {
        self.replay_records()
            .into_iter()
            .map(|record| record.san)
            .collect()
    }

    /// Moves played so far as full records, with `before`/`after` FENs.
    pub fn history_verbose(&self) -> Vec<Move> {
        self.replay_records()
    }

    fn replay_records(&self) -> Vec<Move> {
        let mut pos = self.rewound_position();
        self.history
            .iter()
            .map(|entry| {
                let moves = pos.legal_moves(MoveFilter::default());
                record_move(&mut pos, &entry.mv, &moves).0
            })
            .collect()
    }

    /// A copy of the position rewound to the start of the game.
    fn rewound_position(&self) -> Position {
        let mut pos = self.position.clone();
        for entry in self.history.iter().rev() {
            pos.unmake_move(&entry.mv, &entry.snapshot);
        }
        pos
    }

    pub fn is_check(&self) -> bool {
        self.position.in_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.position.is_insufficient_material()
    }

    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.position.is_draw_by_fifty_moves()
    }

    /// Has the current position occurred at least three times?
    pub fn is_threefold_repetition(&self) -> bool {
        self.position_counts
            .get(&self.position.hash())
            .is_some_and(|&count| count >= 3)
    }

    pub fn is_draw(&self) -> bool {
        self.is_draw_by_fifty_moves()
            || self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_threefold_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    /// Squares attacking `sq`, by the given color or by the side to move.
    pub fn attackers(&self, sq: Square, color: Option<Color>) -> Vec<Square> {
        self.position.attackers(sq, color.unwrap_or(self.turn()))
    }

    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.position.is_attacked(sq, by)
    }

    /// Count leaf nodes of the legal move tree.
    pub fn perft(&self, depth: u32) -> u64 {
        self.position.perft(depth)
    }

    /// Set a header. Passing `None` stores a placeholder that is skipped on
    /// output; the Seven Tag Roster keys refuse placeholders and keep their
    /// current value instead.
    pub fn set_header(&mut self, key: &str, value: Option<&str>) {
        if value.is_none() && is_roster_tag(key) {
            return;
        }
        let value = value.map(str::to_string);
        match self.headers.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key.to_string(), value)),
        }
    }

    /// Remove a header: roster keys return to their defaults, supplemental
    /// keys are deleted. Returns whether the key was present.
    pub fn remove_header(&mut self, key: &str) -> bool {
        if let Some(default) = roster_default(key) {
            let entry = self
                .headers
                .iter_mut()
                .find(|(k, _)| k == key)
                .expect("roster tags are always seeded");
            let had = entry.1.as_deref() != Some(default);
            entry.1 = Some(default.to_string());
            return had;
        }
        match self.headers.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                self.headers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// All headers with values, in storage order.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Look up one header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// The comment attached to the current position.
    pub fn comment(&self) -> Option<&str> {
        self.comments.get(&self.fen()).map(String::as_str)
    }

    /// Attach a comment to the current position. Braces are flattened so
    /// the emitted PGN stays parseable.
    pub fn set_comment(&mut self, text: &str) {
        let text = text.replace('{', "[").replace('}', "]");
        self.comments.insert(self.fen(), text);
    }

    /// Remove and return the comment on the current position.
    pub fn remove_comment(&mut self) -> Option<String> {
        self.comments.remove(&self.fen())
    }

    /// All comments reachable from the current line, as (fen, text) pairs.
    /// Orphaned entries from abandoned branches are pruned first.
    pub fn comments(&mut self) -> Vec<(String, String)> {
        self.prune_keyed_maps();
        let mut out: Vec<(String, String)> = self
            .comments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort();
        out
    }

    /// Remove all comments, returning the reachable ones.
    pub fn remove_comments(&mut self) -> Vec<(String, String)> {
        self.prune_keyed_maps();
        let mut out: Vec<(String, String)> = self.comments.drain().collect();
        out.sort();
        out
    }

    /// The suffix annotation attached to the current position.
    pub fn suffix_annotation(&self) -> Option<&str> {
        self.suffixes.get(&self.fen()).map(String::as_str)
    }

    /// Attach a suffix annotation ("!", "?", "!!", "!?", "?!", "??") to the
    /// current position.
    pub fn set_suffix_annotation(&mut self, glyph: &str) -> Result<()> {
        if !SUFFIX_GLYPHS.contains(&glyph) {
            return Err(ChessError::InvalidSuffix(glyph.to_string()));
        }
        self.suffixes.insert(self.fen(), glyph.to_string());
        Ok(())
    }

    /// Remove and return the suffix annotation on the current position.
    pub fn remove_suffix_annotation(&mut self) -> Option<String> {
        self.suffixes.remove(&self.fen())
    }

    /// Drop comments and annotations whose positions are no longer on the
    /// path from the initial position to the current one.
    fn prune_keyed_maps(&mut self) {
        let mut reachable = HashSet::new();
        reachable.insert(self.fen());
        let mut pos = self.position.clone();
        for entry in self.history.iter().rev() {
            pos.unmake_move(&entry.mv, &entry.snapshot);
            reachable.insert(pos.fen(false));
        }
        self.comments.retain(|fen, _| reachable.contains(fen));
        self.suffixes.retain(|fen, _| reachable.contains(fen));
    }

    /// Serialize the game to PGN.
    pub fn pgn(&self, opts: &PgnOptions) -> String {
        let newline = opts.newline.as_str();
        let mut out = String::new();

        for (key, value) in self.canonical_headers() {
            out.push_str(&format!("[{key} \"{}\"]{newline}", escape_header(&value)));
        }
        if !self.history.is_empty() {
            out.push_str(newline);
        }

        let chunks = self.movetext_chunks();
        out.push_str(&wrap_chunks(&chunks, opts.max_width, newline));
        out
    }

    /// Movetext grouped into full-move chunks, plus the result token.
    fn movetext_chunks(&self) -> Vec<String> {
        let mut pos = self.rewound_position();
        let mut chunks: Vec<String> = Vec::new();
        let mut current = match self.comments.get(&pos.fen(false)) {
            Some(comment) => format!("{{{comment}}}"),
            None => String::new(),
        };

        for entry in &self.history {
            let moves = pos.legal_moves(MoveFilter::default());
            let mut san_text = san::move_to_san(&pos, &entry.mv, &moves);
            let number = pos.move_number();

            if entry.mv.color == Color::White {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current = format!("{number}.");
            } else if current.is_empty() {
                current = format!("{number}...");
            }

            pos.make_move(&entry.mv);
            let fen_after = pos.fen(false);
            if let Some(suffix) = self.suffixes.get(&fen_after) {
                san_text.push_str(suffix);
            }
            current.push(' ');
            current.push_str(&san_text);
            if let Some(comment) = self.comments.get(&fen_after) {
                current.push_str(&format!(" {{{comment}}}"));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks.push(self.header("Result").unwrap_or("*").to_string());
        chunks
    }

    fn canonical_headers(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, _) in SEVEN_TAG_ROSTER {
            if let Some(value) = self.header(key) {
                out.push((key.to_string(), value.to_string()));
            }
        }
        for key in SUPPLEMENTAL_TAG_ORDER {
            if let Some(value) = self.header(key) {
                out.push((key.to_string(), value.to_string()));
            }
        }
        for (key, value) in &self.headers {
            if is_roster_tag(key) || SUPPLEMENTAL_TAG_ORDER.contains(&key.as_str()) {
                continue;
            }
            if let Some(value) = value {
                out.push((key.clone(), value.clone()));
            }
        }
        out
    }

    /// Load a single game of PGN, replacing this game's state.
    pub fn load_pgn(&mut self, text: &str, opts: &LoadPgnOptions) -> Result<()> {
        let normalized;
        let text = match &opts.newline_char {
            Some(nl) if nl != "\n" => {
                normalized = text.replace(nl.as_str(), "\n");
                &normalized
            }
            _ => text,
        };

        let parsed = grammar::parse(text, opts.strict)?;

        self.reset(false);
        for (key, value) in &parsed.headers {
            self.set_header(key, Some(value.as_str()));
        }

        let setup = self.header("SetUp").map(str::to_string);
        let fen_header = self.header("FEN").map(str::to_string);
        if opts.strict && setup.as_deref() == Some("1") && fen_header.is_none() {
            return Err(ChessError::HeaderContract(
                "SetUp \"1\" requires a FEN tag".to_string(),
            ));
        }
        if let Some(fen) = fen_header {
            self.load(&fen, false, true)?;
        }

        let mut ply = 0usize;
        let main_line = parsed.root.variations.first().cloned().unwrap_or_default();
        for node in &main_line {
            if let Some(san_text) = &node.san {
                self.make_move_san(san_text, opts.strict)
                    .map_err(|_| ChessError::InvalidSan {
                        san: san_text.clone(),
                        index: ply,
                    })?;
                ply += 1;
            }
            if let Some(comment) = &node.comment {
                self.set_comment(comment);
            }
            if let Some(suffix) = &node.suffix {
                self.set_suffix_annotation(suffix)?;
            }
        }

        if let Some(result) = &parsed.result {
            self.set_header("Result", Some(result.as_str()));
        }
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("fen", &self.fen())
            .field("plies", &self.history.len())
            .finish()
    }
}

fn seed_headers() -> Vec<(String, Option<String>)> {
    SEVEN_TAG_ROSTER
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

fn escape_header(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a move record against `pos` and advance `pos` past the move.
fn record_move(pos: &mut Position, mv: &InternalMove, moves: &[InternalMove]) -> (Move, Snapshot) {
    let san_text = san::move_to_san(pos, mv, moves);
    let before = pos.fen(false);
    let snapshot = pos.make_move(mv);
    let after = pos.fen(false);
    (
        Move {
            color: mv.color,
            from: mv.from,
            to: mv.to,
            piece: mv.piece,
            captured: mv.captured,
            promotion: mv.promotion,
            san: san_text,
            lan: mv.lan(),
            before,
            after,
            flags: mv.flags,
        },
        snapshot,
    )
}

/// Movetext wrapping: chunks flow up to `max_width` columns; a chunk
/// containing a comment may be split at spaces, and whitespace immediately
/// before a forced break is stripped.
fn wrap_chunks(chunks: &[String], max_width: usize, newline: &str) -> String {
    if max_width == 0 {
        return chunks.join(" ");
    }

    let mut out: Vec<String> = Vec::new();
    let mut width = 0usize;

    let strip = |out: &mut Vec<String>| -> bool {
        if out.last().map(String::as_str) == Some(" ") {
            out.pop();
            true
        } else {
            false
        }
    };

    for (i, chunk) in chunks.iter().enumerate() {
        if width + chunk.len() > max_width && chunk.contains('{') {
            // wrap inside the comment, breaking at spaces only
            for token in chunk.split(' ') {
                if token.is_empty() {
                    continue;
                }
                if width + token.len() > max_width {
                    while strip(&mut out) {
                        width -= 1;
                    }
                    out.push(newline.to_string());
                    width = 0;
                }
                out.push(token.to_string());
                width += token.len();
                out.push(" ".to_string());
                width += 1;
            }
            if strip(&mut out) {
                width -= 1;
            }
            continue;
        }

        if width + chunk.len() > max_width && i != 0 {
            strip(&mut out);
            out.push(newline.to_string());
            width = 0;
        } else if i != 0 {
            out.push(" ".to_string());
            width += 1;
        }
        out.push(chunk.clone());
        width += chunk.len();
    }

    out.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_moves_and_first_push() {
        let mut game = Game::new();
        assert_eq!(game.moves().len(), 20);
        assert!(!game.is_check());

        let mv = game.make_move_san("e4", false).unwrap();
        assert_eq!(mv.san, "e4");
        assert_eq!(mv.lan, "e2e4");
        assert!(mv.is_big_pawn());
        assert_eq!(
            game.fen_forced(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        // no black pawn can capture on e3, so the plain FEN hides it
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_fools_mate() {
        let mut game = Game::new();
        for san in ["f3", "e6", "g4", "Qh4"] {
            game.make_move_san(san, false).unwrap();
        }
        assert!(game.is_checkmate());
        assert!(game.is_game_over());
        let pgn = game.pgn(&PgnOptions::default());
        assert!(pgn.contains("1. f3 e6 2. g4 Qh4#"), "pgn was: {pgn}");
    }

    #[test]
    fn test_threefold_repetition() {
        let mut game = Game::new();
        for san in ["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"] {
            game.make_move_san(san, false).unwrap();
        }
        assert!(game.is_threefold_repetition());
        assert!(game.is_draw());
    }

    #[test]
    fn test_insufficient_material_draw() {
        let game = Game::from_fen("8/8/8/4k3/4K3/8/8/8 w - - 0 1").unwrap();
        assert!(game.is_insufficient_material());
        assert!(game.is_draw());
    }

    #[test]
    fn test_fifty_move_draw() {
        let game = Game::from_fen("8/8/8/4k3/4K3/8/8/8 w - - 100 60").unwrap();
        assert!(game.is_draw_by_fifty_moves());
        assert!(game.is_draw());
    }

    #[test]
    fn test_undo_restores_fen_and_counts() {
        let mut game = Game::new();
        let initial = game.fen();
        game.make_move_san("e4", false).unwrap();
        game.make_move_san("e5", false).unwrap();
        let undone = game.undo_move().unwrap();
        assert_eq!(undone.san, "e5");
        game.undo_move().unwrap();
        assert_eq!(game.fen(), initial);
        assert!(game.undo_move().is_none());
    }

    #[test]
    fn test_make_move_coords() {
        let mut game = Game::new();
        let mv = game.make_move_coords("g1", "f3", None).unwrap();
        assert_eq!(mv.san, "Nf3");
        assert!(game.make_move_coords("a1", "a8", None).is_err());
    }

    #[test]
    fn test_promotion_requires_piece_in_coords_form() {
        let mut game = Game::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert!(game.make_move_coords("a7", "a8", None).is_err());
        let mv = game
            .make_move_coords("a7", "a8", Some(PieceKind::Queen))
            .unwrap();
        assert_eq!(mv.san, "a8=Q+");
    }

    #[test]
    fn test_null_move() {
        let mut game = Game::new();
        let mv = game.make_null_move().unwrap();
        assert_eq!(mv.san, "--");
        assert!(mv.is_null_move());
        assert_eq!(game.turn(), Color::Black);
        game.undo_move().unwrap();
        assert_eq!(game.turn(), Color::White);

        let mut checked = Game::from_fen("7k/8/8/8/8/8/1q6/K7 w - - 0 1").unwrap();
        assert_eq!(checked.make_null_move(), Err(ChessError::IllegalNullMove));
    }

    #[test]
    fn test_history() {
        let mut game = Game::new();
        for san in ["e4", "e5", "Nf3"] {
            game.make_move_san(san, false).unwrap();
        }
        assert_eq!(game.history_san(), vec!["e4", "e5", "Nf3"]);
        let verbose = game.history_verbose();
        assert_eq!(verbose.len(), 3);
        assert_eq!(
            verbose[0].before,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        // before/after use the plain emitter: the unusable ep square is
        // hidden
        assert_eq!(
            verbose[0].after,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(verbose[2].before, verbose[1].after);
    }

    #[test]
    fn test_headers_api() {
        let mut game = Game::new();
        game.set_header("White", Some("Kasparov"));
        game.set_header("WhiteElo", Some("2851"));
        assert_eq!(game.header("White"), Some("Kasparov"));

        assert!(game.remove_header("White"));
        assert_eq!(game.header("White"), Some("?"));
        assert!(!game.remove_header("White"));

        assert!(game.remove_header("WhiteElo"));
        assert_eq!(game.header("WhiteElo"), None);
        assert!(!game.remove_header("WhiteElo"));

        // roster keys refuse placeholders
        game.set_header("Event", None);
        assert_eq!(game.header("Event"), Some("?"));
        // supplemental placeholders are stored but not emitted
        game.set_header("Annotator", None);
        assert_eq!(game.header("Annotator"), None);
        assert!(!game.pgn(&PgnOptions::default()).contains("Annotator"));
    }

    #[test]
    fn test_pgn_header_order() {
        let mut game = Game::new();
        game.set_header("PlyCount", Some("2"));
        game.set_header("MyCustomTag", Some("x"));
        game.set_header("ECO", Some("C20"));
        game.make_move_san("e4", false).unwrap();
        game.make_move_san("e5", false).unwrap();
        let pgn = game.pgn(&PgnOptions::default());
        let eco = pgn.find("[ECO").unwrap();
        let ply = pgn.find("[PlyCount").unwrap();
        let custom = pgn.find("[MyCustomTag").unwrap();
        let event = pgn.find("[Event").unwrap();
        assert!(event < eco && eco < ply && ply < custom);
        assert!(pgn.contains("1. e4 e5 *"));
    }

    #[test]
    fn test_comments_and_suffixes_in_pgn() {
        let mut game = Game::new();
        game.set_comment("start of something");
        game.make_move_san("e4", false).unwrap();
        game.set_comment("king pawn");
        game.set_suffix_annotation("!?").unwrap();
        game.make_move_san("e5", false).unwrap();
        let pgn = game.pgn(&PgnOptions::default());
        assert!(pgn.contains("{start of something} 1. e4!? {king pawn} e5 *"), "pgn: {pgn}");
    }

    #[test]
    fn test_comment_braces_flattened() {
        let mut game = Game::new();
        game.set_comment("has {braces}");
        assert_eq!(game.comment(), Some("has [braces]"));
    }

    #[test]
    fn test_comment_pruning_after_undo() {
        let mut game = Game::new();
        game.make_move_san("e4", false).unwrap();
        game.set_comment("on e4");
        game.undo_move().unwrap();
        game.make_move_san("d4", false).unwrap();
        game.set_comment("on d4");
        let comments = game.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].1, "on d4");
    }

    #[test]
    fn test_invalid_suffix() {
        let mut game = Game::new();
        assert!(matches!(
            game.set_suffix_annotation("!!!"),
            Err(ChessError::InvalidSuffix(_))
        ));
    }

    #[test]
    fn test_black_to_move_numbering() {
        let mut game =
            Game::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        game.make_move_san("e5", false).unwrap();
        game.make_move_san("Nf3", false).unwrap();
        let pgn = game.pgn(&PgnOptions::default());
        assert!(pgn.contains("1... e5 2. Nf3"), "pgn: {pgn}");
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.contains("[FEN \""));
    }

    #[test]
    fn test_pgn_wrapping() {
        let mut game = Game::new();
        for san in ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O"] {
            game.make_move_san(san, false).unwrap();
        }
        let pgn = game.pgn(&PgnOptions {
            newline: "\n".to_string(),
            max_width: 20,
        });
        for line in pgn.lines().filter(|l| !l.starts_with('[')) {
            assert!(line.len() <= 20, "line too long: {line:?}");
        }
        // wrapping never splits a full-move chunk without a comment
        assert!(pgn.contains("1. e4 e5"));
    }

    #[test]
    fn test_pgn_wrapping_inside_comment() {
        let mut game = Game::new();
        game.make_move_san("e4", false).unwrap();
        game.set_comment("a very long comment that will definitely need wrapping somewhere");
        let pgn = game.pgn(&PgnOptions {
            newline: "\n".to_string(),
            max_width: 25,
        });
        let body: Vec<&str> = pgn.lines().filter(|l| !l.starts_with('[') && !l.is_empty()).collect();
        assert!(body.len() > 1);
        for line in &body {
            assert!(line.len() <= 25, "line too long: {line:?}");
            assert!(!line.ends_with(' '));
        }
    }

    #[test]
    fn test_load_pgn_roundtrip() {
        let mut game = Game::new();
        game.set_header("White", Some("Ann"));
        for san in ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4"] {
            game.make_move_san(san, false).unwrap();
        }
        game.set_comment("open sicilian");
        let pgn = game.pgn(&PgnOptions::default());

        let mut reloaded = Game::new();
        reloaded.load_pgn(&pgn, &LoadPgnOptions::default()).unwrap();
        assert_eq!(reloaded.fen(), game.fen());
        assert_eq!(reloaded.history_san(), game.history_san());
        assert_eq!(reloaded.header("White"), Some("Ann"));
        assert_eq!(reloaded.comment(), Some("open sicilian"));
    }

    #[test]
    fn test_load_pgn_with_fen_header() {
        let mut game = Game::new();
        game.load_pgn(
            "[SetUp \"1\"]\n[FEN \"8/8/8/4k3/4K3/8/8/8 w - - 0 1\"]\n\n1. Kd3 *",
            &LoadPgnOptions::default(),
        )
        .unwrap();
        assert_eq!(game.history_san(), vec!["Kd3"]);
        assert!(game.is_insufficient_material());
    }

    #[test]
    fn test_load_pgn_setup_without_fen_strict() {
        let mut game = Game::new();
        let err = game
            .load_pgn(
                "[SetUp \"1\"]\n\n1. e4 *",
                &LoadPgnOptions {
                    strict: true,
                    newline_char: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ChessError::HeaderContract(_)));
    }

    #[test]
    fn test_load_pgn_semantic_error_carries_index() {
        let mut game = Game::new();
        let err = game
            .load_pgn("1. e4 e5 2. Qxf7 *", &LoadPgnOptions::default())
            .unwrap_err();
        match err {
            ChessError::InvalidSan { san, index } => {
                assert_eq!(san, "Qxf7");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_pgn_custom_newline() {
        let mut game = Game::new();
        game.load_pgn(
            "[White \"Ann\"]\r\n\r\n1. e4 e5 *",
            &LoadPgnOptions {
                strict: false,
                newline_char: Some("\r\n".to_string()),
            },
        )
        .unwrap();
        assert_eq!(game.history_san(), vec!["e4", "e5"]);
    }

    #[test]
    fn test_load_pgn_nags() {
        let mut game = Game::new();
        game.load_pgn("1. e4 $1 e5?! *", &LoadPgnOptions::default())
            .unwrap();
        let pgn = game.pgn(&PgnOptions::default());
        assert!(pgn.contains("1. e4! e5?!"), "pgn: {pgn}");
    }

    #[test]
    fn test_square_color() {
        assert_eq!(Game::square_color(Square::A8), SquareShade::Light);
        assert_eq!(Game::square_color(Square::A1), SquareShade::Dark);
        assert_eq!(Game::square_color(Square::H1), SquareShade::Light);
        assert_eq!(Game::square_color(Square::E4), SquareShade::Light);
    }

    #[test]
    fn test_board_and_ascii() {
        let game = Game::new();
        let board = game.board();
        assert_eq!(
            board[0][0],
            Some(Piece::new(Color::Black, PieceKind::Rook))
        );
        assert_eq!(
            board[7][4],
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(board[4][4], None);

        let ascii = game.ascii();
        assert!(ascii.contains(" 8 | r  n  b  q  k  b  n  r |"));
        assert!(ascii.contains("     a  b  c  d  e  f  g  h"));
    }

    #[test]
    fn test_find_piece() {
        let game = Game::new();
        let rooks = game.find_piece(Piece::new(Color::White, PieceKind::Rook));
        assert_eq!(rooks, vec![Square::A1, Square::H1]);
    }

    #[test]
    fn test_load_preserve_headers() {
        let mut game = Game::new();
        game.set_header("White", Some("Ann"));
        game.load("8/8/8/4k3/4K3/8/8/8 w - - 0 1", false, true).unwrap();
        assert_eq!(game.header("White"), Some("Ann"));
        assert_eq!(game.header("SetUp"), Some("1"));
        game.reset(true);
        assert_eq!(game.header("White"), Some("Ann"));
        assert_eq!(game.header("SetUp"), None);
    }

    #[test]
    fn test_clear() {
        let mut game = Game::new();
        game.make_move_san("e4", false).unwrap();
        game.clear(false);
        assert_eq!(game.fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
        assert!(game.history_san().is_empty());
    }
}
