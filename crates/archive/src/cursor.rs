//! Lazy cursor over an indexed PGN archive.
//!
//! Games parse on first access and land in a bounded FIFO cache (oldest
//! insertion evicted first). Parse failures follow the error policy: in
//! strict mode they propagate, otherwise they are recorded, reported to
//! the `on_error` callback and the index yields no game.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use caissa_core::{ChessError, Result};
use caissa_engine::{Game, LoadPgnOptions, PgnOptions};

use crate::index::{index_games, GameIndex};
use crate::scanner;
use crate::workers::{GameOutcome, WorkerPool};

/// Callback invoked (in non-strict mode) for each game that fails to
/// parse.
pub type ErrorCallback<'a> = Box<dyn FnMut(&ChessError, usize) + 'a>;

/// How many parser workers the streaming iterator may use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Workers {
    /// Parse in-process.
    #[default]
    Off,
    /// One worker per available core.
    Auto,
    /// A fixed worker count.
    Count(usize),
}

impl From<bool> for Workers {
    fn from(enabled: bool) -> Self {
        if enabled {
            Workers::Auto
        } else {
            Workers::Off
        }
    }
}

impl From<usize> for Workers {
    fn from(count: usize) -> Self {
        if count == 0 {
            Workers::Off
        } else {
            Workers::Count(count)
        }
    }
}

impl Workers {
    pub(crate) fn count(self) -> Option<usize> {
        match self {
            Workers::Off => None,
            Workers::Auto => Some(
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4),
            ),
            Workers::Count(n) => Some(n.max(1)),
        }
    }
}

/// Cursor configuration.
#[derive(Clone, Debug)]
pub struct CursorOptions {
    /// First game index the cursor exposes.
    pub start: usize,
    /// How many games the cursor exposes; `None` is unbounded.
    pub length: Option<usize>,
    /// Games to parse ahead after every `next_game`.
    pub prefetch: usize,
    /// Reserved; headers are always captured at index time.
    pub include_metadata: bool,
    /// Maximum cached parsed games.
    pub cache_size: usize,
    /// Reserved; parsing is on first access.
    pub lazy_parse: bool,
    /// Propagate the first parse failure instead of recording it.
    pub strict: bool,
    /// Parallel parsing for the streaming iterator.
    pub workers: Workers,
    /// Games per worker batch.
    pub worker_batch_size: usize,
}

impl Default for CursorOptions {
    fn default() -> Self {
        CursorOptions {
            start: 0,
            length: None,
            prefetch: 1,
            include_metadata: true,
            cache_size: 10,
            lazy_parse: true,
            strict: false,
            workers: Workers::Off,
            worker_batch_size: 10,
        }
    }
}

/// A lazy, cached cursor over the games of a PGN archive.
///
/// The source text must outlive the cursor and must not change while it is
/// live; slices are taken by byte offset.
pub struct GameCursor<'a> {
    source: &'a str,
    index: Vec<GameIndex>,
    opts: CursorOptions,
    current: usize,
    cache: HashMap<usize, Game>,
    cache_order: VecDeque<usize>,
    errors: Vec<(usize, ChessError)>,
    on_error: Option<ErrorCallback<'a>>,
    pool: Option<WorkerPool>,
}

impl<'a> GameCursor<'a> {
    /// Index `source` and position the cursor at `opts.start`.
    pub fn new(source: &'a str, opts: CursorOptions) -> Self {
        let index = index_games(source);
        let current = opts.start;
        GameCursor {
            source,
            index,
            opts,
            current,
            cache: HashMap::new(),
            cache_order: VecDeque::new(),
            errors: Vec::new(),
            on_error: None,
            pool: None,
        }
    }

    /// Install the per-failure callback used in non-strict mode.
    pub fn set_on_error(&mut self, callback: ErrorCallback<'a>) {
        self.on_error = Some(callback);
    }

    /// Total games in the archive, ignoring `start`/`length`.
    pub fn total_games(&self) -> usize {
        self.index.len()
    }

    /// Pre-scanned headers of the game at `i`.
    pub fn headers_at(&self, i: usize) -> Option<&HashMap<String, String>> {
        self.index.get(i).map(|idx| &idx.headers)
    }

    /// Errors recorded so far, in visit order.
    pub fn errors(&self) -> &[(usize, ChessError)] {
        &self.errors
    }

    /// The current game index.
    pub fn current(&self) -> usize {
        self.current
    }

    fn limit(&self) -> usize {
        let hard = self.index.len();
        match self.opts.length {
            Some(length) => hard.min(self.opts.start.saturating_add(length)),
            None => hard,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current < self.limit()
    }

    pub fn has_before(&self) -> bool {
        self.current > self.opts.start
    }

    /// Parse (or fetch from cache) the game at the cursor, then advance.
    /// `None` means the cursor is exhausted; `Some(Err(_))` is a game that
    /// failed to parse.
    pub fn next_game(&mut self) -> Option<Result<Game>> {
        if !self.has_next() {
            return None;
        }
        let i = self.current;
        self.current += 1;
        let out = self.parse_at(i);
        self.run_prefetch();
        Some(out)
    }

    /// Step back one game and return it.
    pub fn before(&mut self) -> Option<Result<Game>> {
        if !self.has_before() {
            return None;
        }
        self.current -= 1;
        Some(self.parse_at(self.current))
    }

    /// Move the cursor to an absolute game index.
    pub fn seek(&mut self, i: usize) -> bool {
        if i < self.index.len() {
            self.current = i;
            true
        } else {
            false
        }
    }

    /// Back to `start`, dropping the cache.
    pub fn reset(&mut self) {
        self.current = self.opts.start;
        self.cache.clear();
        self.cache_order.clear();
    }

    /// Advance to the next game whose pre-scanned headers satisfy `pred`,
    /// parse it and return it. Skipped games are never parsed.
    pub fn find_next<F>(&mut self, mut pred: F) -> Option<Result<Game>>
    where
        F: FnMut(&HashMap<String, String>) -> bool,
    {
        while self.current < self.limit() {
            if pred(&self.index[self.current].headers) {
                return self.next_game();
            }
            self.current += 1;
        }
        None
    }

    /// Re-serialize every game the cursor exposes, leaving the cursor
    /// position untouched. Games that fail to parse contribute their raw
    /// slice unchanged.
    pub fn pgn(&mut self, opts: &PgnOptions) -> String {
        let mut parts = Vec::new();
        for i in self.opts.start..self.limit() {
            if let Some(game) = self.cache.get(&i) {
                parts.push(game.pgn(opts));
                continue;
            }
            let slice = self.slice(i);
            match parse_slice(slice, self.opts.strict).game {
                Ok(game) => {
                    parts.push(game.pgn(opts));
                    self.insert_cache(i, game);
                }
                Err(_) => parts.push(slice.trim().to_string()),
            }
        }
        let newline = opts.newline.as_str();
        parts.join(&format!("{newline}{newline}"))
    }

    /// Stream the remaining games in order. With workers enabled, batches
    /// are parsed in parallel while order is preserved.
    pub fn iter(&mut self) -> Games<'_, 'a> {
        if self.pool.is_none() {
            if let Some(count) = self.opts.workers.count() {
                self.pool = Some(WorkerPool::new(count));
            }
        }
        Games {
            next_dispatch: self.current,
            cursor: self,
            pending: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }

    /// Shut down the worker pool, if one was started. Idempotent.
    pub fn terminate(&mut self) {
        if let Some(mut pool) = self.pool.take() {
            pool.terminate();
        }
    }

    fn slice(&self, i: usize) -> &'a str {
        let idx = &self.index[i];
        &self.source[idx.start..idx.end]
    }

    fn parse_at(&mut self, i: usize) -> Result<Game> {
        if let Some(game) = self.cache.get(&i) {
            return Ok(game.clone());
        }
        let outcome = parse_slice(self.slice(i), self.opts.strict);
        self.settle(i, outcome)
    }

    /// Apply the error policy to a parse outcome and cache successes.
    fn settle(&mut self, i: usize, outcome: ParseOutcome) -> Result<Game> {
        match outcome.game {
            Ok(game) => {
                if !self.opts.strict {
                    for err in outcome.errors {
                        self.errors.push((i, err));
                    }
                }
                self.insert_cache(i, game.clone());
                Ok(game)
            }
            Err(err) => {
                if self.opts.strict {
                    return Err(err);
                }
                for recorded in outcome.errors {
                    self.errors.push((i, recorded));
                }
                if let Some(callback) = &mut self.on_error {
                    callback(&err, i);
                }
                Err(err)
            }
        }
    }

    fn insert_cache(&mut self, i: usize, game: Game) {
        if self.opts.cache_size == 0 {
            return;
        }
        if self.cache.insert(i, game).is_none() {
            self.cache_order.push_back(i);
        }
        while self.cache.len() > self.opts.cache_size {
            if let Some(oldest) = self.cache_order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }

    /// Parse up to `prefetch` games ahead into the cache. Failures are not
    /// recorded here; they surface when the index is actually visited.
    fn run_prefetch(&mut self) {
        let upto = self
            .current
            .saturating_add(self.opts.prefetch)
            .min(self.limit());
        for j in self.current..upto {
            if self.cache.contains_key(&j) {
                continue;
            }
            if let Ok(game) = parse_slice(self.slice(j), self.opts.strict).game {
                self.insert_cache(j, game);
            }
        }
    }
}

impl Drop for GameCursor<'_> {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Streaming iterator over a cursor's remaining games.
///
/// Without workers it is exactly repeated [`GameCursor::next_game`]. With
/// workers it keeps one batch per worker in flight, collects batches in
/// dispatch order and yields games strictly by index.
pub struct Games<'c, 'a> {
    cursor: &'c mut GameCursor<'a>,
    pending: VecDeque<crate::workers::BatchHandle>,
    ready: VecDeque<GameOutcome>,
    next_dispatch: usize,
}

impl Games<'_, '_> {
    fn dispatch_batches(&mut self) {
        let Some(worker_count) = self.cursor.pool.as_ref().map(|p| p.worker_count()) else {
            return;
        };
        let limit = self.cursor.limit();
        let batch_size = self.cursor.opts.worker_batch_size.max(1);
        let strict = self.cursor.opts.strict;

        while self.pending.len() < worker_count && self.next_dispatch < limit {
            let begin = self.next_dispatch;
            let end = (begin + batch_size).min(limit);
            self.next_dispatch = end;

            let games: Vec<(usize, String)> = (begin..end)
                .map(|i| (i, self.cursor.slice(i).to_string()))
                .collect();
            let submitted = match self.cursor.pool.as_mut() {
                Some(pool) => pool.submit(games, strict),
                None => break,
            };
            match submitted {
                Ok(handle) => self.pending.push_back(handle),
                Err(err) => {
                    // Worker is gone; parse this batch in-process.
                    warn!("batch dispatch failed, parsing in-process: {err}");
                    for i in begin..end {
                        let outcome = parse_slice(self.cursor.slice(i), strict);
                        self.ready.push_back(GameOutcome {
                            index: i,
                            game: outcome.game,
                            errors: outcome.errors,
                        });
                    }
                    break;
                }
            }
        }
    }

    fn settle_outcome(&mut self, outcome: GameOutcome) -> Result<Game> {
        self.cursor.current = outcome.index + 1;
        self.cursor.settle(
            outcome.index,
            ParseOutcome {
                game: outcome.game,
                errors: outcome.errors,
            },
        )
    }
}

impl Iterator for Games<'_, '_> {
    type Item = Result<Game>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.pool.is_none() {
            return self.cursor.next_game();
        }

        loop {
            if let Some(outcome) = self.ready.pop_front() {
                return Some(self.settle_outcome(outcome));
            }

            self.dispatch_batches();

            let Some(handle) = self.pending.pop_front() else {
                return None;
            };
            match handle.receiver.recv() {
                Ok(results) => self.ready.extend(results),
                Err(_) => {
                    // Transport failure: the pool stays usable, this batch
                    // falls back to in-process parsing.
                    warn!(
                        "worker batch {:?} lost, parsing in-process",
                        handle.indices
                    );
                    for i in handle.indices {
                        let outcome = parse_slice(self.cursor.slice(i), self.cursor.opts.strict);
                        self.ready.push_back(GameOutcome {
                            index: i,
                            game: outcome.game,
                            errors: outcome.errors,
                        });
                    }
                }
            }
        }
    }
}

/// The result of parsing one game slice: the game (or the terminal error)
/// plus every error encountered on the way, for observability.
pub(crate) struct ParseOutcome {
    pub game: Result<Game>,
    pub errors: Vec<ChessError>,
}

/// Parse one game slice, falling back to a movetext-only parse when the
/// failure looks like broken header quoting. The fallback synthesizes a
/// dummy `[Event "_"]` header and takes real headers from the permissive
/// scanner.
pub(crate) fn parse_slice(slice: &str, strict: bool) -> ParseOutcome {
    let load_opts = LoadPgnOptions {
        strict,
        newline_char: None,
    };

    let mut game = Game::new();
    let first = match game.load_pgn(slice, &load_opts) {
        Ok(()) => {
            return ParseOutcome {
                game: Ok(game),
                errors: Vec::new(),
            }
        }
        Err(err) => err,
    };

    if !is_header_quoting_error(&first) {
        return ParseOutcome {
            game: Err(first.clone()),
            errors: vec![first],
        };
    }

    debug!("header quoting failure, retrying movetext only: {first}");
    let movetext = movetext_region(slice).unwrap_or(slice);
    let synthetic = format!("[Event \"_\"]\n\n{movetext}");
    let mut fallback = Game::new();
    match fallback.load_pgn(&synthetic, &load_opts) {
        Ok(()) => {
            fallback.remove_header("Event");
            for (name, value) in scanner::scan_headers(slice) {
                fallback.set_header(&name, Some(value.as_str()));
            }
            ParseOutcome {
                game: Ok(fallback),
                errors: vec![first],
            }
        }
        Err(second) => ParseOutcome {
            game: Err(second.clone()),
            errors: vec![first, second],
        },
    }
}

fn is_header_quoting_error(err: &ChessError) -> bool {
    matches!(err, ChessError::InvalidPgn { message, .. } if message.contains("'['"))
}

/// The text after the first blank line: the movetext region when the
/// header block is standard.
fn movetext_region(slice: &str) -> Option<&str> {
    let mut offset = 0;
    for line in slice.split_inclusive('\n') {
        if line.trim().is_empty() {
            return Some(&slice[offset + line.len()..]);
        }
        offset += line.len();
    }
    None
}
