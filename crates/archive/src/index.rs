//! Byte-offset indexing of multi-game PGN archives.
//!
//! One O(N) pass over the text yields, per game, the byte range of its
//! slice plus the headers scanned from its tag-pair block, so callers can
//! filter games without ever parsing movetext.

use std::collections::HashMap;

use serde::Serialize;

use crate::scanner;

/// Location and headers of one game inside an archive.
#[derive(Clone, Debug, Serialize)]
pub struct GameIndex {
    /// Byte offset of the game's first header line.
    pub start: usize,
    /// Byte offset one past the game's last byte.
    pub end: usize,
    /// Headers scanned eagerly from the tag-pair block. Malformed tag
    /// lines are simply absent.
    pub headers: HashMap<String, String>,
}

/// Index every game in `text`. A game begins at a tag-pair line following
/// a blank line (or the start of the text); it ends where the next one
/// begins, or at the end of the text.
pub fn index_games(text: &str) -> Vec<GameIndex> {
    let mut games: Vec<GameIndex> = Vec::new();
    let mut offset = 0usize;
    let mut previous_blank = true;
    let mut in_header_block = false;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        let is_tag_line = content.starts_with('[');

        if is_tag_line && previous_blank && !in_header_block {
            if let Some(open) = games.last_mut() {
                open.end = offset;
            }
            games.push(GameIndex {
                start: offset,
                end: 0,
                headers: HashMap::new(),
            });
            in_header_block = true;
        }

        if in_header_block {
            if is_tag_line {
                if let Some((name, value)) = scanner::scan_header_line(content) {
                    if let Some(open) = games.last_mut() {
                        open.headers.insert(name, value);
                    }
                }
            } else {
                in_header_block = false;
            }
        }

        previous_blank = content.trim().is_empty();
        offset += line.len();
    }

    if let Some(open) = games.last_mut() {
        open.end = text.len();
    }
    games
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GAMES: &str = "[Event \"First\"]\n[White \"Ann\"]\n\n1. e4 e5 1-0\n\n[Event \"Second\"]\n[White \"Bob\"]\n\n1. d4 d5 0-1\n";

    #[test]
    fn test_counts_and_offsets() {
        let index = index_games(TWO_GAMES);
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].start, 0);
        assert_eq!(index[0].end, index[1].start);
        assert_eq!(index[1].end, TWO_GAMES.len());
        assert!(TWO_GAMES[index[1].start..].starts_with("[Event \"Second\"]"));
    }

    #[test]
    fn test_headers_scanned_eagerly() {
        let index = index_games(TWO_GAMES);
        assert_eq!(index[0].headers["White"], "Ann");
        assert_eq!(index[1].headers["White"], "Bob");
        assert_eq!(index[1].headers["Event"], "Second");
    }

    #[test]
    fn test_slices_reassemble_source() {
        let index = index_games(TWO_GAMES);
        let total: usize = index.iter().map(|g| g.end - g.start).sum();
        assert!(total <= TWO_GAMES.len());
        let joined: String = index
            .iter()
            .map(|g| &TWO_GAMES[g.start..g.end])
            .collect();
        assert_eq!(joined, TWO_GAMES);
    }

    #[test]
    fn test_game_without_trailing_newline() {
        let text = "[Event \"Only\"]\n\n1. e4 *";
        let index = index_games(text);
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].end, text.len());
    }

    #[test]
    fn test_malformed_header_line_is_absent() {
        let text = "[Event \"Ok\"]\n[Broken no quotes]\n\n1. e4 *\n";
        let index = index_games(text);
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].headers.len(), 1);
        assert!(index[0].headers.contains_key("Event"));
    }

    #[test]
    fn test_empty_input() {
        assert!(index_games("").is_empty());
    }

    #[test]
    fn test_headerless_text_yields_no_games() {
        assert!(index_games("1. e4 e5 *\n").is_empty());
    }

    #[test]
    fn test_crlf_offsets_are_exact() {
        let text = "[Event \"A\"]\r\n\r\n1. e4 *\r\n\r\n[Event \"B\"]\r\n\r\n1. d4 *\r\n";
        let index = index_games(text);
        assert_eq!(index.len(), 2);
        assert!(text[index[1].start..].starts_with("[Event \"B\"]"));
    }
}
