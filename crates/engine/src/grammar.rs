//! PGN grammar: tag pairs, movetext, comments, NAGs, variations and the
//! termination marker.
//!
//! The parser is a recursive-descent reader over bytes that reports the
//! byte offset of the first offending token. A tag pair that fails to
//! parse is retried as movetext, so broken header quoting surfaces as an
//! "unexpected token '['" error; the archive layer keys its fallback on
//! exactly that shape.

use caissa_core::{ChessError, Result};

/// One node of the movetext tree. A node without a SAN is a comment
/// carrier (e.g. a remark before the first move of a line).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveNode {
    pub san: Option<String>,
    pub comment: Option<String>,
    pub suffix: Option<String>,
    /// Alternative lines branching off after this move.
    pub variations: Vec<Vec<MoveNode>>,
}

/// The outcome of parsing one game of PGN text.
#[derive(Clone, Debug, Default)]
pub struct ParsedGame {
    pub headers: Vec<(String, String)>,
    /// The root's first variation is the main line.
    pub root: MoveNode,
    pub result: Option<String>,
}

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Parse one game. In strict mode the permissive movetext spellings
/// (numeric castling, hyphenated coordinate moves) are rejected at the
/// token level.
pub fn parse(text: &str, strict: bool) -> Result<ParsedGame> {
    let mut parser = Parser {
        src: text.as_bytes(),
        pos: 0,
        strict,
    };
    parser.game()
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    strict: bool,
}

impl<'a> Parser<'a> {
    fn game(&mut self) -> Result<ParsedGame> {
        let mut game = ParsedGame::default();

        self.skip_ws();
        while self.peek() == Some(b'[') {
            match self.tag_pair() {
                Some(kv) => game.headers.push(kv),
                // Leave the bracket for the movetext reader, which will
                // report it as the offending token.
                None => break,
            }
            self.skip_ws();
        }

        let (line, result) = self.line(0)?;
        game.root.variations.push(line);
        game.result = result;
        Ok(game)
    }

    /// Parse a `[Name "Value"]` pair, rewinding and returning None when the
    /// line does not scan.
    fn tag_pair(&mut self) -> Option<(String, String)> {
        let save = self.pos;
        match self.tag_pair_inner() {
            Some(kv) => Some(kv),
            None => {
                self.pos = save;
                None
            }
        }
    }

    fn tag_pair_inner(&mut self) -> Option<(String, String)> {
        if !self.eat(b'[') {
            return None;
        }
        self.skip_inline_ws();

        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        if self.pos == name_start {
            return None;
        }
        let name = String::from_utf8_lossy(&self.src[name_start..self.pos]).into_owned();

        self.skip_inline_ws();
        if !self.eat(b'"') {
            return None;
        }
        let mut value: Vec<u8> = Vec::new();
        loop {
            match self.peek()? {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\n' | b'\r' => return None,
                b'\\' => {
                    self.pos += 1;
                    match self.peek()? {
                        b'"' => value.push(b'"'),
                        b'\\' => value.push(b'\\'),
                        other => {
                            value.push(b'\\');
                            value.push(other);
                        }
                    }
                    self.pos += 1;
                }
                other => {
                    value.push(other);
                    self.pos += 1;
                }
            }
        }
        self.skip_inline_ws();
        if !self.eat(b']') {
            return None;
        }
        Some((name, String::from_utf8_lossy(&value).into_owned()))
    }

    /// Parse a line of movetext until end of input, the result token, or
    /// the closing parenthesis of a variation.
    fn line(&mut self, depth: usize) -> Result<(Vec<MoveNode>, Option<String>)> {
        let mut nodes: Vec<MoveNode> = Vec::new();
        let mut result = None;

        loop {
            self.skip_ws();
            let Some(c) = self.peek() else {
                if depth > 0 {
                    return Err(self.error("unterminated variation"));
                }
                break;
            };
            match c {
                b'{' => {
                    let comment = self.brace_comment()?;
                    attach_comment(&mut nodes, comment);
                }
                b';' => {
                    let comment = self.semicolon_comment();
                    attach_comment(&mut nodes, comment);
                }
                b'(' => {
                    if nodes.iter().all(|n| n.san.is_none()) {
                        return Err(self.error("unexpected token '('"));
                    }
                    self.pos += 1;
                    let (variation, _) = self.line(depth + 1)?;
                    if !self.eat(b')') {
                        return Err(self.error("unterminated variation"));
                    }
                    if let Some(node) = nodes.iter_mut().rev().find(|n| n.san.is_some()) {
                        node.variations.push(variation);
                    }
                }
                b')' => {
                    if depth == 0 {
                        return Err(self.error("unexpected token ')'"));
                    }
                    break;
                }
                b'$' => {
                    self.pos += 1;
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        self.pos += 1;
                    }
                    if self.pos == start {
                        return Err(self.error("expected NAG number after '$'"));
                    }
                    let n: u32 = String::from_utf8_lossy(&self.src[start..self.pos])
                        .parse()
                        .unwrap_or(0);
                    if let Some(glyph) = nag_glyph(n) {
                        attach_suffix(&mut nodes, glyph);
                    }
                }
                b'[' => return Err(self.error("unexpected token '['")),
                _ => {
                    let word = self.word();
                    if word.is_empty() {
                        return Err(self.error(&format!("unexpected token '{}'", c as char)));
                    }
                    if RESULTS.contains(&word.as_str()) {
                        result = Some(word);
                        if depth == 0 {
                            break;
                        }
                        continue;
                    }
                    if is_move_number(&word) || word.chars().all(|ch| ch == '.') {
                        continue;
                    }
                    self.san_token(&mut nodes, word)?;
                }
            }
        }

        Ok((nodes, result))
    }

    fn san_token(&mut self, nodes: &mut Vec<MoveNode>, word: String) -> Result<()> {
        let trimmed = word.trim_end_matches(['!', '?']);
        let suffix = &word[trimmed.len()..];

        if trimmed.is_empty() {
            // A bare annotation glyph belongs to the previous move.
            if is_suffix_glyph(&word) {
                attach_suffix(nodes, &word);
                return Ok(());
            }
            return Err(self.error(&format!("unexpected token '{word}'")));
        }

        if self.strict {
            if trimmed == "0-0" || trimmed == "0-0-0" {
                return Err(self.error("numeric castling is not allowed in strict mode"));
            }
            if trimmed.contains('-') && trimmed != "--" && !trimmed.starts_with("O-O") {
                return Err(self.error(&format!("invalid strict-mode token '{trimmed}'")));
            }
        }

        let valid = trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "=+#-/".contains(ch));
        if !valid {
            return Err(self.error(&format!("invalid SAN token '{trimmed}'")));
        }

        nodes.push(MoveNode {
            san: Some(trimmed.to_string()),
            comment: None,
            suffix: if suffix.is_empty() {
                None
            } else if is_suffix_glyph(suffix) {
                Some(suffix.to_string())
            } else {
                None
            },
            variations: Vec::new(),
        });
        Ok(())
    }

    fn brace_comment(&mut self) -> Result<String> {
        self.pos += 1; // '{'
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'}' {
                let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                self.pos += 1;
                return Ok(normalize_comment(&text));
            }
            self.pos += 1;
        }
        Err(self.error("unterminated comment"))
    }

    fn semicolon_comment(&mut self) -> String {
        self.pos += 1; // ';'
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.pos += 1;
        }
        normalize_comment(&String::from_utf8_lossy(&self.src[start..self.pos]))
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || b"{};()$[".contains(&c) {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn error(&self, message: &str) -> ChessError {
        ChessError::InvalidPgn {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_inline_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }
}

fn attach_comment(nodes: &mut Vec<MoveNode>, comment: String) {
    match nodes.last_mut() {
        Some(node) => match &mut node.comment {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&comment);
            }
            None => node.comment = Some(comment),
        },
        None => nodes.push(MoveNode {
            comment: Some(comment),
            ..MoveNode::default()
        }),
    }
}

fn attach_suffix(nodes: &mut Vec<MoveNode>, glyph: &str) {
    if let Some(node) = nodes.iter_mut().rev().find(|n| n.san.is_some()) {
        if node.suffix.is_none() {
            node.suffix = Some(glyph.to_string());
        }
    }
}

fn is_move_number(word: &str) -> bool {
    let digits = word.trim_end_matches('.');
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_suffix_glyph(s: &str) -> bool {
    matches!(s, "!" | "?" | "!!" | "!?" | "?!" | "??")
}

fn nag_glyph(n: u32) -> Option<&'static str> {
    match n {
        1 => Some("!"),
        2 => Some("?"),
        3 => Some("!!"),
        4 => Some("??"),
        5 => Some("!?"),
        6 => Some("?!"),
        _ => None,
    }
}

/// Collapse runs of whitespace (including newlines inside brace comments)
/// and trim the ends.
fn normalize_comment(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
