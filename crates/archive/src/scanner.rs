//! Permissive line-oriented tag-pair scanner.
//!
//! Deliberately looser than the PGN grammar so that archives with
//! pathological header values still yield searchable headers. A quote is
//! "unescaped" when preceded by an even number of backslashes; unescaping
//! rewrites `\\` then `\"`, in that fixed order.

/// Scan every line beginning with `[` for a tag pair. Lines that do not
/// yield one are skipped, never reported.
pub fn scan_headers(text: &str) -> Vec<(String, String)> {
    text.lines().filter_map(scan_header_line).collect()
}

/// Extract a `[Name "Value"]` pair from a single line.
pub(crate) fn scan_header_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches('\r');
    let rest = line.strip_prefix('[')?;

    let name_end = rest.find(|c: char| c.is_whitespace() || c == '"')?;
    let name = rest[..name_end].to_string();
    if name.is_empty() {
        return None;
    }

    let tail = &rest[name_end..];
    let open = find_unescaped_quote(tail, 0)?;
    let close = find_unescaped_quote(tail, open + 1)?;
    Some((name, unescape(&tail[open + 1..close])))
}

fn find_unescaped_quote(s: &str, from: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    for i in from..bytes.len() {
        if bytes[i] != b'"' {
            continue;
        }
        let mut backslashes = 0;
        while i > backslashes && bytes[i - backslashes - 1] == b'\\' {
            backslashes += 1;
        }
        if backslashes % 2 == 0 {
            return Some(i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    s.replace("\\\\", "\\").replace("\\\"", "\"")
}
