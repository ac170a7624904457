// normalize/src/base64_attr.rs

//! Canonical base64 detection for historical ABCI attribute encoding.

use base64::{engine::general_purpose::STANDARD, Engine};

/// `x` is canonical base64 iff re-encoding its decoded bytes reproduces `x`
/// exactly. This rejects non-base64 strings, non-canonical padding, and
/// alternate alphabets without needing a separate character-class check.
pub fn is_canonical_base64(x: &str) -> bool {
    match STANDARD.decode(x) {
        Ok(decoded) => STANDARD.encode(&decoded) == x,
        Err(_) => false,
    }
}

/// A decoded byte counts as printable text: ASCII tab/LF/CR, printable ASCII
/// 0x20-0x7E, or any byte that is part of a valid UTF-8 sequence encoding a
/// codepoint >= 0x80.
fn is_printable_text(s: &str) -> bool {
    s.chars().all(|c| {
        let cp = c as u32;
        cp >= 0x80 || matches!(cp, 0x09 | 0x0A | 0x0D) || (0x20..=0x7E).contains(&cp)
    })
}

/// Decode `x` if it is canonical base64 and decodes to printable UTF-8 text;
/// otherwise return `x` unchanged.
pub fn decode_attribute(x: &str) -> String {
    if !is_canonical_base64(x) {
        return x.to_string();
    }
    match STANDARD.decode(x) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) if is_printable_text(&text) => text,
            _ => x.to_string(),
        },
        Err(_) => x.to_string(),
    }
}
