//! Excel `_xHHHH_` escape handling.
//!
//! SpreadsheetML cannot carry most control characters literally, so Excel
//! writes them as `_xHHHH_` (e.g. `_x000d_` for CR, `_x005f_` for a literal
//! underscore that would otherwise start an escape). Shared string payloads
//! keep the escaped form so they serialize back unchanged; these helpers
//! convert between the stored and the displayed form.

/// Decode `_xHHHH_` sequences into the characters they stand for.
///
/// Malformed or partial sequences are kept as written.
pub fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match escaped_char(candidate) {
            Some(c) => {
                result.push(c);
                rest = &candidate[ESCAPE_LEN..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Encode characters that XML 1.0 cannot carry as `_xHHHH_`.
///
/// Tab, LF and CR are legal XML characters and are left alone; the writer
/// emits CR as a character reference instead. Existing `_xHHHH_` text is
/// already in stored form and passes through.
pub fn encode_excel_escapes(s: &str) -> String {
    if !s.chars().any(needs_excel_escape) {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        if needs_excel_escape(c) {
            result.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            result.push(c);
        }
    }
    result
}

/// `_x` + four hex digits + `_`
const ESCAPE_LEN: usize = 7;

fn escaped_char(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < ESCAPE_LEN || !s.starts_with("_x") || bytes[6] != b'_' {
        return None;
    }
    let hex = &bytes[2..6];
    if !hex.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    std::str::from_utf8(hex)
        .ok()
        .and_then(|h| u32::from_str_radix(h, 16).ok())
        .and_then(char::from_u32)
}

fn needs_excel_escape(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}
