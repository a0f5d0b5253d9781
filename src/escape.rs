//! Flat string form of multi-valued elements.
//!
//! Values are joined with a single `\`. Inside a value CR, LF, FF and ESC
//! are written as `\r`, `\n`, `\f` and `\033`, and a literal backslash as
//! `\x5c`, so a bare `\` is always a delimiter unless it starts one of those
//! sequences. A value after a delimiter whose text would itself read as a
//! sequence (`nina`, `033`, `x41`) gets its first character written as
//! `\xHH`.

pub const DELIMITER: char = '\\';

const ESC: char = '\u{1b}';

/// Decodes the escape sequence at the start of `rest` (the text after a
/// backslash). Returns the character and the number of bytes consumed.
fn unescape_at(rest: &str) -> Option<(char, usize)> {
    match rest.as_bytes().first()? {
        b'r' => Some(('\r', 1)),
        b'n' => Some(('\n', 1)),
        b'f' => Some(('\u{0c}', 1)),
        b'0' if rest.starts_with("033") => Some((ESC, 3)),
        b'x' => {
            let hex = rest.get(1..3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let c = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
            Some((c, 3))
        }
        _ => None,
    }
}

pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\x5c"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\u{0c}' => out.push_str("\\f"),
            ESC => out.push_str("\\033"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a value that follows a delimiter.
fn escape_following(value: &str) -> String {
    let escaped = escape_value(value);
    match escaped.chars().next() {
        // Only ASCII letters and digits start a sequence.
        Some(first) if unescape_at(&escaped).is_some() => {
            format!("\\x{:02x}{}", u32::from(first), &escaped[first.len_utf8()..])
        }
        _ => escaped,
    }
}

/// Escapes every value and joins them with the delimiter.
pub fn join_values<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push_str(&escape_value(value.as_ref()));
        } else {
            out.push(DELIMITER);
            out.push_str(&escape_following(value.as_ref()));
        }
    }
    out
}

/// Splits a flat string back into values. The empty string holds no values.
pub fn split_values(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    let mut values = Vec::new();
    let mut current = String::new();
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        if c != DELIMITER {
            current.push(c);
            continue;
        }
        match unescape_at(rest) {
            Some((u, len)) => {
                current.push(u);
                rest = &rest[len..];
            }
            None => values.push(std::mem::take(&mut current)),
        }
    }
    values.push(current);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(values: &[&str]) {
        let joined = join_values(values);
        assert_eq!(split_values(&joined), values, "joined form {joined:?}");
    }

    #[test]
    fn control_characters_round_trip() {
        let original = "line1\r\nline2\u{0c}page\u{1b}[0m";
        let escaped = escape_value(original);
        assert_eq!(escaped, "line1\\r\\nline2\\fpage\\033[0m");
        assert_eq!(split_values(&escaped), vec![original.to_string()]);
    }

    #[test]
    fn joins_with_single_backslash() {
        assert_eq!(join_values(&["ORIGINAL", "PRIMARY", "AXIAL"]), "ORIGINAL\\PRIMARY\\AXIAL");
        assert_eq!(split_values("ORIGINAL\\PRIMARY\\AXIAL"), vec!["ORIGINAL", "PRIMARY", "AXIAL"]);
    }

    #[test]
    fn embedded_backslash_is_hex_escaped() {
        let values = ["A", "B\\C", "D"];
        let joined = join_values(&values);
        assert_eq!(joined, "A\\B\\x5cC\\D");
        assert_eq!(split_values(&joined), values);
    }

    #[test]
    fn empty_string_has_no_values() {
        assert!(split_values("").is_empty());
        assert_eq!(join_values::<&str>(&[]), "");
    }

    #[test]
    fn empty_inner_values_are_kept() {
        assert_eq!(split_values("\\2"), vec!["", "2"]);
        assert_eq!(split_values("1\\"), vec!["1", ""]);
        assert_eq!(join_values(&["", "", ""]), "\\\\");
        round_trip(&["", "", ""]);
        round_trip(&["1", "", "3"]);
    }

    #[test]
    fn numeric_multi_values_stay_plain() {
        assert_eq!(join_values(&["512", "512"]), "512\\512");
        assert_eq!(split_values("512\\512"), vec!["512", "512"]);
        assert_eq!(split_values("0.5\\0.5"), vec!["0.5", "0.5"]);
    }

    #[test]
    fn values_that_look_like_sequences_are_guarded() {
        assert_eq!(join_values(&["1.5", "033"]), "1.5\\\\x3033");
        round_trip(&["1.5", "033"]);
        assert_eq!(join_values(&["Doe", "nina"]), "Doe\\\\x6eina");
        round_trip(&["Doe", "nina"]);
        round_trip(&["a", "rB", "fC", "x41", "xyz"]);
        round_trip(&["A", "\\leading", "\r\n", "\u{1b}"]);
        round_trip(&["nothing to guard", "n"]);
    }

    #[test]
    fn first_value_needs_no_guard() {
        assert_eq!(join_values(&["nina", "033"]), "nina\\\\x3033");
        round_trip(&["nina", "033"]);
    }

    #[test]
    fn unknown_sequences_read_as_delimiters() {
        assert_eq!(split_values("A\\xzz"), vec!["A", "xzz"]);
        assert_eq!(split_values("A\\03"), vec!["A", "03"]);
    }
}
