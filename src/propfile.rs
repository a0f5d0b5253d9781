//! Line-oriented `key = value` property files.
//!
//! The syntax is the one of `java.util.Properties` text files: `#` and `!`
//! comment lines, `=`, `:` or whitespace between key and value, a trailing
//! backslash continues the line, and backslash escapes are resolved on load.
//! Files are read and written as UTF-8. Binary properties are never written.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::ParamError;
use crate::properties::{PropertyMap, PropertyValue};

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0c}')
}

/// Reads every entry of a property file. The reader is not closed.
pub fn load<R: BufRead>(reader: R) -> io::Result<PropertyMap> {
    let mut map = PropertyMap::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next() {
        let line = line?;
        let first = line.trim_start_matches(is_blank);
        if first.is_empty() || first.starts_with(&['#', '!'][..]) {
            continue;
        }

        let mut logical = first.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next?.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        map.set(unescape(key), unescape(value));
    }
    Ok(map)
}

/// Writes the text properties of `map` in key order, one `key = value` line each.
pub fn store<W: Write>(map: &PropertyMap, mut writer: W) -> io::Result<()> {
    for (key, value) in map {
        if let PropertyValue::Text(value) = value {
            writeln!(writer, "{} = {}", escape(key, true), escape(value, false))?;
        }
    }
    writer.flush()
}

pub fn read_file(path: &Path) -> Result<PropertyMap, ParamError> {
    let io_err = |source| ParamError::Io { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(io_err)?;
    load(BufReader::new(file)).map_err(io_err)
}

pub fn write_file(map: &PropertyMap, path: &Path) -> Result<(), ParamError> {
    let io_err = |source| ParamError::Io { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(io_err)?;
    store(map, BufWriter::new(file)).map_err(io_err)
}

/// Odd number of trailing backslashes.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(after) = rest.strip_prefix(&['=', ':'][..]) {
        rest = after.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(u) if hex.len() == 4 => out.push(u),
                    _ => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0c}' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
