//! Property key schema.
//!
//! String properties: `<namespace>.string.<slice>.<tag>`, slice numbers start
//! at 1 and the tag is 8 hex digits (group then element).
//! Binary property: `<namespace>.binary`, holding every dataset at once.

use dicom::core::Tag;
use crate::error::{ConversionError, Result};

pub const DEFAULT_NAMESPACE: &str = "dcm4che";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    namespace: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        PropertyKeys::new(DEFAULT_NAMESPACE)
    }
}

/// A parsed string property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringKey {
    /// 1-based slice number as written in the key.
    pub slice: u32,
    pub tag: Tag,
}

impl StringKey {
    /// 0-based position in a dataset array, `None` for slice number 0.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.slice).ok()?.checked_sub(1)
    }
}

impl PropertyKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        PropertyKeys { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn binary_key(&self) -> String {
        format!("{}.binary", self.namespace)
    }

    fn string_prefix(&self) -> String {
        format!("{}.string.", self.namespace)
    }

    /// Key of the string property for `tag` in the dataset at 0-based `index`.
    pub fn string_key(&self, index: usize, tag: Tag) -> String {
        format!("{}{}.{}", self.string_prefix(), index + 1, tag_hex(tag))
    }

    pub fn is_string_key(&self, key: &str) -> bool {
        key.starts_with(&self.string_prefix())
    }

    /// Parses a string property key.
    ///
    /// Returns `Ok(None)` for keys outside the string family. Keys inside it
    /// whose slice number or tag don't parse are an error.
    pub fn parse_string_key(&self, key: &str) -> Result<Option<StringKey>> {
        let Some(rest) = key.strip_prefix(&self.string_prefix()) else {
            return Ok(None);
        };
        let malformed = || ConversionError::MalformedKey(key.to_string());
        let (slice, tag) = rest.split_once('.').ok_or_else(malformed)?;
        let slice = slice.parse::<u32>().map_err(|_| malformed())?;
        let tag = parse_tag_hex(tag).ok_or_else(malformed)?;
        Ok(Some(StringKey { slice, tag }))
    }
}

/// Renders a tag as 8 lowercase hex digits.
pub fn tag_hex(tag: Tag) -> String {
    format!("{:04x}{:04x}", tag.group(), tag.element())
}

/// Parses up to 8 hex digits, either case, into a tag.
pub fn parse_tag_hex(s: &str) -> Option<Tag> {
    if s.is_empty() || s.len() > 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(s, 16).ok()?;
    Some(Tag((value >> 16) as u16, (value & 0xFFFF) as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::dictionary_std::tags;

    #[test]
    fn formats_string_key() {
        let keys = PropertyKeys::default();
        assert_eq!(keys.string_key(0, tags::PATIENT_ID), "dcm4che.string.1.00100020");
        assert_eq!(keys.string_key(11, tags::PIXEL_DATA), "dcm4che.string.12.7fe00010");
        assert_eq!(keys.binary_key(), "dcm4che.binary");
    }

    #[test]
    fn parses_string_key_any_case() {
        let keys = PropertyKeys::default();
        let parsed = keys.parse_string_key("dcm4che.string.3.7FE00010").unwrap().unwrap();
        assert_eq!(parsed, StringKey { slice: 3, tag: tags::PIXEL_DATA });
        assert_eq!(parsed.index(), Some(2));
    }

    #[test]
    fn short_tag_is_zero_padded() {
        assert_eq!(parse_tag_hex("80005"), Some(Tag(0x0008, 0x0005)));
    }

    #[test]
    fn other_keys_are_not_string_keys() {
        let keys = PropertyKeys::default();
        assert_eq!(keys.parse_string_key("Info").unwrap(), None);
        assert_eq!(keys.parse_string_key("dcm4che.binary").unwrap(), None);
    }

    #[test]
    fn malformed_string_keys() {
        let keys = PropertyKeys::default();
        for key in [
            "dcm4che.string.1",
            "dcm4che.string.x.00100020",
            "dcm4che.string.-1.00100020",
            "dcm4che.string.1.0010002g",
            "dcm4che.string.1.",
            "dcm4che.string.1.100100020",
        ] {
            assert!(
                matches!(keys.parse_string_key(key), Err(ConversionError::MalformedKey(_))),
                "{key}"
            );
        }
    }

    #[test]
    fn slice_zero_has_no_index() {
        let key = StringKey { slice: 0, tag: tags::PATIENT_ID };
        assert_eq!(key.index(), None);
    }

    #[test]
    fn custom_namespace() {
        let keys = PropertyKeys::new("ij");
        assert_eq!(keys.string_key(0, tags::MODALITY), "ij.string.1.00080060");
        assert!(keys.parse_string_key("dcm4che.string.1.00080060").unwrap().is_none());
    }
}
