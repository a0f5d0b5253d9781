//! Tag dictionary capability.
//!
//! The marshaler never reaches for a global dictionary. Callers pass a
//! [`TagDictionary`], normally [`StandardTagDictionary`] backed by the DICOM
//! standard data dictionary, or a [`MapDictionary`] with a handful of entries.

use std::collections::HashMap;
use dicom::core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom::core::{Tag, VR};
use dicom::dictionary_std::StandardDataDictionary;

/// What the dictionary knows about one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEntry<'a> {
    pub name: &'a str,
    pub vr: VR,
}

pub trait TagDictionary {
    fn lookup(&self, tag: Tag) -> Option<TagEntry<'_>>;
}

impl<T: TagDictionary + ?Sized> TagDictionary for &T {
    fn lookup(&self, tag: Tag) -> Option<TagEntry<'_>> {
        (**self).lookup(tag)
    }
}

static STANDARD: StandardDataDictionary = StandardDataDictionary;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTagDictionary;

impl TagDictionary for StandardTagDictionary {
    fn lookup(&self, tag: Tag) -> Option<TagEntry<'_>> {
        // Context dependent VRs (US or SS, OB or OW) resolve to their relaxed form.
        STANDARD.by_tag(tag).map(|entry| TagEntry {
            name: entry.alias(),
            vr: entry.vr().relaxed(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapDictionary {
    entries: HashMap<Tag, (String, VR)>,
}

impl MapDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: Tag, name: impl Into<String>, vr: VR) -> Self {
        self.insert(tag, name, vr);
        self
    }

    pub fn insert(&mut self, tag: Tag, name: impl Into<String>, vr: VR) {
        self.entries.insert(tag, (name.into(), vr));
    }
}

impl TagDictionary for MapDictionary {
    fn lookup(&self, tag: Tag) -> Option<TagEntry<'_>> {
        self.entries
            .get(&tag)
            .map(|(name, vr)| TagEntry { name, vr: *vr })
    }
}
