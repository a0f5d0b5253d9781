use std::collections::btree_map::{self, BTreeMap};
use dicom::core::{Tag, VR};

/// How a value representation can travel through the flat string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrClass {
    /// Text and numeric-as-text VRs: the value is a list of strings.
    Text,
    /// Raw byte blobs and nested sequences: only representable when empty.
    Opaque,
}

pub fn vr_class(vr: VR) -> VrClass {
    match vr {
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN | VR::SQ => VrClass::Opaque,
        _ => VrClass::Text,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Strings(Vec<String>),
    Bytes(Vec<u8>),
    Sequence(Vec<Dataset>),
}

impl Value {
    pub fn empty() -> Self {
        Value::Strings(Vec::new())
    }

    /// Value multiplicity. Bytes count as a single value when not empty.
    pub fn multiplicity(&self) -> usize {
        match self {
            Value::Strings(values) => values.len(),
            Value::Bytes(bytes) => usize::from(!bytes.is_empty()),
            Value::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// The string values, if the value holds any text at all.
    ///
    /// Empty byte blobs and empty sequences read as zero strings; populated ones
    /// have no string form and yield `None`.
    pub fn to_strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings(values) => Some(values),
            _ if self.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

/// A single attribute of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub vr: VR,
    pub value: Value,
}

impl Element {
    pub fn new(tag: Tag, vr: VR, value: Value) -> Self {
        Element { tag, vr, value }
    }

    pub fn empty(tag: Tag, vr: VR) -> Self {
        Element::new(tag, vr, Value::empty())
    }

    pub fn strs<I, S>(tag: Tag, vr: VR, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Element::new(tag, vr, Value::Strings(values.into_iter().map(Into::into).collect()))
    }
}

/// The metadata of one slice: a tag-unique map of elements, iterated in
/// ascending tag order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    elements: BTreeMap<Tag, Element>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the element, replacing any element with the same tag.
    pub fn put(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.tag, element)
    }

    pub fn put_str(&mut self, tag: Tag, vr: VR, value: impl Into<String>) {
        self.put(Element::strs(tag, vr, [value]));
    }

    pub fn put_empty(&mut self, tag: Tag, vr: VR) {
        self.put(Element::empty(tag, vr));
    }

    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.elements.remove(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    /// First string value of the element, if present.
    pub fn string(&self, tag: Tag) -> Option<&str> {
        self.get(tag)?
            .value
            .to_strings()?
            .first()
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, Tag, Element> {
        self.elements.values()
    }

    /// Copies every element of `other` into this dataset. Elements of `other`
    /// win on tag collisions.
    pub fn merge(&mut self, other: &Dataset) {
        for element in other.iter() {
            self.put(element.clone());
        }
    }

    /// The elements of this dataset whose tags also appear in `mask`.
    pub fn subset(&self, mask: &Dataset) -> Dataset {
        self.iter()
            .filter(|element| mask.contains(element.tag))
            .cloned()
            .collect()
    }
}

impl FromIterator<Element> for Dataset {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for element in iter {
            dataset.put(element);
        }
        dataset
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Element;
    type IntoIter = btree_map::Values<'a, Tag, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
