//! Conversion between host property maps and dataset arrays.
//!
//! Building datasets from properties is all-or-nothing: the result ends up in
//! a DICOM file, so the first bad key aborts the batch. Building properties
//! from datasets is best-effort: an element that can't be expressed is left
//! out and the rest of the batch goes through.

use dicom::core::{Tag, VR};
use tracing::{debug, trace};

use crate::dataset::{vr_class, Dataset, Element, Value, VrClass};
use crate::dictionary::{StandardTagDictionary, TagDictionary};
use crate::error::{ConversionError, Result};
use crate::escape::{join_values, split_values};
use crate::keys::PropertyKeys;
use crate::properties::{PropertyMap, PropertyValue};

/// Why an element was left out of the string properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tag has no dictionary entry.
    UnknownTag,
    /// The dictionary VR can't be written back from a string.
    NotWritable(VR),
    /// The value is a populated byte blob or sequence.
    NoStringForm,
}

/// Result of converting one element to a string property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementOutcome {
    Emit { key: String, value: String },
    Skip { tag: Tag, reason: SkipReason },
}

pub struct Marshaler<D> {
    dict: D,
    keys: PropertyKeys,
}

impl Default for Marshaler<StandardTagDictionary> {
    fn default() -> Self {
        Marshaler::new(StandardTagDictionary)
    }
}

impl<D: TagDictionary> Marshaler<D> {
    pub fn new(dict: D) -> Self {
        Marshaler { dict, keys: PropertyKeys::default() }
    }

    pub fn with_keys(mut self, keys: PropertyKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn keys(&self) -> &PropertyKeys {
        &self.keys
    }

    pub fn dictionary(&self) -> &D {
        &self.dict
    }

    /// Builds `dimension` datasets from a property map.
    ///
    /// Datasets are seeded from the binary property, if present. When
    /// `string_overrides` is set, the string properties are then applied on
    /// top, replacing binary elements with the same tag. A `None` map yields
    /// `None`.
    pub fn properties_to_datasets(
        &self,
        props: Option<&PropertyMap>,
        dimension: usize,
        string_overrides: bool,
    ) -> Result<Option<Vec<Dataset>>> {
        let Some(props) = props else {
            return Ok(None);
        };
        if dimension == 0 {
            return Err(ConversionError::InvalidDimension(dimension));
        }

        let mut datasets = vec![Dataset::new(); dimension];
        if let Some(binary) = props.get(&self.keys.binary_key()).and_then(PropertyValue::as_binary) {
            for (slot, dataset) in datasets.iter_mut().zip(binary) {
                *slot = dataset.clone();
            }
        }
        if !string_overrides {
            return Ok(Some(datasets));
        }

        // Map iteration is in key order, so within one slice the elements are
        // applied in ascending tag order (Specific Character Set first).
        let mut overlays = vec![Dataset::new(); dimension];
        let mut applied = 0usize;
        for (key, value) in props {
            let Some(parsed) = self.keys.parse_string_key(key)? else {
                continue;
            };
            let Some(index) = parsed.index().filter(|&i| i < dimension) else {
                trace!(key = key.as_str(), dimension, "slice outside dataset array, ignored");
                continue;
            };
            let text = value
                .as_text()
                .ok_or_else(|| ConversionError::MalformedKey(key.clone()))?;
            overlays[index].put(self.string_element(parsed.tag, text)?);
            applied += 1;
        }

        for (dataset, overlay) in datasets.iter_mut().zip(&overlays) {
            dataset.merge(overlay);
        }
        debug!(dimension, applied, "converted string properties to datasets");
        Ok(Some(datasets))
    }

    fn string_element(&self, tag: Tag, text: &str) -> Result<Element> {
        let entry = self.dict.lookup(tag).ok_or(ConversionError::UnknownTag(tag))?;
        let values = split_values(text);
        if values.is_empty() {
            return Ok(Element::empty(tag, entry.vr));
        }
        if vr_class(entry.vr) == VrClass::Opaque {
            return Err(ConversionError::UnsupportedVr { tag, vr: entry.vr });
        }
        Ok(Element::new(tag, entry.vr, Value::Strings(values)))
    }

    /// Converts one element of the dataset at 0-based `index`.
    pub fn element_outcome(&self, index: usize, element: &Element) -> ElementOutcome {
        let tag = element.tag;
        let skip = |reason| ElementOutcome::Skip { tag, reason };

        let Some(entry) = self.dict.lookup(tag) else {
            return skip(SkipReason::UnknownTag);
        };
        let Some(values) = element.value.to_strings() else {
            return skip(SkipReason::NoStringForm);
        };
        // Only elements that could be read back are listed, judged by the
        // dictionary VR rather than the one stored in the dataset.
        if !values.is_empty() && vr_class(entry.vr) == VrClass::Opaque {
            return skip(SkipReason::NotWritable(entry.vr));
        }
        ElementOutcome::Emit {
            key: self.keys.string_key(index, tag),
            value: join_values(values),
        }
    }

    /// Builds a property map from datasets, as strings, as the binary
    /// property, or both. Never fails.
    pub fn datasets_to_properties(&self, datasets: &[Dataset], as_string: bool, as_binary: bool) -> PropertyMap {
        let mut props = PropertyMap::new();

        if as_string {
            let mut skipped = 0usize;
            for (index, dataset) in datasets.iter().enumerate() {
                for element in dataset {
                    match self.element_outcome(index, element) {
                        ElementOutcome::Emit { key, value } => {
                            props.set(key, value);
                        }
                        ElementOutcome::Skip { tag, reason } => {
                            trace!(slice = index + 1, ?tag, ?reason, "element left out of string properties");
                            skipped += 1;
                        }
                    }
                }
            }
            debug!(datasets = datasets.len(), emitted = props.len(), skipped, "converted datasets to string properties");
        }

        if as_binary {
            props.set(self.keys.binary_key(), datasets.to_vec());
        }

        props
    }
}

/// [`Marshaler::properties_to_datasets`] with the default key namespace.
pub fn properties_to_datasets<D: TagDictionary>(
    props: Option<&PropertyMap>,
    dimension: usize,
    string_overrides: bool,
    dict: D,
) -> Result<Option<Vec<Dataset>>> {
    Marshaler::new(dict).properties_to_datasets(props, dimension, string_overrides)
}

/// [`Marshaler::datasets_to_properties`] with the default key namespace.
pub fn datasets_to_properties<D: TagDictionary>(
    datasets: &[Dataset],
    as_string: bool,
    as_binary: bool,
    dict: D,
) -> PropertyMap {
    Marshaler::new(dict).datasets_to_properties(datasets, as_string, as_binary)
}
