use std::sync::Arc;
use arrow::array::{RecordBatch, StringBuilder, StringDictionaryBuilder, UInt32Builder};
use arrow::datatypes::{DataType, Field, Int16Type, Schema};
use arrow::error::ArrowError;

use crate::dictionary::TagDictionary;
use crate::keys::{tag_hex, PropertyKeys};
use crate::properties::{PropertyMap, PropertyValue};

pub fn property_schema() -> Schema {
    Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("slice", DataType::UInt32, true),
        Field::new("tag", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("vr", DataType::Dictionary(
                                Box::new(DataType::Int16),
                                Box::new(DataType::Utf8)),
                   true),
        Field::new("value", DataType::Utf8, false),
    ])
}

/// Lists a property map, one row per key in key order.
///
/// String properties are broken down into slice, tag and the dictionary
/// name and VR of the tag. Other keys only fill `key` and `value`; the binary
/// property shows as the number of datasets it holds.
pub fn property_table<D: TagDictionary>(props: &PropertyMap,
                                        keys: &PropertyKeys,
                                        dict: &D) -> Result<RecordBatch, ArrowError> {
    let mut key_builder = StringBuilder::new();
    let mut slice_builder = UInt32Builder::new();
    let mut tag_builder = StringBuilder::new();
    let mut name_builder = StringBuilder::new();
    let mut vr_builder = StringDictionaryBuilder::<Int16Type>::new();
    let mut value_builder = StringBuilder::new();

    for (key, value) in props {
        key_builder.append_value(key);
        match value {
            PropertyValue::Text(text) => value_builder.append_value(text),
            PropertyValue::Binary(datasets) => value_builder.append_value(format!("<{} datasets>", datasets.len())),
        }

        let parsed = keys.parse_string_key(key).ok().flatten();
        match parsed {
            Some(parsed) => {
                slice_builder.append_value(parsed.slice);
                tag_builder.append_value(tag_hex(parsed.tag));
                match dict.lookup(parsed.tag) {
                    Some(entry) => {
                        name_builder.append_value(entry.name);
                        vr_builder.append_value(entry.vr.to_string());
                    }
                    None => {
                        name_builder.append_null();
                        vr_builder.append_null();
                    }
                }
            }
            None => {
                slice_builder.append_null();
                tag_builder.append_null();
                name_builder.append_null();
                vr_builder.append_null();
            }
        }
    }

    RecordBatch::try_new(
        Arc::new(property_schema()),
        vec![
            Arc::new(key_builder.finish()),
            Arc::new(slice_builder.finish()),
            Arc::new(tag_builder.finish()),
            Arc::new(name_builder.finish()),
            Arc::new(vr_builder.finish()),
            Arc::new(value_builder.finish()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray, UInt32Array};
    use dicom::core::VR;
    use dicom::dictionary_std::tags;
    use crate::dataset::Dataset;
    use crate::dictionary::MapDictionary;

    #[test]
    fn lists_string_binary_and_foreign_keys() {
        let dict = MapDictionary::new().with(tags::PATIENT_ID, "PatientID", VR::LO);
        let mut props = PropertyMap::new();
        props.set("Info", "host text");
        props.set("dcm4che.binary", vec![Dataset::new(), Dataset::new()]);
        props.set("dcm4che.string.2.00100020", "P-7");
        props.set("dcm4che.string.1.00091001", "private");

        let batch = property_table(&props, &PropertyKeys::default(), &dict).unwrap();
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(batch.num_columns(), 6);

        let key = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let slice = batch.column(1).as_any().downcast_ref::<UInt32Array>().unwrap();
        let name = batch.column(3).as_any().downcast_ref::<StringArray>().unwrap();
        let value = batch.column(5).as_any().downcast_ref::<StringArray>().unwrap();

        // key order: Info, dcm4che.binary, dcm4che.string.1..., dcm4che.string.2...
        assert_eq!(key.value(0), "Info");
        assert!(slice.is_null(0));
        assert_eq!(value.value(1), "<2 datasets>");
        assert_eq!(slice.value(2), 1);
        assert!(name.is_null(2));
        assert_eq!(slice.value(3), 2);
        assert_eq!(name.value(3), "PatientID");
        assert_eq!(value.value(3), "P-7");
    }
}
