//! Default info metadata for synthetic images.

use dicom::core::VR;
use dicom::dictionary_std::tags;

use crate::dataset::{Dataset, Element};

/// Secondary Capture Image Storage.
pub const SECONDARY_CAPTURE_SOP_CLASS: &str = "1.2.840.10008.5.1.4.1.1.7";

/// Source of the base dataset a file encoder fills in for a new image.
pub trait MetadataTemplate {
    fn default_stream_metadata(&self) -> Dataset;
}

/// Minimal Secondary Capture record: the mandatory attributes with
/// type 2 ones left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondaryCaptureTemplate;

impl MetadataTemplate for SecondaryCaptureTemplate {
    fn default_stream_metadata(&self) -> Dataset {
        let mut ds = Dataset::new();
        ds.put_str(tags::SPECIFIC_CHARACTER_SET, VR::CS, "ISO_IR 100");
        ds.put(Element::strs(tags::IMAGE_TYPE, VR::CS, ["DERIVED", "SECONDARY"]));
        ds.put_str(tags::SOP_CLASS_UID, VR::UI, SECONDARY_CAPTURE_SOP_CLASS);
        ds.put_empty(tags::SOP_INSTANCE_UID, VR::UI);
        ds.put_empty(tags::STUDY_DATE, VR::DA);
        ds.put_empty(tags::STUDY_TIME, VR::TM);
        ds.put_empty(tags::ACCESSION_NUMBER, VR::SH);
        ds.put_str(tags::MODALITY, VR::CS, "OT");
        ds.put_str(tags::CONVERSION_TYPE, VR::CS, "WSD");
        ds.put_empty(tags::REFERRING_PHYSICIAN_NAME, VR::PN);
        ds.put_empty(tags::PATIENT_NAME, VR::PN);
        ds.put_empty(tags::PATIENT_ID, VR::LO);
        ds.put_empty(tags::PATIENT_BIRTH_DATE, VR::DA);
        ds.put_empty(tags::PATIENT_SEX, VR::CS);
        ds.put_empty(tags::STUDY_INSTANCE_UID, VR::UI);
        ds.put_empty(tags::SERIES_INSTANCE_UID, VR::UI);
        ds.put_empty(tags::STUDY_ID, VR::SH);
        ds.put_empty(tags::SERIES_NUMBER, VR::IS);
        ds.put_empty(tags::INSTANCE_NUMBER, VR::IS);
        ds.put_empty(tags::PATIENT_ORIENTATION, VR::CS);
        ds
    }
}

/// A patient id for images without one: the current time in milliseconds.
pub fn create_patient_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// A fresh UID under the `2.25` root, derived from a random UUID.
pub fn create_uid() -> String {
    format!("2.25.{}", uuid::Uuid::new_v4().as_u128())
}

/// The template's dataset with the four identifying attributes filled in.
/// A `None` patient id is replaced by [`create_patient_id`].
pub fn default_info_metadata<T: MetadataTemplate + ?Sized>(
    patient_id: Option<&str>,
    study_id: u32,
    series_number: u32,
    instance_number: u32,
    template: &T,
) -> Dataset {
    let patient_id = patient_id.map_or_else(create_patient_id, str::to_string);

    let mut ids = Dataset::new();
    ids.put_str(tags::PATIENT_ID, VR::LO, patient_id);
    ids.put_str(tags::STUDY_ID, VR::SH, study_id.to_string());
    ids.put_str(tags::SERIES_NUMBER, VR::IS, series_number.to_string());
    ids.put_str(tags::INSTANCE_NUMBER, VR::IS, instance_number.to_string());

    let mut ds = template.default_stream_metadata();
    ds.merge(&ids);
    ds
}
