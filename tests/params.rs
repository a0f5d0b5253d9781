//! Parameter and metadata property files on disk.

use std::fs;
use dcmie_props::defaults::{default_info_metadata, SecondaryCaptureTemplate};
use dcmie_props::export::{compose_info_metadata, compose_slice_metadata};
use dcmie_props::param::{read_metadata_file, DcmieParam};
use dcmie_props::{propfile, Marshaler, ParamError, StandardTagDictionary};
use dicom::dictionary_std::tags;
use tempfile::TempDir;

fn marshaler() -> Marshaler<StandardTagDictionary> {
    Marshaler::new(StandardTagDictionary)
}

#[test]
fn loads_general_and_mask_metadata() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("general.properties"),
        "# institution wide values\n\
         dcm4che.string.1.00080080 = IFTM Klinik\n\
         dcm4che.string.1.00080060 = MR\n\
         dcm4che.string.1.00080008 = DERIVED\\\\SECONDARY\\\\MPR\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("mask.properties"),
        "dcm4che.string.1.00080060 =\n\
         dcm4che.string.1.00080080 =\n\
         dcm4che.string.1.00100020 =\n\
         dcm4che.string.1.00200013 =\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("dcmie.properties"),
        "dcmie.export.metadata.general = general.properties\n\
         dcmie.export.metadata.mask = ./mask.properties\n\
         dcmie.export.metadata.useimage = false\n\
         dcmie.import.ij.metadata.binary = TRUE\n",
    )
    .unwrap();

    let param = DcmieParam::from_file(&dir.path().join("dcmie.properties"), dir.path(), &marshaler());
    assert!(param.metadata_binary);
    assert!(!param.use_image_metadata);

    let general = param.general_metadata.as_ref().unwrap();
    assert_eq!(general.string(tags::INSTITUTION_NAME), Some("IFTM Klinik"));
    assert_eq!(general.get(tags::IMAGE_TYPE).unwrap().value.multiplicity(), 3);
    assert_eq!(param.mask_metadata.as_ref().unwrap().len(), 4);

    let defaults = default_info_metadata(Some("4711"), 1, 1, 3, &SecondaryCaptureTemplate);
    let info = compose_info_metadata(defaults, None, &param);
    assert_eq!(info.len(), 4);
    assert_eq!(info.string(tags::MODALITY), Some("MR"));
    assert_eq!(info.string(tags::PATIENT_ID), Some("4711"));

    let slices = compose_slice_metadata(&info, None, 2, &param);
    assert_eq!(slices[0].string(tags::INSTANCE_NUMBER), Some("3"));
    assert_eq!(slices[1].string(tags::INSTANCE_NUMBER), Some("4"));
    assert!(!slices[1].contains(tags::SOP_CLASS_UID));
}

#[test]
fn bad_metadata_file_is_reported_and_ignored() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.properties");
    fs::write(&bad, "dcm4che.string.1.00091001 = private\n").unwrap();

    let err = read_metadata_file(&bad, &marshaler()).unwrap_err();
    assert!(matches!(err, ParamError::Metadata { .. }));

    fs::write(dir.path().join("dcmie.properties"), "dcmie.export.metadata.general = bad.properties\n").unwrap();
    let param = DcmieParam::from_file(&dir.path().join("dcmie.properties"), dir.path(), &marshaler());
    assert!(param.general_metadata.is_none());
}

#[test]
fn parameters_from_open_stream() {
    let text = "dcmie.import.ij.metadata.string = yes\ndcmie.import.ij.metadata.onlyfirst = true\n";
    let mut reader = std::io::Cursor::new(text.as_bytes());
    let param = DcmieParam::from_reader(&mut reader, &marshaler());
    assert!(!param.metadata_string);
    assert!(param.metadata_only_first);
    // The stream is still usable afterwards.
    assert_eq!(reader.position() as usize, text.len());
}

#[test]
fn default_metadata_file_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("default_metadata.properties");
    let m = marshaler();

    let dataset = default_info_metadata(Some("123"), 2, 3, 4, &SecondaryCaptureTemplate);
    let props = m.datasets_to_properties(&[dataset.clone()], true, false);
    propfile::write_file(&props, &path).unwrap();

    let back = read_metadata_file(&path, &m).unwrap();
    assert_eq!(back, dataset);
}
