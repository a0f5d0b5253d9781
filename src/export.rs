//! Metadata composition for exported images.

use dicom::core::VR;
use dicom::dictionary_std::tags;

use crate::dataset::Dataset;
use crate::defaults::create_uid;
use crate::param::DcmieParam;

fn apply_mask(dataset: Dataset, param: &DcmieParam) -> Dataset {
    match &param.mask_metadata {
        Some(mask) => dataset.subset(mask),
        None => dataset,
    }
}

/// The metadata shared by all slices of an export.
///
/// Later sources win: the defaults, then the first slice of the image's own
/// metadata (when `use_image_metadata` is set), then the general metadata.
/// The result is restricted to the mask, if one is configured.
pub fn compose_info_metadata(defaults: Dataset, image_metadata: Option<&[Dataset]>, param: &DcmieParam) -> Dataset {
    let mut info = defaults;
    if param.use_image_metadata {
        if let Some(first) = image_metadata.and_then(<[Dataset]>::first) {
            info.merge(first);
        }
    }
    if let Some(general) = &param.general_metadata {
        info.merge(general);
    }
    apply_mask(info, param)
}

/// Per-slice metadata for an export of `n_slices` slices.
///
/// InstanceNumber counts up from the one in `info` (1 if it has none or it
/// doesn't parse). Every slice after the first gets a new SOPInstanceUID,
/// whatever the mask says.
pub fn compose_slice_metadata(
    info: &Dataset,
    image_metadata: Option<&[Dataset]>,
    n_slices: usize,
    param: &DcmieParam,
) -> Vec<Dataset> {
    let first_number = info
        .string(tags::INSTANCE_NUMBER)
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(1);

    (0..n_slices)
        .map(|index| {
            let mut metadata = Dataset::new();
            if param.use_image_metadata {
                if let Some(own) = image_metadata.and_then(|m| m.get(index)) {
                    metadata.merge(own);
                }
            }
            metadata.merge(info);
            metadata.put_str(tags::INSTANCE_NUMBER, VR::IS, (first_number + index as i64).to_string());
            let mut metadata = apply_mask(metadata, param);
            if index > 0 {
                metadata.put_str(tags::SOP_INSTANCE_UID, VR::UI, create_uid());
            }
            metadata
        })
        .collect()
}
