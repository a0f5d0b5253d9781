use tracing::info;
use tracing_subscriber::EnvFilter;
use dcmie_props::defaults::{create_patient_id, default_info_metadata, SecondaryCaptureTemplate};
use dcmie_props::{propfile, Marshaler, StandardTagDictionary};

/// Writes `default_metadata.properties`, the string properties of a default
/// Secondary Capture image, into the current directory.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let patient_id = create_patient_id();
    let dataset = default_info_metadata(Some(&patient_id), 1, 1, 1, &SecondaryCaptureTemplate);
    let props = Marshaler::new(StandardTagDictionary).datasets_to_properties(&[dataset], true, false);

    let path = std::env::current_dir()?.join("default_metadata.properties");
    propfile::write_file(&props, &path)?;
    info!(path = %path.display(), properties = props.len(), "wrote default metadata");
    Ok(())
}
