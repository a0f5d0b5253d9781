use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use serde::Deserialize;
use tracing::error;

pub mod dataset;
pub mod defaults;
pub mod dictionary;
pub mod error;
pub mod escape;
pub mod export;
pub mod import;
pub mod keys;
pub mod marshal;
pub mod param;
pub mod properties;
pub mod propfile;
pub mod table;

pub use dataset::{Dataset, Element, Value};
pub use dictionary::{MapDictionary, StandardTagDictionary, TagDictionary, TagEntry};
pub use error::{ConversionError, ImportError, ParamError};
pub use marshal::{datasets_to_properties, properties_to_datasets, Marshaler};
pub use properties::{PropertyMap, PropertyValue};

#[derive(Deserialize)]
struct PropertyListerArgs {
    path: String,
    #[serde(default)]
    parameter_file: Option<String>,
}

/// Prints the string properties of a DICOM file, or of every `.dcm` file in a
/// directory, in property file syntax on stdout.
///
/// Takes a JSON object `{"path": ..., "parameter_file": ...}`. Returns 0 on
/// success and -1 if the arguments are unusable or nothing could be listed.
///
/// # Safety
///
/// `args_json_ptr` must be null or point to a NUL terminated string.
#[no_mangle]
pub unsafe extern "C" fn dcmie_list_properties(args_json_ptr: *const c_char) -> i32 {
    if args_json_ptr.is_null() {
        error!("dcmie_list_properties called without arguments");
        return -1;
    }
    let args_json = unsafe { CStr::from_ptr(args_json_ptr) };
    let args: PropertyListerArgs = match args_json.to_str().map(|s| serde_json::from_str::<PropertyListerArgs>(s)) {
        Ok(Ok(args)) => args,
        Ok(Err(e)) => {
            error!("wrong arguments: {e}");
            return -1;
        }
        Err(e) => {
            error!("arguments are not UTF-8: {e}");
            return -1;
        }
    };

    match list_properties(&args) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            -1
        }
    }
}

fn list_properties(args: &PropertyListerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let marshaler = Marshaler::new(StandardTagDictionary);
    let mut param = match &args.parameter_file {
        Some(file) => param::DcmieParam::from_file(Path::new(file), std::env::current_dir()?, &marshaler),
        None => param::DcmieParam::default(),
    };
    // Listing always wants the text form.
    param.metadata_string = true;
    param.metadata_binary = false;

    let path = Path::new(&args.path);
    let paths = if path.is_dir() {
        import::scan_directory(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let outcome = import::import_files(&paths, &AtomicBool::new(false));
    if outcome.datasets.is_empty() {
        return Err(format!("no readable DICOM file at {}", path.display()).into());
    }
    let props = outcome.to_properties(&param, &marshaler);
    propfile::store(&props, std::io::stdout().lock())?;
    Ok(())
}
