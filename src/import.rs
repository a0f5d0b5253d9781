//! Dataset extraction from DICOM files.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use dicom::core::value::Value as DicomValue;
use dicom::object::mem::InMemElement;
use dicom::object::{from_reader, open_file, InMemDicomObject};
use tracing::{debug, info, warn};

use crate::dataset::{vr_class, Dataset, Element, Value, VrClass};
use crate::dictionary::TagDictionary;
use crate::error::ImportError;
use crate::marshal::Marshaler;
use crate::param::DcmieParam;
use crate::properties::PropertyMap;

pub fn dataset_from_object(obj: &InMemDicomObject) -> Dataset {
    obj.iter().map(element_from_dicom).collect()
}

fn element_from_dicom(elem: &InMemElement) -> Element {
    let header = elem.header();
    let (tag, vr) = (header.tag, header.vr);
    let value = match elem.value() {
        DicomValue::Primitive(p) if vr_class(vr) == VrClass::Opaque => Value::Bytes(p.to_bytes().into_owned()),
        DicomValue::Primitive(p) => {
            Value::Strings(p.to_multi_str().iter().map(|s| trim_padding(s).to_string()).collect())
        }
        DicomValue::Sequence(seq) => Value::Sequence(seq.items().iter().map(dataset_from_object).collect()),
        DicomValue::PixelSequence(seq) => {
            Value::Bytes(seq.fragments().iter().flatten().copied().collect())
        }
    };
    Element::new(tag, vr, value)
}

/// Text values are padded to even length with a space or NUL.
fn trim_padding(s: &str) -> &str {
    s.trim_end_matches([' ', '\0'])
}

pub fn open_dataset(path: &Path) -> Result<Dataset, ImportError> {
    let obj = open_file(path).map_err(|source| ImportError::Read { path: path.to_path_buf(), source })?;
    Ok(dataset_from_object(&obj))
}

/// Parses a DICOM stream positioned after the preamble (at `DICM`).
/// The caller keeps ownership of the stream.
pub fn read_dataset<R: Read>(reader: &mut R) -> Result<Dataset, ImportError> {
    let obj = from_reader(reader)?;
    Ok(dataset_from_object(&obj))
}

/// All `.dcm` files below `dir`, sorted by file name.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(ImportError::Scan { path: dir.to_path_buf(), source });
            }
            Err(e) => {
                warn!("skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "dcm") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Files read by [`import_files`] and their datasets, in the same order.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub files: Vec<PathBuf>,
    pub datasets: Vec<Dataset>,
    pub failed: Vec<PathBuf>,
    pub canceled: bool,
}

impl ImportOutcome {
    /// The metadata as host properties, in the representations `param` asks for.
    pub fn to_properties<D: TagDictionary>(&self, param: &DcmieParam, marshaler: &Marshaler<D>) -> PropertyMap {
        let datasets = if param.metadata_only_first {
            &self.datasets[..self.datasets.len().min(1)]
        } else {
            &self.datasets[..]
        };
        marshaler.datasets_to_properties(datasets, param.metadata_string, param.metadata_binary)
    }
}

/// Reads the given files in order.
///
/// `cancel` is checked before each file; once it is set the import stops and
/// keeps what it has. Files that fail to parse are logged and skipped.
pub fn import_files<P: AsRef<Path>>(paths: &[P], cancel: &AtomicBool) -> ImportOutcome {
    import_files_with_progress(paths, cancel, |_, _| {})
}

/// [`import_files`], calling `progress` with the number of files handled so
/// far and the last path after each file.
pub fn import_files_with_progress<P, F>(paths: &[P], cancel: &AtomicBool, mut progress: F) -> ImportOutcome
where
    P: AsRef<Path>,
    F: FnMut(usize, &Path),
{
    let mut outcome = ImportOutcome::default();
    for (i, path) in paths.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(done = i, total = paths.len(), "import canceled");
            outcome.canceled = true;
            break;
        }
        let path = path.as_ref();
        match open_dataset(path) {
            Ok(dataset) => {
                debug!(file = %path.display(), elements = dataset.len(), "imported");
                outcome.files.push(path.to_path_buf());
                outcome.datasets.push(dataset);
            }
            Err(e) => {
                warn!("{e}");
                outcome.failed.push(path.to_path_buf());
            }
        }
        progress(i + 1, path);
    }
    outcome
}
