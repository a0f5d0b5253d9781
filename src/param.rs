//! Import/export parameters read from a property file.
//!
//! Unreadable parameter or metadata files never fail: the affected settings
//! keep their defaults and a warning is logged.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::dictionary::TagDictionary;
use crate::error::ParamError;
use crate::marshal::Marshaler;
use crate::properties::PropertyMap;
use crate::propfile;

pub const IMPORT_FILE: &str = "dcmie.import.file";
pub const IMPORT_FILESYSTEM: &str = "dcmie.import.filesystem";
pub const IMPORT_IJ_MODE: &str = "dcmie.import.ij.mode";
pub const IMPORT_IMAGE_SHOW: &str = "dcmie.import.image.show";
pub const IMPORT_METADATA_BINARY: &str = "dcmie.import.ij.metadata.binary";
pub const IMPORT_METADATA_ONLY_FIRST: &str = "dcmie.import.ij.metadata.onlyfirst";
pub const IMPORT_METADATA_STRING: &str = "dcmie.import.ij.metadata.string";
pub const EXPORT_FILE: &str = "dcmie.export.file";
pub const EXPORT_FILESYSTEM: &str = "dcmie.export.filesystem";
pub const EXPORT_METADATA_GENERAL: &str = "dcmie.export.metadata.general";
pub const EXPORT_METADATA_MASK: &str = "dcmie.export.metadata.mask";
pub const EXPORT_METADATA_USE_IMAGE: &str = "dcmie.export.metadata.useimage";

#[derive(Debug, Clone, PartialEq)]
pub struct DcmieParam {
    /// Source file or directory of import operations.
    pub import_file: Option<PathBuf>,
    /// Import from the filesystem rather than a DICOMDIR.
    pub import_filesystem: bool,
    pub ij_mode: bool,
    pub image_show: bool,
    /// Attach the metadata as the binary property.
    pub metadata_binary: bool,
    /// Attach only the metadata of the first image of a stack.
    pub metadata_only_first: bool,
    /// Attach the metadata as string properties.
    pub metadata_string: bool,

    /// Destination file or directory of export operations.
    pub export_file: Option<PathBuf>,
    pub export_filesystem: bool,
    /// Metadata valid for every exported image.
    pub general_metadata: Option<Dataset>,
    /// Let the image's own metadata take part in the export.
    pub use_image_metadata: bool,
    /// When set, only attributes present in this dataset are exported.
    pub mask_metadata: Option<Dataset>,

    pub(crate) base_dir: PathBuf,
}

impl Default for DcmieParam {
    fn default() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        DcmieParam::with_base_dir(base_dir)
    }
}

impl DcmieParam {
    /// Defaults, with relative paths resolved against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        DcmieParam {
            import_file: resolve_uri("./", &base_dir),
            import_filesystem: true,
            ij_mode: true,
            image_show: true,
            metadata_binary: false,
            metadata_only_first: false,
            metadata_string: false,
            export_file: resolve_uri("./", &base_dir),
            export_filesystem: true,
            general_metadata: None,
            use_image_metadata: false,
            mask_metadata: None,
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Reads parameters from an open stream, which stays open.
    pub fn from_reader<R: BufRead, D: TagDictionary>(reader: R, marshaler: &Marshaler<D>) -> Self {
        let mut param = DcmieParam::default();
        match propfile::load(reader) {
            Ok(props) => param.apply(&props, marshaler),
            Err(e) => warn!("failed to read parameter stream, using defaults: {e}"),
        }
        param
    }

    /// Reads parameters from a file. Relative paths inside it resolve against
    /// `base_dir`.
    pub fn from_file<D: TagDictionary>(path: &Path, base_dir: impl Into<PathBuf>, marshaler: &Marshaler<D>) -> Self {
        let mut param = DcmieParam::with_base_dir(base_dir);
        match propfile::read_file(path) {
            Ok(props) => param.apply(&props, marshaler),
            Err(e) => warn!("{e}, using default parameters"),
        }
        param
    }

    /// Overrides every setting that appears in `props`.
    pub fn apply<D: TagDictionary>(&mut self, props: &PropertyMap, marshaler: &Marshaler<D>) {
        if let Some(s) = props.text(EXPORT_FILE) {
            self.export_file = resolve_uri(s, &self.base_dir);
        }
        set_flag(props, EXPORT_FILESYSTEM, &mut self.export_filesystem);
        if let Some(s) = props.text(EXPORT_METADATA_GENERAL) {
            self.general_metadata = self.metadata_file(s, marshaler);
        }
        if let Some(s) = props.text(EXPORT_METADATA_MASK) {
            self.mask_metadata = self.metadata_file(s, marshaler);
        }
        set_flag(props, EXPORT_METADATA_USE_IMAGE, &mut self.use_image_metadata);

        if let Some(s) = props.text(IMPORT_FILE) {
            self.import_file = resolve_uri(s, &self.base_dir);
        }
        set_flag(props, IMPORT_FILESYSTEM, &mut self.import_filesystem);
        set_flag(props, IMPORT_IMAGE_SHOW, &mut self.image_show);
        set_flag(props, IMPORT_METADATA_BINARY, &mut self.metadata_binary);
        set_flag(props, IMPORT_IJ_MODE, &mut self.ij_mode);
        set_flag(props, IMPORT_METADATA_ONLY_FIRST, &mut self.metadata_only_first);
        set_flag(props, IMPORT_METADATA_STRING, &mut self.metadata_string);
        debug!(params = ?self, "applied parameters");
    }

    fn metadata_file<D: TagDictionary>(&self, uri: &str, marshaler: &Marshaler<D>) -> Option<Dataset> {
        let path = resolve_uri(uri, &self.base_dir)?;
        match read_metadata_file(&path, marshaler) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

/// Loads a string property file as a single dataset.
pub fn read_metadata_file<D: TagDictionary>(path: &Path, marshaler: &Marshaler<D>) -> Result<Dataset, ParamError> {
    let props = propfile::read_file(path)?;
    let datasets = marshaler
        .properties_to_datasets(Some(&props), 1, true)
        .map_err(|source| ParamError::Metadata { path: path.to_path_buf(), source })?;
    Ok(datasets.and_then(|d| d.into_iter().next()).unwrap_or_default())
}

/// True if the value starts with `t` or `T`. Empty values are not a flag.
pub fn parse_flag(s: &str) -> Option<bool> {
    s.chars().next().map(|c| c.to_ascii_lowercase() == 't')
}

fn set_flag(props: &PropertyMap, key: &str, flag: &mut bool) {
    if let Some(value) = props.text(key).and_then(parse_flag) {
        *flag = value;
    }
}

/// Turns a file URI into a path.
///
/// `file:` URIs are taken as absolute, anything without a scheme is relative
/// to `base_dir`. Empty strings and other schemes give `None`.
pub fn resolve_uri(uri: &str, base_dir: &Path) -> Option<PathBuf> {
    if uri.is_empty() {
        return None;
    }
    if let Some(rest) = uri.strip_prefix("file:") {
        // file:///abs, file://localhost/abs and file:/abs all name /abs
        let rest = rest
            .strip_prefix("//localhost")
            .or_else(|| rest.strip_prefix("//"))
            .unwrap_or(rest);
        return Some(PathBuf::from(percent_decode(rest)?));
    }
    if has_scheme(uri) {
        return None;
    }
    let relative = percent_decode(uri)?;
    let relative = relative.trim_start_matches('/');
    Some(normalize(&base_dir.join(relative)))
}

fn has_scheme(uri: &str) -> bool {
    match uri.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn percent_decode(s: &str) -> Option<String> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Drops `.` components and folds `..` into the preceding component.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StandardTagDictionary;

    fn marshaler() -> Marshaler<StandardTagDictionary> {
        Marshaler::default()
    }

    #[test]
    fn flags_test_first_character_only() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("T"), Some(true));
        assert_eq!(parse_flag("tuesday"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), Some(false));
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn defaults() {
        let param = DcmieParam::with_base_dir("/work");
        assert_eq!(param.import_file, Some(PathBuf::from("/work")));
        assert_eq!(param.export_file, Some(PathBuf::from("/work")));
        assert!(param.import_filesystem);
        assert!(param.image_show);
        assert!(!param.metadata_string);
        assert!(!param.use_image_metadata);
        assert!(param.general_metadata.is_none());
    }

    #[test]
    fn applies_flags_and_paths() {
        let text = "dcmie.import.ij.metadata.string = true\n\
                    dcmie.import.filesystem = False\n\
                    dcmie.export.metadata.useimage = t\n\
                    dcmie.export.file = out/images\n\
                    dcmie.import.file = file:///data/in\n";
        let mut param = DcmieParam::with_base_dir("/work");
        param.apply(&propfile::load(text.as_bytes()).unwrap(), &marshaler());
        assert!(param.metadata_string);
        assert!(!param.import_filesystem);
        assert!(param.use_image_metadata);
        assert_eq!(param.export_file, Some(PathBuf::from("/work/out/images")));
        assert_eq!(param.import_file, Some(PathBuf::from("/data/in")));
    }

    #[test]
    fn resolves_uris() {
        let base = Path::new("/home/tom");
        assert_eq!(resolve_uri("", base), None);
        assert_eq!(resolve_uri("./a.b", base), Some(PathBuf::from("/home/tom/a.b")));
        assert_eq!(resolve_uri("../x/y.txt", base), Some(PathBuf::from("/home/x/y.txt")));
        assert_eq!(resolve_uri("/abc/foo.txt", base), Some(PathBuf::from("/home/tom/abc/foo.txt")));
        assert_eq!(resolve_uri("file:/etc/dcmie.properties", base), Some(PathBuf::from("/etc/dcmie.properties")));
        assert_eq!(resolve_uri("my%20file.txt", base), Some(PathBuf::from("/home/tom/my file.txt")));
        assert_eq!(resolve_uri("http://example.com/x", base), None);
    }

    #[test]
    fn percent_escapes_in_uris() {
        let base = Path::new("/data");
        assert_eq!(resolve_uri("file:///srv/dicom%20in/%C3%BC.properties", base),
                   Some(PathBuf::from("/srv/dicom in/ü.properties")));
        assert_eq!(resolve_uri("a%2Fb", base), Some(PathBuf::from("/data/a/b")));
        // Invalid UTF-8 after decoding names no path.
        assert_eq!(resolve_uri("bad%FF", base), None);
        // Incomplete escapes stay literal.
        assert_eq!(resolve_uri("50%", base), Some(PathBuf::from("/data/50%")));
    }

    #[test]
    fn missing_parameter_file_keeps_defaults() {
        let param = DcmieParam::from_file(Path::new("/nonexistent/dcmie.properties"), "/work", &marshaler());
        assert_eq!(param, DcmieParam::with_base_dir("/work"));
    }

    #[test]
    fn missing_metadata_file_leaves_dataset_unset() {
        let mut param = DcmieParam::with_base_dir("/nonexistent");
        let props: PropertyMap = [(EXPORT_METADATA_GENERAL, "general.properties")].into_iter().collect();
        param.apply(&props, &marshaler());
        assert!(param.general_metadata.is_none());
    }
}
