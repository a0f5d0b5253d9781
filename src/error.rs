//! Error types for the property marshaling layer.

use std::path::PathBuf;
use dicom::core::{Tag, VR};
use thiserror::Error;

/// Raised while building datasets from string properties.
///
/// Any of these aborts the whole conversion, no partial datasets are returned.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The requested dataset array length was zero
    #[error("Dataset dimension must be positive, got {0}")]
    InvalidDimension(usize),

    /// A string property key could not be split into slice number and tag
    #[error("Malformed property key: {0}")]
    MalformedKey(String),

    /// The tag has no entry in the tag dictionary
    #[error("Tag {:04x}{:04x} not defined in dictionary", .0.group(), .0.element())]
    UnknownTag(Tag),

    /// Binary and sequence VRs can't be rebuilt from a flat string
    #[error("Can't process {vr} value of tag {:04x}{:04x}", .tag.group(), .tag.element())]
    UnsupportedVr { tag: Tag, vr: VR },
}

/// Raised while reading a parameter or metadata property file.
#[derive(Error, Debug)]
pub enum ParamError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Syntax error in metadata-properties file {}: {source}", .path.display())]
    Metadata { path: PathBuf, source: ConversionError },
}

/// Raised while importing datasets from DICOM files.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read DICOM file {}: {source}", .path.display())]
    Read { path: PathBuf, source: dicom::object::ReadError },

    #[error("Failed to read DICOM stream: {0}")]
    Stream(#[from] dicom::object::ReadError),

    #[error("Failed to scan directory {}: {source}", .path.display())]
    Scan { path: PathBuf, source: walkdir::Error },
}

pub type Result<T> = std::result::Result<T, ConversionError>;
