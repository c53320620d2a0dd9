use std::path::PathBuf;
use thiserror::Error;

/// The main error type for annoconv operations.
#[derive(Debug, Error)]
pub enum AnnoconvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't access file {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't write file {path}: {source}")]
    WriteEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output {path} from {entry} was already written for {first}")]
    DuplicateOutput {
        path: PathBuf,
        entry: PathBuf,
        first: PathBuf,
    },

    #[error("Failed to list entries in {path}: {message}")]
    ListEntries { path: PathBuf, message: String },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to parse Watson JSON from {path}: {source}")]
    WatsonJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse VOC XML from {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to parse Cloud Annotations JSON from {path}: {message}")]
    CaJsonParse { path: PathBuf, message: String },

    #[error("Invalid annotation in {path}: {message}")]
    InvalidAnnotation { path: PathBuf, message: String },

    #[error("Failed to serialize {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Can't proceed with '{0}' as both origin and destination format")]
    SameFormat(String),

    #[error("Can't convert from {from} to {to}: case not supported")]
    UnsupportedConversion { from: String, to: String },

    #[error("A non-empty dataset name is required when converting to {0}")]
    MissingDatasetName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write manifest {path}: {message}")]
    ManifestWrite { path: PathBuf, message: String },
}

/// Coarse classification of an [`AnnoconvError`].
///
/// `Config` and `Manifest` errors end a run; `Parse` and `Io` errors only
/// skip the entry they were raised for. An unreadable source directory is a
/// `Config` error since no entry can be processed at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Parse,
    Io,
    Manifest,
}

impl AnnoconvError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnnoconvError::SameFormat(_)
            | AnnoconvError::UnsupportedConversion { .. }
            | AnnoconvError::MissingDatasetName(_)
            | AnnoconvError::InvalidConfig(_)
            | AnnoconvError::ListEntries { .. } => ErrorKind::Config,
            AnnoconvError::WatsonJsonParse { .. }
            | AnnoconvError::VocXmlParse { .. }
            | AnnoconvError::CaJsonParse { .. }
            | AnnoconvError::InvalidAnnotation { .. }
            | AnnoconvError::JsonWrite { .. } => ErrorKind::Parse,
            AnnoconvError::Io(_)
            | AnnoconvError::ReadEntry { .. }
            | AnnoconvError::WriteEntry { .. }
            | AnnoconvError::DuplicateOutput { .. }
            | AnnoconvError::ImageDimensionRead { .. } => ErrorKind::Io,
            AnnoconvError::ManifestWrite { .. } => ErrorKind::Manifest,
        }
    }

    /// Returns true if this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config | ErrorKind::Manifest)
    }
}
