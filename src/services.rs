//! Narrow collaborators the conversion core depends on.
//!
//! Codecs and the pipeline never touch the file system, the clock or the
//! random number generator directly. They go through [`Services`], which
//! bundles a [`FileStore`], an [`IdSource`] and a [`Clock`]. The defaults
//! talk to the real machine; tests swap in deterministic ones.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use walkdir::WalkDir;

use crate::error::AnnoconvError;
use crate::ir::Dimensions;

/// File-system access used by the pipeline and the Cloud Annotations decoder.
pub trait FileStore: Sync {
    /// Lists regular files directly inside `dir` whose extension matches
    /// `extension` (case-insensitive), sorted by file name.
    fn list_entries(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AnnoconvError>;

    /// Reads a UTF-8 text file.
    fn read_text(&self, path: &Path) -> Result<String, AnnoconvError>;

    /// Writes a text file. The parent directory must already exist.
    fn write_text(&self, path: &Path, text: &str) -> Result<(), AnnoconvError>;

    /// Probes the pixel size of an image file.
    fn image_dimensions(&self, path: &Path) -> Result<Dimensions, AnnoconvError>;
}

/// Source of globally unique identifiers.
pub trait IdSource: Sync {
    fn new_uuid(&self) -> String;
}

/// Source of the current time.
pub trait Clock: Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl FileStore for LocalFs {
    fn list_entries(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AnnoconvError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| AnnoconvError::ListEntries {
                path: dir.to_path_buf(),
                message: source.to_string(),
            })?;

            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                entries.push(entry.into_path());
            }
        }

        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> Result<String, AnnoconvError> {
        fs::read_to_string(path).map_err(|source| AnnoconvError::ReadEntry {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), AnnoconvError> {
        fs::write(path, text).map_err(|source| AnnoconvError::WriteEntry {
            path: path.to_path_buf(),
            source,
        })
    }

    fn image_dimensions(&self, path: &Path) -> Result<Dimensions, AnnoconvError> {
        let size = imagesize::size(path).map_err(|source| AnnoconvError::ImageDimensionRead {
            path: path.to_path_buf(),
            source,
        })?;

        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| AnnoconvError::InvalidAnnotation {
                path: path.to_path_buf(),
                message: format!("image width {} does not fit in u32", size.width),
            })?;

        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| AnnoconvError::InvalidAnnotation {
                path: path.to_path_buf(),
                message: format!("image height {} does not fit in u32", size.height),
            })?;

        Ok(Dimensions::new(width, height))
    }
}

/// Random (v4) UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomUuid;

impl IdSource for RandomUuid {
    fn new_uuid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bundle of collaborators handed to every codec call.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub files: &'a dyn FileStore,
    pub ids: &'a dyn IdSource,
    pub clock: &'a dyn Clock,
}

impl Services<'static> {
    /// Services backed by the local machine.
    pub fn system() -> Self {
        Services {
            files: &LocalFs,
            ids: &RandomUuid,
            clock: &SystemClock,
        }
    }
}

impl Services<'_> {
    /// Current time as an ISO 8601 string with millisecond precision.
    pub fn now_iso8601(&self) -> String {
        self.clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Current time as milliseconds since the Unix epoch.
    pub fn now_epoch_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
