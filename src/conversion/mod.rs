//! Conversion between annotation formats.
//!
//! A conversion run is a [`Decoder`] for the source format paired with an
//! [`Encoder`] for the destination format. The [`Registry`] maps each
//! `(from, to)` pair to a factory building that pairing, and the
//! [`Pipeline`](pipeline::Pipeline) drives it over every source entry.
//!
//! Run states: validate config, enumerate entries, decode/encode/write each
//! entry (in parallel), then, for manifest formats, aggregate and write the
//! manifest once every entry is done.

mod codecs;
mod pipeline;
mod registry;
pub mod report;

pub use codecs::{CaCodec, MviEncoder, VocCodec, WatsonCodec};
pub use pipeline::Pipeline;
pub use registry::{ConverterFactory, Registry};
pub use report::{EntryOutcome, OutcomeStatus, RunReport};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::AnnoconvError;
use crate::ir::DecodedImage;
use crate::services::Services;

/// Annotation formats known to annoconv.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Watson,
    Voc,
    Ca,
    Mvi,
}

impl Format {
    /// Human-readable name for the format.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Watson => "watson",
            Format::Voc => "voc",
            Format::Ca => "ca",
            Format::Mvi => "mvi",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for one conversion run.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub from: Format,
    pub to: Format,
    /// Directory holding the source entries.
    pub source: PathBuf,
    /// Directory receiving the output. Must exist before the run starts.
    pub target: PathBuf,
    /// Dataset name; required when converting to MVI.
    pub dataset: Option<String>,
    /// Worker threads; `None` lets rayon decide.
    pub jobs: Option<usize>,
}

impl ConvertOptions {
    pub fn new(
        from: Format,
        to: Format,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            from,
            to,
            source: source.into(),
            target: target.into(),
            dataset: None,
            jobs: None,
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
}

/// Built from [`ConvertOptions`] before any entry is read, so configuration
/// problems surface up front.
pub trait FromOptions: Sized {
    fn from_options(options: &ConvertOptions) -> Result<Self, AnnoconvError>;
}

/// Result of decoding one image out of an entry.
pub type ImageResult = Result<DecodedImage, AnnoconvError>;

/// Reads one source format.
pub trait Decoder: Send + Sync {
    /// File extension of the entries this decoder reads.
    fn extension(&self) -> &'static str;

    /// Decodes the entry at `path`, whose contents are `text`.
    ///
    /// An entry may describe several images. The outer error rejects the
    /// whole entry; inner errors reject single images.
    fn decode(
        &self,
        path: &Path,
        text: &str,
        services: &Services<'_>,
    ) -> Result<Vec<ImageResult>, AnnoconvError>;
}

/// A file an encoder wants written into the target directory.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputFile {
    pub file_name: String,
    pub contents: String,
}

/// What an encoder produced for one image.
#[derive(Debug)]
pub struct Encoded<P> {
    /// Per-image file, if the format has one.
    pub file: Option<OutputFile>,
    /// Contribution to the run manifest, if the format has one.
    pub part: Option<P>,
}

/// Writes one destination format.
pub trait Encoder: Send + Sync {
    /// Per-image contribution gathered for the manifest.
    type Part: Send;

    fn encode(
        &self,
        image: &DecodedImage,
        services: &Services<'_>,
    ) -> Result<Encoded<Self::Part>, AnnoconvError>;

    /// Builds the run manifest from every successful image's part, in input
    /// order. Called once, after all entries are done.
    fn finish(
        &self,
        parts: Vec<Self::Part>,
        services: &Services<'_>,
    ) -> Result<Option<OutputFile>, AnnoconvError>;
}

/// A ready-to-run conversion, type-erased so the registry can hold any
/// decoder/encoder pairing.
pub trait Conversion: Send + Sync {
    fn run(
        &self,
        options: &ConvertOptions,
        services: &Services<'_>,
    ) -> Result<RunReport, AnnoconvError>;
}

/// Converts `options.source` into `options.target` using the built-in
/// registry.
///
/// Configuration errors are returned before any entry is read. Per-entry
/// failures are logged and recorded in the report; they do not fail the run.
pub fn convert(
    options: &ConvertOptions,
    services: &Services<'_>,
) -> Result<RunReport, AnnoconvError> {
    Registry::with_builtin().build(options)?.run(options, services)
}
