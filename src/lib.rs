//! Annoconv: object-detection annotation converter.
//!
//! Annoconv converts between Watson JSON, Pascal VOC XML, Cloud Annotations
//! JSON and MVI exports. Every format decodes into one canonical model
//! ([`ir::ImageAnnotation`]) and encodes from it, and the conversion
//! pipeline pairs any decoder with any encoder.
//!
//! # Modules
//!
//! - [`ir`]: Canonical model, geometry clamping and per-format codecs
//! - [`conversion`]: Format registry, pipeline and run report
//! - [`services`]: File system, identifier and clock collaborators
//! - [`error`]: Error types for annoconv operations

pub mod conversion;
pub mod error;
pub mod ir;
pub mod services;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::warn;

use conversion::{ConvertOptions, Format};
pub use error::AnnoconvError;
use services::Services;

/// The annoconv CLI application.
#[derive(Parser)]
#[command(name = "annoconv")]
#[command(version, about)]
struct Cli {
    /// Format of the source annotations.
    #[arg(long, value_enum)]
    from: CliFormat,

    /// Format to write.
    #[arg(long, value_enum)]
    to: CliFormat,

    /// Directory holding the source annotations.
    #[arg(long, default_value = ".")]
    source: PathBuf,

    /// Directory receiving the converted annotations.
    #[arg(long, default_value = ".")]
    target: PathBuf,

    /// Dataset name (required when converting to mvi).
    #[arg(long, env = "ANNOCONV_DATASET")]
    dataset: Option<String>,

    /// Number of worker threads (default: one per core).
    #[arg(long)]
    jobs: Option<usize>,

    /// Output format for the run report.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

/// Annotation formats accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CliFormat {
    /// IBM Watson JSON, one file per image
    Watson,
    /// Pascal VOC XML, one file per image
    Voc,
    /// Cloud Annotations `_annotations.json` manifest
    Ca,
    /// MVI export (XML per image plus prop.json); target only
    Mvi,
}

impl From<CliFormat> for Format {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Watson => Format::Watson,
            CliFormat::Voc => Format::Voc,
            CliFormat::Ca => Format::Ca,
            CliFormat::Mvi => Format::Mvi,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the annoconv CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
/// Skipped entries do not make the run fail. Callers decide the exit
/// status from [`AnnoconvError::is_fatal`].
pub fn run() -> Result<(), AnnoconvError> {
    let cli = Cli::parse();

    let mut options = ConvertOptions::new(cli.from.into(), cli.to.into(), cli.source, cli.target);
    options.dataset = cli.dataset;
    options.jobs = cli.jobs;

    let conversion = conversion::Registry::with_builtin().build(&options)?;
    prepare_directories(&options.source, &options.target)?;

    let report = conversion.run(&options, &Services::system())?;

    match cli.report {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|source| {
                AnnoconvError::JsonWrite {
                    path: PathBuf::from("<report>"),
                    source,
                }
            })?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }

    Ok(())
}

/// Checks the source directory and makes sure the target directory exists.
fn prepare_directories(source: &Path, target: &Path) -> Result<(), AnnoconvError> {
    if !source.is_dir() {
        return Err(AnnoconvError::InvalidConfig(format!(
            "source '{}' is not a directory",
            source.display()
        )));
    }

    if target.exists() {
        if !target.is_dir() {
            return Err(AnnoconvError::InvalidConfig(format!(
                "target '{}' exists and is not a directory",
                target.display()
            )));
        }
    } else {
        warn!("Target directory {} does not exist; creating it", target.display());
        fs::create_dir_all(target).map_err(|err| {
            AnnoconvError::InvalidConfig(format!(
                "can't create target '{}': {err}",
                target.display()
            ))
        })?;
    }

    Ok(())
}
