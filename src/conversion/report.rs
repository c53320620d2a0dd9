//! Per-run report of what was converted and what was skipped.
//!
//! Skipped entries never fail a run; the report is how callers find out
//! about them after the fact.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{AnnoconvError, ErrorKind};

/// Summary of one conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    /// Source format name.
    pub from: String,
    /// Target format name.
    pub to: String,
    /// One outcome per decoded image (or per entry that failed before
    /// yielding any image), in input order.
    pub outcomes: Vec<EntryOutcome>,
    /// Manifest written at the end of the run, if the format has one.
    pub manifest: Option<PathBuf>,
}

impl RunReport {
    /// Create a new empty report for a conversion between formats.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    /// Add an outcome to the report.
    pub fn add(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of images that produced output.
    pub fn converted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_converted())
            .count()
    }

    /// Number of entries or images that were skipped.
    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.converted_count()
    }

    /// Iterate over skipped outcomes.
    pub fn skipped(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_converted())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {}: {} converted, {} skipped",
            self.from,
            self.to,
            self.converted_count(),
            self.skipped_count()
        )?;

        if let Some(manifest) = &self.manifest {
            writeln!(f, "  manifest: {}", manifest.display())?;
        }

        let skipped_count = self.skipped_count();
        if skipped_count > 0 {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", skipped_count)?;
            for outcome in self.skipped() {
                if let OutcomeStatus::Skipped { message, .. } = &outcome.status {
                    writeln!(f, "  - {}", message)?;
                }
            }
        }

        Ok(())
    }
}

/// What happened to one image or entry.
#[derive(Clone, Debug, Serialize)]
pub struct EntryOutcome {
    /// The source entry the image came from.
    pub source: PathBuf,
    /// Image filename, when decoding got that far.
    pub image: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl EntryOutcome {
    /// An image that was written out. `outputs` may be empty for
    /// manifest-only formats.
    pub fn converted(source: impl Into<PathBuf>, image: impl Into<String>, outputs: Vec<PathBuf>) -> Self {
        Self {
            source: source.into(),
            image: Some(image.into()),
            status: OutcomeStatus::Converted { outputs },
        }
    }

    /// An entry or image dropped because of `error`.
    pub fn skipped(source: impl Into<PathBuf>, image: Option<String>, error: &AnnoconvError) -> Self {
        Self {
            source: source.into(),
            image,
            status: OutcomeStatus::Skipped {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    /// True if the image produced output.
    pub fn is_converted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Converted { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Converted { outputs: Vec<PathBuf> },
    Skipped { kind: ErrorKind, message: String },
}
