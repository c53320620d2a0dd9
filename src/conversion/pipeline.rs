//! Drives a decoder/encoder pair over every entry in the source directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{error, info};
use rayon::prelude::*;

use super::report::{EntryOutcome, RunReport};
use super::{Conversion, ConvertOptions, Decoder, Encoder, OutputFile};
use crate::error::AnnoconvError;
use crate::ir::DecodedImage;
use crate::services::Services;

/// A conversion made of one decoder and one encoder.
///
/// Entries are independent, so they are decoded, encoded and written on a
/// bounded rayon pool. Between encoding and writing, output names are
/// claimed in input order; an image whose output name is already taken is
/// skipped instead of overwriting the earlier file. Results are collected
/// back in input order, which keeps manifest contents deterministic
/// regardless of scheduling.
pub struct Pipeline<D, E> {
    decoder: D,
    encoder: E,
}

type Processed<P> = (EntryOutcome, Option<P>);

/// An encoded image waiting for its output file to be written.
struct Staged<P> {
    entry: PathBuf,
    filename: String,
    file: Option<OutputFile>,
    part: Option<P>,
}

enum Step<P> {
    Staged(Staged<P>),
    Done(Processed<P>),
}

impl<D: Decoder, E: Encoder> Pipeline<D, E> {
    pub fn new(decoder: D, encoder: E) -> Self {
        Self { decoder, encoder }
    }

    fn process_entry(&self, entry: &Path, services: &Services<'_>) -> Vec<Step<E::Part>> {
        let decoded = services
            .files
            .read_text(entry)
            .and_then(|text| self.decoder.decode(entry, &text, services));

        let images = match decoded {
            Ok(images) => images,
            Err(err) => return vec![skip(entry, None, err)],
        };

        images
            .into_iter()
            .map(|image| match image {
                Ok(image) => self.encode_image(entry, image, services),
                Err(err) => skip(entry, None, err),
            })
            .collect()
    }

    fn encode_image(
        &self,
        entry: &Path,
        image: DecodedImage,
        services: &Services<'_>,
    ) -> Step<E::Part> {
        let filename = image.annotation.filename.clone();
        match self.encoder.encode(&image, services) {
            Ok(encoded) => Step::Staged(Staged {
                entry: entry.to_path_buf(),
                filename,
                file: encoded.file,
                part: encoded.part,
            }),
            Err(err) => skip(entry, Some(filename), err),
        }
    }

    fn write_staged(
        &self,
        staged: Staged<E::Part>,
        options: &ConvertOptions,
        services: &Services<'_>,
    ) -> Processed<E::Part> {
        let Staged {
            entry,
            filename,
            file,
            part,
        } = staged;

        let mut outputs = Vec::new();
        if let Some(file) = file {
            let path = options.target.join(&file.file_name);
            if let Err(err) = services.files.write_text(&path, &file.contents) {
                error!("{err}. Skipping it.");
                return (EntryOutcome::skipped(entry, Some(filename), &err), None);
            }
            info!("{} generated", path.display());
            outputs.push(path);
        }

        (EntryOutcome::converted(entry, filename, outputs), part)
    }

    fn write_manifest(
        &self,
        parts: Vec<E::Part>,
        options: &ConvertOptions,
        services: &Services<'_>,
    ) -> Result<Option<PathBuf>, AnnoconvError> {
        let manifest = self
            .encoder
            .finish(parts, services)
            .map_err(|err| AnnoconvError::ManifestWrite {
                path: options.target.clone(),
                message: err.to_string(),
            })?;

        let Some(file) = manifest else {
            return Ok(None);
        };

        let path = options.target.join(&file.file_name);
        services
            .files
            .write_text(&path, &file.contents)
            .map_err(|err| AnnoconvError::ManifestWrite {
                path: path.clone(),
                message: err.to_string(),
            })?;
        info!("{} generated", path.display());
        Ok(Some(path))
    }
}

fn skip<P>(entry: &Path, image: Option<String>, err: AnnoconvError) -> Step<P> {
    error!("{err}. Skipping it.");
    Step::Done((EntryOutcome::skipped(entry, image, &err), None))
}

/// Walks staged images in input order and skips every image whose output
/// file name was already claimed by an earlier one.
fn claim_output_names<P>(steps: Vec<Step<P>>, target: &Path) -> Vec<Step<P>> {
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();

    steps
        .into_iter()
        .map(|step| {
            let staged = match step {
                Step::Staged(staged) => staged,
                done => return done,
            };
            let Some(name) = staged.file.as_ref().map(|file| file.file_name.clone()) else {
                return Step::Staged(staged);
            };

            match claimed.get(&name).cloned() {
                Some(first) => {
                    let err = AnnoconvError::DuplicateOutput {
                        path: target.join(&name),
                        entry: staged.entry.clone(),
                        first,
                    };
                    skip(&staged.entry, Some(staged.filename), err)
                }
                None => {
                    claimed.insert(name, staged.entry.clone());
                    Step::Staged(staged)
                }
            }
        })
        .collect()
}

impl<D: Decoder, E: Encoder> Conversion for Pipeline<D, E> {
    fn run(
        &self,
        options: &ConvertOptions,
        services: &Services<'_>,
    ) -> Result<RunReport, AnnoconvError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs.unwrap_or(0))
            .build()
            .map_err(|err| AnnoconvError::InvalidConfig(format!("can't start worker pool: {err}")))?;

        let entries = services
            .files
            .list_entries(&options.source, self.decoder.extension())?;
        info!("Found {} entries.", entries.len());

        let staged: Vec<Vec<Step<E::Part>>> = pool.install(|| {
            entries
                .par_iter()
                .map(|entry| self.process_entry(entry, services))
                .collect()
        });
        let steps = claim_output_names(staged.into_iter().flatten().collect(), &options.target);

        let processed: Vec<Processed<E::Part>> = pool.install(|| {
            steps
                .into_par_iter()
                .map(|step| match step {
                    Step::Staged(staged) => self.write_staged(staged, options, services),
                    Step::Done(processed) => processed,
                })
                .collect()
        });

        let mut report = RunReport::new(options.from.name(), options.to.name());
        let mut parts = Vec::new();
        for (outcome, part) in processed {
            report.add(outcome);
            parts.extend(part);
        }

        report.manifest = self.write_manifest(parts, options, services)?;

        info!(
            "Converted {} image(s), skipped {}.",
            report.converted_count(),
            report.skipped_count()
        );
        Ok(report)
    }
}
