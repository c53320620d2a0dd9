//! Cloud Annotations JSON reader and writer.
//!
//! Unlike Watson and VOC, Cloud Annotations keeps a whole dataset in one
//! manifest (`_annotations.json`):
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "type": "localization",
//!   "labels": ["cat", "dog"],
//!   "annotations": {
//!     "img.jpg": [
//!       { "x": 0.1, "y": 0.2, "x2": 0.4, "y2": 0.5, "id": "...", "label": "cat" }
//!     ]
//!   }
//! }
//! ```
//!
//! Coordinates are fractions of the image size. The manifest does not record
//! image dimensions, so the reader needs them from the caller.

use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use super::model::{file_stem, Detection, Dimensions, ImageAnnotation};
use super::{BBoxXYXY, Normalized};
use crate::error::AnnoconvError;

/// File name of the manifest written by the encoder.
pub const CA_MANIFEST_FILE: &str = "_annotations.json";

const CA_VERSION: &str = "1.0";
const CA_TYPE_LOCALIZATION: &str = "localization";

#[derive(Debug, Serialize, Deserialize)]
struct CaManifest {
    #[serde(default = "default_version")]
    version: String,

    #[serde(rename = "type", default = "default_type")]
    kind: String,

    #[serde(default)]
    labels: Vec<String>,

    annotations: IndexMap<String, Vec<CaBox>>,
}

/// One normalized box in a Cloud Annotations manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaBox {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub label: String,
}

fn default_version() -> String {
    CA_VERSION.to_string()
}

fn default_type() -> String {
    CA_TYPE_LOCALIZATION.to_string()
}

/// The per-image boxes listed by a manifest, before dimensions are known.
#[derive(Clone, Debug, PartialEq)]
pub struct CaImageEntry {
    pub filename: String,
    pub boxes: Vec<CaBox>,
}

impl CaImageEntry {
    /// Builds the canonical annotation once the image size is known.
    ///
    /// The image identifier is the filename stem. Boxes are scaled to pixels,
    /// clamped into the image and rounded.
    pub fn into_annotation(
        self,
        dimensions: Dimensions,
        path: &Path,
    ) -> Result<ImageAnnotation, AnnoconvError> {
        let objects = self
            .boxes
            .into_iter()
            .map(|ca_box| {
                let normalized = BBoxXYXY::<Normalized>::from_xyxy(ca_box.x, ca_box.y, ca_box.x2, ca_box.y2);
                Detection::new(
                    ca_box.label,
                    normalized.to_pixel(dimensions).clamp_to_image(dimensions),
                )
            })
            .collect();

        let annotation = ImageAnnotation {
            image_id: file_stem(&self.filename),
            filename: self.filename,
            dimensions,
            created_at: None,
            updated_at: None,
            objects,
        };
        annotation.ensure_well_formed(path)?;
        Ok(annotation)
    }
}

/// Parses a manifest into its per-image entries, in document order.
pub fn parse_ca_manifest(json: &str, path: &Path) -> Result<Vec<CaImageEntry>, AnnoconvError> {
    let manifest: CaManifest =
        serde_json::from_str(json).map_err(|source| AnnoconvError::CaJsonParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    if manifest.kind != CA_TYPE_LOCALIZATION {
        return Err(AnnoconvError::CaJsonParse {
            path: path.to_path_buf(),
            message: format!(
                "unsupported manifest type '{}' (expected '{CA_TYPE_LOCALIZATION}')",
                manifest.kind
            ),
        });
    }

    Ok(manifest
        .annotations
        .into_iter()
        .map(|(filename, boxes)| CaImageEntry { filename, boxes })
        .collect())
}

/// Converts one annotation into normalized manifest boxes.
///
/// Every box gets a fresh identifier from `new_id`. Ratios are clamped into
/// `[0, 1]` and left unrounded.
pub fn to_ca_boxes(
    annotation: &ImageAnnotation,
    mut new_id: impl FnMut() -> String,
) -> Vec<CaBox> {
    annotation
        .objects
        .iter()
        .map(|detection| {
            let normalized = detection
                .bbox
                .to_normalized(annotation.dimensions)
                .clamp_to_unit();
            CaBox {
                x: normalized.xmin(),
                y: normalized.ymin(),
                x2: normalized.xmax(),
                y2: normalized.ymax(),
                id: Some(new_id()),
                label: detection.label.clone(),
            }
        })
        .collect()
}

/// Accumulates images into a single manifest.
///
/// Labels are kept in first-seen order without duplicates, and images in
/// the order they were added. Adding the same image filename twice replaces
/// the earlier boxes but keeps the earlier position.
#[derive(Debug, Default)]
pub struct CaManifestBuilder {
    labels: Vec<String>,
    annotations: IndexMap<String, Vec<CaBox>>,
}

impl CaManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&mut self, filename: impl Into<String>, boxes: Vec<CaBox>) {
        for ca_box in &boxes {
            if !self.labels.contains(&ca_box.label) {
                self.labels.push(ca_box.label.clone());
            }
        }

        let filename = filename.into();
        if self.annotations.contains_key(&filename) {
            warn!("Image {filename} appears in more than one entry; keeping the last one");
        }
        self.annotations.insert(filename, boxes);
    }

    /// Labels seen so far, in first-seen order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Serializes the manifest as compact JSON.
    pub fn to_json_string(self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&CaManifest {
            version: default_version(),
            kind: default_type(),
            labels: self.labels,
            annotations: self.annotations,
        })
    }
}
