//! Watson JSON reader and writer.
//!
//! A Watson file describes one image:
//!
//! ```json
//! {
//!   "updated": "2020-12-04T19:03:10.000Z",
//!   "dimensions": { "width": 800, "height": 600 },
//!   "source": { "type": "file", "filename": "img.jpg" },
//!   "created": "2020-12-04T19:03:10.000Z",
//!   "image_id": "img",
//!   "training_data": {
//!     "objects": [
//!       { "object": "cat", "location": { "left": 10, "top": 5, "width": 20, "height": 15 } }
//!     ]
//!   }
//! }
//! ```
//!
//! Boxes are `(left, top, width, height)` in pixels. The reader keeps them
//! exactly as written; the writer clamps them into the image first.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::model::{Detection, Dimensions, ImageAnnotation};
use super::{BBoxXYXY, Pixel};
use crate::error::AnnoconvError;

const WATSON_SOURCE_TYPE: &str = "file";

/// Top-level Watson document, generic over the numeric type of box values.
///
/// Reading accepts any JSON number (`f64`); writing emits whole pixels.
#[derive(Debug, Serialize, Deserialize)]
struct WatsonDocument<N> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<String>,

    dimensions: WatsonDimensions,

    source: WatsonSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<String>,

    image_id: String,

    training_data: WatsonTrainingData<N>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatsonDimensions {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatsonSource {
    #[serde(rename = "type", default = "default_source_type")]
    kind: String,
    filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatsonTrainingData<N> {
    #[serde(default = "Vec::new")]
    objects: Vec<WatsonObject<N>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatsonObject<N> {
    object: String,
    location: WatsonLocation<N>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatsonLocation<N> {
    left: N,
    top: N,
    width: N,
    height: N,
}

fn default_source_type() -> String {
    WATSON_SOURCE_TYPE.to_string()
}

/// Parses a Watson document read from `path`.
///
/// `path` is only used for error messages.
pub fn parse_watson_json(json: &str, path: &Path) -> Result<ImageAnnotation, AnnoconvError> {
    let document: WatsonDocument<f64> =
        serde_json::from_str(json).map_err(|source| AnnoconvError::WatsonJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    let annotation = watson_to_canonical(document);
    annotation.ensure_well_formed(path)?;
    Ok(annotation)
}

/// Reads a Watson document from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_watson_str(json: &str) -> Result<ImageAnnotation, AnnoconvError> {
    parse_watson_json(json, Path::new("<memory>"))
}

/// Reads a Watson document from bytes.
///
/// The input must be valid UTF-8.
pub fn from_watson_slice(bytes: &[u8]) -> Result<ImageAnnotation, AnnoconvError> {
    let json = std::str::from_utf8(bytes).map_err(|source| AnnoconvError::InvalidAnnotation {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_watson_str(json)
}

/// Writes an annotation as a pretty-printed Watson document.
///
/// `now` (ISO 8601) becomes the `updated` timestamp, and the `created`
/// timestamp when the annotation does not already carry one.
pub fn to_watson_string(annotation: &ImageAnnotation, now: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&canonical_to_watson(annotation, now))
}

fn watson_to_canonical(document: WatsonDocument<f64>) -> ImageAnnotation {
    let objects = document
        .training_data
        .objects
        .into_iter()
        .map(|object| {
            let location = object.location;
            Detection::new(
                object.object,
                BBoxXYXY::<Pixel>::from_xywh(
                    location.left,
                    location.top,
                    location.width,
                    location.height,
                ),
            )
        })
        .collect();

    ImageAnnotation {
        image_id: document.image_id,
        filename: document.source.filename,
        dimensions: Dimensions::new(document.dimensions.width, document.dimensions.height),
        created_at: document.created,
        updated_at: document.updated,
        objects,
    }
}

fn canonical_to_watson(annotation: &ImageAnnotation, now: &str) -> WatsonDocument<u32> {
    let dimensions = annotation.dimensions;

    let objects = annotation
        .objects
        .iter()
        .map(|detection| {
            // Clamped values are whole, non-negative and bounded by u32 dimensions.
            let (left, top, width, height) = detection.bbox.clamp_to_image(dimensions).to_xywh();
            WatsonObject {
                object: detection.label.clone(),
                location: WatsonLocation {
                    left: left as u32,
                    top: top as u32,
                    width: width as u32,
                    height: height as u32,
                },
            }
        })
        .collect();

    WatsonDocument {
        updated: Some(now.to_string()),
        dimensions: WatsonDimensions {
            width: dimensions.width,
            height: dimensions.height,
        },
        source: WatsonSource {
            kind: WATSON_SOURCE_TYPE.to_string(),
            filename: annotation.filename.clone(),
        },
        created: Some(
            annotation
                .created_at
                .clone()
                .unwrap_or_else(|| now.to_string()),
        ),
        image_id: annotation.image_id.clone(),
        training_data: WatsonTrainingData { objects },
    }
}
