//! Canonical annotation model.
//!
//! Every decoder produces [`ImageAnnotation`] values and every encoder
//! consumes them. One value describes one image; it lives only for the
//! duration of a single entry's conversion.

use std::path::Path;

use super::bbox::BBoxXYXY;
use super::space::Pixel;
use crate::error::AnnoconvError;

/// Pixel size of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Creates a new set of dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if both sides are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub(crate) fn as_f64(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }
}

/// A single labelled box.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Object or class name, e.g. "person".
    pub label: String,

    /// Bounding box in pixel space, exactly as decoded.
    pub bbox: BBoxXYXY<Pixel>,
}

impl Detection {
    /// Creates a detection from a label and a pixel-space box.
    pub fn new(label: impl Into<String>, bbox: BBoxXYXY<Pixel>) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }
}

/// All annotations for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAnnotation {
    /// Opaque identifier carried over from the source format.
    pub image_id: String,

    /// Relative path of the annotated image.
    pub filename: String,

    /// Pixel size of the image.
    pub dimensions: Dimensions,

    /// Creation timestamp (ISO 8601), when the source had one.
    pub created_at: Option<String>,

    /// Last update timestamp (ISO 8601), when the source had one.
    pub updated_at: Option<String>,

    /// Detections in source order.
    pub objects: Vec<Detection>,
}

impl ImageAnnotation {
    /// Creates an annotation without detections or timestamps.
    pub fn new(
        image_id: impl Into<String>,
        filename: impl Into<String>,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            filename: filename.into(),
            dimensions,
            created_at: None,
            updated_at: None,
            objects: Vec::new(),
        }
    }

    /// Appends a detection.
    pub fn with_object(mut self, detection: Detection) -> Self {
        self.objects.push(detection);
        self
    }

    /// Returns the base name of `filename` without its extension.
    pub fn filename_stem(&self) -> String {
        file_stem(&self.filename)
    }

    /// Rejects annotations no encoder can represent: zero-sized images and
    /// detections without a label.
    pub(crate) fn ensure_well_formed(&self, path: &Path) -> Result<(), AnnoconvError> {
        if !self.dimensions.is_valid() {
            return Err(AnnoconvError::InvalidAnnotation {
                path: path.to_path_buf(),
                message: format!(
                    "invalid dimensions {}x{} (must be positive)",
                    self.dimensions.width, self.dimensions.height
                ),
            });
        }

        if let Some(idx) = self
            .objects
            .iter()
            .position(|detection| detection.label.trim().is_empty())
        {
            return Err(AnnoconvError::InvalidAnnotation {
                path: path.to_path_buf(),
                message: format!("object {idx} has an empty label"),
            });
        }

        Ok(())
    }
}

/// An annotation together with the stem its output files are named after.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub stem: String,
    pub annotation: ImageAnnotation,
}

pub(crate) fn file_stem(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
