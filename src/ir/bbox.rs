//! Bounding box types in canonical XYXY format.

use super::clamp::clamp_unit_range;
use super::coord::Coord;
use super::{Dimensions, Normalized, Pixel};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter should be either [`Pixel`](super::Pixel) or
/// [`Normalized`](super::Normalized), ensuring type safety across
/// coordinate spaces.
///
/// Decoders store whatever the source file says, including boxes that
/// leave the image or have negative extent. Encoders call the clamping
/// helpers below before anything is serialized.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    /// Creates a new bounding box from min and max coordinates.
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Converts from XYWH format (left, top, width, height).
    ///
    /// This is the layout Watson annotations use.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Converts to XYWH format (left, top, width, height).
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.xmin(), self.ymin(), self.width(), self.height())
    }

    /// Returns the minimum x coordinate.
    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    /// Returns the minimum y coordinate.
    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    /// Returns the maximum x coordinate.
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    /// Returns the maximum y coordinate.
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Returns the width of the bounding box.
    ///
    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Returns the height of the bounding box.
    ///
    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

impl BBoxXYXY<Pixel> {
    /// Converts pixel coordinates to normalized coordinates.
    pub fn to_normalized(&self, dimensions: Dimensions) -> BBoxXYXY<Normalized> {
        let (w, h) = dimensions.as_f64();
        BBoxXYXY::from_xyxy(
            self.min.x / w,
            self.min.y / h,
            self.max.x / w,
            self.max.y / h,
        )
    }

    /// Clamps every corner into the image and rounds to whole pixels.
    ///
    /// A corner that ends up left of (or above) the opposite corner is pulled
    /// onto it, so `width()`/`height()` of the result are never negative and
    /// `xmax() <= dimensions.width` always holds.
    pub fn clamp_to_image(&self, dimensions: Dimensions) -> Self {
        let (w, h) = dimensions.as_f64();
        let xmin = clamp_unit_range(self.min.x, w, true);
        let ymin = clamp_unit_range(self.min.y, h, true);
        let xmax = clamp_unit_range(self.max.x, w, true).max(xmin);
        let ymax = clamp_unit_range(self.max.y, h, true).max(ymin);
        Self::from_xyxy(xmin, ymin, xmax, ymax)
    }
}

impl BBoxXYXY<Normalized> {
    /// Converts normalized coordinates to pixel coordinates.
    pub fn to_pixel(&self, dimensions: Dimensions) -> BBoxXYXY<Pixel> {
        let (w, h) = dimensions.as_f64();
        BBoxXYXY::from_xyxy(
            self.min.x * w,
            self.min.y * h,
            self.max.x * w,
            self.max.y * h,
        )
    }

    /// Clamps every value into `[0, 1]` without rounding.
    pub fn clamp_to_unit(&self) -> Self {
        Self::from_xyxy(
            clamp_unit_range(self.min.x, 1.0, false),
            clamp_unit_range(self.min.y, 1.0, false),
            clamp_unit_range(self.max.x, 1.0, false),
            clamp_unit_range(self.max.y, 1.0, false),
        )
    }
}
