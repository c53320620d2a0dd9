//! Canonical annotation model and per-format codecs.
//!
//! Every supported format decodes into [`ImageAnnotation`] and encodes from
//! it, so N formats need N readers and N writers rather than N×N converters.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: Pixel and normalized boxes are different types
//!    ([`BBoxXYXY<Pixel>`] vs [`BBoxXYXY<Normalized>`]); converting between
//!    them needs the image [`Dimensions`].
//!
//! 2. **Canonical Format**: Detections are stored as XYXY in pixel space,
//!    whatever layout the source used.
//!
//! 3. **Clamp on Write**: Decoders keep what the file says (VOC and Cloud
//!    Annotations clamp on read as well); every encoder clamps into the image
//!    before serializing.
//!
//! # Example
//!
//! ```
//! use annoconv::ir::{BBoxXYXY, Detection, Dimensions, ImageAnnotation, Pixel};
//!
//! let annotation = ImageAnnotation::new("img-1", "image.jpg", Dimensions::new(640, 480))
//!     .with_object(Detection::new(
//!         "person",
//!         BBoxXYXY::<Pixel>::from_xywh(10.0, 20.0, 90.0, 180.0),
//!     ));
//! assert_eq!(annotation.objects[0].bbox.xmax(), 100.0);
//! ```

mod bbox;
mod clamp;
mod coord;
pub mod io_ca_json;
pub mod io_mvi_xml;
pub mod io_voc_xml;
pub mod io_watson_json;
mod model;
mod space;
mod xml;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use clamp::{clamp, clamp_unit_range};
pub use coord::Coord;
pub use model::{DecodedImage, Detection, Dimensions, ImageAnnotation};
pub use space::{Normalized, Pixel};

pub(crate) use model::file_stem;
