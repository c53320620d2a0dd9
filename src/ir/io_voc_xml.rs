//! Pascal VOC XML reader and writer.
//!
//! One XML file describes one image. Boxes are stored as
//! `(xmin, ymin, xmax, ymax)` in pixels. The reader clamps every box into
//! the image; the writer clamps again before emitting.
//!
//! `<source><database>` carries the opaque image identifier. Files without
//! it fall back to the image filename stem.

use std::path::{Path, PathBuf};

use super::model::{file_stem, Detection, Dimensions, ImageAnnotation};
use super::xml::{
    child_element, child_elements, optional_child_text, parse_document, parse_required_f64,
    parse_required_u32, required_child_element, required_child_text, XmlWriter,
};
use super::{BBoxXYXY, Pixel};
use crate::error::AnnoconvError;

/// Placeholder written where VOC requires a value this system has no data for.
pub(crate) const UNSPECIFIED: &str = "Unspecified";

/// Colour channels written to `<size><dept>`.
pub(crate) const IMAGE_DEPTH: u32 = 3;

/// Parses a VOC document read from `path`.
///
/// `path` is only used for error messages.
pub fn parse_voc_xml(xml: &str, path: &Path) -> Result<ImageAnnotation, AnnoconvError> {
    let document = parse_document(xml, path)?;

    let root = document.root_element();
    if root.tag_name().name() != "annotation" {
        return Err(AnnoconvError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = required_child_text(root, "filename", path, "<annotation>")?;

    let size = required_child_element(root, "size", path, "<annotation>")?;
    let dimensions = Dimensions::new(
        parse_required_u32(size, "width", path, "<size>")?,
        parse_required_u32(size, "height", path, "<size>")?,
    );

    let image_id = child_element(root, "source")
        .and_then(|source| optional_child_text(source, "database"))
        .unwrap_or_else(|| file_stem(&filename));

    let mut objects = Vec::new();
    for object in child_elements(root, "object") {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let bbox = BBoxXYXY::<Pixel>::from_xyxy(
            parse_required_f64(bndbox, "xmin", path, "<bndbox>")?,
            parse_required_f64(bndbox, "ymin", path, "<bndbox>")?,
            parse_required_f64(bndbox, "xmax", path, "<bndbox>")?,
            parse_required_f64(bndbox, "ymax", path, "<bndbox>")?,
        );

        objects.push(Detection::new(name, bbox.clamp_to_image(dimensions)));
    }

    let annotation = ImageAnnotation {
        image_id,
        filename,
        dimensions,
        created_at: None,
        updated_at: None,
        objects,
    };
    annotation.ensure_well_formed(path)?;
    Ok(annotation)
}

/// Parse VOC XML from a UTF-8 string.
///
/// This helper is primarily useful for testing/fuzzing parse behavior in-memory.
pub fn from_voc_xml_str(xml: &str) -> Result<ImageAnnotation, AnnoconvError> {
    parse_voc_xml(xml, Path::new("<memory>"))
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<ImageAnnotation, AnnoconvError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| AnnoconvError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml)
}

/// Render an annotation as a VOC document.
///
/// `source_dir` is joined with the image filename to fill `<path>`.
pub fn to_voc_xml_string(annotation: &ImageAnnotation, source_dir: &Path) -> String {
    let dimensions = annotation.dimensions;
    let image_path = source_dir.join(&annotation.filename);

    let mut xml = XmlWriter::new();
    xml.open("annotation")
        .leaf("folder", UNSPECIFIED)
        .leaf("filename", &annotation.filename)
        .leaf("path", image_path.display());

    xml.open("source")
        .leaf("database", &annotation.image_id)
        .close("source");

    write_size(&mut xml, dimensions);
    xml.leaf("segmented", 0);

    for detection in &annotation.objects {
        xml.open("object")
            .leaf("name", &detection.label)
            .leaf("pose", UNSPECIFIED)
            .leaf("truncated", 0)
            .leaf("difficult", 0);
        write_bndbox(&mut xml, &detection.bbox.clamp_to_image(dimensions));
        xml.close("object");
    }

    xml.close("annotation");
    xml.finish()
}

pub(crate) fn write_size(xml: &mut XmlWriter, dimensions: Dimensions) {
    xml.open("size")
        .leaf("width", dimensions.width)
        .leaf("height", dimensions.height)
        .leaf("dept", IMAGE_DEPTH)
        .close("size");
}

/// Writes `<bndbox>` for a box that has already been clamped.
pub(crate) fn write_bndbox(xml: &mut XmlWriter, bbox: &BBoxXYXY<Pixel>) {
    xml.open("bndbox")
        .leaf("xmin", bbox.xmin())
        .leaf("ymin", bbox.ymin())
        .leaf("xmax", bbox.xmax())
        .leaf("ymax", bbox.ymax())
        .close("bndbox");
}
