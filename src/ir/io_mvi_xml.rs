//! MVI export writer.
//!
//! An MVI dataset is one VOC-like XML file per image plus a `prop.json`
//! manifest listing every image. Each image gets a fresh `file_id`; each
//! object gets its own `_id`. Nothing is carried over between runs.

use serde::Serialize;

use super::io_voc_xml::{write_bndbox, write_size};
use super::model::ImageAnnotation;
use super::xml::XmlWriter;

/// File name of the dataset manifest.
pub const MVI_PROP_FILE: &str = "prop.json";

const MVI_USAGE: &str = "generic";
// The service expects this exact spelling.
const MVI_PROP_VERSION: &str = "PROP_VESION_1";
const MVI_GENERATE_TYPE: &str = "manual";
const MVI_EMPTY_LIST: &str = "[]";

/// Characters MVI tooling cannot handle in label names.
const UNSAFE_LABEL_CHARS: &[char] = &[
    '-', '"', '/', '\\', '|', '[', ']', '{', '}', '(', ')', ';', ':', ',',
];

/// Replaces every character MVI cannot handle with `_`.
///
/// ```
/// use annoconv::ir::io_mvi_xml::sanitize_label;
///
/// assert_eq!(sanitize_label("a/b:c"), "a_b_c");
/// ```
pub fn sanitize_label(label: &str) -> String {
    label.replace(UNSAFE_LABEL_CHARS, "_")
}

/// Render one image as an MVI XML document.
///
/// `file_id` is the image's identifier, shared by all of its objects;
/// `new_id` mints the per-object `_id`. The image filename is not part of
/// the document; `prop.json` carries it as `original_file_name`.
pub fn to_mvi_xml_string(
    annotation: &ImageAnnotation,
    file_id: &str,
    mut new_id: impl FnMut() -> String,
) -> String {
    let dimensions = annotation.dimensions;

    let mut xml = XmlWriter::new();
    xml.open("annotation");
    write_size(&mut xml, dimensions);
    xml.leaf("segmented", 0);

    for detection in &annotation.objects {
        xml.open("object")
            .leaf("_id", new_id())
            .leaf("file_id", file_id)
            .leaf("name", sanitize_label(&detection.label))
            .leaf("generate_type", MVI_GENERATE_TYPE);
        write_bndbox(&mut xml, &detection.bbox.clamp_to_image(dimensions));
        xml.close("object");
    }

    xml.close("annotation");
    xml.finish()
}

/// One image record inside `prop.json`'s `file_prop_info`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MviFileRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub file_type: &'static str,
    pub parent_id: Option<String>,
    pub generate_type: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub created_at: i64,
    pub label_type: &'static str,
    pub original_file_name: String,
    pub upload_type: &'static str,
    pub uploaded_at: i64,
}

impl MviFileRecord {
    /// Creates a record for an image written at `written_at_ms` (epoch millis).
    pub fn new(file_id: impl Into<String>, original_file_name: impl Into<String>, written_at_ms: i64) -> Self {
        Self {
            id: file_id.into(),
            file_type: "image",
            parent_id: None,
            generate_type: None,
            category_id: None,
            category_name: None,
            created_at: written_at_ms,
            label_type: "manual",
            original_file_name: original_file_name.into(),
            upload_type: "file_upload",
            uploaded_at: written_at_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct MviProp<'a> {
    usage: &'static str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    scenario: &'static str,
    prop_version: &'static str,
    pre_process: &'static str,
    category_prop_info: &'static str,
    action_prop_info: &'static str,
    /// JSON array of [`MviFileRecord`], stored as a string.
    file_prop_info: String,
}

/// Serializes the `prop.json` manifest for a dataset.
pub fn to_mvi_prop_string(
    dataset_name: &str,
    records: &[MviFileRecord],
) -> Result<String, serde_json::Error> {
    let prop = MviProp {
        usage: MVI_USAGE,
        name: dataset_name,
        kind: 0,
        scenario: "",
        prop_version: MVI_PROP_VERSION,
        pre_process: "",
        category_prop_info: MVI_EMPTY_LIST,
        action_prop_info: MVI_EMPTY_LIST,
        file_prop_info: serde_json::to_string(records)?,
    };
    serde_json::to_string(&prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, Detection, Dimensions};

    #[test]
    fn sanitize_replaces_every_unsafe_character() {
        assert_eq!(sanitize_label("a/b:c"), "a_b_c");
        assert_eq!(
            sanitize_label(r#"-"/\|[]{}();:,"#),
            "______________"
        );
        assert_eq!(sanitize_label("plain label"), "plain label");
    }

    #[test]
    fn xml_carries_ids_sanitized_names_and_clamped_boxes() {
        let annotation = ImageAnnotation::new("img", "img.jpg", Dimensions::new(100, 50))
            .with_object(Detection::new("a/b:c", BBoxXYXY::from_xywh(-3.0, 5.0, 20.0, 60.0)))
            .with_object(Detection::new("dog", BBoxXYXY::from_xywh(1.0, 1.0, 2.0, 2.0)));

        let mut n = 0;
        let xml = to_mvi_xml_string(&annotation, "file-1", || {
            n += 1;
            format!("obj-{n}")
        });

        assert!(xml.contains("<_id>obj-1</_id>"));
        assert!(xml.contains("<_id>obj-2</_id>"));
        assert_eq!(xml.matches("<file_id>file-1</file_id>").count(), 2);
        assert!(xml.contains("<name>a_b_c</name>"));
        assert!(xml.contains("<generate_type>manual</generate_type>"));
        assert!(xml.contains("<xmin>0</xmin>"));
        assert!(xml.contains("<xmax>17</xmax>"));
        assert!(xml.contains("<ymax>50</ymax>"));
        assert!(!xml.contains("<filename>"));
        assert!(!xml.contains("<folder>"));
        assert!(!xml.contains("<path>"));
        assert!(!xml.contains("<source>"));
    }

    #[test]
    fn prop_json_embeds_records_as_a_string() {
        let records = vec![MviFileRecord::new("file-1", "img.jpg", 1_607_108_590_660)];
        let json = to_mvi_prop_string("Hera test", &records).expect("serialize prop");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["usage"], "generic");
        assert_eq!(value["name"], "Hera test");
        assert_eq!(value["type"], 0);
        assert_eq!(value["scenario"], "");
        assert_eq!(value["pre_process"], "");
        assert_eq!(value["prop_version"], "PROP_VESION_1");
        assert_eq!(value["category_prop_info"], "[]");
        assert_eq!(value["action_prop_info"], "[]");

        let files: serde_json::Value =
            serde_json::from_str(value["file_prop_info"].as_str().expect("string field"))
                .expect("embedded json");
        assert_eq!(files[0]["_id"], "file-1");
        assert_eq!(files[0]["file_type"], "image");
        assert!(files[0]["parent_id"].is_null());
        assert!(files[0]["category_name"].is_null());
        assert_eq!(files[0]["label_type"], "manual");
        assert_eq!(files[0]["upload_type"], "file_upload");
        assert_eq!(files[0]["original_file_name"], "img.jpg");
        assert_eq!(files[0]["created_at"], 1_607_108_590_660i64);
        assert_eq!(files[0]["uploaded_at"], files[0]["created_at"]);
    }
}
