//! Integration tests for MVI dataset export.

use std::fs;

use annoconv::conversion::{convert, ConvertOptions, Format};
use annoconv::error::AnnoconvError;
use annoconv::services::Services;

const VOC_ENTRY: &str = r#"<annotation>
  <folder>Unspecified</folder>
  <filename>frame.jpg</filename>
  <source><database>frame</database></source>
  <size><width>640</width><height>480</height><dept>3</dept></size>
  <object>
    <name>a/b:c</name>
    <bndbox><xmin>-5</xmin><ymin>10</ymin><xmax>700</xmax><ymax>200</ymax></bndbox>
  </object>
  <object>
    <name>person</name>
    <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
  </object>
</annotation>"#;

#[test]
fn mvi_export_writes_xml_per_image_and_prop_manifest() {
    let source = tempfile::tempdir().expect("create source dir");
    let target = tempfile::tempdir().expect("create target dir");
    fs::write(source.path().join("frame.xml"), VOC_ENTRY).expect("write entry");

    let options = ConvertOptions::new(Format::Voc, Format::Mvi, source.path(), target.path())
        .with_dataset("Hera test");
    let report = convert(&options, &Services::system()).expect("conversion run");
    assert_eq!(report.converted_count(), 1);

    let xml = fs::read_to_string(target.path().join("frame.xml")).expect("read xml");
    assert!(xml.contains("<name>a_b_c</name>"));
    assert!(xml.contains("<name>person</name>"));
    assert!(xml.contains("<generate_type>manual</generate_type>"));
    assert!(xml.contains("<xmin>0</xmin>"));
    assert!(xml.contains("<xmax>640</xmax>"));
    assert!(!xml.contains("<folder>"));
    assert!(!xml.contains("<path>"));
    assert!(!xml.contains("<source>"));

    let prop_path = target.path().join("prop.json");
    assert_eq!(report.manifest.as_deref(), Some(prop_path.as_path()));
    let prop: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&prop_path).expect("read prop")).expect("valid json");
    assert_eq!(prop["name"], "Hera test");
    assert_eq!(prop["usage"], "generic");
    assert_eq!(prop["type"], 0);

    let files: serde_json::Value =
        serde_json::from_str(prop["file_prop_info"].as_str().expect("string-encoded records"))
            .expect("embedded json");
    let record = &files[0];
    assert_eq!(record["original_file_name"], "frame.jpg");
    assert_eq!(record["created_at"], record["uploaded_at"]);

    let file_id = record["_id"].as_str().expect("file id");
    assert_eq!(xml.matches(&format!("<file_id>{file_id}</file_id>")).count(), 2);
    assert_eq!(xml.matches("<_id>").count(), 2);
}

#[test]
fn malformed_entry_is_skipped_and_manifest_lists_the_rest() {
    let source = tempfile::tempdir().expect("create source dir");
    let target = tempfile::tempdir().expect("create target dir");
    fs::write(source.path().join("a.xml"), VOC_ENTRY).expect("write a");
    fs::write(source.path().join("b.xml"), "<annotation><filename>").expect("write b");
    fs::write(
        source.path().join("c.xml"),
        VOC_ENTRY.replace("frame.jpg", "other.jpg"),
    )
    .expect("write c");

    let options = ConvertOptions::new(Format::Voc, Format::Mvi, source.path(), target.path())
        .with_dataset("birds");
    let report = convert(&options, &Services::system()).expect("conversion run");

    assert_eq!(report.converted_count(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert!(!target.path().join("b.xml").exists());

    let prop: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(target.path().join("prop.json")).expect("read prop"),
    )
    .expect("valid json");
    let files: Vec<serde_json::Value> =
        serde_json::from_str(prop["file_prop_info"].as_str().expect("records")).expect("records");
    let names: Vec<_> = files
        .iter()
        .map(|f| f["original_file_name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["frame.jpg", "other.jpg"]);
    assert_ne!(files[0]["_id"], files[1]["_id"]);
}

#[test]
fn missing_dataset_name_fails_before_writing_anything() {
    let source = tempfile::tempdir().expect("create source dir");
    let target = tempfile::tempdir().expect("create target dir");
    fs::write(source.path().join("a.xml"), VOC_ENTRY).expect("write a");

    let options = ConvertOptions::new(Format::Voc, Format::Mvi, source.path(), target.path());
    let err = convert(&options, &Services::system()).unwrap_err();

    assert!(matches!(err, AnnoconvError::MissingDatasetName(_)));
    assert!(fs::read_dir(target.path()).expect("read target").next().is_none());
}
