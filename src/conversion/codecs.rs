//! Decoder and encoder implementations for each format.

use std::path::{Path, PathBuf};

use super::{ConvertOptions, Decoder, Encoded, Encoder, Format, FromOptions, ImageResult, OutputFile};
use crate::error::AnnoconvError;
use crate::ir::io_ca_json::{parse_ca_manifest, to_ca_boxes, CaBox, CaManifestBuilder, CA_MANIFEST_FILE};
use crate::ir::io_mvi_xml::{to_mvi_prop_string, to_mvi_xml_string, MviFileRecord, MVI_PROP_FILE};
use crate::ir::io_voc_xml::{parse_voc_xml, to_voc_xml_string};
use crate::ir::io_watson_json::{parse_watson_json, to_watson_string};
use crate::ir::{file_stem, DecodedImage};
use crate::services::Services;

/// Watson JSON: one `.json` file per image.
#[derive(Clone, Copy, Debug, Default)]
pub struct WatsonCodec;

impl FromOptions for WatsonCodec {
    fn from_options(_options: &ConvertOptions) -> Result<Self, AnnoconvError> {
        Ok(Self)
    }
}

impl Decoder for WatsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn decode(
        &self,
        path: &Path,
        text: &str,
        _services: &Services<'_>,
    ) -> Result<Vec<ImageResult>, AnnoconvError> {
        let annotation = parse_watson_json(text, path)?;
        Ok(vec![Ok(DecodedImage {
            stem: file_stem(path),
            annotation,
        })])
    }
}

impl Encoder for WatsonCodec {
    type Part = ();

    fn encode(
        &self,
        image: &DecodedImage,
        services: &Services<'_>,
    ) -> Result<Encoded<()>, AnnoconvError> {
        let file_name = format!("{}.json", image.stem);
        let contents = to_watson_string(&image.annotation, &services.now_iso8601()).map_err(
            |source| AnnoconvError::JsonWrite {
                path: PathBuf::from(&file_name),
                source,
            },
        )?;

        Ok(Encoded {
            file: Some(OutputFile { file_name, contents }),
            part: None,
        })
    }

    fn finish(
        &self,
        _parts: Vec<()>,
        _services: &Services<'_>,
    ) -> Result<Option<OutputFile>, AnnoconvError> {
        Ok(None)
    }
}

/// Pascal VOC XML: one `.xml` file per image.
///
/// The encoder fills `<path>` from the run's source directory.
#[derive(Clone, Debug, Default)]
pub struct VocCodec {
    source_dir: PathBuf,
}

impl VocCodec {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }
}

impl FromOptions for VocCodec {
    fn from_options(options: &ConvertOptions) -> Result<Self, AnnoconvError> {
        Ok(Self::new(&options.source))
    }
}

impl Decoder for VocCodec {
    fn extension(&self) -> &'static str {
        "xml"
    }

    fn decode(
        &self,
        path: &Path,
        text: &str,
        _services: &Services<'_>,
    ) -> Result<Vec<ImageResult>, AnnoconvError> {
        let annotation = parse_voc_xml(text, path)?;
        Ok(vec![Ok(DecodedImage {
            stem: file_stem(path),
            annotation,
        })])
    }
}

impl Encoder for VocCodec {
    type Part = ();

    fn encode(
        &self,
        image: &DecodedImage,
        _services: &Services<'_>,
    ) -> Result<Encoded<()>, AnnoconvError> {
        Ok(Encoded {
            file: Some(OutputFile {
                file_name: format!("{}.xml", image.stem),
                contents: to_voc_xml_string(&image.annotation, &self.source_dir),
            }),
            part: None,
        })
    }

    fn finish(
        &self,
        _parts: Vec<()>,
        _services: &Services<'_>,
    ) -> Result<Option<OutputFile>, AnnoconvError> {
        Ok(None)
    }
}

/// Cloud Annotations: one `_annotations.json` manifest per dataset.
///
/// The manifest lacks image sizes, so the decoder probes each image, which
/// must sit next to the manifest.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaCodec;

impl FromOptions for CaCodec {
    fn from_options(_options: &ConvertOptions) -> Result<Self, AnnoconvError> {
        Ok(Self)
    }
}

impl Decoder for CaCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn decode(
        &self,
        path: &Path,
        text: &str,
        services: &Services<'_>,
    ) -> Result<Vec<ImageResult>, AnnoconvError> {
        let entries = parse_ca_manifest(text, path)?;
        let image_dir = path.parent().unwrap_or_else(|| Path::new(""));

        Ok(entries
            .into_iter()
            .map(|entry| -> ImageResult {
                let dimensions = services
                    .files
                    .image_dimensions(&image_dir.join(&entry.filename))?;
                let annotation = entry.into_annotation(dimensions, path)?;
                Ok(DecodedImage {
                    stem: annotation.filename_stem(),
                    annotation,
                })
            })
            .collect())
    }
}

impl Encoder for CaCodec {
    type Part = (String, Vec<CaBox>);

    fn encode(
        &self,
        image: &DecodedImage,
        services: &Services<'_>,
    ) -> Result<Encoded<Self::Part>, AnnoconvError> {
        let boxes = to_ca_boxes(&image.annotation, || services.ids.new_uuid());
        Ok(Encoded {
            file: None,
            part: Some((image.annotation.filename.clone(), boxes)),
        })
    }

    fn finish(
        &self,
        parts: Vec<Self::Part>,
        _services: &Services<'_>,
    ) -> Result<Option<OutputFile>, AnnoconvError> {
        let mut builder = CaManifestBuilder::new();
        for (filename, boxes) in parts {
            builder.add_image(filename, boxes);
        }

        let contents = builder
            .to_json_string()
            .map_err(|source| AnnoconvError::JsonWrite {
                path: PathBuf::from(CA_MANIFEST_FILE),
                source,
            })?;

        Ok(Some(OutputFile {
            file_name: CA_MANIFEST_FILE.to_string(),
            contents,
        }))
    }
}

/// MVI export: one XML file per image plus a `prop.json` manifest.
#[derive(Clone, Debug)]
pub struct MviEncoder {
    dataset: String,
}

impl MviEncoder {
    /// Fails unless `dataset` has visible characters.
    pub fn new(dataset: impl Into<String>) -> Result<Self, AnnoconvError> {
        let dataset = dataset.into();
        if dataset.trim().is_empty() {
            return Err(AnnoconvError::MissingDatasetName(Format::Mvi.to_string()));
        }
        Ok(Self { dataset })
    }
}

impl FromOptions for MviEncoder {
    fn from_options(options: &ConvertOptions) -> Result<Self, AnnoconvError> {
        match &options.dataset {
            Some(dataset) => Self::new(dataset.as_str()),
            None => Err(AnnoconvError::MissingDatasetName(Format::Mvi.to_string())),
        }
    }
}

impl Encoder for MviEncoder {
    type Part = MviFileRecord;

    fn encode(
        &self,
        image: &DecodedImage,
        services: &Services<'_>,
    ) -> Result<Encoded<MviFileRecord>, AnnoconvError> {
        let file_id = services.ids.new_uuid();
        let contents = to_mvi_xml_string(&image.annotation, &file_id, || services.ids.new_uuid());
        let record = MviFileRecord::new(
            file_id,
            image.annotation.filename.clone(),
            services.now_epoch_millis(),
        );

        Ok(Encoded {
            file: Some(OutputFile {
                file_name: format!("{}.xml", image.stem),
                contents,
            }),
            part: Some(record),
        })
    }

    fn finish(
        &self,
        parts: Vec<MviFileRecord>,
        _services: &Services<'_>,
    ) -> Result<Option<OutputFile>, AnnoconvError> {
        let contents =
            to_mvi_prop_string(&self.dataset, &parts).map_err(|source| AnnoconvError::JsonWrite {
                path: PathBuf::from(MVI_PROP_FILE),
                source,
            })?;

        Ok(Some(OutputFile {
            file_name: MVI_PROP_FILE.to_string(),
            contents,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, Detection, Dimensions, ImageAnnotation};
    use crate::services::testing::{FixedClock, SequentialIds};
    use crate::services::LocalFs;

    const WATSON: &str = r#"{
        "dimensions": {"width": 800, "height": 600},
        "source": {"type": "file", "filename": "img.jpg"},
        "image_id": "abc",
        "training_data": {"objects": [
            {"object": "cat", "location": {"left": 10, "top": 5, "width": 20, "height": 15}}
        ]}
    }"#;

    fn image() -> DecodedImage {
        DecodedImage {
            stem: "entry".to_string(),
            annotation: ImageAnnotation::new("abc", "img.jpg", Dimensions::new(800, 600))
                .with_object(Detection::new("cat", BBoxXYXY::from_xywh(10.0, 5.0, 20.0, 15.0))),
        }
    }

    #[test]
    fn watson_decoder_names_output_after_entry() {
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };
        let images = WatsonCodec
            .decode(Path::new("dir/entry-1.json"), WATSON, &services)
            .expect("decode entry");

        assert_eq!(images.len(), 1);
        let decoded = images.into_iter().next().unwrap().expect("decode image");
        assert_eq!(decoded.stem, "entry-1");
        assert_eq!(decoded.annotation.image_id, "abc");
    }

    #[test]
    fn watson_encoder_stamps_updated_time() {
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };
        let encoded = WatsonCodec.encode(&image(), &services).expect("encode");
        let file = encoded.file.expect("per-image file");

        assert_eq!(file.file_name, "entry.json");
        assert!(file.contents.contains("\"updated\": \"2020-12-04T19:03:10.000Z\""));
        assert!(encoded.part.is_none());
    }

    #[test]
    fn voc_encoder_uses_source_dir_for_path() {
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };
        let encoded = VocCodec::new("/data/in")
            .encode(&image(), &services)
            .expect("encode");
        let file = encoded.file.expect("per-image file");

        assert_eq!(file.file_name, "entry.xml");
        assert!(file.contents.contains("<path>/data/in/img.jpg</path>"));
    }

    #[test]
    fn ca_encoder_only_contributes_to_manifest() {
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };
        let encoded = CaCodec.encode(&image(), &services).expect("encode");
        assert!(encoded.file.is_none());

        let part = encoded.part.expect("manifest part");
        assert_eq!(part.0, "img.jpg");
        assert_eq!(part.1[0].id.as_deref(), Some("00000000-0000-4000-8000-000000000001"));

        let manifest = CaCodec
            .finish(vec![part], &services)
            .expect("finish")
            .expect("manifest file");
        assert_eq!(manifest.file_name, "_annotations.json");
        assert!(manifest.contents.contains("\"labels\":[\"cat\"]"));
    }

    #[test]
    fn ca_decoder_skips_images_it_cannot_probe() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let manifest = temp.path().join("_annotations.json");
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };

        let images = CaCodec
            .decode(
                &manifest,
                r#"{"type":"localization","annotations":{"missing.jpg":[]}}"#,
                &services,
            )
            .expect("manifest parses");

        assert_eq!(images.len(), 1);
        assert!(images[0].is_err());
    }

    #[test]
    fn mvi_encoder_requires_dataset_and_mints_ids() {
        assert!(MviEncoder::new("").is_err());
        assert!(MviEncoder::new(" \t").is_err());

        let encoder = MviEncoder::new("birds").expect("valid dataset");
        let ids = SequentialIds::new();
        let services = Services { files: &LocalFs, ids: &ids, clock: &FixedClock };
        let encoded = encoder.encode(&image(), &services).expect("encode");

        let file = encoded.file.expect("xml file");
        let record = encoded.part.expect("prop record");
        assert_eq!(file.file_name, "entry.xml");
        assert_eq!(record.id, "00000000-0000-4000-8000-000000000001");
        assert!(file
            .contents
            .contains("<file_id>00000000-0000-4000-8000-000000000001</file_id>"));
        assert!(file
            .contents
            .contains("<_id>00000000-0000-4000-8000-000000000002</_id>"));
        assert_eq!(record.created_at, 1_607_108_590_000);

        let prop = encoder
            .finish(vec![record], &services)
            .expect("finish")
            .expect("prop file");
        assert_eq!(prop.file_name, "prop.json");
        assert!(prop.contents.contains("\"name\":\"birds\""));
    }
}
