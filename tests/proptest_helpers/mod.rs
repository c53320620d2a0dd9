#![allow(dead_code)]

use annoconv::ir::{BBoxXYXY, Detection, Dimensions, ImageAnnotation, Pixel};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Pixel formats round to whole pixels.
pub const EPS_PIXEL: f64 = 1.0;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_dimensions() -> impl Strategy<Value = Dimensions> {
    (1u32..=4096, 1u32..=4096).prop_map(|(w, h)| Dimensions::new(w, h))
}

pub fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("cat".to_string()),
        Just("dog".to_string()),
        Just("traffic light".to_string()),
        "[a-z]([a-z0-9 _/:-]{0,10}[a-z0-9])?",
    ]
}

/// A box that may spill outside the image on any side.
pub fn arb_bbox(dimensions: Dimensions) -> impl Strategy<Value = BBoxXYXY<Pixel>> {
    let w = f64::from(dimensions.width);
    let h = f64::from(dimensions.height);
    (-w..2.0 * w, -h..2.0 * h, 0.0..w, 0.0..h).prop_map(|(x, y, bw, bh)| BBoxXYXY::from_xywh(x, y, bw, bh))
}

/// A box with integer corners inside the image.
pub fn arb_inside_bbox(dimensions: Dimensions) -> impl Strategy<Value = BBoxXYXY<Pixel>> {
    (0..=dimensions.width, 0..=dimensions.height)
        .prop_flat_map(move |(x1, y1)| {
            (Just(x1), Just(y1), x1..=dimensions.width, y1..=dimensions.height)
        })
        .prop_map(|(x1, y1, x2, y2)| {
            BBoxXYXY::from_xyxy(f64::from(x1), f64::from(y1), f64::from(x2), f64::from(y2))
        })
}

pub fn arb_annotation(max_objects: usize, inside: bool) -> impl Strategy<Value = ImageAnnotation> {
    arb_dimensions().prop_flat_map(move |dimensions| {
        let bbox = if inside {
            arb_inside_bbox(dimensions).boxed()
        } else {
            arb_bbox(dimensions).boxed()
        };
        (
            "[a-z0-9]{1,12}",
            prop::collection::vec((arb_label(), bbox), 0..=max_objects),
        )
            .prop_map(move |(stem, objects)| {
                objects.into_iter().fold(
                    ImageAnnotation::new(stem.clone(), format!("{stem}.jpg"), dimensions),
                    |annotation, (label, bbox)| annotation.with_object(Detection::new(label, bbox)),
                )
            })
    })
}

/// Returns an error message if the two boxes differ by more than `eps` on
/// any corner.
pub fn assert_bbox_close(
    left: &BBoxXYXY<Pixel>,
    right: &BBoxXYXY<Pixel>,
    eps: f64,
) -> Result<(), String> {
    let pairs = [
        ("xmin", left.xmin(), right.xmin()),
        ("ymin", left.ymin(), right.ymin()),
        ("xmax", left.xmax(), right.xmax()),
        ("ymax", left.ymax(), right.ymax()),
    ];
    for (name, a, b) in pairs {
        if (a - b).abs() > eps {
            return Err(format!("{name} differs: {a} vs {b} (eps {eps})"));
        }
    }
    Ok(())
}

pub fn assert_inside(bbox: &BBoxXYXY<Pixel>, dimensions: Dimensions) -> Result<(), String> {
    let w = f64::from(dimensions.width);
    let h = f64::from(dimensions.height);
    let ok = bbox.xmin() >= 0.0
        && bbox.ymin() >= 0.0
        && bbox.xmax() <= w
        && bbox.ymax() <= h
        && bbox.xmin() <= bbox.xmax()
        && bbox.ymin() <= bbox.ymax();
    if ok {
        Ok(())
    } else {
        Err(format!("{bbox:?} is not inside {w}x{h}"))
    }
}
