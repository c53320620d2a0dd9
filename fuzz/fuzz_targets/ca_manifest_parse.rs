//! Fuzz target for Cloud Annotations manifest parsing.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use annoconv::ir::io_ca_json::parse_ca_manifest;
use annoconv::ir::Dimensions;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(entries) = parse_ca_manifest(json, Path::new("<fuzz>")) {
        for entry in entries {
            let _ = entry.into_annotation(Dimensions::new(640, 480), Path::new("<fuzz>"));
        }
    }
});
