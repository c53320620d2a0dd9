//! Fuzz target for Watson JSON parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use annoconv::ir::io_watson_json::{from_watson_slice, to_watson_string};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Anything that parses must also serialize.
    if let Ok(annotation) = from_watson_slice(data) {
        let _ = to_watson_string(&annotation, "2020-01-01T00:00:00.000Z");
    }
});
