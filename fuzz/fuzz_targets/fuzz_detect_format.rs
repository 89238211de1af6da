#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the format detection heuristics without parsing.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = poldiff::parsers::detect_format(s);
    }
});
