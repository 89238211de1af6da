#![no_main]
use libfuzzer_sys::fuzz_target;
use poldiff::model::{LevelExpr, RangeExpr};

/// Fuzz the MLS level and range parsers (`s0:c0.c3,c5 - s1`).
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = s.parse::<LevelExpr>();
        let _ = s.parse::<RangeExpr>();
    }
});
