#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the policy loading entry point.
///
/// Feeds arbitrary UTF-8 strings to `parse_policy_str`, which detects the
/// document format, deserializes it and validates every symbol reference.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = poldiff::parsers::parse_policy_str(s);
    }
});
