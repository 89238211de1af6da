#![no_main]
use libfuzzer_sys::fuzz_target;
use poldiff::{CategoryMask, DiffSession};

/// A policy compared against itself must produce no differences.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(policy) = poldiff::parse_policy_str(s) else {
        return;
    };
    let Ok(mut session) = DiffSession::new(&policy, &policy, &[]) else {
        return;
    };
    if session.run(CategoryMask::ALL).is_ok() {
        assert!(session.stats_for(CategoryMask::ALL).is_empty());
    }
});
