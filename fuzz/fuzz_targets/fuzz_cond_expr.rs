#![no_main]
use libfuzzer_sys::fuzz_target;
use poldiff::model::CondExpr;

/// Fuzz reverse-polish conditional expressions split on whitespace.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if let Ok(expr) = CondExpr::parse(&tokens) {
            let _ = expr.booleans();
        }
    }
});
