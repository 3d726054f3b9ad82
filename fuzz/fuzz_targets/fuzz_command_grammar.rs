#![no_main]
use libfuzzer_sys::fuzz_target;
use socialhook::command::{parse, Route};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for route in Route::ALL {
            if let Ok(parsed) = parse(route, text) {
                assert_eq!(parsed.route, route);
                assert!(!parsed.service.contains(':'));
            }
        }
    }
});
