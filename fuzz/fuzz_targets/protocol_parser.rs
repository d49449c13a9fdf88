#![no_main]

use libfuzzer_sys::fuzz_target;
use thurstone::protocol::Protocol;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Any string either parses to a valid protocol or errors, never panics
        if let Ok(protocol) = Protocol::parse(input) {
            assert!(protocol.validate().is_ok());
            assert!((0.0..=1.0).contains(&protocol.guessing_rate()));
        }
    }
});
