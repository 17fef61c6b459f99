#![no_main]

use libfuzzer_sys::fuzz_target;
use apktriage::reader::parse_manifest_permissions;

fuzz_target!(|data: &[u8]| {
    // Malformed manifests must surface as errors, never panics
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = parse_manifest_permissions(input);
    }
});
