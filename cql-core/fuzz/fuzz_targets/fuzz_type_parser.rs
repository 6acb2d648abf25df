#![no_main]

use libfuzzer_sys::fuzz_target;

use cql_core::parse_fq_type_name;

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        if let Ok(descriptor) = parse_fq_type_name(name) {
            let _ = descriptor.to_string();
            let _ = descriptor.validate();
        }
    }
});
