#![no_main]

use libfuzzer_sys::fuzz_target;

use cql_core::serialization::vint::{compute_vint_size, read_vint, write_vint};

fuzz_target!(|data: &[u8]| {
    let mut offset = 0;
    while offset < data.len() {
        let start = offset;
        match read_vint(data, &mut offset) {
            Ok(value) => {
                let mut encoded = Vec::new();
                let written = write_vint(value, &mut encoded);
                assert_eq!(written, compute_vint_size(value));
                assert!(written <= offset - start);

                let mut reread = 0;
                assert_eq!(read_vint(&encoded, &mut reread).ok(), Some(value));
            }
            Err(_) => break,
        }
    }
});
