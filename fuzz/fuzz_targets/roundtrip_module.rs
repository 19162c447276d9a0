#![no_main]

// Harness: roundtrip_module
// Strategy: prepend a valid header to arbitrary bytes; whatever decodes must
// re-encode to exactly the same buffer.

use libfuzzer_sys::fuzz_target;
use wasm_mutator_core::schema::wasm;
use wasm_mutator_core::Codec;

fuzz_target!(|tail: &[u8]| {
    let mut buf = wasm::MAGIC.to_vec();
    buf.extend_from_slice(&wasm::VERSION.to_le_bytes());
    buf.extend_from_slice(tail);

    let codec = Codec::default();
    if let Ok(module) = codec.decode(&buf) {
        assert!(module.verify().is_ok());
        assert_eq!(codec.encode(&module), buf);
    }
});
