#![no_main]

// Harness: custom_mutator
// Strategy: let libFuzzer drive the structure-aware engine as its mutator
// and exercise the decoder on every produced input.

use libfuzzer_sys::{fuzz_mutator, fuzz_target};
use wasm_mutator_core::{Codec, CustomMutator, Engine};

fuzz_target!(|data: &[u8]| {
    if let Ok(module) = Codec::default().decode(data) {
        assert!(module.verify().is_ok());
    }
});

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    let Ok(mut engine) = <Engine as CustomMutator>::init(seed) else {
        return libfuzzer_sys::fuzzer_mutate(data, size, max_size);
    };
    let out = engine.fuzz(&data[..size], None, max_size);
    if out == data[..size] {
        // Not a module (or nothing changed): fall back to byte-level mutation.
        return libfuzzer_sys::fuzzer_mutate(data, size, max_size);
    }
    data[..out.len()].copy_from_slice(&out);
    out.len()
});
