#![no_main]

// Harness: mutate_self_consistency
// Strategy: run several mutation rounds on any decodable input and require
// every output to decode again with consistent lengths and counts.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wasm_mutator_core::schema::wasm;
use wasm_mutator_core::{Codec, Engine};

#[derive(Arbitrary, Debug)]
struct Input {
    seed: u32,
    rounds: u8,
    tail: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut buf = wasm::MAGIC.to_vec();
    buf.extend_from_slice(&wasm::VERSION.to_le_bytes());
    buf.extend_from_slice(&input.tail);

    let codec = Codec::default();
    if codec.decode(&buf).is_err() {
        return;
    }
    let mut engine = Engine::initialize(input.seed);
    for _ in 0..(input.rounds % 16) {
        buf = engine.mutate(&buf, &[]);
        let module = codec.decode(&buf).expect("mutated output must decode");
        assert!(module.verify().is_ok());
    }
});
