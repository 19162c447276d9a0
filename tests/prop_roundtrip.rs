use proptest::prelude::*;

use wasm_mutator_core::schema::wasm;
use wasm_mutator_core::test_utils::{function_body, name, sample_module, vec_of, ModuleBuilder};
use wasm_mutator_core::{Codec, Engine};

/// Value types as single varint7 bytes.
fn value_type() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0x7f), Just(0x7e), Just(0x7d), Just(0x7c)]
}

fn func_type() -> impl Strategy<Value = Vec<u8>> {
    (proptest::collection::vec(value_type(), 0..4), proptest::option::of(value_type())).prop_map(|(params, ret)| {
        let mut out = vec![0x60];
        out.extend(vec_of(&params.iter().map(|p| vec![*p]).collect::<Vec<_>>()));
        match ret {
            Some(ty) => out.extend([0x01, ty]),
            None => out.push(0x00),
        }
        out
    })
}

/// Well-formed modules built from a handful of section kinds.
fn module() -> impl Strategy<Value = Vec<u8>> {
    (
        proptest::collection::vec(func_type(), 0..4),
        proptest::collection::vec(0u32..1000, 0..6),
        proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..12), 0..3),
        proptest::collection::vec(any::<u8>(), 0..8),
        // no `n`, so never the registered "name" section
        "[a-m]{1,8}",
        proptest::collection::vec(any::<u8>(), 0..16),
    )
        .prop_map(|(types, funcs, bodies, data, custom_name, custom_payload)| {
            let funcs: Vec<Vec<u8>> = funcs
                .iter()
                .map(|f| {
                    let mut out = Vec::new();
                    wasm_mutator_core::primitives::write_uleb(&mut out, u64::from(*f), 0);
                    out
                })
                .collect();
            let bodies: Vec<Vec<u8>> = bodies.iter().map(|code| function_body(code)).collect();
            let mut segment = vec![0x00, 0x41, 0x00, 0x0b];
            segment.extend(name(&String::from_utf8_lossy(&data)));
            ModuleBuilder::new()
                .section(wasm::SEC_TYPE, &vec_of(&types))
                .section(wasm::SEC_FUNCTION, &vec_of(&funcs))
                .section(wasm::SEC_CODE, &vec_of(&bodies))
                .section(wasm::SEC_DATA, &vec_of(&[segment]))
                .custom_section(&custom_name, &custom_payload)
                .build()
        })
}

proptest! {
    #[test]
    fn well_formed_modules_roundtrip(buf in module()) {
        let codec = Codec::default();
        let module = codec.decode(&buf).unwrap();
        prop_assert!(module.verify().is_ok());
        prop_assert_eq!(codec.encode(&module), buf);
    }

    /// Whatever decodes re-encodes byte for byte, padding included.
    #[test]
    fn arbitrary_tails_roundtrip_when_decodable(tail in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut buf = ModuleBuilder::new().build();
        buf.extend_from_slice(&tail);
        let codec = Codec::default();
        if let Ok(module) = codec.decode(&buf) {
            prop_assert_eq!(codec.encode(&module), buf);
        }
    }

    #[test]
    fn mutated_modules_stay_self_consistent(buf in module(), seed in any::<u32>()) {
        let codec = Codec::default();
        let mut engine = Engine::initialize(seed);
        let mut current = buf;
        for _ in 0..20 {
            current = engine.mutate(&current, &[]);
            let module = codec
                .decode(&current)
                .map_err(|e| TestCaseError::fail(format!("mutated output failed to decode: {e}")))?;
            prop_assert!(module.verify().is_ok());
        }
    }
}

#[test]
fn sample_module_roundtrips() {
    let buf = sample_module();
    let codec = Codec::default();
    let module = codec.decode(&buf).unwrap();
    assert_eq!(module.sections.len(), 13);
    assert_eq!(codec.encode(&module), buf);
}
