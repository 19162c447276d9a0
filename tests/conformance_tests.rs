//! End-to-end behaviour of the public engine API.

use rand::rngs::StdRng;
use rand::SeedableRng;

use wasm_mutator_core::ops::Operator;
use wasm_mutator_core::schema::{wasm, Extent, Shape};
use wasm_mutator_core::test_utils::{sample_module, vec_of, ModuleBuilder};
use wasm_mutator_core::tree::{Body, Prefix};
use wasm_mutator_core::types::IntEncoding;
use wasm_mutator_core::{Choice, Codec, CustomMutator, Engine, EngineConfig, FieldKind, Outcome, WeightTable};

static UINT8: Shape = Shape::Int(IntEncoding::UINT8);
static COUNTED: Shape = Shape::Repeat { extent: Extent::Prefixed(IntEncoding::VARUINT32), elem: &UINT8 };

fn counted_codec() -> Codec {
    let mut codec = Codec::default();
    codec.register_custom("seq", &COUNTED);
    codec
}

#[test]
fn clone_and_delete_on_a_custom_sequence() {
    let input = ModuleBuilder::new().custom_section("seq", &[3, 10, 20, 30]).build();
    let mut engine = Engine::from_parts(StdRng::seed_from_u64(0), counted_codec(), EngineConfig::default()).unwrap();

    for (operator, expected, count) in [
        (Operator::CloneElement(1), vec![3u8 + 1, 10, 20, 20, 30], 4u64),
        (Operator::DeleteElement(1), vec![2, 10, 30], 2),
    ] {
        let mut module = engine.codec().decode(&input).unwrap();
        let declared_before = module.sections[0].content.prefix.as_ref().map(Prefix::declared).unwrap();
        let choice = Choice { kind: FieldKind::Repeat, path: vec![1], operator };
        assert!(engine.apply(&mut module.sections[0], &choice).is_applied());

        let content = &module.sections[0].content;
        let payload = content.field("payload").unwrap();
        assert_eq!(payload.prefix.as_ref().map(Prefix::declared), Some(count));
        let declared_after = content.prefix.as_ref().map(Prefix::declared).unwrap();
        assert_eq!(declared_after as i64 - declared_before as i64, count as i64 - 3);

        let expected_module = ModuleBuilder::new().custom_section("seq", &expected).build();
        assert_eq!(engine.codec().encode(&module), expected_module);
    }
}

#[test]
fn decode_failure_returns_input() {
    let mut engine = Engine::initialize(0);
    let mut truncated = sample_module();
    truncated.truncate(truncated.len() - 3);
    assert_eq!(engine.mutate(&truncated, &[]), truncated);
    assert_eq!(engine.fuzz(&truncated, None, 1 << 16), truncated);
}

#[test]
fn empty_bucket_reencodes_unchanged() {
    // Only SignedLebInt is ever selected; the memory section has none.
    let input = ModuleBuilder::new().section(wasm::SEC_MEMORY, &vec_of(&[vec![0x00, 0x01]])).build();
    let config = EngineConfig {
        weights: WeightTable::new([(FieldKind::SignedLebInt, 1)]),
        standalone_int_replacement: true,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(11, config).unwrap();
    let mut module = engine.codec().decode(&input).unwrap();
    let outcomes = engine.mutate_module(&mut module);
    assert!(matches!(outcomes.as_slice(), [Outcome::Skipped { .. }]));
    for _ in 0..20 {
        assert_eq!(engine.mutate(&input, &[]), input);
    }
}

#[test]
fn overhang_bytes_survive_every_iteration() {
    let mut payload = vec_of(&[vec![0x60, 0x01, 0x7f, 0x00], vec![0x60, 0x00, 0x01, 0x7e]]);
    payload.extend_from_slice(&[0xfe, 0xed, 0xfa, 0xce]);
    let input = ModuleBuilder::new().section(wasm::SEC_TYPE, &payload).build();

    let codec = Codec::default();
    let mut engine = Engine::initialize(2024);
    let mut current = input;
    for _ in 0..500 {
        current = engine.mutate(&current, &[]);
        let module = codec.decode(&current).unwrap();
        let overhang = module.sections[0].content.field("overhang").unwrap();
        assert_eq!(
            overhang.body,
            Body::Bytes { data: vec![0xfe, 0xed, 0xfa, 0xce], tag: wasm_mutator_core::types::BytesTag::Overhang }
        );
    }
}

#[test]
fn harness_init_and_fuzz() {
    let mut engine = <Engine as CustomMutator>::init(99).unwrap();
    let input = sample_module();
    let mut changed = 0;
    for _ in 0..100 {
        let out = engine.fuzz(&input, Some(&[1u8, 2, 3][..]), 1 << 20);
        assert!(Codec::default().decode(&out).is_ok());
        if out != input {
            changed += 1;
        }
    }
    assert!(changed > 0);
}
