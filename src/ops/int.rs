//!
//! Integer operators: slot arithmetic on scalar Repeat elements and
//! encoding-respecting value replacement.
//!
//! Every value written goes through [`primitives::wrap`], so it is always
//! representable in the field's encoding.

use rand::{Rng, RngCore};

use crate::error::MutateError;
use crate::ops::structure::repeat_items_mut;
use crate::ops::SizeDelta;
use crate::primitives;
use crate::tree::{Body, IntValue, Node};
use crate::types::{FieldKind, IntEncoding, IntRole};

/// Boundary values tried before falling back to uniformly random bits.
const INTERESTING: [u64; 16] = [
    0,
    1,
    0x3f,
    0x40,
    0x7f,
    0x80,
    0xff,
    0x100,
    0x3fff,
    0x4000,
    0x7fff,
    0xffff,
    0x7fff_ffff,
    0x8000_0000,
    0xffff_ffff,
    u64::MAX,
];

const INTERESTING_SIGNED: [i64; 7] = [-1, -64, -65, -128, -8193, i32::MIN as i64, i64::MIN];

/// A new value for a field of `encoding`, wrapped into its range.
pub fn replacement_value(encoding: IntEncoding, rng: &mut dyn RngCore) -> u64 {
    let value = if rng.gen_bool(0.5) {
        if encoding.is_signed() && rng.gen_bool(0.5) {
            INTERESTING_SIGNED[rng.gen_range(0..INTERESTING_SIGNED.len())] as u64
        } else {
            INTERESTING[rng.gen_range(0..INTERESTING.len())]
        }
    } else {
        rng.gen::<u64>()
    };
    primitives::wrap(encoding, value)
}

fn element_int(node: &mut Node, index: usize) -> Result<&mut IntValue, MutateError> {
    let field = node.name;
    let items = repeat_items_mut(node)?;
    let item = items.get_mut(index).ok_or_else(|| MutateError::InvalidPath(vec![index]))?;
    match &mut item.body {
        Body::Int(int) => Ok(int),
        _ => Err(MutateError::NotApplicable { field, expected: FieldKind::Repeat }),
    }
}

/// Adds `step` to scalar element `index`, wrapping within its encoding.
pub fn step_element(node: &mut Node, index: usize, step: i64) -> Result<SizeDelta, MutateError> {
    let int = element_int(node, index)?;
    let value = int.value.wrapping_add(step as u64);
    Ok(SizeDelta::bytes(int.set(value)))
}

/// Replaces scalar element `index` with a fresh value of the same encoding.
pub fn replace_element(node: &mut Node, index: usize, rng: &mut dyn RngCore) -> Result<SizeDelta, MutateError> {
    let int = element_int(node, index)?;
    let value = replacement_value(int.encoding, rng);
    Ok(SizeDelta::bytes(int.set(value)))
}

/// Replaces the value of a standalone integer node.
pub fn replace_node(node: &mut Node, rng: &mut dyn RngCore) -> Result<SizeDelta, MutateError> {
    let field = node.name;
    let expected = node.kind();
    match &mut node.body {
        Body::Int(int) if int.role == IntRole::Value => {
            let value = replacement_value(int.encoding, rng);
            Ok(SizeDelta::bytes(int.set(value)))
        }
        _ => Err(MutateError::NotApplicable { field, expected }),
    }
}
