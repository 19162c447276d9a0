//!
//! Byte-level operators for `Bytes` nodes.
//!
//! Each operator is total: on a buffer too short for it, it leaves the
//! buffer untouched. Insertions never add more than `max_growth` bytes.

use rand::{Rng, RngCore};

use crate::error::MutateError;
use crate::ops::SizeDelta;
use crate::tree::{Body, Node};
use crate::types::{BytesTag, FieldKind};

pub type ByteOp = fn(&mut Vec<u8>, &mut dyn RngCore, usize);

/// The fixed catalogue, indexed by [`crate::ops::Operator::Bytes`].
pub const CATALOGUE: [(&str, ByteOp); 16] = [
    ("flip_bit", flip_bit),
    ("interesting_8", interesting_8),
    ("interesting_16", interesting_16),
    ("interesting_32", interesting_32),
    ("arith_8", arith_8),
    ("arith_16", arith_16),
    ("arith_32", arith_32),
    ("xor_byte", xor_byte),
    ("delete_small_block", delete_small_block),
    ("delete_block", delete_block),
    ("clone_block", clone_block),
    ("insert_constant_block", insert_constant_block),
    ("overwrite_random", overwrite_random),
    ("overwrite_copy", overwrite_copy),
    ("insert_random", insert_random),
    ("swap_bytes", swap_bytes),
];

const INTERESTING_8: [i8; 9] = [-128, -1, 0, 1, 16, 32, 64, 100, 127];
const INTERESTING_16: [i16; 10] = [-32768, -129, 128, 255, 256, 512, 1000, 1024, 4096, 32767];
const INTERESTING_32: [i32; 8] = [
    -2147483648,
    -100663046,
    -32769,
    32768,
    65535,
    65536,
    100663045,
    2147483647,
];

/// Largest magnitude added or subtracted by the arithmetic operators.
const ARITH_MAX: u32 = 35;

/// Runs catalogue entry `index` on the data of a `Bytes` node.
pub fn apply(node: &mut Node, index: usize, rng: &mut dyn RngCore, max_growth: usize) -> Result<SizeDelta, MutateError> {
    let (_, op) = CATALOGUE
        .get(index)
        .ok_or(MutateError::NotApplicable { field: node.name, expected: FieldKind::Bytes })?;
    match &mut node.body {
        Body::Bytes { data, tag: BytesTag::Data } => {
            let before = data.len() as isize;
            op(data, rng, max_growth);
            Ok(SizeDelta::bytes(data.len() as isize - before))
        }
        _ => Err(MutateError::NotApplicable { field: node.name, expected: FieldKind::Bytes }),
    }
}

fn pick<T: Copy>(rng: &mut dyn RngCore, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

/// Block length in `1..=max`, biased towards short blocks.
fn block_len(rng: &mut dyn RngCore, max: usize) -> usize {
    let len = rng.gen_range(1..=max);
    if rng.gen_bool(0.5) {
        len
    } else {
        rng.gen_range(1..=len)
    }
}

fn write_word(data: &mut [u8], at: usize, word: &[u8]) {
    data[at..at + word.len()].copy_from_slice(word);
}

fn flip_bit(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    data[at] ^= 1u8 << rng.gen_range(0..8u32);
}

fn interesting_8(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    data[at] = pick(rng, &INTERESTING_8) as u8;
}

fn interesting_16(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 2 {
        return;
    }
    let at = rng.gen_range(0..=data.len() - 2);
    let value = pick(rng, &INTERESTING_16);
    let word = if rng.gen_bool(0.5) { value.to_le_bytes() } else { value.to_be_bytes() };
    write_word(data, at, &word);
}

fn interesting_32(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 4 {
        return;
    }
    let at = rng.gen_range(0..=data.len() - 4);
    let value = pick(rng, &INTERESTING_32);
    let word = if rng.gen_bool(0.5) { value.to_le_bytes() } else { value.to_be_bytes() };
    write_word(data, at, &word);
}

/// Random non-zero amount in `[-ARITH_MAX, ARITH_MAX]`, as a wrapping addend.
fn arith_amount(rng: &mut dyn RngCore) -> u32 {
    let amount = rng.gen_range(1..=ARITH_MAX);
    if rng.gen_bool(0.5) {
        amount
    } else {
        amount.wrapping_neg()
    }
}

fn arith_8(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    data[at] = data[at].wrapping_add(arith_amount(rng) as u8);
}

fn arith_16(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 2 {
        return;
    }
    let at = rng.gen_range(0..=data.len() - 2);
    let value = u16::from_le_bytes([data[at], data[at + 1]]);
    let value = value.wrapping_add(arith_amount(rng) as u16);
    write_word(data, at, &value.to_le_bytes());
}

fn arith_32(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 4 {
        return;
    }
    let at = rng.gen_range(0..=data.len() - 4);
    let value = u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
    let value = value.wrapping_add(arith_amount(rng));
    write_word(data, at, &value.to_le_bytes());
}

fn xor_byte(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    data[at] ^= rng.gen_range(1..=255u8);
}

fn delete_small_block(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    let len = block_len(rng, (data.len() - at).min(4));
    data.drain(at..at + len);
}

fn delete_block(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    let len = block_len(rng, data.len() - at);
    data.drain(at..at + len);
}

fn clone_block(data: &mut Vec<u8>, rng: &mut dyn RngCore, max_growth: usize) {
    if data.is_empty() || max_growth == 0 {
        return;
    }
    let from = rng.gen_range(0..data.len());
    let len = block_len(rng, (data.len() - from).min(max_growth));
    let block = data[from..from + len].to_vec();
    let to = rng.gen_range(0..=data.len());
    data.splice(to..to, block);
}

fn insert_constant_block(data: &mut Vec<u8>, rng: &mut dyn RngCore, max_growth: usize) {
    if max_growth == 0 {
        return;
    }
    let value = if !data.is_empty() && rng.gen_bool(0.5) {
        data[rng.gen_range(0..data.len())]
    } else {
        rng.gen()
    };
    let len = block_len(rng, max_growth);
    let to = rng.gen_range(0..=data.len());
    data.splice(to..to, std::iter::repeat(value).take(len));
}

fn overwrite_random(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.is_empty() {
        return;
    }
    let at = rng.gen_range(0..data.len());
    let len = block_len(rng, data.len() - at);
    rng.fill_bytes(&mut data[at..at + len]);
}

fn overwrite_copy(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 2 {
        return;
    }
    let from = rng.gen_range(0..data.len());
    let to = rng.gen_range(0..data.len());
    let len = block_len(rng, (data.len() - from).min(data.len() - to));
    data.copy_within(from..from + len, to);
}

fn insert_random(data: &mut Vec<u8>, rng: &mut dyn RngCore, max_growth: usize) {
    if max_growth == 0 {
        return;
    }
    let mut block = vec![0u8; block_len(rng, max_growth)];
    rng.fill_bytes(&mut block);
    let to = rng.gen_range(0..=data.len());
    data.splice(to..to, block);
}

fn swap_bytes(data: &mut Vec<u8>, rng: &mut dyn RngCore, _: usize) {
    if data.len() < 2 {
        return;
    }
    let a = rng.gen_range(0..data.len());
    let b = rng.gen_range(0..data.len());
    data.swap(a, b);
}
