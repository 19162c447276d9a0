//!
//! Integer wire primitives: LEB128 (unsigned and signed) and little-endian
//! fixed-width integers, plus the wrapping policy every integer mutator uses
//! to stay representable in its target encoding.
//!
//! Values are carried as `u64`. Signed LEB values are stored as the bit
//! pattern of the sign-extended `i64`.

use crate::error::DecodeError;
use crate::types::IntEncoding;

// --- Range helpers ----------------------------------------------------------

/// Mask selecting the low `bits` bits.
#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Sign-extend the low `bits` bits of `value`.
#[inline]
fn sign_extend(value: u64, bits: u32) -> i64 {
    if bits >= 64 {
        return value as i64;
    }
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Smallest and largest signed value representable in `bits` bits.
pub fn signed_range(bits: u32) -> (i64, i64) {
    if bits >= 64 {
        (i64::MIN, i64::MAX)
    } else {
        let half = 1i64 << (bits - 1);
        (-half, half - 1)
    }
}

/// Largest unsigned value representable in `bits` bits.
pub fn unsigned_max(bits: u32) -> u64 {
    low_mask(bits)
}

/// Wraps an arbitrary value into the range of `encoding`.
///
/// Policy: keep the low N bits of the value. For signed LEB fields the kept
/// bits are then sign-extended, so the result always lies in
/// `[-2^(N-1), 2^(N-1) - 1]`; for unsigned LEB and fixed-width fields it lies
/// in `[0, 2^N - 1]`.
pub fn wrap(encoding: IntEncoding, value: u64) -> u64 {
    let bits = encoding.bits();
    if encoding.is_signed() {
        sign_extend(value & low_mask(bits), bits) as u64
    } else {
        value & low_mask(bits)
    }
}

/// Whether `value` is already inside the range of `encoding`.
pub fn fits(encoding: IntEncoding, value: u64) -> bool {
    wrap(encoding, value) == value
}

// --- LEB128 -----------------------------------------------------------------

/// Reads an unsigned LEB128 integer of at most `bits` bits starting at `offset`.
/// Returns the value and the number of bytes consumed.
pub fn read_uleb(buf: &[u8], offset: usize, bits: u32) -> Result<(u64, usize), DecodeError> {
    let max_len = ((bits + 6) / 7) as usize;
    let mut result: u128 = 0;
    let mut shift = 0u32;
    for i in 0..max_len {
        let byte = *buf
            .get(offset + i)
            .ok_or(DecodeError::UnexpectedEof { offset: offset + i, wanted: 1 })?;
        result |= u128::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if result > u128::from(low_mask(bits)) {
                return Err(DecodeError::LebOutOfRange { offset, bits });
            }
            return Ok((result as u64, i + 1));
        }
    }
    Err(DecodeError::LebTooLong { offset })
}

/// Reads a signed LEB128 integer of at most `bits` bits starting at `offset`.
pub fn read_sleb(buf: &[u8], offset: usize, bits: u32) -> Result<(i64, usize), DecodeError> {
    let max_len = ((bits + 6) / 7) as usize;
    let mut result: i128 = 0;
    let mut shift = 0u32;
    for i in 0..max_len {
        let byte = *buf
            .get(offset + i)
            .ok_or(DecodeError::UnexpectedEof { offset: offset + i, wanted: 1 })?;
        result |= i128::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte & 0x40 != 0 {
                result |= -1i128 << shift;
            }
            let (min, max) = signed_range(bits);
            if result < i128::from(min) || result > i128::from(max) {
                return Err(DecodeError::LebOutOfRange { offset, bits });
            }
            return Ok((result as i64, i + 1));
        }
    }
    Err(DecodeError::LebTooLong { offset })
}

/// Appends the canonical unsigned LEB128 encoding of `value`, padded with
/// redundant continuation bytes up to `min_len` bytes.
pub fn write_uleb(out: &mut Vec<u8>, mut value: u64, min_len: usize) {
    let start = out.len();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    pad_leb(out, start, min_len, false);
}

/// Appends the canonical signed LEB128 encoding of `value`, padded with
/// sign-carrying continuation bytes up to `min_len` bytes.
pub fn write_sleb(out: &mut Vec<u8>, mut value: i64, min_len: usize) {
    let start = out.len();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    pad_leb(out, start, min_len, value < 0);
}

fn pad_leb(out: &mut Vec<u8>, start: usize, min_len: usize, negative: bool) {
    let mut len = out.len() - start;
    if len >= min_len {
        return;
    }
    // `len >= 1` here, so the last byte exists.
    let last = out.len() - 1;
    out[last] |= 0x80;
    while len + 1 < min_len {
        out.push(if negative { 0xff } else { 0x80 });
        len += 1;
    }
    out.push(if negative { 0x7f } else { 0x00 });
}

// --- Fixed width --------------------------------------------------------------

/// Reads a little-endian integer of `bits / 8` bytes at `offset`.
pub fn read_fixed(buf: &[u8], offset: usize, bits: u32) -> Result<(u64, usize), DecodeError> {
    let len = (bits / 8) as usize;
    let bytes = buf
        .get(offset..offset + len)
        .ok_or(DecodeError::UnexpectedEof {
            offset,
            wanted: (offset + len).saturating_sub(buf.len()),
        })?;
    let value = bytes
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    Ok((value, len))
}

/// Appends the little-endian encoding of the low `bits` bits of `value`.
pub fn write_fixed(out: &mut Vec<u8>, value: u64, bits: u32) {
    let bytes = value.to_le_bytes();
    out.extend_from_slice(&bytes[..(bits / 8) as usize]);
}

// --- Encoding-dispatching helpers ---------------------------------------------

/// Decodes one integer of `encoding` at `offset`. Signed values come back as
/// their `i64` bit pattern.
pub fn read_int(buf: &[u8], offset: usize, encoding: IntEncoding) -> Result<(u64, usize), DecodeError> {
    match encoding {
        IntEncoding::ULeb128 { bits } => read_uleb(buf, offset, bits),
        IntEncoding::SLeb128 { bits } => {
            read_sleb(buf, offset, bits).map(|(v, len)| (v as u64, len))
        }
        IntEncoding::Fixed { bits } => read_fixed(buf, offset, bits),
    }
}

/// Encodes `value` in `encoding`. LEB encodings are padded to `min_len`
/// bytes, capped at the encoding's maximum length; fixed-width encodings
/// ignore `min_len`. The value must already fit the encoding.
pub fn encode_int(encoding: IntEncoding, value: u64, min_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoding.max_encoded_len());
    let min_len = min_len.min(encoding.max_encoded_len());
    match encoding {
        IntEncoding::ULeb128 { .. } => write_uleb(&mut out, value, min_len),
        IntEncoding::SLeb128 { .. } => write_sleb(&mut out, value as i64, min_len),
        IntEncoding::Fixed { bits } => write_fixed(&mut out, value, bits),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uleb_known_vectors() {
        let mut out = Vec::new();
        write_uleb(&mut out, 624485, 0);
        assert_eq!(out, vec![0xe5, 0x8e, 0x26]);
        assert_eq!(read_uleb(&out, 0, 32).unwrap(), (624485, 3));
    }

    #[test]
    fn sleb_known_vectors() {
        let mut out = Vec::new();
        write_sleb(&mut out, -123456, 0);
        assert_eq!(out, vec![0xc0, 0xbb, 0x78]);
        assert_eq!(read_sleb(&out, 0, 32).unwrap(), (-123456, 3));

        let mut out = Vec::new();
        write_sleb(&mut out, -64, 0);
        assert_eq!(out, vec![0x40]);
        assert_eq!(read_sleb(&out, 0, 7).unwrap(), (-64, 1));
    }

    #[test]
    fn padded_leb_keeps_value() {
        let mut out = Vec::new();
        write_uleb(&mut out, 5, 3);
        assert_eq!(out, vec![0x85, 0x80, 0x00]);
        assert_eq!(read_uleb(&out, 0, 32).unwrap(), (5, 3));

        let mut out = Vec::new();
        write_sleb(&mut out, -1, 2);
        assert_eq!(out, vec![0xff, 0x7f]);
        assert_eq!(read_sleb(&out, 0, 32).unwrap(), (-1, 2));
    }

    #[test]
    fn uleb_rejects_out_of_range_and_overlong() {
        // 128 does not fit in 7 bits.
        assert!(matches!(
            read_uleb(&[0x80, 0x01], 0, 7),
            Err(DecodeError::LebTooLong { .. })
        ));
        assert!(matches!(
            read_uleb(&[0x02], 0, 1),
            Err(DecodeError::LebOutOfRange { bits: 1, .. })
        ));
        assert!(matches!(
            read_uleb(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 0, 32),
            Err(DecodeError::LebTooLong { .. })
        ));
        assert!(matches!(
            read_uleb(&[0x80], 0, 32),
            Err(DecodeError::UnexpectedEof { offset: 1, .. })
        ));
    }

    #[test]
    fn fixed_is_little_endian() {
        let mut out = Vec::new();
        write_fixed(&mut out, 0x0102_0304, 32);
        assert_eq!(out, vec![4, 3, 2, 1]);
        assert_eq!(read_fixed(&out, 0, 32).unwrap(), (0x0102_0304, 4));
        assert!(read_fixed(&out, 2, 32).is_err());
    }

    #[test]
    fn wrap_policy_keeps_low_bits() {
        assert_eq!(wrap(IntEncoding::UINT8, 0x1ff), 0xff);
        assert_eq!(wrap(IntEncoding::VARUINT1, 3), 1);
        assert_eq!(wrap(IntEncoding::VARINT7, 64) as i64, -64);
        assert_eq!(wrap(IntEncoding::VARINT7, (-65i64) as u64) as i64, 63);
        assert_eq!(wrap(IntEncoding::UINT64, u64::MAX), u64::MAX);
    }

    fn arb_encoding() -> impl Strategy<Value = IntEncoding> {
        prop_oneof![
            (1u32..=64).prop_map(|bits| IntEncoding::ULeb128 { bits }),
            (1u32..=64).prop_map(|bits| IntEncoding::SLeb128 { bits }),
            prop::sample::select(vec![8u32, 16, 32, 64]).prop_map(|bits| IntEncoding::Fixed { bits }),
        ]
    }

    proptest! {
        #[test]
        fn property_wrapped_values_roundtrip(encoding in arb_encoding(), raw in any::<u64>(), pad in 0usize..12) {
            let value = wrap(encoding, raw);
            prop_assert!(fits(encoding, value));
            let bytes = encode_int(encoding, value, pad);
            prop_assert!(bytes.len() <= encoding.max_encoded_len());
            let (decoded, len) = read_int(&bytes, 0, encoding).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(len, bytes.len());
        }

        #[test]
        fn property_wrap_is_idempotent(encoding in arb_encoding(), raw in any::<u64>()) {
            let once = wrap(encoding, raw);
            prop_assert_eq!(wrap(encoding, once), once);
        }
    }
}
