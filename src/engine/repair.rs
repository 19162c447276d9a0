//!
//! Length/count repair.
//!
//! After an operator changes one node, every prefix between that node and the
//! section root describes a stale region. [`repair`] walks the node path
//! down, then fixes prefixes bottom-up on the way back: byte-length prefixes
//! absorb the size change of their region, and the target's element-count
//! prefix absorbs the count change. A prefix whose own encoding grows or
//! shrinks feeds that width change into its parent's delta.

use crate::error::MutateError;
use crate::ops::SizeDelta;
use crate::primitives;
use crate::tree::{Node, Prefix};
use crate::types::PrefixRole;

/// Repairs every prefix on `path` below and including `root` after the node
/// at `path` changed by `delta`. Returns the change in `root`'s encoded
/// length, prefix included.
pub fn repair(root: &mut Node, path: &[usize], delta: SizeDelta) -> Result<isize, MutateError> {
    let (body_delta, count_delta) = match path.split_first() {
        None => (delta.bytes, delta.count),
        Some((&index, rest)) => {
            let child = root
                .child_mut(index)
                .ok_or_else(|| MutateError::InvalidPath(path.to_vec()))?;
            (repair(child, rest, delta)?, 0)
        }
    };
    let field = root.name;
    let Some(prefix) = root.prefix.as_mut() else {
        return Ok(body_delta);
    };
    let change = match prefix.role {
        PrefixRole::ByteLength => body_delta,
        PrefixRole::ElementCount => count_delta,
    };
    Ok(body_delta + adjust(prefix, change, field)?)
}

/// Adds `change` to a prefix value, re-encoding it no narrower than before.
/// Returns the change in the prefix's encoded width.
fn adjust(prefix: &mut Prefix, change: isize, field: &'static str) -> Result<isize, MutateError> {
    if change == 0 {
        return Ok(0);
    }
    let value = i128::from(prefix.int.value) + change as i128;
    if value < 0 {
        return Err(MutateError::PrefixUnderflow { field });
    }
    let value = u64::try_from(value).map_err(|_| MutateError::PrefixOverflow { field, value: u64::MAX })?;
    if !primitives::fits(prefix.int.encoding, value) {
        return Err(MutateError::PrefixOverflow { field, value });
    }
    let before = prefix.int.raw.len();
    prefix.int.value = value;
    prefix.int.raw = primitives::encode_int(prefix.int.encoding, value, before);
    Ok(prefix.int.raw.len() as isize - before as isize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Body;
    use crate::types::IntEncoding;

    fn counted(items: Vec<Node>) -> Node {
        let count = items.len() as u64;
        Node::new("entries", Body::Repeat(items)).with_prefix(Prefix::new(
            PrefixRole::ElementCount,
            IntEncoding::VARUINT32,
            count,
        ))
    }

    fn sized(name: &'static str, inner: Node) -> Node {
        let len = inner.encoded_len() as u64;
        Node::new(name, Body::Struct(vec![inner])).with_prefix(Prefix::new(
            PrefixRole::ByteLength,
            IntEncoding::VARUINT32,
            len,
        ))
    }

    #[test]
    fn fixes_count_and_enclosing_lengths() {
        let items = vec![Node::int("item", IntEncoding::UINT8, 1), Node::int("item", IntEncoding::UINT8, 2)];
        let mut root = sized("section", sized("body", counted(items)));
        if let Some(Body::Repeat(items)) = root.at_mut(&[0, 0]).map(|n| &mut n.body) {
            items.push(Node::int("item", IntEncoding::UINT8, 3));
        }
        let grown = repair(&mut root, &[0, 0], SizeDelta { bytes: 1, count: 1 }).unwrap();
        assert_eq!(grown, 1);
        assert!(root.verify().is_ok());
        assert_eq!(root.at(&[0, 0]).and_then(|n| n.prefix.as_ref()).map(Prefix::declared), Some(3));
    }

    #[test]
    fn width_changes_propagate() {
        // 127 bytes of data: the length prefix needs a second byte at 128.
        let mut root = sized(
            "section",
            Node::bytes("data", vec![0; 127]).with_prefix(Prefix::new(
                PrefixRole::ByteLength,
                IntEncoding::VARUINT32,
                127,
            )),
        );
        if let Some(Body::Bytes { data, .. }) = root.at_mut(&[0]).map(|n| &mut n.body) {
            data.push(0);
        }
        let grown = repair(&mut root, &[0], SizeDelta::bytes(1)).unwrap();
        assert_eq!(grown, 2);
        assert!(root.verify().is_ok());
        assert_eq!(root.prefix.as_ref().map(Prefix::declared), Some(130));
    }

    #[test]
    fn keeps_padded_prefix_width() {
        let mut root = Node::bytes("data", vec![1, 2]);
        root.prefix = Some(Prefix::new(PrefixRole::ByteLength, IntEncoding::VARUINT32, 2));
        if let Some(prefix) = root.prefix.as_mut() {
            prefix.int.raw = vec![0x82, 0x80, 0x00];
        }
        if let Body::Bytes { data, .. } = &mut root.body {
            data.pop();
        }
        assert_eq!(repair(&mut root, &[], SizeDelta::bytes(-1)).unwrap(), -1);
        assert_eq!(root.prefix.as_ref().map(|p| p.int.raw.clone()), Some(vec![0x81, 0x80, 0x00]));
        assert!(root.verify().is_ok());
    }

    #[test]
    fn rejects_underflow_overflow_and_bad_paths() {
        let mut root = counted(vec![]);
        assert_eq!(
            repair(&mut root, &[], SizeDelta { bytes: 0, count: -1 }),
            Err(MutateError::PrefixUnderflow { field: "entries" })
        );

        let mut small = Node::bytes("data", vec![]);
        small.prefix = Some(Prefix::new(PrefixRole::ByteLength, IntEncoding::VARUINT1, 1));
        assert_eq!(
            repair(&mut small, &[], SizeDelta::bytes(1)),
            Err(MutateError::PrefixOverflow { field: "data", value: 2 })
        );

        assert_eq!(
            repair(&mut root, &[4], SizeDelta::bytes(1)),
            Err(MutateError::InvalidPath(vec![4]))
        );
    }
}
