//!
//! The field tree: the in-memory form of one decoded module, mutated in place
//! and discarded after re-encoding.
//!
//! Ownership is strictly top-down. A node's length or element-count field is
//! not a sibling node but a [`Prefix`] owned by the node it describes, which
//! is what lets repair walk a single [`NodePath`] from the section root down
//! to the mutated node and fix every prefix on the way back up.

use crate::error::ConsistencyError;
use crate::primitives;
use crate::types::{BytesTag, FieldKind, IntEncoding, IntRole, PrefixRole};

/// Child indices from a section's content root down to one node.
pub type NodePath = Vec<usize>;

/// An integer field: logical value plus the exact bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntValue {
    pub encoding: IntEncoding,
    pub role: IntRole,
    /// Logical value; signed LEB values are stored as their `i64` bit pattern.
    pub value: u64,
    /// Encoded bytes, written back verbatim by the encoder.
    pub raw: Vec<u8>,
}

impl IntValue {
    /// Builds a value-carrying integer with its canonical encoding. The value
    /// is wrapped into the encoding's range first.
    pub fn new(encoding: IntEncoding, value: u64) -> Self {
        let value = primitives::wrap(encoding, value);
        IntValue {
            encoding,
            role: IntRole::Value,
            value,
            raw: primitives::encode_int(encoding, value, 0),
        }
    }

    /// Replaces the value, re-encoding canonically. Returns the change in
    /// encoded byte length.
    pub fn set(&mut self, value: u64) -> isize {
        let before = self.raw.len() as isize;
        self.value = primitives::wrap(self.encoding, value);
        self.raw = primitives::encode_int(self.encoding, self.value, 0);
        self.raw.len() as isize - before
    }

    /// Value interpreted as signed (meaningful for signed LEB fields).
    pub fn signed(&self) -> i64 {
        self.value as i64
    }

    fn raw_is_current(&self) -> bool {
        matches!(
            primitives::read_int(&self.raw, 0, self.encoding),
            Ok((value, len)) if value == self.value && len == self.raw.len()
        )
    }
}

/// A length or count field owned by the node it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub role: PrefixRole,
    pub int: IntValue,
}

impl Prefix {
    pub fn new(role: PrefixRole, encoding: IntEncoding, value: u64) -> Self {
        Prefix { role, int: IntValue::new(encoding, value) }
    }

    pub fn declared(&self) -> u64 {
        self.int.value
    }

    pub fn encoded_len(&self) -> usize {
        self.int.raw.len()
    }
}

/// Body of a node. Exactly one variant per node; the variant is the node's
/// canonical kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Int(IntValue),
    Bytes { data: Vec<u8>, tag: BytesTag },
    Repeat(Vec<Node>),
    Struct(Vec<Node>),
    Const(&'static [u8]),
    Cond(Option<Box<Node>>),
}

/// The atomic unit of mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: &'static str,
    pub prefix: Option<Prefix>,
    pub body: Body,
}

impl Node {
    pub fn new(name: &'static str, body: Body) -> Self {
        Node { name, prefix: None, body }
    }

    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Integer node holding `value` in `encoding`.
    pub fn int(name: &'static str, encoding: IntEncoding, value: u64) -> Self {
        Node::new(name, Body::Int(IntValue::new(encoding, value)))
    }

    /// Plain data bytes without a prefix.
    pub fn bytes(name: &'static str, data: Vec<u8>) -> Self {
        Node::new(name, Body::Bytes { data, tag: BytesTag::Data })
    }

    pub fn kind(&self) -> FieldKind {
        match &self.body {
            Body::Int(int) => int.encoding.kind(),
            Body::Bytes { .. } => FieldKind::Bytes,
            Body::Repeat(_) => FieldKind::Repeat,
            Body::Struct(_) => FieldKind::Struct,
            Body::Const(_) => FieldKind::Const,
            Body::Cond(_) => FieldKind::Cond,
        }
    }

    /// Whether this node is a plain integer, i.e. a scalar Repeat element.
    pub fn is_scalar(&self) -> bool {
        matches!(self.body, Body::Int(_))
    }

    /// Number of addressable children.
    pub fn child_count(&self) -> usize {
        match &self.body {
            Body::Repeat(items) | Body::Struct(items) => items.len(),
            Body::Cond(Some(_)) => 1,
            _ => 0,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        match &self.body {
            Body::Repeat(items) | Body::Struct(items) => items.get(index),
            Body::Cond(Some(inner)) if index == 0 => Some(inner),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        match &mut self.body {
            Body::Repeat(items) | Body::Struct(items) => items.get_mut(index),
            Body::Cond(Some(inner)) if index == 0 => Some(inner),
            _ => None,
        }
    }

    /// Follows `path` from this node.
    pub fn at(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self, |node, &i| node.child(i))
    }

    pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter().try_fold(self, |node, &i| node.child_mut(i))
    }

    /// Finds a direct child by field name.
    pub fn field(&self, name: &str) -> Option<&Node> {
        match &self.body {
            Body::Struct(items) => items.iter().find(|n| n.name == name),
            _ => None,
        }
    }

    /// Encoded length of the body, excluding this node's own prefix.
    pub fn body_len(&self) -> usize {
        match &self.body {
            Body::Int(int) => int.raw.len(),
            Body::Bytes { data, .. } => data.len(),
            Body::Repeat(items) | Body::Struct(items) => items.iter().map(Node::encoded_len).sum(),
            Body::Const(bytes) => bytes.len(),
            Body::Cond(inner) => inner.as_ref().map_or(0, |n| n.encoded_len()),
        }
    }

    /// Encoded length including the prefix.
    pub fn encoded_len(&self) -> usize {
        self.prefix.as_ref().map_or(0, Prefix::encoded_len) + self.body_len()
    }

    /// Appends the encoding of this node (prefix first) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        if let Some(prefix) = &self.prefix {
            out.extend_from_slice(&prefix.int.raw);
        }
        match &self.body {
            Body::Int(int) => out.extend_from_slice(&int.raw),
            Body::Bytes { data, .. } => out.extend_from_slice(data),
            Body::Repeat(items) | Body::Struct(items) => {
                for item in items {
                    item.encode_into(out);
                }
            }
            Body::Const(bytes) => out.extend_from_slice(bytes),
            Body::Cond(inner) => {
                if let Some(inner) = inner {
                    inner.encode_into(out);
                }
            }
        }
    }

    /// Checks that every prefix in this subtree matches its region and that
    /// every integer's raw bytes still encode its value.
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        if let Some(prefix) = &self.prefix {
            if !prefix.int.raw_is_current() {
                return Err(ConsistencyError::StalePrefixBytes { field: self.name });
            }
            let declared = prefix.declared();
            match prefix.role {
                PrefixRole::ByteLength => {
                    let actual = self.body_len() as u64;
                    if declared != actual {
                        return Err(ConsistencyError::LengthMismatch { field: self.name, declared, actual });
                    }
                }
                PrefixRole::ElementCount => {
                    let Body::Repeat(items) = &self.body else {
                        return Err(ConsistencyError::CountOnNonRepeat { field: self.name });
                    };
                    let actual = items.len() as u64;
                    if declared != actual {
                        return Err(ConsistencyError::CountMismatch { field: self.name, declared, actual });
                    }
                }
            }
        }
        match &self.body {
            Body::Int(int) if !int.raw_is_current() => {
                Err(ConsistencyError::StalePrefixBytes { field: self.name })
            }
            Body::Repeat(items) | Body::Struct(items) => items.iter().try_for_each(Node::verify),
            Body::Cond(Some(inner)) => inner.verify(),
            _ => Ok(()),
        }
    }
}

/// One length-prefixed, identified chunk of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section id as decoded (varuint7).
    pub id: IntValue,
    /// Section body. Its prefix is the section's declared byte length.
    pub content: Node,
}

impl Section {
    pub fn id(&self) -> u8 {
        self.id.value as u8
    }

    /// Custom section name, when this is a custom section with a valid name.
    pub fn custom_name(&self) -> Option<&[u8]> {
        match &self.content.field("name")?.body {
            Body::Bytes { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.raw);
        self.content.encode_into(out);
    }

    pub fn verify(&self) -> Result<(), ConsistencyError> {
        self.content.verify()
    }
}

/// A decoded module: header plus ordered sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub header: Node,
    pub sections: Vec<Section>,
}

impl Module {
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        self.header.verify()?;
        self.sections.iter().try_for_each(Section::verify)
    }

    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len()
            + self
                .sections
                .iter()
                .map(|s| s.id.raw.len() + s.content.encoded_len())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted_repeat(values: &[u64]) -> Node {
        let items = values.iter().map(|v| Node::int("item", IntEncoding::UINT8, *v)).collect();
        Node::new("entries", Body::Repeat(items)).with_prefix(Prefix::new(
            PrefixRole::ElementCount,
            IntEncoding::VARUINT32,
            values.len() as u64,
        ))
    }

    #[test]
    fn encodes_prefix_before_body() {
        let node = counted_repeat(&[10, 20, 30]);
        let mut out = Vec::new();
        node.encode_into(&mut out);
        assert_eq!(out, vec![3, 10, 20, 30]);
        assert_eq!(node.encoded_len(), 4);
        assert_eq!(node.body_len(), 3);
        assert!(node.verify().is_ok());
    }

    #[test]
    fn verify_flags_stale_count() {
        let mut node = counted_repeat(&[10, 20, 30]);
        if let Body::Repeat(items) = &mut node.body {
            items.pop();
        }
        assert_eq!(
            node.verify(),
            Err(ConsistencyError::CountMismatch { field: "entries", declared: 3, actual: 2 })
        );
    }

    #[test]
    fn verify_flags_stale_length() {
        let mut node = Node::bytes("name", b"abc".to_vec())
            .with_prefix(Prefix::new(PrefixRole::ByteLength, IntEncoding::VARUINT32, 3));
        assert!(node.verify().is_ok());
        if let Body::Bytes { data, .. } = &mut node.body {
            data.push(b'd');
        }
        assert!(matches!(node.verify(), Err(ConsistencyError::LengthMismatch { declared: 3, actual: 4, .. })));
    }

    #[test]
    fn paths_address_nested_children() {
        let inner = counted_repeat(&[1, 2]);
        let root = Node::new("payload", Body::Struct(vec![Node::int("a", IntEncoding::VARUINT32, 7), inner]));
        assert_eq!(root.at(&[1, 1]).map(Node::kind), Some(FieldKind::FixedWidthInt));
        assert!(root.at(&[0, 0]).is_none());
        assert!(root.at(&[2]).is_none());
        assert_eq!(root.at(&[]).map(|n| n.name), Some("payload"));
    }

    #[test]
    fn int_set_reports_width_change() {
        let mut int = IntValue::new(IntEncoding::VARUINT32, 127);
        assert_eq!(int.set(128), 1);
        assert_eq!(int.raw, vec![0x80, 0x01]);
        assert_eq!(int.set(0), -1);
    }
}
