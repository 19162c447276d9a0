//!
//! Shared tags used across the field tree, the grammar and the selector.

use std::fmt;

/// Canonical kind of a node in the field tree.
///
/// Every node has exactly one kind, assigned at decode time from its body. The
/// five kinds returned by [`FieldKind::BUCKETED`] are the only ones the engine
/// ever selects for mutation; `Const`, `Cond` and `Struct` nodes are walked but
/// never mutated directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    /// Opaque byte run.
    Bytes,
    /// Ordered sequence of child nodes.
    Repeat,
    /// Fixed marker bytes.
    Const,
    /// Conditionally present field.
    Cond,
    /// Ordered group of named fields.
    Struct,
    /// Variable-length unsigned integer.
    UnsignedLebInt,
    /// Variable-length signed integer.
    SignedLebInt,
    /// Little-endian N-bit integer.
    FixedWidthInt,
}

impl FieldKind {
    /// Kinds that own a classification bucket, in bucket order.
    pub const BUCKETED: [FieldKind; 5] = [
        FieldKind::Bytes,
        FieldKind::Repeat,
        FieldKind::UnsignedLebInt,
        FieldKind::SignedLebInt,
        FieldKind::FixedWidthInt,
    ];

    /// Whether the classifier keeps a bucket for this kind.
    pub fn is_bucketed(self) -> bool {
        Self::BUCKETED.contains(&self)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bytes => "Bytes",
            FieldKind::Repeat => "Repeat",
            FieldKind::Const => "Const",
            FieldKind::Cond => "Cond",
            FieldKind::Struct => "Struct",
            FieldKind::UnsignedLebInt => "UnsignedLebInt",
            FieldKind::SignedLebInt => "SignedLebInt",
            FieldKind::FixedWidthInt => "FixedWidthInt",
        };
        f.write_str(name)
    }
}

/// Numeric encoding of an integer field.
///
/// `bits` is the logical width: a `ULeb128 { bits: 32 }` is a wasm `varuint32`,
/// a `Fixed { bits: 8 }` is a single raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntEncoding {
    ULeb128 { bits: u32 },
    SLeb128 { bits: u32 },
    Fixed { bits: u32 },
}

impl IntEncoding {
    pub const VARUINT1: IntEncoding = IntEncoding::ULeb128 { bits: 1 };
    pub const VARUINT7: IntEncoding = IntEncoding::ULeb128 { bits: 7 };
    pub const VARUINT32: IntEncoding = IntEncoding::ULeb128 { bits: 32 };
    pub const VARINT7: IntEncoding = IntEncoding::SLeb128 { bits: 7 };
    pub const VARINT32: IntEncoding = IntEncoding::SLeb128 { bits: 32 };
    pub const VARINT64: IntEncoding = IntEncoding::SLeb128 { bits: 64 };
    pub const UINT8: IntEncoding = IntEncoding::Fixed { bits: 8 };
    pub const UINT16: IntEncoding = IntEncoding::Fixed { bits: 16 };
    pub const UINT32: IntEncoding = IntEncoding::Fixed { bits: 32 };
    pub const UINT64: IntEncoding = IntEncoding::Fixed { bits: 64 };

    /// The field kind a value-carrying integer of this encoding classifies as.
    pub fn kind(self) -> FieldKind {
        match self {
            IntEncoding::ULeb128 { .. } => FieldKind::UnsignedLebInt,
            IntEncoding::SLeb128 { .. } => FieldKind::SignedLebInt,
            IntEncoding::Fixed { .. } => FieldKind::FixedWidthInt,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntEncoding::ULeb128 { bits }
            | IntEncoding::SLeb128 { bits }
            | IntEncoding::Fixed { bits } => bits,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntEncoding::SLeb128 { .. })
    }

    /// Longest encoding accepted on decode and produced on encode.
    pub fn max_encoded_len(self) -> usize {
        match self {
            IntEncoding::ULeb128 { bits } | IntEncoding::SLeb128 { bits } => {
                ((bits + 6) / 7) as usize
            }
            IntEncoding::Fixed { bits } => (bits / 8) as usize,
        }
    }
}

/// What a value-carrying integer means to the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntRole {
    /// Plain data; eligible for mutation.
    Value,
    /// Selects the variant of a later `Cond` sibling. Mutating it would make
    /// the encoded tree undecodable, so the classifier skips it.
    Discriminant,
}

/// Flavor of a byte run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BytesTag {
    /// Ordinary data.
    Data,
    /// Trailing bytes the section grammar did not consume. Never mutated.
    Overhang,
    /// Constant expression terminated by the `end` opcode. Never mutated,
    /// since a stray terminator inside it would shift every later field.
    InitExpr,
    /// Name of a custom section. It picks the payload grammar, so it is
    /// never mutated.
    SectionName,
}

/// What a node's prefix counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixRole {
    /// Encoded byte length of the node body.
    ByteLength,
    /// Number of elements of a `Repeat` body.
    ElementCount,
}
