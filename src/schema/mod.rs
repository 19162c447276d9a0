//!
//! Declarative grammar for the container format.
//!
//! A grammar is a tree of `'static` [`Shape`]s. The codec interprets shapes to
//! turn bytes into a field tree; the tree itself is self-describing, so
//! encoding never needs the grammar again.

pub mod wasm;

use crate::types::IntEncoding;

/// How far a byte run or a repeat extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Preceded by an integer: the byte length for `Bytes`, the element
    /// count for `Repeat`.
    Prefixed(IntEncoding),
    /// Runs to the end of the enclosing sized region.
    Remaining,
}

/// Outcome of resolving a conditional field against its discriminant.
#[derive(Debug, Clone, Copy)]
pub enum Variant {
    Absent,
    Present(&'static Shape),
    Unknown,
}

/// Picks the variant of a conditional field from its discriminant's value.
pub type Selector = fn(u64) -> Variant;

/// One grammar production.
#[derive(Debug)]
pub enum Shape {
    /// Fixed marker bytes.
    Const(&'static [u8]),
    /// Integer data.
    Int(IntEncoding),
    /// Integer that selects the variant of a later `Cond` sibling.
    Discriminant(IntEncoding),
    /// Byte run.
    Bytes(Extent),
    /// Constant expression up to and including the `end` opcode.
    InitExpr,
    /// Homogeneous sequence.
    Repeat { extent: Extent, elem: &'static Shape },
    /// Ordered named fields.
    Struct(&'static [Field]),
    /// Byte-length-prefixed region that `inner` must consume exactly.
    Sized { len: IntEncoding, inner: &'static Shape },
    /// Field whose presence and shape depend on the preceding sibling `on`.
    Cond { on: &'static str, select: Selector },
}

/// A named field of a `Struct`.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
}
