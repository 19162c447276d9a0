//!
//! Mutation operator catalogue.
//!
//! Every operator mutates one node in place and reports the resulting
//! [`SizeDelta`]; it never touches prefixes. Fixing the prefixes on the
//! path back to the section root is the job of [`crate::engine::repair`].

pub mod bytes;
pub mod int;
pub mod structure;

use rand_core::RngCore;

use crate::error::MutateError;
use crate::tree::Node;

/// Change in one node's body, fed to repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeDelta {
    /// Change in the encoded body length of the node, in bytes.
    pub bytes: isize,
    /// Change in the node's element count (Repeat nodes only).
    pub count: isize,
}

impl SizeDelta {
    pub fn bytes(bytes: isize) -> Self {
        SizeDelta { bytes, count: 0 }
    }
}

/// A concrete operator bound to its target within the addressed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Byte-level operator, an index into [`bytes::CATALOGUE`].
    Bytes(usize),
    /// Duplicate a Repeat element next to itself.
    CloneElement(usize),
    /// Remove a Repeat element.
    DeleteElement(usize),
    /// Add one to a scalar Repeat element.
    Increment(usize),
    /// Subtract one from a scalar Repeat element.
    Decrement(usize),
    /// Replace a scalar Repeat element with a new value of its encoding.
    ReplaceElement(usize),
    /// Replace the value of a standalone integer node.
    ReplaceInt,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Bytes(i) => bytes::CATALOGUE.get(*i).map_or("bytes", |(name, _)| *name),
            Operator::CloneElement(_) => "clone_element",
            Operator::DeleteElement(_) => "delete_element",
            Operator::Increment(_) => "increment",
            Operator::Decrement(_) => "decrement",
            Operator::ReplaceElement(_) => "replace_element",
            Operator::ReplaceInt => "replace_int",
        }
    }

    /// Applies the operator to `node`.
    pub fn apply(&self, node: &mut Node, rng: &mut dyn RngCore, max_growth: usize) -> Result<SizeDelta, MutateError> {
        match *self {
            Operator::Bytes(i) => bytes::apply(node, i, rng, max_growth),
            Operator::CloneElement(i) => structure::clone_element(node, i),
            Operator::DeleteElement(i) => structure::delete_element(node, i),
            Operator::Increment(i) => int::step_element(node, i, 1),
            Operator::Decrement(i) => int::step_element(node, i, -1),
            Operator::ReplaceElement(i) => int::replace_element(node, i, rng),
            Operator::ReplaceInt => int::replace_node(node, rng),
        }
    }
}
