//!
//! Defines error types for the mutation engine.

use crate::types::FieldKind;

/// Errors raised while decoding a buffer into a field tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before a field was complete.
    #[error("Unexpected end of input at offset {offset} (wanted {wanted} more bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },
    /// Marker bytes did not match the grammar.
    #[error("Constant mismatch at offset {offset}, expected {expected:02x?}")]
    ConstMismatch { offset: usize, expected: &'static [u8] },
    /// A LEB128 integer ran past its maximum encoded length.
    #[error("LEB128 integer at offset {offset} is too long")]
    LebTooLong { offset: usize },
    /// A LEB128 integer does not fit the declared bit width.
    #[error("LEB128 integer at offset {offset} does not fit in {bits} bits")]
    LebOutOfRange { offset: usize, bits: u32 },
    /// A discriminant selected no known variant.
    #[error("Unknown variant {value} for field `{field}`")]
    UnknownVariant { field: &'static str, value: u64 },
    /// A length-prefixed region was not fully consumed by its grammar.
    #[error("Field `{field}` left {remaining} trailing bytes in its sized region")]
    TrailingBytes { field: &'static str, remaining: usize },
    /// A repeat element consumed no input, so its count cannot be trusted.
    #[error("Element of `{field}` consumed no input")]
    ZeroSizedElement { field: &'static str },
    /// A conditional field refers to a sibling that was not decoded before it.
    #[error("Conditional field `{field}` has no preceding discriminant")]
    MissingDiscriminant { field: &'static str },
}

/// A declared length or count disagrees with the region it describes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("Field `{field}` declares {declared} bytes but encodes {actual}")]
    LengthMismatch { field: &'static str, declared: u64, actual: u64 },
    #[error("Field `{field}` declares {declared} elements but holds {actual}")]
    CountMismatch { field: &'static str, declared: u64, actual: u64 },
    #[error("Prefix of field `{field}` has raw bytes that do not encode its value")]
    StalePrefixBytes { field: &'static str },
    #[error("Field `{field}` has an element-count prefix but is not a Repeat")]
    CountOnNonRepeat { field: &'static str },
}

/// Errors raised by a single mutation step. The engine rolls the section back
/// when one of these surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutateError {
    /// A node path no longer addresses a node.
    #[error("Node path {0:?} does not address a node")]
    InvalidPath(Vec<usize>),
    /// Repair would drive a prefix below zero.
    #[error("Prefix of field `{field}` would underflow")]
    PrefixUnderflow { field: &'static str },
    /// Repair produced a value the prefix encoding cannot represent.
    #[error("Prefix of field `{field}` cannot represent {value}")]
    PrefixOverflow { field: &'static str, value: u64 },
    /// A Repeat holds both scalar and composite elements.
    #[error("Repeat `{field}` mixes scalar and composite elements; unsupported")]
    MixedRepeat { field: &'static str },
    /// The addressed node is not of the kind the operator expects.
    #[error("Operator expected a {expected} node at `{field}`")]
    NotApplicable { field: &'static str, expected: FieldKind },
    /// The repaired tree failed its self-consistency check.
    #[error("Repaired tree is inconsistent: {0}")]
    Inconsistent(#[from] ConsistencyError),
}

/// Errors in the engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Weight table is empty")]
    EmptyWeights,
    #[error("Weight for {0} must be positive")]
    ZeroWeight(FieldKind),
    #[error("Weight table lists {0} more than once")]
    DuplicateKind(FieldKind),
    #[error("{0} has no classification bucket and cannot be weighted")]
    UnselectableKind(FieldKind),
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Mutation failed: {0}")]
    Mutate(#[from] MutateError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
