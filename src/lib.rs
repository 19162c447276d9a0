#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! wasm-mutator-core is a structure-aware mutation engine for WebAssembly
//! modules.
//!
//! Each call decodes a module into a typed field tree, picks a field kind by
//! weight, mutates one field of that kind in every section, repairs every
//! length and count prefix the mutation invalidated, and encodes the tree
//! back. The output may be semantically invalid but is always structurally
//! self-consistent.

// Shared tags (field kinds, integer encodings).
pub mod types;

// Module for LEB128 and fixed-width integer primitives.
pub mod primitives;

// Module for error types.
pub mod error;

// Field tree: nodes, sections, modules.
pub mod tree;

// Declarative grammar and the WebAssembly section grammars.
pub mod schema;

// Bytes <-> field tree.
pub mod codec;

pub mod classify;
pub mod select;
pub mod config;

// Mutation operator catalogue.
pub mod ops;

// Mutation engine and length/count repair.
pub mod engine;

// Harness-facing callbacks.
pub mod harness;

#[cfg(feature = "log-subscriber")]
pub mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::Codec;
pub use config::EngineConfig;
pub use engine::{Choice, Engine, Outcome, SkipReason};
pub use error::{ConfigError, ConsistencyError, DecodeError, Error, MutateError};
pub use harness::CustomMutator;
pub use select::{WeightTable, WeightedSelector};
pub use types::FieldKind;
