//!
//! The mutation engine: one decode, classify, select, mutate, repair and
//! encode pass per call.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::classify::classify;
use crate::codec::Codec;
use crate::config::EngineConfig;
use crate::engine::repair::repair;
use crate::error::{ConfigError, MutateError};
use crate::ops::{bytes, Operator};
use crate::schema::wasm;
use crate::select::WeightedSelector;
use crate::tree::{Body, Module, Node, NodePath, Section};
use crate::types::{BytesTag, FieldKind};

/// Why a section was left untouched this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The section has no node of the selected kind.
    EmptyBucket,
    /// The chosen `Bytes` node is trailing overhang.
    Overhang,
    /// The chosen `Bytes` node is a constant expression or a section name.
    Immutable,
    /// The chosen `Bytes` node holds no data.
    EmptyBytes,
    /// The chosen `Repeat` node has no elements.
    EmptyRepeat,
    /// Standalone integer replacement is disabled in the config.
    StandaloneIntsDisabled,
}

/// A fully resolved mutation: which node, and what to do to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub kind: FieldKind,
    /// Path of the target from the section content root.
    pub path: NodePath,
    pub operator: Operator,
}

/// Result of one mutation step on one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied { kind: FieldKind, operator: &'static str, bytes: isize },
    Skipped { kind: FieldKind, reason: SkipReason },
    /// The step failed and the section was restored to its prior state.
    RolledBack { kind: FieldKind, error: MutateError },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

/// Structure-aware mutator. Owns its random generator; nothing is shared
/// between engines, so a fixed seed replays exactly.
#[derive(Debug, Clone)]
pub struct Engine<R = StdRng> {
    rng: R,
    codec: Codec,
    selector: WeightedSelector,
    config: EngineConfig,
}

impl Engine<StdRng> {
    /// Seeds a new engine with the default configuration.
    pub fn initialize(seed: u32) -> Self {
        Engine {
            rng: StdRng::seed_from_u64(u64::from(seed)),
            codec: Codec::default(),
            selector: WeightedSelector::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(seed: u32, config: EngineConfig) -> Result<Self, ConfigError> {
        Self::from_parts(StdRng::seed_from_u64(u64::from(seed)), Codec::default(), config)
    }
}

impl<R: RngCore> Engine<R> {
    pub fn from_parts(rng: R, codec: Codec, config: EngineConfig) -> Result<Self, ConfigError> {
        let selector = WeightedSelector::new(config.weights.clone())?;
        Ok(Engine { rng, codec, selector, config })
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut Codec {
        &mut self.codec
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutates one buffer. Input that does not decode is returned unchanged;
    /// `_aux` is reserved for splicing and currently ignored.
    pub fn mutate(&mut self, buf: &[u8], _aux: &[u8]) -> Vec<u8> {
        let mut module = match self.codec.decode(buf) {
            Ok(module) => module,
            Err(err) => {
                tracing::debug!("Input did not decode ({}); returning it unchanged", err);
                return buf.to_vec();
            }
        };
        self.mutate_module(&mut module);
        if let Err(err) = module.verify() {
            tracing::error!("Mutated module failed verification: {}", err);
            return buf.to_vec();
        }
        self.codec.encode(&module)
    }

    /// Runs one mutation step on every section of `module`.
    pub fn mutate_module(&mut self, module: &mut Module) -> Vec<Outcome> {
        module
            .sections
            .iter_mut()
            .map(|section| self.mutate_section(section))
            .collect()
    }

    /// Selects a kind, picks a target and applies a matching operator.
    pub fn mutate_section(&mut self, section: &mut Section) -> Outcome {
        match self.plan(&section.content) {
            Ok(choice) => self.apply(section, &choice),
            Err((kind, reason)) => {
                tracing::debug!(
                    "Skipping {} section: selected {}, {:?}",
                    wasm::section_name(section.id()),
                    kind,
                    reason
                );
                Outcome::Skipped { kind, reason }
            }
        }
    }

    /// Draws a kind and resolves it to a concrete operator on a concrete node.
    pub fn plan(&mut self, content: &Node) -> Result<Choice, (FieldKind, SkipReason)> {
        let kind = self.selector.select(&mut self.rng);
        let buckets = classify(content);
        let bucket = buckets.get(kind);
        if bucket.is_empty() {
            return Err((kind, SkipReason::EmptyBucket));
        }
        let path = bucket[self.rng.gen_range(0..bucket.len())].clone();
        let Some(node) = content.at(&path) else {
            return Err((kind, SkipReason::EmptyBucket));
        };

        let operator = match (kind, &node.body) {
            (FieldKind::Bytes, Body::Bytes { data, tag }) => match tag {
                BytesTag::Overhang => return Err((kind, SkipReason::Overhang)),
                BytesTag::InitExpr | BytesTag::SectionName => return Err((kind, SkipReason::Immutable)),
                BytesTag::Data if data.is_empty() => return Err((kind, SkipReason::EmptyBytes)),
                BytesTag::Data => Operator::Bytes(self.rng.gen_range(0..bytes::CATALOGUE.len())),
            },
            (FieldKind::Repeat, Body::Repeat(items)) => {
                if items.is_empty() {
                    return Err((kind, SkipReason::EmptyRepeat));
                }
                let index = self.rng.gen_range(0..items.len());
                self.repeat_operator(index, items[index].is_scalar())
            }
            _ if !self.config.standalone_int_replacement => {
                return Err((kind, SkipReason::StandaloneIntsDisabled))
            }
            _ => Operator::ReplaceInt,
        };
        Ok(Choice { kind, path, operator })
    }

    fn repeat_operator(&mut self, index: usize, scalar: bool) -> Operator {
        if !scalar {
            return if self.rng.gen_bool(0.5) {
                Operator::CloneElement(index)
            } else {
                Operator::DeleteElement(index)
            };
        }
        if self.rng.gen_bool(0.5) {
            match self.rng.gen_range(0..3) {
                0 => Operator::Increment(index),
                1 => Operator::CloneElement(index),
                _ => Operator::Decrement(index),
            }
        } else {
            Operator::ReplaceElement(index)
        }
    }

    /// Applies `choice` to `section`, repairing every prefix it invalidates.
    /// On failure the section is restored and the error reported in the
    /// outcome.
    pub fn apply(&mut self, section: &mut Section, choice: &Choice) -> Outcome {
        let snapshot = section.content.clone();
        match self.try_apply(&mut section.content, choice) {
            Ok(bytes) => {
                tracing::trace!(
                    "Applied {} to {} node at {:?} in {} section ({:+} bytes)",
                    choice.operator.name(),
                    choice.kind,
                    choice.path,
                    wasm::section_name(section.id()),
                    bytes
                );
                Outcome::Applied { kind: choice.kind, operator: choice.operator.name(), bytes }
            }
            Err(error) => {
                tracing::warn!(
                    "Rolling back {} on {} section: {}",
                    choice.operator.name(),
                    wasm::section_name(section.id()),
                    error
                );
                section.content = snapshot;
                Outcome::RolledBack { kind: choice.kind, error }
            }
        }
    }

    fn try_apply(&mut self, content: &mut Node, choice: &Choice) -> Result<isize, MutateError> {
        let target = content
            .at_mut(&choice.path)
            .ok_or_else(|| MutateError::InvalidPath(choice.path.clone()))?;
        let delta = choice
            .operator
            .apply(target, &mut self.rng, self.config.max_bytes_growth)?;
        let grown = repair(content, &choice.path, delta)?;
        if let Err(err) = content.verify() {
            tracing::error!("Repaired section is inconsistent: {}", err);
            return Err(err.into());
        }
        Ok(grown)
    }
}
