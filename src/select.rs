//!
//! Weighted choice of the field kind to mutate next.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::FieldKind;

/// One row of the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindWeight {
    pub kind: FieldKind,
    pub weight: u32,
}

/// Ordered (kind, weight) table. Order matters only for replay determinism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    entries: Vec<KindWeight>,
}

impl Default for WeightTable {
    fn default() -> Self {
        WeightTable::new([
            (FieldKind::Repeat, 2),
            (FieldKind::Bytes, 6),
            (FieldKind::UnsignedLebInt, 1),
            (FieldKind::SignedLebInt, 1),
            (FieldKind::FixedWidthInt, 1),
        ])
    }
}

impl WeightTable {
    /// Builds a table without validating it; see [`WeightTable::validate`].
    pub fn new(entries: impl IntoIterator<Item = (FieldKind, u32)>) -> Self {
        WeightTable {
            entries: entries
                .into_iter()
                .map(|(kind, weight)| KindWeight { kind, weight })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[KindWeight] {
        &self.entries
    }

    pub fn weight(&self, kind: FieldKind) -> Option<u32> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| e.weight)
    }

    /// Sum of all weights, widened so it cannot overflow.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.weight)).sum()
    }

    /// Rejects tables the selector cannot draw from fairly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyWeights);
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.kind.is_bucketed() {
                return Err(ConfigError::UnselectableKind(entry.kind));
            }
            if entry.weight == 0 {
                return Err(ConfigError::ZeroWeight(entry.kind));
            }
            if self.entries[..i].iter().any(|e| e.kind == entry.kind) {
                return Err(ConfigError::DuplicateKind(entry.kind));
            }
        }
        Ok(())
    }
}

/// Draws field kinds with probability `weight / total`.
#[derive(Debug, Clone)]
pub struct WeightedSelector {
    table: WeightTable,
    total: u64,
}

impl Default for WeightedSelector {
    fn default() -> Self {
        let table = WeightTable::default();
        let total = table.total();
        WeightedSelector { table, total }
    }
}

impl WeightedSelector {
    pub fn new(table: WeightTable) -> Result<Self, ConfigError> {
        table.validate()?;
        let total = table.total();
        Ok(WeightedSelector { table, total })
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Draws one kind.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> FieldKind {
        self.pick(rng.gen_range(0..self.total))
    }

    /// Maps a draw `r` in `[0, total)` to the first kind whose cumulative
    /// weight is strictly greater than `r`. Each kind therefore owns exactly
    /// `weight` consecutive draw values.
    pub fn pick(&self, r: u64) -> FieldKind {
        let mut acc = 0u64;
        for entry in &self.table.entries {
            acc += u64::from(entry.weight);
            if r < acc {
                return entry.kind;
            }
        }
        // r >= total only when called directly with an out-of-range draw.
        self.table.entries[self.table.entries.len() - 1].kind
    }
}
