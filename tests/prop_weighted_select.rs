use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use wasm_mutator_core::{FieldKind, WeightTable, WeightedSelector};

/// Chi-square critical value for 4 degrees of freedom at p = 0.001.
const CHI2_CRITICAL_DF4: f64 = 18.467;

fn chi_square(selector: &WeightedSelector, seed: u64, draws: usize) -> f64 {
    let table = selector.table();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut observed = vec![0usize; table.entries().len()];
    for _ in 0..draws {
        let kind = selector.select(&mut rng);
        let slot = table.entries().iter().position(|e| e.kind == kind).unwrap();
        observed[slot] += 1;
    }
    let total = table.total() as f64;
    table
        .entries()
        .iter()
        .zip(&observed)
        .map(|(entry, &seen)| {
            let expected = draws as f64 * f64::from(entry.weight) / total;
            (seen as f64 - expected).powi(2) / expected
        })
        .sum()
}

#[test]
fn default_weights_fit_declared_ratios() {
    let selector = WeightedSelector::new(WeightTable::default()).unwrap();
    for seed in [1, 2, 3] {
        let chi2 = chi_square(&selector, seed, 11_000);
        assert!(chi2 < CHI2_CRITICAL_DF4, "seed {seed}: chi2 = {chi2}");
    }
}

#[test]
fn every_draw_maps_to_its_weight_band() {
    let table = WeightTable::new([
        (FieldKind::Repeat, 2),
        (FieldKind::Bytes, 6),
        (FieldKind::UnsignedLebInt, 1),
        (FieldKind::SignedLebInt, 1),
        (FieldKind::FixedWidthInt, 1),
    ]);
    let selector = WeightedSelector::new(table.clone()).unwrap();
    let mut hits = vec![0u32; table.entries().len()];
    for r in 0..table.total() {
        let kind = selector.pick(r);
        let slot = table.entries().iter().position(|e| e.kind == kind).unwrap();
        hits[slot] += 1;
    }
    let weights: Vec<u32> = table.entries().iter().map(|e| e.weight).collect();
    assert_eq!(hits, weights);
}

proptest! {
    /// For any valid table, each kind owns exactly `weight` draw values.
    #[test]
    fn bands_match_arbitrary_weights(weights in proptest::collection::vec(1u32..50, 5)) {
        let table = WeightTable::new(FieldKind::BUCKETED.into_iter().zip(weights.iter().copied()));
        let selector = WeightedSelector::new(table.clone()).unwrap();
        let mut hits = vec![0u32; 5];
        for r in 0..table.total() {
            let kind = selector.pick(r);
            let slot = FieldKind::BUCKETED.iter().position(|k| *k == kind).unwrap();
            hits[slot] += 1;
        }
        prop_assert_eq!(hits, weights);
    }
}
