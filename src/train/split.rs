//! Per-label train/test partition driven by a seeded ChaCha8 RNG.

use crate::dataset::Dataset;
use crate::features::FeatureVector;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Rows as (class index, vector); class indices follow `Dataset::labels()` order.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: Vec<(usize, FeatureVector)>,
    pub test: Vec<(usize, FeatureVector)>,
}

/// Shuffle each label's vectors and hold out `round(n * test_fraction)` of them, at least one
/// and never all. Labels are visited in sorted order with a single RNG, so the split depends
/// only on the dataset contents and `seed`.
pub fn stratified_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut split = Split::default();

    for (class, (_, vectors)) in dataset.iter().enumerate() {
        let n = vectors.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);

        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };
        let (test, train) = order.split_at(n_test);
        split.test.extend(test.iter().map(|&i| (class, vectors[i])));
        split.train.extend(train.iter().map(|&i| (class, vectors[i])));
    }
    split
}
