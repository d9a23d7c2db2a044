//! Bagged ensemble of CART trees with probability voting.

use super::tree::{DecisionTree, TreeParams};
use crate::config::ForestConfig;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
    seed: u64,
}

/// Per-tree seed; independent of how many trees precede it in any build order.
fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl RandomForest {
    /// Fit `config.n_trees` trees, each on a bootstrap sample of the rows of `x`.
    /// `y[i]` is the class index of row `i`, below `n_classes`.
    pub fn fit(x: &Array2<f64>, y: &[usize], n_classes: usize, config: &ForestConfig, seed: u64) -> Self {
        let n_rows = x.nrows();
        let n_features = x.ncols();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            max_features: config
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
                .max(1),
        };

        let trees = (0..config.n_trees)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed(seed, t));
                let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(x.view(), y, &bootstrap, n_classes, params, &mut rng)
            })
            .collect();

        Self {
            trees,
            n_classes,
            n_features,
            seed,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of per-tree leaf distributions, renormalized to sum to 1.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba(features)) {
                *a += p;
            }
        }
        let total: f64 = acc.iter().sum();
        if total > 0.0 {
            acc.iter_mut().for_each(|a| *a /= total);
        } else if self.n_classes > 0 {
            acc.fill(1.0 / self.n_classes as f64);
        }
        acc
    }

    /// Class index with the highest probability; lowest index wins ties.
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self
                .trees
                .iter()
                .all(|t| t.n_classes() == self.n_classes && t.is_well_formed(self.n_features))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
