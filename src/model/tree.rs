//! CART classification tree (Gini impurity) stored as a flat node arena.

use ndarray::ArrayView2;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Class fractions of the training rows that reached this leaf
    Leaf { distribution: Vec<f64> },
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct GrowCtx<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Fit on the given row indices (duplicates allowed, as in a bootstrap sample).
    pub fn fit<'a>(
        x: ArrayView2<'a, f64>,
        y: &'a [usize],
        rows: &[usize],
        n_classes: usize,
        params: TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let ctx = GrowCtx {
            x,
            y,
            n_classes,
            params,
        };
        let mut tree = Self {
            nodes: Vec::new(),
            n_classes,
        };
        let mut rows = rows.to_vec();
        tree.grow(&ctx, &mut rows, 0, rng);
        tree
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Leaf class distribution for one sample.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Structural sanity for a deserialized tree: child links in range and pointing forward,
    /// leaves sized to the class count, split features below `n_features`.
    pub fn is_well_formed(&self, n_features: usize) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.iter().enumerate().all(|(i, node)| match node {
            Node::Leaf { distribution } => {
                distribution.len() == self.n_classes && distribution.iter().all(|p| p.is_finite() && *p >= 0.0)
            }
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                *feature < n_features
                    && threshold.is_finite()
                    && *left > i
                    && *right > i
                    && *left < self.nodes.len()
                    && *right < self.nodes.len()
            }
        })
    }

    fn grow(&mut self, ctx: &GrowCtx<'_>, rows: &mut [usize], depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let counts = class_counts(ctx.y, rows, ctx.n_classes);
        let node_id = self.nodes.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = ctx.params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || rows.len() < ctx.params.min_samples_split {
            self.nodes.push(leaf(&counts));
            return node_id;
        }

        let Some(split) = best_split(ctx, rows, rng) else {
            self.nodes.push(leaf(&counts));
            return node_id;
        };

        // Placeholder until both children exist
        self.nodes.push(leaf(&counts));
        let mid = partition(rows, |r| ctx.x[[r, split.feature]] <= split.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(ctx, left_rows, depth + 1, rng);
        let right = self.grow(ctx, right_rows, depth + 1, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }
}

fn leaf(counts: &[usize]) -> Node {
    let total: usize = counts.iter().sum();
    let distribution = counts
        .iter()
        .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
        .collect();
    Node::Leaf { distribution }
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &r in rows {
        counts[y[r]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Lowest weighted child impurity over `max_features` randomly ordered features. Features
/// constant over `rows` are passed over without counting toward `max_features`, so a split is
/// found whenever any feature varies. Ties keep the first candidate found, so the result
/// depends only on the RNG state.
fn best_split(ctx: &GrowCtx<'_>, rows: &[usize], rng: &mut ChaCha8Rng) -> Option<SplitCandidate> {
    let n = rows.len();
    if n < 2 {
        return None;
    }
    let n_features = ctx.x.ncols();
    if n_features == 0 {
        return None;
    }
    let k = ctx.params.max_features.clamp(1, n_features);
    let order = sample(rng, n_features, n_features).into_vec();

    let mut best: Option<SplitCandidate> = None;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);
    let mut visited = 0;
    for feature in order {
        if visited == k {
            break;
        }
        column.clear();
        column.extend(rows.iter().map(|&r| (ctx.x[[r, feature]], ctx.y[r])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        if column[0].0 >= column[n - 1].0 {
            continue;
        }
        visited += 1;
        scan_column(&column, feature, ctx.n_classes, &mut best);
    }
    best
}

/// Sweep thresholds between consecutive distinct values of one sorted column.
fn scan_column(column: &[(f64, usize)], feature: usize, n_classes: usize, best: &mut Option<SplitCandidate>) {
    let n = column.len();
    let mut left = vec![0usize; n_classes];
    let mut right = vec![0usize; n_classes];
    for &(_, class) in column {
        right[class] += 1;
    }

    for i in 0..n - 1 {
        let class = column[i].1;
        left[class] += 1;
        right[class] -= 1;
        let (lo, hi) = (column[i].0, column[i + 1].0);
        if lo >= hi {
            continue;
        }
        let n_left = i + 1;
        let n_right = n - n_left;
        let impurity =
            (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right)) / n as f64;
        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            let mut threshold = lo + (hi - lo) / 2.0;
            // Midpoint can round up to `hi` for adjacent floats
            if threshold >= hi {
                threshold = lo;
            }
            *best = Some(SplitCandidate {
                feature,
                threshold,
                impurity,
            });
        }
    }
}

/// Stable in-place partition; returns the count of rows satisfying `pred`.
fn partition(rows: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let (mut yes, no): (Vec<usize>, Vec<usize>) = rows.iter().copied().partition(|&r| pred(r));
    let mid = yes.len();
    yes.extend(no);
    rows.copy_from_slice(&yes);
    mid
}
