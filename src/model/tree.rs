//! Regression tree (CART, squared-error criterion).
//!
//! Nodes are stored in a flat array in pre-order, so every child index is strictly
//! greater than its parent's. A split sends a row left when
//! `x[feature] <= threshold`.
//!
//! Training:
//! - thresholds are midpoints between adjacent distinct values of a feature
//! - the best split minimizes the summed squared error of both children
//! - the per-node search runs in parallel over features (rayon)
//! - ties resolve to the lowest feature index, then the lowest threshold

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::Regressor;

/// Minimum SSE improvement for a split to be kept.
const MIN_GAIN: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
        samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

/// Stopping rules for tree growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl RegressionTree {
    /// Check structural invariants of a deserialized tree.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.nodes.is_empty() {
            return Err(AppError::input("Decision tree has no nodes."));
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= self.n_features {
                        return Err(AppError::input(format!(
                            "Tree node {i}: feature {feature} out of range (n_features={}).",
                            self.n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(AppError::input(format!("Tree node {i}: non-finite threshold.")));
                    }
                    if left <= i || right <= i || left >= n || right >= n {
                        return Err(AppError::input(format!(
                            "Tree node {i}: invalid children ({left}, {right})."
                        )));
                    }
                }
                TreeNode::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(AppError::input(format!("Tree node {i}: non-finite leaf value.")));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], i: usize) -> usize {
            match nodes.get(i) {
                Some(TreeNode::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Grow a tree on row-major `rows` and targets `y`.
    pub fn fit(rows: &[Vec<f64>], y: &[f64], params: TreeParams) -> Result<Self, AppError> {
        if rows.is_empty() || rows.len() != y.len() {
            return Err(AppError::runtime(format!(
                "Cannot fit tree: {} rows vs {} targets.",
                rows.len(),
                y.len()
            )));
        }
        let n_features = rows[0].len();
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(AppError::runtime("Cannot fit tree: ragged feature rows."));
        }
        if params.min_samples_leaf == 0 {
            return Err(AppError::input("min_samples_leaf must be >= 1."));
        }

        let mut builder = Builder {
            rows,
            y,
            params,
            nodes: Vec::new(),
        };
        let indices: Vec<usize> = (0..rows.len()).collect();
        builder.grow(indices, 0);

        Ok(Self {
            n_features,
            nodes: builder.nodes,
        })
    }
}

impl Regressor for RegressionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let mut i = 0;
        // Validated trees descend strictly; the bound guards unvalidated ones.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(i) {
                Some(TreeNode::Leaf { value, .. }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let Some(x) = features.get(*feature) else {
                        return f64::NAN;
                    };
                    i = if *x <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
        f64::NAN
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

struct Builder<'a> {
    rows: &'a [Vec<f64>],
    y: &'a [f64],
    params: TreeParams,
    nodes: Vec<TreeNode>,
}

impl Builder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        let n = indices.len();
        let mean = indices.iter().map(|&i| self.y[i]).sum::<f64>() / n as f64;
        self.nodes.push(TreeNode::Leaf { value: mean, samples: n });

        let parent_sse: f64 = indices.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();
        let can_split = depth < self.params.max_depth
            && n >= self.params.min_samples_split
            && n >= 2 * self.params.min_samples_leaf
            && parent_sse > MIN_GAIN;
        if !can_split {
            return id;
        }

        let Some(best) = self.best_split(&indices, mean) else {
            return id;
        };
        if parent_sse - best.sse <= MIN_GAIN {
            return id;
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][best.feature] <= best.threshold);

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[id] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, indices: &[usize], mean: f64) -> Option<SplitCandidate> {
        let n_features = self.rows[0].len();
        let per_feature: Vec<Option<SplitCandidate>> = (0..n_features)
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(indices, mean, feature))
            .collect();

        // Sequential fold keeps ties deterministic (lowest feature wins).
        per_feature.into_iter().flatten().fold(None, |best, cand| match best {
            Some(b) if b.sse <= cand.sse => Some(b),
            _ => Some(cand),
        })
    }

    fn best_split_for_feature(&self, indices: &[usize], mean: f64, feature: usize) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (self.rows[i][feature], self.y[i] - mean))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
        let min_leaf = self.params.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..n {
            let (x_prev, y_prev) = pairs[k - 1];
            left_sum += y_prev;
            left_sq += y_prev * y_prev;

            let x_next = pairs[k].0;
            if x_next <= x_prev {
                continue;
            }
            let n_left = k;
            let n_right = n - k;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.map(|b| sse < b.sse).unwrap_or(true) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: x_prev + (x_next - x_prev) / 2.0,
                    sse,
                });
            }
        }

        best
    }
}
