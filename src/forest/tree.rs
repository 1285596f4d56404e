//! CART classification tree grown on a (bootstrap) sample of rows.
//!
//! Nodes live in a flat `Vec`; the root is node 0 and children are referenced
//! by index. Splits send `x[feature] <= threshold` to the left child. Leaves
//! hold the class distribution of the training rows that reached them.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class fractions, sums to 1.
        distribution: Vec<f64>,
    },
}

/// Growth limits resolved from [`super::ForestConfig`] for one forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split before settling for the best found so far.
    pub max_features: usize,
}

struct GrowContext<'x, 'y> {
    x: ArrayView2<'x, f64>,
    y: &'y [usize],
    n_classes: usize,
    params: TreeParams,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

impl DecisionTree {
    /// Grow a tree over `samples` (row indices into `x`, duplicates allowed).
    ///
    /// Nodes are expanded from an explicit work stack, so depth is bounded
    /// by the data and not by the thread's call stack.
    pub(crate) fn grow(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let ctx = GrowContext {
            x,
            y,
            n_classes,
            params,
        };
        let mut tree = DecisionTree {
            nodes: vec![Node::Leaf {
                distribution: Vec::new(),
            }],
            n_classes,
        };

        let mut pending = vec![(0usize, samples, 0usize)];
        while let Some((id, samples, depth)) = pending.pop() {
            let counts = class_counts(ctx.y, &samples, ctx.n_classes);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let depth_reached = ctx.params.max_depth.is_some_and(|d| depth >= d);
            let too_small = samples.len() < ctx.params.min_samples_split
                || samples.len() < 2 * ctx.params.min_samples_leaf;

            let split = if pure || depth_reached || too_small {
                None
            } else {
                best_split(&ctx, &samples, &counts, rng)
            };

            let Some(split) = split else {
                tree.nodes[id] = leaf(&counts, samples.len());
                continue;
            };

            // Children are allocated after their parent.
            let left = tree.nodes.len();
            let right = left + 1;
            tree.nodes.push(Node::Leaf {
                distribution: Vec::new(),
            });
            tree.nodes.push(Node::Leaf {
                distribution: Vec::new(),
            });
            tree.nodes[id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| ctx.x[[i, split.feature]] <= split.threshold);
            pending.push((right, right_rows, depth + 1));
            pending.push((left, left_rows, depth + 1));
        }
        tree
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn predict_proba(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = pending.pop() {
            match &self.nodes[idx] {
                Node::Split { left, right, .. } => {
                    pending.push((*left, depth + 1));
                    pending.push((*right, depth + 1));
                }
                Node::Leaf { .. } => deepest = deepest.max(depth),
            }
        }
        deepest
    }
}

fn leaf(counts: &[usize], total: usize) -> Node {
    let total = total.max(1) as f64;
    Node::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

// ---------------------------------------------------------------------------
// Split search
// ---------------------------------------------------------------------------

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in samples {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Visit features in random order. At least `max_features` non-constant
/// features are examined; if none of them gives a valid split, keep going
/// until one does or the features run out.
fn best_split(
    ctx: &GrowContext<'_, '_>,
    samples: &[usize],
    counts: &[usize],
    rng: &mut StdRng,
) -> Option<Split> {
    let mut features: Vec<usize> = (0..ctx.x.ncols()).collect();
    features.shuffle(rng);

    let mut best: Option<Split> = None;
    let mut visited = 0;
    for feature in features {
        if visited >= ctx.params.max_features && best.is_some() {
            break;
        }
        let Some(candidate) = best_split_on(ctx, samples, counts, feature) else {
            continue;
        };
        visited += 1;
        if let Some(split) = candidate {
            if best.map_or(true, |b| split.impurity < b.impurity) {
                best = Some(split);
            }
        }
    }
    best
}

/// Best threshold on one feature. Returns `None` for a constant feature,
/// `Some(None)` when no threshold respects `min_samples_leaf`.
fn best_split_on(
    ctx: &GrowContext<'_, '_>,
    samples: &[usize],
    counts: &[usize],
    feature: usize,
) -> Option<Option<Split>> {
    let mut pairs: Vec<(f64, usize)> = samples
        .iter()
        .map(|&i| (ctx.x[[i, feature]], ctx.y[i]))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first = pairs.first()?.0;
    let last = pairs.last()?.0;
    if first >= last {
        return None;
    }

    let n = pairs.len();
    let min_leaf = ctx.params.min_samples_leaf;
    let mut left = vec![0usize; ctx.n_classes];
    let mut right = counts.to_vec();
    let mut best: Option<Split> = None;

    for k in 0..n - 1 {
        let (value, class) = pairs[k];
        left[class] += 1;
        right[class] -= 1;

        let next = pairs[k + 1].0;
        if value >= next {
            continue;
        }
        let n_left = k + 1;
        let n_right = n - n_left;
        if n_left < min_leaf || n_right < min_leaf {
            continue;
        }

        let impurity = (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right))
            / n as f64;
        if best.map_or(true, |b| impurity < b.impurity) {
            let mut threshold = value + (next - value) / 2.0;
            if threshold >= next {
                threshold = value;
            }
            best = Some(Split {
                feature,
                threshold,
                impurity,
            });
        }
    }
    Some(best)
}
