//! Random-forest classifier: bagged CART trees with random feature subsets.
//!
//! ```text
//!  reference matrix + labels
//!        │  bootstrap rows per tree
//!        ▼
//!   ┌──────────────┐
//!   │ DecisionTree │ × n_trees   (random features per split)
//!   └──────────────┘
//!        │  mean of leaf class fractions
//!        ▼
//!   probabilities ─► argmax (lowest index wins ties)
//! ```

mod config;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use tree::DecisionTree;

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result, Stage};
use tree::TreeParams;

// ---------------------------------------------------------------------------
// ClassProbabilities
// ---------------------------------------------------------------------------

/// Predicted class index plus the full distribution it was taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities {
    pub class_index: usize,
    /// One entry per class, in class-index order; sums to 1.
    pub probabilities: Vec<f64>,
}

/// Index of the largest value; the lowest index wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// TrainedForest
// ---------------------------------------------------------------------------

/// A fitted ensemble. Immutable; safe to share between threads.
#[derive(Debug, Clone)]
pub struct TrainedForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl TrainedForest {
    /// Fit a forest on `x` (one row per sample) and class indices `y`.
    pub fn fit(
        config: &ForestConfig,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<Self> {
        config.validate().map_err(PipelineError::InvalidConfig)?;

        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(PipelineError::InsufficientData(
                "reference matrix has no rows".into(),
            ));
        }
        if n_rows != y.len() {
            return Err(PipelineError::DimensionMismatch {
                stage: Stage::Train,
                expected: n_rows,
                actual: y.len(),
            });
        }
        if n_features == 0 {
            return Err(PipelineError::InsufficientData(
                "reference matrix has no feature columns".into(),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(PipelineError::UnknownLabel(format!("class index {bad}")));
        }
        let mut present = vec![false; n_classes];
        for &c in y {
            present[c] = true;
        }
        let distinct = present.iter().filter(|&&p| p).count();
        if distinct < 2 {
            return Err(PipelineError::InsufficientData(format!(
                "labels contain {distinct} distinct class(es); at least 2 are needed"
            )));
        }

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(n_features),
        };

        let mut master = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.random::<u64>());
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::grow(x, y, samples, n_classes, params, &mut rng)
            })
            .collect();

        log::debug!(
            "fitted {} trees on {n_rows}x{n_features} ({} classes, {} features per split, {} leaves)",
            trees.len(),
            n_classes,
            params.max_features,
            trees.iter().map(DecisionTree::n_leaves).sum::<usize>()
        );

        Ok(TrainedForest {
            trees,
            n_features,
            n_classes,
        })
    }

    /// Average the per-tree leaf distributions for one encoded row.
    pub fn predict(&self, query: ArrayView1<'_, f64>) -> Result<ClassProbabilities> {
        if query.len() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                stage: Stage::Predict,
                expected: self.n_features,
                actual: query.len(),
            });
        }

        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probabilities.iter_mut().zip(tree.predict_proba(query)) {
                *acc += p;
            }
        }
        let total: f64 = probabilities.iter().sum();
        if total > 0.0 {
            for p in &mut probabilities {
                *p /= total;
            }
        }

        Ok(ClassProbabilities {
            class_index: argmax(&probabilities),
            probabilities,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

// ---------------------------------------------------------------------------
// RandomForestClassifier – Untrained → fit → Trained → predict*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trained: Option<TrainedForest>,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trained: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit (or refit) the forest. A failed fit leaves the previous state in place.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<&TrainedForest> {
        let forest = TrainedForest::fit(&self.config, x, y, n_classes)?;
        Ok(self.trained.insert(forest))
    }

    pub fn predict(&self, query: ArrayView1<'_, f64>) -> Result<ClassProbabilities> {
        self.trained
            .as_ref()
            .ok_or(PipelineError::ModelNotFitted)?
            .predict(query)
    }

    pub fn is_fitted(&self) -> bool {
        self.trained.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn toy() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [1.0, 10.0],
            [1.5, 11.0],
            [5.0, 1.0],
            [5.5, 2.0],
            [9.0, 6.0],
            [9.5, 5.0],
        ];
        (x, vec![0, 0, 1, 1, 2, 2])
    }

    fn seeded() -> ForestConfig {
        ForestConfig::default().with_seed(11).with_trees(30)
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), 2);
    }

    #[test]
    fn predict_before_fit_fails() {
        let clf = RandomForestClassifier::new(seeded());
        let err = clf.predict(array![1.0, 2.0].view()).unwrap_err();
        assert_eq!(err, PipelineError::ModelNotFitted);
    }

    #[test]
    fn probabilities_sum_to_one_on_training_rows() {
        let (x, y) = toy();
        let mut clf = RandomForestClassifier::new(seeded());
        clf.fit(x.view(), &y, 3).unwrap();
        for row in x.rows() {
            let out = clf.predict(row).unwrap();
            assert_eq!(out.probabilities.len(), 3);
            assert!((out.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            assert!(out.probabilities.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn single_class_is_insufficient() {
        let (x, _) = toy();
        let y = vec![1; 6];
        let mut clf = RandomForestClassifier::new(seeded());
        let err = clf.fit(x.view(), &y, 3).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
        assert!(!clf.is_fitted());
    }

    #[test]
    fn empty_matrix_is_insufficient() {
        let x = Array2::<f64>::zeros((0, 4));
        let err = TrainedForest::fit(&seeded(), x.view(), &[], 3).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn width_mismatch_is_reported() {
        let (x, y) = toy();
        let forest = TrainedForest::fit(&seeded(), x.view(), &y, 3).unwrap();
        let err = forest.predict(array![1.0].view()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = toy();
        let a = TrainedForest::fit(&seeded(), x.view(), &y, 3).unwrap();
        let b = TrainedForest::fit(&seeded(), x.view(), &y, 3).unwrap();
        let q = array![5.2, 3.0];
        assert_eq!(a.predict(q.view()).unwrap(), b.predict(q.view()).unwrap());
    }

    #[test]
    fn absent_class_gets_zero_probability() {
        let (x, y) = toy();
        let forest = TrainedForest::fit(&seeded(), x.view(), &y, 4).unwrap();
        let out = forest.predict(array![1.2, 10.5].view()).unwrap();
        assert_eq!(out.probabilities.len(), 4);
        assert_eq!(out.probabilities[3], 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_fit() {
        let (x, y) = toy();
        let err = TrainedForest::fit(&ForestConfig::default().with_trees(0), x.view(), &y, 3)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}
