use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MaxFeatures – size of the random feature subset per split
// ---------------------------------------------------------------------------

/// How many candidate features each split draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`
    Sqrt,
    /// `ceil(log2(n_features))`
    Log2,
    All,
    Fixed(usize),
    /// Fraction of the features in `(0, 1]`.
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a concrete count in `1..=n_features`.
    pub fn resolve(self, n_features: usize) -> usize {
        if n_features == 0 {
            return 0;
        }
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2 => n.log2().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
        };
        k.clamp(1, n_features)
    }
}

// ---------------------------------------------------------------------------
// ForestConfig
// ---------------------------------------------------------------------------

/// Random-forest hyperparameters. Defaults follow the common
/// 100-tree, sqrt-features, fully-grown-trees setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows each tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw each tree's rows with replacement.
    pub bootstrap: bool,
    /// Fixed seed for reproducible forests; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: None,
        }
    }
}

impl ForestConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_trees == 0 {
            return Err("n_trees must be at least 1".to_string());
        }
        if self.min_samples_split < 2 {
            return Err("min_samples_split must be at least 2".to_string());
        }
        if self.min_samples_leaf == 0 {
            return Err("min_samples_leaf must be at least 1".to_string());
        }
        if self.max_depth == Some(0) {
            return Err("max_depth must be at least 1 when set".to_string());
        }
        match self.max_features {
            MaxFeatures::Fixed(0) => return Err("max_features must be at least 1".to_string()),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(format!("max_features fraction {f} is not in (0, 1]"));
            }
            _ => {}
        }
        Ok(())
    }
}
