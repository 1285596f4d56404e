use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::forest::ForestConfig;
use crate::pipeline::Predictor;

pub const CONFIG_ENV: &str = "PENGUINS_CONFIG";
pub const DATASET_ENV: &str = "PENGUINS_DATASET";
pub const TREES_ENV: &str = "PENGUINS_TREES";
pub const SEED_ENV: &str = "PENGUINS_SEED";
pub const CACHE_ENV: &str = "PENGUINS_CACHE";

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Runtime settings. Sources, later ones winning:
/// defaults → JSON file named by `PENGUINS_CONFIG` → `PENGUINS_*` variables
/// → first command-line argument (dataset path).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub forest: ForestConfig,
    /// Reference dataset to load at startup.
    pub dataset_path: Option<PathBuf>,
    /// Keep the fitted forest between predictions instead of refitting each time.
    pub cache_models: bool,
}

impl AppConfig {
    /// Resolve the configuration from the process environment and `args`
    /// (program name already stripped).
    pub fn load<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::resolve(|key| std::env::var(key).ok(), args)
    }

    fn resolve<F, I>(lookup: F, args: I) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        if let Some(path) = args.into_iter().next() {
            config.dataset_path = Some(PathBuf::from(path));
        }
        config
            .forest
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid forest settings: {e}"))?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATASET_ENV) {
            self.dataset_path = Some(PathBuf::from(path));
        }
        if let Some(trees) = lookup(TREES_ENV) {
            self.forest.n_trees = trees
                .trim()
                .parse()
                .with_context(|| format!("{TREES_ENV}='{trees}' is not a tree count"))?;
        }
        if let Some(seed) = lookup(SEED_ENV) {
            self.forest.seed = Some(
                seed.trim()
                    .parse()
                    .with_context(|| format!("{SEED_ENV}='{seed}' is not an integer seed"))?,
            );
        }
        if let Some(flag) = lookup(CACHE_ENV) {
            self.cache_models = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => bail!("{CACHE_ENV}='{other}' is not a boolean"),
            };
        }
        Ok(())
    }

    /// A predictor honoring these settings.
    pub fn predictor(&self) -> Predictor {
        if self.cache_models {
            Predictor::with_cache(self.forest.clone())
        } else {
            Predictor::new(self.forest.clone())
        }
    }
}
