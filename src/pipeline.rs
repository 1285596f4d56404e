//! One prediction: encode → label → fit → predict → compose.
//!
//! By default every call fits a fresh forest on the reference data. A
//! [`Predictor::with_cache`] predictor instead keeps the last fitted forest,
//! keyed by the reference fingerprint, the feature layout, the label codec
//! and the forest configuration.

use std::sync::{Arc, Mutex, PoisonError};

use crate::compose::{compose, ResultRecord};
use crate::data::model::{RawRecord, ReferenceDataset};
use crate::encode::{EncodedFeatures, FeatureEncoder, FeatureLayout, NovelCategory};
use crate::error::{PipelineError, Result, Stage};
use crate::forest::{ForestConfig, TrainedForest};
use crate::labels::LabelCodec;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub class_index: usize,
    /// In `LabelCodec::class_order` order.
    pub probabilities: Vec<f64>,
    pub record: RawRecord,
}

/// Everything a caller gets back from a successful prediction.
#[derive(Debug, Clone)]
pub struct PredictionReport {
    pub result: ResultRecord,
    pub prediction: PredictionResult,
    /// Novel-category notices; non-empty means low confidence.
    pub advisories: Vec<NovelCategory>,
    pub layout: FeatureLayout,
}

impl PredictionReport {
    pub fn predicted_label(&self) -> &str {
        &self.result.prediction
    }

    pub fn is_low_confidence(&self) -> bool {
        !self.advisories.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ModelCache
// ---------------------------------------------------------------------------

struct CacheEntry {
    fingerprint: blake3::Hash,
    layout: FeatureLayout,
    codec: LabelCodec,
    config: ForestConfig,
    forest: Arc<TrainedForest>,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    hits: usize,
    misses: usize,
}

/// Single-slot cache of the most recently fitted forest.
#[derive(Default)]
pub struct ModelCache {
    state: Mutex<CacheState>,
}

/// Hit/miss counters of a [`ModelCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl ModelCache {
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            hits: state.hits,
            misses: state.misses,
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entry = None;
    }

    fn get_or_fit(
        &self,
        reference: &ReferenceDataset,
        encoded: &EncodedFeatures,
        codec: &LabelCodec,
        config: &ForestConfig,
    ) -> Result<Arc<TrainedForest>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let hit = state.entry.as_ref().and_then(|entry| {
            let same_key = entry.fingerprint == reference.fingerprint()
                && entry.codec == *codec
                && entry.config == *config;
            // The layout is re-checked on every hit, not trusted from the key.
            let same_layout = entry.layout == encoded.layout
                && entry.forest.n_features() == encoded.reference.ncols();
            (same_key && same_layout).then(|| Arc::clone(&entry.forest))
        });
        if let Some(forest) = hit {
            state.hits += 1;
            log::debug!("model cache hit for dataset {}", reference.fingerprint().to_hex());
            return Ok(forest);
        }

        state.misses += 1;
        let forest = Arc::new(fit_forest(reference, encoded, codec, config)?);
        state.entry = Some(CacheEntry {
            fingerprint: reference.fingerprint(),
            layout: encoded.layout.clone(),
            codec: codec.clone(),
            config: config.clone(),
            forest: Arc::clone(&forest),
        });
        Ok(forest)
    }
}

fn fit_forest(
    reference: &ReferenceDataset,
    encoded: &EncodedFeatures,
    codec: &LabelCodec,
    config: &ForestConfig,
) -> Result<TrainedForest> {
    let labels = codec.encode_dataset(reference)?;
    TrainedForest::fit(config, encoded.reference.view(), &labels, codec.n_classes())
}

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Runs the full pipeline for one query at a time. `Send + Sync`.
pub struct Predictor {
    encoder: FeatureEncoder,
    codec: LabelCodec,
    config: ForestConfig,
    cache: Option<ModelCache>,
}

impl Predictor {
    /// Retrains on every call.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            encoder: FeatureEncoder::default(),
            codec: LabelCodec::penguins(),
            config,
            cache: None,
        }
    }

    /// Reuses the fitted forest while the reference data and settings are unchanged.
    pub fn with_cache(config: ForestConfig) -> Self {
        Self {
            cache: Some(ModelCache::default()),
            ..Self::new(config)
        }
    }

    pub fn with_codec(mut self, codec: LabelCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn layout(&self) -> &FeatureLayout {
        self.encoder.layout()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ModelCache::stats)
    }

    /// Drop any cached forest so the next prediction fits afresh.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn predict(&self, query: &RawRecord, reference: &ReferenceDataset) -> Result<PredictionReport> {
        let encoded = self.encoder.encode(query, reference)?;

        let forest = match &self.cache {
            Some(cache) => cache.get_or_fit(reference, &encoded, &self.codec, &self.config)?,
            None => Arc::new(fit_forest(reference, &encoded, &self.codec, &self.config)?),
        };

        let out = forest.predict(encoded.query.view())?;
        if out.probabilities.len() != self.codec.n_classes() {
            return Err(PipelineError::DimensionMismatch {
                stage: Stage::Compose,
                expected: self.codec.n_classes(),
                actual: out.probabilities.len(),
            });
        }
        let label = self.codec.decode(out.class_index)?;
        let result = compose(query, label, &out.probabilities, self.codec.class_order())?;

        log::info!(
            "predicted {label} ({:.3}) from {} reference rows",
            out.probabilities[out.class_index],
            reference.len()
        );

        Ok(PredictionReport {
            result,
            prediction: PredictionResult {
                class_index: out.class_index,
                probabilities: out.probabilities,
                record: query.clone(),
            },
            advisories: encoded.advisories,
            layout: encoded.layout,
        })
    }
}
