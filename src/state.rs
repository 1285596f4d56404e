use std::path::{Path, PathBuf};

use penguin_predictor::config::AppConfig;
use penguin_predictor::data::loader;
use penguin_predictor::data::schema::{CategoricalField, NumericField};
use penguin_predictor::export;
use penguin_predictor::{PredictionReport, Predictor, RawRecord, ReferenceDataset};

use crate::color::SpeciesColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub predictor: Predictor,

    /// Reference dataset (None until one is loaded).
    pub dataset: Option<ReferenceDataset>,
    pub dataset_path: Option<PathBuf>,

    /// The query being edited in the side panel.
    pub query: RawRecord,

    /// Latest successful prediction for `query`; cleared on failure.
    pub report: Option<PredictionReport>,

    pub colors: SpeciesColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Set when the query or dataset changed and the prediction is stale.
    dirty: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let predictor = config.predictor();
        let colors = SpeciesColors::new(predictor.codec().class_order());
        let mut state = Self {
            predictor,
            dataset: None,
            dataset_path: None,
            query: RawRecord::default_query(),
            report: None,
            colors,
            status_message: None,
            dirty: false,
        };
        if let Some(path) = &config.dataset_path {
            state.load_dataset(path);
        }
        state
    }

    /// Load a reference dataset from disk, reporting failures in the status line.
    pub fn load_dataset(&mut self, path: &Path) {
        match loader::load_file(path) {
            Ok(dataset) => {
                self.set_dataset(dataset);
                self.dataset_path = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn set_dataset(&mut self, dataset: ReferenceDataset) {
        self.dataset = Some(dataset);
        self.status_message = None;
        self.dirty = true;
    }

    pub fn set_categorical(&mut self, field: CategoricalField, value: &str) {
        let slot = self.query.categorical_mut(field);
        if slot.as_str() != value {
            *slot = value.to_string();
            self.dirty = true;
        }
    }

    pub fn set_numeric(&mut self, field: NumericField, value: f64) {
        let slot = self.query.numeric_mut(field);
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
    }

    /// Discard the cached forest (if any) and predict again.
    pub fn retrain(&mut self) {
        self.predictor.clear_cache();
        self.dirty = true;
    }

    /// Re-run the pipeline if anything changed since the last run.
    pub fn refresh_prediction(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let Some(dataset) = &self.dataset else {
            self.report = None;
            return;
        };

        match self.predictor.predict(&self.query, dataset) {
            Ok(report) => {
                self.report = Some(report);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Prediction failed in {} stage: {e}", e.stage());
                self.report = None;
                self.status_message = Some(format!("Prediction failed ({} stage): {e}", e.stage()));
            }
        }
    }

    /// Write the current result row to `path` as CSV.
    pub fn export_results(&mut self, path: &Path) {
        let Some(report) = &self.report else {
            self.status_message = Some("Nothing to export yet".to_string());
            return;
        };
        match export::save_csv(std::slice::from_ref(&report.result), path) {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penguin_predictor::forest::ForestConfig;

    const CSV: &str = "\
species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex
Adelie,Torgersen,39.1,18.7,181,3750,male
Adelie,Dream,37.8,18.3,174,3400,female
Chinstrap,Dream,46.5,17.9,192,3500,female
Chinstrap,Dream,50.0,19.5,196,3900,male
Gentoo,Biscoe,46.1,13.2,211,4500,female
Gentoo,Biscoe,50.0,16.3,230,5700,male
";

    fn state() -> AppState {
        let config = AppConfig {
            forest: ForestConfig::default().with_seed(3).with_trees(15),
            ..Default::default()
        };
        AppState::new(&config)
    }

    #[test]
    fn prediction_waits_for_a_dataset() {
        let mut state = state();
        state.refresh_prediction();
        assert!(state.report.is_none());
    }

    #[test]
    fn input_change_triggers_a_new_prediction() {
        let mut state = state();
        state.set_dataset(loader::parse_csv_str(CSV).unwrap());
        state.refresh_prediction();
        let first = state.report.clone().unwrap();

        state.set_categorical(CategoricalField::Island, "Torgersen");
        state.set_numeric(NumericField::FlipperLength, 180.0);
        state.refresh_prediction();
        let second = state.report.clone().unwrap();
        assert_eq!(second.result.input.island, "Torgersen");
        assert_ne!(first.result.input, second.result.input);
    }

    #[test]
    fn export_writes_the_result_row() {
        let mut state = state();
        state.set_dataset(loader::parse_csv_str(CSV).unwrap());
        state.refresh_prediction();

        state.status_message = Some("Error: earlier failure".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prediction.csv");
        state.export_results(&path);
        assert_eq!(state.status_message, None);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("island,"));
    }

    #[test]
    fn failed_export_reports_in_status_line() {
        let mut state = state();
        state.set_dataset(loader::parse_csv_str(CSV).unwrap());
        state.refresh_prediction();

        let dir = tempfile::tempdir().unwrap();
        state.export_results(&dir.path().join("missing").join("prediction.csv"));
        assert!(state.status_message.as_deref().is_some_and(|m| m.starts_with("Error")));
    }
}
