use crate::data::model::RawRecord;
use crate::data::schema::{CategoricalField, NumericField};
use crate::error::{PipelineError, Result, Stage};

/// Column holding the predicted species.
pub const PREDICTION_COLUMN: &str = "prediction";

/// One flat output row: the raw inputs, a probability per class, and the prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub input: RawRecord,
    /// `(class name, probability)` in class order.
    pub probabilities: Vec<(String, f64)>,
    pub prediction: String,
}

impl ResultRecord {
    /// Column names in output order: island, the four measurements, sex,
    /// one column per class, then `prediction`.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![CategoricalField::Island.name().to_string()];
        headers.extend(NumericField::ALL.iter().map(|f| f.name().to_string()));
        headers.push(CategoricalField::Sex.name().to_string());
        headers.extend(self.probabilities.iter().map(|(class, _)| class.clone()));
        headers.push(PREDICTION_COLUMN.to_string());
        headers
    }

    /// Cell values matching [`ResultRecord::headers`].
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![self.input.island.clone()];
        values.extend(NumericField::ALL.iter().map(|&f| self.input.numeric(f).to_string()));
        values.push(self.input.sex.clone());
        values.extend(self.probabilities.iter().map(|(_, p)| p.to_string()));
        values.push(self.prediction.clone());
        values
    }

    pub fn probability_of(&self, class: &str) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, p)| *p)
    }
}

/// Merge the raw query, per-class probabilities and the predicted label.
pub fn compose(
    raw: &RawRecord,
    predicted_label: &str,
    probabilities: &[f64],
    class_order: &[String],
) -> Result<ResultRecord> {
    if probabilities.len() != class_order.len() {
        return Err(PipelineError::DimensionMismatch {
            stage: Stage::Compose,
            expected: class_order.len(),
            actual: probabilities.len(),
        });
    }

    Ok(ResultRecord {
        input: raw.without_species(),
        probabilities: class_order
            .iter()
            .cloned()
            .zip(probabilities.iter().copied())
            .collect(),
        prediction: predicted_label.to_string(),
    })
}
