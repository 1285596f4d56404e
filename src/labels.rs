use crate::data::model::ReferenceDataset;
use crate::error::{PipelineError, Result};

/// Canonical species order used for class indices and probability columns.
pub const PENGUIN_SPECIES: [&str; 3] = ["Adelie", "Chinstrap", "Gentoo"];

/// Bidirectional species name ↔ class index mapping with a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelCodec {
    classes: Vec<String>,
}

impl Default for LabelCodec {
    fn default() -> Self {
        Self::penguins()
    }
}

impl LabelCodec {
    /// Adelie = 0, Chinstrap = 1, Gentoo = 2.
    pub fn penguins() -> Self {
        Self {
            classes: PENGUIN_SPECIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A codec over any order of distinct class names, fixed from here on.
    pub fn new<I, S>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        for (i, name) in classes.iter().enumerate() {
            if classes[..i].contains(name) {
                return Err(PipelineError::UnknownLabel(format!("duplicate class '{name}'")));
            }
        }
        if classes.is_empty() {
            return Err(PipelineError::InsufficientData("no classes declared".into()));
        }
        Ok(Self { classes })
    }

    pub fn encode(&self, species: &str) -> Result<usize> {
        self.classes
            .iter()
            .position(|c| c == species)
            .ok_or_else(|| PipelineError::UnknownLabel(species.to_string()))
    }

    pub fn decode(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::UnknownLabel(format!("class index {index}")))
    }

    pub fn class_order(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Label vector for the reference rows, in row order.
    pub fn encode_dataset(&self, reference: &ReferenceDataset) -> Result<Vec<usize>> {
        reference
            .records()
            .iter()
            .enumerate()
            .map(|(row, rec)| {
                let species = rec.species.as_deref().ok_or_else(|| {
                    PipelineError::schema("species", format!("reference row {row} has no species"))
                })?;
                self.encode(species)
            })
            .collect()
    }
}
