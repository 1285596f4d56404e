use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The pipeline step that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Encode,
    Label,
    Train,
    Predict,
    Compose,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Encode => "encode",
            Stage::Label => "label",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::Compose => "compose",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the encode → fit → predict → compose pipeline can surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Unrecognized field name, missing field, or a numeric field that is not a number.
    #[error("schema mismatch on field '{field}': {reason}")]
    SchemaMismatch { field: String, reason: String },

    #[error("unknown species label '{0}'")]
    UnknownLabel(String),

    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    #[error("invalid classifier configuration: {0}")]
    InvalidConfig(String),

    #[error("model has not been fitted")]
    ModelNotFitted,

    #[error("dimension mismatch in {stage} stage: expected {expected}, got {actual}")]
    DimensionMismatch {
        stage: Stage,
        expected: usize,
        actual: usize,
    },
}

impl PipelineError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Which pipeline step failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::SchemaMismatch { .. } => Stage::Encode,
            PipelineError::UnknownLabel(_) => Stage::Label,
            PipelineError::InsufficientData(_) | PipelineError::InvalidConfig(_) => Stage::Train,
            PipelineError::ModelNotFitted => Stage::Predict,
            PipelineError::DimensionMismatch { stage, .. } => *stage,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
