//! Palmer penguins species prediction.
//!
//! A query record and a labelled reference dataset go through
//! [`encode`] → [`labels`] → [`forest`] → [`compose`]; [`pipeline::Predictor`]
//! runs the whole cycle and [`export`] writes the result as CSV.

pub mod compose;
pub mod config;
pub mod data;
pub mod encode;
pub mod error;
pub mod export;
pub mod forest;
pub mod labels;
pub mod pipeline;

pub use compose::ResultRecord;
pub use data::model::{RawRecord, ReferenceDataset};
pub use error::{PipelineError, Stage};
pub use pipeline::{PredictionReport, Predictor};
