//! Feature encoding: raw records → aligned numeric matrices.
//!
//! The query row and every reference row are encoded against one
//! [`FeatureLayout`], derived once from the declared categorical vocabulary:
//!
//! ```text
//!  bill_length_mm | bill_depth_mm | flipper_length_mm | body_mass_g |
//!  island_Biscoe | island_Dream | island_Torgersen | sex_female | sex_male
//! ```
//!
//! Numeric fields pass through untouched; each categorical value becomes a
//! 0/1 indicator column. Indicator columns are sorted by their composite
//! `field_value` name.

use std::fmt;

use ndarray::{Array1, Array2};

use crate::data::model::{RawRecord, ReferenceDataset};
use crate::data::schema::{CategoricalField, NumericField};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// FeatureLayout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Column {
    Numeric(NumericField),
    Indicator {
        field: CategoricalField,
        value: &'static str,
    },
}

/// Ordered column set shared by every encoded row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureLayout {
    columns: Vec<Column>,
    names: Vec<String>,
}

impl FeatureLayout {
    /// Layout for the fixed six-feature penguin schema.
    pub fn penguins() -> Self {
        let mut columns: Vec<Column> = NumericField::ALL.into_iter().map(Column::Numeric).collect();

        let mut indicators: Vec<(String, Column)> = CategoricalField::ALL
            .into_iter()
            .flat_map(|field| {
                field.vocabulary().iter().map(move |&value| {
                    (field.indicator_name(value), Column::Indicator { field, value })
                })
            })
            .collect();
        indicators.sort_by(|a, b| a.0.cmp(&b.0));
        columns.extend(indicators.into_iter().map(|(_, col)| col));

        let names = columns
            .iter()
            .map(|col| match col {
                Column::Numeric(field) => field.name().to_string(),
                Column::Indicator { field, value } => field.indicator_name(value),
            })
            .collect();

        FeatureLayout { columns, names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Encode one record into `out`, which must be `width()` long.
    fn fill_row(&self, record: &RawRecord, out: &mut [f64]) -> Result<()> {
        for (slot, col) in out.iter_mut().zip(&self.columns) {
            *slot = match col {
                Column::Numeric(field) => {
                    let v = record.numeric(*field);
                    if !v.is_finite() {
                        return Err(PipelineError::schema(
                            field.name(),
                            format!("'{v}' is not a finite number"),
                        ));
                    }
                    v
                }
                Column::Indicator { field, value } => {
                    if record.categorical(*field) == *value {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NovelCategory advisory
// ---------------------------------------------------------------------------

/// A query value with no training signal behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelCategory {
    pub field: CategoricalField,
    pub value: String,
    /// `true` when the value is outside the declared vocabulary altogether,
    /// in which case every indicator of the field is 0 for the query.
    pub out_of_vocabulary: bool,
}

impl fmt::Display for NovelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.out_of_vocabulary {
            write!(
                f,
                "{} '{}' is not a known value; the prediction ignores this field",
                self.field.label(),
                self.value
            )
        } else {
            write!(
                f,
                "{} '{}' never occurs in the reference data; low confidence",
                self.field.label(),
                self.value
            )
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureEncoder
// ---------------------------------------------------------------------------

/// Output of [`FeatureEncoder::encode`].
#[derive(Debug, Clone)]
pub struct EncodedFeatures {
    pub layout: FeatureLayout,
    pub query: Array1<f64>,
    pub reference: Array2<f64>,
    pub advisories: Vec<NovelCategory>,
}

/// Sole authority on column layout.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    layout: FeatureLayout,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new(FeatureLayout::penguins())
    }
}

impl FeatureEncoder {
    pub fn new(layout: FeatureLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Encode the query as row 0 and the reference records as rows 1..=N of
    /// one matrix, then split row 0 back out.
    pub fn encode(&self, query: &RawRecord, reference: &ReferenceDataset) -> Result<EncodedFeatures> {
        let width = self.layout.width();
        let n = reference.len();
        let mut stacked = Array2::<f64>::zeros((n + 1, width));

        let rows = std::iter::once(query).chain(reference.records());
        for (i, (record, mut row)) in rows.zip(stacked.rows_mut()).enumerate() {
            let slice = row
                .as_slice_mut()
                .ok_or_else(|| PipelineError::schema("<row>", "non-contiguous feature row"))?;
            self.layout.fill_row(record, slice)?;
            if i > 0 {
                warn_out_of_vocabulary(record, i - 1);
            }
        }

        let advisories = self.advisories(query, reference);
        for advisory in &advisories {
            log::warn!("novel category in query: {advisory}");
        }

        let query_row = stacked.row(0).to_owned();
        let reference_rows = stacked.slice(ndarray::s![1.., ..]).to_owned();

        Ok(EncodedFeatures {
            layout: self.layout.clone(),
            query: query_row,
            reference: reference_rows,
            advisories,
        })
    }

    /// Encode the reference rows alone, against the same layout.
    pub fn encode_reference(&self, reference: &ReferenceDataset) -> Result<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((reference.len(), self.layout.width()));
        for (record, mut row) in reference.records().iter().zip(matrix.rows_mut()) {
            let slice = row
                .as_slice_mut()
                .ok_or_else(|| PipelineError::schema("<row>", "non-contiguous feature row"))?;
            self.layout.fill_row(record, slice)?;
        }
        Ok(matrix)
    }

    /// Encode a single record (no reference rows involved).
    pub fn encode_query(&self, query: &RawRecord) -> Result<Array1<f64>> {
        let mut row = Array1::<f64>::zeros(self.layout.width());
        let slice = row
            .as_slice_mut()
            .ok_or_else(|| PipelineError::schema("<row>", "non-contiguous feature row"))?;
        self.layout.fill_row(query, slice)?;
        Ok(row)
    }

    /// Query values that the reference data cannot support.
    pub fn advisories(&self, query: &RawRecord, reference: &ReferenceDataset) -> Vec<NovelCategory> {
        CategoricalField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = query.categorical(field);
                if reference.has_observed(field, value) {
                    return None;
                }
                Some(NovelCategory {
                    field,
                    value: value.to_string(),
                    out_of_vocabulary: !field.contains(value),
                })
            })
            .collect()
    }
}

fn warn_out_of_vocabulary(record: &RawRecord, row: usize) {
    for field in CategoricalField::ALL {
        let value = record.categorical(field);
        if !field.contains(value) {
            log::warn!("reference row {row}: {field} '{value}' is outside the vocabulary");
        }
    }
}
