use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::schema::{self, CategoricalField, NumericField};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// FieldValue – a single cell as read from a source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common DataFrame dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Interpret the value as a number. Text is parsed; null and bools are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one penguin observation
// ---------------------------------------------------------------------------

/// One observation. Reference records carry `species`; queries do not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub island: String,
    pub sex: String,
    pub bill_length_mm: f64,
    pub bill_depth_mm: f64,
    pub flipper_length_mm: f64,
    pub body_mass_g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl RawRecord {
    /// The documented default query (slider starting positions).
    pub fn default_query() -> Self {
        RawRecord {
            island: "Biscoe".to_string(),
            sex: "male".to_string(),
            bill_length_mm: NumericField::BillLength.default_value(),
            bill_depth_mm: NumericField::BillDepth.default_value(),
            flipper_length_mm: NumericField::FlipperLength.default_value(),
            body_mass_g: NumericField::BodyMass.default_value(),
            species: None,
        }
    }

    /// Build a record from named fields, validating field names and numeric cells.
    ///
    /// Field names are matched exactly (`Island` is not `island`). Unknown
    /// categorical *values* are accepted here; the encoder reports them.
    pub fn from_fields(fields: &BTreeMap<String, FieldValue>) -> Result<Self> {
        if let Some(unknown) = fields.keys().find(|name| !schema::is_known_field(name)) {
            return Err(PipelineError::schema(unknown.as_str(), "unrecognized field name"));
        }

        let numeric = |field: NumericField| -> Result<f64> {
            let value = fields
                .get(field.name())
                .ok_or_else(|| PipelineError::schema(field.name(), "missing field"))?;
            value
                .as_f64()
                .ok_or_else(|| PipelineError::schema(field.name(), format!("'{value}' is not a number")))
        };
        let categorical = |field: CategoricalField| -> Result<String> {
            match fields.get(field.name()) {
                None | Some(FieldValue::Null) => {
                    Err(PipelineError::schema(field.name(), "missing field"))
                }
                Some(FieldValue::String(s)) => Ok(s.clone()),
                Some(other) => Ok(other.to_string()),
            }
        };
        let species = match fields.get(schema::SPECIES) {
            None | Some(FieldValue::Null) => None,
            Some(value) => Some(value.to_string()),
        };

        Ok(RawRecord {
            island: categorical(CategoricalField::Island)?,
            sex: categorical(CategoricalField::Sex)?,
            bill_length_mm: numeric(NumericField::BillLength)?,
            bill_depth_mm: numeric(NumericField::BillDepth)?,
            flipper_length_mm: numeric(NumericField::FlipperLength)?,
            body_mass_g: numeric(NumericField::BodyMass)?,
            species,
        })
    }

    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::BillLength => self.bill_length_mm,
            NumericField::BillDepth => self.bill_depth_mm,
            NumericField::FlipperLength => self.flipper_length_mm,
            NumericField::BodyMass => self.body_mass_g,
        }
    }

    pub fn numeric_mut(&mut self, field: NumericField) -> &mut f64 {
        match field {
            NumericField::BillLength => &mut self.bill_length_mm,
            NumericField::BillDepth => &mut self.bill_depth_mm,
            NumericField::FlipperLength => &mut self.flipper_length_mm,
            NumericField::BodyMass => &mut self.body_mass_g,
        }
    }

    pub fn categorical(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Island => &self.island,
            CategoricalField::Sex => &self.sex,
        }
    }

    pub fn categorical_mut(&mut self, field: CategoricalField) -> &mut String {
        match field {
            CategoricalField::Island => &mut self.island,
            CategoricalField::Sex => &mut self.sex,
        }
    }

    /// Copy of this record with `species` removed.
    pub fn without_species(&self) -> Self {
        RawRecord {
            species: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// ReferenceDataset – the labelled training records
// ---------------------------------------------------------------------------

/// Immutable, shared handle over labelled reference records.
///
/// Cloning is cheap; all clones see the same rows, so one loaded dataset can
/// serve any number of concurrent predictions.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Arc<[RawRecord]>,
    /// For each categorical field the sorted set of values seen in the rows.
    observed: Arc<BTreeMap<CategoricalField, BTreeSet<String>>>,
    fingerprint: blake3::Hash,
}

impl ReferenceDataset {
    /// Wrap labelled records. Every record must carry `species`.
    pub fn new(records: Vec<RawRecord>) -> Result<Self> {
        if let Some(row) = records.iter().position(|r| r.species.is_none()) {
            return Err(PipelineError::schema(
                schema::SPECIES,
                format!("reference row {row} has no species"),
            ));
        }

        let mut observed: BTreeMap<CategoricalField, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            for field in CategoricalField::ALL {
                observed
                    .entry(field)
                    .or_default()
                    .insert(rec.categorical(field).to_string());
            }
        }

        let fingerprint = fingerprint_records(&records);
        Ok(ReferenceDataset {
            records: records.into(),
            observed: Arc::new(observed),
            fingerprint,
        })
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any reference row has `value` for `field`.
    pub fn has_observed(&self, field: CategoricalField, value: &str) -> bool {
        self.observed
            .get(&field)
            .is_some_and(|values| values.contains(value))
    }

    /// Content hash over every row, in row order.
    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }

    /// Number of rows per species label, sorted by label.
    pub fn species_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for rec in self.records.iter() {
            if let Some(species) = &rec.species {
                *counts.entry(species.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn fingerprint_records(records: &[RawRecord]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(records.len() as u64).to_le_bytes());
    for rec in records {
        for text in [&rec.island, &rec.sex] {
            hasher.update(&(text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        for field in NumericField::ALL {
            hasher.update(&rec.numeric(field).to_le_bytes());
        }
        let species = rec.species.as_deref().unwrap_or("");
        hasher.update(&(species.len() as u64).to_le_bytes());
        hasher.update(species.as_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn adelie_fields() -> Vec<(&'static str, FieldValue)> {
        vec![
            ("species", FieldValue::String("Adelie".into())),
            ("island", FieldValue::String("Torgersen".into())),
            ("bill_length_mm", FieldValue::Float(39.1)),
            ("bill_depth_mm", FieldValue::Float(18.7)),
            ("flipper_length_mm", FieldValue::Integer(181)),
            ("body_mass_g", FieldValue::Integer(3750)),
            ("sex", FieldValue::String("male".into())),
        ]
    }

    #[test]
    fn from_fields_reads_all_columns() {
        let rec = RawRecord::from_fields(&fields(&adelie_fields())).unwrap();
        assert_eq!(rec.island, "Torgersen");
        assert_eq!(rec.flipper_length_mm, 181.0);
        assert_eq!(rec.species.as_deref(), Some("Adelie"));
    }

    #[test]
    fn from_fields_rejects_wrong_case_field() {
        let mut pairs = adelie_fields();
        pairs[1].0 = "Island";
        let err = RawRecord::from_fields(&fields(&pairs)).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref field, .. } if field == "Island"));
    }

    #[test]
    fn from_fields_rejects_non_numeric_measurement() {
        let mut pairs = adelie_fields();
        pairs[2].1 = FieldValue::String("long".into());
        let err = RawRecord::from_fields(&fields(&pairs)).unwrap_err();
        assert!(
            matches!(err, PipelineError::SchemaMismatch { ref field, .. } if field == "bill_length_mm")
        );
    }

    #[test]
    fn from_fields_accepts_unseen_category_value() {
        let mut pairs = adelie_fields();
        pairs[1].1 = FieldValue::String("Anvers".into());
        let rec = RawRecord::from_fields(&fields(&pairs)).unwrap();
        assert_eq!(rec.island, "Anvers");
    }

    #[test]
    fn reference_requires_species() {
        let err = ReferenceDataset::new(vec![RawRecord::default_query()]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let rec = RawRecord::from_fields(&fields(&adelie_fields())).unwrap();
        let a = ReferenceDataset::new(vec![rec.clone()]).unwrap();
        let b = ReferenceDataset::new(vec![rec.clone()]).unwrap();
        let mut changed = rec;
        changed.body_mass_g += 1.0;
        let c = ReferenceDataset::new(vec![changed]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn observed_values_are_collected() {
        let rec = RawRecord::from_fields(&fields(&adelie_fields())).unwrap();
        let ds = ReferenceDataset::new(vec![rec]).unwrap();
        assert!(ds.has_observed(CategoricalField::Island, "Torgersen"));
        assert!(!ds.has_observed(CategoricalField::Island, "Dream"));
        assert_eq!(ds.species_counts().get("Adelie"), Some(&1));
    }
}
