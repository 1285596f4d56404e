use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, RawRecord, ReferenceDataset};

type Row = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a labelled reference dataset from a file.  Dispatch by extension.
///
/// Supported formats, all with the columns `species`, `island`,
/// `bill_length_mm`, `bill_depth_mm`, `flipper_length_mm`, `body_mass_g`, `sex`:
/// * `.csv`     – header row + one record per line
/// * `.json`    – `[{ "species": "Adelie", "island": "Torgersen", ... }, ...]`
/// * `.parquet` – flat columns, as written by `df.to_parquet()`
pub fn load_file(path: &Path) -> Result<ReferenceDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let dataset = dataset_from_rows(rows)?;
    log::info!(
        "Loaded {} reference records from {} ({:?})",
        dataset.len(),
        path.display(),
        dataset.species_counts()
    );
    Ok(dataset)
}

/// Validate every row against the schema and wrap them as a dataset.
fn dataset_from_rows(rows: Vec<Row>) -> Result<ReferenceDataset> {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| RawRecord::from_fields(row).with_context(|| format!("Row {i}")))
        .collect::<Result<Vec<_>>>()?;
    ReferenceDataset::new(records).context("building reference dataset")
}

/// Parse CSV text that is already in memory (e.g. bundled or downloaded).
pub fn parse_csv_str(text: &str) -> Result<ReferenceDataset> {
    let reader = csv::Reader::from_reader(text.as_bytes());
    dataset_from_rows(read_csv_rows(reader)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Vec<Row>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv_rows(reader)
}

fn read_csv_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Row>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            // pandas writes the index as an unnamed first column
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), guess_field_type(value)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn guess_field_type(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).
fn read_json(path: &Path) -> Result<Vec<Row>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_field(val)))
                .collect())
        })
        .collect()
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        // pandas stores its index as `__index_level_0__`
        let cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.name().starts_with("__index_level"))
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let mut fields = Row::new();
            for (col_idx, col_name) in &cols {
                let value = extract_field_value(batch.column(*col_idx), row)
                    .with_context(|| format!("Row {row}, column '{col_name}'"))?;
                fields.insert(col_name.clone(), value);
            }
            rows.push(fields);
        }
    }

    Ok(rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| FieldValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => Some(FieldValue::String(col.as_string::<i64>().value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| FieldValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| FieldValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| FieldValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| FieldValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| FieldValue::Bool(a.value(row))),
        other => bail!("unsupported column type {other:?}"),
    };
    value.context("column array does not match its declared type")
}
