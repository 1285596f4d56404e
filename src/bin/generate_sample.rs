//! Writes a synthetic Palmer-penguins style reference dataset.
//!
//! ```text
//! generate_sample [OUTPUT] [SEED]
//! ```
//! `OUTPUT` defaults to `penguins_sample.parquet`; a `.csv` extension writes CSV instead.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use penguin_predictor::RawRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-species feature distribution: (mean, std dev) for each measurement.
struct SpeciesProfile {
    name: &'static str,
    islands: &'static [(&'static str, usize)],
    bill_length: (f64, f64),
    bill_depth: (f64, f64),
    flipper_length: (f64, f64),
    body_mass: (f64, f64),
}

const PROFILES: [SpeciesProfile; 3] = [
    SpeciesProfile {
        name: "Adelie",
        islands: &[("Biscoe", 44), ("Dream", 56), ("Torgersen", 52)],
        bill_length: (38.8, 2.7),
        bill_depth: (18.3, 1.2),
        flipper_length: (190.0, 6.5),
        body_mass: (3700.0, 460.0),
    },
    SpeciesProfile {
        name: "Chinstrap",
        islands: &[("Dream", 68)],
        bill_length: (48.8, 3.3),
        bill_depth: (18.4, 1.1),
        flipper_length: (196.0, 7.1),
        body_mass: (3733.0, 384.0),
    },
    SpeciesProfile {
        name: "Gentoo",
        islands: &[("Biscoe", 124)],
        bill_length: (47.5, 3.1),
        bill_depth: (15.0, 1.0),
        flipper_length: (217.0, 6.5),
        body_mass: (5076.0, 504.0),
    },
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, (mean, std_dev): (f64, f64)) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-15);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn generate(rng: &mut StdRng) -> Vec<RawRecord> {
    let mut records = Vec::new();
    for profile in &PROFILES {
        for &(island, count) in profile.islands {
            for i in 0..count {
                let male = i % 2 == 0;
                // males are heavier with longer, deeper bills
                let shift = if male { 1.0 } else { -1.0 };
                records.push(RawRecord {
                    island: island.to_string(),
                    sex: if male { "male" } else { "female" }.to_string(),
                    bill_length_mm: round1(gauss(rng, profile.bill_length) + shift),
                    bill_depth_mm: round1(gauss(rng, profile.bill_depth) + 0.5 * shift),
                    flipper_length_mm: gauss(rng, profile.flipper_length).round(),
                    body_mass_g: (gauss(rng, profile.body_mass) + 200.0 * shift).round(),
                    species: Some(profile.name.to_string()),
                });
            }
        }
    }
    records
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn write_parquet(records: &[RawRecord], path: &Path) -> Result<()> {
    let text = |f: fn(&RawRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(records.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&RawRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(records.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("species", DataType::Utf8, false),
        Field::new("island", DataType::Utf8, false),
        Field::new("bill_length_mm", DataType::Float64, false),
        Field::new("bill_depth_mm", DataType::Float64, false),
        Field::new("flipper_length_mm", DataType::Float64, false),
        Field::new("body_mass_g", DataType::Float64, false),
        Field::new("sex", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.species.as_deref().unwrap_or_default()),
            text(|r| r.island.as_str()),
            number(|r| r.bill_length_mm),
            number(|r| r.bill_depth_mm),
            number(|r| r.flipper_length_mm),
            number(|r| r.body_mass_g),
            text(|r| r.sex.as_str()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(records: &[RawRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating output file")?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args
        .next()
        .unwrap_or_else(|| "penguins_sample.parquet".to_string());
    let seed = match args.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed '{s}'"))?,
        None => 42,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let records = generate(&mut rng);

    let path = Path::new(&output);
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&records, path)?,
        Some("parquet") | Some("pq") => write_parquet(&records, path)?,
        _ => bail!("unsupported output extension for {output}"),
    }

    println!("Wrote {} penguins to {output}", records.len());
    Ok(())
}
