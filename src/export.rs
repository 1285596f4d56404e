use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::compose::ResultRecord;

/// Write result rows as UTF-8 CSV with a header row.
///
/// All rows must share one column layout (same class order).
pub fn write_csv<W: Write>(records: &[ResultRecord], writer: W) -> Result<()> {
    let Some(first) = records.first() else {
        bail!("no results to export");
    };
    let headers = first.headers();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers).context("writing CSV header")?;
    for (i, rec) in records.iter().enumerate() {
        if rec.headers() != headers {
            bail!("result row {i} has a different column layout than row 0");
        }
        wtr.write_record(rec.values())
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

/// CSV document as bytes, ready for a download/save dialog.
pub fn to_csv_bytes(records: &[ResultRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

pub fn save_csv(records: &[ResultRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(records, file)?;
    log::info!("Exported {} result row(s) to {}", records.len(), path.display());
    Ok(())
}
