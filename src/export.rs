use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::data::filter::FilteredView;
use crate::data::model::Column;

/// Columns offered by default for the data sample.
pub const DEFAULT_EXPORT_COLUMNS: [&str; 4] = ["title", "journal", "publish_year", "abstract"];

/// Row limits the sample view offers.
pub const SAMPLE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// File name used for a downloaded sample of `rows` rows.
pub fn sample_file_name(rows: usize) -> String {
    format!("covid_research_sample_{rows}.csv")
}

/// Resolve caller column names against the schema, keeping caller order.
/// Unknown names are ignored.
pub fn resolve_columns<S: AsRef<str>>(names: &[S]) -> Vec<Column> {
    names
        .iter()
        .filter_map(|name| {
            let column = Column::parse(name.as_ref());
            if column.is_none() {
                debug!("Skipping unknown export column '{}'", name.as_ref());
            }
            column
        })
        .collect()
}

/// Write the first `limit` records of the view as CSV.
///
/// The header holds the column names in the given order. Fields containing the
/// delimiter, quotes or newlines are quoted. Returns the number of data rows.
pub fn export_csv<W: Write>(
    writer: W,
    view: &FilteredView<'_>,
    columns: &[Column],
    limit: usize,
) -> Result<usize> {
    if columns.is_empty() {
        return Ok(0);
    }

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(columns.iter().map(|c| c.name()))
        .context("writing CSV header")?;

    let mut rows = 0;
    for record in view.iter().take(limit) {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| record.field_text(*c).unwrap_or_default())
            .collect();
        wtr.write_record(&fields)
            .with_context(|| format!("writing CSV row {rows}"))?;
        rows += 1;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(rows)
}

/// Export to an in-memory string, resolving column names first.
pub fn export_to_string<S: AsRef<str>>(
    view: &FilteredView<'_>,
    column_names: &[S],
    limit: usize,
) -> Result<String> {
    let columns = resolve_columns(column_names);
    let mut buf = Vec::new();
    export_csv(&mut buf, view, &columns, limit)?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}

/// Export to a file, resolving column names first.
pub fn export_to_path<S: AsRef<str>>(
    path: &Path,
    view: &FilteredView<'_>,
    column_names: &[S],
    limit: usize,
) -> Result<usize> {
    let columns = resolve_columns(column_names);
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let rows = export_csv(file, view, &columns, limit)?;
    info!("Exported {rows} rows x {} columns to {}", columns.len(), path.display());
    Ok(rows)
}
