use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Column, RawCell, RawRow, Record, RecordStore};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to produce a corpus. Every variant means the data is unavailable
/// for the session; no partial dataset is ever returned.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data unavailable: {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("data unavailable: unsupported file extension .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("data unavailable: failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl DataError {
    /// True for every variant: each one is terminal for the session and the
    /// caller reports the source as unavailable. There is no partial corpus
    /// to fall back on.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            DataError::NotFound { .. }
                | DataError::UnsupportedFormat { .. }
                | DataError::Unreadable { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalize a corpus from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "title": ..., "journal": ..., ... }, ...]`
/// * `.parquet` – one column per field, as written by dataframe tools
pub fn load(path: &Path) -> Result<RecordStore, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        _ => return Err(DataError::UnsupportedFormat { extension: ext }),
    };

    let (rows, columns) = parsed.map_err(|e| DataError::Unreadable {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    let store = normalize(rows, columns);
    info!(
        "Loaded {} records from {} (columns: {:?})",
        store.len(),
        path.display(),
        store.columns()
    );
    Ok(store)
}

/// Turn raw rows into records, reporting how many dates had to be dropped.
fn normalize(rows: Vec<RawRow>, mut columns: BTreeSet<Column>) -> RecordStore {
    let mut dropped_dates = 0usize;
    let records: Vec<Record> = rows
        .into_iter()
        .map(|row| {
            let had_time = row.get(&Column::PublishTime).is_some_and(|c| !c.is_null());
            let record = Record::from_row(row);
            if had_time && record.publish_time.is_none() {
                dropped_dates += 1;
            }
            record
        })
        .collect();

    if dropped_dates > 0 {
        warn!("{dropped_dates} publish_time values could not be parsed and were treated as missing");
    }
    if columns.contains(&Column::PublishTime) {
        columns.insert(Column::PublishYear);
    }
    RecordStore::new(records, columns)
}

/// Map each source header to a known column; unknown headers are skipped.
fn map_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<Option<Column>> {
    headers
        .into_iter()
        .map(|h| {
            let column = Column::parse(h);
            if column.is_none() {
                debug!("Ignoring unknown column '{h}'");
            }
            column
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<(Vec<RawRow>, BTreeSet<Column>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let mapping = map_headers(reader.headers().context("reading CSV headers")?.iter());
    let columns: BTreeSet<Column> = mapping.iter().flatten().copied().collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut row = RawRow::new();
        for (idx, column) in mapping.iter().enumerate() {
            let Some(column) = column else { continue };
            let cell = RawCell::from_text(record.get(idx).unwrap_or(""));
            insert_cell(&mut row, *column, cell);
        }
        rows.push(row);
    }

    Ok((rows, columns))
}

/// Duplicate columns (e.g. `source` and `source_x`) keep the first present value.
fn insert_cell(row: &mut RawRow, column: Column, cell: RawCell) {
    match row.get(&column) {
        Some(existing) if !existing.is_null() => {}
        _ => {
            row.insert(column, cell);
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "title": "...", "journal": "...", "publish_time": "2020-03-01" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<(Vec<RawRow>, BTreeSet<Column>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let objects = root.as_array().context("Expected top-level JSON array")?;

    let mut columns = BTreeSet::new();
    let mut rows = Vec::with_capacity(objects.len());

    for (i, rec) in objects.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            let Some(column) = Column::parse(key) else {
                continue;
            };
            columns.insert(column);
            insert_cell(&mut row, column, json_to_cell(val));
        }
        rows.push(row);
    }

    Ok((rows, columns))
}

fn json_to_cell(val: &JsonValue) -> RawCell {
    match val {
        JsonValue::String(s) => RawCell::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawCell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawCell::Float(f)
            } else {
                RawCell::Text(n.to_string())
            }
        }
        JsonValue::Null => RawCell::Null,
        other => RawCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Text columns may be Utf8 or LargeUtf8; numbers Int32/Int64/Float32/Float64;
/// `publish_time` may be a string, Date32/Date64 or Timestamp column.
fn load_parquet(path: &Path) -> Result<(Vec<RawRow>, BTreeSet<Column>)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let mapping = map_headers(builder.schema().fields().iter().map(|f| f.name().as_str()));
    let columns: BTreeSet<Column> = mapping.iter().flatten().copied().collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let arrays: Vec<(Column, ArrayRef)> = mapping
            .iter()
            .enumerate()
            .filter_map(|(idx, column)| column.map(|c| (c, batch.column(idx).clone())))
            .map(|(column, array)| temporal_as_date32(array).map(|a| (column, a)))
            .collect::<Result<_>>()?;

        for row_idx in 0..batch.num_rows() {
            let mut row = RawRow::new();
            for (column, array) in &arrays {
                insert_cell(&mut row, *column, extract_cell(array, row_idx));
            }
            rows.push(row);
        }
    }

    Ok((rows, columns))
}

// -- Parquet / Arrow helpers --

/// Timestamp and Date64 columns are cast to Date32 so cells become calendar dates.
fn temporal_as_date32(array: ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Timestamp(_, _) | DataType::Date64 => {
            arrow::compute::cast(array.as_ref(), &DataType::Date32).context("casting temporal column")
        }
        _ => Ok(array),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> RawCell {
    if col.is_null(row) {
        return RawCell::Null;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|s| RawCell::from_text(s.value(row))),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| RawCell::from_text(s.value(row))),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| RawCell::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| RawCell::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| RawCell::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| RawCell::Float(a.value(row))),
        DataType::Date32 => col
            .as_primitive_opt::<Date32Type>()
            .and_then(|a| a.value_as_date(row))
            .map(RawCell::Date),
        other => {
            debug!("Unsupported parquet column type {other:?}");
            None
        }
    };
    cell.unwrap_or(RawCell::Null)
}

// ---------------------------------------------------------------------------
// StoreCache – one parsed corpus per source for the session
// ---------------------------------------------------------------------------

/// Caches loaded stores by canonical path. Stores are immutable and shared via `Arc`.
#[derive(Debug, Default)]
pub struct StoreCache {
    entries: HashMap<PathBuf, Arc<RecordStore>>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, or return the store parsed by an earlier call.
    /// Failed loads are not cached.
    pub fn load(&mut self, path: &Path) -> Result<Arc<RecordStore>, DataError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(store) = self.entries.get(&key) {
            debug!("Cache hit for {}", key.display());
            return Ok(Arc::clone(store));
        }
        let store = Arc::new(load(path)?);
        self.entries.insert(key, Arc::clone(&store));
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
