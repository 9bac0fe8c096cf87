use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column – the known record schema
// ---------------------------------------------------------------------------

/// A column of the corpus schema. Source files may carry any subset of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Title,
    Journal,
    Source,
    PublishTime,
    PublishYear,
    Abstract,
    AbstractWordCount,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Title,
        Column::Journal,
        Column::Source,
        Column::PublishTime,
        Column::PublishYear,
        Column::Abstract,
        Column::AbstractWordCount,
    ];

    /// Canonical column name, as written in export headers.
    pub fn name(self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Journal => "journal",
            Column::Source => "source",
            Column::PublishTime => "publish_time",
            Column::PublishYear => "publish_year",
            Column::Abstract => "abstract",
            Column::AbstractWordCount => "abstract_word_count",
        }
    }

    /// Resolve a column name (canonical or CORD-19 alias). Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Column> {
        match name.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Column::Title),
            "journal" => Some(Column::Journal),
            "source" | "source_x" => Some(Column::Source),
            "publish_time" => Some(Column::PublishTime),
            "publish_year" => Some(Column::PublishYear),
            "abstract" => Some(Column::Abstract),
            "abstract_word_count" | "abs_word_count" => Some(Column::AbstractWordCount),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categorical columns that can be grouped and ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Journal,
    Source,
}

impl Category {
    pub fn column(self) -> Column {
        match self {
            Category::Journal => Column::Journal,
            Category::Source => Column::Source,
        }
    }

    pub fn value(self, record: &Record) -> Option<&str> {
        match self {
            Category::Journal => record.journal.as_deref(),
            Category::Source => record.source.as_deref(),
        }
    }
}

/// Free-text columns available to word analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Title,
    Abstract,
}

impl TextField {
    pub fn column(self) -> Column {
        match self {
            TextField::Title => Column::Title,
            TextField::Abstract => Column::Abstract,
        }
    }

    pub fn value(self, record: &Record) -> Option<&str> {
        match self {
            TextField::Title => record.title.as_deref(),
            TextField::Abstract => record.abstract_text.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// RawCell – one un-normalized cell as read from the source
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what tabular sources can hand us.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

/// One source row keyed by the known columns it carried.
pub type RawRow = BTreeMap<Column, RawCell>;

impl RawCell {
    /// Wrap a textual cell. Blank text is a missing value.
    pub fn from_text(s: &str) -> RawCell {
        if s.trim().is_empty() {
            RawCell::Null
        } else {
            RawCell::Text(s.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawCell::Null)
    }

    fn into_text(self) -> Option<String> {
        match self {
            RawCell::Text(s) => Some(s),
            RawCell::Integer(i) => Some(i.to_string()),
            RawCell::Float(v) if v.is_finite() => Some(v.to_string()),
            RawCell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            RawCell::Float(_) | RawCell::Null => None,
        }
    }

    /// Integral value of a cell; floats must carry no fractional part.
    fn to_integer(&self) -> Option<i64> {
        match self {
            RawCell::Integer(i) => Some(*i),
            RawCell::Float(v) => integral(*v),
            RawCell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            RawCell::Date(_) | RawCell::Null => None,
        }
    }

    fn to_date(&self) -> Option<NaiveDate> {
        match self {
            RawCell::Date(d) => Some(*d),
            RawCell::Text(s) => parse_date(s),
            _ => None,
        }
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Parse a publication date leniently. Unrecognised input is `None`, never an error.
///
/// Accepted: `YYYY-MM-DD`, `YYYY/MM/DD`, date-times with a space or `T`
/// separator (optional fraction), RFC 3339, `YYYY-MM` and bare `YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if let Some((year, month)) = s.split_once('-') {
        if year.len() == 4 && month.len() <= 2 && all_digits(year) && all_digits(month) {
            return NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1);
        }
        return None;
    }
    if s.len() == 4 && all_digits(s) {
        return NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1);
    }
    None
}

// ---------------------------------------------------------------------------
// Record – one research-paper entry
// ---------------------------------------------------------------------------

/// One normalized research-paper metadata entry. Immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub title: Option<String>,
    pub journal: Option<String>,
    pub source: Option<String>,
    pub publish_time: Option<NaiveDate>,
    pub publish_year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub abstract_word_count: Option<u32>,
}

impl Record {
    /// Normalize a raw source row.
    ///
    /// Dates that fail to parse become absent. A missing year is derived from
    /// `publish_time` when that is present. Nothing else is reshaped.
    pub fn from_row(row: RawRow) -> Record {
        let mut record = Record::default();
        for (column, cell) in row {
            match column {
                Column::Title => record.title = cell.into_text(),
                Column::Journal => record.journal = cell.into_text(),
                Column::Source => record.source = cell.into_text(),
                Column::PublishTime => record.publish_time = cell.to_date(),
                Column::PublishYear => {
                    record.publish_year = cell.to_integer().and_then(|y| i32::try_from(y).ok())
                }
                Column::Abstract => record.abstract_text = cell.into_text(),
                Column::AbstractWordCount => {
                    record.abstract_word_count =
                        cell.to_integer().and_then(|n| u32::try_from(n).ok())
                }
            }
        }
        if record.publish_year.is_none() {
            record.publish_year = record.publish_time.map(|d| d.year());
        }
        record
    }

    /// Render one field as export text. Absent values are `None`.
    pub fn field_text(&self, column: Column) -> Option<String> {
        match column {
            Column::Title => self.title.clone(),
            Column::Journal => self.journal.clone(),
            Column::Source => self.source.clone(),
            Column::PublishTime => self.publish_time.map(|d| d.format("%Y-%m-%d").to_string()),
            Column::PublishYear => self.publish_year.map(|y| y.to_string()),
            Column::Abstract => self.abstract_text.clone(),
            Column::AbstractWordCount => self.abstract_word_count.map(|n| n.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordStore – the complete loaded corpus
// ---------------------------------------------------------------------------

/// The full normalized corpus plus the set of columns its source carried.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    columns: BTreeSet<Column>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>, columns: BTreeSet<Column>) -> Self {
        RecordStore { records, columns }
    }

    /// Build an in-memory store that claims the full schema.
    pub fn from_records(records: Vec<Record>) -> Self {
        RecordStore {
            records,
            columns: Column::ALL.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Whether the source carried `column` (or it was derived at load).
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(Column, RawCell)]) -> RawRow {
        cells.iter().cloned().collect()
    }

    #[test]
    fn column_aliases_resolve() {
        assert_eq!(Column::parse("source_x"), Some(Column::Source));
        assert_eq!(Column::parse("abs_word_count"), Some(Column::AbstractWordCount));
        assert_eq!(Column::parse(" Journal "), Some(Column::Journal));
        assert_eq!(Column::parse("cord_uid"), None);
    }

    #[test]
    fn parse_date_formats() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_date("2020-03-15"), d(2020, 3, 15));
        assert_eq!(parse_date("2020/03/15"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03-15 10:22:01"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03-15T10:22:01.5"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03-15T10:22:01+02:00"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03"), d(2020, 3, 1));
        assert_eq!(parse_date("2021"), d(2021, 1, 1));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2020-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn year_derived_from_publish_time() {
        let record = Record::from_row(row(&[(
            Column::PublishTime,
            RawCell::Text("2020-05-01".into()),
        )]));
        assert_eq!(record.publish_year, Some(2020));
    }

    #[test]
    fn explicit_year_wins_over_publish_time() {
        let record = Record::from_row(row(&[
            (Column::PublishTime, RawCell::Text("2020-05-01".into())),
            (Column::PublishYear, RawCell::Text("2019.0".into())),
        ]));
        assert_eq!(record.publish_year, Some(2019));
    }

    #[test]
    fn unparsable_values_become_absent() {
        let record = Record::from_row(row(&[
            (Column::PublishTime, RawCell::Text("sometime".into())),
            (Column::PublishYear, RawCell::Float(2020.5)),
            (Column::AbstractWordCount, RawCell::Integer(-3)),
            (Column::Journal, RawCell::Null),
        ]));
        assert_eq!(record.publish_time, None);
        assert_eq!(record.publish_year, None);
        assert_eq!(record.abstract_word_count, None);
        assert_eq!(record.journal, None);
    }

    #[test]
    fn field_text_renders_dates_and_numbers() {
        let record = Record {
            publish_time: NaiveDate::from_ymd_opt(2020, 1, 2),
            publish_year: Some(2020),
            abstract_word_count: Some(120),
            ..Record::default()
        };
        assert_eq!(record.field_text(Column::PublishTime).as_deref(), Some("2020-01-02"));
        assert_eq!(record.field_text(Column::PublishYear).as_deref(), Some("2020"));
        assert_eq!(record.field_text(Column::AbstractWordCount).as_deref(), Some("120"));
        assert_eq!(record.field_text(Column::Title), None);
    }
}
