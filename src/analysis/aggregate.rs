use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use super::FrequencyCounter;
use crate::data::filter::FilteredView;
use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

/// Headline numbers for the current view. `None` means N/A.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub count: usize,
    pub unique_journal_count: usize,
    pub year_span: Option<i64>,
    pub mean_abstract_word_count: Option<f64>,
}

pub fn summary_metrics(view: &FilteredView<'_>) -> SummaryMetrics {
    let unique_journal_count = view
        .iter()
        .filter_map(|r| r.journal.as_deref())
        .collect::<BTreeSet<_>>()
        .len();

    let year_span = year_bounds(view).map(|(min, max)| i64::from(max) - i64::from(min));

    let (total, n) = view
        .iter()
        .filter_map(|r| r.abstract_word_count)
        .fold((0u64, 0usize), |(total, n), words| (total + words as u64, n + 1));
    let mean_abstract_word_count = (n > 0).then(|| total as f64 / n as f64);

    SummaryMetrics {
        count: view.len(),
        unique_journal_count,
        year_span,
        mean_abstract_word_count,
    }
}

/// Smallest and largest present year.
pub fn year_bounds(view: &FilteredView<'_>) -> Option<(i32, i32)> {
    view.iter()
        .filter_map(|r| r.publish_year)
        .fold(None, |bounds, year| match bounds {
            None => Some((year, year)),
            Some((min, max)) => Some((min.min(year), max.max(year))),
        })
}

// ---------------------------------------------------------------------------
// Time bucketing
// ---------------------------------------------------------------------------

/// Publications per year, ascending by year.
pub fn count_by_year(view: &FilteredView<'_>) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for year in view.iter().filter_map(|r| r.publish_year) {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

/// A calendar month bucket, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Publications per calendar month. Records without `publish_time` do not count.
pub fn count_by_month(view: &FilteredView<'_>) -> BTreeMap<YearMonth, usize> {
    let mut counts = BTreeMap::new();
    for month in view.iter().filter_map(|r| r.publish_time.map(YearMonth::of)) {
        *counts.entry(month).or_insert(0) += 1;
    }
    counts
}

/// The chronologically latest `n` buckets, oldest first.
pub fn recent_months(counts: &BTreeMap<YearMonth, usize>, n: usize) -> Vec<(YearMonth, usize)> {
    let skip = counts.len().saturating_sub(n);
    counts.iter().skip(skip).map(|(m, c)| (*m, *c)).collect()
}

// ---------------------------------------------------------------------------
// Categorical rankings
// ---------------------------------------------------------------------------

fn category_counts(view: &FilteredView<'_>, category: Category) -> FrequencyCounter<String> {
    view.iter()
        .filter_map(|r| category.value(r))
        .map(str::to_string)
        .collect()
}

/// The `n` most frequent present values of `category`, ties in first-encountered order.
pub fn top_by_category(
    view: &FilteredView<'_>,
    category: Category,
    n: usize,
) -> Vec<(String, usize)> {
    category_counts(view, category).top(n)
}

/// The single most frequent present value; `None` when no record has one.
pub fn mode(view: &FilteredView<'_>, category: Category) -> Option<String> {
    category_counts(view, category)
        .most_frequent()
        .map(|(value, _)| value)
}

/// The year with the most publications, earliest-encountered on ties.
pub fn peak_year(view: &FilteredView<'_>) -> Option<i32> {
    view.iter()
        .filter_map(|r| r.publish_year)
        .collect::<FrequencyCounter<i32>>()
        .most_frequent()
        .map(|(year, _)| year)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryYearCount {
    pub category: String,
    pub year: i32,
    pub count: usize,
}

/// Joint (category, year) counts restricted to the `top_n` categories of the view.
/// Sorted by category, then year.
pub fn count_by_category_and_year(
    view: &FilteredView<'_>,
    category: Category,
    top_n: usize,
) -> Vec<CategoryYearCount> {
    let top: BTreeSet<String> = top_by_category(view, category, top_n)
        .into_iter()
        .map(|(value, _)| value)
        .collect();

    let mut counts: BTreeMap<(String, i32), usize> = BTreeMap::new();
    for record in view.iter() {
        let (Some(value), Some(year)) = (category.value(record), record.publish_year) else {
            continue;
        };
        if top.contains(value) {
            *counts.entry((value.to_string(), year)).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|((category, year), count)| CategoryYearCount {
            category,
            year,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Abstract length distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of abstract word counts over `[min, max]`.
pub fn abstract_length_histogram(view: &FilteredView<'_>, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = view
        .iter()
        .filter_map(|r| r.abstract_word_count)
        .map(f64::from)
        .collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        // max lands in the last bin
        let idx = (((v - min) / width) as usize).min(bins - 1);
        histogram[idx].count += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, RecordStore};

    fn record(journal: &str, year: i32) -> Record {
        Record {
            journal: Some(journal.to_string()),
            publish_year: Some(year),
            ..Record::default()
        }
    }

    fn scenario() -> RecordStore {
        RecordStore::from_records(vec![record("A", 2020), record("B", 2020), record("A", 2021)])
    }

    #[test]
    fn count_by_year_scenario() {
        let store = scenario();
        let view = FilteredView::all(&store);
        let counts = count_by_year(&view);
        assert_eq!(counts, BTreeMap::from([(2020, 2), (2021, 1)]));
    }

    #[test]
    fn top_and_mode_scenario() {
        let store = scenario();
        let view = FilteredView::all(&store);
        assert_eq!(top_by_category(&view, Category::Journal, 1), vec![("A".to_string(), 2)]);
        assert_eq!(mode(&view, Category::Journal).as_deref(), Some("A"));
        assert_eq!(mode(&view, Category::Source), None);
    }

    #[test]
    fn top_by_category_ties_follow_view_order() {
        let store = RecordStore::from_records(vec![
            record("B", 2020),
            record("A", 2020),
            record("C", 2020),
            record("A", 2021),
            record("B", 2021),
        ]);
        let view = FilteredView::all(&store);
        let top = top_by_category(&view, Category::Journal, 2);
        assert_eq!(top, vec![("B".to_string(), 2), ("A".to_string(), 2)]);
        assert_eq!(mode(&view, Category::Journal).as_deref(), Some("B"));
    }

    #[test]
    fn summary_metrics_on_empty_view() {
        let store = scenario();
        let view = FilteredView::from_indices(&store, Vec::new());
        let metrics = summary_metrics(&view);
        assert_eq!(metrics.count, 0);
        assert_eq!(metrics.unique_journal_count, 0);
        assert_eq!(metrics.year_span, None);
        assert_eq!(metrics.mean_abstract_word_count, None);
    }

    #[test]
    fn summary_metrics_ignore_absent_values() {
        let mut records = vec![record("A", 2019), record("B", 2022)];
        records[0].abstract_word_count = Some(100);
        records.push(Record {
            abstract_word_count: Some(50),
            ..Record::default()
        });
        let store = RecordStore::from_records(records);
        let metrics = summary_metrics(&FilteredView::all(&store));
        assert_eq!(metrics.count, 3);
        assert_eq!(metrics.unique_journal_count, 2);
        assert_eq!(metrics.year_span, Some(3));
        assert_eq!(metrics.mean_abstract_word_count, Some(75.0));
    }

    #[test]
    fn year_span_handles_extreme_years() {
        let store = RecordStore::from_records(vec![
            record("J", -2_000_000_000),
            record("J", 2_000_000_000),
        ]);
        let metrics = summary_metrics(&FilteredView::all(&store));
        assert_eq!(metrics.year_span, Some(4_000_000_000));
    }

    #[test]
    fn months_are_bucketed_and_truncated_chronologically() {
        let dated = |y, m| Record {
            publish_time: NaiveDate::from_ymd_opt(y, m, 10),
            ..Record::default()
        };
        let store = RecordStore::from_records(vec![
            dated(2021, 2),
            dated(2019, 12),
            dated(2021, 2),
            Record::default(),
            dated(2020, 6),
        ]);
        let counts = count_by_month(&FilteredView::all(&store));
        assert_eq!(counts.values().sum::<usize>(), 4);

        let recent = recent_months(&counts, 2);
        assert_eq!(
            recent,
            vec![
                (YearMonth { year: 2020, month: 6 }, 1),
                (YearMonth { year: 2021, month: 2 }, 2),
            ]
        );
        assert_eq!(recent[0].0.to_string(), "2020-06");
    }

    #[test]
    fn category_year_breakdown_keeps_top_categories() {
        let store = RecordStore::from_records(vec![
            record("A", 2020),
            record("B", 2020),
            record("A", 2021),
            record("A", 2021),
            record("C", 2019),
        ]);
        let rows = count_by_category_and_year(&FilteredView::all(&store), Category::Journal, 2);
        assert_eq!(
            rows,
            vec![
                CategoryYearCount { category: "A".into(), year: 2020, count: 1 },
                CategoryYearCount { category: "A".into(), year: 2021, count: 2 },
                CategoryYearCount { category: "B".into(), year: 2020, count: 1 },
            ]
        );
    }

    #[test]
    fn peak_year_prefers_first_encountered() {
        let store = RecordStore::from_records(vec![
            record("A", 2021),
            record("A", 2020),
            record("A", 2020),
            record("A", 2021),
        ]);
        assert_eq!(peak_year(&FilteredView::all(&store)), Some(2021));
    }

    #[test]
    fn histogram_bins_cover_range() {
        let with_words = |n| Record {
            abstract_word_count: Some(n),
            ..Record::default()
        };
        let store = RecordStore::from_records(vec![with_words(0), with_words(5), with_words(10)]);
        let view = FilteredView::all(&store);

        let bins = abstract_length_histogram(&view, 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins[1].upper, 10.0);

        let single = RecordStore::from_records(vec![with_words(7), with_words(7)]);
        let bins = abstract_length_histogram(&FilteredView::all(&single), 50);
        assert_eq!(bins, vec![HistogramBin { lower: 7.0, upper: 7.0, count: 2 }]);

        let empty = RecordStore::default();
        assert!(abstract_length_histogram(&FilteredView::all(&empty), 50).is_empty());
    }
}
