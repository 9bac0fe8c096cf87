use std::fmt;

use log::debug;
use serde::Serialize;

use crate::analysis::aggregate::{
    abstract_length_histogram, count_by_category_and_year, count_by_month, count_by_year, mode,
    peak_year, recent_months, summary_metrics, top_by_category, year_bounds, CategoryYearCount,
    HistogramBin, SummaryMetrics, YearMonth,
};
use crate::analysis::text::{word_frequencies, WordCount};
use crate::config::ExplorerConfig;
use crate::data::filter::FilteredView;
use crate::data::model::{Category, Column, RecordStore, TextField};

// ---------------------------------------------------------------------------
// Dashboard – everything the presentation layer renders for one view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount<K> {
    pub period: K,
    pub count: usize,
}

/// Footer facts about the current view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub total_papers: usize,
    pub unique_journals: Option<usize>,
    pub year_range: Option<(i32, i32)>,
    pub peak_year: Option<i32>,
    pub most_active_journal: Option<String>,
}

/// Derived tables for one filtered view. Sections are `None` when the
/// source lacked the column they depend on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: SummaryMetrics,
    pub source_distribution: Option<Vec<CategoryCount>>,
    pub abstract_histogram: Option<Vec<HistogramBin>>,
    pub yearly: Option<Vec<PeriodCount<i32>>>,
    /// Only present when the view spans more than one month.
    pub monthly: Option<Vec<PeriodCount<YearMonth>>>,
    pub top_journals: Option<Vec<CategoryCount>>,
    pub journal_trends: Option<Vec<CategoryYearCount>>,
    pub top_title_words: Option<Vec<WordCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_cloud: Option<Vec<WordCount>>,
    pub insights: Insights,
}

fn category_counts(entries: Vec<(String, usize)>) -> Vec<CategoryCount> {
    entries
        .into_iter()
        .map(|(name, count)| CategoryCount { name, count })
        .collect()
}

impl Dashboard {
    /// Recompute every derived table from `view`. Never touches records outside it.
    pub fn build(store: &RecordStore, view: &FilteredView<'_>, config: &ExplorerConfig) -> Self {
        let has = |column| store.has_column(column);

        let metrics = summary_metrics(view);

        let source_distribution = has(Category::Source.column())
            .then(|| category_counts(top_by_category(view, Category::Source, usize::MAX)));

        let abstract_histogram = has(Column::AbstractWordCount)
            .then(|| abstract_length_histogram(view, config.histogram_bins));

        let yearly = has(Column::PublishYear).then(|| {
            count_by_year(view)
                .into_iter()
                .map(|(period, count)| PeriodCount { period, count })
                .collect()
        });

        let monthly = if has(Column::PublishTime) {
            let months = count_by_month(view);
            (months.len() > 1).then(|| {
                recent_months(&months, config.recent_months)
                    .into_iter()
                    .map(|(period, count)| PeriodCount { period, count })
                    .collect()
            })
        } else {
            None
        };

        let top_journals = has(Category::Journal.column())
            .then(|| category_counts(top_by_category(view, Category::Journal, config.top_journals)));

        let journal_trends = (has(Column::Journal) && has(Column::PublishYear))
            .then(|| count_by_category_and_year(view, Category::Journal, config.trend_journals));

        let words = &config.words;
        let title_table = has(TextField::Title.column())
            .then(|| word_frequencies(view, TextField::Title, &words.stop_words, words.min_length));
        let top_title_words = title_table
            .as_ref()
            .map(|table| table.top(words.top_n).to_vec());
        let word_cloud = title_table
            .filter(|_| config.word_cloud)
            .map(|table| table.entries().to_vec());

        let insights = Insights {
            total_papers: view.len(),
            unique_journals: has(Column::Journal).then_some(metrics.unique_journal_count),
            year_range: year_bounds(view),
            peak_year: peak_year(view),
            most_active_journal: mode(view, Category::Journal),
        };

        debug!("Built dashboard for {} records", view.len());

        Dashboard {
            metrics,
            source_distribution,
            abstract_histogram,
            yearly,
            monthly,
            top_journals,
            journal_trends,
            top_title_words,
            word_cloud,
            insights,
        }
    }
}

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

struct OrNa<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNa<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("N/A"),
        }
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "== {title} ==")
}

fn counts<K: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    rows: impl IntoIterator<Item = (K, usize)>,
) -> fmt::Result {
    let mut any = false;
    for (key, count) in rows {
        writeln!(f, "  {key:<40} {count:>8}")?;
        any = true;
    }
    if !any {
        writeln!(f, "  (no data)")?;
    }
    Ok(())
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(f, "Total Papers:        {}", m.count)?;
        writeln!(f, "Unique Journals:     {}", m.unique_journal_count)?;
        writeln!(
            f,
            "Year Span:           {}",
            OrNa(m.year_span.map(|span| format!("{span} years")))
        )?;
        writeln!(
            f,
            "Avg Abstract Length: {}",
            OrNa(m.mean_abstract_word_count.map(|mean| format!("{} words", mean.trunc() as i64)))
        )?;

        if let Some(sources) = &self.source_distribution {
            section(f, "Distribution by Source")?;
            counts(f, sources.iter().map(|c| (&c.name, c.count)))?;
        }
        if let Some(bins) = &self.abstract_histogram {
            section(f, "Abstract Word Count Distribution")?;
            counts(
                f,
                bins.iter()
                    .filter(|b| b.count > 0)
                    .map(|b| (format!("{:.0}-{:.0}", b.lower, b.upper), b.count)),
            )?;
        }
        if let Some(yearly) = &self.yearly {
            section(f, "Publications Over Time")?;
            counts(f, yearly.iter().map(|p| (p.period, p.count)))?;
        }
        if let Some(monthly) = &self.monthly {
            section(f, "Monthly Publication Trend")?;
            counts(f, monthly.iter().map(|p| (p.period, p.count)))?;
        }
        if let Some(journals) = &self.top_journals {
            section(f, "Top Journals by Publication Count")?;
            counts(f, journals.iter().map(|c| (&c.name, c.count)))?;
        }
        if let Some(trends) = &self.journal_trends {
            section(f, "Top Journals: Publication Trends")?;
            counts(
                f,
                trends.iter().map(|t| (format!("{} ({})", t.category, t.year), t.count)),
            )?;
        }
        if let Some(words) = &self.top_title_words {
            section(f, "Top Words in Titles")?;
            counts(f, words.iter().map(|w| (&w.word, w.count)))?;
        }
        if let Some(cloud) = &self.word_cloud {
            section(f, "Word Cloud Frequencies")?;
            counts(f, cloud.iter().map(|w| (&w.word, w.count)))?;
        }

        let i = &self.insights;
        section(f, "Key Insights")?;
        writeln!(f, "  Total papers analyzed: {}", i.total_papers)?;
        if let Some(unique) = i.unique_journals {
            writeln!(f, "  Unique journals: {unique}")?;
        }
        writeln!(
            f,
            "  Publication years: {}",
            OrNa(i.year_range.map(|(min, max)| format!("{min}-{max}")))
        )?;
        writeln!(f, "  Peak publication year: {}", OrNa(i.peak_year))?;
        writeln!(f, "  Most active journal: {}", OrNa(i.most_active_journal.as_ref()))
    }
}
