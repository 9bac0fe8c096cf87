use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Category, Column, Record, RecordStore};
use crate::analysis::aggregate::{top_by_category, year_bounds};
use crate::analysis::FrequencyCounter;

// ---------------------------------------------------------------------------
// ConstraintSet – the live filter state
// ---------------------------------------------------------------------------

/// Active filters. An empty journal or source set means "no filter" on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    /// Inclusive `(min_year, max_year)`; `None` disables the year axis.
    pub year_range: Option<(i32, i32)>,
    pub allowed_journals: BTreeSet<String>,
    pub allowed_sources: BTreeSet<String>,
}

impl ConstraintSet {
    /// Constraints that admit every record.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// The initial selection offered to a fresh session: full year bounds,
    /// the first few journal options, and every source.
    pub fn initial(options: &FilterOptions, policy: &SelectionPolicy) -> Self {
        ConstraintSet {
            year_range: options.year_bounds,
            allowed_journals: options
                .journal_options
                .iter()
                .take(policy.preselected_journals)
                .cloned()
                .collect(),
            allowed_sources: options.source_options.iter().cloned().collect(),
        }
    }

    pub fn with_year_range(mut self, min_year: i32, max_year: i32) -> Self {
        self.year_range = Some((min_year, max_year));
        self
    }

    pub fn with_journals<I, S>(mut self, journals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_journals = journals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `axis` can exclude anything under these constraints.
    pub fn is_active(&self, axis: Axis) -> bool {
        match axis {
            Axis::Year => self.year_range.is_some(),
            Axis::Journal => !self.allowed_journals.is_empty(),
            Axis::Source => !self.allowed_sources.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Axis – one independent predicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Year,
    Journal,
    Source,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Year, Axis::Journal, Axis::Source];

    /// Whether `record` passes this axis.
    ///
    /// * Year: an active range requires a present year inside it.
    /// * Journal / Source: a non-empty set requires a present member value.
    /// * An inactive axis admits everything.
    pub fn admits(self, record: &Record, constraints: &ConstraintSet) -> bool {
        match self {
            Axis::Year => match constraints.year_range {
                None => true,
                Some((min, max)) => record
                    .publish_year
                    .is_some_and(|year| min <= year && year <= max),
            },
            Axis::Journal => member_of(&constraints.allowed_journals, record.journal.as_deref()),
            Axis::Source => member_of(&constraints.allowed_sources, record.source.as_deref()),
        }
    }
}

fn member_of(allowed: &BTreeSet<String>, value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}

// ---------------------------------------------------------------------------
// FilteredView – the ordered subset of records passing all constraints
// ---------------------------------------------------------------------------

/// Records of a store that survived filtering, kept in store order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: &'a [Record],
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every record of the store.
    pub fn all(store: &'a RecordStore) -> Self {
        FilteredView {
            records: store.records(),
            indices: (0..store.len()).collect(),
        }
    }

    /// A view over the given store positions. Out-of-range positions are dropped.
    pub fn from_indices(store: &'a RecordStore, indices: Vec<usize>) -> Self {
        let len = store.len();
        FilteredView {
            records: store.records(),
            indices: indices.into_iter().filter(|&i| i < len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Store positions of the surviving records.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.records;
        self.indices.iter().map(move |&i| &records[i])
    }
}

/// Narrow `view` by the given axes, in the given order.
pub fn apply_axes<'a>(
    view: FilteredView<'a>,
    constraints: &ConstraintSet,
    axes: &[Axis],
) -> FilteredView<'a> {
    let active: Vec<Axis> = axes
        .iter()
        .copied()
        .filter(|axis| constraints.is_active(*axis))
        .collect();
    let records = view.records;
    let indices = view
        .indices
        .into_iter()
        .filter(|&i| active.iter().all(|axis| axis.admits(&records[i], constraints)))
        .collect();
    FilteredView { records, indices }
}

/// Apply every constraint to the store. An empty result is a valid view.
pub fn apply<'a>(store: &'a RecordStore, constraints: &ConstraintSet) -> FilteredView<'a> {
    let view = apply_axes(FilteredView::all(store), constraints, &Axis::ALL);
    debug!(
        "Filtered {} of {} records (year={:?}, journals={}, sources={})",
        view.len(),
        store.len(),
        constraints.year_range,
        constraints.allowed_journals.len(),
        constraints.allowed_sources.len()
    );
    view
}

// ---------------------------------------------------------------------------
// Filter options offered to the presentation layer
// ---------------------------------------------------------------------------

/// How the initial selection is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Number of most frequent journals offered as options.
    pub journal_options: usize,
    /// How many of those options start selected.
    pub preselected_journals: usize,
    /// Year bounds used when no record carries a usable year.
    pub fallback_year_range: (i32, i32),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            journal_options: 20,
            preselected_journals: 5,
            fallback_year_range: (2019, 2022),
        }
    }
}

/// Choices a filter widget can offer, derived from the full store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// `None` when the source has no year information at all.
    pub year_bounds: Option<(i32, i32)>,
    /// Most frequent journals, highest first.
    pub journal_options: Vec<String>,
    /// Every distinct source in first-encountered order.
    pub source_options: Vec<String>,
}

impl FilterOptions {
    pub fn from_store(store: &RecordStore, policy: &SelectionPolicy) -> Self {
        let everything = FilteredView::all(store);

        let year_bounds = store
            .has_column(Column::PublishYear)
            .then(|| year_bounds(&everything).unwrap_or(policy.fallback_year_range));

        let journal_options = top_by_category(&everything, Category::Journal, policy.journal_options)
            .into_iter()
            .map(|(journal, _)| journal)
            .collect();

        let source_options = everything
            .iter()
            .filter_map(|r| r.source.clone())
            .collect::<FrequencyCounter<String>>()
            .into_keys();

        FilterOptions {
            year_bounds,
            journal_options,
            source_options,
        }
    }
}
