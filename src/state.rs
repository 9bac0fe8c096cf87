use std::sync::Arc;

use log::debug;

use crate::data::filter::{apply, ConstraintSet, FilterOptions, FilteredView, SelectionPolicy};
use crate::data::model::RecordStore;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One analyst session: a shared read-only store plus this session's own
/// filters. Every change to the filters recomputes the visible records.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded corpus, shared read-only between sessions.
    pub store: Arc<RecordStore>,

    /// Filter choices derived from the full store.
    pub options: FilterOptions,

    /// Active filters.
    constraints: ConstraintSet,

    /// Store positions passing the current filters (cached).
    visible_indices: Vec<usize>,
}

impl AppState {
    /// Start a session with the policy's initial selection.
    pub fn new(store: Arc<RecordStore>, policy: &SelectionPolicy) -> Self {
        let options = FilterOptions::from_store(&store, policy);
        let constraints = ConstraintSet::initial(&options, policy);
        let mut state = Self {
            store,
            options,
            constraints,
            visible_indices: Vec::new(),
        };
        state.refilter();
        state
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn visible_indices(&self) -> &[usize] {
        &self.visible_indices
    }

    /// The current filtered view.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_indices(&self.store, self.visible_indices.clone())
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = apply(&self.store, &self.constraints).into_indices();
        debug!("Session view now has {} records", self.visible_indices.len());
    }

    /// Replace every filter at once.
    pub fn set_constraints(&mut self, constraints: ConstraintSet) {
        self.constraints = constraints;
        self.refilter();
    }

    pub fn set_year_range(&mut self, min_year: i32, max_year: i32) {
        self.constraints.year_range = Some((min_year, max_year));
        self.refilter();
    }

    pub fn clear_year_range(&mut self) {
        self.constraints.year_range = None;
        self.refilter();
    }

    pub fn set_journals<I, S>(&mut self, journals: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.allowed_journals = journals.into_iter().map(Into::into).collect();
        self.refilter();
    }

    /// Toggle a single journal in the selection.
    pub fn toggle_journal(&mut self, journal: &str) {
        let selected = &mut self.constraints.allowed_journals;
        if !selected.remove(journal) {
            selected.insert(journal.to_string());
        }
        self.refilter();
    }

    /// Drop the journal filter entirely.
    pub fn clear_journals(&mut self) {
        self.constraints.allowed_journals.clear();
        self.refilter();
    }

    pub fn set_sources<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.allowed_sources = sources.into_iter().map(Into::into).collect();
        self.refilter();
    }

    /// Toggle a single source in the selection.
    pub fn toggle_source(&mut self, source: &str) {
        let selected = &mut self.constraints.allowed_sources;
        if !selected.remove(source) {
            selected.insert(source.to_string());
        }
        self.refilter();
    }

    /// Select every source option.
    pub fn select_all_sources(&mut self) {
        self.constraints.allowed_sources = self.options.source_options.iter().cloned().collect();
        self.refilter();
    }
}
