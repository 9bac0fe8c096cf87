// Explorer settings
// Loaded from an optional JSON file; every field has a default.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::text::WordOptions;
use crate::data::filter::SelectionPolicy;
use crate::export::DEFAULT_EXPORT_COLUMNS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Initial filter selection
    pub selection: SelectionPolicy,

    /// Title word analysis
    pub words: WordOptions,

    /// Monthly buckets kept in the trend (most recent)
    pub recent_months: usize,

    /// Journals in the ranked journal chart
    pub top_journals: usize,

    /// Journals in the per-year trend breakdown
    pub trend_journals: usize,

    /// Bins of the abstract length histogram
    pub histogram_bins: usize,

    /// Rows in the exported data sample
    pub sample_size: usize,

    /// Columns in the exported data sample, in order
    pub export_columns: Vec<String>,

    /// Include the full word-cloud frequency table in reports
    pub word_cloud: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            words: WordOptions::default(),
            recent_months: 24,
            top_journals: 15,
            trend_journals: 5,
            histogram_bins: 50,
            sample_size: 25,
            export_columns: DEFAULT_EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            word_cloud: false,
        }
    }
}

impl ExplorerConfig {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
