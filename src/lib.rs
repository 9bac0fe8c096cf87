//! Filtering and aggregation pipeline for exploring a corpus of research-paper
//! metadata: load once, narrow with filters, derive metrics, rankings and
//! word frequencies for whatever front end renders them.

pub mod analysis;
pub mod app;
pub mod config;
pub mod data;
pub mod export;
pub mod state;

pub use app::Dashboard;
pub use config::ExplorerConfig;
pub use data::filter::{apply, ConstraintSet, FilteredView};
pub use data::loader::{load, DataError, StoreCache};
pub use data::model::{Category, Column, Record, RecordStore, TextField};
pub use state::AppState;
