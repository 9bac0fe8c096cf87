/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RecordStore (normalized, cached per path)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ RecordStore  │  Vec<Record>, columns present in the source
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / journal / source predicates → FilteredView
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
