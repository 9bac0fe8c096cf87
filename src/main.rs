use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use cord_explorer::export::{export_to_path, sample_file_name, SAMPLE_SIZES};
use cord_explorer::{AppState, Dashboard, ExplorerConfig, StoreCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// CORD-19 Data Explorer - headless report over research-paper metadata
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Corpus file (.csv, .json or .parquet)
    #[arg(default_value = "new_data.csv")]
    data: PathBuf,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Earliest publication year to keep
    #[arg(long)]
    year_min: Option<i32>,

    /// Latest publication year to keep
    #[arg(long)]
    year_max: Option<i32>,

    /// Journal to keep (repeatable); replaces the default selection
    #[arg(long = "journal", value_name = "NAME")]
    journals: Vec<String>,

    /// Disable the journal filter
    #[arg(long, conflicts_with = "journals")]
    all_journals: bool,

    /// Source to keep (repeatable); defaults to every source
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Include the full title word table for word-cloud renderers
    #[arg(long)]
    word_cloud: bool,

    /// Write a CSV sample of the filtered records (directory or file path)
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Comma-separated columns for the sample export
    #[arg(long, value_delimiter = ',', value_name = "COLS")]
    columns: Vec<String>,

    /// Rows in the sample export
    #[arg(long)]
    sample_size: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    if args.word_cloud {
        config.word_cloud = true;
    }
    if let Some(rows) = args.sample_size {
        config.sample_size = rows;
    }
    if !args.columns.is_empty() {
        config.export_columns = args.columns.clone();
    }
    if !SAMPLE_SIZES.contains(&config.sample_size) {
        warn!(
            "Sample size {} is not one of the offered sizes {:?}",
            config.sample_size, SAMPLE_SIZES
        );
    }

    let mut cache = StoreCache::new();
    let store = cache
        .load(&args.data)
        .context("the corpus could not be loaded; ensure the file is in the correct directory")?;

    let mut state = AppState::new(store, &config.selection);
    apply_filter_args(&mut state, &args);

    let view = state.view();
    info!("{} of {} records match the filters", view.len(), state.store.len());
    let dashboard = Dashboard::build(&state.store, &view, &config);

    match args.format {
        OutputFormat::Text => print!("{dashboard}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&dashboard).context("serializing report")?;
            println!("{json}");
        }
    }

    if let Some(target) = &args.export {
        let path = if target.is_dir() {
            target.join(sample_file_name(config.sample_size))
        } else {
            target.clone()
        };
        export_to_path(&path, &view, config.export_columns.as_slice(), config.sample_size)?;
    }

    Ok(())
}

/// Command-line filters override the session's initial selection.
fn apply_filter_args(state: &mut AppState, args: &Args) {
    if args.year_min.is_some() || args.year_max.is_some() {
        match state.options.year_bounds {
            Some((min, max)) => {
                state.set_year_range(args.year_min.unwrap_or(min), args.year_max.unwrap_or(max))
            }
            None => warn!("Year information not available; ignoring year range"),
        }
    }
    if args.all_journals {
        state.clear_journals();
    } else if !args.journals.is_empty() {
        state.set_journals(args.journals.iter().cloned());
    }
    if !args.sources.is_empty() {
        state.set_sources(args.sources.iter().cloned());
    }
}
