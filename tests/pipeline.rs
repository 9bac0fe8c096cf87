use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use cord_explorer::analysis::aggregate::{count_by_year, mode, summary_metrics, top_by_category};
use cord_explorer::analysis::text::{word_frequencies, StopWords};
use cord_explorer::data::filter::{apply_axes, Axis, SelectionPolicy};
use cord_explorer::export::export_to_string;
use cord_explorer::{
    apply, AppState, Category, ConstraintSet, Dashboard, ExplorerConfig, FilteredView, Record,
    RecordStore, StoreCache, TextField,
};
use tempfile::tempdir;

fn paper(journal: &str, year: i32) -> Record {
    Record {
        journal: Some(journal.to_string()),
        publish_year: Some(year),
        ..Record::default()
    }
}

fn three_papers() -> RecordStore {
    RecordStore::from_records(vec![paper("A", 2020), paper("B", 2020), paper("A", 2021)])
}

fn mixed_corpus() -> RecordStore {
    let mut records = Vec::new();
    let journals = ["A", "B", "C"];
    let sources = ["PMC", "Medline"];
    for i in 0..30 {
        records.push(Record {
            title: Some(format!("study {i} of lung disease")),
            journal: (i % 7 != 0).then(|| journals[i % 3].to_string()),
            source: (i % 11 != 0).then(|| sources[i % 2].to_string()),
            publish_year: (i % 5 != 0).then(|| 2018 + (i % 4) as i32),
            abstract_word_count: Some(10 * i as u32),
            ..Record::default()
        });
    }
    RecordStore::from_records(records)
}

#[test]
fn grouping_scenario() {
    let store = three_papers();
    let view = FilteredView::all(&store);

    assert_eq!(count_by_year(&view), BTreeMap::from([(2020, 2), (2021, 1)]));
    assert_eq!(top_by_category(&view, Category::Journal, 1), vec![("A".to_string(), 2)]);
    assert_eq!(mode(&view, Category::Journal).as_deref(), Some("A"));
}

#[test]
fn word_frequency_scenario() {
    let store = RecordStore::from_records(vec![
        Record {
            title: Some("COVID and the Lung".into()),
            ..Record::default()
        },
        Record {
            title: Some("the lung disease".into()),
            ..Record::default()
        },
    ]);
    let table = word_frequencies(
        &FilteredView::all(&store),
        TextField::Title,
        &StopWords::new(["the", "and"]),
        2,
    );
    assert_eq!(table.len(), 3);
    assert_eq!(table.get("lung"), Some(2));
    assert_eq!(table.get("covid"), Some(1));
    assert_eq!(table.get("disease"), Some(1));
    assert_eq!(table.entries()[0].word, "lung");
}

#[test]
fn export_scenario() {
    let store = three_papers();
    let csv = export_to_string(&FilteredView::all(&store), &["journal"], 1).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["journal", "A"]);
}

#[test]
fn every_survivor_satisfies_every_predicate() {
    let store = mixed_corpus();
    let constraints = ConstraintSet::default()
        .with_year_range(2019, 2020)
        .with_journals(["A", "C"])
        .with_sources(["PMC"]);
    let view = apply(&store, &constraints);

    assert!(view.len() <= store.len());
    assert!(!view.is_empty());
    for record in view.iter() {
        let year = record.publish_year.unwrap();
        assert!((2019..=2020).contains(&year));
        assert!(matches!(record.journal.as_deref(), Some("A") | Some("C")));
        assert_eq!(record.source.as_deref(), Some("PMC"));
    }
}

#[test]
fn filter_permutations_agree() {
    let store = mixed_corpus();
    let constraints = ConstraintSet::default()
        .with_year_range(2018, 2020)
        .with_journals(["B"])
        .with_sources(["Medline", "PMC"]);
    let expected = apply(&store, &constraints).into_indices();

    let permutations = [
        [Axis::Year, Axis::Journal, Axis::Source],
        [Axis::Year, Axis::Source, Axis::Journal],
        [Axis::Journal, Axis::Year, Axis::Source],
        [Axis::Journal, Axis::Source, Axis::Year],
        [Axis::Source, Axis::Year, Axis::Journal],
        [Axis::Source, Axis::Journal, Axis::Year],
    ];
    for order in permutations {
        let view = order.iter().fold(FilteredView::all(&store), |view, axis| {
            apply_axes(view, &constraints, &[*axis])
        });
        assert_eq!(view.indices(), expected.as_slice(), "{order:?}");
    }
}

#[test]
fn year_counts_sum_to_records_with_years() {
    let store = mixed_corpus();
    let view = apply(&store, &ConstraintSet::default().with_sources(["PMC"]));
    let with_year = view.iter().filter(|r| r.publish_year.is_some()).count();
    assert_eq!(count_by_year(&view).values().sum::<usize>(), with_year);
}

#[test]
fn top_entries_dominate_the_rest() {
    let store = mixed_corpus();
    let view = FilteredView::all(&store);
    let all = top_by_category(&view, Category::Journal, usize::MAX);
    let top = top_by_category(&view, Category::Journal, 2);

    assert!(top.len() <= 2);
    for (_, kept) in &top {
        for (_, dropped) in &all[top.len()..] {
            assert!(kept >= dropped);
        }
    }
}

#[test]
fn empty_view_flows_through_everything() {
    let store = mixed_corpus();
    let view = apply(&store, &ConstraintSet::default().with_journals(["Nature"]));
    assert!(view.is_empty());

    let metrics = summary_metrics(&view);
    assert_eq!(metrics.count, 0);
    assert_eq!(metrics.year_span, None);
    assert_eq!(metrics.mean_abstract_word_count, None);

    let table = word_frequencies(&view, TextField::Title, &StopWords::default(), 2);
    assert!(table.is_empty());

    let dashboard = Dashboard::build(&store, &view, &ExplorerConfig::default());
    assert_eq!(dashboard.yearly, Some(Vec::new()));
    assert_eq!(export_to_string(&view, &["title"], 10).unwrap(), "title\n");
}

#[test]
fn load_filter_and_report_from_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new_data.csv");
    fs::write(
        &path,
        "title,journal,source_x,publish_time,abstract,abs_word_count\n\
         COVID and the Lung,Lancet,PMC,2020-03-01,First abstract,120\n\
         the lung disease,BMJ,Medline,2020-04-12,,\n\
         Vaccine trial design,Lancet,PMC,2021-01-20,Third abstract,80\n\
         Untitled,,WHO,garbage,,\n",
    )
    .unwrap();

    let mut cache = StoreCache::new();
    let store = cache.load(&path).unwrap();
    let mut state = AppState::new(Arc::clone(&store), &SelectionPolicy::default());

    // Initial selection: every journal option preselected, so the record
    // without a journal or year is filtered out.
    assert_eq!(state.visible_indices(), &[0, 1, 2]);

    state.set_journals(["Lancet"]);
    let view = state.view();
    let dashboard = Dashboard::build(&store, &view, &ExplorerConfig::default());

    assert_eq!(dashboard.metrics.count, 2);
    assert_eq!(dashboard.metrics.year_span, Some(1));
    assert_eq!(dashboard.metrics.mean_abstract_word_count, Some(100.0));
    assert_eq!(dashboard.insights.most_active_journal.as_deref(), Some("Lancet"));
    let words: Vec<&str> = dashboard
        .top_title_words
        .as_ref()
        .unwrap()
        .iter()
        .map(|w| w.word.as_str())
        .collect();
    assert_eq!(words, vec!["covid", "lung", "vaccine", "trial", "design"]);
}

#[test]
fn extreme_years_from_csv_report_a_span() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("years.csv");
    fs::write(&path, "title,journal,publish_year\nA,J,-2000000000\nB,J,2000000000\n").unwrap();

    let store = cord_explorer::load(&path).unwrap();
    let metrics = summary_metrics(&FilteredView::all(&store));
    assert_eq!(metrics.count, 2);
    assert_eq!(metrics.year_span, Some(4_000_000_000));

    let report = Dashboard::build(&store, &FilteredView::all(&store), &ExplorerConfig::default());
    assert!(report.to_string().contains("4000000000 years"));
}
