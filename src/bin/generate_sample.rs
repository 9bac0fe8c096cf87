use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Write a synthetic CORD-19 style corpus for trying out the explorer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Output file; a `.parquet` extension writes Parquet, anything else CSV
    #[arg(default_value = "new_data.csv")]
    output: PathBuf,

    /// Number of papers to generate
    #[arg(default_value_t = 2000)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One synthetic paper.
struct Paper {
    title: String,
    journal: Option<&'static str>,
    source: &'static str,
    publish_time: Option<String>,
    abstract_text: Option<String>,
    abs_word_count: Option<i64>,
}

const JOURNALS: [&str; 8] = [
    "PLoS One",
    "bioRxiv",
    "BMJ",
    "The Lancet",
    "Nature",
    "Virology Journal",
    "Journal of Virology",
    "Emerging Infectious Diseases",
];
const SOURCES: [&str; 4] = ["PMC", "Medline", "WHO", "Elsevier"];
const TOPIC_WORDS: [&str; 16] = [
    "COVID-19",
    "coronavirus",
    "SARS-CoV-2",
    "respiratory",
    "infection",
    "patients",
    "clinical",
    "transmission",
    "vaccine",
    "pneumonia",
    "outbreak",
    "viral",
    "lung",
    "analysis",
    "pandemic",
    "immune",
];
const FILLER_WORDS: [&str; 8] = ["the", "and", "of", "in", "for", "with", "a", "on"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }

    /// Skewed pick: earlier entries come up more often.
    fn skewed<'a>(&mut self, items: &[&'a str]) -> &'a str {
        let a = self.below(items.len());
        let b = self.below(items.len());
        items[a.min(b)]
    }
}

fn sentence(rng: &mut SimpleRng, words: usize) -> String {
    (0..words)
        .map(|_| {
            if rng.chance(35) {
                FILLER_WORDS[rng.below(FILLER_WORDS.len())]
            } else {
                TOPIC_WORDS[rng.below(TOPIC_WORDS.len())]
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Paper> {
    (0..n)
        .map(|_| {
            let year = 2019 + rng.below(4) as i32;
            let month = 1 + rng.below(12);
            let day = 1 + rng.below(28);
            let publish_time = (!rng.chance(5)).then(|| {
                if rng.chance(10) {
                    format!("{year}")
                } else {
                    format!("{year}-{month:02}-{day:02}")
                }
            });

            let title_len = 3 + rng.below(8);
            let title = sentence(rng, title_len);

            let abstract_len = 40 + rng.below(260);
            let has_abstract = !rng.chance(15);
            let abstract_text = has_abstract.then(|| sentence(rng, abstract_len));

            Paper {
                title,
                journal: (!rng.chance(8)).then(|| rng.skewed(&JOURNALS)),
                source: rng.skewed(&SOURCES),
                publish_time,
                abstract_text,
                abs_word_count: has_abstract.then_some(abstract_len as i64),
            }
        })
        .collect()
}

fn write_csv(path: &Path, papers: &[Paper]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).context("creating CSV output")?;
    wtr.write_record([
        "title",
        "journal",
        "source_x",
        "publish_time",
        "abstract",
        "abs_word_count",
    ])?;
    for p in papers {
        wtr.write_record([
            p.title.clone(),
            p.journal.unwrap_or_default().to_string(),
            p.source.to_string(),
            p.publish_time.clone().unwrap_or_default(),
            p.abstract_text.clone().unwrap_or_default(),
            p.abs_word_count.map(|n| n.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, papers: &[Paper]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("journal", DataType::Utf8, true),
        Field::new("source_x", DataType::Utf8, false),
        Field::new("publish_time", DataType::Utf8, true),
        Field::new("abstract", DataType::Utf8, true),
        Field::new("abs_word_count", DataType::Int64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(papers.iter().map(|p| p.title.as_str()))),
            Arc::new(papers.iter().map(|p| p.journal).collect::<StringArray>()),
            Arc::new(StringArray::from_iter_values(papers.iter().map(|p| p.source))),
            Arc::new(
                papers
                    .iter()
                    .map(|p| p.publish_time.as_deref())
                    .collect::<StringArray>(),
            ),
            Arc::new(
                papers
                    .iter()
                    .map(|p| p.abstract_text.as_deref())
                    .collect::<StringArray>(),
            ),
            Arc::new(Int64Array::from(
                papers.iter().map(|p| p.abs_word_count).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let papers = generate(&mut rng, args.rows);

    let path = args.output.as_path();
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("parquet")) {
        write_parquet(path, &papers)?;
    } else {
        write_csv(path, &papers)?;
    }

    println!("Wrote {} papers to {}", papers.len(), path.display());
    Ok(())
}
