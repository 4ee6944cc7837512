use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wiktionary_onyomi::{Config, Diagnostics, Pipeline, Stats, WikiCache};

#[derive(Parser)]
#[command(name = "wiktionary-onyomi")]
#[command(about = "Extract kanji on'yomi from Japanese Wiktionary markup and group characters by shared readings")]
struct Args {
    /// Output JSONL file
    output: PathBuf,

    /// Wiki cache file (.tsv or .tsv.bz2)
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// Configuration file (default: onyomi.yaml or config/onyomi.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference reading list (JSON)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Patch overlay (JSON)
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Override table (YAML) replacing the built-in one
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Treat out-of-list readings as standard
    #[arg(long)]
    merge_non_standard: bool,

    /// File old spellings of out-of-list readings as standard
    #[arg(long)]
    show_non_standard: bool,

    /// One row per standard pronunciation of each group
    #[arg(long)]
    duplicate: bool,

    /// Join variant glyphs without provenance marks
    #[arg(long)]
    no_marks: bool,

    /// Write per-character profiles instead of grouped rows
    #[arg(long)]
    profiles: bool,

    /// Write collected diagnostics as JSON
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(cache) = &self.cache {
            config.cache = cache.clone();
        }
        if self.reference.is_some() {
            config.reference = self.reference.clone();
        }
        if self.patch.is_some() {
            config.patch = self.patch.clone();
        }
        if self.overrides.is_some() {
            config.overrides = self.overrides.clone();
        }
        config.grouping.merge_non_standard |= self.merge_non_standard;
        config.grouping.show_non_standard |= self.show_non_standard;
        config.grouping.duplicate_by_pronunciation |= self.duplicate;
        if self.no_marks {
            config.variant_marks = false;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn write_jsonl<T: Serialize>(writer: &mut impl Write, records: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut *writer, &record)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

#[derive(Serialize)]
struct ProfileRecord<'a> {
    character: &'a str,
    onyomi: &'a wiktionary_onyomi::KanjiReadingProfile,
}

fn print_stats(stats: &Stats, diagnostics: &Diagnostics) {
    println!();
    println!("============================================================");
    println!("Pages processed: {}", stats.pages_processed);
    println!("Profiles extracted: {}", stats.profiles_extracted);
    println!("Profiles after reconciliation: {}", stats.profiles_reconciled);
    println!("Groups: {}", stats.groups);
    println!("Rows written: {}", stats.rows_written);
    println!("------------------------------------------------------------");
    println!("Reading-type labels:");
    for (reading_type, count) in &diagnostics.label_counts {
        println!("  {}: {}", reading_type, count);
    }
    println!("Unknown labels: {}", diagnostics.unknown_labels.values().sum::<usize>());
    println!("Dropped tokens: {}", diagnostics.dropped_tokens.len());
    println!("No pronunciation section: {}", diagnostics.missing_section.len());
    println!("Empty profiles: {}", diagnostics.empty_profiles.len());
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!("============================================================");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = Config::discover(args.config.as_deref()).context("loading configuration")?;
    args.apply_to(&mut config);

    let pipeline = Pipeline::from_config(&config).context("loading override, patch or reference data")?;
    let cache = WikiCache::load(&config.cache)
        .with_context(|| format!("reading wiki cache {}", config.cache.display()))?;

    if !args.quiet {
        println!("Cache: {}", config.cache.display());
        println!("Output: {}", args.output.display());
        if let Some(limit) = args.limit {
            println!("Page limit: {}", limit);
        }
        println!();
    }

    let start_time = Instant::now();
    let mut stats = Stats::default();
    let mut diagnostics = Diagnostics::default();

    let total = args.limit.map_or(cache.len(), |limit| limit.min(cache.len()));
    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40} {pos}/{len} {msg}")
                .context("progress template")?,
        );
        pb
    };

    let mut profiles = BTreeMap::new();
    for (character, markup) in cache.pages().take(total) {
        pb.set_message(character.to_string());
        profiles.extend(pipeline.extract_character(character, markup, &mut diagnostics));
        stats.pages_processed += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();
    stats.profiles_extracted = profiles.len();

    let profiles = pipeline.reconcile(profiles);
    stats.profiles_reconciled = profiles.len();

    let output = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = BufWriter::with_capacity(256 * 1024, output);
    if args.profiles {
        stats.rows_written = write_jsonl(
            &mut writer,
            profiles
                .iter()
                .map(|(character, onyomi)| ProfileRecord { character, onyomi }),
        )?;
    } else {
        let rows = pipeline.rows(&profiles);
        stats.groups = rows.iter().filter(|row| row.primary).count();
        stats.rows_written = write_jsonl(&mut writer, &rows)?;
    }
    writer.flush()?;

    if let Some(path) = &args.diagnostics {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &diagnostics)?;
    }

    stats.elapsed = start_time.elapsed();
    if !args.quiet {
        print_stats(&stats, &diagnostics);
    }

    Ok(())
}
