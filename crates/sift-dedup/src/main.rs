//! sift-dedup CLI - Corpus cleaning and deduplication for pretraining data.

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sift_dedup::quality::{clean_files, BadWords, CleanConfig, CleanStats};
use sift_dedup::{
    exact_line_dedup, minhash_dedup_files, run_pipeline, DedupConfig, DedupStats, LineDedupStats,
    MinhashDedupReport,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// JSON output wrapping a stage report.
#[derive(Serialize)]
struct JsonOutput<'a, T: Serialize> {
    command: &'a str,
    output: String,
    elapsed_secs: f64,
    #[serde(flatten)]
    report: T,
}

/// Corpus cleaning and deduplication for pretraining data.
///
/// Every input file is one document. Directories expand to the files they
/// contain. Results are written to an output directory under the same file
/// names; inputs are never modified.
#[derive(Parser, Debug)]
#[command(name = "sift-dedup")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Show a progress spinner.
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove every line that occurs more than once across the corpus
    Lines {
        #[command(flatten)]
        paths: IoArgs,
    },
    /// Remove near-duplicate documents with MinHash and LSH
    Minhash {
        #[command(flatten)]
        paths: IoArgs,
        #[command(flatten)]
        dedup: DedupArgs,
    },
    /// Exact line deduplication followed by MinHash deduplication
    Pipeline {
        #[command(flatten)]
        paths: IoArgs,
        #[command(flatten)]
        dedup: DedupArgs,
    },
    /// Clean documents with line heuristics and optional quality filters
    Clean {
        #[command(flatten)]
        paths: IoArgs,

        /// Apply the Gopher quality rules.
        #[arg(long)]
        gopher: bool,

        /// Mask emails, phone numbers and IP addresses.
        #[arg(long)]
        mask_pii: bool,

        /// File of phrases (one per line) that reject a document.
        #[arg(long, value_name = "FILE")]
        bad_words: Option<PathBuf>,

        /// Minimum sentences for a document to be kept.
        #[arg(long, default_value = "5")]
        min_sentences: usize,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input files or directories.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,
}

impl IoArgs {
    fn inputs_expanded(&self) -> Result<Vec<PathBuf>, sift_dedup::SiftError> {
        sift_dedup::collect_input_files(&self.inputs)
    }
}

#[derive(Args, Debug)]
struct DedupArgs {
    /// Number of MinHash permutations. More = more accurate, but slower.
    #[arg(short = 'p', long, default_value = "128")]
    permutations: usize,

    /// Number of LSH bands (must divide permutations). If omitted, the fewest bands that
    /// still catch 90% of pairs at the threshold.
    #[arg(short = 'b', long)]
    bands: Option<usize>,

    /// N-gram size for shingling.
    #[arg(short = 'n', long, default_value = "5")]
    ngram: usize,

    /// Similarity threshold (0.0-1.0). Documents with similarity >= threshold are duplicates.
    #[arg(short, long, default_value = "0.8")]
    threshold: f64,

    /// Seed for the MinHash permutations.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Drop documents whose normalized text is empty.
    #[arg(long)]
    drop_empty: bool,
}

impl DedupArgs {
    fn to_config(&self) -> Result<DedupConfig, sift_dedup::SiftError> {
        let config = DedupConfig::default()
            .with_permutations(self.permutations)
            .with_ngram_size(self.ngram)
            .with_threshold(self.threshold)
            .with_seed(self.seed)
            .with_drop_empty(self.drop_empty);
        let config = match self.bands {
            Some(b) => config.with_bands(b),
            None => config.with_auto_bands(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Install the stderr log subscriber.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Create a spinner for indeterminate progress.
fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn spinner(cli: &Cli, msg: &str) -> Option<ProgressBar> {
    (cli.progress && !cli.json).then(|| create_spinner(msg))
}

fn print_json<T: Serialize>(
    command: &str,
    output: &Path,
    start: Instant,
    report: T,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = JsonOutput {
        command,
        output: output.display().to_string(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_config(config: &DedupConfig) {
    eprintln!("Configuration:");
    eprintln!("  Permutations:      {}", config.num_permutations);
    eprintln!(
        "  Bands x rows:      {} x {}",
        config.num_bands,
        config.rows_per_band()
    );
    eprintln!("  N-gram size:       {}", config.ngram_size);
    eprintln!("  Threshold:         {}", config.threshold);
    eprintln!("  Seed:              {}", config.seed);
    eprintln!();
}

fn print_line_stats(stats: &LineDedupStats) {
    eprintln!("Line Deduplication Results:");
    eprintln!("  Files written:     {}", stats.files);
    eprintln!("  Files skipped:     {}", stats.skipped_files);
    eprintln!("  Lines read:        {}", stats.lines_read);
    eprintln!("  Distinct lines:    {}", stats.distinct_lines);
    eprintln!("  Lines written:     {}", stats.lines_written);
    eprintln!("  Lines removed:     {}", stats.lines_removed());
}

fn print_dedup_stats(report: &MinhashDedupReport) {
    let stats: &DedupStats = &report.stats;
    eprintln!("Deduplication Results:");
    eprintln!("  Total documents:   {}", stats.total_documents);
    eprintln!("  Unique documents:  {}", stats.unique_documents);
    eprintln!("  Duplicates found:  {}", stats.duplicate_count);
    eprintln!("  Duplicate ratio:   {:.2}%", stats.duplicate_ratio * 100.0);
    eprintln!("  Duplicate clusters: {}", stats.cluster_count);
    eprintln!("  Too short to compare: {}", stats.empty_documents);
    if stats.dropped_empty > 0 {
        eprintln!("  Dropped empty:     {}", stats.dropped_empty);
    }
    if !report.skipped.is_empty() {
        eprintln!("  Unreadable files:  {}", report.skipped.len());
    }
    eprintln!();
    eprintln!("LSH:");
    eprintln!("  Candidate pairs:   {}", stats.candidate_pairs);
    eprintln!("  Verified pairs:    {}", stats.verified_pairs);
}

fn print_clean_stats(stats: &CleanStats) {
    eprintln!("Cleaning Results:");
    eprintln!("  Documents:         {}", stats.documents);
    eprintln!("  Kept:              {}", stats.kept);
    eprintln!("  Too few sentences: {}", stats.too_few_sentences);
    eprintln!("  Bad words:         {}", stats.bad_words);
    eprintln!("  Low quality:       {}", stats.low_quality);
    if stats.skipped > 0 {
        eprintln!("  Unreadable files:  {}", stats.skipped);
    }
    if stats.pii.total() > 0 {
        eprintln!(
            "  Masked PII:        {} emails, {} phones, {} ips",
            stats.pii.emails, stats.pii.phones, stats.pii.ips
        );
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "sift-dedup", &mut io::stdout());
            return Ok(());
        }
        Commands::Lines { paths } => {
            let pb = spinner(cli, "Deduplicating lines...");
            let stats = exact_line_dedup(&paths.inputs_expanded()?, &paths.output)?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            if cli.json {
                print_json("lines", &paths.output, start, &stats)?;
            } else {
                print_line_stats(&stats);
            }
        }
        Commands::Minhash { paths, dedup } => {
            let config = dedup.to_config()?;
            if cli.verbose > 0 && !cli.json {
                print_config(&config);
            }

            let pb = spinner(cli, "Running deduplication...");
            let report = minhash_dedup_files(&paths.inputs, &config, &paths.output)?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            if cli.json {
                print_json("minhash", &paths.output, start, &report)?;
            } else {
                print_dedup_stats(&report);
            }
        }
        Commands::Pipeline { paths, dedup } => {
            let config = dedup.to_config()?;
            if cli.verbose > 0 && !cli.json {
                print_config(&config);
            }

            let pb = spinner(cli, "Running pipeline...");
            let report = run_pipeline(&paths.inputs, &config, &paths.output)?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            if cli.json {
                print_json("pipeline", &paths.output, start, &report)?;
            } else {
                print_line_stats(&report.lines);
                eprintln!();
                print_dedup_stats(&report.minhash);
            }
        }
        Commands::Clean {
            paths,
            gopher,
            mask_pii,
            bad_words,
            min_sentences,
        } => {
            let mut config = CleanConfig::default()
                .with_gopher(*gopher)
                .with_mask_pii(*mask_pii)
                .with_min_sentences(*min_sentences);
            if let Some(path) = bad_words {
                config = config.with_bad_words(BadWords::load(path)?);
            }

            let pb = spinner(cli, "Cleaning documents...");
            let stats = clean_files(&paths.inputs, &config, &paths.output)?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            if cli.json {
                print_json("clean", &paths.output, start, &stats)?;
            } else {
                print_clean_stats(&stats);
            }
        }
    }

    if !cli.json {
        eprintln!();
        eprintln!("Total time: {:.3}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
