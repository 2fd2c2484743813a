use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::warn;

use crate::cli::{check_input, fmt_opt_f64, fmt_opt_u64, IndexArgs, IndexSource, OutputFormat};
use crate::parsing::bam;
use crate::stats::engine::{compute_statistics, EngineConfig, UnknownReferencePolicy};
use crate::stats::summary::{StatsReport, SummaryRow};

#[derive(Args)]
pub struct StatsArgs {
    /// Input BAM file
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Lowest depth counted as a covered position
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_depth: u32,

    /// Highest depth counted as a covered position (unbounded by default)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Worker threads; above one, references are accumulated in parallel
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..=256))]
    pub threads: u16,

    /// Fail on records aligned to a reference missing from the index
    /// instead of skipping them
    #[arg(long)]
    pub strict: bool,
}

impl StatsArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_depth: self.min_depth,
            max_depth: self.max_depth,
            unknown_reference_policy: if self.strict {
                UnknownReferencePolicy::Abort
            } else {
                UnknownReferencePolicy::Skip
            },
            threads: usize::from(self.threads),
            track_coverage: true,
        }
    }
}

/// Execute stats subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be read or the statistics cannot be computed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: StatsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if let Some(max) = args.max_depth {
        anyhow::ensure!(
            max >= args.min_depth,
            "--max-depth ({max}) must not be below --min-depth ({})",
            args.min_depth
        );
    }

    check_input(&args.input)?;
    let reader = bam::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let index = IndexSource::resolve(&args.index, reader.index_provider())?;

    let expected_counts = match &index {
        IndexSource::Idxstats(p) => Some(p.rows().to_vec()),
        _ => None,
    };

    let report = compute_statistics(index, reader, args.engine_config())
        .with_context(|| format!("Failed to compute statistics for {}", args.input.display()))?;

    if let Some(rows) = expected_counts {
        for expected in rows {
            if let Some(row) = report.get(&expected.name) {
                if row.num_reads != expected.records() {
                    warn!(
                        reference = %expected.name,
                        idxstats = expected.records(),
                        observed = row.num_reads,
                        "Read count differs from idxstats"
                    );
                }
            }
        }
    }

    if verbose {
        eprintln!(
            "Processed {} records over {} references",
            report.diagnostics.records,
            report.len()
        );
    }

    match format {
        OutputFormat::Text => print_text_report(&report),
        OutputFormat::Json => print_json_report(&report)?,
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    Ok(())
}

const TSV_HEADER: &str = "reference\tlength\tnum_reads\ttotal_bases\tmean_coverage\tcovered_bases\tn50\tmean_len\tmedian_len\tmean_qual\tmedian_qual";

fn print_text_report(report: &StatsReport) {
    println!("Reference Statistics");
    println!("{}", "=".repeat(60));

    for row in &report.references {
        print_text_row(row);
    }

    let diag = &report.diagnostics;
    if diag.unknown_references > 0 {
        println!(
            "\nSkipped {} records on references missing from the index: {}",
            diag.unknown_references,
            diag.unknown_reference_ids
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

fn print_text_row(row: &SummaryRow) {
    println!("\n{} ({} bp)", row.reference, row.length);
    println!("  Reads: {}", row.num_reads);
    println!("  Bases: {}", row.total_bases);
    println!("  Mean coverage: {}", fmt_opt_f64(row.mean_coverage));
    println!("  Covered bases: {}", fmt_opt_u64(row.covered_bases));
    println!("  N50: {}", fmt_opt_u64(row.n50));
    println!(
        "  Length mean/median: {} / {}",
        fmt_opt_f64(row.mean_len),
        fmt_opt_f64(row.median_len)
    );
    println!(
        "  Quality mean/median: {} / {}",
        fmt_opt_f64(row.mean_qual),
        fmt_opt_f64(row.median_qual)
    );
}

fn print_json_report(report: &StatsReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_tsv_report(report: &StatsReport) {
    println!("{TSV_HEADER}");
    for row in &report.references {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.reference,
            row.length,
            row.num_reads,
            row.total_bases,
            fmt_opt_f64(row.mean_coverage),
            fmt_opt_u64(row.covered_bases),
            fmt_opt_u64(row.n50),
            fmt_opt_f64(row.mean_len),
            fmt_opt_f64(row.median_len),
            fmt_opt_f64(row.mean_qual),
            fmt_opt_f64(row.median_qual),
        );
    }
}
