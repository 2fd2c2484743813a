use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::{check_input, fmt_opt_f64, IndexArgs, IndexSource, OutputFormat};
use crate::parsing::bam;
use crate::stats::engine::{compute_statistics, EngineConfig};
use crate::stats::reads::ReadSummary;
use crate::stats::summary::StatsReport;

#[derive(Args)]
pub struct ReadsArgs {
    /// Input BAM file
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Only list reads placed on this reference (use `*` for unmapped reads)
    #[arg(short, long)]
    pub reference: Option<String>,
}

/// Execute reads subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be read, or the requested reference is
/// not in the index.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ReadsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    check_input(&args.input)?;
    let reader = bam::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let index = IndexSource::resolve(&args.index, reader.index_provider())?;

    // Only per-read values are listed, so no depth arrays are allocated
    let config = EngineConfig {
        track_coverage: false,
        ..EngineConfig::default()
    };
    let report = compute_statistics(index, reader, config)
        .with_context(|| format!("Failed to read records from {}", args.input.display()))?;

    if let Some(reference) = &args.reference {
        anyhow::ensure!(
            report.get(reference).is_some(),
            "Reference '{reference}' is not in the index"
        );
    }

    if verbose {
        eprintln!("Read {} records", report.diagnostics.records);
    }

    let filter = args.reference.as_deref();
    match format {
        OutputFormat::Text => print_text(&report, filter),
        OutputFormat::Json => print_json(&report, filter)?,
        OutputFormat::Tsv => print_tsv(&report, filter),
    }

    Ok(())
}

fn selected<'a>(
    report: &'a StatsReport,
    filter: Option<&'a str>,
) -> impl Iterator<Item = (&'a str, &'a ReadSummary)> + 'a {
    report
        .iter_reads()
        .filter(move |(row, _)| filter.map_or(true, |f| row.reference == f))
        .map(|(row, read)| (row.reference.as_str(), read))
}

fn quality(read: &ReadSummary) -> Option<f64> {
    read.has_quality.then_some(read.mean_quality)
}

fn print_text(report: &StatsReport, filter: Option<&str>) {
    let mut count = 0usize;
    for (reference, read) in selected(report, filter) {
        println!(
            "{}  {}  {} bp  Q{}",
            read.read_id,
            reference,
            read.length,
            fmt_opt_f64(quality(read))
        );
        count += 1;
    }
    println!("\n{count} reads");
}

fn print_json(report: &StatsReport, filter: Option<&str>) -> anyhow::Result<()> {
    let reads: Vec<_> = selected(report, filter)
        .map(|(reference, read)| {
            json!({
                "read_id": read.read_id,
                "reference": reference,
                "length": read.length,
                "mean_quality": quality(read),
            })
        })
        .collect();

    let output = json!({
        "count": reads.len(),
        "reads": reads,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(report: &StatsReport, filter: Option<&str>) {
    println!("read_id\treference\tlength\tmean_quality");
    for (reference, read) in selected(report, filter) {
        println!(
            "{}\t{}\t{}\t{}",
            read.read_id,
            reference,
            read.length,
            fmt_opt_f64(quality(read))
        );
    }
}
