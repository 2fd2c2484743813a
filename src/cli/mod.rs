//! Command-line interface for contig-stats.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **stats**: Per-reference coverage, length, quality and N50 summary of a BAM file
//! - **reads**: Per-read length and mean quality, with the reference each read is placed on
//!
//! ## Usage
//!
//! ```text
//! # Summary table of a BAM file
//! contig-stats stats sample.bam
//!
//! # Take reference lengths from samtools idxstats instead of the header
//! samtools idxstats sample.bam > sample.idxstats
//! contig-stats stats sample.bam --idxstats sample.idxstats
//!
//! # JSON output for scripting, four worker threads
//! contig-stats stats sample.bam --format json --threads 4
//!
//! # Per-read table
//! contig-stats reads sample.bam --format tsv
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::core::provider::IndexProvider;
use crate::parsing::bam::BamIndexProvider;
use crate::parsing::fai::FaiIndexProvider;
use crate::parsing::idxstats::IdxstatsProvider;

pub mod reads;
pub mod stats;

#[derive(Parser)]
#[command(name = "contig-stats")]
#[command(version)]
#[command(about = "Per-reference coverage and read statistics from aligned reads")]
#[command(
    long_about = "contig-stats summarizes a BAM file reference by reference.\n\nFor every reference sequence, plus the unmapped bucket (*), it reports:\n- Number of reads and bases\n- Mean coverage depth and the number of covered positions\n- Read length N50, mean and median\n- Mean and median of per-read mean base quality"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize coverage and read statistics per reference
    Stats(stats::StatsArgs),

    /// List every read with its reference, length and mean quality
    Reads(reads::ReadsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where reference lengths come from
#[derive(clap::Args)]
#[group(multiple = false)]
pub struct IndexArgs {
    /// Take reference lengths from `samtools idxstats` output instead of the BAM header
    #[arg(long)]
    pub idxstats: Option<PathBuf>,

    /// Take reference lengths from a FASTA index (.fai) instead of the BAM header
    #[arg(long)]
    pub fai: Option<PathBuf>,
}

/// The selected index source
pub enum IndexSource {
    Header(BamIndexProvider),
    Idxstats(IdxstatsProvider),
    Fai(FaiIndexProvider),
}

impl IndexSource {
    /// Resolve the index source; the BAM header is used when no file is given
    ///
    /// # Errors
    ///
    /// Returns an error if the index file is missing or cannot be parsed.
    pub fn resolve(args: &IndexArgs, header: BamIndexProvider) -> anyhow::Result<Self> {
        if let Some(path) = &args.idxstats {
            check_input(path)?;
            let provider = IdxstatsProvider::from_path(path)
                .with_context(|| format!("Failed to read idxstats file {}", path.display()))?;
            Ok(Self::Idxstats(provider))
        } else if let Some(path) = &args.fai {
            check_input(path)?;
            let provider = FaiIndexProvider::from_path(path)
                .with_context(|| format!("Failed to read FASTA index {}", path.display()))?;
            Ok(Self::Fai(provider))
        } else {
            Ok(Self::Header(header))
        }
    }
}

impl IndexProvider for IndexSource {
    fn reference_lengths(
        &mut self,
    ) -> Result<Vec<(String, i64)>, crate::parsing::bam::ParseError> {
        match self {
            Self::Header(p) => p.reference_lengths(),
            Self::Idxstats(p) => p.reference_lengths(),
            Self::Fai(p) => p.reference_lengths(),
        }
    }
}

/// Fail early, with the path in the message, when an input file is unusable
///
/// # Errors
///
/// Returns an error if the path is missing or empty.
pub fn check_input(path: &Path) -> anyhow::Result<()> {
    crate::utils::validation::validate_input_file(path)?;
    Ok(())
}

/// Render an optional float for text/TSV output
pub(crate) fn fmt_opt_f64(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v:.2}"))
}

/// Render an optional integer for text/TSV output
pub(crate) fn fmt_opt_u64(value: Option<u64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_optional_values() {
        assert_eq!(fmt_opt_f64(Some(0.5)), "0.50");
        assert_eq!(fmt_opt_f64(None), "NA");
        assert_eq!(fmt_opt_u64(Some(90)), "90");
        assert_eq!(fmt_opt_u64(None), "NA");
    }

    #[test]
    fn test_cli_parses_stats() {
        let cli = Cli::try_parse_from([
            "contig-stats",
            "stats",
            "sample.bam",
            "--min-depth",
            "2",
            "--threads",
            "4",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, OutputFormat::Json));
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.min_depth, 2);
                assert_eq!(args.threads, 4);
                assert!(args.max_depth.is_none());
            }
            Commands::Reads(_) => panic!("expected stats"),
        }
    }

    #[test]
    fn test_cli_index_sources_conflict() {
        let result = Cli::try_parse_from([
            "contig-stats",
            "stats",
            "sample.bam",
            "--idxstats",
            "a.txt",
            "--fai",
            "ref.fa.fai",
        ]);
        assert!(result.is_err());
    }
}
