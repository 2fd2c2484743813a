//! # contig-stats
//!
//! A library for per-reference coverage and read statistics of aligned reads.
//!
//! Given the reference lengths of an alignment (from a BAM header, `samtools idxstats`
//! output or a FASTA index) and a stream of alignment records, `contig-stats` produces
//! one summary row per reference, plus a row for reads with no placement (`*`).
//!
//! ## Features
//!
//! - **Coverage**: Mean depth and number of covered positions, with a configurable depth window
//! - **Read lengths**: Read count, total bases, N50, mean and median length
//! - **Base quality**: Mean and median of the per-read mean phred quality
//! - **Parallel accumulation**: References are independent and can be accumulated on a thread pool
//! - **Pluggable inputs**: Any [`IndexProvider`] and [`AlignmentReader`] can drive the engine
//!
//! ## Example
//!
//! ```rust,no_run
//! use contig_stats::parsing::bam;
//! use contig_stats::{compute_statistics, EngineConfig};
//! use std::path::Path;
//!
//! let reader = bam::open(Path::new("sample.bam")).unwrap();
//! let index = reader.index_provider();
//!
//! let report = compute_statistics(index, reader, EngineConfig::default()).unwrap();
//! for row in &report.references {
//!     println!("{}: {} reads, N50 {:?}", row.reference, row.num_reads, row.n50);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: The validated reference -> length table
//! - [`core`]: Record type and the index/reader capabilities
//! - [`stats`]: Coverage profiles, read aggregation and the statistics engine
//! - [`parsing`]: BAM, idxstats and FASTA index inputs
//! - [`cli`]: Command-line interface implementation
//!
//! [`IndexProvider`]: core::provider::IndexProvider
//! [`AlignmentReader`]: core::provider::AlignmentReader

pub mod catalog;
pub mod cli;
pub mod core;
pub mod parsing;
pub mod stats;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::ReferenceCatalog;
pub use core::provider::{AlignmentReader, IndexProvider};
pub use core::types::*;
pub use stats::engine::{compute_statistics, EngineConfig, StatisticsEngine};
pub use stats::summary::{StatsReport, SummaryRow};
