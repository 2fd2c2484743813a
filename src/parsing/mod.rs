//! File-backed index providers and alignment readers.
//!
//! This module provides:
//!
//! - **BAM files**: Reference dictionary from the header, and decoded records
//!   ([`bam::open`], [`bam::BamIndexProvider`], [`bam::BamAlignmentReader`])
//! - **samtools idxstats output**: Reference lengths plus per-reference read counts
//! - **FASTA index (.fai) files**: Reference lengths
//!
//! ## Example
//!
//! ```rust,no_run
//! use contig_stats::parsing::bam;
//! use contig_stats::stats::engine::{compute_statistics, EngineConfig};
//! use std::path::Path;
//!
//! let reader = bam::open(Path::new("sample.bam")).unwrap();
//! let index = reader.index_provider();
//! let report = compute_statistics(index, reader, EngineConfig::default()).unwrap();
//!
//! for row in &report.references {
//!     println!("{}\t{}", row.reference, row.num_reads);
//! }
//! ```
//!
//! ## Record fields
//!
//! | Field | Taken from |
//! |-------|------------|
//! | reference | `RNAME`, or `*` when the record has none |
//! | start | `POS - 1` |
//! | aligned length | `M`/`I`/`=`/`X` operations of the CIGAR |
//! | sequence length | length of `SEQ` |
//! | qualities | `QUAL`, empty when stored as missing |

pub mod bam;
pub mod fai;
pub mod idxstats;
