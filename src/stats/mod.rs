//! Per-reference alignment statistics.
//!
//! This module provides the computation over aligned reads:
//!
//! - [`StatisticsEngine`]: Loads the reference index, consumes records, emits summary rows
//! - [`CoverageProfile`]: Per-position read depth for one reference
//! - [`ReadAggregator`]: Read lengths and mean qualities for one reference (N50, means, medians)
//! - [`SummaryRow`]: The final, fixed-shape statistics of one reference
//!
//! ## Phases
//!
//! 1. **Load**: reference lengths come from an [`IndexProvider`]; one coverage
//!    profile is created per reference with a nonzero length, one read aggregator
//!    per reference including the unmapped bucket (`*`)
//! 2. **Accumulate**: each record adds its read to the aggregator of its reference
//!    and, unless unmapped, its span to the coverage profile
//! 3. **Summarize**: one [`SummaryRow`] per reference, in load order
//!
//! Records are independent of each other and of their order, so references can be
//! accumulated in parallel ([`StatisticsEngine::accumulate_parallel`]).
//!
//! ## Example
//!
//! ```rust
//! use contig_stats::core::provider::{RecordStream, ReferenceTable};
//! use contig_stats::core::types::AlignedRead;
//! use contig_stats::stats::engine::{compute_statistics, EngineConfig};
//!
//! let index = ReferenceTable::new().with_reference("chr1", 10);
//! let records = RecordStream::new(vec![
//!     AlignedRead::new("chr1", "read1").with_span(2, 5).with_sequence_length(5),
//! ]);
//!
//! let report = compute_statistics(index, records, EngineConfig::default()).unwrap();
//! let row = report.get("chr1").unwrap();
//! assert_eq!(row.covered_bases, Some(5));
//! assert_eq!(row.mean_coverage, Some(0.5));
//! ```
//!
//! [`IndexProvider`]: crate::core::provider::IndexProvider

pub mod coverage;
pub mod engine;
pub mod reads;
pub mod summary;

pub use coverage::CoverageProfile;
pub use engine::{EngineConfig, StatisticsEngine, StatsError, UnknownReferencePolicy};
pub use reads::{EmptyAggregateQuery, ReadAggregator, ReadSummary};
pub use summary::{AccumulateDiagnostics, StatsReport, SummaryRow};
