//! The reference catalog: the validated reference -> length table of one run.
//!
//! A catalog is built from whatever an [`IndexProvider`] reports (a BAM header,
//! `samtools idxstats` output, a FASTA index) and fixes the order in which
//! summary rows are emitted. Lengths are validated on load; a negative length
//! rejects the whole table.
//!
//! ## Example
//!
//! ```rust
//! use contig_stats::ReferenceCatalog;
//!
//! let catalog = ReferenceCatalog::initialize([("chr1", 1000), ("chr2", 500)]).unwrap();
//!
//! // The unmapped bucket is synthesized when the index omits it
//! assert_eq!(catalog.len(), 3);
//! assert_eq!(catalog.lengths()["chr1"], 1000);
//! ```
//!
//! [`IndexProvider`]: crate::core::provider::IndexProvider

pub mod store;
