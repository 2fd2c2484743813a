//! Core data types shared by the catalog, the statistics engine and the parsers.
//!
//! - [`AlignedRead`]: One decoded alignment record (reference, span, length, qualities)
//! - [`IndexProvider`], [`AlignmentReader`]: Capabilities the engine is built on
//! - [`UNMAPPED_REFERENCE`]: The `*` pseudo-reference for reads without a placement
//!
//! ## Coordinates
//!
//! Record starts are 0-based. A record covers `[start, start + aligned_len)` on its
//! reference; positions outside `[0, length)` are dropped when coverage is counted.
//!
//! [`AlignedRead`]: types::AlignedRead
//! [`IndexProvider`]: provider::IndexProvider
//! [`AlignmentReader`]: provider::AlignmentReader
//! [`UNMAPPED_REFERENCE`]: types::UNMAPPED_REFERENCE

pub mod provider;
pub mod types;
