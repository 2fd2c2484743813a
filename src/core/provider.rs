//! Capability traits for the two collaborators the statistics engine depends on.
//!
//! The engine never opens files itself: reference lengths come from an
//! [`IndexProvider`] and records from an [`AlignmentReader`]. File-backed
//! implementations live in [`crate::parsing`]; the in-memory ones here serve
//! tests and callers that already hold decoded data.

use std::collections::VecDeque;

use crate::core::types::AlignedRead;
use crate::parsing::bam::ParseError;

/// Supplies the reference -> length table of an alignment
pub trait IndexProvider {
    /// Return `(reference id, length)` pairs in index order
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the underlying index cannot be read.
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError>;
}

/// Supplies a single forward pass over decoded aligned-read records
pub trait AlignmentReader {
    /// Next record, `None` once the stream is exhausted
    fn next_record(&mut self) -> Option<Result<AlignedRead, ParseError>>;
}

impl<P: IndexProvider + ?Sized> IndexProvider for &mut P {
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError> {
        (**self).reference_lengths()
    }
}

impl<R: AlignmentReader + ?Sized> AlignmentReader for &mut R {
    fn next_record(&mut self) -> Option<Result<AlignedRead, ParseError>> {
        (**self).next_record()
    }
}

/// An in-memory reference length table
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<(String, i64)>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reference(mut self, name: impl Into<String>, length: i64) -> Self {
        self.entries.push((name.into(), length));
        self
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for ReferenceTable {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, l)| (n.into(), l)).collect(),
        }
    }
}

impl IndexProvider for ReferenceTable {
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError> {
        Ok(self.entries.clone())
    }
}

/// An in-memory record stream; each record is yielded once
#[derive(Debug, Clone, Default)]
pub struct RecordStream {
    records: VecDeque<AlignedRead>,
}

impl RecordStream {
    pub fn new(records: Vec<AlignedRead>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl FromIterator<AlignedRead> for RecordStream {
    fn from_iter<T: IntoIterator<Item = AlignedRead>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl AlignmentReader for RecordStream {
    fn next_record(&mut self) -> Option<Result<AlignedRead, ParseError>> {
        self.records.pop_front().map(Ok)
    }
}
