use serde::{Deserialize, Serialize};

/// Reference id of the pseudo-reference collecting reads that did not align
pub const UNMAPPED_REFERENCE: &str = "*";

/// Returns true if `id` names the unmapped bucket
#[must_use]
pub fn is_unmapped(id: &str) -> bool {
    id == UNMAPPED_REFERENCE
}

/// One decoded aligned-read record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRead {
    /// Name of the reference the read is reported against (`*` if unmapped)
    pub ref_id: String,

    /// Read name (QNAME)
    pub read_id: String,

    /// 0-based alignment start on the reference
    pub start: i64,

    /// Number of positions the read spans when added to the coverage profile
    pub aligned_len: i64,

    /// Length of the stored read sequence
    pub seq_len: u64,

    /// Phred quality values, one per base; empty if the record carries none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_values: Vec<u8>,
}

impl AlignedRead {
    pub fn new(ref_id: impl Into<String>, read_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            read_id: read_id.into(),
            start: 0,
            aligned_len: 0,
            seq_len: 0,
            quality_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, start: i64, aligned_len: i64) -> Self {
        self.start = start;
        self.aligned_len = aligned_len;
        self
    }

    #[must_use]
    pub fn with_sequence_length(mut self, seq_len: u64) -> Self {
        self.seq_len = seq_len;
        self
    }

    #[must_use]
    pub fn with_qualities(mut self, quality_values: Vec<u8>) -> Self {
        self.quality_values = quality_values;
        self
    }

    /// Returns true if this record belongs to the unmapped bucket
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        is_unmapped(&self.ref_id)
    }

    /// Mean of the per-base quality values, `None` if there are none
    #[must_use]
    pub fn mean_quality(&self) -> Option<f64> {
        mean_quality(&self.quality_values)
    }
}

/// Arithmetic mean of phred quality values
///
/// Returns `None` for an empty slice so a quality-free read can be told apart
/// from one whose qualities really average to zero.
#[must_use]
pub fn mean_quality(quality_values: &[u8]) -> Option<f64> {
    if quality_values.is_empty() {
        return None;
    }
    let sum: u64 = quality_values.iter().map(|&q| u64::from(q)).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(sum as f64 / quality_values.len() as f64)
}
