use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::catalog::store::ReferenceEntry;
use crate::stats::coverage::CoverageProfile;
use crate::stats::reads::{ReadAggregator, ReadSummary};

/// Final statistics for one reference
///
/// `None` means "no data": distributional fields are `None` when the reference
/// received no reads, coverage fields are `None` when no coverage profile is
/// kept for it (the unmapped bucket and zero-length references).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub reference: String,
    pub length: u64,
    pub num_reads: u64,
    pub total_bases: u64,
    pub mean_coverage: Option<f64>,
    pub covered_bases: Option<u64>,
    pub n50: Option<u64>,
    pub mean_len: Option<f64>,
    pub median_len: Option<f64>,
    pub mean_qual: Option<f64>,
    pub median_qual: Option<f64>,
}

impl SummaryRow {
    /// Compute the row for one reference from its accumulated state
    pub fn compute(
        entry: &ReferenceEntry,
        reads: &ReadAggregator,
        coverage: Option<&CoverageProfile>,
        min_depth: u32,
        max_depth: Option<u32>,
    ) -> Self {
        let total_bases = reads.total_bases();
        Self {
            reference: entry.id.clone(),
            length: entry.length,
            num_reads: reads.len() as u64,
            total_bases,
            mean_coverage: coverage.map(CoverageProfile::mean_depth),
            covered_bases: coverage.map(|c| c.covered_bases_within(min_depth, max_depth)),
            n50: reads.n50(total_bases).ok(),
            mean_len: reads.mean_length().ok(),
            median_len: reads.median_length().ok(),
            mean_qual: reads.mean_quality().ok(),
            median_qual: reads.median_quality().ok(),
        }
    }

    /// Returns true if no reads were recorded for this reference
    pub fn is_empty(&self) -> bool {
        self.num_reads == 0
    }
}

/// Counters describing one or more accumulate passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccumulateDiagnostics {
    /// Records applied to an accumulator
    pub records: u64,

    /// Records skipped because their reference was not in the index
    pub unknown_references: u64,

    /// Distinct reference ids seen among the skipped records
    pub unknown_reference_ids: BTreeSet<String>,

    /// Records whose span ran past the end of their reference
    pub clamped_spans: u64,
}

/// The engine's result: one summary row per reference, in load order
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// When the report was produced (RFC 3339)
    pub generated_at: String,

    /// Summary rows in the order references were loaded
    pub references: Vec<SummaryRow>,

    pub diagnostics: AccumulateDiagnostics,

    /// Recorded reads, parallel to `references`
    #[serde(skip)]
    reads: Vec<Vec<ReadSummary>>,

    /// Index: reference id -> index in references vec
    #[serde(skip)]
    id_to_index: HashMap<String, usize>,
}

impl StatsReport {
    pub(crate) fn new(
        references: Vec<SummaryRow>,
        reads: Vec<Vec<ReadSummary>>,
        diagnostics: AccumulateDiagnostics,
    ) -> Self {
        let id_to_index = references
            .iter()
            .enumerate()
            .map(|(i, row)| (row.reference.clone(), i))
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            references,
            diagnostics,
            reads,
            id_to_index,
        }
    }

    /// Summary row for a reference id
    pub fn get(&self, reference: &str) -> Option<&SummaryRow> {
        self.id_to_index
            .get(reference)
            .map(|&idx| &self.references[idx])
    }

    /// Reads recorded against a reference, in record order
    pub fn reads(&self, reference: &str) -> Option<&[ReadSummary]> {
        self.id_to_index
            .get(reference)
            .map(|&idx| self.reads[idx].as_slice())
    }

    /// Look up one read by name under a reference
    pub fn read(&self, reference: &str, read_id: &str) -> Option<&ReadSummary> {
        self.reads(reference)?
            .iter()
            .find(|r| r.read_id == read_id)
    }

    /// Iterate over every reference's rows paired with its reads
    pub fn iter_reads(&self) -> impl Iterator<Item = (&SummaryRow, &ReadSummary)> {
        self.references
            .iter()
            .zip(&self.reads)
            .flat_map(|(row, reads)| reads.iter().map(move |r| (row, r)))
    }

    /// Number of summary rows, including the unmapped bucket
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
