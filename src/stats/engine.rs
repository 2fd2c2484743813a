use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::store::{CatalogError, ReferenceCatalog, ReferenceEntry};
use crate::core::provider::{AlignmentReader, IndexProvider};
use crate::core::types::AlignedRead;
use crate::parsing::bam::ParseError;
use crate::stats::coverage::CoverageProfile;
use crate::stats::reads::{EmptyAggregateQuery, ReadAggregator};
use crate::stats::summary::{AccumulateDiagnostics, StatsReport, SummaryRow};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error(transparent)]
    Index(#[from] CatalogError),

    #[error("Failed to read input: {0}")]
    Source(#[from] ParseError),

    #[error("Unknown reference: '{0}' is not in the index")]
    UnknownReference(String),

    #[error(transparent)]
    EmptyAggregate(#[from] EmptyAggregateQuery),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What to do with a record whose reference is not in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReferencePolicy {
    /// Skip the record, count it, and warn once at the end of the pass
    #[default]
    Skip,
    /// Fail the pass on the first such record
    Abort,
}

/// Configuration for the statistics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lowest depth counted as covered
    pub min_depth: u32,
    /// Highest depth counted as covered; `None` for no upper bound
    pub max_depth: Option<u32>,
    pub unknown_reference_policy: UnknownReferencePolicy,
    /// Worker threads; more than one selects per-reference parallel accumulation
    pub threads: usize,
    /// Keep per-position depth; when false, coverage fields of every row are `None`
    pub track_coverage: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_depth: 1,
            max_depth: None,
            unknown_reference_policy: UnknownReferencePolicy::Skip,
            threads: 1,
            track_coverage: true,
        }
    }
}

/// The part of a record the accumulators keep: per-base qualities are
/// reduced to their mean when the record is read
#[derive(Debug, Clone, PartialEq)]
struct PlacedRead {
    read_id: String,
    start: i64,
    aligned_len: i64,
    seq_len: u64,
    mean_quality: Option<f64>,
}

impl From<AlignedRead> for PlacedRead {
    fn from(record: AlignedRead) -> Self {
        Self {
            mean_quality: record.mean_quality(),
            read_id: record.read_id,
            start: record.start,
            aligned_len: record.aligned_len,
            seq_len: record.seq_len,
        }
    }
}

/// Accumulated state of one reference; never shared between references
#[derive(Debug, Clone)]
struct ContigAccumulator {
    coverage: Option<CoverageProfile>,
    reads: ReadAggregator,
}

impl ContigAccumulator {
    fn new(entry: &ReferenceEntry, track_coverage: bool) -> Self {
        Self {
            coverage: (track_coverage && entry.has_coverage())
                .then(|| CoverageProfile::new(entry.length)),
            reads: ReadAggregator::new(),
        }
    }

    /// Apply one record; returns true if its span was clamped at the reference end
    ///
    /// The unmapped bucket never has a coverage profile, so its reads only
    /// reach the aggregator.
    fn add(&mut self, read: PlacedRead) -> bool {
        let clamped = self
            .coverage
            .as_mut()
            .is_some_and(|coverage| coverage.add_span(read.start, read.aligned_len) > 0);
        self.reads
            .record_mean(read.read_id, read.seq_len, read.mean_quality);
        clamped
    }
}

/// Computes per-reference coverage and read statistics
///
/// Runs in three phases: [`load`](Self::load) builds the catalog and one
/// accumulator per reference, [`accumulate`](Self::accumulate) consumes a
/// record stream, [`summarize`](Self::summarize) consumes the engine and
/// returns the report.
pub struct StatisticsEngine {
    catalog: ReferenceCatalog,
    contigs: Vec<ContigAccumulator>,
    config: EngineConfig,
    diagnostics: AccumulateDiagnostics,
}

impl StatisticsEngine {
    /// Load reference lengths from an index provider
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Source` if the index cannot be read, or
    /// `StatsError::Index` if it contains a negative length or a repeated id.
    pub fn load<P: IndexProvider>(mut provider: P, config: EngineConfig) -> Result<Self, StatsError> {
        let table = provider.reference_lengths()?;
        let catalog = ReferenceCatalog::initialize(table)?;
        info!(references = catalog.len(), "Loaded reference index");
        Ok(Self::from_catalog(catalog, config))
    }

    /// Create an engine over an already validated catalog
    pub fn from_catalog(catalog: ReferenceCatalog, config: EngineConfig) -> Self {
        let contigs = catalog
            .references
            .iter()
            .map(|entry| ContigAccumulator::new(entry, config.track_coverage))
            .collect();

        Self {
            catalog,
            contigs,
            config,
            diagnostics: AccumulateDiagnostics::default(),
        }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &AccumulateDiagnostics {
        &self.diagnostics
    }

    /// Apply a single record
    ///
    /// # Errors
    ///
    /// Returns `StatsError::UnknownReference` if the record's reference is not
    /// in the catalog; no accumulator is touched in that case.
    pub fn accumulate_record(&mut self, record: AlignedRead) -> Result<(), StatsError> {
        let idx = self
            .catalog
            .index_of(&record.ref_id)
            .ok_or_else(|| StatsError::UnknownReference(record.ref_id.clone()))?;

        self.diagnostics.records += 1;
        if self.contigs[idx].add(PlacedRead::from(record)) {
            self.diagnostics.clamped_spans += 1;
        }
        Ok(())
    }

    /// Consume every record of a reader in a single pass
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Source` if the reader fails, or
    /// `StatsError::UnknownReference` under [`UnknownReferencePolicy::Abort`].
    pub fn accumulate<R: AlignmentReader>(&mut self, mut reader: R) -> Result<(), StatsError> {
        while let Some(result) = reader.next_record() {
            match self.accumulate_record(result?) {
                Ok(()) => {}
                Err(StatsError::UnknownReference(id)) => self.skip_unknown(id)?,
                Err(e) => return Err(e),
            }
        }
        self.finish_pass();
        Ok(())
    }

    /// Consume every record, accumulating references in parallel
    ///
    /// Records are first partitioned by reference, each reduced to its placement,
    /// length and mean quality; each worker then owns the
    /// accumulators of the references it processes, so the result is identical
    /// to [`accumulate`](Self::accumulate). Uses `config.threads` workers.
    ///
    /// # Errors
    ///
    /// Same as [`accumulate`](Self::accumulate), plus `StatsError::ThreadPool`
    /// if the worker pool cannot be created.
    pub fn accumulate_parallel<R: AlignmentReader>(&mut self, mut reader: R) -> Result<(), StatsError> {
        let mut buckets: Vec<Vec<PlacedRead>> =
            (0..self.contigs.len()).map(|_| Vec::new()).collect();

        while let Some(result) = reader.next_record() {
            let record = result?;
            match self.catalog.index_of(&record.ref_id) {
                Some(idx) => buckets[idx].push(PlacedRead::from(record)),
                None => self.skip_unknown(record.ref_id)?,
            }
        }

        let records: usize = buckets.iter().map(Vec::len).sum();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.max(1))
            .build()?;

        let contigs = &mut self.contigs;
        let clamped: u64 = pool.install(|| {
            contigs
                .par_iter_mut()
                .zip(buckets.into_par_iter())
                .map(|(contig, bucket)| {
                    bucket
                        .into_iter()
                        .map(|read| u64::from(contig.add(read)))
                        .sum::<u64>()
                })
                .sum()
        });

        self.diagnostics.records += records as u64;
        self.diagnostics.clamped_spans += clamped;
        self.finish_pass();
        Ok(())
    }

    fn skip_unknown(&mut self, id: String) -> Result<(), StatsError> {
        match self.config.unknown_reference_policy {
            UnknownReferencePolicy::Abort => Err(StatsError::UnknownReference(id)),
            UnknownReferencePolicy::Skip => {
                debug!(reference = %id, "Skipping record with unknown reference");
                self.diagnostics.unknown_references += 1;
                self.diagnostics.unknown_reference_ids.insert(id);
                Ok(())
            }
        }
    }

    fn finish_pass(&self) {
        let diag = &self.diagnostics;
        if diag.unknown_references > 0 {
            warn!(
                skipped = diag.unknown_references,
                references = ?diag.unknown_reference_ids,
                "Skipped records aligned to references missing from the index"
            );
        }
        if diag.clamped_spans > 0 {
            debug!(
                records = diag.clamped_spans,
                "Clamped alignment spans running past the reference end"
            );
        }
        info!(records = diag.records, "Accumulated alignment records");
    }

    /// Compute one summary row per reference, in load order
    pub fn summarize(self) -> StatsReport {
        let min_depth = self.config.min_depth;
        let max_depth = self.config.max_depth;

        let (rows, reads): (Vec<_>, Vec<_>) = self
            .catalog
            .references
            .iter()
            .zip(self.contigs)
            .map(|(entry, contig)| {
                let row = SummaryRow::compute(
                    entry,
                    &contig.reads,
                    contig.coverage.as_ref(),
                    min_depth,
                    max_depth,
                );
                (row, contig.reads.into_reads())
            })
            .unzip();

        StatsReport::new(rows, reads, self.diagnostics)
    }
}

/// Run all three phases over an index provider and a record reader
///
/// Accumulation is parallel when `config.threads` is greater than one.
///
/// # Errors
///
/// Returns any error from [`StatisticsEngine::load`] or the accumulate pass.
pub fn compute_statistics<P, R>(
    provider: P,
    reader: R,
    config: EngineConfig,
) -> Result<StatsReport, StatsError>
where
    P: IndexProvider,
    R: AlignmentReader,
{
    let parallel = config.threads > 1;
    let mut engine = StatisticsEngine::load(provider, config)?;
    if parallel {
        engine.accumulate_parallel(reader)?;
    } else {
        engine.accumulate(reader)?;
    }
    Ok(engine.summarize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::{RecordStream, ReferenceTable};

    fn read(ref_id: &str, read_id: &str, start: i64, len: i64) -> AlignedRead {
        AlignedRead::new(ref_id, read_id)
            .with_span(start, len)
            .with_sequence_length(len.unsigned_abs())
            .with_qualities(vec![30; len.unsigned_abs() as usize])
    }

    fn table() -> ReferenceTable {
        ReferenceTable::new()
            .with_reference("chr1", 1000)
            .with_reference("chr2", 500)
    }

    #[test]
    fn test_no_records() {
        let mut engine = StatisticsEngine::load(table(), EngineConfig::default()).unwrap();
        engine.accumulate(RecordStream::default()).unwrap();
        let report = engine.summarize();

        assert_eq!(report.len(), 3);
        for id in ["chr1", "chr2"] {
            let row = report.get(id).unwrap();
            assert_eq!(row.num_reads, 0);
            assert!((row.mean_coverage.unwrap() - 0.0).abs() < 1e-9);
        }
        assert_eq!(report.get("*").unwrap().num_reads, 0);
        assert!(report.reads("*").unwrap().is_empty());
    }

    #[test]
    fn test_single_read_depth() {
        let provider = ReferenceTable::new().with_reference("chr1", 10);
        let mut engine = StatisticsEngine::load(provider, EngineConfig::default()).unwrap();
        engine.accumulate_record(read("chr1", "r1", 2, 5)).unwrap();

        let depth = engine.contigs[0].coverage.as_ref().unwrap().depth().to_vec();
        assert_eq!(depth, vec![0, 0, 1, 1, 1, 1, 1, 0, 0, 0]);

        let report = engine.summarize();
        let row = report.get("chr1").unwrap();
        assert!((row.mean_coverage.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(row.covered_bases, Some(5));
        assert_eq!(row.num_reads, 1);
        assert_eq!(row.total_bases, 5);
    }

    #[test]
    fn test_unknown_reference_does_not_mutate() {
        let mut engine = StatisticsEngine::load(table(), EngineConfig::default()).unwrap();
        let result = engine.accumulate_record(read("chrX", "r1", 0, 10));

        assert!(matches!(result, Err(StatsError::UnknownReference(id)) if id == "chrX"));
        assert_eq!(engine.diagnostics().records, 0);
        for contig in &engine.contigs {
            assert!(contig.reads.is_empty());
            if let Some(coverage) = &contig.coverage {
                assert_eq!(coverage.covered_bases(), 0);
            }
        }
    }

    #[test]
    fn test_unknown_reference_skipped_by_default() {
        let records = RecordStream::new(vec![
            read("chr1", "r1", 0, 10),
            read("chrX", "r2", 0, 10),
            read("chrX", "r3", 0, 10),
            read("chrY", "r4", 0, 10),
        ]);
        let mut engine = StatisticsEngine::load(table(), EngineConfig::default()).unwrap();
        engine.accumulate(records).unwrap();

        let diag = engine.diagnostics();
        assert_eq!(diag.records, 1);
        assert_eq!(diag.unknown_references, 3);
        assert_eq!(
            diag.unknown_reference_ids.iter().collect::<Vec<_>>(),
            vec!["chrX", "chrY"]
        );
    }

    #[test]
    fn test_unknown_reference_abort_policy() {
        let config = EngineConfig {
            unknown_reference_policy: UnknownReferencePolicy::Abort,
            ..EngineConfig::default()
        };
        let records = RecordStream::new(vec![read("chr1", "r1", 0, 10), read("chrX", "r2", 0, 10)]);
        let mut engine = StatisticsEngine::load(table(), config).unwrap();

        let result = engine.accumulate(records);
        assert!(matches!(result, Err(StatsError::UnknownReference(_))));
    }

    #[test]
    fn test_negative_length_fails_load() {
        let provider = ReferenceTable::new().with_reference("chr1", -5);
        let result = StatisticsEngine::load(provider, EngineConfig::default());
        assert!(matches!(
            result,
            Err(StatsError::Index(CatalogError::InvalidIndex { .. }))
        ));
    }

    #[test]
    fn test_oversized_reference_fails_load() {
        let provider = ReferenceTable::new().with_reference("chr1", i64::MAX);
        let result = compute_statistics(provider, RecordStream::default(), EngineConfig::default());
        assert!(matches!(
            result,
            Err(StatsError::Index(CatalogError::ReferenceTooLong { name, .. })) if name == "chr1"
        ));
    }

    #[test]
    fn test_placed_read_keeps_mean_quality_only() {
        let placed = PlacedRead::from(read("chr1", "r1", 3, 4).with_qualities(vec![10, 20, 30, 40]));
        assert_eq!(placed.read_id, "r1");
        assert_eq!(placed.start, 3);
        assert_eq!(placed.aligned_len, 4);
        assert_eq!(placed.seq_len, 4);
        assert!((placed.mean_quality.unwrap() - 25.0).abs() < 1e-9);

        let bare = PlacedRead::from(AlignedRead::new("*", "u1").with_sequence_length(9));
        assert_eq!(bare.mean_quality, None);
    }

    #[test]
    fn test_parallel_quality_free_reads() {
        let records = || {
            RecordStream::new(vec![
                read("chr1", "r1", 0, 10),
                AlignedRead::new("chr1", "r2")
                    .with_span(0, 10)
                    .with_sequence_length(10),
                AlignedRead::new("*", "u1").with_sequence_length(7),
            ])
        };
        let config = EngineConfig {
            threads: 2,
            ..EngineConfig::default()
        };
        let parallel = compute_statistics(table(), records(), config).unwrap();
        let sequential = compute_statistics(table(), records(), EngineConfig::default()).unwrap();

        assert_eq!(parallel.references, sequential.references);
        assert!(!parallel.read("chr1", "r2").unwrap().has_quality);
        assert!((parallel.get("chr1").unwrap().mean_qual.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_tracking_disabled() {
        let config = EngineConfig {
            track_coverage: false,
            ..EngineConfig::default()
        };
        let mut engine = StatisticsEngine::load(table(), config).unwrap();
        assert!(engine.contigs.iter().all(|c| c.coverage.is_none()));

        engine.accumulate(RecordStream::new(vec![read("chr1", "r1", 990, 20)])).unwrap();
        assert_eq!(engine.diagnostics().clamped_spans, 0);

        let report = engine.summarize();
        let row = report.get("chr1").unwrap();
        assert_eq!(row.num_reads, 1);
        assert_eq!(row.total_bases, 20);
        assert_eq!(row.mean_coverage, None);
        assert_eq!(row.covered_bases, None);
        assert_eq!(row.n50, Some(20));
    }

    #[test]
    fn test_unmapped_reads_skip_coverage() {
        let records = RecordStream::new(vec![
            AlignedRead::new("*", "u1")
                .with_span(-1, 0)
                .with_sequence_length(120),
            AlignedRead::new("*", "u2").with_sequence_length(80),
        ]);
        let report = compute_statistics(table(), records, EngineConfig::default()).unwrap();

        let row = report.get("*").unwrap();
        assert_eq!(row.num_reads, 2);
        assert_eq!(row.total_bases, 200);
        assert!(row.mean_coverage.is_none());
        assert!(row.covered_bases.is_none());
        assert_eq!(row.n50, Some(120));
        assert!(!report.read("*", "u1").unwrap().has_quality);
    }

    #[test]
    fn test_clamped_span_counted() {
        let provider = ReferenceTable::new().with_reference("chr1", 10);
        let records = RecordStream::new(vec![read("chr1", "r1", 8, 5), read("chr1", "r2", 0, 5)]);
        let report = compute_statistics(provider, records, EngineConfig::default()).unwrap();

        assert_eq!(report.diagnostics.clamped_spans, 1);
        assert_eq!(report.get("chr1").unwrap().covered_bases, Some(7));
    }

    #[test]
    fn test_depth_bounds_from_config() {
        let config = EngineConfig {
            min_depth: 2,
            max_depth: Some(2),
            ..EngineConfig::default()
        };
        let provider = ReferenceTable::new().with_reference("chr1", 10);
        let records = RecordStream::new(vec![
            read("chr1", "r1", 0, 6),
            read("chr1", "r2", 0, 4),
            read("chr1", "r3", 0, 2),
        ]);
        let report = compute_statistics(provider, records, config).unwrap();

        // depth: [3, 3, 2, 2, 1, 1, 0, 0, 0, 0]
        assert_eq!(report.get("chr1").unwrap().covered_bases, Some(2));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<AlignedRead> = (0..200)
            .map(|i: i64| {
                let ref_id = match i % 3 {
                    0 => "chr1",
                    1 => "chr2",
                    _ => "*",
                };
                read(ref_id, &format!("r{i}"), (i * 7) % 600, 50 + i % 40)
            })
            .collect();

        let sequential = compute_statistics(
            table(),
            RecordStream::new(records.clone()),
            EngineConfig::default(),
        )
        .unwrap();

        let config = EngineConfig {
            threads: 4,
            ..EngineConfig::default()
        };
        let parallel = compute_statistics(table(), RecordStream::new(records), config).unwrap();

        assert_eq!(sequential.references, parallel.references);
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
        for row in &sequential.references {
            assert_eq!(
                sequential.reads(&row.reference),
                parallel.reads(&row.reference)
            );
        }
    }

    #[test]
    fn test_fresh_state_per_run() {
        let records = || RecordStream::new(vec![read("chr1", "r1", 0, 10)]);
        let first = compute_statistics(table(), records(), EngineConfig::default()).unwrap();
        let second = compute_statistics(table(), records(), EngineConfig::default()).unwrap();

        assert_eq!(first.get("chr1").unwrap().num_reads, 1);
        assert_eq!(second.get("chr1").unwrap().num_reads, 1);
    }
}
