use serde::Serialize;
use thiserror::Error;

use crate::core::types::mean_quality;
use crate::utils::validation::count_to_f64;

/// A distributional statistic was requested over a reference with no reads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No reads recorded: cannot compute {0}")]
pub struct EmptyAggregateQuery(pub &'static str);

/// Length and mean quality of one recorded read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadSummary {
    pub read_id: String,

    /// Stored sequence length
    pub length: u64,

    /// Mean phred quality; 0.0 when the read carried no qualities
    pub mean_quality: f64,

    /// False when `mean_quality` is the 0.0 stand-in for a quality-free read
    pub has_quality: bool,
}

/// Per-reference collection of read lengths and mean qualities
#[derive(Debug, Clone, Default)]
pub struct ReadAggregator {
    reads: Vec<ReadSummary>,
    total_bases: u64,
}

impl ReadAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one read's length and the mean of its quality values
    pub fn record(&mut self, read_id: impl Into<String>, length: u64, quality_values: &[u8]) {
        self.record_mean(read_id, length, mean_quality(quality_values));
    }

    /// Store one read whose mean quality is already known; `None` for a
    /// read without qualities
    pub fn record_mean(&mut self, read_id: impl Into<String>, length: u64, quality: Option<f64>) {
        self.reads.push(ReadSummary {
            read_id: read_id.into(),
            length,
            mean_quality: quality.unwrap_or(0.0),
            has_quality: quality.is_some(),
        });
        self.total_bases = self.total_bases.saturating_add(length);
    }

    /// Number of recorded reads
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Sum of recorded read lengths
    pub fn total_bases(&self) -> u64 {
        self.total_bases
    }

    /// Recorded reads in the order they were seen
    pub fn reads(&self) -> &[ReadSummary] {
        &self.reads
    }

    /// Consume the aggregator, returning its reads
    pub fn into_reads(self) -> Vec<ReadSummary> {
        self.reads
    }

    /// N50 of the recorded lengths
    ///
    /// Lengths are taken longest first; the result is the first length at which
    /// the running sum (including that length) reaches `floor(total_bases / 2)`.
    /// If the target is never reached the shortest length is returned.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAggregateQuery` if no reads were recorded.
    pub fn n50(&self, total_bases: u64) -> Result<u64, EmptyAggregateQuery> {
        let mut lengths = self.lengths();
        if lengths.is_empty() {
            return Err(EmptyAggregateQuery("n50"));
        }
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        let target = total_bases / 2;
        let mut running = 0_u64;
        for &length in &lengths {
            running = running.saturating_add(length);
            if running >= target {
                return Ok(length);
            }
        }
        Ok(lengths[lengths.len() - 1])
    }

    /// Mean read length
    ///
    /// # Errors
    ///
    /// Returns `EmptyAggregateQuery` if no reads were recorded.
    pub fn mean_length(&self) -> Result<f64, EmptyAggregateQuery> {
        if self.reads.is_empty() {
            return Err(EmptyAggregateQuery("mean length"));
        }
        Ok(count_to_f64(self.total_bases) / count_to_f64(self.reads.len() as u64))
    }

    /// Median read length
    ///
    /// # Errors
    ///
    /// Returns `EmptyAggregateQuery` if no reads were recorded.
    pub fn median_length(&self) -> Result<f64, EmptyAggregateQuery> {
        let values: Vec<f64> = self.lengths().into_iter().map(count_to_f64).collect();
        median(values).ok_or(EmptyAggregateQuery("median length"))
    }

    /// Mean of the per-read mean qualities
    ///
    /// # Errors
    ///
    /// Returns `EmptyAggregateQuery` if no reads were recorded.
    pub fn mean_quality(&self) -> Result<f64, EmptyAggregateQuery> {
        if self.reads.is_empty() {
            return Err(EmptyAggregateQuery("mean quality"));
        }
        let sum: f64 = self.reads.iter().map(|r| r.mean_quality).sum();
        Ok(sum / count_to_f64(self.reads.len() as u64))
    }

    /// Median of the per-read mean qualities
    ///
    /// # Errors
    ///
    /// Returns `EmptyAggregateQuery` if no reads were recorded.
    pub fn median_quality(&self) -> Result<f64, EmptyAggregateQuery> {
        let values: Vec<f64> = self.reads.iter().map(|r| r.mean_quality).collect();
        median(values).ok_or(EmptyAggregateQuery("median quality"))
    }

    fn lengths(&self) -> Vec<u64> {
        self.reads.iter().map(|r| r.length).collect()
    }
}

/// Median of the values; the mean of the two middle values for an even count
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator_with_lengths(lengths: &[u64]) -> ReadAggregator {
        let mut agg = ReadAggregator::new();
        for (i, &len) in lengths.iter().enumerate() {
            agg.record(format!("read{i}"), len, &[]);
        }
        agg
    }

    #[test]
    fn test_n50_example() {
        let agg = aggregator_with_lengths(&[100, 90, 80, 50, 20]);
        assert_eq!(agg.total_bases(), 340);
        assert_eq!(agg.n50(340), Ok(90));
    }

    #[test]
    fn test_n50_order_independent() {
        let a = aggregator_with_lengths(&[100, 90, 80, 50, 20]);
        let b = aggregator_with_lengths(&[20, 80, 100, 50, 90]);
        let c = aggregator_with_lengths(&[50, 20, 90, 100, 80]);

        assert_eq!(a.n50(340), b.n50(340));
        assert_eq!(b.n50(340), c.n50(340));
    }

    #[test]
    fn test_n50_single_read() {
        let agg = aggregator_with_lengths(&[1500]);
        assert_eq!(agg.n50(1500), Ok(1500));
    }

    #[test]
    fn test_n50_all_equal() {
        let agg = aggregator_with_lengths(&[150, 150, 150, 150]);
        assert_eq!(agg.n50(600), Ok(150));
    }

    #[test]
    fn test_n50_zero_total() {
        // Zero-length reads: target 0 is met by the first (longest) length
        let agg = aggregator_with_lengths(&[0, 0]);
        assert_eq!(agg.n50(0), Ok(0));
    }

    #[test]
    fn test_n50_empty() {
        let agg = ReadAggregator::new();
        assert_eq!(agg.n50(0), Err(EmptyAggregateQuery("n50")));
    }

    #[test]
    fn test_length_statistics() {
        let agg = aggregator_with_lengths(&[100, 90, 80, 50]);

        assert!((agg.mean_length().unwrap() - 80.0).abs() < 1e-9);
        assert!((agg.median_length().unwrap() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_odd_count() {
        let agg = aggregator_with_lengths(&[30, 10, 20]);
        assert!((agg.median_length().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_statistics() {
        let mut agg = ReadAggregator::new();
        agg.record("r1", 4, &[10, 10, 10, 10]);
        agg.record("r2", 2, &[20, 40]);
        agg.record("r3", 3, &[40, 40, 40]);

        // Per-read means: 10, 30, 40
        assert!((agg.mean_quality().unwrap() - 80.0 / 3.0).abs() < 1e-9);
        assert!((agg.median_quality().unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_free_read_distinguished() {
        let mut agg = ReadAggregator::new();
        agg.record("no_qual", 5, &[]);
        agg.record("zero_qual", 3, &[0, 0, 0]);

        let reads = agg.reads();
        assert!((reads[0].mean_quality - 0.0).abs() < 1e-9);
        assert!(!reads[0].has_quality);
        assert!((reads[1].mean_quality - 0.0).abs() < 1e-9);
        assert!(reads[1].has_quality);
    }

    #[test]
    fn test_empty_aggregate_queries() {
        let agg = ReadAggregator::new();
        assert!(agg.mean_length().is_err());
        assert!(agg.median_length().is_err());
        assert!(agg.mean_quality().is_err());
        assert!(agg.median_quality().is_err());
    }
}
