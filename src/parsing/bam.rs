use std::io::BufRead;
use std::path::Path;

use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use thiserror::Error;
use tracing::debug;

use crate::core::provider::{AlignmentReader, IndexProvider};
use crate::core::types::{AlignedRead, UNMAPPED_REFERENCE};
use crate::utils::validation::check_reference_limit;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many references: {0} exceeds maximum allowed (1000000)")]
    TooManyReferences(usize),
}

/// Quality byte BAM uses when a record stores no qualities
const MISSING_QUALITY: u8 = 0xFF;

/// Open a BAM file for a single pass over its records
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` for non-BAM extensions,
/// `ParseError::Io` if the file cannot be opened, or `ParseError::Noodles`
/// if the header cannot be decoded.
pub fn open(path: &Path) -> Result<BamAlignmentReader<impl BufRead>, ParseError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("bam") | None => {}
        Some(ext) => return Err(ParseError::UnsupportedFormat(ext.to_string())),
    }

    let reader = std::fs::File::open(path).map(bam::io::Reader::new)?;
    BamAlignmentReader::new(reader)
}

/// Reference lengths from the `@SQ` dictionary of a SAM header
#[derive(Debug, Clone)]
pub struct BamIndexProvider {
    header: sam::Header,
}

impl BamIndexProvider {
    pub fn new(header: sam::Header) -> Self {
        Self { header }
    }
}

impl IndexProvider for BamIndexProvider {
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError> {
        header_to_lengths(&self.header)
    }
}

/// Convert the header's reference dictionary to `(name, length)` pairs
fn header_to_lengths(header: &sam::Header) -> Result<Vec<(String, i64)>, ParseError> {
    let mut lengths = Vec::new();

    for (name, map) in header.reference_sequences() {
        // Check reference limit for DOS protection
        if check_reference_limit(lengths.len()).is_some() {
            return Err(ParseError::TooManyReferences(lengths.len()));
        }

        let length = i64::try_from(map.length().get()).map_err(|_| {
            ParseError::InvalidFormat(format!("Length of reference '{name}' out of range"))
        })?;
        lengths.push((name.to_string(), length));
    }

    Ok(lengths)
}

/// Decodes BAM records into [`AlignedRead`]s, one at a time
pub struct BamAlignmentReader<R> {
    reader: bam::io::Reader<R>,
    header: sam::Header,
    record: bam::Record,
}

impl<R: BufRead> BamAlignmentReader<R> {
    /// Wrap a BAM reader positioned at the start of the file
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Noodles` if the header cannot be decoded.
    pub fn new(mut reader: bam::io::Reader<R>) -> Result<Self, ParseError> {
        let header = reader
            .read_header()
            .map_err(|e| ParseError::Noodles(e.to_string()))?;

        debug!(
            references = header.reference_sequences().len(),
            "Read BAM header"
        );

        Ok(Self {
            reader,
            header,
            record: bam::Record::default(),
        })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// An index provider over this file's reference dictionary
    pub fn index_provider(&self) -> BamIndexProvider {
        BamIndexProvider::new(self.header.clone())
    }
}

impl<R: BufRead> AlignmentReader for BamAlignmentReader<R> {
    fn next_record(&mut self) -> Option<Result<AlignedRead, ParseError>> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(record_to_aligned_read(&self.header, &self.record)),
            Err(e) => Some(Err(ParseError::Noodles(e.to_string()))),
        }
    }
}

/// Convert one BAM record to the engine's record shape
fn record_to_aligned_read(
    header: &sam::Header,
    record: &bam::Record,
) -> Result<AlignedRead, ParseError> {
    let ref_id = match record.reference_sequence_id().transpose()? {
        Some(idx) => header
            .reference_sequences()
            .get_index(idx)
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Record refers to reference sequence {idx}, which is not in the header"
                ))
            })?,
        None => UNMAPPED_REFERENCE.to_string(),
    };

    let read_id = record
        .name()
        .map(|n| n.to_string())
        .unwrap_or_default();

    // 0-based start; -1 when the record has no position
    let start = match record.alignment_start().transpose()? {
        Some(position) => i64::try_from(usize::from(position)).unwrap_or(i64::MAX) - 1,
        None => -1,
    };

    let mut ops = Vec::new();
    for op in record.cigar().iter() {
        let op = op?;
        ops.push((op.kind(), op.len()));
    }

    let quality_scores = record.quality_scores();

    Ok(AlignedRead {
        ref_id,
        read_id,
        start,
        aligned_len: query_alignment_length(ops),
        seq_len: record.sequence().len() as u64,
        quality_values: stored_qualities(quality_scores.as_ref()),
    })
}

/// Number of read bases between the soft clips
///
/// This is the length added to the coverage profile. It counts inserted bases
/// and ignores deletions, so it can differ from the reference span.
fn query_alignment_length<I>(ops: I) -> i64
where
    I: IntoIterator<Item = (Kind, usize)>,
{
    let total: usize = ops
        .into_iter()
        .filter(|(kind, _)| {
            matches!(
                kind,
                Kind::Match | Kind::Insertion | Kind::SequenceMatch | Kind::SequenceMismatch
            )
        })
        .map(|(_, len)| len)
        .sum();
    i64::try_from(total).unwrap_or(i64::MAX)
}

/// Quality values as stored, or empty when the record marks them missing
fn stored_qualities(raw: &[u8]) -> Vec<u8> {
    if raw.iter().all(|&q| q == MISSING_QUALITY) {
        Vec::new()
    } else {
        raw.to_vec()
    }
}
