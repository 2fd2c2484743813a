//! Fixture BAM files for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, Sequence};
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::ReferenceSequence;
use noodles::sam::header::record::value::Map;

/// One record to write: `None` reference means unplaced
pub struct FixtureRead {
    pub name: &'static str,
    pub reference: Option<usize>,
    /// 1-based alignment start
    pub start: usize,
    pub cigar: Vec<(Kind, usize)>,
    pub sequence_len: usize,
    /// Empty for a record without qualities
    pub qualities: Vec<u8>,
}

impl FixtureRead {
    /// A mapped read aligned with a single match operation
    pub fn mapped(name: &'static str, reference: usize, start: usize, len: usize, q: u8) -> Self {
        Self {
            name,
            reference: Some(reference),
            start,
            cigar: vec![(Kind::Match, len)],
            sequence_len: len,
            qualities: vec![q; len],
        }
    }

    /// An unplaced read with no qualities
    pub fn unmapped(name: &'static str, len: usize) -> Self {
        Self {
            name,
            reference: None,
            start: 0,
            cigar: Vec::new(),
            sequence_len: len,
            qualities: Vec::new(),
        }
    }

    fn to_record(&self) -> RecordBuf {
        let mut builder = RecordBuf::builder()
            .set_name(self.name)
            .set_sequence(Sequence::from(vec![b'A'; self.sequence_len]))
            .set_quality_scores(QualityScores::from(self.qualities.clone()));

        if let Some(reference) = self.reference {
            let cigar: Cigar = self
                .cigar
                .iter()
                .map(|&(kind, len)| Op::new(kind, len))
                .collect();

            builder = builder
                .set_flags(Flags::empty())
                .set_reference_sequence_id(reference)
                .set_alignment_start(Position::try_from(self.start).unwrap())
                .set_cigar(cigar);
        }

        builder.build()
    }
}

/// Header with the given `(name, length)` reference dictionary
pub fn header(references: &[(&str, usize)]) -> sam::Header {
    references
        .iter()
        .fold(sam::Header::builder(), |builder, &(name, length)| {
            builder.add_reference_sequence(
                name,
                Map::<ReferenceSequence>::new(NonZeroUsize::try_from(length).unwrap()),
            )
        })
        .build()
}

/// Write a BAM file with the given references and records
pub fn write_bam(path: &Path, references: &[(&str, usize)], reads: &[FixtureRead]) {
    let header = header(references);
    let mut writer = bam::io::Writer::new(File::create(path).unwrap());
    writer.write_header(&header).unwrap();

    for read in reads {
        writer
            .write_alignment_record(&header, &read.to_record())
            .unwrap();
    }

    writer.try_finish().unwrap();
}

pub const REFERENCES: &[(&str, usize)] = &[("chr1", 100), ("chr2", 50), ("chr3", 20)];

/// Two reads on chr1, one running past the end of chr2, one unplaced read
pub fn sample_reads() -> Vec<FixtureRead> {
    vec![
        FixtureRead::mapped("r1", 0, 1, 10, 30),
        FixtureRead::mapped("r2", 0, 6, 10, 20),
        FixtureRead::mapped("r3", 1, 45, 10, 40),
        FixtureRead::unmapped("r4", 8),
    ]
}

/// Write the sample BAM into `dir` and return its path
pub fn sample_bam(dir: &Path) -> PathBuf {
    let path = dir.join("sample.bam");
    write_bam(&path, REFERENCES, &sample_reads());
    path
}
