//! Parser for FASTA index (.fai) files using noodles.
//!
//! FAI format provides name and length for each reference, which is all the
//! statistics engine needs when the alignment header is not trusted.
//! Format: `name\tlength\toffset\tline_bases\tline_width`

use std::io::BufReader;
use std::path::Path;

use crate::core::provider::IndexProvider;
use crate::parsing::bam::ParseError;
use crate::utils::validation::check_reference_limit;

/// Reference lengths from a FASTA index
#[derive(Debug, Clone)]
pub struct FaiIndexProvider {
    lengths: Vec<(String, i64)>,
}

impl FaiIndexProvider {
    /// Read a FASTA index (.fai) file using noodles
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
    /// parsing fails, `ParseError::InvalidFormat` if no references are found, or
    /// `ParseError::TooManyReferences` if the limit is exceeded.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        use noodles::fasta;

        let reader = std::fs::File::open(path).map(BufReader::new)?;

        let index = fasta::fai::io::Reader::new(reader)
            .read_index()
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FAI file: {e}")))?;

        let mut lengths = Vec::new();
        for record in index.as_ref() {
            // Check reference limit for DOS protection
            if check_reference_limit(lengths.len()).is_some() {
                return Err(ParseError::TooManyReferences(lengths.len()));
            }

            let name = String::from_utf8_lossy(record.name()).to_string();
            let length = i64::try_from(record.length()).map_err(|_| {
                ParseError::InvalidFormat(format!("Length of reference '{name}' out of range"))
            })?;
            lengths.push((name, length));
        }

        Self::non_empty(lengths)
    }

    /// Parse FAI from text (fallback for raw text input)
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if the text has invalid format or no
    /// references, or `ParseError::TooManyReferences` if the limit is exceeded.
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let mut lengths = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                continue;
            }

            // Check reference limit for DOS protection
            if check_reference_limit(lengths.len()).is_some() {
                return Err(ParseError::TooManyReferences(lengths.len()));
            }

            let name = fields[0].to_string();
            let length: i64 = fields[1].parse().map_err(|_| {
                ParseError::InvalidFormat(format!(
                    "Invalid length for reference '{}': {}",
                    name, fields[1]
                ))
            })?;

            lengths.push((name, length));
        }

        Self::non_empty(lengths)
    }

    fn non_empty(lengths: Vec<(String, i64)>) -> Result<Self, ParseError> {
        if lengths.is_empty() {
            return Err(ParseError::InvalidFormat(
                "No references found in FAI file".to_string(),
            ));
        }
        Ok(Self { lengths })
    }
}

impl IndexProvider for FaiIndexProvider {
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError> {
        Ok(self.lengths.clone())
    }
}
