//! Parser for `samtools idxstats` output.
//!
//! Format: `name\tlength\tmapped\tunmapped`, one reference per line, with a
//! final `*` row counting reads that have no reference.

use std::path::Path;

use crate::core::provider::IndexProvider;
use crate::parsing::bam::ParseError;
use crate::utils::validation::check_reference_limit;

/// One row of idxstats output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxstatsRow {
    pub name: String,
    pub length: i64,
    pub mapped: u64,
    pub unmapped: u64,
}

impl IdxstatsRow {
    /// Records the index attributes to this reference
    pub fn records(&self) -> u64 {
        self.mapped.saturating_add(self.unmapped)
    }
}

/// Parse an idxstats file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_idxstats_file(path: &Path) -> Result<Vec<IdxstatsRow>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_idxstats_text(&content)
}

/// Parse idxstats text
///
/// Lines with fewer than four fields are skipped. Lengths are parsed as signed
/// integers so that a negative length is reported by the catalog rather than here.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a numeric field does not parse or no
/// rows are found, or `ParseError::TooManyReferences` if the limit is exceeded.
pub fn parse_idxstats_text(text: &str) -> Result<Vec<IdxstatsRow>, ParseError> {
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 4 {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        let number = |column: &str, value: &str| {
            ParseError::InvalidFormat(format!(
                "Invalid {column} on line {line_num}: '{value}'"
            ))
        };

        let length: i64 = fields[1]
            .trim()
            .parse()
            .map_err(|_| number("length", fields[1]))?;
        let mapped: u64 = fields[2]
            .trim()
            .parse()
            .map_err(|_| number("mapped count", fields[2]))?;
        let unmapped: u64 = fields[3]
            .trim()
            .parse()
            .map_err(|_| number("unmapped count", fields[3]))?;

        // Check reference limit for DOS protection
        if check_reference_limit(rows.len()).is_some() {
            return Err(ParseError::TooManyReferences(rows.len()));
        }

        rows.push(IdxstatsRow {
            name: fields[0].to_string(),
            length,
            mapped,
            unmapped,
        });
    }

    if rows.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No references found in idxstats output".to_string(),
        ));
    }

    Ok(rows)
}

/// Reference lengths from idxstats output
#[derive(Debug, Clone)]
pub struct IdxstatsProvider {
    rows: Vec<IdxstatsRow>,
}

impl IdxstatsProvider {
    /// # Errors
    ///
    /// See [`parse_idxstats_file`].
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        Ok(Self {
            rows: parse_idxstats_file(path)?,
        })
    }

    /// # Errors
    ///
    /// See [`parse_idxstats_text`].
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            rows: parse_idxstats_text(text)?,
        })
    }

    pub fn rows(&self) -> &[IdxstatsRow] {
        &self.rows
    }
}

impl IndexProvider for IdxstatsProvider {
    fn reference_lengths(&mut self) -> Result<Vec<(String, i64)>, ParseError> {
        Ok(self
            .rows
            .iter()
            .map(|r| (r.name.clone(), r.length))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idxstats_text() {
        let text = "chr1\t248956422\t1200\t3\nchr2\t242193529\t800\t0\n*\t0\t0\t57\n";

        let rows = parse_idxstats_text(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "chr1");
        assert_eq!(rows[0].length, 248_956_422);
        assert_eq!(rows[0].records(), 1203);
        assert_eq!(rows[2].name, "*");
        assert_eq!(rows[2].unmapped, 57);
    }

    #[test]
    fn test_records_saturate() {
        let text = format!("chr1\t100\t{}\t{}\n", u64::MAX, u64::MAX);
        let rows = parse_idxstats_text(&text).unwrap();
        assert_eq!(rows[0].records(), u64::MAX);
    }

    #[test]
    fn test_short_rows_skipped() {
        let text = "chr1\t1000\t5\t0\n\nwarning line\nchr2\t500\n";
        let rows = parse_idxstats_text(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "chr1");
    }

    #[test]
    fn test_negative_length_passes_through() {
        let mut provider = IdxstatsProvider::from_text("chr1\t-10\t0\t0\n").unwrap();
        assert_eq!(
            provider.reference_lengths().unwrap(),
            vec![("chr1".to_string(), -10)]
        );
    }

    #[test]
    fn test_invalid_length() {
        let result = parse_idxstats_text("chr1\tabc\t0\t0\n");
        assert!(matches!(result, Err(ParseError::InvalidFormat(msg)) if msg.contains("line 1")));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_idxstats_text("").is_err());
    }
}
