use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::types::{is_unmapped, UNMAPPED_REFERENCE};
use crate::utils::validation::{
    check_reference_length, check_reference_limit, MAX_REFERENCE_LENGTH,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid index: reference '{name}' has negative length {length}")]
    InvalidIndex { name: String, length: i64 },

    #[error(
        "Invalid index: reference '{name}' has length {length}, above the maximum of {max}",
        max = MAX_REFERENCE_LENGTH
    )]
    ReferenceTooLong { name: String, length: u64 },

    #[error("Invalid index: reference '{0}' is listed more than once")]
    DuplicateReference(String),

    #[error("Too many references: {0} exceeds maximum allowed (1000000)")]
    TooManyReferences(usize),
}

/// A single reference sequence known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    /// Contig name, or `*` for the unmapped bucket
    pub id: String,

    /// Reference length in bases (0 for the unmapped bucket)
    pub length: u64,
}

impl ReferenceEntry {
    pub fn new(id: impl Into<String>, length: u64) -> Self {
        Self {
            id: id.into(),
            length,
        }
    }

    /// Returns true if this is the unmapped bucket
    pub fn is_unmapped(&self) -> bool {
        is_unmapped(&self.id)
    }

    /// Whether a coverage profile is kept for this reference
    pub fn has_coverage(&self) -> bool {
        !self.is_unmapped() && self.length > 0
    }
}

/// The validated reference table for one engine run
///
/// Entries keep the order they were loaded in. The unmapped bucket is always
/// present: if the index does not list `*`, it is appended with length 0.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    /// All references, in load order
    pub references: Vec<ReferenceEntry>,

    /// Index: reference id -> index in references vec
    id_to_index: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// Build a catalog from `(reference id, length)` pairs
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidIndex` for a negative length,
    /// `CatalogError::ReferenceTooLong` for a length above `MAX_REFERENCE_LENGTH`,
    /// `CatalogError::DuplicateReference` if an id repeats, or
    /// `CatalogError::TooManyReferences` if the table is too large.
    pub fn initialize<I, S>(table: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut catalog = Self {
            references: Vec::new(),
            id_to_index: HashMap::new(),
        };

        for (name, length) in table {
            let name = name.into();
            let length = u64::try_from(length)
                .map_err(|_| CatalogError::InvalidIndex {
                    name: name.clone(),
                    length,
                })?;

            // Check reference length for DOS protection
            if check_reference_length(length).is_some() {
                return Err(CatalogError::ReferenceTooLong { name, length });
            }

            // Check reference limit for DOS protection
            if check_reference_limit(catalog.references.len()).is_some() {
                return Err(CatalogError::TooManyReferences(catalog.references.len()));
            }

            catalog.add_reference(ReferenceEntry::new(name, length))?;
        }

        if !catalog.id_to_index.contains_key(UNMAPPED_REFERENCE) {
            catalog.add_reference(ReferenceEntry::new(UNMAPPED_REFERENCE, 0))?;
        }

        Ok(catalog)
    }

    fn add_reference(&mut self, entry: ReferenceEntry) -> Result<(), CatalogError> {
        if self.id_to_index.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateReference(entry.id));
        }
        self.id_to_index
            .insert(entry.id.clone(), self.references.len());
        self.references.push(entry);
        Ok(())
    }

    /// Read-only view of reference lengths keyed by id
    pub fn lengths(&self) -> HashMap<&str, u64> {
        self.references
            .iter()
            .map(|r| (r.id.as_str(), r.length))
            .collect()
    }

    /// Position of a reference in load order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Get a reference by id
    pub fn get(&self, id: &str) -> Option<&ReferenceEntry> {
        self.index_of(id).map(|idx| &self.references[idx])
    }

    /// Number of references, including the unmapped bucket
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check if the catalog holds no references
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
