//! Cross-vendor symbol name tables
//!
//! A [`NameMappingTable`] maps a cuSOLVER symbol to one or more hipSOLVER
//! symbols providing the same routine. Lookups scan entries in order and the
//! first matching entry wins; within an entry the first equivalent is used.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// One `from -> [to, ...]` association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Symbol in the source vendor's naming
    pub from: String,
    /// Equivalent symbols in the target vendor's naming, preferred first
    pub to: Vec<String>,
}

/// Ordered, read-only table of cross-vendor symbol equivalences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMappingTable {
    entries: Vec<MappingEntry>,
}

/// cuSOLVER dense API to hipSOLVER, as shipped with ROCm 5.x/6.x
const CUSOLVER_TO_HIPSOLVER: &[(&str, &[&str])] = &[
    // gesvd
    ("cusolverDnSgesvd_bufferSize", &["hipsolverDnSgesvd_bufferSize"]),
    ("cusolverDnDgesvd_bufferSize", &["hipsolverDnDgesvd_bufferSize"]),
    ("cusolverDnCgesvd_bufferSize", &["hipsolverDnCgesvd_bufferSize"]),
    ("cusolverDnZgesvd_bufferSize", &["hipsolverDnZgesvd_bufferSize"]),
    ("cusolverDnSgesvd", &["hipsolverDnSgesvd"]),
    ("cusolverDnDgesvd", &["hipsolverDnDgesvd"]),
    ("cusolverDnCgesvd", &["hipsolverDnCgesvd"]),
    ("cusolverDnZgesvd", &["hipsolverDnZgesvd"]),
    // geqrf
    ("cusolverDnSgeqrf_bufferSize", &["hipsolverDnSgeqrf_bufferSize", "hipsolverSgeqrf_bufferSize"]),
    ("cusolverDnDgeqrf_bufferSize", &["hipsolverDnDgeqrf_bufferSize", "hipsolverDgeqrf_bufferSize"]),
    ("cusolverDnCgeqrf_bufferSize", &["hipsolverDnCgeqrf_bufferSize", "hipsolverCgeqrf_bufferSize"]),
    ("cusolverDnZgeqrf_bufferSize", &["hipsolverDnZgeqrf_bufferSize", "hipsolverZgeqrf_bufferSize"]),
    ("cusolverDnSgeqrf", &["hipsolverDnSgeqrf", "hipsolverSgeqrf"]),
    ("cusolverDnDgeqrf", &["hipsolverDnDgeqrf", "hipsolverDgeqrf"]),
    ("cusolverDnCgeqrf", &["hipsolverDnCgeqrf", "hipsolverCgeqrf"]),
    ("cusolverDnZgeqrf", &["hipsolverDnZgeqrf", "hipsolverZgeqrf"]),
    // orgqr / ungqr
    ("cusolverDnSorgqr_bufferSize", &["hipsolverDnSorgqr_bufferSize"]),
    ("cusolverDnDorgqr_bufferSize", &["hipsolverDnDorgqr_bufferSize"]),
    ("cusolverDnCungqr_bufferSize", &["hipsolverDnCungqr_bufferSize"]),
    ("cusolverDnZungqr_bufferSize", &["hipsolverDnZungqr_bufferSize"]),
    ("cusolverDnSorgqr", &["hipsolverDnSorgqr"]),
    ("cusolverDnDorgqr", &["hipsolverDnDorgqr"]),
    ("cusolverDnCungqr", &["hipsolverDnCungqr"]),
    ("cusolverDnZungqr", &["hipsolverDnZungqr"]),
];

static HIP_TABLE: OnceLock<Arc<NameMappingTable>> = OnceLock::new();

impl NameMappingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(from, [to, ...])` pairs, keeping their order
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let entries = pairs
            .into_iter()
            .map(|(from, to)| MappingEntry {
                from: from.to_string(),
                to: to.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    /// Parse a table from JSON
    ///
    /// The expected shape is an array of `{ "from": "...", "to": ["...", ...] }`
    /// objects. Entries with an empty `to` list are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<MappingEntry> =
            serde_json::from_str(json).map_err(|e| Error::MappingTable(e.to_string()))?;
        if let Some(entry) = entries.iter().find(|e| e.to.is_empty()) {
            return Err(Error::MappingTable(format!(
                "entry '{}' lists no equivalent symbol",
                entry.from
            )));
        }
        Ok(Self { entries })
    }

    /// Built-in cuSOLVER to hipSOLVER table, shared for the process lifetime
    pub fn hip() -> Arc<Self> {
        HIP_TABLE
            .get_or_init(|| Arc::new(Self::from_pairs(CUSOLVER_TO_HIPSOLVER.iter().copied())))
            .clone()
    }

    /// Append an entry; earlier entries keep priority
    pub fn push(&mut self, from: impl Into<String>, to: Vec<String>) {
        self.entries.push(MappingEntry {
            from: from.into(),
            to,
        });
    }

    /// First equivalent of the first entry whose key equals `name`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.from == name)
            .and_then(|entry| entry.to.first())
            .map(String::as_str)
    }

    /// Entries in lookup order
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
