//! Feature layout: the ordered feature names every vector and every model agree on.
//!
//! Adding, removing, or reordering a feature changes the fingerprint and must bump
//! [`FEATURE_VERSION`]. Models persist the schema they were trained with and are refused by an
//! extractor whose layout differs.

use crate::error::SchemaMismatch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const FEATURE_VERSION: u8 = 1;

/// Names in vector order.
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "dwell_mean",
    "dwell_std",
    "dwell_median",
    "flight_mean",
    "flight_std",
    "flight_median",
];

pub const FEATURE_COUNT: usize = 6;

/// SHA-256 over the version byte and NUL-separated names, hex encoded.
pub fn compute_fingerprint<S: AsRef<str>>(version: u8, names: &[S]) -> String {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    for name in names {
        hasher.update(name.as_ref().as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u8,
    pub names: Vec<String>,
    pub fingerprint: String,
}

impl FeatureSchema {
    /// Layout compiled into this build
    pub fn current() -> Self {
        Self::new(FEATURE_VERSION, FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect())
    }

    pub fn new(version: u8, names: Vec<String>) -> Self {
        let fingerprint = compute_fingerprint(version, &names);
        Self {
            version,
            names,
            fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when the stored fingerprint matches the stored names.
    pub fn is_consistent(&self) -> bool {
        compute_fingerprint(self.version, &self.names) == self.fingerprint
    }

    /// `Ok` when `other` describes the same layout as `self`.
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<(), SchemaMismatch> {
        if self.fingerprint == other.fingerprint && self.names == other.names {
            return Ok(());
        }
        Err(SchemaMismatch {
            expected_version: self.version,
            expected: self.names.join(","),
            found_version: other.version,
            found: other.names.join(","),
        })
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::current()
    }
}
