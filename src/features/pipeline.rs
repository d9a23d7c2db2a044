//! Feature extraction: session events → timing stats → schema-ordered vector.

use super::{FeatureSchema, FeatureVector, TimingStats, FEATURE_COUNT};
use crate::error::{ExtractionError, SchemaMismatch};
use crate::session::{timing_defect, Session};

/// Stateless extractor bound to one feature schema.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    /// Extractor for the layout compiled into this build
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::current(),
        }
    }

    /// Extractor for a persisted schema; refuses any layout other than the current one.
    pub fn for_schema(schema: &FeatureSchema) -> Result<Self, SchemaMismatch> {
        schema.ensure_matches(&FeatureSchema::current())?;
        Ok(Self {
            schema: schema.clone(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Six finite values in schema order. Pure: identical timings give identical bits.
    /// Events that would fail validation are refused here too.
    pub fn extract(&self, session: &Session) -> Result<FeatureVector, ExtractionError> {
        if let Some((index, reason)) = timing_defect(&session.events) {
            return Err(ExtractionError::MalformedEvents { index, reason });
        }
        let stats = TimingStats::from_events(&session.events).ok_or(
            ExtractionError::InsufficientEvents {
                have: session.events.len(),
            },
        )?;

        let mut values = [0.0f64; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(&self.schema.names) {
            let v = stats.get(name).ok_or_else(|| self.mismatch())?;
            if !v.is_finite() {
                return Err(ExtractionError::NonFiniteFeature { name: name.clone() });
            }
            *slot = v;
        }
        Ok(FeatureVector::from_values(values))
    }

    fn mismatch(&self) -> SchemaMismatch {
        let current = FeatureSchema::current();
        SchemaMismatch {
            expected_version: self.schema.version,
            expected: self.schema.names.join(","),
            found_version: current.version,
            found: current.names.join(","),
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
