//! Labeled feature vectors built from a session store, grouped by label.

use crate::features::{FeatureExtractor, FeatureSchema, FeatureVector};
use crate::session::{Session, SessionValidator};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Label → vectors. BTreeMap keeps label order stable across runs.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: FeatureSchema,
    by_label: BTreeMap<String, Vec<FeatureVector>>,
}

/// A stored session that did not make it into the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSession {
    pub id: String,
    pub label: String,
    pub reason: String,
}

impl Dataset {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            by_label: BTreeMap::new(),
        }
    }

    /// Validate and extract every session. Sessions that fail either step are skipped and
    /// reported, never patched up.
    pub fn from_sessions(
        sessions: impl IntoIterator<Item = Session>,
        validator: &SessionValidator,
        extractor: &FeatureExtractor,
    ) -> (Self, Vec<SkippedSession>) {
        let mut dataset = Self::new(extractor.schema().clone());
        let mut skipped = Vec::new();

        for session in sessions {
            let id = session.id.clone();
            let label = session.label.clone();
            let result = validator
                .validate(session)
                .map_err(|e| e.to_string())
                .and_then(|v| extractor.extract(&v).map_err(|e| e.to_string()));
            match result {
                Ok(vector) => dataset.insert(label, vector),
                Err(reason) => {
                    warn!(session_id = %id, label = %label, %reason, "skipping session");
                    skipped.push(SkippedSession { id, label, reason });
                }
            }
        }
        debug!(
            labels = dataset.by_label.len(),
            vectors = dataset.len(),
            skipped = skipped.len(),
            "dataset built"
        );
        (dataset, skipped)
    }

    pub fn insert(&mut self, label: impl Into<String>, vector: FeatureVector) {
        self.by_label.entry(label.into()).or_default().push(vector);
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Sorted label set
    pub fn labels(&self) -> Vec<String> {
        self.by_label.keys().cloned().collect()
    }

    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        self.by_label
            .iter()
            .map(|(label, v)| (label.clone(), v.len()))
            .collect()
    }

    pub fn vectors(&self, label: &str) -> &[FeatureVector] {
        self.by_label.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FeatureVector])> {
        self.by_label.iter().map(|(l, v)| (l.as_str(), v.as_slice()))
    }

    /// Total vector count
    pub fn len(&self) -> usize {
        self.by_label.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
