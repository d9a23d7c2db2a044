//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::predict::PredictionResult;
use crate::train::TrainingMetrics;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One audit line per training run or prediction
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditRecord<'a> {
    Trained {
        ts: String,
        accuracy: f64,
        train_size: usize,
        test_size: usize,
        labels: Vec<&'a str>,
        skipped_sessions: usize,
    },
    Predicted {
        ts: String,
        session_id: &'a str,
        label: &'a str,
        confidence: f64,
        band: &'static str,
    },
}

impl<'a> AuditRecord<'a> {
    pub fn trained(metrics: &'a TrainingMetrics, skipped_sessions: usize) -> Self {
        AuditRecord::Trained {
            ts: Utc::now().to_rfc3339(),
            accuracy: metrics.accuracy,
            train_size: metrics.train_size,
            test_size: metrics.test_size,
            labels: metrics.label_counts.keys().map(String::as_str).collect(),
            skipped_sessions,
        }
    }

    pub fn predicted(session_id: &'a str, result: &'a PredictionResult) -> Self {
        AuditRecord::Predicted {
            ts: Utc::now().to_rfc3339(),
            session_id,
            label: &result.label,
            confidence: result.confidence,
            band: result.band.as_str(),
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber writing to stderr, level from RUST_LOG or `default_level`.
    /// Safe to call more than once; later calls are ignored.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let result = if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }

    /// Emit a single ndjson line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)
    }
}
