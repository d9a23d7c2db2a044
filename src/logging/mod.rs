//! Tracing setup and ndjson audit records.

mod format;

pub use format::{AuditRecord, StructuredLogger};
