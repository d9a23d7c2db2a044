//! keystyle: identify who is typing a fixed prompt from keystroke timing.
//!
//! Modular structure:
//! - [`session`]: key events, sessions, raw capture pairing, validation gate
//! - [`features`]: dwell/flight statistics laid out by a versioned feature schema
//! - [`dataset`]: labeled feature vectors built from a session store
//! - [`train`]: sufficiency gates, stratified split, random forest fit
//! - [`model`]: forest, trained model value, on-disk artifact
//! - [`predict`]: probability distribution and confidence band for one session
//! - [`storage`]: JSON and encrypted SQLite session stores
//! - [`logging`]: tracing setup and ndjson audit lines

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod session;
pub mod storage;
pub mod train;

pub use config::KeystyleConfig;
pub use dataset::Dataset;
pub use features::{FeatureExtractor, FeatureSchema, FeatureVector};
pub use logging::StructuredLogger;
pub use model::{Model, ModelStore};
pub use pipeline::{extract_features, predict, train, validate_session};
pub use predict::{PredictionResult, Predictor};
pub use session::{KeyEvent, Session, SessionValidator, ValidatedSession};
pub use storage::SessionStore;
pub use train::Trainer;
