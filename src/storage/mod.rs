//! Session stores: where enrolled typing sessions live between training runs.

mod encrypted;
mod json;

pub use encrypted::SecureSessionStore;
pub use json::JsonSessionStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::session::Session;
use std::collections::BTreeMap;

/// Append-only collection of labeled sessions.
pub trait SessionStore {
    /// Every stored session in insertion order
    fn load_all(&self) -> Result<Vec<Session>, StoreError>;

    fn append(&self, session: &Session) -> Result<(), StoreError>;

    fn label_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let mut counts = BTreeMap::new();
        for s in self.load_all()? {
            *counts.entry(s.label).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Open the configured backend. `secret` is required for the sqlite backend.
pub fn open_store(config: &StoreConfig, secret: Option<&[u8]>) -> Result<Box<dyn SessionStore>, StoreError> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match config.backend {
        StoreBackend::Json => Ok(Box::new(JsonSessionStore::new(&config.path))),
        StoreBackend::Sqlite => {
            let secret = secret.ok_or_else(|| {
                StoreError::Crypto(format!("sqlite store needs a secret in ${}", config.secret_env))
            })?;
            Ok(Box::new(SecureSessionStore::open(&config.path, secret)?))
        }
    }
}
