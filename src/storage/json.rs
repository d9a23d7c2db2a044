//! Flat JSON array of sessions, rewritten whole on each append.

use super::SessionStore;
use crate::error::StoreError;
use crate::session::Session;
use std::path::{Path, PathBuf};

pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonSessionStore {
    /// Missing file is an empty store
    fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn append(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.load_all()?;
        sessions.push(session.clone());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&sessions)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
