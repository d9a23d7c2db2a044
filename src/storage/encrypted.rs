//! SQLite-backed session store. Session payloads (key timings are biometric data) are
//! AES-256-GCM encrypted; label and timestamp stay in clear for counting.

use super::SessionStore;
use crate::error::StoreError;
use crate::session::Session;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| StoreError::Crypto(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, StoreError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Crypto("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| StoreError::Crypto(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|_| StoreError::Crypto("authentication failed (wrong secret?)".into()))
}

pub struct SecureSessionStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SecureSessionStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                label TEXT NOT NULL,
                recorded_at INTEGER NOT NULL,
                payload_enc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_label ON sessions(label);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionStore for SecureSessionStore {
    fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT payload_enc FROM sessions ORDER BY seq")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|enc| -> Result<Session, StoreError> {
                let plain = decrypt(&self.key, enc)?;
                Ok(serde_json::from_slice(&plain)?)
            })
            .collect()
    }

    /// Duplicate session ids are rejected by the UNIQUE constraint
    fn append(&self, session: &Session) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(session)?;
        let enc = encrypt(&self.key, &payload)?;
        self.conn().execute(
            "INSERT INTO sessions (id, label, recorded_at, payload_enc) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id,
                session.label,
                session.recorded_at.timestamp_millis(),
                enc
            ],
        )?;
        Ok(())
    }

    fn label_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT label, COUNT(*) FROM sessions GROUP BY label")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut counts = BTreeMap::new();
        for row in rows {
            let (label, n) = row?;
            counts.insert(label, n as usize);
        }
        Ok(counts)
    }
}
