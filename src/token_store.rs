// src/token_store.rs
//! Plaintext credential storage for OAuth bearer tokens.
//!
//! Values are kept as-is on disk (no encryption, no expiry tracking), one JSON
//! object per file: `{ "<service>": { "<key>": "<value>" } }`.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

pub const SERVICE: &str = "blog_agent";

type Entries = BTreeMap<String, BTreeMap<String, String>>;

pub trait CredentialStore: Send + Sync {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>>;
    fn set(&self, service: &str, key: &str, value: &str) -> Result<()>;
}

pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileCredentialStore {
    /// Opens `path`; a missing file is treated as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Entries::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Entries::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(service).and_then(|m| m.get(key)).cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        next.entry(service.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        // memory only changes once the file write went through
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<Entries>,
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(service).and_then(|m| m.get(key)).cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(service.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
