//! Key-value persistence for trigger registration state
//!
//! The trigger keeps one entry per node, `{node_id}.webhookId`, which holds
//! the remote id of the webhook it registered. [`JsonFileStore`] backs the
//! CLI; [`MemoryStore`] is used by tests and embedders that keep state elsewhere.

use crate::error::MaileonError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, MaileonError>;
    fn set(&self, key: &str, value: &str) -> Result<(), MaileonError>;
    /// Removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), MaileonError>;
}

fn store_error(message: String, source: impl std::error::Error + Send + Sync + 'static) -> MaileonError {
    MaileonError::Store {
        message,
        source: Some(Box::new(source)),
    }
}

fn poisoned() -> MaileonError {
    MaileonError::Store {
        message: "state lock poisoned".to_string(),
        source: None,
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, MaileonError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MaileonError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), MaileonError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Flat JSON object on disk, rewritten through a temp file and rename
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, MaileonError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(store_error(
                    format!("failed to read {}", self.path.display()),
                    e,
                ));
            }
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&contents)
            .map_err(|e| store_error(format!("corrupt state file {}", self.path.display()), e))
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<(), MaileonError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| store_error(format!("failed to create {}", parent.display()), e))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| store_error("failed to encode state".to_string(), e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| store_error(format!("failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| store_error(format!("failed to replace {}", self.path.display()), e))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, MaileonError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.load()?.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MaileonError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), MaileonError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
