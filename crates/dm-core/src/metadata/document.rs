//! The per-container metadata file

use std::path::{Path, PathBuf};

use dm_fs::{ConfigStore, DmPath, NormalizedPath};
use serde_json::{Map, Value};

use super::Envelope;
use crate::Result;

/// The records of one container, keyed by relative path.
///
/// Records keep their insertion order when written back.
#[derive(Debug, Clone, Default)]
pub struct MetadataDocument {
    path: PathBuf,
    records: Map<String, Value>,
    dirty: bool,
}

impl MetadataDocument {
    /// Load the document of `container`. A missing file is an empty document.
    pub fn load(container: &Path) -> Result<Self> {
        let path = container.join(DmPath::MetadataFile);
        let records: Map<String, Value> =
            ConfigStore::new().load_or_default(&NormalizedPath::new(&path))?;
        Ok(Self {
            path,
            records,
            dirty: false,
        })
    }

    /// Location of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the document has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// The raw record at `key`.
    pub fn get(&self, key: &str) -> Option<&Map<String, Value>> {
        self.records.get(key).and_then(Value::as_object)
    }

    /// The record at `key` as an envelope.
    pub fn envelope(&self, key: &str) -> Result<Option<Envelope>> {
        match self.records.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Replace the record at `key`.
    pub fn insert(&mut self, key: &str, envelope: &Envelope) -> Result<()> {
        self.records
            .insert(key.to_string(), serde_json::to_value(envelope)?);
        self.dirty = true;
        Ok(())
    }

    /// Write the document atomically if it changed.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        ConfigStore::new().save(&NormalizedPath::new(&self.path), &self.records)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "Saved metadata");
        Ok(())
    }
}
