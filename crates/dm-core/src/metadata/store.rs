//! Adding and reading metadata records

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use dm_fs::{SELF_KEY, relative_key};
use dm_git::{Identity, StorageEngine};
use serde_json::{Map, Value};

use super::{Envelope, ExtractionParameter, MetadataDocument, NodeType, RecordKind};
use crate::config::Extractor;
use crate::{Error, Result};

/// How a write treats an existing record at the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Replace the record.
    #[default]
    Overwrite,
    /// Union the payloads, newer values winning.
    Merge,
}

/// What a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GetMode {
    /// The full record.
    #[default]
    Envelope,
    /// Only `extracted_metadata`.
    Payload,
}

/// A metadata write.
#[derive(Debug, Clone, Copy)]
pub struct AddMetadata<'a> {
    pub container: &'a Path,
    /// Item inside the container, absolute or relative. `None` is the
    /// container itself.
    pub path: Option<&'a Path>,
    /// Caller fields merged into the payload.
    pub payload: Option<&'a Map<String, Value>>,
    pub name: Option<&'a str>,
    pub mode: MergeMode,
}

impl<'a> AddMetadata<'a> {
    /// A write of the container's own record.
    pub fn container(container: &'a Path) -> Self {
        Self {
            container,
            path: None,
            payload: None,
            name: None,
            mode: MergeMode::Overwrite,
        }
    }
}

/// Reads and writes metadata documents of containers below a root.
///
/// Documents are loaded on first use and held until [`MetadataStore::save`].
pub struct MetadataStore {
    engine: Arc<dyn StorageEngine>,
    root: PathBuf,
    agent: Identity,
    extractor: Extractor,
    documents: HashMap<PathBuf, MetadataDocument>,
    clock: fn() -> DateTime<Utc>,
}

impl MetadataStore {
    pub fn new(
        engine: Arc<dyn StorageEngine>,
        root: impl Into<PathBuf>,
        agent: Identity,
        extractor: Extractor,
    ) -> Self {
        Self {
            engine,
            root: root.into(),
            agent,
            extractor,
            documents: HashMap::new(),
            clock: Utc::now,
        }
    }

    /// Use `clock` for extraction timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn document(&mut self, container: &Path) -> Result<&mut MetadataDocument> {
        if !self.engine.is_installed(container) {
            return Err(Error::ContainerNotInstalled {
                path: container.to_path_buf(),
            });
        }
        if !self.documents.contains_key(container) {
            let document = MetadataDocument::load(container)?;
            self.documents.insert(container.to_path_buf(), document);
        }
        self.documents
            .get_mut(container)
            .ok_or_else(|| Error::ContainerNotInstalled {
                path: container.to_path_buf(),
            })
    }

    /// Record metadata for an item of a container. Returns the record key.
    ///
    /// The document is not written until [`MetadataStore::save`].
    pub fn add(&mut self, request: &AddMetadata<'_>) -> Result<String> {
        let container = request.container;
        let key = match request.path {
            Some(path) => relative_key(container, path)?,
            None => SELF_KEY.to_string(),
        };
        let item = if key == SELF_KEY {
            container.to_path_buf()
        } else {
            container.join(&key)
        };

        self.document(container)?;
        let dataset_id = self.engine.id(container)?;
        let dataset_version = self.engine.version(container)?;
        let node_type = NodeType::infer(container, &self.root);

        let envelope = Envelope {
            kind: if key == SELF_KEY {
                RecordKind::Dataset
            } else {
                RecordKind::File
            },
            extractor_name: self.extractor.name.clone(),
            extractor_version: self.extractor.version.clone(),
            extraction_parameter: ExtractionParameter {
                path: key.clone(),
                node_type: Some(node_type),
            },
            extraction_time: (self.clock)().to_rfc3339_opts(SecondsFormat::Secs, false),
            agent_name: self.agent.name.clone(),
            agent_email: self.agent.email.clone(),
            dataset_id: dataset_id.clone(),
            dataset_version,
            path: key.clone(),
            extracted_metadata: Envelope::payload(
                node_type,
                &dataset_id,
                &key,
                item.is_dir(),
                request.name,
                request.payload,
            ),
            extra: Map::new(),
        };

        let document = self.document(container)?;
        let record = match request.mode {
            MergeMode::Merge => match document.envelope(&key)? {
                Some(existing) => existing.merge(envelope),
                None => envelope,
            },
            MergeMode::Overwrite => envelope,
        };
        document.insert(&key, &record)?;

        tracing::debug!(container = %container.display(), key = %key, mode = ?request.mode, "Added metadata");
        Ok(key)
    }

    /// Write the document of `container` if it changed.
    pub fn save(&mut self, container: &Path) -> Result<()> {
        match self.documents.get_mut(container) {
            Some(document) => document.save(),
            None => Ok(()),
        }
    }

    /// Read the record of an item. A missing record reads as an empty map.
    pub fn get(&mut self, container: &Path, path: Option<&Path>, mode: GetMode) -> Result<Map<String, Value>> {
        let key = match path {
            Some(path) => relative_key(container, path)?,
            None => SELF_KEY.to_string(),
        };
        let document = self.document(container)?;
        let Some(record) = document.get(&key) else {
            return Ok(Map::new());
        };
        Ok(match mode {
            GetMode::Envelope => record.clone(),
            GetMode::Payload => record
                .get("extracted_metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("root", &self.root)
            .field("documents", &self.documents.len())
            .finish()
    }
}
