//! The metadata record and its semantic payload

use std::path::Path;

use dm_fs::{SELF_KEY, key_segments, relative_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Vocabulary the payload terms are interpreted in.
pub const SCHEMA_CONTEXT_VOCAB: &str = "https://schema.org/";

const DM_VOCAB: &str = "https://your-vocab.example/terms/";

/// Role of a container in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Project,
    Campaign,
    Experiment,
    Category,
    /// Anything deeper than a category or outside the managed tree.
    Generic,
}

impl NodeType {
    /// Infer the role of `container` from its depth below `root`.
    pub fn infer(container: &Path, root: &Path) -> Self {
        let Ok(key) = relative_key(root, container) else {
            return Self::Generic;
        };
        match key_segments(&key).len() {
            0 => Self::Root,
            1 => Self::Project,
            2 => Self::Campaign,
            3 => Self::Experiment,
            4 => Self::Category,
            _ => Self::Generic,
        }
    }

    /// Get the string representation of the node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Project => "project",
            Self::Campaign => "campaign",
            Self::Experiment => "experiment",
            Self::Category => "category",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a record describes a container or something inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Dataset,
    File,
}

/// Context of the write that produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionParameter {
    pub path: String,
    /// Older records carry `null` here.
    #[serde(default)]
    pub node_type: Option<NodeType>,
}

/// One metadata record.
///
/// Fields this type does not know are kept in `extra` and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub extractor_name: String,
    pub extractor_version: String,
    pub extraction_parameter: ExtractionParameter,
    /// ISO-8601 UTC, second precision.
    pub extraction_time: String,
    pub agent_name: String,
    pub agent_email: String,
    pub dataset_id: String,
    pub dataset_version: String,
    pub path: String,
    pub extracted_metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Stable identifier of the item at `key` in the container `dataset_id`.
    pub fn node_id(node_type: NodeType, dataset_id: &str, key: &str) -> String {
        if key == SELF_KEY {
            format!("datalad:{}:{}", node_type, dataset_id)
        } else {
            format!("datalad:{}:{}:{}", node_type, dataset_id, key)
        }
    }

    /// Build the semantic payload for the item at `key`.
    ///
    /// `is_dir` picks `Collection` over `CreativeWork` for items other than
    /// the container itself. Caller fields are applied last and win.
    pub fn payload(
        node_type: NodeType,
        dataset_id: &str,
        key: &str,
        is_dir: bool,
        name: Option<&str>,
        extra: Option<&Map<String, Value>>,
    ) -> Map<String, Value> {
        let schema_type = if key == SELF_KEY {
            "Dataset"
        } else if is_dir {
            "Collection"
        } else {
            "CreativeWork"
        };

        let mut payload = Map::new();
        payload.insert(
            "@context".to_string(),
            json!({ "@vocab": SCHEMA_CONTEXT_VOCAB, "dm": DM_VOCAB }),
        );
        payload.insert("@type".to_string(), json!(schema_type));
        payload.insert(
            "@id".to_string(),
            json!(Self::node_id(node_type, dataset_id, key)),
        );
        payload.insert("identifier".to_string(), json!(key));
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            payload.insert("name".to_string(), json!(name));
        }
        if let Some(extra) = extra {
            for (k, v) in extra {
                payload.insert(k.clone(), v.clone());
            }
        }
        payload
    }

    /// Fold a newer write into this record.
    ///
    /// Payload keys are unioned with the newer values winning, envelope
    /// fields are taken from the newer write, and unknown fields of both
    /// survive.
    pub fn merge(self, newer: Envelope) -> Envelope {
        let mut extracted_metadata = self.extracted_metadata;
        extracted_metadata.extend(newer.extracted_metadata);
        let mut extra = self.extra;
        extra.extend(newer.extra);

        Envelope {
            extracted_metadata,
            extra,
            ..newer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_type_from_depth() {
        let root = Path::new("/tmp/dm");
        assert_eq!(NodeType::infer(root, root), NodeType::Root);
        assert_eq!(NodeType::infer(&root.join("p/c/e"), root), NodeType::Experiment);
        assert_eq!(NodeType::infer(&root.join("p/c/e/raw"), root), NodeType::Category);
        assert_eq!(NodeType::infer(&root.join("p/c/e/raw/x"), root), NodeType::Generic);
        assert_eq!(NodeType::infer(Path::new("/elsewhere"), root), NodeType::Generic);
    }

    #[test]
    fn node_ids() {
        assert_eq!(
            Envelope::node_id(NodeType::Experiment, "abc", "."),
            "datalad:experiment:abc"
        );
        assert_eq!(
            Envelope::node_id(NodeType::Experiment, "abc", "raw/a.dat"),
            "datalad:experiment:abc:raw/a.dat"
        );
    }

    #[test]
    fn payload_types_and_caller_fields() {
        let mut extra = Map::new();
        extra.insert("temperature".to_string(), json!(21.5));
        extra.insert("name".to_string(), json!("caller wins"));

        let payload = Envelope::payload(NodeType::Root, "id", "raw", true, Some("ignored"), Some(&extra));

        assert_eq!(payload["@type"], json!("Collection"));
        assert_eq!(payload["identifier"], json!("raw"));
        assert_eq!(payload["temperature"], json!(21.5));
        assert_eq!(payload["name"], json!("caller wins"));
        assert_eq!(
            Envelope::payload(NodeType::Root, "id", ".", true, None, None)["@type"],
            json!("Dataset")
        );
        assert!(!Envelope::payload(NodeType::Root, "id", "a.txt", false, None, None).contains_key("name"));
    }
}
