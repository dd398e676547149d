//! Provenance metadata attached to containers and their content
//!
//! Every container keeps one JSON document (`metadata.json` at its root)
//! mapping relative-path keys to [`Envelope`] records. The key `"."` is the
//! container itself.

mod document;
mod envelope;
mod store;

pub use document::MetadataDocument;
pub use envelope::{Envelope, ExtractionParameter, NodeType, RecordKind, SCHEMA_CONTEXT_VOCAB};
pub use store::{AddMetadata, GetMode, MergeMode, MetadataStore};
