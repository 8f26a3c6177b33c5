//! Persistence of dialogue graphs through a host key-value store.
//!
//! Graphs live in a slot on their NPC (`namespace` + `key` from
//! [`DialogueSettings`]); presets live in a world-level slot. Saving always
//! normalizes and prunes the in-memory graph before writing.

mod document;

pub use document::*;

use std::collections::HashMap;

use actor_rules::EntityId;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::DialogueSettings;
use crate::graph::DialogueGraph;

/// Editor layout data keyed by node id, carried through untouched.
pub type NodePositions = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("invalid dialogue document: {0}")]
    InvalidDocument(String),

    #[error("preset not found: {0}")]
    PresetNotFound(String),
}

/// Address of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageSlot {
    /// Owning entity; `None` for world-level data.
    pub owner: Option<EntityId>,
    pub namespace: String,
    pub key: String,
}

impl StorageSlot {
    pub fn entity(owner: EntityId, namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            owner: Some(owner),
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn world(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            owner: None,
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Where an NPC's graph is stored.
    pub fn graph(owner: EntityId, settings: &DialogueSettings) -> Self {
        Self::entity(owner, &settings.storage_namespace, &settings.storage_key)
    }

    /// Where an NPC's editor layout is stored.
    pub fn positions(owner: EntityId, settings: &DialogueSettings) -> Self {
        Self::entity(owner, &settings.storage_namespace, &settings.positions_key)
    }

    pub fn presets(settings: &DialogueSettings) -> Self {
        Self::world(&settings.storage_namespace, &settings.presets_key)
    }
}

/// Host key-value store for JSON documents.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DialogueStore: Send + Sync {
    async fn read(&self, slot: &StorageSlot) -> Result<Option<Value>, StorageError>;

    async fn write(&self, slot: &StorageSlot, document: Value) -> Result<(), StorageError>;
}

/// Store backed by a map in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<StorageSlot, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DialogueStore for InMemoryStore {
    async fn read(&self, slot: &StorageSlot) -> Result<Option<Value>, StorageError> {
        Ok(self.documents.read().await.get(slot).cloned())
    }

    async fn write(&self, slot: &StorageSlot, document: Value) -> Result<(), StorageError> {
        self.documents.write().await.insert(slot.clone(), document);
        Ok(())
    }
}

/// Parse a stored graph document, accepting the legacy `{ "dialogueNodes": ... }`
/// wrapper, and normalize it.
pub fn graph_from_document(document: Value) -> Result<DialogueGraph, StorageError> {
    let document = match document {
        Value::Object(mut map) if map.get("dialogueNodes").is_some_and(Value::is_object) => {
            map.remove("dialogueNodes").unwrap_or(Value::Null)
        }
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let mut graph: DialogueGraph = serde_json::from_value(document)?;
    graph.normalize();
    Ok(graph)
}

/// Load an NPC's graph; `None` when nothing is stored.
pub async fn load_graph(
    store: &dyn DialogueStore,
    owner: EntityId,
    settings: &DialogueSettings,
) -> Result<Option<DialogueGraph>, StorageError> {
    match store.read(&StorageSlot::graph(owner, settings)).await? {
        Some(document) => graph_from_document(document).map(Some),
        None => Ok(None),
    }
}

/// Normalize, prune, then write. The repairs stay applied even if the write fails.
pub async fn save_graph(
    store: &dyn DialogueStore,
    owner: EntityId,
    graph: &mut DialogueGraph,
    settings: &DialogueSettings,
) -> Result<(), StorageError> {
    graph.normalize();
    let pruned = graph.prune_dangling_targets();
    let document = serde_json::to_value(&*graph)?;
    store.write(&StorageSlot::graph(owner, settings), document).await?;
    tracing::info!(%owner, nodes = graph.nodes.len(), pruned, "dialogue saved");
    Ok(())
}

pub async fn load_positions(
    store: &dyn DialogueStore,
    owner: EntityId,
    settings: &DialogueSettings,
) -> Result<NodePositions, StorageError> {
    match store.read(&StorageSlot::positions(owner, settings)).await? {
        Some(Value::Object(positions)) => Ok(positions),
        _ => Ok(NodePositions::new()),
    }
}

pub async fn save_positions(
    store: &dyn DialogueStore,
    owner: EntityId,
    positions: &NodePositions,
    settings: &DialogueSettings,
) -> Result<(), StorageError> {
    store
        .write(
            &StorageSlot::positions(owner, settings),
            Value::Object(positions.clone()),
        )
        .await
}
