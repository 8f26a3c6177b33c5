//! Export documents and named presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{graph_from_document, DialogueStore, NodePositions, StorageError, StorageSlot};
use crate::config::DialogueSettings;
use crate::graph::DialogueGraph;

/// Version written into every export.
pub const EXPORT_VERSION: u32 = 1;

/// A graph as shared between worlds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    #[serde(default)]
    pub npc_name: String,
    pub exported_at: DateTime<Utc>,
    pub dialogue: DialogueGraph,
    #[serde(default)]
    pub node_positions: NodePositions,
}

impl ExportDocument {
    pub fn new(npc_name: impl Into<String>, dialogue: DialogueGraph) -> Self {
        Self {
            version: EXPORT_VERSION,
            npc_name: npc_name.into(),
            exported_at: Utc::now(),
            dialogue,
            node_positions: NodePositions::new(),
        }
    }

    pub fn with_positions(mut self, positions: NodePositions) -> Self {
        self.node_positions = positions;
        self
    }

    pub fn to_json_pretty(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an export. The document must carry `dialogue.nodes`; the graph is
    /// normalized, other fields fall back to defaults.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let mut value: Value = serde_json::from_str(raw)?;
        let has_nodes = value
            .get("dialogue")
            .and_then(|dialogue| dialogue.get("nodes"))
            .is_some_and(Value::is_object);
        if !has_nodes {
            return Err(StorageError::InvalidDocument(
                "missing dialogue.nodes".to_string(),
            ));
        }

        let object = value
            .as_object_mut()
            .ok_or_else(|| StorageError::InvalidDocument("not an object".to_string()))?;
        let dialogue = graph_from_document(object.remove("dialogue").unwrap_or(Value::Null))?;
        let version = object
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(EXPORT_VERSION);
        let npc_name = object
            .get("npcName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let exported_at = object
            .get("exportedAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let node_positions = match object.remove("nodePositions") {
            Some(Value::Object(positions)) => positions,
            _ => NodePositions::new(),
        };

        Ok(Self {
            version,
            npc_name,
            exported_at,
            dialogue,
            node_positions,
        })
    }
}

/// A named snapshot of a graph, shared across all NPCs of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub dialogue: DialogueGraph,
    #[serde(default)]
    pub node_positions: NodePositions,
}

impl Preset {
    pub fn new(name: impl Into<String>, dialogue: DialogueGraph, positions: NodePositions) -> Self {
        Self {
            name: name.into(),
            saved_at: Utc::now(),
            dialogue,
            node_positions: positions,
        }
    }
}

/// The stored preset entries as written, malformed ones included.
async fn read_preset_entries(
    store: &dyn DialogueStore,
    settings: &DialogueSettings,
) -> Result<Vec<Value>, StorageError> {
    match store.read(&StorageSlot::presets(settings)).await? {
        Some(Value::Array(entries)) => Ok(entries),
        _ => Ok(Vec::new()),
    }
}

async fn write_preset_entries(
    store: &dyn DialogueStore,
    entries: Vec<Value>,
    settings: &DialogueSettings,
) -> Result<(), StorageError> {
    store
        .write(&StorageSlot::presets(settings), Value::Array(entries))
        .await
}

/// Read the preset list. A missing list is empty; malformed entries are skipped.
pub async fn load_presets(
    store: &dyn DialogueStore,
    settings: &DialogueSettings,
) -> Result<Vec<Preset>, StorageError> {
    let entries = read_preset_entries(store, settings).await?;

    let mut presets = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Preset>(entry) {
            Ok(mut preset) => {
                preset.dialogue.normalize();
                presets.push(preset);
            }
            Err(err) => tracing::warn!(error = %err, "skipping malformed dialogue preset"),
        }
    }
    Ok(presets)
}

/// Append a preset. Entries already stored are written back untouched.
pub async fn append_preset(
    store: &dyn DialogueStore,
    preset: &Preset,
    settings: &DialogueSettings,
) -> Result<(), StorageError> {
    let mut entries = read_preset_entries(store, settings).await?;
    entries.push(serde_json::to_value(preset)?);
    write_preset_entries(store, entries, settings).await
}

/// Remove the first entry named `name`, whether or not it parses as a preset.
pub async fn remove_preset(
    store: &dyn DialogueStore,
    name: &str,
    settings: &DialogueSettings,
) -> Result<(), StorageError> {
    let mut entries = read_preset_entries(store, settings).await?;
    let index = entries
        .iter()
        .position(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
        .ok_or_else(|| StorageError::PresetNotFound(name.to_string()))?;
    entries.remove(index);
    write_preset_entries(store, entries, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DialogueNode;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    fn sample_graph() -> DialogueGraph {
        let mut graph = DialogueGraph::new("Innkeeper");
        graph.nodes.insert(
            "rumors".into(),
            DialogueNode::new("rumors").with_text("They say the mill is haunted."),
        );
        graph
    }

    #[test]
    fn test_export_shape() {
        let mut positions = NodePositions::new();
        positions.insert("start".into(), json!({"x": 10, "y": 20}));
        let doc = ExportDocument::new("Innkeeper", sample_graph()).with_positions(positions);

        let value: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["npcName"], "Innkeeper");
        assert!(value["exportedAt"].is_string());
        assert!(value["dialogue"]["nodes"]["rumors"].is_object());
        assert_eq!(value["nodePositions"]["start"]["x"], 10);
    }

    #[test]
    fn test_import_round_trip() {
        let doc = ExportDocument::new("Innkeeper", sample_graph());
        let imported = ExportDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(imported.dialogue, doc.dialogue);
        assert_eq!(imported.npc_name, "Innkeeper");
        assert_eq!(imported.exported_at, doc.exported_at);
    }

    #[test]
    fn test_import_rejects_missing_nodes() {
        let err = ExportDocument::from_json(r#"{"version": 1, "dialogue": {"start": "a"}}"#)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument(_)));

        let err = ExportDocument::from_json("not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_import_normalizes_and_defaults() {
        let doc = ExportDocument::from_json(
            r#"{"dialogue": {"start": "missing", "nodes": {"hello": {"text": "Hi"}}}}"#,
        )
        .unwrap();
        assert_eq!(doc.version, EXPORT_VERSION);
        assert_eq!(doc.dialogue.start.as_str(), "hello");
        assert_eq!(doc.dialogue.node("hello").unwrap().id.as_str(), "hello");
        assert!(doc.node_positions.is_empty());
    }

    #[tokio::test]
    async fn test_presets_skip_malformed_entries() {
        let store = InMemoryStore::new();
        let settings = DialogueSettings::default();
        assert!(load_presets(&store, &settings).await.unwrap().is_empty());

        let good = Preset::new("tavern", sample_graph(), NodePositions::new());
        let mut entries = serde_json::to_value(vec![good.clone()]).unwrap();
        entries
            .as_array_mut()
            .unwrap()
            .push(json!({"name": "broken"}));
        store
            .write(&StorageSlot::presets(&settings), entries)
            .await
            .unwrap();

        let presets = load_presets(&store, &settings).await.unwrap();
        assert_eq!(presets, vec![good]);
    }

    #[tokio::test]
    async fn test_presets_are_world_level() {
        let store = InMemoryStore::new();
        let settings = DialogueSettings::default();
        let preset = Preset::new("a", DialogueGraph::new(""), NodePositions::new());
        append_preset(&store, &preset, &settings).await.unwrap();

        let slot = StorageSlot::presets(&settings);
        assert!(slot.owner.is_none());
        assert_eq!(slot.key, "dialogue-presets");
        assert_eq!(load_presets(&store, &settings).await.unwrap(), vec![preset]);
    }

    #[tokio::test]
    async fn test_preset_edits_keep_unreadable_entries() {
        let store = InMemoryStore::new();
        let settings = DialogueSettings::default();
        let slot = StorageSlot::presets(&settings);
        let legacy = json!({"name": "legacy", "dialogue": {"nodes": {}}});
        store.write(&slot, json!([legacy.clone()])).await.unwrap();

        let fresh = Preset::new("fresh", sample_graph(), NodePositions::new());
        append_preset(&store, &fresh, &settings).await.unwrap();
        assert_eq!(load_presets(&store, &settings).await.unwrap(), vec![fresh]);

        let stored = store.read(&slot).await.unwrap().unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 2);
        assert_eq!(stored[0], legacy);
        assert_eq!(stored[1]["name"], "fresh");

        remove_preset(&store, "fresh", &settings).await.unwrap();
        assert_eq!(store.read(&slot).await.unwrap().unwrap(), json!([legacy]));

        remove_preset(&store, "legacy", &settings).await.unwrap();
        assert_eq!(store.read(&slot).await.unwrap().unwrap(), json!([]));
        assert!(matches!(
            remove_preset(&store, "legacy", &settings).await,
            Err(StorageError::PresetNotFound(_))
        ));
    }
}
