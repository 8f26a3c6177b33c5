//! Authoring - the editing session that owns one NPC's graph.
//!
//! Every graph edit goes through [`AuthoringSession`], which marks the session
//! dirty until the next successful [`AuthoringSession::save`]. Node deletion
//! saves at once. Import and presets replace the whole graph in memory.

use std::sync::Arc;

use actor_rules::EntityId;
use serde_json::Value;
use thiserror::Error;

use crate::config::DialogueSettings;
use crate::graph::{DialogueGraph, DialogueNode, DialogueOption, GraphError, NodeId, OptionId, Target};
use crate::storage::{
    append_preset, load_graph, load_positions, load_presets, remove_preset, save_graph,
    save_positions, DialogueStore, ExportDocument, NodePositions, Preset, StorageError,
};
use crate::traversal::DialogueSession;

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("preset name must not be empty")]
    EmptyPresetName,
}

/// An open editor on one NPC's dialogue.
pub struct AuthoringSession {
    owner: EntityId,
    npc_name: String,
    graph: DialogueGraph,
    node_positions: NodePositions,
    dirty: bool,
    store: Arc<dyn DialogueStore>,
    settings: DialogueSettings,
}

impl AuthoringSession {
    /// Load the NPC's graph, or start a fresh one when nothing is stored.
    pub async fn open(
        store: Arc<dyn DialogueStore>,
        owner: EntityId,
        npc_name: impl Into<String>,
        settings: DialogueSettings,
    ) -> Result<Self, AuthoringError> {
        let mut npc_name = npc_name.into();
        if npc_name.is_empty() {
            npc_name = settings.default_speaker.clone();
        }

        let graph = match load_graph(store.as_ref(), owner, &settings).await? {
            Some(graph) => graph,
            None => DialogueGraph::new(&npc_name),
        };
        let node_positions = load_positions(store.as_ref(), owner, &settings).await?;
        tracing::debug!(%owner, nodes = graph.nodes.len(), "authoring session opened");

        Ok(Self {
            owner,
            npc_name,
            graph,
            node_positions,
            dirty: false,
            store,
            settings,
        })
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn npc_name(&self) -> &str {
        &self.npc_name
    }

    pub fn graph(&self) -> &DialogueGraph {
        &self.graph
    }

    pub fn node_positions(&self) -> &NodePositions {
        &self.node_positions
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Add an empty node spoken by this NPC.
    pub fn add_node(&mut self, id: Option<&str>) -> Result<NodeId, AuthoringError> {
        let id = self.graph.add_node(id)?;
        if let Some(node) = self.graph.node_mut(id.as_str()) {
            node.speaker = self.npc_name.clone();
        }
        self.dirty = true;
        Ok(id)
    }

    /// Mutable access to a node's speaker and text.
    pub fn node_mut(&mut self, id: &str) -> Result<&mut DialogueNode, AuthoringError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        self.dirty = true;
        Ok(node)
    }

    pub fn rename_node(&mut self, old_id: &str, new_id: &str) -> Result<(), AuthoringError> {
        self.graph.rename_node(old_id, new_id)?;
        if let Some(position) = self.node_positions.remove(old_id) {
            self.node_positions.insert(new_id.to_string(), position);
        }
        self.dirty = true;
        Ok(())
    }

    /// Delete a node and save straight away.
    pub async fn delete_node(&mut self, id: &str) -> Result<DialogueNode, AuthoringError> {
        let removed = self.graph.delete_node(id)?;
        self.node_positions.remove(id);
        self.dirty = true;
        self.save().await?;
        Ok(removed)
    }

    pub fn set_start(&mut self, id: &str) -> Result<(), AuthoringError> {
        self.graph.set_start(id)?;
        self.dirty = true;
        Ok(())
    }

    pub fn add_option(&mut self, node_id: &str) -> Result<OptionId, AuthoringError> {
        let id = self.graph.add_option(node_id)?;
        self.dirty = true;
        Ok(id)
    }

    pub fn delete_option(
        &mut self,
        node_id: &str,
        option_id: &str,
    ) -> Result<DialogueOption, AuthoringError> {
        let removed = self.graph.delete_option(node_id, option_id)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Mutable access to an option's label, visibility, requirement and results.
    pub fn option_mut(
        &mut self,
        node_id: &str,
        option_id: &str,
    ) -> Result<&mut DialogueOption, AuthoringError> {
        let option = self.graph.option_mut(node_id, option_id)?;
        self.dirty = true;
        Ok(option)
    }

    pub fn connect(
        &mut self,
        node_id: &str,
        option_id: &str,
        target: Target,
    ) -> Result<(), AuthoringError> {
        self.graph.connect(node_id, option_id, target)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_position(&mut self, node_id: &str, position: Value) {
        self.node_positions.insert(node_id.to_string(), position);
        self.dirty = true;
    }

    /// Persist the graph, then the node positions.
    ///
    /// The graph is normalized and pruned even if a write fails; the session
    /// stays dirty in that case.
    pub async fn save(&mut self) -> Result<(), AuthoringError> {
        save_graph(self.store.as_ref(), self.owner, &mut self.graph, &self.settings).await?;
        self.node_positions
            .retain(|id, _| self.graph.contains(id));
        save_positions(
            self.store.as_ref(),
            self.owner,
            &self.node_positions,
            &self.settings,
        )
        .await?;
        self.dirty = false;
        Ok(())
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(self.npc_name.clone(), self.graph.clone())
            .with_positions(self.node_positions.clone())
    }

    /// Replace the graph with an exported document. Nothing is saved.
    pub fn import(&mut self, raw: &str) -> Result<(), AuthoringError> {
        let document = ExportDocument::from_json(raw)?;
        self.graph = document.dialogue;
        self.node_positions = document.node_positions;
        self.dirty = true;
        tracing::info!(owner = %self.owner, from = %document.npc_name, "dialogue imported");
        Ok(())
    }

    /// Append the current graph to the world's presets.
    pub async fn save_preset(&self, name: &str) -> Result<Preset, AuthoringError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthoringError::EmptyPresetName);
        }
        let preset = Preset::new(name, self.graph.clone(), self.node_positions.clone());
        append_preset(self.store.as_ref(), &preset, &self.settings).await?;
        Ok(preset)
    }

    pub async fn list_presets(&self) -> Result<Vec<Preset>, AuthoringError> {
        Ok(load_presets(self.store.as_ref(), &self.settings).await?)
    }

    /// Replace the graph with the first preset named `name`. Nothing is saved.
    pub async fn load_preset(&mut self, name: &str) -> Result<(), AuthoringError> {
        let preset = load_presets(self.store.as_ref(), &self.settings)
            .await?
            .into_iter()
            .find(|preset| preset.name == name)
            .ok_or_else(|| StorageError::PresetNotFound(name.to_string()))?;
        self.graph = preset.dialogue;
        self.graph.normalize_with_speaker(&self.npc_name);
        self.node_positions = preset.node_positions;
        self.dirty = true;
        Ok(())
    }

    /// Remove the first preset named `name`.
    pub async fn delete_preset(&self, name: &str) -> Result<(), AuthoringError> {
        remove_preset(self.store.as_ref(), name, &self.settings).await?;
        Ok(())
    }

    /// Walk the current graph as the GM, without an actor.
    pub fn preview(&self, npc: Option<EntityId>) -> DialogueSession {
        DialogueSession::open_preview(self.graph.clone(), npc, self.settings.clone())
    }
}
