//! Dialogue Graph - nodes, options and the rules that keep them consistent.
//!
//! Two invariants hold after [`DialogueGraph::normalize`] and
//! [`DialogueGraph::prune_dangling_targets`]:
//! - `start` names an existing node
//! - every option `next` and every `goto` result names an existing node or `END`
//!
//! Deletion and renaming maintain them on their own; bulk edits and loaded
//! documents are repaired by running both passes, which the save path always does.

mod node;
mod view;

pub use node::*;
pub use view::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::results::Effect;

/// Authoring errors. The graph is left unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("cannot delete the start node '{0}'")]
    CannotDeleteStart(NodeId),
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("node id must not be empty")]
    EmptyId,
    #[error("new id is the same as the old id '{0}'")]
    SameId(String),
    #[error("a node with id '{0}' already exists")]
    IdTaken(String),
    #[error("'{0}' is reserved for ending the dialogue")]
    ReservedId(String),
    #[error("option '{option}' not found on node '{node}'")]
    OptionNotFound { node: String, option: String },
}

/// A branching conversation owned by one NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraph {
    #[serde(default, deserialize_with = "node::null_default")]
    pub start: NodeId,
    #[serde(default, deserialize_with = "node::null_default")]
    pub nodes: BTreeMap<NodeId, DialogueNode>,
}

impl Default for DialogueGraph {
    fn default() -> Self {
        Self::new("")
    }
}

impl DialogueGraph {
    /// Create a graph holding a single empty `start` node.
    pub fn new(speaker: &str) -> Self {
        let mut graph = Self {
            start: NodeId::default(),
            nodes: BTreeMap::new(),
        };
        graph.normalize_with_speaker(speaker);
        graph
    }

    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut DialogueNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn start_node(&self) -> Option<&DialogueNode> {
        self.nodes.get(&self.start)
    }

    /// Repair structural problems. Idempotent.
    pub fn normalize(&mut self) {
        self.normalize_with_speaker("");
    }

    /// Repair structural problems, giving `speaker` to any synthesized start node.
    ///
    /// - each node's `id` is set to its key
    /// - options without an id get a fresh one
    /// - a missing or unknown `start` is pointed at the first node, or at a new
    ///   empty `start` node when the graph has none
    pub fn normalize_with_speaker(&mut self, speaker: &str) {
        for (key, node) in self.nodes.iter_mut() {
            if node.id != *key {
                tracing::debug!(node = %key, stale = %node.id, "syncing node id with its key");
                node.id = key.clone();
            }
            for index in 0..node.options.len() {
                if node.options[index].id.is_empty() {
                    let id = node.unused_option_id();
                    node.options[index].id = id;
                }
            }
        }

        if self.start.is_empty() || !self.nodes.contains_key(&self.start) {
            let promoted = self.nodes.keys().next().cloned();
            let start = promoted.unwrap_or_else(|| NodeId::new("start"));
            tracing::debug!(old = %self.start, new = %start, "repairing start node");
            self.start = start;
        }
        if !self.nodes.contains_key(&self.start) {
            let placeholder = DialogueNode::new(self.start.as_str()).with_speaker(speaker);
            self.nodes.insert(self.start.clone(), placeholder);
        }
    }

    /// Clear option targets and drop `goto` results that name missing nodes.
    ///
    /// `END` is never dangling. Returns the number of references removed.
    pub fn prune_dangling_targets(&mut self) -> usize {
        let live: HashSet<NodeId> = self.nodes.keys().cloned().collect();
        let is_live = |target: &Target| match target {
            Target::None => false,
            Target::End => true,
            Target::Node(id) => live.contains(id),
        };

        let mut pruned = 0;
        for node in self.nodes.values_mut() {
            for option in node.options.iter_mut() {
                if matches!(option.next, Target::Node(_)) && !is_live(&option.next) {
                    option.next = Target::None;
                    pruned += 1;
                }
                let before = option.results.len();
                option.results.retain(|result| match &result.effect {
                    Effect::Goto(target) => is_live(target),
                    _ => true,
                });
                pruned += before - option.results.len();
            }
        }

        if pruned > 0 {
            tracing::debug!(pruned, "pruned dangling dialogue targets");
        }
        pruned
    }

    /// Insert an empty node and return its id.
    ///
    /// With `id` the node takes that id, which must be free; without one a
    /// random id unique within this graph is generated.
    pub fn add_node(&mut self, id: Option<&str>) -> Result<NodeId, GraphError> {
        let id = match id {
            Some(requested) => {
                self.check_free_id(requested)?;
                NodeId::new(requested)
            }
            None => self.unused_node_id(),
        };
        self.nodes.insert(id.clone(), DialogueNode::new(id.as_str()));
        Ok(id)
    }

    /// Remove a node and every reference to it.
    pub fn delete_node(&mut self, id: &str) -> Result<DialogueNode, GraphError> {
        if self.start.as_str() == id {
            return Err(GraphError::CannotDeleteStart(self.start.clone()));
        }
        let removed = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;

        if !self.nodes.contains_key(&self.start) {
            self.normalize();
        }
        self.prune_dangling_targets();
        Ok(removed)
    }

    /// Move a node to a new id, rewriting `start`, every `next` and every `goto`.
    pub fn rename_node(&mut self, old_id: &str, new_id: &str) -> Result<(), GraphError> {
        if new_id.trim().is_empty() {
            return Err(GraphError::EmptyId);
        }
        if new_id == old_id {
            return Err(GraphError::SameId(old_id.to_string()));
        }
        if !self.nodes.contains_key(old_id) {
            return Err(GraphError::NodeNotFound(old_id.to_string()));
        }
        self.check_free_id(new_id)?;

        let new = NodeId::new(new_id);
        if let Some(mut node) = self.nodes.remove(old_id) {
            node.id = new.clone();
            self.nodes.insert(new.clone(), node);
        }
        if self.start.as_str() == old_id {
            self.start = new.clone();
        }

        let old = Target::node(old_id);
        for node in self.nodes.values_mut() {
            for option in node.options.iter_mut() {
                if option.next == old {
                    option.next = Target::Node(new.clone());
                }
                for result in option.results.iter_mut() {
                    if let Effect::Goto(target) = &mut result.effect {
                        if *target == old {
                            *target = Target::Node(new.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Make an existing node the entry point.
    pub fn set_start(&mut self, id: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        self.start = NodeId::new(id);
        Ok(())
    }

    /// Append a new option to a node and return its id.
    pub fn add_option(&mut self, node_id: &str) -> Result<OptionId, GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let id = node.unused_option_id();
        node.options.push(DialogueOption {
            id: id.clone(),
            label: "New Option".to_string(),
            ..Default::default()
        });
        Ok(id)
    }

    pub fn delete_option(
        &mut self,
        node_id: &str,
        option_id: &str,
    ) -> Result<DialogueOption, GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let index = node
            .options
            .iter()
            .position(|o| o.id.as_str() == option_id)
            .ok_or_else(|| GraphError::OptionNotFound {
                node: node_id.to_string(),
                option: option_id.to_string(),
            })?;
        Ok(node.options.remove(index))
    }

    pub fn option_mut(
        &mut self,
        node_id: &str,
        option_id: &str,
    ) -> Result<&mut DialogueOption, GraphError> {
        self.nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?
            .option_mut(option_id)
            .ok_or_else(|| GraphError::OptionNotFound {
                node: node_id.to_string(),
                option: option_id.to_string(),
            })
    }

    /// Point an option at a target, which must be `END`, empty or an existing node.
    pub fn connect(
        &mut self,
        node_id: &str,
        option_id: &str,
        target: Target,
    ) -> Result<(), GraphError> {
        if let Target::Node(id) = &target {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::NodeNotFound(id.to_string()));
            }
        }
        self.option_mut(node_id, option_id)?.next = target;
        Ok(())
    }

    /// Count option targets and `goto` results that name `id`.
    pub fn references_to(&self, id: &str) -> usize {
        let target = Target::node(id);
        self.nodes
            .values()
            .flat_map(|n| n.options.iter())
            .map(|o| {
                let gotos = o
                    .results
                    .iter()
                    .filter(|r| matches!(&r.effect, Effect::Goto(t) if *t == target))
                    .count();
                usize::from(o.next == target) + gotos
            })
            .sum()
    }

    fn check_free_id(&self, id: &str) -> Result<(), GraphError> {
        if id.trim().is_empty() {
            return Err(GraphError::EmptyId);
        }
        if is_end_sentinel(id) {
            return Err(GraphError::ReservedId(id.to_string()));
        }
        if self.nodes.contains_key(id) {
            return Err(GraphError::IdTaken(id.to_string()));
        }
        Ok(())
    }

    fn unused_node_id(&self) -> NodeId {
        loop {
            let id = random_id();
            if !self.nodes.contains_key(id.as_str()) {
                return NodeId::new(id);
            }
        }
    }
}
