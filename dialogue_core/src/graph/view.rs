//! Derived, read-only views of a graph for editor diagnostics.

use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{DialogueGraph, NodeId, Target};
use crate::results::Effect;

/// What an edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeTarget {
    Node(NodeId),
    /// A node id that does not exist in the graph.
    Missing(String),
    End,
    Trade,
    Combat,
}

/// One option drawn as an arrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: EdgeTarget,
    pub label: String,
}

impl DialogueGraph {
    /// One edge per option that leads somewhere.
    ///
    /// The option's `next` wins; when it is empty the target is inferred from
    /// the results: the first `goto`, otherwise the last trade, combat or end
    /// effect seen before it.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (id, node) in &self.nodes {
            for (index, option) in node.options.iter().enumerate() {
                let target = if option.next.is_none() {
                    infer_target(&option.results)
                } else {
                    Some(option.next.clone())
                };
                let to = match target {
                    Some(Target::Node(to)) if self.contains(to.as_str()) => EdgeTarget::Node(to),
                    Some(Target::Node(to)) => EdgeTarget::Missing(to.to_string()),
                    Some(Target::End) => EdgeTarget::End,
                    Some(Target::None) | None => {
                        match pseudo_target(&option.results) {
                            Some(pseudo) => pseudo,
                            None => continue,
                        }
                    }
                };
                let label = if option.label.is_empty() {
                    format!("O{}", index + 1)
                } else {
                    option.label.clone()
                };
                edges.push(Edge {
                    from: id.clone(),
                    to,
                    label,
                });
            }
        }
        edges
    }

    /// Nodes that cannot be reached from `start`.
    pub fn unreachable_nodes(&self) -> BTreeSet<NodeId> {
        let mut adjacency: HashMap<&NodeId, Vec<NodeId>> = HashMap::new();
        let edges = self.edges();
        for edge in &edges {
            if let EdgeTarget::Node(to) = &edge.to {
                adjacency.entry(&edge.from).or_default().push(to.clone());
            }
        }

        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut queue = VecDeque::new();
        if self.contains(self.start.as_str()) {
            seen.insert(self.start.clone());
            queue.push_back(self.start.clone());
        }
        while let Some(current) = queue.pop_front() {
            for next in adjacency.get(&current).into_iter().flatten() {
                if seen.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }

        self.nodes
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect()
    }
}

fn infer_target(results: &[crate::results::ResultEffect]) -> Option<Target> {
    results.iter().find_map(|r| match &r.effect {
        Effect::Goto(target) if !target.is_none() => Some(target.clone()),
        _ => None,
    })
}

fn pseudo_target(results: &[crate::results::ResultEffect]) -> Option<EdgeTarget> {
    let mut pseudo = None;
    for result in results {
        match result.effect {
            Effect::OpenTrade => pseudo = Some(EdgeTarget::Trade),
            Effect::StartCombat => pseudo = Some(EdgeTarget::Combat),
            Effect::Ends => pseudo = Some(EdgeTarget::End),
            _ => {}
        }
    }
    pseudo
}
