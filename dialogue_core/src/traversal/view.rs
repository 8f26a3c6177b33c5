//! What a player sees of the current node.

use serde::Serialize;

use actor_rules::WorldState;

use super::{DialogueSession, TraversalError};
use crate::graph::{DialogueOption, NodeId, OptionId};
use crate::host::HostServices;
use crate::requirements::{describe, evaluate, evaluate_passive, explain_lock, EvalContext};

/// Lock reason shown for an option whose interactive check already failed.
pub const FAILED_CHECK_REASON: &str = "Failed check";

/// A presented option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: OptionId,
    pub label: String,
    pub locked: bool,
    pub lock_reason: Option<String>,
    /// Label of the requirement, if it has one.
    pub requirement_text: Option<String>,
    /// Choosing this option triggers a roll.
    pub needs_roll: bool,
}

/// The current node as presented to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub speaker: String,
    pub text: String,
    pub npc_name: String,
    pub actor_name: String,
    pub options: Vec<OptionView>,
}

impl DialogueSession {
    /// Present the current node. Hidden options whose passive check fails are
    /// left out entirely; everything else is shown, locked or not.
    pub fn render(&self, world: &WorldState, host: &HostServices) -> Result<NodeView, TraversalError> {
        let current = self.current().ok_or(TraversalError::SessionEnded)?;
        let node = self
            .graph
            .node(current.as_str())
            .ok_or_else(|| TraversalError::NodeMissing(current.clone()))?;
        let ctx = self.eval_context(world, host);

        let options = node
            .options
            .iter()
            .filter_map(|option| self.option_view(current, option, &ctx))
            .collect();

        Ok(NodeView {
            id: node.id.clone(),
            speaker: node.speaker.clone(),
            text: node.text.clone(),
            npc_name: ctx.npc.map(|c| c.name.clone()).unwrap_or_else(|| "NPC".into()),
            actor_name: ctx
                .actor
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Preview".into()),
            options,
        })
    }

    fn option_view(
        &self,
        node: &NodeId,
        option: &DialogueOption,
        ctx: &EvalContext<'_>,
    ) -> Option<OptionView> {
        if !self.is_visible(option, ctx) {
            return None;
        }
        let requirement = option.requirement.as_ref();
        let requirement_text = Some(describe(requirement)).filter(|text| !text.is_empty());

        if self.has_failed(node, &option.id) {
            return Some(OptionView {
                id: option.id.clone(),
                label: option.label.clone(),
                locked: true,
                lock_reason: Some(FAILED_CHECK_REASON.to_string()),
                requirement_text,
                needs_roll: false,
            });
        }

        let evaluation = evaluate(requirement, ctx);
        Some(OptionView {
            id: option.id.clone(),
            label: option.label.clone(),
            locked: !evaluation.ok,
            lock_reason: explain_lock(&evaluation),
            requirement_text,
            needs_roll: evaluation.needs_roll(),
        })
    }

    pub(super) fn is_visible(&self, option: &DialogueOption, ctx: &EvalContext<'_>) -> bool {
        match (&option.hidden, &option.requirement) {
            (true, Some(requirement)) => evaluate_passive(Some(requirement), ctx).ok,
            _ => true,
        }
    }
}
