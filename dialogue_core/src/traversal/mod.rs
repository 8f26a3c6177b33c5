//! Traversal - walking a dialogue graph at runtime.
//!
//! A [`DialogueSession`] owns a graph for the duration of one conversation.
//! It is either on a node or ended. Choosing an option goes through two
//! phases so the roll can happen outside the session:
//!
//! 1. [`DialogueSession::begin_activation`] checks the option and reserves it
//! 2. the host rolls the interactive check, if any
//! 3. [`DialogueSession::complete_activation`] runs the effects and moves on
//!
//! [`DialogueSession::activate`] performs all three with the host randomizer.

mod view;

pub use view::*;

use std::collections::HashSet;

use actor_rules::{EntityId, WorldState};
use thiserror::Error;

use crate::config::DialogueSettings;
use crate::graph::{DialogueGraph, NodeId, OptionId, Target};
use crate::host::{HostError, HostServices};
use crate::requirements::{evaluate, explain_lock, EvalContext, InteractiveCheck};
use crate::results::{
    apply_results, finish_activation, resolve_interactive_check, ActivationOutcome, CheckOutcome,
    EffectContext,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("the dialogue has ended")]
    SessionEnded,

    #[error("dialogue prompts are disabled")]
    PromptsDisabled,

    #[error("node not found: {0}")]
    NodeMissing(NodeId),

    #[error("option not found: {0}")]
    OptionNotFound(String),

    #[error("{reason}")]
    OptionLocked { reason: String },

    #[error("another option is still being resolved")]
    ActivationInFlight,

    #[error("the activation is no longer pending")]
    StaleActivation,

    #[error("the roll outcome does not match the reserved check")]
    CheckMismatch,

    #[error("roll failed: {0}")]
    Roll(#[from] HostError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active { current: NodeId },
    Ended,
}

/// A reserved option, waiting for its roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    ticket: u64,
    pub node: NodeId,
    pub option: OptionId,
    /// The roll to make before completing, if the requirement asks for one.
    pub check: Option<InteractiveCheck>,
}

/// How the session moved after an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved(NodeId),
    Stayed,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub transition: Transition,
    pub outcome: ActivationOutcome,
}

/// One conversation between an actor and an NPC.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    graph: DialogueGraph,
    state: SessionState,
    actor: Option<EntityId>,
    npc: Option<EntityId>,
    failed_checks: HashSet<(NodeId, OptionId)>,
    pending: Option<u64>,
    next_ticket: u64,
    settings: DialogueSettings,
}

impl DialogueSession {
    /// Open a player session on the graph's start node.
    pub fn open(
        graph: DialogueGraph,
        actor: EntityId,
        npc: Option<EntityId>,
        settings: DialogueSettings,
    ) -> Result<Self, TraversalError> {
        if !settings.enable_prompts {
            return Err(TraversalError::PromptsDisabled);
        }
        Ok(Self::start(graph, Some(actor), npc, settings))
    }

    /// Open a GM preview without an actor. Actor-dependent requirements lock.
    pub fn open_preview(graph: DialogueGraph, npc: Option<EntityId>, settings: DialogueSettings) -> Self {
        Self::start(graph, None, npc, settings)
    }

    fn start(
        mut graph: DialogueGraph,
        actor: Option<EntityId>,
        npc: Option<EntityId>,
        settings: DialogueSettings,
    ) -> Self {
        graph.normalize();
        let current = graph.start.clone();
        tracing::debug!(start = %current, preview = actor.is_none(), "dialogue session opened");
        Self {
            graph,
            state: SessionState::Active { current },
            actor,
            npc,
            failed_checks: HashSet::new(),
            pending: None,
            next_ticket: 0,
            settings,
        }
    }

    pub fn graph(&self) -> &DialogueGraph {
        &self.graph
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current(&self) -> Option<&NodeId> {
        match &self.state {
            SessionState::Active { current } => Some(current),
            SessionState::Ended => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    pub fn is_preview(&self) -> bool {
        self.actor.is_none()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// End the session, discarding any pending activation.
    pub fn close(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("discarding pending activation on close");
        }
        self.state = SessionState::Ended;
    }

    pub(crate) fn has_failed(&self, node: &NodeId, option: &OptionId) -> bool {
        self.failed_checks.contains(&(node.clone(), option.clone()))
    }

    fn eval_context<'a>(&'a self, world: &'a WorldState, host: &'a HostServices) -> EvalContext<'a> {
        EvalContext::new(&world.user, &self.settings)
            .with_actor(self.actor.and_then(|id| world.get_character(id)))
            .with_npc(self.npc.and_then(|id| world.get_character(id)))
            .with_relations(host.relations.as_deref())
    }

    /// Check an option against fresh state and reserve it.
    pub fn begin_activation(
        &mut self,
        option_id: &str,
        world: &WorldState,
        host: &HostServices,
    ) -> Result<Activation, TraversalError> {
        let current = self.current().ok_or(TraversalError::SessionEnded)?.clone();
        if self.pending.is_some() {
            return Err(TraversalError::ActivationInFlight);
        }
        let node = self
            .graph
            .node(current.as_str())
            .ok_or_else(|| TraversalError::NodeMissing(current.clone()))?;
        let option = node
            .option(option_id)
            .ok_or_else(|| TraversalError::OptionNotFound(option_id.to_string()))?;

        let ctx = self.eval_context(world, host);
        if !self.is_visible(option, &ctx) {
            return Err(TraversalError::OptionNotFound(option_id.to_string()));
        }
        if self.has_failed(&current, &option.id) {
            return Err(TraversalError::OptionLocked {
                reason: FAILED_CHECK_REASON.to_string(),
            });
        }
        let evaluation = evaluate(option.requirement.as_ref(), &ctx);
        if let Some(reason) = explain_lock(&evaluation) {
            return Err(TraversalError::OptionLocked { reason });
        }

        let activation = Activation {
            ticket: self.next_ticket,
            node: current,
            option: option.id.clone(),
            check: evaluation.interactive_check,
        };
        self.pending = Some(activation.ticket);
        self.next_ticket += 1;
        Ok(activation)
    }

    /// Drop a pending activation without running anything.
    pub fn cancel_activation(&mut self) {
        self.pending = None;
    }

    /// Run the reserved option's effects and move on.
    ///
    /// `check` must be the outcome of `activation.check`, or `None` when the
    /// option needs no roll. A mismatch leaves the activation pending. A failed
    /// `check` locks the option for the rest of the session.
    pub async fn complete_activation(
        &mut self,
        activation: Activation,
        check: Option<CheckOutcome>,
        world: &mut WorldState,
        host: &HostServices,
    ) -> Result<Step, TraversalError> {
        if self.pending != Some(activation.ticket) {
            return Err(TraversalError::StaleActivation);
        }
        match (&activation.check, &check) {
            (None, None) => {}
            (Some(expected), Some(outcome)) if outcome.check == *expected => {}
            _ => {
                tracing::warn!(option = %activation.option, "roll outcome does not match the reserved check");
                return Err(TraversalError::CheckMismatch);
            }
        }
        self.pending = None;

        if check.as_ref().is_some_and(|c| !c.passed) {
            self.failed_checks
                .insert((activation.node.clone(), activation.option.clone()));
        }

        let option = self
            .graph
            .node(activation.node.as_str())
            .and_then(|node| node.option(activation.option.as_str()))
            .cloned()
            .ok_or_else(|| TraversalError::OptionNotFound(activation.option.to_string()))?;

        let rolled = check.as_ref().map(|c| c.passed);
        let mut ctx = EffectContext {
            world,
            actor: self.actor,
            npc: self.npc,
            host,
            node: &activation.node,
            option: &activation.option,
        };
        let effects = apply_results(&option.results, rolled, &mut ctx).await;
        let mut outcome = finish_activation(&option, check, effects);
        let transition = self.navigate(&mut outcome);
        Ok(Step {
            transition,
            outcome,
        })
    }

    /// Choose an option: check it, roll if needed, run its effects.
    ///
    /// A randomizer failure cancels the activation and leaves the option unlocked.
    pub async fn activate(
        &mut self,
        option_id: &str,
        world: &mut WorldState,
        host: &HostServices,
    ) -> Result<Step, TraversalError> {
        let activation = self.begin_activation(option_id, world, host)?;
        let check = match &activation.check {
            Some(check) => {
                let actor = self.actor.and_then(|id| world.get_character(id));
                match resolve_interactive_check(check, actor, host.randomizer.as_ref()).await {
                    Ok(outcome) => Some(outcome),
                    Err(error) => {
                        self.cancel_activation();
                        return Err(error.into());
                    }
                }
            }
            None => None,
        };
        self.complete_activation(activation, check, world, host).await
    }

    fn navigate(&mut self, outcome: &mut ActivationOutcome) -> Transition {
        match &outcome.next_node {
            Target::End => {
                tracing::debug!("dialogue ended");
                self.state = SessionState::Ended;
                Transition::Ended
            }
            Target::Node(id) if self.graph.contains(id.as_str()) => {
                tracing::debug!(node = %id, "dialogue moved");
                self.state = SessionState::Active { current: id.clone() };
                Transition::Moved(id.clone())
            }
            Target::Node(id) => {
                let message = format!("Next node not found: {}", id);
                tracing::warn!(%message, "dialogue navigation rejected");
                outcome.effects.warnings.push(message);
                Transition::Stayed
            }
            Target::None => Transition::Stayed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DialogueNode, DialogueOption};
    use crate::host::FixedRandomizer;
    use crate::requirements::{Check, CheckKind, RollKind};
    use crate::results::{Effect, ResultEffect, RollReport};
    use actor_rules::{Ability, Character, FlagKey, ItemType};
    use std::sync::Arc;

    struct Table {
        world: WorldState,
        actor: EntityId,
        npc: EntityId,
    }

    impl Table {
        fn new() -> Self {
            let mut world = WorldState::new();
            // Wisdom 14: passive perception 12.
            let actor = world.add_character(
                Character::new("Aria")
                    .with_ability(Ability::Wisdom, 14)
                    .with_ability(Ability::Strength, 14),
            );
            let npc = world.add_character(Character::new("Baron").with_item("Rusty Key", ItemType::Loot));
            Self { world, actor, npc }
        }

        fn session(&self, graph: DialogueGraph) -> DialogueSession {
            DialogueSession::open(graph, self.actor, Some(self.npc), DialogueSettings::default()).unwrap()
        }
    }

    fn host(totals: impl IntoIterator<Item = i32>) -> HostServices {
        HostServices::new(Arc::new(FixedRandomizer::new(totals)))
    }

    fn perception(dc: i64) -> Check {
        Check::new(CheckKind::Skill).key("prc").value(dc)
    }

    fn graph_with(options: Vec<DialogueOption>) -> DialogueGraph {
        let mut graph = DialogueGraph::new("Baron");
        graph.add_node(Some("hall")).unwrap();
        graph.add_node(Some("nodeFail")).unwrap();
        let start = graph.node_mut("start").unwrap();
        start.text = "Well met.".into();
        start.options = options;
        graph
    }

    #[test]
    fn test_open_starts_at_start_node() {
        let table = Table::new();
        let session = table.session(graph_with(vec![]));
        assert_eq!(session.current().map(NodeId::as_str), Some("start"));
        assert!(!session.is_preview());
    }

    #[test]
    fn test_open_refused_when_prompts_disabled() {
        let table = Table::new();
        let settings = DialogueSettings {
            enable_prompts: false,
            ..Default::default()
        };
        let result = DialogueSession::open(DialogueGraph::default(), table.actor, None, settings.clone());
        assert_eq!(result.err(), Some(TraversalError::PromptsDisabled));

        let preview = DialogueSession::open_preview(DialogueGraph::default(), None, settings);
        assert!(preview.is_preview());
    }

    #[test]
    fn test_render_locks_and_hides() {
        let table = Table::new();
        let graph = graph_with(vec![
            DialogueOption::new("plain", "Hello"),
            DialogueOption::new("key", "Unlock the door")
                .with_requirement(Check::new(CheckKind::Item).value("Golden Key")),
            DialogueOption::new("secret", "Notice the draft").hidden().with_requirement(perception(20)),
            DialogueOption::new("spot", "Spot the thief").hidden().with_requirement(perception(12)),
        ]);
        let session = table.session(graph);

        let view = session.render(&table.world, &host([])).unwrap();
        assert_eq!(view.text, "Well met.");
        assert_eq!(view.actor_name, "Aria");
        let ids: Vec<_> = view.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["plain", "key", "spot"]);

        let key = &view.options[1];
        assert!(key.locked);
        assert_eq!(key.lock_reason.as_deref(), Some("Requires item: Golden Key"));
        assert_eq!(key.requirement_text.as_deref(), Some("Has item: Golden Key"));

        let spot = &view.options[2];
        assert!(!spot.locked);
        assert!(spot.needs_roll);
        assert!(view.options[0].requirement_text.is_none());
    }

    #[tokio::test]
    async fn test_roll_gated_scenario_pass() {
        let mut table = Table::new();
        let graph = graph_with(vec![DialogueOption::new("look", "Look closer")
            .with_requirement(perception(15))
            .with_result(ResultEffect::on_pass(Effect::SetFlag {
                key: "quest.noticed".into(),
                value: None,
                on: Default::default(),
            }))
            .with_result(ResultEffect::on_fail(Effect::Goto(Target::node("nodeFail"))))]);
        let mut session = table.session(graph);

        let step = session.activate("look", &mut table.world, &host([18])).await.unwrap();
        assert_eq!(step.transition, Transition::Stayed);
        assert!(step.outcome.effects.warnings.is_empty());
        let actor = table.world.get_character(table.actor).unwrap();
        assert!(actor.flags.get(&FlagKey::parse("quest.noticed").unwrap()).is_some());

        // A passed check does not lock the option.
        let view = session.render(&table.world, &host([])).unwrap();
        assert!(!view.options[0].locked);
    }

    #[tokio::test]
    async fn test_roll_gated_scenario_fail_locks_option() {
        let mut table = Table::new();
        let mut graph = graph_with(vec![DialogueOption::new("look", "Look closer")
            .with_requirement(perception(15))
            .with_result(ResultEffect::on_pass(Effect::SetFlag {
                key: "quest.noticed".into(),
                value: None,
                on: Default::default(),
            }))
            .with_result(ResultEffect::on_fail(Effect::Goto(Target::node("nodeFail"))))]);
        graph
            .node_mut("nodeFail")
            .unwrap()
            .options
            .push(DialogueOption::new("back", "Try again").with_next("start"));
        let mut session = table.session(graph);
        let dice = Arc::new(FixedRandomizer::new([5, 20]));
        let host = HostServices::new(dice.clone());

        let step = session.activate("look", &mut table.world, &host).await.unwrap();
        assert_eq!(step.transition, Transition::Moved(NodeId::new("nodeFail")));
        assert!(table.world.get_character(table.actor).unwrap().flags.is_empty());

        session.activate("back", &mut table.world, &host).await.unwrap();
        let view = session.render(&table.world, &host).unwrap();
        assert!(view.options[0].locked);
        assert_eq!(view.options[0].lock_reason.as_deref(), Some("Failed check"));
        assert!(!view.options[0].needs_roll);

        let retry = session.activate("look", &mut table.world, &host).await;
        assert_eq!(
            retry.err(),
            Some(TraversalError::OptionLocked {
                reason: "Failed check".into()
            })
        );
        assert_eq!(dice.roll_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_check_without_target_stays() {
        let mut table = Table::new();
        let graph = graph_with(vec![
            DialogueOption::new("look", "Look closer").with_requirement(perception(15))
        ]);
        let mut session = table.session(graph);

        let step = session.activate("look", &mut table.world, &host([3])).await.unwrap();
        assert_eq!(step.transition, Transition::Stayed);
        assert_eq!(step.outcome.effects.warnings, vec!["Check failed.".to_string()]);
        assert_eq!(session.current().map(NodeId::as_str), Some("start"));
    }

    #[tokio::test]
    async fn test_ends_scenario() {
        let mut table = Table::new();
        let graph = graph_with(vec![DialogueOption::new("take", "Take the key")
            .with_next("hall")
            .with_result(ResultEffect::always(Effect::GiveItem("Rusty Key".into())))
            .with_result(ResultEffect::always(Effect::Ends))
            .with_result(ResultEffect::always(Effect::Goto(Target::node("hall"))))]);
        let mut session = table.session(graph);

        let step = session.activate("take", &mut table.world, &host([])).await.unwrap();
        assert_eq!(step.transition, Transition::Ended);
        assert!(session.is_ended());
        let actor = table.world.get_character(table.actor).unwrap();
        assert!(actor.inventory.find_exact("Rusty Key").is_some());

        let again = session.activate("take", &mut table.world, &host([])).await;
        assert_eq!(again.err(), Some(TraversalError::SessionEnded));
        assert_eq!(session.render(&table.world, &host([])).err(), Some(TraversalError::SessionEnded));
    }

    #[tokio::test]
    async fn test_end_sentinel_and_navigation() {
        let mut table = Table::new();
        let mut graph = graph_with(vec![DialogueOption::new("go", "To the hall").with_next("hall")]);
        graph
            .node_mut("hall")
            .unwrap()
            .options
            .push(DialogueOption::new("bye", "Farewell").with_next("end"));
        let mut session = table.session(graph);

        let step = session.activate("go", &mut table.world, &host([])).await.unwrap();
        assert_eq!(step.transition, Transition::Moved(NodeId::new("hall")));
        let step = session.activate("bye", &mut table.world, &host([])).await.unwrap();
        assert_eq!(step.transition, Transition::Ended);
    }

    #[tokio::test]
    async fn test_unknown_target_warns_and_stays() {
        let mut table = Table::new();
        let mut graph = graph_with(vec![DialogueOption::new("go", "Somewhere")]);
        // Bypass connect() to simulate a stale document.
        graph.node_mut("start").unwrap().options[0].next = Target::node("ghost");
        let mut session = table.session(graph);

        let step = session.activate("go", &mut table.world, &host([])).await.unwrap();
        assert_eq!(step.transition, Transition::Stayed);
        assert_eq!(step.outcome.effects.warnings, vec!["Next node not found: ghost".to_string()]);
        assert_eq!(session.current().map(NodeId::as_str), Some("start"));
    }

    #[tokio::test]
    async fn test_locked_and_hidden_options_are_rejected() {
        let mut table = Table::new();
        let graph = graph_with(vec![
            DialogueOption::new("key", "Unlock").with_requirement(Check::new(CheckKind::Item).value("Golden Key")),
            DialogueOption::new("secret", "Draft").hidden().with_requirement(perception(20)),
        ]);
        let mut session = table.session(graph);

        let locked = session.activate("key", &mut table.world, &host([])).await;
        assert_eq!(
            locked.err(),
            Some(TraversalError::OptionLocked {
                reason: "Requires item: Golden Key".into()
            })
        );
        let hidden = session.activate("secret", &mut table.world, &host([])).await;
        assert_eq!(hidden.err(), Some(TraversalError::OptionNotFound("secret".into())));
        let missing = session.activate("nope", &mut table.world, &host([])).await;
        assert_eq!(missing.err(), Some(TraversalError::OptionNotFound("nope".into())));
        assert!(!session.has_pending());
    }

    #[tokio::test]
    async fn test_two_phase_activation_blocks_double_activation() {
        let mut table = Table::new();
        let graph = graph_with(vec![
            DialogueOption::new("look", "Look").with_requirement(perception(10)),
            DialogueOption::new("plain", "Hello"),
        ]);
        let mut session = table.session(graph);
        let host = host([15]);

        let activation = session.begin_activation("look", &table.world, &host).unwrap();
        let check = activation.check.clone().unwrap();
        assert_eq!(check.kind, RollKind::Skill);
        assert_eq!(
            session.begin_activation("plain", &table.world, &host).err(),
            Some(TraversalError::ActivationInFlight)
        );

        let actor = table.world.get_character(table.actor);
        let outcome = resolve_interactive_check(&check, actor, host.randomizer.as_ref())
            .await
            .unwrap();
        let step = session
            .complete_activation(activation, Some(outcome), &mut table.world, &host)
            .await
            .unwrap();
        assert!(step.outcome.check.unwrap().passed);
        assert!(!session.has_pending());
    }

    #[tokio::test]
    async fn test_complete_requires_matching_check_outcome() {
        let mut table = Table::new();
        let graph = graph_with(vec![
            DialogueOption::new("climb", "Climb the wall")
                .with_requirement(perception(30))
                .with_result(ResultEffect::always(Effect::Goto(Target::node("hall")))),
            DialogueOption::new("plain", "Hello").with_next("hall"),
        ]);
        let mut session = table.session(graph);
        let host = host([]);

        let activation = session.begin_activation("climb", &table.world, &host).unwrap();
        let skipped = session
            .complete_activation(activation.clone(), None, &mut table.world, &host)
            .await;
        assert_eq!(skipped.err(), Some(TraversalError::CheckMismatch));
        assert!(session.has_pending());
        assert!(!session.has_failed(&activation.node, &activation.option));
        assert_eq!(session.current().map(NodeId::as_str), Some("start"));

        let forged = CheckOutcome {
            check: InteractiveCheck {
                kind: RollKind::Skill,
                key: "prc".into(),
                dc: 5,
            },
            report: RollReport {
                formula: "1d20".into(),
                total: 20,
                flavor: "Perception".into(),
                dc: Some(5),
                passed: Some(true),
            },
            passed: true,
        };
        let wrong_dc = session
            .complete_activation(activation, Some(forged.clone()), &mut table.world, &host)
            .await;
        assert_eq!(wrong_dc.err(), Some(TraversalError::CheckMismatch));
        session.cancel_activation();

        let activation = session.begin_activation("plain", &table.world, &host).unwrap();
        assert!(activation.check.is_none());
        let extra = session
            .complete_activation(activation.clone(), Some(forged), &mut table.world, &host)
            .await;
        assert_eq!(extra.err(), Some(TraversalError::CheckMismatch));

        let step = session
            .complete_activation(activation, None, &mut table.world, &host)
            .await
            .unwrap();
        assert_eq!(step.transition, Transition::Moved(NodeId::new("hall")));
    }

    #[tokio::test]
    async fn test_close_discards_pending_activation() {
        let mut table = Table::new();
        let graph = graph_with(vec![DialogueOption::new("look", "Look").with_requirement(perception(10))]);
        let mut session = table.session(graph);
        let host = host([15]);

        let activation = session.begin_activation("look", &table.world, &host).unwrap();
        session.close();
        assert!(session.is_ended());
        assert!(!session.has_pending());

        let result = session
            .complete_activation(activation, None, &mut table.world, &host)
            .await;
        assert_eq!(result.err(), Some(TraversalError::StaleActivation));
    }

    #[tokio::test]
    async fn test_randomizer_failure_does_not_lock() {
        let mut table = Table::new();
        let graph = graph_with(vec![DialogueOption::new("look", "Look").with_requirement(perception(10))]);
        let mut session = table.session(graph);

        let result = session.activate("look", &mut table.world, &host([])).await;
        assert!(matches!(result, Err(TraversalError::Roll(_))));
        assert!(!session.has_pending());

        let step = session.activate("look", &mut table.world, &host([12])).await.unwrap();
        assert!(step.outcome.check.unwrap().passed);
    }

    #[tokio::test]
    async fn test_preview_locks_actor_checks() {
        let mut world = WorldState::new();
        let graph = graph_with(vec![
            DialogueOption::new("strong", "Lift the gate")
                .with_requirement(Check::new(CheckKind::Ability).key("str").value(12)),
            DialogueOption::new("talk", "Talk").with_next("hall"),
        ]);
        let mut session = DialogueSession::open_preview(graph, None, DialogueSettings::default());

        let view = session.render(&world, &host([])).unwrap();
        assert_eq!(view.actor_name, "Preview");
        assert_eq!(view.options[0].lock_reason.as_deref(), Some("No actor selected"));

        let step = session.activate("talk", &mut world, &host([])).await.unwrap();
        assert_eq!(step.transition, Transition::Moved(NodeId::new("hall")));
    }

    #[test]
    fn test_open_normalizes_broken_graph() {
        let table = Table::new();
        let mut graph = DialogueGraph::default();
        graph.start = NodeId::new("missing");
        graph.nodes.insert(NodeId::new("only"), DialogueNode::new("only"));
        graph.nodes.remove("start");
        let session = table.session(graph);
        assert_eq!(session.current().map(NodeId::as_str), Some("only"));
    }
}
