//! Running an option's effects.
//!
//! Activation is two-phase: [`resolve_interactive_check`] performs the single
//! roll an interactive requirement asks for, then [`apply_results`] runs the
//! effect list gated on that outcome. [`activate_option`] chains both.

use actor_rules::{Ability, Character, DiceFormula, EntityId, FlagKey, FlagStore, FlagValue, Skill, WorldState};

use super::{Effect, FlagTarget, ResultEffect, RollSource, RollSpec};
use crate::graph::{DialogueOption, NodeId, OptionId, Target};
use crate::host::{HostError, HostServices, MacroContext, MacroStatus, Randomizer, RollRequest};
use crate::requirements::{check_bonus, InteractiveCheck, RollKind};

/// A roll made during activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollReport {
    pub formula: String,
    pub total: i32,
    pub flavor: String,
    pub dc: Option<i32>,
    /// `None` when the roll had no DC.
    pub passed: Option<bool>,
}

/// Result of an option's interactive check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub check: InteractiveCheck,
    pub report: RollReport,
    pub passed: bool,
}

/// Something the host application must do on the dialogue's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    StartCombat {
        actor: Option<EntityId>,
        npc: Option<EntityId>,
    },
    /// Open the NPC's sheet for trading.
    OpenTrade { npc: Option<EntityId> },
}

/// What running an effect list did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectsOutcome {
    /// Target of the last `goto` that ran.
    pub goto: Option<Target>,
    /// An `ends` or `startCombat` effect stopped the list.
    pub terminated: bool,
    /// Number of effects that passed their gate and ran.
    pub executed: usize,
    pub rolls: Vec<RollReport>,
    pub warnings: Vec<String>,
    pub requests: Vec<HostRequest>,
}

impl EffectsOutcome {
    fn warn(&mut self, message: String) {
        tracing::warn!(%message, "dialogue effect warning");
        self.warnings.push(message);
    }
}

/// Full result of activating an option.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationOutcome {
    /// Where to go: a node, `End`, or `None` to stay and re-render.
    pub next_node: Target,
    pub check: Option<CheckOutcome>,
    pub effects: EffectsOutcome,
}

impl ActivationOutcome {
    pub fn check_failed(&self) -> bool {
        self.check.as_ref().is_some_and(|c| !c.passed)
    }
}

/// Everything effects may read or write.
pub struct EffectContext<'a> {
    pub world: &'a mut WorldState,
    pub actor: Option<EntityId>,
    pub npc: Option<EntityId>,
    pub host: &'a HostServices,
    pub node: &'a NodeId,
    pub option: &'a OptionId,
}

impl EffectContext<'_> {
    fn actor(&self) -> Option<&Character> {
        self.actor.and_then(|id| self.world.get_character(id))
    }

    fn actor_mut(&mut self) -> Option<&mut Character> {
        let id = self.actor?;
        self.world.get_character_mut(id)
    }

    fn npc_mut(&mut self) -> Option<&mut Character> {
        let id = self.npc?;
        self.world.get_character_mut(id)
    }

    fn flags_mut(&mut self, on: FlagTarget) -> Option<&mut FlagStore> {
        match on {
            FlagTarget::Actor => self.actor_mut().map(|c| &mut c.flags),
            FlagTarget::Npc => self.npc_mut().map(|c| &mut c.flags),
            FlagTarget::User => Some(&mut self.world.user.flags),
            FlagTarget::Scene => Some(&mut self.world.scene.flags),
        }
    }
}

/// Roll an interactive check: `1d20 + skill total` or `1d20 + ability modifier`.
pub async fn resolve_interactive_check(
    check: &InteractiveCheck,
    actor: Option<&Character>,
    randomizer: &dyn Randomizer,
) -> Result<CheckOutcome, HostError> {
    let bonus = actor.map(|a| check_bonus(a, check)).unwrap_or(0);
    let label = match check.kind {
        RollKind::Skill => "Skill",
        RollKind::Ability => "Ability",
    };
    let request = RollRequest {
        formula: DiceFormula::d20(bonus).to_string(),
        flavor: format!(
            "Dialogue {} Check: {} vs DC {}",
            label,
            check.key.to_uppercase(),
            check.dc
        ),
        speaker: actor.map(|a| a.id),
    };
    let flavor = request.flavor.clone();
    let outcome = randomizer.roll(request).await?;
    let passed = outcome.total >= check.dc;
    tracing::debug!(key = %check.key, dc = check.dc, total = outcome.total, passed, "interactive check rolled");

    Ok(CheckOutcome {
        check: check.clone(),
        report: RollReport {
            formula: outcome.formula,
            total: outcome.total,
            flavor,
            dc: Some(check.dc),
            passed: Some(passed),
        },
        passed,
    })
}

/// Run `results` in order, honouring each effect's `runOn` gate.
///
/// `rolled` is the option's interactive check outcome, `None` if there was
/// none. Failures inside an effect become warnings and the list continues;
/// `ends` and `startCombat` stop it.
pub async fn apply_results(
    results: &[ResultEffect],
    rolled: Option<bool>,
    ctx: &mut EffectContext<'_>,
) -> EffectsOutcome {
    let mut outcome = EffectsOutcome::default();

    for result in results {
        if !result.run_on.allows(rolled) {
            continue;
        }
        outcome.executed += 1;

        match &result.effect {
            Effect::Goto(target) => {
                if !target.is_none() {
                    outcome.goto = Some(target.clone());
                }
            }
            Effect::SetFlag { key, value, on } => match FlagKey::parse(key) {
                Ok(flag) => match ctx.flags_mut(*on) {
                    Some(store) => {
                        store.set(&flag, value.clone().unwrap_or(FlagValue::Bool(true)));
                    }
                    None => outcome.warn(format!("No {} to set flag {} on", on.as_str(), key)),
                },
                Err(error) => outcome.warn(error.to_string()),
            },
            Effect::UnsetFlag { key, on } => match FlagKey::parse(key) {
                Ok(flag) => match ctx.flags_mut(*on) {
                    Some(store) => {
                        store.unset(&flag);
                    }
                    None => outcome.warn(format!("No {} to unset flag {} on", on.as_str(), key)),
                },
                Err(error) => outcome.warn(error.to_string()),
            },
            Effect::History(fact) => {
                match ctx.actor_mut() {
                    Some(actor) => {
                        actor.memory.history.insert(fact.clone());
                    }
                    None => outcome.warn(format!("No actor to remember '{}'", fact)),
                }
            }
            Effect::Macro { name, data } => run_macro(name, data, ctx, &mut outcome).await,
            Effect::Roll(spec) => run_roll(spec, ctx, &mut outcome).await,
            Effect::StartCombat => {
                outcome.requests.push(HostRequest::StartCombat {
                    actor: ctx.actor,
                    npc: ctx.npc,
                });
            }
            Effect::OpenTrade => outcome.requests.push(HostRequest::OpenTrade { npc: ctx.npc }),
            Effect::GiveItem(name) => {
                let item = ctx
                    .npc
                    .and_then(|id| ctx.world.get_character(id))
                    .and_then(|npc| npc.inventory.find_exact(name))
                    .cloned();
                let Some(item) = item else {
                    outcome.warn(format!("Item not found on NPC: {}", name));
                    continue;
                };
                match ctx.actor_mut() {
                    Some(actor) => actor.inventory.items.push(item),
                    None => outcome.warn(format!("No actor to receive {}", name)),
                }
            }
            Effect::RemoveItem(name) => {
                let removed = ctx
                    .actor_mut()
                    .and_then(|actor| actor.inventory.remove_exact(name));
                if removed.is_none() {
                    outcome.warn(format!("Item not found on actor: {}", name));
                }
            }
            Effect::GiveRelation(delta) => match (&ctx.host.relations, ctx.actor) {
                (Some(relations), Some(actor)) => {
                    if let Err(error) = relations.bump_relation(actor, ctx.npc, *delta) {
                        outcome.warn(format!("Result failed: {}", error));
                    }
                }
                (None, _) => outcome.warn("Relation system missing".to_string()),
                (_, None) => outcome.warn("No actor for relation change".to_string()),
            },
            Effect::Ends | Effect::Unknown(_) => {}
        }

        if result.effect.terminates() {
            outcome.terminated = true;
            break;
        }
    }

    outcome
}

async fn run_macro(name: &str, data: &serde_json::Value, ctx: &mut EffectContext<'_>, outcome: &mut EffectsOutcome) {
    let Some(macros) = &ctx.host.macros else {
        outcome.warn(format!("Macro not found: {}", name));
        return;
    };
    let context = MacroContext {
        actor: ctx.actor,
        npc: ctx.npc,
        node: ctx.node.clone(),
        option: ctx.option.clone(),
        data: data.clone(),
    };
    match macros.invoke(name, context).await {
        Ok(MacroStatus::Executed) => {}
        Ok(MacroStatus::NotFound) => outcome.warn(format!("Macro not found: {}", name)),
        Err(error) => outcome.warn(format!("Result failed: {}", error)),
    }
}

async fn run_roll(spec: &RollSpec, ctx: &mut EffectContext<'_>, outcome: &mut EffectsOutcome) {
    let formula = match spec.source {
        RollSource::Skill => {
            let bonus = Skill::from_key(&spec.value)
                .zip(ctx.actor())
                .map(|(skill, actor)| actor.skill_total(skill))
                .unwrap_or(0);
            DiceFormula::d20(bonus).to_string()
        }
        RollSource::Ability => {
            let bonus = Ability::from_key(&spec.value)
                .zip(ctx.actor())
                .map(|(ability, actor)| actor.abilities.modifier(ability))
                .unwrap_or(0);
            DiceFormula::d20(bonus).to_string()
        }
        RollSource::Formula => spec.value.clone(),
    };
    let request = RollRequest {
        formula,
        flavor: "Dialogue Check".to_string(),
        speaker: ctx.actor,
    };

    let rolled = match ctx.host.randomizer.roll(request).await {
        Ok(rolled) => rolled,
        Err(error) => {
            outcome.warn(format!("Result failed: {}", error));
            return;
        }
    };

    if let Some(name) = &spec.store_as {
        match ctx.actor_mut() {
            Some(actor) => {
                actor.memory.vars.insert(name.clone(), i64::from(rolled.total));
            }
            None => outcome.warn(format!("No actor to store roll '{}'", name)),
        }
    }

    outcome.rolls.push(RollReport {
        formula: rolled.formula,
        total: rolled.total,
        flavor: "Dialogue Check".to_string(),
        dc: spec.dc,
        passed: spec.dc.map(|dc| rolled.total >= dc),
    });
}

/// Pick the navigation target: termination first, then the last `goto`,
/// then the option's `next`.
pub fn resolve_next(option: &DialogueOption, effects: &EffectsOutcome) -> Target {
    if effects.terminated {
        return Target::End;
    }
    effects
        .goto
        .clone()
        .unwrap_or_else(|| option.next.clone())
}

/// Combine the phases into the final outcome.
pub fn finish_activation(
    option: &DialogueOption,
    check: Option<CheckOutcome>,
    mut effects: EffectsOutcome,
) -> ActivationOutcome {
    let next_node = resolve_next(option, &effects);
    let failed = check.as_ref().is_some_and(|c| !c.passed);
    if failed && next_node.is_none() {
        effects.warn("Check failed.".to_string());
    }
    ActivationOutcome {
        next_node,
        check,
        effects,
    }
}

/// Activate an option: roll its interactive check (if any) and run its effects.
pub async fn activate_option(
    option: &DialogueOption,
    interactive: Option<&InteractiveCheck>,
    ctx: &mut EffectContext<'_>,
) -> Result<ActivationOutcome, HostError> {
    let check = match interactive {
        Some(check) => {
            Some(resolve_interactive_check(check, ctx.actor(), ctx.host.randomizer.as_ref()).await?)
        }
        None => None,
    };
    let rolled = check.as_ref().map(|c| c.passed);
    let effects = apply_results(&option.results, rolled, ctx).await;
    Ok(finish_activation(option, check, effects))
}
