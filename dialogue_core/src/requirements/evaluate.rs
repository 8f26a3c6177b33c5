//! Evaluating requirement trees against an actor.
//!
//! Evaluation is pure: it reads the actor, the NPC and the acting user, and
//! never fails. Bad data fails open, missing actors fail closed, and host
//! errors become a generic "Requirement error" reason.

use actor_rules::{Ability, Character, FlagKey, FlagValue, ItemType, Skill, UserState};

use super::{Check, CheckKind, CompareOp, Requirement};
use crate::config::DialogueSettings;
use crate::host::RelationProvider;

/// Which attribute an interactive check rolls against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollKind {
    Skill,
    Ability,
}

/// A check deferred to a live roll when the option is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveCheck {
    pub kind: RollKind,
    /// Lowercased skill or ability code.
    pub key: String,
    pub dc: i32,
}

/// Outcome of evaluating a requirement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub ok: bool,
    pub reasons: Vec<String>,
    pub interactive_check: Option<InteractiveCheck>,
}

impl Evaluation {
    pub fn pass() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reasons: vec![reason.into()],
            interactive_check: None,
        }
    }

    fn interactive(check: InteractiveCheck) -> Self {
        Self {
            ok: true,
            reasons: Vec::new(),
            interactive_check: Some(check),
        }
    }

    pub fn needs_roll(&self) -> bool {
        self.interactive_check.is_some()
    }
}

/// Human-readable lock reason, or `None` when the evaluation passed.
pub fn explain_lock(evaluation: &Evaluation) -> Option<String> {
    if evaluation.ok {
        return None;
    }
    if evaluation.reasons.is_empty() {
        return Some("Requirement not met".to_string());
    }
    Some(evaluation.reasons.join("; "))
}

/// Everything a requirement may look at.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub actor: Option<&'a Character>,
    pub npc: Option<&'a Character>,
    pub user: &'a UserState,
    pub relations: Option<&'a dyn RelationProvider>,
    pub settings: &'a DialogueSettings,
}

impl<'a> EvalContext<'a> {
    pub fn new(user: &'a UserState, settings: &'a DialogueSettings) -> Self {
        Self {
            actor: None,
            npc: None,
            user,
            relations: None,
            settings,
        }
    }

    pub fn with_actor(mut self, actor: Option<&'a Character>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_npc(mut self, npc: Option<&'a Character>) -> Self {
        self.npc = npc;
        self
    }

    pub fn with_relations(mut self, relations: Option<&'a dyn RelationProvider>) -> Self {
        self.relations = relations;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interactive,
    Passive,
}

/// Evaluate a requirement. Skill checks and rolled ability checks always pass
/// here and come back with an [`InteractiveCheck`] to roll at activation.
pub fn evaluate(requirement: Option<&Requirement>, ctx: &EvalContext<'_>) -> Evaluation {
    match requirement {
        None => Evaluation::pass(),
        Some(requirement) => eval_node(requirement, ctx, Mode::Interactive),
    }
}

/// Evaluate for hidden-option visibility: interactive checks are replaced by
/// a passive score (`passive_base + modifier`) compared against the DC.
pub fn evaluate_passive(requirement: Option<&Requirement>, ctx: &EvalContext<'_>) -> Evaluation {
    match requirement {
        None => Evaluation::pass(),
        Some(requirement) => eval_node(requirement, ctx, Mode::Passive),
    }
}

fn eval_node(requirement: &Requirement, ctx: &EvalContext<'_>, mode: Mode) -> Evaluation {
    match requirement {
        Requirement::AllOf(children) => {
            let parts: Vec<_> = children.iter().map(|c| eval_node(c, ctx, mode)).collect();
            let ok = parts.iter().all(|p| p.ok);
            let interactive_check = parts.iter().find_map(|p| p.interactive_check.clone());
            Evaluation {
                ok,
                reasons: if ok { Vec::new() } else { collect_reasons(&parts) },
                interactive_check,
            }
        }
        Requirement::AnyOf(children) => {
            let parts: Vec<_> = children.iter().map(|c| eval_node(c, ctx, mode)).collect();
            let ok = parts.iter().any(|p| p.ok);
            let statically_met = parts.iter().any(|p| p.ok && !p.needs_roll());
            let interactive_check = if statically_met {
                None
            } else {
                parts
                    .iter()
                    .filter(|p| p.ok)
                    .find_map(|p| p.interactive_check.clone())
            };
            Evaluation {
                ok,
                reasons: if ok { Vec::new() } else { collect_reasons(&parts) },
                interactive_check,
            }
        }
        Requirement::Not(inner) => {
            if eval_node(inner, ctx, mode).ok {
                let tag = match inner.as_ref() {
                    Requirement::Check(check) => check.kind.as_str().to_string(),
                    _ => "unknown".to_string(),
                };
                Evaluation::fail(format!("Must NOT satisfy: {}", tag))
            } else {
                Evaluation::pass()
            }
        }
        Requirement::Check(check) => {
            let evaluation = eval_check(check, ctx, mode);
            match (&check.note, evaluation.ok) {
                (Some(note), false) => Evaluation::fail(note.clone()),
                _ => evaluation,
            }
        }
    }
}

fn collect_reasons(parts: &[Evaluation]) -> Vec<String> {
    parts.iter().flat_map(|p| p.reasons.iter().cloned()).collect()
}

fn eval_check(check: &Check, ctx: &EvalContext<'_>, mode: Mode) -> Evaluation {
    let rolls = matches!(check.kind, CheckKind::Skill) || (check.kind == CheckKind::Ability && check.roll);

    let actor = match ctx.actor {
        Some(actor) => actor,
        None if check.kind.needs_actor(check.roll) || (rolls && mode == Mode::Passive) => {
            return Evaluation::fail("No actor selected");
        }
        None => {
            return match &check.kind {
                CheckKind::GmOnly => gm_only(ctx),
                _ if rolls => Evaluation::interactive(interactive_check(check, ctx)),
                _ => Evaluation::pass(),
            };
        }
    };

    if rolls {
        let wanted = interactive_check(check, ctx);
        return match mode {
            Mode::Interactive => Evaluation::interactive(wanted),
            Mode::Passive => passive(actor, &wanted, ctx),
        };
    }

    let value_text = check
        .value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let op = check.op.clone().unwrap_or_default();

    match &check.kind {
        CheckKind::Ability => {
            let score = Ability::from_key(&check.key)
                .map(|a| actor.abilities.score(a))
                .unwrap_or(0);
            let met = check
                .value
                .as_ref()
                .and_then(FlagValue::as_f64)
                .is_some_and(|wanted| op.compare_numbers(score as f64, wanted));
            pass_or(
                met,
                format!("Requires {} {} {}", check.key.to_uppercase(), op, value_text),
            )
        }
        CheckKind::Race => {
            let met = actor
                .race
                .to_lowercase()
                .contains(&value_text.to_lowercase());
            pass_or(met, format!("Requires race: {}", value_text))
        }
        CheckKind::Language => {
            let wanted: Vec<&str> = value_text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let met = wanted.is_empty() || actor.knows_any_language(wanted.iter().copied());
            pass_or(met, format!("Requires language: {}", value_text))
        }
        CheckKind::Spell => {
            let met = actor
                .inventory
                .find_ignore_case(&value_text, Some(ItemType::Spell))
                .is_some();
            pass_or(met, format!("Requires spell: {}", value_text))
        }
        CheckKind::Item => {
            let met = actor.inventory.find_ignore_case(&value_text, None).is_some();
            pass_or(met, format!("Requires item: {}", value_text))
        }
        CheckKind::Proficiency => {
            let subject = check.subject();
            let met = actor.proficiency_in(&subject).is_proficient();
            pass_or(met, format!("Requires proficiency: {}", subject))
        }
        CheckKind::Flag => {
            let current = FlagKey::parse(&check.key)
                .ok()
                .and_then(|key| actor.flags.get(&key));
            let (met, shown_op) = match (&check.op, &check.value) {
                (Some(op), value) => (
                    op.compare(current, value.as_ref().unwrap_or(&FlagValue::Bool(true))),
                    op.to_string(),
                ),
                (None, None) | (None, Some(FlagValue::Bool(true))) => {
                    (current.is_some_and(FlagValue::is_truthy), "==".to_string())
                }
                (None, Some(value)) => (CompareOp::Gte.compare(current, value), ">=".to_string()),
            };
            let shown_value = if value_text.is_empty() {
                "true".to_string()
            } else {
                value_text
            };
            pass_or(
                met,
                format!("Requires flag {} {} {}", check.key, shown_op, shown_value),
            )
        }
        CheckKind::PreviousAction => {
            let subject = check.subject();
            let met = actor.memory.history.contains(&subject);
            pass_or(met, format!("Requires prior: {}", subject))
        }
        CheckKind::Relation => relation(actor, check, &op, &value_text, ctx),
        CheckKind::GmOnly => gm_only(ctx),
        CheckKind::Skill | CheckKind::Unknown(_) => Evaluation::pass(),
    }
}

fn pass_or(met: bool, reason: String) -> Evaluation {
    if met {
        Evaluation::pass()
    } else {
        Evaluation::fail(reason)
    }
}

fn gm_only(ctx: &EvalContext<'_>) -> Evaluation {
    pass_or(ctx.user.is_gm, "GM only".to_string())
}

fn relation(
    actor: &Character,
    check: &Check,
    op: &CompareOp,
    value_text: &str,
    ctx: &EvalContext<'_>,
) -> Evaluation {
    let Some(provider) = ctx.relations else {
        return Evaluation::fail("Relation system missing");
    };
    match provider.relation(actor.id, ctx.npc.map(|npc| npc.id)) {
        Ok(score) => {
            let wanted = check.value.as_ref().and_then(FlagValue::as_f64).unwrap_or(0.0);
            pass_or(
                op.compare_numbers(score as f64, wanted),
                format!("Requires relation {} {}", op, value_text),
            )
        }
        Err(error) => {
            tracing::warn!(%error, "relation lookup failed during requirement check");
            Evaluation::fail("Requirement error")
        }
    }
}

fn interactive_check(check: &Check, ctx: &EvalContext<'_>) -> InteractiveCheck {
    let dc = check
        .value
        .as_ref()
        .and_then(FlagValue::as_f64)
        .map(|dc| dc as i32)
        .unwrap_or(ctx.settings.default_check_dc);
    InteractiveCheck {
        kind: if check.kind == CheckKind::Skill {
            RollKind::Skill
        } else {
            RollKind::Ability
        },
        key: check.key.trim().to_lowercase(),
        dc,
    }
}

/// Roll bonus for an interactive check: skill total or ability modifier.
pub fn check_bonus(actor: &Character, check: &InteractiveCheck) -> i32 {
    match check.kind {
        RollKind::Skill => Skill::from_key(&check.key)
            .map(|skill| actor.skill_total(skill))
            .unwrap_or(0),
        RollKind::Ability => Ability::from_key(&check.key)
            .map(|ability| actor.abilities.modifier(ability))
            .unwrap_or(0),
    }
}

fn passive(actor: &Character, check: &InteractiveCheck, ctx: &EvalContext<'_>) -> Evaluation {
    let score = ctx.settings.passive_base + check_bonus(actor, check);
    pass_or(
        score >= check.dc,
        format!("Requires passive {} {}", check.key.to_uppercase(), check.dc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, MockRelationProvider};
    use actor_rules::ProficiencyLevel;

    fn hero() -> Character {
        Character::new("Aria")
            .with_race("High Elf")
            .with_ability(Ability::Strength, 14)
            .with_ability(Ability::Wisdom, 14)
            .with_skill(Skill::Perception, ProficiencyLevel::None)
            .with_item("Rusty Key", ItemType::Loot)
            .with_item("Fireball", ItemType::Spell)
            .with_language("Common")
            .with_language("Elvish")
    }

    fn ability(key: &str, value: i64) -> Requirement {
        Check::new(CheckKind::Ability).key(key).value(value).into()
    }

    fn item(name: &str) -> Requirement {
        Check::new(CheckKind::Item).value(name).into()
    }

    #[test]
    fn test_absent_requirement_passes() {
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings);
        assert!(evaluate(None, &ctx).ok);
        assert!(evaluate_passive(None, &ctx).ok);
    }

    #[test]
    fn test_all_of_reports_only_failing_reasons() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let req = Requirement::all_of([ability("str", 12), item("Golden Key")]);
        let result = evaluate(Some(&req), &ctx);
        assert!(!result.ok);
        assert_eq!(result.reasons, vec!["Requires item: Golden Key".to_string()]);

        let req = Requirement::any_of([ability("str", 12), item("Golden Key")]);
        let result = evaluate(Some(&req), &ctx);
        assert!(result.ok);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_any_of_all_failing_unions_reasons() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let req = Requirement::any_of([ability("str", 18), item("Golden Key")]);
        let result = evaluate(Some(&req), &ctx);
        assert!(!result.ok);
        assert_eq!(
            result.reasons,
            vec!["Requires STR >= 18".to_string(), "Requires item: Golden Key".to_string()]
        );
        assert_eq!(
            explain_lock(&result).as_deref(),
            Some("Requires STR >= 18; Requires item: Golden Key")
        );
    }

    #[test]
    fn test_not_combinator() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let result = evaluate(Some(&Requirement::negate(item("Golden Key"))), &ctx);
        assert!(result.ok);
        assert!(result.reasons.is_empty());

        let result = evaluate(Some(&Requirement::negate(item("Rusty Key"))), &ctx);
        assert!(!result.ok);
        assert_eq!(result.reasons, vec!["Must NOT satisfy: item".to_string()]);
    }

    #[test]
    fn test_skill_check_always_ok_and_interactive() {
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let req: Requirement = Check::new(CheckKind::Skill).key("PRC").value(15).into();

        for actor in [None, Some(hero())] {
            let ctx = EvalContext::new(&user, &settings).with_actor(actor.as_ref());
            let result = evaluate(Some(&req), &ctx);
            assert!(result.ok);
            assert_eq!(
                result.interactive_check,
                Some(InteractiveCheck {
                    kind: RollKind::Skill,
                    key: "prc".into(),
                    dc: 15
                })
            );
        }
    }

    #[test]
    fn test_missing_dc_uses_default() {
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings);
        let req: Requirement = Check::new(CheckKind::Ability).key("cha").rolled().into();
        let check = evaluate(Some(&req), &ctx).interactive_check.unwrap();
        assert_eq!(check.kind, RollKind::Ability);
        assert_eq!(check.dc, settings.default_check_dc);
    }

    #[test]
    fn test_actor_dependent_checks_fail_without_actor() {
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings);

        for kind in [
            CheckKind::Ability,
            CheckKind::Race,
            CheckKind::Language,
            CheckKind::Spell,
            CheckKind::Proficiency,
            CheckKind::Item,
            CheckKind::Flag,
            CheckKind::PreviousAction,
            CheckKind::Relation,
        ] {
            let req: Requirement = Check::new(kind.clone()).key("x").value("y").into();
            let result = evaluate(Some(&req), &ctx);
            assert!(!result.ok, "{:?} should fail without an actor", kind);
            assert_eq!(result.reasons, vec!["No actor selected".to_string()]);
        }
    }

    #[test]
    fn test_note_replaces_reason() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let req: Requirement = Check::new(CheckKind::Race)
            .value("Dwarf")
            .note("Only dwarves may pass")
            .into();
        let result = evaluate(Some(&req), &ctx);
        assert_eq!(result.reasons, vec!["Only dwarves may pass".to_string()]);
    }

    #[test]
    fn test_race_language_spell_item() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));
        let ok = |req: Requirement| evaluate(Some(&req), &ctx).ok;

        assert!(ok(Check::new(CheckKind::Race).value("elf").into()));
        assert!(!ok(Check::new(CheckKind::Race).value("orc").into()));
        assert!(ok(Check::new(CheckKind::Language).value("Dwarvish, elvish").into()));
        assert!(!ok(Check::new(CheckKind::Language).value("Draconic").into()));
        assert!(ok(Check::new(CheckKind::Spell).value("fireball").into()));
        assert!(!ok(Check::new(CheckKind::Spell).value("Rusty Key").into()));
        assert!(ok(item("rusty key")));
    }

    #[test]
    fn test_proficiency_and_previous_action() {
        let mut actor = hero().with_skill(Skill::Stealth, ProficiencyLevel::Proficient);
        actor.memory.history.insert("met_baron".into());
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));
        let ok = |req: Requirement| evaluate(Some(&req), &ctx).ok;

        assert!(ok(Check::new(CheckKind::Proficiency).value("ste").into()));
        assert!(ok(Check::new(CheckKind::Proficiency).key("ste").into()));
        assert!(!ok(Check::new(CheckKind::Proficiency).value("prc").into()));
        assert!(ok(Check::new(CheckKind::PreviousAction).value("met_baron").into()));
        assert!(!ok(Check::new(CheckKind::PreviousAction).value("met_king").into()));
    }

    #[test]
    fn test_flag_checks() {
        let mut actor = hero();
        actor.flags.set(&FlagKey::parse("quest.stage").unwrap(), FlagValue::Int(2));
        actor.flags.set(&FlagKey::parse("quest.started").unwrap(), FlagValue::Bool(true));
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));
        let ok = |req: Requirement| evaluate(Some(&req), &ctx).ok;

        assert!(ok(Check::new(CheckKind::Flag).key("quest.started").into()));
        assert!(!ok(Check::new(CheckKind::Flag).key("quest.finished").into()));
        assert!(ok(Check::new(CheckKind::Flag).key("quest.stage").value(2).into()));
        assert!(ok(Check::new(CheckKind::Flag)
            .key("quest.stage")
            .op(CompareOp::Gte)
            .value(1)
            .into()));
        assert!(!ok(Check::new(CheckKind::Flag)
            .key("quest.stage")
            .op(CompareOp::Gt)
            .value(2)
            .into()));
        assert!(!ok(Check::new(CheckKind::Flag).key("malformed").into()));
    }

    #[test]
    fn test_flag_value_without_op_compares_at_least() {
        let mut actor = hero();
        actor.flags.set(&FlagKey::parse("quest.stage").unwrap(), FlagValue::Int(3));
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let reached: Requirement = Check::new(CheckKind::Flag).key("quest.stage").value(2).into();
        assert!(evaluate(Some(&reached), &ctx).ok);

        let ahead: Requirement = Check::new(CheckKind::Flag).key("quest.stage").value(4).into();
        assert_eq!(
            evaluate(Some(&ahead), &ctx).reasons,
            vec!["Requires flag quest.stage >= 4".to_string()]
        );
    }

    #[test]
    fn test_relation_without_provider_fails() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));
        let req: Requirement = Check::new(CheckKind::Relation).value(5).into();

        let result = evaluate(Some(&req), &ctx);
        assert!(!result.ok);
        assert_eq!(result.reasons, vec!["Relation system missing".to_string()]);
    }

    #[test]
    fn test_relation_with_provider() {
        let actor = hero();
        let npc = Character::new("Baron");
        let npc_id = npc.id;
        let user = UserState::default();
        let settings = DialogueSettings::default();

        let mut provider = MockRelationProvider::new();
        provider
            .expect_relation()
            .withf(move |_, n| *n == Some(npc_id))
            .returning(|_, _| Ok(7));
        let ctx = EvalContext::new(&user, &settings)
            .with_actor(Some(&actor))
            .with_npc(Some(&npc))
            .with_relations(Some(&provider));

        let req: Requirement = Check::new(CheckKind::Relation).value(5).into();
        assert!(evaluate(Some(&req), &ctx).ok);
        let req: Requirement = Check::new(CheckKind::Relation).value(10).into();
        assert_eq!(
            evaluate(Some(&req), &ctx).reasons,
            vec!["Requires relation >= 10".to_string()]
        );
    }

    #[test]
    fn test_relation_provider_error_is_requirement_error() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let mut provider = MockRelationProvider::new();
        provider
            .expect_relation()
            .returning(|_, _| Err(HostError::Unavailable("relations".into())));
        let ctx = EvalContext::new(&user, &settings)
            .with_actor(Some(&actor))
            .with_relations(Some(&provider));

        let req: Requirement = Check::new(CheckKind::Relation).value(1).into();
        let result = evaluate(Some(&req), &ctx);
        assert_eq!(result.reasons, vec!["Requirement error".to_string()]);
    }

    #[test]
    fn test_gm_only() {
        let settings = DialogueSettings::default();
        let player = UserState::default();
        let gm = UserState {
            is_gm: true,
            ..Default::default()
        };
        let req: Requirement = Check::new(CheckKind::GmOnly).into();

        assert!(!evaluate(Some(&req), &EvalContext::new(&player, &settings)).ok);
        assert!(evaluate(Some(&req), &EvalContext::new(&gm, &settings)).ok);
    }

    #[test]
    fn test_unknown_kind_fails_open() {
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings);
        let req = Requirement::from_json(&serde_json::json!({"type": "horoscope"}));
        assert!(evaluate(Some(&req), &ctx).ok);
    }

    #[test]
    fn test_passive_hides_hard_checks() {
        // Wisdom 14 gives +2, so passive perception is 12.
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));

        let hard: Requirement = Check::new(CheckKind::Skill).key("prc").value(20).into();
        let easy: Requirement = Check::new(CheckKind::Skill).key("prc").value(12).into();
        assert!(!evaluate_passive(Some(&hard), &ctx).ok);
        assert!(evaluate_passive(Some(&easy), &ctx).ok);
        assert!(evaluate_passive(Some(&easy), &ctx).interactive_check.is_none());

        let preview = EvalContext::new(&user, &settings);
        assert!(!evaluate_passive(Some(&easy), &preview).ok);
    }

    #[test]
    fn test_interactive_check_propagation() {
        let actor = hero();
        let user = UserState::default();
        let settings = DialogueSettings::default();
        let ctx = EvalContext::new(&user, &settings).with_actor(Some(&actor));
        let skill: Requirement = Check::new(CheckKind::Skill).key("ins").value(12).into();

        let all = Requirement::all_of([ability("str", 10), skill.clone()]);
        assert!(evaluate(Some(&all), &ctx).needs_roll());

        let any = Requirement::any_of([ability("str", 10), skill.clone()]);
        assert!(!evaluate(Some(&any), &ctx).needs_roll());

        let any = Requirement::any_of([ability("str", 20), skill.clone()]);
        assert!(evaluate(Some(&any), &ctx).needs_roll());

        let not = Requirement::negate(skill);
        assert!(!evaluate(Some(&not), &ctx).needs_roll());
    }

    #[test]
    fn test_explain_lock_default() {
        assert_eq!(explain_lock(&Evaluation::pass()), None);
        let silent = Evaluation {
            ok: false,
            ..Default::default()
        };
        assert_eq!(explain_lock(&silent).as_deref(), Some("Requirement not met"));
    }
}
