//! Result effects attached to dialogue options, and the pipeline that runs them.
//!
//! Each effect carries a `runOn` gate (`always`, `pass`, `fail`) evaluated
//! against the option's interactive roll. Effects are stored as loose JSON
//! objects `{ type, key, value, data, on, runOn, dc, storeAs }`; unknown
//! types are kept verbatim and do nothing.

mod pipeline;

pub use pipeline::*;

use actor_rules::FlagValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::graph::Target;

/// When an effect runs relative to the option's interactive roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOn {
    #[default]
    Always,
    Pass,
    Fail,
}

impl RunOn {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pass" => RunOn::Pass,
            "fail" => RunOn::Fail,
            _ => RunOn::Always,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunOn::Always => "always",
            RunOn::Pass => "pass",
            RunOn::Fail => "fail",
        }
    }

    /// `rolled` is `None` when the option had no interactive check; then only
    /// `always` effects run.
    pub fn allows(&self, rolled: Option<bool>) -> bool {
        matches!(
            (self, rolled),
            (RunOn::Always, _) | (RunOn::Pass, Some(true)) | (RunOn::Fail, Some(false))
        )
    }
}

/// Whose flags a flag effect writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagTarget {
    #[default]
    Actor,
    Npc,
    User,
    Scene,
}

impl FlagTarget {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "npc" => FlagTarget::Npc,
            "user" => FlagTarget::User,
            "scene" => FlagTarget::Scene,
            _ => FlagTarget::Actor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagTarget::Actor => "actor",
            FlagTarget::Npc => "npc",
            FlagTarget::User => "user",
            FlagTarget::Scene => "scene",
        }
    }
}

/// What a `roll` effect rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollSource {
    Skill,
    Ability,
    #[default]
    Formula,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollSpec {
    pub source: RollSource,
    /// Skill or ability code, or a dice formula.
    pub value: String,
    pub dc: Option<i32>,
    /// Stores the total in the actor's dialogue variables.
    pub store_as: Option<String>,
}

impl RollSpec {
    pub fn formula(formula: impl Into<String>) -> Self {
        Self {
            source: RollSource::Formula,
            value: formula.into(),
            dc: None,
            store_as: None,
        }
    }

    pub fn skill(code: impl Into<String>) -> Self {
        Self {
            source: RollSource::Skill,
            ..Self::formula(code)
        }
    }

    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = Some(dc);
        self
    }

    pub fn store_as(mut self, name: impl Into<String>) -> Self {
        self.store_as = Some(name.into());
        self
    }
}

/// A single effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Goto(Target),
    /// Sets `scope.name`; an absent value sets `true`.
    SetFlag {
        key: String,
        value: Option<FlagValue>,
        on: FlagTarget,
    },
    UnsetFlag {
        key: String,
        on: FlagTarget,
    },
    /// Marks a fact in the actor's dialogue history.
    History(String),
    Macro {
        name: String,
        data: Value,
    },
    Roll(RollSpec),
    StartCombat,
    OpenTrade,
    /// Copies a named item from the NPC to the actor.
    GiveItem(String),
    /// Removes a named item from the actor.
    RemoveItem(String),
    GiveRelation(i64),
    Ends,
    /// Unrecognised effect, kept as loaded.
    Unknown(Value),
}

impl Effect {
    /// The document tag for this effect.
    pub fn type_name(&self) -> &str {
        match self {
            Effect::Goto(_) => "goto",
            Effect::SetFlag { .. } => "setFlag",
            Effect::UnsetFlag { .. } => "unsetFlag",
            Effect::History(_) => "history",
            Effect::Macro { .. } => "macro",
            Effect::Roll(_) => "roll",
            Effect::StartCombat => "startCombat",
            Effect::OpenTrade => "openTrade",
            Effect::GiveItem(_) => "giveItem",
            Effect::RemoveItem(_) => "removeItem",
            Effect::GiveRelation(_) => "giveRelation",
            Effect::Ends => "ends",
            Effect::Unknown(raw) => raw.get("type").and_then(Value::as_str).unwrap_or(""),
        }
    }

    /// Effects after which nothing else in the list runs.
    pub fn terminates(&self) -> bool {
        matches!(self, Effect::Ends | Effect::StartCombat)
    }

    /// Fields this kind reads from and writes to a stored object.
    fn fields(&self) -> &'static [&'static str] {
        match self {
            Effect::Goto(_)
            | Effect::History(_)
            | Effect::GiveItem(_)
            | Effect::RemoveItem(_)
            | Effect::GiveRelation(_) => &["value"],
            Effect::SetFlag { .. } => &["key", "value", "on"],
            Effect::UnsetFlag { .. } => &["key", "on"],
            Effect::Macro { .. } => &["value", "data"],
            Effect::Roll(_) => &["key", "value", "dc", "storeAs"],
            Effect::StartCombat | Effect::OpenTrade | Effect::Ends | Effect::Unknown(_) => &[],
        }
    }
}

/// An effect plus its roll gate.
///
/// Fields of a stored object that the effect does not use are kept and
/// written back unchanged.
#[derive(Debug, Clone)]
pub struct ResultEffect {
    pub effect: Effect,
    pub run_on: RunOn,
    extra: Map<String, Value>,
    run_on_stored: bool,
}

impl PartialEq for ResultEffect {
    fn eq(&self, other: &Self) -> bool {
        self.effect == other.effect && self.run_on == other.run_on && self.extra == other.extra
    }
}

impl ResultEffect {
    fn gated(effect: Effect, run_on: RunOn) -> Self {
        Self {
            effect,
            run_on,
            extra: Map::new(),
            run_on_stored: false,
        }
    }

    pub fn always(effect: Effect) -> Self {
        Self::gated(effect, RunOn::Always)
    }

    pub fn on_pass(effect: Effect) -> Self {
        Self::gated(effect, RunOn::Pass)
    }

    pub fn on_fail(effect: Effect) -> Self {
        Self::gated(effect, RunOn::Fail)
    }

    /// Build an effect from any JSON value without failing.
    pub fn from_json(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self::always(Effect::Unknown(raw.clone()));
        };
        let text = |field: &str| match map.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };
        let run_on = map
            .get("runOn")
            .and_then(Value::as_str)
            .map(RunOn::parse)
            .unwrap_or_default();
        let on = map
            .get("on")
            .and_then(Value::as_str)
            .map(FlagTarget::parse)
            .unwrap_or_default();

        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let effect = match kind.as_str() {
            "goto" => Effect::Goto(Target::from(text("value"))),
            "setflag" => Effect::SetFlag {
                key: text("key"),
                value: map.get("value").and_then(FlagValue::from_json),
                on,
            },
            "unsetflag" => Effect::UnsetFlag { key: text("key"), on },
            "history" => {
                let fact = text("value");
                Effect::History(if fact.is_empty() { "visited".into() } else { fact })
            }
            "macro" => Effect::Macro {
                name: text("value").trim().to_string(),
                data: map.get("data").cloned().unwrap_or(Value::Null),
            },
            "roll" => {
                let source = match text("key").to_lowercase().as_str() {
                    "skill" => RollSource::Skill,
                    "ability" => RollSource::Ability,
                    _ => RollSource::Formula,
                };
                let mut value = text("value");
                if value.is_empty() && source == RollSource::Formula {
                    value = "1d20".into();
                }
                Effect::Roll(RollSpec {
                    source,
                    value,
                    dc: map.get("dc").and_then(Value::as_f64).map(|dc| dc as i32),
                    store_as: map
                        .get("storeAs")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                })
            }
            "startcombat" | "startfight" => Effect::StartCombat,
            "opentrade" => Effect::OpenTrade,
            "giveitem" | "takeitem" => Effect::GiveItem(text("value")),
            "removeitem" => Effect::RemoveItem(text("value")),
            "giverelation" => Effect::GiveRelation(
                map.get("value")
                    .and_then(FlagValue::from_json)
                    .and_then(|v| v.as_f64())
                    .map(|v| v as i64)
                    .unwrap_or(0),
            ),
            "ends" => Effect::Ends,
            _ => Effect::Unknown(raw.clone()),
        };

        let extra = match &effect {
            Effect::Unknown(_) => Map::new(),
            effect => map
                .iter()
                .filter(|(field, _)| {
                    !matches!(field.as_str(), "type" | "runOn") && !effect.fields().contains(&field.as_str())
                })
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        };
        Self {
            effect,
            run_on,
            extra,
            run_on_stored: map.contains_key("runOn"),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut map = match &self.effect {
            Effect::Unknown(Value::Object(raw)) => raw.clone(),
            Effect::Unknown(_) => Map::new(),
            effect => {
                let mut map = self.extra.clone();
                map.insert("type".into(), Value::String(effect.type_name().to_string()));
                map
            }
        };
        let mut put = |field: &str, value: Value| {
            map.insert(field.to_string(), value);
        };
        match &self.effect {
            Effect::Goto(target) => put("value", Value::String(target.to_string())),
            Effect::SetFlag { key, value, on } => {
                put("key", Value::String(key.clone()));
                if let Some(value) = value {
                    put("value", value.to_json());
                }
                put("on", Value::String(on.as_str().into()));
            }
            Effect::UnsetFlag { key, on } => {
                put("key", Value::String(key.clone()));
                put("on", Value::String(on.as_str().into()));
            }
            Effect::History(fact) => put("value", Value::String(fact.clone())),
            Effect::Macro { name, data } => {
                put("value", Value::String(name.clone()));
                if !data.is_null() {
                    put("data", data.clone());
                }
            }
            Effect::Roll(spec) => {
                let key = match spec.source {
                    RollSource::Skill => "skill",
                    RollSource::Ability => "ability",
                    RollSource::Formula => "formula",
                };
                put("key", Value::String(key.into()));
                put("value", Value::String(spec.value.clone()));
                if let Some(dc) = spec.dc {
                    put("dc", Value::from(dc));
                }
                if let Some(name) = &spec.store_as {
                    put("storeAs", Value::String(name.clone()));
                }
            }
            Effect::GiveItem(name) | Effect::RemoveItem(name) => {
                put("value", Value::String(name.clone()))
            }
            Effect::GiveRelation(delta) => put("value", Value::from(*delta)),
            Effect::StartCombat | Effect::OpenTrade | Effect::Ends | Effect::Unknown(_) => {}
        }
        if self.run_on_stored || self.run_on != RunOn::Always {
            put("runOn", Value::String(self.run_on.as_str().into()));
        }
        Value::Object(map)
    }
}

impl Serialize for ResultEffect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultEffect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(ResultEffect::from_json(&value))
    }
}
