//! Requirements - boolean trees of checks that gate dialogue options.
//!
//! A requirement is either a combinator (`allOf`, `anyOf`, `not`) or a leaf
//! [`Check`] of one [`CheckKind`]. Documents are parsed leniently: anything
//! that is not recognisable becomes an [`CheckKind::Unknown`] leaf, which
//! evaluates as satisfied.

mod compare;
mod describe;
mod evaluate;

pub use compare::*;
pub use describe::*;
pub use evaluate::*;

use actor_rules::FlagValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Kinds of leaf checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Ability,
    Skill,
    Race,
    Language,
    Spell,
    Proficiency,
    Item,
    Flag,
    PreviousAction,
    Relation,
    GmOnly,
    /// Unrecognised `type` tag, kept verbatim.
    Unknown(String),
}

impl CheckKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "ability" => CheckKind::Ability,
            "skill" => CheckKind::Skill,
            "race" => CheckKind::Race,
            "language" => CheckKind::Language,
            "spell" => CheckKind::Spell,
            "proficiency" => CheckKind::Proficiency,
            "item" => CheckKind::Item,
            "flag" => CheckKind::Flag,
            "previousaction" => CheckKind::PreviousAction,
            "relation" => CheckKind::Relation,
            "gmonly" => CheckKind::GmOnly,
            _ => CheckKind::Unknown(raw.to_string()),
        }
    }

    /// The document tag for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            CheckKind::Ability => "ability",
            CheckKind::Skill => "skill",
            CheckKind::Race => "race",
            CheckKind::Language => "language",
            CheckKind::Spell => "spell",
            CheckKind::Proficiency => "proficiency",
            CheckKind::Item => "item",
            CheckKind::Flag => "flag",
            CheckKind::PreviousAction => "previousAction",
            CheckKind::Relation => "relation",
            CheckKind::GmOnly => "gmonly",
            CheckKind::Unknown(raw) => raw,
        }
    }

    /// Kinds that cannot be judged without an actor.
    pub fn needs_actor(&self, roll: bool) -> bool {
        match self {
            CheckKind::Ability => !roll,
            CheckKind::Race
            | CheckKind::Language
            | CheckKind::Spell
            | CheckKind::Proficiency
            | CheckKind::Item
            | CheckKind::Flag
            | CheckKind::PreviousAction
            | CheckKind::Relation => true,
            CheckKind::Skill | CheckKind::GmOnly | CheckKind::Unknown(_) => false,
        }
    }
}

/// A leaf check.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub kind: CheckKind,
    /// Attribute name: ability or skill code, `scope.name` for flags.
    pub key: String,
    /// Comparison operator; `>=` when absent (truthiness for flags).
    pub op: Option<CompareOp>,
    pub value: Option<FlagValue>,
    /// Resolve by an interactive roll instead of a static comparison.
    pub roll: bool,
    /// Custom failure message.
    pub note: Option<String>,
}

impl Check {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            key: String::new(),
            op: None,
            value: None,
            roll: false,
            note: None,
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn op(mut self, op: CompareOp) -> Self {
        self.op = Some(op);
        self
    }

    pub fn value(mut self, value: impl Into<FlagValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rolled(mut self) -> Self {
        self.roll = true;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// `value` as text, or `key` when the value is missing or empty.
    pub(crate) fn subject(&self) -> String {
        match &self.value {
            Some(value) if !value.to_string().is_empty() => value.to_string(),
            _ => self.key.clone(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .map(CheckKind::parse)
            .unwrap_or_else(|| CheckKind::Unknown(String::new()));
        let key = match map.get("key") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Self {
            kind,
            key,
            op: map
                .get("op")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(CompareOp::parse),
            value: map.get("value").and_then(FlagValue::from_json),
            roll: map.get("roll").and_then(Value::as_bool).unwrap_or(false),
            note: map
                .get("note")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(self.kind.as_str().to_string()));
        if !self.key.is_empty() {
            map.insert("key".into(), Value::String(self.key.clone()));
        }
        if let Some(op) = &self.op {
            map.insert("op".into(), Value::String(op.as_str().to_string()));
        }
        if let Some(value) = &self.value {
            map.insert("value".into(), value.to_json());
        }
        if self.roll {
            map.insert("roll".into(), Value::Bool(true));
        }
        if let Some(note) = &self.note {
            map.insert("note".into(), Value::String(note.clone()));
        }
        map
    }
}

/// A requirement expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    AllOf(Vec<Requirement>),
    AnyOf(Vec<Requirement>),
    Not(Box<Requirement>),
    Check(Check),
}

impl Requirement {
    pub fn all_of(children: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::AllOf(children.into_iter().collect())
    }

    pub fn any_of(children: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::AnyOf(children.into_iter().collect())
    }

    pub fn negate(inner: impl Into<Requirement>) -> Self {
        Requirement::Not(Box::new(inner.into()))
    }

    /// Build a requirement from any JSON value without failing.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Requirement::Check(Check::new(CheckKind::Unknown(String::new())));
        };
        if let Some(Value::Array(children)) = map.get("allOf") {
            return Requirement::AllOf(children.iter().map(Self::from_json).collect());
        }
        if let Some(Value::Array(children)) = map.get("anyOf") {
            return Requirement::AnyOf(children.iter().map(Self::from_json).collect());
        }
        match map.get("not") {
            Some(inner) if !inner.is_null() && inner != &Value::Bool(false) => {
                Requirement::Not(Box::new(Self::from_json(inner)))
            }
            _ => Requirement::Check(Check::from_map(map)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Requirement::AllOf(children) => {
                let mut map = Map::new();
                map.insert("allOf".into(), children.iter().map(Self::to_json).collect());
                Value::Object(map)
            }
            Requirement::AnyOf(children) => {
                let mut map = Map::new();
                map.insert("anyOf".into(), children.iter().map(Self::to_json).collect());
                Value::Object(map)
            }
            Requirement::Not(inner) => {
                let mut map = Map::new();
                map.insert("not".into(), inner.to_json());
                Value::Object(map)
            }
            Requirement::Check(check) => Value::Object(check.to_map()),
        }
    }
}

impl From<Check> for Requirement {
    fn from(check: Check) -> Self {
        Requirement::Check(check)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Requirement::from_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_leaf() {
        let req: Requirement = serde_json::from_value(json!({
            "type": "Skill", "key": "prc", "value": 15, "note": "Look closer"
        }))
        .unwrap();

        let Requirement::Check(check) = req else {
            panic!("expected a leaf");
        };
        assert_eq!(check.kind, CheckKind::Skill);
        assert_eq!(check.key, "prc");
        assert_eq!(check.value, Some(FlagValue::Int(15)));
        assert_eq!(check.note.as_deref(), Some("Look closer"));
        assert!(check.op.is_none());
    }

    #[test]
    fn test_parse_combinators() {
        let req: Requirement = serde_json::from_value(json!({
            "allOf": [
                {"type": "ability", "key": "str", "value": 12},
                {"anyOf": [{"type": "item", "value": "Key"}, {"not": {"type": "gmonly"}}]}
            ]
        }))
        .unwrap();

        let Requirement::AllOf(children) = &req else {
            panic!("expected allOf");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[1], Requirement::AnyOf(inner) if inner.len() == 2));
    }

    #[test]
    fn test_malformed_input_becomes_unknown_leaf() {
        for raw in [json!("nonsense"), json!(42), json!({"type": "teleport"}), json!({})] {
            let req: Requirement = serde_json::from_value(raw).unwrap();
            assert!(matches!(
                req,
                Requirement::Check(Check { kind: CheckKind::Unknown(_), .. })
            ));
        }
    }

    #[test]
    fn test_previous_action_tag_is_case_insensitive() {
        assert_eq!(CheckKind::parse("previousAction"), CheckKind::PreviousAction);
        assert_eq!(CheckKind::parse("PREVIOUSACTION"), CheckKind::PreviousAction);
        assert_eq!(CheckKind::PreviousAction.as_str(), "previousAction");
    }

    #[test]
    fn test_json_round_trip_keeps_fields() {
        let raw = json!({
            "anyOf": [
                {"type": "flag", "key": "quest.stage", "op": ">=", "value": 2},
                {"type": "ability", "key": "cha", "value": 14, "roll": true, "note": "Charm them"}
            ]
        });
        let req = Requirement::from_json(&raw);
        assert_eq!(req.to_json(), raw);
    }

    #[test]
    fn test_needs_actor() {
        assert!(CheckKind::Ability.needs_actor(false));
        assert!(!CheckKind::Ability.needs_actor(true));
        assert!(!CheckKind::Skill.needs_actor(false));
        assert!(CheckKind::Relation.needs_actor(false));
        assert!(!CheckKind::GmOnly.needs_actor(false));
    }
}
