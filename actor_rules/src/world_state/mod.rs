//! World state: the characters, user and scene a dialogue can read and mark.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::entities::{Character, EntityId};

/// Flag value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FlagValue {
    /// Convert a JSON scalar; arrays, objects and null have no flag form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FlagValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(FlagValue::Int)
                .or_else(|| n.as_f64().map(FlagValue::Float)),
            serde_json::Value::String(s) => Some(FlagValue::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FlagValue::Bool(b) => serde_json::Value::Bool(*b),
            FlagValue::Int(i) => serde_json::Value::from(*i),
            FlagValue::Float(f) => serde_json::Value::from(*f),
            FlagValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Numeric reading; numeric strings are parsed, booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlagValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FlagValue::Int(i) => Some(*i as f64),
            FlagValue::Float(f) if !f.is_nan() => Some(*f),
            FlagValue::Float(_) => None,
            FlagValue::String(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Int(i) => *i != 0,
            FlagValue::Float(f) => *f != 0.0 && !f.is_nan(),
            FlagValue::String(s) => !s.is_empty(),
        }
    }

    /// Loose equality: numeric when both sides read as numbers, textual otherwise.
    pub fn loose_eq(&self, other: &FlagValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Strict equality: same kind and same value (integers and floats are both numbers).
    pub fn strict_eq(&self, other: &FlagValue) -> bool {
        match (self, other) {
            (FlagValue::Bool(a), FlagValue::Bool(b)) => a == b,
            (FlagValue::String(a), FlagValue::String(b)) => a == b,
            (FlagValue::Int(_) | FlagValue::Float(_), FlagValue::Int(_) | FlagValue::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => false,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Int(i) => write!(f, "{}", i),
            FlagValue::Float(x) => write!(f, "{}", x),
            FlagValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Int(value.into())
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagKeyError {
    #[error("flag key '{0}' must have the form 'scope.name'")]
    Malformed(String),
}

/// A namespaced flag key, written `scope.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagKey {
    pub scope: String,
    pub name: String,
}

impl FlagKey {
    pub fn parse(key: &str) -> Result<Self, FlagKeyError> {
        match key.trim().split_once('.') {
            Some((scope, name)) if !scope.is_empty() && !name.is_empty() => Ok(Self {
                scope: scope.to_string(),
                name: name.to_string(),
            }),
            _ => Err(FlagKeyError::Malformed(key.to_string())),
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// Persistent key-value flags, grouped by scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FlagStore {
    scopes: BTreeMap<String, BTreeMap<String, FlagValue>>,
}

impl FlagStore {
    pub fn get(&self, key: &FlagKey) -> Option<&FlagValue> {
        self.scopes.get(&key.scope)?.get(&key.name)
    }

    pub fn set(&mut self, key: &FlagKey, value: FlagValue) {
        self.scopes
            .entry(key.scope.clone())
            .or_default()
            .insert(key.name.clone(), value);
    }

    pub fn unset(&mut self, key: &FlagKey) -> Option<FlagValue> {
        let scope = self.scopes.get_mut(&key.scope)?;
        let removed = scope.remove(&key.name);
        if scope.is_empty() {
            self.scopes.remove(&key.scope);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// The user driving the session (player or game master).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserState {
    pub name: String,
    /// Elevated (game-master) privilege.
    pub is_gm: bool,
    #[serde(default)]
    pub flags: FlagStore,
}

/// The scene the conversation happens in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub flags: FlagStore,
}

/// Everything dialogue checks read and dialogue effects write.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldState {
    pub characters: HashMap<EntityId, Character>,
    pub user: UserState,
    pub scene: Scene,
}

impl WorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a character to the world.
    pub fn add_character(&mut self, character: Character) -> EntityId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn get_character(&self, id: EntityId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn get_character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }
}
