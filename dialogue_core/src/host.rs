//! Host collaborators.
//!
//! The dialogue core never rolls dice, tracks relationships or runs scripts
//! itself. It asks the host through these traits. [`DiceRoller`] and
//! [`FixedRandomizer`] are bundled randomizers; everything else is supplied
//! by the embedding application (or mocked in tests).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actor_rules::{DiceFormula, EntityId};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::graph::{NodeId, OptionId};

/// Failures reported by host collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{0} is unavailable")]
    Unavailable(String),

    #[error("invalid roll formula: {0}")]
    InvalidFormula(String),

    #[error("host call failed: {0}")]
    Failed(String),
}

/// A roll the host should perform and announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRequest {
    /// Dice formula, e.g. `1d20 + 3`.
    pub formula: String,
    /// Chat flavor text shown with the roll.
    pub flavor: String,
    /// Who the roll is announced as.
    pub speaker: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub formula: String,
    pub total: i32,
}

/// Source of dice rolls.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Randomizer: Send + Sync {
    async fn roll(&self, request: RollRequest) -> Result<RollOutcome, HostError>;
}

/// Rolls dice locally with the thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceRoller;

#[async_trait]
impl Randomizer for DiceRoller {
    async fn roll(&self, request: RollRequest) -> Result<RollOutcome, HostError> {
        let formula = DiceFormula::parse(&request.formula)
            .map_err(|e| HostError::InvalidFormula(format!("'{}': {}", request.formula, e)))?;
        let roll = formula.roll_with(&mut rand::thread_rng());
        tracing::debug!(formula = %formula, rolls = ?roll.rolls, total = roll.total, flavor = %request.flavor, "dice rolled");
        Ok(RollOutcome {
            formula: formula.to_string(),
            total: roll.total,
        })
    }
}

/// Deterministic randomizer: returns the given totals in order and repeats
/// the last one once they run out.
#[derive(Debug, Default)]
pub struct FixedRandomizer {
    totals: Vec<i32>,
    next: AtomicUsize,
}

impl FixedRandomizer {
    pub fn new(totals: impl IntoIterator<Item = i32>) -> Self {
        Self {
            totals: totals.into_iter().collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Number of rolls made so far.
    pub fn roll_count(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Randomizer for FixedRandomizer {
    async fn roll(&self, request: RollRequest) -> Result<RollOutcome, HostError> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let total = self
            .totals
            .get(index)
            .or_else(|| self.totals.last())
            .copied()
            .ok_or_else(|| HostError::Unavailable("fixed randomizer has no totals".into()))?;
        Ok(RollOutcome {
            formula: request.formula,
            total,
        })
    }
}

/// Relationship scores between an actor and an NPC.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RelationProvider: Send + Sync {
    fn relation(&self, actor: EntityId, npc: Option<EntityId>) -> Result<i64, HostError>;

    fn bump_relation(
        &self,
        actor: EntityId,
        npc: Option<EntityId>,
        delta: i64,
    ) -> Result<(), HostError>;
}

/// Context bag passed to a macro.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroContext {
    pub actor: Option<EntityId>,
    pub npc: Option<EntityId>,
    pub node: NodeId,
    pub option: OptionId,
    /// The effect's free-form `data` payload.
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroStatus {
    Executed,
    NotFound,
}

/// Runs named host macros.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MacroInvoker: Send + Sync {
    async fn invoke(&self, name: &str, context: MacroContext) -> Result<MacroStatus, HostError>;
}

/// The set of collaborators a traversal runs against.
#[derive(Clone)]
pub struct HostServices {
    pub randomizer: Arc<dyn Randomizer>,
    pub relations: Option<Arc<dyn RelationProvider>>,
    pub macros: Option<Arc<dyn MacroInvoker>>,
}

impl HostServices {
    pub fn new(randomizer: Arc<dyn Randomizer>) -> Self {
        Self {
            randomizer,
            relations: None,
            macros: None,
        }
    }

    pub fn with_relations(mut self, relations: Arc<dyn RelationProvider>) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_macros(mut self, macros: Arc<dyn MacroInvoker>) -> Self {
        self.macros = Some(macros);
        self
    }
}

impl Default for HostServices {
    fn default() -> Self {
        Self::new(Arc::new(DiceRoller))
    }
}
