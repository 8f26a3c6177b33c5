//! Dice formulas like "1d20+5", "2d6-1" or "d100".

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("Empty dice formula")]
    Empty,
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// Largest modifier magnitude a parsed formula may carry.
pub const MAX_MODIFIER: i32 = 10_000;

/// A parsed dice formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    pub dice_count: u8,
    pub die_size: u16,
    pub modifier: i32,
}

impl DiceFormula {
    /// A single d20 plus a modifier, the shape of every ability and skill check.
    pub fn d20(modifier: i32) -> Self {
        Self {
            dice_count: 1,
            die_size: 20,
            modifier,
        }
    }

    /// Parse a formula string.
    ///
    /// Whitespace is ignored, so "1d20 + 3" and "1d20 + -1" are accepted as
    /// well as the compact "1d20+3" and the "d8" shorthand.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let count_str = &input[..d_pos];
        let dice_count: u8 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count_str))
            })?
        };
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let after_d = &input[d_pos + 1..];
        let bounded = |modifier: i32, shown: String| {
            if modifier.checked_abs().is_some_and(|m| m <= MAX_MODIFIER) {
                Ok(modifier)
            } else {
                Err(DiceParseError::InvalidFormat(format!("Modifier out of range: '{}'", shown)))
            }
        };
        let (size_str, modifier) = if let Some(plus) = after_d.find('+') {
            let mod_str = &after_d[plus + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus], bounded(modifier, format!("+{}", mod_str))?)
        } else if let Some(minus) = after_d.find('-') {
            let mod_str = &after_d[minus + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus], -bounded(modifier, format!("-{}", mod_str))?)
        } else {
            (after_d, 0)
        };

        let die_size: u16 = size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", size_str))
        })?;
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Roll the formula with the given random source.
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> DiceRoll {
        let rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| rng.gen_range(1..=i32::from(self.die_size)))
            .collect();
        let total = rolls
            .iter()
            .fold(self.modifier, |total, roll| total.saturating_add(*roll));
        DiceRoll {
            formula: self.clone(),
            rolls,
            total,
        }
    }

    pub fn min_roll(&self) -> i32 {
        i32::from(self.dice_count).saturating_add(self.modifier)
    }

    pub fn max_roll(&self) -> i32 {
        (i32::from(self.dice_count) * i32::from(self.die_size)).saturating_add(self.modifier)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{} + {}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{} - {}", self.dice_count, self.die_size, -m),
        }
    }
}

/// The outcome of rolling a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub formula: DiceFormula,
    pub rolls: Vec<i32>,
    pub total: i32,
}
