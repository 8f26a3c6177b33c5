//! Game mechanics: abilities, skills, proficiency levels and dice.

mod dice;

pub use dice::*;

use serde::{Deserialize, Serialize};

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Resolve an ability from its three-letter code or full name (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.code() == key || a.name() == key)
    }

    /// Three-letter code, e.g. `str`.
    pub fn code(&self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }
}

/// Skills, keyed by their conventional three-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    #[serde(rename = "acr")]
    Acrobatics,
    #[serde(rename = "ani")]
    AnimalHandling,
    #[serde(rename = "arc")]
    Arcana,
    #[serde(rename = "ath")]
    Athletics,
    #[serde(rename = "dec")]
    Deception,
    #[serde(rename = "his")]
    History,
    #[serde(rename = "ins")]
    Insight,
    #[serde(rename = "itm")]
    Intimidation,
    #[serde(rename = "inv")]
    Investigation,
    #[serde(rename = "med")]
    Medicine,
    #[serde(rename = "nat")]
    Nature,
    #[serde(rename = "prc")]
    Perception,
    #[serde(rename = "prf")]
    Performance,
    #[serde(rename = "per")]
    Persuasion,
    #[serde(rename = "rel")]
    Religion,
    #[serde(rename = "slt")]
    SleightOfHand,
    #[serde(rename = "ste")]
    Stealth,
    #[serde(rename = "sur")]
    Survival,
}

impl Skill {
    pub const ALL: [Skill; 18] = [
        Skill::Acrobatics,
        Skill::AnimalHandling,
        Skill::Arcana,
        Skill::Athletics,
        Skill::Deception,
        Skill::History,
        Skill::Insight,
        Skill::Intimidation,
        Skill::Investigation,
        Skill::Medicine,
        Skill::Nature,
        Skill::Perception,
        Skill::Performance,
        Skill::Persuasion,
        Skill::Religion,
        Skill::SleightOfHand,
        Skill::Stealth,
        Skill::Survival,
    ];

    /// Resolve a skill from its three-letter code (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.code() == key)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Skill::Acrobatics => "acr",
            Skill::AnimalHandling => "ani",
            Skill::Arcana => "arc",
            Skill::Athletics => "ath",
            Skill::Deception => "dec",
            Skill::History => "his",
            Skill::Insight => "ins",
            Skill::Intimidation => "itm",
            Skill::Investigation => "inv",
            Skill::Medicine => "med",
            Skill::Nature => "nat",
            Skill::Perception => "prc",
            Skill::Performance => "prf",
            Skill::Persuasion => "per",
            Skill::Religion => "rel",
            Skill::SleightOfHand => "slt",
            Skill::Stealth => "ste",
            Skill::Survival => "sur",
        }
    }

    /// The ability that governs this skill.
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }
}

/// How proficient a character is with a skill or tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    #[default]
    None,
    Half,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    /// Scale a proficiency bonus by this level (half proficiency rounds down).
    pub fn apply(&self, bonus: i32) -> i32 {
        match self {
            ProficiencyLevel::None => 0,
            ProficiencyLevel::Half => bonus.div_euclid(2),
            ProficiencyLevel::Proficient => bonus,
            ProficiencyLevel::Expertise => bonus * 2,
        }
    }

    pub fn is_proficient(&self) -> bool {
        *self != ProficiencyLevel::None
    }
}
