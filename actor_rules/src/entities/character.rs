//! Character definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    AbilityScores, DialogueMemory, EntityId, InventoryComponent, ItemType, LanguageComponent,
    OwnedItem, SkillComponent, SkillEntry,
};
use crate::mechanics::{Ability, ProficiencyLevel, Skill};
use crate::world_state::FlagStore;

/// A player character or NPC, as seen by dialogue checks and effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub race: String,

    pub abilities: AbilityScores,
    pub proficiency_bonus: i32,
    #[serde(default)]
    pub skills: SkillComponent,
    /// Tool name -> proficiency.
    #[serde(default)]
    pub tool_proficiencies: HashMap<String, ProficiencyLevel>,
    #[serde(default)]
    pub inventory: InventoryComponent,
    #[serde(default)]
    pub languages: LanguageComponent,

    #[serde(default)]
    pub flags: FlagStore,
    #[serde(default)]
    pub memory: DialogueMemory,
}

impl Character {
    /// Create a new character with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            race: String::new(),
            abilities: AbilityScores::default(),
            proficiency_bonus: 2,
            skills: SkillComponent::default(),
            tool_proficiencies: HashMap::new(),
            inventory: InventoryComponent::default(),
            languages: LanguageComponent::default(),
            flags: FlagStore::default(),
            memory: DialogueMemory::default(),
        }
    }

    pub fn with_race(mut self, race: impl Into<String>) -> Self {
        self.race = race.into();
        self
    }

    pub fn with_ability(mut self, ability: Ability, score: i32) -> Self {
        self.abilities.set(ability, score);
        self
    }

    pub fn with_skill(mut self, skill: Skill, proficiency: ProficiencyLevel) -> Self {
        self.skills.entries.entry(skill).or_default().proficiency = proficiency;
        self
    }

    pub fn with_item(mut self, name: impl Into<String>, item_type: ItemType) -> Self {
        self.inventory.items.push(OwnedItem::new(name, item_type));
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.known.push(language.into());
        self
    }

    /// Total bonus applied to a d20 roll for this skill.
    pub fn skill_total(&self, skill: Skill) -> i32 {
        let SkillEntry { proficiency, bonus } = self.skills.entry(skill);
        self.abilities.modifier(skill.ability()) + proficiency.apply(self.proficiency_bonus) + bonus
    }

    /// Passive score for a skill: `base + skill total`.
    pub fn passive_skill(&self, skill: Skill, base: i32) -> i32 {
        base + self.skill_total(skill)
    }

    /// Proficiency for a skill code or, failing that, a tool name.
    pub fn proficiency_in(&self, key: &str) -> ProficiencyLevel {
        if let Some(skill) = Skill::from_key(key) {
            return self.skills.entry(skill).proficiency;
        }
        let key = key.trim().to_lowercase();
        self.tool_proficiencies
            .iter()
            .find(|(tool, _)| tool.to_lowercase() == key)
            .map(|(_, level)| *level)
            .unwrap_or_default()
    }

    /// Whether the character knows at least one of the given languages.
    ///
    /// Matching is case-insensitive containment in either direction, so
    /// "elvish" matches "High Elvish" and vice versa.
    pub fn knows_any_language<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> bool {
        let known = self.languages.all();
        wanted
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .any(|w| known.iter().any(|k| k.contains(&w) || w.contains(k.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character() {
        let character = Character::new("Test Hero");
        assert_eq!(character.name, "Test Hero");
        assert!(character.race.is_empty());
        assert_eq!(character.proficiency_bonus, 2);
    }

    #[test]
    fn test_skill_total_and_passive() {
        let character = Character::new("Scout")
            .with_ability(Ability::Wisdom, 14)
            .with_skill(Skill::Perception, ProficiencyLevel::Proficient);

        assert_eq!(character.skill_total(Skill::Perception), 4);
        assert_eq!(character.passive_skill(Skill::Perception, 10), 14);
        assert_eq!(character.skill_total(Skill::Insight), 2);
    }

    #[test]
    fn test_proficiency_falls_back_to_tools() {
        let mut character = Character::new("Thief").with_skill(Skill::Stealth, ProficiencyLevel::Expertise);
        character
            .tool_proficiencies
            .insert("Thieves' Tools".into(), ProficiencyLevel::Proficient);

        assert_eq!(character.proficiency_in("ste"), ProficiencyLevel::Expertise);
        assert_eq!(character.proficiency_in("thieves' tools"), ProficiencyLevel::Proficient);
        assert_eq!(character.proficiency_in("arc"), ProficiencyLevel::None);
        assert_eq!(character.proficiency_in("lute"), ProficiencyLevel::None);
    }

    #[test]
    fn test_language_matching_both_directions() {
        let character = Character::new("Bard").with_language("High Elvish");
        assert!(character.knows_any_language(["dwarvish", "elvish"]));

        let character = Character::new("Bard").with_language("Elf");
        assert!(character.knows_any_language(["Elfish"]));
        assert!(!character.knows_any_language(["Orc", ""]));
    }
}
