//! Component definitions for characters.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::mechanics::{Ability, ProficiencyLevel, Skill};

/// The six ability scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        let slot = match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        };
        *slot = value;
    }

    /// Modifier for a score: floor((score - 10) / 2).
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) - 10).div_euclid(2)
    }
}

/// Per-skill training.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SkillEntry {
    pub proficiency: ProficiencyLevel,
    /// Flat bonus from items, feats and the like.
    #[serde(default)]
    pub bonus: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkillComponent {
    pub entries: HashMap<Skill, SkillEntry>,
}

impl SkillComponent {
    pub fn entry(&self, skill: Skill) -> SkillEntry {
        self.entries.get(&skill).copied().unwrap_or_default()
    }
}

/// Item categories relevant to dialogue checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Spell,
    Weapon,
    Equipment,
    Consumable,
    Tool,
    Loot,
    #[serde(other)]
    Other,
}

/// An item (or spell) owned by a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub name: String,
    pub item_type: ItemType,
}

impl OwnedItem {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
        }
    }
}

/// Everything a character carries, spells included.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryComponent {
    pub items: Vec<OwnedItem>,
}

impl InventoryComponent {
    /// Case-insensitive name lookup, optionally restricted to one item type.
    pub fn find_ignore_case(&self, name: &str, item_type: Option<ItemType>) -> Option<&OwnedItem> {
        let name = name.to_lowercase();
        self.items.iter().find(|i| {
            item_type.map_or(true, |t| i.item_type == t) && i.name.to_lowercase() == name
        })
    }

    /// Exact name lookup.
    pub fn find_exact(&self, name: &str) -> Option<&OwnedItem> {
        self.items.iter().find(|i| i.name == name)
    }

    /// Remove the first item with exactly this name.
    pub fn remove_exact(&mut self, name: &str) -> Option<OwnedItem> {
        let index = self.items.iter().position(|i| i.name == name)?;
        Some(self.items.remove(index))
    }
}

/// Known languages, standard and free-text.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LanguageComponent {
    pub known: Vec<String>,
    /// Free-text custom languages, separated by commas or semicolons.
    #[serde(default)]
    pub custom: String,
}

impl LanguageComponent {
    /// All languages, lowercased, custom entries included.
    pub fn all(&self) -> Vec<String> {
        self.known
            .iter()
            .map(String::as_str)
            .chain(self.custom.split([',', ';']))
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// What this character remembers from past conversations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DialogueMemory {
    /// Facts marked by the `history` effect.
    pub history: BTreeSet<String>,
    /// Roll totals stored by the `roll` effect.
    pub vars: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier_rounds_down() {
        let scores = AbilityScores {
            strength: 18,
            dexterity: 14,
            constitution: 12,
            intelligence: 8,
            wisdom: 9,
            charisma: 16,
        };

        assert_eq!(scores.modifier(Ability::Strength), 4);
        assert_eq!(scores.modifier(Ability::Dexterity), 2);
        assert_eq!(scores.modifier(Ability::Constitution), 1);
        assert_eq!(scores.modifier(Ability::Intelligence), -1);
        assert_eq!(scores.modifier(Ability::Wisdom), -1);
        assert_eq!(scores.modifier(Ability::Charisma), 3);
    }

    #[test]
    fn test_inventory_lookups() {
        let mut inv = InventoryComponent::default();
        inv.items.push(OwnedItem::new("Rusty Key", ItemType::Loot));
        inv.items.push(OwnedItem::new("Fireball", ItemType::Spell));

        assert!(inv.find_ignore_case("rusty key", None).is_some());
        assert!(inv.find_ignore_case("fireball", Some(ItemType::Spell)).is_some());
        assert!(inv.find_ignore_case("rusty key", Some(ItemType::Spell)).is_none());
        assert!(inv.find_exact("rusty key").is_none());

        let removed = inv.remove_exact("Rusty Key");
        assert_eq!(removed.map(|i| i.name), Some("Rusty Key".to_string()));
        assert_eq!(inv.items.len(), 1);
    }

    #[test]
    fn test_languages_include_custom() {
        let langs = LanguageComponent {
            known: vec!["Common".into(), "Elvish".into()],
            custom: "Thieves' Cant; Druidic, ".into(),
        };
        let all = langs.all();
        assert_eq!(all, vec!["common", "elvish", "thieves' cant", "druidic"]);
    }

    #[test]
    fn test_unknown_item_type_deserializes_as_other() {
        let item: OwnedItem =
            serde_json::from_str(r#"{"name":"Lute","item_type":"instrument"}"#).unwrap();
        assert_eq!(item.item_type, ItemType::Other);
    }
}
