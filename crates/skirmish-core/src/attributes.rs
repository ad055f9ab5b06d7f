//! Attribute providers.
//!
//! The rules engine never owns character or monster data. It pulls what it
//! needs through [`AttributeProvider`], which the character subsystem and the
//! bestiary implement differently:
//!
//! - [`CharacterSheet`]: proficiency from level, armor class from worn equipment
//! - [`MonsterStatBlock`]: proficiency from challenge rating, fixed armor class
//! - [`Attributes`]: the plain snapshot a [`Combatant`](crate::Combatant) carries
//!   into a fight
//!
//! # Example
//!
//! ```
//! use skirmish_core::{Ability, AttributeProvider, MonsterStatBlock};
//!
//! let goblin = MonsterStatBlock::goblin();
//! assert_eq!(goblin.proficiency_bonus(), 2);
//! assert_eq!(goblin.modifier(Ability::Dexterity), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ability::{ability_modifier, Ability, AbilityScores, Proficiency, Skill};
use crate::combatant::{AttackProfile, Combatant, CombatantId};

/// Read-only view of a creature's rules-relevant numbers.
pub trait AttributeProvider {
    /// Raw score for an ability.
    fn ability_score(&self, ability: Ability) -> i32;

    /// Proficiency bonus.
    fn proficiency_bonus(&self) -> i32;

    /// Training in a skill.
    fn skill_proficiency(&self, skill: Skill) -> Proficiency;

    /// Whether saves with this ability add proficiency.
    fn save_proficiency(&self, ability: Ability) -> bool;

    /// Armor class before condition bonuses.
    fn armor_class(&self) -> i32;

    /// Modifier for an ability.
    fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.ability_score(ability))
    }
}

// =============================================================================
// Attributes (snapshot)
// =============================================================================

/// Plain snapshot of an [`AttributeProvider`].
///
/// Combatants carry this instead of a live reference so a combat session is
/// self-contained and serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Ability scores
    pub scores: AbilityScores,
    /// Proficiency bonus
    pub proficiency_bonus: i32,
    /// Abilities with save proficiency
    #[serde(default)]
    pub saves: BTreeSet<Ability>,
    /// Skill training
    #[serde(default)]
    pub skills: BTreeMap<Skill, Proficiency>,
    /// Armor class
    pub armor_class: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            scores: AbilityScores::default(),
            proficiency_bonus: 2,
            saves: BTreeSet::new(),
            skills: BTreeMap::new(),
            armor_class: 10,
        }
    }
}

impl Attributes {
    /// Capture everything the rules engine reads from a provider.
    pub fn snapshot(provider: &(impl AttributeProvider + ?Sized)) -> Self {
        let mut scores = AbilityScores::default();
        let mut saves = BTreeSet::new();
        for ability in Ability::ALL {
            scores.set(ability, provider.ability_score(ability));
            if provider.save_proficiency(ability) {
                saves.insert(ability);
            }
        }
        let skills = ALL_SKILLS
            .iter()
            .map(|&skill| (skill, provider.skill_proficiency(skill)))
            .filter(|(_, prof)| *prof != Proficiency::None)
            .collect();

        Self {
            scores,
            proficiency_bonus: provider.proficiency_bonus(),
            saves,
            skills,
            armor_class: provider.armor_class(),
        }
    }
}

impl AttributeProvider for Attributes {
    fn ability_score(&self, ability: Ability) -> i32 {
        self.scores.get(ability)
    }

    fn proficiency_bonus(&self) -> i32 {
        self.proficiency_bonus
    }

    fn skill_proficiency(&self, skill: Skill) -> Proficiency {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    fn save_proficiency(&self, ability: Ability) -> bool {
        self.saves.contains(&ability)
    }

    fn armor_class(&self) -> i32 {
        self.armor_class
    }
}

const ALL_SKILLS: [Skill; 18] = [
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

// =============================================================================
// CharacterSheet
// =============================================================================

/// Worn equipment as far as armor class is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArmorWorn {
    /// Base armor class of the body armor; `None` when unarmored (10)
    pub base: Option<i32>,
    /// Cap on the Dexterity modifier the armor allows
    pub max_dex_bonus: Option<i32>,
    /// Shield and other flat bonuses
    pub bonus: i32,
}

/// A player character as the character subsystem hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Display name
    pub name: String,
    /// Character level, 1 and up
    pub level: u32,
    /// Ability scores
    pub scores: AbilityScores,
    /// Abilities with save proficiency (from class)
    #[serde(default)]
    pub saving_throws: BTreeSet<Ability>,
    /// Skill training
    #[serde(default)]
    pub skills: BTreeMap<Skill, Proficiency>,
    /// Worn armor
    #[serde(default)]
    pub armor: ArmorWorn,
    /// Hit point maximum
    pub max_hit_points: i32,
    /// Hit points carried in from outside combat
    pub current_hit_points: i32,
    /// Equipped weapon
    pub weapon: AttackProfile,
}

impl CharacterSheet {
    /// An unarmored character with average scores, fighting unarmed.
    #[must_use]
    pub fn new(name: &str, level: u32) -> Self {
        let max_hit_points = 10 * i32::try_from(level.max(1)).unwrap_or(1);
        Self {
            name: name.to_string(),
            level,
            scores: AbilityScores::default(),
            saving_throws: BTreeSet::new(),
            skills: BTreeMap::new(),
            armor: ArmorWorn::default(),
            max_hit_points,
            current_hit_points: max_hit_points,
            weapon: AttackProfile::default(),
        }
    }

    /// Build a combatant for a new session.
    #[must_use]
    pub fn to_combatant(&self, id: CombatantId) -> Combatant {
        let mut combatant = Combatant::new(
            id,
            &self.name,
            true,
            Attributes::snapshot(self),
            self.max_hit_points,
        )
        .with_attack(self.weapon.clone());
        combatant.apply_damage(self.max_hit_points - self.current_hit_points);
        combatant
    }
}

impl AttributeProvider for CharacterSheet {
    fn ability_score(&self, ability: Ability) -> i32 {
        self.scores.get(ability)
    }

    fn proficiency_bonus(&self) -> i32 {
        let level = i32::try_from(self.level.max(1)).unwrap_or(i32::MAX);
        2 + (level - 1) / 4
    }

    fn skill_proficiency(&self, skill: Skill) -> Proficiency {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    fn save_proficiency(&self, ability: Ability) -> bool {
        self.saving_throws.contains(&ability)
    }

    fn armor_class(&self) -> i32 {
        let dex = self.modifier(Ability::Dexterity);
        let dex = self.armor.max_dex_bonus.map_or(dex, |cap| dex.min(cap));
        self.armor.base.unwrap_or(10) + dex + self.armor.bonus
    }
}

// =============================================================================
// MonsterStatBlock
// =============================================================================

/// A bestiary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterStatBlock {
    /// Display name
    pub name: String,
    /// Challenge rating (fractions allowed: 0.125, 0.25, 0.5)
    pub challenge_rating: f32,
    /// Ability scores
    pub scores: AbilityScores,
    /// Armor class as printed
    pub armor_class: i32,
    /// Hit points
    pub hit_points: i32,
    /// Save proficiencies listed in the stat block
    #[serde(default)]
    pub saving_throws: BTreeSet<Ability>,
    /// Skills listed in the stat block
    #[serde(default)]
    pub skills: BTreeMap<Skill, Proficiency>,
    /// Primary attack
    pub attack: AttackProfile,
}

impl MonsterStatBlock {
    /// Build a combatant for a new session.
    #[must_use]
    pub fn to_combatant(&self, id: CombatantId) -> Combatant {
        Combatant::new(
            id,
            &self.name,
            false,
            Attributes::snapshot(self),
            self.hit_points,
        )
        .with_attack(self.attack.clone())
    }

    /// The stock goblin: AC 15, 7 HP, scimitar 1d6.
    #[must_use]
    pub fn goblin() -> Self {
        Self {
            name: "Goblin".to_string(),
            challenge_rating: 0.25,
            scores: AbilityScores::new(8, 14, 10, 10, 8, 8),
            armor_class: 15,
            hit_points: 7,
            saving_throws: BTreeSet::new(),
            skills: BTreeMap::from([(Skill::Stealth, Proficiency::Expertise)]),
            attack: AttackProfile::melee(Ability::Dexterity, knucklebone::DiceExpr::new(1, 6, 0)),
        }
    }
}

impl AttributeProvider for MonsterStatBlock {
    fn ability_score(&self, ability: Ability) -> i32 {
        self.scores.get(ability)
    }

    fn proficiency_bonus(&self) -> i32 {
        #[allow(clippy::cast_possible_truncation)]
        let cr = self.challenge_rating.floor() as i32;
        2 + (cr - 1).max(0) / 4
    }

    fn skill_proficiency(&self, skill: Skill) -> Proficiency {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    fn save_proficiency(&self, ability: Ability) -> bool {
        self.saving_throws.contains(&ability)
    }

    fn armor_class(&self) -> i32 {
        self.armor_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knucklebone::DiceExpr;

    fn fighter(level: u32) -> CharacterSheet {
        CharacterSheet {
            name: "Brenna".to_string(),
            level,
            scores: AbilityScores::new(16, 14, 14, 10, 12, 8),
            saving_throws: BTreeSet::from([Ability::Strength, Ability::Constitution]),
            skills: BTreeMap::from([
                (Skill::Athletics, Proficiency::Proficient),
                (Skill::Perception, Proficiency::Expertise),
            ]),
            armor: ArmorWorn {
                base: Some(14),
                max_dex_bonus: Some(2),
                bonus: 2,
            },
            max_hit_points: 28,
            current_hit_points: 20,
            weapon: AttackProfile::melee(Ability::Strength, DiceExpr::new(1, 8, 0)),
        }
    }

    mod character_tests {
        use super::*;

        #[test]
        fn proficiency_scales_with_level() {
            assert_eq!(fighter(1).proficiency_bonus(), 2);
            assert_eq!(fighter(4).proficiency_bonus(), 2);
            assert_eq!(fighter(5).proficiency_bonus(), 3);
            assert_eq!(fighter(9).proficiency_bonus(), 4);
            assert_eq!(fighter(17).proficiency_bonus(), 6);
            assert_eq!(fighter(0).proficiency_bonus(), 2);
        }

        #[test]
        fn armor_class_from_equipment() {
            // 14 base + DEX 2 (capped at 2) + shield 2
            assert_eq!(fighter(1).armor_class(), 18);

            let mut unarmored = fighter(1);
            unarmored.armor = ArmorWorn::default();
            assert_eq!(unarmored.armor_class(), 12);
        }

        #[test]
        fn combatant_carries_current_hp() {
            let combatant = fighter(3).to_combatant(CombatantId::new(1));
            assert!(combatant.is_player_controlled());
            assert_eq!(combatant.max_hit_points(), 28);
            assert_eq!(combatant.current_hit_points(), 20);
            assert_eq!(combatant.attributes().armor_class, 18);
        }
    }

    mod monster_tests {
        use super::*;

        #[test]
        fn proficiency_scales_with_challenge_rating() {
            let mut goblin = MonsterStatBlock::goblin();
            assert_eq!(goblin.proficiency_bonus(), 2);
            for (cr, expected) in [(4.0, 2), (5.0, 3), (8.0, 3), (9.0, 4), (13.0, 5), (30.0, 9)] {
                goblin.challenge_rating = cr;
                assert_eq!(goblin.proficiency_bonus(), expected, "cr {cr}");
            }
        }

        #[test]
        fn goblin_combatant() {
            let combatant = MonsterStatBlock::goblin().to_combatant(CombatantId::new(2));
            assert!(!combatant.is_player_controlled());
            assert_eq!(combatant.current_hit_points(), 7);
            assert_eq!(combatant.attributes().armor_class, 15);
        }
    }

    #[test]
    fn snapshot_matches_provider() {
        let sheet = fighter(5);
        let snap = Attributes::snapshot(&sheet);
        for ability in Ability::ALL {
            assert_eq!(snap.ability_score(ability), sheet.ability_score(ability));
            assert_eq!(snap.save_proficiency(ability), sheet.save_proficiency(ability));
        }
        assert_eq!(snap.skill_proficiency(Skill::Perception), Proficiency::Expertise);
        assert_eq!(snap.skill_proficiency(Skill::Stealth), Proficiency::None);
        assert_eq!(snap.proficiency_bonus(), 3);
        assert_eq!(snap.armor_class(), sheet.armor_class());
    }
}
