//! Static class data used when hydrating a build into a combatant.

use crate::models::Feature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The classes the duel engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Barbarian,
    Fighter,
    Monk,
    Rogue,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Barbarian => write!(f, "barbarian"),
            ClassKind::Fighter => write!(f, "fighter"),
            ClassKind::Monk => write!(f, "monk"),
            ClassKind::Rogue => write!(f, "rogue"),
        }
    }
}

/// How AC is computed when the build wears no armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarmoredDefense {
    /// 10 + DEX.
    None,
    /// 10 + DEX + CON.
    Barbarian,
    /// 10 + DEX + WIS.
    Monk,
}

/// Class-specific data for build hydration.
pub struct ClassData {
    /// Starting HP at level 1 (hit die maximum, before CON modifier).
    pub base_hp: i32,
    /// Average hit-die roll added per level after the first.
    pub avg_hp_per_level: i32,
    /// Features gained at each level, cumulative.
    pub features_by_level: &'static [(u8, &'static [Feature])],
    pub unarmored_defense: UnarmoredDefense,
}

impl ClassKind {
    pub fn data(&self) -> ClassData {
        match self {
            ClassKind::Barbarian => ClassData {
                base_hp: 12,
                avg_hp_per_level: 7,
                features_by_level: &[
                    (1, &[Feature::Rage]),
                    (2, &[Feature::RecklessAttack]),
                ],
                unarmored_defense: UnarmoredDefense::Barbarian,
            },
            ClassKind::Fighter => ClassData {
                base_hp: 10,
                avg_hp_per_level: 6,
                features_by_level: &[
                    (1, &[Feature::SecondWind]),
                    (2, &[Feature::ActionSurge]),
                ],
                unarmored_defense: UnarmoredDefense::None,
            },
            ClassKind::Monk => ClassData {
                base_hp: 8,
                avg_hp_per_level: 5,
                features_by_level: &[
                    (1, &[Feature::MartialArts]),
                    (2, &[Feature::FlurryOfBlows, Feature::PatientDefense]),
                ],
                unarmored_defense: UnarmoredDefense::Monk,
            },
            ClassKind::Rogue => ClassData {
                base_hp: 8,
                avg_hp_per_level: 5,
                features_by_level: &[
                    (1, &[Feature::SneakAttack]),
                    (2, &[Feature::CunningAction]),
                ],
                unarmored_defense: UnarmoredDefense::None,
            },
        }
    }

    /// All features unlocked at or below `level`.
    pub fn features_at_level(&self, level: u8) -> Vec<Feature> {
        self.data()
            .features_by_level
            .iter()
            .filter(|(lv, _)| *lv <= level)
            .flat_map(|(_, feats)| feats.iter().copied())
            .collect()
    }
}
