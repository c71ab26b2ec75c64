//! Build files: JSON character definitions hydrated into [`Combatant`]s.
//!
//! A build file records choices (class, level, scores, gear, species, feat);
//! everything derivable follows from them here: HP, AC, proficiency,
//! features, resources and weapon masteries.

use crate::classes::{ClassKind, UnarmoredDefense};
use crate::dice::DiceExpression;
use crate::models::{
    AbilityScores, Combatant, FightingStyle, GiantAncestry, OriginFeat, Resource, ResourceKind,
    SpeciesTrait,
};
use crate::weapons::get_weapon;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read build file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse build file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown weapon: {0}")]
    UnknownWeapon(String),
    #[error("unknown armor: {0}")]
    UnknownArmor(String),
}

/// Playable species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesKind {
    Human,
    Halfling,
    Orc,
    Goliath,
    WoodElf,
    Dwarf,
}

impl SpeciesKind {
    fn speed(&self) -> u32 {
        match self {
            SpeciesKind::Halfling => 25,
            SpeciesKind::Goliath | SpeciesKind::WoodElf => 35,
            SpeciesKind::Human | SpeciesKind::Orc | SpeciesKind::Dwarf => 30,
        }
    }
}

/// One character definition as written in a build file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildFile {
    pub name: String,
    pub class: ClassKind,
    pub level: u8,
    pub ability_scores: AbilityScores,
    #[serde(default)]
    pub weapons: Vec<String>,
    #[serde(default)]
    pub armor: Option<String>,
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub fighting_style: Option<FightingStyle>,
    #[serde(default)]
    pub species: Option<SpeciesKind>,
    #[serde(default)]
    pub giant_ancestry: Option<GiantAncestry>,
    #[serde(default)]
    pub origin_feat: Option<OriginFeat>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BuildFile {
    /// True when the build carries every requested tag.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        tags.iter()
            .all(|t| self.tags.iter().any(|have| have.eq_ignore_ascii_case(t)))
    }
}

/// AC granted by a named armor, or `None` for an unknown name.
fn armor_ac(name: &str, dex_mod: i32) -> Option<i32> {
    let ac = match name.to_lowercase().replace(' ', "_").as_str() {
        "padded" | "leather" => 11 + dex_mod,
        "studded_leather" | "studded" => 12 + dex_mod,
        "chain_shirt" => 13 + dex_mod.min(2),
        "scale_mail" | "breastplate" => 14 + dex_mod.min(2),
        "half_plate" => 15 + dex_mod.min(2),
        "ring_mail" => 14,
        "chain_mail" => 16,
        "splint" => 17,
        "plate" => 18,
        _ => return None,
    };
    Some(ac)
}

/// Hydrate a parsed build into a ready-to-fight combatant template.
pub fn build_combatant(build: &BuildFile) -> Result<Combatant, LoadError> {
    let abilities = build.ability_scores;
    let level = build.level.max(1);
    let data = build.class.data();
    let con = abilities.con_mod();
    let dex = abilities.dex_mod();

    let mut max_hp = data.base_hp + con + (data.avg_hp_per_level + con) * (level as i32 - 1);
    if build.origin_feat == Some(OriginFeat::Tough) {
        max_hp += 2 * level as i32;
    }
    let proficiency_bonus = if level < 5 { 2 } else { 3 };

    let mut weapons = Vec::new();
    for name in &build.weapons {
        let mut weapon =
            get_weapon(name).ok_or_else(|| LoadError::UnknownWeapon(name.clone()))?;
        // With both hands free, versatile weapons are swung two-handed.
        if !build.shield {
            if let Some(versatile) = weapon.versatile_damage.take() {
                weapon.damage = versatile;
            }
        }
        weapons.push(weapon);
    }

    let mut ac = match &build.armor {
        Some(armor) => {
            armor_ac(armor, dex).ok_or_else(|| LoadError::UnknownArmor(armor.clone()))?
        }
        None => match data.unarmored_defense {
            UnarmoredDefense::Barbarian => 10 + dex + con,
            UnarmoredDefense::Monk => 10 + dex + abilities.wis_mod(),
            UnarmoredDefense::None => 10 + dex,
        },
    };
    if build.shield {
        ac += 2;
    }
    if build.fighting_style == Some(FightingStyle::Defense) && build.armor.is_some() {
        ac += 1;
    }

    let mut combatant = Combatant::new(&build.name, abilities, max_hp, ac);
    combatant.level = level;
    combatant.class_name = build.class.to_string();
    combatant.proficiency_bonus = proficiency_bonus;
    combatant.fighting_style = build.fighting_style;
    combatant.giant_ancestry = build.giant_ancestry;
    combatant.origin_feat = build.origin_feat;
    combatant.savage_attacker = build.origin_feat == Some(OriginFeat::SavageAttacker);
    combatant.features = build.class.features_at_level(level).into_iter().collect();
    combatant.weapon_masteries = weapons.iter().map(|w| w.name.clone()).collect();
    combatant.weapons = weapons;

    let mut speed = build.species.map_or(30, |s| s.speed());
    // Unarmored Movement.
    if build.class == ClassKind::Monk && level >= 2 && build.armor.is_none() && !build.shield {
        speed += 10;
    }
    combatant.speed = speed;

    if build.origin_feat == Some(OriginFeat::Alert) {
        combatant.initiative_bonus = proficiency_bonus;
    }

    match build.class {
        ClassKind::Barbarian => {
            let charges = if level >= 3 { 3 } else { 2 };
            combatant
                .resources
                .insert(ResourceKind::Rage, Resource::new(charges));
        }
        ClassKind::Fighter => {
            combatant
                .resources
                .insert(ResourceKind::SecondWind, Resource::new(2));
            if level >= 2 {
                combatant
                    .resources
                    .insert(ResourceKind::ActionSurge, Resource::new(1));
            }
            if level >= 5 {
                combatant.extra_attacks = 1;
            }
        }
        ClassKind::Monk => {
            combatant.martial_arts_die =
                Some(DiceExpression::parse("1d6").expect("valid dice literal"));
            if level >= 2 {
                combatant
                    .resources
                    .insert(ResourceKind::FocusPoints, Resource::new(level as u32));
            }
        }
        ClassKind::Rogue => {
            let dice = (level as u32).div_ceil(2);
            combatant.sneak_attack_dice =
                Some(DiceExpression::parse(&format!("{dice}d6")).expect("valid dice notation"));
        }
    }

    match build.species {
        Some(SpeciesKind::Halfling) => {
            combatant.species_traits.insert(SpeciesTrait::Luck);
        }
        Some(SpeciesKind::Orc) => {
            combatant
                .resources
                .insert(ResourceKind::RelentlessEndurance, Resource::new(1));
        }
        Some(SpeciesKind::Human) => {
            combatant
                .resources
                .insert(ResourceKind::HeroicInspiration, Resource::new(1));
        }
        _ => {}
    }

    if let Some(ancestry) = build.giant_ancestry {
        let kind = match ancestry {
            GiantAncestry::Stone => Some(ResourceKind::StonesEndurance),
            GiantAncestry::Storm => Some(ResourceKind::StormsThunder),
            GiantAncestry::Fire => Some(ResourceKind::FiresBurn),
            GiantAncestry::Frost => Some(ResourceKind::FrostsChill),
            GiantAncestry::Hill => Some(ResourceKind::HillsTumble),
            // Cloud's Jaunt is a teleport; nothing to track in a duel.
            GiantAncestry::Cloud => None,
        };
        if let Some(kind) = kind {
            combatant
                .resources
                .insert(kind, Resource::new(proficiency_bonus as u32));
        }
    }

    if build.origin_feat == Some(OriginFeat::Lucky) {
        combatant.resources.insert(
            ResourceKind::LuckPoints,
            Resource::new(proficiency_bonus as u32),
        );
    }

    Ok(combatant)
}

/// Parse and hydrate a build from JSON text.
pub fn load_build_from_str(json: &str) -> Result<Combatant, LoadError> {
    let build: BuildFile = serde_json::from_str(json)?;
    build_combatant(&build)
}

/// Load and hydrate a build from a file.
pub fn load_build(path: impl AsRef<Path>) -> Result<Combatant, LoadError> {
    let text = fs::read_to_string(path)?;
    load_build_from_str(&text)
}

/// Read one build file without hydrating it.
pub fn read_build_file(path: impl AsRef<Path>) -> Result<BuildFile, LoadError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// All build files in a directory, sorted by file name.
pub fn read_build_dir(dir: impl AsRef<Path>) -> Result<Vec<BuildFile>, LoadError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut builds = Vec::new();
    for path in paths {
        builds.push(read_build_file(&path)?);
    }
    Ok(builds)
}
