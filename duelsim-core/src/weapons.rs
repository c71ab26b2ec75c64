//! Standard weapon database with 2024 mastery properties.
//!
//! Builds reference weapons by name; the loader resolves them here.

use crate::dice::DiceExpression;
use crate::models::{DamageType, Mastery, Weapon, WeaponCategory, WeaponProperty};

/// Get a standard weapon by name (case-insensitive).
pub fn get_weapon(name: &str) -> Option<Weapon> {
    WEAPONS
        .iter()
        .find(|w| w.name.eq_ignore_ascii_case(name))
        .cloned()
}

/// Names of all weapons in the database, in listing order.
pub fn weapon_names() -> Vec<&'static str> {
    WEAPONS.iter().map(|w| w.name.as_str()).collect()
}

struct WeaponDef {
    name: &'static str,
    damage: &'static str,
    damage_type: DamageType,
    category: WeaponCategory,
    properties: &'static [WeaponProperty],
    mastery: Mastery,
    versatile: Option<&'static str>,
    range: Option<(u32, u32)>,
    thrown: Option<(u32, u32)>,
}

impl WeaponDef {
    fn build(&self) -> Weapon {
        Weapon {
            name: self.name.to_string(),
            damage: DiceExpression::parse(self.damage).expect("valid catalog dice"),
            damage_type: self.damage_type,
            properties: self.properties.to_vec(),
            mastery: Some(self.mastery),
            bonus: 0,
            category: self.category,
            versatile_damage: self
                .versatile
                .map(|d| DiceExpression::parse(d).expect("valid catalog dice")),
            range_normal: self.range.map_or(5, |(normal, _)| normal),
            range_long: self.range.map(|(_, long)| long),
            thrown_range: self.thrown,
        }
    }
}

use DamageType::{Bludgeoning, Piercing, Slashing};
use WeaponCategory::{Martial, Simple};
use WeaponProperty::*;

#[rustfmt::skip]
static DEFS: &[WeaponDef] = &[
    // Simple melee
    WeaponDef { name: "Club", damage: "1d4", damage_type: Bludgeoning, category: Simple,
        properties: &[Light], mastery: Mastery::Slow, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Dagger", damage: "1d4", damage_type: Piercing, category: Simple,
        properties: &[Finesse, Light, Thrown], mastery: Mastery::Nick, versatile: None, range: None, thrown: Some((20, 60)) },
    WeaponDef { name: "Greatclub", damage: "1d8", damage_type: Bludgeoning, category: Simple,
        properties: &[TwoHanded], mastery: Mastery::Push, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Handaxe", damage: "1d6", damage_type: Slashing, category: Simple,
        properties: &[Light, Thrown], mastery: Mastery::Vex, versatile: None, range: None, thrown: Some((20, 60)) },
    WeaponDef { name: "Javelin", damage: "1d6", damage_type: Piercing, category: Simple,
        properties: &[Thrown], mastery: Mastery::Slow, versatile: None, range: None, thrown: Some((30, 120)) },
    WeaponDef { name: "Light Hammer", damage: "1d4", damage_type: Bludgeoning, category: Simple,
        properties: &[Light, Thrown], mastery: Mastery::Nick, versatile: None, range: None, thrown: Some((20, 60)) },
    WeaponDef { name: "Mace", damage: "1d6", damage_type: Bludgeoning, category: Simple,
        properties: &[], mastery: Mastery::Sap, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Quarterstaff", damage: "1d6", damage_type: Bludgeoning, category: Simple,
        properties: &[Versatile], mastery: Mastery::Topple, versatile: Some("1d8"), range: None, thrown: None },
    WeaponDef { name: "Sickle", damage: "1d4", damage_type: Slashing, category: Simple,
        properties: &[Light], mastery: Mastery::Nick, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Spear", damage: "1d6", damage_type: Piercing, category: Simple,
        properties: &[Thrown, Versatile], mastery: Mastery::Sap, versatile: Some("1d8"), range: None, thrown: Some((20, 60)) },

    // Simple ranged
    WeaponDef { name: "Dart", damage: "1d4", damage_type: Piercing, category: Simple,
        properties: &[Finesse, Thrown], mastery: Mastery::Vex, versatile: None, range: None, thrown: Some((20, 60)) },
    WeaponDef { name: "Light Crossbow", damage: "1d8", damage_type: Piercing, category: Simple,
        properties: &[Ammunition, Loading, TwoHanded], mastery: Mastery::Slow, versatile: None, range: Some((80, 320)), thrown: None },
    WeaponDef { name: "Shortbow", damage: "1d6", damage_type: Piercing, category: Simple,
        properties: &[Ammunition, TwoHanded], mastery: Mastery::Vex, versatile: None, range: Some((80, 320)), thrown: None },
    WeaponDef { name: "Sling", damage: "1d4", damage_type: Bludgeoning, category: Simple,
        properties: &[Ammunition], mastery: Mastery::Slow, versatile: None, range: Some((30, 120)), thrown: None },

    // Martial melee
    WeaponDef { name: "Battleaxe", damage: "1d8", damage_type: Slashing, category: Martial,
        properties: &[Versatile], mastery: Mastery::Topple, versatile: Some("1d10"), range: None, thrown: None },
    WeaponDef { name: "Flail", damage: "1d8", damage_type: Bludgeoning, category: Martial,
        properties: &[], mastery: Mastery::Sap, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Glaive", damage: "1d10", damage_type: Slashing, category: Martial,
        properties: &[Heavy, Reach, TwoHanded], mastery: Mastery::Graze, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Greataxe", damage: "1d12", damage_type: Slashing, category: Martial,
        properties: &[Heavy, TwoHanded], mastery: Mastery::Cleave, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Greatsword", damage: "2d6", damage_type: Slashing, category: Martial,
        properties: &[Heavy, TwoHanded], mastery: Mastery::Graze, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Halberd", damage: "1d10", damage_type: Slashing, category: Martial,
        properties: &[Heavy, Reach, TwoHanded], mastery: Mastery::Cleave, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Longsword", damage: "1d8", damage_type: Slashing, category: Martial,
        properties: &[Versatile], mastery: Mastery::Sap, versatile: Some("1d10"), range: None, thrown: None },
    WeaponDef { name: "Maul", damage: "2d6", damage_type: Bludgeoning, category: Martial,
        properties: &[Heavy, TwoHanded], mastery: Mastery::Topple, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Morningstar", damage: "1d8", damage_type: Piercing, category: Martial,
        properties: &[], mastery: Mastery::Sap, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Pike", damage: "1d10", damage_type: Piercing, category: Martial,
        properties: &[Heavy, Reach, TwoHanded], mastery: Mastery::Push, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Rapier", damage: "1d8", damage_type: Piercing, category: Martial,
        properties: &[Finesse], mastery: Mastery::Vex, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Scimitar", damage: "1d6", damage_type: Slashing, category: Martial,
        properties: &[Finesse, Light], mastery: Mastery::Nick, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Shortsword", damage: "1d6", damage_type: Piercing, category: Martial,
        properties: &[Finesse, Light], mastery: Mastery::Vex, versatile: None, range: None, thrown: None },
    WeaponDef { name: "Warhammer", damage: "1d8", damage_type: Bludgeoning, category: Martial,
        properties: &[Versatile], mastery: Mastery::Push, versatile: Some("1d10"), range: None, thrown: None },
    WeaponDef { name: "Whip", damage: "1d4", damage_type: Slashing, category: Martial,
        properties: &[Finesse, Reach], mastery: Mastery::Slow, versatile: None, range: None, thrown: None },

    // Martial ranged
    WeaponDef { name: "Hand Crossbow", damage: "1d6", damage_type: Piercing, category: Martial,
        properties: &[Ammunition, Light, Loading], mastery: Mastery::Vex, versatile: None, range: Some((30, 120)), thrown: None },
    WeaponDef { name: "Longbow", damage: "1d8", damage_type: Piercing, category: Martial,
        properties: &[Ammunition, Heavy, TwoHanded], mastery: Mastery::Slow, versatile: None, range: Some((150, 600)), thrown: None },
];

lazy_static::lazy_static! {
    /// Standard weapons, built once from the static definitions.
    pub static ref WEAPONS: Vec<Weapon> = DEFS.iter().map(WeaponDef::build).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(get_weapon("greatsword").is_some());
        assert!(get_weapon("GREATSWORD").is_some());
        assert!(get_weapon("vorpal blade").is_none());
    }

    #[test]
    fn greatsword_shape() {
        let w = get_weapon("Greatsword").unwrap();
        assert_eq!(w.damage.average(), 7.0);
        assert_eq!(w.damage_type, DamageType::Slashing);
        assert!(w.is_heavy() && w.is_two_handed());
        assert_eq!(w.mastery, Some(Mastery::Graze));
        assert!(w.is_melee());
        assert_eq!(w.effective_range(), 5);
    }

    #[test]
    fn longbow_is_ranged() {
        let w = get_weapon("Longbow").unwrap();
        assert!(w.is_ranged());
        assert_eq!(w.effective_range(), 150);
    }

    #[test]
    fn thrown_weapons_use_thrown_range() {
        let w = get_weapon("Javelin").unwrap();
        assert!(w.is_thrown() && w.is_melee());
        assert_eq!(w.effective_range(), 30);
    }

    #[test]
    fn reach_extends_melee_range() {
        let w = get_weapon("Glaive").unwrap();
        assert_eq!(w.effective_range(), 10);
    }

    #[test]
    fn all_definitions_parse() {
        assert_eq!(WEAPONS.len(), DEFS.len());
    }
}
