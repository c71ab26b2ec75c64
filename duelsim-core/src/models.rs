//! Core data model: weapons, combatants, resources, effects, combat state.
//!
//! A [`Combatant`] is built once from a build definition and acts as a
//! template; every simulated duel runs on an independent copy produced by
//! [`Combatant::fresh_copy`], so no state leaks between trials.

use crate::dice::DiceExpression;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

/// Damage types recognized by the resistance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Bludgeoning,
    Piercing,
    Slashing,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Piercing => "piercing",
            DamageType::Slashing => "slashing",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }
}

/// Physical weapon properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponProperty {
    Finesse,
    Heavy,
    Light,
    Reach,
    TwoHanded,
    Versatile,
    Thrown,
    Ammunition,
    Loading,
}

/// 2024 Weapon Mastery properties, separate from physical properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mastery {
    Nick,
    Topple,
    Graze,
    Push,
    Sap,
    Slow,
    Cleave,
    Vex,
}

/// Binary status flags. At most one instance of each per combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Prone,
    Raging,
    Dodging,
}

/// Fighting styles (2024 Fighter feature).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightingStyle {
    Archery,
    Defense,
    Dueling,
    GreatWeaponFighting,
    ThrownWeaponFighting,
    TwoWeaponFighting,
}

/// Class features with a combat handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Rage,
    RecklessAttack,
    SecondWind,
    ActionSurge,
    SneakAttack,
    CunningAction,
    MartialArts,
    FlurryOfBlows,
    PatientDefense,
}

/// Species traits that hook into attack or damage resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesTrait {
    /// Halfling: reroll a natural 1 on the d20, keeping the new roll.
    Luck,
}

/// Goliath Giant Ancestry options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiantAncestry {
    Cloud,
    Fire,
    Frost,
    Hill,
    Stone,
    Storm,
}

/// Origin feats the engine cares about at combat time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginFeat {
    Alert,
    Lucky,
    SavageAttacker,
    Tough,
}

/// Identifiers for limited-use ability charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Rage,
    SecondWind,
    ActionSurge,
    FocusPoints,
    LuckPoints,
    HeroicInspiration,
    RelentlessEndurance,
    StonesEndurance,
    StormsThunder,
    FiresBurn,
    FrostsChill,
    HillsTumble,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Rage => "Rage",
            ResourceKind::SecondWind => "Second Wind",
            ResourceKind::ActionSurge => "Action Surge",
            ResourceKind::FocusPoints => "Focus Points",
            ResourceKind::LuckPoints => "Luck Points",
            ResourceKind::HeroicInspiration => "Heroic Inspiration",
            ResourceKind::RelentlessEndurance => "Relentless Endurance",
            ResourceKind::StonesEndurance => "Stone's Endurance",
            ResourceKind::StormsThunder => "Storm's Thunder",
            ResourceKind::FiresBurn => "Fire's Burn",
            ResourceKind::FrostsChill => "Frost's Chill",
            ResourceKind::HillsTumble => "Hill's Tumble",
        }
    }
}

/// Weapon training category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    #[default]
    Simple,
    Martial,
}

// ============================================================================
// Weapons
// ============================================================================

/// A weapon definition. Damage dice are parsed once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage: DiceExpression,
    pub damage_type: DamageType,
    #[serde(default)]
    pub properties: Vec<WeaponProperty>,
    #[serde(default)]
    pub mastery: Option<Mastery>,
    /// Magic weapon bonus applied to attack and damage rolls.
    #[serde(default)]
    pub bonus: i32,
    #[serde(default)]
    pub category: WeaponCategory,
    #[serde(default)]
    pub versatile_damage: Option<DiceExpression>,
    /// Normal range in feet; 5 for melee.
    #[serde(default = "default_melee_range")]
    pub range_normal: u32,
    #[serde(default)]
    pub range_long: Option<u32>,
    /// (normal, long) range when thrown.
    #[serde(default)]
    pub thrown_range: Option<(u32, u32)>,
}

fn default_melee_range() -> u32 {
    5
}

impl Weapon {
    pub fn has_property(&self, prop: WeaponProperty) -> bool {
        self.properties.contains(&prop)
    }

    pub fn is_finesse(&self) -> bool {
        self.has_property(WeaponProperty::Finesse)
    }

    pub fn is_heavy(&self) -> bool {
        self.has_property(WeaponProperty::Heavy)
    }

    pub fn is_light(&self) -> bool {
        self.has_property(WeaponProperty::Light)
    }

    pub fn is_two_handed(&self) -> bool {
        self.has_property(WeaponProperty::TwoHanded)
    }

    pub fn is_versatile(&self) -> bool {
        self.has_property(WeaponProperty::Versatile)
    }

    pub fn is_thrown(&self) -> bool {
        self.has_property(WeaponProperty::Thrown)
    }

    /// True for dedicated ranged weapons (bows, crossbows, slings).
    pub fn is_ranged(&self) -> bool {
        self.has_property(WeaponProperty::Ammunition)
    }

    pub fn is_melee(&self) -> bool {
        !self.is_ranged()
    }

    /// Normal range for ranged/thrown use; 5 (or 10 with reach) for melee.
    pub fn effective_range(&self) -> u32 {
        if self.is_ranged() {
            return self.range_normal;
        }
        if self.is_thrown() {
            if let Some((normal, _)) = self.thrown_range {
                return normal;
            }
        }
        if self.has_property(WeaponProperty::Reach) {
            return 10;
        }
        self.range_normal
    }
}

// ============================================================================
// Ability scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    #[serde(rename = "con")]
    pub constitution: i32,
    #[serde(rename = "int")]
    pub intelligence: i32,
    #[serde(rename = "wis")]
    pub wisdom: i32,
    #[serde(rename = "cha")]
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        AbilityScores {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

impl AbilityScores {
    pub fn str_mod(&self) -> i32 {
        ability_modifier(self.strength)
    }

    pub fn dex_mod(&self) -> i32 {
        ability_modifier(self.dexterity)
    }

    pub fn con_mod(&self) -> i32 {
        ability_modifier(self.constitution)
    }

    pub fn int_mod(&self) -> i32 {
        ability_modifier(self.intelligence)
    }

    pub fn wis_mod(&self) -> i32 {
        ability_modifier(self.wisdom)
    }

    pub fn cha_mod(&self) -> i32 {
        ability_modifier(self.charisma)
    }
}

// ============================================================================
// Resources and effects
// ============================================================================

/// A trackable limited-use charge. Single-encounter scope: only consumption
/// and the at-combat-start restoration matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub current: u32,
    pub maximum: u32,
}

impl Resource {
    pub fn new(maximum: u32) -> Self {
        Resource {
            current: maximum,
            maximum,
        }
    }

    pub fn available(&self) -> bool {
        self.current > 0
    }

    /// Spend one charge. Returns false (and does nothing) when depleted.
    pub fn spend(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn restore(&mut self) {
        self.current = self.maximum;
    }
}

/// When a timed effect is removed during turn processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    StartOfTurn,
    EndOfTurn,
}

/// A timed or until-triggered modifier currently applied to a combatant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActiveEffect {
    pub name: String,
    pub source: String,
    /// Rounds remaining; `None` means no duration-based expiry.
    pub duration: Option<u32>,
    pub end_trigger: Option<EffectTrigger>,
    pub ac_bonus: i32,
    pub damage_resistance: Vec<DamageType>,
    pub advantage_on_attacks: bool,
    pub disadvantage_on_attacks: bool,
    pub grants_advantage_to_enemies: bool,
    pub rage_damage_bonus: i32,
}

// ============================================================================
// Per-turn scratch state
// ============================================================================

/// Flags and counters that reset every turn. Kept in one struct so
/// `start_turn` resets them atomically instead of scattering booleans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnFlags {
    pub action_used: bool,
    pub bonus_action_used: bool,
    /// Reaction usage persists through the opponent's turn and is released
    /// in `end_turn`, not `start_turn`.
    pub reaction_used: bool,
    pub movement_remaining: u32,
    pub savage_attacker_used: bool,
    pub sneak_attack_delivered: bool,
    pub nick_attack_used: bool,
}

// ============================================================================
// Combatant
// ============================================================================

/// One fighter's complete state: static build attributes plus dynamic
/// per-combat state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    // --- Static build data ---
    pub name: String,
    pub level: u8,
    pub class_name: String,
    pub abilities: AbilityScores,
    pub max_hp: i32,
    pub ac: i32,
    pub proficiency_bonus: i32,
    pub speed: u32,
    pub weapons: Vec<Weapon>,
    pub features: HashSet<Feature>,
    pub species_traits: HashSet<SpeciesTrait>,
    pub giant_ancestry: Option<GiantAncestry>,
    pub origin_feat: Option<OriginFeat>,
    pub fighting_style: Option<FightingStyle>,
    /// Weapon names whose mastery property is unlocked.
    pub weapon_masteries: Vec<String>,
    pub savage_attacker: bool,
    pub sneak_attack_dice: Option<DiceExpression>,
    pub martial_arts_die: Option<DiceExpression>,
    pub initiative_bonus: i32,
    /// Number of additional attacks per Attack action (Extra Attack = 1).
    pub extra_attacks: u32,

    // --- Per-combat state ---
    pub resources: HashMap<ResourceKind, Resource>,
    pub current_hp: i32,
    pub temp_hp: i32,
    pub conditions: HashSet<Condition>,
    pub active_effects: Vec<ActiveEffect>,
    pub turn: TurnFlags,
    /// Set when a Vex hit marks the opponent; the next attack against that
    /// side has advantage, consumed on use.
    pub vex_target: Option<Side>,
    /// Speed reduction (Slow mastery, Frost's Chill) applied to this
    /// combatant's next turn, then cleared.
    pub speed_penalty: u32,
}

impl Combatant {
    /// Minimal combatant used directly by unit tests and the DPR harness.
    pub fn new(name: impl Into<String>, abilities: AbilityScores, max_hp: i32, ac: i32) -> Self {
        Combatant {
            name: name.into(),
            level: 1,
            class_name: String::new(),
            abilities,
            max_hp,
            ac,
            proficiency_bonus: 2,
            speed: 30,
            weapons: Vec::new(),
            features: HashSet::new(),
            species_traits: HashSet::new(),
            giant_ancestry: None,
            origin_feat: None,
            fighting_style: None,
            weapon_masteries: Vec::new(),
            savage_attacker: false,
            sneak_attack_dice: None,
            martial_arts_die: None,
            initiative_bonus: 0,
            extra_attacks: 0,
            resources: HashMap::new(),
            current_hp: max_hp,
            temp_hp: 0,
            conditions: HashSet::new(),
            active_effects: Vec::new(),
            turn: TurnFlags::default(),
            vex_target: None,
            speed_penalty: 0,
        }
    }

    // --- Convenience accessors ---

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn str_mod(&self) -> i32 {
        self.abilities.str_mod()
    }

    pub fn dex_mod(&self) -> i32 {
        self.abilities.dex_mod()
    }

    pub fn con_mod(&self) -> i32 {
        self.abilities.con_mod()
    }

    pub fn wis_mod(&self) -> i32 {
        self.abilities.wis_mod()
    }

    pub fn is_raging(&self) -> bool {
        self.conditions.contains(&Condition::Raging)
    }

    pub fn is_dodging(&self) -> bool {
        self.conditions.contains(&Condition::Dodging)
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn has_trait(&self, species_trait: SpeciesTrait) -> bool {
        self.species_traits.contains(&species_trait)
    }

    /// Rage damage bonus from the active rage effect, 0 when not raging.
    pub fn rage_damage(&self) -> i32 {
        self.active_effects
            .iter()
            .map(|e| e.rage_damage_bonus)
            .find(|&b| b != 0)
            .unwrap_or(0)
    }

    /// Base AC plus all active effect bonuses.
    pub fn effective_ac(&self) -> i32 {
        let bonus: i32 = self.active_effects.iter().map(|e| e.ac_bonus).sum();
        self.ac + bonus
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&Resource> {
        self.resources.get(&kind)
    }

    pub fn resource_available(&self, kind: ResourceKind) -> bool {
        self.resources.get(&kind).is_some_and(Resource::available)
    }

    /// Spend one charge of the named resource. A depleted or absent
    /// resource is a normal game state: the call just returns false.
    pub fn spend_resource(&mut self, kind: ResourceKind) -> bool {
        self.resources.get_mut(&kind).is_some_and(Resource::spend)
    }

    // --- Weapon helpers ---

    /// Best melee weapon by expected damage.
    pub fn best_melee_weapon(&self) -> Option<&Weapon> {
        self.weapons
            .iter()
            .filter(|w| w.is_melee())
            .max_by(|a, b| a.damage.average().total_cmp(&b.damage.average()))
    }

    /// Best dedicated ranged weapon, falling back to the best thrown one.
    pub fn best_ranged_weapon(&self) -> Option<&Weapon> {
        let ranged = self
            .weapons
            .iter()
            .filter(|w| w.is_ranged())
            .max_by(|a, b| a.damage.average().total_cmp(&b.damage.average()));
        ranged.or_else(|| {
            self.weapons
                .iter()
                .filter(|w| w.is_thrown())
                .max_by(|a, b| a.damage.average().total_cmp(&b.damage.average()))
        })
    }

    pub fn find_weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    /// Which ability modifier governs attacks with this weapon.
    pub fn attack_ability_mod(&self, weapon: &Weapon) -> i32 {
        if weapon.is_finesse() {
            return self.str_mod().max(self.dex_mod());
        }
        if weapon.is_ranged() {
            return self.dex_mod();
        }
        // Monk weapons: DEX allowed on non-heavy weapons.
        if self.martial_arts_die.is_some() && !weapon.is_heavy() {
            return self.str_mod().max(self.dex_mod());
        }
        self.str_mod()
    }

    /// Attack bonus for a weapon.
    pub fn attack_modifier(&self, weapon: &Weapon) -> i32 {
        let mut bonus = self.attack_ability_mod(weapon) + self.proficiency_bonus + weapon.bonus;
        if self.fighting_style == Some(FightingStyle::Archery) && weapon.is_ranged() {
            bonus += 2;
        }
        bonus
    }

    /// Flat damage bonus for a weapon.
    pub fn damage_modifier(&self, weapon: &Weapon, is_thrown: bool) -> i32 {
        let mut bonus = self.attack_ability_mod(weapon) + weapon.bonus;
        if self.fighting_style == Some(FightingStyle::Dueling)
            && weapon.is_melee()
            && !weapon.is_two_handed()
        {
            bonus += 2;
        }
        if self.fighting_style == Some(FightingStyle::ThrownWeaponFighting) && is_thrown {
            bonus += 2;
        }
        // Rage bonus requires a STR-based melee attack.
        if self.is_raging()
            && weapon.is_melee()
            && (!weapon.is_finesse() || self.str_mod() >= self.dex_mod())
        {
            bonus += self.rage_damage();
        }
        bonus
    }

    pub fn unarmed_attack_mod(&self) -> i32 {
        self.unarmed_damage_mod() + self.proficiency_bonus
    }

    pub fn unarmed_damage_mod(&self) -> i32 {
        if self.martial_arts_die.is_some() {
            self.str_mod().max(self.dex_mod())
        } else {
            self.str_mod()
        }
    }

    /// Whether this combatant may use the weapon's mastery property.
    pub fn can_use_mastery(&self, weapon: &Weapon) -> bool {
        self.weapon_masteries
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&weapon.name))
    }

    // --- Turn lifecycle ---

    /// Reset per-turn flags and process start-of-turn effect expiry.
    pub fn start_turn(&mut self) {
        let reaction_used = self.turn.reaction_used;
        self.turn = TurnFlags {
            reaction_used,
            movement_remaining: self.speed.saturating_sub(self.speed_penalty),
            ..TurnFlags::default()
        };
        self.speed_penalty = 0;

        // Remove start-of-turn effects, tick down the rest.
        self.active_effects.retain_mut(|e| {
            if e.end_trigger == Some(EffectTrigger::StartOfTurn) {
                return false;
            }
            if let Some(d) = e.duration.as_mut() {
                *d = d.saturating_sub(1);
                if *d == 0 {
                    return false;
                }
            }
            true
        });

        // Dodge lasts until the start of the dodger's next turn.
        self.conditions.remove(&Condition::Dodging);

        // Stand up from prone at a cost of half speed.
        if self.conditions.remove(&Condition::Prone) {
            self.turn.movement_remaining =
                self.turn.movement_remaining.saturating_sub(self.speed / 2);
        }
    }

    /// Process end-of-turn effect expiry and release the reaction.
    pub fn end_turn(&mut self) {
        self.active_effects
            .retain(|e| e.end_trigger != Some(EffectTrigger::EndOfTurn));
        self.turn.reaction_used = false;
    }

    // --- HP management ---

    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.max_hp - self.current_hp).max(0);
        self.current_hp += actual;
        actual
    }

    /// Temp HP don't stack: keep the higher of old and new.
    pub fn gain_temp_hp(&mut self, amount: i32) {
        self.temp_hp = self.temp_hp.max(amount);
    }

    /// Produce an independent copy with all per-combat state reset to
    /// defaults and every resource restored to maximum.
    pub fn fresh_copy(&self) -> Combatant {
        let mut copy = self.clone();
        copy.current_hp = copy.max_hp;
        copy.temp_hp = 0;
        copy.conditions.clear();
        copy.active_effects.clear();
        copy.turn = TurnFlags {
            movement_remaining: copy.speed,
            ..TurnFlags::default()
        };
        copy.vex_target = None;
        copy.speed_penalty = 0;
        for resource in copy.resources.values_mut() {
            resource.restore();
        }
        copy
    }
}

// ============================================================================
// Combat state
// ============================================================================

/// Which of the two duelists a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Transient state for one 1v1 duel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub a: Combatant,
    pub b: Combatant,
    /// Feet between the combatants.
    pub distance: u32,
    pub round: u32,
    pub turn_order: [Side; 2],
    pub combat_log: Vec<String>,
    pub verbose: bool,
}

impl CombatState {
    pub fn new(a: Combatant, b: Combatant, distance: u32, verbose: bool) -> Self {
        CombatState {
            a,
            b,
            distance,
            round: 0,
            turn_order: [Side::A, Side::B],
            combat_log: Vec::new(),
            verbose,
        }
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Mutable access to one side and its opponent at the same time.
    pub fn split_mut(&mut self, side: Side) -> (&mut Combatant, &mut Combatant) {
        match side {
            Side::A => (&mut self.a, &mut self.b),
            Side::B => (&mut self.b, &mut self.a),
        }
    }

    /// Append a line to the combat trace (only when verbose).
    pub fn log(&mut self, msg: impl Into<String>) {
        if self.verbose {
            self.combat_log.push(msg.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(str_: i32, dex: i32, con: i32) -> AbilityScores {
        AbilityScores {
            strength: str_,
            dexterity: dex,
            constitution: con,
            ..AbilityScores::default()
        }
    }

    #[test]
    fn ability_modifiers() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(16), 3);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn temp_hp_keeps_higher() {
        let mut c = Combatant::new("T", scores(10, 10, 10), 20, 10);
        c.gain_temp_hp(8);
        assert_eq!(c.temp_hp, 8);
        c.gain_temp_hp(5);
        assert_eq!(c.temp_hp, 8);
        c.gain_temp_hp(12);
        assert_eq!(c.temp_hp, 12);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut c = Combatant::new("T", scores(10, 10, 10), 20, 10);
        c.current_hp = 15;
        assert_eq!(c.heal(10), 5);
        assert_eq!(c.current_hp, 20);
    }

    #[test]
    fn resource_spend_and_restore() {
        let mut r = Resource::new(2);
        assert!(r.spend());
        assert!(r.spend());
        assert!(!r.spend());
        assert!(!r.available());
        r.restore();
        assert_eq!(r.current, 2);
    }

    #[test]
    fn start_turn_expires_effects() {
        let mut c = Combatant::new("T", scores(10, 10, 10), 20, 10);
        c.active_effects.push(ActiveEffect {
            name: "Hidden".into(),
            end_trigger: Some(EffectTrigger::StartOfTurn),
            advantage_on_attacks: true,
            ..ActiveEffect::default()
        });
        c.active_effects.push(ActiveEffect {
            name: "Shield of Faith".into(),
            duration: Some(2),
            ac_bonus: 2,
            ..ActiveEffect::default()
        });
        c.start_turn();
        assert_eq!(c.active_effects.len(), 1);
        assert_eq!(c.active_effects[0].duration, Some(1));
        c.start_turn();
        assert!(c.active_effects.is_empty());
    }

    #[test]
    fn prone_costs_half_speed_to_clear() {
        let mut c = Combatant::new("T", scores(10, 10, 10), 20, 10);
        c.conditions.insert(Condition::Prone);
        c.start_turn();
        assert!(!c.conditions.contains(&Condition::Prone));
        assert_eq!(c.turn.movement_remaining, 15);
    }

    #[test]
    fn reaction_released_at_end_of_turn() {
        let mut c = Combatant::new("T", scores(10, 10, 10), 20, 10);
        c.turn.reaction_used = true;
        c.start_turn();
        assert!(c.turn.reaction_used, "start_turn must not release reaction");
        c.end_turn();
        assert!(!c.turn.reaction_used);
    }

    #[test]
    fn fresh_copy_resets_everything() {
        let mut template = Combatant::new("T", scores(16, 14, 14), 20, 16);
        template
            .resources
            .insert(ResourceKind::SecondWind, Resource::new(2));

        let mut used = template.fresh_copy();
        used.current_hp = 3;
        used.temp_hp = 4;
        used.conditions.insert(Condition::Raging);
        used.spend_resource(ResourceKind::SecondWind);

        let fresh = used.fresh_copy();
        assert_eq!(fresh.current_hp, 20);
        assert_eq!(fresh.temp_hp, 0);
        assert!(fresh.conditions.is_empty());
        assert_eq!(fresh.resource(ResourceKind::SecondWind).unwrap().current, 2);
        // The original is untouched.
        assert_eq!(used.current_hp, 3);
    }

    #[test]
    fn dueling_bonus_only_one_handed_melee() {
        let mut c = Combatant::new("T", scores(16, 10, 10), 20, 16);
        c.fighting_style = Some(FightingStyle::Dueling);
        let longsword = crate::weapons::get_weapon("Longsword").unwrap();
        let greatsword = crate::weapons::get_weapon("Greatsword").unwrap();
        assert_eq!(c.damage_modifier(&longsword, false), 5); // +3 STR +2 dueling
        assert_eq!(c.damage_modifier(&greatsword, false), 3); // two-handed: no bonus
    }

    #[test]
    fn archery_bonus_only_ranged() {
        let mut c = Combatant::new("T", scores(10, 16, 10), 20, 14);
        c.fighting_style = Some(FightingStyle::Archery);
        let longbow = crate::weapons::get_weapon("Longbow").unwrap();
        let dagger = crate::weapons::get_weapon("Dagger").unwrap();
        assert_eq!(c.attack_modifier(&longbow), 7); // +3 DEX +2 prof +2 archery
        assert_eq!(c.attack_modifier(&dagger), 5); // finesse, no archery bonus
    }

    #[test]
    fn mastery_check_is_case_insensitive() {
        let mut c = Combatant::new("T", scores(16, 10, 10), 20, 16);
        c.weapon_masteries.push("greatsword".into());
        let greatsword = crate::weapons::get_weapon("Greatsword").unwrap();
        assert!(c.can_use_mastery(&greatsword));
    }
}
