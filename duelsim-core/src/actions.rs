//! Attack resolution and the small self-targeted combat actions.
//!
//! [`resolve_attack`] runs a single attack from roll to damage, including
//! advantage determination, Halfling Luck, the Lucky feat, critical hits,
//! sneak attack, on-hit giant ancestry riders and weapon mastery effects.

use crate::damage::{apply_attack_damage, knock_prone, DamageComponent};
use crate::dice::{d20, eval_dice, Advantage, DiceExpression};
use crate::effects::apply_sapped;
use crate::models::{
    CombatState, Condition, DamageType, Feature, FightingStyle, GiantAncestry, Mastery,
    OriginFeat, ResourceKind, Side, SpeciesTrait, Weapon,
};
use rand::Rng;

/// How an attack is being made, beyond the weapon itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackOptions {
    /// The weapon is being thrown rather than swung.
    pub is_thrown: bool,
    /// Unarmed strike; `weapon` supplies only the damage type.
    pub is_unarmed: bool,
    /// Extra attack granted by the Nick mastery (no ability modifier to
    /// damage without the Two-Weapon Fighting style).
    pub is_nick: bool,
}

/// Outcome of one resolved attack.
#[derive(Debug, Clone)]
pub struct AttackResult {
    pub hit: bool,
    pub critical: bool,
    /// HP the target actually lost, after resistance, temp HP and survival
    /// features. Graze damage on a miss lands here too.
    pub damage: i32,
    pub damage_type: DamageType,
    /// Final attack total (d20 + modifiers).
    pub attack_roll: i32,
    pub target_ac: i32,
}

/// Work out the advantage state for an attack, consuming one-shot sources
/// (Vex mark, Heroic Inspiration) as a side effect.
fn attack_advantage(state: &mut CombatState, attacker: Side) -> Advantage {
    let defender = attacker.opponent();
    let mut advantage = false;
    let mut disadvantage = false;

    {
        let atk = state.combatant(attacker);
        if atk.active_effects.iter().any(|e| e.advantage_on_attacks) {
            advantage = true;
        }
        if atk.active_effects.iter().any(|e| e.disadvantage_on_attacks) {
            disadvantage = true;
        }
    }

    // Vex mark grants advantage once, then clears.
    if state.combatant(attacker).vex_target == Some(defender) {
        advantage = true;
        state.combatant_mut(attacker).vex_target = None;
    }

    {
        let def = state.combatant(defender);
        if def.active_effects.iter().any(|e| e.grants_advantage_to_enemies) {
            advantage = true;
        }
        if def.conditions.contains(&Condition::Prone) {
            advantage = true;
        }
        if def.is_dodging() {
            disadvantage = true;
        }
    }

    // Heroic Inspiration fills in when nothing else tilts the roll.
    if !advantage
        && !disadvantage
        && state
            .combatant(attacker)
            .resource_available(ResourceKind::HeroicInspiration)
    {
        state
            .combatant_mut(attacker)
            .spend_resource(ResourceKind::HeroicInspiration);
        let name = state.combatant(attacker).name.clone();
        state.log(format!("  {name} spends Heroic Inspiration for advantage"));
        advantage = true;
    }

    Advantage::from_flags(advantage, disadvantage)
}

/// Roll the d20 for an attack, applying Halfling Luck to a natural 1.
fn attack_d20<R: Rng>(state: &mut CombatState, attacker: Side, advantage: Advantage, rng: &mut R) -> u32 {
    let mut roll = d20(rng, advantage);
    if roll == 1 && state.combatant(attacker).has_trait(SpeciesTrait::Luck) {
        roll = rng.gen_range(1..=20);
        let name = state.combatant(attacker).name.clone();
        state.log(format!("  {name} rerolls the natural 1 (Halfling Luck): {roll}"));
    }
    roll
}

/// Resolve one attack by `attacker` against the opponent.
pub fn resolve_attack<R: Rng>(
    state: &mut CombatState,
    attacker: Side,
    weapon: &Weapon,
    opts: AttackOptions,
    rng: &mut R,
) -> AttackResult {
    let defender = attacker.opponent();
    let advantage = attack_advantage(state, attacker);
    let had_advantage = advantage == Advantage::Advantage;

    let attack_mod = if opts.is_unarmed {
        state.combatant(attacker).unarmed_attack_mod()
    } else {
        state.combatant(attacker).attack_modifier(weapon)
    };
    let target_ac = state.combatant(defender).effective_ac();

    let roll = attack_d20(state, attacker, advantage, rng);
    let attack_total = roll as i32 + attack_mod;
    let critical = roll == 20;
    let natural_one = roll == 1;
    let mut hit = critical || (!natural_one && attack_total >= target_ac);

    let mut final_total = attack_total;
    let mut final_critical = critical;
    // A natural 1 is an automatic miss; Lucky may not reroll it.
    if !hit
        && !natural_one
        && state.combatant(attacker).origin_feat == Some(OriginFeat::Lucky)
        && state.combatant(attacker).resource_available(ResourceKind::LuckPoints)
    {
        state
            .combatant_mut(attacker)
            .spend_resource(ResourceKind::LuckPoints);
        let name = state.combatant(attacker).name.clone();
        let reroll = attack_d20(state, attacker, advantage, rng);
        final_total = reroll as i32 + attack_mod;
        final_critical = reroll == 20;
        hit = final_critical || (reroll != 1 && final_total >= target_ac);
        state.log(format!(
            "  {name} spends a Luck Point to reroll the miss: {final_total} vs AC {target_ac}"
        ));
    }

    if hit {
        return deliver_hit(
            state,
            attacker,
            weapon,
            &opts,
            final_critical,
            had_advantage,
            final_total,
            target_ac,
            rng,
        );
    }

    let graze = try_graze(state, attacker, weapon, &opts, rng);
    let name = state.combatant(attacker).name.clone();
    state.log(format!(
        "  {name} misses with {} ({final_total} vs AC {target_ac})",
        weapon.name
    ));
    AttackResult {
        hit: false,
        critical: false,
        damage: graze,
        damage_type: weapon.damage_type,
        attack_roll: final_total,
        target_ac,
    }
}

#[allow(clippy::too_many_arguments)]
fn deliver_hit<R: Rng>(
    state: &mut CombatState,
    attacker: Side,
    weapon: &Weapon,
    opts: &AttackOptions,
    critical: bool,
    had_advantage: bool,
    attack_total: i32,
    target_ac: i32,
    rng: &mut R,
) -> AttackResult {
    let defender = attacker.opponent();

    let dice = if opts.is_unarmed {
        state
            .combatant(attacker)
            .martial_arts_die
            .clone()
            .unwrap_or_else(|| DiceExpression::parse("1").expect("valid dice literal"))
    } else {
        weapon.damage.clone()
    };

    let (minimum, use_savage) = {
        let atk = state.combatant(attacker);
        let gwf = !opts.is_unarmed
            && atk.fighting_style == Some(FightingStyle::GreatWeaponFighting)
            && weapon.is_melee()
            && (weapon.is_two_handed() || weapon.is_versatile());
        let savage = !opts.is_unarmed && atk.savage_attacker && !atk.turn.savage_attacker_used;
        (if gwf { Some(3) } else { None }, savage)
    };

    let base = if use_savage {
        state.combatant_mut(attacker).turn.savage_attacker_used = true;
        dice.roll_twice_keep_best(rng, minimum)
    } else {
        dice.roll(rng, minimum)
    };
    let mut damage = base.total;
    if critical {
        // Critical hits double the dice, not the modifiers.
        let extra = dice.roll(rng, minimum);
        damage += extra.total - extra.modifier;
    }

    let flat = {
        let atk = state.combatant(attacker);
        if opts.is_unarmed {
            let mut m = atk.unarmed_damage_mod();
            if atk.is_raging() {
                m += atk.rage_damage();
            }
            m
        } else if opts.is_nick && atk.fighting_style != Some(FightingStyle::TwoWeaponFighting) {
            weapon.bonus
        } else {
            atk.damage_modifier(weapon, opts.is_thrown)
        }
    };
    damage = (damage + flat).max(1);

    // Sneak attack: once per turn, needs the roll to have had advantage.
    let sneak_dice = state.combatant(attacker).sneak_attack_dice.clone();
    if let Some(sneak) = sneak_dice {
        if had_advantage && !state.combatant(attacker).turn.sneak_attack_delivered {
            let mut extra = sneak.roll(rng, None).total;
            if critical {
                let second = sneak.roll(rng, None);
                extra += second.total - second.modifier;
            }
            damage += extra;
            state.combatant_mut(attacker).turn.sneak_attack_delivered = true;
            let name = state.combatant(attacker).name.clone();
            state.log(format!("  {name} lands Sneak Attack for +{extra}"));
        }
    }

    let mut packet: Vec<DamageComponent> = vec![(damage, weapon.damage_type)];

    // Giant ancestry on-hit riders.
    let ancestry = state.combatant(attacker).giant_ancestry;
    if ancestry == Some(GiantAncestry::Fire)
        && state
            .combatant(attacker)
            .resource_available(ResourceKind::FiresBurn)
    {
        state
            .combatant_mut(attacker)
            .spend_resource(ResourceKind::FiresBurn);
        let burn = eval_dice("1d10", rng).expect("valid dice literal");
        packet.push((burn.total, DamageType::Fire));
    }
    if ancestry == Some(GiantAncestry::Frost)
        && state
            .combatant(attacker)
            .resource_available(ResourceKind::FrostsChill)
    {
        state
            .combatant_mut(attacker)
            .spend_resource(ResourceKind::FrostsChill);
        let chill = eval_dice("1d6", rng).expect("valid dice literal");
        packet.push((chill.total, DamageType::Cold));
        state.combatant_mut(defender).speed_penalty = 10;
    }

    let actual = apply_attack_damage(state, defender, &packet, rng, true);

    // Weapon mastery effects on a hit.
    if !opts.is_unarmed && state.combatant(attacker).can_use_mastery(weapon) {
        match weapon.mastery {
            Some(Mastery::Vex) => {
                state.combatant_mut(attacker).vex_target = Some(defender);
            }
            Some(Mastery::Sap) => {
                apply_sapped(state.combatant_mut(defender), &weapon.name);
            }
            Some(Mastery::Slow) => {
                state.combatant_mut(defender).speed_penalty = 10;
            }
            Some(Mastery::Topple) => {
                let dc = 8
                    + state.combatant(attacker).attack_ability_mod(weapon)
                    + state.combatant(attacker).proficiency_bonus;
                let save = d20(rng, Advantage::Normal) as i32 + state.combatant(defender).con_mod();
                if save < dc {
                    knock_prone(state, defender);
                    let name = state.combatant(defender).name.clone();
                    state.log(format!("  {name} is toppled prone ({save} vs DC {dc})"));
                }
            }
            Some(Mastery::Push) => {
                state.distance = (state.distance + 10).min(120);
            }
            // Graze only matters on a miss; Cleave needs a second target.
            _ => {}
        }
    }

    // Hill's Tumble: knock the target prone on a hit.
    if ancestry == Some(GiantAncestry::Hill)
        && !state
            .combatant(defender)
            .conditions
            .contains(&Condition::Prone)
        && state
            .combatant(attacker)
            .resource_available(ResourceKind::HillsTumble)
    {
        state
            .combatant_mut(attacker)
            .spend_resource(ResourceKind::HillsTumble);
        knock_prone(state, defender);
        let name = state.combatant(defender).name.clone();
        state.log(format!("  {name} is knocked prone (Hill's Tumble)"));
    }

    let attacker_name = state.combatant(attacker).name.clone();
    let defender_name = state.combatant(defender).name.clone();
    let crit_tag = if critical { " CRITICAL" } else { "" };
    state.log(format!(
        "  {attacker_name} hits{crit_tag} with {} for {actual} ({attack_total} vs AC {target_ac}), {defender_name} at {} HP",
        weapon.name,
        state.combatant(defender).current_hp
    ));

    AttackResult {
        hit: true,
        critical,
        damage: actual,
        damage_type: weapon.damage_type,
        attack_roll: attack_total,
        target_ac,
    }
}

/// Graze: a missed attack with a Graze-mastery weapon still deals the
/// attack ability modifier in damage. Returns the HP actually lost.
fn try_graze<R: Rng>(
    state: &mut CombatState,
    attacker: Side,
    weapon: &Weapon,
    opts: &AttackOptions,
    rng: &mut R,
) -> i32 {
    if opts.is_unarmed {
        return 0;
    }
    let atk = state.combatant(attacker);
    if weapon.mastery != Some(Mastery::Graze) || !atk.can_use_mastery(weapon) {
        return 0;
    }
    let amount = atk.attack_ability_mod(weapon).max(0);
    if amount == 0 {
        return 0;
    }
    let actual = apply_attack_damage(
        state,
        attacker.opponent(),
        &[(amount, weapon.damage_type)],
        rng,
        true,
    );
    let name = state.combatant(attacker).name.clone();
    state.log(format!("  {name} grazes for {actual}"));
    actual
}

/// Second Wind: bonus action, heal 1d10 + fighter level.
pub fn do_second_wind<R: Rng>(state: &mut CombatState, side: Side, rng: &mut R) -> bool {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used
            || !c.has_feature(Feature::SecondWind)
            || !c.resource_available(ResourceKind::SecondWind)
        {
            return false;
        }
    }
    let roll = eval_dice("1d10", rng).expect("valid dice literal");
    let c = state.combatant_mut(side);
    c.spend_resource(ResourceKind::SecondWind);
    c.turn.bonus_action_used = true;
    let healed = c.heal(roll.total + c.level as i32);
    let name = c.name.clone();
    let hp = c.current_hp;
    state.log(format!("  {name} uses Second Wind, healing {healed} (now {hp} HP)"));
    true
}

/// Dodge action: attacks against the dodger have disadvantage until the
/// start of its next turn.
pub fn do_dodge(state: &mut CombatState, side: Side) {
    let c = state.combatant_mut(side);
    c.turn.action_used = true;
    c.conditions.insert(Condition::Dodging);
    let name = c.name.clone();
    state.log(format!("  {name} takes the Dodge action"));
}

/// Dash action: double movement for the turn.
pub fn do_dash(state: &mut CombatState, side: Side) {
    let c = state.combatant_mut(side);
    c.turn.action_used = true;
    c.turn.movement_remaining += c.speed;
}
