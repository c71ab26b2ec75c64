//! Turn orchestration for a 1v1 duel.
//!
//! [`run_combat`] rolls initiative, then alternates turns until one side
//! drops or the round cap is reached. Each turn asks the side's tactics for
//! an ordered list of decisions and dispatches them to handlers; every
//! handler re-validates its own preconditions and silently no-ops when they
//! fail, so tactics never need perfect knowledge of the action economy.

use crate::actions::{
    do_dash, do_second_wind, resolve_attack, AttackOptions,
};
use crate::dice::{d20, Advantage, DiceExpression};
use crate::effects::{apply_hidden, apply_rage, apply_reckless_attack};
use crate::models::{
    CombatState, Combatant, Condition, DamageType, Feature, Mastery, ResourceKind, Side, Weapon,
    WeaponCategory,
};
use crate::tactics::{Decision, DecisionKind, Tactics};
use rand::Rng;

/// Knobs for a single duel.
#[derive(Debug, Clone)]
pub struct CombatOptions {
    /// Feet between the duelists at the start.
    pub starting_distance: u32,
    /// Record a full combat log on the returned state.
    pub verbose: bool,
}

impl Default for CombatOptions {
    fn default() -> Self {
        CombatOptions {
            starting_distance: 60,
            verbose: false,
        }
    }
}

/// A duel that reaches this round count is scored as a draw.
pub const MAX_ROUNDS: u32 = 100;

/// Roll initiative for one combatant.
pub fn roll_initiative<R: Rng>(rng: &mut R, combatant: &Combatant) -> i32 {
    d20(rng, Advantage::Normal) as i32 + combatant.dex_mod() + combatant.initiative_bonus
}

/// Turn order from initiative totals, DEX as tiebreaker. A full tie goes
/// to side A.
pub fn turn_order(init_a: i32, init_b: i32, dex_a: i32, dex_b: i32) -> [Side; 2] {
    if init_a > init_b {
        [Side::A, Side::B]
    } else if init_b > init_a {
        [Side::B, Side::A]
    } else if dex_a >= dex_b {
        [Side::A, Side::B]
    } else {
        [Side::B, Side::A]
    }
}

/// Run one duel to completion and return the final state.
pub fn run_combat<R: Rng>(
    a: Combatant,
    b: Combatant,
    tactics_a: &dyn Tactics,
    tactics_b: &dyn Tactics,
    options: &CombatOptions,
    rng: &mut R,
) -> CombatState {
    let mut state = CombatState::new(a, b, options.starting_distance, options.verbose);

    let init_a = roll_initiative(rng, &state.a);
    let init_b = roll_initiative(rng, &state.b);
    state.turn_order = turn_order(init_a, init_b, state.a.dex_mod(), state.b.dex_mod());
    state.log(format!(
        "Initiative: {} {init_a}, {} {init_b}; {} acts first",
        state.a.name, state.b.name, state.combatant(state.turn_order[0]).name
    ));

    while state.a.is_alive() && state.b.is_alive() && state.round < MAX_ROUNDS {
        state.round += 1;
        state.log(format!("--- Round {} (distance {} ft) ---", state.round, state.distance));
        for side in state.turn_order {
            if !state.a.is_alive() || !state.b.is_alive() {
                break;
            }
            let tactics = match side {
                Side::A => tactics_a,
                Side::B => tactics_b,
            };
            execute_turn(&mut state, side, tactics, rng);
        }
    }

    state
}

fn execute_turn<R: Rng>(state: &mut CombatState, side: Side, tactics: &dyn Tactics, rng: &mut R) {
    state.combatant_mut(side).start_turn();
    let decisions = tactics.decide_turn(state, side);
    for decision in decisions {
        if !state.combatant(side.opponent()).is_alive() {
            break;
        }
        dispatch(state, side, &decision, rng);
    }
    state.combatant_mut(side).end_turn();
}

fn dispatch<R: Rng>(state: &mut CombatState, side: Side, decision: &Decision, rng: &mut R) {
    match decision.kind {
        DecisionKind::Rage => do_rage(state, side),
        DecisionKind::Reckless => do_reckless(state, side),
        DecisionKind::Move => do_move(state, side),
        DecisionKind::Attack => do_melee_attack(state, side, decision.weapon.as_deref(), rng),
        DecisionKind::RangedAttack => {
            do_ranged_attack(state, side, decision.weapon.as_deref(), rng)
        }
        DecisionKind::Flurry => do_flurry(state, side, rng),
        DecisionKind::MartialArtsStrike => do_martial_arts_strike(state, side, rng),
        DecisionKind::CunningHide => do_cunning_hide(state, side, rng),
        DecisionKind::ActionSurge => do_action_surge(state, side, rng),
        DecisionKind::SecondWind => {
            do_second_wind(state, side, rng);
        }
        DecisionKind::PatientDefense => do_patient_defense(state, side),
    }
}

/// The unarmed strike stand-in used when a combatant has no weapon left to
/// swing. Monks substitute their Martial Arts die for the flat 1.
pub fn unarmed_weapon(combatant: &Combatant) -> Weapon {
    Weapon {
        name: "Unarmed Strike".into(),
        damage: combatant
            .martial_arts_die
            .clone()
            .unwrap_or_else(|| DiceExpression::parse("1").expect("valid dice literal")),
        damage_type: DamageType::Bludgeoning,
        properties: Vec::new(),
        mastery: None,
        bonus: 0,
        category: WeaponCategory::Simple,
        versatile_damage: None,
        range_normal: 5,
        range_long: None,
        thrown_range: None,
    }
}

// ============================================================================
// Decision handlers
// ============================================================================

fn do_rage(state: &mut CombatState, side: Side) {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used
            || c.is_raging()
            || !c.has_feature(Feature::Rage)
            || !c.resource_available(ResourceKind::Rage)
        {
            return;
        }
    }
    let c = state.combatant_mut(side);
    c.spend_resource(ResourceKind::Rage);
    c.turn.bonus_action_used = true;
    apply_rage(c);
    let name = c.name.clone();
    state.log(format!("  {name} enters a rage"));
}

fn do_reckless(state: &mut CombatState, side: Side) {
    let c = state.combatant(side);
    if !c.has_feature(Feature::RecklessAttack)
        || c.active_effects.iter().any(|e| e.source == "reckless_attack")
    {
        return;
    }
    apply_reckless_attack(state.combatant_mut(side));
    let name = state.combatant(side).name.clone();
    state.log(format!("  {name} attacks recklessly"));
}

/// Close toward the opponent, dashing if a full move isn't enough.
fn do_move(state: &mut CombatState, side: Side) {
    close_distance(state, side, 5);
    if state.distance > 5 && !state.combatant(side).turn.action_used {
        do_dash(state, side);
        close_distance(state, side, 5);
    }
}

fn close_distance(state: &mut CombatState, side: Side, reach: u32) {
    let gap = state.distance.saturating_sub(reach);
    let step = state.combatant(side).turn.movement_remaining.min(gap);
    if step == 0 {
        return;
    }
    state.combatant_mut(side).turn.movement_remaining -= step;
    state.distance -= step;
    let name = state.combatant(side).name.clone();
    state.log(format!(
        "  {name} moves {step} ft (distance now {} ft)",
        state.distance
    ));
}

fn do_melee_attack<R: Rng>(
    state: &mut CombatState,
    side: Side,
    named: Option<&str>,
    rng: &mut R,
) {
    if state.combatant(side).turn.action_used {
        return;
    }
    let chosen = {
        let c = state.combatant(side);
        named
            .and_then(|n| c.find_weapon(n))
            .filter(|w| w.is_melee())
            .or_else(|| c.best_melee_weapon())
            .cloned()
    };
    let (weapon, is_unarmed) = match chosen {
        Some(w) => (w, false),
        None => (unarmed_weapon(state.combatant(side)), true),
    };
    let reach = weapon.effective_range().max(5);

    if state.distance > reach {
        close_distance(state, side, reach);
    }
    if state.distance > reach {
        // Out of reach even after moving: shoot if possible, else dash in.
        let has_ranged = state.combatant(side).best_ranged_weapon().is_some();
        if has_ranged {
            do_ranged_attack(state, side, None, rng);
            return;
        }
        if !state.combatant(side).turn.action_used {
            do_dash(state, side);
            close_distance(state, side, reach);
        }
        if state.distance > reach {
            return;
        }
    }

    {
        let c = state.combatant_mut(side);
        c.turn.action_used = true;
        // Nick is once per attack action; a second action (Action Surge)
        // brings a fresh off-hand attack.
        c.turn.nick_attack_used = false;
    }
    let attacks = state.combatant(side).extra_attacks + 1;
    let opts = AttackOptions {
        is_unarmed,
        ..AttackOptions::default()
    };
    for _ in 0..attacks {
        if !state.combatant(side.opponent()).is_alive() {
            return;
        }
        resolve_attack(state, side, &weapon, opts, rng);
    }
    if state.combatant(side.opponent()).is_alive() {
        try_nick_extra_attack(state, side, &weapon, rng);
    }
}

fn do_ranged_attack<R: Rng>(
    state: &mut CombatState,
    side: Side,
    named: Option<&str>,
    rng: &mut R,
) {
    if state.combatant(side).turn.action_used {
        return;
    }
    let chosen = {
        let c = state.combatant(side);
        named
            .and_then(|n| c.find_weapon(n))
            .filter(|w| w.is_ranged() || w.is_thrown())
            .or_else(|| c.best_ranged_weapon())
            .cloned()
    };
    let Some(weapon) = chosen else {
        return;
    };
    let range = weapon.effective_range();
    if state.distance > range {
        close_distance(state, side, range);
        if state.distance > range {
            return;
        }
    }

    state.combatant_mut(side).turn.action_used = true;
    let attacks = state.combatant(side).extra_attacks + 1;
    let opts = AttackOptions {
        is_thrown: weapon.is_melee(),
        ..AttackOptions::default()
    };
    for _ in 0..attacks {
        if !state.combatant(side.opponent()).is_alive() {
            return;
        }
        resolve_attack(state, side, &weapon, opts, rng);
    }
}

fn do_flurry<R: Rng>(state: &mut CombatState, side: Side, rng: &mut R) {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used
            || state.distance > 5
            || !c.has_feature(Feature::FlurryOfBlows)
            || !c.resource_available(ResourceKind::FocusPoints)
        {
            return;
        }
    }
    let c = state.combatant_mut(side);
    c.spend_resource(ResourceKind::FocusPoints);
    c.turn.bonus_action_used = true;
    let name = c.name.clone();
    state.log(format!("  {name} spends a Focus Point on Flurry of Blows"));

    let weapon = unarmed_weapon(state.combatant(side));
    let opts = AttackOptions {
        is_unarmed: true,
        ..AttackOptions::default()
    };
    for _ in 0..2 {
        if !state.combatant(side.opponent()).is_alive() {
            return;
        }
        resolve_attack(state, side, &weapon, opts, rng);
    }
}

fn do_martial_arts_strike<R: Rng>(state: &mut CombatState, side: Side, rng: &mut R) {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used || state.distance > 5 || !c.has_feature(Feature::MartialArts) {
            return;
        }
    }
    state.combatant_mut(side).turn.bonus_action_used = true;
    let weapon = unarmed_weapon(state.combatant(side));
    let opts = AttackOptions {
        is_unarmed: true,
        ..AttackOptions::default()
    };
    resolve_attack(state, side, &weapon, opts, rng);
}

fn do_cunning_hide<R: Rng>(state: &mut CombatState, side: Side, rng: &mut R) {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used || !c.has_feature(Feature::CunningAction) {
            return;
        }
    }
    let stealth = {
        let c = state.combatant(side);
        d20(rng, Advantage::Normal) as i32 + c.dex_mod() + c.proficiency_bonus
    };
    let passive_perception = 10 + state.combatant(side.opponent()).wis_mod();
    state.combatant_mut(side).turn.bonus_action_used = true;
    if stealth >= passive_perception {
        apply_hidden(state.combatant_mut(side));
        let name = state.combatant(side).name.clone();
        state.log(format!(
            "  {name} hides ({stealth} vs passive perception {passive_perception})"
        ));
    }
}

/// Action Surge: only meaningful after the action is spent; grants a second
/// full attack action.
fn do_action_surge<R: Rng>(state: &mut CombatState, side: Side, rng: &mut R) {
    {
        let c = state.combatant(side);
        if !c.turn.action_used
            || !c.has_feature(Feature::ActionSurge)
            || !c.resource_available(ResourceKind::ActionSurge)
        {
            return;
        }
    }
    let c = state.combatant_mut(side);
    c.spend_resource(ResourceKind::ActionSurge);
    c.turn.action_used = false;
    let name = c.name.clone();
    state.log(format!("  {name} uses Action Surge"));

    if state.distance > 5 && state.combatant(side).best_ranged_weapon().is_some() {
        do_ranged_attack(state, side, None, rng);
    } else {
        do_melee_attack(state, side, None, rng);
    }
}

/// Patient Defense: Dodge as a bonus action for a Focus Point.
fn do_patient_defense(state: &mut CombatState, side: Side) {
    {
        let c = state.combatant(side);
        if c.turn.bonus_action_used
            || !c.has_feature(Feature::PatientDefense)
            || !c.resource_available(ResourceKind::FocusPoints)
        {
            return;
        }
    }
    let c = state.combatant_mut(side);
    c.spend_resource(ResourceKind::FocusPoints);
    c.turn.bonus_action_used = true;
    c.conditions.insert(Condition::Dodging);
    let name = c.name.clone();
    state.log(format!("  {name} spends a Focus Point on Patient Defense"));
}

/// Nick mastery: attacking with a light Nick weapon allows one extra attack
/// with a different light melee weapon, once per attack action, outside the
/// bonus action economy.
fn try_nick_extra_attack<R: Rng>(
    state: &mut CombatState,
    side: Side,
    main: &Weapon,
    rng: &mut R,
) {
    if state.distance > 5 {
        return;
    }
    let off_hand = {
        let c = state.combatant(side);
        if c.turn.nick_attack_used
            || main.mastery != Some(Mastery::Nick)
            || !main.is_light()
            || !c.can_use_mastery(main)
        {
            return;
        }
        c.weapons
            .iter()
            .find(|w| w.is_light() && w.is_melee() && !w.name.eq_ignore_ascii_case(&main.name))
            .cloned()
    };
    let Some(off_hand) = off_hand else {
        return;
    };
    state.combatant_mut(side).turn.nick_attack_used = true;
    let opts = AttackOptions {
        is_nick: true,
        ..AttackOptions::default()
    };
    resolve_attack(state, side, &off_hand, opts, rng);
}
