//! The damage pipeline: how a packet of typed damage components lands on a
//! combatant.
//!
//! Order of application follows the 2024 rules: adjustments first (Stone's
//! Endurance), then resistance per type, then temp HP absorption, then real
//! HP, then Relentless Endurance. A reaction may fire at most once per
//! combatant per turn-cycle; the flag is released in `end_turn`.

use crate::dice::eval_dice;
use crate::models::{CombatState, Condition, DamageType, GiantAncestry, ResourceKind, Side};
use rand::Rng;

/// One typed component of a damage packet.
pub type DamageComponent = (i32, DamageType);

/// Apply a full damage packet to `target`, mutating state. Returns the
/// actual HP lost after absorption and survival clauses.
///
/// `allow_reactions` is false for nested packets (e.g. Storm's Thunder
/// retaliation) so a reaction can never trigger another reaction.
pub fn apply_attack_damage<R: Rng>(
    state: &mut CombatState,
    target: Side,
    components: &[DamageComponent],
    rng: &mut R,
    allow_reactions: bool,
) -> i32 {
    // Step 1: sum raw damage across all components.
    let raw_total: i32 = components.iter().map(|&(amount, _)| amount).sum();

    // Step 2: Stone's Endurance, a flat reduction on the raw total.
    let mut reduction = 0;
    if allow_reactions && !state.combatant(target).turn.reaction_used {
        let defender = state.combatant(target);
        if defender.giant_ancestry == Some(GiantAncestry::Stone)
            && defender.resource_available(ResourceKind::StonesEndurance)
        {
            let con_mod = defender.con_mod();
            let roll = eval_dice("1d12", rng).expect("valid dice literal");
            reduction = (roll.total + con_mod).max(0);

            let defender = state.combatant_mut(target);
            defender.spend_resource(ResourceKind::StonesEndurance);
            defender.turn.reaction_used = true;
            let name = defender.name.clone();
            state.log(format!(
                "  {name} uses Stone's Endurance, reducing {raw_total} by {reduction}"
            ));
        }
    }

    // Step 3: distribute the reduction proportionally across components.
    let adjusted_total = (raw_total - reduction).max(0);
    let ratio = if raw_total > 0 && adjusted_total > 0 {
        adjusted_total as f64 / raw_total as f64
    } else {
        0.0
    };

    // Step 4: resistance per type on the adjusted amounts.
    let mut total = 0;
    for &(amount, damage_type) in components {
        let mut adjusted = (amount as f64 * ratio).round() as i32;
        let resisted = state
            .combatant(target)
            .active_effects
            .iter()
            .any(|e| e.damage_resistance.contains(&damage_type));
        if resisted {
            adjusted /= 2;
        }
        total += adjusted;
    }

    // Step 5: Storm's Thunder retaliation against the attacker.
    if allow_reactions && total > 0 && !state.combatant(target).turn.reaction_used {
        let defender = state.combatant(target);
        if defender.giant_ancestry == Some(GiantAncestry::Storm)
            && defender.resource_available(ResourceKind::StormsThunder)
        {
            let defender = state.combatant_mut(target);
            defender.spend_resource(ResourceKind::StormsThunder);
            defender.turn.reaction_used = true;
            let defender_name = defender.name.clone();

            let thunder = eval_dice("1d8", rng).expect("valid dice literal");
            let actual = apply_attack_damage(
                state,
                target.opponent(),
                &[(thunder.total, DamageType::Thunder)],
                rng,
                false,
            );
            let attacker_name = state.combatant(target.opponent()).name.clone();
            state.log(format!(
                "  {defender_name} Storm's Thunder! {attacker_name} takes {actual} thunder damage"
            ));
        }
    }

    // Step 6: temp HP absorbs first, then real HP.
    let defender = state.combatant_mut(target);
    let hp_before = defender.current_hp;
    if defender.temp_hp > 0 {
        let absorbed = defender.temp_hp.min(total);
        defender.temp_hp -= absorbed;
        total -= absorbed;
    }
    defender.current_hp = (defender.current_hp - total).max(0);

    // Step 7: Relentless Endurance fires exactly once, on the 0-HP case.
    if defender.current_hp == 0 && defender.resource_available(ResourceKind::RelentlessEndurance) {
        defender.spend_resource(ResourceKind::RelentlessEndurance);
        defender.current_hp = 1;
        let name = defender.name.clone();
        state.log(format!(
            "  {name} uses Relentless Endurance! Drops to 1 HP instead of 0!"
        ));
    }

    hp_before - state.combatant(target).current_hp
}

/// Single-type convenience wrapper.
pub fn apply_damage<R: Rng>(
    state: &mut CombatState,
    target: Side,
    amount: i32,
    damage_type: DamageType,
    rng: &mut R,
) -> i32 {
    apply_attack_damage(state, target, &[(amount, damage_type)], rng, true)
}

/// Knock a combatant prone unless it already is.
pub fn knock_prone(state: &mut CombatState, target: Side) {
    state.combatant_mut(target).conditions.insert(Condition::Prone);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbilityScores, ActiveEffect, Combatant, Resource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dummy(name: &str, hp: i32) -> Combatant {
        Combatant::new(name, AbilityScores::default(), hp, 10)
    }

    fn state_with(a: Combatant, b: Combatant) -> CombatState {
        CombatState::new(a, b, 5, false)
    }

    #[test]
    fn plain_damage_reduces_hp() {
        let mut state = state_with(dummy("A", 20), dummy("B", 20));
        let mut rng = StdRng::seed_from_u64(1);
        let lost = apply_damage(&mut state, Side::B, 7, DamageType::Slashing, &mut rng);
        assert_eq!(lost, 7);
        assert_eq!(state.b.current_hp, 13);
    }

    #[test]
    fn damage_floors_at_zero_hp() {
        let mut state = state_with(dummy("A", 20), dummy("B", 5));
        let mut rng = StdRng::seed_from_u64(1);
        let lost = apply_damage(&mut state, Side::B, 50, DamageType::Slashing, &mut rng);
        assert_eq!(lost, 5);
        assert_eq!(state.b.current_hp, 0);
    }

    #[test]
    fn temp_hp_absorbs_before_real_hp() {
        let mut b = dummy("B", 20);
        b.gain_temp_hp(5);
        let mut state = state_with(dummy("A", 20), b);
        let mut rng = StdRng::seed_from_u64(1);

        let lost = apply_damage(&mut state, Side::B, 8, DamageType::Piercing, &mut rng);
        assert_eq!(state.b.temp_hp, 0);
        assert_eq!(state.b.current_hp, 17);
        assert_eq!(lost, 3, "only damage past temp HP counts as HP lost");

        // Temp HP fully exhausted before HP loss begins.
        let mut b = dummy("B", 20);
        b.gain_temp_hp(10);
        let mut state = state_with(dummy("A", 20), b);
        apply_damage(&mut state, Side::B, 4, DamageType::Piercing, &mut rng);
        assert_eq!(state.b.temp_hp, 6);
        assert_eq!(state.b.current_hp, 20);
    }

    #[test]
    fn resistance_halves_per_component() {
        let mut b = dummy("B", 50);
        b.active_effects.push(ActiveEffect {
            name: "Rage".into(),
            damage_resistance: vec![
                DamageType::Bludgeoning,
                DamageType::Piercing,
                DamageType::Slashing,
            ],
            rage_damage_bonus: 2,
            ..ActiveEffect::default()
        });
        let mut state = state_with(dummy("A", 20), b);
        let mut rng = StdRng::seed_from_u64(1);

        // 9 slashing is halved to 4; 10 fire passes through.
        let lost = apply_attack_damage(
            &mut state,
            Side::B,
            &[(9, DamageType::Slashing), (10, DamageType::Fire)],
            &mut rng,
            true,
        );
        assert_eq!(lost, 14);
    }

    #[test]
    fn relentless_endurance_fires_once() {
        let mut b = dummy("B", 10);
        b.resources
            .insert(ResourceKind::RelentlessEndurance, Resource::new(1));
        let mut state = state_with(dummy("A", 20), b);
        let mut rng = StdRng::seed_from_u64(1);

        let lost = apply_damage(&mut state, Side::B, 30, DamageType::Slashing, &mut rng);
        assert_eq!(state.b.current_hp, 1, "survives at exactly 1 HP");
        assert_eq!(lost, 9);
        assert!(!state.b.resource_available(ResourceKind::RelentlessEndurance));

        apply_damage(&mut state, Side::B, 30, DamageType::Slashing, &mut rng);
        assert_eq!(state.b.current_hp, 0, "second lethal hit is final");
    }

    #[test]
    fn stones_endurance_reduces_and_spends_reaction() {
        let mut b = dummy("B", 100);
        b.giant_ancestry = Some(GiantAncestry::Stone);
        b.resources
            .insert(ResourceKind::StonesEndurance, Resource::new(2));
        let mut state = state_with(dummy("A", 20), b);
        let mut rng = StdRng::seed_from_u64(7);

        let lost = apply_damage(&mut state, Side::B, 20, DamageType::Slashing, &mut rng);
        assert!(lost < 20, "reduction must lower the damage taken");
        assert!(state.b.turn.reaction_used);
        assert_eq!(state.b.resource(ResourceKind::StonesEndurance).unwrap().current, 1);

        // Reaction already used: second packet this turn-cycle is unreduced.
        let lost = apply_damage(&mut state, Side::B, 20, DamageType::Slashing, &mut rng);
        assert_eq!(lost, 20);
        assert_eq!(state.b.resource(ResourceKind::StonesEndurance).unwrap().current, 1);
    }

    #[test]
    fn storms_thunder_retaliates_without_chaining() {
        let mut b = dummy("B", 100);
        b.giant_ancestry = Some(GiantAncestry::Storm);
        b.resources
            .insert(ResourceKind::StormsThunder, Resource::new(2));
        // Attacker is also a storm goliath; the nested packet must not let
        // it react back.
        let mut a = dummy("A", 100);
        a.giant_ancestry = Some(GiantAncestry::Storm);
        a.resources
            .insert(ResourceKind::StormsThunder, Resource::new(2));
        let mut state = state_with(a, b);
        let mut rng = StdRng::seed_from_u64(3);

        apply_damage(&mut state, Side::B, 10, DamageType::Slashing, &mut rng);
        assert!(state.a.current_hp < 100, "attacker takes thunder damage");
        assert!(state.b.turn.reaction_used);
        assert_eq!(
            state.a.resource(ResourceKind::StormsThunder).unwrap().current,
            2,
            "nested packet must not trigger the attacker's reaction"
        );
    }
}
