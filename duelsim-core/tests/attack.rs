//! Statistical checks on single-attack resolution.

use duelsim_core::models::{AbilityScores, CombatState, Combatant, FightingStyle};
use duelsim_core::weapons::get_weapon;
use duelsim_core::{resolve_attack, AttackOptions, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn attacker() -> Combatant {
    // STR 16, proficiency +2: attack bonus +5.
    let mut c = Combatant::new(
        "Attacker",
        AbilityScores {
            strength: 16,
            ..AbilityScores::default()
        },
        30,
        14,
    );
    c.weapons.push(get_weapon("Greatsword").unwrap());
    c
}

fn dummy(ac: i32) -> Combatant {
    Combatant::new("Dummy", AbilityScores::default(), 10_000, ac)
}

/// Run `n` single attacks against a fresh dummy each time and count hits
/// and crits.
fn sample(ac: i32, n: u32, seed: u64) -> (u32, u32) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hits = 0;
    let mut crits = 0;
    for _ in 0..n {
        let mut state = CombatState::new(attacker(), dummy(ac), 5, false);
        let weapon = state.a.weapons[0].clone();
        let result = resolve_attack(&mut state, Side::A, &weapon, AttackOptions::default(), &mut rng);
        if result.hit {
            hits += 1;
        }
        if result.critical {
            crits += 1;
            assert!(result.hit, "a natural 20 always hits");
        }
    }
    (hits, crits)
}

#[test]
fn plus_five_hits_ac_ten_most_of_the_time() {
    // Needs 5+ on the d20: 80% hit chance.
    let (hits, _) = sample(10, 2_000, 1);
    let rate = hits as f64 / 2_000.0;
    assert!((0.75..=0.85).contains(&rate), "hit rate {rate} not ~0.80");
}

#[test]
fn plus_five_mostly_misses_ac_twenty_five() {
    // Only a natural 20 hits: 5%.
    let (hits, crits) = sample(25, 2_000, 2);
    let rate = hits as f64 / 2_000.0;
    assert!((0.02..=0.08).contains(&rate), "hit rate {rate} not ~0.05");
    assert_eq!(hits, crits, "against AC 25 every hit must be a crit");
}

#[test]
fn natural_twenty_always_hits_high_ac() {
    let (hits, crits) = sample(30, 10_000, 3);
    assert_eq!(hits, crits);
    assert!(
        (300..=700).contains(&crits),
        "crit count {crits} far from the expected 500"
    );
}

#[test]
fn natural_one_always_misses_low_ac() {
    // +5 vs AC 1: only a natural 1 misses.
    let (hits, _) = sample(1, 10_000, 4);
    let miss_rate = (10_000 - hits) as f64 / 10_000.0;
    assert!(
        (0.02..=0.08).contains(&miss_rate),
        "miss rate {miss_rate} not ~0.05"
    );
}

#[test]
fn greatsword_damage_stays_in_bounds() {
    // 2d6 + 3 STR: 5..=15 on a normal hit.
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..500 {
        let mut state = CombatState::new(attacker(), dummy(10), 5, false);
        let weapon = state.a.weapons[0].clone();
        let result = resolve_attack(&mut state, Side::A, &weapon, AttackOptions::default(), &mut rng);
        if result.hit && !result.critical {
            assert!(
                (5..=15).contains(&result.damage),
                "non-crit greatsword damage {} out of bounds",
                result.damage
            );
        }
    }
}

#[test]
fn dueling_longsword_damage_stays_in_bounds() {
    // 1d8 + 3 STR + 2 Dueling: 6..=13 on a normal hit.
    let mut rng = StdRng::seed_from_u64(6);
    for _ in 0..500 {
        let mut a = attacker();
        a.weapons = vec![get_weapon("Longsword").unwrap()];
        a.fighting_style = Some(FightingStyle::Dueling);
        let mut state = CombatState::new(a, dummy(10), 5, false);
        let weapon = state.a.weapons[0].clone();
        let result = resolve_attack(&mut state, Side::A, &weapon, AttackOptions::default(), &mut rng);
        if result.hit && !result.critical {
            assert!(
                (6..=13).contains(&result.damage),
                "dueling longsword damage {} out of bounds",
                result.damage
            );
        }
    }
}

#[test]
fn great_weapon_fighting_raises_average_damage() {
    let n = 4_000;
    let total_for = |gwf: bool, seed: u64| -> i64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut total = 0i64;
        for _ in 0..n {
            let mut a = attacker();
            if gwf {
                a.fighting_style = Some(FightingStyle::GreatWeaponFighting);
            }
            let mut state = CombatState::new(a, dummy(1), 5, false);
            let weapon = state.a.weapons[0].clone();
            let result =
                resolve_attack(&mut state, Side::A, &weapon, AttackOptions::default(), &mut rng);
            if result.hit {
                total += result.damage as i64;
            }
        }
        total
    };
    let plain = total_for(false, 7);
    let gwf = total_for(true, 7);
    assert!(gwf > plain, "GWF total {gwf} should beat plain {plain}");
}
