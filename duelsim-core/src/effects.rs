//! Constructors for the timed effects class features apply.

use crate::models::{ActiveEffect, Combatant, Condition, DamageType, EffectTrigger};

/// Enter a rage: condition plus a 10-round effect granting physical
/// resistance and the rage damage bonus.
pub fn apply_rage(combatant: &mut Combatant) {
    combatant.conditions.insert(Condition::Raging);
    combatant.active_effects.push(ActiveEffect {
        name: "Rage".into(),
        source: "rage".into(),
        duration: Some(10),
        damage_resistance: vec![
            DamageType::Bludgeoning,
            DamageType::Piercing,
            DamageType::Slashing,
        ],
        rage_damage_bonus: 2,
        ..ActiveEffect::default()
    });
}

/// Reckless Attack: advantage on the attacker's attacks until its next
/// turn, and every enemy attack against it gains advantage too.
pub fn apply_reckless_attack(combatant: &mut Combatant) {
    combatant.active_effects.push(ActiveEffect {
        name: "Reckless (advantage)".into(),
        source: "reckless_attack".into(),
        end_trigger: Some(EffectTrigger::StartOfTurn),
        advantage_on_attacks: true,
        ..ActiveEffect::default()
    });
    combatant.active_effects.push(ActiveEffect {
        name: "Reckless (exposed)".into(),
        source: "reckless_attack".into(),
        end_trigger: Some(EffectTrigger::StartOfTurn),
        grants_advantage_to_enemies: true,
        ..ActiveEffect::default()
    });
}

/// Successful Cunning Action: Hide. Advantage on the next attack, gone at
/// the start of the hider's next turn.
pub fn apply_hidden(combatant: &mut Combatant) {
    combatant.active_effects.push(ActiveEffect {
        name: "Hidden".into(),
        source: "cunning_action".into(),
        end_trigger: Some(EffectTrigger::StartOfTurn),
        advantage_on_attacks: true,
        ..ActiveEffect::default()
    });
}

/// Sap mastery: disadvantage on the target's next attack.
pub fn apply_sapped(combatant: &mut Combatant, source: &str) {
    combatant.active_effects.push(ActiveEffect {
        name: "Sapped".into(),
        source: source.into(),
        end_trigger: Some(EffectTrigger::StartOfTurn),
        disadvantage_on_attacks: true,
        ..ActiveEffect::default()
    });
}
