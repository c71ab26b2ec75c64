//! Decision policies: what a combatant tries to do on its turn.
//!
//! A policy returns an ordered list of [`Decision`]s; the combat loop
//! dispatches each one to a handler that re-validates preconditions. Built-in
//! policies are priority tables of (predicate, decision) rules, so a rule
//! that does not apply this turn simply contributes nothing.

use crate::models::{CombatState, Feature, Side};
use std::fmt;
use std::str::FromStr;

/// One intended act for the turn.
#[derive(Debug, Clone)]
pub struct Decision {
    pub kind: DecisionKind,
    /// Specific weapon to use, by name. `None` lets the handler pick.
    pub weapon: Option<String>,
}

impl Decision {
    pub fn of(kind: DecisionKind) -> Decision {
        Decision { kind, weapon: None }
    }

    pub fn with_weapon(kind: DecisionKind, weapon: impl Into<String>) -> Decision {
        Decision {
            kind,
            weapon: Some(weapon.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Rage,
    Reckless,
    Move,
    Attack,
    RangedAttack,
    Flurry,
    MartialArtsStrike,
    CunningHide,
    ActionSurge,
    SecondWind,
    PatientDefense,
}

/// A turn-planning policy.
pub trait Tactics {
    fn decide_turn(&self, state: &CombatState, side: Side) -> Vec<Decision>;
}

/// Named built-in policies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Doctrine {
    #[default]
    Aggressive,
    Defensive,
    /// Does nothing every turn. Used as a target dummy policy.
    Passive,
}

impl Doctrine {
    pub fn tactics(&self) -> Box<dyn Tactics + Send + Sync> {
        match self {
            Doctrine::Aggressive => Box::new(PriorityTactics::aggressive()),
            Doctrine::Defensive => Box::new(PriorityTactics::defensive()),
            Doctrine::Passive => Box::new(PassiveTactics),
        }
    }
}

impl fmt::Display for Doctrine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Doctrine::Aggressive => write!(f, "aggressive"),
            Doctrine::Defensive => write!(f, "defensive"),
            Doctrine::Passive => write!(f, "passive"),
        }
    }
}

impl FromStr for Doctrine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(Doctrine::Aggressive),
            "defensive" => Ok(Doctrine::Defensive),
            "passive" => Ok(Doctrine::Passive),
            other => Err(format!(
                "unknown doctrine '{other}' (expected aggressive, defensive or passive)"
            )),
        }
    }
}

/// Stands still and takes it.
struct PassiveTactics;

impl Tactics for PassiveTactics {
    fn decide_turn(&self, _state: &CombatState, _side: Side) -> Vec<Decision> {
        Vec::new()
    }
}

type Predicate = fn(&CombatState, Side) -> bool;
type Construct = fn(&CombatState, Side) -> Decision;

/// One row of a priority table.
struct Rule {
    applies: Predicate,
    decide: Construct,
}

impl Rule {
    fn new(applies: Predicate, kind: DecisionKind) -> Rule {
        // Capture-free closures coerce to fn pointers, so the constructor
        // table can stay a plain slice of function pairs.
        let decide: Construct = match kind {
            DecisionKind::Rage => |_, _| Decision::of(DecisionKind::Rage),
            DecisionKind::Reckless => |_, _| Decision::of(DecisionKind::Reckless),
            DecisionKind::Move => |_, _| Decision::of(DecisionKind::Move),
            DecisionKind::Attack => |_, _| Decision::of(DecisionKind::Attack),
            DecisionKind::RangedAttack => |_, _| Decision::of(DecisionKind::RangedAttack),
            DecisionKind::Flurry => |_, _| Decision::of(DecisionKind::Flurry),
            DecisionKind::MartialArtsStrike => {
                |_, _| Decision::of(DecisionKind::MartialArtsStrike)
            }
            DecisionKind::CunningHide => |_, _| Decision::of(DecisionKind::CunningHide),
            DecisionKind::ActionSurge => |_, _| Decision::of(DecisionKind::ActionSurge),
            DecisionKind::SecondWind => |_, _| Decision::of(DecisionKind::SecondWind),
            DecisionKind::PatientDefense => |_, _| Decision::of(DecisionKind::PatientDefense),
        };
        Rule { applies, decide }
    }
}

fn in_melee(state: &CombatState, _side: Side) -> bool {
    state.distance <= 5
}

fn out_of_melee_with_ranged(state: &CombatState, side: Side) -> bool {
    state.distance > 5 && state.combatant(side).best_ranged_weapon().is_some()
}

fn out_of_melee_without_ranged(state: &CombatState, side: Side) -> bool {
    state.distance > 5 && state.combatant(side).best_ranged_weapon().is_none()
}

fn can_rage(state: &CombatState, side: Side) -> bool {
    state.combatant(side).has_feature(Feature::Rage)
}

fn reckless_in_melee(state: &CombatState, side: Side) -> bool {
    state.distance <= 5 && state.combatant(side).has_feature(Feature::RecklessAttack)
}

fn always(_state: &CombatState, _side: Side) -> bool {
    true
}

fn has_flurry(state: &CombatState, side: Side) -> bool {
    state.combatant(side).has_feature(Feature::FlurryOfBlows)
}

fn has_martial_arts(state: &CombatState, side: Side) -> bool {
    state.combatant(side).has_feature(Feature::MartialArts)
}

fn hide_in_melee(state: &CombatState, side: Side) -> bool {
    state.distance <= 5 && state.combatant(side).has_feature(Feature::CunningAction)
}

fn has_action_surge(state: &CombatState, side: Side) -> bool {
    state.combatant(side).has_feature(Feature::ActionSurge)
}

fn hp_below(state: &CombatState, side: Side, percent: i32) -> bool {
    let c = state.combatant(side);
    c.has_feature(Feature::SecondWind) && c.current_hp * 100 < c.max_hp * percent
}

fn badly_hurt(state: &CombatState, side: Side) -> bool {
    hp_below(state, side, 50)
}

fn hurting(state: &CombatState, side: Side) -> bool {
    hp_below(state, side, 60)
}

fn wants_patient_defense(state: &CombatState, side: Side) -> bool {
    let c = state.combatant(side);
    c.has_feature(Feature::PatientDefense) && c.current_hp * 2 < c.max_hp
}

/// A priority table: every applicable rule contributes, in table order.
pub struct PriorityTactics {
    rules: Vec<Rule>,
}

impl PriorityTactics {
    /// Close and swing; burn resources to keep the pressure up.
    pub fn aggressive() -> PriorityTactics {
        PriorityTactics {
            rules: vec![
                Rule::new(can_rage, DecisionKind::Rage),
                Rule::new(reckless_in_melee, DecisionKind::Reckless),
                Rule::new(out_of_melee_with_ranged, DecisionKind::RangedAttack),
                Rule::new(out_of_melee_without_ranged, DecisionKind::Move),
                Rule::new(always, DecisionKind::Attack),
                Rule::new(has_flurry, DecisionKind::Flurry),
                Rule::new(has_martial_arts, DecisionKind::MartialArtsStrike),
                Rule::new(hide_in_melee, DecisionKind::CunningHide),
                Rule::new(has_action_surge, DecisionKind::ActionSurge),
                Rule::new(badly_hurt, DecisionKind::SecondWind),
            ],
        }
    }

    /// Patch up and mitigate first, then fight.
    pub fn defensive() -> PriorityTactics {
        PriorityTactics {
            rules: vec![
                Rule::new(can_rage, DecisionKind::Rage),
                Rule::new(hurting, DecisionKind::SecondWind),
                Rule::new(wants_patient_defense, DecisionKind::PatientDefense),
                Rule::new(out_of_melee_with_ranged, DecisionKind::RangedAttack),
                Rule::new(out_of_melee_without_ranged, DecisionKind::Move),
                Rule::new(always, DecisionKind::Attack),
                Rule::new(reckless_in_melee, DecisionKind::Reckless),
                Rule::new(has_action_surge, DecisionKind::ActionSurge),
            ],
        }
    }
}

impl Tactics for PriorityTactics {
    fn decide_turn(&self, state: &CombatState, side: Side) -> Vec<Decision> {
        self.rules
            .iter()
            .filter(|rule| (rule.applies)(state, side))
            .map(|rule| (rule.decide)(state, side))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbilityScores, CombatState, Combatant};

    fn plain(name: &str) -> Combatant {
        Combatant::new(name, AbilityScores::default(), 20, 14)
    }

    fn kinds(decisions: &[Decision]) -> Vec<DecisionKind> {
        decisions.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn passive_does_nothing() {
        let state = CombatState::new(plain("A"), plain("B"), 5, false);
        let tactics = Doctrine::Passive.tactics();
        assert!(tactics.decide_turn(&state, Side::A).is_empty());
    }

    #[test]
    fn aggressive_plain_fighter_just_attacks() {
        let state = CombatState::new(plain("A"), plain("B"), 5, false);
        let plan = PriorityTactics::aggressive().decide_turn(&state, Side::A);
        assert_eq!(kinds(&plan), vec![DecisionKind::Attack]);
    }

    #[test]
    fn aggressive_monk_plans_flurry_before_martial_arts() {
        let mut a = plain("A");
        a.features.insert(Feature::MartialArts);
        a.features.insert(Feature::FlurryOfBlows);
        let state = CombatState::new(a, plain("B"), 5, false);
        let plan = kinds(&PriorityTactics::aggressive().decide_turn(&state, Side::A));
        let flurry = plan.iter().position(|k| *k == DecisionKind::Flurry).unwrap();
        let strike = plan
            .iter()
            .position(|k| *k == DecisionKind::MartialArtsStrike)
            .unwrap();
        assert!(flurry < strike);
    }

    #[test]
    fn defensive_heals_before_attacking() {
        let mut a = plain("A");
        a.features.insert(Feature::SecondWind);
        a.current_hp = 5;
        let state = CombatState::new(a, plain("B"), 5, false);
        let plan = kinds(&PriorityTactics::defensive().decide_turn(&state, Side::A));
        let heal = plan
            .iter()
            .position(|k| *k == DecisionKind::SecondWind)
            .unwrap();
        let attack = plan.iter().position(|k| *k == DecisionKind::Attack).unwrap();
        assert!(heal < attack);
    }

    #[test]
    fn reckless_only_in_melee() {
        let mut a = plain("A");
        a.features.insert(Feature::RecklessAttack);
        let far = CombatState::new(a.clone(), plain("B"), 30, false);
        assert!(!kinds(&PriorityTactics::aggressive().decide_turn(&far, Side::A))
            .contains(&DecisionKind::Reckless));
        let near = CombatState::new(a, plain("B"), 5, false);
        assert!(kinds(&PriorityTactics::aggressive().decide_turn(&near, Side::A))
            .contains(&DecisionKind::Reckless));
    }

    #[test]
    fn doctrine_parses_from_str() {
        assert_eq!("aggressive".parse::<Doctrine>().unwrap(), Doctrine::Aggressive);
        assert_eq!("Defensive".parse::<Doctrine>().unwrap(), Doctrine::Defensive);
        assert!("berserk".parse::<Doctrine>().is_err());
    }
}
