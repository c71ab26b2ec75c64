//! Monte Carlo matchup runner.
//!
//! Runs many independent duels between two build templates and aggregates
//! the outcomes. Each trial gets its own RNG seeded from the base seed plus
//! the trial index, so a report is exactly reproducible for a given seed and
//! trial count regardless of thread scheduling.

use crate::combat::{run_combat, CombatOptions, MAX_ROUNDS};
use crate::models::{Combatant, Side};
use crate::tactics::Doctrine;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// Knobs for one simulated matchup.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub trials: u32,
    pub seed: u64,
    pub tactics_a: Doctrine,
    pub tactics_b: Doctrine,
    pub starting_distance: u32,
    /// Keep the full combat log of the first trial on the report.
    pub verbose_first: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            trials: 1000,
            seed: 0,
            tactics_a: Doctrine::Aggressive,
            tactics_b: Doctrine::Aggressive,
            starting_distance: 60,
            verbose_first: false,
        }
    }
}

struct TrialOutcome {
    winner: Option<Side>,
    rounds: u32,
    damage_by_a: i32,
    damage_by_b: i32,
    winner_hp: i32,
    log: Vec<String>,
}

/// Aggregated results of one matchup.
#[derive(Debug, Clone)]
pub struct MatchupReport {
    pub name_a: String,
    pub name_b: String,
    pub trials: u32,
    pub wins_a: u32,
    pub wins_b: u32,
    pub draws: u32,
    pub avg_rounds: f64,
    /// Mean damage dealt per round, across all trials.
    pub damage_per_round_a: f64,
    pub damage_per_round_b: f64,
    /// Mean HP the winner had left, across decided trials.
    pub avg_winner_hp: f64,
    /// Combat log of the first trial, when requested.
    pub first_log: Vec<String>,
}

impl MatchupReport {
    pub fn win_rate_a(&self) -> f64 {
        self.wins_a as f64 / self.trials as f64
    }

    pub fn win_rate_b(&self) -> f64 {
        self.wins_b as f64 / self.trials as f64
    }
}

impl fmt::Display for MatchupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} vs {} ({} trials)",
            self.name_a, self.name_b, self.trials
        )?;
        writeln!(
            f,
            "  {:<24} {:>6.1}%  ({} wins)",
            self.name_a,
            100.0 * self.win_rate_a(),
            self.wins_a
        )?;
        writeln!(
            f,
            "  {:<24} {:>6.1}%  ({} wins)",
            self.name_b,
            100.0 * self.win_rate_b(),
            self.wins_b
        )?;
        if self.draws > 0 {
            writeln!(
                f,
                "  {:<24} {:>6.1}%  ({})",
                "draws",
                100.0 * self.draws as f64 / self.trials as f64,
                self.draws
            )?;
        }
        writeln!(f, "  avg rounds: {:.1}", self.avg_rounds)?;
        writeln!(
            f,
            "  damage/round: {} {:.2}, {} {:.2}",
            self.name_a, self.damage_per_round_a, self.name_b, self.damage_per_round_b
        )?;
        write!(f, "  avg winner HP: {:.1}", self.avg_winner_hp)
    }
}

/// Run a full matchup between two build templates.
pub fn run_simulations(
    a: &Combatant,
    b: &Combatant,
    options: &SimulationOptions,
) -> MatchupReport {
    let tactics_a = options.tactics_a.tactics();
    let tactics_b = options.tactics_b.tactics();
    let started = Instant::now();

    let outcomes: Vec<TrialOutcome> = (0..options.trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(trial as u64));
            let combat_options = CombatOptions {
                starting_distance: options.starting_distance,
                verbose: options.verbose_first && trial == 0,
            };
            let state = run_combat(
                a.fresh_copy(),
                b.fresh_copy(),
                tactics_a.as_ref(),
                tactics_b.as_ref(),
                &combat_options,
                &mut rng,
            );

            let winner = match (state.a.is_alive(), state.b.is_alive()) {
                (true, false) => Some(Side::A),
                (false, true) => Some(Side::B),
                _ => None,
            };
            TrialOutcome {
                winner,
                rounds: state.round,
                damage_by_a: state.b.max_hp - state.b.current_hp,
                damage_by_b: state.a.max_hp - state.a.current_hp,
                winner_hp: winner.map_or(0, |side| state.combatant(side).current_hp),
                log: state.combat_log,
            }
        })
        .collect();

    let trials = options.trials.max(1);
    let wins_a = outcomes.iter().filter(|o| o.winner == Some(Side::A)).count() as u32;
    let wins_b = outcomes.iter().filter(|o| o.winner == Some(Side::B)).count() as u32;
    let draws = trials - wins_a - wins_b;
    let total_rounds: u64 = outcomes.iter().map(|o| o.rounds as u64).sum();
    let total_rounds = total_rounds.max(1);
    let decided = (wins_a + wins_b).max(1);

    let report = MatchupReport {
        name_a: a.name.clone(),
        name_b: b.name.clone(),
        trials,
        wins_a,
        wins_b,
        draws,
        avg_rounds: outcomes.iter().map(|o| o.rounds as f64).sum::<f64>() / trials as f64,
        damage_per_round_a: outcomes.iter().map(|o| o.damage_by_a as i64).sum::<i64>() as f64
            / total_rounds as f64,
        damage_per_round_b: outcomes.iter().map(|o| o.damage_by_b as i64).sum::<i64>() as f64
            / total_rounds as f64,
        avg_winner_hp: outcomes
            .iter()
            .filter(|o| o.winner.is_some())
            .map(|o| o.winner_hp as f64)
            .sum::<f64>()
            / decided as f64,
        first_log: outcomes
            .into_iter()
            .next()
            .map(|o| o.log)
            .unwrap_or_default(),
    };

    tracing::debug!(
        trials = report.trials,
        elapsed_ms = started.elapsed().as_millis() as u64,
        wins_a = report.wins_a,
        wins_b = report.wins_b,
        "matchup complete"
    );
    report
}

/// True when a matchup produced no decision at all (every trial hit the
/// round cap).
pub fn all_draws(report: &MatchupReport) -> bool {
    report.draws == report.trials && report.avg_rounds >= MAX_ROUNDS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AbilityScores;
    use crate::weapons::get_weapon;

    fn duelist(name: &str) -> Combatant {
        let mut c = Combatant::new(
            name,
            AbilityScores {
                strength: 16,
                constitution: 14,
                ..AbilityScores::default()
            },
            22,
            15,
        );
        c.weapons.push(get_weapon("Greatsword").unwrap());
        c
    }

    #[test]
    fn reports_are_reproducible_for_a_seed() {
        let a = duelist("A");
        let b = duelist("B");
        let options = SimulationOptions {
            trials: 50,
            seed: 99,
            ..SimulationOptions::default()
        };
        let first = run_simulations(&a, &b, &options);
        let second = run_simulations(&a, &b, &options);
        assert_eq!(first.wins_a, second.wins_a);
        assert_eq!(first.wins_b, second.wins_b);
        assert_eq!(first.avg_rounds, second.avg_rounds);
    }

    #[test]
    fn outcomes_account_for_every_trial() {
        let a = duelist("A");
        let b = duelist("B");
        let options = SimulationOptions {
            trials: 30,
            seed: 7,
            ..SimulationOptions::default()
        };
        let report = run_simulations(&a, &b, &options);
        assert_eq!(report.wins_a + report.wins_b + report.draws, 30);
        assert!(report.avg_rounds > 0.0);
    }

    #[test]
    fn first_log_captured_when_requested() {
        let a = duelist("A");
        let b = duelist("B");
        let options = SimulationOptions {
            trials: 3,
            seed: 1,
            verbose_first: true,
            ..SimulationOptions::default()
        };
        let report = run_simulations(&a, &b, &options);
        assert!(!report.first_log.is_empty());

        let quiet = run_simulations(
            &a,
            &b,
            &SimulationOptions {
                verbose_first: false,
                trials: 3,
                seed: 1,
                ..SimulationOptions::default()
            },
        );
        assert!(quiet.first_log.is_empty());
    }
}
