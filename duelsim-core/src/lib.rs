//! Deterministic 1v1 duel simulation for D&D 2024-style martial builds.
//!
//! The crate models dice, combatants, the damage pipeline and a priority
//! decision policy, then runs seeded Monte Carlo matchups between character
//! builds loaded from JSON files. Every roll flows through a caller-supplied
//! [`rand::Rng`], so a whole simulation is reproducible from one seed.

pub mod actions;
pub mod classes;
pub mod combat;
pub mod damage;
pub mod dice;
pub mod effects;
pub mod loader;
pub mod models;
pub mod runner;
pub mod tactics;
pub mod weapons;

pub use actions::{resolve_attack, AttackOptions, AttackResult};
pub use combat::{run_combat, CombatOptions};
pub use dice::{Advantage, DiceError, DiceExpression};
pub use loader::{load_build, load_build_from_str, read_build_dir, BuildFile, LoadError};
pub use models::{AbilityScores, CombatState, Combatant, Side};
pub use runner::{run_simulations, MatchupReport, SimulationOptions};
pub use tactics::{Doctrine, Tactics};
