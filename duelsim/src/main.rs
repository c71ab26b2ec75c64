//! Command-line front end: list builds, inspect them, and pit them against
//! each other in seeded Monte Carlo matchups.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use duelsim_core::loader::{build_combatant, read_build_dir, BuildFile};
use duelsim_core::runner::all_draws;
use duelsim_core::weapons::{get_weapon, weapon_names};
use duelsim_core::{run_simulations, Combatant, Doctrine, SimulationOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "duelsim")]
#[command(about = "Simulate duels between D&D 2024 character builds", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory of build definition files
    #[arg(long, global = true, default_value = "data/builds")]
    builds_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available builds
    List {
        /// Only builds carrying every given tag
        #[arg(long)]
        tag: Vec<String>,
    },

    /// Show one build's derived statistics
    Show { name: String },

    /// List the standard weapon catalog
    Weapons,

    /// Run one matchup between two builds
    Fight {
        a: String,
        b: String,
        #[command(flatten)]
        sim: SimArgs,
        /// Print the combat log of the first trial
        #[arg(long)]
        verbose: bool,
    },

    /// Compare one build against every other build in the roster
    Compare {
        name: String,
        #[arg(long)]
        tag: Vec<String>,
        #[command(flatten)]
        sim: SimArgs,
    },

    /// Round-robin every build and rank by overall win rate
    Rank {
        #[arg(long)]
        tag: Vec<String>,
        #[command(flatten)]
        sim: SimArgs,
    },
}

#[derive(Args)]
struct SimArgs {
    /// Duels to simulate per matchup
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Base RNG seed; trial N uses seed + N
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Policy for the first build (aggressive, defensive, passive)
    #[arg(long, default_value = "aggressive")]
    tactics_a: Doctrine,

    /// Policy for the second build
    #[arg(long, default_value = "aggressive")]
    tactics_b: Doctrine,

    /// Starting distance in feet
    #[arg(long, default_value_t = 60)]
    distance: u32,
}

impl SimArgs {
    fn options(&self, verbose_first: bool) -> SimulationOptions {
        SimulationOptions {
            trials: self.trials,
            seed: self.seed,
            tactics_a: self.tactics_a,
            tactics_b: self.tactics_b,
            starting_distance: self.distance,
            verbose_first,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List { tag } => cmd_list(&cli.builds_dir, &tag),
        Command::Show { name } => cmd_show(&cli.builds_dir, &name),
        Command::Weapons => cmd_weapons(),
        Command::Fight { a, b, sim, verbose } => cmd_fight(&cli.builds_dir, &a, &b, &sim, verbose),
        Command::Compare { name, tag, sim } => cmd_compare(&cli.builds_dir, &name, &tag, &sim),
        Command::Rank { tag, sim } => cmd_rank(&cli.builds_dir, &tag, &sim),
    }
}

fn load_roster(dir: &Path, tags: &[String]) -> Result<Vec<BuildFile>> {
    let builds = read_build_dir(dir)
        .with_context(|| format!("reading builds from {}", dir.display()))?;
    let builds: Vec<_> = builds.into_iter().filter(|b| b.matches_tags(tags)).collect();
    if builds.is_empty() {
        bail!("no matching builds in {}", dir.display());
    }
    Ok(builds)
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

fn find_build(builds: &[BuildFile], name: &str) -> Result<BuildFile> {
    let want = slug(name);
    builds
        .iter()
        .find(|b| slug(&b.name) == want)
        .cloned()
        .ok_or_else(|| anyhow!("no build named '{name}' (try the list command)"))
}

fn hydrate(build: &BuildFile) -> Result<Combatant> {
    build_combatant(build).with_context(|| format!("hydrating build '{}'", build.name))
}

fn cmd_list(dir: &Path, tags: &[String]) -> Result<()> {
    let builds = load_roster(dir, tags)?;
    println!("{:<24} {:<10} {:>5}  tags", "name", "class", "level");
    for build in builds {
        println!(
            "{:<24} {:<10} {:>5}  {}",
            build.name,
            build.class.to_string(),
            build.level,
            build.tags.join(", ")
        );
    }
    Ok(())
}

fn cmd_show(dir: &Path, name: &str) -> Result<()> {
    let builds = load_roster(dir, &[])?;
    let build = find_build(&builds, name)?;
    let c = hydrate(&build)?;

    println!("{} ({} {})", c.name, build.class, c.level);
    println!("  HP {}  AC {}  speed {} ft  proficiency +{}", c.max_hp, c.ac, c.speed, c.proficiency_bonus);
    if let Some(style) = c.fighting_style {
        println!("  fighting style: {style:?}");
    }
    if let Some(feat) = c.origin_feat {
        println!("  origin feat: {feat:?}");
    }
    if let Some(ancestry) = c.giant_ancestry {
        println!("  giant ancestry: {ancestry:?}");
    }
    if !c.features.is_empty() {
        let mut features: Vec<String> = c.features.iter().map(|f| format!("{f:?}")).collect();
        features.sort();
        println!("  features: {}", features.join(", "));
    }
    for weapon in &c.weapons {
        println!(
            "  {} {}: +{} to hit, {} + {} {}",
            if weapon.is_ranged() { "ranged" } else { "melee" },
            weapon.name,
            c.attack_modifier(weapon),
            weapon.damage,
            c.damage_modifier(weapon, false),
            weapon.damage_type.name(),
        );
    }
    if !c.resources.is_empty() {
        let mut resources: Vec<String> = c
            .resources
            .iter()
            .map(|(kind, r)| format!("{} x{}", kind.name(), r.maximum))
            .collect();
        resources.sort();
        println!("  resources: {}", resources.join(", "));
    }
    Ok(())
}

fn cmd_weapons() -> Result<()> {
    println!(
        "{:<16} {:<10} {:<12} {:<8} properties",
        "name", "damage", "type", "mastery"
    );
    for name in weapon_names() {
        let Some(weapon) = get_weapon(name) else {
            continue;
        };
        let properties: Vec<String> = weapon.properties.iter().map(|p| format!("{p:?}")).collect();
        println!(
            "{:<16} {:<10} {:<12} {:<8} {}",
            weapon.name,
            weapon.damage.to_string(),
            weapon.damage_type.name(),
            weapon.mastery.map_or_else(String::new, |m| format!("{m:?}")),
            properties.join(", ")
        );
    }
    Ok(())
}

fn cmd_fight(dir: &Path, a: &str, b: &str, sim: &SimArgs, verbose: bool) -> Result<()> {
    let builds = load_roster(dir, &[])?;
    let a = hydrate(&find_build(&builds, a)?)?;
    let b = hydrate(&find_build(&builds, b)?)?;

    let report = run_simulations(&a, &b, &sim.options(verbose));
    if verbose {
        println!("First trial:");
        for line in &report.first_log {
            println!("{line}");
        }
        println!();
    }
    println!("{report}");
    if all_draws(&report) {
        println!("(no trial reached a decision within the round cap)");
    }
    Ok(())
}

fn cmd_compare(dir: &Path, name: &str, tags: &[String], sim: &SimArgs) -> Result<()> {
    let builds = load_roster(dir, tags)?;
    let baseline_build = find_build(&builds, name)?;
    let baseline = hydrate(&baseline_build)?;

    println!(
        "{} vs the roster ({} trials each):",
        baseline.name, sim.trials
    );
    let mut total_rate = 0.0;
    let mut opponents = 0u32;
    for build in &builds {
        if slug(&build.name) == slug(&baseline_build.name) {
            continue;
        }
        let opponent = hydrate(build)?;
        let report = run_simulations(&baseline, &opponent, &sim.options(false));
        println!(
            "  vs {:<24} {:>6.1}%  (avg {:.1} rounds)",
            opponent.name,
            100.0 * report.win_rate_a(),
            report.avg_rounds
        );
        total_rate += report.win_rate_a();
        opponents += 1;
    }
    if opponents > 0 {
        println!("  overall: {:.1}%", 100.0 * total_rate / opponents as f64);
    }
    Ok(())
}

fn cmd_rank(dir: &Path, tags: &[String], sim: &SimArgs) -> Result<()> {
    let builds = load_roster(dir, tags)?;
    if builds.len() < 2 {
        bail!("ranking needs at least two builds");
    }
    let roster: Vec<Combatant> = builds.iter().map(hydrate).collect::<Result<_>>()?;

    let mut wins = vec![0u64; roster.len()];
    let mut games = vec![0u64; roster.len()];
    for i in 0..roster.len() {
        for j in (i + 1)..roster.len() {
            let report = run_simulations(&roster[i], &roster[j], &sim.options(false));
            wins[i] += report.wins_a as u64;
            wins[j] += report.wins_b as u64;
            games[i] += report.trials as u64;
            games[j] += report.trials as u64;
        }
    }

    let mut order: Vec<usize> = (0..roster.len()).collect();
    order.sort_by(|&x, &y| {
        let rx = wins[x] as f64 / games[x] as f64;
        let ry = wins[y] as f64 / games[y] as f64;
        ry.total_cmp(&rx)
    });

    println!(
        "Round-robin ranking ({} builds, {} trials per matchup):",
        roster.len(),
        sim.trials
    );
    for (place, &idx) in order.iter().enumerate() {
        println!(
            "  {:>2}. {:<24} {:>6.1}%  ({} wins / {} duels)",
            place + 1,
            roster[idx].name,
            100.0 * wins[idx] as f64 / games[idx] as f64,
            wins[idx],
            games[idx]
        );
    }
    Ok(())
}
