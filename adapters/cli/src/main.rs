#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner for the Bulwark simulation core.
//!
//! Loads an optional TOML session file, applies command-line overrides, runs
//! the requested number of waves at a fixed time step and prints a summary.

mod drift;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use bulwark_core::{Command, EntityCategory, Event, SimulationConfig, TurretPlacement, WeaponKind};
use bulwark_simulation::Simulation;
use bulwark_system_wave_scheduler::WaveState;
use bulwark_world::query;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs Bulwark waves without a presentation layer.
#[derive(Parser, Debug)]
#[command(name = "bulwark", version, about)]
struct Args {
    /// TOML session file; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Waves to complete before stopping.
    #[arg(long, default_value_t = 3)]
    waves: u32,

    /// Hard limit on simulated ticks.
    #[arg(long, default_value_t = 36_000)]
    max_ticks: u64,

    /// Seconds simulated per tick.
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f32,

    /// Overrides the seed of the session file.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the delay between completed waves.
    #[arg(long)]
    advance_delay: Option<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let report = run(&config, &args);
    print_report(&report);
    Ok(())
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read session file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse session file {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(delay) = args.advance_delay {
        config.wave_advance_delay = delay;
    }
    config.auto_advance = true;
    if config.turrets.is_empty() {
        config.turrets = default_defences(&config);
    }

    config.validate().context("invalid session configuration")?;
    anyhow::ensure!(
        args.dt.is_finite() && args.dt > 0.0,
        "time step must be positive, got {}",
        args.dt
    );
    Ok(config)
}

/// A ring of mixed turrets around the flagship, used when the session file
/// places none.
fn default_defences(config: &SimulationConfig) -> Vec<TurretPlacement> {
    let centre = config.centre();
    let layout = [
        (-90.0, -60.0, WeaponKind::Laser),
        (90.0, -60.0, WeaponKind::Cannon),
        (-90.0, 60.0, WeaponKind::Missile),
        (90.0, 60.0, WeaponKind::Railgun),
    ];
    layout
        .into_iter()
        .map(|(dx, dy, weapon)| TurretPlacement {
            x: centre.x + dx,
            y: centre.y + dy,
            weapon: weapon.id(),
            fire_rate: None,
            range: None,
            damage: None,
            level: Some(2),
        })
        .collect()
}

#[derive(Debug)]
struct RunReport {
    ticks: u64,
    elapsed: f64,
    waves_completed: u32,
    last_wave: u32,
    state: WaveState,
    objective_lost: bool,
    simulation: Simulation,
}

fn run(config: &SimulationConfig, args: &Args) -> RunReport {
    let mut simulation = Simulation::new(config);
    simulation.apply(Command::StartWave { wave: 1 });

    let mut ticks = 0;
    let mut waves_completed = 0;
    let mut objective_lost = false;
    while ticks < args.max_ticks && waves_completed < args.waves && !objective_lost {
        simulation.tick(args.dt);
        drift::advance_enemies(simulation.world_mut(), args.dt);
        ticks += 1;

        for event in simulation.drain_events() {
            match event {
                Event::WaveCompleted { wave } => {
                    waves_completed += 1;
                    info!(wave, completed = waves_completed, "wave cleared");
                }
                Event::ObjectiveDestroyed { .. } => objective_lost = true,
                _ => {}
            }
        }
    }

    if ticks >= args.max_ticks && waves_completed < args.waves {
        warn!(ticks, waves_completed, "tick limit reached before the requested waves");
    }

    RunReport {
        ticks,
        elapsed: query::elapsed(simulation.world()),
        waves_completed,
        last_wave: simulation.current_wave(),
        state: simulation.wave_state(),
        objective_lost,
        simulation,
    }
}

fn print_report(report: &RunReport) {
    let stats = report.simulation.combat_stats();
    println!("Bulwark headless run");
    println!(
        "  ticks {} ({:.1}s simulated), waves cleared {}, last wave {} ({:?})",
        report.ticks, report.elapsed, report.waves_completed, report.last_wave, report.state
    );
    if report.objective_lost {
        println!("  the flagship was destroyed");
    } else if let Some((hull, shield)) = query::objective_status(report.simulation.world()) {
        let shield = shield.map_or(0.0, |shield| shield.current);
        println!("  flagship hull {:.0}/{:.0}, shield {:.0}", hull.current, hull.max, shield);
    }
    println!(
        "  kills {}, shots {} fired / {} landed ({:.1}% accuracy)",
        stats.kills,
        stats.shots_fired,
        stats.shots_landed,
        stats.accuracy * 100.0
    );
    println!(
        "  damage {:.0} (shield {:.0}, hull {:.0}), {:.1} dps, flagship took {:.0}",
        stats.total_damage,
        stats.shield_damage,
        stats.hull_damage,
        stats.dps,
        stats.objective_damage_taken
    );
    for category in EntityCategory::ALL {
        let pool = report.simulation.pool_stats(category);
        println!(
            "  {} pool: {} in use, {} available, capacity {}, expansions {}",
            category.label(),
            pool.in_use,
            pool.available,
            pool.capacity,
            pool.expansions
        );
    }
}
