#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ordered per-frame pipeline of the Bulwark simulation core.
//!
//! [`Simulation`] owns the [`World`] and every system. Each call to
//! [`Simulation::tick`] runs the stages listed in [`Stage::ORDER`] to
//! completion and appends everything that happened to an outbox, which
//! collaborators drain once per frame.

mod dispatch;
mod stage;

use bulwark_core::{
    AudioSink, BeamVisual, CombatStatsSnapshot, Command, EntityCategory, Event, ParticleSink,
    PoolStats, SimulationConfig, SpriteSink,
};
use bulwark_system_analytics::Analytics;
use bulwark_system_combat::Combat;
use bulwark_system_projectiles::Projectiles;
use bulwark_system_status_effects::StatusEffects;
use bulwark_system_targeting::Targeting;
use bulwark_system_wave_scheduler::{WaveScheduler, WaveState};
use bulwark_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

pub use stage::Stage;

/// The simulation core: world state, systems and the event outbox.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    targeting: Targeting,
    combat: Combat,
    projectiles: Projectiles,
    status_effects: StatusEffects,
    scheduler: WaveScheduler,
    analytics: Analytics,
    rng: ChaCha8Rng,
    queued: Vec<Command>,
    outbox: Vec<Event>,
    scratch: Vec<Event>,
    beams: Vec<BeamVisual>,
}

impl Simulation {
    /// Builds a session from `config` and places its configured turrets.
    ///
    /// Configuration problems are logged and the affected entries degrade:
    /// turrets with an unknown weapon are skipped and turrets with an invalid
    /// fire rate stay idle.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        if let Err(error) = config.validate() {
            warn!(%error, "configuration problem, affected entries degrade");
        }

        let mut world = World::new(config);
        let mut outbox = Vec::new();
        for (index, placement) in config.turrets.iter().enumerate() {
            match placement.turret() {
                Ok(turret) => {
                    let level = placement.level.unwrap_or(1);
                    let _ = world.place_turret(placement.position(), turret, level, &mut outbox);
                }
                Err(error) => warn!(index, %error, "turret placement skipped"),
            }
        }
        info!(
            width = config.width,
            height = config.height,
            turrets = config.turrets.len(),
            seed = config.seed,
            "simulation ready"
        );

        Self {
            world,
            targeting: Targeting::new(),
            combat: Combat::new(),
            projectiles: Projectiles::new(),
            status_effects: StatusEffects::new(),
            scheduler: WaveScheduler::new(config),
            analytics: Analytics::new(config.dps_window),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            queued: Vec::new(),
            outbox,
            scratch: Vec::new(),
            beams: Vec::new(),
        }
    }

    /// Queues `command` for the start of the next tick.
    pub fn apply(&mut self, command: Command) {
        self.queued.push(command);
    }

    /// Runs one simulation tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let tick = query::tick_index(&self.world);
        let start = self.outbox.len();
        let commands = std::mem::take(&mut self.queued);

        for stage in Stage::ORDER {
            let _span = stage.enter(tick);
            match stage {
                Stage::Commands => {
                    for command in &commands {
                        world::apply(&mut self.world, command.clone(), &mut self.outbox);
                    }
                }
                Stage::Clock => self.world.advance_clock(dt, &mut self.outbox),
                Stage::SpatialIndex => self.world.rebuild_spatial_index(),
                Stage::Targeting => self.targeting.handle(&mut self.world),
                Stage::Combat => {
                    self.beams.clear();
                    self.combat.handle(
                        &mut self.world,
                        &mut self.rng,
                        &mut self.outbox,
                        &mut self.beams,
                    );
                }
                Stage::Projectiles => {
                    self.projectiles
                        .handle(&mut self.world, dt, &mut self.rng, &mut self.outbox);
                }
                Stage::StatusEffects => {
                    self.status_effects
                        .handle(&mut self.world, dt, &mut self.outbox);
                }
                Stage::DeathSweep => self.world.reap(&mut self.outbox),
                Stage::Waves => {
                    self.scratch.clear();
                    self.scheduler.handle(
                        &mut self.world,
                        &commands,
                        &self.outbox[start..],
                        &mut self.scratch,
                    );
                    self.outbox.append(&mut self.scratch);
                }
                Stage::Analytics => self.analytics.handle(&self.outbox[start..]),
            }
        }
    }

    /// Events accumulated since the last drain.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.outbox
    }

    /// Removes and returns every accumulated event.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    /// Drains the outbox into the presentation collaborators and returns the
    /// drained events.
    pub fn dispatch(
        &mut self,
        sprites: &mut dyn SpriteSink,
        audio: &mut dyn AudioSink,
        particles: &mut dyn ParticleSink,
    ) -> Vec<Event> {
        let events = self.drain_events();
        dispatch::fan_out(&self.world, &events, sprites, audio, particles);
        events
    }

    /// Beams fired during the last tick.
    #[must_use]
    pub fn beam_visuals(&self) -> &[BeamVisual] {
        &self.beams
    }

    /// Running combat statistics.
    #[must_use]
    pub fn combat_stats(&self) -> CombatStatsSnapshot {
        self.analytics.snapshot()
    }

    /// Counters of one entity pool.
    #[must_use]
    pub fn pool_stats(&self, category: EntityCategory) -> PoolStats {
        query::pool_stats(&self.world, category)
    }

    /// Current wave lifecycle phase.
    #[must_use]
    pub fn wave_state(&self) -> WaveState {
        self.scheduler.state()
    }

    /// Most recently started wave, zero before the first.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.scheduler.current_wave()
    }

    /// Read access to the world for queries and presentation.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Write access for the external movement and AI layer, which steers
    /// positions and velocities between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::{EntityId, RejectionReason};

    #[test]
    fn commands_apply_on_the_next_tick() {
        let mut simulation = Simulation::new(&SimulationConfig::default());
        let command = Command::UpgradeTargeting {
            turret: EntityId::new(9_999),
        };
        simulation.apply(command.clone());
        assert!(simulation.events().is_empty());

        simulation.tick(0.1);
        assert!(simulation.events().contains(&Event::CommandRejected {
            command,
            reason: RejectionReason::UnknownEntity,
        }));
    }

    #[test]
    fn non_finite_time_steps_do_not_move_the_clock() {
        let mut simulation = Simulation::new(&SimulationConfig::default());
        simulation.tick(f32::NAN);
        simulation.tick(-1.0);
        assert_eq!(query::elapsed(simulation.world()), 0.0);
        assert_eq!(query::tick_index(simulation.world()), 2);
    }
}
