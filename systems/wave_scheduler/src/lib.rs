#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave lifecycle and formation-based enemy spawning.
//!
//! The scheduler walks `Idle → Spawning → Active → Complete` and back into
//! `Spawning` for the next wave. Time is taken from the tick's
//! [`Event::TimeAdvanced`] events and the active enemy set shrinks as
//! [`Event::EntityReleased`] events for enemies arrive, so the scheduler
//! never needs to know why an enemy left play.

mod formation;
mod plan;

use std::collections::BTreeSet;

use bulwark_core::{
    AiBehavior, Command, EnemyVariant, EntityCategory, EntityId, Event, Faction, Health, Position,
    RejectionReason, Shield, SimulationConfig, TargetSlots, Turret, Velocity, WaveTableEntry,
    WeaponKind,
};
use bulwark_world::{query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use formation::FormationCursor;
pub use plan::{
    boss_for, difficulty_scale, template, wave_definition, BossProfile, EnemyTemplate, WaveGroup,
    MAX_DIFFICULTY_SCALE, MAX_GROUP_COUNT, MIN_SPAWN_DELAY, PREDEFINED_WAVES,
};

/// First wave that may promote spawns to elites.
pub const ELITE_FIRST_WAVE: u32 = 3;
/// Elite promotion chance gained per wave past the first elite wave.
pub const ELITE_CHANCE_STEP: f64 = 0.05;
/// Ceiling of the elite promotion chance.
pub const ELITE_CHANCE_CAP: f64 = 0.4;
/// Health and shield multiplier of an elite.
pub const ELITE_DEFENCE_MULTIPLIER: f32 = 1.5;
/// Collider radius multiplier of an elite.
pub const ELITE_RADIUS_MULTIPLIER: f32 = 1.2;
/// Lower edge of the spawn speed band.
pub const SPEED_BAND_LOW: f32 = 0.85;
/// Upper edge of the spawn speed band.
pub const SPEED_BAND_HIGH: f32 = 1.15;
/// Speed gained per wave, as a fraction of base speed.
pub const SPEED_STEP_PER_WAVE: f32 = 0.02;

/// Phase of the wave lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveState {
    /// No wave has been started yet.
    Idle,
    /// Groups are still releasing enemies.
    Spawning,
    /// Every enemy has spawned; waiting for the field to clear.
    Active,
    /// The wave was cleared; the next one starts after the advance delay.
    Complete,
}

/// Chance that a spawn of `wave` is promoted to an elite.
#[must_use]
pub fn elite_chance(wave: u32) -> f64 {
    if wave < ELITE_FIRST_WAVE {
        return 0.0;
    }
    (ELITE_CHANCE_STEP * f64::from(wave - ELITE_FIRST_WAVE + 1)).min(ELITE_CHANCE_CAP)
}

/// Speed multiplier of `wave` before the random band is applied.
#[must_use]
pub fn wave_speed_scale(wave: u32) -> f32 {
    1.0 + SPEED_STEP_PER_WAVE * wave.saturating_sub(1) as f32
}

#[derive(Clone, Copy, Debug)]
struct GroupCursor {
    group: WaveGroup,
    remaining: u32,
    timer: f32,
    points: FormationCursor,
}

impl GroupCursor {
    fn ready(&self) -> bool {
        self.remaining > 0 && self.timer >= self.group.spawn_delay
    }
}

/// Owns wave progression and enemy spawning.
#[derive(Debug)]
pub struct WaveScheduler {
    state: WaveState,
    wave: u32,
    seed: u64,
    overrides: Vec<WaveTableEntry>,
    auto_advance: bool,
    advance_delay: f32,
    max_spawns_per_tick: usize,
    groups: Vec<GroupCursor>,
    boss_pending: Option<BossProfile>,
    active: BTreeSet<EntityId>,
    complete_timer: f32,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Creates an idle scheduler configured by `config`.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            state: WaveState::Idle,
            wave: 0,
            seed: config.seed,
            overrides: config.waves.clone(),
            auto_advance: config.auto_advance,
            advance_delay: config.wave_advance_delay.max(0.0),
            max_spawns_per_tick: usize::try_from(config.max_spawns_per_tick)
                .unwrap_or(usize::MAX)
                .max(1),
            groups: Vec::new(),
            boss_pending: None,
            active: BTreeSet::new(),
            complete_timer: 0.0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> WaveState {
        self.state
    }

    /// Most recently started wave, zero before the first.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.wave
    }

    /// Spawned enemies of the current waves still in play.
    #[must_use]
    pub fn active_enemies(&self) -> usize {
        self.active.len()
    }

    /// Whether completed waves advance on their own.
    #[must_use]
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// Enemies the current wave has yet to release, saturating at `u32::MAX`.
    #[must_use]
    pub fn pending_spawns(&self) -> u32 {
        self.groups
            .iter()
            .fold(0_u32, |total, cursor| total.saturating_add(cursor.remaining))
    }

    /// Consumes wave commands and the tick's events, then advances spawning.
    pub fn handle(
        &mut self,
        world: &mut World,
        commands: &[Command],
        events: &[Event],
        out_events: &mut Vec<Event>,
    ) {
        let mut dt = 0.0_f32;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step, .. } => dt += *step,
                Event::EntityReleased {
                    entity,
                    category: EntityCategory::Enemy,
                } => {
                    let _ = self.active.remove(entity);
                }
                Event::ObjectiveDestroyed { .. } => {
                    if self.auto_advance {
                        info!(wave = self.wave, "objective lost, automatic waves halted");
                    }
                    self.auto_advance = false;
                }
                _ => {}
            }
        }

        for command in commands {
            match command {
                Command::StartWave { wave: 0 } => {
                    warn!("wave numbers start at one, start request rejected");
                    out_events.push(Event::CommandRejected {
                        command: command.clone(),
                        reason: RejectionReason::InvalidWave,
                    });
                }
                Command::StartWave { wave } => self.start_wave(world, *wave, out_events),
                Command::SetAutoAdvance { enabled } => {
                    debug!(enabled = *enabled, "wave auto-advance toggled");
                    self.auto_advance = *enabled;
                }
                _ => {}
            }
        }

        if self.state == WaveState::Spawning {
            self.spawn_due(world, dt, out_events);
            if self.pending_spawns() == 0 {
                info!(wave = self.wave, "wave fully deployed");
                self.state = WaveState::Active;
            }
        }

        if self.state == WaveState::Active && self.active.is_empty() {
            info!(wave = self.wave, "wave cleared");
            self.state = WaveState::Complete;
            self.complete_timer = 0.0;
            out_events.push(Event::WaveCompleted { wave: self.wave });
            return;
        }

        if self.state == WaveState::Complete && self.auto_advance {
            self.complete_timer += dt;
            if self.complete_timer >= self.advance_delay {
                let next = self.wave.saturating_add(1);
                self.start_wave(world, next, out_events);
            }
        }
    }

    /// Starts `wave` immediately, replacing any wave still spawning.
    ///
    /// Enemies of earlier waves that are still in play keep counting towards
    /// the active set.
    pub fn start_wave(&mut self, world: &World, wave: u32, out_events: &mut Vec<Event>) {
        let wave = wave.max(1);
        let definition = wave_definition(wave, &self.overrides);
        self.rng = ChaCha8Rng::seed_from_u64(plan::wave_seed(self.seed, wave));

        let bounds = query::bounds(world);
        let objective = query::objective_position(world);
        self.groups.clear();
        for group in definition {
            let points = FormationCursor::new(group.formation, bounds, objective, &mut self.rng);
            self.groups.push(GroupCursor {
                group,
                remaining: group.count,
                timer: group.spawn_delay,
                points,
            });
        }

        self.boss_pending = boss_for(wave).filter(|boss| {
            self.groups
                .iter()
                .any(|cursor| cursor.group.faction == boss.faction && cursor.group.count > 0)
        });
        self.wave = wave;
        self.state = WaveState::Spawning;
        self.complete_timer = 0.0;

        let total_enemies = self.pending_spawns();
        info!(
            wave,
            total_enemies,
            boss = self.boss_pending.is_some(),
            "wave started"
        );
        out_events.push(Event::WaveStarted {
            wave,
            total_enemies,
        });
    }

    fn spawn_due(&mut self, world: &mut World, dt: f32, out_events: &mut Vec<Event>) {
        let mut spawned = 0;
        for index in 0..self.groups.len() {
            let cursor = &mut self.groups[index];
            if cursor.remaining == 0 {
                continue;
            }
            cursor.timer += dt;
            if spawned >= self.max_spawns_per_tick || !cursor.ready() {
                continue;
            }

            cursor.timer = (cursor.timer - cursor.group.spawn_delay).min(cursor.group.spawn_delay);
            cursor.remaining -= 1;
            let faction = cursor.group.faction;
            let position = cursor.points.next_point(&mut self.rng);
            if self.spawn_enemy(world, faction, position, out_events) {
                spawned += 1;
            }
        }
        if spawned == self.max_spawns_per_tick && self.groups.iter().any(GroupCursor::ready) {
            debug!(
                wave = self.wave,
                cap = self.max_spawns_per_tick,
                "spawn cap reached, remaining spawns deferred"
            );
        }
    }

    fn spawn_enemy(
        &mut self,
        world: &mut World,
        faction: Faction,
        position: Position,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(base) = template(faction) else {
            warn!(?faction, "no enemy template for faction, spawn skipped");
            return false;
        };

        let wave = self.wave;
        let scale = difficulty_scale(wave);
        let mut health = base.health * scale;
        let mut shield = base.shield * scale;
        let mut radius = base.radius;
        let mut speed = base.speed
            * self.rng.gen_range(SPEED_BAND_LOW..=SPEED_BAND_HIGH)
            * wave_speed_scale(wave);
        let mut behavior = base.behavior;

        let variant = match self.boss_pending {
            Some(boss) if boss.faction == faction => {
                self.boss_pending = None;
                health *= boss.health_multiplier;
                shield *= boss.shield_multiplier;
                radius *= boss.radius_multiplier;
                speed *= boss.speed_multiplier;
                behavior = AiBehavior::Boss;
                EnemyVariant::Boss
            }
            _ if self.rng.gen_bool(elite_chance(wave)) => {
                health *= ELITE_DEFENCE_MULTIPLIER;
                shield *= ELITE_DEFENCE_MULTIPLIER;
                radius *= ELITE_RADIUS_MULTIPLIER;
                EnemyVariant::Elite
            }
            _ => EnemyVariant::Standard,
        };
        let radius = radius.min(query::max_collider_radius(world));

        let objective = query::objective_position(world);
        let entity = world.spawn(faction, position, radius, out_events);
        let components = world.components_mut();
        components.health.set(entity, Health::new(health));
        if shield > 0.0 {
            components.shield.set(entity, Shield::new(shield));
        }
        components
            .velocity
            .set(entity, Velocity::towards(position, objective, speed));
        components.ai.set(entity, behavior);
        if faction == Faction::Raider {
            components.turret.set(entity, Turret::for_weapon(WeaponKind::Bolt));
            components.targets.set(entity, TargetSlots::default());
        }

        let _ = self.active.insert(entity);
        debug!(
            entity = entity.get(),
            ?faction,
            ?variant,
            wave,
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned {
            entity,
            faction,
            wave,
            variant,
            position,
        });
        true
    }
}
