#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed status effects on enemy units.
//!
//! Effects are sparse components. [`inflict`] attaches or refreshes one on an
//! enemy and [`StatusEffects::handle`] advances every active effect once per
//! tick, reporting expiries as events.

use bulwark_core::{
    Burning, Disabled, DisabledSystems, Drained, EntityId, Event, Slowed, StatusEffectKind,
};
use bulwark_world::{Components, World};
use tracing::trace;

/// Hull damage of one burn tick.
pub const BURN_DAMAGE_PER_TICK: f32 = 5.0;
/// Seconds between burn ticks.
pub const BURN_TICK_INTERVAL: f32 = 0.5;
/// Total seconds a burn lasts.
pub const BURN_DURATION: f32 = 3.0;
/// Speed multiplier while slowed.
pub const SLOW_FACTOR: f32 = 0.5;
/// Seconds a slow lasts.
pub const SLOW_DURATION: f32 = 2.0;
/// Fraction of speed removed by each drain stack.
pub const DRAIN_PER_STACK: f32 = 0.1;
/// Seconds of the shared drain duration.
pub const DRAIN_DURATION: f32 = 4.0;
/// Seconds a disable lasts.
pub const DISABLE_DURATION: f32 = 1.5;

/// Number of ticks a fresh burn applies.
#[must_use]
pub fn burn_ticks() -> u32 {
    (BURN_DURATION / BURN_TICK_INTERVAL).floor() as u32
}

/// Attaches `effect` to `target`, refreshing it when already active.
///
/// Only entities tagged for enemy control are affected. Returns whether the
/// effect took hold.
pub fn inflict(
    components: &mut Components,
    target: EntityId,
    effect: StatusEffectKind,
    out_events: &mut Vec<Event>,
) -> bool {
    if !components.ai.contains(target) {
        return false;
    }

    match effect {
        StatusEffectKind::Burning => components.burning.set(
            target,
            Burning {
                damage_per_tick: BURN_DAMAGE_PER_TICK,
                tick_interval: BURN_TICK_INTERVAL,
                timer: 0.0,
                ticks_remaining: burn_ticks(),
            },
        ),
        StatusEffectKind::Slowed => match components.slowed.get_mut(target) {
            Some(slowed) => slowed.remaining = SLOW_DURATION,
            None => {
                if let Some(velocity) = components.velocity.get_mut(target) {
                    *velocity = velocity.scaled(SLOW_FACTOR);
                }
                components.slowed.set(
                    target,
                    Slowed {
                        factor: SLOW_FACTOR,
                        remaining: SLOW_DURATION,
                    },
                );
            }
        },
        StatusEffectKind::Drained => {
            let stacks = components.drained.get(target).map_or(0, |drained| drained.stacks);
            if stacks < Drained::MAX_STACKS {
                if let Some(velocity) = components.velocity.get_mut(target) {
                    *velocity = velocity.scaled(1.0 - DRAIN_PER_STACK);
                }
            }
            components.drained.set(
                target,
                Drained {
                    stacks: (stacks + 1).min(Drained::MAX_STACKS),
                    remaining: DRAIN_DURATION,
                },
            );
        }
        StatusEffectKind::Disabled => {
            let systems = DisabledSystems::WEAPONS.union(DisabledSystems::ENGINES);
            let disabled = match components.disabled.copied(target) {
                Some(existing) => Disabled {
                    remaining: existing.remaining.max(DISABLE_DURATION),
                    systems: existing.systems.union(systems),
                },
                None => Disabled {
                    remaining: DISABLE_DURATION,
                    systems,
                },
            };
            components.disabled.set(target, disabled);
        }
    }

    out_events.push(Event::StatusApplied {
        entity: target,
        effect,
    });
    true
}

/// Advances every active status effect.
#[derive(Debug, Default)]
pub struct StatusEffects {
    expired: Vec<EntityId>,
}

impl StatusEffects {
    /// Creates the system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every effect by `dt` seconds.
    pub fn handle(&mut self, world: &mut World, dt: f32, out_events: &mut Vec<Event>) {
        let components = world.components_mut();
        self.burn(components, dt, out_events);
        self.slow(components, dt, out_events);
        self.drain(components, dt, out_events);
        self.disable(components, dt, out_events);
    }

    fn burn(&mut self, components: &mut Components, dt: f32, out_events: &mut Vec<Event>) {
        self.expired.clear();
        let Components {
            burning, health, ..
        } = components;

        for (entity, burn) in burning.iter_mut() {
            burn.timer += dt;
            while burn.ticks_remaining > 0 && burn.timer >= burn.tick_interval {
                burn.timer -= burn.tick_interval;
                burn.ticks_remaining -= 1;
                let removed = health
                    .get_mut(entity)
                    .map_or(0.0, |health| health.take(burn.damage_per_tick));
                out_events.push(Event::DamageDealt {
                    target: entity,
                    shield: 0.0,
                    hull: removed,
                });
            }
            if burn.ticks_remaining == 0 {
                self.expired.push(entity);
            }
        }

        for entity in self.expired.drain(..) {
            burning.clear(entity);
            expire(entity, StatusEffectKind::Burning, out_events);
        }
    }

    fn slow(&mut self, components: &mut Components, dt: f32, out_events: &mut Vec<Event>) {
        self.expired.clear();
        for (entity, slowed) in components.slowed.iter_mut() {
            slowed.remaining -= dt;
            if slowed.remaining <= 0.0 {
                self.expired.push(entity);
            }
        }

        for entity in self.expired.drain(..) {
            if let Some(slowed) = components.slowed.take(entity) {
                if let Some(velocity) = components.velocity.get_mut(entity) {
                    if slowed.factor > 0.0 {
                        *velocity = velocity.scaled(1.0 / slowed.factor);
                    }
                }
            }
            expire(entity, StatusEffectKind::Slowed, out_events);
        }
    }

    fn drain(&mut self, components: &mut Components, dt: f32, out_events: &mut Vec<Event>) {
        self.expired.clear();
        let Components {
            drained, velocity, ..
        } = components;

        for (entity, drain) in drained.iter_mut() {
            drain.remaining -= dt;
            if drain.remaining > 0.0 {
                continue;
            }
            drain.stacks = drain.stacks.saturating_sub(1);
            if let Some(velocity) = velocity.get_mut(entity) {
                *velocity = velocity.scaled(1.0 / (1.0 - DRAIN_PER_STACK));
            }
            if drain.stacks > 0 {
                drain.remaining = DRAIN_DURATION;
                trace!(entity = entity.get(), stacks = drain.stacks, "drain stack expired");
            } else {
                self.expired.push(entity);
            }
        }

        for entity in self.expired.drain(..) {
            drained.clear(entity);
            expire(entity, StatusEffectKind::Drained, out_events);
        }
    }

    fn disable(&mut self, components: &mut Components, dt: f32, out_events: &mut Vec<Event>) {
        self.expired.clear();
        for (entity, disabled) in components.disabled.iter_mut() {
            disabled.remaining -= dt;
            if disabled.remaining <= 0.0 {
                self.expired.push(entity);
            }
        }

        for entity in self.expired.drain(..) {
            components.disabled.clear(entity);
            expire(entity, StatusEffectKind::Disabled, out_events);
        }
    }
}

fn expire(entity: EntityId, effect: StatusEffectKind, out_events: &mut Vec<Event>) {
    out_events.push(Event::StatusExpired { entity, effect });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::{AiBehavior, Faction, Health, Position, SimulationConfig, Velocity};

    fn enemy(world: &mut World, speed: f32) -> EntityId {
        let mut events = Vec::new();
        let entity = world.spawn(Faction::Swarm, Position::new(10.0, 10.0), 6.0, &mut events);
        let components = world.components_mut();
        components.health.set(entity, Health::new(100.0));
        components.velocity.set(entity, Velocity::new(speed, 0.0));
        components.ai.set(entity, AiBehavior::Rush);
        entity
    }

    fn speed(world: &World, entity: EntityId) -> f32 {
        world
            .components()
            .velocity
            .copied(entity)
            .map_or(0.0, Velocity::speed)
    }

    #[test]
    fn untagged_entities_are_immune() {
        let mut world = World::new(&SimulationConfig::default());
        let mut events = Vec::new();
        let turret = world.spawn(Faction::Defender, Position::new(5.0, 5.0), 8.0, &mut events);
        events.clear();
        assert!(!inflict(
            world.components_mut(),
            turret,
            StatusEffectKind::Burning,
            &mut events
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn slow_restores_original_speed() {
        let mut world = World::new(&SimulationConfig::default());
        let target = enemy(&mut world, 80.0);
        let mut events = Vec::new();
        assert!(inflict(
            world.components_mut(),
            target,
            StatusEffectKind::Slowed,
            &mut events
        ));
        assert!((speed(&world, target) - 40.0).abs() < 1e-4);

        // Refreshing must not compound the slow.
        assert!(inflict(
            world.components_mut(),
            target,
            StatusEffectKind::Slowed,
            &mut events
        ));
        assert!((speed(&world, target) - 40.0).abs() < 1e-4);

        let mut system = StatusEffects::new();
        for _ in 0..4 {
            system.handle(&mut world, 0.5, &mut events);
        }
        assert!(!world.components().slowed.contains(target));
        assert!((speed(&world, target) - 80.0).abs() < 1e-3);
    }

    #[test]
    fn overlapping_slow_and_drain_unwind_to_the_spawn_speed() {
        let mut world = World::new(&SimulationConfig::default());
        let target = enemy(&mut world, 100.0);
        let mut events = Vec::new();
        for effect in [StatusEffectKind::Slowed, StatusEffectKind::Drained] {
            assert!(inflict(world.components_mut(), target, effect, &mut events));
        }
        assert!((speed(&world, target) - 45.0).abs() < 1e-3);

        let mut system = StatusEffects::new();
        system.handle(&mut world, SLOW_DURATION, &mut events);
        assert!(!world.components().slowed.contains(target));
        assert!(world.components().drained.contains(target));
        assert!((speed(&world, target) - 90.0).abs() < 1e-3);

        system.handle(&mut world, DRAIN_DURATION, &mut events);
        assert!(!world.components().drained.contains(target));
        assert!((speed(&world, target) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn drain_stacks_are_capped_and_unwind_one_at_a_time() {
        let mut world = World::new(&SimulationConfig::default());
        let target = enemy(&mut world, 100.0);
        let mut events = Vec::new();
        for _ in 0..5 {
            let _ = inflict(
                world.components_mut(),
                target,
                StatusEffectKind::Drained,
                &mut events,
            );
        }
        let drained = world.components().drained.copied(target).expect("drained");
        assert_eq!(drained.stacks, 3);
        assert!((speed(&world, target) - 72.9).abs() < 1e-3);

        let mut system = StatusEffects::new();
        system.handle(&mut world, DRAIN_DURATION, &mut events);
        let drained = world.components().drained.copied(target).expect("still drained");
        assert_eq!(drained.stacks, 2);
        assert!((drained.remaining - DRAIN_DURATION).abs() < 1e-6);
        assert!((speed(&world, target) - 81.0).abs() < 1e-3);

        system.handle(&mut world, DRAIN_DURATION, &mut events);
        system.handle(&mut world, DRAIN_DURATION, &mut events);
        assert!(!world.components().drained.contains(target));
        assert!((speed(&world, target) - 100.0).abs() < 1e-3);
        assert!(events.contains(&Event::StatusExpired {
            entity: target,
            effect: StatusEffectKind::Drained,
        }));
    }

    #[test]
    fn disabled_carries_flags_and_expires() {
        let mut world = World::new(&SimulationConfig::default());
        let target = enemy(&mut world, 10.0);
        let mut events = Vec::new();
        let _ = inflict(
            world.components_mut(),
            target,
            StatusEffectKind::Disabled,
            &mut events,
        );
        let disabled = world.components().disabled.copied(target).expect("disabled");
        assert!(disabled.systems.contains(DisabledSystems::WEAPONS));
        assert!(!disabled.systems.contains(DisabledSystems::SHIELDS));

        StatusEffects::new().handle(&mut world, DISABLE_DURATION, &mut events);
        assert!(!world.components().disabled.contains(target));
    }
}
