#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weapon firing and damage resolution.
//!
//! [`Combat`] walks every armed entity, fires at the targets left in its slots
//! once its cooldown has elapsed, resolves beams on the spot and launches
//! pooled projectiles for ballistic weapons. [`apply_damage`] is the single
//! entry point through which every hit, beam or projectile, reaches a target.

use bulwark_core::{
    BeamVisual, Delivery, DisabledSystems, EntityId, Event, Faction, Position, Projectile,
    Turret, Velocity, WeaponModifiers,
};
use bulwark_system_status_effects as status_effects;
use bulwark_world::{query, World};
use rand::Rng;
use tracing::{debug, trace};

/// Collider radius of every ballistic projectile.
pub const PROJECTILE_RADIUS: f32 = 4.0;

/// Firing state of an armed entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FiringState {
    /// No valid target, or a weapon that can never fire.
    Idle,
    /// Holding a target with the cooldown elapsed.
    Ready,
    /// Holding a target while the weapon recharges.
    Cooldown,
}

/// Derives the firing state of `turret` at simulation time `now`.
#[must_use]
pub fn firing_state(turret: &Turret, has_target: bool, now: f64) -> FiringState {
    if !has_target || turret.is_inert() {
        FiringState::Idle
    } else if turret.cooled_down(now) {
        FiringState::Ready
    } else {
        FiringState::Cooldown
    }
}

/// Applies `raw_damage` to `target` and returns the damage actually dealt.
///
/// Modifiers scale the damage by their shield or hull multiplier depending on
/// whether the target's shield is up, the shield absorbs first and the rest is
/// taken from the hull, floored at zero. A successful status roll then
/// attaches the modifiers' effect. Targets reduced to zero hull are left in
/// place for the death sweep.
pub fn apply_damage<R: Rng + ?Sized>(
    world: &mut World,
    target: EntityId,
    raw_damage: f32,
    modifiers: Option<&WeaponModifiers>,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> f32 {
    let flagship = query::flagship(world);
    let components = world.components_mut();
    if !components.health.contains(target) {
        trace!(target = target.get(), "damage against entity without hull ignored");
        return 0.0;
    }

    let shield_up = components.shield.get(target).is_some_and(|shield| shield.is_up());
    let mut damage = raw_damage.max(0.0);
    if let Some(modifiers) = modifiers {
        damage *= if shield_up {
            modifiers.shield_multiplier
        } else {
            modifiers.hull_multiplier
        };
        damage = damage.max(0.0);
    }

    let shield_damage = match components.shield.get_mut(target) {
        Some(shield) if shield_up => shield.absorb(damage),
        _ => 0.0,
    };
    let remaining = damage - shield_damage;
    let hull_damage = components
        .health
        .get_mut(target)
        .map_or(0.0, |health| health.take(remaining));

    if let Some(status) = modifiers.and_then(|modifiers| modifiers.status) {
        if status.chance > 0.0 && rng.gen::<f32>() < status.chance {
            let _ = status_effects::inflict(components, target, status.effect, out_events);
        }
    }

    let dealt = shield_damage + hull_damage;
    out_events.push(Event::DamageDealt {
        target,
        shield: shield_damage,
        hull: hull_damage,
    });
    if target == flagship && dealt > 0.0 {
        let remaining = components
            .health
            .get(target)
            .map_or(0.0, |health| health.current);
        out_events.push(Event::ObjectiveDamaged {
            amount: dealt,
            remaining,
        });
    }
    dealt
}

/// Combat system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct Combat {
    attackers: Vec<EntityId>,
    targets: Vec<EntityId>,
}

impl Combat {
    /// Creates a combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every ready weapon.
    ///
    /// Beam descriptors fired this tick are appended to `beams`.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
        out_events: &mut Vec<Event>,
        beams: &mut Vec<BeamVisual>,
    ) {
        let now = query::elapsed(world);
        self.attackers.clear();
        {
            let components = world.components();
            self.attackers.extend(components.turret.entities().filter(|entity| {
                !components
                    .disabled
                    .get(*entity)
                    .is_some_and(|disabled| disabled.systems.contains(DisabledSystems::WEAPONS))
            }));
        }

        for index in 0..self.attackers.len() {
            let attacker = self.attackers[index];
            let components = world.components();
            let (Some(turret), Some(slots), Some(origin), Some(faction)) = (
                components.turret.copied(attacker),
                components.targets.copied(attacker),
                components.position.copied(attacker),
                components.faction.copied(attacker),
            ) else {
                continue;
            };
            let modifiers = components.modifiers.copied(attacker);

            self.targets.clear();
            self.targets.extend(
                slots
                    .targets()
                    .filter(|target| components.is_alive(*target)),
            );

            if firing_state(&turret, !self.targets.is_empty(), now) != FiringState::Ready {
                continue;
            }

            let shooter = Shooter {
                entity: attacker,
                faction,
                origin,
                turret,
                modifiers,
            };
            for target_index in 0..self.targets.len() {
                let target = self.targets[target_index];
                shooter.fire(world, target, rng, out_events, beams);
            }

            if let Some(turret) = world.components_mut().turret.get_mut(attacker) {
                turret.last_fired_at = Some(now);
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Shooter {
    entity: EntityId,
    faction: Faction,
    origin: Position,
    turret: Turret,
    modifiers: Option<WeaponModifiers>,
}

impl Shooter {
    fn fire<R: Rng + ?Sized>(
        &self,
        world: &mut World,
        target: EntityId,
        rng: &mut R,
        out_events: &mut Vec<Event>,
        beams: &mut Vec<BeamVisual>,
    ) {
        let Some(aim) = query::position(world, target) else {
            debug!(target = target.get(), "target lost its position before firing");
            return;
        };

        let critical = self.modifiers.is_some_and(|modifiers| {
            modifiers.crit_chance > 0.0 && rng.gen::<f32>() < modifiers.crit_chance
        });
        let damage = match (critical, self.modifiers) {
            (true, Some(modifiers)) => self.turret.damage * modifiers.crit_multiplier,
            _ => self.turret.damage,
        };
        let weapon = self.turret.weapon;
        out_events.push(Event::ShotFired {
            attacker: self.entity,
            target,
            weapon,
            critical,
        });

        match weapon.delivery() {
            Delivery::Beam => {
                let _ = apply_damage(
                    world,
                    target,
                    damage,
                    self.modifiers.as_ref(),
                    rng,
                    out_events,
                );
                out_events.push(Event::ShotLanded {
                    attacker: Some(self.entity),
                    target,
                    weapon,
                    position: aim,
                });
                beams.push(BeamVisual {
                    start: self.origin,
                    end: aim,
                    weapon,
                });
            }
            Delivery::Ballistic {
                speed,
                lifetime,
                homing,
            } => {
                let shell = world.spawn(
                    self.faction.projectile_faction(),
                    self.origin,
                    PROJECTILE_RADIUS,
                    out_events,
                );
                let components = world.components_mut();
                components
                    .velocity
                    .set(shell, Velocity::towards(self.origin, aim, speed));
                components.projectile.set(
                    shell,
                    Projectile {
                        damage,
                        speed,
                        remaining_lifetime: lifetime,
                        homing_target: homing.then_some(target),
                        weapon,
                        source: Some(self.entity),
                        modifiers: self.modifiers,
                    },
                );
            }
        }
    }
}
