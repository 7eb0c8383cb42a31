#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Flight, expiry and impact of ballistic projectiles.
//!
//! Each tick a projectile steers towards its homing target when it has one,
//! moves along its velocity, and checks the spatial grid around its new
//! position for the closest overlapping hostile. A hit resolves through
//! [`apply_damage`] and returns the projectile to its pool; otherwise the
//! remaining lifetime is decremented and the projectile is released once it
//! runs out.

use bulwark_core::{Collider, EntityId, Event, Faction, Position, Projectile, Velocity};
use bulwark_system_combat::apply_damage;
use bulwark_world::{query, Components, World};
use rand::Rng;
use tracing::debug;

/// Projectile system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct Projectiles {
    shells: Vec<EntityId>,
    nearby: Vec<EntityId>,
    splashed: Vec<EntityId>,
}

impl Projectiles {
    /// Creates a projectile system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every projectile by `dt` seconds.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        dt: f32,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) {
        self.shells.clear();
        self.shells.extend(world.components().projectile.entities());

        for index in 0..self.shells.len() {
            let shell = self.shells[index];
            let Some(mut projectile) = world.components().projectile.copied(shell) else {
                continue;
            };
            steer(world, shell, &mut projectile);

            let components = world.components_mut();
            let velocity = components.velocity.copied(shell).unwrap_or_default();
            let Some(position) = components.position.get_mut(shell) else {
                debug!(shell = shell.get(), "projectile without position released");
                let _ = world.release(shell, out_events);
                continue;
            };
            *position = position.advanced(velocity, dt);
            let position = *position;
            projectile.remaining_lifetime -= dt;
            components.projectile.set(shell, projectile);

            if let Some(target) = self.closest_hit(world, shell, position) {
                let hit = Hit {
                    shell,
                    target,
                    at: position,
                };
                self.impact(world, hit, &projectile, rng, out_events);
                let _ = world.release(shell, out_events);
                continue;
            }

            if projectile.remaining_lifetime <= 0.0 {
                let _ = world.release(shell, out_events);
            }
        }
    }

    fn closest_hit(&mut self, world: &World, shell: EntityId, at: Position) -> Option<EntityId> {
        let components = world.components();
        let faction = components.faction.copied(shell)?;
        let collider = components.collider.copied(shell)?;

        self.nearby.clear();
        let reach = collider.radius + query::max_collider_radius(world);
        world.grid().query_radius(at.x, at.y, reach, &mut self.nearby);

        let mut best: Option<(f32, EntityId)> = None;
        for candidate in self.nearby.iter().copied() {
            if candidate == shell {
                continue;
            }
            let Some(distance_sq) = overlap(components, faction, &collider, at, candidate) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_sq, best_id)) => {
                    distance_sq < best_sq || (distance_sq == best_sq && candidate < best_id)
                }
            };
            if better {
                best = Some((distance_sq, candidate));
            }
        }
        best.map(|(_, entity)| entity)
    }

    fn impact<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        hit: Hit,
        projectile: &Projectile,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) {
        let Hit { shell, target, at } = hit;
        let modifiers = projectile.modifiers;
        let _ = apply_damage(
            world,
            target,
            projectile.damage,
            modifiers.as_ref(),
            rng,
            out_events,
        );
        out_events.push(Event::ShotLanded {
            attacker: projectile.source,
            target,
            weapon: projectile.weapon,
            position: at,
        });

        let area = modifiers.map_or(0.0, |modifiers| modifiers.area_radius);
        if area <= 0.0 {
            return;
        }
        let Some(faction) = world.components().faction.copied(shell) else {
            return;
        };

        self.nearby.clear();
        let reach = area + query::max_collider_radius(world);
        world.grid().query_radius(at.x, at.y, reach, &mut self.nearby);
        let blast = Collider::new(area, 0, 0);

        self.splashed.clear();
        {
            let components = world.components();
            self.splashed.extend(self.nearby.iter().copied().filter(|candidate| {
                *candidate != target
                    && *candidate != shell
                    && overlap(components, faction, &blast, at, *candidate).is_some()
            }));
        }
        self.splashed.sort_unstable();

        for index in 0..self.splashed.len() {
            let victim = self.splashed[index];
            let _ = apply_damage(
                world,
                victim,
                projectile.damage,
                modifiers.as_ref(),
                rng,
                out_events,
            );
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Hit {
    shell: EntityId,
    target: EntityId,
    at: Position,
}

/// Redirects a homing projectile towards its target, or drops a stale target.
fn steer(world: &mut World, shell: EntityId, projectile: &mut Projectile) {
    let Some(target) = projectile.homing_target else {
        return;
    };
    let aim = if world.is_in_use(target) && query::is_alive(world, target) {
        query::position(world, target)
    } else {
        None
    };
    let Some(aim) = aim else {
        debug!(
            shell = shell.get(),
            target = target.get(),
            "stale homing reference cleared"
        );
        projectile.homing_target = None;
        return;
    };
    let components = world.components_mut();
    if let Some(from) = components.position.copied(shell) {
        let heading = Velocity::towards(from, aim, projectile.speed);
        if heading != Velocity::default() {
            components.velocity.set(shell, heading);
        }
    }
}

/// Squared distance to `candidate` when a projectile of `faction` with
/// `collider` at `at` overlaps a live hostile.
fn overlap(
    components: &Components,
    faction: Faction,
    collider: &Collider,
    at: Position,
    candidate: EntityId,
) -> Option<f32> {
    let candidate_faction = components.faction.copied(candidate)?;
    if !faction.projectile_hits(candidate_faction) || !components.is_alive(candidate) {
        return None;
    }
    let position = components.position.copied(candidate)?;
    let other = components.collider.copied(candidate)?;
    collider
        .overlaps(at, &other, position)
        .then(|| at.distance_squared(position))
}
