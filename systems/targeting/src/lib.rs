#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-target acquisition for turrets and enemy shooters.
//!
//! Every attacker carrying both a turret and target slots first drops slots
//! whose target died, changed sides, lost its position or left range. Free
//! slots within the attacker's upgrade level are then filled with the closest
//! hostile candidates reported by the spatial grid, ties broken by the lower
//! entity id.

use std::cmp::Ordering;

use bulwark_core::{EntityId, Faction, Position, TargetSlots};
use bulwark_world::{Components, World};
use tracing::trace;

/// Targeting system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct Targeting {
    attackers: Vec<EntityId>,
    nearby: Vec<EntityId>,
    candidates: Vec<Candidate>,
}

impl Targeting {
    /// Creates a targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and refills the target slots of every attacker.
    ///
    /// The spatial grid must have been rebuilt for the current tick.
    pub fn handle(&mut self, world: &mut World) {
        self.attackers.clear();
        {
            let components = world.components();
            self.attackers.extend(
                components
                    .targets
                    .entities()
                    .filter(|entity| components.turret.contains(*entity)),
            );
        }

        for index in 0..self.attackers.len() {
            let attacker = self.attackers[index];
            let Some(mut slots) = world.components().targets.copied(attacker) else {
                continue;
            };
            self.refresh(world, attacker, &mut slots);
            world.components_mut().targets.set(attacker, slots);
        }
    }

    fn refresh(&mut self, world: &World, attacker: EntityId, slots: &mut TargetSlots) {
        let components = world.components();
        let turret = components.turret.copied(attacker);
        let faction = components.faction.copied(attacker);
        let origin = components.position.copied(attacker);
        let (Some(turret), Some(faction), Some(origin)) = (turret, faction, origin) else {
            clear_all(slots);
            return;
        };
        if turret.is_inert() {
            clear_all(slots);
            return;
        }

        slots.clear_beyond_level();

        let range = turret.range.max(0.0);
        let engagement = Engagement {
            faction,
            origin,
            range_sq: range * range,
        };

        for slot in 0..slots.active_len() {
            if let Some(target) = slots.get(slot) {
                if engagement.distance_sq(components, target).is_none() {
                    trace!(
                        attacker = attacker.get(),
                        target = target.get(),
                        "target slot invalidated"
                    );
                    slots.clear(slot);
                }
            }
        }

        if slots.free_slots() == 0 {
            return;
        }

        self.nearby.clear();
        world
            .grid()
            .query_radius(origin.x, origin.y, range, &mut self.nearby);

        self.candidates.clear();
        for entity in self.nearby.iter().copied() {
            if entity == attacker || slots.contains(entity) {
                continue;
            }
            if let Some(distance_sq) = engagement.distance_sq(components, entity) {
                self.candidates.push(Candidate {
                    distance_sq,
                    entity,
                });
            }
        }

        self.candidates.sort_unstable_by(Candidate::ordering);
        for candidate in &self.candidates {
            if !slots.assign(candidate.entity) {
                break;
            }
        }
    }
}

fn clear_all(slots: &mut TargetSlots) {
    for slot in 0..bulwark_core::MAX_TARGET_SLOTS {
        slots.clear(slot);
    }
}

#[derive(Clone, Copy, Debug)]
struct Engagement {
    faction: Faction,
    origin: Position,
    range_sq: f32,
}

impl Engagement {
    /// Squared distance to `target` when it is a valid target.
    fn distance_sq(&self, components: &Components, target: EntityId) -> Option<f32> {
        if !components.is_alive(target) {
            return None;
        }
        let faction = components.faction.copied(target)?;
        if !self.faction.is_hostile_to(faction) {
            return None;
        }
        let position = components.position.copied(target)?;
        let distance_sq = self.origin.distance_squared(position);
        (distance_sq <= self.range_sq).then_some(distance_sq)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    distance_sq: f32,
    entity: EntityId,
}

impl Candidate {
    fn ordering(a: &Self, b: &Self) -> Ordering {
        a.distance_sq
            .total_cmp(&b.distance_sq)
            .then_with(|| a.entity.cmp(&b.entity))
    }
}
