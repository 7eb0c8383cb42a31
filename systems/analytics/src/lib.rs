#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat statistics derived from the simulation's event stream.
//!
//! Statistics describe the defence: damage, shots and kills count only when
//! they land on enemies spawned by the wave scheduler. They are read-only
//! reporting figures and never feed back into gameplay.

mod metrics;

use std::collections::BTreeSet;

use bulwark_core::{CombatStatsSnapshot, EntityCategory, EntityId, Event};

pub use metrics::{accuracy, RollingWindow};

/// Pure analytics system folding events into running combat statistics.
#[derive(Clone, Debug)]
pub struct Analytics {
    hostiles: BTreeSet<EntityId>,
    window: RollingWindow,
    shield_damage: f64,
    hull_damage: f64,
    shots_fired: u64,
    shots_landed: u64,
    objective_damage_taken: f64,
    kills: u64,
}

impl Analytics {
    /// Creates an analytics system whose DPS figure spans `dps_window` seconds.
    #[must_use]
    pub fn new(dps_window: f32) -> Self {
        Self {
            hostiles: BTreeSet::new(),
            window: RollingWindow::new(dps_window),
            shield_damage: 0.0,
            hull_damage: 0.0,
            shots_fired: 0,
            shots_landed: 0,
            objective_damage_taken: 0.0,
            kills: 0,
        }
    }

    /// Folds one tick's events into the statistics, in emission order.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { elapsed, .. } => self.window.advance_to(*elapsed),
                Event::EnemySpawned { entity, .. } => {
                    let _ = self.hostiles.insert(*entity);
                }
                Event::EntityReleased {
                    entity,
                    category: EntityCategory::Enemy,
                } => {
                    let _ = self.hostiles.remove(entity);
                }
                Event::ShotFired { target, .. } if self.hostiles.contains(target) => {
                    self.shots_fired += 1;
                }
                Event::ShotLanded { target, .. } if self.hostiles.contains(target) => {
                    self.shots_landed += 1;
                }
                Event::DamageDealt {
                    target,
                    shield,
                    hull,
                } if self.hostiles.contains(target) => {
                    self.shield_damage += f64::from(*shield);
                    self.hull_damage += f64::from(*hull);
                    self.window.record(shield + hull);
                }
                Event::ObjectiveDamaged { amount, .. } => {
                    self.objective_damage_taken += f64::from(*amount);
                }
                Event::EntityKilled { faction, .. } if faction.is_enemy() => {
                    self.kills += 1;
                }
                _ => {}
            }
        }
    }

    /// Current statistics.
    #[must_use]
    pub fn snapshot(&self) -> CombatStatsSnapshot {
        CombatStatsSnapshot {
            total_damage: (self.shield_damage + self.hull_damage) as f32,
            shield_damage: self.shield_damage as f32,
            hull_damage: self.hull_damage as f32,
            shots_fired: self.shots_fired,
            shots_landed: self.shots_landed,
            accuracy: accuracy(self.shots_fired, self.shots_landed),
            dps: self.window.rate(),
            objective_damage_taken: self.objective_damage_taken as f32,
            kills: self.kills,
        }
    }
}
