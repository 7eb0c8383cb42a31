#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation context for Bulwark.
//!
//! The [`World`] owns every component column, the per-category entity pools,
//! the spatial grid and the simulation clock. It is passed explicitly to each
//! system; nothing in the simulation lives in global state.

mod pool;
mod spatial;
mod store;

use bulwark_core::{
    Collider, Command, EntityCategory, EntityId, Event, Faction, Health, Position,
    RejectionReason, Shield, SimulationConfig, TargetSlots, Turret,
};
use tracing::{debug, info, warn};

use pool::EntityPool;
pub use spatial::SpatialGrid;
pub use store::{Column, Components};

/// Hull points of a freshly placed turret.
pub const TURRET_HEALTH: f32 = 150.0;
/// Collider radius of a freshly placed turret.
pub const TURRET_RADIUS: f32 = 16.0;

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    components: Components,
    owners: Column<EntityCategory>,
    pools: [EntityPool; 3],
    next_id: u32,
    alive_entities: usize,
    grid: SpatialGrid,
    max_collider_radius: f32,
    width: f32,
    height: f32,
    elapsed: f64,
    tick_index: u64,
    flagship: EntityId,
    objective_anchor: Position,
    objective_destroyed: bool,
    doomed: Vec<EntityId>,
}

impl World {
    /// Creates a world sized by `config`, with pre-warmed pools and the
    /// flagship anchored at the centre of the bounds.
    ///
    /// Bounds or a collider radius that fail validation fall back to the
    /// defaults so that spawning and grid lookups stay well defined.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        let defaults = SimulationConfig::default();
        let (width, height) = if config.width.is_finite()
            && config.height.is_finite()
            && config.width > 0.0
            && config.height > 0.0
        {
            (config.width, config.height)
        } else {
            warn!(
                width = config.width,
                height = config.height,
                "invalid world bounds, using defaults"
            );
            (defaults.width, defaults.height)
        };
        let max_collider_radius =
            if config.max_collider_radius.is_finite() && config.max_collider_radius > 0.0 {
                config.max_collider_radius
            } else {
                warn!(
                    radius = config.max_collider_radius,
                    "invalid collider radius, using default"
                );
                defaults.max_collider_radius
            };

        let pools = EntityCategory::ALL
            .map(|category| EntityPool::new(category, config.pool(category)));
        let mut world = Self {
            components: Components::default(),
            owners: Column::default(),
            pools,
            next_id: 0,
            alive_entities: 0,
            grid: SpatialGrid::new(width, height, max_collider_radius * 2.0),
            max_collider_radius,
            width,
            height,
            elapsed: 0.0,
            tick_index: 0,
            flagship: EntityId::new(0),
            objective_anchor: Position::new(width * 0.5, height * 0.5),
            objective_destroyed: false,
            doomed: Vec::new(),
        };

        world.flagship = world.allocate_id();
        world.alive_entities += 1;
        let flagship = world.flagship;
        let anchor = world.objective_anchor;
        let components = &mut world.components;
        components.faction.set(flagship, Faction::Defender);
        components.position.set(flagship, anchor);
        components.health.set(flagship, Health::new(config.flagship_health));
        components.shield.set(flagship, Shield::new(config.flagship_shield));
        components.collider.set(
            flagship,
            Collider::new(
                config.flagship_radius,
                Faction::Defender.layer(),
                Faction::Defender.mask(),
            ),
        );

        for category in EntityCategory::ALL {
            let initial = config.pool(category).initial;
            let fresh = world.allocate_batch(category, initial);
            world.pool_mut(category).stock(&fresh);
        }

        world
    }

    /// Read access to every component column.
    #[must_use]
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Write access to every component column.
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Spatial grid as of the last rebuild.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Pops a blank identifier from the category's pool, growing the pool by
    /// its expansion batch when it has run dry.
    pub fn acquire(&mut self, category: EntityCategory, out_events: &mut Vec<Event>) -> EntityId {
        let entity = match self.pool_mut(category).take() {
            Some(entity) => entity,
            None => self.expand(category, out_events),
        };
        self.alive_entities += 1;
        out_events.push(Event::EntityAcquired { entity, category });
        entity
    }

    /// Grows an exhausted pool by its expansion batch and hands out the first
    /// fresh identifier.
    fn expand(&mut self, category: EntityCategory, out_events: &mut Vec<Event>) -> EntityId {
        let batch = self.pool(category).expansion_batch();
        let first = self.allocate_id();
        self.owners.set(first, category);
        let rest = self.allocate_batch(category, batch.saturating_sub(1));

        let pool = self.pool_mut(category);
        pool.adopt(first);
        pool.stock(&rest);
        pool.note_expansion();
        let capacity = pool.stats().capacity;
        warn!(
            category = category.label(),
            added = batch,
            capacity,
            "entity pool exhausted, expanding"
        );
        out_events.push(Event::PoolExpanded {
            category,
            added: batch,
            capacity,
        });
        first
    }

    /// Acquires an entity for `faction` and attaches its faction tag, position
    /// and collision filter.
    pub fn spawn(
        &mut self,
        faction: Faction,
        position: Position,
        radius: f32,
        out_events: &mut Vec<Event>,
    ) -> EntityId {
        let entity = self.acquire(faction.category(), out_events);
        let components = &mut self.components;
        components.faction.set(entity, faction);
        components.position.set(entity, position);
        components
            .collider
            .set(entity, Collider::new(radius, faction.layer(), faction.mask()));
        entity
    }

    /// Clears every component of `entity` and returns it to its pool.
    ///
    /// Releasing an entity that is not in use is a logged no-op returning
    /// `false`. The flagship is never released.
    pub fn release(&mut self, entity: EntityId, out_events: &mut Vec<Event>) -> bool {
        let Some(category) = self.owners.copied(entity) else {
            debug!(entity = entity.get(), "release of unpooled entity ignored");
            return false;
        };
        if !self.pool_mut(category).give_back(entity) {
            debug!(
                entity = entity.get(),
                category = category.label(),
                "double release ignored"
            );
            return false;
        }
        self.components.clear_entity(entity);
        self.alive_entities = self.alive_entities.saturating_sub(1);
        out_events.push(Event::EntityReleased { entity, category });
        true
    }

    /// Places a defending turret at `position` with the provided level.
    ///
    /// A turret with a non-positive fire rate is still placed but never fires.
    pub fn place_turret(
        &mut self,
        position: Position,
        turret: Turret,
        level: u8,
        out_events: &mut Vec<Event>,
    ) -> EntityId {
        if turret.is_inert() {
            warn!(
                fire_rate = turret.fire_rate,
                weapon = ?turret.weapon,
                "turret placed with invalid fire rate, it will stay idle"
            );
        }
        let entity = self.spawn(Faction::Defender, position, TURRET_RADIUS, out_events);
        let components = &mut self.components;
        components.health.set(entity, Health::new(TURRET_HEALTH));
        components.turret.set(entity, turret);
        components.targets.set(entity, TargetSlots::with_level(level));
        entity
    }

    /// Advances the simulation clock.
    pub fn advance_clock(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += f64::from(dt);
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            dt,
            elapsed: self.elapsed,
        });
    }

    /// Rebuilds the spatial grid from scratch using every position-bearing
    /// entity.
    pub fn rebuild_spatial_index(&mut self) {
        self.grid.clear();
        for (entity, position) in self.components.position.iter() {
            self.grid.insert(entity, position.x, position.y);
        }
    }

    /// Removes every entity whose hull reached zero this tick.
    ///
    /// Each death is reported once as [`Event::EntityKilled`]. Pooled entities
    /// go back to their pool; the flagship's destruction is reported as
    /// [`Event::ObjectiveDestroyed`] instead.
    pub fn reap(&mut self, out_events: &mut Vec<Event>) {
        let mut doomed = std::mem::take(&mut self.doomed);
        doomed.clear();
        doomed.extend(
            self.components
                .health
                .iter()
                .filter(|(_, health)| !health.is_alive())
                .map(|(entity, _)| entity),
        );

        for entity in doomed.iter().copied() {
            let faction = self.components.faction.copied(entity);
            let position = self.components.position.copied(entity).unwrap_or_default();
            if let Some(faction) = faction {
                out_events.push(Event::EntityKilled {
                    entity,
                    faction,
                    position,
                });
            }

            if entity == self.flagship {
                self.components.clear_entity(entity);
                self.alive_entities = self.alive_entities.saturating_sub(1);
                if !self.objective_destroyed {
                    self.objective_destroyed = true;
                    warn!(x = position.x, y = position.y, "flagship destroyed");
                    out_events.push(Event::ObjectiveDestroyed { position });
                }
                continue;
            }

            let _ = self.release(entity, out_events);
        }

        self.doomed = doomed;
    }

    /// Reports whether `entity` is currently part of the simulation.
    #[must_use]
    pub fn is_in_use(&self, entity: EntityId) -> bool {
        if entity == self.flagship {
            return !self.objective_destroyed;
        }
        self.owners
            .copied(entity)
            .is_some_and(|category| self.pool(category).is_in_use(entity))
    }

    fn allocate_id(&mut self) -> EntityId {
        let entity = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        entity
    }

    fn pool(&self, category: EntityCategory) -> &EntityPool {
        &self.pools[pool_slot(category)]
    }

    fn pool_mut(&mut self, category: EntityCategory) -> &mut EntityPool {
        let pool = &mut self.pools[pool_slot(category)];
        debug_assert_eq!(pool.category(), category);
        pool
    }

    fn allocate_batch(&mut self, category: EntityCategory, count: usize) -> Vec<EntityId> {
        let fresh: Vec<EntityId> = (0..count).map(|_| self.allocate_id()).collect();
        for entity in &fresh {
            self.owners.set(*entity, category);
        }
        fresh
    }
}

const fn pool_slot(category: EntityCategory) -> usize {
    match category {
        EntityCategory::Defender => 0,
        EntityCategory::Enemy => 1,
        EntityCategory::Projectile => 2,
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Wave commands are owned by the wave scheduler and ignored here.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let rejection = match &command {
        Command::PlaceTurret { position, turret } => {
            if in_bounds(world, *position) {
                let _ = world.place_turret(*position, *turret, 1, out_events);
                None
            } else {
                Some(RejectionReason::OutOfBounds)
            }
        }
        Command::UpgradeTargeting { turret } => {
            if !world.is_in_use(*turret) {
                Some(RejectionReason::UnknownEntity)
            } else {
                match world.components.targets.get_mut(*turret) {
                    None => Some(RejectionReason::NotATurret),
                    Some(slots) => {
                        if slots.upgrade() {
                            info!(
                                turret = turret.get(),
                                level = slots.level(),
                                "turret targeting upgraded"
                            );
                            None
                        } else {
                            Some(RejectionReason::MaxLevel)
                        }
                    }
                }
            }
        }
        Command::SetWeaponModifiers { entity, modifiers } => {
            if !world.is_in_use(*entity) {
                Some(RejectionReason::UnknownEntity)
            } else if !world.components.turret.contains(*entity) {
                Some(RejectionReason::NotATurret)
            } else {
                match modifiers {
                    Some(modifiers) => world.components.modifiers.set(*entity, *modifiers),
                    None => world.components.modifiers.clear(*entity),
                }
                None
            }
        }
        Command::ReleaseEntity { entity } => {
            if *entity == world.flagship {
                Some(RejectionReason::Objective)
            } else if world.release(*entity, out_events) {
                None
            } else {
                Some(RejectionReason::UnknownEntity)
            }
        }
        Command::StartWave { .. } | Command::SetAutoAdvance { .. } => None,
    };

    if let Some(reason) = rejection {
        warn!(?command, ?reason, "command rejected");
        out_events.push(Event::CommandRejected { command, reason });
    }
}

fn in_bounds(world: &World, position: Position) -> bool {
    (0.0..=world.width).contains(&position.x) && (0.0..=world.height).contains(&position.y)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use bulwark_core::{EntityCategory, EntityId, Faction, Health, Position, PoolStats, Shield};

    use super::{pool_slot, World};

    /// Identifier of the flagship.
    #[must_use]
    pub fn flagship(world: &World) -> EntityId {
        world.flagship
    }

    /// Position the flagship occupies, kept after its destruction.
    #[must_use]
    pub fn objective_position(world: &World) -> Position {
        world.objective_anchor
    }

    /// Reports whether the flagship has been destroyed.
    #[must_use]
    pub fn objective_destroyed(world: &World) -> bool {
        world.objective_destroyed
    }

    /// Hull and shield of the flagship while it stands.
    #[must_use]
    pub fn objective_status(world: &World) -> Option<(Health, Option<Shield>)> {
        let health = world.components.health.copied(world.flagship)?;
        Some((health, world.components.shield.copied(world.flagship)))
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn elapsed(world: &World) -> f64 {
        world.elapsed
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// World width and height in pixels.
    #[must_use]
    pub fn bounds(world: &World) -> (f32, f32) {
        (world.width, world.height)
    }

    /// Largest collider radius the spatial grid was sized for.
    ///
    /// Broad-phase queries for overlaps widen their radius by this amount
    /// because the grid buckets centres only.
    #[must_use]
    pub fn max_collider_radius(world: &World) -> f32 {
        world.max_collider_radius
    }

    /// Entities currently in play, the flagship included. Metric only.
    #[must_use]
    pub fn alive_entities(world: &World) -> usize {
        world.alive_entities
    }

    /// Pool counters of one category.
    #[must_use]
    pub fn pool_stats(world: &World, category: EntityCategory) -> PoolStats {
        world.pools[pool_slot(category)].stats()
    }

    /// Entities currently acquired from the category's pool, in id order.
    #[must_use]
    pub fn in_use(world: &World, category: EntityCategory) -> Vec<EntityId> {
        world.pools[pool_slot(category)].in_use().collect()
    }

    /// Faction of an entity.
    #[must_use]
    pub fn faction(world: &World, entity: EntityId) -> Option<Faction> {
        world.components.faction.copied(entity)
    }

    /// Position of an entity.
    #[must_use]
    pub fn position(world: &World, entity: EntityId) -> Option<Position> {
        world.components.position.copied(entity)
    }

    /// Reports whether an entity still has hull left.
    #[must_use]
    pub fn is_alive(world: &World, entity: EntityId) -> bool {
        world.components.is_alive(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::{PoolConfig, WeaponKind};

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            defender_pool: PoolConfig::new(2, 2),
            enemy_pool: PoolConfig::new(4, 2),
            projectile_pool: PoolConfig::new(4, 4),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn flagship_is_created_outside_the_pools() {
        let world = World::new(&small_config());
        let flagship = query::flagship(&world);
        assert!(world.is_in_use(flagship));
        assert_eq!(query::faction(&world, flagship), Some(Faction::Defender));
        assert_eq!(query::alive_entities(&world), 1);
        for category in EntityCategory::ALL {
            assert_eq!(query::pool_stats(&world, category).in_use, 0);
        }
    }

    #[test]
    fn invalid_bounds_fall_back_to_defaults() {
        let config = SimulationConfig {
            width: f32::NAN,
            height: -5.0,
            max_collider_radius: f32::INFINITY,
            ..SimulationConfig::default()
        };
        let world = World::new(&config);
        let defaults = SimulationConfig::default();

        assert_eq!(query::bounds(&world), (defaults.width, defaults.height));
        assert_eq!(query::max_collider_radius(&world), defaults.max_collider_radius);
        assert_eq!(query::objective_position(&world), defaults.centre());
        assert_eq!(world.grid().cell_size(), defaults.max_collider_radius * 2.0);
    }

    #[test]
    fn exhausted_pool_expands_by_batch() {
        let mut world = World::new(&small_config());
        let mut events = Vec::new();
        let acquired: Vec<_> = (0..5)
            .map(|_| world.acquire(EntityCategory::Enemy, &mut events))
            .collect();

        assert!(events.contains(&Event::PoolExpanded {
            category: EntityCategory::Enemy,
            added: 2,
            capacity: 6,
        }));
        let stats = query::pool_stats(&world, EntityCategory::Enemy);
        assert_eq!(stats.in_use, 5);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.expansions, 1);
        assert_eq!(query::pool_stats(&world, EntityCategory::Projectile).in_use, 0);

        let mut unique = acquired.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), acquired.len());
        assert!(!acquired.contains(&query::flagship(&world)));
    }

    #[test]
    fn release_clears_components_and_ignores_repeats() {
        let mut world = World::new(&small_config());
        let mut events = Vec::new();
        let enemy = world.spawn(
            Faction::Swarm,
            Position::new(10.0, 10.0),
            8.0,
            &mut events,
        );
        world.components_mut().health.set(enemy, Health::new(20.0));

        assert!(world.release(enemy, &mut events));
        assert!(world.components().is_blank(enemy));
        assert!(!world.release(enemy, &mut events));
        assert_eq!(query::alive_entities(&world), 1);
    }

    #[test]
    fn reap_reports_each_death_once() {
        let mut world = World::new(&small_config());
        let mut events = Vec::new();
        let enemy = world.spawn(
            Faction::Behemoth,
            Position::new(50.0, 60.0),
            20.0,
            &mut events,
        );
        world.components_mut().health.set(
            enemy,
            Health {
                current: 0.0,
                max: 100.0,
            },
        );
        events.clear();

        world.reap(&mut events);
        world.reap(&mut events);

        let kills = events
            .iter()
            .filter(|event| matches!(event, Event::EntityKilled { .. }))
            .count();
        assert_eq!(kills, 1);
        assert_eq!(
            events.first(),
            Some(&Event::EntityKilled {
                entity: enemy,
                faction: Faction::Behemoth,
                position: Position::new(50.0, 60.0),
            })
        );
        assert!(!world.is_in_use(enemy));
    }

    #[test]
    fn flagship_death_is_reported_as_objective_loss() {
        let mut world = World::new(&small_config());
        let flagship = query::flagship(&world);
        if let Some(health) = world.components_mut().health.get_mut(flagship) {
            let _ = health.take(f32::MAX);
        }
        let mut events = Vec::new();
        world.reap(&mut events);

        assert!(query::objective_destroyed(&world));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ObjectiveDestroyed { .. })));
        assert!(!world.is_in_use(flagship));
        assert_eq!(query::pool_stats(&world, EntityCategory::Defender).in_use, 0);
    }

    #[test]
    fn upgrade_command_is_capped() {
        let mut world = World::new(&small_config());
        let mut events = Vec::new();
        let turret = world.place_turret(
            Position::new(100.0, 100.0),
            Turret::for_weapon(WeaponKind::Laser),
            2,
            &mut events,
        );
        events.clear();

        apply(&mut world, Command::UpgradeTargeting { turret }, &mut events);
        assert!(events.is_empty());
        apply(&mut world, Command::UpgradeTargeting { turret }, &mut events);
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                command: Command::UpgradeTargeting { turret },
                reason: RejectionReason::MaxLevel,
            }]
        );
    }

    #[test]
    fn releasing_the_flagship_is_rejected() {
        let mut world = World::new(&small_config());
        let flagship = query::flagship(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ReleaseEntity { entity: flagship },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::CommandRejected {
                reason: RejectionReason::Objective,
                ..
            }]
        ));
        assert!(world.is_in_use(flagship));
    }

    #[test]
    fn placement_outside_bounds_is_rejected() {
        let mut world = World::new(&small_config());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTurret {
                position: Position::new(-5.0, 10.0),
                turret: Turret::for_weapon(WeaponKind::Cannon),
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::CommandRejected {
                reason: RejectionReason::OutOfBounds,
                ..
            }]
        ));
    }
}
