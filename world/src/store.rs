//! Struct-of-arrays component storage indexed by dense entity identifiers.

use bulwark_core::{
    AiBehavior, Burning, Collider, Disabled, Drained, EntityId, Faction, Health, Position,
    Projectile, Shield, Slowed, TargetSlots, Turret, Velocity, WeaponModifiers,
};

/// One component column: slot `n` holds the component of entity `n`, if any.
#[derive(Clone, Debug)]
pub struct Column<T> {
    values: Vec<Option<T>>,
    present: usize,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            present: 0,
        }
    }
}

impl<T> Column<T> {
    /// Component of `entity`, if attached.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.values.get(entity.index()).and_then(Option::as_ref)
    }

    /// Mutable component of `entity`, if attached.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.values.get_mut(entity.index()).and_then(Option::as_mut)
    }

    /// Reports whether `entity` carries the component.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.get(entity).is_some()
    }

    /// Attaches or replaces the component of `entity`.
    pub fn set(&mut self, entity: EntityId, value: T) {
        let index = entity.index();
        if index >= self.values.len() {
            self.values.resize_with(index + 1, || None);
        }
        if self.values[index].replace(value).is_none() {
            self.present += 1;
        }
    }

    /// Detaches the component of `entity` and returns it.
    pub fn take(&mut self, entity: EntityId) -> Option<T> {
        let removed = self.values.get_mut(entity.index()).and_then(Option::take);
        if removed.is_some() {
            self.present -= 1;
        }
        removed
    }

    /// Detaches the component of `entity`, discarding it.
    pub fn clear(&mut self, entity: EntityId) {
        let _ = self.take(entity);
    }

    /// Number of entities carrying the component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.present
    }

    /// Reports whether no entity carries the component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    /// Iterates attached components in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_ref().map(|value| (entity_at(index), value)))
    }

    /// Iterates attached components mutably in identifier order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        self.values
            .iter_mut()
            .enumerate()
            .filter_map(|(index, value)| value.as_mut().map(|value| (entity_at(index), value)))
    }

    /// Identifiers carrying the component, in identifier order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|(entity, _)| entity)
    }
}

impl<T: Copy> Column<T> {
    /// Copy of the component of `entity`, if attached.
    #[must_use]
    pub fn copied(&self, entity: EntityId) -> Option<T> {
        self.get(entity).copied()
    }
}

fn entity_at(index: usize) -> EntityId {
    EntityId::new(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Every component column of the world.
#[derive(Clone, Debug, Default)]
pub struct Components {
    /// Ownership tags.
    pub faction: Column<Faction>,
    /// World positions.
    pub position: Column<Position>,
    /// Velocities.
    pub velocity: Column<Velocity>,
    /// Hull points.
    pub health: Column<Health>,
    /// Shields.
    pub shield: Column<Shield>,
    /// Collision circles.
    pub collider: Column<Collider>,
    /// Weapon mounts.
    pub turret: Column<Turret>,
    /// Target slots of attackers.
    pub targets: Column<TargetSlots>,
    /// In-flight projectiles.
    pub projectile: Column<Projectile>,
    /// Enemy control tags.
    pub ai: Column<AiBehavior>,
    /// Attacker damage modifiers.
    pub modifiers: Column<WeaponModifiers>,
    /// Burning effects.
    pub burning: Column<Burning>,
    /// Slowed effects.
    pub slowed: Column<Slowed>,
    /// Drained effects.
    pub drained: Column<Drained>,
    /// Disabled effects.
    pub disabled: Column<Disabled>,
}

impl Components {
    /// Detaches every component of `entity`.
    pub fn clear_entity(&mut self, entity: EntityId) {
        self.faction.clear(entity);
        self.position.clear(entity);
        self.velocity.clear(entity);
        self.health.clear(entity);
        self.shield.clear(entity);
        self.collider.clear(entity);
        self.turret.clear(entity);
        self.targets.clear(entity);
        self.projectile.clear(entity);
        self.ai.clear(entity);
        self.modifiers.clear(entity);
        self.burning.clear(entity);
        self.slowed.clear(entity);
        self.drained.clear(entity);
        self.disabled.clear(entity);
    }

    /// Reports whether `entity` carries no component at all.
    #[must_use]
    pub fn is_blank(&self, entity: EntityId) -> bool {
        !(self.faction.contains(entity)
            || self.position.contains(entity)
            || self.velocity.contains(entity)
            || self.health.contains(entity)
            || self.shield.contains(entity)
            || self.collider.contains(entity)
            || self.turret.contains(entity)
            || self.targets.contains(entity)
            || self.projectile.contains(entity)
            || self.ai.contains(entity)
            || self.modifiers.contains(entity)
            || self.burning.contains(entity)
            || self.slowed.contains(entity)
            || self.drained.contains(entity)
            || self.disabled.contains(entity))
    }

    /// Reports whether `entity` is alive: it has hull above zero.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.health.get(entity).is_some_and(Health::is_alive)
    }
}
