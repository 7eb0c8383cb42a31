//! Component value types stored in the world's column tables.
//!
//! Every component is a plain value. The world keeps one column per component
//! type indexed by [`EntityId`], so an entity is nothing more than the set of
//! columns holding a value at its index.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{EntityId, StatusEffectKind, WeaponKind};

/// Number of target slots an attacker can ever hold.
pub const MAX_TARGET_SLOTS: usize = 3;

/// World coordinates in pixels, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate, growing downwards.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another position.
    #[must_use]
    pub fn distance_squared(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Returns the position displaced by `velocity` over `dt` seconds.
    #[must_use]
    pub fn advanced(self, velocity: Velocity, dt: f32) -> Self {
        Self {
            x: self.x + velocity.x * dt,
            y: self.y + velocity.y * dt,
        }
    }
}

impl From<Position> for Vec2 {
    fn from(position: Position) -> Self {
        Vec2::new(position.x, position.y)
    }
}

impl From<Vec2> for Position {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

/// Signed velocity in pixels per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Velocity {
    /// Creates a new velocity.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Velocity pointing from `from` towards `to` with the provided speed.
    ///
    /// Coincident points yield a zero velocity.
    #[must_use]
    pub fn towards(from: Position, to: Position, speed: f32) -> Self {
        let direction = (Vec2::from(to) - Vec2::from(from)).normalize_or_zero();
        (direction * speed).into()
    }

    /// Magnitude of the velocity.
    #[must_use]
    pub fn speed(self) -> f32 {
        Vec2::from(self).length()
    }

    /// Returns the velocity multiplied by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Returns a velocity with the same heading and the requested magnitude.
    ///
    /// A zero velocity has no heading and stays zero.
    #[must_use]
    pub fn with_speed(self, speed: f32) -> Self {
        (Vec2::from(self).normalize_or_zero() * speed).into()
    }
}

impl From<Velocity> for Vec2 {
    fn from(velocity: Velocity) -> Self {
        Vec2::new(velocity.x, velocity.y)
    }
}

impl From<Vec2> for Velocity {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

/// Hull points of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Remaining hull points, always within `0.0..=max`.
    pub current: f32,
    /// Maximum hull points.
    pub max: f32,
}

impl Health {
    /// Creates a full health pool.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Reports whether the entity still has hull left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Fraction of hull remaining, for presentation.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Removes up to `amount` hull points and returns how many were removed.
    pub fn take(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let removed = amount.min(self.current.max(0.0));
        self.current = (self.current - removed).clamp(0.0, self.max);
        removed
    }
}

/// Regenerating barrier that absorbs damage before [`Health`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Remaining shield points, always within `0.0..=max`.
    pub current: f32,
    /// Maximum shield points.
    pub max: f32,
}

impl Shield {
    /// Creates a fully charged shield.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Reports whether the shield still absorbs damage.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.current > 0.0
    }

    /// Absorbs up to `amount` damage and returns the absorbed portion.
    pub fn absorb(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let absorbed = amount.min(self.current.max(0.0));
        self.current = (self.current - absorbed).clamp(0.0, self.max);
        absorbed
    }
}

/// Bit flags used by [`Collider`] layers and masks.
pub mod layers {
    /// Defending structures and the flagship.
    pub const DEFENDER: u32 = 1 << 0;
    /// Enemy units.
    pub const ENEMY: u32 = 1 << 1;
    /// Projectiles fired by defenders.
    pub const PROJECTILE: u32 = 1 << 2;
    /// Projectiles fired by enemies.
    pub const ENEMY_PROJECTILE: u32 = 1 << 3;
}

/// Broad-phase circle and collision filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Radius of the collision circle in pixels.
    pub radius: f32,
    /// Layer bits this collider occupies.
    pub layer: u32,
    /// Layer bits this collider reacts to.
    pub mask: u32,
}

impl Collider {
    /// Creates a collider.
    #[must_use]
    pub const fn new(radius: f32, layer: u32, mask: u32) -> Self {
        Self {
            radius,
            layer,
            mask,
        }
    }

    /// Reports whether this collider reacts to `other`.
    #[must_use]
    pub const fn accepts(&self, other: &Collider) -> bool {
        self.mask & other.layer != 0
    }

    /// Fine-phase circle overlap test.
    #[must_use]
    pub fn overlaps(&self, at: Position, other: &Collider, other_at: Position) -> bool {
        let reach = self.radius + other.radius;
        at.distance_squared(other_at) <= reach * reach
    }
}

/// Weapon mount of an attacking entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    /// Engagement range in pixels.
    pub range: f32,
    /// Shots per second. Values `<= 0` make the turret permanently idle.
    pub fire_rate: f32,
    /// Damage per shot before modifiers.
    pub damage: f32,
    /// Simulation time of the last shot, if the turret has fired.
    pub last_fired_at: Option<f64>,
    /// Weapon carried by the mount.
    pub weapon: WeaponKind,
}

impl Turret {
    /// Creates a turret using the weapon's default statistics.
    #[must_use]
    pub fn for_weapon(weapon: WeaponKind) -> Self {
        let profile = weapon.profile();
        Self {
            range: profile.range,
            fire_rate: profile.fire_rate,
            damage: profile.damage,
            last_fired_at: None,
            weapon,
        }
    }

    /// Seconds between two shots, or `None` for a misconfigured turret.
    #[must_use]
    pub fn cooldown(&self) -> Option<f64> {
        if self.fire_rate > 0.0 && self.fire_rate.is_finite() {
            Some(1.0 / f64::from(self.fire_rate))
        } else {
            None
        }
    }

    /// Reports whether the turret can never fire.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.cooldown().is_none()
    }

    /// Reports whether the cooldown has elapsed at simulation time `now`.
    #[must_use]
    pub fn cooled_down(&self, now: f64) -> bool {
        match (self.cooldown(), self.last_fired_at) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(cooldown), Some(last)) => now - last >= cooldown,
        }
    }
}

/// Target slots held by an attacker, bounded by its multi-target upgrade level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSlots {
    slots: [Option<EntityId>; MAX_TARGET_SLOTS],
    level: u8,
}

impl Default for TargetSlots {
    fn default() -> Self {
        Self::with_level(1)
    }
}

impl TargetSlots {
    /// Creates empty slots at the provided upgrade level, clamped to `1..=3`.
    #[must_use]
    pub fn with_level(level: u8) -> Self {
        Self {
            slots: [None; MAX_TARGET_SLOTS],
            level: clamp_level(level),
        }
    }

    /// Current multi-target upgrade level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Number of slots usable at the current level.
    #[must_use]
    pub const fn active_len(&self) -> usize {
        self.level as usize
    }

    /// Raises the upgrade level by one. Returns `false` once at the cap.
    pub fn upgrade(&mut self) -> bool {
        if usize::from(self.level) >= MAX_TARGET_SLOTS {
            return false;
        }
        self.level += 1;
        true
    }

    /// Sets the upgrade level, clamped to `1..=3`.
    pub fn set_level(&mut self, level: u8) {
        self.level = clamp_level(level);
    }

    /// Target stored in `slot`, if any.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<EntityId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Clears a single slot.
    pub fn clear(&mut self, slot: usize) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = None;
        }
    }

    /// Clears every slot at or beyond the current level.
    pub fn clear_beyond_level(&mut self) {
        let active = self.active_len();
        for slot in self.slots.iter_mut().skip(active) {
            *slot = None;
        }
    }

    /// Reports whether `entity` already occupies a slot.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.slots.iter().any(|slot| *slot == Some(entity))
    }

    /// Stores `entity` in the first free active slot. Returns `false` when full.
    pub fn assign(&mut self, entity: EntityId) -> bool {
        let active = self.active_len();
        match self.slots.iter_mut().take(active).find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(entity);
                true
            }
            None => false,
        }
    }

    /// Number of free slots within the current level.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.slots
            .iter()
            .take(self.active_len())
            .filter(|slot| slot.is_none())
            .count()
    }

    /// Occupied targets within the current level, in slot order.
    pub fn targets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().take(self.active_len()).filter_map(|slot| *slot)
    }

    /// Number of occupied slots across the whole array.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

fn clamp_level(level: u8) -> u8 {
    level.clamp(1, MAX_TARGET_SLOTS as u8)
}

/// In-flight ballistic projectile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Damage dealt on impact, crits already folded in.
    pub damage: f32,
    /// Flight speed in pixels per second.
    pub speed: f32,
    /// Seconds left before the projectile expires.
    pub remaining_lifetime: f32,
    /// Entity steered towards each tick, if the weapon homes.
    pub homing_target: Option<EntityId>,
    /// Weapon that launched the projectile.
    pub weapon: WeaponKind,
    /// Entity that fired, which may no longer exist.
    pub source: Option<EntityId>,
    /// Attacker modifiers captured when the projectile was launched.
    pub modifiers: Option<WeaponModifiers>,
}

/// Enemy control tag consumed by the external AI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiBehavior {
    /// Charges straight at the flagship.
    Rush,
    /// Circles around defences while closing in.
    Flank,
    /// Holds at range and fires enemy projectiles.
    Artillery,
    /// Boss variant with its own script.
    Boss,
}

/// Status effect attached to hits by [`WeaponModifiers`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusProc {
    /// Effect inflicted on a successful roll.
    pub effect: StatusEffectKind,
    /// Probability in `0.0..=1.0` that a hit inflicts the effect.
    pub chance: f32,
}

/// Optional per-attacker damage modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponModifiers {
    /// Multiplier applied while the target's shield is up.
    pub shield_multiplier: f32,
    /// Multiplier applied once the target's shield is down.
    pub hull_multiplier: f32,
    /// Probability in `0.0..=1.0` of a critical hit.
    pub crit_chance: f32,
    /// Damage multiplier of a critical hit.
    pub crit_multiplier: f32,
    /// Splash radius of projectile impacts; zero disables splash.
    pub area_radius: f32,
    /// Status effect inflicted on hit.
    pub status: Option<StatusProc>,
}

impl Default for WeaponModifiers {
    fn default() -> Self {
        Self {
            shield_multiplier: 1.0,
            hull_multiplier: 1.0,
            crit_chance: 0.0,
            crit_multiplier: 2.0,
            area_radius: 0.0,
            status: None,
        }
    }
}

/// Damage over time that bypasses shields.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Burning {
    /// Hull damage applied on every tick of the effect.
    pub damage_per_tick: f32,
    /// Seconds between two ticks.
    pub tick_interval: f32,
    /// Seconds accumulated towards the next tick.
    pub timer: f32,
    /// Ticks left before the effect ends.
    pub ticks_remaining: u32,
}

/// Speed reduction undone by its inverse factor on expiry, so drains applied
/// meanwhile stay in effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slowed {
    /// Multiplier applied to the speed while slowed.
    pub factor: f32,
    /// Seconds left.
    pub remaining: f32,
}

/// Stacking speed drain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drained {
    /// Active stacks, at most [`Drained::MAX_STACKS`].
    pub stacks: u8,
    /// Seconds left on the shared duration.
    pub remaining: f32,
}

impl Drained {
    /// Stack cap.
    pub const MAX_STACKS: u8 = 3;
}

/// Subsystems knocked offline by a [`Disabled`] effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisabledSystems(u8);

impl DisabledSystems {
    /// Weapons cannot fire.
    pub const WEAPONS: Self = Self(1 << 0);
    /// Engines cannot thrust.
    pub const ENGINES: Self = Self(1 << 1);
    /// Shields cannot absorb.
    pub const SHIELDS: Self = Self(1 << 2);

    /// No subsystem offline.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Reports whether every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Duration-only effect marking subsystems offline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Disabled {
    /// Seconds left.
    pub remaining: f32,
    /// Subsystems offline while the effect lasts.
    pub systems: DisabledSystems,
}
