#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bulwark simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the per-tick systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes them through its
//! `apply` entry point, and every system reports what happened as [`Event`]
//! values collected into an outbox that collaborators drain once per tick.
//! Component value types live in [`components`] and are re-exported here.

mod collaborators;
pub mod components;
mod config;

use serde::{Deserialize, Serialize};

pub use collaborators::{AudioSink, ParticleEffect, ParticleSink, SoundCue, SpriteSink};
pub use components::{
    layers, AiBehavior, Burning, Collider, Disabled, DisabledSystems, Drained, Health, Position,
    Projectile, Shield, Slowed, StatusProc, TargetSlots, Turret, Velocity, WeaponModifiers,
    MAX_TARGET_SLOTS,
};
pub use config::{
    ConfigError, PoolConfig, SimulationConfig, TurretPlacement, WaveGroupConfig, WaveTableEntry,
};

/// Dense identifier of an entity in the global identifier space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the identifier inside component columns.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Pool category an entity is acquired from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Turrets and other defending structures.
    Defender,
    /// Enemy units spawned by waves.
    Enemy,
    /// Ballistic projectiles of either side.
    Projectile,
}

impl EntityCategory {
    /// Every category, in pool order.
    pub const ALL: [EntityCategory; 3] = [Self::Defender, Self::Enemy, Self::Projectile];

    /// Human readable label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Defender => "defender",
            Self::Enemy => "enemy",
            Self::Projectile => "projectile",
        }
    }
}

/// Ownership tag deciding friend and foe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The player's turrets and flagship.
    Defender,
    /// Fast, fragile enemies arriving in large groups.
    Swarm,
    /// Shielded enemies carrying their own guns.
    Raider,
    /// Slow, heavily armoured enemies.
    Behemoth,
    /// Projectiles fired by defenders.
    Projectile,
    /// Projectiles fired by enemies.
    EnemyProjectile,
}

impl Faction {
    /// Enemy factions that waves may spawn.
    pub const ENEMIES: [Faction; 3] = [Self::Swarm, Self::Raider, Self::Behemoth];

    /// Reports whether the faction belongs to the attacking side.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, Self::Swarm | Self::Raider | Self::Behemoth)
    }

    /// Reports whether the faction tags a projectile.
    #[must_use]
    pub const fn is_projectile(self) -> bool {
        matches!(self, Self::Projectile | Self::EnemyProjectile)
    }

    /// Reports whether an attacker of this faction may target `other`.
    ///
    /// Enemy factions are allied with each other and projectiles are never
    /// valid targets.
    #[must_use]
    pub const fn is_hostile_to(self, other: Faction) -> bool {
        match self {
            Self::Defender => other.is_enemy(),
            Self::Swarm | Self::Raider | Self::Behemoth => matches!(other, Self::Defender),
            Self::Projectile | Self::EnemyProjectile => false,
        }
    }

    /// Reports whether a projectile of this faction may hit an entity of `other`.
    #[must_use]
    pub const fn projectile_hits(self, other: Faction) -> bool {
        match self {
            Self::Projectile => other.is_enemy(),
            Self::EnemyProjectile => matches!(other, Self::Defender),
            _ => false,
        }
    }

    /// Projectile faction used by ballistic shots fired from this faction.
    #[must_use]
    pub const fn projectile_faction(self) -> Faction {
        if self.is_enemy() {
            Self::EnemyProjectile
        } else {
            Self::Projectile
        }
    }

    /// Pool category entities of this faction are acquired from.
    #[must_use]
    pub const fn category(self) -> EntityCategory {
        match self {
            Self::Defender => EntityCategory::Defender,
            Self::Swarm | Self::Raider | Self::Behemoth => EntityCategory::Enemy,
            Self::Projectile | Self::EnemyProjectile => EntityCategory::Projectile,
        }
    }

    /// Collider layer bit occupied by the faction.
    #[must_use]
    pub const fn layer(self) -> u32 {
        match self {
            Self::Defender => layers::DEFENDER,
            Self::Swarm | Self::Raider | Self::Behemoth => layers::ENEMY,
            Self::Projectile => layers::PROJECTILE,
            Self::EnemyProjectile => layers::ENEMY_PROJECTILE,
        }
    }

    /// Collider mask of layers the faction reacts to.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Defender => layers::ENEMY_PROJECTILE,
            Self::Swarm | Self::Raider | Self::Behemoth => layers::PROJECTILE,
            Self::Projectile => layers::ENEMY,
            Self::EnemyProjectile => layers::DEFENDER,
        }
    }

    /// Numeric identifier used in configuration files.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Defender => 0,
            Self::Swarm => 1,
            Self::Raider => 2,
            Self::Behemoth => 3,
            Self::Projectile => 4,
            Self::EnemyProjectile => 5,
        }
    }
}

impl TryFrom<u8> for Faction {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Defender),
            1 => Ok(Self::Swarm),
            2 => Ok(Self::Raider),
            3 => Ok(Self::Behemoth),
            4 => Ok(Self::Projectile),
            5 => Ok(Self::EnemyProjectile),
            other => Err(ConfigError::UnknownFaction(other)),
        }
    }
}

/// How a weapon's shot reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Delivery {
    /// Hit-scan beam resolved in the tick it fires.
    Beam,
    /// Pooled projectile flying towards the target position.
    Ballistic {
        /// Flight speed in pixels per second.
        speed: f32,
        /// Seconds before the projectile expires.
        lifetime: f32,
        /// Whether the projectile steers towards its target.
        homing: bool,
    },
}

/// Default statistics of a weapon kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Engagement range in pixels.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Damage per shot.
    pub damage: f32,
    /// Delivery mechanism.
    pub delivery: Delivery,
}

/// Closed set of weapons mounted on turrets and enemy shooters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Rapid low-damage beam.
    Laser,
    /// Slow, long-range, high-damage beam.
    Railgun,
    /// Unguided shell.
    Cannon,
    /// Homing missile.
    Missile,
    /// Enemy plasma bolt.
    Bolt,
}

impl WeaponKind {
    /// Default statistics of the weapon.
    #[must_use]
    pub const fn profile(self) -> WeaponProfile {
        match self {
            Self::Laser => WeaponProfile {
                range: 180.0,
                fire_rate: 4.0,
                damage: 6.0,
                delivery: Delivery::Beam,
            },
            Self::Railgun => WeaponProfile {
                range: 320.0,
                fire_rate: 0.5,
                damage: 60.0,
                delivery: Delivery::Beam,
            },
            Self::Cannon => WeaponProfile {
                range: 220.0,
                fire_rate: 1.5,
                damage: 18.0,
                delivery: Delivery::Ballistic {
                    speed: 400.0,
                    lifetime: 2.0,
                    homing: false,
                },
            },
            Self::Missile => WeaponProfile {
                range: 260.0,
                fire_rate: 0.8,
                damage: 30.0,
                delivery: Delivery::Ballistic {
                    speed: 250.0,
                    lifetime: 4.0,
                    homing: true,
                },
            },
            Self::Bolt => WeaponProfile {
                range: 150.0,
                fire_rate: 0.7,
                damage: 8.0,
                delivery: Delivery::Ballistic {
                    speed: 220.0,
                    lifetime: 3.0,
                    homing: false,
                },
            },
        }
    }

    /// Delivery mechanism of the weapon.
    #[must_use]
    pub const fn delivery(self) -> Delivery {
        self.profile().delivery
    }

    /// Reports whether the weapon resolves as a beam.
    #[must_use]
    pub const fn is_beam(self) -> bool {
        matches!(self.delivery(), Delivery::Beam)
    }

    /// Numeric identifier used in configuration files.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Laser => 0,
            Self::Railgun => 1,
            Self::Cannon => 2,
            Self::Missile => 3,
            Self::Bolt => 4,
        }
    }
}

impl TryFrom<u8> for WeaponKind {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Laser),
            1 => Ok(Self::Railgun),
            2 => Ok(Self::Cannon),
            3 => Ok(Self::Missile),
            4 => Ok(Self::Bolt),
            other => Err(ConfigError::UnknownWeapon(other)),
        }
    }
}

/// Closed set of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusEffectKind {
    /// Damage over time bypassing shields.
    Burning,
    /// Temporary speed reduction.
    Slowed,
    /// Stacking speed drain.
    Drained,
    /// Subsystems knocked offline.
    Disabled,
}

/// Spawn point pattern of a wave group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    /// Tight cluster around a single edge anchor.
    Clustered,
    /// Chevron opening away from the objective.
    VFormation,
    /// Uniformly random points along the world's edges.
    Random,
}

/// Strength tier of a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyVariant {
    /// Regular spawn with wave scaling only.
    Standard,
    /// Promoted spawn with boosted defences.
    Elite,
    /// Boss of a boss wave.
    Boss,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a defending turret.
    PlaceTurret {
        /// Where the turret is anchored.
        position: Position,
        /// Mount statistics; a non-positive fire rate yields an inert turret.
        turret: Turret,
    },
    /// Raises a turret's multi-target level by one.
    UpgradeTargeting {
        /// Turret receiving the upgrade.
        turret: EntityId,
    },
    /// Replaces or removes the weapon modifiers of an attacker.
    SetWeaponModifiers {
        /// Attacker receiving the modifiers.
        entity: EntityId,
        /// New modifiers, or `None` to strip them.
        modifiers: Option<WeaponModifiers>,
    },
    /// Starts the provided wave immediately.
    StartWave {
        /// One-based wave number.
        wave: u32,
    },
    /// Enables or disables automatic wave advancement.
    SetAutoAdvance {
        /// Whether completed waves advance on their own.
        enabled: bool,
    },
    /// Returns an entity to its pool on behalf of an external system.
    ReleaseEntity {
        /// Entity being released.
        entity: EntityId,
    },
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The referenced entity is not in use.
    UnknownEntity,
    /// The referenced entity has no turret.
    NotATurret,
    /// The turret already holds the maximum number of target slots.
    MaxLevel,
    /// The flagship cannot be released.
    Objective,
    /// Placement outside the world bounds.
    OutOfBounds,
    /// Wave numbers start at one.
    InvalidWave,
}

/// Transient description of a beam fired this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamVisual {
    /// Muzzle position.
    pub start: Position,
    /// Impact position.
    pub end: Position,
    /// Weapon that fired the beam.
    pub weapon: WeaponKind,
}

/// Events reported by the world and systems during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Seconds that elapsed in the tick.
        dt: f32,
        /// Simulation time after the tick.
        elapsed: f64,
    },
    /// An entity left its pool and entered the simulation.
    EntityAcquired {
        /// Acquired entity.
        entity: EntityId,
        /// Pool the entity came from.
        category: EntityCategory,
    },
    /// An entity returned to its pool.
    EntityReleased {
        /// Released entity.
        entity: EntityId,
        /// Pool the entity returned to.
        category: EntityCategory,
    },
    /// A pool ran dry and grew by its expansion batch.
    PoolExpanded {
        /// Pool that grew.
        category: EntityCategory,
        /// Identifiers added.
        added: usize,
        /// Total identifiers owned after growth.
        capacity: usize,
    },
    /// An attacker fired at a target.
    ShotFired {
        /// Entity that fired.
        attacker: EntityId,
        /// Entity aimed at.
        target: EntityId,
        /// Weapon used.
        weapon: WeaponKind,
        /// Whether the shot rolled a critical hit.
        critical: bool,
    },
    /// A beam or projectile connected.
    ShotLanded {
        /// Entity that fired, when still known.
        attacker: Option<EntityId>,
        /// Entity hit.
        target: EntityId,
        /// Weapon used.
        weapon: WeaponKind,
        /// Point of impact.
        position: Position,
    },
    /// Damage was resolved against an entity.
    DamageDealt {
        /// Entity that took damage.
        target: EntityId,
        /// Portion absorbed by the shield.
        shield: f32,
        /// Portion removed from the hull.
        hull: f32,
    },
    /// A status effect was applied or refreshed.
    StatusApplied {
        /// Affected entity.
        entity: EntityId,
        /// Effect applied.
        effect: StatusEffectKind,
    },
    /// A status effect wore off.
    StatusExpired {
        /// Affected entity.
        entity: EntityId,
        /// Effect that ended.
        effect: StatusEffectKind,
    },
    /// An entity's hull reached zero and it was removed.
    EntityKilled {
        /// Entity that died.
        entity: EntityId,
        /// Faction the entity belonged to.
        faction: Faction,
        /// Last known position.
        position: Position,
    },
    /// The flagship took damage.
    ObjectiveDamaged {
        /// Damage dealt by this hit.
        amount: f32,
        /// Hull left on the flagship.
        remaining: f32,
    },
    /// The flagship was destroyed.
    ObjectiveDestroyed {
        /// Last known position.
        position: Position,
    },
    /// The wave scheduler spawned an enemy.
    EnemySpawned {
        /// Spawned entity.
        entity: EntityId,
        /// Enemy faction.
        faction: Faction,
        /// Wave the enemy belongs to.
        wave: u32,
        /// Strength tier.
        variant: EnemyVariant,
        /// Spawn point.
        position: Position,
    },
    /// A wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of enemies the wave will spawn.
        total_enemies: u32,
    },
    /// Every enemy of a wave has been removed.
    WaveCompleted {
        /// One-based wave number.
        wave: u32,
    },
    /// A command could not be executed.
    CommandRejected {
        /// Command that failed.
        command: Command,
        /// Specific reason.
        reason: RejectionReason,
    },
}

/// Read-only combat statistics for HUD and debug display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStatsSnapshot {
    /// Total damage dealt, shield and hull portions combined.
    pub total_damage: f32,
    /// Damage absorbed by shields.
    pub shield_damage: f32,
    /// Damage removed from hulls.
    pub hull_damage: f32,
    /// Shots fired.
    pub shots_fired: u64,
    /// Shots that connected.
    pub shots_landed: u64,
    /// Landed over fired, zero before the first shot.
    pub accuracy: f32,
    /// Damage per second over the rolling window.
    pub dps: f32,
    /// Damage taken by the flagship.
    pub objective_damage_taken: f32,
    /// Entities killed.
    pub kills: u64,
}

/// Debug counters of a single entity pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Identifiers ready to be acquired.
    pub available: usize,
    /// Identifiers currently acquired.
    pub in_use: usize,
    /// Identifiers ever owned by the pool.
    pub capacity: usize,
    /// Times the pool grew after running dry.
    pub expansions: usize,
}
