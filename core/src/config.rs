//! Tunable parameters of a simulation session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EntityCategory, Faction, Formation, Position, Turret, WeaponKind};

/// Configuration errors detected while validating a [`SimulationConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A faction id outside the known set.
    #[error("unknown faction id {0}")]
    UnknownFaction(u8),
    /// A weapon id outside the known set.
    #[error("unknown weapon id {0}")]
    UnknownWeapon(u8),
    /// A fire rate that can never produce a cooldown.
    #[error("turret {index} has invalid fire rate {fire_rate}")]
    InvalidFireRate {
        /// Position of the turret in the placement list.
        index: usize,
        /// Offending fire rate.
        fire_rate: f32,
    },
    /// World bounds that are empty or not finite.
    #[error("world bounds {width}x{height} must be positive")]
    InvalidBounds {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// A collider radius that cannot size the spatial grid.
    #[error("max collider radius {0} must be positive")]
    InvalidColliderRadius(f32),
    /// A pool that could never grow.
    #[error("{} pool expansion batch must be at least one", .0.label())]
    EmptyExpansionBatch(EntityCategory),
    /// A wave group referencing a faction that is not an enemy.
    #[error("wave {wave} spawns non-enemy faction {faction:?}")]
    NotAnEnemy {
        /// Wave the group belongs to.
        wave: u32,
        /// Offending faction.
        faction: Faction,
    },
    /// A rolling window that cannot hold any sample.
    #[error("dps window {0} must be positive")]
    InvalidDpsWindow(f32),
}

/// Initial size and growth of one entity pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Identifiers allocated up front.
    pub initial: usize,
    /// Identifiers added whenever the pool runs dry.
    pub expansion_batch: usize,
}

impl PoolConfig {
    /// Creates a pool configuration.
    #[must_use]
    pub const fn new(initial: usize, expansion_batch: usize) -> Self {
        Self {
            initial,
            expansion_batch,
        }
    }
}

/// Turret placed when the session starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretPlacement {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Numeric weapon id.
    pub weapon: u8,
    /// Fire rate override.
    #[serde(default)]
    pub fire_rate: Option<f32>,
    /// Range override.
    #[serde(default)]
    pub range: Option<f32>,
    /// Damage override.
    #[serde(default)]
    pub damage: Option<f32>,
    /// Multi-target level, one when omitted.
    #[serde(default)]
    pub level: Option<u8>,
}

impl TurretPlacement {
    /// Placement position.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Resolves the weapon id and applies the overrides.
    pub fn turret(&self) -> Result<Turret, ConfigError> {
        let weapon = WeaponKind::try_from(self.weapon)?;
        let mut turret = Turret::for_weapon(weapon);
        if let Some(fire_rate) = self.fire_rate {
            turret.fire_rate = fire_rate;
        }
        if let Some(range) = self.range {
            turret.range = range;
        }
        if let Some(damage) = self.damage {
            turret.damage = damage;
        }
        Ok(turret)
    }
}

/// One group of a configured wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveGroupConfig {
    /// Numeric faction id.
    pub faction: u8,
    /// Enemies in the group.
    pub count: u32,
    /// Seconds between two spawns of the group.
    pub spawn_delay: f32,
    /// Spawn point pattern.
    pub formation: Formation,
}

/// Wave definition overriding the built-in table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveTableEntry {
    /// One-based wave number the entry replaces.
    pub wave: u32,
    /// Groups spawned by the wave.
    pub groups: Vec<WaveGroupConfig>,
}

/// Parameters of a simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World width in pixels.
    pub width: f32,
    /// World height in pixels.
    pub height: f32,
    /// Largest collider radius expected in play; sizes the spatial grid.
    pub max_collider_radius: f32,
    /// Flagship hull points.
    pub flagship_health: f32,
    /// Flagship shield points.
    pub flagship_shield: f32,
    /// Flagship collider radius.
    pub flagship_radius: f32,
    /// Defender pool sizing.
    pub defender_pool: PoolConfig,
    /// Enemy pool sizing.
    pub enemy_pool: PoolConfig,
    /// Projectile pool sizing.
    pub projectile_pool: PoolConfig,
    /// Seed of every random stream.
    pub seed: u64,
    /// Whether completed waves advance on their own.
    pub auto_advance: bool,
    /// Seconds between a completed wave and the next one.
    pub wave_advance_delay: f32,
    /// Spawns allowed in a single tick across all groups.
    pub max_spawns_per_tick: u32,
    /// Seconds covered by the rolling dps figure.
    pub dps_window: f32,
    /// Turrets placed when the session starts.
    pub turrets: Vec<TurretPlacement>,
    /// Waves replacing the built-in table.
    pub waves: Vec<WaveTableEntry>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            max_collider_radius: 32.0,
            flagship_health: 1_000.0,
            flagship_shield: 500.0,
            flagship_radius: 32.0,
            defender_pool: PoolConfig::new(16, 8),
            enemy_pool: PoolConfig::new(128, 32),
            projectile_pool: PoolConfig::new(256, 64),
            seed: 0x00b0_1a4c,
            auto_advance: true,
            wave_advance_delay: 5.0,
            max_spawns_per_tick: 8,
            dps_window: 5.0,
            turrets: Vec::new(),
            waves: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Centre of the world, where the flagship is anchored.
    #[must_use]
    pub fn centre(&self) -> Position {
        Position::new(self.width * 0.5, self.height * 0.5)
    }

    /// Pool sizing of the provided category.
    #[must_use]
    pub const fn pool(&self, category: EntityCategory) -> PoolConfig {
        match category {
            EntityCategory::Defender => self.defender_pool,
            EntityCategory::Enemy => self.enemy_pool,
            EntityCategory::Projectile => self.projectile_pool,
        }
    }

    /// Checks every field, returning the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !bounds_ok {
            return Err(ConfigError::InvalidBounds {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.max_collider_radius.is_finite() && self.max_collider_radius > 0.0) {
            return Err(ConfigError::InvalidColliderRadius(self.max_collider_radius));
        }
        for category in EntityCategory::ALL {
            if self.pool(category).expansion_batch == 0 {
                return Err(ConfigError::EmptyExpansionBatch(category));
            }
        }
        if !(self.dps_window > 0.0) {
            return Err(ConfigError::InvalidDpsWindow(self.dps_window));
        }
        for (index, placement) in self.turrets.iter().enumerate() {
            let turret = placement.turret()?;
            if turret.is_inert() {
                return Err(ConfigError::InvalidFireRate {
                    index,
                    fire_rate: turret.fire_rate,
                });
            }
        }
        for entry in &self.waves {
            for group in &entry.groups {
                let faction = Faction::try_from(group.faction)?;
                if !faction.is_enemy() {
                    return Err(ConfigError::NotAnEnemy {
                        wave: entry.wave,
                        faction,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_fire_rate_is_rejected() {
        let config = SimulationConfig {
            turrets: vec![TurretPlacement {
                x: 10.0,
                y: 10.0,
                weapon: 0,
                fire_rate: Some(0.0),
                range: None,
                damage: None,
                level: None,
            }],
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFireRate {
                index: 0,
                fire_rate: 0.0
            })
        );
    }

    #[test]
    fn parses_partial_toml() {
        let config: SimulationConfig = toml::from_str(
            r#"
            seed = 7
            auto_advance = false

            [[turrets]]
            x = 100.0
            y = 200.0
            weapon = 3
            level = 2

            [[waves]]
            wave = 1
            groups = [{ faction = 1, count = 4, spawn_delay = 0.5, formation = "v_formation" }]
            "#,
        )
        .expect("config parses");

        assert_eq!(config.seed, 7);
        assert!(!config.auto_advance);
        assert_eq!(config.width, 1280.0);
        assert_eq!(config.turrets[0].level, Some(2));
        assert_eq!(config.waves[0].groups[0].formation, Formation::VFormation);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn unknown_wave_faction_is_rejected() {
        let config = SimulationConfig {
            waves: vec![WaveTableEntry {
                wave: 2,
                groups: vec![WaveGroupConfig {
                    faction: 77,
                    count: 1,
                    spawn_delay: 1.0,
                    formation: Formation::Random,
                }],
            }],
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::UnknownFaction(77)));
    }

    #[test]
    fn defender_waves_are_rejected() {
        let config = SimulationConfig {
            waves: vec![WaveTableEntry {
                wave: 1,
                groups: vec![WaveGroupConfig {
                    faction: Faction::Defender.id(),
                    count: 1,
                    spawn_delay: 1.0,
                    formation: Formation::Random,
                }],
            }],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotAnEnemy { wave: 1, .. })
        ));
    }
}
