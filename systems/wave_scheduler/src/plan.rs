use bulwark_core::{AiBehavior, Faction, Formation, WaveTableEntry};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Shortest inter-spawn delay procedural growth may reach.
pub const MIN_SPAWN_DELAY: f32 = 0.1;
/// Largest group size procedural growth may reach.
pub const MAX_GROUP_COUNT: u32 = 10_000;
/// Ceiling of the difficulty multiplier, keeping scaled stats finite.
pub const MAX_DIFFICULTY_SCALE: f32 = 1.0e6;

const LINEAR_WAVES: u32 = 10;
const LINEAR_STEP: f32 = 0.1;
const EXPONENTIAL_BASE: f32 = 1.05;
const COUNT_GROWTH: f32 = 0.15;
const COUNT_EXPONENT: f32 = 1.1;
const DELAY_DECAY: f32 = 0.95;

/// One enemy group of a wave definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveGroup {
    /// Faction of every enemy in the group.
    pub faction: Faction,
    /// Enemies spawned by the group.
    pub count: u32,
    /// Seconds between two spawns of the group.
    pub spawn_delay: f32,
    /// Spawn point pattern.
    pub formation: Formation,
}

impl WaveGroup {
    const fn new(faction: Faction, count: u32, spawn_delay: f32, formation: Formation) -> Self {
        Self {
            faction,
            count,
            spawn_delay,
            formation,
        }
    }
}

const WAVE_1: [WaveGroup; 1] = [WaveGroup::new(Faction::Swarm, 8, 1.0, Formation::Clustered)];
const WAVE_2: [WaveGroup; 2] = [
    WaveGroup::new(Faction::Swarm, 12, 0.8, Formation::Random),
    WaveGroup::new(Faction::Raider, 3, 2.0, Formation::Clustered),
];
const WAVE_3: [WaveGroup; 2] = [
    WaveGroup::new(Faction::Swarm, 14, 0.7, Formation::VFormation),
    WaveGroup::new(Faction::Raider, 5, 1.6, Formation::Random),
];
const WAVE_4: [WaveGroup; 3] = [
    WaveGroup::new(Faction::Swarm, 16, 0.6, Formation::Random),
    WaveGroup::new(Faction::Raider, 6, 1.4, Formation::VFormation),
    WaveGroup::new(Faction::Behemoth, 1, 4.0, Formation::Clustered),
];
const WAVE_5: [WaveGroup; 3] = [
    WaveGroup::new(Faction::Swarm, 18, 0.5, Formation::Clustered),
    WaveGroup::new(Faction::Raider, 8, 1.2, Formation::Random),
    WaveGroup::new(Faction::Behemoth, 2, 3.5, Formation::VFormation),
];

/// Number of waves covered by the built-in table.
pub const PREDEFINED_WAVES: u32 = 5;

fn predefined(wave: u32) -> &'static [WaveGroup] {
    match wave {
        1 => &WAVE_1,
        2 => &WAVE_2,
        3 => &WAVE_3,
        4 => &WAVE_4,
        _ => &WAVE_5,
    }
}

/// Multiplier applied to enemy health and shields in `wave`.
///
/// Grows linearly by a tenth per wave up to wave 10, then by five percent
/// compounded per wave, capped at [`MAX_DIFFICULTY_SCALE`].
#[must_use]
pub fn difficulty_scale(wave: u32) -> f32 {
    let wave = wave.max(1);
    if wave <= LINEAR_WAVES {
        1.0 + LINEAR_STEP * (wave - 1) as f32
    } else {
        let top = 1.0 + LINEAR_STEP * (LINEAR_WAVES - 1) as f32;
        let exponent = i32::try_from(wave - LINEAR_WAVES).unwrap_or(i32::MAX);
        (top * EXPONENTIAL_BASE.powi(exponent)).min(MAX_DIFFICULTY_SCALE)
    }
}

/// Resolves the groups of `wave`.
///
/// Configured entries replace the built-in definition of their wave. Waves
/// past the built-in table grow the last predefined wave: counts scale
/// linearly plus a mild exponential term, up to [`MAX_GROUP_COUNT`], and
/// delays shrink geometrically.
/// Configured groups naming an unknown or non-enemy faction are skipped.
#[must_use]
pub fn wave_definition(wave: u32, overrides: &[WaveTableEntry]) -> Vec<WaveGroup> {
    if let Some(entry) = overrides.iter().find(|entry| entry.wave == wave) {
        return entry
            .groups
            .iter()
            .filter_map(|group| {
                let faction = match Faction::try_from(group.faction) {
                    Ok(faction) if faction.is_enemy() => faction,
                    Ok(faction) => {
                        warn!(wave, ?faction, "wave group names a non-enemy faction, skipped");
                        return None;
                    }
                    Err(error) => {
                        warn!(wave, %error, "wave group skipped");
                        return None;
                    }
                };
                Some(WaveGroup::new(
                    faction,
                    group.count,
                    group.spawn_delay.max(0.0),
                    group.formation,
                ))
            })
            .collect();
    }

    if wave <= PREDEFINED_WAVES {
        return predefined(wave).to_vec();
    }

    let growth = (wave - PREDEFINED_WAVES) as f32;
    predefined(PREDEFINED_WAVES)
        .iter()
        .map(|group| {
            let scaled = group.count as f32 * (1.0 + COUNT_GROWTH * growth)
                + COUNT_EXPONENT.powf(growth);
            let count = scaled.round().min(MAX_GROUP_COUNT as f32) as u32;
            let delay = (group.spawn_delay * DELAY_DECAY.powf(growth)).max(MIN_SPAWN_DELAY);
            WaveGroup::new(group.faction, count, delay, group.formation)
        })
        .collect()
}

/// Stat changes applied to the boss of a boss wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossProfile {
    /// Wave the boss appears in.
    pub wave: u32,
    /// Faction whose first spawn is promoted.
    pub faction: Faction,
    /// Health multiplier on top of wave scaling.
    pub health_multiplier: f32,
    /// Shield multiplier on top of wave scaling.
    pub shield_multiplier: f32,
    /// Collider radius multiplier.
    pub radius_multiplier: f32,
    /// Speed multiplier.
    pub speed_multiplier: f32,
}

const BOSSES: [BossProfile; 4] = [
    BossProfile {
        wave: 5,
        faction: Faction::Behemoth,
        health_multiplier: 8.0,
        shield_multiplier: 4.0,
        radius_multiplier: 2.0,
        speed_multiplier: 0.6,
    },
    BossProfile {
        wave: 10,
        faction: Faction::Raider,
        health_multiplier: 10.0,
        shield_multiplier: 6.0,
        radius_multiplier: 2.0,
        speed_multiplier: 0.7,
    },
    BossProfile {
        wave: 15,
        faction: Faction::Behemoth,
        health_multiplier: 12.0,
        shield_multiplier: 8.0,
        radius_multiplier: 2.0,
        speed_multiplier: 0.5,
    },
    BossProfile {
        wave: 20,
        faction: Faction::Behemoth,
        health_multiplier: 16.0,
        shield_multiplier: 10.0,
        radius_multiplier: 2.0,
        speed_multiplier: 0.5,
    },
];

/// Boss configuration of `wave`, if it is a boss wave.
#[must_use]
pub fn boss_for(wave: u32) -> Option<BossProfile> {
    BOSSES.iter().copied().find(|boss| boss.wave == wave)
}

/// Base statistics of a freshly spawned enemy before wave scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTemplate {
    /// Hull points.
    pub health: f32,
    /// Shield points; zero means unshielded.
    pub shield: f32,
    /// Collider radius.
    pub radius: f32,
    /// Base movement speed in pixels per second.
    pub speed: f32,
    /// Behaviour tag handed to external AI.
    pub behavior: AiBehavior,
}

/// Base statistics of an enemy faction.
#[must_use]
pub fn template(faction: Faction) -> Option<EnemyTemplate> {
    let template = match faction {
        Faction::Swarm => EnemyTemplate {
            health: 30.0,
            shield: 0.0,
            radius: 8.0,
            speed: 90.0,
            behavior: AiBehavior::Rush,
        },
        Faction::Raider => EnemyTemplate {
            health: 60.0,
            shield: 20.0,
            radius: 12.0,
            speed: 70.0,
            behavior: AiBehavior::Flank,
        },
        Faction::Behemoth => EnemyTemplate {
            health: 240.0,
            shield: 120.0,
            radius: 20.0,
            speed: 40.0,
            behavior: AiBehavior::Artillery,
        },
        Faction::Defender | Faction::Projectile | Faction::EnemyProjectile => return None,
    };
    Some(template)
}

/// Seed of the random stream used while spawning `wave`.
pub(crate) fn wave_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
