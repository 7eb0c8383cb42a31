use tracing::span::EnteredSpan;
use tracing::trace_span;

/// Steps of a simulation tick, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Queued commands are applied to the world.
    Commands,
    /// The clock advances.
    Clock,
    /// The spatial grid is rebuilt from current positions.
    SpatialIndex,
    /// Target slots are validated and refilled.
    Targeting,
    /// Ready turrets fire.
    Combat,
    /// Projectiles fly, expire and collide.
    Projectiles,
    /// Status effects tick.
    StatusEffects,
    /// Dead entities are reported and returned to their pools.
    DeathSweep,
    /// The wave scheduler advances and spawns.
    Waves,
    /// Combat statistics absorb the tick's events.
    Analytics,
}

impl Stage {
    /// Every stage in execution order.
    pub const ORDER: [Stage; 10] = [
        Self::Commands,
        Self::Clock,
        Self::SpatialIndex,
        Self::Targeting,
        Self::Combat,
        Self::Projectiles,
        Self::StatusEffects,
        Self::DeathSweep,
        Self::Waves,
        Self::Analytics,
    ];

    /// Stable label used in traces.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Clock => "clock",
            Self::SpatialIndex => "spatial_index",
            Self::Targeting => "targeting",
            Self::Combat => "combat",
            Self::Projectiles => "projectiles",
            Self::StatusEffects => "status_effects",
            Self::DeathSweep => "death_sweep",
            Self::Waves => "waves",
            Self::Analytics => "analytics",
        }
    }

    pub(crate) fn enter(self, tick: u64) -> EnteredSpan {
        trace_span!("stage", stage = self.label(), tick).entered()
    }
}
