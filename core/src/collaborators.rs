//! Interfaces of the presentation collaborators fed by the simulation.
//!
//! Rendering, audio and particle output are implemented outside the core. The
//! simulation only calls through these traits after draining its outbox.

use crate::{EntityId, Faction, Position, StatusEffectKind, WeaponKind};

/// Keeps entity visuals in sync with simulation positions.
pub trait SpriteSink {
    /// An entity entered the simulation.
    fn create_sprite(&mut self, entity: EntityId, position: Position);

    /// An entity left the simulation.
    fn remove_sprite(&mut self, entity: EntityId);

    /// An entity moved or turned.
    fn update_sprite(&mut self, entity: EntityId, position: Position, rotation: f32);
}

/// Audio cues triggered by simulation events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A weapon fired.
    Fire(WeaponKind),
    /// An entity exploded.
    Explosion(Faction),
    /// A wave began.
    WaveStart,
    /// A wave was cleared.
    WaveComplete,
}

/// Fire-and-forget audio playback.
pub trait AudioSink {
    /// Plays a cue at the provided volume in `0.0..=1.0`.
    fn play(&mut self, cue: SoundCue, volume: f32);
}

/// Visual-only particle emission request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleEffect {
    /// Sparks at a point of impact.
    Impact {
        /// Where the shot landed.
        position: Position,
    },
    /// Debris of a destroyed entity.
    Explosion {
        /// Where the entity died.
        position: Position,
        /// Faction of the destroyed entity.
        faction: Faction,
    },
    /// Indicator of an effect taking hold.
    Status {
        /// Affected entity.
        entity: EntityId,
        /// Effect applied.
        effect: StatusEffectKind,
    },
}

/// Particle emitter.
pub trait ParticleSink {
    /// Emits a particle effect.
    fn spawn(&mut self, effect: ParticleEffect);
}
