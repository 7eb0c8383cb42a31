use bulwark_core::{AudioSink, Event, ParticleEffect, ParticleSink, SoundCue, SpriteSink};
use bulwark_world::{query, World};

const FIRE_VOLUME: f32 = 0.6;
const EXPLOSION_VOLUME: f32 = 1.0;
const WAVE_VOLUME: f32 = 0.8;

/// Fans `events` out to the presentation collaborators, then refreshes the
/// sprite of every moving entity.
pub(crate) fn fan_out(
    world: &World,
    events: &[Event],
    sprites: &mut dyn SpriteSink,
    audio: &mut dyn AudioSink,
    particles: &mut dyn ParticleSink,
) {
    for event in events {
        match *event {
            Event::EntityAcquired { entity, .. } => {
                if let Some(position) = query::position(world, entity) {
                    sprites.create_sprite(entity, position);
                }
            }
            Event::EntityReleased { entity, .. } => sprites.remove_sprite(entity),
            Event::ShotFired { weapon, .. } => audio.play(SoundCue::Fire(weapon), FIRE_VOLUME),
            Event::ShotLanded { position, .. } => {
                particles.spawn(ParticleEffect::Impact { position });
            }
            Event::StatusApplied { entity, effect } => {
                particles.spawn(ParticleEffect::Status { entity, effect });
            }
            Event::EntityKilled {
                faction, position, ..
            } => {
                audio.play(SoundCue::Explosion(faction), EXPLOSION_VOLUME);
                particles.spawn(ParticleEffect::Explosion { position, faction });
            }
            Event::WaveStarted { .. } => audio.play(SoundCue::WaveStart, WAVE_VOLUME),
            Event::WaveCompleted { .. } => audio.play(SoundCue::WaveComplete, WAVE_VOLUME),
            _ => {}
        }
    }

    let components = world.components();
    for (entity, velocity) in components.velocity.iter() {
        if !world.is_in_use(entity) {
            continue;
        }
        let Some(position) = components.position.copied(entity) else {
            continue;
        };
        let rotation = velocity.y.atan2(velocity.x);
        sprites.update_sprite(entity, position, rotation);
    }
}
