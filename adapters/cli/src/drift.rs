use bulwark_world::{query, World};

/// Distance from the objective at which enemies stop closing in.
const HOLD_DISTANCE: f32 = 72.0;

/// Minimal movement layer for headless runs: every AI-driven entity advances
/// along its velocity until it reaches the holding ring around the objective.
pub(crate) fn advance_enemies(world: &mut World, dt: f32) {
    let objective = query::objective_position(world);
    let components = world.components_mut();
    let enemies: Vec<_> = components.ai.entities().collect();
    for enemy in enemies {
        let Some(velocity) = components.velocity.copied(enemy) else {
            continue;
        };
        let Some(position) = components.position.get_mut(enemy) else {
            continue;
        };
        if position.distance_squared(objective) > HOLD_DISTANCE * HOLD_DISTANCE {
            *position = position.advanced(velocity, dt);
        }
    }
}
