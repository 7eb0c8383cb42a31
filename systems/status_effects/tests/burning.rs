use bulwark_core::{
    AiBehavior, EntityId, Event, Faction, Health, Position, Shield, SimulationConfig,
    StatusEffectKind,
};
use bulwark_system_status_effects::{
    burn_ticks, inflict, StatusEffects, BURN_DAMAGE_PER_TICK, BURN_DURATION, BURN_TICK_INTERVAL,
};
use bulwark_world::World;

fn burning_enemy(world: &mut World) -> EntityId {
    let mut events = Vec::new();
    let entity = world.spawn(Faction::Behemoth, Position::new(300.0, 300.0), 20.0, &mut events);
    let components = world.components_mut();
    components.health.set(entity, Health::new(500.0));
    components.shield.set(entity, Shield::new(200.0));
    components.ai.set(entity, AiBehavior::Flank);
    assert!(inflict(
        components,
        entity,
        StatusEffectKind::Burning,
        &mut events
    ));
    entity
}

fn burn_hits(events: &[Event], target: EntityId) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::DamageDealt {
                target: hit,
                shield,
                hull,
            } if *hit == target => {
                assert_eq!(*shield, 0.0, "burns bypass shields");
                Some(*hull)
            }
            _ => None,
        })
        .collect()
}

#[test]
fn burn_ticks_match_duration_over_interval() {
    assert_eq!(
        burn_ticks(),
        (BURN_DURATION / BURN_TICK_INTERVAL).floor() as u32
    );
}

#[test]
fn burning_applies_fixed_damage_per_tick_then_disappears() {
    for dt in [0.5_f32, 0.25, 0.1, 1.0 / 60.0] {
        let mut world = World::new(&SimulationConfig::default());
        let target = burning_enemy(&mut world);
        let mut system = StatusEffects::new();
        let mut events = Vec::new();

        let steps = ((BURN_DURATION + 1.0) / dt).ceil() as u32;
        for _ in 0..steps {
            system.handle(&mut world, dt, &mut events);
        }

        let hits = burn_hits(&events, target);
        assert_eq!(hits.len() as u32, burn_ticks(), "dt {dt}");
        assert!(hits.iter().all(|hit| *hit == BURN_DAMAGE_PER_TICK));
        assert!(!world.components().burning.contains(target));

        let health = world.components().health.copied(target).expect("alive");
        let expected = 500.0 - BURN_DAMAGE_PER_TICK * burn_ticks() as f32;
        assert!((health.current - expected).abs() < 1e-3);
        let shield = world.components().shield.copied(target).expect("shielded");
        assert_eq!(shield.current, 200.0);

        let expiries = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::StatusExpired {
                        effect: StatusEffectKind::Burning,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(expiries, 1);
    }
}

#[test]
fn reapplying_a_burn_restarts_its_ticks() {
    let mut world = World::new(&SimulationConfig::default());
    let target = burning_enemy(&mut world);
    let mut system = StatusEffects::new();
    let mut events = Vec::new();

    system.handle(&mut world, 1.0, &mut events);
    assert!(inflict(
        world.components_mut(),
        target,
        StatusEffectKind::Burning,
        &mut events
    ));
    let burn = world.components().burning.copied(target).expect("burning");
    assert_eq!(burn.ticks_remaining, burn_ticks());
    assert_eq!(burn.timer, 0.0);
}
