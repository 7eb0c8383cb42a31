use bulwark_core::{
    AiBehavior, Delivery, EntityId, Event, Faction, Health, Position, Shield, SimulationConfig,
    Turret, WeaponKind, WeaponModifiers,
};
use bulwark_system_combat::{apply_damage, Combat, PROJECTILE_RADIUS};
use bulwark_world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn defended(world: &mut World, health: Health, shield: Shield) -> EntityId {
    let mut events = Vec::new();
    let entity = world.spawn(Faction::Swarm, Position::new(200.0, 200.0), 8.0, &mut events);
    let components = world.components_mut();
    components.health.set(entity, health);
    components.shield.set(entity, shield);
    components.ai.set(entity, AiBehavior::Rush);
    entity
}

fn turret_with_target(world: &mut World, weapon: WeaponKind, victim: EntityId) -> EntityId {
    let mut events = Vec::new();
    let turret = world.place_turret(
        Position::new(150.0, 200.0),
        Turret::for_weapon(weapon),
        1,
        &mut events,
    );
    if let Some(slots) = world.components_mut().targets.get_mut(turret) {
        assert!(slots.assign(victim));
    }
    turret
}

#[test]
fn shield_absorbs_before_hull() {
    let mut world = World::new(&SimulationConfig::default());
    let entity = defended(&mut world, Health::new(50.0), Shield::new(30.0));
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = Vec::new();

    let dealt = apply_damage(&mut world, entity, 50.0, None, &mut rng, &mut events);

    assert_eq!(dealt, 50.0);
    let shield = world.components().shield.copied(entity).expect("shield");
    let health = world.components().health.copied(entity).expect("health");
    assert_eq!((shield.current, shield.max), (0.0, 30.0));
    assert_eq!((health.current, health.max), (30.0, 50.0));
    assert_eq!(
        events,
        vec![Event::DamageDealt {
            target: entity,
            shield: 30.0,
            hull: 20.0,
        }]
    );
}

#[test]
fn depleted_shield_passes_damage_to_hull() {
    let mut world = World::new(&SimulationConfig::default());
    let entity = defended(
        &mut world,
        Health {
            current: 40.0,
            max: 50.0,
        },
        Shield {
            current: 0.0,
            max: 30.0,
        },
    );
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut events = Vec::new();

    let dealt = apply_damage(&mut world, entity, 15.0, None, &mut rng, &mut events);

    assert_eq!(dealt, 15.0);
    let health = world.components().health.copied(entity).expect("health");
    assert_eq!((health.current, health.max), (25.0, 50.0));
}

#[test]
fn pools_stay_within_bounds_under_random_damage() {
    let mut world = World::new(&SimulationConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut events = Vec::new();
    let entities: Vec<_> = (0..16)
        .map(|_| {
            let max_health = rng.gen_range(1.0..200.0);
            let max_shield = rng.gen_range(0.0..100.0);
            defended(&mut world, Health::new(max_health), Shield::new(max_shield))
        })
        .collect();

    for _ in 0..500 {
        let target = entities[rng.gen_range(0..entities.len())];
        let modifiers = WeaponModifiers {
            shield_multiplier: rng.gen_range(0.0..3.0),
            hull_multiplier: rng.gen_range(0.0..3.0),
            ..WeaponModifiers::default()
        };
        let raw = rng.gen_range(-10.0..80.0);
        let with_modifiers = rng.gen_bool(0.5);
        let dealt = apply_damage(
            &mut world,
            target,
            raw,
            with_modifiers.then_some(&modifiers),
            &mut rng,
            &mut events,
        );
        assert!(dealt >= 0.0);

        let health = world.components().health.copied(target).expect("health");
        let shield = world.components().shield.copied(target).expect("shield");
        assert!((0.0..=health.max).contains(&health.current));
        assert!((0.0..=shield.max).contains(&shield.current));
    }
}

#[test]
fn beam_resolves_in_the_tick_it_fires() {
    let mut world = World::new(&SimulationConfig::default());
    let victim = defended(&mut world, Health::new(100.0), Shield::new(0.0));
    let turret = turret_with_target(&mut world, WeaponKind::Railgun, victim);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut events = Vec::new();
    let mut beams = Vec::new();

    Combat::new().handle(&mut world, &mut rng, &mut events, &mut beams);

    let damage = WeaponKind::Railgun.profile().damage;
    let health = world.components().health.copied(victim).expect("health");
    assert_eq!(health.current, 100.0 - damage);
    assert_eq!(beams.len(), 1);
    assert_eq!(beams[0].start, Position::new(150.0, 200.0));
    assert_eq!(beams[0].end, Position::new(200.0, 200.0));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ShotLanded { attacker: Some(attacker), target, .. }
            if *attacker == turret && *target == victim
    )));
    let last = world
        .components()
        .turret
        .copied(turret)
        .and_then(|turret| turret.last_fired_at);
    assert_eq!(last, Some(0.0));
}

#[test]
fn ballistic_weapons_launch_pooled_projectiles() {
    let mut world = World::new(&SimulationConfig::default());
    let victim = defended(&mut world, Health::new(100.0), Shield::new(0.0));
    let turret = turret_with_target(&mut world, WeaponKind::Missile, victim);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut events = Vec::new();
    let mut beams = Vec::new();

    Combat::new().handle(&mut world, &mut rng, &mut events, &mut beams);

    assert!(beams.is_empty());
    let (shell, projectile) = world
        .components()
        .projectile
        .iter()
        .map(|(entity, projectile)| (entity, *projectile))
        .next()
        .expect("projectile launched");
    let Delivery::Ballistic { speed, lifetime, .. } = WeaponKind::Missile.delivery() else {
        panic!("missiles are ballistic");
    };
    assert_eq!(projectile.homing_target, Some(victim));
    assert_eq!(projectile.source, Some(turret));
    assert_eq!(projectile.remaining_lifetime, lifetime);
    let components = world.components();
    assert_eq!(components.faction.copied(shell), Some(Faction::Projectile));
    assert_eq!(
        components.collider.copied(shell).map(|collider| collider.radius),
        Some(PROJECTILE_RADIUS)
    );
    let velocity = components.velocity.copied(shell).expect("velocity");
    assert!((velocity.x - speed).abs() < 1e-3);
    assert!(velocity.y.abs() < 1e-3);
    assert_eq!(
        components.health.copied(victim).map(|health| health.current),
        Some(100.0)
    );
}

#[test]
fn cooldown_limits_fire_rate() {
    let mut world = World::new(&SimulationConfig::default());
    let victim = defended(&mut world, Health::new(10_000.0), Shield::new(0.0));
    let _turret = turret_with_target(&mut world, WeaponKind::Laser, victim);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut combat = Combat::new();
    let mut events = Vec::new();
    let mut beams = Vec::new();

    // Two simulated seconds at 125 ms per tick.
    for _ in 0..16 {
        combat.handle(&mut world, &mut rng, &mut events, &mut beams);
        world.advance_clock(0.125, &mut events);
    }

    let shots = events
        .iter()
        .filter(|event| matches!(event, Event::ShotFired { .. }))
        .count();
    let fire_rate = WeaponKind::Laser.profile().fire_rate;
    assert_eq!(shots, (2.0 * fire_rate) as usize);
}

#[test]
fn certain_crits_multiply_shot_damage() {
    let mut world = World::new(&SimulationConfig::default());
    let victim = defended(&mut world, Health::new(1_000.0), Shield::new(0.0));
    let turret = turret_with_target(&mut world, WeaponKind::Laser, victim);
    world.components_mut().modifiers.set(
        turret,
        WeaponModifiers {
            crit_chance: 1.0,
            crit_multiplier: 3.0,
            ..WeaponModifiers::default()
        },
    );
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut events = Vec::new();
    let mut beams = Vec::new();

    Combat::new().handle(&mut world, &mut rng, &mut events, &mut beams);

    let damage = WeaponKind::Laser.profile().damage * 3.0;
    assert!(events.contains(&Event::DamageDealt {
        target: victim,
        shield: 0.0,
        hull: damage,
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ShotFired { critical: true, .. })));
}
