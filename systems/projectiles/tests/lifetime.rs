use bulwark_core::{
    AiBehavior, EntityCategory, EntityId, Event, Faction, Health, Position, Projectile,
    SimulationConfig, Turret, Velocity, WeaponKind,
};
use bulwark_system_combat::PROJECTILE_RADIUS;
use bulwark_system_projectiles::Projectiles;
use bulwark_world::{query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn shell(world: &mut World, faction: Faction, at: Position, lifetime: f32) -> EntityId {
    let mut events = Vec::new();
    let shell = world.spawn(faction, at, PROJECTILE_RADIUS, &mut events);
    let components = world.components_mut();
    components.velocity.set(shell, Velocity::default());
    components.projectile.set(
        shell,
        Projectile {
            damage: 10.0,
            speed: 0.0,
            remaining_lifetime: lifetime,
            homing_target: None,
            weapon: WeaponKind::Bolt,
            source: None,
            modifiers: None,
        },
    );
    shell
}

#[test]
fn expired_projectiles_return_to_the_pool_on_the_last_tick() {
    let mut world = World::new(&SimulationConfig::default());
    let projectile = shell(&mut world, Faction::Projectile, Position::new(50.0, 50.0), 2.0);
    let mut system = Projectiles::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for tick in 1..=4 {
        let mut events = Vec::new();
        world.rebuild_spatial_index();
        system.handle(&mut world, 0.5, &mut rng, &mut events);

        let released = events.contains(&Event::EntityReleased {
            entity: projectile,
            category: EntityCategory::Projectile,
        });
        if tick < 4 {
            assert!(world.is_in_use(projectile), "tick {tick}");
            assert!(!released, "tick {tick}");
        } else {
            assert!(!world.is_in_use(projectile));
            assert!(released);
        }
    }

    let stats = query::pool_stats(&world, EntityCategory::Projectile);
    assert_eq!(stats.in_use, 0);
}

#[test]
fn enemy_projectiles_only_strike_defenders() {
    let mut world = World::new(&SimulationConfig::default());
    let mut events = Vec::new();
    let raider = world.spawn(Faction::Raider, Position::new(300.0, 300.0), 12.0, &mut events);
    {
        let components = world.components_mut();
        components.health.set(raider, Health::new(80.0));
        components.ai.set(raider, AiBehavior::Flank);
    }
    let turret = world.place_turret(
        Position::new(312.0, 300.0),
        Turret::for_weapon(WeaponKind::Laser),
        1,
        &mut events,
    );
    let bolt = shell(
        &mut world,
        Faction::EnemyProjectile,
        Position::new(300.0, 300.0),
        3.0,
    );
    world.rebuild_spatial_index();

    let mut rng = ChaCha8Rng::seed_from_u64(8);
    events.clear();
    Projectiles::new().handle(&mut world, 0.1, &mut rng, &mut events);

    let hull = |entity| {
        world
            .components()
            .health
            .copied(entity)
            .map(|health| health.current)
    };
    assert_eq!(hull(raider), Some(80.0));
    assert_eq!(hull(turret), Some(140.0));
    assert!(!world.is_in_use(bolt));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ShotLanded { target, .. } if *target == turret
    )));
}

#[test]
fn projectiles_pass_through_each_other() {
    let mut world = World::new(&SimulationConfig::default());
    let ours = shell(&mut world, Faction::Projectile, Position::new(80.0, 80.0), 3.0);
    let theirs = shell(
        &mut world,
        Faction::EnemyProjectile,
        Position::new(82.0, 80.0),
        3.0,
    );
    world.rebuild_spatial_index();

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut events = Vec::new();
    Projectiles::new().handle(&mut world, 0.1, &mut rng, &mut events);

    assert!(world.is_in_use(ours));
    assert!(world.is_in_use(theirs));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ShotLanded { .. })));
}

#[test]
fn hits_on_the_flagship_report_objective_damage() {
    let config = SimulationConfig::default();
    let mut world = World::new(&config);
    let centre = query::objective_position(&world);
    let bolt = shell(&mut world, Faction::EnemyProjectile, centre, 3.0);
    world.rebuild_spatial_index();

    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut events = Vec::new();
    Projectiles::new().handle(&mut world, 0.1, &mut rng, &mut events);

    assert!(!world.is_in_use(bolt));
    assert!(events.contains(&Event::ObjectiveDamaged {
        amount: 10.0,
        remaining: config.flagship_health,
    }));
    let (health, shield) = query::objective_status(&world).expect("flagship alive");
    assert_eq!(health.current, config.flagship_health);
    let shield = shield.expect("flagship shield");
    assert_eq!(shield.current, config.flagship_shield - 10.0);
}
