use bulwark_core::{
    EntityId, Faction, Health, Position, SimulationConfig, Turret, WeaponKind,
};
use bulwark_system_targeting::Targeting;
use bulwark_world::{self as world, World};

fn enemy(world: &mut World, faction: Faction, position: Position) -> EntityId {
    let mut events = Vec::new();
    let entity = world.spawn(faction, position, 8.0, &mut events);
    world.components_mut().health.set(entity, Health::new(25.0));
    entity
}

fn assigned(world: &World, attacker: EntityId) -> Vec<EntityId> {
    world
        .components()
        .targets
        .get(attacker)
        .map(|slots| slots.targets().collect())
        .unwrap_or_default()
}

#[test]
fn closest_of_three_is_selected_for_a_single_slot() {
    let mut world = World::new(&SimulationConfig::default());
    let mut events = Vec::new();
    let origin = Position::new(200.0, 200.0);
    let mut turret = Turret::for_weapon(WeaponKind::Cannon);
    turret.range = 100.0;
    let attacker = world.place_turret(origin, turret, 1, &mut events);

    let far = enemy(&mut world, Faction::Swarm, Position::new(400.0, 200.0));
    let mid = enemy(&mut world, Faction::Raider, Position::new(200.0, 250.0));
    let near = enemy(&mut world, Faction::Behemoth, Position::new(190.0, 200.0));
    world.rebuild_spatial_index();

    let mut targeting = Targeting::new();
    targeting.handle(&mut world);
    assert_eq!(assigned(&world, attacker), vec![near]);

    world::apply(
        &mut world,
        bulwark_core::Command::UpgradeTargeting { turret: attacker },
        &mut events,
    );
    world::apply(
        &mut world,
        bulwark_core::Command::UpgradeTargeting { turret: attacker },
        &mut events,
    );
    targeting.handle(&mut world);
    let targets = assigned(&world, attacker);
    assert_eq!(targets, vec![near, mid]);
    assert!(!targets.contains(&far));
}

#[test]
fn assignments_never_exceed_upgrade_level() {
    let mut world = World::new(&SimulationConfig::default());
    let mut events = Vec::new();
    let mut attackers = Vec::new();
    for (index, level) in [1u8, 2, 3, 2, 1, 3].into_iter().enumerate() {
        let position = Position::new(150.0 + index as f32 * 170.0, 300.0);
        let turret = Turret::for_weapon(WeaponKind::Laser);
        attackers.push((world.place_turret(position, turret, level, &mut events), level));
    }

    let mut targeting = Targeting::new();
    for round in 0..10u32 {
        for step in 0..12u32 {
            let x = 40.0 + ((round * 131 + step * 89) % 1200) as f32;
            let y = 200.0 + ((round * 17 + step * 53) % 200) as f32;
            let _ = enemy(&mut world, Faction::Swarm, Position::new(x, y));
        }
        world.rebuild_spatial_index();
        targeting.handle(&mut world);

        for (attacker, level) in &attackers {
            let slots = world
                .components()
                .targets
                .copied(*attacker)
                .expect("turret keeps its slots");
            assert!(slots.occupied() <= usize::from(*level));
            let mut unique = assigned(&world, *attacker);
            let total = unique.len();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), total, "a target occupies two slots");
        }
    }
}

#[test]
fn enemy_shooters_target_defenders_only() {
    let mut world = World::new(&SimulationConfig::default());
    let mut events = Vec::new();
    let raider = enemy(&mut world, Faction::Raider, Position::new(100.0, 100.0));
    let components = world.components_mut();
    components
        .turret
        .set(raider, Turret::for_weapon(WeaponKind::Bolt));
    components
        .targets
        .set(raider, bulwark_core::TargetSlots::with_level(3));

    let _ally = enemy(&mut world, Faction::Swarm, Position::new(110.0, 100.0));
    let defender = world.place_turret(
        Position::new(150.0, 100.0),
        Turret::for_weapon(WeaponKind::Laser),
        1,
        &mut events,
    );
    world.rebuild_spatial_index();

    Targeting::new().handle(&mut world);
    assert_eq!(assigned(&world, raider), vec![defender]);
}
