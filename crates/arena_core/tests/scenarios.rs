//! End-to-end turn scenarios.

use arena_core::prelude::*;
use arena_test_utils::fixtures::{melee, weapon, BfsOracle, SnapshotBuilder};

fn decide_fresh(snapshot: &WorldSnapshot) -> (Decision, StatusMemory) {
    let config = AgentConfig::default();
    decide(&config, snapshot, &BfsOracle, &StatusMemory::new(config.rng_seed)).unwrap()
}

#[test]
fn scenario_a_critical_health_retreats_to_healer() {
    let snapshot = SnapshotBuilder::new(20)
        .at(10, 10)
        .health(30)
        .safe_zone(10, 10, 8)
        .ally("SPIRIT", 15, 10, false)
        .chest("CHEST", 10, 12)
        .build();

    let (decision, _) = decide_fresh(&snapshot);

    assert_eq!(decision.handler, Some(Handler::SelfPreservation));
    match decision.action {
        Some(Action::Move { path }) => {
            assert_eq!(path.destination(snapshot.me.position), Position::new(14, 10));
        }
        other => panic!("expected a move toward the healer, got {other:?}"),
    }
}

#[test]
fn scenario_a_healer_outside_safe_zone_falls_back_to_obstacle() {
    let snapshot = SnapshotBuilder::new(20)
        .at(10, 10)
        .health(30)
        .safe_zone(10, 10, 3)
        .ally("SPIRIT", 18, 10, false)
        .chest("CHEST", 10, 12)
        .build();

    let (decision, _) = decide_fresh(&snapshot);

    assert_eq!(decision.handler, Some(Handler::SelfPreservation));
    assert_eq!(
        decision.action,
        Some(Action::Move {
            path: Path::parse("u").unwrap()
        })
    );
}

#[test]
fn scenario_b_aligned_target_in_range_fires() {
    let snapshot = SnapshotBuilder::new(20)
        .at(10, 10)
        .equip(weapon("CROSSBOW", WeaponClass::Gun, 20, 5, 3))
        .hostile("p2", 10, 13, 100)
        .build();

    let (decision, memory) = decide_fresh(&snapshot);

    assert_eq!(decision.handler, Some(Handler::Combat));
    assert_eq!(
        decision.action,
        Some(Action::Shoot {
            direction: Direction::Up
        })
    );
    assert_eq!(memory.last_target().unwrap().target_id, "p2");
    assert!(memory.is_engaged());
}

#[test]
fn scenario_c_unaligned_target_repositions() {
    let snapshot = SnapshotBuilder::new(20)
        .at(10, 10)
        .equip(weapon("CROSSBOW", WeaponClass::Gun, 20, 5, 3))
        .hostile("p2", 12, 12, 100)
        .build();

    let (decision, memory) = decide_fresh(&snapshot);

    assert_eq!(decision.handler, Some(Handler::Combat));
    assert_eq!(
        decision.action,
        Some(Action::Move {
            path: Path::parse("rr").unwrap()
        })
    );
    assert!(memory.last_target().is_none());
}

#[test]
fn scenario_d_lost_pickup_is_blacklisted_while_stationary() {
    let config = AgentConfig::default();
    let mut agent = Agent::new(config, BfsOracle);
    let here = SnapshotBuilder::new(20)
        .at(5, 5)
        .loot("AXE", ItemKind::Weapon(WeaponClass::Melee), 5, 5)
        .build();

    assert_eq!(agent.on_turn(&here.clone().into()), Some(Action::PickUp));

    // Someone else grabbed it: still on the ground from our view, never in our inventory.
    let second = agent.on_turn(&here.clone().into());
    assert_ne!(second, Some(Action::PickUp));
    assert!(agent.memory().pickup().is_idle());
    assert!(agent.memory().is_blacklisted("AXE"));

    let third = agent.on_turn(&here.into());
    assert_ne!(third, Some(Action::PickUp));
    assert!(agent.memory().is_blacklisted("AXE"));

    let moved = SnapshotBuilder::new(20)
        .at(5, 6)
        .loot("AXE", ItemKind::Weapon(WeaponClass::Melee), 5, 5)
        .build();
    let fourth = agent.on_turn(&moved.into());
    assert!(!agent.memory().is_blacklisted("AXE"));
    assert_eq!(
        fourth,
        Some(Action::Move {
            path: Path::parse("d").unwrap()
        })
    );
}

#[test]
fn scenario_d_held_consumable_underfoot_is_left_alone() {
    let config = AgentConfig::default();
    let mut agent = Agent::new(config, BfsOracle);
    let here = SnapshotBuilder::new(20)
        .at(5, 5)
        .holding("ELIXIR")
        .loot("ELIXIR", ItemKind::Consumable, 5, 5)
        .build();

    for _ in 0..4 {
        let action = agent.on_turn(&here.clone().into());
        assert_ne!(action, Some(Action::PickUp));
        assert!(agent.memory().pickup().is_idle());
    }
    assert_eq!(agent.failed_turns(), 0);
}

#[test]
fn scenario_e_strategy_hysteresis() {
    let config = AgentConfig::default();
    let base = || SnapshotBuilder::new(20).at(10, 10);
    let four = base()
        .equip(weapon("RUBBER_GUN", WeaponClass::Gun, 10, 5, 3))
        .equip(weapon("BANANA", WeaponClass::Throwable, 10, 4, 2))
        .equip(weapon("BELL", WeaponClass::Special, 10, 3, 2))
        .equip(melee("KNIFE", 10))
        .build();
    let three = base()
        .equip(weapon("RUBBER_GUN", WeaponClass::Gun, 10, 5, 3))
        .equip(weapon("BANANA", WeaponClass::Throwable, 10, 4, 2))
        .equip(melee("KNIFE", 10))
        .build();
    let two = base()
        .equip(weapon("RUBBER_GUN", WeaponClass::Gun, 10, 5, 3))
        .equip(melee("KNIFE", 10))
        .build();

    let memory = StatusMemory::new(config.rng_seed);
    let (d, memory) = decide(&config, &three, &BfsOracle, &memory).unwrap();
    assert_eq!(d.strategy, StrategyMode::Farming);
    let (d, memory) = decide(&config, &four, &BfsOracle, &memory).unwrap();
    assert_eq!(d.strategy, StrategyMode::Hunting);
    let (d, memory) = decide(&config, &three, &BfsOracle, &memory).unwrap();
    assert_eq!(d.strategy, StrategyMode::Hunting);
    let (d, memory) = decide(&config, &two, &BfsOracle, &memory).unwrap();
    assert_eq!(d.strategy, StrategyMode::Farming);
    let (d, _) = decide(&config, &three, &BfsOracle, &memory).unwrap();
    assert_eq!(d.strategy, StrategyMode::Farming);
}
