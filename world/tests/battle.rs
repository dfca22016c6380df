use std::sync::Arc;

use gridfuse_core::{
    standard_stage, ActionError, BarrierEffect, Catalog, Command, EnemyKind, Event, GridPos,
    Outcome, PathDef, Phase, StageConfig, UnitId, WaveDef, WaveGroup, BENCH_SLOTS,
};
use gridfuse_world::{self as world, query, Battle, FUSE_ATK_SCALE, FUSE_HP_SCALE};

const TICK_LIMIT: usize = 60 * 60 * 5;

fn battle(stage: StageConfig) -> Battle {
    Battle::new(stage, Arc::new(Catalog::standard()), 0x5eed).expect("valid stage")
}

fn run(battle: &mut Battle, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(battle, command, &mut events);
    events
}

fn rejection(events: &[Event]) -> Option<ActionError> {
    events.iter().find_map(|event| match event {
        Event::CommandRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn purchased(events: &[Event]) -> Option<UnitId> {
    events.iter().find_map(|event| match event {
        Event::UnitPurchased { unit, .. } => Some(*unit),
        _ => None,
    })
}

/// Stage whose shop only ever offers the single cost-four template.
fn orison_stage(tri_fuse: bool) -> StageConfig {
    let mut stage = standard_stage("CH1-01").expect("first stage");
    stage.starting_level = 6;
    stage.starting_gold = 40;
    stage.shop_rules.allowed_costs = vec![4];
    stage.tri_fuse = tri_fuse;
    stage
}

/// First wave of the opening stage with enemies too frail to survive a hit.
fn frail_runner_stage() -> StageConfig {
    let mut stage = standard_stage("CH1-01").expect("first stage");
    stage.waves.truncate(1);
    stage.enemy_hp_multiplier = 0.01;
    stage.enemy_speed_multiplier = 0.1;
    stage
}

#[test]
fn frail_runners_are_all_killed_and_paid() {
    let stage = frail_runner_stage();
    let starting_gold = stage.starting_gold;
    let mut battle = battle(stage);

    let cells = [GridPos::new(1, 2), GridPos::new(3, 2), GridPos::new(1, 4)];
    let mut spent: u32 = 0;
    for (slot, cell) in cells.into_iter().enumerate() {
        let events = run(&mut battle, Command::BuyUnit { slot });
        let unit = purchased(&events).expect("cost-one offer is affordable");
        let Some(Event::UnitPurchased { cost, .. }) = events.first() else {
            panic!("purchase event missing");
        };
        spent += *cost;
        let events = run(&mut battle, Command::PlaceUnit { unit, cell });
        assert_eq!(events, vec![Event::UnitDeployed { unit, cell }]);
    }
    assert_eq!(spent, 3);

    let events = run(&mut battle, Command::StartWave);
    assert_eq!(events, vec![Event::WaveStarted { wave: 0 }]);
    assert_eq!(query::phase(&battle), Phase::Wave);

    let mut log = Vec::new();
    for _ in 0..TICK_LIMIT {
        world::apply(&mut battle, Command::Tick, &mut log);
        if query::outcome(&battle).is_some() {
            break;
        }
    }

    assert_eq!(query::outcome(&battle), Some(Outcome::Victory));
    assert_eq!(query::kill_count(&battle), 14);
    assert_eq!(query::integrity(&battle), query::max_integrity(&battle));
    assert_eq!(query::current_wave(&battle), 1);
    assert_eq!(
        query::gold(&battle),
        starting_gold - spent + 14 + world::WAVE_CLEAR_BONUS + 1
    );

    let spawned = log
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count();
    assert_eq!(spawned, 14);
    assert!(log.contains(&Event::WaveCleared {
        cleared: 1,
        bonus: 4
    }));
    assert_eq!(log.last(), Some(&Event::BattleEnded {
        outcome: Outcome::Victory
    }));
    assert!(query::enemies(&battle).is_empty());
    assert!(query::projectiles(&battle).is_empty());
}

/// One straight lane along row three carrying a single slow runner wave.
fn lone_lane_stage() -> StageConfig {
    let mut stage = standard_stage("CH1-01").expect("first stage");
    stage.blocks.clear();
    stage.paths = vec![PathDef {
        id: "P0".into(),
        waypoints: vec![GridPos::new(0, 3), GridPos::new(7, 3)],
    }];
    stage.waves = vec![WaveDef {
        id: "W1".into(),
        groups: vec![WaveGroup {
            enemy: EnemyKind::Runner,
            count: 14,
            interval: 3.0,
            path: "P0".into(),
        }],
    }];
    stage.enemy_speed_multiplier = 0.2;
    stage.shop_rules.reroll_enabled = true;
    stage.starting_gold = 100;
    stage
}

#[test]
fn single_melee_unit_clears_a_wave_with_repeated_hits() {
    let mut battle = battle(lone_lane_stage());
    let moth = query::catalog(&battle)
        .template_by_name("MOTH")
        .expect("moth template");

    let slot = (0..40)
        .find_map(|_| {
            let offered = query::shop_slots(&battle)
                .iter()
                .position(|offer| *offer == Some(moth));
            if offered.is_none() {
                let _ = run(&mut battle, Command::RerollShop);
            }
            offered
        })
        .expect("rerolls eventually offer a moth");
    let unit = purchased(&run(&mut battle, Command::BuyUnit { slot })).expect("moth bought");
    let cell = GridPos::new(4, 2);
    let _ = run(&mut battle, Command::PlaceUnit { unit, cell });

    let deployed = query::unit(&battle, unit).expect("deployed moth");
    assert_eq!(deployed.cell(), Some(cell));
    assert_eq!(deployed.atk(), 38.0);
    assert_eq!(deployed.attack_speed(), 1.0);

    let gold_before = query::gold(&battle);
    let _ = run(&mut battle, Command::StartWave);

    let mut log = Vec::new();
    let mut max_hp = None;
    for _ in 0..TICK_LIMIT {
        world::apply(&mut battle, Command::Tick, &mut log);
        if max_hp.is_none() {
            max_hp = query::enemies(&battle).first().map(|enemy| enemy.max_hp());
        }
        if query::outcome(&battle).is_some() {
            break;
        }
    }

    // 76 HP against 38 ATK needs two hits per runner.
    let max_hp = max_hp.expect("a runner spawned");
    assert!((max_hp - 76.0).abs() < 1e-9);
    assert!(max_hp > 38.0);

    assert_eq!(query::outcome(&battle), Some(Outcome::Victory));
    assert_eq!(query::kill_count(&battle), 14);
    assert_eq!(query::integrity(&battle), query::max_integrity(&battle));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::EnemyLeaked { .. })));
    assert!(log.contains(&Event::WaveCleared {
        cleared: 1,
        bonus: 4
    }));
    assert_eq!(query::gold(&battle), gold_before + 14 + 3 + 1);
}

#[test]
fn undefended_base_falls_and_rejects_further_commands() {
    let mut battle = battle(standard_stage("CH1-01").expect("first stage"));

    let mut leaked = 0;
    let mut ended = false;
    for _ in 0..TICK_LIMIT {
        if query::phase(&battle) != Phase::Wave {
            let _ = run(&mut battle, Command::StartWave);
        }
        let events = run(&mut battle, Command::Tick);
        leaked += events
            .iter()
            .filter(|event| matches!(event, Event::EnemyLeaked { .. }))
            .count();
        if events.contains(&Event::BattleEnded {
            outcome: Outcome::Defeat,
        }) {
            ended = true;
            break;
        }
    }

    assert!(ended, "integrity never ran out");
    // Fourteen runners in the first wave, then the first runner of the second.
    assert_eq!(leaked, 15);
    assert_eq!(query::integrity(&battle), 0);
    assert_eq!(query::outcome(&battle), Some(Outcome::Defeat));

    let tick = query::tick(&battle);
    assert!(run(&mut battle, Command::Tick).is_empty());
    assert_eq!(query::tick(&battle), tick);
    assert_eq!(
        rejection(&run(&mut battle, Command::RerollShop)),
        Some(ActionError::BattleOver)
    );
}

#[test]
fn purchases_never_overspend() {
    let mut stage = orison_stage(false);
    stage.starting_gold = 9;
    let mut battle = battle(stage);

    for slot in 0..2 {
        let before = query::gold(&battle);
        let events = run(&mut battle, Command::BuyUnit { slot });
        assert!(purchased(&events).is_some());
        assert_eq!(query::gold(&battle), before - 4);
        assert!(query::shop_slots(&battle)[slot].is_none());
    }

    let events = run(&mut battle, Command::BuyUnit { slot: 2 });
    assert_eq!(rejection(&events), Some(ActionError::InsufficientGold));
    assert_eq!(query::gold(&battle), 1);
    assert!(query::shop_slots(&battle)[2].is_some());

    let events = run(&mut battle, Command::BuyUnit { slot: 0 });
    assert_eq!(rejection(&events), Some(ActionError::EmptySlot));
    let events = run(&mut battle, Command::BuyUnit { slot: 9 });
    assert_eq!(rejection(&events), Some(ActionError::InvalidSlot));
}

#[test]
fn third_copy_fuses_into_a_two_star_unit() {
    let mut battle = battle(orison_stage(true));
    let catalog = Catalog::standard();
    let orison = catalog
        .unit(catalog.template_by_name("ORISON").expect("orison"))
        .copied()
        .expect("def");

    let first = purchased(&run(&mut battle, Command::BuyUnit { slot: 0 })).expect("first");
    let _ = purchased(&run(&mut battle, Command::BuyUnit { slot: 1 })).expect("second");
    assert_eq!(query::units(&battle).len(), 2, "two copies never fuse");

    let events = run(&mut battle, Command::BuyUnit { slot: 2 });
    let fused = events.iter().find_map(|event| match event {
        Event::UnitsFused {
            survivor,
            consumed,
            star,
        } => Some((*survivor, *consumed, *star)),
        _ => None,
    });
    let (survivor, consumed, star) = fused.expect("fusion event");
    assert_eq!(survivor, first);
    assert_eq!(consumed, [UnitId::new(1), UnitId::new(2)]);
    assert_eq!(star, 2);

    let units = query::units(&battle);
    assert_eq!(units.len(), 1);
    let unit = &units[0];
    assert_eq!(unit.star(), 2);
    assert!((unit.max_hp() - orison.hp * FUSE_HP_SCALE).abs() < 1e-9);
    assert_eq!(unit.hp(), unit.max_hp());
    assert!((unit.atk() - orison.atk * FUSE_ATK_SCALE).abs() < 1e-9);
}

#[test]
fn fusion_is_disabled_without_the_stage_flag() {
    let mut battle = battle(orison_stage(false));
    for slot in 0..3 {
        let _ = run(&mut battle, Command::BuyUnit { slot });
    }
    assert_eq!(query::units(&battle).len(), 3);
    assert!(query::units(&battle).iter().all(|unit| unit.star() == 1));
}

#[test]
fn selling_refunds_and_frees_the_bench_slot() {
    let mut battle = battle(orison_stage(false));
    let unit = purchased(&run(&mut battle, Command::BuyUnit { slot: 0 })).expect("unit");
    let gold = query::gold(&battle);

    let events = run(&mut battle, Command::SellUnit { unit });
    assert_eq!(events, vec![Event::UnitSold { unit, refund: 2 }]);
    assert_eq!(query::gold(&battle), gold + 2);
    assert!(query::unit(&battle, unit).is_none());

    let events = run(&mut battle, Command::SellUnit { unit });
    assert_eq!(rejection(&events), Some(ActionError::MissingUnit));

    let events = run(&mut battle, Command::BuyUnit { slot: 1 });
    assert!(matches!(
        events.first(),
        Some(Event::UnitPurchased { bench_slot: 0, .. })
    ));
}

#[test]
fn placement_rules_are_enforced_in_order() {
    let mut battle = battle(orison_stage(false));
    let units: Vec<UnitId> = (0..4)
        .map(|slot| purchased(&run(&mut battle, Command::BuyUnit { slot })).expect("unit"))
        .collect();

    let ghost = UnitId::new(99);
    let events = run(
        &mut battle,
        Command::PlaceUnit {
            unit: ghost,
            cell: GridPos::new(0, 0),
        },
    );
    assert_eq!(rejection(&events), Some(ActionError::MissingUnit));

    for (cell, reason) in [
        (GridPos::new(0, 3), ActionError::Unplaceable),
        (GridPos::new(4, 3), ActionError::Unplaceable),
        (GridPos::new(8, 0), ActionError::Unplaceable),
    ] {
        let events = run(&mut battle, Command::PlaceUnit { unit: units[0], cell });
        assert_eq!(rejection(&events), Some(reason));
    }

    let cells = [GridPos::new(0, 0), GridPos::new(1, 0), GridPos::new(2, 0)];
    for (unit, cell) in units.iter().zip(cells) {
        let events = run(&mut battle, Command::PlaceUnit { unit: *unit, cell });
        assert_eq!(events, vec![Event::UnitDeployed { unit: *unit, cell }]);
    }
    assert_eq!(query::deployed_count(&battle), 3);

    let events = run(
        &mut battle,
        Command::PlaceUnit {
            unit: units[3],
            cell: GridPos::new(0, 0),
        },
    );
    assert_eq!(rejection(&events), Some(ActionError::Occupied));

    let events = run(
        &mut battle,
        Command::PlaceUnit {
            unit: units[3],
            cell: GridPos::new(3, 0),
        },
    );
    assert_eq!(rejection(&events), Some(ActionError::DeployCapReached));

    // Moving an already deployed unit does not count against the cap.
    let events = run(
        &mut battle,
        Command::PlaceUnit {
            unit: units[0],
            cell: GridPos::new(3, 0),
        },
    );
    assert_eq!(
        events,
        vec![Event::UnitDeployed {
            unit: units[0],
            cell: GridPos::new(3, 0)
        }]
    );
}

#[test]
fn bench_moves_need_a_free_slot() {
    let mut battle = battle(orison_stage(false));
    let first = purchased(&run(&mut battle, Command::BuyUnit { slot: 0 })).expect("unit");
    let second = purchased(&run(&mut battle, Command::BuyUnit { slot: 1 })).expect("unit");
    let cell = GridPos::new(0, 0);
    let _ = run(&mut battle, Command::PlaceUnit { unit: first, cell });

    let events = run(&mut battle, Command::MoveToBench { unit: first, slot: 1 });
    assert_eq!(rejection(&events), Some(ActionError::BenchSlotUnavailable));
    let events = run(
        &mut battle,
        Command::MoveToBench {
            unit: first,
            slot: BENCH_SLOTS,
        },
    );
    assert_eq!(rejection(&events), Some(ActionError::BenchSlotUnavailable));

    let events = run(&mut battle, Command::MoveToBench { unit: first, slot: 5 });
    assert_eq!(events, vec![Event::UnitBenched { unit: first, slot: 5 }]);
    let unit = query::unit(&battle, first).expect("still owned");
    assert!(!unit.is_deployed());
    assert!(query::unit(&battle, second).is_some());
}

#[test]
fn full_bench_rejects_before_spending() {
    let mut stage = standard_stage("CH1-01").expect("first stage");
    stage.starting_gold = 100;
    stage.shop_rules.reroll_enabled = true;
    let mut battle = battle(stage);

    let mut bought = 0;
    while bought < BENCH_SLOTS {
        for slot in 0..5 {
            if bought < BENCH_SLOTS
                && purchased(&run(&mut battle, Command::BuyUnit { slot })).is_some()
            {
                bought += 1;
            }
        }
        let _ = run(&mut battle, Command::RerollShop);
    }

    let gold = query::gold(&battle);
    let events = run(&mut battle, Command::BuyUnit { slot: 0 });
    assert_eq!(rejection(&events), Some(ActionError::BenchFull));
    assert_eq!(query::gold(&battle), gold);
}

#[test]
fn shop_features_follow_stage_rules() {
    let mut battle = battle(standard_stage("CH1-01").expect("first stage"));
    assert_eq!(
        rejection(&run(&mut battle, Command::RerollShop)),
        Some(ActionError::RerollDisabled)
    );
    assert_eq!(
        rejection(&run(&mut battle, Command::LevelUpShop)),
        Some(ActionError::LevelUpDisabled)
    );

    let mut battle = self::battle(standard_stage("CH1-03").expect("leveling stage"));
    let gold = query::gold(&battle);
    let events = run(&mut battle, Command::LevelUpShop);
    assert_eq!(
        events,
        vec![Event::ShopLeveledUp {
            level: 2,
            deploy_cap: 4,
            cost: 6
        }]
    );
    assert_eq!(query::gold(&battle), gold - 6);

    let events = run(&mut battle, Command::RerollShop);
    assert_eq!(
        events,
        vec![Event::ShopRerolled { cost: 2 }, Event::ShopRefreshed]
    );
}

#[test]
fn waves_cannot_overlap() {
    let mut battle = battle(standard_stage("CH1-01").expect("first stage"));
    let _ = run(&mut battle, Command::StartWave);
    assert_eq!(
        rejection(&run(&mut battle, Command::StartWave)),
        Some(ActionError::WaveInProgress)
    );

    for _ in 0..30 {
        let _ = run(&mut battle, Command::Tick);
    }
    let events = run(&mut battle, Command::StartWave);
    assert_eq!(rejection(&events), Some(ActionError::WaveInProgress));
    assert_eq!(query::phase(&battle), Phase::Wave);
    assert_eq!(query::current_wave(&battle), 0);
}

#[test]
fn occupied_nodes_fire_the_barrier() {
    let mut stage = orison_stage(false);
    stage.nodes_enabled = true;
    stage.nodes = vec![GridPos::new(0, 0), GridPos::new(1, 0), GridPos::new(2, 0)];
    stage.barrier_effect = Some(BarrierEffect::Slow);
    let mut battle = battle(stage);

    let nodes = [GridPos::new(0, 0), GridPos::new(1, 0), GridPos::new(2, 0)];
    for (slot, cell) in nodes.into_iter().enumerate() {
        let unit = purchased(&run(&mut battle, Command::BuyUnit { slot })).expect("unit");
        let _ = run(&mut battle, Command::PlaceUnit { unit, cell });
        let events = run(&mut battle, Command::Tick);
        let fired = events
            .iter()
            .any(|event| matches!(event, Event::BarrierActivated { .. }));
        assert_eq!(fired, slot == 2, "barrier needs three occupied nodes");
    }

    let snapshot = query::snapshot(&battle);
    assert_eq!(snapshot.barrier.occupied_nodes, 3);
    assert!(snapshot.barrier.cooldown > 19.9);

    let mut activations = 0;
    for _ in 0..(20 * 60 + 10) {
        let events = run(&mut battle, Command::Tick);
        activations += events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::BarrierActivated {
                        effect: Some(BarrierEffect::Slow),
                        affected: 0
                    }
                )
            })
            .count();
    }
    assert_eq!(activations, 1, "cooldown gates the next activation");
}

#[test]
fn snapshot_mirrors_queries() {
    let mut battle = battle(standard_stage("CH1-06").expect("seal stage"));
    let _ = run(&mut battle, Command::StartWave);
    for _ in 0..120 {
        let _ = run(&mut battle, Command::Tick);
    }

    let snapshot = query::snapshot(&battle);
    assert_eq!(snapshot.tick, 120);
    assert_eq!(snapshot.phase, Phase::Wave);
    assert_eq!(snapshot.shop.gold, query::gold(&battle));
    assert_eq!(snapshot.enemies.len(), query::enemies(&battle).len());
    assert!(!snapshot.enemies.is_empty());
    assert_eq!(snapshot.total_waves, 6);
    assert!((snapshot.wave_time - 2.0).abs() < 1e-6);
    assert_eq!(snapshot.board.tiles.len(), 64);
}
