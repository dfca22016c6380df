#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for Gridfuse.
//!
//! A [`Battle`] owns the board, the live enemies, units and projectiles, the
//! shop and the wave scheduler. Everything that changes it goes through
//! [`apply`], and everything that reads it goes through [`query`].

use std::sync::Arc;

use gridfuse_core::{
    ActionError, AttackKind, Catalog, Command, EnemyId, EnemyKind, EnemyStatus, Event, GridPos,
    Outcome, Phase, StageConfig, SynergyCounts, UnitId, BENCH_SLOTS, KILL_BOUNTY, MAX_SHOP_LEVEL,
    TICK_SECONDS,
};
use gridfuse_system_shop::Shop;
use gridfuse_system_spawning::{SpawnRequest, UnknownPath, WaveManager};
use gridfuse_system_targeting::TargetSelector;
use thiserror::Error;
use tracing::{debug, info};

mod barrier;
mod board;
mod enemy;
mod fusion;
mod projectile;
mod synergy;
mod unit;

pub use barrier::{BARRIER_ACTIVE, BARRIER_COOLDOWN, MARK_FRACTION, NODES_REQUIRED, SLOW_SECONDS};
pub use board::Board;
pub use enemy::{Enemy, SLOW_FACTOR};
pub use projectile::{Projectile, HIT_RADIUS, PROJECTILE_SPEED};
pub use unit::{Unit, FUSE_ATK_SCALE, FUSE_HP_SCALE};

use barrier::Barrier;

/// Base gold awarded when a wave clears, before the per-wave increment.
pub const WAVE_CLEAR_BONUS: u32 = 3;

/// Reasons a stage cannot be turned into a battle.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StageError {
    /// The stage declares no enemy lanes.
    #[error("stage declares no paths")]
    NoPaths,
    /// A lane has no waypoints.
    #[error("path `{path}` has no waypoints")]
    EmptyPath {
        /// Offending path identifier.
        path: String,
    },
    /// Two lanes share an identifier.
    #[error("path `{path}` is declared twice")]
    DuplicatePath {
        /// Offending path identifier.
        path: String,
    },
    /// A waypoint or marked tile lies outside the board.
    #[error("cell ({column}, {row}) lies outside the board")]
    OutOfBounds {
        /// Column of the offending cell.
        column: u32,
        /// Row of the offending cell.
        row: u32,
    },
    /// The stage declares no waves.
    #[error("stage declares no waves")]
    NoWaves,
    /// The base starts without integrity.
    #[error("stage integrity must be positive")]
    NoIntegrity,
    /// The starting shop level lies outside the level range.
    #[error("starting level {level} is outside the shop level range")]
    InvalidStartingLevel {
        /// Level that failed validation.
        level: u32,
    },
    /// A spawn interval is negative or not finite.
    #[error("wave `{wave}` uses invalid spawn interval {interval}")]
    InvalidInterval {
        /// Offending wave identifier.
        wave: String,
        /// Interval that failed validation.
        interval: f64,
    },
    /// An enemy stat multiplier is not a positive finite number.
    #[error("enemy multipliers must be positive")]
    InvalidMultiplier,
    /// The catalog has no definition for an enemy the stage spawns.
    #[error("catalog has no definition for {kind:?}")]
    MissingEnemy {
        /// Archetype without a definition.
        kind: EnemyKind,
    },
    /// A wave group names a path the stage does not declare.
    #[error(transparent)]
    UnknownPath(#[from] UnknownPath),
}

/// Represents the authoritative Gridfuse battle state.
#[derive(Debug)]
pub struct Battle {
    stage: StageConfig,
    catalog: Arc<Catalog>,
    board: Board,
    waves: WaveManager,
    shop: Shop,
    enemies: Vec<Enemy>,
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    selector: TargetSelector,
    spawn_buffer: Vec<SpawnRequest>,
    barrier: Barrier,
    synergies: SynergyCounts,
    integrity: u32,
    max_integrity: u32,
    phase: Phase,
    outcome: Option<Outcome>,
    tick_index: u64,
    wave_time: f64,
    kill_count: u32,
    next_unit: u32,
}

impl Battle {
    /// Validates the stage and builds a battle ready for its first wave.
    ///
    /// The seed drives every shop roll, so equal seeds and equal command
    /// sequences replay identically.
    pub fn new(stage: StageConfig, catalog: Arc<Catalog>, seed: u64) -> Result<Self, StageError> {
        let board = Board::from_stage(&stage)?;
        validate_stage(&stage, &catalog)?;
        let waves = WaveManager::new(&stage)?;
        let shop = Shop::new(&stage, Arc::clone(&catalog), seed);

        info!(
            stage = %stage.id,
            seed,
            waves = waves.total_waves(),
            integrity = stage.integrity,
            "battle created"
        );

        Ok(Self {
            board,
            waves,
            shop,
            catalog,
            enemies: Vec::new(),
            units: Vec::new(),
            projectiles: Vec::new(),
            selector: TargetSelector::new(),
            spawn_buffer: Vec::new(),
            barrier: Barrier::default(),
            synergies: SynergyCounts::default(),
            integrity: stage.integrity,
            max_integrity: stage.integrity,
            phase: Phase::Prepare,
            outcome: None,
            tick_index: 0,
            wave_time: 0.0,
            kill_count: 0,
            next_unit: 0,
            stage,
        })
    }

    fn unit_index(&self, unit: UnitId) -> Result<usize, ActionError> {
        self.units
            .binary_search_by_key(&unit, Unit::id)
            .map_err(|_| ActionError::MissingUnit)
    }

    fn deployed_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_deployed()).count()
    }

    fn free_bench_slot(&self) -> Option<usize> {
        (0..BENCH_SLOTS).find(|&slot| self.bench_slot_free(slot))
    }

    fn bench_slot_free(&self, slot: usize) -> bool {
        !self
            .units
            .iter()
            .any(|unit| unit.placement().bench_slot() == Some(slot))
    }

    fn occupied_nodes(&self) -> usize {
        self.board
            .nodes()
            .iter()
            .filter(|&&node| self.units.iter().any(|unit| unit.cell() == Some(node)))
            .count()
    }

    fn refresh_synergies(&mut self) {
        self.synergies = synergy::refresh(&mut self.units);
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        self.outcome = Some(outcome);
        info!(
            ?outcome,
            tick = self.tick_index,
            integrity = self.integrity,
            kills = self.kill_count,
            "battle ended"
        );
        out_events.push(Event::BattleEnded { outcome });
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        let wave = self.waves.start_wave()?;
        self.phase = Phase::Wave;
        out_events.push(Event::WaveStarted { wave });
        Ok(())
    }

    fn buy_unit(&mut self, slot: usize, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        let bench_slot = self.free_bench_slot().ok_or(ActionError::BenchFull)?;
        let offer = self.shop.can_buy(slot)?;
        let def = self
            .catalog
            .unit(offer.template)
            .ok_or(ActionError::EmptySlot)?;
        let purchase = self.shop.buy(slot)?;

        let id = UnitId::new(self.next_unit);
        self.next_unit += 1;
        self.units.push(Unit::new(id, purchase.template, def, bench_slot));
        debug!(
            unit = id.get(),
            template = def.name,
            cost = purchase.cost,
            bench_slot,
            "unit purchased"
        );
        out_events.push(Event::UnitPurchased {
            unit: id,
            template: purchase.template,
            bench_slot,
            cost: purchase.cost,
        });

        if self.stage.tri_fuse {
            if let Some(fusion) = fusion::tri_fuse(&mut self.units, purchase.template) {
                debug!(
                    survivor = fusion.survivor.get(),
                    star = fusion.star,
                    "units fused"
                );
                out_events.push(Event::UnitsFused {
                    survivor: fusion.survivor,
                    consumed: fusion.consumed,
                    star: fusion.star,
                });
            }
        }
        self.refresh_synergies();
        Ok(())
    }

    fn sell_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        let index = self.unit_index(unit)?;
        let sold = self.units.remove(index);
        let refund = self.shop.sell(sold.cost(), sold.star());
        self.refresh_synergies();
        debug!(unit = unit.get(), refund, "unit sold");
        out_events.push(Event::UnitSold { unit, refund });
        Ok(())
    }

    fn reroll_shop(&mut self, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        let cost = self.shop.reroll()?;
        out_events.push(Event::ShopRerolled { cost });
        out_events.push(Event::ShopRefreshed);
        Ok(())
    }

    fn level_up_shop(&mut self, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        let cost = self.shop.level_up()?;
        out_events.push(Event::ShopLeveledUp {
            level: self.shop.level(),
            deploy_cap: self.shop.deploy_cap(),
            cost,
        });
        Ok(())
    }

    fn place_unit(
        &mut self,
        unit: UnitId,
        cell: GridPos,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let index = self.unit_index(unit)?;
        if !self.board.can_place(cell) {
            return Err(ActionError::Unplaceable);
        }
        if self.units.iter().any(|other| other.cell() == Some(cell)) {
            return Err(ActionError::Occupied);
        }
        let cap = usize::try_from(self.shop.deploy_cap()).unwrap_or(usize::MAX);
        if !self.units[index].is_deployed() && self.deployed_count() >= cap {
            return Err(ActionError::DeployCapReached);
        }

        self.units[index].deploy(cell);
        self.refresh_synergies();
        out_events.push(Event::UnitDeployed { unit, cell });
        Ok(())
    }

    fn move_to_bench(
        &mut self,
        unit: UnitId,
        slot: usize,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let index = self.unit_index(unit)?;
        if slot >= BENCH_SLOTS || !self.bench_slot_free(slot) {
            return Err(ActionError::BenchSlotUnavailable);
        }

        self.units[index].bench(slot);
        self.refresh_synergies();
        out_events.push(Event::UnitBenched { unit, slot });
        Ok(())
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });
        if self.phase == Phase::WaveEnd {
            self.phase = Phase::Prepare;
        }

        self.spawn_enemies(out_events);
        self.advance_enemies(out_events);
        if self.integrity == 0 {
            self.finish(Outcome::Defeat, out_events);
            return;
        }
        self.resolve_units();
        self.resolve_projectiles();
        self.collect_bounties(out_events);
        self.enemies.retain(|enemy| !enemy.is_settled());
        self.update_barrier(out_events);
        self.check_wave_end(out_events);

        if self.waves.all_done()
            && self
                .enemies
                .iter()
                .all(|enemy| enemy.status().is_resolved())
        {
            self.finish(Outcome::Victory, out_events);
        }
    }

    fn spawn_enemies(&mut self, out_events: &mut Vec<Event>) {
        if !self.waves.wave_active() {
            return;
        }
        self.wave_time += TICK_SECONDS;

        let enemies = &self.enemies;
        self.waves
            .update(|id| enemy_status(enemies, id), &mut self.spawn_buffer);

        let requests = std::mem::take(&mut self.spawn_buffer);
        for request in &requests {
            let Some(def) = self.catalog.enemy(request.kind) else {
                continue;
            };
            let Some(&start) = self
                .board
                .waypoints(request.path)
                .and_then(|waypoints| waypoints.first())
            else {
                continue;
            };
            self.enemies.push(Enemy::spawn(request, def, start));
            debug!(enemy = request.enemy.get(), kind = ?request.kind, "enemy spawned");
            out_events.push(Event::EnemySpawned {
                enemy: request.enemy,
                kind: request.kind,
            });
        }
        self.spawn_buffer = requests;
        self.spawn_buffer.clear();
    }

    fn advance_enemies(&mut self, out_events: &mut Vec<Event>) {
        for enemy in &mut self.enemies {
            let waypoints = self.board.waypoints(enemy.path()).unwrap_or(&[]);
            enemy.advance(waypoints);
            if let Some(damage) = enemy.take_leak() {
                self.integrity = self.integrity.saturating_sub(damage);
                debug!(
                    enemy = enemy.id().get(),
                    damage,
                    integrity = self.integrity,
                    "enemy leaked"
                );
                out_events.push(Event::EnemyLeaked {
                    enemy: enemy.id(),
                    damage,
                    integrity: self.integrity,
                });
            }
        }
    }

    fn resolve_units(&mut self) {
        let board = &self.board;
        let lane_length = |path: usize| board.waypoints(path).map_or(0, <[_]>::len);
        self.selector.prepare(
            self.enemies
                .iter()
                .map(|enemy| enemy.probe(lane_length(enemy.path()))),
        );

        for unit in &mut self.units {
            let Some(probe) = unit.probe() else {
                continue;
            };
            if !unit.cool_down() {
                continue;
            }
            let Some(target) = self.selector.select(&probe) else {
                continue;
            };
            let Ok(index) = self.enemies.binary_search_by_key(&target, Enemy::id) else {
                continue;
            };
            unit.start_cooldown();

            match unit.attack() {
                AttackKind::Melee => {
                    let enemy = &mut self.enemies[index];
                    enemy.take_damage(unit.atk(), unit.damage());
                    self.selector
                        .observe(enemy.probe(lane_length(enemy.path())));
                }
                AttackKind::Ranged => {
                    self.projectiles
                        .push(Projectile::new(probe.position, target, unit.atk()));
                }
            }
        }
    }

    fn resolve_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            projectile.advance(&mut self.enemies);
        }
        self.projectiles.retain(Projectile::is_alive);
    }

    fn collect_bounties(&mut self, out_events: &mut Vec<Event>) {
        for enemy in &mut self.enemies {
            if !enemy.take_bounty() {
                continue;
            }
            self.kill_count += 1;
            self.shop.add_gold(KILL_BOUNTY);
            debug!(enemy = enemy.id().get(), kills = self.kill_count, "enemy killed");
            out_events.push(Event::EnemyKilled {
                enemy: enemy.id(),
                bounty: KILL_BOUNTY,
            });
        }
    }

    fn update_barrier(&mut self, out_events: &mut Vec<Event>) {
        self.barrier.tick();
        if !self.stage.nodes_enabled {
            return;
        }
        let occupied = self.occupied_nodes();
        let effect = self.stage.barrier_effect;
        if let Some(affected) = self
            .barrier
            .try_activate(occupied, effect, &mut self.enemies)
        {
            info!(?effect, affected, occupied, "barrier activated");
            out_events.push(Event::BarrierActivated { effect, affected });
        }
    }

    fn check_wave_end(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Wave || self.waves.wave_active() {
            return;
        }
        let cleared = self.waves.current_wave();
        let bonus = WAVE_CLEAR_BONUS.saturating_add(u32::try_from(cleared).unwrap_or(u32::MAX));
        self.shop.add_gold(bonus);
        self.shop.refresh();
        self.phase = Phase::WaveEnd;
        info!(cleared, bonus, gold = self.shop.gold(), "wave cleared");
        out_events.push(Event::WaveCleared { cleared, bonus });
        out_events.push(Event::ShopRefreshed);
    }
}

fn validate_stage(stage: &StageConfig, catalog: &Catalog) -> Result<(), StageError> {
    if stage.integrity == 0 {
        return Err(StageError::NoIntegrity);
    }
    if !(1..=MAX_SHOP_LEVEL).contains(&stage.starting_level) {
        return Err(StageError::InvalidStartingLevel {
            level: stage.starting_level,
        });
    }
    if stage.waves.is_empty() {
        return Err(StageError::NoWaves);
    }
    let positive = |value: f64| value.is_finite() && value > 0.0;
    if !positive(stage.enemy_hp_multiplier) || !positive(stage.enemy_speed_multiplier) {
        return Err(StageError::InvalidMultiplier);
    }
    for wave in &stage.waves {
        for group in &wave.groups {
            if !group.interval.is_finite() || group.interval < 0.0 {
                return Err(StageError::InvalidInterval {
                    wave: wave.id.clone(),
                    interval: group.interval,
                });
            }
            if catalog.enemy(group.enemy).is_none() {
                return Err(StageError::MissingEnemy { kind: group.enemy });
            }
        }
    }
    Ok(())
}

fn enemy_status(enemies: &[Enemy], id: EnemyId) -> EnemyStatus {
    enemies
        .binary_search_by_key(&id, Enemy::id)
        .map_or(EnemyStatus::Gone, |index| enemies[index].status())
}

/// Applies the provided command to the battle, mutating state deterministically.
///
/// A command whose preconditions fail leaves the battle untouched and emits a
/// single [`Event::CommandRejected`]. Ticks after the battle ended are ignored.
pub fn apply(battle: &mut Battle, command: Command, out_events: &mut Vec<Event>) {
    if battle.outcome.is_some() {
        if command != Command::Tick {
            reject(command, ActionError::BattleOver, out_events);
        }
        return;
    }

    let result = match command {
        Command::Tick => {
            battle.tick(out_events);
            Ok(())
        }
        Command::StartWave => battle.start_wave(out_events),
        Command::BuyUnit { slot } => battle.buy_unit(slot, out_events),
        Command::SellUnit { unit } => battle.sell_unit(unit, out_events),
        Command::RerollShop => battle.reroll_shop(out_events),
        Command::LevelUpShop => battle.level_up_shop(out_events),
        Command::PlaceUnit { unit, cell } => battle.place_unit(unit, cell, out_events),
        Command::MoveToBench { unit, slot } => battle.move_to_bench(unit, slot, out_events),
    };
    if let Err(reason) = result {
        reject(command, reason, out_events);
    }
}

fn reject(command: Command, reason: ActionError, out_events: &mut Vec<Event>) {
    debug!(?command, %reason, "command rejected");
    out_events.push(Event::CommandRejected { command, reason });
}

/// Query functions that provide read-only access to the battle state.
pub mod query {
    use gridfuse_core::{
        BattleSnapshot, Catalog, Outcome, Phase, StageConfig, SynergyCounts, TemplateId, UnitId,
        SHOP_SLOTS,
    };
    use gridfuse_system_shop::Shop;

    use super::{Battle, Board, Enemy, Projectile, Unit};

    /// Captures everything a rendering layer needs for one frame.
    #[must_use]
    pub fn snapshot(battle: &Battle) -> BattleSnapshot {
        let lane_length = |path: usize| battle.board.waypoints(path).map_or(0, <[_]>::len);
        BattleSnapshot {
            tick: battle.tick_index,
            board: battle.board.snapshot(),
            enemies: battle
                .enemies
                .iter()
                .map(|enemy| enemy.snapshot(lane_length(enemy.path())))
                .collect(),
            units: battle.units.iter().map(Unit::snapshot).collect(),
            projectiles: battle
                .projectiles
                .iter()
                .map(Projectile::snapshot)
                .collect(),
            shop: battle.shop.snapshot(),
            integrity: battle.integrity,
            max_integrity: battle.max_integrity,
            phase: battle.phase,
            current_wave: battle.waves.current_wave(),
            total_waves: battle.waves.total_waves(),
            wave_time: battle.wave_time,
            kill_count: battle.kill_count,
            barrier: battle.barrier.snapshot(),
            outcome: battle.outcome,
        }
    }

    /// Stage the battle was built from.
    #[must_use]
    pub fn stage(battle: &Battle) -> &StageConfig {
        &battle.stage
    }

    /// Balancing tables shared with the shop.
    #[must_use]
    pub fn catalog(battle: &Battle) -> &Catalog {
        &battle.catalog
    }

    /// Tile grid and lanes.
    #[must_use]
    pub fn board(battle: &Battle) -> &Board {
        &battle.board
    }

    /// Shop and economy.
    #[must_use]
    pub fn shop(battle: &Battle) -> &Shop {
        &battle.shop
    }

    /// Gold available to the player.
    #[must_use]
    pub fn gold(battle: &Battle) -> u32 {
        battle.shop.gold()
    }

    /// Current shop offers.
    #[must_use]
    pub fn shop_slots(battle: &Battle) -> &[Option<TemplateId>; SHOP_SLOTS] {
        battle.shop.slots()
    }

    /// Remaining base integrity.
    #[must_use]
    pub fn integrity(battle: &Battle) -> u32 {
        battle.integrity
    }

    /// Integrity at battle start.
    #[must_use]
    pub fn max_integrity(battle: &Battle) -> u32 {
        battle.max_integrity
    }

    /// Current phase.
    #[must_use]
    pub fn phase(battle: &Battle) -> Phase {
        battle.phase
    }

    /// Terminal outcome once reached.
    #[must_use]
    pub fn outcome(battle: &Battle) -> Option<Outcome> {
        battle.outcome
    }

    /// Index of the most recent tick.
    #[must_use]
    pub fn tick(battle: &Battle) -> u64 {
        battle.tick_index
    }

    /// Seconds spent inside waves so far.
    #[must_use]
    pub fn wave_time(battle: &Battle) -> f64 {
        battle.wave_time
    }

    /// Enemies killed so far.
    #[must_use]
    pub fn kill_count(battle: &Battle) -> u32 {
        battle.kill_count
    }

    /// Number of waves cleared so far.
    #[must_use]
    pub fn current_wave(battle: &Battle) -> usize {
        battle.waves.current_wave()
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(battle: &Battle) -> usize {
        battle.waves.total_waves()
    }

    /// Deployed unit counts per faction and class.
    #[must_use]
    pub fn synergies(battle: &Battle) -> &SynergyCounts {
        &battle.synergies
    }

    /// Owned units in roster order.
    #[must_use]
    pub fn units(battle: &Battle) -> &[Unit] {
        &battle.units
    }

    /// Looks up an owned unit.
    #[must_use]
    pub fn unit(battle: &Battle, unit: UnitId) -> Option<&Unit> {
        battle
            .unit_index(unit)
            .ok()
            .and_then(|index| battle.units.get(index))
    }

    /// Number of units standing on the board.
    #[must_use]
    pub fn deployed_count(battle: &Battle) -> usize {
        battle.deployed_count()
    }

    /// Live enemies in spawn order.
    #[must_use]
    pub fn enemies(battle: &Battle) -> &[Enemy] {
        &battle.enemies
    }

    /// In-flight projectiles.
    #[must_use]
    pub fn projectiles(battle: &Battle) -> &[Projectile] {
        &battle.projectiles
    }
}
