#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridfuse battle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative battle, and pure systems. Adapters submit [`Command`] values
//! describing player intent or the passage of one fixed tick, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values describing what changed. Rendering layers never touch the
//! battle directly; they consume the read-only [`BattleSnapshot`].
//!
//! Static balancing data lives in [`catalog`] and per-stage geometry, waves
//! and shop rules live in [`stage`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod stage;

pub use catalog::{Catalog, EnemyDef, SynergyBonus, UnitDef, SYNERGY_THRESHOLD};
pub use stage::{
    standard_stage, standard_stages, PathDef, ShopRules, SpecialTile, StageConfig, WaveDef,
    WaveGroup,
};

/// Number of simulation ticks that make up one second of battle time.
pub const TICKS_PER_SECOND: u32 = 60;

/// Duration of a single fixed simulation tick, in seconds.
pub const TICK_SECONDS: f64 = 1.0 / TICKS_PER_SECOND as f64;

/// Side length of a board tile in pixels.
pub const TILE_SIZE: f64 = 60.0;

/// Number of tile columns on every stage board.
pub const BOARD_COLUMNS: u32 = 8;

/// Number of tile rows on every stage board.
pub const BOARD_ROWS: u32 = 8;

/// Number of offers the shop presents at once.
pub const SHOP_SLOTS: usize = 5;

/// Number of bench slots available for undeployed units.
pub const BENCH_SLOTS: usize = 8;

/// Gold spent on a single shop reroll.
pub const REROLL_COST: u32 = 2;

/// Highest level the shop can reach.
pub const MAX_SHOP_LEVEL: u32 = 6;

/// Gold awarded for every enemy killed.
pub const KILL_BOUNTY: u32 = 1;

/// Highest star level a unit can reach through fusion.
pub const MAX_STAR: u8 = 3;

/// Unique identifier assigned to an enemy when it spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit when it is purchased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a unit template inside a [`Catalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u16);

impl TemplateId {
    /// Creates a template identifier from its catalog index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the catalog index of the template.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Location of a single board tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    column: u32,
    row: u32,
}

impl GridPos {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the tile lies on a board of the provided dimensions.
    #[must_use]
    pub const fn within(&self, columns: u32, rows: u32) -> bool {
        self.column < columns && self.row < rows
    }

    /// Pixel coordinate of the tile's center.
    #[must_use]
    pub fn center(self) -> PixelPos {
        PixelPos::new(
            f64::from(self.column) * TILE_SIZE + TILE_SIZE / 2.0,
            f64::from(self.row) * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPos) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Continuous position measured in board pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPos {
    /// Horizontal offset from the board's left edge.
    pub x: f64,
    /// Vertical offset from the board's top edge.
    pub y: f64,
}

impl PixelPos {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(self, other: PixelPos) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Classification of a single board tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Open ground where units may be deployed.
    Build,
    /// Lane tile that enemies walk along.
    Path,
    /// Obstacle that accepts nothing.
    Block,
    /// Deployable tile that powers the Barrier when occupied.
    Node,
    /// Deployable tile carrying a stage-specific marking.
    Special,
}

impl TileType {
    /// Reports whether units may be deployed onto the tile.
    #[must_use]
    pub const fn is_placeable(self) -> bool {
        matches!(self, Self::Build | Self::Node | Self::Special)
    }
}

/// Marking carried by a special tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Sealed doorway laid across the lane.
    Seal,
    /// Antenna tower overlooking an air lane.
    Antenna,
    /// Engineer workbench.
    Workbench,
    /// Plain marked ground.
    Ground,
}

/// Enemy archetypes known to the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Fast, fragile walker.
    Runner,
    /// Slow, durable walker.
    Bruiser,
    /// Walker that mitigates physical damage.
    Shield,
    /// Mid-weight walker.
    Splitter,
    /// Walker that follows air lanes.
    Flyer,
    /// Walker that cannot be targeted until revealed.
    Stalker,
    /// Mid-weight walker with a heavier leak.
    Hacker,
    /// Fast, durable walker.
    Charger,
    /// Very slow, durable walker.
    Totem,
    /// Stage boss whose leak ends most battles.
    Gatekeeper,
}

impl EnemyKind {
    /// Reports whether the kind starts each life invisible to targeting.
    #[must_use]
    pub const fn spawns_hidden(self) -> bool {
        matches!(self, Self::Stalker)
    }
}

/// Faction a unit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Street crews.
    Street,
    /// Coven witches.
    Coven,
    /// ArcTech engineers.
    ArcTech,
    /// Exorcist order.
    Exorcist,
}

impl Faction {
    /// Every faction in display order.
    pub const ALL: [Faction; 4] = [Self::Street, Self::Coven, Self::ArcTech, Self::Exorcist];
}

/// Combat role a unit fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    /// Front-line melee holder.
    Vanguard,
    /// Long-range single-target shooter.
    Marksman,
    /// Magic damage dealer.
    Caster,
    /// Utility builder.
    Engineer,
    /// Backline helper.
    Support,
}

impl UnitClass {
    /// Every class in display order.
    pub const ALL: [UnitClass; 5] = [
        Self::Vanguard,
        Self::Marksman,
        Self::Caster,
        Self::Engineer,
        Self::Support,
    ];
}

/// Strategy a unit uses to choose among enemies in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Prefer the enemy furthest along its path.
    Frontmost,
    /// Prefer the enemy with the lowest remaining HP fraction.
    LowHp,
    /// Prefer the enemy closest to the unit.
    Nearest,
}

/// Delivery method of a unit's attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Damage lands immediately.
    Melee,
    /// Damage travels as a projectile.
    Ranged,
}

/// Kind of damage dealt to enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    /// Physical damage, reduced by shields.
    Physical,
    /// Magic damage, never reduced.
    Magic,
}

/// Effect applied to enemies when the Barrier fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierEffect {
    /// Slows every live enemy for a few seconds.
    Slow,
    /// Deals a slice of each enemy's max HP as magic damage.
    Mark,
    /// Permanently reveals hidden enemies.
    Reveal,
}

/// Location of a unit: on a bench slot or deployed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Waiting on the bench at the provided slot index.
    Bench(usize),
    /// Deployed on the board at the provided tile.
    Board(GridPos),
}

impl Placement {
    /// Tile occupied by the unit when deployed.
    #[must_use]
    pub const fn cell(&self) -> Option<GridPos> {
        match self {
            Self::Board(cell) => Some(*cell),
            Self::Bench(_) => None,
        }
    }

    /// Bench slot occupied by the unit when undeployed.
    #[must_use]
    pub const fn bench_slot(&self) -> Option<usize> {
        match self {
            Self::Bench(slot) => Some(*slot),
            Self::Board(_) => None,
        }
    }
}

/// High-level phase of the battle state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Between waves; the player shops and arranges units.
    Prepare,
    /// A wave is spawning or still has unresolved enemies.
    Wave,
    /// The wave just cleared; becomes `Prepare` on the next tick.
    WaveEnd,
}

/// Terminal result of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every wave was cleared before integrity ran out.
    Victory,
    /// Integrity reached zero.
    Defeat,
}

/// Resolution state of an enemy as seen by the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyStatus {
    /// Alive and still walking toward the base.
    Advancing,
    /// Killed by the defenders.
    Dead,
    /// Reached the base.
    Leaked,
    /// No longer present in the live collection.
    Gone,
}

impl EnemyStatus {
    /// Reports whether the enemy no longer blocks wave completion.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Advancing)
    }
}

/// Commands that express all permissible battle mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation by one fixed tick.
    Tick,
    /// Starts the next configured wave.
    StartWave,
    /// Purchases the offer in the provided shop slot onto the bench.
    BuyUnit {
        /// Shop slot holding the offer.
        slot: usize,
    },
    /// Sells an owned unit for a refund.
    SellUnit {
        /// Unit being sold.
        unit: UnitId,
    },
    /// Pays to replace every shop offer.
    RerollShop,
    /// Pays to raise the shop level and deploy cap.
    LevelUpShop,
    /// Deploys a unit, or moves a deployed unit, onto a board tile.
    PlaceUnit {
        /// Unit being placed.
        unit: UnitId,
        /// Destination tile.
        cell: GridPos,
    },
    /// Returns a unit to an empty bench slot.
    MoveToBench {
        /// Unit being moved.
        unit: UnitId,
        /// Destination bench slot.
        slot: usize,
    },
}

/// Events broadcast by the battle after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced one tick.
    TimeAdvanced {
        /// Index of the tick that just ran.
        tick: u64,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: usize,
    },
    /// Confirms that an enemy entered the board.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy reached the base and damaged integrity.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Integrity removed by the leak.
        damage: u32,
        /// Integrity remaining after the leak.
        integrity: u32,
    },
    /// Reports that an enemy died and paid its bounty.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Gold awarded for the kill.
        bounty: u32,
    },
    /// Confirms that a shop offer was bought onto the bench.
    UnitPurchased {
        /// Identifier allocated to the new unit.
        unit: UnitId,
        /// Template the unit was created from.
        template: TemplateId,
        /// Bench slot the unit occupies.
        bench_slot: usize,
        /// Gold spent.
        cost: u32,
    },
    /// Confirms that a unit was sold.
    UnitSold {
        /// Unit that was removed.
        unit: UnitId,
        /// Gold refunded.
        refund: u32,
    },
    /// Confirms a TRI-FUSE promotion.
    UnitsFused {
        /// Unit that was promoted.
        survivor: UnitId,
        /// Units consumed by the fusion.
        consumed: [UnitId; 2],
        /// Star level reached by the survivor.
        star: u8,
    },
    /// Confirms that a unit now stands on a board tile.
    UnitDeployed {
        /// Unit that moved.
        unit: UnitId,
        /// Tile it occupies.
        cell: GridPos,
    },
    /// Confirms that a unit now waits on the bench.
    UnitBenched {
        /// Unit that moved.
        unit: UnitId,
        /// Bench slot it occupies.
        slot: usize,
    },
    /// Reports that every shop slot received a fresh offer.
    ShopRefreshed,
    /// Confirms a paid reroll.
    ShopRerolled {
        /// Gold spent.
        cost: u32,
    },
    /// Confirms a shop level increase.
    ShopLeveledUp {
        /// New shop level.
        level: u32,
        /// New deploy cap.
        deploy_cap: u32,
        /// Gold spent.
        cost: u32,
    },
    /// Reports that the node-powered Barrier fired.
    BarrierActivated {
        /// Effect configured for the stage, if any.
        effect: Option<BarrierEffect>,
        /// Number of enemies the effect touched.
        affected: usize,
    },
    /// Reports that the active wave fully resolved.
    WaveCleared {
        /// Number of waves cleared so far.
        cleared: usize,
        /// Gold bonus awarded for the clear.
        bonus: u32,
    },
    /// Announces the terminal result of the battle.
    BattleEnded {
        /// Final outcome.
        outcome: Outcome,
    },
    /// Reports that a command left the battle untouched.
    CommandRejected {
        /// Command that was rejected.
        command: Command,
        /// Precondition that failed.
        reason: ActionError,
    },
}

/// Preconditions that can prevent a player action from taking effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ActionError {
    /// The battle already reached a terminal outcome.
    #[error("the battle is over")]
    BattleOver,
    /// A wave is still active.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// Every configured wave has been played.
    #[error("no waves remain")]
    NoWavesRemaining,
    /// The player cannot pay for the action.
    #[error("not enough gold")]
    InsufficientGold,
    /// The shop slot index does not exist.
    #[error("shop slot does not exist")]
    InvalidSlot,
    /// The shop slot holds no offer.
    #[error("shop slot is empty")]
    EmptySlot,
    /// Every bench slot is taken.
    #[error("the bench is full")]
    BenchFull,
    /// The requested bench slot is taken or out of range.
    #[error("bench slot is unavailable")]
    BenchSlotUnavailable,
    /// No owned unit carries the identifier.
    #[error("unit does not exist")]
    MissingUnit,
    /// The tile is out of bounds or not deployable.
    #[error("tile cannot hold units")]
    Unplaceable,
    /// Another unit stands on the tile.
    #[error("tile is occupied")]
    Occupied,
    /// Deploying would exceed the deploy cap.
    #[error("deploy cap reached")]
    DeployCapReached,
    /// The stage disables rerolls.
    #[error("rerolls are disabled on this stage")]
    RerollDisabled,
    /// The stage disables leveling.
    #[error("leveling is disabled on this stage")]
    LevelUpDisabled,
    /// The shop already reached its final level.
    #[error("the shop is at maximum level")]
    MaxLevel,
}

/// Deployed unit counts per faction and per class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SynergyCounts {
    factions: BTreeMap<Faction, u32>,
    classes: BTreeMap<UnitClass, u32>,
}

impl SynergyCounts {
    /// Records one deployed unit of the provided faction and class.
    pub fn record(&mut self, faction: Faction, class: UnitClass) {
        *self.factions.entry(faction).or_insert(0) += 1;
        *self.classes.entry(class).or_insert(0) += 1;
    }

    /// Number of deployed units in the faction.
    #[must_use]
    pub fn faction(&self, faction: Faction) -> u32 {
        self.factions.get(&faction).copied().unwrap_or(0)
    }

    /// Number of deployed units in the class.
    #[must_use]
    pub fn class(&self, class: UnitClass) -> u32 {
        self.classes.get(&class).copied().unwrap_or(0)
    }

    /// Reports whether the faction reached its synergy threshold.
    #[must_use]
    pub fn faction_active(&self, faction: Faction) -> bool {
        self.faction(faction) >= SYNERGY_THRESHOLD
    }

    /// Reports whether the class reached its synergy threshold.
    #[must_use]
    pub fn class_active(&self, class: UnitClass) -> bool {
        self.class(class) >= SYNERGY_THRESHOLD
    }
}

/// Immutable representation of a single enemy used for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned at spawn.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Current pixel position.
    pub position: PixelPos,
    /// Remaining hit points.
    pub hp: f64,
    /// Hit points at spawn.
    pub max_hp: f64,
    /// Whether units may target the enemy.
    pub visible: bool,
    /// Whether a slow is currently applied.
    pub slowed: bool,
    /// Fraction of the path already walked.
    pub progress: f64,
}

/// Immutable representation of a single unit used for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated at purchase.
    pub id: UnitId,
    /// Template the unit was created from.
    pub template: TemplateId,
    /// Current star level.
    pub star: u8,
    /// Bench slot or board tile.
    pub placement: Placement,
    /// Current hit points.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Effective attack damage.
    pub atk: f64,
    /// Effective attacks per second.
    pub attack_speed: f64,
    /// Effective range in tiles.
    pub range: u32,
    /// Seconds until the next attack may fire.
    pub cooldown: f64,
}

/// Immutable representation of an in-flight projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Current pixel position.
    pub position: PixelPos,
    /// Enemy the projectile is homing on.
    pub target: EnemyId,
}

/// Read-only view of the shop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopSnapshot {
    /// Offers in each slot; `None` marks a bought-out slot.
    pub slots: [Option<TemplateId>; SHOP_SLOTS],
    /// Gold available.
    pub gold: u32,
    /// Current shop level.
    pub level: u32,
    /// Experience toward the next level.
    pub xp: u32,
    /// Maximum number of deployed units.
    pub deploy_cap: u32,
    /// Gold required for the next level.
    pub level_up_cost: u32,
}

/// Read-only view of the Barrier timers.
#[derive(Clone, Debug, PartialEq)]
pub struct BarrierSnapshot {
    /// Seconds until the Barrier can fire again.
    pub cooldown: f64,
    /// Seconds left in the current activation window.
    pub active: f64,
    /// Number of node tiles currently occupied.
    pub occupied_nodes: usize,
}

/// Read-only view of the tile grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tile classifications in row-major order.
    pub tiles: Vec<TileType>,
}

/// Everything a rendering layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleSnapshot {
    /// Index of the most recent tick.
    pub tick: u64,
    /// Tile grid.
    pub board: BoardSnapshot,
    /// Live enemies in spawn order.
    pub enemies: Vec<EnemySnapshot>,
    /// Owned units in roster order.
    pub units: Vec<UnitSnapshot>,
    /// In-flight projectiles.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Shop contents and economy.
    pub shop: ShopSnapshot,
    /// Remaining base integrity.
    pub integrity: u32,
    /// Integrity at battle start.
    pub max_integrity: u32,
    /// Current phase.
    pub phase: Phase,
    /// Number of waves cleared so far.
    pub current_wave: usize,
    /// Number of configured waves.
    pub total_waves: usize,
    /// Seconds spent inside waves so far.
    pub wave_time: f64,
    /// Enemies killed so far.
    pub kill_count: u32,
    /// Barrier timers.
    pub barrier: BarrierSnapshot,
    /// Terminal outcome once reached.
    pub outcome: Option<Outcome>,
}
