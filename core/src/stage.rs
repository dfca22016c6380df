//! Stage configuration model and the standard chapter-one stages.
//!
//! A [`StageConfig`] is plain data: it can be built in code, loaded from TOML
//! by an adapter, or taken from [`standard_stages`]. Validation happens when a
//! battle is constructed from it.

use serde::{Deserialize, Serialize};

use crate::{BarrierEffect, EnemyKind, GridPos, SpecialKind};

/// Complete description of a playable stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Short identifier such as `CH1-01`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base integrity at battle start.
    pub integrity: u32,
    /// Gold available at battle start.
    pub starting_gold: u32,
    /// Shop level at battle start.
    #[serde(default = "default_level")]
    pub starting_level: u32,
    /// Deploy cap at battle start.
    pub deploy_cap: u32,
    /// Shop capabilities for the stage.
    #[serde(default)]
    pub shop_rules: ShopRules,
    /// Whether three matching units fuse automatically.
    #[serde(default)]
    pub tri_fuse: bool,
    /// Whether node tiles power the Barrier.
    #[serde(default)]
    pub nodes_enabled: bool,
    /// Obstacle tiles.
    #[serde(default)]
    pub blocks: Vec<GridPos>,
    /// Barrier node tiles.
    #[serde(default)]
    pub nodes: Vec<GridPos>,
    /// Marked tiles.
    #[serde(default)]
    pub specials: Vec<SpecialTile>,
    /// Named enemy lanes.
    pub paths: Vec<PathDef>,
    /// Waves in play order.
    pub waves: Vec<WaveDef>,
    /// Multiplier applied to every enemy's base HP.
    #[serde(default = "default_multiplier")]
    pub enemy_hp_multiplier: f64,
    /// Multiplier applied to every enemy's base speed.
    #[serde(default = "default_multiplier")]
    pub enemy_speed_multiplier: f64,
    /// Effect applied when the Barrier fires.
    #[serde(default)]
    pub barrier_effect: Option<BarrierEffect>,
}

impl StageConfig {
    /// Looks up a path by its identifier.
    #[must_use]
    pub fn path(&self, id: &str) -> Option<&PathDef> {
        self.paths.iter().find(|path| path.id == id)
    }
}

const fn default_level() -> u32 {
    1
}

const fn default_multiplier() -> f64 {
    1.0
}

/// Shop capabilities granted by a stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRules {
    /// Whether paid rerolls are allowed.
    #[serde(default)]
    pub reroll_enabled: bool,
    /// Whether the shop can be leveled.
    #[serde(default)]
    pub level_up_enabled: bool,
    /// Unit costs the shop may offer. Empty means cost one only.
    #[serde(default)]
    pub allowed_costs: Vec<u32>,
}

/// Marked tile on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTile {
    /// Location of the tile.
    pub cell: GridPos,
    /// Marking carried by the tile.
    pub kind: SpecialKind,
}

/// Named ordered sequence of waypoints enemies follow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDef {
    /// Identifier referenced by wave groups.
    pub id: String,
    /// Waypoints from entry to base.
    pub waypoints: Vec<GridPos>,
}

/// One wave made of concurrently spawning groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDef {
    /// Display identifier such as `W1`.
    pub id: String,
    /// Groups spawning in parallel.
    pub groups: Vec<WaveGroup>,
}

/// Batch of identical enemies spawned at a fixed interval on one path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveGroup {
    /// Archetype spawned.
    pub enemy: EnemyKind,
    /// Number of enemies spawned.
    pub count: u32,
    /// Seconds between consecutive spawns.
    pub interval: f64,
    /// Identifier of the path the group walks.
    pub path: String,
}

impl WaveDef {
    /// Total number of enemies the wave spawns.
    #[must_use]
    pub fn enemy_count(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Returns the ten standard chapter-one stages in play order.
#[must_use]
pub fn standard_stages() -> Vec<StageConfig> {
    use EnemyKind::{Bruiser, Flyer, Gatekeeper, Hacker, Runner, Shield, Splitter, Stalker};

    vec![
        StageConfig {
            enemy_hp_multiplier: 0.95,
            ..stage(
                "CH1-01",
                "Tape on the Asphalt",
                (15, 8),
                rules(false, false, &[1]),
                &[(4, 3), (4, 4)],
                vec![path(
                    "P0",
                    &[
                        (0, 3), (1, 3), (2, 3), (2, 2), (2, 1), (3, 1), (4, 1),
                        (5, 1), (5, 2), (5, 3), (5, 4), (5, 5), (6, 5), (7, 5),
                    ],
                )],
                vec![
                    wave("W1", vec![group(Runner, 14, 0.60, "P0")]),
                    wave("W2", vec![group(Runner, 10, 0.55, "P0"), group(Bruiser, 2, 1.20, "P0")]),
                    wave("W3", vec![group(Runner, 16, 0.55, "P0")]),
                    wave("W4", vec![group(Bruiser, 4, 1.10, "P0")]),
                    wave("W5", vec![group(Runner, 10, 0.55, "P0"), group(Bruiser, 3, 1.10, "P0")]),
                    wave("W6", vec![group(Shield, 3, 1.00, "P0"), group(Runner, 10, 0.55, "P0")]),
                ],
            )
        },
        stage(
            "CH1-02",
            "Cheap Tricks",
            (15, 10),
            rules(true, false, &[1]),
            &[(3, 2), (3, 3), (3, 4)],
            vec![path(
                "P0",
                &[
                    (0, 4), (1, 4), (2, 4), (2, 3), (2, 2), (3, 2),
                    (4, 2), (5, 2), (5, 3), (5, 4), (6, 4), (7, 4),
                ],
            )],
            vec![
                wave("W1", vec![group(Runner, 16, 0.55, "P0")]),
                wave("W2", vec![group(Runner, 10, 0.55, "P0"), group(Bruiser, 3, 1.10, "P0")]),
                wave("W3", vec![group(Bruiser, 5, 1.10, "P0")]),
                wave("W4", vec![group(Runner, 18, 0.50, "P0")]),
                wave("W5", vec![group(Shield, 4, 1.00, "P0"), group(Runner, 10, 0.55, "P0")]),
                wave("W6", vec![group(Bruiser, 4, 1.10, "P0"), group(Shield, 4, 1.00, "P0")]),
            ],
        ),
        StageConfig {
            enemy_hp_multiplier: 1.05,
            ..stage(
                "CH1-03",
                "Breakpoint",
                (15, 10),
                rules(true, true, &[1, 2]),
                &[(4, 2), (4, 3), (4, 4), (4, 5)],
                vec![path(
                    "P0",
                    &[
                        (0, 2), (1, 2), (2, 2), (3, 2), (3, 3), (3, 4),
                        (3, 5), (4, 5), (5, 5), (6, 5), (7, 5),
                    ],
                )],
                vec![
                    wave("W1", vec![group(Runner, 18, 0.55, "P0")]),
                    wave("W2", vec![group(Bruiser, 4, 1.10, "P0"), group(Runner, 8, 0.55, "P0")]),
                    wave("W3", vec![group(Shield, 6, 1.00, "P0")]),
                    wave("W4", vec![group(Runner, 22, 0.50, "P0")]),
                    wave("W5", vec![group(Bruiser, 5, 1.10, "P0"), group(Shield, 4, 1.00, "P0")]),
                    wave("W6", vec![group(Shield, 6, 1.00, "P0"), group(Runner, 12, 0.55, "P0")]),
                ],
            )
        },
        StageConfig {
            tri_fuse: true,
            enemy_hp_multiplier: 1.05,
            ..stage(
                "CH1-04",
                "TRI-FUSE",
                (15, 10),
                rules(true, true, &[1, 2, 3]),
                &[(2, 4), (3, 4), (4, 4), (5, 4)],
                vec![path(
                    "P0",
                    &[
                        (0, 3), (1, 3), (2, 3), (3, 3), (4, 3),
                        (5, 3), (5, 2), (5, 1), (6, 1), (7, 1),
                    ],
                )],
                vec![
                    wave("W1", vec![group(Runner, 16, 0.55, "P0")]),
                    wave("W2", vec![group(Splitter, 6, 0.90, "P0")]),
                    wave("W3", vec![group(Runner, 12, 0.55, "P0"), group(Shield, 4, 1.00, "P0")]),
                    wave("W4", vec![group(Splitter, 8, 0.90, "P0"), group(Runner, 6, 0.55, "P0")]),
                    wave("W5", vec![group(Bruiser, 4, 1.10, "P0"), group(Splitter, 6, 0.90, "P0")]),
                    wave("W6", vec![group(Shield, 6, 1.00, "P0"), group(Runner, 10, 0.55, "P0")]),
                ],
            )
        },
        StageConfig {
            nodes: cells(&[(2, 2), (4, 5), (6, 2)]),
            ..barrier_stage(
                stage(
                    "CH1-05",
                    "Triangle of Salt",
                    (15, 10),
                    rules(true, true, &[1, 2, 3]),
                    &[(3, 3), (4, 3)],
                    vec![path(
                        "P0",
                        &[
                            (0, 5), (1, 5), (2, 5), (2, 4), (2, 3), (2, 2),
                            (2, 1), (3, 1), (4, 1), (5, 1), (6, 1), (7, 1),
                        ],
                    )],
                    vec![
                        wave("W1", vec![group(Runner, 18, 0.55, "P0")]),
                        wave("W2", vec![group(Bruiser, 4, 1.10, "P0")]),
                        wave("W3", vec![group(Splitter, 6, 0.90, "P0"), group(Runner, 8, 0.55, "P0")]),
                        wave("W4", vec![group(Shield, 6, 1.00, "P0")]),
                        wave(
                            "W5",
                            vec![
                                group(Bruiser, 3, 1.10, "P0"),
                                group(Shield, 4, 1.00, "P0"),
                                group(Runner, 8, 0.55, "P0"),
                            ],
                        ),
                        wave("W6", vec![group(Splitter, 10, 0.80, "P0")]),
                    ],
                ),
                1.10,
                BarrierEffect::Slow,
            )
        },
        StageConfig {
            nodes: cells(&[(2, 5), (5, 5), (6, 2)]),
            specials: specials(SpecialKind::Seal, &[(3, 2), (4, 2)]),
            ..barrier_stage(
                stage(
                    "CH1-06",
                    "Seal the Doorway",
                    (18, 10),
                    rules(true, true, &[1, 2, 3]),
                    &[(4, 4)],
                    vec![path(
                        "P0",
                        &[
                            (0, 2), (1, 2), (2, 2), (3, 2), (4, 2), (5, 2),
                            (5, 3), (5, 4), (5, 5), (6, 5), (7, 5),
                        ],
                    )],
                    vec![
                        wave("W1", vec![group(Runner, 18, 0.55, "P0")]),
                        wave("W2", vec![group(Shield, 5, 1.00, "P0")]),
                        wave("W3", vec![group(Splitter, 6, 0.90, "P0"), group(Runner, 10, 0.55, "P0")]),
                        wave("W4", vec![group(Bruiser, 5, 1.10, "P0")]),
                        wave("W5", vec![group(Shield, 6, 1.00, "P0"), group(Bruiser, 3, 1.10, "P0")]),
                        wave(
                            "W6",
                            vec![
                                group(Splitter, 8, 0.90, "P0"),
                                group(Shield, 4, 1.00, "P0"),
                                group(Runner, 8, 0.55, "P0"),
                            ],
                        ),
                    ],
                ),
                1.10,
                BarrierEffect::Slow,
            )
        },
        StageConfig {
            nodes: cells(&[(2, 3), (4, 5), (6, 3)]),
            specials: specials(SpecialKind::Antenna, &[(1, 1), (6, 6)]),
            ..barrier_stage(
                stage(
                    "CH1-07",
                    "Air Above Neon",
                    (18, 12),
                    rules(true, true, &[1, 2, 3]),
                    &[(3, 4), (4, 4)],
                    vec![
                        path(
                            "P0",
                            &[
                                (0, 3), (1, 3), (2, 3), (3, 3), (3, 2),
                                (3, 1), (4, 1), (5, 1), (6, 1), (7, 1),
                            ],
                        ),
                        path("P1", &[(0, 6), (2, 6), (4, 6), (6, 6), (7, 5)]),
                    ],
                    vec![
                        wave("W1", vec![group(Runner, 16, 0.55, "P0")]),
                        wave("W2", vec![group(Flyer, 8, 0.80, "P1")]),
                        wave("W3", vec![group(Shield, 4, 1.00, "P0"), group(Runner, 10, 0.55, "P0")]),
                        wave("W4", vec![group(Flyer, 10, 0.70, "P1"), group(Runner, 8, 0.55, "P0")]),
                        wave("W5", vec![group(Bruiser, 4, 1.10, "P0"), group(Flyer, 8, 0.80, "P1")]),
                        wave("W6", vec![group(Flyer, 12, 0.65, "P1"), group(Shield, 4, 1.00, "P0")]),
                    ],
                ),
                1.12,
                BarrierEffect::Slow,
            )
        },
        StageConfig {
            nodes: cells(&[(1, 4), (4, 1), (6, 4)]),
            specials: specials(SpecialKind::Antenna, &[(3, 6)]),
            ..barrier_stage(
                stage(
                    "CH1-08",
                    "The Unseen Lane",
                    (18, 12),
                    rules(true, true, &[1, 2, 3]),
                    &[(2, 2), (5, 5)],
                    vec![path(
                        "P0",
                        &[
                            (0, 4), (1, 4), (2, 4), (3, 4), (4, 4), (4, 3),
                            (4, 2), (4, 1), (5, 1), (6, 1), (7, 1),
                        ],
                    )],
                    vec![
                        wave("W1", vec![group(Runner, 18, 0.55, "P0")]),
                        wave("W2", vec![group(Stalker, 8, 0.80, "P0")]),
                        wave("W3", vec![group(Splitter, 6, 0.90, "P0"), group(Runner, 8, 0.55, "P0")]),
                        wave("W4", vec![group(Stalker, 10, 0.70, "P0"), group(Runner, 10, 0.55, "P0")]),
                        wave("W5", vec![group(Shield, 5, 1.00, "P0"), group(Stalker, 6, 0.80, "P0")]),
                        wave("W6", vec![group(Stalker, 12, 0.65, "P0"), group(Splitter, 6, 0.90, "P0")]),
                    ],
                ),
                1.13,
                BarrierEffect::Reveal,
            )
        },
        StageConfig {
            nodes: cells(&[(2, 2), (4, 4), (6, 2)]),
            specials: specials(SpecialKind::Workbench, &[(2, 6), (5, 6)]),
            ..barrier_stage(
                stage(
                    "CH1-09",
                    "Static on the Line",
                    (18, 12),
                    rules(true, true, &[1, 2, 3]),
                    &[(3, 3)],
                    vec![path(
                        "P0",
                        &[
                            (0, 6), (1, 6), (2, 6), (3, 6), (4, 6), (5, 6),
                            (5, 5), (5, 4), (5, 3), (6, 3), (7, 3),
                        ],
                    )],
                    vec![
                        wave("W1", vec![group(Runner, 18, 0.55, "P0")]),
                        wave("W2", vec![group(Hacker, 5, 0.90, "P0"), group(Runner, 8, 0.55, "P0")]),
                        wave("W3", vec![group(Shield, 5, 1.00, "P0"), group(Hacker, 4, 0.90, "P0")]),
                        wave("W4", vec![group(Splitter, 8, 0.90, "P0")]),
                        wave("W5", vec![group(Bruiser, 4, 1.10, "P0"), group(Hacker, 6, 0.90, "P0")]),
                        wave("W6", vec![group(Hacker, 8, 0.80, "P0"), group(Shield, 6, 1.00, "P0")]),
                    ],
                ),
                1.15,
                BarrierEffect::Slow,
            )
        },
        StageConfig {
            nodes: cells(&[(2, 3), (4, 6), (6, 3)]),
            specials: vec![
                SpecialTile {
                    cell: GridPos::new(4, 2),
                    kind: SpecialKind::Seal,
                },
                SpecialTile {
                    cell: GridPos::new(4, 5),
                    kind: SpecialKind::Workbench,
                },
            ],
            ..barrier_stage(
                stage(
                    "CH1-10",
                    "Backroom Gatekeeper",
                    (18, 14),
                    rules(true, true, &[1, 2, 3, 4]),
                    &[(3, 4), (4, 4), (5, 4)],
                    vec![path(
                        "P0",
                        &[
                            (0, 3), (1, 3), (2, 3), (3, 3), (3, 2), (3, 1), (4, 1),
                            (5, 1), (6, 1), (6, 2), (6, 3), (6, 4), (6, 5), (7, 5),
                        ],
                    )],
                    vec![
                        wave("W1", vec![group(Runner, 20, 0.50, "P0")]),
                        wave("W2", vec![group(Stalker, 8, 0.80, "P0"), group(Runner, 8, 0.55, "P0")]),
                        wave("W3", vec![group(Hacker, 6, 0.90, "P0"), group(Shield, 4, 1.00, "P0")]),
                        wave("W4", vec![group(Bruiser, 5, 1.10, "P0"), group(Splitter, 6, 0.90, "P0")]),
                        wave("W5", vec![group(Runner, 12, 0.55, "P0"), group(Flyer, 8, 0.80, "P0")]),
                        wave("W6", vec![group(Gatekeeper, 1, 0.0, "P0"), group(Runner, 12, 0.55, "P0")]),
                    ],
                ),
                1.18,
                BarrierEffect::Mark,
            )
        },
    ]
}

/// Looks up a standard stage by identifier, ignoring ASCII case.
#[must_use]
pub fn standard_stage(id: &str) -> Option<StageConfig> {
    standard_stages()
        .into_iter()
        .find(|stage| stage.id.eq_ignore_ascii_case(id))
}

fn stage(
    id: &str,
    name: &str,
    (integrity, starting_gold): (u32, u32),
    shop_rules: ShopRules,
    blocks: &[(u32, u32)],
    paths: Vec<PathDef>,
    waves: Vec<WaveDef>,
) -> StageConfig {
    StageConfig {
        id: id.to_owned(),
        name: name.to_owned(),
        integrity,
        starting_gold,
        starting_level: 1,
        deploy_cap: 3,
        shop_rules,
        tri_fuse: false,
        nodes_enabled: false,
        blocks: cells(blocks),
        nodes: Vec::new(),
        specials: Vec::new(),
        paths,
        waves,
        enemy_hp_multiplier: 1.0,
        enemy_speed_multiplier: 1.0,
        barrier_effect: None,
    }
}

fn barrier_stage(base: StageConfig, hp_multiplier: f64, effect: BarrierEffect) -> StageConfig {
    StageConfig {
        tri_fuse: true,
        nodes_enabled: true,
        enemy_hp_multiplier: hp_multiplier,
        barrier_effect: Some(effect),
        ..base
    }
}

fn rules(reroll_enabled: bool, level_up_enabled: bool, allowed_costs: &[u32]) -> ShopRules {
    ShopRules {
        reroll_enabled,
        level_up_enabled,
        allowed_costs: allowed_costs.to_vec(),
    }
}

fn cells(coords: &[(u32, u32)]) -> Vec<GridPos> {
    coords
        .iter()
        .map(|&(column, row)| GridPos::new(column, row))
        .collect()
}

fn specials(kind: SpecialKind, coords: &[(u32, u32)]) -> Vec<SpecialTile> {
    cells(coords)
        .into_iter()
        .map(|cell| SpecialTile { cell, kind })
        .collect()
}

fn path(id: &str, waypoints: &[(u32, u32)]) -> PathDef {
    PathDef {
        id: id.to_owned(),
        waypoints: cells(waypoints),
    }
}

fn wave(id: &str, groups: Vec<WaveGroup>) -> WaveDef {
    WaveDef {
        id: id.to_owned(),
        groups,
    }
}

fn group(enemy: EnemyKind, count: u32, interval: f64, path: &str) -> WaveGroup {
    WaveGroup {
        enemy,
        count,
        interval,
        path: path.to_owned(),
    }
}
