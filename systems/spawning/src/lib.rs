#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting enemy spawn requests.
//!
//! The scheduler never owns live enemies. Each tick it reports the enemies it
//! wants instantiated and asks the caller how the enemies it already spawned
//! are doing so it can tell when the active wave has fully resolved.

use gridfuse_core::{ActionError, EnemyId, EnemyKind, EnemyStatus, StageConfig, TICK_SECONDS};
use thiserror::Error;
use tracing::{debug, info};

/// Raised when a wave group references a path the stage does not declare.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("wave {wave} spawns on unknown path `{path}`")]
pub struct UnknownPath {
    /// Identifier of the offending wave.
    pub wave: String,
    /// Path identifier that failed to resolve.
    pub path: String,
}

/// Instruction to instantiate one enemy at the start of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Identifier reserved for the enemy.
    pub enemy: EnemyId,
    /// Archetype to instantiate.
    pub kind: EnemyKind,
    /// Index of the path inside the stage's path list.
    pub path: usize,
    /// Multiplier applied to the archetype's base HP.
    pub hp_multiplier: f64,
    /// Multiplier applied to the archetype's base speed.
    pub speed_multiplier: f64,
}

#[derive(Clone, Debug)]
struct ScheduledGroup {
    kind: EnemyKind,
    count: u32,
    interval: f64,
    path: usize,
}

#[derive(Clone, Debug, Default)]
struct GroupProgress {
    timer: f64,
    spawned: u32,
}

/// Timer-driven scheduler that walks through a stage's waves in order.
#[derive(Debug)]
pub struct WaveManager {
    waves: Vec<Vec<ScheduledGroup>>,
    hp_multiplier: f64,
    speed_multiplier: f64,
    current_wave: usize,
    progress: Vec<GroupProgress>,
    wave_active: bool,
    all_done: bool,
    spawned: Vec<EnemyId>,
    next_enemy: u32,
}

impl WaveManager {
    /// Creates a scheduler for the provided stage, resolving path names up front.
    pub fn new(stage: &StageConfig) -> Result<Self, UnknownPath> {
        let mut waves = Vec::with_capacity(stage.waves.len());
        for wave in &stage.waves {
            let mut groups = Vec::with_capacity(wave.groups.len());
            for group in &wave.groups {
                let path = stage
                    .paths
                    .iter()
                    .position(|path| path.id == group.path)
                    .ok_or_else(|| UnknownPath {
                        wave: wave.id.clone(),
                        path: group.path.clone(),
                    })?;
                groups.push(ScheduledGroup {
                    kind: group.enemy,
                    count: group.count,
                    interval: group.interval,
                    path,
                });
            }
            waves.push(groups);
        }

        Ok(Self {
            waves,
            hp_multiplier: stage.enemy_hp_multiplier,
            speed_multiplier: stage.enemy_speed_multiplier,
            current_wave: 0,
            progress: Vec::new(),
            wave_active: false,
            all_done: stage.waves.is_empty(),
            spawned: Vec::new(),
            next_enemy: 0,
        })
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.waves.len()
    }

    /// Index of the next wave to play, which equals the number of waves cleared.
    #[must_use]
    pub fn current_wave(&self) -> usize {
        self.current_wave
    }

    /// Reports whether a wave is spawning or still has unresolved enemies.
    #[must_use]
    pub fn wave_active(&self) -> bool {
        self.wave_active
    }

    /// Reports whether every configured wave has been cleared.
    #[must_use]
    pub fn all_done(&self) -> bool {
        self.all_done
    }

    /// Identifiers of the enemies spawned by the active or most recent wave.
    #[must_use]
    pub fn spawned(&self) -> &[EnemyId] {
        &self.spawned
    }

    /// Arms the next wave so the following update begins spawning immediately.
    pub fn start_wave(&mut self) -> Result<usize, ActionError> {
        if self.wave_active {
            return Err(ActionError::WaveInProgress);
        }
        let Some(groups) = self.waves.get(self.current_wave) else {
            return Err(ActionError::NoWavesRemaining);
        };

        self.progress = vec![GroupProgress::default(); groups.len()];
        self.spawned.clear();
        self.wave_active = true;
        info!(wave = self.current_wave, groups = groups.len(), "wave started");
        Ok(self.current_wave)
    }

    /// Advances spawn timers by one tick and checks whether the wave resolved.
    ///
    /// Enemies to instantiate this tick are appended to `out`. `status`
    /// reports the state of previously spawned enemies; an identifier the
    /// caller no longer tracks should be reported as [`EnemyStatus::Gone`].
    pub fn update<F>(&mut self, status: F, out: &mut Vec<SpawnRequest>)
    where
        F: Fn(EnemyId) -> EnemyStatus,
    {
        if !self.wave_active {
            return;
        }
        let Some(groups) = self.waves.get(self.current_wave) else {
            return;
        };

        let mut all_spawned = true;
        for (group, progress) in groups.iter().zip(self.progress.iter_mut()) {
            if progress.spawned >= group.count {
                continue;
            }
            all_spawned = false;

            progress.timer -= TICK_SECONDS;
            if progress.timer <= 0.0 {
                let enemy = EnemyId::new(self.next_enemy);
                self.next_enemy += 1;
                self.spawned.push(enemy);
                out.push(SpawnRequest {
                    enemy,
                    kind: group.kind,
                    path: group.path,
                    hp_multiplier: self.hp_multiplier,
                    speed_multiplier: self.speed_multiplier,
                });
                debug!(enemy = enemy.get(), kind = ?group.kind, "enemy scheduled");
                progress.spawned += 1;
                progress.timer = group.interval;
            }
        }

        if all_spawned && self.spawned.iter().all(|&enemy| status(enemy).is_resolved()) {
            self.wave_active = false;
            self.current_wave += 1;
            if self.current_wave >= self.waves.len() {
                self.all_done = true;
            }
            info!(cleared = self.current_wave, all_done = self.all_done, "wave resolved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfuse_core::{GridPos, PathDef, ShopRules, WaveDef, WaveGroup};

    fn stage(groups: Vec<WaveGroup>) -> StageConfig {
        StageConfig {
            id: "T".into(),
            name: "Test".into(),
            integrity: 10,
            starting_gold: 0,
            starting_level: 1,
            deploy_cap: 3,
            shop_rules: ShopRules::default(),
            tri_fuse: false,
            nodes_enabled: false,
            blocks: Vec::new(),
            nodes: Vec::new(),
            specials: Vec::new(),
            paths: vec![PathDef {
                id: "P0".into(),
                waypoints: vec![GridPos::new(0, 0), GridPos::new(7, 0)],
            }],
            waves: vec![WaveDef {
                id: "W1".into(),
                groups,
            }],
            enemy_hp_multiplier: 1.0,
            enemy_speed_multiplier: 1.0,
            barrier_effect: None,
        }
    }

    fn group(count: u32, interval: f64, path: &str) -> WaveGroup {
        WaveGroup {
            enemy: EnemyKind::Runner,
            count,
            interval,
            path: path.into(),
        }
    }

    #[test]
    fn rejects_unknown_paths() {
        let error = WaveManager::new(&stage(vec![group(1, 1.0, "P9")])).expect_err("unknown path");
        assert_eq!(error.path, "P9");
        assert_eq!(error.wave, "W1");
    }

    #[test]
    fn first_spawn_happens_on_first_tick() {
        let mut manager = WaveManager::new(&stage(vec![group(3, 0.5, "P0")])).expect("manager");
        assert_eq!(manager.start_wave(), Ok(0));
        let mut out = Vec::new();
        manager.update(|_| EnemyStatus::Advancing, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, EnemyId::new(0));
    }

    #[test]
    fn zero_count_groups_never_spawn() {
        let mut manager = WaveManager::new(&stage(vec![group(0, 0.5, "P0")])).expect("manager");
        let _ = manager.start_wave().expect("start");
        let mut out = Vec::new();
        manager.update(|_| EnemyStatus::Gone, &mut out);
        assert!(out.is_empty());
        assert!(!manager.wave_active());
        assert!(manager.all_done());
    }

    #[test]
    fn idle_manager_does_nothing() {
        let mut manager = WaveManager::new(&stage(vec![group(2, 0.5, "P0")])).expect("manager");
        let mut out = Vec::new();
        manager.update(|_| EnemyStatus::Advancing, &mut out);
        assert!(out.is_empty());
        assert_eq!(manager.current_wave(), 0);
    }
}
