#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks a unit's target from snapshots of live enemies.

use gridfuse_core::{EnemyId, PixelPos, TargetMode, TILE_SIZE};

/// Targeting-relevant view of one enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProbe {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Current pixel position.
    pub position: PixelPos,
    /// Remaining hit points.
    pub hp: f64,
    /// Hit points at spawn.
    pub max_hp: f64,
    /// Fraction of the path already walked.
    pub progress: f64,
    /// Whether the enemy is alive, still walking and visible.
    pub targetable: bool,
}

/// Targeting-relevant view of one deployed unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitProbe {
    /// Pixel center of the unit's tile.
    pub position: PixelPos,
    /// Effective range in tiles.
    pub range: u32,
    /// Strategy used to rank candidates.
    pub mode: TargetMode,
}

impl UnitProbe {
    /// Range expressed in pixels, excluding the half-tile reach allowance.
    #[must_use]
    pub fn range_pixels(&self) -> f64 {
        f64::from(self.range) * TILE_SIZE
    }
}

/// Target selector that reuses a scratch buffer of candidates across units.
#[derive(Debug, Default)]
pub struct TargetSelector {
    candidates: Vec<EnemyProbe>,
}

impl TargetSelector {
    /// Creates a selector with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the enemies units may choose from this tick, in spawn order.
    ///
    /// Enemies that are not targetable are dropped immediately.
    pub fn prepare<I>(&mut self, enemies: I)
    where
        I: IntoIterator<Item = EnemyProbe>,
    {
        self.candidates.clear();
        self.candidates
            .extend(enemies.into_iter().filter(|enemy| enemy.targetable));
    }

    /// Refreshes one loaded candidate after it changed mid-tick.
    ///
    /// Candidates that stopped being targetable are dropped. Unknown ids are
    /// ignored.
    pub fn observe(&mut self, enemy: EnemyProbe) {
        let Ok(index) = self
            .candidates
            .binary_search_by_key(&enemy.id, |candidate| candidate.id)
        else {
            return;
        };
        if enemy.targetable {
            self.candidates[index] = enemy;
        } else {
            let _ = self.candidates.remove(index);
        }
    }

    /// Number of targetable enemies currently loaded.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Picks the best enemy in reach of the unit, if any.
    ///
    /// Ties keep the earliest candidate in spawn order.
    #[must_use]
    pub fn select(&self, unit: &UnitProbe) -> Option<EnemyId> {
        let range_pixels = unit.range_pixels();
        let mut best: Option<BestCandidate> = None;

        for candidate in &self.candidates {
            let distance = unit.position.distance_to(candidate.position);
            if distance > range_pixels + TILE_SIZE / 2.0 {
                continue;
            }

            let score = match unit.mode {
                TargetMode::Frontmost => candidate.progress,
                TargetMode::LowHp => {
                    if candidate.max_hp > 0.0 {
                        1.0 - candidate.hp / candidate.max_hp
                    } else {
                        0.0
                    }
                }
                TargetMode::Nearest => {
                    if range_pixels > 0.0 {
                        1.0 - distance / range_pixels
                    } else {
                        0.0
                    }
                }
            };

            let current = BestCandidate {
                score,
                enemy: candidate.id,
            };
            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.enemy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    score: f64,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        self.score > other.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfuse_core::GridPos;

    fn enemy(id: u32, cell: (u32, u32), hp: f64, progress: f64) -> EnemyProbe {
        EnemyProbe {
            id: EnemyId::new(id),
            position: GridPos::new(cell.0, cell.1).center(),
            hp,
            max_hp: 100.0,
            progress,
            targetable: true,
        }
    }

    fn unit(cell: (u32, u32), range: u32, mode: TargetMode) -> UnitProbe {
        UnitProbe {
            position: GridPos::new(cell.0, cell.1).center(),
            range,
            mode,
        }
    }

    #[test]
    fn frontmost_prefers_progress() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(1, (2, 3), 100.0, 0.2), enemy(2, (4, 3), 100.0, 0.4)]);
        let picked = selector.select(&unit((3, 2), 2, TargetMode::Frontmost));
        assert_eq!(picked, Some(EnemyId::new(2)));
    }

    #[test]
    fn low_hp_prefers_damaged_enemies() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(1, (2, 3), 30.0, 0.9), enemy(2, (4, 3), 90.0, 0.1)]);
        let picked = selector.select(&unit((3, 2), 2, TargetMode::LowHp));
        assert_eq!(picked, Some(EnemyId::new(1)));
    }

    #[test]
    fn nearest_prefers_shorter_distance() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(1, (5, 3), 100.0, 0.9), enemy(2, (3, 3), 100.0, 0.1)]);
        let picked = selector.select(&unit((3, 2), 3, TargetMode::Nearest));
        assert_eq!(picked, Some(EnemyId::new(2)));
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(7, (2, 3), 100.0, 0.5), enemy(3, (4, 3), 100.0, 0.5)]);
        let picked = selector.select(&unit((3, 2), 2, TargetMode::Frontmost));
        assert_eq!(picked, Some(EnemyId::new(7)));
    }

    #[test]
    fn reach_includes_half_a_tile() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(1, (4, 2), 100.0, 0.5)]);
        assert_eq!(
            selector.select(&unit((3, 2), 1, TargetMode::Frontmost)),
            Some(EnemyId::new(1))
        );
        // Two tiles out is 120px, beyond 60 + 30.
        selector.prepare([enemy(1, (5, 2), 100.0, 0.5)]);
        assert_eq!(selector.select(&unit((3, 2), 1, TargetMode::Frontmost)), None);
    }

    #[test]
    fn observed_changes_replace_or_drop_candidates() {
        let mut selector = TargetSelector::new();
        selector.prepare([enemy(1, (2, 3), 100.0, 0.5), enemy(2, (4, 3), 100.0, 0.5)]);

        selector.observe(enemy(2, (4, 3), 10.0, 0.5));
        assert_eq!(
            selector.select(&unit((3, 2), 2, TargetMode::LowHp)),
            Some(EnemyId::new(2))
        );

        selector.observe(EnemyProbe {
            targetable: false,
            ..enemy(2, (4, 3), 0.0, 0.5)
        });
        assert_eq!(selector.candidate_count(), 1);
        assert_eq!(
            selector.select(&unit((3, 2), 2, TargetMode::LowHp)),
            Some(EnemyId::new(1))
        );

        selector.observe(enemy(9, (3, 3), 1.0, 0.9));
        assert_eq!(selector.candidate_count(), 1);
    }

    #[test]
    fn untargetable_enemies_are_skipped() {
        let mut selector = TargetSelector::new();
        let hidden = EnemyProbe {
            targetable: false,
            ..enemy(1, (3, 3), 10.0, 0.9)
        };
        selector.prepare([hidden]);
        assert_eq!(selector.candidate_count(), 0);
        assert_eq!(selector.select(&unit((3, 2), 2, TargetMode::LowHp)), None);
    }
}
