//! Node-powered Barrier ability.

use gridfuse_core::{BarrierEffect, BarrierSnapshot, DamageKind, TICK_SECONDS};

use crate::enemy::Enemy;

/// Seconds before the Barrier may fire again.
pub const BARRIER_COOLDOWN: f64 = 20.0;

/// Seconds the activation window stays open.
pub const BARRIER_ACTIVE: f64 = 3.0;

/// Occupied node tiles needed to fire.
pub const NODES_REQUIRED: usize = 3;

/// Seconds of slow applied by the Slow effect.
pub const SLOW_SECONDS: f64 = 3.0;

/// Fraction of max HP dealt as magic damage by the Mark effect.
pub const MARK_FRACTION: f64 = 0.05;

#[derive(Clone, Debug, Default)]
pub(crate) struct Barrier {
    cooldown: f64,
    active: f64,
    occupied: usize,
}

impl Barrier {
    /// Counts both timers down one tick.
    pub(crate) fn tick(&mut self) {
        if self.active > 0.0 {
            self.active -= TICK_SECONDS;
        }
        if self.cooldown > 0.0 {
            self.cooldown -= TICK_SECONDS;
        }
    }

    /// Fires when off cooldown with enough occupied nodes and returns the
    /// number of enemies the effect touched.
    pub(crate) fn try_activate(
        &mut self,
        occupied: usize,
        effect: Option<BarrierEffect>,
        enemies: &mut [Enemy],
    ) -> Option<usize> {
        self.occupied = occupied;
        if self.cooldown > 0.0 || occupied < NODES_REQUIRED {
            return None;
        }
        self.cooldown = BARRIER_COOLDOWN;
        self.active = BARRIER_ACTIVE;

        let Some(effect) = effect else {
            return Some(0);
        };
        let mut affected = 0;
        for enemy in enemies
            .iter_mut()
            .filter(|enemy| enemy.is_alive() && !enemy.has_reached())
        {
            match effect {
                BarrierEffect::Slow => enemy.slow(SLOW_SECONDS),
                BarrierEffect::Mark => {
                    let damage = enemy.max_hp() * MARK_FRACTION;
                    enemy.take_damage(damage, DamageKind::Magic);
                }
                BarrierEffect::Reveal => enemy.reveal(),
            }
            affected += 1;
        }
        Some(affected)
    }

    pub(crate) fn snapshot(&self) -> BarrierSnapshot {
        BarrierSnapshot {
            cooldown: self.cooldown.max(0.0),
            active: self.active.max(0.0),
            occupied_nodes: self.occupied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfuse_core::{Catalog, EnemyId, EnemyKind, GridPos};
    use gridfuse_system_spawning::SpawnRequest;

    fn enemies() -> Vec<Enemy> {
        let catalog = Catalog::standard();
        [EnemyKind::Runner, EnemyKind::Stalker]
            .into_iter()
            .enumerate()
            .map(|(index, kind)| {
                let request = SpawnRequest {
                    enemy: EnemyId::new(index as u32),
                    kind,
                    path: 0,
                    hp_multiplier: 1.0,
                    speed_multiplier: 1.0,
                };
                Enemy::spawn(
                    &request,
                    catalog.enemy(kind).expect("def"),
                    GridPos::new(0, 0).center(),
                )
            })
            .collect()
    }

    #[test]
    fn needs_three_nodes() {
        let mut barrier = Barrier::default();
        let mut enemies = enemies();
        assert_eq!(
            barrier.try_activate(2, Some(BarrierEffect::Slow), &mut enemies),
            None
        );
        assert!(!enemies[0].is_slowed());
        assert_eq!(
            barrier.try_activate(3, Some(BarrierEffect::Slow), &mut enemies),
            Some(2)
        );
        assert!(enemies.iter().all(Enemy::is_slowed));
        assert_eq!(barrier.snapshot().cooldown, BARRIER_COOLDOWN);
        assert_eq!(barrier.snapshot().active, BARRIER_ACTIVE);
    }

    #[test]
    fn cooldown_gates_reactivation() {
        let mut barrier = Barrier::default();
        let mut enemies = enemies();
        assert!(barrier.try_activate(3, None, &mut enemies).is_some());
        barrier.tick();
        assert_eq!(barrier.try_activate(3, None, &mut enemies), None);
        for _ in 0..(20 * 60) {
            barrier.tick();
        }
        assert_eq!(barrier.try_activate(4, None, &mut enemies), Some(0));
    }

    #[test]
    fn mark_deals_magic_damage_and_reveal_unhides() {
        let mut barrier = Barrier::default();
        let mut enemies = enemies();
        let _ = barrier.try_activate(3, Some(BarrierEffect::Mark), &mut enemies);
        assert!((enemies[0].hp() - 76.0).abs() < 1e-9);

        let mut barrier = Barrier::default();
        assert!(!enemies[1].is_visible());
        let _ = barrier.try_activate(3, Some(BarrierEffect::Reveal), &mut enemies);
        assert!(enemies[1].is_visible());
    }
}
