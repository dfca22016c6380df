//! Live hostile entities walking a lane toward the base.

use gridfuse_core::{
    DamageKind, EnemyDef, EnemyId, EnemyKind, EnemySnapshot, EnemyStatus, PixelPos, TICK_SECONDS,
};
use gridfuse_system_spawning::SpawnRequest;
use gridfuse_system_targeting::EnemyProbe;

/// Speed multiplier applied while slowed.
pub const SLOW_FACTOR: f64 = 0.6;

/// Live enemy instance.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    hp: f64,
    max_hp: f64,
    position: PixelPos,
    path: usize,
    waypoint: usize,
    speed: f64,
    shield: f64,
    leak_damage: u32,
    alive: bool,
    reached: bool,
    slow_timer: f64,
    stun_timer: f64,
    visible: bool,
    leaked: bool,
    counted_for_gold: bool,
}

impl Enemy {
    /// Instantiates a requested enemy at the first waypoint of its lane.
    pub(crate) fn spawn(request: &SpawnRequest, def: &EnemyDef, start: PixelPos) -> Self {
        let hp = def.base_hp * request.hp_multiplier;
        Self {
            id: request.enemy,
            kind: def.kind,
            hp,
            max_hp: hp,
            position: start,
            path: request.path,
            waypoint: 0,
            speed: def.speed * request.speed_multiplier,
            shield: def.shield,
            leak_damage: def.leak_damage,
            alive: true,
            reached: false,
            slow_timer: 0.0,
            stun_timer: 0.0,
            visible: !def.kind.spawns_hidden(),
            leaked: false,
            counted_for_gold: false,
        }
    }

    /// Identifier allocated at spawn.
    #[must_use]
    pub fn id(&self) -> EnemyId {
        self.id
    }

    /// Archetype of the enemy.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Remaining hit points.
    #[must_use]
    pub fn hp(&self) -> f64 {
        self.hp
    }

    /// Hit points at spawn.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    /// Current pixel position.
    #[must_use]
    pub fn position(&self) -> PixelPos {
        self.position
    }

    /// Index of the lane the enemy walks.
    #[must_use]
    pub fn path(&self) -> usize {
        self.path
    }

    /// Index of the last waypoint reached.
    #[must_use]
    pub fn waypoint(&self) -> usize {
        self.waypoint
    }

    /// Pixels travelled per tick while unslowed.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether the enemy still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the enemy arrived at the base.
    #[must_use]
    pub fn has_reached(&self) -> bool {
        self.reached
    }

    /// Whether units may see the enemy.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a slow is applied.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slow_timer > 0.0
    }

    /// Whether a stun is applied.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    /// Integrity removed when the enemy leaks.
    #[must_use]
    pub fn leak_damage(&self) -> u32 {
        self.leak_damage
    }

    /// Resolution state as seen by the wave scheduler.
    #[must_use]
    pub fn status(&self) -> EnemyStatus {
        if self.reached || self.leaked {
            EnemyStatus::Leaked
        } else if !self.alive {
            EnemyStatus::Dead
        } else {
            EnemyStatus::Advancing
        }
    }

    /// Whether the enemy is alive, still walking, and visible.
    #[must_use]
    pub fn is_targetable(&self) -> bool {
        self.alive && !self.reached && self.visible
    }

    /// Fraction of the lane walked, given the lane's waypoint count.
    #[must_use]
    pub fn progress(&self, waypoint_count: usize) -> f64 {
        if waypoint_count <= 1 {
            return 0.0;
        }
        self.waypoint as f64 / (waypoint_count - 1) as f64
    }

    /// Moves one tick along the lane.
    ///
    /// A stunned enemy only counts its stun down. Snapping onto the final
    /// waypoint marks the enemy as having reached the base.
    pub fn advance(&mut self, waypoints: &[PixelPos]) {
        if !self.alive || self.reached {
            return;
        }

        if self.stun_timer > 0.0 {
            self.stun_timer -= TICK_SECONDS;
            return;
        }

        let Some(next) = waypoints.get(self.waypoint + 1).copied() else {
            self.reached = true;
            return;
        };

        let dx = next.x - self.position.x;
        let dy = next.y - self.position.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let mut travel = self.speed;
        if self.slow_timer > 0.0 {
            travel *= SLOW_FACTOR;
            self.slow_timer -= TICK_SECONDS;
        }

        if distance <= travel {
            self.position = next;
            self.waypoint += 1;
            if self.waypoint + 1 >= waypoints.len() {
                self.reached = true;
            }
        } else {
            self.position.x += dx / distance * travel;
            self.position.y += dy / distance * travel;
        }
    }

    /// Applies incoming damage, honouring the physical shield.
    pub fn take_damage(&mut self, amount: f64, kind: DamageKind) {
        if !self.alive {
            return;
        }
        let mut dealt = amount;
        if self.shield > 0.0 && kind == DamageKind::Physical {
            dealt *= 1.0 - self.shield;
        }
        self.hp -= dealt;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.alive = false;
        }
    }

    /// Stops movement for the provided duration.
    pub fn stun(&mut self, seconds: f64) {
        self.stun_timer = self.stun_timer.max(seconds);
    }

    /// Slows movement for the provided duration.
    pub fn slow(&mut self, seconds: f64) {
        self.slow_timer = seconds;
    }

    /// Makes the enemy visible for the rest of its life.
    pub fn reveal(&mut self) {
        self.visible = true;
    }

    /// Latches the leak exactly once and returns the integrity damage owed.
    pub(crate) fn take_leak(&mut self) -> Option<u32> {
        if !self.reached || !self.alive || self.leaked {
            return None;
        }
        self.leaked = true;
        self.alive = false;
        Some(self.leak_damage)
    }

    /// Latches the kill bounty exactly once.
    pub(crate) fn take_bounty(&mut self) -> bool {
        if self.alive || self.leaked || self.counted_for_gold {
            return false;
        }
        self.counted_for_gold = true;
        true
    }

    /// Whether every one-shot effect of the enemy has been settled.
    pub(crate) fn is_settled(&self) -> bool {
        self.leaked || self.counted_for_gold
    }

    pub(crate) fn probe(&self, waypoint_count: usize) -> EnemyProbe {
        EnemyProbe {
            id: self.id,
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            progress: self.progress(waypoint_count),
            targetable: self.is_targetable(),
        }
    }

    pub(crate) fn snapshot(&self, waypoint_count: usize) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            visible: self.visible,
            slowed: self.is_slowed(),
            progress: self.progress(waypoint_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfuse_core::{Catalog, GridPos};

    fn spawn(kind: EnemyKind, hp_multiplier: f64, speed_multiplier: f64) -> Enemy {
        let catalog = Catalog::standard();
        let def = catalog.enemy(kind).expect("definition");
        let request = SpawnRequest {
            enemy: EnemyId::new(1),
            kind,
            path: 0,
            hp_multiplier,
            speed_multiplier,
        };
        Enemy::spawn(&request, def, GridPos::new(0, 0).center())
    }

    fn lane(cells: &[(u32, u32)]) -> Vec<PixelPos> {
        cells
            .iter()
            .map(|&(column, row)| GridPos::new(column, row).center())
            .collect()
    }

    #[test]
    fn shield_reduces_only_physical_damage() {
        let mut enemy = spawn(EnemyKind::Shield, 1.0, 1.0);
        enemy.take_damage(50.0, DamageKind::Physical);
        assert!((enemy.hp() - 145.0).abs() < 1e-9);
        enemy.take_damage(50.0, DamageKind::Magic);
        assert!((enemy.hp() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn lethal_damage_clamps_at_zero() {
        let mut enemy = spawn(EnemyKind::Runner, 0.95, 1.0);
        assert!((enemy.max_hp() - 76.0).abs() < 1e-9);
        enemy.take_damage(38.0, DamageKind::Physical);
        assert!(enemy.is_alive());
        enemy.take_damage(100.0, DamageKind::Physical);
        assert!(!enemy.is_alive());
        assert_eq!(enemy.hp(), 0.0);
        assert_eq!(enemy.status(), EnemyStatus::Dead);
    }

    #[test]
    fn walks_and_reaches_the_final_waypoint() {
        let path = lane(&[(0, 0), (1, 0)]);
        let mut enemy = spawn(EnemyKind::Runner, 1.0, 1.0);
        let mut ticks = 0;
        while !enemy.has_reached() {
            enemy.advance(&path);
            ticks += 1;
            assert!(ticks < 1_000, "enemy never arrived");
        }
        // 60px at 1.3px per tick.
        assert_eq!(ticks, 47);
        assert_eq!(enemy.position(), path[1]);
        assert_eq!(enemy.progress(path.len()), 1.0);
    }

    #[test]
    fn single_waypoint_lane_is_reached_immediately() {
        let path = lane(&[(0, 0)]);
        let mut enemy = spawn(EnemyKind::Bruiser, 1.0, 1.0);
        enemy.advance(&path);
        assert!(enemy.has_reached());
        assert_eq!(enemy.progress(path.len()), 0.0);
    }

    #[test]
    fn stun_freezes_and_slow_reduces_travel() {
        let path = lane(&[(0, 0), (5, 0)]);
        let mut enemy = spawn(EnemyKind::Totem, 1.0, 1.0);
        enemy.stun(2.0 * TICK_SECONDS);
        enemy.advance(&path);
        enemy.advance(&path);
        assert_eq!(enemy.position(), path[0]);

        enemy.slow(1.0);
        enemy.advance(&path);
        assert!((enemy.position().x - (30.0 + 0.7 * SLOW_FACTOR)).abs() < 1e-9);
        assert!(enemy.is_slowed());
    }

    #[test]
    fn stalkers_start_hidden_until_revealed() {
        let mut enemy = spawn(EnemyKind::Stalker, 1.0, 1.0);
        assert!(!enemy.is_targetable());
        enemy.reveal();
        assert!(enemy.is_targetable());
    }

    #[test]
    fn leak_and_bounty_latch_once() {
        let path = lane(&[(0, 0)]);
        let mut leaker = spawn(EnemyKind::Hacker, 1.0, 1.0);
        leaker.advance(&path);
        assert_eq!(leaker.take_leak(), Some(2));
        assert_eq!(leaker.take_leak(), None);
        assert!(!leaker.take_bounty(), "leaked enemies never pay");
        assert!(leaker.is_settled());

        let mut victim = spawn(EnemyKind::Runner, 1.0, 1.0);
        victim.take_damage(500.0, DamageKind::Magic);
        assert_eq!(victim.take_leak(), None);
        assert!(victim.take_bounty());
        assert!(!victim.take_bounty());
        assert!(victim.is_settled());
    }
}
