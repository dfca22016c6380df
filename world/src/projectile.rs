//! Ranged attacks in flight.

use gridfuse_core::{DamageKind, EnemyId, PixelPos, ProjectileSnapshot, TICK_SECONDS};

use crate::enemy::Enemy;

/// Pixels per second travelled by every projectile.
pub const PROJECTILE_SPEED: f64 = 400.0;

/// Distance under which a projectile strikes its target.
pub const HIT_RADIUS: f64 = 8.0;

/// Homing projectile addressed at an enemy by id.
#[derive(Clone, Debug)]
pub struct Projectile {
    position: PixelPos,
    target: EnemyId,
    damage: f64,
    alive: bool,
}

impl Projectile {
    pub(crate) fn new(position: PixelPos, target: EnemyId, damage: f64) -> Self {
        Self {
            position,
            target,
            damage,
            alive: true,
        }
    }

    /// Current pixel position.
    #[must_use]
    pub fn position(&self) -> PixelPos {
        self.position
    }

    /// Enemy the projectile homes on.
    #[must_use]
    pub fn target(&self) -> EnemyId {
        self.target
    }

    /// Damage delivered on impact.
    #[must_use]
    pub fn damage(&self) -> f64 {
        self.damage
    }

    /// Whether the projectile is still in flight.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Advances one tick against the id-ordered live enemy list.
    ///
    /// A target that is missing, dead or already at the base resolves the
    /// projectile without effect.
    pub(crate) fn advance(&mut self, enemies: &mut [Enemy]) {
        if !self.alive {
            return;
        }

        let Ok(index) = enemies.binary_search_by_key(&self.target, Enemy::id) else {
            self.alive = false;
            return;
        };
        let target = &mut enemies[index];
        if !target.is_alive() || target.has_reached() {
            self.alive = false;
            return;
        }

        let aim = target.position();
        let distance = self.position.distance_to(aim);
        if distance < HIT_RADIUS {
            target.take_damage(self.damage, DamageKind::Physical);
            self.alive = false;
            return;
        }

        let step = PROJECTILE_SPEED * TICK_SECONDS;
        self.position.x += (aim.x - self.position.x) / distance * step;
        self.position.y += (aim.y - self.position.y) / distance * step;
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            position: self.position,
            target: self.target,
        }
    }
}
