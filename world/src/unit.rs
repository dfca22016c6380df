//! Live friendly units owned by the player.

use gridfuse_core::{
    AttackKind, DamageKind, Faction, GridPos, Placement, SynergyBonus, TargetMode, TemplateId,
    UnitClass, UnitDef, UnitId, UnitSnapshot, MAX_STAR, TICK_SECONDS,
};
use gridfuse_system_targeting::UnitProbe;

/// Max HP multiplier applied by a fusion.
pub const FUSE_HP_SCALE: f64 = 1.6;

/// Attack multiplier applied by a fusion.
pub const FUSE_ATK_SCALE: f64 = 1.35;

/// Unit on the bench or deployed on the board.
#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    template: TemplateId,
    cost: u32,
    faction: Faction,
    class: UnitClass,
    attack: AttackKind,
    damage: DamageKind,
    targeting: TargetMode,
    star: u8,
    placement: Placement,
    hp: f64,
    max_hp: f64,
    base_atk: f64,
    base_attack_speed: f64,
    base_range: u32,
    atk: f64,
    attack_speed: f64,
    range: u32,
    cooldown: f64,
}

impl Unit {
    /// Creates a freshly purchased one-star unit on a bench slot.
    pub(crate) fn new(id: UnitId, template: TemplateId, def: &UnitDef, bench_slot: usize) -> Self {
        Self {
            id,
            template,
            cost: def.cost,
            faction: def.faction,
            class: def.class,
            attack: def.attack,
            damage: def.damage,
            targeting: def.targeting,
            star: 1,
            placement: Placement::Bench(bench_slot),
            hp: def.hp,
            max_hp: def.hp,
            base_atk: def.atk,
            base_attack_speed: def.attack_speed,
            base_range: def.range,
            atk: def.atk,
            attack_speed: def.attack_speed,
            range: def.range,
            cooldown: 0.0,
        }
    }

    /// Identifier allocated at purchase.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Template the unit was created from.
    #[must_use]
    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Purchase price of the template.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Faction used for synergy counting.
    #[must_use]
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Class used for synergy counting.
    #[must_use]
    pub fn class(&self) -> UnitClass {
        self.class
    }

    /// Attack delivery.
    #[must_use]
    pub fn attack(&self) -> AttackKind {
        self.attack
    }

    /// Damage kind dealt by melee hits.
    #[must_use]
    pub fn damage(&self) -> DamageKind {
        self.damage
    }

    /// Current star level.
    #[must_use]
    pub fn star(&self) -> u8 {
        self.star
    }

    /// Bench slot or board tile.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Tile occupied when deployed.
    #[must_use]
    pub fn cell(&self) -> Option<GridPos> {
        self.placement.cell()
    }

    /// Whether the unit stands on the board.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        matches!(self.placement, Placement::Board(_))
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    /// Current hit points.
    #[must_use]
    pub fn hp(&self) -> f64 {
        self.hp
    }

    /// Attack damage before synergies.
    #[must_use]
    pub fn base_atk(&self) -> f64 {
        self.base_atk
    }

    /// Effective attack damage.
    #[must_use]
    pub fn atk(&self) -> f64 {
        self.atk
    }

    /// Effective attacks per second.
    #[must_use]
    pub fn attack_speed(&self) -> f64 {
        self.attack_speed
    }

    /// Effective range in tiles.
    #[must_use]
    pub fn range(&self) -> u32 {
        self.range
    }

    /// Seconds until the next attack may fire.
    #[must_use]
    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    pub(crate) fn deploy(&mut self, cell: GridPos) {
        self.placement = Placement::Board(cell);
    }

    pub(crate) fn bench(&mut self, slot: usize) {
        self.placement = Placement::Bench(slot);
    }

    /// Raises the star level and scales base stats.
    pub(crate) fn promote(&mut self) {
        self.star = (self.star + 1).min(MAX_STAR);
        self.max_hp *= FUSE_HP_SCALE;
        self.hp = self.max_hp;
        self.base_atk *= FUSE_ATK_SCALE;
    }

    /// Recomputes effective stats from base stats and a synergy bonus.
    pub(crate) fn apply_bonus(&mut self, bonus: SynergyBonus) {
        self.atk = self.base_atk * bonus.atk;
        self.attack_speed = self.base_attack_speed * bonus.attack_speed;
        self.range = self.base_range + bonus.range;
    }

    /// Counts the cooldown down one tick and reports whether the unit may act.
    pub(crate) fn cool_down(&mut self) -> bool {
        self.cooldown = (self.cooldown - TICK_SECONDS).max(0.0);
        self.cooldown <= 0.0
    }

    pub(crate) fn start_cooldown(&mut self) {
        if self.attack_speed > 0.0 {
            self.cooldown = 1.0 / self.attack_speed;
        }
    }

    pub(crate) fn probe(&self) -> Option<UnitProbe> {
        self.cell().map(|cell| UnitProbe {
            position: cell.center(),
            range: self.range,
            mode: self.targeting,
        })
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            template: self.template,
            star: self.star,
            placement: self.placement,
            hp: self.hp,
            max_hp: self.max_hp,
            atk: self.atk,
            attack_speed: self.attack_speed,
            range: self.range,
            cooldown: self.cooldown,
        }
    }
}
