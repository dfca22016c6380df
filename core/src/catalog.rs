//! Static balancing tables for enemies, unit templates, shop odds and synergies.

use crate::{AttackKind, DamageKind, EnemyKind, Faction, TargetMode, TemplateId, UnitClass};

/// Number of deployed members required before a faction or class synergy applies.
pub const SYNERGY_THRESHOLD: u32 = 2;

/// Number of distinct unit cost tiers the shop can roll.
pub const COST_TIERS: usize = 4;

/// Static description of an enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyDef {
    /// Archetype described by the entry.
    pub kind: EnemyKind,
    /// Display name.
    pub name: &'static str,
    /// Hit points before stage multipliers.
    pub base_hp: f64,
    /// Pixels travelled per tick before stage multipliers.
    pub speed: f64,
    /// Integrity removed when the enemy reaches the base.
    pub leak_damage: u32,
    /// Fraction of physical damage ignored.
    pub shield: f64,
}

/// Static description of a purchasable unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitDef {
    /// Display name, unique within the catalog.
    pub name: &'static str,
    /// Gold price and shop tier.
    pub cost: u32,
    /// Faction used for synergy counting.
    pub faction: Faction,
    /// Class used for synergy counting.
    pub class: UnitClass,
    /// Base hit points.
    pub hp: f64,
    /// Base attack damage.
    pub atk: f64,
    /// Base attacks per second.
    pub attack_speed: f64,
    /// Base range in tiles.
    pub range: u32,
    /// Flat armor rating.
    pub armor: u32,
    /// Attack delivery.
    pub attack: AttackKind,
    /// Damage kind applied on melee hits.
    pub damage: DamageKind,
    /// Target selection strategy.
    pub targeting: TargetMode,
}

/// Multipliers applied to a deployed unit's base stats by active synergies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynergyBonus {
    /// Attack damage multiplier.
    pub atk: f64,
    /// Attack speed multiplier.
    pub attack_speed: f64,
    /// Extra range in tiles.
    pub range: u32,
}

impl SynergyBonus {
    /// Bonus that leaves stats unchanged.
    pub const NONE: Self = Self {
        atk: 1.0,
        attack_speed: 1.0,
        range: 0,
    };

    /// Bonus granted to members of an active faction.
    #[must_use]
    pub const fn for_faction(faction: Faction) -> Self {
        match faction {
            Faction::Street | Faction::Exorcist => Self {
                atk: 1.10,
                ..Self::NONE
            },
            Faction::Coven | Faction::ArcTech => Self {
                attack_speed: 1.10,
                ..Self::NONE
            },
        }
    }

    /// Bonus granted to members of an active class.
    #[must_use]
    pub const fn for_class(class: UnitClass) -> Self {
        match class {
            UnitClass::Vanguard => Self {
                atk: 1.10,
                ..Self::NONE
            },
            UnitClass::Marksman => Self {
                range: 1,
                ..Self::NONE
            },
            UnitClass::Caster => Self {
                atk: 1.15,
                ..Self::NONE
            },
            UnitClass::Engineer => Self {
                attack_speed: 1.15,
                ..Self::NONE
            },
            UnitClass::Support => Self {
                attack_speed: 1.10,
                ..Self::NONE
            },
        }
    }

    /// Stacks two bonuses multiplicatively.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            atk: self.atk * other.atk,
            attack_speed: self.attack_speed * other.attack_speed,
            range: self.range + other.range,
        }
    }
}

impl Default for SynergyBonus {
    fn default() -> Self {
        Self::NONE
    }
}

/// Read-only balancing data shared by every battle.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    enemies: Vec<EnemyDef>,
    units: Vec<UnitDef>,
    shop_weights: Vec<[f64; COST_TIERS]>,
}

impl Catalog {
    /// Builds the standard chapter-one tables.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            enemies: standard_enemies(),
            units: standard_units(),
            shop_weights: vec![
                [1.0, 0.0, 0.0, 0.0],
                [0.75, 0.25, 0.0, 0.0],
                [0.55, 0.30, 0.15, 0.0],
                [0.40, 0.30, 0.20, 0.10],
                [0.30, 0.30, 0.25, 0.15],
                [0.20, 0.25, 0.30, 0.25],
            ],
        }
    }

    /// Looks up the definition of an enemy archetype.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyDef> {
        self.enemies.iter().find(|def| def.kind == kind)
    }

    /// Looks up a unit template.
    #[must_use]
    pub fn unit(&self, template: TemplateId) -> Option<&UnitDef> {
        self.units.get(template.index())
    }

    /// Iterates every unit template alongside its identifier.
    pub fn units(&self) -> impl Iterator<Item = (TemplateId, &UnitDef)> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter_map(|(index, def)| u16::try_from(index).ok().map(|id| (TemplateId::new(id), def)))
    }

    /// Resolves a template by its display name.
    #[must_use]
    pub fn template_by_name(&self, name: &str) -> Option<TemplateId> {
        self.units()
            .find(|(_, def)| def.name == name)
            .map(|(id, _)| id)
    }

    /// Iterates the templates that share the provided cost, in catalog order.
    pub fn templates_with_cost(&self, cost: u32) -> impl Iterator<Item = TemplateId> + '_ {
        self.units()
            .filter(move |(_, def)| def.cost == cost)
            .map(|(id, _)| id)
    }

    /// Roll weights for costs one through four at the provided shop level.
    ///
    /// Unknown levels fall back to the level one weights.
    #[must_use]
    pub fn shop_weights(&self, level: u32) -> [f64; COST_TIERS] {
        level
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.shop_weights.get(index))
            .or_else(|| self.shop_weights.first())
            .copied()
            .unwrap_or([1.0, 0.0, 0.0, 0.0])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_enemies() -> Vec<EnemyDef> {
    let def = |kind, name, base_hp, speed, leak_damage| EnemyDef {
        kind,
        name,
        base_hp,
        speed,
        leak_damage,
        shield: 0.0,
    };
    vec![
        def(EnemyKind::Runner, "RUNNER", 80.0, 1.3, 1),
        def(EnemyKind::Bruiser, "BRUISER", 220.0, 0.8, 2),
        EnemyDef {
            shield: 0.3,
            ..def(EnemyKind::Shield, "SHIELD", 180.0, 0.9, 2)
        },
        def(EnemyKind::Splitter, "SPLITTER", 140.0, 1.0, 1),
        def(EnemyKind::Flyer, "FLYER", 100.0, 1.2, 1),
        def(EnemyKind::Stalker, "STALKER", 110.0, 1.1, 1),
        def(EnemyKind::Hacker, "HACKER", 160.0, 0.95, 2),
        def(EnemyKind::Charger, "CHARGER", 240.0, 1.15, 3),
        def(EnemyKind::Totem, "TOTEM", 300.0, 0.7, 3),
        def(EnemyKind::Gatekeeper, "GATEKEEPER", 2000.0, 0.5, 99),
    ]
}

#[allow(clippy::too_many_arguments)]
const fn unit(
    name: &'static str,
    cost: u32,
    faction: Faction,
    class: UnitClass,
    stats: (f64, f64, f64, u32, u32),
    attack: AttackKind,
    damage: DamageKind,
    targeting: TargetMode,
) -> UnitDef {
    let (hp, atk, attack_speed, range, armor) = stats;
    UnitDef {
        name,
        cost,
        faction,
        class,
        hp,
        atk,
        attack_speed,
        range,
        armor,
        attack,
        damage,
        targeting,
    }
}

fn standard_units() -> Vec<UnitDef> {
    use AttackKind::{Melee, Ranged};
    use DamageKind::{Magic, Physical};
    use Faction::{ArcTech, Coven, Exorcist, Street};
    use TargetMode::{Frontmost, LowHp, Nearest};
    use UnitClass::{Caster, Engineer, Marksman, Support, Vanguard};

    vec![
        unit("MOTH", 1, Street, Vanguard, (520.0, 38.0, 1.0, 1, 10), Melee, Physical, Frontmost),
        unit("VICE", 1, Street, Marksman, (280.0, 55.0, 1.2, 3, 3), Ranged, Physical, LowHp),
        unit("KNOT", 1, Coven, Caster, (300.0, 48.0, 0.9, 3, 4), Ranged, Magic, Frontmost),
        unit("TAR", 1, Coven, Support, (350.0, 30.0, 0.8, 2, 5), Ranged, Magic, Frontmost),
        unit("SPARK", 1, ArcTech, Engineer, (300.0, 42.0, 1.0, 2, 5), Ranged, Physical, Nearest),
        unit("GLINT", 1, ArcTech, Marksman, (260.0, 58.0, 1.3, 4, 2), Ranged, Physical, Frontmost),
        unit("HALO", 1, Exorcist, Support, (380.0, 25.0, 0.7, 2, 6), Ranged, Magic, Nearest),
        unit("IRON", 1, Exorcist, Vanguard, (580.0, 32.0, 0.9, 1, 14), Melee, Physical, Frontmost),
        unit("GLASS", 2, Street, Marksman, (320.0, 72.0, 1.1, 4, 3), Ranged, Physical, LowHp),
        unit("INK", 2, Coven, Caster, (360.0, 60.0, 0.85, 3, 5), Ranged, Magic, Frontmost),
        unit("PATCH", 2, ArcTech, Engineer, (400.0, 35.0, 0.8, 2, 8), Ranged, Physical, Nearest),
        unit("VOLT", 2, ArcTech, Caster, (340.0, 65.0, 0.9, 3, 4), Ranged, Magic, Frontmost),
        unit("LAMP", 2, Exorcist, Marksman, (300.0, 68.0, 1.2, 4, 3), Ranged, Magic, Frontmost),
        unit("LITANY", 2, Exorcist, Caster, (380.0, 58.0, 0.8, 3, 6), Ranged, Magic, Frontmost),
        unit("COIN", 3, Street, Support, (420.0, 40.0, 0.7, 2, 6), Ranged, Physical, Nearest),
        unit("DOLL", 3, Coven, Caster, (450.0, 55.0, 0.75, 3, 7), Ranged, Magic, Frontmost),
        unit("NODE", 3, ArcTech, Support, (480.0, 30.0, 0.6, 2, 9), Ranged, Physical, Nearest),
        unit("ORISON", 4, Exorcist, Caster, (500.0, 85.0, 0.6, 3, 8), Ranged, Magic, Frontmost),
    ]
}
