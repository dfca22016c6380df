//! Faction and class synergies of the deployed roster.

use gridfuse_core::{SynergyBonus, SynergyCounts};

use crate::unit::Unit;

/// Counts deployed units per faction and per class.
pub(crate) fn count(units: &[Unit]) -> SynergyCounts {
    let mut counts = SynergyCounts::default();
    for unit in units.iter().filter(|unit| unit.is_deployed()) {
        counts.record(unit.faction(), unit.class());
    }
    counts
}

/// Recomputes every unit's effective stats from the current roster.
pub(crate) fn refresh(units: &mut [Unit]) -> SynergyCounts {
    let counts = count(units);
    for unit in units.iter_mut() {
        let mut bonus = SynergyBonus::NONE;
        if unit.is_deployed() {
            if counts.faction_active(unit.faction()) {
                bonus = bonus.combine(SynergyBonus::for_faction(unit.faction()));
            }
            if counts.class_active(unit.class()) {
                bonus = bonus.combine(SynergyBonus::for_class(unit.class()));
            }
        }
        unit.apply_bonus(bonus);
    }
    counts
}
