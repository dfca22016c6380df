//! TRI-FUSE merging of three identical units into one of a higher star.

use gridfuse_core::{TemplateId, UnitId, MAX_STAR};

use crate::unit::Unit;

/// Number of identical units consumed by one promotion.
const FUSE_COUNT: usize = 3;

/// Outcome of a successful fusion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fusion {
    pub(crate) survivor: UnitId,
    pub(crate) consumed: [UnitId; 2],
    pub(crate) star: u8,
}

/// Fuses the first three units sharing `template` and a star level.
///
/// Star levels are checked from the lowest upward and at most one fusion
/// happens per call. The survivor is the earliest matching unit in roster
/// order and keeps its placement.
pub(crate) fn tri_fuse(units: &mut Vec<Unit>, template: TemplateId) -> Option<Fusion> {
    for star in 1..MAX_STAR {
        let matching: Vec<usize> = units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.template() == template && unit.star() == star)
            .map(|(index, _)| index)
            .take(FUSE_COUNT)
            .collect();
        let &[keep, first, second] = matching.as_slice() else {
            continue;
        };

        let consumed = [units[first].id(), units[second].id()];
        units[keep].promote();
        let fusion = Fusion {
            survivor: units[keep].id(),
            consumed,
            star: units[keep].star(),
        };
        // Highest index first so the lower one stays valid.
        let _ = units.remove(second);
        let _ = units.remove(first);
        return Some(fusion);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfuse_core::Catalog;

    fn roster(names: &[&str]) -> Vec<Unit> {
        let catalog = Catalog::standard();
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let template = catalog.template_by_name(name).expect("template");
                let def = catalog.unit(template).expect("def");
                Unit::new(UnitId::new(index as u32 + 1), template, def, index)
            })
            .collect()
    }

    fn template(name: &str) -> TemplateId {
        Catalog::standard().template_by_name(name).expect("template")
    }

    #[test]
    fn three_copies_fuse_into_the_first() {
        let mut units = roster(&["SPARK", "MOTH", "SPARK", "SPARK"]);
        let fusion = tri_fuse(&mut units, template("SPARK")).expect("fusion");
        assert_eq!(
            fusion,
            Fusion {
                survivor: UnitId::new(1),
                consumed: [UnitId::new(3), UnitId::new(4)],
                star: 2,
            }
        );
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].star(), 2);
        assert_eq!(units[1].id(), UnitId::new(2));
    }

    #[test]
    fn two_copies_do_not_fuse() {
        let mut units = roster(&["SPARK", "SPARK", "MOTH"]);
        assert!(tri_fuse(&mut units, template("SPARK")).is_none());
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn only_one_tier_fuses_per_call() {
        let mut units = roster(&["VICE"; 9]);
        let first = tri_fuse(&mut units, template("VICE")).expect("first");
        assert_eq!(first.star, 2);
        assert_eq!(units.len(), 7);

        let _ = tri_fuse(&mut units, template("VICE")).expect("second");
        let _ = tri_fuse(&mut units, template("VICE")).expect("third");
        assert_eq!(units.len(), 3);
        let fourth = tri_fuse(&mut units, template("VICE")).expect("fourth");
        assert_eq!(fourth.star, 3);
        assert_eq!(units.len(), 1);
        assert!(tri_fuse(&mut units, template("VICE")).is_none());
    }
}
