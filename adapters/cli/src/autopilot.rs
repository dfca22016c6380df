//! Scripted player that shops and deploys between waves.

use gridfuse_core::{Command, Event, GridPos, Phase, TileType, BENCH_SLOTS, SHOP_SLOTS};
use gridfuse_world::{query, Battle, Board, Unit};

/// Upper bound on commands issued during a single frame.
const MAX_ACTIONS_PER_FRAME: usize = 32;

/// Chooses player commands from the current battle state.
#[derive(Clone, Debug)]
pub(crate) struct Autopilot {
    spots: Vec<GridPos>,
}

impl Autopilot {
    /// Ranks every placeable tile by distance to the nearest lane tile.
    /// Node tiles come first when they power the Barrier.
    pub(crate) fn new(board: &Board, nodes_first: bool) -> Self {
        let cells: Vec<GridPos> = (0..board.rows())
            .flat_map(|row| (0..board.columns()).map(move |column| GridPos::new(column, row)))
            .collect();
        let lane: Vec<GridPos> = cells
            .iter()
            .copied()
            .filter(|cell| board.tile(*cell) == Some(TileType::Path))
            .collect();

        let mut spots: Vec<(bool, u32, GridPos)> = cells
            .into_iter()
            .filter(|cell| board.can_place(*cell))
            .map(|cell| {
                let node = nodes_first && board.tile(cell) == Some(TileType::Node);
                let distance = lane
                    .iter()
                    .map(|lane_cell| lane_cell.manhattan_distance(cell))
                    .min()
                    .unwrap_or(u32::MAX);
                (!node, distance, cell)
            })
            .collect();
        spots.sort_unstable_by_key(|&(not_node, distance, cell)| {
            (not_node, distance, cell.row(), cell.column())
        });

        Self {
            spots: spots.into_iter().map(|(_, _, cell)| cell).collect(),
        }
    }

    /// Tiles in preference order.
    #[cfg(test)]
    pub(crate) fn spots(&self) -> &[GridPos] {
        &self.spots
    }

    /// Applies commands until the autopilot has nothing left to do this frame.
    pub(crate) fn act(&self, battle: &mut Battle, out_events: &mut Vec<Event>) {
        for _ in 0..MAX_ACTIONS_PER_FRAME {
            let Some(command) = self.next_command(battle) else {
                return;
            };
            let before = out_events.len();
            gridfuse_world::apply(battle, command, out_events);
            let rejected = out_events[before..]
                .iter()
                .any(|event| matches!(event, Event::CommandRejected { .. }));
            if rejected || command == Command::StartWave {
                return;
            }
        }
    }

    /// Picks the next command, or `None` while a wave is running.
    pub(crate) fn next_command(&self, battle: &Battle) -> Option<Command> {
        if query::outcome(battle).is_some() || query::phase(battle) == Phase::Wave {
            return None;
        }
        self.deploy(battle)
            .or_else(|| buy(battle))
            .or_else(|| level_up(battle))
            .or(Some(Command::StartWave))
    }

    fn deploy(&self, battle: &Battle) -> Option<Command> {
        let cap = usize::try_from(query::shop(battle).deploy_cap()).ok()?;
        if query::deployed_count(battle) >= cap {
            return None;
        }
        let units = query::units(battle);
        let unit = units
            .iter()
            .filter(|unit| !unit.is_deployed())
            .max_by_key(|unit| (strength(unit), std::cmp::Reverse(unit.id())))?;
        let cell = self
            .spots
            .iter()
            .copied()
            .find(|spot| units.iter().all(|other| other.cell() != Some(*spot)))?;
        Some(Command::PlaceUnit {
            unit: unit.id(),
            cell,
        })
    }
}

fn strength(unit: &Unit) -> u32 {
    unit.cost() * u32::from(unit.star())
}

/// Buys the priciest affordable offer while the roster has room, or any
/// offer that builds toward a fusion.
fn buy(battle: &Battle) -> Option<Command> {
    let units = query::units(battle);
    let benched = units.iter().filter(|unit| !unit.is_deployed()).count();
    if benched >= BENCH_SLOTS {
        return None;
    }
    let shop = query::shop(battle);
    let roster_full = units.len() >= usize::try_from(shop.deploy_cap()).ok()?;
    let fuses = query::stage(battle).tri_fuse;

    (0..SHOP_SLOTS)
        .filter_map(|slot| shop.can_buy(slot).ok().map(|purchase| (slot, purchase)))
        .filter(|(_, purchase)| {
            !roster_full
                || (fuses
                    && units
                        .iter()
                        .any(|unit| unit.template() == purchase.template && unit.star() == 1))
        })
        .max_by_key(|(slot, purchase)| (purchase.cost, std::cmp::Reverse(*slot)))
        .map(|(slot, _)| Command::BuyUnit { slot })
}

/// Levels the shop once the board is full.
fn level_up(battle: &Battle) -> Option<Command> {
    let shop = query::shop(battle);
    let cap = usize::try_from(shop.deploy_cap()).ok()?;
    if query::deployed_count(battle) < cap {
        return None;
    }
    shop.can_level_up().ok().map(|_| Command::LevelUpShop)
}
