//! Static tile classification and lane geometry for one stage.

use gridfuse_core::{
    BoardSnapshot, GridPos, PixelPos, SpecialTile, StageConfig, TileType, BOARD_COLUMNS,
    BOARD_ROWS,
};

use crate::StageError;

/// Immutable tile grid built once from a stage.
#[derive(Debug)]
pub struct Board {
    columns: u32,
    rows: u32,
    tiles: Vec<TileType>,
    nodes: Vec<GridPos>,
    specials: Vec<SpecialTile>,
    paths: Vec<Lane>,
}

#[derive(Debug)]
struct Lane {
    id: String,
    waypoints: Vec<PixelPos>,
}

impl Board {
    /// Classifies every tile of the stage.
    ///
    /// Later layers override earlier ones: path, then block, then node, then
    /// special. Every marked cell must lie on the board and every path needs
    /// at least one waypoint.
    pub(crate) fn from_stage(stage: &StageConfig) -> Result<Self, StageError> {
        let columns = BOARD_COLUMNS;
        let rows = BOARD_ROWS;

        if stage.paths.is_empty() {
            return Err(StageError::NoPaths);
        }

        let mut board = Self {
            columns,
            rows,
            tiles: vec![TileType::Build; (columns * rows) as usize],
            nodes: Vec::with_capacity(stage.nodes.len()),
            specials: Vec::with_capacity(stage.specials.len()),
            paths: Vec::with_capacity(stage.paths.len()),
        };

        for path in &stage.paths {
            if board.paths.iter().any(|lane| lane.id == path.id) {
                return Err(StageError::DuplicatePath {
                    path: path.id.clone(),
                });
            }
            if path.waypoints.is_empty() {
                return Err(StageError::EmptyPath {
                    path: path.id.clone(),
                });
            }
            let mut waypoints = Vec::with_capacity(path.waypoints.len());
            for &cell in &path.waypoints {
                board.mark(cell, TileType::Path)?;
                waypoints.push(cell.center());
            }
            board.paths.push(Lane {
                id: path.id.clone(),
                waypoints,
            });
        }

        for &cell in &stage.blocks {
            board.mark(cell, TileType::Block)?;
        }

        for &cell in &stage.nodes {
            board.mark(cell, TileType::Node)?;
            if !board.nodes.contains(&cell) {
                board.nodes.push(cell);
            }
        }

        for special in &stage.specials {
            board.mark(special.cell, TileType::Special)?;
            board.specials.push(*special);
        }

        Ok(board)
    }

    fn mark(&mut self, cell: GridPos, tile: TileType) -> Result<(), StageError> {
        let index = self.index(cell).ok_or(StageError::OutOfBounds {
            column: cell.column(),
            row: cell.row(),
        })?;
        self.tiles[index] = tile;
        Ok(())
    }

    fn index(&self, cell: GridPos) -> Option<usize> {
        if !cell.within(self.columns, self.rows) {
            return None;
        }
        usize::try_from(cell.row() * self.columns + cell.column()).ok()
    }

    /// Number of tile columns.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Classification of a tile, or `None` when out of bounds.
    #[must_use]
    pub fn tile(&self, cell: GridPos) -> Option<TileType> {
        self.index(cell).and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether units may be deployed onto the tile.
    #[must_use]
    pub fn can_place(&self, cell: GridPos) -> bool {
        self.tile(cell).is_some_and(TileType::is_placeable)
    }

    /// Tiles that power the Barrier.
    #[must_use]
    pub fn nodes(&self) -> &[GridPos] {
        &self.nodes
    }

    /// Marked tiles with their markings.
    #[must_use]
    pub fn specials(&self) -> &[SpecialTile] {
        &self.specials
    }

    /// Number of lanes.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Identifier of a lane.
    #[must_use]
    pub fn path_id(&self, path: usize) -> Option<&str> {
        self.paths.get(path).map(|lane| lane.id.as_str())
    }

    /// Pixel centers of a lane's waypoints from entry to base.
    #[must_use]
    pub fn waypoints(&self, path: usize) -> Option<&[PixelPos]> {
        self.paths.get(path).map(|lane| lane.waypoints.as_slice())
    }

    /// Captures the tile grid for rendering.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self.columns,
            rows: self.rows,
            tiles: self.tiles.clone(),
        }
    }
}
