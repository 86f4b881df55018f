//! Fixed hex-grid topology: the cell arena, neighbor slots, terrain
//! surcharges, and off-board hub glue.
//!
//! Cells live in an arena addressed by [`CellId`] handles; neighbor
//! relationships are handle arrays, so the cyclic cell graph carries no
//! ownership cycles. A [`GridTopology`] is built once per game session and
//! is immutable afterwards.

pub mod board;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::TileId;
use crate::error::MapError;

/// Stable handle to a cell in the grid arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId(u32);

impl CellId {
    /// Arena index of this cell.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of terrain crossing charged when new track meets an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    /// River or lake crossing.
    Bridge,
    /// Mountain crossing; eligible for tunnel discounts.
    Tunnel,
}

/// Per-edge terrain surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    /// Surcharge added to the lay cost.
    pub cost: u32,
    /// What is being crossed.
    pub kind: TerrainKind,
}

/// Default cost of laying the first tile on a cell.
pub const DEFAULT_BASE_COST: u32 = 20;

#[derive(Debug, Clone)]
struct HubLink {
    slot: u8,
    neighbor: CellId,
    /// The interior cell's own edge index pointing at the hub.
    neighbor_edge: u8,
}

#[derive(Debug, Clone)]
struct CellData {
    name: String,
    row: i32,
    col: i32,
    hub: bool,
    neighbors: Vec<Option<CellId>>,
    links: Vec<HubLink>,
    base_cost: u32,
    terrain: HashMap<u8, Terrain>,
}

/// Incrementally assembles a [`GridTopology`].
#[derive(Debug, Default)]
pub struct GridBuilder {
    cells: Vec<CellData>,
    by_name: HashMap<String, CellId>,
}

impl GridBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, cell: CellData) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        id
    }

    /// Add an interior hex cell at a grid position. Regular neighbors are
    /// derived from positions when the builder finishes.
    pub fn interior(&mut self, name: &str, row: i32, col: i32) -> CellId {
        self.push(CellData {
            name: name.to_string(),
            row,
            col,
            hub: false,
            neighbors: vec![None; 6],
            links: Vec::new(),
            base_cost: DEFAULT_BASE_COST,
            terrain: HashMap::new(),
        })
    }

    /// Add an off-board hub cell with the given number of entry slots.
    pub fn hub(&mut self, name: &str, slots: u8) -> CellId {
        self.push(CellData {
            name: name.to_string(),
            row: 0,
            col: 0,
            hub: true,
            neighbors: vec![None; slots as usize],
            links: Vec::new(),
            base_cost: DEFAULT_BASE_COST,
            terrain: HashMap::new(),
        })
    }

    /// Override the base lay cost of a cell.
    pub fn base_cost(&mut self, cell: CellId, cost: u32) {
        self.cells[cell.index()].base_cost = cost;
    }

    /// Attach a terrain surcharge to one edge of a cell.
    pub fn terrain(&mut self, cell: CellId, edge: u8, kind: TerrainKind, cost: u32) {
        self.cells[cell.index()]
            .terrain
            .insert(edge, Terrain { cost, kind });
    }

    /// Glue one hub slot onto an interior cell's edge. A hub may occupy
    /// several slots of the same interior cell.
    pub fn glue(&mut self, hub: CellId, slot: u8, interior: CellId, interior_edge: u8) {
        self.cells[hub.index()].neighbors[slot as usize] = Some(interior);
        self.cells[hub.index()].links.push(HubLink {
            slot,
            neighbor: interior,
            neighbor_edge: interior_edge,
        });
        self.cells[interior.index()].neighbors[interior_edge as usize] = Some(hub);
    }

    /// Derive the remaining interior neighbor slots from grid positions and
    /// freeze the topology.
    pub fn finish(mut self) -> Result<GridTopology, MapError> {
        let mut by_pos: HashMap<(i32, i32), CellId> = HashMap::new();
        for (index, cell) in self.cells.iter().enumerate() {
            if !cell.hub {
                by_pos.insert((cell.row, cell.col), CellId(index as u32));
            }
        }

        for index in 0..self.cells.len() {
            if self.cells[index].hub {
                continue;
            }
            let (row, col) = (self.cells[index].row, self.cells[index].col);
            let shift = if row % 2 != 0 { 0 } else { 1 };
            let targets = [
                (row - 1, col + shift),
                (row, col + 1),
                (row + 1, col + shift),
                (row + 1, col + shift - 1),
                (row, col - 1),
                (row - 1, col + shift - 1),
            ];
            for (direction, pos) in targets.iter().enumerate() {
                if self.cells[index].neighbors[direction].is_none() {
                    self.cells[index].neighbors[direction] = by_pos.get(pos).copied();
                }
            }
        }

        for cell in &self.cells {
            if !cell.hub {
                continue;
            }
            for (slot, neighbor) in cell.neighbors.iter().enumerate() {
                if neighbor.is_none() {
                    return Err(MapError::Config(format!(
                        "hub {} slot {slot} is not glued to any cell",
                        cell.name
                    )));
                }
            }
        }

        Ok(GridTopology {
            cells: self.cells,
            by_name: self.by_name,
        })
    }
}

/// The fixed cell set and neighbor relationships. Immutable.
#[derive(Debug, Clone)]
pub struct GridTopology {
    cells: Vec<CellData>,
    by_name: HashMap<String, CellId>,
}

impl GridTopology {
    /// Number of cells in the arena.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all cell handles.
    pub fn cells(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len() as u32).map(CellId)
    }

    /// Look up a cell by display name.
    pub fn by_name(&self, name: &str) -> Option<CellId> {
        self.by_name.get(name).copied()
    }

    /// Display name of a cell.
    pub fn name(&self, cell: CellId) -> &str {
        &self.cells[cell.index()].name
    }

    /// Whether the cell is an off-board hub.
    pub fn is_hub(&self, cell: CellId) -> bool {
        self.cells[cell.index()].hub
    }

    /// Number of neighbor slots (6 for interior cells, irregular for hubs).
    pub fn slot_count(&self, cell: CellId) -> usize {
        self.cells[cell.index()].neighbors.len()
    }

    /// The neighbor behind one slot, if any.
    pub fn neighbor(&self, cell: CellId, direction: u8) -> Option<CellId> {
        self.cells[cell.index()]
            .neighbors
            .get(direction as usize)
            .copied()
            .flatten()
    }

    /// First slot of `a` that faces `b`.
    pub fn edge_toward(&self, a: CellId, b: CellId) -> Option<u8> {
        self.cells[a.index()]
            .neighbors
            .iter()
            .position(|n| *n == Some(b))
            .map(|i| i as u8)
    }

    /// Every slot of `a` that faces `b`; more than one for multi-edge hubs.
    pub fn all_edges_toward(&self, a: CellId, b: CellId) -> Vec<u8> {
        self.cells[a.index()]
            .neighbors
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == Some(b))
            .map(|(i, _)| i as u8)
            .collect()
    }

    /// Cross one slot: the neighbor behind it and the neighbor's own slot
    /// facing back. For two interior cells slot `i` faces `(i + 3) % 6`; for
    /// glued hubs the stored link decides.
    pub fn facing_edge(&self, cell: CellId, via: u8) -> Option<(CellId, u8)> {
        let neighbor = self.neighbor(cell, via)?;
        let here = &self.cells[cell.index()];
        if here.hub {
            let link = here.links.iter().find(|l| l.slot == via)?;
            return Some((neighbor, link.neighbor_edge));
        }
        let there = &self.cells[neighbor.index()];
        if there.hub {
            let link = there
                .links
                .iter()
                .find(|l| l.neighbor == cell && l.neighbor_edge == via)?;
            return Some((neighbor, link.slot));
        }
        Some((neighbor, (via + 3) % 6))
    }

    /// Terrain surcharge on one edge of a cell, if any.
    pub fn terrain(&self, cell: CellId, edge: u8) -> Option<Terrain> {
        self.cells[cell.index()].terrain.get(&edge).copied()
    }

    /// Base cost of laying the first tile on the cell.
    pub fn base_cost(&self, cell: CellId) -> u32 {
        self.cells[cell.index()].base_cost
    }
}

/// A topology together with the fixed tile printed on each cell at setup.
#[derive(Debug, Clone)]
pub struct BoardLayout {
    /// The immutable grid.
    pub topology: GridTopology,
    base_tiles: Vec<TileId>,
}

impl BoardLayout {
    /// Layout with every cell starting on the same base tile.
    pub fn new(topology: GridTopology, default_tile: TileId) -> Self {
        let base_tiles = vec![default_tile; topology.len()];
        BoardLayout {
            topology,
            base_tiles,
        }
    }

    /// Override the pre-printed tile on one cell.
    pub fn set_base_tile(&mut self, cell: CellId, tile: TileId) {
        self.base_tiles[cell.index()] = tile;
    }

    /// The pre-printed tile on a cell.
    pub fn base_tile(&self, cell: CellId) -> TileId {
        self.base_tiles[cell.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (GridTopology, [CellId; 4]) {
        let mut builder = GridBuilder::new();
        // Even row 0 and odd row 1, two columns each.
        let a = builder.interior("A1", 0, 0);
        let b = builder.interior("A3", 0, 1);
        let c = builder.interior("B0", 1, 0);
        let d = builder.interior("B2", 1, 1);
        (builder.finish().unwrap(), [a, b, c, d])
    }

    #[test]
    fn interior_neighbors_are_reciprocal() {
        let (grid, cells) = two_by_two();
        for cell in cells {
            for direction in 0..6u8 {
                if let Some(neighbor) = grid.neighbor(cell, direction) {
                    let back = grid.edge_toward(neighbor, cell);
                    assert_eq!(back, Some((direction + 3) % 6));
                    assert_eq!(grid.facing_edge(cell, direction), Some((neighbor, (direction + 3) % 6)));
                }
            }
        }
    }

    #[test]
    fn even_row_shift_matches_board_formula() {
        let (grid, [a, b, c, d]) = two_by_two();
        // Even rows shift right going down.
        assert_eq!(grid.neighbor(a, 2), Some(d));
        assert_eq!(grid.neighbor(a, 3), Some(c));
        assert_eq!(grid.neighbor(a, 1), Some(b));
        // Odd rows do not shift.
        assert_eq!(grid.neighbor(c, 0), Some(a));
        assert_eq!(grid.neighbor(d, 0), Some(b));
    }

    #[test]
    fn hub_glue_maps_both_directions() {
        let mut builder = GridBuilder::new();
        let f20 = builder.interior("F20", 0, 0);
        let g19 = builder.interior("G19", 1, 0);
        let hub = builder.hub("pittsburgh", 3);
        builder.glue(hub, 0, f20, 1);
        builder.glue(hub, 1, f20, 2);
        builder.glue(hub, 2, g19, 1);
        let grid = builder.finish().unwrap();

        assert!(grid.is_hub(hub));
        assert_eq!(grid.all_edges_toward(f20, hub), vec![1, 2]);
        assert_eq!(grid.edge_toward(f20, hub), Some(1));
        // Into the hub: the entry slot depends on which interior edge we use.
        assert_eq!(grid.facing_edge(f20, 1), Some((hub, 0)));
        assert_eq!(grid.facing_edge(f20, 2), Some((hub, 1)));
        assert_eq!(grid.facing_edge(g19, 1), Some((hub, 2)));
        // Out of the hub: back to the interior edge recorded in the link.
        assert_eq!(grid.facing_edge(hub, 0), Some((f20, 1)));
        assert_eq!(grid.facing_edge(hub, 2), Some((g19, 1)));
    }

    #[test]
    fn unglued_hub_slot_is_a_config_error() {
        let mut builder = GridBuilder::new();
        let a = builder.interior("A1", 0, 0);
        let hub = builder.hub("lonely", 2);
        builder.glue(hub, 0, a, 4);
        assert!(matches!(builder.finish(), Err(MapError::Config(_))));
    }

    #[test]
    fn terrain_and_base_cost_are_per_cell() {
        let mut builder = GridBuilder::new();
        let a = builder.interior("A1", 0, 0);
        builder.base_cost(a, 60);
        builder.terrain(a, 2, TerrainKind::Tunnel, 40);
        let grid = builder.finish().unwrap();
        assert_eq!(grid.base_cost(a), 60);
        assert_eq!(
            grid.terrain(a, 2),
            Some(Terrain {
                cost: 40,
                kind: TerrainKind::Tunnel
            })
        );
        assert_eq!(grid.terrain(a, 3), None);
    }
}
