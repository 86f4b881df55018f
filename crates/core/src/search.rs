//! Pure reachability queries over the grid plus currently placed tiles.
//!
//! The graph's nodes are (cell, canonical local point) pairs. Intra-cell
//! edges come from the placed tile's connections; cross-cell edges map a
//! canonical edge endpoint through the tile rotation and the grid's facing
//! relation into the neighbor's entry point.
//!
//! Cycle avoidance is deliberately asymmetric: a permanent visited set keyed
//! by *directional* connection id persists across sibling branches, while a
//! per-branch path stack of *undirected* ids is pushed before and popped
//! after each connection. This stops infinite loops on city-dense tiles
//! without collapsing disjoint branches that touch the same cell from
//! different directions. Reachability only; no shortest-path guarantee.

use std::collections::HashSet;

use tracing::trace;

use crate::catalog::{Endpoint, TileCatalog};
use crate::map::{CellId, GridTopology};
use crate::state::{BoardState, OwnerId};

/// Permanent visited set for one search (or one batch of related searches,
/// such as the six rotations of a placement query).
#[derive(Debug, Default)]
pub struct SearchMemo {
    visited: HashSet<(CellId, u8, u8)>,
}

/// Root-to-leaf stack of undirected connection ids for the current branch.
pub type SearchPath = Vec<(CellId, (u8, u8))>;

/// Depth-first station reachability over the placed-tile network.
#[derive(Debug, Clone, Copy)]
pub struct ConnectivitySearch<'a> {
    topology: &'a GridTopology,
    catalog: &'a TileCatalog,
}

impl<'a> ConnectivitySearch<'a> {
    /// Bind the search to a grid and tile catalog.
    pub fn new(topology: &'a GridTopology, catalog: &'a TileCatalog) -> Self {
        ConnectivitySearch { topology, catalog }
    }

    /// Whether a path of connections leads from `point` on `cell` to a city
    /// bearing one of the owner's station tokens.
    pub fn reaches_station(
        &self,
        state: &BoardState,
        owner: OwnerId,
        cell: CellId,
        point: Endpoint,
    ) -> bool {
        let mut memo = SearchMemo::default();
        let mut path = SearchPath::new();
        self.search_from(state, owner, cell, point, &mut memo, &mut path)
    }

    /// The canonical endpoint of the cell's tile meeting the given physical
    /// edge, if any track does.
    pub(crate) fn point_at_edge(
        &self,
        state: &BoardState,
        cell: CellId,
        placed_edge: u8,
    ) -> Option<Endpoint> {
        let placed = state.tile(cell);
        let def = self.catalog.tile(placed.tile)?;
        for conn in &def.connections {
            for endpoint in conn.endpoints() {
                if let Endpoint::Edge(e) = endpoint {
                    if (e + placed.rotation) % 6 == placed_edge {
                        return Some(endpoint);
                    }
                }
            }
        }
        None
    }

    /// Cross the given physical edge into the neighbor and continue the
    /// search from the entry point there. False when there is no neighbor or
    /// no track meets the far side.
    pub(crate) fn probe_edge(
        &self,
        state: &BoardState,
        owner: OwnerId,
        cell: CellId,
        placed_edge: u8,
        memo: &mut SearchMemo,
        path: &mut SearchPath,
    ) -> bool {
        let Some((neighbor, entry_edge)) = self.topology.facing_edge(cell, placed_edge) else {
            return false;
        };
        let Some(entry) = self.point_at_edge(state, neighbor, entry_edge) else {
            return false;
        };
        self.search_from(state, owner, neighbor, entry, memo, path)
    }

    /// Recursive step: try every untried connection touching `point`.
    pub(crate) fn search_from(
        &self,
        state: &BoardState,
        owner: OwnerId,
        cell: CellId,
        point: Endpoint,
        memo: &mut SearchMemo,
        path: &mut SearchPath,
    ) -> bool {
        let placed = state.tile(cell);
        let Some(def) = self.catalog.tile(placed.tile) else {
            return false;
        };

        for conn in def.connections.iter().filter(|c| c.touches(point)) {
            let Some(other) = conn.other(point) else {
                continue;
            };
            let directional = (cell, point.raw(), other.raw());
            let undirected = (cell, conn.key());
            if memo.visited.contains(&directional) || path.contains(&undirected) {
                continue;
            }
            memo.visited.insert(directional);
            path.push(undirected);

            let found = match other {
                Endpoint::City(city) => {
                    if placed.has_token(owner, Some(city)) {
                        true
                    } else if placed.is_city_blocked(owner, city, def.capacity(city)) {
                        // Blocked is failure for this branch, not success.
                        false
                    } else {
                        self.search_from(state, owner, cell, other, memo, path)
                    }
                }
                Endpoint::Edge(edge) => {
                    let placed_edge = (edge + placed.rotation) % 6;
                    self.probe_edge(state, owner, cell, placed_edge, memo, path)
                }
            };

            path.pop();
            if found {
                trace!(cell = cell.index(), point = point.raw(), "station reached");
                return true;
            }
        }
        false
    }
}
