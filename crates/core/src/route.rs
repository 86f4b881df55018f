//! Interactive route sketching: claim connections cell by cell and finalize
//! into a stop list for the revenue calculator.
//!
//! One builder drives one sketch. Gestures mirror the drag interaction:
//! `start` on a revenue cell, `extend` onto each hovered neighbor, `release`
//! to finalize, `cancel` to abandon. Illegal gestures are inert; the sketch
//! simply fails to grow.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::catalog::{Connection, Endpoint, TileCatalog, TileType};
use crate::map::{CellId, GridTopology};
use crate::state::{BoardState, OwnerId, RouteId};

/// Lifecycle of the sketch under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchState {
    /// No sketch; `start` begins one.
    Empty,
    /// Cells are being appended.
    Building,
    /// Released with two or more revenue stops.
    Valid,
    /// Released without a usable route; all claims were dropped.
    Invalid,
}

/// One revenue stop of a finalized route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop {
    /// The stopping cell.
    pub cell: CellId,
    /// Which city endpoint the route uses, for city stops.
    pub city: Option<u8>,
}

/// One cell-to-cell hop of a finalized route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// Departure cell.
    pub from: CellId,
    /// Arrival cell.
    pub to: CellId,
    /// Terrain surcharge on the crossed edge, for variants that charge it.
    pub surcharge: u32,
}

/// Ordered stop and leg list handed to the external revenue calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    /// Revenue stops in traversal order.
    pub stops: Vec<Stop>,
    /// Legs between consecutive sketch cells.
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone)]
struct SketchEntry {
    cell: CellId,
    connections: Vec<Connection>,
}

/// Incremental, user-driven path constructor for one train's route.
#[derive(Debug)]
pub struct RouteBuilder<'a> {
    topology: &'a GridTopology,
    catalog: &'a TileCatalog,
    route: RouteId,
    owner: OwnerId,
    stop_limit: usize,
    entries: Vec<SketchEntry>,
    state: SketchState,
}

impl<'a> RouteBuilder<'a> {
    /// Builder for one route of the given owner; `stop_limit` is the active
    /// train's stop count.
    pub fn new(
        topology: &'a GridTopology,
        catalog: &'a TileCatalog,
        route: RouteId,
        owner: OwnerId,
        stop_limit: usize,
    ) -> Self {
        RouteBuilder {
            topology,
            catalog,
            route,
            owner,
            stop_limit,
            entries: Vec::new(),
            state: SketchState::Empty,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SketchState {
        self.state
    }

    /// Cells of the sketch in traversal order.
    pub fn cells(&self) -> Vec<CellId> {
        self.entries.iter().map(|e| e.cell).collect()
    }

    /// Begin a sketch at a revenue cell, claiming every connection no other
    /// route holds. Inert on cells without revenue.
    pub fn start(&mut self, board: &mut BoardState, cell: CellId) -> bool {
        if self.revenue(board, cell) == 0 {
            trace!(cell = cell.index(), "start rejected, no revenue");
            return false;
        }
        self.start_at(board, cell);
        true
    }

    fn start_at(&mut self, board: &mut BoardState, cell: CellId) {
        self.clear_claims(board);
        let connections = match self.catalog.tile(board.tile(cell).tile) {
            Some(def) => board.tile(cell).unclaimed_connections(def, self.route),
            None => Vec::new(),
        };
        let tile = board.tile_mut(cell);
        for conn in &connections {
            tile.claim(*conn, self.route, false);
        }
        debug!(cell = cell.index(), claims = connections.len(), "sketch started");
        self.entries = vec![SketchEntry { cell, connections }];
        self.state = SketchState::Building;
    }

    /// Grow the sketch onto a neighboring cell. Re-entering an earlier cell
    /// prunes back to it first; re-entering the first cell restarts the
    /// sketch. Rejections leave the sketch untouched.
    pub fn extend(&mut self, board: &mut BoardState, cell: CellId) {
        if self.entries.is_empty() {
            return;
        }
        if let Some(index) = self.entries.iter().position(|e| e.cell == cell) {
            if self.entries.len() == index + 1 {
                return;
            }
            if index == 0 {
                self.start_at(board, cell);
                return;
            }
            for removed in self.entries.split_off(index) {
                board.tile_mut(removed.cell).clear_route(self.route);
            }
            trace!(cell = cell.index(), "sketch pruned for re-entry");
        }
        if self.revenue_stops(board) >= self.stop_limit {
            return;
        }
        let Some(last) = self.entries.last() else {
            return;
        };
        let prior = last.cell;

        let to_prior = self.routable(board, cell, self.connections_toward(board, cell, prior));
        if to_prior.is_empty() {
            trace!(cell = cell.index(), "no free connection on the entered cell");
            return;
        }
        let to_current =
            self.routable(board, prior, self.connections_toward(board, prior, cell));
        if to_current.is_empty() {
            trace!(cell = cell.index(), "no free connection on the prior cell");
            return;
        }

        // Resolve the prior cell down from its provisional claims: a middle
        // cell keeps only the through-connections, a many-city first cell
        // prefers the stationed city, a plain first cell keeps one.
        let prior_claims = if self.entries.len() > 1 {
            let before = self.entries[self.entries.len() - 2].cell;
            self.through_connections(board, prior, cell, before)
        } else {
            let tile = board.tile(prior);
            let many_cities = self
                .catalog
                .tile(tile.tile)
                .map(|def| def.city_count() > 1)
                .unwrap_or(false);
            if many_cities {
                let routed: Vec<Connection> = to_current
                    .iter()
                    .copied()
                    .filter(|conn| {
                        tile.claim_for(*conn)
                            .map(|claim| claim.route == self.route)
                            .unwrap_or(false)
                    })
                    .collect();
                let stationed = routed.iter().copied().find(|conn| {
                    conn.city()
                        .map(|city| tile.has_token(self.owner, Some(city)))
                        .unwrap_or(false)
                });
                match stationed {
                    Some(conn) => vec![conn],
                    None => routed,
                }
            } else {
                vec![to_current[0]]
            }
        };
        if prior_claims.is_empty() {
            trace!(cell = cell.index(), "no through-connection on the prior cell");
            return;
        }

        let tile = board.tile_mut(prior);
        tile.clear_route(self.route);
        for conn in &prior_claims {
            tile.claim(*conn, self.route, false);
        }
        if let Some(entry) = self.entries.last_mut() {
            entry.connections = prior_claims;
        }

        let tile = board.tile_mut(cell);
        for conn in &to_prior {
            tile.claim(*conn, self.route, false);
        }
        self.entries.push(SketchEntry {
            cell,
            connections: to_prior,
        });

        // Cap the route once the stop limit is reached.
        if self.revenue_stops(board) >= self.stop_limit {
            if let Some(entry) = self.entries.last_mut() {
                if let Some(conn) = entry.connections.first().copied() {
                    let tile = board.tile_mut(cell);
                    tile.clear_route(self.route);
                    tile.claim(conn, self.route, false);
                    entry.connections = vec![conn];
                }
            }
        }

        let valid = self.is_valid(board);
        for entry in &self.entries {
            board.tile_mut(entry.cell).set_route_validity(self.route, valid);
        }
        self.state = SketchState::Building;
    }

    /// Finalize the sketch. Trailing non-revenue cells are pruned; with
    /// fewer than two stops everything is released and the state turns
    /// `Invalid`, otherwise the summary for the revenue calculator is
    /// returned.
    pub fn release(&mut self, board: &mut BoardState) -> Option<RouteSummary> {
        while let Some(last) = self.entries.last() {
            if self.revenue(board, last.cell) > 0 {
                break;
            }
            board.tile_mut(last.cell).clear_route(self.route);
            self.entries.pop();
        }

        if !self.is_valid(board) {
            self.clear_claims(board);
            self.entries.clear();
            self.state = SketchState::Invalid;
            debug!(route = self.route.0, "sketch released invalid");
            return None;
        }

        // A city terminus still holds its provisional claim fan; keep one.
        let last_index = self.entries.len() - 1;
        let last_cell = self.entries[last_index].cell;
        let prev_cell = self.entries[last_index - 1].cell;
        let terminal_city = self
            .catalog
            .tile(board.tile(last_cell).tile)
            .map(|def| def.has_city())
            .unwrap_or(false);
        if terminal_city {
            let routable = self.routable(
                board,
                last_cell,
                self.connections_toward(board, last_cell, prev_cell),
            );
            if let Some(conn) = routable.first().copied() {
                let tile = board.tile_mut(last_cell);
                tile.clear_route(self.route);
                tile.claim(conn, self.route, true);
                self.entries[last_index].connections = vec![conn];
            }
        }
        for entry in &self.entries {
            board.tile_mut(entry.cell).set_route_validity(self.route, true);
        }
        self.state = SketchState::Valid;

        let stops = self
            .entries
            .iter()
            .filter(|entry| self.revenue(board, entry.cell) > 0)
            .map(|entry| Stop {
                cell: entry.cell,
                city: entry.connections.first().and_then(|conn| conn.city()),
            })
            .collect();
        let legs = self
            .entries
            .windows(2)
            .map(|pair| Leg {
                from: pair[0].cell,
                to: pair[1].cell,
                surcharge: self
                    .topology
                    .edge_toward(pair[0].cell, pair[1].cell)
                    .and_then(|edge| self.topology.terrain(pair[0].cell, edge))
                    .map(|terrain| terrain.cost)
                    .unwrap_or(0),
            })
            .collect();
        debug!(route = self.route.0, cells = self.entries.len(), "sketch released valid");
        Some(RouteSummary { stops, legs })
    }

    /// Abandon the sketch and release every claim it holds.
    pub fn cancel(&mut self, board: &mut BoardState) {
        self.clear_claims(board);
        self.entries.clear();
        self.state = SketchState::Empty;
    }

    fn clear_claims(&self, board: &mut BoardState) {
        for entry in &self.entries {
            board.tile_mut(entry.cell).clear_route(self.route);
        }
    }

    fn revenue(&self, board: &BoardState, cell: CellId) -> u32 {
        self.catalog
            .tile(board.tile(cell).tile)
            .and_then(|def| def.revenue)
            .unwrap_or(0)
    }

    fn revenue_stops(&self, board: &BoardState) -> usize {
        self.entries
            .iter()
            .filter(|entry| self.revenue(board, entry.cell) > 0)
            .count()
    }

    fn is_valid(&self, board: &BoardState) -> bool {
        if self.entries.len() < 2 {
            return false;
        }
        let first = self.entries[0].cell;
        let last = self.entries[self.entries.len() - 1].cell;
        self.revenue(board, first) > 0 && self.revenue(board, last) > 0
    }

    /// Canonical connections of `cell`'s tile with a placed edge facing
    /// `target`, covering every slot for multi-edge hubs.
    fn connections_toward(
        &self,
        board: &BoardState,
        cell: CellId,
        target: CellId,
    ) -> Vec<Connection> {
        let edges = self.topology.all_edges_toward(cell, target);
        if edges.is_empty() {
            return Vec::new();
        }
        let placed = board.tile(cell);
        let Some(def) = self.catalog.tile(placed.tile) else {
            return Vec::new();
        };
        def.connections
            .iter()
            .copied()
            .filter(|conn| {
                conn.endpoints().iter().any(|point| {
                    point
                        .edge()
                        .map(|e| edges.contains(&((e + placed.rotation) % 6)))
                        .unwrap_or(false)
                })
            })
            .collect()
    }

    /// Drop connections another route holds, enforcing exclusivity per
    /// connection point: once a point is taken by a foreign claim, every
    /// connection through it is off limits.
    fn routable(
        &self,
        board: &BoardState,
        cell: CellId,
        connections: Vec<Connection>,
    ) -> Vec<Connection> {
        let tile = board.tile(cell);
        let mut used_points: BTreeSet<u8> = BTreeSet::new();
        connections
            .into_iter()
            .filter(|conn| {
                let point = connection_point(*conn);
                if used_points.contains(&point) {
                    return false;
                }
                if tile.has_other_claim(*conn, self.route) {
                    used_points.insert(point);
                    return false;
                }
                true
            })
            .collect()
    }

    /// The connections a middle cell keeps: for a city tile the pair
    /// joining both neighbors through one city, otherwise the single
    /// connection spanning both facing edges. Every edge pair is tried so
    /// multi-edge hubs resolve through whichever slot has track.
    fn through_connections(
        &self,
        board: &BoardState,
        mid: CellId,
        to: CellId,
        from: CellId,
    ) -> Vec<Connection> {
        let placed = board.tile(mid);
        let Some(def) = self.catalog.tile(placed.tile) else {
            return Vec::new();
        };
        let to_edges = self.topology.all_edges_toward(mid, to);
        let from_edges = self.topology.all_edges_toward(mid, from);
        if to_edges.is_empty() || from_edges.is_empty() {
            return Vec::new();
        }
        let rotation = placed.rotation;

        if def.has_city() {
            for city in def.city_endpoints() {
                for a in &to_edges {
                    for b in &from_edges {
                        let enter = edge_city_connection(def, rotation, *a, city);
                        let leave = edge_city_connection(def, rotation, *b, city);
                        if let (Some(enter), Some(leave)) = (enter, leave) {
                            if enter != leave
                                && !placed.has_other_claim(enter, self.route)
                                && !placed.has_other_claim(leave, self.route)
                            {
                                return vec![enter, leave];
                            }
                        }
                    }
                }
            }
            Vec::new()
        } else {
            for a in &to_edges {
                for b in &from_edges {
                    let found = def.connections.iter().copied().find(|conn| {
                        let spanned: BTreeSet<u8> = conn
                            .endpoints()
                            .iter()
                            .filter_map(|p| p.edge())
                            .map(|e| (e + rotation) % 6)
                            .collect();
                        spanned.len() == 2 && spanned.contains(a) && spanned.contains(b)
                    });
                    if let Some(conn) = found {
                        if !placed.has_other_claim(conn, self.route) {
                            return vec![conn];
                        }
                    }
                }
            }
            Vec::new()
        }
    }
}

/// The endpoint that identifies a connection for exclusivity purposes: its
/// edge end, or the city for city-to-city connections.
fn connection_point(conn: Connection) -> u8 {
    let [a, b] = conn.endpoints();
    a.edge().unwrap_or_else(|| b.raw())
}

/// Canonical connection of `def` joining the given placed edge to `city`.
fn edge_city_connection(
    def: &TileType,
    rotation: u8,
    placed_edge: u8,
    city: u8,
) -> Option<Connection> {
    def.connections.iter().copied().find(|conn| {
        let [a, b] = conn.endpoints();
        let edge_matches = |p: Endpoint| {
            p.edge().map(|e| (e + rotation) % 6 == placed_edge).unwrap_or(false)
        };
        (edge_matches(a) && b.city() == Some(city)) || (edge_matches(b) && a.city() == Some(city))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Endpoint, TileCatalog, HUB_DOUBLE};
    use crate::map::{BoardLayout, GridBuilder, TerrainKind};
    use crate::state::PlacedTile;

    const OWNER: OwnerId = OwnerId(1);

    fn conn(a: u8, b: u8) -> Connection {
        Connection::new(
            Endpoint::from_raw(a).unwrap(),
            Endpoint::from_raw(b).unwrap(),
        )
    }

    /// Four cells in a row on an odd row; adjacency runs along edges 1/4.
    /// Cities at both ends, plain straights between.
    fn strip() -> (BoardLayout, [CellId; 4]) {
        let mut builder = GridBuilder::new();
        let a = builder.interior("B2", 1, 0);
        let b = builder.interior("B4", 1, 1);
        let c = builder.interior("B6", 1, 2);
        let d = builder.interior("B8", 1, 3);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        (layout, [a, b, c, d])
    }

    fn strip_state(layout: &BoardLayout, cells: [CellId; 4]) -> BoardState {
        let mut board = BoardState::setup(layout);
        board.replace(cells[0], PlacedTile::new(57, 1));
        board.replace(cells[1], PlacedTile::new(9, 1));
        board.replace(cells[2], PlacedTile::new(9, 1));
        board.replace(cells[3], PlacedTile::new(57, 1));
        board
    }

    #[test]
    fn start_requires_revenue() {
        let catalog = TileCatalog::builtin();
        let (layout, cells) = strip();
        let mut board = strip_state(&layout, cells);
        let mut builder =
            RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 4);

        assert!(!builder.start(&mut board, cells[1]));
        assert_eq!(builder.state(), SketchState::Empty);
        assert!(board.tile(cells[1]).claim_for(conn(0, 3)).is_none());

        assert!(builder.start(&mut board, cells[0]));
        assert_eq!(builder.state(), SketchState::Building);
        assert!(board.tile(cells[0]).claim_for(conn(0, 7)).is_some());
        assert!(board.tile(cells[0]).claim_for(conn(3, 7)).is_some());
    }

    #[test]
    fn reentry_prunes_back_and_first_cell_restarts() {
        let catalog = TileCatalog::builtin();
        let (layout, cells) = strip();
        let [a, b, c, d] = cells;
        let mut board = strip_state(&layout, cells);
        let mut builder =
            RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 4);

        builder.start(&mut board, a);
        builder.extend(&mut board, b);
        builder.extend(&mut board, c);
        builder.extend(&mut board, d);
        assert_eq!(builder.cells(), vec![a, b, c, d]);

        // Hovering back over b releases c and d and re-extends b.
        builder.extend(&mut board, b);
        assert_eq!(builder.cells(), vec![a, b]);
        assert!(board.tile(c).claim_for(conn(0, 3)).is_none());
        assert!(board.tile(d).claim_for(conn(3, 7)).is_none());
        assert!(board.tile(b).claim_for(conn(0, 3)).is_some());

        // Hovering the first cell restarts the sketch there.
        builder.extend(&mut board, a);
        assert_eq!(builder.cells(), vec![a]);
        assert!(board.tile(b).claim_for(conn(0, 3)).is_none());
        assert_eq!(builder.state(), SketchState::Building);
    }

    #[test]
    fn foreign_claims_block_extension() {
        let catalog = TileCatalog::builtin();
        let (layout, cells) = strip();
        let [a, b, c, d] = cells;
        let mut board = strip_state(&layout, cells);

        let mut first = RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 4);
        first.start(&mut board, a);
        first.extend(&mut board, b);
        first.extend(&mut board, c);
        first.extend(&mut board, d);
        first.release(&mut board);
        assert_eq!(first.state(), SketchState::Valid);

        // The second route cannot squeeze through c's only connection.
        let mut second =
            RouteBuilder::new(&layout.topology, catalog, RouteId(2), OWNER, 4);
        second.start(&mut board, d);
        second.extend(&mut board, c);
        assert_eq!(second.cells(), vec![d]);
        assert_eq!(
            board.tile(c).claim_for(conn(0, 3)).map(|claim| claim.route),
            Some(RouteId(1))
        );
    }

    #[test]
    fn two_hub_slots_serve_two_routes_independently() {
        let catalog = TileCatalog::builtin();
        let mut builder = GridBuilder::new();
        let west = builder.interior("B2", 1, 0);
        let mid = builder.interior("B4", 1, 1);
        let east = builder.interior("B6", 1, 2);
        let hub = builder.hub("lakeside", 2);
        // Two slots of the same hub glued to mid's edges 0 and 5.
        builder.glue(hub, 0, mid, 0);
        builder.glue(hub, 1, mid, 5);
        let mut layout = BoardLayout::new(builder.finish().unwrap(), 901);
        layout.set_base_tile(hub, HUB_DOUBLE);
        let mut board = BoardState::setup(&layout);
        board.replace(west, PlacedTile::new(57, 1));
        // Tile 16 at rotation 3 spans 0-4 and 1-5: one connection per slot.
        board.replace(mid, PlacedTile::new(16, 3));
        board.replace(east, PlacedTile::new(57, 1));

        let mut first = RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 2);
        first.start(&mut board, west);
        first.extend(&mut board, mid);
        first.extend(&mut board, hub);
        assert_eq!(first.cells(), vec![west, mid, hub]);
        assert!(first.release(&mut board).is_some());

        // The second route reaches the hub through its other slot.
        let mut second =
            RouteBuilder::new(&layout.topology, catalog, RouteId(2), OWNER, 2);
        second.start(&mut board, east);
        second.extend(&mut board, mid);
        second.extend(&mut board, hub);
        assert_eq!(second.cells(), vec![east, mid, hub]);
        assert!(second.release(&mut board).is_some());

        // Slot claims stay disjoint between the two routes.
        let hub_tile = board.tile(hub);
        assert_eq!(hub_tile.claim_for(conn(0, 7)).map(|c| c.route), Some(RouteId(1)));
        assert_eq!(hub_tile.claim_for(conn(1, 7)).map(|c| c.route), Some(RouteId(2)));
        let mid_tile = board.tile(mid);
        assert_eq!(mid_tile.claim_for(conn(1, 3)).map(|c| c.route), Some(RouteId(1)));
        assert_eq!(mid_tile.claim_for(conn(2, 4)).map(|c| c.route), Some(RouteId(2)));
    }

    #[test]
    fn many_city_start_prefers_the_stationed_city() {
        let catalog = TileCatalog::builtin();
        let mut builder = GridBuilder::new();
        let metro = builder.interior("B4", 1, 1);
        let north = builder.interior("A5", 0, 1);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        let mut board = BoardState::setup(&layout);
        // Metropolis: all four cities fan into edge 0, which faces north.
        board.replace(metro, PlacedTile::new(298, 0));
        board.tile_mut(metro).place_token(OWNER, 9);
        board.replace(north, PlacedTile::new(57, 3));

        let mut route =
            RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 2);
        route.start(&mut board, metro);
        route.extend(&mut board, north);
        assert_eq!(route.cells(), vec![metro, north]);

        // The stationed city keeps its claim; the sibling fan is released.
        let tile = board.tile(metro);
        assert!(tile.claim_for(conn(0, 9)).is_some());
        assert!(tile.claim_for(conn(0, 7)).is_none());
        assert!(tile.claim_for(conn(0, 8)).is_none());

        let summary = route.release(&mut board).unwrap();
        assert_eq!(route.state(), SketchState::Valid);
        assert_eq!(
            summary.stops,
            vec![
                Stop { cell: metro, city: Some(9) },
                Stop { cell: north, city: Some(7) },
            ]
        );
    }

    #[test]
    fn release_prunes_trailing_track_and_reports_legs() {
        let catalog = TileCatalog::builtin();
        let mut builder = GridBuilder::new();
        let a = builder.interior("B2", 1, 0);
        let b = builder.interior("B4", 1, 1);
        let c = builder.interior("B6", 1, 2);
        let d = builder.interior("B8", 1, 3);
        builder.terrain(b, 1, TerrainKind::Bridge, 40);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        let mut board = BoardState::setup(&layout);
        board.replace(a, PlacedTile::new(57, 1));
        board.replace(b, PlacedTile::new(9, 1));
        board.replace(c, PlacedTile::new(57, 1));
        board.replace(d, PlacedTile::new(9, 1));

        let mut route = RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 4);
        route.start(&mut board, a);
        route.extend(&mut board, b);
        route.extend(&mut board, c);
        route.extend(&mut board, d);

        let summary = route.release(&mut board).unwrap();
        assert_eq!(route.state(), SketchState::Valid);
        // The trailing plain cell is dropped and its claim released.
        assert_eq!(route.cells(), vec![a, b, c]);
        assert!(board.tile(d).claim_for(conn(0, 3)).is_none());
        assert_eq!(
            summary.stops,
            vec![
                Stop { cell: a, city: Some(7) },
                Stop { cell: c, city: Some(7) },
            ]
        );
        assert_eq!(
            summary.legs,
            vec![
                Leg { from: a, to: b, surcharge: 0 },
                Leg { from: b, to: c, surcharge: 40 },
            ]
        );
        // Finalized claims are colored valid.
        assert!(board.tile(a).claim_for(conn(0, 7)).unwrap().valid);
    }

    #[test]
    fn release_of_a_single_stop_invalidates_and_clears() {
        let catalog = TileCatalog::builtin();
        let (layout, cells) = strip();
        let [a, b, c, _] = cells;
        let mut board = strip_state(&layout, cells);
        // c loses its city so the sketch never gains a second stop.
        board.replace(c, PlacedTile::new(9, 1));

        let mut route = RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 4);
        route.start(&mut board, a);
        route.extend(&mut board, b);
        route.extend(&mut board, c);

        assert!(route.release(&mut board).is_none());
        assert_eq!(route.state(), SketchState::Invalid);
        assert!(route.cells().is_empty());
        for cell in [a, b, c] {
            assert!(board.tile(cell).claim_for(conn(0, 3)).is_none());
            assert!(board.tile(cell).claim_for(conn(0, 7)).is_none());
            assert!(board.tile(cell).claim_for(conn(3, 7)).is_none());
        }
    }

    #[test]
    fn stop_limit_caps_the_sketch() {
        let catalog = TileCatalog::builtin();
        let (layout, cells) = strip();
        let [a, b, c, d] = cells;
        let mut board = strip_state(&layout, cells);
        // Cities at a, c, d; limit two stops.
        board.replace(c, PlacedTile::new(57, 1));

        let mut route = RouteBuilder::new(&layout.topology, catalog, RouteId(1), OWNER, 2);
        route.start(&mut board, a);
        route.extend(&mut board, b);
        route.extend(&mut board, c);
        // Two revenue stops reached; further extension is ignored.
        route.extend(&mut board, d);
        assert_eq!(route.cells(), vec![a, b, c]);
        assert!(board.tile(d).claim_for(conn(0, 7)).is_none());
    }
}
