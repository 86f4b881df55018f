//! Legality and cost of tile upgrades and station tokens.
//!
//! Every query returns an empty result for "no legal option"; the only
//! errors the placement path can raise live in the inventory (supply
//! exhaustion) and the undo machinery.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::{Connection, Endpoint, TileCatalog, TileId, TileInventory, Tier};
use crate::map::{CellId, GridTopology, TerrainKind};
use crate::search::{ConnectivitySearch, SearchMemo, SearchPath};
use crate::state::{BoardState, OwnerId};

/// Cost of dropping a station token on an unreserved city.
pub const TOKEN_COST: u32 = 80;
/// Cost when a city on the cell is reserved for the owner.
pub const RESERVED_TOKEN_COST: u32 = 40;

/// Owner-side parameters of one prospective track lay.
#[derive(Debug, Clone, Copy)]
pub struct LayContext {
    /// The company laying track.
    pub owner: OwnerId,
    /// Cash available; rotations costing more are not offered.
    pub cash: u32,
    /// Discount on the cell's base cost (owner or asset ability).
    pub base_discount: u32,
    /// Discount applied to tunnel surcharges.
    pub tunnel_discount: u32,
    /// Designated special-ability lay: base cost is waived and the
    /// reachability rule is bypassed.
    pub special_lay: bool,
}

impl LayContext {
    /// Plain lay with no discounts or abilities.
    pub fn plain(owner: OwnerId, cash: u32) -> Self {
        LayContext {
            owner,
            cash,
            base_discount: 0,
            tunnel_discount: 0,
            special_lay: false,
        }
    }
}

/// Enumerates legal rotations of candidate tiles and their costs.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator<'a> {
    topology: &'a GridTopology,
    catalog: &'a TileCatalog,
}

impl<'a> PlacementValidator<'a> {
    /// Bind the validator to a grid and tile catalog.
    pub fn new(topology: &'a GridTopology, catalog: &'a TileCatalog) -> Self {
        PlacementValidator { topology, catalog }
    }

    /// All legal rotations of `new_tile` on `cell`, mapped to their total
    /// cost. Empty means the upgrade is not currently offered: superset,
    /// off-board, reachability, affordability, or supply may each rule a
    /// rotation out, and exhausted supply rules out every rotation at once.
    /// No tie-breaking; the caller chooses among survivors.
    pub fn allowed_rotations(
        &self,
        state: &BoardState,
        inventory: &TileInventory,
        cell: CellId,
        new_tile: TileId,
        ctx: &LayContext,
    ) -> BTreeMap<u8, u32> {
        let mut allowed = BTreeMap::new();
        if inventory.remaining(new_tile) == 0 {
            debug!(tile = new_tile, "supply exhausted, no rotations offered");
            return allowed;
        }
        let placed = state.tile(cell);
        let (Some(old_def), Some(new_def)) =
            (self.catalog.tile(placed.tile), self.catalog.tile(new_tile))
        else {
            return allowed;
        };

        let base_cost = if ctx.special_lay {
            0
        } else {
            self.topology
                .base_cost(cell)
                .saturating_sub(ctx.base_discount)
        };
        if ctx.cash < base_cost {
            return allowed;
        }

        let old_placed: Vec<Connection> = old_def
            .connections
            .iter()
            .map(|c| c.rotated(placed.rotation))
            .collect();
        let old_ids: BTreeSet<(u8, u8)> = old_placed.iter().map(|c| c.key()).collect();
        let old_points: BTreeSet<u8> = old_placed
            .iter()
            .flat_map(|c| c.endpoints())
            .map(Endpoint::raw)
            .collect();
        let old_has_city = old_def.has_city();

        let search = ConnectivitySearch::new(self.topology, self.catalog);
        // Edge verdicts and the visited set are shared across all six
        // rotations of one query.
        let mut memo = SearchMemo::default();
        let mut edge_verdict: [Option<bool>; 6] = [None; 6];

        'rotation: for rotation in 0..6u8 {
            let new_placed: Vec<Connection> = new_def
                .connections
                .iter()
                .map(|c| c.rotated(rotation))
                .collect();
            let new_ids: BTreeSet<(u8, u8)> = new_placed.iter().map(|c| c.key()).collect();

            // Upgrades add track, never remove it.
            if !old_ids.is_subset(&new_ids) {
                continue;
            }
            let added_ids: BTreeSet<(u8, u8)> =
                new_ids.difference(&old_ids).copied().collect();

            // A city on the current tile widens the candidate set to every
            // connection: one proven city point vouches for the rest.
            let added: Vec<Connection> = new_placed
                .iter()
                .copied()
                .filter(|c| old_has_city || added_ids.contains(&c.key()))
                .collect();

            // Newly added track may not point off the board.
            for conn in &added {
                for endpoint in conn.endpoints() {
                    if let Endpoint::Edge(edge) = endpoint {
                        if self.topology.neighbor(cell, edge).is_none() {
                            edge_verdict[edge as usize] = Some(false);
                            continue 'rotation;
                        }
                    }
                }
            }

            // Terrain surcharges for endpoints the old tile did not touch.
            let new_points: BTreeSet<u8> = added
                .iter()
                .flat_map(|c| c.endpoints())
                .map(Endpoint::raw)
                .filter(|p| !old_points.contains(p))
                .collect();
            let surcharge: u32 = new_points
                .iter()
                .filter(|p| **p < 6)
                .map(|p| self.edge_surcharge(state, cell, *p, ctx))
                .sum();

            // At least one candidate connection must trace back to one of
            // the owner's stations.
            let mut reachable = ctx.special_lay || placed.has_token(ctx.owner, None);
            if !reachable {
                'conns: for conn in &added {
                    for endpoint in conn.endpoints() {
                        let Some(edge) = endpoint.edge() else {
                            continue;
                        };
                        match edge_verdict[edge as usize] {
                            Some(true) => {
                                reachable = true;
                                break 'conns;
                            }
                            Some(false) => continue,
                            None => {
                                // Seed the branch stack with the candidate
                                // itself so the search cannot double back
                                // through its other end.
                                let seed = conn.rotated((6 - placed.rotation) % 6);
                                let mut path: SearchPath = vec![(cell, seed.key())];
                                let ok = search.probe_edge(
                                    state, ctx.owner, cell, edge, &mut memo, &mut path,
                                );
                                edge_verdict[edge as usize] = Some(ok);
                                if ok {
                                    reachable = true;
                                    break 'conns;
                                }
                            }
                        }
                    }
                }
            }
            if !reachable {
                debug!(tile = new_tile, rotation, "no path back to a station");
                continue;
            }

            let total = base_cost + surcharge;
            if ctx.cash < total {
                continue;
            }
            allowed.insert(rotation, total);
        }
        allowed
    }

    /// Upgrade targets of the cell's current tile that are within the tier
    /// ceiling, still in supply, and legal in at least one rotation.
    pub fn upgrade_candidates(
        &self,
        state: &BoardState,
        inventory: &TileInventory,
        cell: CellId,
        ctx: &LayContext,
        max_tier: Tier,
    ) -> Vec<TileId> {
        let current = state.tile(cell).tile;
        self.catalog
            .legal_upgrades(current)
            .iter()
            .copied()
            .filter(|id| {
                self.catalog
                    .tile(*id)
                    .map(|def| def.tier <= max_tier)
                    .unwrap_or(false)
            })
            .filter(|id| inventory.remaining(*id) != 0)
            .filter(|id| {
                !self
                    .allowed_rotations(state, inventory, cell, *id, ctx)
                    .is_empty()
            })
            .collect()
    }

    /// Open cities on the cell where the owner could legally token: a free
    /// seat plus a connection back to one of the owner's stations. A city
    /// reserved for the owner skips the connectivity requirement.
    pub fn tokenable_cities(
        &self,
        state: &BoardState,
        cell: CellId,
        owner: OwnerId,
    ) -> Vec<u8> {
        let placed = state.tile(cell);
        let Some(def) = self.catalog.tile(placed.tile) else {
            return Vec::new();
        };
        let open = placed.open_cities(owner, def);
        if open.is_empty() || placed.reserved_for(owner) {
            return open;
        }
        let search = ConnectivitySearch::new(self.topology, self.catalog);
        open.into_iter()
            .filter(|city| {
                let mut memo = SearchMemo::default();
                let mut path = SearchPath::new();
                search.search_from(
                    state,
                    owner,
                    cell,
                    Endpoint::City(*city),
                    &mut memo,
                    &mut path,
                )
            })
            .collect()
    }

    /// Token cost on this cell for the owner.
    pub fn token_cost(&self, state: &BoardState, cell: CellId, owner: OwnerId) -> u32 {
        if state.tile(cell).reserved_for(owner) {
            RESERVED_TOKEN_COST
        } else {
            TOKEN_COST
        }
    }

    /// Terrain surcharge for newly meeting one physical edge. Charged only
    /// when the far side has track meeting the shared edge.
    fn edge_surcharge(
        &self,
        state: &BoardState,
        cell: CellId,
        edge: u8,
        ctx: &LayContext,
    ) -> u32 {
        let Some(terrain) = self.topology.terrain(cell, edge) else {
            return 0;
        };
        let Some((neighbor, entry_edge)) = self.topology.facing_edge(cell, edge) else {
            return 0;
        };
        let search = ConnectivitySearch::new(self.topology, self.catalog);
        if search.point_at_edge(state, neighbor, entry_edge).is_none() {
            return 0;
        }
        match terrain.kind {
            TerrainKind::Tunnel => terrain.cost.saturating_sub(ctx.tunnel_discount),
            TerrainKind::Bridge => terrain.cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TileCatalog;
    use crate::map::{board::default_board, BoardLayout, GridBuilder};
    use crate::state::PlacedTile;

    const OWNER: OwnerId = OwnerId(1);

    /// Two cells side by side on an odd row: west faces east via edge 1,
    /// east faces west via edge 4.
    fn narrow_board() -> (BoardLayout, CellId, CellId) {
        let mut builder = GridBuilder::new();
        let west = builder.interior("B2", 1, 0);
        let east = builder.interior("B4", 1, 1);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        (layout, west, east)
    }

    /// The narrow pair plus east's neighbors behind edges 2 and 5, so a
    /// tile adding the 2-5 connection passes the off-board rule.
    fn wide_board() -> (BoardLayout, [CellId; 4]) {
        let mut builder = GridBuilder::new();
        let west = builder.interior("B2", 1, 0);
        let east = builder.interior("B4", 1, 1);
        let south = builder.interior("C5", 2, 1);
        let north = builder.interior("A3", 0, 0);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        (layout, [west, east, south, north])
    }

    /// East holds a plain straight along edges 1-4; south holds a stationed
    /// city whose track meets east's edge 2.
    fn wide_state(layout: &BoardLayout, east: CellId, south: CellId) -> BoardState {
        let mut state = BoardState::setup(layout);
        state.replace(east, PlacedTile::new(9, 1));
        state.replace(south, PlacedTile::new(57, 2));
        state.tile_mut(south).place_token(OWNER, 7);
        state
    }

    #[test]
    fn added_track_may_not_point_off_the_board() {
        let catalog = TileCatalog::builtin();
        let (layout, west, east) = narrow_board();
        let mut state = BoardState::setup(&layout);
        state.replace(west, PlacedTile::new(57, 1));
        state.tile_mut(west).place_token(OWNER, 7);
        state.replace(east, PlacedTile::new(9, 1));

        let inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        // Tile 19 keeps the 1-4 straight in rotations 1 and 4 but its new
        // connection lands on edges 2/5, and neither edge has a neighbor
        // here. The rotations keeping 0-3 instead fail the superset rule.
        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        assert!(allowed.is_empty());
    }

    #[test]
    fn upgrade_keeps_existing_track_and_pays_base_cost() {
        let catalog = TileCatalog::builtin();
        let (layout, [_, east, south, _]) = wide_board();
        let state = wide_state(&layout, east, south);
        let inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        let expected: BTreeMap<u8, u32> = [(1, 20), (4, 20)].into_iter().collect();
        assert_eq!(allowed, expected);

        // Every surviving rotation carries the old 1-4 connection forward.
        for rotation in allowed.keys() {
            let ids: BTreeSet<(u8, u8)> = catalog
                .connections_at(19, *rotation)
                .into_iter()
                .map(Connection::key)
                .collect();
            assert!(ids.contains(&(1, 4)));
        }
    }

    #[test]
    fn unreachable_lay_is_only_offered_as_a_special_lay() {
        let catalog = TileCatalog::builtin();
        let (layout, [_, east, south, _]) = wide_board();
        let mut state = BoardState::setup(&layout);
        // Same geometry as the stationed case but no token anywhere.
        state.replace(east, PlacedTile::new(9, 1));
        state.replace(south, PlacedTile::new(57, 2));

        let inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        assert!(allowed.is_empty());

        // The special lay bypasses reachability and waives the base cost.
        let special = LayContext {
            special_lay: true,
            ..ctx
        };
        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &special);
        assert_eq!(allowed.keys().copied().collect::<Vec<_>>(), vec![1, 4]);
        assert!(allowed.values().all(|cost| *cost == 0));
    }

    #[test]
    fn terrain_surcharge_and_affordability() {
        let catalog = TileCatalog::builtin();
        let mut builder = GridBuilder::new();
        builder.interior("B2", 1, 0);
        let east = builder.interior("B4", 1, 1);
        let south = builder.interior("C5", 2, 1);
        builder.interior("A3", 0, 0);
        builder.terrain(east, 2, TerrainKind::Tunnel, 40);
        let layout = BoardLayout::new(builder.finish().unwrap(), 901);
        let state = wide_state(&layout, east, south);

        let inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        // The stationed city south of east has track meeting the shared
        // edge, so the tunnel is charged on top of the base cost.
        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        assert_eq!(allowed.get(&1), Some(&60));

        let discounted = LayContext {
            tunnel_discount: 20,
            ..ctx
        };
        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &discounted);
        assert_eq!(allowed.get(&1), Some(&40));

        // Enough for the base cost but not the tunnel: nothing is offered.
        let poor = LayContext::plain(OWNER, 30);
        let allowed = validator.allowed_rotations(&state, &inventory, east, 19, &poor);
        assert!(allowed.is_empty());
    }

    #[test]
    fn exhausted_supply_rules_out_every_rotation() {
        let catalog = TileCatalog::builtin();
        let (layout, [_, east, south, _]) = wide_board();
        let state = wide_state(&layout, east, south);
        let mut inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        let before = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        assert!(!before.is_empty());

        // Both copies leave the supply.
        inventory.take(19).unwrap();
        inventory.take(19).unwrap();
        assert!(validator
            .allowed_rotations(&state, &inventory, east, 19, &ctx)
            .is_empty());

        // Undoing a lay puts the copy back and reopens the offer.
        inventory.put_back(19);
        let restored = validator.allowed_rotations(&state, &inventory, east, 19, &ctx);
        assert_eq!(restored, before);
    }

    #[test]
    fn upgrade_candidates_respect_the_tier_ceiling() {
        let catalog = TileCatalog::builtin();
        let layout = default_board().unwrap();
        let g9 = layout.topology.by_name("G9").unwrap();
        let mut state = BoardState::setup(&layout);
        // A stationed yellow city in open terrain, all six neighbors
        // present.
        state.replace(g9, PlacedTile::new(57, 0));
        state.tile_mut(g9).place_token(OWNER, 7);

        let inventory = TileInventory::new(catalog);
        let validator = PlacementValidator::new(&layout.topology, catalog);
        let ctx = LayContext::plain(OWNER, 1_000);

        let green = validator.upgrade_candidates(&state, &inventory, g9, &ctx, Tier::Green);
        assert_eq!(green, vec![14, 15, 619]);

        let yellow =
            validator.upgrade_candidates(&state, &inventory, g9, &ctx, Tier::Yellow);
        assert!(yellow.is_empty());
    }

    #[test]
    fn tokenable_cities_need_connectivity_or_a_reservation() {
        let catalog = TileCatalog::builtin();
        let (layout, west, east) = narrow_board();
        let mut state = BoardState::setup(&layout);
        state.replace(west, PlacedTile::new(57, 1));
        state.tile_mut(west).place_token(OWNER, 7);
        state.replace(east, PlacedTile::new(57, 1));

        let validator = PlacementValidator::new(&layout.topology, catalog);
        let stranger = OwnerId(5);

        // The owner traces east's city back to its west station.
        assert_eq!(validator.tokenable_cities(&state, east, OWNER), vec![7]);
        // The stranger has no station anywhere.
        assert!(validator.tokenable_cities(&state, east, stranger).is_empty());

        // A reservation substitutes for connectivity and halves the cost.
        state.tile_mut(east).reserve(7, stranger);
        assert_eq!(validator.tokenable_cities(&state, east, stranger), vec![7]);
        assert_eq!(
            validator.token_cost(&state, east, stranger),
            RESERVED_TOKEN_COST
        );
        assert_eq!(validator.token_cost(&state, east, OWNER), TOKEN_COST);
        // The foreign reservation consumes the city's only seat.
        assert!(validator.tokenable_cities(&state, east, OWNER).is_empty());
    }
}
