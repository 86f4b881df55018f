//! Mutable board state: one placed tile per cell, with its route claims and
//! station tokens.
//!
//! A [`PlacedTile`] is replaced wholesale on each lay/upgrade; its claim and
//! token state mutates continuously and must be exactly restorable, so the
//! snapshot helpers clone the full per-cell record for the reversible-action
//! framework to capture.

use std::collections::BTreeMap;

use serde::de;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::catalog::{Connection, TileId, TileType};
use crate::error::MapError;
use crate::map::{BoardLayout, CellId};

/// Identifier of a rail network owner (a company).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OwnerId(pub u32);

/// Identifier of one train's route.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RouteId(pub u32);

/// A route's hold on one connection of a placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The claiming route.
    pub route: RouteId,
    /// Whether the owning sketch currently forms a valid route; drives the
    /// presentation color of the claimed segment.
    pub valid: bool,
}

/// A tile occupying a cell, plus its runtime claim/token state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    /// Catalog id of the occupying tile.
    pub tile: TileId,
    /// Orientation 0–5.
    pub rotation: u8,
    tokens: BTreeMap<u8, Vec<OwnerId>>,
    reservations: BTreeMap<u8, OwnerId>,
    #[serde(
        serialize_with = "serialize_claims",
        deserialize_with = "deserialize_claims"
    )]
    claims: BTreeMap<(u8, u8), Claim>,
}

impl PlacedTile {
    /// A freshly laid tile with no claims or tokens.
    pub fn new(tile: TileId, rotation: u8) -> Self {
        PlacedTile {
            tile,
            rotation: rotation % 6,
            tokens: BTreeMap::new(),
            reservations: BTreeMap::new(),
            claims: BTreeMap::new(),
        }
    }

    /// Owners holding a token at the given city.
    pub fn tokens_at(&self, city: u8) -> &[OwnerId] {
        self.tokens.get(&city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the owner holds a token at `city`, or anywhere on the tile
    /// when `city` is `None`.
    pub fn has_token(&self, owner: OwnerId, city: Option<u8>) -> bool {
        match city {
            Some(city) => self.tokens_at(city).contains(&owner),
            None => self.tokens.values().any(|held| held.contains(&owner)),
        }
    }

    /// Drop an owner's token at a city, unconditionally. Legality is decided
    /// by the placement queries before the action mutates.
    pub fn place_token(&mut self, owner: OwnerId, city: u8) {
        self.tokens.entry(city).or_default().push(owner);
    }

    /// Remove one of the owner's tokens from a city; true if one was there.
    pub fn remove_token(&mut self, owner: OwnerId, city: u8) -> bool {
        if let Some(held) = self.tokens.get_mut(&city) {
            if let Some(pos) = held.iter().position(|o| *o == owner) {
                held.remove(pos);
                if held.is_empty() {
                    self.tokens.remove(&city);
                }
                return true;
            }
        }
        false
    }

    /// Reserve a seat at a city for an owner's future token.
    pub fn reserve(&mut self, city: u8, owner: OwnerId) {
        self.reservations.insert(city, owner);
    }

    /// The owner holding a reservation at `city`, if any.
    pub fn reservation(&self, city: u8) -> Option<OwnerId> {
        self.reservations.get(&city).copied()
    }

    /// Whether any city on the tile is reserved for the owner.
    pub fn reserved_for(&self, owner: OwnerId) -> bool {
        self.reservations.values().any(|o| *o == owner)
    }

    /// Whether the city stops the owner's trains: full, with no token of the
    /// owner's and no seat left once another owner's reservation is counted.
    pub fn is_city_blocked(&self, owner: OwnerId, city: u8, capacity: u8) -> bool {
        if self.has_token(owner, Some(city)) {
            return false;
        }
        let held = self.tokens_at(city);
        let reserved_seat = self
            .reservation(city)
            .map(|o| o != owner && !held.contains(&o))
            .unwrap_or(false);
        held.len() + usize::from(reserved_seat) >= capacity as usize
    }

    /// Cities where the owner could still drop a token: a free seat remains
    /// (after counting foreign reservations) and the owner is not already
    /// present.
    pub fn open_cities(&self, owner: OwnerId, def: &TileType) -> Vec<u8> {
        def.city_endpoints()
            .filter(|city| {
                !self.has_token(owner, Some(*city))
                    && !self.is_city_blocked(owner, *city, def.capacity(*city))
            })
            .collect()
    }

    /// Record a route's claim on a connection.
    pub fn claim(&mut self, conn: Connection, route: RouteId, valid: bool) {
        self.claims.insert(conn.key(), Claim { route, valid });
    }

    /// The claim on a connection, if any route holds one.
    pub fn claim_for(&self, conn: Connection) -> Option<Claim> {
        self.claims.get(&conn.key()).copied()
    }

    /// Whether a different route already claims this connection.
    pub fn has_other_claim(&self, conn: Connection, route: RouteId) -> bool {
        self.claim_for(conn).map(|c| c.route != route).unwrap_or(false)
    }

    /// Release every claim held by the given route on this tile.
    pub fn clear_route(&mut self, route: RouteId) {
        self.claims.retain(|_, claim| claim.route != route);
    }

    /// Recolor every claim held by the given route.
    pub fn set_route_validity(&mut self, route: RouteId, valid: bool) {
        for claim in self.claims.values_mut() {
            if claim.route == route {
                claim.valid = valid;
            }
        }
    }

    /// Canonical connections of `def` not claimed by any other route.
    pub fn unclaimed_connections(&self, def: &TileType, route: RouteId) -> Vec<Connection> {
        def.connections
            .iter()
            .copied()
            .filter(|conn| !self.has_other_claim(*conn, route))
            .collect()
    }
}

/// The placement of tiles across the whole grid. Explicit snapshot parameter
/// for every query, so validators stay testable without a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    tiles: Vec<PlacedTile>,
}

impl BoardState {
    /// Place every cell's pre-printed tile at rotation 0.
    pub fn setup(layout: &BoardLayout) -> Self {
        let tiles = layout
            .topology
            .cells()
            .map(|cell| PlacedTile::new(layout.base_tile(cell), 0))
            .collect();
        BoardState { tiles }
    }

    /// The tile occupying a cell. Every cell holds exactly one tile
    /// post-setup.
    pub fn tile(&self, cell: CellId) -> &PlacedTile {
        &self.tiles[cell.index()]
    }

    /// Mutable access to the tile occupying a cell.
    pub fn tile_mut(&mut self, cell: CellId) -> &mut PlacedTile {
        &mut self.tiles[cell.index()]
    }

    /// Replace a cell's tile wholesale, returning the prior record for the
    /// action to capture.
    pub fn replace(&mut self, cell: CellId, tile: PlacedTile) -> PlacedTile {
        std::mem::replace(&mut self.tiles[cell.index()], tile)
    }

    /// Clone the full per-cell record for later restoration.
    pub fn snapshot(&self, cell: CellId) -> PlacedTile {
        self.tiles[cell.index()].clone()
    }

    /// Restore a snapshot taken from the same cell.
    pub fn restore(&mut self, cell: CellId, snapshot: PlacedTile) -> Result<(), MapError> {
        let Some(slot) = self.tiles.get_mut(cell.index()) else {
            warn!(cell = cell.index(), "restore target outside the grid");
            return Err(MapError::Invariant(format!(
                "cell index {} outside the grid",
                cell.index()
            )));
        };
        *slot = snapshot;
        Ok(())
    }
}

fn serialize_claims<S>(
    value: &BTreeMap<(u8, u8), Claim>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(value.len()))?;
    for ((a, b), claim) in value {
        map.serialize_entry(&format!("{a}-{b}"), claim)?;
    }
    map.end()
}

fn deserialize_claims<'de, D>(deserializer: D) -> Result<BTreeMap<(u8, u8), Claim>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Claim> = BTreeMap::deserialize(deserializer)?;
    let mut result = BTreeMap::new();
    for (key, claim) in raw {
        let mut parts = key.splitn(2, '-');
        let a = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(|| de::Error::custom(format!("invalid claim key '{key}'")))?;
        let b = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(|| de::Error::custom(format!("invalid claim key '{key}'")))?;
        result.insert((a, b), claim);
    }
    Ok(result)
}
