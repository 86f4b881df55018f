//! Static tile-type definitions, rotation algebra, and the tile supply.
//!
//! A tile is described once in canonical orientation; placing it at a
//! rotation maps edge endpoints by `(e + rotation) % 6` while city endpoints
//! stay fixed. The catalog also carries the upgrade graph and the per-type
//! supply counts used by the placement validator.

mod data;

pub use data::{
    BASE_CITY, BASE_METROPOLIS, BASE_PLAIN, BASE_Z_CITY, HUB_DOUBLE, HUB_SINGLE, HUB_TRIPLE,
};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MapError;

/// Numeric identifier of a tile type.
pub type TileId = u32;

/// Lowest endpoint index that names a tile-local city rather than an edge.
pub const CITY_BASE: u8 = 7;

/// Upgrade rank of a tile. `Invisible` marks the pre-printed base tiles that
/// exist only at setup and sit below yellow in the upgrade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Pre-printed base tile, upgradeable to yellow.
    Invisible,
    /// First laid tier.
    Yellow,
    /// Second tier.
    Green,
    /// Third tier.
    Brown,
    /// Final tier.
    Gray,
}

/// One end of a connection in a tile's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Hex edge index 0–5.
    Edge(u8),
    /// Tile-local city index, always ≥ [`CITY_BASE`].
    City(u8),
}

impl Endpoint {
    /// Parse a raw endpoint index. Index 6 is unused and rejected.
    pub fn from_raw(raw: u8) -> Result<Self, MapError> {
        match raw {
            0..=5 => Ok(Endpoint::Edge(raw)),
            6 => Err(MapError::Config("endpoint index 6 is reserved".into())),
            city => Ok(Endpoint::City(city)),
        }
    }

    /// Raw index of this endpoint.
    pub fn raw(self) -> u8 {
        match self {
            Endpoint::Edge(e) => e,
            Endpoint::City(c) => c,
        }
    }

    /// Edge index, if this endpoint is an edge.
    pub fn edge(self) -> Option<u8> {
        match self {
            Endpoint::Edge(e) => Some(e),
            Endpoint::City(_) => None,
        }
    }

    /// City index, if this endpoint is a city.
    pub fn city(self) -> Option<u8> {
        match self {
            Endpoint::Edge(_) => None,
            Endpoint::City(c) => Some(c),
        }
    }

    /// Apply a tile rotation: edges shift by `(e + rotation) % 6`, cities are
    /// rotation-invariant.
    pub fn rotated(self, rotation: u8) -> Self {
        match self {
            Endpoint::Edge(e) => Endpoint::Edge((e + rotation) % 6),
            Endpoint::City(c) => Endpoint::City(c),
        }
    }
}

/// Unordered pair of endpoints representing one physical track segment.
/// Canonical form keeps the smaller endpoint first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    a: Endpoint,
    b: Endpoint,
}

impl Connection {
    /// Build a connection, canonicalizing endpoint order.
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        if a.raw() <= b.raw() {
            Connection { a, b }
        } else {
            Connection { a: b, b: a }
        }
    }

    /// Both endpoints, smaller first.
    pub fn endpoints(self) -> [Endpoint; 2] {
        [self.a, self.b]
    }

    /// Canonical identity key for set membership and claim storage.
    pub fn key(self) -> (u8, u8) {
        (self.a.raw(), self.b.raw())
    }

    /// The connection under a tile rotation, re-canonicalized.
    pub fn rotated(self, rotation: u8) -> Self {
        Connection::new(self.a.rotated(rotation), self.b.rotated(rotation))
    }

    /// Whether either endpoint equals `point`.
    pub fn touches(self, point: Endpoint) -> bool {
        self.a == point || self.b == point
    }

    /// The far endpoint when entering through `point`.
    pub fn other(self, point: Endpoint) -> Option<Endpoint> {
        if self.a == point {
            Some(self.b)
        } else if self.b == point {
            Some(self.a)
        } else {
            None
        }
    }

    /// The city endpoint, if one end is a city.
    pub fn city(self) -> Option<u8> {
        self.a.city().or_else(|| self.b.city())
    }
}

/// Immutable catalog entry for one tile type.
#[derive(Debug, Clone)]
pub struct TileType {
    /// Catalog identifier.
    pub id: TileId,
    /// Upgrade rank.
    pub tier: Tier,
    /// Revenue earned by a train stopping here, if any.
    pub revenue: Option<u32>,
    /// Station-token capacity per city; index `i` is city endpoint `7 + i`.
    pub city_capacities: Vec<u8>,
    /// Canonical connections at rotation 0.
    pub connections: Vec<Connection>,
}

impl TileType {
    /// Whether the tile hosts at least one city.
    pub fn has_city(&self) -> bool {
        !self.city_capacities.is_empty()
    }

    /// Number of cities on the tile.
    pub fn city_count(&self) -> usize {
        self.city_capacities.len()
    }

    /// Raw endpoint indices of the tile's cities.
    pub fn city_endpoints(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.city_capacities.len()).map(|i| CITY_BASE + i as u8)
    }

    /// Token capacity of the given city endpoint (0 for unknown cities).
    pub fn capacity(&self, city: u8) -> u8 {
        city.checked_sub(CITY_BASE)
            .and_then(|i| self.city_capacities.get(i as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// Raw, serializable form of a single tile definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTile {
    /// Catalog identifier.
    pub id: TileId,
    /// Upgrade rank.
    pub tier: Tier,
    /// Stop revenue.
    #[serde(default)]
    pub revenue: Option<u32>,
    /// Token capacity per city.
    #[serde(default)]
    pub cities: Vec<u8>,
    /// Connections as raw endpoint pairs.
    #[serde(default)]
    pub connections: Vec<[u8; 2]>,
    /// Copies in the supply; −1 means unlimited.
    #[serde(default)]
    pub count: i32,
    /// Permitted upgrade targets.
    #[serde(default)]
    pub upgrades: Vec<TileId>,
}

/// Raw, serializable catalog: the fixed build-time tile data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCatalog {
    /// All tile definitions.
    pub tiles: Vec<RawTile>,
}

/// Validated tile catalog: definitions plus the upgrade graph and supply
/// counts. Process-wide and read-mostly; loaded once.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    tiles: BTreeMap<TileId, TileType>,
    upgrades: BTreeMap<TileId, Vec<TileId>>,
    counts: BTreeMap<TileId, i32>,
}

impl TileCatalog {
    /// Validate a raw catalog into a usable one.
    pub fn from_raw(raw: RawCatalog) -> Result<Self, MapError> {
        let mut tiles = BTreeMap::new();
        let mut upgrades = BTreeMap::new();
        let mut counts = BTreeMap::new();

        for def in &raw.tiles {
            if def.count < -1 {
                return Err(MapError::Config(format!(
                    "tile {}: count {} is not a valid supply size",
                    def.id, def.count
                )));
            }
            let mut connections = Vec::with_capacity(def.connections.len());
            for pair in &def.connections {
                let a = Endpoint::from_raw(pair[0])
                    .map_err(|_| bad_endpoint(def.id, pair[0]))?;
                let b = Endpoint::from_raw(pair[1])
                    .map_err(|_| bad_endpoint(def.id, pair[1]))?;
                if a == b {
                    return Err(MapError::Config(format!(
                        "tile {}: connection {}-{} is a self-loop",
                        def.id, pair[0], pair[1]
                    )));
                }
                for endpoint in [a, b] {
                    if let Endpoint::City(c) = endpoint {
                        if c >= CITY_BASE + def.cities.len() as u8 {
                            return Err(MapError::Config(format!(
                                "tile {}: city endpoint {c} has no capacity entry",
                                def.id
                            )));
                        }
                    }
                }
                connections.push(Connection::new(a, b));
            }
            let inserted = tiles.insert(
                def.id,
                TileType {
                    id: def.id,
                    tier: def.tier,
                    revenue: def.revenue,
                    city_capacities: def.cities.clone(),
                    connections,
                },
            );
            if inserted.is_some() {
                return Err(MapError::Config(format!("duplicate tile id {}", def.id)));
            }
            upgrades.insert(def.id, def.upgrades.clone());
            counts.insert(def.id, def.count);
        }

        for def in &raw.tiles {
            let source_tier = tiles[&def.id].tier;
            for target in &def.upgrades {
                let Some(target_tile) = tiles.get(target) else {
                    return Err(MapError::Config(format!(
                        "tile {}: upgrade target {target} does not exist",
                        def.id
                    )));
                };
                if target_tile.tier < source_tier {
                    return Err(MapError::Config(format!(
                        "tile {}: upgrade to {target} lowers the tier",
                        def.id
                    )));
                }
            }
        }

        debug!(tiles = tiles.len(), "tile catalog validated");
        Ok(TileCatalog {
            tiles,
            upgrades,
            counts,
        })
    }

    /// Parse and validate a JSON catalog document.
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        let raw: RawCatalog = serde_json::from_str(text)
            .map_err(|err| MapError::Config(format!("catalog parse failure: {err}")))?;
        Self::from_raw(raw)
    }

    /// Load a catalog from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Ok(Self::from_json(&contents)?)
    }

    /// The compiled-in default tile set.
    pub fn builtin() -> &'static TileCatalog {
        &data::BUILTIN
    }

    /// Look up a tile definition.
    pub fn tile(&self, id: TileId) -> Option<&TileType> {
        self.tiles.get(&id)
    }

    /// Iterate over all tile definitions.
    pub fn tiles(&self) -> impl Iterator<Item = &TileType> {
        self.tiles.values()
    }

    /// Effective connections of a tile type at the given rotation.
    pub fn connections_at(&self, id: TileId, rotation: u8) -> Vec<Connection> {
        self.tile(id)
            .map(|def| {
                def.connections
                    .iter()
                    .map(|conn| conn.rotated(rotation))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Permitted upgrade targets for a tile type.
    pub fn legal_upgrades(&self, id: TileId) -> &[TileId] {
        self.upgrades.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Supply count for a tile type (−1 means unlimited).
    pub fn count(&self, id: TileId) -> i32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }
}

fn bad_endpoint(tile: TileId, raw: u8) -> MapError {
    MapError::Config(format!("tile {tile}: endpoint {raw} out of range"))
}

/// Mutable remaining-count ledger for the tile supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInventory {
    remaining: BTreeMap<TileId, i32>,
}

impl TileInventory {
    /// Start from the catalog's configured counts.
    pub fn new(catalog: &TileCatalog) -> Self {
        TileInventory {
            remaining: catalog.counts.clone(),
        }
    }

    /// Remaining copies of a tile type (−1 means unlimited, 0 exhausted).
    pub fn remaining(&self, id: TileId) -> i32 {
        self.remaining.get(&id).copied().unwrap_or(0)
    }

    /// Remove one copy from the supply. Fails before any mutation when the
    /// supply is exhausted.
    pub fn take(&mut self, id: TileId) -> Result<(), MapError> {
        match self.remaining(id) {
            0 => Err(MapError::OutOfStock(id)),
            -1 => Ok(()),
            n => {
                self.remaining.insert(id, n - 1);
                Ok(())
            }
        }
    }

    /// Return one copy to the supply (no-op for unlimited types).
    pub fn put_back(&mut self, id: TileId) {
        let n = self.remaining(id);
        if n >= 0 {
            self.remaining.insert(id, n + 1);
        }
    }

    /// Take a tile for an upgrade lay; the replaced tile goes back to the
    /// supply unless it is unlimited.
    pub fn take_for_upgrade(&mut self, id: TileId, replaced: TileId) -> Result<(), MapError> {
        self.take(id)?;
        self.put_back(replaced);
        Ok(())
    }

    /// Reverse [`TileInventory::take_for_upgrade`] during undo.
    pub fn undo_upgrade(&mut self, id: TileId, replaced: TileId) -> Result<(), MapError> {
        self.put_back(id);
        self.take(replaced).map_err(|_| {
            MapError::Invariant(format!("undo could not re-take replaced tile {replaced}"))
        })
    }
}
