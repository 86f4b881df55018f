#![warn(clippy::all, missing_docs)]

//! Spatial and topological engine for a hex-map rail game.
//!
//! This crate hosts the tile catalog and rotation algebra, the fixed grid
//! topology with its off-board hubs, the mutable per-cell board state,
//! depth-first station reachability, tile/token placement legality with
//! costs, and the interactive route sketching used to feed an external
//! revenue calculator.

pub mod catalog;
pub mod error;
pub mod map;
pub mod placement;
pub mod route;
pub mod search;
pub mod state;

pub use catalog::{
    Connection, Endpoint, RawCatalog, RawTile, Tier, TileCatalog, TileId, TileInventory,
    TileType,
};
pub use error::MapError;
pub use map::{
    board::default_board, BoardLayout, CellId, GridBuilder, GridTopology, Terrain, TerrainKind,
};
pub use placement::{LayContext, PlacementValidator};
pub use route::{Leg, RouteBuilder, RouteSummary, SketchState, Stop};
pub use search::ConnectivitySearch;
pub use state::{BoardState, Claim, OwnerId, PlacedTile, RouteId};
