//! Engine error taxonomy.
//!
//! Queries that merely find no legal option (rotations, extensions, token
//! sites) return empty results instead of errors; only malformed build-time
//! data, supply exhaustion, and undo integrity failures surface here.

use thiserror::Error;

use crate::catalog::TileId;

/// Errors raised by the map engine.
#[derive(Debug, Error)]
pub enum MapError {
    /// Malformed catalog or board data detected at load. Fatal: the engine
    /// must not start with an inconsistent tile set.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The requested tile type has no copies left in the supply. Raised
    /// before any state mutation so the caller can abort the whole action.
    #[error("no tile {0} remaining in supply")]
    OutOfStock(TileId),

    /// An undo could not restore prior state exactly. Indicates a bug in the
    /// reversible-action framework driving the engine.
    #[error("state integrity violation: {0}")]
    Invariant(String),
}
