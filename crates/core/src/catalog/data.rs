//! Compiled-in default tile set.
//!
//! Ids below 900 follow the published tile numbering; ids from 900 up are
//! the fixed pre-printed tiles that exist only at board setup and never sit
//! in the supply.

use once_cell::sync::Lazy;

use super::{RawCatalog, RawTile, Tier, TileCatalog, TileId};

/// Pre-printed blank hex, upgradeable to the yellow plain-track tiles.
pub const BASE_PLAIN: TileId = 901;
/// Pre-printed single city.
pub const BASE_CITY: TileId = 902;
/// Pre-printed four-city metropolis (many slots glued to one neighbor).
pub const BASE_METROPOLIS: TileId = 903;
/// Pre-printed high-revenue "Z" city with its own upgrade family.
pub const BASE_Z_CITY: TileId = 904;
/// Off-board hub with one entry slot.
pub const HUB_SINGLE: TileId = 905;
/// Off-board hub with two entry slots.
pub const HUB_DOUBLE: TileId = 906;
/// Off-board hub with three entry slots.
pub const HUB_TRIPLE: TileId = 907;

pub(crate) static BUILTIN: Lazy<TileCatalog> = Lazy::new(|| {
    TileCatalog::from_raw(builtin_raw()).expect("built-in tile catalog is invalid")
});

#[allow(clippy::too_many_arguments)]
fn t(
    id: TileId,
    tier: Tier,
    revenue: Option<u32>,
    cities: Vec<u8>,
    connections: Vec<[u8; 2]>,
    count: i32,
    upgrades: Vec<TileId>,
) -> RawTile {
    RawTile {
        id,
        tier,
        revenue,
        cities,
        connections,
        count,
        upgrades,
    }
}

fn builtin_raw() -> RawCatalog {
    use Tier::{Brown, Gray, Green, Invisible, Yellow};

    RawCatalog {
        tiles: vec![
            // Yellow plain track.
            t(7, Yellow, None, vec![], vec![[2, 3]], -1, vec![26]),
            t(8, Yellow, None, vec![], vec![[1, 3]], -1, vec![16, 23]),
            t(9, Yellow, None, vec![], vec![[0, 3]], -1, vec![18, 19]),
            // Yellow cities.
            t(5, Yellow, Some(20), vec![1], vec![[2, 7], [3, 7]], 3, vec![14, 15, 619]),
            t(6, Yellow, Some(20), vec![1], vec![[1, 7], [3, 7]], 4, vec![14, 15, 619]),
            t(57, Yellow, Some(20), vec![1], vec![[0, 7], [3, 7]], 4, vec![14, 15, 619]),
            // Green plain track.
            t(16, Green, None, vec![], vec![[1, 3], [2, 4]], 2, vec![]),
            t(18, Green, None, vec![], vec![[0, 3], [1, 2]], 1, vec![]),
            t(19, Green, None, vec![], vec![[0, 3], [1, 4]], 2, vec![]),
            t(23, Green, None, vec![], vec![[1, 3], [0, 4]], 4, vec![]),
            t(26, Green, None, vec![], vec![[2, 3], [0, 3]], 1, vec![]),
            // Green cities.
            t(14, Green, Some(30), vec![2], vec![[0, 7], [2, 7], [3, 7], [5, 7]], 4, vec![611]),
            t(15, Green, Some(30), vec![2], vec![[0, 7], [1, 7], [2, 7], [3, 7]], 5, vec![611]),
            t(619, Green, Some(30), vec![2], vec![[0, 7], [2, 7], [3, 7], [4, 7]], 3, vec![611]),
            // Brown and gray cities.
            t(
                611,
                Brown,
                Some(40),
                vec![2],
                vec![[0, 7], [1, 7], [3, 7], [4, 7], [5, 7]],
                1,
                vec![51],
            ),
            t(
                51,
                Gray,
                Some(50),
                vec![2],
                vec![[0, 7], [1, 7], [3, 7], [4, 7], [5, 7]],
                2,
                vec![],
            ),
            // "Z" city family.
            t(291, Yellow, Some(40), vec![1], vec![[2, 7], [3, 7]], 1, vec![294, 295, 296]),
            t(292, Yellow, Some(40), vec![1], vec![[1, 7], [3, 7]], 1, vec![294, 295, 296]),
            t(293, Yellow, Some(40), vec![1], vec![[0, 7], [3, 7]], 1, vec![294, 295, 296]),
            t(294, Green, Some(50), vec![1], vec![[0, 7], [2, 7], [3, 7], [5, 7]], 2, vec![297]),
            t(295, Green, Some(50), vec![1], vec![[0, 7], [1, 7], [2, 7], [3, 7]], 2, vec![297]),
            t(296, Green, Some(50), vec![1], vec![[0, 7], [2, 7], [3, 7], [4, 7]], 1, vec![297]),
            t(
                297,
                Brown,
                Some(60),
                vec![1],
                vec![[0, 7], [1, 7], [3, 7], [4, 7], [5, 7]],
                2,
                vec![290],
            ),
            t(
                290,
                Gray,
                Some(70),
                vec![1],
                vec![[0, 7], [1, 7], [3, 7], [4, 7], [5, 7]],
                1,
                vec![],
            ),
            // Metropolis family: four one-seat cities, a shared hub-facing
            // edge 0, and one private exit edge per city.
            t(
                298,
                Yellow,
                Some(40),
                vec![1, 1, 1, 1],
                vec![[0, 7], [1, 7], [0, 8], [2, 8], [0, 9], [3, 9], [0, 10], [4, 10]],
                1,
                vec![299],
            ),
            t(
                299,
                Brown,
                Some(70),
                vec![1, 1, 1, 1],
                vec![[0, 7], [1, 7], [0, 8], [2, 8], [0, 9], [3, 9], [0, 10], [4, 10]],
                1,
                vec![300],
            ),
            t(
                300,
                Gray,
                Some(90),
                vec![1, 1, 1, 1],
                vec![[0, 7], [1, 7], [0, 8], [2, 8], [0, 9], [3, 9], [0, 10], [4, 10]],
                1,
                vec![],
            ),
            // Pre-printed base tiles.
            t(BASE_PLAIN, Invisible, None, vec![], vec![], 0, vec![7, 8, 9]),
            t(BASE_CITY, Invisible, Some(10), vec![1], vec![], 0, vec![5, 6, 57]),
            t(
                BASE_METROPOLIS,
                Invisible,
                Some(10),
                vec![1, 1, 1, 1],
                vec![],
                0,
                vec![298],
            ),
            t(BASE_Z_CITY, Invisible, Some(10), vec![1], vec![], 0, vec![291, 292, 293]),
            // Off-board hubs: revenue stops with zero token capacity, so
            // search and routes terminate in them.
            t(HUB_SINGLE, Invisible, Some(30), vec![0], vec![[0, 7]], 0, vec![]),
            t(HUB_DOUBLE, Invisible, Some(40), vec![0], vec![[0, 7], [1, 7]], 0, vec![]),
            t(
                HUB_TRIPLE,
                Invisible,
                Some(50),
                vec![0],
                vec![[0, 7], [1, 7], [2, 7]],
                0,
                vec![],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = TileCatalog::builtin();
        assert!(catalog.tile(BASE_PLAIN).is_some());
        assert!(catalog.tile(298).is_some());
        assert_eq!(catalog.legal_upgrades(BASE_METROPOLIS), &[298]);
    }

    #[test]
    fn upgrades_never_lower_the_tier() {
        let catalog = TileCatalog::builtin();
        for def in catalog.tiles() {
            for target in catalog.legal_upgrades(def.id) {
                let target_tier = catalog.tile(*target).expect("validated target").tier;
                assert!(target_tier >= def.tier, "tile {} -> {target}", def.id);
            }
        }
    }
}
