//! The fixed default board: an eleven-row hex map with off-board hubs glued
//! around the rim, per-cell base costs, and bridge/tunnel surcharges.

use crate::catalog::{
    BASE_CITY, BASE_METROPOLIS, BASE_PLAIN, BASE_Z_CITY, HUB_DOUBLE, HUB_SINGLE, HUB_TRIPLE,
};
use crate::error::MapError;
use crate::map::{BoardLayout, GridBuilder, TerrainKind};

const ROW_LETTERS: [char; 11] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K'];

/// Whether a (row, column) slot exists on the board.
fn admissible(row: i32, col: i32) -> bool {
    match row {
        0 => col == 6,
        1 => (4..=7).contains(&col),
        2 => (2..=6).contains(&col),
        3 => (2..=9).contains(&col) && col != 7,
        4 | 5 => (1..=9).contains(&col),
        6 => (0..=8).contains(&col),
        7 => (0..=7).contains(&col),
        8 => (0..=6).contains(&col) && col != 5,
        9 => (1..=3).contains(&col),
        10 => col == 0,
        _ => false,
    }
}

/// Display name for a board position, e.g. row 3 column 2 is `D6`.
fn cell_name(row: i32, col: i32) -> String {
    let offset = if row % 2 != 0 { 2 } else { 3 };
    format!("{}{}", ROW_LETTERS[row as usize], col * 2 + offset)
}

/// Build the default board layout: topology, pre-printed tiles, base costs,
/// and terrain surcharges.
pub fn default_board() -> Result<BoardLayout, MapError> {
    let mut builder = GridBuilder::new();

    for row in 0..11 {
        for col in 0..12 {
            if admissible(row, col) {
                builder.interior(&cell_name(row, col), row, col);
            }
        }
    }

    let interior = |builder: &GridBuilder, name: &str| -> Result<super::CellId, MapError> {
        builder
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| MapError::Config(format!("board references unknown cell {name}")))
    };

    // Hubs and their glue: slot -> (interior cell, interior edge).
    let hubs: &[(&str, &[(&str, u8)])] = &[
        ("chicago_connections", &[("D6", 5)]),
        ("st_louis", &[("H2", 3), ("I3", 4)]),
        ("holland", &[("B10", 4)]),
        ("sarnia", &[("B16", 1)]),
        ("windsor", &[("C15", 1)]),
        ("louisville", &[("I9", 2), ("I11", 3)]),
        ("charleston", &[("I15", 1)]),
        ("buffalo", &[("D20", 0), ("D20", 1)]),
        ("binghamton", &[("E21", 1)]),
        ("pittsburgh", &[("F20", 1), ("F20", 2), ("G19", 1)]),
        ("cumberland", &[("G19", 2)]),
    ];
    for (name, glue) in hubs {
        let hub = builder.hub(name, glue.len() as u8);
        for (slot, (cell_name, edge)) in glue.iter().enumerate() {
            let cell = interior(&builder, cell_name)?;
            builder.glue(hub, slot as u8, cell, *edge);
        }
    }

    // Cells that cost more than the default to build on.
    for (name, cost) in [("C15", 40), ("F18", 40), ("G17", 40), ("H16", 40), ("H14", 60)] {
        let cell = interior(&builder, name)?;
        builder.base_cost(cell, cost);
    }

    // Bridge and tunnel surcharges, charged when new track meets the edge.
    use TerrainKind::{Bridge, Tunnel};
    let terrain: &[(&str, u8, TerrainKind, u32)] = &[
        ("B16", 1, Tunnel, 40),
        ("sarnia", 0, Tunnel, 40),
        ("C15", 1, Tunnel, 60),
        ("windsor", 0, Tunnel, 60),
        ("E19", 2, Tunnel, 40),
        ("F20", 5, Tunnel, 40),
        ("F18", 2, Bridge, 40),
        ("G17", 1, Bridge, 20),
        ("G19", 5, Bridge, 40),
        ("G19", 4, Bridge, 20),
        ("G19", 1, Tunnel, 20),
        ("pittsburgh", 2, Tunnel, 20),
        ("H12", 3, Bridge, 40),
        ("I11", 0, Bridge, 40),
        ("J4", 1, Bridge, 40),
        ("J6", 4, Bridge, 40),
    ];
    for (name, edge, kind, cost) in terrain {
        let cell = interior(&builder, name)?;
        builder.terrain(cell, *edge, *kind, *cost);
    }

    let topology = builder.finish()?;
    let mut layout = BoardLayout::new(topology, BASE_PLAIN);

    let cities = [
        "A15", "B16", "C7", "C9", "D14", "D20", "E11", "E21", "F20", "G3", "G7", "G9", "G13",
        "G15", "G19", "I5", "I15", "K3",
    ];
    for name in cities {
        let cell = layout
            .topology
            .by_name(name)
            .ok_or_else(|| MapError::Config(format!("city cell {name} missing")))?;
        layout.set_base_tile(cell, BASE_CITY);
    }
    for name in ["C15", "E17", "H12"] {
        let cell = layout
            .topology
            .by_name(name)
            .ok_or_else(|| MapError::Config(format!("city cell {name} missing")))?;
        layout.set_base_tile(cell, BASE_Z_CITY);
    }
    let chicago = layout
        .topology
        .by_name("D6")
        .ok_or_else(|| MapError::Config("metropolis cell D6 missing".into()))?;
    layout.set_base_tile(chicago, BASE_METROPOLIS);

    for (hub, tile) in [
        ("chicago_connections", HUB_SINGLE),
        ("st_louis", HUB_DOUBLE),
        ("holland", HUB_SINGLE),
        ("sarnia", HUB_SINGLE),
        ("windsor", HUB_SINGLE),
        ("louisville", HUB_DOUBLE),
        ("charleston", HUB_SINGLE),
        ("buffalo", HUB_DOUBLE),
        ("binghamton", HUB_SINGLE),
        ("pittsburgh", HUB_TRIPLE),
        ("cumberland", HUB_SINGLE),
    ] {
        let cell = layout
            .topology
            .by_name(hub)
            .ok_or_else(|| MapError::Config(format!("hub {hub} missing")))?;
        layout.set_base_tile(cell, tile);
    }

    Ok(layout)
}
