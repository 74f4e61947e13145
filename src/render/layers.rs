//! # Tile Reference Layers
//!
//! Each map cell becomes 2x2 tile references on a bottom and a top layer. A reference is a
//! 1-based graphic id (0 means no tile) with the flips in the two high bits:
//!
//! ```text
//! 31 30 29                        0
//! [H][V][   tile index + 1        ]
//! ```

use serde::Serialize;

use crate::{
    diagnostics::{Diagnostics, Warning},
    map::MapGrid,
    metatile::{records::quadrant_index, Metatile, MetatileTable, TileBitfield},
};

pub const H_FLIP_FLAG: u32 = 0x8000_0000;
pub const V_FLIP_FLAG: u32 = 0x4000_0000;
pub const EMPTY_GID: u32 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRef {
    pub tile_index: u16,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl TileRef {
    pub fn gid(self) -> u32 {
        let mut gid = self.tile_index as u32 + 1;
        if self.h_flip {
            gid |= H_FLIP_FLAG;
        }
        if self.v_flip {
            gid |= V_FLIP_FLAG;
        }
        gid
    }

    pub fn from_gid(gid: u32) -> Option<Self> {
        let index = gid & !(H_FLIP_FLAG | V_FLIP_FLAG);
        if index == EMPTY_GID {
            return None;
        }
        Some(TileRef {
            tile_index: (index - 1) as u16,
            h_flip: gid & H_FLIP_FLAG != 0,
            v_flip: gid & V_FLIP_FLAG != 0,
        })
    }
}

impl From<TileBitfield> for TileRef {
    fn from(tile: TileBitfield) -> Self {
        TileRef {
            tile_index: tile.tile_index,
            h_flip: tile.h_flip,
            v_flip: tile.v_flip,
        }
    }
}

/// Row-major gid grids, in tiles (twice the map size on each axis).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TileLayers {
    pub width: usize,
    pub height: usize,
    pub bottom: Vec<u32>,
    pub top: Vec<u32>,
}

impl TileLayers {
    pub fn index(&self, tx: usize, ty: usize) -> usize {
        ty * self.width + tx
    }
}

/// Cells whose metatile is not in `table` get empty references on both layers.
pub fn compose_tile_layers(
    grid: &MapGrid,
    table: &MetatileTable,
    diagnostics: &mut Diagnostics,
) -> TileLayers {
    let width = grid.width() * 2;
    let height = grid.height() * 2;
    let mut layers = TileLayers {
        width,
        height,
        bottom: vec![EMPTY_GID; width * height],
        top: vec![EMPTY_GID; width * height],
    };

    for (mx, my, block) in grid.iter() {
        let id = block.metatile_id();
        let metatile: &Metatile = match table.get(id) {
            Some(metatile) => metatile,
            None => {
                diagnostics.warn_once(Warning::MissingMetatile { metatile_id: id });
                continue;
            }
        };

        for dy in 0..2 {
            for dx in 0..2 {
                let q = quadrant_index(dx, dy);
                let i = layers.index(mx * 2 + dx, my * 2 + dy);
                layers.bottom[i] = TileRef::from(metatile.record.bottom[q]).gid();
                layers.top[i] = TileRef::from(metatile.record.top[q]).gid();
            }
        }
    }
    layers
}
