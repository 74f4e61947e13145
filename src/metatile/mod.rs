//! # Metatiles
//!
//! A metatile is a 16x16 map cell built from 2x2 hardware tiles of 8x8 pixels, drawn twice: once
//! on the bottom layer and once on the top layer. Each metatile also carries a behaviour record.

pub mod attributes;
pub mod behavior;
pub mod records;
pub mod table;
pub mod tile;

pub use attributes::{AttributeLayout, LayerType, MetatileAttributes};
pub use records::MetatileRecord;
pub use table::{Metatile, MetatileTable, TileSource};
pub use tile::TileBitfield;

pub const TILE_DIM: usize = 8;
pub const METATILE_DIM: usize = TILE_DIM * 2; // 16

/// Secondary tile sources start at this tile index and metatile id.
pub const SECONDARY_OFFSET: u16 = 512;

/// Metatile ids and tile indices are 10 bits wide.
pub const ID_MASK: u16 = 0x3FF;
