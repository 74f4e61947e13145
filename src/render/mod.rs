//! # Compositor
//!
//! Two ways of turning indexed tiles into output:
//!
//! - [`baked`]: resolve each tile's palette and write true-colour pixels.
//! - [`layers`]: emit tile references (graphic id plus flip flags) per map cell, leaving
//!   palettes to downstream tooling.

pub mod baked;
pub mod layers;

pub use baked::{palette_key_for_tile, render_metatile_sheet, render_tileset, TileGraphics};
pub use layers::{compose_tile_layers, TileLayers, TileRef};
