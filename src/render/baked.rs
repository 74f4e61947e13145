//! # Palette-Baked Rendering
//!
//! Colour index 0 is always transparent, whatever the palette holds there. Indices past the end
//! of a palette render opaque black.

use image::{Rgba, RgbaImage};

use crate::{
    codec::IndexedRaster,
    diagnostics::{Diagnostics, Warning},
    metatile::{
        records::quadrant_index, MetatileRecord, MetatileTable, TileBitfield, METATILE_DIM,
        TILE_DIM,
    },
    palette::{PaletteStore, PaletteTable},
};

/// Metatiles per row in a metatile sheet.
pub const SHEET_COLUMNS: usize = 16;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const OUT_OF_RANGE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A tile sheet whose first tile has absolute index `first_tile`.
#[derive(Clone, Copy, Debug)]
pub struct TileGraphics<'a> {
    pub raster: &'a IndexedRaster,
    pub first_tile: u16,
}

impl<'a> TileGraphics<'a> {
    fn tile(&self, tile_index: u16) -> Option<[u8; TILE_DIM * TILE_DIM]> {
        let local = tile_index.checked_sub(self.first_tile)?;
        self.raster.tile(local as usize)
    }
}

pub fn composite_pixel(index: u8, palette: &PaletteTable) -> Rgba<u8> {
    if index == 0 {
        return TRANSPARENT;
    }
    match palette.get(index as usize) {
        Some(c) => Rgba([c.r, c.g, c.b, 255]),
        None => OUT_OF_RANGE,
    }
}

/// Palette key of the first bitfield, in record order, that references `tile_index`.
///
/// This scans every record for every tile. Tiles used by several records with different
/// palettes take the palette of the earliest one.
pub fn palette_key_for_tile<'r, I>(records: I, tile_index: u16) -> Option<u8>
where
    I: IntoIterator<Item = &'r MetatileRecord>,
{
    records
        .into_iter()
        .flat_map(|record| record.tiles())
        .find(|tile| tile.tile_index == tile_index)
        .map(|tile| tile.palette_key)
}

/// Absolute index of sheet tile `tile_idx`, or `None` past the 16-bit index space.
fn absolute_tile_index(tile_idx: usize, tile_offset: u16) -> Option<u16> {
    u16::try_from(tile_idx).ok()?.checked_add(tile_offset)
}

/// Render a whole tile sheet in true colour. Tile `n` of the raster has absolute index
/// `tile_offset + n`; tiles no record references, or whose absolute index does not fit in 16
/// bits, use palette key 0.
pub fn render_tileset(
    raster: &IndexedRaster,
    records: &[MetatileRecord],
    palettes: &PaletteStore,
    tile_offset: u16,
    diagnostics: &mut Diagnostics,
) -> RgbaImage {
    let mut img = RgbaImage::new(raster.width as u32, raster.height as u32);
    let across = raster.tiles_across();

    for tile_idx in 0..raster.tile_count() {
        let key = absolute_tile_index(tile_idx, tile_offset)
            .and_then(|absolute| palette_key_for_tile(records, absolute))
            .unwrap_or(0);
        let palette = palettes.resolve(key, diagnostics);

        let base_x = (tile_idx % across) * TILE_DIM;
        let base_y = (tile_idx / across) * TILE_DIM;
        for py in 0..TILE_DIM {
            for px in 0..TILE_DIM {
                let (x, y) = (base_x + px, base_y + py);
                if x >= raster.width || y >= raster.height {
                    continue;
                }
                img.put_pixel(x as u32, y as u32, composite_pixel(raster.index_at(x, y), palette));
            }
        }
    }

    log::debug!(
        "Rendered {} tiles ({}x{}) from {} metatile records",
        raster.tile_count(),
        raster.width,
        raster.height,
        records.len()
    );
    img
}

/// Render every metatile of `table` as a 16x16 block, [`SHEET_COLUMNS`] to a row, in id order.
/// The top layer is drawn over the bottom layer wherever its pixels are not transparent.
pub fn render_metatile_sheet(
    table: &MetatileTable,
    graphics: &[TileGraphics],
    palettes: &PaletteStore,
    diagnostics: &mut Diagnostics,
) -> RgbaImage {
    let rows = ((table.len() + SHEET_COLUMNS - 1) / SHEET_COLUMNS).max(1);
    let mut img = RgbaImage::new(
        (SHEET_COLUMNS * METATILE_DIM) as u32,
        (rows * METATILE_DIM) as u32,
    );

    for (slot, record) in table.records().enumerate() {
        let bx = (slot % SHEET_COLUMNS) * METATILE_DIM;
        let by = (slot / SHEET_COLUMNS) * METATILE_DIM;

        for layer in [&record.bottom, &record.top] {
            for dy in 0..2 {
                for dx in 0..2 {
                    let tile = layer[quadrant_index(dx, dy)];
                    draw_tile(
                        &mut img,
                        &tile,
                        graphics,
                        palettes,
                        bx + dx * TILE_DIM,
                        by + dy * TILE_DIM,
                        diagnostics,
                    );
                }
            }
        }
    }
    img
}

fn draw_tile(
    img: &mut RgbaImage,
    tile: &TileBitfield,
    graphics: &[TileGraphics],
    palettes: &PaletteStore,
    tx: usize,
    ty: usize,
    diagnostics: &mut Diagnostics,
) {
    let Some(pixels) = graphics.iter().find_map(|sheet| sheet.tile(tile.tile_index)) else {
        diagnostics.warn_once(Warning::MissingTile {
            tile_index: tile.tile_index,
        });
        return;
    };
    let palette = palettes.resolve(tile.palette_key, diagnostics);

    for py in 0..TILE_DIM {
        for px in 0..TILE_DIM {
            let sx = if tile.h_flip { TILE_DIM - 1 - px } else { px };
            let sy = if tile.v_flip { TILE_DIM - 1 - py } else { py };
            let ci = pixels[sy * TILE_DIM + sx];
            if ci == 0 {
                continue;
            }
            img.put_pixel(
                (tx + px) as u32,
                (ty + py) as u32,
                composite_pixel(ci, palette),
            );
        }
    }
}
