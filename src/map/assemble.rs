//! # Map Assembler
//!
//! Fills empty cells from the border pattern, expands every cell into tile references and
//! collects the per-cell metadata written next to the layers.

use serde::Serialize;

use crate::{
    diagnostics::{Diagnostics, Warning},
    metatile::{behavior, Metatile, MetatileTable},
    render::layers::compose_tile_layers,
};

use super::{
    blockdata::MapGrid,
    border::{apply_border_fallback, BorderPattern, BorderStats, DEFAULT_BORDER_METATILE},
};

/// Per-cell data as parallel row-major arrays, one entry per metatile cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CellMetadata {
    pub metatile_ids: Vec<u16>,
    pub behaviors: Vec<String>,
    pub collision: Vec<u8>,
    pub solid: Vec<bool>,
    /// Blocked by behaviour alone, independent of the collision bits.
    pub impassable: Vec<bool>,
    pub elevation: Vec<u8>,
    pub layer_types: Vec<String>,
    pub encounter_rates: Vec<u8>,
}

impl CellMetadata {
    fn with_capacity(cells: usize) -> Self {
        CellMetadata {
            metatile_ids: Vec::with_capacity(cells),
            behaviors: Vec::with_capacity(cells),
            collision: Vec::with_capacity(cells),
            solid: Vec::with_capacity(cells),
            impassable: Vec::with_capacity(cells),
            elevation: Vec::with_capacity(cells),
            layer_types: Vec::with_capacity(cells),
            encounter_rates: Vec::with_capacity(cells),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssembledMap {
    /// Size in 8x8 tiles.
    pub width: usize,
    pub height: usize,
    pub metatile_width: usize,
    pub metatile_height: usize,
    pub bottom_layer: Vec<u32>,
    pub top_layer: Vec<u32>,
    pub cells: CellMetadata,
    pub border: Option<[u16; 4]>,
}

pub struct MapAssembler<'a> {
    table: &'a MetatileTable,
    border: Option<BorderPattern>,
    default_border: u16,
}

impl<'a> MapAssembler<'a> {
    pub fn new(table: &'a MetatileTable) -> Self {
        MapAssembler {
            table,
            border: None,
            default_border: DEFAULT_BORDER_METATILE,
        }
    }

    pub fn with_border(mut self, border: Option<BorderPattern>) -> Self {
        self.border = border;
        self
    }

    pub fn with_default_border(mut self, id: u16) -> Self {
        self.default_border = id;
        self
    }

    pub fn assemble(&self, grid: &MapGrid, diagnostics: &mut Diagnostics) -> AssembledMap {
        let stats = BorderStats::collect(grid);
        log::info!(
            "Map {}x{}: {} empty cells ({:.1}%), {} distinct metatiles",
            grid.width(),
            grid.height(),
            stats.empty,
            stats.empty_percent(),
            stats.unique_ids.len()
        );
        if self.border.is_none() && stats.empty > 0 {
            diagnostics.warn_once(Warning::MissingBorder {
                default_id: self.default_border,
            });
        }

        let filled = apply_border_fallback(grid, self.border.as_ref(), self.default_border);
        let layers = compose_tile_layers(&filled, self.table, diagnostics);

        let mut cells = CellMetadata::with_capacity(filled.blocks().len());
        for block in filled.blocks() {
            let id = block.metatile_id();
            let attributes = self
                .table
                .get(id)
                .unwrap_or(&Metatile::EMPTY)
                .attributes;

            cells.metatile_ids.push(id);
            cells.behaviors.push(attributes.behavior_name().into_owned());
            cells.collision.push(block.collision());
            cells.solid.push(block.is_solid());
            cells
                .impassable
                .push(behavior::is_impassable(attributes.behavior));
            cells.elevation.push(block.elevation());
            cells.layer_types.push(attributes.layer().name().into_owned());
            cells
                .encounter_rates
                .push(behavior::encounter_rate(attributes.behavior));
        }

        AssembledMap {
            width: layers.width,
            height: layers.height,
            metatile_width: filled.width(),
            metatile_height: filled.height(),
            bottom_layer: layers.bottom,
            top_layer: layers.top,
            cells,
            border: self.border.map(|b| b.metatiles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::MapBlock,
        metatile::{MetatileAttributes, MetatileRecord, TileBitfield},
    };

    fn table() -> MetatileTable {
        let grass = Metatile {
            record: MetatileRecord {
                bottom: [TileBitfield::from_u16(3); 4],
                top: [TileBitfield::default(); 4],
            },
            attributes: MetatileAttributes::from_legacy(0x1002),
        };
        MetatileTable::new(vec![Metatile::EMPTY, Metatile::EMPTY, Metatile::EMPTY, grass], None)
    }

    #[test]
    fn metadata_arrays_follow_cells() {
        let table = table();
        let grid = MapGrid::new(2, 1, vec![MapBlock(0x3C03), MapBlock(0)]).unwrap();
        let mut diagnostics = Diagnostics::new();

        let map = MapAssembler::new(&table).assemble(&grid, &mut diagnostics);

        assert_eq!((map.width, map.height), (4, 2));
        assert_eq!(map.cells.metatile_ids, vec![3, 2]);
        assert_eq!(map.cells.behaviors[0], "MB_LONG_GRASS");
        assert_eq!(map.cells.collision, vec![3, 0]);
        assert_eq!(map.cells.solid, vec![true, false]);
        assert_eq!(map.cells.impassable, vec![false, false]);
        assert_eq!(map.cells.elevation, vec![3, 0]);
        assert_eq!(map.cells.layer_types[0], "covered");
        assert_eq!(map.cells.encounter_rates, vec![25, 0]);
        assert_eq!(map.bottom_layer[0], 4);
        assert_eq!(map.border, None);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::MissingBorder { default_id: 2 }]
        );
    }

    #[test]
    fn border_fills_empty_cells() {
        let table = table();
        let grid = MapGrid::new(1, 1, vec![MapBlock(1)]).unwrap();
        let border = BorderPattern {
            metatiles: [0, 0, 0, 3],
        };
        let mut diagnostics = Diagnostics::new();

        let map = MapAssembler::new(&table)
            .with_border(Some(border))
            .assemble(&grid, &mut diagnostics);

        assert_eq!(map.cells.metatile_ids, vec![3]);
        assert_eq!(map.border, Some([0, 0, 0, 3]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn serialises_to_json_document() {
        let table = table();
        let grid = MapGrid::new(1, 1, vec![MapBlock(3)]).unwrap();
        let map = MapAssembler::new(&table).assemble(&grid, &mut Diagnostics::new());

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["metatile_width"], 1);
        assert_eq!(json["bottom_layer"][3], 4);
        assert_eq!(json["cells"]["behaviors"][0], "MB_LONG_GRASS");
        assert!(json["border"].is_null());
    }
}
