//! # Map Block Data
//!
//! `map.bin` is a row-major grid of little-endian u16 cells.
//!
//! ```text
//! 15       12 11 10 9                 0
//! [elevation][coll][    metatile id    ]
//! ```

use std::io::Cursor;

use crate::{
    binary_utils::read_u16_le,
    error::{Error, Result},
    metatile::ID_MASK,
};

pub const MAP_BLOCK_SIZE: usize = 2;

/// Collision value that marks a cell as blocked.
pub const COLLISION_SOLID: u8 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapBlock(pub u16);

impl MapBlock {
    pub fn metatile_id(self) -> u16 {
        self.0 & ID_MASK
    }

    pub fn collision(self) -> u8 {
        ((self.0 >> 10) & 0x3) as u8
    }

    pub fn elevation(self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }

    pub fn is_solid(self) -> bool {
        self.collision() == COLLISION_SOLID
    }

    /// Ids 0 and 1 mark a cell with no graphic of its own.
    pub fn is_empty(self) -> bool {
        self.metatile_id() <= 1
    }

    /// Replace the metatile id, keeping collision and elevation.
    pub fn with_metatile_id(self, id: u16) -> Self {
        MapBlock((self.0 & !ID_MASK) | (id & ID_MASK))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapGrid {
    width: usize,
    height: usize,
    blocks: Vec<MapBlock>,
}

fn cell_count(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .filter(|cells| cells.checked_mul(MAP_BLOCK_SIZE).is_some())
        .ok_or_else(|| Error::format(0, format!("map grid of {}x{} is too large", width, height)))
}

impl MapGrid {
    pub fn new(width: usize, height: usize, blocks: Vec<MapBlock>) -> Result<Self> {
        let cells = cell_count(width, height)?;
        if blocks.len() != cells {
            return Err(Error::format(
                0,
                format!(
                    "map grid of {}x{} needs {} blocks, got {}",
                    width,
                    height,
                    cells,
                    blocks.len()
                ),
            ));
        }
        Ok(MapGrid {
            width,
            height,
            blocks,
        })
    }

    /// Decode `width * height` cells. Extra trailing bytes are ignored.
    pub fn from_bytes(data: &[u8], width: usize, height: usize) -> Result<Self> {
        let cells = cell_count(width, height)?;
        let needed = cells * MAP_BLOCK_SIZE;
        if data.len() < needed {
            return Err(Error::format(
                data.len(),
                format!(
                    "map data too short for {}x{} blocks: {} < {}",
                    width,
                    height,
                    data.len(),
                    needed
                ),
            ));
        }

        let mut cursor = Cursor::new(data);
        let mut blocks = Vec::with_capacity(cells);
        for _ in 0..cells {
            blocks.push(MapBlock(read_u16_le(&mut cursor)?));
        }

        Self::new(width, height, blocks)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> MapBlock {
        self.blocks[y * self.width + x]
    }

    pub fn blocks(&self) -> &[MapBlock] {
        &self.blocks
    }

    /// Cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, MapBlock)> + '_ {
        let width = self.width.max(1);
        self.blocks
            .iter()
            .enumerate()
            .map(move |(i, &block)| (i % width, i / width, block))
    }

    pub fn map_blocks<F>(&self, mut f: F) -> MapGrid
    where
        F: FnMut(usize, usize, MapBlock) -> MapBlock,
    {
        let blocks = self.iter().map(|(x, y, block)| f(x, y, block)).collect();
        MapGrid {
            width: self.width,
            height: self.height,
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_id_collision_and_elevation() {
        let block = MapBlock(0x3C05 | 0x0400);
        assert_eq!(block.metatile_id(), 5);
        assert_eq!(block.collision(), 3);
        assert!(block.is_solid());
        assert_eq!(block.elevation(), 3);

        let replaced = block.with_metatile_id(0x201);
        assert_eq!(replaced.metatile_id(), 0x201);
        assert_eq!(replaced.collision(), 3);
        assert_eq!(replaced.elevation(), 3);
    }

    #[test]
    fn decodes_row_major_grid() {
        let data: Vec<u8> = [1u16, 2, 3, 4, 5, 6]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let grid = MapGrid::from_bytes(&data, 3, 2).unwrap();

        assert_eq!(grid.get(2, 0).metatile_id(), 3);
        assert_eq!(grid.get(0, 1).metatile_id(), 4);
        let coords: Vec<(usize, usize)> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords[4], (1, 1));
    }

    #[test]
    fn short_grid_is_a_format_error() {
        match MapGrid::from_bytes(&[0u8; 6], 2, 2) {
            Err(Error::Format { offset, .. }) => assert_eq!(offset, 6),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn oversized_dimensions_are_a_format_error() {
        for (width, height) in [(usize::MAX, 2), (usize::MAX / 2 + 1, 1)] {
            match MapGrid::from_bytes(&[0u8; 8], width, height) {
                Err(Error::Format { reason, .. }) => assert!(reason.contains("too large")),
                other => panic!("expected format error, got {:?}", other),
            }
        }
        assert!(MapGrid::new(usize::MAX, 2, Vec::new()).is_err());
    }
}
