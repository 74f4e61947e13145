//! # Border Pattern
//!
//! `border.bin` holds four metatile ids forming a 2x2 pattern. The game tiles it as a
//! checkerboard around the map, and empty cells inside the map are filled from it too.

use std::collections::BTreeSet;

use crate::{
    binary_utils::u16_array_le,
    error::{Error, Result},
    metatile::ID_MASK,
};

use super::blockdata::MapGrid;

pub const BORDER_SIZE: usize = 8; // 4 × u16

/// Used for empty cells when no border pattern is available.
pub const DEFAULT_BORDER_METATILE: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderPattern {
    pub metatiles: [u16; 4],
}

impl BorderPattern {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < BORDER_SIZE {
            return Err(Error::format(
                data.len(),
                format!(
                    "border data too short: expected {} bytes, got {}",
                    BORDER_SIZE,
                    data.len()
                ),
            ));
        }
        let raw: [u16; 4] = u16_array_le(&data[..BORDER_SIZE]);
        Ok(BorderPattern {
            metatiles: raw.map(|id| id & ID_MASK),
        })
    }

    pub fn metatile_at(&self, x: usize, y: usize) -> u16 {
        self.metatiles[border_index(x, y)]
    }
}

/// Checkerboard slot for a map position: `((x+1) mod 2) + ((y+1) mod 2) * 2`.
pub fn border_index(x: usize, y: usize) -> usize {
    ((x + 1) % 2) + ((y + 1) % 2) * 2
}

/// Replace every empty cell (id 0 or 1) with the border metatile for its position, or with
/// `default_id` when there is no pattern. Collision and elevation bits are kept.
pub fn apply_border_fallback(
    grid: &MapGrid,
    border: Option<&BorderPattern>,
    default_id: u16,
) -> MapGrid {
    grid.map_blocks(|x, y, block| {
        if !block.is_empty() {
            return block;
        }
        let id = match border {
            Some(pattern) => pattern.metatile_at(x, y),
            None => default_id,
        };
        block.with_metatile_id(id)
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderStats {
    pub total: usize,
    pub empty: usize,
    pub unique_ids: BTreeSet<u16>,
}

impl BorderStats {
    pub fn collect(grid: &MapGrid) -> Self {
        let mut stats = BorderStats::default();
        for block in grid.blocks() {
            stats.total += 1;
            stats.unique_ids.insert(block.metatile_id());
            if block.is_empty() {
                stats.empty += 1;
            }
        }
        stats
    }

    pub fn empty_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.empty as f64 / self.total as f64 * 100.0
        }
    }
}
