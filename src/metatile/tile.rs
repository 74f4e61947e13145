//! # Tile Bitfield
//!
//! One 16-bit entry of a metatile record. Selects an 8x8 tile graphic, its flips and which of the
//! 16 palettes it is drawn with.
//!
//! ```text
//! 15      12 11 10 9                 0
//! [ palette ][V][H][    tile index   ]
//! ```

use serde::Serialize;

use super::ID_MASK;

const H_FLIP_BIT: u16 = 0x400;
const V_FLIP_BIT: u16 = 0x800;
const PALETTE_SHIFT: u16 = 12;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TileBitfield {
    pub tile_index: u16,
    pub h_flip: bool,
    pub v_flip: bool,
    pub palette_key: u8,
}

impl TileBitfield {
    pub fn from_u16(val: u16) -> Self {
        TileBitfield {
            tile_index: val & ID_MASK,
            h_flip: (val & H_FLIP_BIT) != 0,
            v_flip: (val & V_FLIP_BIT) != 0,
            palette_key: ((val >> PALETTE_SHIFT) & 0xF) as u8,
        }
    }

    pub fn to_u16(self) -> u16 {
        let mut val = self.tile_index & ID_MASK;
        if self.h_flip {
            val |= H_FLIP_BIT;
        }
        if self.v_flip {
            val |= V_FLIP_BIT;
        }
        val | ((self.palette_key as u16 & 0xF) << PALETTE_SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_field() {
        let tile = TileBitfield::from_u16(0xB5FF);
        assert_eq!(tile.tile_index, 0x1FF);
        assert!(tile.h_flip);
        assert!(!tile.v_flip);
        assert_eq!(tile.palette_key, 0xB);
    }

    #[test]
    fn every_value_round_trips() {
        for val in 0..=u16::MAX {
            let tile = TileBitfield::from_u16(val);
            assert_eq!(tile.tile_index, val & 0x3FF);
            assert_eq!(tile.h_flip, val & 0x400 != 0);
            assert_eq!(tile.v_flip, val & 0x800 != 0);
            assert_eq!(tile.palette_key as u16, (val >> 12) & 0xF);
            assert_eq!(tile.to_u16(), val);
        }
    }
}
