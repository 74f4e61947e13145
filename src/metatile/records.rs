//! # Metatile Records
//!
//! `metatiles.bin` is a flat list of 16-byte records: four bottom-layer tiles followed by four
//! top-layer tiles, each as a little-endian u16 [`TileBitfield`]. Quadrants are always ordered
//! top-left, top-right, bottom-left, bottom-right.

use crate::binary_utils::u16_array_le;

use super::tile::TileBitfield;

pub const METATILE_RECORD_SIZE: usize = 16; // 8 × u16
pub const QUADRANTS: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetatileRecord {
    pub bottom: [TileBitfield; QUADRANTS],
    pub top: [TileBitfield; QUADRANTS],
}

impl MetatileRecord {
    /// Every quadrant on both layers points at tile 0.
    pub const EMPTY: MetatileRecord = MetatileRecord {
        bottom: [TileBitfield {
            tile_index: 0,
            h_flip: false,
            v_flip: false,
            palette_key: 0,
        }; QUADRANTS],
        top: [TileBitfield {
            tile_index: 0,
            h_flip: false,
            v_flip: false,
            palette_key: 0,
        }; QUADRANTS],
    };

    pub fn from_bytes(record: &[u8]) -> Self {
        let raw: [u16; 8] = u16_array_le(record);
        let mut bottom = [TileBitfield::default(); QUADRANTS];
        let mut top = [TileBitfield::default(); QUADRANTS];
        for i in 0..QUADRANTS {
            bottom[i] = TileBitfield::from_u16(raw[i]);
            top[i] = TileBitfield::from_u16(raw[QUADRANTS + i]);
        }
        MetatileRecord { bottom, top }
    }

    /// Bottom layer entries followed by top layer entries, in record order.
    pub fn tiles(&self) -> impl Iterator<Item = &TileBitfield> {
        self.bottom.iter().chain(self.top.iter())
    }
}

/// Quadrant index for a tile offset (0 or 1 on each axis) inside a metatile.
pub fn quadrant_index(dx: usize, dy: usize) -> usize {
    (dy % 2) * 2 + (dx % 2)
}

/// Decode every whole record. A trailing partial record is dropped, see [`trailing_bytes`].
pub fn decode_metatiles(data: &[u8]) -> Vec<MetatileRecord> {
    data.chunks_exact(METATILE_RECORD_SIZE)
        .map(MetatileRecord::from_bytes)
        .collect()
}

pub fn trailing_bytes(data: &[u8]) -> usize {
    data.len() % METATILE_RECORD_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(values: [u16; 8]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn splits_bottom_and_top_layers() {
        let data = record_bytes([1, 2, 3, 4, 0x1405, 0x2806, 7, 8]);
        let records = decode_metatiles(&data);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        let bottom: Vec<u16> = record.bottom.iter().map(|t| t.tile_index).collect();
        assert_eq!(bottom, vec![1, 2, 3, 4]);
        assert_eq!(record.top[0].tile_index, 5);
        assert!(record.top[0].h_flip);
        assert_eq!(record.top[0].palette_key, 1);
        assert!(record.top[1].v_flip);
        assert_eq!(record.top[1].palette_key, 2);
    }

    #[test]
    fn discards_partial_trailing_record() {
        let mut data = record_bytes([0; 8]);
        data.extend(record_bytes([9; 8]));
        data.extend([0xAA; 5]);

        let records = decode_metatiles(&data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].bottom[3].tile_index, 9);
        assert_eq!(trailing_bytes(&data), 5);
    }

    #[test]
    fn quadrant_order_is_fixed() {
        assert_eq!(quadrant_index(0, 0), 0);
        assert_eq!(quadrant_index(1, 0), 1);
        assert_eq!(quadrant_index(0, 1), 2);
        assert_eq!(quadrant_index(1, 1), 3);
    }

    #[test]
    fn tiles_iterates_bottom_then_top() {
        let record = MetatileRecord::from_bytes(&record_bytes([1, 2, 3, 4, 5, 6, 7, 8]));
        let order: Vec<u16> = record.tiles().map(|t| t.tile_index).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(MetatileRecord::EMPTY, MetatileRecord::default());
    }
}
