//! # Image Container Codec
//!
//! A small PNG codec covering exactly what the tile pipeline needs: reading 4-bit indexed or
//! grayscale tile sheets, and writing 8-bit RGBA (or 4-bit indexed) images.
//!
//! ## Layout
//! ```text
//! signature (8 bytes)
//! chunk*:  length (u32 BE) | type (4 bytes) | payload | CRC32 over type ‖ payload (u32 BE)
//! ```

pub mod chunk;
pub mod decode;
pub mod encode;
pub mod palette;

use std::io::Cursor;

use crate::{
    binary_utils::{read_u32_be, read_u8},
    error::{Error, Result},
};

pub use chunk::{Chunk, ChunkReader};
pub use decode::{decode_indexed, IndexedRaster};
pub use encode::{encode_indexed, encode_rgba};
pub use palette::replace_palette;

pub const SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// zlib effort used when the caller does not choose one.
pub const DEFAULT_COMPRESSION: u32 = 9;

pub const COLOUR_TYPE_GRAYSCALE: u8 = 0;
pub const COLOUR_TYPE_TRUECOLOUR: u8 = 2;
pub const COLOUR_TYPE_INDEXED: u8 = 3;
pub const COLOUR_TYPE_TRUECOLOUR_ALPHA: u8 = 6;

const HEADER_LEN: usize = 13;

/// Pixel layout of a source image, decided once from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourMode {
    Indexed4,
    Grayscale { bit_depth: u8 },
    TrueColour { alpha: bool },
}

impl ColourMode {
    pub fn from_header(colour_type: u8, bit_depth: u8) -> Result<Self> {
        match (colour_type, bit_depth) {
            (COLOUR_TYPE_INDEXED, 4) => Ok(ColourMode::Indexed4),
            (COLOUR_TYPE_GRAYSCALE, 4 | 8) => Ok(ColourMode::Grayscale { bit_depth }),
            (COLOUR_TYPE_TRUECOLOUR | COLOUR_TYPE_TRUECOLOUR_ALPHA, 8 | 16) => {
                Ok(ColourMode::TrueColour {
                    alpha: colour_type == COLOUR_TYPE_TRUECOLOUR_ALPHA,
                })
            }
            _ => Err(Error::UnsupportedColourMode {
                colour_type,
                bit_depth,
            }),
        }
    }

    /// Bits per pixel for the modes whose samples are palette indices.
    pub fn index_bits(self) -> Option<usize> {
        match self {
            ColourMode::Indexed4 => Some(4),
            ColourMode::Grayscale { bit_depth } => Some(bit_depth as usize),
            ColourMode::TrueColour { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub colour_type: u8,
    pub interlace: u8,
}

impl ImageHeader {
    pub fn rgba8(width: u32, height: u32) -> Self {
        ImageHeader {
            width,
            height,
            bit_depth: 8,
            colour_type: COLOUR_TYPE_TRUECOLOUR_ALPHA,
            interlace: 0,
        }
    }

    pub fn indexed4(width: u32, height: u32) -> Self {
        ImageHeader {
            width,
            height,
            bit_depth: 4,
            colour_type: COLOUR_TYPE_INDEXED,
            interlace: 0,
        }
    }

    pub fn parse(chunk: &Chunk) -> Result<Self> {
        if chunk.kind != chunk::IHDR {
            return Err(Error::format(
                chunk.offset,
                format!(
                    "expected IHDR as first chunk, found {:?}",
                    String::from_utf8_lossy(&chunk.kind)
                ),
            ));
        }
        if chunk.data.len() != HEADER_LEN {
            return Err(Error::format(
                chunk.offset,
                format!("IHDR payload is {} bytes, expected {}", chunk.data.len(), HEADER_LEN),
            ));
        }

        let mut cursor = Cursor::new(chunk.data);
        let width = read_u32_be(&mut cursor)?;
        let height = read_u32_be(&mut cursor)?;
        let bit_depth = read_u8(&mut cursor)?;
        let colour_type = read_u8(&mut cursor)?;
        let _compression = read_u8(&mut cursor)?;
        let _filter = read_u8(&mut cursor)?;
        let interlace = read_u8(&mut cursor)?;

        if width == 0 || height == 0 {
            return Err(Error::format(
                chunk.offset,
                format!("image dimensions {}x{} are empty", width, height),
            ));
        }

        Ok(ImageHeader {
            width,
            height,
            bit_depth,
            colour_type,
            interlace,
        })
    }

    pub fn colour_mode(&self) -> Result<ColourMode> {
        ColourMode::from_header(self.colour_type, self.bit_depth)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.colour_type;
        // compression method 0, filter method 0
        out[12] = self.interlace;
        out
    }
}

/// Check the signature and read the header chunk without touching image data.
pub fn read_header(data: &[u8]) -> Result<ImageHeader> {
    let mut chunks = ChunkReader::new(data)?;
    match chunks.next() {
        Some(chunk) => ImageHeader::parse(&chunk?),
        None => Err(Error::format(SIGNATURE.len(), "missing IHDR chunk")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_supported_modes() {
        assert_eq!(ColourMode::from_header(3, 4).unwrap(), ColourMode::Indexed4);
        assert_eq!(
            ColourMode::from_header(0, 8).unwrap(),
            ColourMode::Grayscale { bit_depth: 8 }
        );
        assert_eq!(
            ColourMode::from_header(6, 8).unwrap(),
            ColourMode::TrueColour { alpha: true }
        );
        assert_eq!(ColourMode::TrueColour { alpha: false }.index_bits(), None);
    }

    #[test]
    fn rejects_other_modes() {
        for (colour_type, bit_depth) in [(3, 8), (3, 2), (0, 16), (4, 8), (0, 1)] {
            assert!(matches!(
                ColourMode::from_header(colour_type, bit_depth),
                Err(Error::UnsupportedColourMode { .. })
            ));
        }
    }

    #[test]
    fn header_bytes_parse_back() {
        let header = ImageHeader::indexed4(128, 256);
        let mut data = SIGNATURE.to_vec();
        chunk::write_chunk(&mut data, &chunk::IHDR, &header.to_bytes());

        assert_eq!(read_header(&data).unwrap(), header);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = SIGNATURE.to_vec();
        data[1] = b'J';
        assert!(matches!(
            read_header(&data),
            Err(Error::Format { offset: 0, .. })
        ));
    }
}
