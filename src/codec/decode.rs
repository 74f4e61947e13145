//! # Indexed Read Path
//!
//! Decodes a tile sheet into raw palette indices. Only unfiltered, non-interlaced scanlines are
//! accepted; any other filter type is reported rather than guessed at.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::{
    error::{Error, Result},
    metatile::TILE_DIM,
    palette::{PaletteTable, Rgb},
};

use super::{
    chunk::{ChunkReader, IDAT, IEND, PLTE},
    ColourMode, ImageHeader, SIGNATURE,
};

pub const TILE_PIXELS: usize = TILE_DIM * TILE_DIM; // 64

/// Source image as a grid of 4-bit palette indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedRaster {
    pub width: usize,
    pub height: usize,
    pub mode: ColourMode,
    /// Row-major, one index (0-15) per pixel.
    pub pixels: Vec<u8>,
    /// Colours embedded in the image. Only used as a fallback.
    pub palette: Option<Vec<Rgb>>,
}

impl IndexedRaster {
    /// `pixels` must hold exactly `width * height` indices.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width.checked_mul(height);
        if expected != Some(pixels.len()) {
            return Err(Error::format(
                0,
                format!(
                    "{}x{} raster needs {} pixels, got {}",
                    width,
                    height,
                    width.saturating_mul(height),
                    pixels.len()
                ),
            ));
        }
        Ok(IndexedRaster {
            width,
            height,
            mode: ColourMode::Indexed4,
            pixels,
            palette: None,
        })
    }

    /// Out-of-range coordinates read as 0.
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        if x >= self.width {
            return 0;
        }
        y.checked_mul(self.width)
            .and_then(|row| self.pixels.get(row + x))
            .copied()
            .unwrap_or(0)
    }

    pub fn tiles_across(&self) -> usize {
        (self.width + TILE_DIM - 1) / TILE_DIM
    }

    pub fn tiles_down(&self) -> usize {
        (self.height + TILE_DIM - 1) / TILE_DIM
    }

    pub fn tile_count(&self) -> usize {
        self.tiles_across() * self.tiles_down()
    }

    /// 8x8 indices of a tile, numbered row-major across the sheet. Pixels past the image edge
    /// read as 0.
    pub fn tile(&self, tile_idx: usize) -> Option<[u8; TILE_PIXELS]> {
        if tile_idx >= self.tile_count() {
            return None;
        }
        let base_x = (tile_idx % self.tiles_across()) * TILE_DIM;
        let base_y = (tile_idx / self.tiles_across()) * TILE_DIM;

        let mut pixels = [0u8; TILE_PIXELS];
        for py in 0..TILE_DIM {
            for px in 0..TILE_DIM {
                let (x, y) = (base_x + px, base_y + py);
                if x < self.width && y < self.height {
                    pixels[py * TILE_DIM + px] = self.index_at(x, y);
                }
            }
        }
        Some(pixels)
    }

    pub fn embedded_palette(&self) -> Option<PaletteTable> {
        self.palette.clone().map(PaletteTable::new)
    }
}

pub fn decode_indexed(data: &[u8]) -> Result<IndexedRaster> {
    let mut header: Option<ImageHeader> = None;
    let mut palette = None;
    let mut compressed = Vec::new();

    for chunk in ChunkReader::new(data)? {
        let chunk = chunk?;
        if header.is_none() {
            header = Some(ImageHeader::parse(&chunk)?);
            continue;
        }
        match chunk.kind {
            PLTE => palette = Some(parse_plte(chunk.data, chunk.offset)?),
            IDAT => compressed.extend_from_slice(chunk.data),
            IEND => break,
            _ => {}
        }
    }

    let header = header.ok_or_else(|| Error::format(SIGNATURE.len(), "missing IHDR chunk"))?;
    let mode = header.colour_mode()?;
    let bits = mode.index_bits().ok_or(Error::UnsupportedColourMode {
        colour_type: header.colour_type,
        bit_depth: header.bit_depth,
    })?;
    if header.interlace != 0 {
        return Err(Error::format(
            SIGNATURE.len(),
            "interlaced images are not supported",
        ));
    }
    if compressed.is_empty() {
        return Err(Error::format(data.len(), "no IDAT chunks"));
    }

    let width = header.width as usize;
    let height = header.height as usize;
    let needed = image_data_len(width, height, bits)?;

    // one byte past the expected length is enough to detect a stream that keeps going
    let mut raw = Vec::with_capacity(needed.min(compressed.len().saturating_mul(4)));
    ZlibDecoder::new(compressed.as_slice())
        .take(needed as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(Error::Deflate)?;
    if raw.len() > needed {
        return Err(Error::format(
            needed,
            format!(
                "decompressed image data longer than the {} bytes a {}x{} image needs",
                needed, width, height
            ),
        ));
    }

    let pixels = unpack_scanlines(&raw, width, height, bits)?;

    log::debug!(
        "Decoded {}x{} {:?} image ({} palette entries)",
        width,
        height,
        mode,
        palette.as_ref().map_or(0, Vec::len)
    );

    Ok(IndexedRaster {
        width,
        height,
        mode,
        pixels,
        palette,
    })
}

fn parse_plte(data: &[u8], offset: usize) -> Result<Vec<Rgb>> {
    if data.len() % 3 != 0 {
        return Err(Error::format(
            offset,
            format!("PLTE length {} is not a multiple of 3", data.len()),
        ));
    }
    Ok(data
        .chunks_exact(3)
        .map(|c| Rgb {
            r: c[0],
            g: c[1],
            b: c[2],
        })
        .collect())
}

/// Bytes of filtered scanline data for an image of the given size.
fn image_data_len(width: usize, height: usize, bits: usize) -> Result<usize> {
    width
        .checked_mul(bits)
        .and_then(|row_bits| row_bits.checked_add(7))
        .map(|row_bits| row_bits / 8 + 1)
        .and_then(|line| line.checked_mul(height))
        .ok_or_else(|| {
            Error::format(
                0,
                format!("{}x{} image is too large to decode", width, height),
            )
        })
}

/// Offsets in errors refer to the decompressed image data.
fn unpack_scanlines(raw: &[u8], width: usize, height: usize, bits: usize) -> Result<Vec<u8>> {
    let needed = image_data_len(width, height, bits)?;
    let stride = (width * bits + 7) / 8;
    if raw.len() < needed {
        return Err(Error::format(
            raw.len(),
            format!(
                "decompressed image data too short: {} < {}",
                raw.len(),
                needed
            ),
        ));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for (y, line) in raw[..needed].chunks_exact(stride + 1).enumerate() {
        let filter = line[0];
        if filter != 0 {
            return Err(Error::format(
                y * (stride + 1),
                format!(
                    "scanline {} uses filter type {}, only unfiltered scanlines are supported",
                    y, filter
                ),
            ));
        }
        let row = &line[1..];

        match bits {
            4 => {
                for x in 0..width {
                    let byte = row[x / 2];
                    // high nibble holds the left pixel
                    let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                    pixels.push(index);
                }
            }
            // 16 evenly spaced grey levels map onto indices 0-15
            _ => pixels.extend(row[..width].iter().map(|&grey| grey >> 4)),
        }
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::ZlibEncoder, Compression};

    use super::*;
    use crate::codec::{chunk::write_chunk, chunk::IHDR, COLOUR_TYPE_GRAYSCALE};

    fn container(header: ImageHeader, plte: Option<&[u8]>, raw: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut data = SIGNATURE.to_vec();
        write_chunk(&mut data, &IHDR, &header.to_bytes());
        if let Some(plte) = plte {
            write_chunk(&mut data, &PLTE, plte);
        }
        // split the stream over two IDAT chunks
        let (a, b) = compressed.split_at(compressed.len() / 2);
        write_chunk(&mut data, &IDAT, a);
        write_chunk(&mut data, &IDAT, b);
        write_chunk(&mut data, &IEND, &[]);
        data
    }

    #[test]
    fn unpacks_high_nibble_first() {
        // 3x2 image: rows [1,2,3] and [15,0,7]
        let raw = [0, 0x12, 0x30, 0, 0xF0, 0x70];
        let plte = [0u8, 0, 0, 255, 255, 255];
        let data = container(ImageHeader::indexed4(3, 2), Some(&plte), &raw);

        let raster = decode_indexed(&data).unwrap();
        assert_eq!(raster.mode, ColourMode::Indexed4);
        assert_eq!((raster.width, raster.height), (3, 2));
        assert_eq!(raster.pixels, vec![1, 2, 3, 15, 0, 7]);
        assert_eq!(raster.palette.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn grayscale_levels_become_indices() {
        let header = ImageHeader {
            width: 3,
            height: 1,
            bit_depth: 8,
            colour_type: COLOUR_TYPE_GRAYSCALE,
            interlace: 0,
        };
        let data = container(header, None, &[0, 0x00, 0x11, 0xFF]);

        let raster = decode_indexed(&data).unwrap();
        assert_eq!(raster.mode, ColourMode::Grayscale { bit_depth: 8 });
        assert_eq!(raster.pixels, vec![0, 1, 15]);
        assert!(raster.palette.is_none());
    }

    #[test]
    fn rejects_filtered_scanlines() {
        let raw = [0, 0x11, 1, 0x22];
        let data = container(ImageHeader::indexed4(2, 2), None, &raw);
        match decode_indexed(&data) {
            Err(Error::Format { offset, reason }) => {
                assert_eq!(offset, 2);
                assert!(reason.contains("scanline 1"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_true_colour_source() {
        let data = container(ImageHeader::rgba8(1, 1), None, &[0, 1, 2, 3, 4]);
        assert!(matches!(
            decode_indexed(&data),
            Err(Error::UnsupportedColourMode {
                colour_type: 6,
                bit_depth: 8
            })
        ));
    }

    #[test]
    fn rejects_short_image_data() {
        let data = container(ImageHeader::indexed4(4, 4), None, &[0, 0x11, 0x11]);
        assert!(matches!(decode_indexed(&data), Err(Error::Format { .. })));
    }

    #[test]
    fn tiles_are_cut_row_major() {
        let width = 16;
        let pixels: Vec<u8> = (0..width * 8).map(|i| ((i % width) / 8) as u8 + 1).collect();
        let raster = IndexedRaster::new(width, 8, pixels).unwrap();

        assert_eq!(raster.tile_count(), 2);
        assert!(raster.tile(0).unwrap().iter().all(|&p| p == 1));
        assert!(raster.tile(1).unwrap().iter().all(|&p| p == 2));
        assert!(raster.tile(2).is_none());
    }

    #[test]
    fn rejects_image_data_past_the_last_scanline() {
        // 2x1 image needs two bytes; a third keeps the stream going
        let data = container(ImageHeader::indexed4(2, 1), None, &[0, 0x12, 0x00]);
        match decode_indexed(&data) {
            Err(Error::Format { offset, reason }) => {
                assert_eq!(offset, 2);
                assert!(reason.contains("longer"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn oversized_header_fails_before_inflating() {
        // a tiny stream claiming to be 2^32-1 pixels square
        let header = ImageHeader::indexed4(u32::MAX, u32::MAX);
        let data = container(header, None, &[0, 0x11]);
        assert!(matches!(decode_indexed(&data), Err(Error::Format { .. })));
    }

    #[test]
    fn raster_size_must_match_pixels() {
        match IndexedRaster::new(8, 8, vec![0; 63]) {
            Err(Error::Format { reason, .. }) => assert!(reason.contains("needs 64 pixels, got 63")),
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(IndexedRaster::new(usize::MAX, 2, Vec::new()).is_err());

        let mut raster = IndexedRaster::new(2, 1, vec![3, 4]).unwrap();
        raster.pixels.truncate(1);
        assert_eq!(raster.index_at(1, 0), 0);
        assert_eq!(raster.index_at(5, 0), 0);
        assert_eq!(raster.tile(0).unwrap()[..2], [3, 0]);
    }
}
