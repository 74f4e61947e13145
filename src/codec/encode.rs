//! # Write Path
//!
//! Every scanline is written with filter type 0 and the whole image goes into a single IDAT
//! chunk. Output is deterministic for a given input and compression level.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use image::RgbaImage;

use crate::{
    error::{Error, Result},
    palette::PaletteTable,
};

use super::{
    chunk::{write_chunk, IDAT, IEND, IHDR, PLTE},
    decode::IndexedRaster,
    ImageHeader, SIGNATURE,
};

/// Entries written to PLTE for 4-bit output.
const INDEXED_PALETTE_LEN: usize = 16;

fn dimension(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::format(0, format!("image {} {} too large", what, value)))
}

fn deflate(raw: &[u8], compression: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(compression.min(9)));
    encoder.write_all(raw).map_err(Error::Deflate)?;
    encoder.finish().map_err(Error::Deflate)
}

fn container(header: &ImageHeader, plte: Option<&[u8]>, compressed: &[u8]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    write_chunk(&mut out, &IHDR, &header.to_bytes());
    if let Some(plte) = plte {
        write_chunk(&mut out, &PLTE, plte);
    }
    write_chunk(&mut out, &IDAT, compressed);
    write_chunk(&mut out, &IEND, &[]);
    out
}

/// 8-bit RGBA, non-interlaced.
pub fn encode_rgba(image: &RgbaImage, compression: u32) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let stride = width as usize * 4;

    let mut raw = Vec::with_capacity((stride + 1) * height as usize);
    for row in image.as_raw().chunks_exact(stride.max(1)) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let compressed = deflate(&raw, compression)?;
    Ok(container(
        &ImageHeader::rgba8(width, height),
        None,
        &compressed,
    ))
}

/// 4-bit indexed output using the first 16 colours of `palette`, padded with black.
pub fn encode_indexed(
    raster: &IndexedRaster,
    palette: &PaletteTable,
    compression: u32,
) -> Result<Vec<u8>> {
    let width = dimension(raster.width, "width")?;
    let height = dimension(raster.height, "height")?;
    let stride = (raster.width + 1) / 2;

    let mut raw = Vec::with_capacity((stride + 1) * raster.height);
    for row in raster.pixels.chunks_exact(raster.width.max(1)) {
        raw.push(0);
        for pair in row.chunks(2) {
            let high = pair[0] & 0x0F;
            let low = pair.get(1).map_or(0, |p| p & 0x0F);
            raw.push(high << 4 | low);
        }
    }

    let mut plte = Vec::with_capacity(INDEXED_PALETTE_LEN * 3);
    for index in 0..INDEXED_PALETTE_LEN {
        let colour = palette.get(index).unwrap_or_default();
        plte.extend_from_slice(&[colour.r, colour.g, colour.b]);
    }

    let compressed = deflate(&raw, compression)?;
    Ok(container(
        &ImageHeader::indexed4(width, height),
        Some(&plte),
        &compressed,
    ))
}
