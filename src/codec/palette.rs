use crate::{
    diagnostics::{Diagnostics, Warning},
    error::Result,
    palette::PaletteTable,
};

use super::{
    chunk::{write_chunk, ChunkReader, PLTE},
    SIGNATURE,
};

/// Rewrite the PLTE chunk of an indexed image with `palette`. Every other chunk is copied byte
/// for byte, so pixel data is untouched. Images without a PLTE chunk are returned as-is.
pub fn replace_palette(
    data: &[u8],
    palette: &PaletteTable,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<u8>> {
    let mut out = SIGNATURE.to_vec();
    let mut replaced = false;

    for chunk in ChunkReader::new(data)? {
        let chunk = chunk?;
        if chunk.kind == PLTE {
            let mut plte = Vec::with_capacity(palette.len() * 3);
            for colour in palette.colours() {
                plte.extend_from_slice(&[colour.r, colour.g, colour.b]);
            }
            write_chunk(&mut out, &PLTE, &plte);
            replaced = true;
        } else {
            out.extend_from_slice(chunk.raw);
        }
    }

    if !replaced {
        diagnostics.warn(Warning::NoEmbeddedPalette);
        return Ok(data.to_vec());
    }
    log::debug!("Replaced embedded palette with {} colours", palette.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{decode_indexed, encode_indexed, encode_rgba, IndexedRaster},
        palette::Rgb,
    };

    fn grey(level: u8) -> Rgb {
        Rgb {
            r: level,
            g: level,
            b: level,
        }
    }

    #[test]
    fn swaps_colours_and_keeps_pixels() {
        let raster = IndexedRaster::new(2, 2, vec![0, 1, 2, 3]).unwrap();
        let original = encode_indexed(&raster, &PaletteTable::new(vec![grey(0); 4]), 9).unwrap();

        let palette = PaletteTable::new((0..16).map(|i| grey(i * 16)).collect());
        let mut diagnostics = Diagnostics::new();
        let replaced = replace_palette(&original, &palette, &mut diagnostics).unwrap();

        let decoded = decode_indexed(&replaced).unwrap();
        assert_eq!(decoded.pixels, raster.pixels);
        assert_eq!(decoded.palette.unwrap()[3], grey(48));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn image_without_palette_is_copied() {
        let image = image::RgbaImage::new(2, 2);
        let data = encode_rgba(&image, 9).unwrap();
        let mut diagnostics = Diagnostics::new();

        let out = replace_palette(&data, &PaletteTable::new(vec![grey(1)]), &mut diagnostics).unwrap();
        assert_eq!(out, data);
        assert_eq!(diagnostics.warnings(), &[Warning::NoEmbeddedPalette]);
    }
}
