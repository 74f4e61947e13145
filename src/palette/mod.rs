//! # Palettes
//!
//! Colour tables that the 4-bit tile indices are resolved against. Tables are loaded once per
//! tileset and never modified afterwards.

pub mod cache;
pub mod jasc;
pub mod store;

use serde::Serialize;

pub use cache::PaletteCache;
pub use jasc::parse_jasc;
pub use store::PaletteStore;

/// Upper bound on colours in one table.
pub const MAX_COLOURS: usize = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaletteTable {
    colours: Vec<Rgb>,
}

impl PaletteTable {
    pub fn new(colours: Vec<Rgb>) -> Self {
        PaletteTable { colours }
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colours.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    pub fn colours(&self) -> &[Rgb] {
        &self.colours
    }
}
