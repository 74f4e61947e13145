//! # Map Assembly
//!
//! Decodes the map block grid and border pattern and drives the compositor to produce the
//! tile layers and per-cell metadata of a map.

pub mod assemble;
pub mod blockdata;
pub mod border;

pub use assemble::{AssembledMap, CellMetadata, MapAssembler};
pub use blockdata::{MapBlock, MapGrid};
pub use border::BorderPattern;
