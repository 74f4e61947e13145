//! Converts packed tileset and map data into true-colour tile sheets and layered tile grids.
//!
//! Everything except [`job`] works on byte buffers already in memory.

pub mod binary_utils;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod job;
pub mod map;
pub mod metatile;
pub mod palette;
pub mod render;

pub use config::ConvertConfig;
pub use diagnostics::{Diagnostics, Warning};
pub use error::{Error, Result};
pub use job::{Converter, Job, JobReport};
