//! # Conversion Settings
//!
//! Read from a JSON file; every field is optional.
//!
//! ```json
//! { "attribute_layout": "packed4", "compression_level": 6, "optimise_png": true }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    codec::DEFAULT_COMPRESSION,
    error::{Error, Result},
    map::border::DEFAULT_BORDER_METATILE,
    metatile::AttributeLayout,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub attribute_layout: AttributeLayout,
    /// zlib effort, 0-9.
    pub compression_level: u32,
    pub default_border_metatile: u16,
    /// Run oxipng over written RGBA images.
    pub optimise_png: bool,
    /// Batch workers. 0 uses the available parallelism.
    pub threads: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            attribute_layout: AttributeLayout::default(),
            compression_level: DEFAULT_COMPRESSION,
            default_border_metatile: DEFAULT_BORDER_METATILE,
            optimise_png: false,
            threads: 0,
        }
    }
}

impl ConvertConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ConvertConfig = serde_json::from_str(text)?;
        if config.compression_level > 9 {
            return Err(Error::line(
                1,
                format!(
                    "compression_level must be between 0 and 9, got {}",
                    config.compression_level
                ),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::in_file(path, e.into()))?;
        Self::from_json(&text).map_err(|e| Error::in_file(path, e))
    }

    pub fn worker_count(&self, jobs: usize) -> usize {
        let workers = if self.threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.threads
        };
        workers.min(jobs).max(1)
    }
}
