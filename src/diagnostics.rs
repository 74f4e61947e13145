//! # Job Diagnostics
//!
//! Recoverable conditions met while converting. None of these abort a job; each one is logged
//! when it is recorded and kept in input order so identical inputs give identical reports.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("attribute table truncated ({have} bytes, expected {expected}), padded with defaults")]
    TruncatedAttributes { have: usize, expected: usize },

    #[error("attribute table missing, using default attributes for {records} metatiles")]
    MissingAttributes { records: usize },

    #[error("{table} has {count} trailing bytes that do not form a whole record")]
    TrailingBytes { table: &'static str, count: usize },

    #[error("palette {requested} not found, falling back to palette {fallback}")]
    MissingPalette { requested: u8, fallback: u8 },

    #[error("metatile {metatile_id} not defined, using empty metatile")]
    MissingMetatile { metatile_id: u16 },

    #[error("tile {tile_index} not present in any tile sheet, left transparent")]
    MissingTile { tile_index: u16 },

    #[error("no border pattern loaded, using metatile {default_id} for empty cells")]
    MissingBorder { default_id: u16 },

    #[error("source image is already true colour, copied unchanged")]
    TrueColourSource,

    #[error("source image has no embedded palette chunk")]
    NoEmbeddedPalette,

    #[error("png optimisation failed: {reason}. File saved unoptimised")]
    OptimisationFailed { reason: String },
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Record `warning` unless an identical one was already recorded in this job.
    pub fn warn_once(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            self.warn(warning);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warn_once_keeps_first_occurrence_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn_once(Warning::MissingPalette {
            requested: 7,
            fallback: 0,
        });
        diagnostics.warn_once(Warning::MissingMetatile { metatile_id: 3 });
        diagnostics.warn_once(Warning::MissingPalette {
            requested: 7,
            fallback: 0,
        });

        assert_eq!(
            diagnostics.warnings(),
            &[
                Warning::MissingPalette {
                    requested: 7,
                    fallback: 0
                },
                Warning::MissingMetatile { metatile_id: 3 },
            ]
        );
    }
}
