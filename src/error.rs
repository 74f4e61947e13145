use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("format error at byte {offset:#x}: {reason}")]
    Format { offset: usize, reason: String },

    #[error("format error on line {line}: {reason}")]
    FormatLine { line: usize, reason: String },

    #[error("unsupported colour mode: colour type {colour_type}, bit depth {bit_depth}")]
    UnsupportedColourMode { colour_type: u8, bit_depth: u8 },

    #[error("palette file name {0:?} is not a palette number")]
    PaletteName(String),

    #[error("no palettes available")]
    NoPalettes,

    #[error("deflate stream error: {0}")]
    Deflate(io::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    File { path: PathBuf, source: Box<Error> },
}

impl Error {
    pub fn format(offset: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            offset,
            reason: reason.into(),
        }
    }

    pub fn line(line: usize, reason: impl Into<String>) -> Self {
        Error::FormatLine {
            line,
            reason: reason.into(),
        }
    }

    /// Attach the file being processed. Already-attributed errors keep their
    /// innermost path.
    pub fn in_file(path: impl Into<PathBuf>, err: Error) -> Self {
        match err {
            Error::File { .. } => err,
            other => Error::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
