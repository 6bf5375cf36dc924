//! Errors surfaced by the command-line front end.

use intensity_core::IntensityError;
use std::path::PathBuf;
use thiserror::Error;

/// Anything that can stop a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure inside the measurement engine.
    #[error(transparent)]
    Intensity(#[from] IntensityError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
