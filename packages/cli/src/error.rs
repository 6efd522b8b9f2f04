//! Error type for the command-line tool.

use std::path::PathBuf;

use lcz_map_engine::StateError;
use lcz_map_scenario::ScenarioError;
use lcz_map_zone::ZoneError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A KMZ archive could not be read.
    #[error("KMZ error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A KMZ archive is readable but does not hold what was expected.
    #[error("KMZ error: {message}")]
    Kmz {
        /// Description of what went wrong.
        message: String,
    },

    /// The overlay image could not be decoded.
    #[error("PNG error: {0}")]
    Png(#[from] png::DecodingError),

    /// Reading samples or writing a table failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Loading classes or ingesting zones failed.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// A simulation failed.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// The engine state was used out of order.
    #[error(transparent)]
    State(#[from] StateError),

    /// The command-line arguments are inconsistent.
    #[error("{message}")]
    Usage {
        /// Description of what went wrong.
        message: String,
    },
}

impl CliError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`Self::Kmz`] error.
    pub fn kmz(message: impl Into<String>) -> Self {
        Self::Kmz {
            message: message.into(),
        }
    }

    /// Creates a [`Self::Usage`] error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}
