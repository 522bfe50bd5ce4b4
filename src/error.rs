//! Error types for Prometheus localization

use std::path::PathBuf;
use thiserror::Error;

/// Localization error type
#[derive(Error, Debug)]
pub enum LocalizationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// An in-band landmark has no entry in the landmark catalog
    #[error("Landmark {index} (subject {subject}) observed at timestep {timestep} is missing from the landmark catalog")]
    UnknownLandmark {
        index: usize,
        subject: u32,
        timestep: usize,
    },

    /// Innovation covariance cannot be inverted safely
    #[error("Innovation covariance is singular or ill-conditioned at timestep {timestep} (landmark {index}, rcond {rcond:e})")]
    SingularInnovation {
        index: usize,
        timestep: usize,
        rcond: f64,
    },

    /// Predicted position coincides with a landmark, measurement Jacobian undefined
    #[error("Predicted pose coincides with landmark {index} at timestep {timestep}")]
    DegenerateGeometry { index: usize, timestep: usize },

    #[error("Filter has finished its run and must be seeded again")]
    Finished,

    #[error("Trajectory has no samples")]
    EmptyTrajectory,

    #[error("Start index {start} is out of range for a trajectory of {len} samples")]
    StartOutOfRange { start: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, LocalizationError>;
