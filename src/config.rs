//! Filter configuration
//!
//! All values are fixed for the duration of one run. The defaults reproduce the
//! parameters used for the MRCLAM replay: 50 Hz sampling, filtering from sample 600
//! onward, and the landmark subjects 6 through 20.

use crate::error::{LocalizationError, Result};
use log::{info, warn};
use nalgebra::Matrix3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Velocity motion model noise coefficients.
///
/// Six coefficients are carried; only the first four enter the control-space
/// covariance. `alphas[4]` and `alphas[5]` are accepted but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MotionNoise {
    pub alphas: [f64; 6],
}

impl Default for MotionNoise {
    fn default() -> Self {
        MotionNoise {
            alphas: [0.2, 0.03, 0.09, 0.08, 0.0, 0.0],
        }
    }
}

impl MotionNoise {
    pub fn new(alphas: [f64; 6]) -> Self {
        MotionNoise { alphas }
    }

    /// Noise-free motion model
    pub fn zero() -> Self {
        MotionNoise { alphas: [0.0; 6] }
    }

    /// True if one of the unused slots carries a value
    pub fn has_unused_terms(&self) -> bool {
        self.alphas[4] != 0.0 || self.alphas[5] != 0.0
    }
}

/// Range/bearing/identity measurement noise, as standard deviations
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeasurementNoise {
    pub sigma_range: f64,
    pub sigma_bearing: f64,
    pub sigma_id: f64,
}

impl Default for MeasurementNoise {
    fn default() -> Self {
        MeasurementNoise {
            sigma_range: 0.43,
            sigma_bearing: 0.6,
            sigma_id: 1.0,
        }
    }
}

impl MeasurementNoise {
    /// Diagonal measurement covariance Q
    pub fn covariance(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&nalgebra::Vector3::new(
            self.sigma_range.powi(2),
            self.sigma_bearing.powi(2),
            self.sigma_id.powi(2),
        ))
    }
}

/// Inclusive-exclusive band of accepted landmark subject IDs.
///
/// `start` doubles as the offset that rebases a subject ID to a zero-based
/// landmark catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LandmarkBand {
    pub start: u32,
    pub end: u32,
}

impl Default for LandmarkBand {
    fn default() -> Self {
        LandmarkBand { start: 6, end: 21 }
    }
}

impl LandmarkBand {
    pub fn new(start: u32, end: u32) -> Self {
        LandmarkBand { start, end }
    }

    pub fn contains(&self, subject: u32) -> bool {
        subject >= self.start && subject < self.end
    }

    /// Zero-based catalog index for an in-band subject
    pub fn index_of(&self, subject: u32) -> Option<usize> {
        self.contains(subject)
            .then(|| (subject - self.start) as usize)
    }

    /// Subject ID for a catalog index
    pub fn subject_of(&self, index: usize) -> u32 {
        self.start + index as u32
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration of one localization run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Fixed timestep of the sampled trajectory
    pub dt: f64,
    /// Index of the first trajectory sample to filter
    pub start_index: usize,
    pub motion_noise: MotionNoise,
    pub measurement_noise: MeasurementNoise,
    pub landmark_band: LandmarkBand,
    /// A measurement belongs to the current timestep while `t_meas - t < tolerance`
    pub extraction_tolerance: f64,
    /// Measurements older than `t_start - seek_tolerance` are skipped before filtering
    pub seek_tolerance: f64,
    /// Value every entry of the initial covariance is filled with
    pub initial_covariance: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            dt: 0.02,
            start_index: 600,
            motion_noise: MotionNoise::default(),
            measurement_noise: MeasurementNoise::default(),
            landmark_band: LandmarkBand::default(),
            extraction_tolerance: 0.005,
            seek_tolerance: 0.05,
            initial_covariance: 0.01,
        }
    }
}

impl FilterConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: FilterConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LocalizationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded filter config from {}", path.display());
        Ok(config)
    }

    /// Apply keyed overrides, e.g. from a parameter server.
    ///
    /// Recognised keys: `dt`, `start_index`, `alpha1`..`alpha6`, `sigma_range`,
    /// `sigma_bearing`, `sigma_id`, `extraction_tolerance`, `seek_tolerance`,
    /// `initial_covariance`. Unknown keys are rejected.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        let mut updated = self.clone();
        for (key, &value) in params {
            match key.as_str() {
                "dt" => updated.dt = value,
                "start_index" => {
                    if value < 0.0 || value.fract() != 0.0 {
                        return Err(LocalizationError::Config(
                            "start_index must be a non-negative integer".to_string(),
                        ));
                    }
                    updated.start_index = value as usize;
                }
                "alpha1" => updated.motion_noise.alphas[0] = value,
                "alpha2" => updated.motion_noise.alphas[1] = value,
                "alpha3" => updated.motion_noise.alphas[2] = value,
                "alpha4" => updated.motion_noise.alphas[3] = value,
                "alpha5" => updated.motion_noise.alphas[4] = value,
                "alpha6" => updated.motion_noise.alphas[5] = value,
                "sigma_range" => updated.measurement_noise.sigma_range = value,
                "sigma_bearing" => updated.measurement_noise.sigma_bearing = value,
                "sigma_id" => updated.measurement_noise.sigma_id = value,
                "extraction_tolerance" => updated.extraction_tolerance = value,
                "seek_tolerance" => updated.seek_tolerance = value,
                "initial_covariance" => updated.initial_covariance = value,
                other => {
                    return Err(LocalizationError::Config(format!(
                        "Unknown parameter '{}'",
                        other
                    )))
                }
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(LocalizationError::Config(
                "Timestep dt must be positive".to_string(),
            ));
        }
        if self.motion_noise.alphas.iter().any(|a| !(*a >= 0.0)) {
            return Err(LocalizationError::Config(
                "Motion noise coefficients must be non-negative".to_string(),
            ));
        }
        let sigmas = [
            self.measurement_noise.sigma_range,
            self.measurement_noise.sigma_bearing,
            self.measurement_noise.sigma_id,
        ];
        if sigmas.iter().any(|s| !(*s > 0.0)) {
            return Err(LocalizationError::Config(
                "Measurement noise standard deviations must be positive".to_string(),
            ));
        }
        if self.landmark_band.is_empty() {
            return Err(LocalizationError::Config(format!(
                "Landmark band [{}, {}) is empty",
                self.landmark_band.start, self.landmark_band.end
            )));
        }
        if !(self.extraction_tolerance > 0.0) || !(self.seek_tolerance >= 0.0) {
            return Err(LocalizationError::Config(
                "Extraction tolerance must be positive and seek tolerance non-negative"
                    .to_string(),
            ));
        }
        if !(self.initial_covariance >= 0.0) {
            return Err(LocalizationError::Config(
                "Initial covariance must be non-negative".to_string(),
            ));
        }
        if self.motion_noise.has_unused_terms() {
            warn!(
                "Motion noise coefficients alpha5/alpha6 ({}, {}) are ignored by the motion model",
                self.motion_noise.alphas[4], self.motion_noise.alphas[5]
            );
        }
        Ok(())
    }

    /// Initial pose covariance
    pub fn initial_covariance_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_element(self.initial_covariance)
    }
}
