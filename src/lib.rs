//! Landmark-based EKF localization for the Prometheus robot.
//!
//! The filter predicts the pose from odometry with a velocity motion model, then
//! fuses range/bearing observations of known landmarks one at a time. Landmark
//! identities are known from barcodes, so no data association is performed.

pub mod common;
pub mod config;
pub mod dataset;
pub mod error;
pub mod perception;
pub mod reporting;

pub use crate::config::FilterConfig;
pub use crate::error::{LocalizationError, Result};

use crate::dataset::sampling::{resample, SampledRun};
use crate::dataset::Dataset;
use crate::perception::{EstimateSequence, Localizer};
use crate::reporting::{ErrorReport, EstimateSink};

/// Result of replaying a dataset through the filter
#[derive(Debug, Clone)]
pub struct Replay {
    pub run: SampledRun,
    pub estimates: EstimateSequence,
    pub report: ErrorReport,
}

/// Resample a loaded dataset and localize the robot over it
pub fn replay(
    dataset: &Dataset,
    config: &FilterConfig,
    sink: Option<&mut dyn EstimateSink>,
) -> Result<Replay> {
    let run = resample(
        &dataset.odometry,
        &dataset.groundtruth,
        &dataset.measurements,
        config.dt,
    )?;
    let resolver = dataset.barcode_table();
    let catalog = dataset.landmark_catalog(config.landmark_band);

    let mut localizer = Localizer::new(config.clone(), &resolver, &catalog)?;
    let estimates = match sink {
        Some(sink) => localizer.run_with_sink(&run.trajectory, &run.measurements, sink)?,
        None => localizer.run(&run.trajectory, &run.measurements)?,
    };
    let report = ErrorReport::compute(&estimates, &run.trajectory);

    Ok(Replay {
        run,
        estimates,
        report,
    })
}
