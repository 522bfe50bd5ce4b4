//! Landmark EKF localizer
//!
//! Runs predict, extract and correct once per trajectory sample. The belief is
//! threaded from one timestep to the next as a value: each step consumes the
//! previous belief and produces a new one.

use super::filters::{predict, Belief, MeasurementCorrector};
use super::landmarks::LandmarkCatalog;
use super::sensors::{IdentityResolver, ObservationExtractor, RawMeasurement};
use crate::common::angles::angle_diff;
use crate::common::types::{Pose, TrajectorySample};
use crate::config::FilterConfig;
use crate::error::{LocalizationError, Result};
use crate::reporting::EstimateSink;
use log::{info, trace};
use nalgebra::Matrix3;

/// Phase of the filter within the current timestep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    /// Ready for the next control input
    AwaitingTimestep,
    /// Motion model applied, observations not yet fused
    Predicted,
    /// Observations of the timestep fused
    Corrected,
    /// Control inputs exhausted
    Finished,
}

/// Filter output for one timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Index of the trajectory sample
    pub step: usize,
    pub time: f64,
    pub pose: Pose,
    pub covariance: Matrix3<f64>,
    /// Number of observations fused in this step
    pub observations: usize,
}

/// Estimates of a run, one per processed timestep
pub type EstimateSequence = Vec<Estimate>;

/// A localizer for the robot
pub struct Localizer<'a, R: IdentityResolver + ?Sized> {
    config: FilterConfig,
    resolver: &'a R,
    catalog: &'a LandmarkCatalog,
    extractor: ObservationExtractor,
    corrector: MeasurementCorrector,
    belief: Belief,
    phase: FilterPhase,
}

impl<'a, R: IdentityResolver + ?Sized> Localizer<'a, R> {
    /// Create a new localizer. The configuration is validated here.
    pub fn new(
        config: FilterConfig,
        resolver: &'a R,
        catalog: &'a LandmarkCatalog,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Localizer {
            extractor: ObservationExtractor::new(config.landmark_band, config.extraction_tolerance),
            corrector: MeasurementCorrector::new(&config.measurement_noise, config.landmark_band),
            belief: Belief::new(Pose::default(), config.initial_covariance_matrix()),
            phase: FilterPhase::AwaitingTimestep,
            config,
            resolver,
            catalog,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Current belief
    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    /// Current pose estimate
    pub fn get_pose(&self) -> Pose {
        self.belief.pose
    }

    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    /// Index of the next unread measurement
    pub fn cursor(&self) -> usize {
        self.extractor.cursor()
    }

    /// Reset the filter to a starting belief and skip measurements that predate
    /// `start_time`.
    pub fn seed(&mut self, belief: Belief, start_time: f64, measurements: &[RawMeasurement]) {
        self.extractor = ObservationExtractor::new(
            self.config.landmark_band,
            self.config.extraction_tolerance,
        );
        self.extractor
            .seek(measurements, start_time, self.config.seek_tolerance);
        self.belief = belief;
        self.phase = FilterPhase::AwaitingTimestep;
    }

    /// Process one trajectory sample and return the corrected belief.
    ///
    /// `step` only labels diagnostics. On error the belief is left at the value of
    /// the previous timestep.
    pub fn step(
        &mut self,
        step: usize,
        sample: &TrajectorySample,
        measurements: &[RawMeasurement],
    ) -> Result<Estimate> {
        if self.phase == FilterPhase::Finished {
            return Err(LocalizationError::Finished);
        }

        let prediction = predict(
            &self.belief,
            sample.control,
            self.config.dt,
            &self.config.motion_noise,
        );
        self.phase = FilterPhase::Predicted;

        let batch = self
            .extractor
            .extract(measurements, sample.time, self.resolver);
        let corrected = self
            .corrector
            .correct(prediction.belief, &batch, self.catalog, step)?;

        self.belief = corrected;
        self.phase = FilterPhase::Corrected;

        Ok(Estimate {
            step,
            time: sample.time,
            pose: corrected.pose,
            covariance: corrected.covariance,
            observations: batch.len(),
        })
    }

    /// Filter the trajectory from the configured start index, seeding the belief
    /// with the groundtruth pose at that index.
    pub fn run(
        &mut self,
        trajectory: &[TrajectorySample],
        measurements: &[RawMeasurement],
    ) -> Result<EstimateSequence> {
        self.run_inner(trajectory, measurements, None)
    }

    /// Like [`Localizer::run`], handing every estimate to `sink` as it is produced
    pub fn run_with_sink(
        &mut self,
        trajectory: &[TrajectorySample],
        measurements: &[RawMeasurement],
        sink: &mut dyn EstimateSink,
    ) -> Result<EstimateSequence> {
        let estimates = self.run_inner(trajectory, measurements, Some(&mut *sink))?;
        sink.finish()?;
        Ok(estimates)
    }

    fn run_inner(
        &mut self,
        trajectory: &[TrajectorySample],
        measurements: &[RawMeasurement],
        mut sink: Option<&mut dyn EstimateSink>,
    ) -> Result<EstimateSequence> {
        if trajectory.is_empty() {
            return Err(LocalizationError::EmptyTrajectory);
        }
        let start = self.config.start_index;
        if start >= trajectory.len() {
            return Err(LocalizationError::StartOutOfRange {
                start,
                len: trajectory.len(),
            });
        }

        let first = &trajectory[start];
        let initial = Belief::new(first.groundtruth, self.config.initial_covariance_matrix());
        self.seed(initial, first.time, measurements);
        info!(
            "Localizing from sample {} (t={:.2}) over {} samples, {} measurements (cursor {})",
            start,
            first.time,
            trajectory.len() - start,
            measurements.len(),
            self.cursor()
        );

        let mut estimates = EstimateSequence::with_capacity(trajectory.len() - start);
        for (step, sample) in trajectory.iter().enumerate().skip(start) {
            let estimate = self.step(step, sample, measurements)?;

            let truth = sample.groundtruth;
            trace!(
                "Step {}: error ({:.4}, {:.4}, {:.4})",
                step,
                truth.x - estimate.pose.x,
                truth.y - estimate.pose.y,
                angle_diff(estimate.pose.theta, truth.theta)
            );

            if let Some(sink) = sink.as_deref_mut() {
                sink.record(&estimate, Some(&truth))?;
            }
            estimates.push(estimate);
        }

        self.phase = FilterPhase::Finished;
        info!(
            "Localization finished: {} estimates, {} of {} measurements consumed",
            estimates.len(),
            self.cursor(),
            measurements.len()
        );
        Ok(estimates)
    }
}
