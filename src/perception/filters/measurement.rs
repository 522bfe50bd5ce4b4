//! Range/bearing correction step with known correspondence

use super::Belief;
use crate::common::angles::{normalize_angle, wrap_to_pi};
use crate::common::types::Pose;
use crate::config::{LandmarkBand, MeasurementNoise};
use crate::error::{LocalizationError, Result};
use crate::perception::landmarks::LandmarkCatalog;
use crate::perception::sensors::Observation;
use log::debug;
use nalgebra::{Matrix3, Vector3};

/// Reciprocal condition number below which the innovation covariance is rejected
const MIN_RCOND: f64 = 1e-12;

/// Squared distance under which a landmark is considered on top of the robot
const MIN_RANGE_SQUARED: f64 = 1e-12;

/// Fuses landmark observations into a predicted belief
#[derive(Debug, Clone)]
pub struct MeasurementCorrector {
    q: Matrix3<f64>,
    band: LandmarkBand,
}

impl MeasurementCorrector {
    pub fn new(noise: &MeasurementNoise, band: LandmarkBand) -> Self {
        MeasurementCorrector {
            q: noise.covariance(),
            band,
        }
    }

    /// Measurement noise covariance Q
    pub fn noise(&self) -> &Matrix3<f64> {
        &self.q
    }

    /// Fuse a batch one observation at a time.
    ///
    /// Each update linearizes around the belief left by the previous one, so the
    /// result depends on observation order. An empty batch returns the input as is.
    pub fn correct(
        &self,
        belief: Belief,
        batch: &[Observation],
        catalog: &LandmarkCatalog,
        timestep: usize,
    ) -> Result<Belief> {
        batch.iter().try_fold(belief, |belief, observation| {
            self.fuse(belief, observation, catalog, timestep)
        })
    }

    /// Single EKF update for one observation
    pub fn fuse(
        &self,
        belief: Belief,
        observation: &Observation,
        catalog: &LandmarkCatalog,
        timestep: usize,
    ) -> Result<Belief> {
        let index = observation.landmark;
        let (mx, my) = catalog
            .get(index)
            .ok_or(LocalizationError::UnknownLandmark {
                index,
                subject: self.band.subject_of(index),
                timestep,
            })?;

        let mu = belief.pose.to_vector();
        let sigma = belief.covariance;

        let dx = mx - mu[0];
        let dy = my - mu[1];
        let q = dx * dx + dy * dy;
        if q < MIN_RANGE_SQUARED {
            return Err(LocalizationError::DegenerateGeometry { index, timestep });
        }
        let range = q.sqrt();

        let expected = Vector3::new(
            range,
            normalize_angle(dy.atan2(dx) - mu[2]),
            index as f64,
        );

        #[rustfmt::skip]
        let h = Matrix3::new(
            -dx / range, -dy / range, 0.0,
            dy / q, -dx / q, -1.0,
            0.0, 0.0, 0.0,
        );

        let s = h * sigma * h.transpose() + self.q;
        let rcond = reciprocal_condition(&s);
        let s_inv = match s.try_inverse() {
            Some(s_inv) if rcond > MIN_RCOND => s_inv,
            _ => {
                return Err(LocalizationError::SingularInnovation {
                    index,
                    timestep,
                    rcond,
                })
            }
        };

        let k = sigma * h.transpose() * s_inv;

        let z = Vector3::new(observation.range, observation.bearing, index as f64);
        let mut residual = z - expected;
        residual[1] = wrap_to_pi(residual[1]);

        let mu = mu + k * residual;
        let sigma = (Matrix3::identity() - k * h) * sigma;
        let sigma = (sigma + sigma.transpose()) * 0.5;

        debug!(
            "Step {}: landmark {} residual ({:.4}, {:.4}) -> pose ({:.3}, {:.3}, {:.3})",
            timestep, index, residual[0], residual[1], mu[0], mu[1], mu[2]
        );

        Ok(Belief::new(Pose::from_vector(&mu), sigma))
    }
}

/// Ratio of smallest to largest eigenvalue magnitude of a symmetric matrix
fn reciprocal_condition(s: &Matrix3<f64>) -> f64 {
    let eigenvalues = s.symmetric_eigenvalues();
    let max = eigenvalues.amax();
    let min = eigenvalues.min();
    if !(max > 0.0) {
        return 0.0;
    }
    min / max
}
