//! EKF building blocks: the belief, the prediction step and the correction step

pub mod measurement;
pub mod motion;

use crate::common::types::Pose;
use nalgebra::Matrix3;

pub use self::measurement::MeasurementCorrector;
pub use self::motion::{predict, Prediction};

/// Gaussian belief over the robot pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Belief {
    pub pose: Pose,
    /// 3x3 covariance over (x, y, theta)
    pub covariance: Matrix3<f64>,
}

impl Belief {
    pub fn new(pose: Pose, covariance: Matrix3<f64>) -> Self {
        Belief { pose, covariance }
    }
}

impl Default for Belief {
    fn default() -> Self {
        Belief::new(Pose::default(), Matrix3::zeros())
    }
}
