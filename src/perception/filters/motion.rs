//! Velocity motion model prediction step

use super::Belief;
use crate::common::types::{Control, Pose};
use crate::config::MotionNoise;
use nalgebra::{Matrix2, Matrix3, Matrix3x2, Vector3};

/// Output of the prediction step together with the linearization used
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted mean and covariance
    pub belief: Belief,
    /// Motion Jacobian with respect to the pose
    pub g: Matrix3<f64>,
    /// Jacobian mapping control noise into pose space
    pub v: Matrix3x2<f64>,
    /// Control-space noise covariance
    pub m: Matrix2<f64>,
}

/// Propagate a belief through the velocity motion model for one timestep.
///
/// With heading `θ`, `rot = dt·w` and `trans = dt·v`, the pose moves by
/// `trans` along `θ + rot/2` and turns by `rot`. The heading is not wrapped.
pub fn predict(belief: &Belief, control: Control, dt: f64, noise: &MotionNoise) -> Prediction {
    let theta = belief.pose.theta;
    let rot = dt * control.w;
    let half_rot = rot / 2.0;
    let trans = dt * control.v;
    let (sin, cos) = (theta + half_rot).sin_cos();

    #[rustfmt::skip]
    let g = Matrix3::new(
        1.0, 0.0, -trans * sin,
        0.0, 1.0, trans * cos,
        0.0, 0.0, 1.0,
    );

    let a = &noise.alphas;
    #[rustfmt::skip]
    let m = Matrix2::new(
        (a[0] * control.v.abs() + a[1] * control.w.abs()).powi(2), 0.0,
        0.0, (a[2] * control.v.abs() + a[3] * control.w.abs()).powi(2),
    );

    #[rustfmt::skip]
    let v = Matrix3x2::new(
        cos, -0.5 * sin,
        sin, 0.5 * cos,
        0.0, 1.0,
    );

    let delta = Vector3::new(trans * cos, trans * sin, rot);
    let pose = Pose::from_vector(&(belief.pose.to_vector() + delta));
    let covariance = g * belief.covariance * g.transpose() + v * m * v.transpose();

    Prediction {
        belief: Belief::new(pose, covariance),
        g,
        v,
        m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_straight_line_without_noise() {
        let belief = Belief::new(Pose::new(1.0, 2.0, PI / 6.0), Matrix3::zeros());
        let prediction = predict(&belief, Control::new(0.5, 0.0), 0.02, &MotionNoise::zero());

        let pose = prediction.belief.pose;
        assert_relative_eq!(pose.x, 1.0 + 0.5 * 0.02 * (PI / 6.0).cos(), epsilon = 1e-12);
        assert_relative_eq!(pose.y, 2.0 + 0.5 * 0.02 * (PI / 6.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(pose.theta, PI / 6.0, epsilon = 1e-12);
        assert_eq!(prediction.m, Matrix2::zeros());
        assert_eq!(prediction.belief.covariance, Matrix3::zeros());
    }

    #[test]
    fn test_rotation_uses_half_angle() {
        let belief = Belief::new(Pose::default(), Matrix3::identity() * 0.1);
        let prediction = predict(&belief, Control::new(1.0, 1.0), 0.5, &MotionNoise::zero());

        // rot = 0.5, heading for the translation is 0.25
        let pose = prediction.belief.pose;
        assert_relative_eq!(pose.x, 0.5 * 0.25f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(pose.y, 0.5 * 0.25f64.sin(), epsilon = 1e-12);
        assert_relative_eq!(pose.theta, 0.5, epsilon = 1e-12);
        assert_relative_eq!(prediction.g[(0, 2)], -0.5 * 0.25f64.sin(), epsilon = 1e-12);
        assert_relative_eq!(prediction.g[(1, 2)], 0.5 * 0.25f64.cos(), epsilon = 1e-12);
        assert_eq!(prediction.v[(2, 0)], 0.0);
        assert_eq!(prediction.v[(2, 1)], 1.0);
    }

    #[test]
    fn test_control_noise_uses_first_four_alphas() {
        let noise = MotionNoise::new([0.2, 0.03, 0.09, 0.08, 5.0, 5.0]);
        let prediction = predict(&Belief::default(), Control::new(-2.0, 0.5), 0.02, &noise);
        assert_relative_eq!(prediction.m[(0, 0)], (0.2 * 2.0 + 0.03 * 0.5f64).powi(2));
        assert_relative_eq!(prediction.m[(1, 1)], (0.09 * 2.0 + 0.08 * 0.5f64).powi(2));
        assert_eq!(prediction.m[(0, 1)], 0.0);
    }

    #[test]
    fn test_covariance_grows_and_stays_symmetric() {
        let belief = Belief::new(Pose::new(0.0, 0.0, 1.0), Matrix3::identity() * 0.01);
        let prediction = predict(
            &belief,
            Control::new(0.3, -0.2),
            0.02,
            &MotionNoise::default(),
        );
        let p = prediction.belief.covariance;
        assert_relative_eq!(p, p.transpose(), epsilon = 1e-15);
        for i in 0..3 {
            assert!(p[(i, i)] >= belief.covariance[(i, i)]);
        }
    }
}
