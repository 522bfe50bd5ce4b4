//! Common utilities and types for Prometheus localization

/// Common types used across the codebase
pub mod types {
    use nalgebra::Vector3;

    /// A 2D point
    pub type Point2D = (f64, f64);

    /// A 2D pose (x, y, theta)
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pose {
        pub x: f64,
        pub y: f64,
        /// Heading in radians
        pub theta: f64,
    }

    impl Pose {
        pub fn new(x: f64, y: f64, theta: f64) -> Self {
            Pose { x, y, theta }
        }

        pub fn to_vector(self) -> Vector3<f64> {
            Vector3::new(self.x, self.y, self.theta)
        }

        pub fn from_vector(v: &Vector3<f64>) -> Self {
            Pose::new(v[0], v[1], v[2])
        }

        pub fn position(&self) -> Point2D {
            (self.x, self.y)
        }
    }

    /// Velocity command applied over one timestep
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Control {
        /// Linear velocity
        pub v: f64,
        /// Angular velocity
        pub w: f64,
    }

    impl Control {
        pub fn new(v: f64, w: f64) -> Self {
            Control { v, w }
        }
    }

    /// One sample of a fixed-rate trajectory
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct TrajectorySample {
        pub time: f64,
        pub control: Control,
        pub groundtruth: Pose,
    }

    impl TrajectorySample {
        pub fn new(time: f64, control: Control, groundtruth: Pose) -> Self {
            TrajectorySample {
                time,
                control,
                groundtruth,
            }
        }
    }
}

/// Angle wrapping helpers
pub mod angles {
    use std::f64::consts::PI;

    /// Two times PI (full circle in radians)
    pub const TWO_PI: f64 = 2.0 * PI;

    /// Normalize an angle to [0, 2π).
    ///
    /// This is the canonical range for stored bearings. Non-finite input is
    /// returned unchanged.
    #[inline]
    pub fn normalize_angle(angle: f64) -> f64 {
        if !angle.is_finite() {
            return angle;
        }
        let a = angle.rem_euclid(TWO_PI);
        // rem_euclid can round up to exactly 2π for tiny negative inputs
        if a >= TWO_PI {
            0.0
        } else {
            a
        }
    }

    /// Wrap an angle to [-π, π).
    ///
    /// Used for angle differences, where the sign matters.
    #[inline]
    pub fn wrap_to_pi(angle: f64) -> f64 {
        if !angle.is_finite() {
            return angle;
        }
        normalize_angle(angle + PI) - PI
    }

    /// Shortest signed rotation from `from` to `to`
    #[inline]
    pub fn angle_diff(from: f64, to: f64) -> f64 {
        wrap_to_pi(to - from)
    }

}
