//! Resampling of irregular logs onto a fixed time grid

use super::{GroundtruthRecord, OdometryRecord};
use crate::common::angles::{angle_diff, normalize_angle};
use crate::common::types::{Control, Pose, TrajectorySample};
use crate::error::{LocalizationError, Result};
use crate::perception::sensors::RawMeasurement;
use log::info;

/// A robot's logs on a common time base
#[derive(Debug, Clone, Default)]
pub struct SampledRun {
    /// Absolute time subtracted from every timestamp
    pub origin: f64,
    /// One sample every `dt`, starting at `t = 0`
    pub trajectory: Vec<TrajectorySample>,
    /// Measurements sorted by their shifted timestamp
    pub measurements: Vec<RawMeasurement>,
}

/// Put odometry and groundtruth on a `dt` grid.
///
/// The time origin is the earliest timestamp of the three logs. Controls are held
/// from the latest odometry reading at or before each grid time; groundtruth is
/// interpolated linearly, heading along the shortest arc. The grid ends at the
/// last time covered by both odometry and groundtruth. Measurements keep their
/// own timestamps, shifted to the same origin.
pub fn resample(
    odometry: &[OdometryRecord],
    groundtruth: &[GroundtruthRecord],
    measurements: &[RawMeasurement],
    dt: f64,
) -> Result<SampledRun> {
    if !(dt > 0.0) {
        return Err(LocalizationError::Config(format!(
            "Sampling timestep must be positive, got {}",
            dt
        )));
    }
    if odometry.is_empty() || groundtruth.is_empty() {
        return Err(LocalizationError::EmptyTrajectory);
    }

    let mut odometry = odometry.to_vec();
    odometry.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut groundtruth = groundtruth.to_vec();
    groundtruth.sort_by(|a, b| a.time.total_cmp(&b.time));

    let origin = measurements
        .iter()
        .map(|m| m.time)
        .fold(odometry[0].time.min(groundtruth[0].time), f64::min);

    let end = odometry[odometry.len() - 1]
        .time
        .min(groundtruth[groundtruth.len() - 1].time)
        - origin;
    // Small slack so a grid point landing exactly on `end` is kept
    let count = (end / dt + 1e-9).floor() as usize + 1;

    let mut trajectory = Vec::with_capacity(count);
    let mut odo_index = 0;
    let mut gt_index = 0;
    for k in 0..count {
        let t = k as f64 * dt;
        let absolute = origin + t;

        while odo_index + 1 < odometry.len() && odometry[odo_index + 1].time <= absolute {
            odo_index += 1;
        }
        let odo = &odometry[odo_index];

        while gt_index + 1 < groundtruth.len() && groundtruth[gt_index + 1].time <= absolute {
            gt_index += 1;
        }
        let pose = interpolate(&groundtruth, gt_index, absolute);

        trajectory.push(TrajectorySample::new(t, Control::new(odo.v, odo.w), pose));
    }

    let mut shifted: Vec<RawMeasurement> = measurements
        .iter()
        .map(|m| RawMeasurement {
            time: m.time - origin,
            ..*m
        })
        .collect();
    shifted.sort_by(|a, b| a.time.total_cmp(&b.time));

    info!(
        "Resampled {} odometry and {} groundtruth records onto {} samples (dt={})",
        odometry.len(),
        groundtruth.len(),
        trajectory.len(),
        dt
    );

    Ok(SampledRun {
        origin,
        trajectory,
        measurements: shifted,
    })
}

fn interpolate(groundtruth: &[GroundtruthRecord], index: usize, time: f64) -> Pose {
    let a = &groundtruth[index];
    let b = match groundtruth.get(index + 1) {
        Some(b) if time > a.time && b.time > a.time => b,
        _ => return Pose::new(a.pose.x, a.pose.y, normalize_angle(a.pose.theta)),
    };
    let frac = ((time - a.time) / (b.time - a.time)).clamp(0.0, 1.0);
    Pose::new(
        a.pose.x + frac * (b.pose.x - a.pose.x),
        a.pose.y + frac * (b.pose.y - a.pose.y),
        normalize_angle(a.pose.theta + frac * angle_diff(a.pose.theta, b.pose.theta)),
    )
}
