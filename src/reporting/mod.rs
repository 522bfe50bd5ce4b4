//! Consumers of the estimate sequence: sinks and groundtruth comparison

use crate::common::angles::angle_diff;
use crate::common::types::{Pose, TrajectorySample};
use crate::error::{LocalizationError, Result};
use crate::perception::localization::Estimate;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// Receives estimates as the filter produces them
pub trait EstimateSink {
    /// Record one estimate, with the groundtruth pose when available
    fn record(&mut self, estimate: &Estimate, groundtruth: Option<&Pose>) -> Result<()>;

    /// Called once after the last estimate
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One CSV line; groundtruth columns stay empty when no groundtruth is known
#[derive(Debug, Serialize)]
struct CsvRow {
    step: usize,
    time: f64,
    x: f64,
    y: f64,
    theta: f64,
    gt_x: Option<f64>,
    gt_y: Option<f64>,
    gt_theta: Option<f64>,
}

/// Writes estimates as CSV rows, header first
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    // Reported in I/O errors
    label: PathBuf,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, label: impl Into<PathBuf>) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(writer),
            label: label.into(),
        }
    }

    /// Flush buffered rows and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|e| LocalizationError::Io {
                path: label,
                source: e.into_error(),
            })
    }
}

impl<W: Write> EstimateSink for CsvSink<W> {
    fn record(&mut self, estimate: &Estimate, groundtruth: Option<&Pose>) -> Result<()> {
        let row = CsvRow {
            step: estimate.step,
            time: estimate.time,
            x: estimate.pose.x,
            y: estimate.pose.y,
            theta: estimate.pose.theta,
            gt_x: groundtruth.map(|p| p.x),
            gt_y: groundtruth.map(|p| p.y),
            gt_theta: groundtruth.map(|p| p.theta),
        };
        self.writer
            .serialize(row)
            .map_err(|source| LocalizationError::Csv {
                path: self.label.clone(),
                source,
            })
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| LocalizationError::Io {
            path: self.label.clone(),
            source,
        })
    }
}

/// Estimate error against groundtruth over a run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ErrorReport {
    pub samples: usize,
    pub rmse_x: f64,
    pub rmse_y: f64,
    /// Heading RMSE using the wrapped angular difference
    pub rmse_theta: f64,
    pub max_position_error: f64,
}

impl ErrorReport {
    /// Compare each estimate with the trajectory sample it was produced for.
    /// Estimates whose step lies outside the trajectory are ignored.
    pub fn compute(estimates: &[Estimate], trajectory: &[TrajectorySample]) -> Self {
        let mut report = ErrorReport::default();
        let (mut sx, mut sy, mut st) = (0.0, 0.0, 0.0);

        for estimate in estimates {
            let truth = match trajectory.get(estimate.step) {
                Some(sample) => sample.groundtruth,
                None => continue,
            };
            let (tx, ty) = truth.position();
            let (x, y) = estimate.pose.position();
            let ex = tx - x;
            let ey = ty - y;
            let et = angle_diff(estimate.pose.theta, truth.theta);
            sx += ex * ex;
            sy += ey * ey;
            st += et * et;
            report.max_position_error = report.max_position_error.max(ex.hypot(ey));
            report.samples += 1;
        }

        if report.samples > 0 {
            let n = report.samples as f64;
            report.rmse_x = (sx / n).sqrt();
            report.rmse_y = (sy / n).sqrt();
            report.rmse_theta = (st / n).sqrt();
        }
        report
    }

    /// Combined planar RMSE
    pub fn rmse_position(&self) -> f64 {
        self.rmse_x.hypot(self.rmse_y)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, RMSE x={:.3} m y={:.3} m theta={:.3} rad, max position error {:.3} m",
            self.samples, self.rmse_x, self.rmse_y, self.rmse_theta, self.max_position_error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Control;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;
    use std::f64::consts::PI;

    fn estimate(step: usize, pose: Pose) -> Estimate {
        Estimate {
            step,
            time: step as f64 * 0.02,
            pose,
            covariance: Matrix3::zeros(),
            observations: 0,
        }
    }

    #[test]
    fn test_csv_sink_rows() {
        let mut sink = CsvSink::new(Vec::new(), "memory");
        sink.record(&estimate(0, Pose::new(1.0, 2.0, 0.5)), Some(&Pose::new(1.5, 2.0, 0.5)))
            .unwrap();
        sink.record(&estimate(1, Pose::new(1.0, 2.0, 0.5)), None)
            .unwrap();
        sink.finish().unwrap();

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("step,time,x,y,theta,gt_x,gt_y,gt_theta")
        );

        type Row = (usize, f64, f64, f64, f64, Option<f64>, Option<f64>, Option<f64>);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows = reader
            .deserialize::<Row>()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (0, 0.0, 1.0, 2.0, 0.5, Some(1.5), Some(2.0), Some(0.5)));
        assert_eq!(rows[1].0, 1);
        assert_relative_eq!(rows[1].1, 0.02);
        assert_eq!((rows[1].5, rows[1].6, rows[1].7), (None, None, None));
    }

    #[test]
    fn test_csv_sink_without_rows_is_empty() {
        let mut sink = CsvSink::new(Vec::new(), "memory");
        sink.finish().unwrap();
        assert!(sink.into_inner().unwrap().is_empty());
    }

    #[test]
    fn test_error_report() {
        let trajectory: Vec<_> = (0..2)
            .map(|i| TrajectorySample::new(i as f64, Control::default(), Pose::new(0.0, 0.0, 0.1)))
            .collect();
        let estimates = vec![
            estimate(0, Pose::new(3.0, 4.0, 0.1)),
            estimate(1, Pose::new(0.0, 0.0, 0.1 + 2.0 * PI)),
            estimate(5, Pose::new(100.0, 0.0, 0.0)),
        ];
        let report = ErrorReport::compute(&estimates, &trajectory);
        assert_eq!(report.samples, 2);
        assert_relative_eq!(report.max_position_error, 5.0);
        assert_relative_eq!(report.rmse_x, (9.0f64 / 2.0).sqrt());
        assert!(report.rmse_theta < 1e-9);
    }
}
