//! Loading of MRCLAM-style dataset files
//!
//! Every file is whitespace-separated text. Blank lines and lines starting with
//! `#` are skipped.
//!
//! | File                       | Columns                          |
//! |----------------------------|----------------------------------|
//! | `Barcodes.dat`             | subject, barcode                 |
//! | `Landmark_Groundtruth.dat` | subject, x, y \[, x_std, y_std\] |
//! | `RobotN_Odometry.dat`      | time, v, w                       |
//! | `RobotN_Measurement.dat`   | time, barcode, range, bearing    |
//! | `RobotN_Groundtruth.dat`   | time, x, y, theta                |

pub mod sampling;

use crate::common::types::Pose;
use crate::config::LandmarkBand;
use crate::error::{LocalizationError, Result};
use crate::perception::landmarks::LandmarkCatalog;
use crate::perception::sensors::{BarcodeTable, RawMeasurement};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Timestamped odometry reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdometryRecord {
    pub time: f64,
    pub v: f64,
    pub w: f64,
}

/// Timestamped groundtruth pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundtruthRecord {
    pub time: f64,
    pub pose: Pose,
}

/// Landmark position as listed in the groundtruth table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkRecord {
    pub subject: u32,
    pub x: f64,
    pub y: f64,
}

/// Raw logs of one robot plus the shared tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub barcodes: Vec<(u32, u32)>,
    pub landmarks: Vec<LandmarkRecord>,
    pub odometry: Vec<OdometryRecord>,
    pub groundtruth: Vec<GroundtruthRecord>,
    pub measurements: Vec<RawMeasurement>,
}

impl Dataset {
    /// Load the tables and the logs of robot `robot` (1-based) from `dir`
    pub fn load<P: AsRef<Path>>(dir: P, robot: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let dataset = Dataset {
            barcodes: load_barcodes(dir.join("Barcodes.dat"))?,
            landmarks: load_landmarks(dir.join("Landmark_Groundtruth.dat"))?,
            odometry: load_odometry(dir.join(format!("Robot{}_Odometry.dat", robot)))?,
            groundtruth: load_groundtruth(dir.join(format!("Robot{}_Groundtruth.dat", robot)))?,
            measurements: load_measurements(dir.join(format!("Robot{}_Measurement.dat", robot)))?,
        };
        info!(
            "Loaded robot {} from {}: {} barcodes, {} landmarks, {} odometry, {} groundtruth, {} measurements",
            robot,
            dir.display(),
            dataset.barcodes.len(),
            dataset.landmarks.len(),
            dataset.odometry.len(),
            dataset.groundtruth.len(),
            dataset.measurements.len()
        );
        Ok(dataset)
    }

    pub fn barcode_table(&self) -> BarcodeTable {
        BarcodeTable::from_pairs(self.barcodes.iter().copied())
    }

    pub fn landmark_catalog(&self, band: LandmarkBand) -> LandmarkCatalog {
        LandmarkCatalog::from_subjects(self.landmarks.iter().map(|l| (l.subject, l.x, l.y)), band)
    }
}

/// Parse `(subject, barcode)` pairs
pub fn load_barcodes<P: AsRef<Path>>(path: P) -> Result<Vec<(u32, u32)>> {
    parse_file(path.as_ref(), 2, |row| Ok((row.id(0)?, row.id(1)?)))
}

/// Parse landmark positions; the standard deviation columns are optional
pub fn load_landmarks<P: AsRef<Path>>(path: P) -> Result<Vec<LandmarkRecord>> {
    parse_file(path.as_ref(), 3, |row| {
        Ok(LandmarkRecord {
            subject: row.id(0)?,
            x: row.real(1)?,
            y: row.real(2)?,
        })
    })
}

pub fn load_odometry<P: AsRef<Path>>(path: P) -> Result<Vec<OdometryRecord>> {
    parse_file(path.as_ref(), 3, |row| {
        Ok(OdometryRecord {
            time: row.real(0)?,
            v: row.real(1)?,
            w: row.real(2)?,
        })
    })
}

pub fn load_groundtruth<P: AsRef<Path>>(path: P) -> Result<Vec<GroundtruthRecord>> {
    parse_file(path.as_ref(), 4, |row| {
        Ok(GroundtruthRecord {
            time: row.real(0)?,
            pose: Pose::new(row.real(1)?, row.real(2)?, row.real(3)?),
        })
    })
}

pub fn load_measurements<P: AsRef<Path>>(path: P) -> Result<Vec<RawMeasurement>> {
    parse_file(path.as_ref(), 4, |row| {
        let range = row.real(2)?;
        if range < 0.0 {
            return Err(row.error(format!("negative range {}", range)));
        }
        Ok(RawMeasurement::new(row.real(0)?, row.id(1)?, range, row.real(3)?))
    })
}

/// One data line of a dataset file
struct Row<'a> {
    path: &'a Path,
    line: usize,
    fields: Vec<&'a str>,
}

impl Row<'_> {
    fn error(&self, reason: String) -> LocalizationError {
        LocalizationError::Parse {
            path: self.path.to_path_buf(),
            line: self.line,
            reason,
        }
    }

    fn parse<T: FromStr>(&self, column: usize, kind: &str) -> Result<T> {
        let field = self.fields[column];
        field
            .parse()
            .map_err(|_| self.error(format!("column {}: '{}' is not {}", column + 1, field, kind)))
    }

    fn real(&self, column: usize) -> Result<f64> {
        let value: f64 = self.parse(column, "a number")?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.error(format!("column {}: value is not finite", column + 1)))
        }
    }

    /// Integer identifier; tables sometimes store these as `6.0`
    fn id(&self, column: usize) -> Result<u32> {
        if let Ok(id) = self.parse::<u32>(column, "an identifier") {
            return Ok(id);
        }
        let value = self.real(column)?;
        if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Ok(value as u32)
        } else {
            Err(self.error(format!("column {}: {} is not an identifier", column + 1, value)))
        }
    }
}

fn parse_file<T, F>(path: &Path, min_columns: usize, parse_row: F) -> Result<Vec<T>>
where
    F: Fn(&Row<'_>) -> Result<T>,
{
    let contents = fs::read_to_string(path).map_err(|source| LocalizationError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    parse_lines(path, &contents, min_columns, parse_row)
}

fn parse_lines<T, F>(
    path: &Path,
    contents: &str,
    min_columns: usize,
    parse_row: F,
) -> Result<Vec<T>>
where
    F: Fn(&Row<'_>) -> Result<T>,
{
    let mut records = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row = Row {
            path,
            line: i + 1,
            fields: trimmed.split_whitespace().collect(),
        };
        if row.fields.len() < min_columns {
            return Err(row.error(format!(
                "expected at least {} columns, found {}",
                min_columns,
                row.fields.len()
            )));
        }
        records.push(parse_row(&row)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Write one file into a fresh directory that is removed on drop
    fn write_temp(name: &str, contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let (_dir, path) = write_temp(
            "Robot1_Odometry.dat",
            "# Time [s]  v [m/s]  w [rad/s]\n#\n\n1248272272.841 0.0 0.0\n1248272272.859 0.1 -0.2\n",
        );
        let odometry = load_odometry(&path).unwrap();
        assert_eq!(odometry.len(), 2);
        assert_eq!(odometry[1].v, 0.1);
        assert_eq!(odometry[1].w, -0.2);
    }

    #[test]
    fn test_identifiers_accept_float_notation() {
        let (_dir, path) = write_temp("Barcodes.dat", "# Subject # Barcode #\n1 5\n6.0 11\n");
        let barcodes = load_barcodes(&path).unwrap();
        assert_eq!(barcodes, vec![(1, 5), (6, 11)]);
    }

    #[test]
    fn test_landmarks_ignore_std_columns() {
        let (_dir, path) = write_temp(
            "Landmark_Groundtruth.dat",
            "6 1.88032539 -5.57229508 0.00209239 0.00113315\n7 1.0 2.0\n",
        );
        let landmarks = load_landmarks(&path).unwrap();
        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks[0].subject, 6);
        assert_eq!(landmarks[1].y, 2.0);
    }

    #[test]
    fn test_malformed_line_reports_location() {
        let err = parse_lines(Path::new("m.dat"), "0.0 11 1.0 0.1\n0.1 11 abc 0.2\n", 4, |row| {
            Ok(row.real(2)?)
        })
        .unwrap_err();
        match err {
            LocalizationError::Parse { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = parse_lines(Path::new("m.dat"), "0.0 11\n", 4, |_| Ok(())).unwrap_err();
        assert!(matches!(err, LocalizationError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_negative_range_rejected() {
        let (_dir, path) = write_temp("Robot1_Measurement.dat", "0.0 11 -1.0 0.0\n");
        assert!(matches!(
            load_measurements(&path),
            Err(LocalizationError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_barcodes("/nonexistent/Barcodes.dat"),
            Err(LocalizationError::Io { .. })
        ));
    }
}
