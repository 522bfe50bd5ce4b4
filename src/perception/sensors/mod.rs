//! Landmark measurement stream and observation extraction

use crate::common::angles::normalize_angle;
use crate::config::LandmarkBand;
use log::{debug, warn};
use std::collections::HashMap;

/// A raw range/bearing measurement as recorded by the robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMeasurement {
    pub time: f64,
    pub barcode: u32,
    pub range: f64,
    pub bearing: f64,
}

impl RawMeasurement {
    pub fn new(time: f64, barcode: u32, range: f64, bearing: f64) -> Self {
        RawMeasurement {
            time,
            barcode,
            range,
            bearing,
        }
    }
}

/// Resolves a sensor barcode to a landmark subject ID
pub trait IdentityResolver {
    /// Subject ID for the barcode, if known
    fn resolve(&self, barcode: u32) -> Option<u32>;
}

/// Barcode to subject lookup built from the barcode table
#[derive(Debug, Clone, Default)]
pub struct BarcodeTable {
    subjects: HashMap<u32, u32>,
}

impl BarcodeTable {
    pub fn new() -> Self {
        BarcodeTable {
            subjects: HashMap::new(),
        }
    }

    /// Build from `(subject, barcode)` pairs. A repeated barcode keeps the last subject.
    pub fn from_pairs<I: IntoIterator<Item = (u32, u32)>>(pairs: I) -> Self {
        let subjects = pairs
            .into_iter()
            .map(|(subject, barcode)| (barcode, subject))
            .collect();
        BarcodeTable { subjects }
    }

    pub fn insert(&mut self, barcode: u32, subject: u32) {
        self.subjects.insert(barcode, subject);
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl IdentityResolver for BarcodeTable {
    fn resolve(&self, barcode: u32) -> Option<u32> {
        self.subjects.get(&barcode).copied()
    }
}

/// A valid landmark observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub range: f64,
    /// Bearing in [0, 2π)
    pub bearing: f64,
    /// Zero-based landmark catalog index
    pub landmark: usize,
}

/// Observations attributed to one timestep, in stream order
pub type ObservationBatch = Vec<Observation>;

/// Pulls the observations of each timestep out of a time-ordered measurement stream.
///
/// The extractor owns the read cursor; it only ever moves forward, so every
/// measurement is inspected at most once over a run.
#[derive(Debug, Clone)]
pub struct ObservationExtractor {
    band: LandmarkBand,
    tolerance: f64,
    cursor: usize,
}

impl ObservationExtractor {
    pub fn new(band: LandmarkBand, tolerance: f64) -> Self {
        ObservationExtractor {
            band,
            tolerance,
            cursor: 0,
        }
    }

    /// Index of the next unread measurement
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Skip measurements older than `start_time - margin`
    pub fn seek(&mut self, measurements: &[RawMeasurement], start_time: f64, margin: f64) -> usize {
        while self.cursor < measurements.len()
            && measurements[self.cursor].time < start_time - margin
        {
            self.cursor += 1;
        }
        self.cursor
    }

    /// Consume every unread measurement with `time - current_time < tolerance`.
    ///
    /// Unknown barcodes are logged and dropped; subjects outside the landmark band
    /// (other robots) are dropped silently. Both still advance the cursor.
    pub fn extract<R: IdentityResolver + ?Sized>(
        &mut self,
        measurements: &[RawMeasurement],
        current_time: f64,
        resolver: &R,
    ) -> ObservationBatch {
        let mut batch = ObservationBatch::new();
        while self.cursor < measurements.len()
            && measurements[self.cursor].time - current_time < self.tolerance
        {
            let measurement = &measurements[self.cursor];
            self.cursor += 1;

            let subject = match resolver.resolve(measurement.barcode) {
                Some(subject) => subject,
                None => {
                    warn!(
                        "Barcode {} at t={:.3} not found in barcode table, skipping",
                        measurement.barcode, measurement.time
                    );
                    continue;
                }
            };

            if let Some(landmark) = self.band.index_of(subject) {
                batch.push(Observation {
                    range: measurement.range,
                    bearing: normalize_angle(measurement.bearing),
                    landmark,
                });
            }
        }
        if !batch.is_empty() {
            debug!(
                "Extracted {} observations at t={:.3} (cursor {})",
                batch.len(),
                current_time,
                self.cursor
            );
        }
        batch
    }
}

/// Functional form of [`ObservationExtractor::extract`]: returns the batch and the
/// advanced cursor without holding extractor state.
pub fn extract<R: IdentityResolver + ?Sized>(
    measurements: &[RawMeasurement],
    cursor: usize,
    current_time: f64,
    resolver: &R,
    band: LandmarkBand,
    tolerance: f64,
) -> (ObservationBatch, usize) {
    let mut extractor = ObservationExtractor {
        band,
        tolerance,
        cursor,
    };
    let batch = extractor.extract(measurements, current_time, resolver);
    (batch, extractor.cursor)
}
