//! Known landmark positions

use crate::common::types::Point2D;
use crate::config::LandmarkBand;
use log::warn;
use std::collections::BTreeMap;

/// Groundtruth landmark positions keyed by zero-based catalog index
#[derive(Debug, Clone, Default)]
pub struct LandmarkCatalog {
    positions: BTreeMap<usize, Point2D>,
}

impl LandmarkCatalog {
    pub fn new() -> Self {
        LandmarkCatalog {
            positions: BTreeMap::new(),
        }
    }

    /// Build from `(subject, x, y)` records, rebasing subjects through the band.
    /// Records outside the band are skipped.
    pub fn from_subjects<I>(records: I, band: LandmarkBand) -> Self
    where
        I: IntoIterator<Item = (u32, f64, f64)>,
    {
        let mut catalog = LandmarkCatalog::new();
        for (subject, x, y) in records {
            match band.index_of(subject) {
                Some(index) => catalog.insert(index, (x, y)),
                None => warn!(
                    "Landmark subject {} outside band [{}, {}), ignored",
                    subject, band.start, band.end
                ),
            }
        }
        catalog
    }

    pub fn insert(&mut self, index: usize, position: Point2D) {
        self.positions.insert(index, position);
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.positions.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Point2D)> + '_ {
        self.positions.iter().map(|(&i, &p)| (i, p))
    }
}
