//! Perception module for Prometheus robot
pub mod filters;
pub mod landmarks;
pub mod localization;
pub mod sensors;

pub use self::filters::{Belief, MeasurementCorrector, Prediction};
pub use self::landmarks::LandmarkCatalog;
pub use self::localization::{Estimate, EstimateSequence, FilterPhase, Localizer};
pub use self::sensors::{
    BarcodeTable, IdentityResolver, Observation, ObservationBatch, ObservationExtractor,
    RawMeasurement,
};
