//! # Intensity Core
//!
//! Whole-image intensity measurement for microscopy pipelines.
//!
//! Given a named image, optionally masked by a pixel mask and/or restricted
//! to the footprint of segmented objects, this crate computes nine intensity
//! statistics and records them into an explicitly injected measurement store
//! under deterministic feature names.
//!
//! ## Layout
//!
//! - [`image`]: pixel and label containers, lookup traits
//! - [`stats`]: the statistics over the effective mask
//! - [`features`]: feature naming and storage kinds
//! - [`measurement`]: the measurement store and column schema
//! - [`settings`]: module configuration and revision upgrades
//! - [`formats`]: binary settings persistence
//! - [`module`]: the per-entry measurement module
//! - [`registry`]: modules keyed by stable identifier

pub mod features;
pub mod formats;
pub mod image;
pub mod measurement;
pub mod module;
pub mod registry;
pub mod settings;
pub mod stats;

pub use features::{Feature, INTENSITY_CATEGORY};
pub use image::{Image, ImageSet, ImageSource, ObjectMap, ObjectSet, ObjectSource};
pub use measurement::{ColumnKind, FeatureValue, MeasurementColumn, MeasurementStore, Namespace};
pub use module::{MeasureImageIntensity, MeasurementModule, StatisticsRow, Workspace};
pub use registry::ModuleRegistry;
pub use settings::{ImageMeasurement, MeasureImageIntensitySettings, SettingsV1, VersionedSettings};
pub use stats::IntensityStatistics;

use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors raised by the measurement engine.
///
/// Every variant is a caller or configuration problem; nothing here is
/// transient, so nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntensityError {
    /// A mask or label map does not match the pixel array's shape.
    #[error("{what} shape {found:?} does not match image shape {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// No image with this name is available.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// No objects with this name are available.
    #[error("objects not found: {0}")]
    ObjectsNotFound(String),

    /// Module settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The settings blob carries a revision this build cannot read.
    #[error("unsupported settings revision: {0}")]
    UnsupportedRevision(u8),

    /// The settings blob is not in the expected container format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Payload encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No module is registered under this identifier.
    #[error("unknown module: {0}")]
    UnknownModule(String),
}

impl From<postcard::Error> for IntensityError {
    fn from(err: postcard::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IntensityError>;
