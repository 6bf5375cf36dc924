//! # Module Settings
//!
//! Configuration of the whole-image intensity module and its revision history.
//!
//! Revisions:
//! - **1**: a list of image names, no object restriction.
//! - **2** (current): each entry carries an image name, a `wants_objects`
//!   flag and an object name.
//!
//! Older revisions are upgraded with explicit functions, one per step, rather
//! than being patched in place. Upgrading current settings is a no-op.

use crate::features;
use crate::{IntensityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Revision written by this build.
pub const SETTINGS_REVISION: u8 = 2;

// =============================================================================
// CURRENT REVISION
// =============================================================================

/// One configured measurement: an image, optionally restricted to objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeasurement {
    pub image_name: String,
    pub wants_objects: bool,
    /// Ignored unless `wants_objects` is set.
    pub object_name: String,
}

impl ImageMeasurement {
    /// Measure the whole image.
    #[must_use]
    pub fn image(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            wants_objects: false,
            object_name: String::new(),
        }
    }

    /// Measure the image inside the footprint of the named objects.
    #[must_use]
    pub fn with_objects(image_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            wants_objects: true,
            object_name: object_name.into(),
        }
    }

    /// Object name when the restriction is enabled.
    #[must_use]
    pub fn object_name(&self) -> Option<&str> {
        self.wants_objects.then_some(self.object_name.as_str())
    }

    /// Feature-name suffix: `image` or `image_objects`.
    #[must_use]
    pub fn suffix(&self) -> String {
        features::suffix(&self.image_name, self.object_name())
    }

    fn validate(&self) -> Result<()> {
        if self.image_name.trim().is_empty() {
            return Err(IntensityError::InvalidSettings(
                "image name must not be empty".to_string(),
            ));
        }
        if self.wants_objects && self.object_name.trim().is_empty() {
            return Err(IntensityError::InvalidSettings(format!(
                "object name required for image {}",
                self.image_name
            )));
        }
        Ok(())
    }
}

/// Settings for the whole-image intensity module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureImageIntensitySettings {
    /// Entries in output order.
    pub images: Vec<ImageMeasurement>,
}

impl MeasureImageIntensitySettings {
    #[must_use]
    pub fn new(images: Vec<ImageMeasurement>) -> Self {
        Self { images }
    }

    /// Append another entry.
    pub fn add_image_measurement(&mut self, entry: ImageMeasurement) {
        self.images.push(entry);
    }

    /// Check that the settings can be run.
    ///
    /// Requires at least one entry, non-empty names, and a distinct output
    /// suffix per entry so no two entries write the same features.
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(IntensityError::InvalidSettings(
                "at least one image is required".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for entry in &self.images {
            entry.validate()?;
            let suffix = entry.suffix();
            if !seen.insert(suffix.clone()) {
                return Err(IntensityError::InvalidSettings(format!(
                    "duplicate measurement {}",
                    suffix
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// LEGACY REVISIONS
// =============================================================================

/// Revision 1: image names only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsV1 {
    pub image_names: Vec<String>,
}

/// Settings as read from storage, tagged with their revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedSettings {
    V1(SettingsV1),
    V2(MeasureImageIntensitySettings),
}

impl VersionedSettings {
    /// Revision number of the wrapped settings.
    #[must_use]
    pub fn revision(&self) -> u8 {
        match self {
            VersionedSettings::V1(_) => 1,
            VersionedSettings::V2(_) => 2,
        }
    }

    /// Bring the settings to the current revision.
    #[must_use]
    pub fn upgrade(self) -> MeasureImageIntensitySettings {
        match self {
            VersionedSettings::V1(v1) => upgrade_v1(v1),
            VersionedSettings::V2(current) => current,
        }
    }
}

/// Revision 1 → 2: every image measured without object restriction.
#[must_use]
pub fn upgrade_v1(v1: SettingsV1) -> MeasureImageIntensitySettings {
    MeasureImageIntensitySettings {
        images: v1
            .image_names
            .into_iter()
            .map(ImageMeasurement::image)
            .collect(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
