//! # Measurement Module
//!
//! Runs the intensity statistics once per configured entry and records the
//! results under the whole-image namespace.
//!
//! The host supplies images, objects and the measurement store through a
//! [`Workspace`]; the module itself holds nothing but its settings.

use crate::features::{Feature, INTENSITY_CATEGORY};
use crate::image::{ImageSource, ObjectSource};
use crate::measurement::{FeatureValue, MeasurementColumn, MeasurementStore, Namespace};
use crate::settings::{ImageMeasurement, MeasureImageIntensitySettings};
use crate::stats::IntensityStatistics;
use crate::{IntensityError, Result};
use serde::Serialize;

// =============================================================================
// MODULE TRAIT
// =============================================================================

/// Borrowed inputs and output table for one module run.
pub struct Workspace<'a> {
    pub images: &'a dyn ImageSource,
    pub objects: &'a dyn ObjectSource,
    pub measurements: &'a mut MeasurementStore,
}

impl<'a> Workspace<'a> {
    pub fn new(
        images: &'a dyn ImageSource,
        objects: &'a dyn ObjectSource,
        measurements: &'a mut MeasurementStore,
    ) -> Self {
        Self {
            images,
            objects,
            measurements,
        }
    }
}

/// A measurement step the host can schedule.
pub trait MeasurementModule {
    /// Stable identifier of the module kind.
    fn module_name(&self) -> &'static str;

    /// Every column [`MeasurementModule::run`] will write, known before running.
    fn measurement_columns(&self) -> Vec<MeasurementColumn>;

    /// Measure the current image set and write into the workspace's store.
    ///
    /// Returns one display row per written value.
    fn run(&self, workspace: &mut Workspace<'_>) -> Result<Vec<StatisticsRow>>;
}

/// One line of the human-readable result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRow {
    pub image_name: String,
    /// Empty when the entry is not restricted to objects.
    pub object_name: String,
    pub measurement: &'static str,
    pub value: FeatureValue,
}

// =============================================================================
// MEASURE IMAGE INTENSITY
// =============================================================================

/// Whole-image intensity measurement over a list of (image, objects) entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureImageIntensity {
    settings: MeasureImageIntensitySettings,
}

impl MeasureImageIntensity {
    /// Registry identifier.
    pub const MODULE_NAME: &'static str = "MeasureImageIntensity";

    /// Build the module. Fails if the settings do not validate.
    pub fn new(settings: MeasureImageIntensitySettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &MeasureImageIntensitySettings {
        &self.settings
    }

    /// Compute the statistics for a single entry.
    pub fn measure_entry(
        entry: &ImageMeasurement,
        images: &dyn ImageSource,
        objects: &dyn ObjectSource,
    ) -> Result<IntensityStatistics> {
        let image = images
            .image(&entry.image_name)
            .ok_or_else(|| IntensityError::ImageNotFound(entry.image_name.clone()))?;

        let object_map = match entry.object_name() {
            Some(name) => Some(
                objects
                    .objects(name)
                    .ok_or_else(|| IntensityError::ObjectsNotFound(name.to_string()))?,
            ),
            None => None,
        };

        IntensityStatistics::of_image(image, object_map)
    }

    /// Measurement categories this module produces in `namespace`.
    #[must_use]
    pub fn categories(&self, namespace: &Namespace) -> Vec<&'static str> {
        match namespace {
            Namespace::Image => vec![INTENSITY_CATEGORY],
            Namespace::Objects(_) => Vec::new(),
        }
    }

    /// Statistic names produced for a namespace and category.
    #[must_use]
    pub fn measurements(&self, namespace: &Namespace, category: &str) -> Vec<&'static str> {
        if self.categories(namespace).contains(&category) {
            Feature::ALL.iter().map(|f| f.measurement()).collect()
        } else {
            Vec::new()
        }
    }

    /// Suffixes (image or image_objects) a statistic is produced for.
    #[must_use]
    pub fn measurement_images(
        &self,
        namespace: &Namespace,
        category: &str,
        measurement: &str,
    ) -> Vec<String> {
        if !self.measurements(namespace, category).contains(&measurement) {
            return Vec::new();
        }
        self.settings
            .images
            .iter()
            .map(ImageMeasurement::suffix)
            .collect()
    }
}

impl MeasurementModule for MeasureImageIntensity {
    fn module_name(&self) -> &'static str {
        Self::MODULE_NAME
    }

    fn measurement_columns(&self) -> Vec<MeasurementColumn> {
        self.settings
            .images
            .iter()
            .flat_map(|entry| {
                let suffix = entry.suffix();
                Feature::ALL.into_iter().map(move |feature| {
                    MeasurementColumn::new(Namespace::Image, feature.name(&suffix), feature.kind())
                })
            })
            .collect()
    }

    fn run(&self, workspace: &mut Workspace<'_>) -> Result<Vec<StatisticsRow>> {
        self.settings.validate()?;

        // Measure everything before writing so a failed lookup leaves the store untouched.
        let measured = self
            .settings
            .images
            .iter()
            .map(|entry| {
                Self::measure_entry(entry, workspace.images, workspace.objects)
                    .map(|stats| (entry, stats))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(measured.len() * Feature::ALL.len());
        for (entry, stats) in measured {
            let suffix = entry.suffix();
            for (feature, value) in stats.features() {
                workspace
                    .measurements
                    .add_image_measurement(feature.name(&suffix), value);
                rows.push(StatisticsRow {
                    image_name: entry.image_name.clone(),
                    object_name: entry.object_name().unwrap_or_default().to_string(),
                    measurement: feature.measurement(),
                    value,
                });
            }
        }
        Ok(rows)
    }
}

// =============================================================================
// TESTS
// =============================================================================
