//! # Module Registry
//!
//! Measurement modules keyed by a stable identifier.
//!
//! A host pipeline stores each step as (identifier, settings blob). The
//! registry maps the identifier to a factory that decodes the blob,
//! upgrading older revisions, and builds the module.

use crate::formats::decode_settings;
use crate::module::{MeasureImageIntensity, MeasurementModule};
use crate::{IntensityError, Result};
use std::collections::BTreeMap;

/// Builds a module from its encoded settings.
pub type ModuleFactory = fn(&[u8]) -> Result<Box<dyn MeasurementModule>>;

/// Identifier → factory table.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<&'static str, ModuleFactory>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every module this crate provides.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(MeasureImageIntensity::MODULE_NAME, load_measure_image_intensity);
        registry
    }

    /// Register a factory, replacing any previous one under `name`.
    pub fn register(&mut self, name: &'static str, factory: ModuleFactory) {
        self.factories.insert(name, factory);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build the module registered under `name` from its settings blob.
    pub fn load(&self, name: &str, settings: &[u8]) -> Result<Box<dyn MeasurementModule>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| IntensityError::UnknownModule(name.to_string()))?;
        factory(settings)
    }
}

fn load_measure_image_intensity(settings: &[u8]) -> Result<Box<dyn MeasurementModule>> {
    let module = MeasureImageIntensity::new(decode_settings(settings)?)?;
    Ok(Box::new(module))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{encode_settings, encode_versioned};
    use crate::settings::{
        ImageMeasurement, MeasureImageIntensitySettings, SettingsV1, VersionedSettings,
    };

    #[test]
    fn builtin_contains_intensity_module() {
        let registry = ModuleRegistry::with_builtin();
        assert!(registry.contains("MeasureImageIntensity"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["MeasureImageIntensity"]);
    }

    #[test]
    fn load_builds_module_from_blob() {
        let settings = MeasureImageIntensitySettings::new(vec![ImageMeasurement::with_objects(
            "DNA", "Nuclei",
        )]);
        let blob = encode_settings(&settings).unwrap();

        let module = ModuleRegistry::with_builtin()
            .load("MeasureImageIntensity", &blob)
            .unwrap();
        assert_eq!(module.module_name(), "MeasureImageIntensity");
        assert_eq!(module.measurement_columns().len(), 9);
        assert_eq!(
            module.measurement_columns()[0].feature,
            "Intensity_TotalIntensity_DNA_Nuclei"
        );
    }

    #[test]
    fn load_upgrades_legacy_blob() {
        let blob = encode_versioned(&VersionedSettings::V1(SettingsV1 {
            image_names: vec!["DNA".to_string()],
        }))
        .unwrap();

        let module = ModuleRegistry::with_builtin()
            .load("MeasureImageIntensity", &blob)
            .unwrap();
        assert_eq!(
            module.measurement_columns()[4].feature,
            "Intensity_TotalArea_DNA"
        );
    }

    #[test]
    fn load_unknown_module() {
        let result = ModuleRegistry::new().load("MeasureTexture", &[]);
        assert!(matches!(result, Err(IntensityError::UnknownModule(name)) if name == "MeasureTexture"));
    }

    #[test]
    fn load_rejects_invalid_settings() {
        let blob = encode_settings(&MeasureImageIntensitySettings::default()).unwrap();
        let result = ModuleRegistry::with_builtin().load("MeasureImageIntensity", &blob);
        assert!(matches!(result, Err(IntensityError::InvalidSettings(_))));
    }
}
