//! # Feature Naming
//!
//! The nine whole-image intensity features and how they are named.
//!
//! Every feature is stored as `Intensity_<Statistic>_<suffix>`, where the
//! suffix is the image name, or `<image>_<objects>` when the measurement is
//! restricted to an object footprint.

use crate::measurement::ColumnKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement category shared by every feature in this module.
pub const INTENSITY_CATEGORY: &str = "Intensity";

/// One whole-image intensity statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    TotalIntensity,
    MeanIntensity,
    MinIntensity,
    MaxIntensity,
    TotalArea,
    PercentMaximal,
    MadIntensity,
    LowerQuartileIntensity,
    UpperQuartileIntensity,
}

impl Feature {
    /// All features in output order.
    pub const ALL: [Feature; 9] = [
        Feature::TotalIntensity,
        Feature::MeanIntensity,
        Feature::MinIntensity,
        Feature::MaxIntensity,
        Feature::TotalArea,
        Feature::PercentMaximal,
        Feature::MadIntensity,
        Feature::LowerQuartileIntensity,
        Feature::UpperQuartileIntensity,
    ];

    /// Statistic name as it appears inside a feature name.
    #[must_use]
    pub const fn measurement(self) -> &'static str {
        match self {
            Feature::TotalIntensity => "TotalIntensity",
            Feature::MeanIntensity => "MeanIntensity",
            Feature::MinIntensity => "MinIntensity",
            Feature::MaxIntensity => "MaxIntensity",
            Feature::TotalArea => "TotalArea",
            Feature::PercentMaximal => "PercentMaximal",
            Feature::MadIntensity => "MADIntensity",
            Feature::LowerQuartileIntensity => "LowerQuartileIntensity",
            Feature::UpperQuartileIntensity => "UpperQuartileIntensity",
        }
    }

    /// Storage kind of this feature's column.
    #[must_use]
    pub const fn kind(self) -> ColumnKind {
        match self {
            Feature::TotalArea => ColumnKind::Integer,
            _ => ColumnKind::Float,
        }
    }

    /// Full feature name for the given suffix.
    #[must_use]
    pub fn name(self, suffix: &str) -> String {
        format!("{}_{}_{}", INTENSITY_CATEGORY, self.measurement(), suffix)
    }

    /// Look a feature up by its statistic name.
    #[must_use]
    pub fn from_measurement(measurement: &str) -> Option<Feature> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.measurement() == measurement)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.measurement())
    }
}

/// Output suffix for an image, optionally restricted to objects.
#[must_use]
pub fn suffix(image_name: &str, object_name: Option<&str>) -> String {
    match object_name {
        Some(objects) => format!("{}_{}", image_name, objects),
        None => image_name.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_template() {
        assert_eq!(
            Feature::TotalIntensity.name("my_image"),
            "Intensity_TotalIntensity_my_image"
        );
        assert_eq!(
            Feature::MadIntensity.name("my_image_my_objects"),
            "Intensity_MADIntensity_my_image_my_objects"
        );
        assert_eq!(
            Feature::UpperQuartileIntensity.name("DNA"),
            "Intensity_UpperQuartileIntensity_DNA"
        );
    }

    #[test]
    fn only_total_area_is_integer() {
        for feature in Feature::ALL {
            let expected = if feature == Feature::TotalArea {
                ColumnKind::Integer
            } else {
                ColumnKind::Float
            };
            assert_eq!(feature.kind(), expected, "{feature}");
        }
    }

    #[test]
    fn suffix_joins_objects() {
        assert_eq!(suffix("DNA", None), "DNA");
        assert_eq!(suffix("DNA", Some("Nuclei")), "DNA_Nuclei");
    }

    #[test]
    fn from_measurement_roundtrips_every_feature() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_measurement(feature.measurement()), Some(feature));
        }
        assert_eq!(Feature::from_measurement("Bogus"), None);
    }
}
