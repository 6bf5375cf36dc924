//! # Measurement Store
//!
//! The shared table that modules write named scalar results into.
//!
//! Values are keyed by namespace, feature name and image-set number. The
//! store is always passed to a module explicitly; there is no global table.
//! All maps are `BTreeMap` so listings come out in a stable order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// NAMESPACE
// =============================================================================

/// Which table a measurement belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// Whole-image measurements, one value per image set.
    Image,
    /// Per-object measurements for the named objects.
    Objects(String),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Image => f.write_str("Image"),
            Namespace::Objects(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// VALUES AND COLUMNS
// =============================================================================

/// Storage kind of a measurement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Float,
    Integer,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Float => f.write_str("float"),
            ColumnKind::Integer => f.write_str("integer"),
        }
    }
}

/// A single stored measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
}

impl FeatureValue {
    /// Storage kind of this value.
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            FeatureValue::Float(_) => ColumnKind::Float,
            FeatureValue::Integer(_) => ColumnKind::Integer,
        }
    }

    /// Numeric value widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Float(v) => v,
            FeatureValue::Integer(v) => v as f64,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Float(v) => write!(f, "{:.4}", v),
            FeatureValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

/// A pre-declared output column: where a module will write and what kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeasurementColumn {
    pub namespace: Namespace,
    pub feature: String,
    pub kind: ColumnKind,
}

impl MeasurementColumn {
    #[must_use]
    pub fn new(namespace: Namespace, feature: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            namespace,
            feature: feature.into(),
            kind,
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Measurements for a run, addressed by namespace, feature and image set.
///
/// Image-set numbers start at 1. Writes always target the current image set;
/// [`MeasurementStore::next_image_set`] advances it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementStore {
    image_set_number: u32,
    values: BTreeMap<Namespace, BTreeMap<String, BTreeMap<u32, FeatureValue>>>,
}

impl Default for MeasurementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementStore {
    /// Create an empty store positioned at image set 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            image_set_number: 1,
            values: BTreeMap::new(),
        }
    }

    /// The image set that writes currently target.
    #[must_use]
    pub fn image_set_number(&self) -> u32 {
        self.image_set_number
    }

    /// Advance to the next image set and return its number.
    pub fn next_image_set(&mut self) -> u32 {
        self.image_set_number = self.image_set_number.saturating_add(1);
        self.image_set_number
    }

    /// Record a value for the current image set, replacing any previous one.
    pub fn add(&mut self, namespace: Namespace, feature: impl Into<String>, value: FeatureValue) {
        self.values
            .entry(namespace)
            .or_default()
            .entry(feature.into())
            .or_default()
            .insert(self.image_set_number, value);
    }

    /// Record a whole-image value for the current image set.
    pub fn add_image_measurement(&mut self, feature: impl Into<String>, value: FeatureValue) {
        self.add(Namespace::Image, feature, value);
    }

    /// Value for a specific image set.
    #[must_use]
    pub fn get(&self, namespace: &Namespace, feature: &str, image_set: u32) -> Option<FeatureValue> {
        self.values
            .get(namespace)?
            .get(feature)?
            .get(&image_set)
            .copied()
    }

    /// Value for the current image set.
    #[must_use]
    pub fn current_value(&self, namespace: &Namespace, feature: &str) -> Option<FeatureValue> {
        self.get(namespace, feature, self.image_set_number)
    }

    /// Whole-image value for the current image set.
    #[must_use]
    pub fn current_image_value(&self, feature: &str) -> Option<FeatureValue> {
        self.current_value(&Namespace::Image, feature)
    }

    /// Namespaces that hold at least one feature.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.values.keys()
    }

    /// Feature names recorded under a namespace, in sorted order.
    #[must_use]
    pub fn feature_names(&self, namespace: &Namespace) -> Vec<&str> {
        self.values
            .get(namespace)
            .map(|features| features.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Columns actually present in the store, with the kind of their latest value.
    #[must_use]
    pub fn columns(&self) -> Vec<MeasurementColumn> {
        let mut columns = Vec::new();
        for (namespace, features) in &self.values {
            for (feature, by_set) in features {
                if let Some((_, value)) = by_set.last_key_value() {
                    columns.push(MeasurementColumn::new(
                        namespace.clone(),
                        feature.clone(),
                        value.kind(),
                    ));
                }
            }
        }
        columns
    }

    /// Total number of stored values across all image sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty_at_first_image_set() {
        let store = MeasurementStore::new();
        assert!(store.is_empty());
        assert_eq!(store.image_set_number(), 1);
        assert_eq!(store.namespaces().count(), 0);
    }

    #[test]
    fn add_and_read_current_value() {
        let mut store = MeasurementStore::new();
        store.add_image_measurement("Intensity_TotalArea_DNA", FeatureValue::Integer(64));

        assert_eq!(
            store.current_image_value("Intensity_TotalArea_DNA"),
            Some(FeatureValue::Integer(64))
        );
        assert_eq!(store.current_image_value("Intensity_TotalArea_Actin"), None);
    }

    #[test]
    fn image_sets_are_kept_apart() {
        let mut store = MeasurementStore::new();
        store.add_image_measurement("f", FeatureValue::Float(1.0));
        assert_eq!(store.next_image_set(), 2);
        store.add_image_measurement("f", FeatureValue::Float(2.0));

        assert_eq!(store.get(&Namespace::Image, "f", 1), Some(FeatureValue::Float(1.0)));
        assert_eq!(store.get(&Namespace::Image, "f", 2), Some(FeatureValue::Float(2.0)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.feature_names(&Namespace::Image), vec!["f"]);
    }

    #[test]
    fn rewrite_replaces_value() {
        let mut store = MeasurementStore::new();
        store.add_image_measurement("f", FeatureValue::Float(1.0));
        store.add_image_measurement("f", FeatureValue::Float(3.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_image_value("f"), Some(FeatureValue::Float(3.0)));
    }

    #[test]
    fn columns_reflect_value_kinds() {
        let mut store = MeasurementStore::new();
        store.add_image_measurement("area", FeatureValue::Integer(3));
        store.add(
            Namespace::Objects("Nuclei".to_string()),
            "mean",
            FeatureValue::Float(0.5),
        );

        let columns = store.columns();
        assert_eq!(
            columns,
            vec![
                MeasurementColumn::new(Namespace::Image, "area", ColumnKind::Integer),
                MeasurementColumn::new(
                    Namespace::Objects("Nuclei".to_string()),
                    "mean",
                    ColumnKind::Float
                ),
            ]
        );
    }

    #[test]
    fn value_display() {
        assert_eq!(FeatureValue::Integer(100).to_string(), "100");
        assert_eq!(FeatureValue::Float(6.25).to_string(), "6.2500");
        assert_eq!(FeatureValue::Integer(4).as_f64(), 4.0);
    }
}
