//! # Image and Object Containers
//!
//! Pixel data, pixel masks and label maps as supplied by the host pipeline.
//!
//! The measurement module never owns these: it looks them up by name through
//! [`ImageSource`] and [`ObjectSource`]. [`ImageSet`] and [`ObjectSet`] are
//! the in-memory implementations used by the CLI and the tests.

use crate::{IntensityError, Result};
use ndarray::{Array2, ArrayView2};
use std::collections::BTreeMap;

// =============================================================================
// IMAGE
// =============================================================================

/// A single-channel 2-D image with an optional pixel mask.
///
/// Intensities are conventionally scaled to `[0, 1]`. A missing mask means
/// every pixel is included.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pixels: Array2<f64>,
    mask: Option<Array2<bool>>,
}

impl Image {
    /// Create an unmasked image.
    #[must_use]
    pub fn new(pixels: Array2<f64>) -> Self {
        Self { pixels, mask: None }
    }

    /// Attach a pixel mask (`true` = include).
    ///
    /// Fails if the mask shape differs from the pixel shape.
    pub fn with_mask(mut self, mask: Array2<bool>) -> Result<Self> {
        check_shape("mask", self.pixels.dim(), mask.dim())?;
        self.mask = Some(mask);
        Ok(self)
    }

    /// Pixel intensities.
    #[must_use]
    pub fn pixels(&self) -> ArrayView2<'_, f64> {
        self.pixels.view()
    }

    /// The pixel mask, if one was attached.
    #[must_use]
    pub fn mask(&self) -> Option<ArrayView2<'_, bool>> {
        self.mask.as_ref().map(Array2::view)
    }

    /// Shape as `(rows, cols)`.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }
}

// =============================================================================
// OBJECT MAP
// =============================================================================

/// Integer label map produced by a segmentation step.
///
/// Label 0 is background; any other value marks object membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMap {
    labels: Array2<u32>,
}

impl ObjectMap {
    #[must_use]
    pub fn new(labels: Array2<u32>) -> Self {
        Self { labels }
    }

    /// Raw labels.
    #[must_use]
    pub fn labels(&self) -> ArrayView2<'_, u32> {
        self.labels.view()
    }

    /// Boolean footprint: `true` wherever a pixel belongs to any object.
    #[must_use]
    pub fn footprint(&self) -> Array2<bool> {
        self.labels.mapv(|label| label != 0)
    }

    /// Shape as `(rows, cols)`.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.labels.dim()
    }
}

// =============================================================================
// LOOKUP TRAITS
// =============================================================================

/// Supplies images by name.
pub trait ImageSource {
    /// Look up an image. Returns `None` if no image has this name.
    fn image(&self, name: &str) -> Option<&Image>;
}

/// Supplies label maps by name.
pub trait ObjectSource {
    /// Look up a label map. Returns `None` if no objects have this name.
    fn objects(&self, name: &str) -> Option<&ObjectMap>;
}

// =============================================================================
// IN-MEMORY SETS
// =============================================================================

/// Named images for one image set.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: BTreeMap<String, Image>,
}

impl ImageSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an image under `name`.
    pub fn add(&mut self, name: impl Into<String>, image: Image) {
        self.images.insert(name.into(), image);
    }

    /// Image names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSource for ImageSet {
    fn image(&self, name: &str) -> Option<&Image> {
        self.images.get(name)
    }
}

/// Named label maps for one image set.
#[derive(Debug, Clone, Default)]
pub struct ObjectSet {
    objects: BTreeMap<String, ObjectMap>,
}

impl ObjectSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a label map under `name`.
    pub fn add(&mut self, name: impl Into<String>, objects: ObjectMap) {
        self.objects.insert(name.into(), objects);
    }

    /// Object names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

impl ObjectSource for ObjectSet {
    fn objects(&self, name: &str) -> Option<&ObjectMap> {
        self.objects.get(name)
    }
}

/// Fail with [`IntensityError::ShapeMismatch`] unless `found == expected`.
pub(crate) fn check_shape(
    what: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(IntensityError::ShapeMismatch {
            what,
            expected,
            found,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
