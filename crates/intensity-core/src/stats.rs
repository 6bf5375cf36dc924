//! # Intensity Statistics
//!
//! The nine whole-image statistics over the pixels selected by an
//! effective mask.
//!
//! The effective mask is the image's own mask (all-true when absent) ANDed
//! with the footprint of an optional label map. When it selects no pixels,
//! every statistic is exactly zero: no division, percentile or MAD is
//! attempted over an empty set.
//!
//! Percentiles use linear interpolation between order statistics at rank
//! `q * (n - 1)`, so `[1, 2, 3, 4]` has quartiles 1.75 and 3.25.

use crate::features::Feature;
use crate::image::{check_shape, Image, ObjectMap};
use crate::measurement::FeatureValue;
use crate::Result;
use ndarray::{Array2, ArrayView2, Zip};

// =============================================================================
// EFFECTIVE MASK
// =============================================================================

/// Combine an optional pixel mask with an optional label-map footprint.
///
/// The result always has shape `dim`. Fails if either input has another shape.
pub fn effective_mask(
    dim: (usize, usize),
    mask: Option<ArrayView2<'_, bool>>,
    object_map: Option<ArrayView2<'_, u32>>,
) -> Result<Array2<bool>> {
    let mut effective = match mask {
        Some(mask) => {
            check_shape("mask", dim, mask.dim())?;
            mask.to_owned()
        }
        None => Array2::from_elem(dim, true),
    };

    if let Some(labels) = object_map {
        check_shape("object map", dim, labels.dim())?;
        Zip::from(&mut effective)
            .and(&labels)
            .for_each(|include, &label| *include = *include && label != 0);
    }

    Ok(effective)
}

// =============================================================================
// ORDER STATISTICS
// =============================================================================

/// Percentile of sorted values, `q` in `[0, 1]`, with linear interpolation.
///
/// Returns 0 for an empty slice.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Median of sorted values.
#[must_use]
pub fn median(sorted: &[f64]) -> f64 {
    percentile(sorted, 0.5)
}

/// Median of `|v - median|` over sorted values.
#[must_use]
pub fn median_absolute_deviation(sorted: &[f64]) -> f64 {
    let center = median(sorted);
    let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - center).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    median(&deviations)
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Whole-image intensity statistics for one effective mask.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntensityStatistics {
    /// Number of included pixels.
    pub total_area: usize,
    pub total_intensity: f64,
    pub mean_intensity: f64,
    pub min_intensity: f64,
    pub max_intensity: f64,
    /// Percentage of included pixels equal to the included maximum.
    pub percent_maximal: f64,
    pub mad_intensity: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
}

impl IntensityStatistics {
    /// Compute the statistics over `pixels` restricted by `mask` and the
    /// non-zero footprint of `object_map`.
    ///
    /// Inputs are only read. The only error is a shape mismatch.
    pub fn compute(
        pixels: ArrayView2<'_, f64>,
        mask: Option<ArrayView2<'_, bool>>,
        object_map: Option<ArrayView2<'_, u32>>,
    ) -> Result<Self> {
        let effective = effective_mask(pixels.dim(), mask, object_map)?;
        let values: Vec<f64> = pixels
            .iter()
            .zip(effective.iter())
            .filter_map(|(&value, &include)| include.then_some(value))
            .collect();
        Ok(Self::from_values(values))
    }

    /// Compute the statistics for an image, optionally restricted to objects.
    pub fn of_image(image: &Image, objects: Option<&ObjectMap>) -> Result<Self> {
        Self::compute(image.pixels(), image.mask(), objects.map(ObjectMap::labels))
    }

    /// Statistics over an already-selected multiset of pixel values.
    #[must_use]
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len();
        let mut total = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in &values {
            total += value;
            min = min.min(value);
            max = max.max(value);
        }
        let at_max = values.iter().filter(|&&value| value == max).count();

        values.sort_by(f64::total_cmp);

        Self {
            total_area: n,
            total_intensity: total,
            mean_intensity: total / n as f64,
            min_intensity: min,
            max_intensity: max,
            percent_maximal: 100.0 * at_max as f64 / n as f64,
            mad_intensity: median_absolute_deviation(&values),
            lower_quartile: percentile(&values, 0.25),
            upper_quartile: percentile(&values, 0.75),
        }
    }

    /// Value of one feature, tagged with its storage kind.
    #[must_use]
    pub fn value(&self, feature: Feature) -> FeatureValue {
        match feature {
            Feature::TotalArea => FeatureValue::Integer(self.total_area as i64),
            Feature::TotalIntensity => FeatureValue::Float(self.total_intensity),
            Feature::MeanIntensity => FeatureValue::Float(self.mean_intensity),
            Feature::MinIntensity => FeatureValue::Float(self.min_intensity),
            Feature::MaxIntensity => FeatureValue::Float(self.max_intensity),
            Feature::PercentMaximal => FeatureValue::Float(self.percent_maximal),
            Feature::MadIntensity => FeatureValue::Float(self.mad_intensity),
            Feature::LowerQuartileIntensity => FeatureValue::Float(self.lower_quartile),
            Feature::UpperQuartileIntensity => FeatureValue::Float(self.upper_quartile),
        }
    }

    /// All nine features in output order.
    pub fn features(&self) -> impl Iterator<Item = (Feature, FeatureValue)> + '_ {
        Feature::ALL
            .into_iter()
            .map(move |feature| (feature, self.value(feature)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntensityError;
    use approx::assert_relative_eq;
    use ndarray::{s, Array2};
    use proptest::prelude::*;

    /// Deterministic 10x10 image in [0, 0.99) with a saturated 2x2 block at `origin`.
    fn speckled(origin: usize) -> Array2<f64> {
        let mut pixels = Array2::from_shape_fn((10, 10), |(r, c)| {
            ((r * 37 + c * 91 + 13) % 97) as f64 / 97.0 * 0.99
        });
        pixels
            .slice_mut(s![origin..origin + 2, origin..origin + 2])
            .fill(1.0);
        pixels
    }

    fn interior_mask() -> Array2<bool> {
        let mut mask = Array2::from_elem((10, 10), false);
        mask.slice_mut(s![1..9, 1..9]).fill(true);
        mask
    }

    fn two_objects() -> Array2<u32> {
        let mut labels = Array2::zeros((10, 10));
        labels.slice_mut(s![1..9, 1..5]).fill(1);
        labels.slice_mut(s![1..9, 5..9]).fill(2);
        labels
    }

    #[test]
    fn fully_masked_image_is_all_zero() {
        let pixels = Array2::zeros((10, 10));
        let mask = Array2::from_elem((10, 10), false);
        let stats = IntensityStatistics::compute(pixels.view(), Some(mask.view()), None).unwrap();

        assert_eq!(stats, IntensityStatistics::default());
        for (feature, value) in stats.features() {
            assert_eq!(value.as_f64(), 0.0, "{feature}");
        }
    }

    #[test]
    fn empty_object_footprint_is_all_zero() {
        let pixels = speckled(0);
        let labels = Array2::<u32>::zeros((10, 10));
        let stats = IntensityStatistics::compute(pixels.view(), None, Some(labels.view())).unwrap();
        assert_eq!(stats, IntensityStatistics::default());
    }

    #[test]
    fn unmasked_image() {
        let pixels = speckled(0);
        let stats = IntensityStatistics::compute(pixels.view(), None, None).unwrap();

        assert_eq!(stats.total_area, 100);
        assert_relative_eq!(stats.total_intensity, pixels.sum(), epsilon = 1e-12);
        assert_relative_eq!(stats.mean_intensity, pixels.sum() / 100.0, epsilon = 1e-12);
        assert_eq!(stats.max_intensity, 1.0);
        assert_eq!(
            stats.min_intensity,
            pixels.iter().copied().fold(f64::INFINITY, f64::min)
        );
        assert_eq!(stats.percent_maximal, 4.0);
    }

    #[test]
    fn masked_interior() {
        let pixels = speckled(1);
        let mask = interior_mask();
        let stats = IntensityStatistics::compute(pixels.view(), Some(mask.view()), None).unwrap();

        let interior = pixels.slice(s![1..9, 1..9]);
        assert_eq!(stats.total_area, 64);
        assert_relative_eq!(stats.total_intensity, interior.sum(), epsilon = 1e-12);
        assert_relative_eq!(stats.mean_intensity, interior.sum() / 64.0, epsilon = 1e-12);
        assert_relative_eq!(stats.percent_maximal, 400.0 / 64.0);
    }

    #[test]
    fn objects_match_equivalent_mask() {
        let pixels = speckled(1);
        let labels = two_objects();
        let mask = interior_mask();

        let by_objects =
            IntensityStatistics::compute(pixels.view(), None, Some(labels.view())).unwrap();
        let by_mask = IntensityStatistics::compute(pixels.view(), Some(mask.view()), None).unwrap();

        assert_eq!(by_objects, by_mask);
        assert_eq!(by_objects.total_area, 64);
    }

    #[test]
    fn objects_and_mask_intersect() {
        let pixels = speckled(1);
        let mut labels = Array2::zeros((10, 10));
        labels.slice_mut(s![1..9, 1..5]).fill(1u32);
        labels.slice_mut(s![1..9, 5..]).fill(2);
        let mut mask = Array2::from_elem((10, 10), false);
        mask.slice_mut(s![1..9, ..9]).fill(true);

        let stats =
            IntensityStatistics::compute(pixels.view(), Some(mask.view()), Some(labels.view()))
                .unwrap();

        let interior = pixels.slice(s![1..9, 1..9]);
        assert_eq!(stats.total_area, 64);
        assert_relative_eq!(stats.total_intensity, interior.sum(), epsilon = 1e-12);
        assert_relative_eq!(stats.mean_intensity, interior.sum() / 64.0, epsilon = 1e-12);
    }

    #[test]
    fn quartiles_and_mad_on_known_values() {
        let stats = IntensityStatistics::from_values(vec![4.0, 1.0, 3.0, 2.0]);

        assert_relative_eq!(stats.lower_quartile, 1.75);
        assert_relative_eq!(stats.upper_quartile, 3.25);
        assert_relative_eq!(stats.mad_intensity, 1.0);
        assert_relative_eq!(stats.mean_intensity, 2.5);
        assert_eq!(stats.percent_maximal, 25.0);
    }

    #[test]
    fn single_pixel() {
        let stats = IntensityStatistics::from_values(vec![0.3]);
        assert_eq!(stats.total_area, 1);
        assert_eq!(stats.lower_quartile, 0.3);
        assert_eq!(stats.upper_quartile, 0.3);
        assert_eq!(stats.mad_intensity, 0.0);
        assert_eq!(stats.percent_maximal, 100.0);
    }

    #[test]
    fn zero_max_is_not_special() {
        let stats = IntensityStatistics::from_values(vec![0.0; 5]);
        assert_eq!(stats.max_intensity, 0.0);
        assert_eq!(stats.percent_maximal, 100.0);
        assert_eq!(stats.mean_intensity, 0.0);
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn mask_shape_mismatch() {
        let pixels = Array2::zeros((4, 4));
        let mask = Array2::from_elem((4, 5), true);
        let err = IntensityStatistics::compute(pixels.view(), Some(mask.view()), None).unwrap_err();
        assert_eq!(
            err,
            IntensityError::ShapeMismatch {
                what: "mask",
                expected: (4, 4),
                found: (4, 5),
            }
        );
    }

    #[test]
    fn object_map_shape_mismatch() {
        let pixels = Array2::zeros((4, 4));
        let labels = Array2::<u32>::ones((3, 4));
        let err = IntensityStatistics::compute(pixels.view(), None, Some(labels.view())).unwrap_err();
        assert!(matches!(
            err,
            IntensityError::ShapeMismatch {
                what: "object map",
                ..
            }
        ));
    }

    #[test]
    fn compute_leaves_inputs_untouched() {
        let pixels = speckled(3);
        let mask = interior_mask();
        let labels = two_objects();
        let (p, m, l) = (pixels.clone(), mask.clone(), labels.clone());

        IntensityStatistics::compute(pixels.view(), Some(mask.view()), Some(labels.view()))
            .unwrap();

        assert_eq!((pixels, mask, labels), (p, m, l));
    }

    #[test]
    fn of_image_uses_attached_mask() {
        let image = Image::new(speckled(1)).with_mask(interior_mask()).unwrap();
        let stats = IntensityStatistics::of_image(&image, None).unwrap();
        assert_eq!(stats.total_area, 64);
    }

    fn image_with_masks() -> impl Strategy<Value = (Array2<f64>, Array2<bool>, Array2<u32>)> {
        (1usize..8, 1usize..8).prop_flat_map(|(rows, cols)| {
            let n = rows * cols;
            (
                prop::collection::vec(0.0f64..1.0, n),
                prop::collection::vec(any::<bool>(), n),
                prop::collection::vec(0u32..3, n),
            )
                .prop_map(move |(pixels, mask, labels)| {
                    (
                        Array2::from_shape_vec((rows, cols), pixels).unwrap(),
                        Array2::from_shape_vec((rows, cols), mask).unwrap(),
                        Array2::from_shape_vec((rows, cols), labels).unwrap(),
                    )
                })
        })
    }

    proptest! {
        #[test]
        fn mask_and_objects_equal_anded_mask((pixels, mask, labels) in image_with_masks()) {
            let combined = IntensityStatistics::compute(
                pixels.view(), Some(mask.view()), Some(labels.view())).unwrap();

            let anded = Zip::from(&mask).and(&labels).map_collect(|&m, &l| m && l != 0);
            let single = IntensityStatistics::compute(pixels.view(), Some(anded.view()), None).unwrap();

            prop_assert_eq!(combined, single);
            prop_assert_eq!(combined.total_area, anded.iter().filter(|&&b| b).count());
        }

        #[test]
        fn statistics_are_finite_and_ordered((pixels, mask, _labels) in image_with_masks()) {
            let stats = IntensityStatistics::compute(pixels.view(), Some(mask.view()), None).unwrap();

            for (_, value) in stats.features() {
                prop_assert!(value.as_f64().is_finite());
            }
            if stats.total_area > 0 {
                prop_assert!(stats.min_intensity <= stats.lower_quartile);
                prop_assert!(stats.lower_quartile <= stats.upper_quartile);
                prop_assert!(stats.upper_quartile <= stats.max_intensity);
                prop_assert!(stats.percent_maximal > 0.0 && stats.percent_maximal <= 100.0);
                prop_assert!(
                    (stats.mean_intensity - stats.total_intensity / stats.total_area as f64).abs()
                        < 1e-12
                );
            }
        }
    }
}
