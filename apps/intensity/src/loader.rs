//! Reading images, masks and label maps from disk.
//!
//! Everything is converted to a single grey channel:
//! - intensities are scaled to `[0, 1]` by the file's bit depth
//! - masks include every non-zero pixel
//! - label maps keep their raw 8- or 16-bit grey values

use crate::error::CliError;
use image::DynamicImage;
use intensity_core::{Image, ObjectMap};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Split a `NAME=PATH` argument.
pub fn parse_named_path(spec: &str) -> Result<(String, PathBuf), CliError> {
    match spec.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(CliError::InvalidArgument(format!(
            "expected NAME=PATH, got {spec:?}"
        ))),
    }
}

fn open(path: &Path) -> Result<DynamicImage, CliError> {
    image::open(path).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn to_array<T>(path: &Path, width: u32, height: u32, data: Vec<T>) -> Result<Array2<T>, CliError> {
    Array2::from_shape_vec((height as usize, width as usize), data).map_err(|err| {
        CliError::InvalidArgument(format!("{}: {}", path.display(), err))
    })
}

/// Load grey intensities scaled to `[0, 1]`.
pub fn load_intensity(path: &Path) -> Result<Array2<f64>, CliError> {
    let decoded = open(path)?;
    let (width, height) = (decoded.width(), decoded.height());

    let data: Vec<f64> = match &decoded {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => decoded
            .to_luma16()
            .into_raw()
            .into_iter()
            .map(|v| f64::from(v) / f64::from(u16::MAX))
            .collect(),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => decoded
            .to_luma32f()
            .into_raw()
            .into_iter()
            .map(f64::from)
            .collect(),
        _ => decoded
            .to_luma8()
            .into_raw()
            .into_iter()
            .map(|v| f64::from(v) / f64::from(u8::MAX))
            .collect(),
    };

    to_array(path, width, height, data)
}

/// Load a mask: non-zero pixels are included.
pub fn load_mask(path: &Path) -> Result<Array2<bool>, CliError> {
    let decoded = open(path)?;
    let (width, height) = (decoded.width(), decoded.height());
    let data = decoded.to_luma16().into_raw().into_iter().map(|v| v != 0).collect();
    to_array(path, width, height, data)
}

/// Load an integer label map.
pub fn load_labels(path: &Path) -> Result<Array2<u32>, CliError> {
    let decoded = open(path)?;
    let (width, height) = (decoded.width(), decoded.height());

    let data: Vec<u32> = match &decoded {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => decoded
            .to_luma8()
            .into_raw()
            .into_iter()
            .map(u32::from)
            .collect(),
        _ => decoded
            .to_luma16()
            .into_raw()
            .into_iter()
            .map(u32::from)
            .collect(),
    };

    to_array(path, width, height, data)
}

/// Load an image file, attaching a mask file when given.
pub fn load_image(path: &Path, mask: Option<&Path>) -> Result<Image, CliError> {
    let image = Image::new(load_intensity(path)?);
    match mask {
        Some(mask_path) => Ok(image.with_mask(load_mask(mask_path)?)?),
        None => Ok(image),
    }
}

/// Load a label-map file.
pub fn load_objects(path: &Path) -> Result<ObjectMap, CliError> {
    Ok(ObjectMap::new(load_labels(path)?))
}

// =============================================================================
// TESTS
// =============================================================================
