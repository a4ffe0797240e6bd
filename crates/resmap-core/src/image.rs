//! Image tensor layout helpers.
//!
//! Images travel through the pipeline channels-last, `[batch, height, width, channels]`,
//! which is what the data loaders produce. The windowed filters work on planes,
//! `[planes, 1, height, width]`, one plane per (image, channel) pair.

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{ResmapError, Result};

/// Color mode of the images fed to the autoencoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Single luminance channel.
    Grayscale,
    /// Three color channels.
    Rgb,
}

impl ChannelMode {
    /// Number of channels an image in this mode carries.
    pub fn channels(&self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::Rgb => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Rgb => "rgb",
        }
    }
}

impl Default for ChannelMode {
    fn default() -> Self {
        Self::Grayscale
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelMode {
    type Err = ResmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grayscale" | "gray" => Ok(Self::Grayscale),
            "rgb" | "color" => Ok(Self::Rgb),
            other => Err(ResmapError::invalid_mode(format!(
                "unknown color mode '{other}', expected 'grayscale' or 'rgb'"
            ))),
        }
    }
}

/// Mapping from 8-bit pixel values to the range the model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `v / 255`, values in `[0, 1]`.
    Rescale,
    /// Inception-ResNet-v2 style `v / 127.5 - 1`, values in `[-1, 1]`.
    SymmetricUnit,
}

impl Normalization {
    /// Normalize one 8-bit pixel value.
    pub fn apply(&self, value: u8) -> f32 {
        match self {
            Self::Rescale => value as f32 / 255.0,
            Self::SymmetricUnit => value as f32 / 127.5 - 1.0,
        }
    }

    /// Map a normalized value back to 8 bits, saturating.
    pub fn invert(&self, value: f32) -> u8 {
        let raw = match self {
            Self::Rescale => value * 255.0,
            Self::SymmetricUnit => (value + 1.0) * 127.5,
        };
        raw.round().clamp(0.0, 255.0) as u8
    }

    /// `(min, max)` of normalized values.
    pub fn value_range(&self) -> (f32, f32) {
        match self {
            Self::Rescale => (0.0, 1.0),
            Self::SymmetricUnit => (-1.0, 1.0),
        }
    }

    /// Width of the value range, the `L` of the stability constants.
    pub fn dynamic_range(&self) -> f64 {
        let (lo, hi) = self.value_range();
        (hi - lo) as f64
    }
}

/// Add a unit batch dimension to a single `[height, width, channels]` image.
pub fn batched<B: Backend>(image: Tensor<B, 3>) -> Tensor<B, 4> {
    image.unsqueeze::<4>()
}

/// Check that input and reconstruction have identical, non-empty shapes.
///
/// # Returns
/// The shared `[batch, height, width, channels]` dimensions.
///
/// # Errors
/// `ShapeMismatch` if the shapes differ, `EmptyInput` if any dimension is zero.
pub fn ensure_same_shape<B: Backend>(
    input: &Tensor<B, 4>,
    reconstruction: &Tensor<B, 4>,
) -> Result<[usize; 4]> {
    let expected = input.dims();
    let actual = reconstruction.dims();
    if expected != actual {
        return Err(ResmapError::shape_mismatch(&expected, &actual));
    }
    ensure_non_empty(&expected)?;
    Ok(expected)
}

/// Reject shapes with a zero-sized dimension.
pub fn ensure_non_empty(dims: &[usize]) -> Result<()> {
    if dims.iter().any(|&d| d == 0) {
        return Err(ResmapError::empty_input(dims));
    }
    Ok(())
}

/// Mean over all elements of each image in a `[batch, H, W, C]` tensor.
///
/// An empty batch gives an empty `[0]` tensor.
pub fn per_image_mean<B: Backend>(values: Tensor<B, 4>) -> Tensor<B, 1> {
    let [batch, h, w, c] = values.dims();
    if batch == 0 || h * w * c == 0 {
        return Tensor::zeros([batch], &values.device());
    }
    values.reshape([batch, h * w * c]).mean_dim(1).reshape([batch])
}

/// Split channels-last images into single-channel planes.
///
/// `[N, H, W, C]` becomes `[N * C, 1, H, W]`, image-major, so plane `n * C + c`
/// is channel `c` of image `n`.
pub fn to_planes<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, h, w, c] = images.dims();
    images.permute([0isize, 3, 1, 2]).reshape([n * c, 1, h, w])
}

/// Inverse of [`to_planes`].
pub fn from_planes<B: Backend>(planes: Tensor<B, 4>, batch: usize, channels: usize) -> Tensor<B, 4> {
    let [_, _, h, w] = planes.dims();
    planes
        .reshape([batch, channels, h, w])
        .permute([0isize, 2, 3, 1])
}

/// Average channel planes back into one map per image.
///
/// `[N * C, 1, H, W]` becomes `[N, H, W, 1]`.
pub fn mean_over_channels<B: Backend>(planes: Tensor<B, 4>, batch: usize, channels: usize) -> Tensor<B, 4> {
    let [_, _, h, w] = planes.dims();
    planes
        .reshape([batch, channels, h, w])
        .mean_dim(1)
        .permute([0isize, 2, 3, 1])
}
