//! Structural similarity (SSIM) maps.
//!
//! ```text
//! SSIM = (2*μx*μy + C1)(2*σxy + C2) / ((μx² + μy² + C1)(σx² + σy² + C2))
//! ```
//!
//! The first factor compares luminance, the second contrast and structure.
//! `C1` and `C2` are strictly positive, so a flat window never divides by zero:
//! two equal constant windows score exactly 1.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{ResmapError, Result};
use crate::image::{ensure_same_shape, from_planes, per_image_mean, to_planes};
use crate::stats::WindowedStatistics;
use crate::window::WindowParameters;

/// Per-pixel structural similarity between two grayscale images.
#[derive(Debug, Clone)]
pub struct StructuralSimilarityMap<B: Backend> {
    stats: WindowedStatistics<B>,
    c1: f64,
    c2: f64,
}

impl<B: Backend> StructuralSimilarityMap<B> {
    pub fn new(params: &WindowParameters) -> Self {
        Self {
            stats: WindowedStatistics::new(params),
            c1: params.c1(),
            c2: params.c2(),
        }
    }

    /// SSIM map of two channels-last grayscale batches.
    ///
    /// # Shapes
    /// - x, y: `[batch, height, width, 1]`
    /// - output: `[batch, height, width, 1]`
    ///
    /// # Errors
    /// `ShapeMismatch` if the shapes differ, `ChannelMismatch` if the images
    /// are not single-channel.
    pub fn compute(&self, x: Tensor<B, 4>, y: Tensor<B, 4>) -> Result<Tensor<B, 4>> {
        let [batch, _, _, channels] = ensure_same_shape(&x, &y)?;
        if channels != 1 {
            return Err(ResmapError::ChannelMismatch { mode: "ssim", channels });
        }
        let map = self.compute_planes(to_planes(x), to_planes(y))?;
        Ok(from_planes(map, batch, 1))
    }

    /// SSIM map of `[planes, 1, H, W]` tensors, plane by plane.
    pub fn compute_planes(&self, x: Tensor<B, 4>, y: Tensor<B, 4>) -> Result<Tensor<B, 4>> {
        let s = self.stats.pair(x, y)?;

        let mean_xy = s.mean_x.clone() * s.mean_y.clone();
        let luminance_num = mean_xy.mul_scalar(2.0).add_scalar(self.c1);
        let luminance_den = (s.mean_x.clone() * s.mean_x + s.mean_y.clone() * s.mean_y)
            .add_scalar(self.c1);

        let structure_num = s.covariance.mul_scalar(2.0).add_scalar(self.c2);
        let structure_den = (s.variance_x + s.variance_y).add_scalar(self.c2);

        Ok((luminance_num * structure_num) / (luminance_den * structure_den))
    }

    /// Mean SSIM of each image in a grayscale batch.
    ///
    /// # Shapes
    /// - output: `[batch]`
    pub fn mean_similarity(&self, x: Tensor<B, 4>, y: Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        Ok(per_image_mean(self.compute(x, y)?))
    }
}
