//! Local (sliding-window) image statistics.
//!
//! For every pixel the window average `E[.]` over its neighbourhood gives
//!
//! ```text
//! mean     = E[x]
//! variance = E[x^2] - E[x]^2          (clamped at 0)
//! cov      = E[x*y] - E[x] * E[y]     (bounded by (var_x + var_y) / 2, may be negative)
//! ```
//!
//! All inputs are planes `[planes, 1, H, W]`; outputs share that shape.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{ResmapError, Result};
use crate::filter::WindowFilter;
use crate::image::ensure_non_empty;
use crate::window::WindowParameters;

/// Local mean and variance of a single input.
#[derive(Debug, Clone)]
pub struct LocalStatistics<B: Backend> {
    pub mean: Tensor<B, 4>,
    pub variance: Tensor<B, 4>,
}

/// Local means, variances and covariance of two inputs.
#[derive(Debug, Clone)]
pub struct PairStatistics<B: Backend> {
    pub mean_x: Tensor<B, 4>,
    pub mean_y: Tensor<B, 4>,
    pub variance_x: Tensor<B, 4>,
    pub variance_y: Tensor<B, 4>,
    pub covariance: Tensor<B, 4>,
}

/// Windowed moment computation.
#[derive(Debug, Clone)]
pub struct WindowedStatistics<B: Backend> {
    filter: WindowFilter<B>,
}

impl<B: Backend> WindowedStatistics<B> {
    pub fn new(params: &WindowParameters) -> Self {
        Self {
            filter: WindowFilter::new(params),
        }
    }

    /// Local mean and variance of `x`.
    pub fn single(&self, x: Tensor<B, 4>) -> LocalStatistics<B> {
        let planes = x.dims()[0];
        let stacked = Tensor::cat(vec![x.clone(), x.powi_scalar(2)], 0);
        let filtered = self.filter.apply(stacked);

        let mean = filtered.clone().slice([0..planes]);
        let mean_sq = filtered.slice([planes..2 * planes]);
        let variance = (mean_sq - mean.clone().powi_scalar(2)).clamp_min(0.0);

        LocalStatistics { mean, variance }
    }

    /// Local statistics of `x` and `y` and their covariance.
    ///
    /// The five window averages are computed in one filter pass over the
    /// stacked moment planes.
    ///
    /// # Errors
    /// `ShapeMismatch` if `x` and `y` differ in shape, `EmptyInput` if a
    /// dimension is zero.
    pub fn pair(&self, x: Tensor<B, 4>, y: Tensor<B, 4>) -> Result<PairStatistics<B>> {
        let x_dims = x.dims();
        let y_dims = y.dims();
        if x_dims != y_dims {
            return Err(ResmapError::shape_mismatch(&x_dims, &y_dims));
        }
        ensure_non_empty(&x_dims)?;
        let p = x_dims[0];

        let xx = x.clone() * x.clone();
        let yy = y.clone() * y.clone();
        let xy = x.clone() * y.clone();
        let filtered = self.filter.apply(Tensor::cat(vec![x, y, xx, yy, xy], 0));

        let moment = |k: usize| filtered.clone().slice([k * p..(k + 1) * p]);
        let mean_x = moment(0);
        let mean_y = moment(1);
        let variance_x = (moment(2) - mean_x.clone() * mean_x.clone()).clamp_min(0.0);
        let variance_y = (moment(3) - mean_y.clone() * mean_y.clone()).clamp_min(0.0);
        // |cov| <= sqrt(vx * vy) <= (vx + vy) / 2
        let bound = (variance_x.clone() + variance_y.clone()).div_scalar(2.0);
        let covariance = (moment(4) - mean_x.clone() * mean_y.clone())
            .max_pair(bound.clone().neg())
            .min_pair(bound);

        Ok(PairStatistics {
            mean_x,
            mean_y,
            variance_x,
            variance_y,
            covariance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowConfig;
    use burn::tensor::{Distribution, TensorData};
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn box3() -> WindowParameters {
        WindowConfig::new()
            .with_gaussian(false)
            .with_window_size(3)
            .init()
            .unwrap()
    }

    #[test]
    fn test_constant_plane_has_zero_variance() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&WindowParameters::default());
        let x = Tensor::<B, 4>::ones([1, 1, 9, 9], &device) * 0.7;

        let local = stats.single(x);
        for v in local.mean.into_data().to_vec::<f32>().unwrap() {
            assert!((v - 0.7).abs() < 1e-5);
        }
        for v in local.variance.into_data().to_vec::<f32>().unwrap() {
            assert!(v >= 0.0 && v < 1e-6, "variance {v}");
        }
    }

    #[test]
    fn test_box_statistics_center_pixel() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&box3());
        // centre window covers the whole 3x3 image
        let x = Tensor::<B, 4>::from_data(
            TensorData::new((1..=9).map(|v| v as f32).collect::<Vec<_>>(), [1, 1, 3, 3]),
            &device,
        );
        let y = x.clone().neg();

        let pair = stats.pair(x, y).unwrap();
        let var = pair.variance_x.into_data().to_vec::<f32>().unwrap();
        let cov = pair.covariance.into_data().to_vec::<f32>().unwrap();
        // population variance of 1..=9 is 60/9
        assert!((var[4] - 60.0 / 9.0).abs() < 1e-3, "variance {}", var[4]);
        assert!((cov[4] + 60.0 / 9.0).abs() < 1e-3, "covariance {}", cov[4]);
    }

    #[test]
    fn test_constant_pair_has_zero_covariance() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&WindowParameters::default());
        for c in [0.1f32, 0.3, 0.7] {
            let x = Tensor::<B, 4>::ones([1, 1, 16, 16], &device).mul_scalar(c);
            let pair = stats.pair(x.clone(), x).unwrap();
            for v in pair.covariance.into_data().to_vec::<f32>().unwrap() {
                assert!(v >= 0.0 && v < 1e-6, "c={c}: covariance {v}");
            }
        }
    }

    #[test]
    fn test_empty_planes_rejected() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&box3());
        let x = Tensor::<B, 4>::zeros([0, 1, 8, 8], &device);
        assert!(matches!(stats.pair(x.clone(), x), Err(ResmapError::EmptyInput { .. })));
    }

    #[test]
    fn test_pair_shape_mismatch() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&box3());
        let x = Tensor::<B, 4>::zeros([1, 1, 8, 8], &device);
        let y = Tensor::<B, 4>::zeros([1, 1, 4, 4], &device);
        assert!(matches!(stats.pair(x, y), Err(ResmapError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_variances_never_negative() {
        let device = Default::default();
        let stats = WindowedStatistics::<B>::new(&WindowParameters::default());
        let x = Tensor::<B, 4>::random([3, 1, 16, 16], Distribution::Uniform(0.0, 1.0), &device);
        let y = Tensor::<B, 4>::random([3, 1, 16, 16], Distribution::Uniform(0.0, 1.0), &device);

        let pair = stats.pair(x, y).unwrap();
        assert_eq!(pair.covariance.dims(), [3, 1, 16, 16]);
        let min_x = pair.variance_x.min().into_scalar();
        let min_y = pair.variance_y.min().into_scalar();
        assert!(min_x >= 0.0 && min_y >= 0.0);
    }
}
