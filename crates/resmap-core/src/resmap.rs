//! Residual maps between input images and their reconstructions.

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{ResmapError, Result};
use crate::image::{ensure_same_shape, mean_over_channels, per_image_mean, to_planes, ChannelMode};
use crate::ssim::StructuralSimilarityMap;
use crate::window::WindowParameters;

/// How a residual map is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResmapMode {
    /// `1 - SSIM` on single-channel images.
    Ssim,
    /// `1 - mean_c SSIM_c` on multi-channel images.
    Mssim,
    /// Channel-mean squared difference.
    SquaredError,
    /// Channel-mean absolute difference.
    AbsoluteError,
}

impl ResmapMode {
    /// Structural similarity mode matching a color mode.
    pub fn for_channel_mode(mode: ChannelMode) -> Self {
        match mode {
            ChannelMode::Grayscale => Self::Ssim,
            ChannelMode::Rgb => Self::Mssim,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssim => "ssim",
            Self::Mssim => "mssim",
            Self::SquaredError => "squared_error",
            Self::AbsoluteError => "absolute_error",
        }
    }

    /// Whether the map is built from windowed structural similarity.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Ssim | Self::Mssim)
    }

    fn check_channels(&self, channels: usize) -> Result<()> {
        let ok = match self {
            Self::Ssim => channels == 1,
            Self::Mssim => channels >= 2,
            Self::SquaredError | Self::AbsoluteError => channels >= 1,
        };
        if ok {
            Ok(())
        } else {
            Err(ResmapError::ChannelMismatch {
                mode: self.as_str(),
                channels,
            })
        }
    }
}

impl fmt::Display for ResmapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResmapMode {
    type Err = ResmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssim" => Ok(Self::Ssim),
            "mssim" => Ok(Self::Mssim),
            "l2" | "mse" | "squared_error" => Ok(Self::SquaredError),
            "l1" | "mae" | "absolute_error" => Ok(Self::AbsoluteError),
            other => Err(ResmapError::invalid_mode(format!("unknown resmap mode '{other}'"))),
        }
    }
}

/// Computes residual maps and their summary scores.
///
/// Every map has shape `[batch, height, width, 1]`, the input's spatial size.
/// Structural modes produce dissimilarities in `[0, 1]`; the distance modes
/// produce raw squared or absolute differences.
#[derive(Debug, Clone)]
pub struct ResidualMapEngine<B: Backend> {
    params: WindowParameters,
    ssim: StructuralSimilarityMap<B>,
}

impl<B: Backend> ResidualMapEngine<B> {
    pub fn new(params: WindowParameters) -> Self {
        Self {
            params,
            ssim: StructuralSimilarityMap::new(&params),
        }
    }

    pub fn params(&self) -> &WindowParameters {
        &self.params
    }

    /// Channel-aggregated similarity map, before inversion.
    ///
    /// For `Ssim` this is the SSIM map itself, for `Mssim` the mean of the
    /// per-channel maps.
    ///
    /// # Errors
    /// `ShapeMismatch`, `ChannelMismatch`, or `InvalidMode` for a distance mode.
    pub fn similarity_map(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
        mode: ResmapMode,
    ) -> Result<Tensor<B, 4>> {
        let [batch, _, _, channels] = ensure_same_shape(&input, &reconstruction)?;
        if !mode.is_structural() {
            return Err(ResmapError::invalid_mode(format!(
                "{mode} does not define a similarity map"
            )));
        }
        mode.check_channels(channels)?;

        let planes = self
            .ssim
            .compute_planes(to_planes(input), to_planes(reconstruction))?;
        Ok(mean_over_channels(planes, batch, channels))
    }

    /// Residual map of each input/reconstruction pair.
    ///
    /// # Shapes
    /// - input, reconstruction: `[batch, height, width, channels]`
    /// - output: `[batch, height, width, 1]`
    ///
    /// # Errors
    /// `ShapeMismatch` if the shapes differ, `EmptyInput` for an empty batch or
    /// image, `ChannelMismatch` if `Ssim` is requested on multi-channel images
    /// or `Mssim` on single-channel ones.
    pub fn compute_resmap(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
        mode: ResmapMode,
    ) -> Result<Tensor<B, 4>> {
        let dims = ensure_same_shape(&input, &reconstruction)?;
        mode.check_channels(dims[3])?;
        tracing::debug!("Computing {} resmap for batch {:?}", mode, dims);

        match mode {
            ResmapMode::Ssim | ResmapMode::Mssim => {
                let similarity = self.similarity_map(input, reconstruction, mode)?;
                Ok(similarity.neg().add_scalar(1.0).clamp(0.0, 1.0))
            }
            ResmapMode::SquaredError => {
                Ok((input - reconstruction).powi_scalar(2).mean_dim(3))
            }
            ResmapMode::AbsoluteError => Ok((input - reconstruction).abs().mean_dim(3)),
        }
    }

    /// Mean residual of each image.
    ///
    /// # Shapes
    /// - resmap: `[batch, height, width, 1]`
    /// - output: `[batch]`
    pub fn summary_score(&self, resmap: Tensor<B, 4>) -> Tensor<B, 1> {
        summary_score(resmap)
    }
}

/// Mean over all pixels of each map in a `[batch, H, W, C]` tensor.
///
/// An empty batch scores as an empty `[0]` tensor.
pub fn summary_score<B: Backend>(resmap: Tensor<B, 4>) -> Tensor<B, 1> {
    per_image_mean(resmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Distribution, TensorData};
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn engine() -> ResidualMapEngine<B> {
        ResidualMapEngine::new(WindowParameters::default())
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("SSIM".parse::<ResmapMode>().unwrap(), ResmapMode::Ssim);
        assert_eq!("mssim".parse::<ResmapMode>().unwrap(), ResmapMode::Mssim);
        assert_eq!("l2".parse::<ResmapMode>().unwrap(), ResmapMode::SquaredError);
        assert_eq!("mae".parse::<ResmapMode>().unwrap(), ResmapMode::AbsoluteError);
        assert!(matches!("ncc".parse::<ResmapMode>(), Err(ResmapError::InvalidMode(_))));
    }

    #[test]
    fn test_identical_resmap_is_zero() {
        let device = Default::default();
        let engine = engine();
        let x = Tensor::<B, 4>::random([2, 16, 16, 3], Distribution::Uniform(0.0, 1.0), &device);

        for mode in [ResmapMode::Mssim, ResmapMode::SquaredError, ResmapMode::AbsoluteError] {
            let resmap = engine.compute_resmap(x.clone(), x.clone(), mode).unwrap();
            assert_eq!(resmap.dims(), [2, 16, 16, 1]);
            let score = engine.summary_score(resmap);
            for v in score.into_data().to_vec::<f32>().unwrap() {
                assert!(v.abs() < 1e-3, "{mode}: expected 0, got {v}");
            }
        }
    }

    #[test]
    fn test_squared_error_channel_mean() {
        let device = Default::default();
        let engine = engine();
        let x = Tensor::<B, 4>::zeros([1, 1, 1, 2], &device);
        let y = Tensor::<B, 4>::from_data(TensorData::new(vec![1.0f32, 3.0], [1, 1, 1, 2]), &device);

        let squared = engine.compute_resmap(x.clone(), y.clone(), ResmapMode::SquaredError).unwrap();
        assert_eq!(squared.into_data().to_vec::<f32>().unwrap(), vec![5.0]);
        let absolute = engine.compute_resmap(x, y, ResmapMode::AbsoluteError).unwrap();
        assert_eq!(absolute.into_data().to_vec::<f32>().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_channel_checks() {
        let device = Default::default();
        let engine = engine();
        let gray = Tensor::<B, 4>::zeros([1, 8, 8, 1], &device);
        let rgb = Tensor::<B, 4>::zeros([1, 8, 8, 3], &device);

        assert!(matches!(
            engine.compute_resmap(rgb.clone(), rgb, ResmapMode::Ssim),
            Err(ResmapError::ChannelMismatch { mode: "ssim", channels: 3 })
        ));
        assert!(matches!(
            engine.compute_resmap(gray.clone(), gray, ResmapMode::Mssim),
            Err(ResmapError::ChannelMismatch { mode: "mssim", channels: 1 })
        ));
    }

    #[test]
    fn test_similarity_map_rejects_distance_mode() {
        let device = Default::default();
        let x = Tensor::<B, 4>::zeros([1, 8, 8, 1], &device);
        assert!(matches!(
            engine().similarity_map(x.clone(), x, ResmapMode::SquaredError),
            Err(ResmapError::InvalidMode(_))
        ));
    }
}
