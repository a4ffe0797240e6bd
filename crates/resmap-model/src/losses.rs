//! Reconstruction losses for autoencoder training.
//!
//! Every loss maps an input batch and its reconstruction, both
//! `[batch, height, width, channels]`, to one value per image and reduces
//! that to the batch mean. They are built from differentiable tensor
//! operations only, so the same code is the training objective under an
//! autodiff backend and a plain score on an inference backend.

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use resmap_core::image::{ensure_same_shape, per_image_mean};
use resmap_core::{
    summary_score, ResidualMapEngine, ResmapError, ResmapMode, Result, StructuralSimilarityMap,
    WindowParameters,
};
use serde::{Deserialize, Serialize};

/// Loss selected in the training configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Single-channel structural similarity.
    Ssim,
    /// Channel-averaged structural similarity.
    Mssim,
    /// Squared error.
    L2,
    /// Squared error, under the name the data pipeline uses.
    Mse,
    /// Absolute error.
    L1,
}

impl LossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssim => "ssim",
            Self::Mssim => "mssim",
            Self::L2 => "l2",
            Self::Mse => "mse",
            Self::L1 => "l1",
        }
    }

    /// Residual map mode computing the same per-pixel quantity.
    pub fn resmap_mode(&self) -> ResmapMode {
        match self {
            Self::Ssim => ResmapMode::Ssim,
            Self::Mssim => ResmapMode::Mssim,
            Self::L2 | Self::Mse => ResmapMode::SquaredError,
            Self::L1 => ResmapMode::AbsoluteError,
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossKind {
    type Err = ResmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssim" => Ok(Self::Ssim),
            "mssim" => Ok(Self::Mssim),
            "l2" => Ok(Self::L2),
            "mse" => Ok(Self::Mse),
            "l1" | "mae" => Ok(Self::L1),
            other => Err(ResmapError::invalid_mode(format!(
                "unknown loss '{other}', expected one of ssim, mssim, l2, mse, l1"
            ))),
        }
    }
}

/// Loss between an input batch and its reconstruction.
pub trait ReconstructionLoss<B: Backend> {
    /// Loss of each image.
    ///
    /// # Shapes
    /// - input, reconstruction: `[batch, height, width, channels]`
    /// - output: `[batch]`
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>>;

    /// Batch-mean loss, shape `[1]`.
    fn forward(&self, input: Tensor<B, 4>, reconstruction: Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        Ok(self.forward_no_reduction(input, reconstruction)?.mean())
    }

    /// Get the name of this loss.
    fn name(&self) -> &'static str;
}

/// `1 - mean(SSIM)` on grayscale images.
#[derive(Debug, Clone)]
pub struct StructuralSimilarityLoss<B: Backend> {
    ssim: StructuralSimilarityMap<B>,
}

impl<B: Backend> StructuralSimilarityLoss<B> {
    pub fn new(params: &WindowParameters) -> Self {
        Self {
            ssim: StructuralSimilarityMap::new(params),
        }
    }
}

impl<B: Backend> ReconstructionLoss<B> for StructuralSimilarityLoss<B> {
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>> {
        let similarity = self.ssim.mean_similarity(input, reconstruction)?;
        Ok(similarity.neg().add_scalar(1.0))
    }

    fn name(&self) -> &'static str {
        "StructuralSimilarityLoss"
    }
}

/// `1 - mean(channel-averaged SSIM)` on color images.
#[derive(Debug, Clone)]
pub struct MultiChannelSsimLoss<B: Backend> {
    engine: ResidualMapEngine<B>,
}

impl<B: Backend> MultiChannelSsimLoss<B> {
    pub fn new(params: &WindowParameters) -> Self {
        Self {
            engine: ResidualMapEngine::new(*params),
        }
    }
}

impl<B: Backend> ReconstructionLoss<B> for MultiChannelSsimLoss<B> {
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>> {
        let similarity = self
            .engine
            .similarity_map(input, reconstruction, ResmapMode::Mssim)?;
        Ok(summary_score(similarity).neg().add_scalar(1.0))
    }

    fn name(&self) -> &'static str {
        "MultiChannelSsimLoss"
    }
}

/// Mean squared pixel difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredErrorLoss;

impl<B: Backend> ReconstructionLoss<B> for SquaredErrorLoss {
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>> {
        ensure_same_shape(&input, &reconstruction)?;
        Ok(per_image_mean((input - reconstruction).powi_scalar(2)))
    }

    fn name(&self) -> &'static str {
        "SquaredErrorLoss"
    }
}

/// Mean absolute pixel difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteErrorLoss;

impl<B: Backend> ReconstructionLoss<B> for AbsoluteErrorLoss {
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>> {
        ensure_same_shape(&input, &reconstruction)?;
        Ok(per_image_mean((input - reconstruction).abs()))
    }

    fn name(&self) -> &'static str {
        "AbsoluteErrorLoss"
    }
}

/// Loss resolved from a [`LossKind`].
#[derive(Debug, Clone)]
pub enum LossFunction<B: Backend> {
    Ssim(StructuralSimilarityLoss<B>),
    Mssim(MultiChannelSsimLoss<B>),
    SquaredError(SquaredErrorLoss),
    AbsoluteError(AbsoluteErrorLoss),
}

impl<B: Backend> LossFunction<B> {
    pub fn from_kind(kind: LossKind, params: &WindowParameters) -> Self {
        match kind {
            LossKind::Ssim => Self::Ssim(StructuralSimilarityLoss::new(params)),
            LossKind::Mssim => Self::Mssim(MultiChannelSsimLoss::new(params)),
            LossKind::L2 | LossKind::Mse => Self::SquaredError(SquaredErrorLoss),
            LossKind::L1 => Self::AbsoluteError(AbsoluteErrorLoss),
        }
    }
}

impl<B: Backend> ReconstructionLoss<B> for LossFunction<B> {
    fn forward_no_reduction(
        &self,
        input: Tensor<B, 4>,
        reconstruction: Tensor<B, 4>,
    ) -> Result<Tensor<B, 1>> {
        match self {
            Self::Ssim(loss) => loss.forward_no_reduction(input, reconstruction),
            Self::Mssim(loss) => loss.forward_no_reduction(input, reconstruction),
            Self::SquaredError(loss) => {
                ReconstructionLoss::<B>::forward_no_reduction(loss, input, reconstruction)
            }
            Self::AbsoluteError(loss) => {
                ReconstructionLoss::<B>::forward_no_reduction(loss, input, reconstruction)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Ssim(loss) => loss.name(),
            Self::Mssim(loss) => loss.name(),
            Self::SquaredError(loss) => ReconstructionLoss::<B>::name(loss),
            Self::AbsoluteError(loss) => ReconstructionLoss::<B>::name(loss),
        }
    }
}
