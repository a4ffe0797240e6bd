//! Similarity metrics monitored during training.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use resmap_core::{summary_score, ChannelMode, ResidualMapEngine, ResmapMode, Result, WindowParameters};

/// Batch-mean SSIM (grayscale) or MSSIM (color) score. Higher is better.
#[derive(Debug, Clone)]
pub struct SimilarityMetric<B: Backend> {
    engine: ResidualMapEngine<B>,
    mode: ResmapMode,
}

impl<B: Backend> SimilarityMetric<B> {
    /// Metric for the structural mode matching `channel_mode`.
    pub fn for_channel_mode(channel_mode: ChannelMode, params: WindowParameters) -> Self {
        Self {
            engine: ResidualMapEngine::new(params),
            mode: ResmapMode::for_channel_mode(channel_mode),
        }
    }

    /// Mean similarity over the batch, shape `[1]`.
    pub fn evaluate(&self, input: Tensor<B, 4>, reconstruction: Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        let similarity = self.engine.similarity_map(input, reconstruction, self.mode)?;
        Ok(summary_score(similarity).mean())
    }

    pub fn name(&self) -> &'static str {
        match self.mode {
            ResmapMode::Mssim => "mssim",
            _ => "ssim",
        }
    }
}
