//! Validation inspection: reconstruct every image and score its residual map.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use resmap_core::image::ensure_same_shape;
use resmap_core::{ResidualMapEngine, ResmapMode, Result};

use crate::collaborator::{BatchSource, Reconstructor};

/// Residual map and score of one inspected image.
#[derive(Debug, Clone)]
pub struct InspectedImage<B: Backend> {
    pub name: String,
    /// `[height, width, 1]`
    pub resmap: Tensor<B, 3>,
    /// Mean residual.
    pub score: f32,
}

/// Results of an inspection pass, in source order.
#[derive(Debug, Clone)]
pub struct InspectionReport<B: Backend> {
    pub mode: ResmapMode,
    pub images: Vec<InspectedImage<B>>,
}

impl<B: Backend> InspectionReport<B> {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Mean score over all images, `None` for an empty report.
    pub fn mean_score(&self) -> Option<f32> {
        if self.images.is_empty() {
            return None;
        }
        let total: f32 = self.images.iter().map(|image| image.score).sum();
        Some(total / self.images.len() as f32)
    }

    /// The `n` highest-scoring images, highest first.
    pub fn worst(&self, n: usize) -> Vec<&InspectedImage<B>> {
        let mut ranked: Vec<&InspectedImage<B>> = self.images.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(n);
        ranked
    }
}

/// Runs a reconstructor over a batch source and collects residual maps.
#[derive(Debug, Clone)]
pub struct Inspector<B: Backend> {
    engine: ResidualMapEngine<B>,
    mode: ResmapMode,
}

impl<B: Backend> Inspector<B> {
    pub fn new(engine: ResidualMapEngine<B>, mode: ResmapMode) -> Self {
        Self { engine, mode }
    }

    pub fn mode(&self) -> ResmapMode {
        self.mode
    }

    /// Inspect every batch until the source is exhausted.
    ///
    /// # Errors
    /// `ShapeMismatch` if a reconstruction does not match its input, plus any
    /// error of [`ResidualMapEngine::compute_resmap`]. The pass stops at the
    /// first failing batch. Empty batches are skipped.
    pub fn inspect<R, S>(&self, reconstructor: &R, source: &mut S) -> Result<InspectionReport<B>>
    where
        R: Reconstructor<B> + ?Sized,
        S: BatchSource<B> + ?Sized,
    {
        let mut images = Vec::new();
        let mut batch_index = 0usize;

        while let Some(batch) = source.next_batch() {
            if batch.is_empty() {
                tracing::warn!("Skipping empty batch {}", batch_index);
                batch_index += 1;
                continue;
            }

            let reconstruction = reconstructor.reconstruct(batch.images.clone());
            let [count, height, width, _] = ensure_same_shape(&batch.images, &reconstruction)?;

            let resmap = self
                .engine
                .compute_resmap(batch.images, reconstruction, self.mode)?;
            let scores: Vec<f32> = self
                .engine
                .summary_score(resmap.clone())
                .into_data()
                .iter::<f32>()
                .collect();

            for (i, score) in scores.into_iter().enumerate().take(count) {
                let name = batch
                    .names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("batch{batch_index}_{i}"));
                let map = resmap
                    .clone()
                    .slice([i..i + 1, 0..height, 0..width, 0..1])
                    .reshape([height, width, 1]);
                images.push(InspectedImage {
                    name,
                    resmap: map,
                    score,
                });
            }

            tracing::info!(
                "Inspected batch {} ({} images, {} total)",
                batch_index,
                count,
                images.len()
            );
            batch_index += 1;
        }

        if images.is_empty() {
            tracing::warn!("Inspection source produced no images");
        }

        Ok(InspectionReport {
            mode: self.mode,
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{ImageBatch, VecBatchSource};
    use burn_ndarray::NdArray;
    use resmap_core::WindowParameters;

    type B = NdArray<f32>;

    #[test]
    fn test_report_ranking() {
        let device = Default::default();
        let map = Tensor::<B, 3>::zeros([2, 2, 1], &device);
        let report = InspectionReport {
            mode: ResmapMode::Ssim,
            images: [("a", 0.1f32), ("b", 0.7), ("c", 0.4)]
                .into_iter()
                .map(|(name, score)| InspectedImage {
                    name: name.to_string(),
                    resmap: map.clone(),
                    score,
                })
                .collect(),
        };

        let worst: Vec<&str> = report.worst(2).iter().map(|image| image.name.as_str()).collect();
        assert_eq!(worst, vec!["b", "c"]);
        assert!((report.mean_score().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_source() {
        let inspector = Inspector::<B>::new(
            ResidualMapEngine::new(WindowParameters::default()),
            ResmapMode::Ssim,
        );
        let mut source = VecBatchSource::<B>::new(Vec::new());
        let identity = |images: Tensor<B, 4>| images;

        let report = inspector.inspect(&identity, &mut source).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.mean_score(), None);
    }

    #[test]
    fn test_missing_names_are_generated() {
        let device = Default::default();
        let inspector = Inspector::<B>::new(
            ResidualMapEngine::new(WindowParameters::default()),
            ResmapMode::SquaredError,
        );
        let images = Tensor::<B, 4>::zeros([2, 4, 4, 1], &device);
        let mut source = VecBatchSource::new(vec![ImageBatch::new(images, vec!["first".into()])]);
        let identity = |images: Tensor<B, 4>| images;

        let report = inspector.inspect(&identity, &mut source).unwrap();
        assert_eq!(report.images[0].name, "first");
        assert_eq!(report.images[1].name, "batch0_1");
        assert_eq!(report.images[1].resmap.dims(), [4, 4, 1]);
    }

    #[test]
    fn test_empty_batches_are_skipped() {
        let device = Default::default();
        let inspector = Inspector::<B>::new(
            ResidualMapEngine::new(WindowParameters::default()),
            ResmapMode::Ssim,
        );
        let mut source = VecBatchSource::new(vec![
            ImageBatch::new(Tensor::<B, 4>::zeros([0, 8, 8, 1], &device), Vec::new()),
            ImageBatch::new(Tensor::<B, 4>::zeros([1, 8, 8, 1], &device), vec!["kept".into()]),
        ]);
        let identity = |images: Tensor<B, 4>| images;

        let report = inspector.inspect(&identity, &mut source).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.images[0].name, "kept");
    }
}
