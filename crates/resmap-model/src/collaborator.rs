//! Capabilities the inspection pass needs from the model and the data pipeline.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Trained autoencoder.
pub trait Reconstructor<B: Backend> {
    /// Reconstruct a `[batch, height, width, channels]` batch.
    ///
    /// The output must have the input's shape.
    fn reconstruct(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
}

impl<B: Backend, F> Reconstructor<B> for F
where
    F: Fn(Tensor<B, 4>) -> Tensor<B, 4>,
{
    fn reconstruct(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self(images)
    }
}

/// Named batch of preprocessed images.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// `[batch, height, width, channels]`
    pub images: Tensor<B, 4>,
    /// One name per image, usually the source file name.
    pub names: Vec<String>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn new(images: Tensor<B, 4>, names: Vec<String>) -> Self {
        Self { images, names }
    }

    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of validation batches.
pub trait BatchSource<B: Backend> {
    /// Next batch, or `None` once the source is exhausted.
    fn next_batch(&mut self) -> Option<ImageBatch<B>>;
}

/// Batches held in memory.
#[derive(Debug, Clone)]
pub struct VecBatchSource<B: Backend> {
    batches: std::vec::IntoIter<ImageBatch<B>>,
}

impl<B: Backend> VecBatchSource<B> {
    pub fn new(batches: Vec<ImageBatch<B>>) -> Self {
        Self {
            batches: batches.into_iter(),
        }
    }
}

impl<B: Backend> BatchSource<B> for VecBatchSource<B> {
    fn next_batch(&mut self) -> Option<ImageBatch<B>> {
        self.batches.next()
    }
}
