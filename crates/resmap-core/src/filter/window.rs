use burn::tensor::backend::Backend;
use burn::tensor::module::conv2d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::Tensor;

use super::kernel::window_kernel;
use super::pad::reflect_pad;
use crate::window::WindowParameters;

/// Sliding-window weighted average over image planes.
///
/// Applies the box or Gaussian window from [`WindowParameters`] to every
/// plane of a `[planes, 1, H, W]` tensor. The input is reflect-padded by the
/// window radius and then filtered with two valid 1-D convolutions, so the
/// output has the input's height and width.
#[derive(Debug, Clone)]
pub struct WindowFilter<B: Backend> {
    kernel: Vec<f32>,
    radius: usize,
    _b: std::marker::PhantomData<B>,
}

impl<B: Backend> WindowFilter<B> {
    /// Create a filter for the given window.
    pub fn new(params: &WindowParameters) -> Self {
        Self {
            kernel: window_kernel(params),
            radius: params.radius(),
            _b: std::marker::PhantomData,
        }
    }

    /// The 1-D kernel applied along each axis.
    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    /// Apply the window average to `[planes, 1, H, W]`.
    pub fn apply(&self, planes: Tensor<B, 4>) -> Tensor<B, 4> {
        let device = planes.device();
        let width = self.kernel.len();

        let padded = reflect_pad(planes, self.radius);

        let taps = Tensor::<B, 1>::from_floats(self.kernel.as_slice(), &device);
        // [out=1, in=1, kh, kw]
        let horizontal = taps.clone().reshape([1, 1, 1, width]);
        let vertical = taps.reshape([1, 1, width, 1]);

        let options = ConvOptions::new([1, 1], [0, 0], [1, 1], 1);
        let rows = conv2d(padded, horizontal, None, options.clone());
        conv2d(rows, vertical, None, options)
    }
}
