//! One-dimensional window kernels.
//!
//! Both window shapes are separable, so a square window is applied as a
//! horizontal pass followed by a vertical pass with the same 1-D kernel.

use crate::window::WindowParameters;

/// Uniform kernel of the given width, each tap `1 / width`.
pub fn box_kernel(width: usize) -> Vec<f32> {
    vec![1.0 / width as f32; width]
}

/// Normalized Gaussian kernel with `2 * radius + 1` taps.
pub fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let two_sigma2 = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (0..=(2 * radius))
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma2).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Kernel selected by the window parameters.
pub fn window_kernel(params: &WindowParameters) -> Vec<f32> {
    if params.gaussian() {
        gaussian_kernel(params.sigma(), params.radius())
    } else {
        box_kernel(params.window_size())
    }
}
