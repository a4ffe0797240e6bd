//! Sliding-window configuration shared by all similarity computations.

use burn::config::Config;

use crate::error::ResmapError;

/// Serializable window configuration.
///
/// Validated into an immutable [`WindowParameters`] by [`WindowConfig::init`].
/// The defaults follow the usual structural similarity setup: an 11x11
/// Gaussian window with sigma 1.5, `K1 = 0.01`, `K2 = 0.03`.
#[derive(Config, Debug, PartialEq)]
pub struct WindowConfig {
    /// Side length of the square window, odd.
    #[config(default = "11")]
    pub window_size: usize,
    /// Gaussian-weighted window instead of a uniform box.
    #[config(default = "true")]
    pub gaussian: bool,
    /// Standard deviation of the Gaussian window, in pixels.
    #[config(default = "1.5")]
    pub sigma: f64,
    /// Luminance stability factor.
    #[config(default = "0.01")]
    pub k1: f64,
    /// Contrast stability factor.
    #[config(default = "0.03")]
    pub k2: f64,
    /// Width of the value range of the images (1.0 for [0, 1], 2.0 for [-1, 1]).
    #[config(default = "1.0")]
    pub dynamic_range: f64,
}

impl WindowConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// `InvalidParameter` if the window size is zero or even, sigma is not
    /// positive for a Gaussian window, a stability factor is not positive, or
    /// the dynamic range is not positive.
    pub fn init(&self) -> crate::error::Result<WindowParameters> {
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(ResmapError::invalid_parameter(format!(
                "window size must be positive and odd, got {}",
                self.window_size
            )));
        }
        if self.gaussian && !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(ResmapError::invalid_parameter(format!(
                "Gaussian sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.k1 > 0.0 && self.k1.is_finite()) || !(self.k2 > 0.0 && self.k2.is_finite()) {
            return Err(ResmapError::invalid_parameter(format!(
                "stability factors must be positive, got k1={} k2={}",
                self.k1, self.k2
            )));
        }
        if !(self.dynamic_range > 0.0 && self.dynamic_range.is_finite()) {
            return Err(ResmapError::invalid_parameter(format!(
                "dynamic range must be positive, got {}",
                self.dynamic_range
            )));
        }

        Ok(WindowParameters {
            window_size: self.window_size,
            gaussian: self.gaussian,
            sigma: self.sigma,
            dynamic_range: self.dynamic_range,
            c1: (self.k1 * self.dynamic_range).powi(2),
            c2: (self.k2 * self.dynamic_range).powi(2),
        })
    }
}

/// Validated, immutable window parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParameters {
    window_size: usize,
    gaussian: bool,
    sigma: f64,
    dynamic_range: f64,
    c1: f64,
    c2: f64,
}

impl WindowParameters {
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Half-width of the window.
    pub fn radius(&self) -> usize {
        self.window_size / 2
    }

    pub fn gaussian(&self) -> bool {
        self.gaussian
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn dynamic_range(&self) -> f64 {
        self.dynamic_range
    }

    /// Luminance stability constant `(K1 * L)^2`.
    pub fn c1(&self) -> f64 {
        self.c1
    }

    /// Contrast stability constant `(K2 * L)^2`.
    pub fn c2(&self) -> f64 {
        self.c2
    }
}

impl Default for WindowParameters {
    fn default() -> Self {
        Self {
            window_size: 11,
            gaussian: true,
            sigma: 1.5,
            dynamic_range: 1.0,
            c1: 0.01 * 0.01,
            c2: 0.03 * 0.03,
        }
    }
}
