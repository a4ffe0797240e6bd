//! Error types for residual map and similarity computations.
//!
//! All of these are configuration or programmer errors. They are raised at the
//! point of detection and are never retried.

use thiserror::Error;

/// Main error type for resmap operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResmapError {
    /// Input and reconstruction tensors disagree in shape.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A tensor has a zero-sized dimension.
    #[error("Empty input: shape {shape:?} has a zero-sized dimension")]
    EmptyInput { shape: Vec<usize> },

    /// Channel count is inconsistent with the requested mode.
    #[error("Channel mismatch: mode {mode} cannot be applied to {channels} channel(s)")]
    ChannelMismatch {
        mode: &'static str,
        channels: usize,
    },

    /// Unrecognized loss, resmap, color or architecture string.
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// Window or stability parameter out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Incompatible combination of otherwise valid settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for resmap operations.
pub type Result<T> = std::result::Result<T, ResmapError>;

impl ResmapError {
    /// Create a shape mismatch error from two dimension arrays.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an empty input error.
    pub fn empty_input(shape: &[usize]) -> Self {
        Self::EmptyInput {
            shape: shape.to_vec(),
        }
    }

    /// Create an invalid mode error.
    pub fn invalid_mode(msg: impl Into<String>) -> Self {
        Self::InvalidMode(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
