//! Residual maps and structural similarity for autoencoder anomaly detection.
//!
//! Images are channels-last `burn` tensors, `[batch, height, width, channels]`.
//! Windowed statistics use reflect padding, so similarity and residual maps keep
//! the input's height and width.

pub mod error;
pub mod filter;
pub mod image;
pub mod resmap;
pub mod ssim;
pub mod stats;
pub mod window;

pub use error::{ResmapError, Result};
pub use image::{ChannelMode, Normalization};
pub use resmap::{summary_score, ResidualMapEngine, ResmapMode};
pub use ssim::StructuralSimilarityMap;
pub use stats::{LocalStatistics, PairStatistics, WindowedStatistics};
pub use window::{WindowConfig, WindowParameters};
