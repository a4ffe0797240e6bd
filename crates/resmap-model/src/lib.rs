//! Training-side components built on `resmap-core`: losses, metrics, the
//! training configuration and the validation inspection pass.

pub mod collaborator;
pub mod config;
pub mod inspection;
pub mod losses;
pub mod metrics;

pub use collaborator::{BatchSource, ImageBatch, Reconstructor, VecBatchSource};
pub use config::{Architecture, Preprocessing, TrainingConfig, TrainingSetup};
pub use inspection::{InspectedImage, InspectionReport, Inspector};
pub use losses::{
    AbsoluteErrorLoss, LossFunction, LossKind, MultiChannelSsimLoss, ReconstructionLoss,
    SquaredErrorLoss, StructuralSimilarityLoss,
};
pub use metrics::SimilarityMetric;
