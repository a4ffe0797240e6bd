//! Training configuration and its resolution into a validated setup.
//!
//! Valid combinations of color mode and loss per architecture:
//!
//! ```text
//!               | mvtec, mvtec2    | resnet, nasnet
//! --------------+------------------+-----------------
//!  grayscale    | SSIM, L2, MSE    | not valid
//!  rgb          | MSSIM, L2, MSE   | MSSIM, L2, MSE
//! ```
//!
//! `L1` is accepted wherever `L2` is.

use std::fmt;
use std::str::FromStr;

use burn::config::Config;
use burn::tensor::backend::Backend;
use resmap_core::{
    ChannelMode, Normalization, ResidualMapEngine, ResmapError, ResmapMode, WindowConfig,
    WindowParameters,
};
use serde::{Deserialize, Serialize};

use crate::losses::{LossFunction, LossKind};
use crate::metrics::SimilarityMetric;

/// Autoencoder architecture provided by the model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Mvtec,
    Mvtec2,
    Resnet,
    Nasnet,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mvtec => "mvtec",
            Self::Mvtec2 => "mvtec2",
            Self::Resnet => "resnet",
            Self::Nasnet => "nasnet",
        }
    }

    /// Whether the encoder is a pretrained RGB backbone.
    pub fn requires_rgb(&self) -> bool {
        matches!(self, Self::Resnet | Self::Nasnet)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ResmapError;

    fn from_str(s: &str) -> resmap_core::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mvtec" => Ok(Self::Mvtec),
            "mvtec2" => Ok(Self::Mvtec2),
            "resnet" => Ok(Self::Resnet),
            "nasnet" => Ok(Self::Nasnet),
            other => Err(ResmapError::invalid_mode(format!("unknown architecture '{other}'"))),
        }
    }
}

/// Input preprocessing expected by an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preprocessing {
    pub normalization: Normalization,
    /// Target `(height, width)` images are resized to.
    pub shape: (usize, usize),
}

impl Preprocessing {
    pub fn for_architecture(architecture: Architecture) -> Self {
        match architecture {
            Architecture::Mvtec | Architecture::Mvtec2 => Self {
                normalization: Normalization::Rescale,
                shape: (256, 256),
            },
            Architecture::Resnet => Self {
                normalization: Normalization::SymmetricUnit,
                shape: (299, 299),
            },
            Architecture::Nasnet => Self {
                normalization: Normalization::SymmetricUnit,
                shape: (224, 224),
            },
        }
    }
}

/// Training configuration, as written to and read from JSON.
#[derive(Config, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Autoencoder architecture.
    pub architecture: Architecture,
    /// Color mode of the training images.
    pub color_mode: ChannelMode,
    /// Training objective.
    pub loss: LossKind,
    /// Images per batch.
    #[config(default = "12")]
    pub batch_size: usize,
    /// Number of augmented images seen during training.
    #[config(default = "10000")]
    pub nb_training_images_aug: usize,
    /// Fraction of images held out for validation.
    #[config(default = "0.1")]
    pub validation_split: f64,
    /// Epochs without validation improvement before stopping.
    #[config(default = "12")]
    pub early_stopping_patience: usize,
    /// Window used by the structural losses and residual maps.
    #[config(default = "WindowConfig::new()")]
    pub window: WindowConfig,
    /// Free-form label stored with the setup summary.
    pub tag: Option<String>,
}

impl TrainingConfig {
    /// Parse the three string-valued settings of a training run.
    pub fn from_strs(architecture: &str, color_mode: &str, loss: &str) -> resmap_core::Result<Self> {
        Ok(Self::new(
            architecture.parse()?,
            color_mode.parse()?,
            loss.parse()?,
        ))
    }

    /// Check the configuration and derive everything the run needs.
    ///
    /// # Errors
    /// `InvalidConfiguration` for combinations outside the compatibility
    /// table or an unimplemented architecture, `InvalidParameter` for an
    /// invalid window, batch size or validation split.
    pub fn resolve(&self) -> resmap_core::Result<TrainingSetup> {
        if self.architecture == Architecture::Nasnet {
            return Err(ResmapError::invalid_configuration("nasnet is not yet implemented"));
        }
        if self.architecture.requires_rgb() && self.color_mode == ChannelMode::Grayscale {
            return Err(ResmapError::invalid_configuration(format!(
                "{} expects rgb images",
                self.architecture
            )));
        }
        match (self.loss, self.color_mode) {
            (LossKind::Mssim, ChannelMode::Grayscale) => {
                return Err(ResmapError::invalid_configuration(
                    "mssim works only with rgb images",
                ));
            }
            (LossKind::Ssim, ChannelMode::Rgb) => {
                return Err(ResmapError::invalid_configuration(
                    "ssim works only with grayscale images",
                ));
            }
            _ => {}
        }
        if self.batch_size == 0 {
            return Err(ResmapError::invalid_parameter("batch size must be positive"));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(ResmapError::invalid_parameter(format!(
                "validation split must lie strictly between 0 and 1, got {}",
                self.validation_split
            )));
        }

        let preprocessing = Preprocessing::for_architecture(self.architecture);
        let window = self
            .window
            .clone()
            .with_dynamic_range(preprocessing.normalization.dynamic_range())
            .init()?;

        let setup = TrainingSetup {
            config: self.clone(),
            channels: self.color_mode.channels(),
            resmap_mode: ResmapMode::for_channel_mode(self.color_mode),
            preprocessing,
            window,
        };
        tracing::info!(
            "Resolved training setup: architecture={} color={} loss={} resmaps={}",
            self.architecture,
            self.color_mode,
            self.loss,
            setup.resmap_mode
        );
        Ok(setup)
    }
}

/// Validated training setup.
#[derive(Debug, Clone)]
pub struct TrainingSetup {
    pub config: TrainingConfig,
    pub channels: usize,
    /// Mode of the inspection resmaps, tied to the color mode.
    pub resmap_mode: ResmapMode,
    pub preprocessing: Preprocessing,
    /// Window with the dynamic range of the preprocessed images.
    pub window: WindowParameters,
}

impl TrainingSetup {
    /// Training objective.
    pub fn loss_function<B: Backend>(&self) -> LossFunction<B> {
        LossFunction::from_kind(self.config.loss, &self.window)
    }

    /// Similarity metric monitored during training.
    pub fn metric<B: Backend>(&self) -> SimilarityMetric<B> {
        SimilarityMetric::for_channel_mode(self.config.color_mode, self.window)
    }

    /// Engine for the post-training residual maps.
    pub fn resmap_engine<B: Backend>(&self) -> ResidualMapEngine<B> {
        ResidualMapEngine::new(self.window)
    }

    /// Number of epochs needed to see the configured number of augmented images.
    ///
    /// # Errors
    /// `InvalidParameter` if there are no training samples.
    pub fn epochs_for(&self, training_samples: usize) -> resmap_core::Result<usize> {
        if training_samples == 0 {
            return Err(ResmapError::invalid_parameter("no training samples"));
        }
        Ok(self.config.nb_training_images_aug / training_samples)
    }

    /// Summary of the run, stored next to the trained model.
    ///
    /// `epochs` is `null` when no training samples are given.
    pub fn setup_summary(
        &self,
        directory: &str,
        training_samples: usize,
        validation_samples: usize,
    ) -> serde_json::Value {
        let epochs = self.epochs_for(training_samples).ok();
        serde_json::json!({
            "data_setup": {
                "directory": directory,
                "nb_training_images": training_samples,
                "nb_validation_images": validation_samples,
            },
            "preprocessing_setup": {
                "normalization": self.preprocessing.normalization,
                "shape": [self.preprocessing.shape.0, self.preprocessing.shape.1],
            },
            "train_setup": {
                "architecture": self.config.architecture,
                "nb_training_images_aug": self.config.nb_training_images_aug,
                "epochs": epochs,
                "batch_size": self.config.batch_size,
                "loss": self.config.loss,
                "color_mode": self.config.color_mode,
                "channels": self.channels,
                "validation_split": self.config.validation_split,
                "resmaps_mode": self.resmap_mode,
            },
            "window_setup": {
                "window_size": self.window.window_size(),
                "gaussian": self.window.gaussian(),
                "sigma": self.window.sigma(),
                "dynamic_range": self.window.dynamic_range(),
            },
            "tag": self.config.tag,
        })
    }
}
