use anyhow::{Context, Result};
use burn::config::Config;
use clap::{Args, Parser, Subcommand};
use resmap_core::{ChannelMode, ResmapMode, WindowConfig, WindowParameters};
use resmap_model::TrainingConfig;
use std::path::PathBuf;
use tracing::info;

mod compare;

#[cfg(not(feature = "wgpu"))]
pub(crate) type CliBackend = burn::backend::NdArray<f32>;
#[cfg(feature = "wgpu")]
pub(crate) type CliBackend = burn::backend::Wgpu;

#[derive(Parser)]
#[command(name = "resmap")]
#[command(about = "Residual maps between images and their autoencoder reconstructions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one image with its reconstruction
    Compare {
        /// Input image
        input: PathBuf,

        /// Reconstructed image
        reconstruction: PathBuf,

        #[command(flatten)]
        resmap: ResmapArgs,

        /// Write the residual map as a grayscale PNG
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare every image in a directory with the same-named reconstruction
    CompareDir {
        /// Directory of input images
        input_dir: PathBuf,

        /// Directory of reconstructions, mirroring the input layout
        reconstruction_dir: PathBuf,

        #[command(flatten)]
        resmap: ResmapArgs,

        /// Write residual maps into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of highest-scoring images to list
        #[arg(long, default_value_t = 5)]
        worst: usize,
    },

    /// Validate a training configuration and print its setup summary
    CheckConfig {
        /// Autoencoder architecture (mvtec, mvtec2, resnet, nasnet)
        #[arg(long)]
        architecture: String,

        /// Color mode (grayscale, rgb)
        #[arg(long)]
        color: String,

        /// Loss (ssim, mssim, l2, mse, l1)
        #[arg(long)]
        loss: String,

        #[arg(long, default_value_t = 12)]
        batch_size: usize,

        /// Training data directory recorded in the summary
        #[arg(long, default_value = "")]
        directory: String,

        #[arg(long, default_value_t = 0)]
        training_images: usize,

        #[arg(long, default_value_t = 0)]
        validation_images: usize,

        /// Free-form label stored with the summary
        #[arg(long)]
        tag: Option<String>,

        /// Write the setup summary to this JSON file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Write the training configuration to this JSON file
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
}

/// Residual map settings shared by the compare commands.
#[derive(Args, Debug, Clone)]
pub(crate) struct ResmapArgs {
    /// Resmap mode (ssim, mssim, l2, l1); defaults to ssim for grayscale
    /// images and mssim for rgb
    #[arg(short, long)]
    mode: Option<String>,

    /// Color mode the images are read in (grayscale, rgb)
    #[arg(short, long, default_value = "grayscale")]
    color: String,

    /// Side of the square window, odd
    #[arg(long, default_value_t = 11)]
    window_size: usize,

    /// Uniform instead of Gaussian window weights
    #[arg(long)]
    box_window: bool,

    /// Gaussian window standard deviation
    #[arg(long, default_value_t = 1.5)]
    sigma: f64,

    /// Width of the pixel value range
    #[arg(long, default_value_t = 1.0)]
    dynamic_range: f64,
}

impl ResmapArgs {
    pub(crate) fn mode(&self) -> Result<ResmapMode> {
        match &self.mode {
            Some(mode) => Ok(mode.parse()?),
            None => Ok(ResmapMode::for_channel_mode(self.channel_mode()?)),
        }
    }

    pub(crate) fn channel_mode(&self) -> Result<ChannelMode> {
        Ok(self.color.parse()?)
    }

    pub(crate) fn window(&self) -> Result<WindowParameters> {
        let params = WindowConfig::new()
            .with_window_size(self.window_size)
            .with_gaussian(!self.box_window)
            .with_sigma(self.sigma)
            .with_dynamic_range(self.dynamic_range)
            .init()?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            input,
            reconstruction,
            resmap,
            output,
        } => {
            let score = compare::compare_files(&input, &reconstruction, &resmap, output.as_deref())?;
            println!("{score:.6}");
        }
        Commands::CompareDir {
            input_dir,
            reconstruction_dir,
            resmap,
            output_dir,
            worst,
        } => {
            compare::compare_dirs(
                &input_dir,
                &reconstruction_dir,
                &resmap,
                output_dir.as_deref(),
                worst,
            )?;
        }
        Commands::CheckConfig {
            architecture,
            color,
            loss,
            batch_size,
            directory,
            training_images,
            validation_images,
            tag,
            save,
            save_config,
        } => {
            let config = TrainingConfig::from_strs(&architecture, &color, &loss)?
                .with_batch_size(batch_size)
                .with_tag(tag);
            let setup = config.resolve()?;
            let summary = setup.setup_summary(&directory, training_images, validation_images);
            let text = serde_json::to_string_pretty(&summary)?;
            println!("{text}");

            if let Some(path) = save {
                std::fs::write(&path, &text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved setup summary to {}", path.display());
            }
            if let Some(path) = save_config {
                config
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved training configuration to {}", path.display());
            }
        }
    }

    Ok(())
}
