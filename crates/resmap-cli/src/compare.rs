use anyhow::{Context, Result};
use burn::tensor::Tensor;
use indicatif::{ProgressBar, ProgressStyle};
use resmap_core::{Normalization, ResidualMapEngine, ResmapMode};
use resmap_io::{read_image, write_resmap, ReadOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{CliBackend, ResmapArgs};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

struct Comparison {
    engine: ResidualMapEngine<CliBackend>,
    options: ReadOptions,
    mode: ResmapMode,
}

impl Comparison {
    fn new(args: &ResmapArgs) -> Result<Self> {
        let params = args.window()?;
        Ok(Self {
            engine: ResidualMapEngine::new(params),
            options: ReadOptions::new(args.channel_mode()?, Normalization::Rescale),
            mode: args.mode()?,
        })
    }

    /// Residual map `[height, width, 1]` and score of one pair of files.
    fn run(&self, input: &Path, reconstruction: &Path) -> Result<(Tensor<CliBackend, 3>, f32)> {
        let device = Default::default();
        let input_image = read_image::<CliBackend, _>(input, &self.options, &device)?;
        let reconstruction_image =
            read_image::<CliBackend, _>(reconstruction, &self.options, &device)?;

        let resmap = self
            .engine
            .compute_resmap(
                input_image.unsqueeze::<4>(),
                reconstruction_image.unsqueeze::<4>(),
                self.mode,
            )
            .with_context(|| format!("Failed to compare {}", input.display()))?;
        let score = self.engine.summary_score(resmap.clone()).into_scalar();

        let [_, height, width, _] = resmap.dims();
        Ok((resmap.reshape([height, width, 1]), score))
    }
}

pub(crate) fn compare_files(
    input: &Path,
    reconstruction: &Path,
    args: &ResmapArgs,
    output: Option<&Path>,
) -> Result<f32> {
    let comparison = Comparison::new(args)?;
    let (resmap, score) = comparison.run(input, reconstruction)?;
    info!("{} score: {:.6}", input.display(), score);

    if let Some(path) = output {
        write_resmap(path, resmap)?;
        info!("Saved resmap to {}", path.display());
    }
    Ok(score)
}

pub(crate) fn compare_dirs(
    input_dir: &Path,
    reconstruction_dir: &Path,
    args: &ResmapArgs,
    output_dir: Option<&Path>,
    worst: usize,
) -> Result<()> {
    let comparison = Comparison::new(args)?;
    let inputs = find_images(input_dir);
    if inputs.is_empty() {
        anyhow::bail!("No images found in {}", input_dir.display());
    }
    info!("Found {} images in {}", inputs.len(), input_dir.display());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut scores: Vec<(PathBuf, f32)> = Vec::with_capacity(inputs.len());
    for relative in inputs {
        pb.set_message(relative.display().to_string());
        let reconstruction = reconstruction_dir.join(&relative);
        if !reconstruction.exists() {
            warn!("No reconstruction for {}", relative.display());
            pb.inc(1);
            continue;
        }

        let (resmap, score) = comparison.run(&input_dir.join(&relative), &reconstruction)?;
        if let Some(dir) = output_dir {
            let target = dir.join(flatten_name(&relative));
            write_resmap(&target, resmap)?;
        }
        scores.push((relative, score));
        pb.inc(1);
    }
    pb.finish_with_message("Comparison complete");

    if scores.is_empty() {
        warn!("No image had a matching reconstruction");
        return Ok(());
    }

    let mean = scores.iter().map(|(_, s)| s).sum::<f32>() / scores.len() as f32;
    println!("images: {}", scores.len());
    println!("mean score: {mean:.6}");

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("worst:");
    for (path, score) in scores.iter().take(worst) {
        println!("  {score:.6}  {}", path.display());
    }
    Ok(())
}

/// Image paths under `dir`, relative to it and sorted.
fn find_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    images.sort();
    images
}

/// `a/b/c.jpg` becomes `a_b_c.png`.
fn flatten_name(relative: &Path) -> PathBuf {
    let joined: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    PathBuf::from(format!("{}.png", joined.join("_")))
}
