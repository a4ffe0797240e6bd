use std::path::Path;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use resmap_core::{ChannelMode, Normalization};

/// How image files are turned into model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOptions {
    pub channel_mode: ChannelMode,
    pub normalization: Normalization,
    /// Resize to `(height, width)` when set.
    pub shape: Option<(usize, usize)>,
}

impl ReadOptions {
    pub fn new(channel_mode: ChannelMode, normalization: Normalization) -> Self {
        Self {
            channel_mode,
            normalization,
            shape: None,
        }
    }

    pub fn with_shape(mut self, height: usize, width: usize) -> Self {
        self.shape = Some((height, width));
        self
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new(ChannelMode::Grayscale, Normalization::Rescale)
    }
}

/// Read an image file into a normalized `[height, width, channels]` tensor.
///
/// The file is converted to 8-bit luma or RGB according to the channel mode,
/// whatever its stored color type.
pub fn read_image<B: Backend, P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
    device: &B::Device,
) -> Result<Tensor<B, 3>> {
    let path = path.as_ref();
    let mut img = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;

    if let Some((height, width)) = options.shape {
        if img.height() as usize != height || img.width() as usize != width {
            img = img.resize_exact(width as u32, height as u32, FilterType::Triangle);
        }
    }

    let (width, height) = (img.width() as usize, img.height() as usize);
    let channels = options.channel_mode.channels();
    let raw = convert(img, options.channel_mode);

    let values: Vec<f32> = raw.into_iter().map(|v| options.normalization.apply(v)).collect();
    tracing::debug!(
        "Read {} as {}x{}x{} {}",
        path.display(),
        height,
        width,
        channels,
        options.channel_mode
    );

    Ok(Tensor::from_data(
        TensorData::new(values, [height, width, channels]),
        device,
    ))
}

fn convert(img: DynamicImage, mode: ChannelMode) -> Vec<u8> {
    match mode {
        ChannelMode::Grayscale => img.into_luma8().into_raw(),
        ChannelMode::Rgb => img.into_rgb8().into_raw(),
    }
}

/// Read several images into one `[batch, height, width, channels]` tensor.
///
/// All images must end up with the same shape, so set `options.shape` when the
/// files differ in size.
pub fn read_batch<B: Backend, P: AsRef<Path>>(
    paths: &[P],
    options: &ReadOptions,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    if paths.is_empty() {
        anyhow::bail!("Cannot build a batch from zero images");
    }

    let mut images: Vec<Tensor<B, 3>> = Vec::with_capacity(paths.len());
    for path in paths {
        let image = read_image::<B, _>(path, options, device)?;
        if let Some(first) = images.first() {
            if first.dims() != image.dims() {
                anyhow::bail!(
                    "Image {} has shape {:?}, expected {:?}",
                    path.as_ref().display(),
                    image.dims(),
                    first.dims()
                );
            }
        }
        images.push(image);
    }

    Ok(Tensor::stack(images, 0))
}

/// Save a `[height, width, 1]` residual map as an 8-bit grayscale image.
///
/// Values are clamped to `[0, 1]`, so structural maps use the full range and
/// distance maps saturate.
pub fn write_resmap<B: Backend, P: AsRef<Path>>(path: P, resmap: Tensor<B, 3>) -> Result<()> {
    let path = path.as_ref();
    let [height, width, channels] = resmap.dims();
    if channels != 1 {
        anyhow::bail!("Residual map must have one channel, got {}", channels);
    }

    let data = resmap.clamp(0.0, 1.0).into_data();
    let pixels: Vec<u8> = data
        .iter::<f32>()
        .map(|v| Normalization::Rescale.invert(v))
        .collect();

    let buffer = GrayImage::from_raw(width as u32, height as u32, pixels)
        .context("Residual map buffer does not match its dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write resmap {}", path.display()))?;

    tracing::debug!("Wrote {}x{} resmap to {}", height, width, path.display());
    Ok(())
}
