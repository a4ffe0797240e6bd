use anyhow::Result;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use resmap_core::{ChannelMode, Normalization, ResidualMapEngine, ResmapMode, WindowParameters};
use resmap_io::{read_image, write_resmap, ReadOptions};
use tempfile::tempdir;

type B = NdArray<f32>;

#[test]
fn test_write_then_read_resmap() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("resmap.png");
    let device = Default::default();

    // 0.5 rounds to 128, 1.7 clamps to 255
    let resmap = Tensor::<B, 3>::from_data(
        TensorData::new(vec![0.0f32, 0.5, 1.0, 1.7], [2, 2, 1]),
        &device,
    );
    write_resmap(&file_path, resmap)?;

    let back = read_image::<B, _>(&file_path, &ReadOptions::default(), &device)?;
    assert_eq!(back.dims(), [2, 2, 1]);
    let values = back.into_data().to_vec::<f32>().unwrap();
    let expected = [0.0f32, 128.0 / 255.0, 1.0, 1.0];
    for (v, e) in values.iter().zip(expected) {
        assert!((v - e).abs() < 1e-6, "{v} != {e}");
    }
    Ok(())
}

#[test]
fn test_missing_file_has_context() {
    let device = Default::default();
    let err = read_image::<B, _>("does/not/exist.png", &ReadOptions::default(), &device)
        .unwrap_err();
    assert!(err.to_string().contains("does/not/exist.png"));
}

#[test]
fn test_multi_channel_resmap_rejected() {
    let dir = tempdir().unwrap();
    let device = Default::default();
    let resmap = Tensor::<B, 3>::zeros([2, 2, 3], &device);
    assert!(write_resmap(dir.path().join("bad.png"), resmap).is_err());
}

#[test]
fn test_file_pipeline_identity() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("input.png");
    image::RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 90]))
        .save(&file_path)?;

    let device = Default::default();
    let options = ReadOptions::new(ChannelMode::Rgb, Normalization::Rescale);
    let input = read_image::<B, _>(&file_path, &options, &device)?.unsqueeze::<4>();

    let engine = ResidualMapEngine::<B>::new(WindowParameters::default());
    let resmap = engine.compute_resmap(input.clone(), input, ResmapMode::Mssim)?;
    let score = engine.summary_score(resmap.clone()).into_scalar();
    assert!(score.abs() < 1e-4);

    write_resmap(dir.path().join("resmap.png"), resmap.reshape([16, 16, 1]))?;
    assert!(dir.path().join("resmap.png").exists());
    Ok(())
}

#[test]
fn test_write_double_precision_resmap() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("resmap64.png");
    let device = Default::default();

    let resmap = Tensor::<NdArray<f64>, 3>::from_data(
        TensorData::new(vec![0.0f64, 0.5, 1.0, 0.25], [2, 2, 1]),
        &device,
    );
    write_resmap(&file_path, resmap)?;

    let back = read_image::<B, _>(&file_path, &ReadOptions::default(), &device)?;
    let values = back.into_data().to_vec::<f32>().unwrap();
    assert!((values[1] - 128.0 / 255.0).abs() < 1e-6);
    assert!((values[2] - 1.0).abs() < 1e-6);
    Ok(())
}
