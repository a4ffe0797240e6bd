//! Reflect padding for image planes.
//!
//! Border pixels mirror about the edge without repeating it
//! (`d c b | a b c d | c b a`). Pads wider than the image fold back and forth,
//! and a one-pixel axis repeats its only value. Padding is a gather along each
//! spatial axis, so gradients flow back to the source pixels.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Map a possibly out-of-range index onto `0..len` by reflection.
pub fn reflect_index(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

/// Source indices for an axis of `len` pixels padded by `radius` on both sides.
pub fn reflect_indices(len: usize, radius: usize) -> Vec<i32> {
    let radius = radius as isize;
    (-radius..len as isize + radius)
        .map(|i| reflect_index(i, len) as i32)
        .collect()
}

/// Reflect-pad the two trailing (spatial) axes of `[planes, 1, H, W]` by `radius`.
pub fn reflect_pad<B: Backend>(planes: Tensor<B, 4>, radius: usize) -> Tensor<B, 4> {
    if radius == 0 {
        return planes;
    }
    let [_, _, h, w] = planes.dims();
    let device = planes.device();

    let rows = reflect_indices(h, radius);
    let cols = reflect_indices(w, radius);
    let rows = Tensor::<B, 1, Int>::from_ints(rows.as_slice(), &device);
    let cols = Tensor::<B, 1, Int>::from_ints(cols.as_slice(), &device);

    planes.select(2, rows).select(3, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_reflect_index() {
        // len 4: ... 2 1 | 0 1 2 3 | 2 1 0 ...
        assert_eq!(reflect_index(-1, 4), 1);
        assert_eq!(reflect_index(-2, 4), 2);
        assert_eq!(reflect_index(4, 4), 2);
        assert_eq!(reflect_index(6, 4), 0);
        assert_eq!(reflect_index(2, 4), 2);
        // folds for pads wider than the axis
        assert_eq!(reflect_index(-5, 4), 1);
        assert_eq!(reflect_index(9, 4), 3);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_reflect_indices() {
        assert_eq!(reflect_indices(3, 2), vec![2, 1, 0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_reflect_pad_shape_and_values() {
        let device = Default::default();
        let planes = Tensor::<B, 4>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0], [1, 1, 2, 2]),
            &device,
        );
        let padded = reflect_pad(planes, 1);
        assert_eq!(padded.dims(), [1, 1, 4, 4]);
        let values = padded.into_data().to_vec::<f32>().unwrap();
        assert_eq!(
            values,
            vec![
                4.0, 3.0, 4.0, 3.0,
                2.0, 1.0, 2.0, 1.0,
                4.0, 3.0, 4.0, 3.0,
                2.0, 1.0, 2.0, 1.0,
            ]
        );
    }
}
