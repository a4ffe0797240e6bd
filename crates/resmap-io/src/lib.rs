//! Image file IO: decode files into normalized tensors and save residual maps.

pub mod image_io;

pub use image_io::{read_batch, read_image, write_resmap, ReadOptions};
