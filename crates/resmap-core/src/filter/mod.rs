pub mod kernel;
pub mod pad;
pub mod window;

pub use kernel::{box_kernel, gaussian_kernel, window_kernel};
pub use pad::reflect_pad;
pub use window::WindowFilter;
