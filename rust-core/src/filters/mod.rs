//! Window generation, interpolation kernels and direct convolution

pub mod windows;
pub mod design;
pub mod fir;

pub use windows::{WindowKind, WindowType, generate_window, DOLPH_CHEBYSHEV_47};
pub use design::{KernelKind, lanczos_kernel, tent_kernel};
pub use fir::{convolve, upsample};
