//! redeem-linalg: dense single-precision vectors and matrices as views over
//! shared, reference-counted storage.
//!
//! Vectors are `(offset, stride, len)` windows and matrices add a shape and a
//! transpose flag, so rows, columns, windows and transposes are taken without
//! copying. Level-1/2/3 arithmetic is dispatched through a CBLAS-shaped
//! kernel interface (`kernels`) with a portable provider always available and
//! OpenBLAS behind the `openblas` feature. Elementwise multiply/divide on
//! contiguous, lane-aligned operands takes a vectorised path.
//!
//! Views are single-threaded (`!Send`, `!Sync`): mutation through one alias is
//! immediately visible through every other alias of the same buffer.
pub mod bridge;
pub mod buffer;
pub mod config;
pub mod elementwise;
pub mod error;
pub mod kernels;
pub mod logging;
pub mod math;

pub use error::{LinalgError, Result};
pub use math::{Matrix, Vector};
