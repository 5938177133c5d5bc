//! Vector and matrix views.
//!
//! `Vector` is a strided window over a `SharedBuffer`; `Matrix` wraps a
//! contiguous `Vector` with a shape and a transpose flag. Both alias their
//! storage on `Clone`, on `transpose`, and when taking rows, columns or
//! windows; `deep_clone` is the only way to get an independent copy.
mod interop;
pub mod matrix;
mod ops;
mod random;
pub mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
