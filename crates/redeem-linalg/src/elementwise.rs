//! Elementwise loops over strided cell slices.
//!
//! The scalar path walks both operands with their own strides and is always
//! correct. The vectorised path handles contiguous operands whose length is a
//! whole number of `LANES`-wide chunks; with the `simd` feature on x86_64 it
//! uses AVX when the CPU supports it, otherwise fixed-width lane arrays the
//! compiler can vectorise. Multiplication and division are exactly rounded in
//! both paths, so the results do not depend on the path taken.
use std::cell::Cell;

use crate::bridge::VectorArgs;
use crate::error::{fail, LinalgError};

/// SIMD lane width in single precision (one 256-bit register).
pub const LANES: usize = 8;

/// `len` rounded up to a multiple of `LANES`.
pub const fn aligned_len(len: usize) -> usize {
    (len + LANES - 1) / LANES * LANES
}

pub(crate) fn checked_aligned_len(len: usize) -> Option<usize> {
    len.checked_add(LANES - 1).map(|n| n / LANES * LANES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaneOp {
    Mul,
    Div,
}

impl LaneOp {
    #[inline]
    pub(crate) fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            LaneOp::Mul => a * b,
            LaneOp::Div => a / b,
        }
    }
}

/// Whether `x op= y` may take the vectorised path.
///
/// Both operands must be contiguous and lane-aligned in length. Operands on
/// the same buffer must either coincide or be disjoint: a partial overlap
/// would make chunked loads observe a different write order than the scalar
/// loop.
pub(crate) fn can_vectorize(x: &VectorArgs, y: &VectorArgs, same_buffer: bool) -> bool {
    if x.inc != 1 || y.inc != 1 || x.n != y.n || x.n != aligned_len(x.n) {
        return false;
    }
    !same_buffer
        || x.offset == y.offset
        || x.offset + x.n <= y.offset
        || y.offset + y.n <= x.offset
}

/// `x[i] = op(x[i], y[i])` for `i < n`, each operand with its own stride.
pub(crate) fn zip_apply<F>(
    n: usize,
    x: &[Cell<f32>],
    incx: usize,
    y: &[Cell<f32>],
    incy: usize,
    mut op: F,
) where
    F: FnMut(f32, f32) -> f32,
{
    for i in 0..n {
        let target = &x[i * incx];
        target.set(op(target.get(), y[i * incy].get()));
    }
}

/// `x[i] = f(x[i])` for `i < n`.
pub(crate) fn map_apply<F>(n: usize, x: &[Cell<f32>], incx: usize, mut f: F)
where
    F: FnMut(f32) -> f32,
{
    for i in 0..n {
        let target = &x[i * incx];
        target.set(f(target.get()));
    }
}

/// `x[i] = op(x[i], y[i])` over whole `LANES`-wide chunks.
#[track_caller]
pub(crate) fn lanes_apply(x: &[Cell<f32>], y: &[Cell<f32>], n: usize, op: LaneOp) {
    if n % LANES != 0 {
        fail(LinalgError::UnalignedVectorizedAccess {
            len: n,
            lanes: LANES,
        });
    }
    let x = &x[..n];
    let y = &y[..n];

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx") {
            unsafe { lanes_apply_avx(x, y, op) };
            return;
        }
    }

    for (xs, ys) in x.chunks_exact(LANES).zip(y.chunks_exact(LANES)) {
        let mut a = [0f32; LANES];
        let mut b = [0f32; LANES];
        for lane in 0..LANES {
            a[lane] = xs[lane].get();
            b[lane] = ys[lane].get();
        }
        for lane in 0..LANES {
            xs[lane].set(op.apply(a[lane], b[lane]));
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx")]
unsafe fn lanes_apply_avx(x: &[Cell<f32>], y: &[Cell<f32>], op: LaneOp) {
    use std::arch::x86_64::*;

    // Cell<f32> has the layout of f32 and permits writes through shared references.
    let xp = x.as_ptr() as *mut f32;
    let yp = y.as_ptr() as *const f32;

    let mut i = 0usize;
    while i + LANES <= x.len() {
        let a = _mm256_loadu_ps(xp.add(i));
        let b = _mm256_loadu_ps(yp.add(i));
        let r = match op {
            LaneOp::Mul => _mm256_mul_ps(a, b),
            LaneOp::Div => _mm256_div_ps(a, b),
        };
        _mm256_storeu_ps(xp.add(i), r);
        i += LANES;
    }
}
