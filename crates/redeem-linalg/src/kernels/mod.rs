//! Numeric kernel providers.
//!
//! `Kernels` mirrors the single-precision CBLAS Level-1/2/3 routines the view
//! types need. Vector arguments are cell slices starting at the first
//! addressed element together with a positive increment; matrix arguments are
//! slices starting at element `(0, 0)` together with a leading dimension.
//!
//! Two providers exist: `Reference`, a portable Rust implementation that is
//! always available, and `OpenBlas` (feature `openblas`) which forwards to the
//! system library. The active one is chosen by `config::KernelConfig`.
use std::cell::Cell;

use crate::config::{self, Backend};

mod reference;
#[cfg(feature = "openblas")]
mod openblas;

#[cfg(feature = "openblas")]
pub use openblas::OpenBlas;
pub use reference::Reference;

/// Storage order of a matrix argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    RowMajor,
    ColMajor,
}

impl Layout {
    /// `CBLAS_ORDER` value.
    pub fn cblas_code(self) -> i32 {
        match self {
            Layout::RowMajor => 101,
            Layout::ColMajor => 102,
        }
    }
}

/// Whether a matrix argument enters the product as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    NoTrans,
    Trans,
}

impl Transpose {
    /// `CBLAS_TRANSPOSE` value.
    pub fn cblas_code(self) -> i32 {
        match self {
            Transpose::NoTrans => 111,
            Transpose::Trans => 112,
        }
    }

    pub fn from_flag(transposed: bool) -> Self {
        if transposed {
            Transpose::Trans
        } else {
            Transpose::NoTrans
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Transpose::NoTrans => Transpose::Trans,
            Transpose::Trans => Transpose::NoTrans,
        }
    }
}

/// Single-precision BLAS routines used by the bridge.
#[allow(clippy::too_many_arguments)]
pub trait Kernels {
    fn name(&self) -> &'static str;

    /// x = alpha * x
    fn sscal(&self, n: usize, alpha: f32, x: &[Cell<f32>], incx: usize);

    /// y = x
    fn scopy(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize);

    /// x <-> y
    fn sswap(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize);

    /// y = alpha * x + y
    fn saxpy(
        &self,
        n: usize,
        alpha: f32,
        x: &[Cell<f32>],
        incx: usize,
        y: &[Cell<f32>],
        incy: usize,
    );

    fn sdot(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) -> f32;

    /// Euclidean norm.
    fn snrm2(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32;

    /// Sum of absolute values.
    fn sasum(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32;

    /// Zero-based index of the first element with the largest magnitude, 0 when `n == 0`.
    fn isamax(&self, n: usize, x: &[Cell<f32>], incx: usize) -> usize;

    /// y = alpha * op(A) * x + beta * y, where A is `m x n` as stored.
    fn sgemv(
        &self,
        layout: Layout,
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: f32,
        a: &[Cell<f32>],
        lda: usize,
        x: &[Cell<f32>],
        incx: usize,
        beta: f32,
        y: &[Cell<f32>],
        incy: usize,
    );

    /// A = alpha * x * y^T + A, where A is `m x n`.
    fn sger(
        &self,
        layout: Layout,
        m: usize,
        n: usize,
        alpha: f32,
        x: &[Cell<f32>],
        incx: usize,
        y: &[Cell<f32>],
        incy: usize,
        a: &[Cell<f32>],
        lda: usize,
    );

    /// C = alpha * op(A) * op(B) + beta * C, with op(A) `m x k`, op(B) `k x n`.
    fn sgemm(
        &self,
        layout: Layout,
        trans_a: Transpose,
        trans_b: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[Cell<f32>],
        lda: usize,
        b: &[Cell<f32>],
        ldb: usize,
        beta: f32,
        c: &[Cell<f32>],
        ldc: usize,
    );
}

static REFERENCE: Reference = Reference;
#[cfg(feature = "openblas")]
static OPENBLAS: OpenBlas = OpenBlas;

/// Provider for `backend`.
pub fn provider(backend: Backend) -> &'static dyn Kernels {
    match backend {
        Backend::Reference => &REFERENCE,
        #[cfg(feature = "openblas")]
        Backend::OpenBlas => &OPENBLAS,
    }
}

/// Provider selected by the current thread's configuration.
pub fn active() -> &'static dyn Kernels {
    provider(config::current().backend)
}
