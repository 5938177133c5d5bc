//! OpenBLAS provider.
//!
//! Forwards every routine to the system `libopenblas` through its CBLAS
//! interface. Enable with the `openblas` feature; the library must be
//! available to the linker.
use std::cell::Cell;

use super::{Kernels, Layout, Transpose};
use crate::error::{fail, LinalgError};

#[link(name = "openblas")]
extern "C" {
    fn cblas_sscal(n: i32, alpha: f32, x: *mut f32, incx: i32);
    fn cblas_scopy(n: i32, x: *const f32, incx: i32, y: *mut f32, incy: i32);
    fn cblas_sswap(n: i32, x: *mut f32, incx: i32, y: *mut f32, incy: i32);
    fn cblas_saxpy(n: i32, alpha: f32, x: *const f32, incx: i32, y: *mut f32, incy: i32);
    fn cblas_sdot(n: i32, x: *const f32, incx: i32, y: *const f32, incy: i32) -> f32;
    fn cblas_snrm2(n: i32, x: *const f32, incx: i32) -> f32;
    fn cblas_sasum(n: i32, x: *const f32, incx: i32) -> f32;
    fn cblas_isamax(n: i32, x: *const f32, incx: i32) -> usize;

    fn cblas_sgemv(
        order: i32,
        trans: i32,
        m: i32,
        n: i32,
        alpha: f32,
        a: *const f32,
        lda: i32,
        x: *const f32,
        incx: i32,
        beta: f32,
        y: *mut f32,
        incy: i32,
    );
    fn cblas_sger(
        order: i32,
        m: i32,
        n: i32,
        alpha: f32,
        x: *const f32,
        incx: i32,
        y: *const f32,
        incy: i32,
        a: *mut f32,
        lda: i32,
    );
    fn cblas_sgemm(
        order: i32,
        transa: i32,
        transb: i32,
        m: i32,
        n: i32,
        k: i32,
        alpha: f32,
        a: *const f32,
        lda: i32,
        b: *const f32,
        ldb: i32,
        beta: f32,
        c: *mut f32,
        ldc: i32,
    );
}

/// CBLAS takes 32-bit sizes.
#[track_caller]
fn int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or_else(|_| {
        fail(LinalgError::IndexOutOfRange {
            index: value,
            len: i32::MAX as usize,
        })
    })
}

// Cell<f32> is layout-compatible with f32 and allows mutation through `&`.
#[inline]
fn ptr(cells: &[Cell<f32>]) -> *mut f32 {
    cells.as_ptr() as *mut f32
}

/// Provider backed by the system OpenBLAS library.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBlas;

impl Kernels for OpenBlas {
    fn name(&self) -> &'static str {
        "openblas"
    }

    fn sscal(&self, n: usize, alpha: f32, x: &[Cell<f32>], incx: usize) {
        unsafe { cblas_sscal(int(n), alpha, ptr(x), int(incx)) }
    }

    fn scopy(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) {
        unsafe { cblas_scopy(int(n), ptr(x), int(incx), ptr(y), int(incy)) }
    }

    fn sswap(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) {
        unsafe { cblas_sswap(int(n), ptr(x), int(incx), ptr(y), int(incy)) }
    }

    fn saxpy(
        &self,
        n: usize,
        alpha: f32,
        x: &[Cell<f32>],
        incx: usize,
        y: &[Cell<f32>],
        incy: usize,
    ) {
        unsafe { cblas_saxpy(int(n), alpha, ptr(x), int(incx), ptr(y), int(incy)) }
    }

    fn sdot(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) -> f32 {
        unsafe { cblas_sdot(int(n), ptr(x), int(incx), ptr(y), int(incy)) }
    }

    fn snrm2(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32 {
        unsafe { cblas_snrm2(int(n), ptr(x), int(incx)) }
    }

    fn sasum(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32 {
        unsafe { cblas_sasum(int(n), ptr(x), int(incx)) }
    }

    fn isamax(&self, n: usize, x: &[Cell<f32>], incx: usize) -> usize {
        if n == 0 {
            return 0;
        }
        unsafe { cblas_isamax(int(n), ptr(x), int(incx)) }
    }

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
    ) {
        unsafe {
            cblas_sgemv(
                layout.cblas_code(),
                trans.cblas_code(),
                int(m),
                int(n),
                alpha,
                ptr(a),
                int(lda),
                ptr(x),
                int(incx),
                beta,
                ptr(y),
                int(incy),
            )
        }
    }

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
    ) {
        unsafe {
            cblas_sger(
                layout.cblas_code(),
                int(m),
                int(n),
                alpha,
                ptr(x),
                int(incx),
                ptr(y),
                int(incy),
                ptr(a),
                int(lda),
            )
        }
    }

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
    ) {
        unsafe {
            cblas_sgemm(
                layout.cblas_code(),
                trans_a.cblas_code(),
                trans_b.cblas_code(),
                int(m),
                int(n),
                int(k),
                alpha,
                ptr(a),
                int(lda),
                ptr(b),
                int(ldb),
                beta,
                ptr(c),
                int(ldc),
            )
        }
    }
}
