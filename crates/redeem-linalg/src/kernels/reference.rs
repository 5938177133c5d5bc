//! Portable reference provider.
//!
//! Straightforward loops with the semantics of the Netlib reference BLAS.
//! Level-2/3 results are accumulated into a scratch vector before `y`/`C` is
//! written, so an output that overlaps an input still sees the original
//! input values. When `beta == 0` the previous output is not read, which
//! keeps NaN garbage in a fresh output from leaking into the result.
use std::cell::Cell;

use super::{Kernels, Layout, Transpose};

/// Pure Rust BLAS implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reference;

#[inline]
fn index(layout: Layout, row: usize, col: usize, ld: usize) -> usize {
    match layout {
        Layout::RowMajor => row * ld + col,
        Layout::ColMajor => col * ld + row,
    }
}

#[inline]
fn blend(alpha: f32, acc: f32, beta: f32, prev: &Cell<f32>) -> f32 {
    if beta == 0.0 {
        alpha * acc
    } else {
        alpha * acc + beta * prev.get()
    }
}

impl Kernels for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn sscal(&self, n: usize, alpha: f32, x: &[Cell<f32>], incx: usize) {
        for i in 0..n {
            let v = &x[i * incx];
            v.set(alpha * v.get());
        }
    }

    fn scopy(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) {
        for i in 0..n {
            y[i * incy].set(x[i * incx].get());
        }
    }

    fn sswap(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) {
        for i in 0..n {
            x[i * incx].swap(&y[i * incy]);
        }
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
        for i in 0..n {
            let target = &y[i * incy];
            target.set(target.get() + alpha * x[i * incx].get());
        }
    }

    fn sdot(&self, n: usize, x: &[Cell<f32>], incx: usize, y: &[Cell<f32>], incy: usize) -> f32 {
        let mut acc = 0.0f32;
        for i in 0..n {
            acc += x[i * incx].get() * y[i * incy].get();
        }
        acc
    }

    fn snrm2(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32 {
        // Scaled sum of squares; avoids overflow for large magnitudes.
        let mut scale = 0.0f32;
        let mut ssq = 1.0f32;
        for i in 0..n {
            let value = x[i * incx].get();
            if value != 0.0 {
                let abs = value.abs();
                if scale < abs {
                    let ratio = scale / abs;
                    ssq = 1.0 + ssq * ratio * ratio;
                    scale = abs;
                } else {
                    let ratio = abs / scale;
                    ssq += ratio * ratio;
                }
            }
        }
        scale * ssq.sqrt()
    }

    fn sasum(&self, n: usize, x: &[Cell<f32>], incx: usize) -> f32 {
        (0..n).map(|i| x[i * incx].get().abs()).sum()
    }

    fn isamax(&self, n: usize, x: &[Cell<f32>], incx: usize) -> usize {
        let mut best = 0usize;
        let mut best_abs = f32::NEG_INFINITY;
        for i in 0..n {
            let abs = x[i * incx].get().abs();
            if abs > best_abs {
                best_abs = abs;
                best = i;
            }
        }
        best
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
        let (y_len, x_len) = match trans {
            Transpose::NoTrans => (m, n),
            Transpose::Trans => (n, m),
        };
        let mut out = Vec::with_capacity(y_len);
        for r in 0..y_len {
            let mut acc = 0.0f32;
            for c in 0..x_len {
                let a_rc = match trans {
                    Transpose::NoTrans => a[index(layout, r, c, lda)].get(),
                    Transpose::Trans => a[index(layout, c, r, lda)].get(),
                };
                acc += a_rc * x[c * incx].get();
            }
            out.push(acc);
        }
        for (r, acc) in out.into_iter().enumerate() {
            let target = &y[r * incy];
            target.set(blend(alpha, acc, beta, target));
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
        for i in 0..m {
            let xi = alpha * x[i * incx].get();
            for j in 0..n {
                let target = &a[index(layout, i, j, lda)];
                target.set(target.get() + xi * y[j * incy].get());
            }
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
        let op_a = |i: usize, l: usize| match trans_a {
            Transpose::NoTrans => a[index(layout, i, l, lda)].get(),
            Transpose::Trans => a[index(layout, l, i, lda)].get(),
        };
        let op_b = |l: usize, j: usize| match trans_b {
            Transpose::NoTrans => b[index(layout, l, j, ldb)].get(),
            Transpose::Trans => b[index(layout, j, l, ldb)].get(),
        };

        let mut out = vec![0.0f32; m * n];
        for i in 0..m {
            for l in 0..k {
                let a_il = op_a(i, l);
                for j in 0..n {
                    out[i * n + j] += a_il * op_b(l, j);
                }
            }
        }
        for i in 0..m {
            for j in 0..n {
                let target = &c[index(layout, i, j, ldc)];
                target.set(blend(alpha, out[i * n + j], beta, target));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[f32]) -> Vec<Cell<f32>> {
        values.iter().copied().map(Cell::new).collect()
    }

    fn values(cells: &[Cell<f32>]) -> Vec<f32> {
        cells.iter().map(Cell::get).collect()
    }

    #[test]
    fn test_dot() {
        let x = cells(&[1.0, 2.0, 3.0]);
        let y = cells(&[4.0, 5.0, 6.0]);
        assert_eq!(Reference.sdot(3, &x, 1, &y, 1), 32.0);
    }

    #[test]
    fn test_axpy() {
        let x = cells(&[1.0, 2.0, 3.0]);
        let y = cells(&[4.0, 5.0, 6.0]);
        Reference.saxpy(3, 2.0, &x, 1, &y, 1);
        assert_eq!(values(&y), vec![6.0, 9.0, 12.0]);
    }

    #[test]
    fn nrm2_asum_and_iamax() {
        let x = cells(&[3.0, -4.0, 0.0, 4.0]);
        assert_eq!(Reference.snrm2(2, &x, 1), 5.0);
        assert_eq!(Reference.sasum(4, &x, 1), 11.0);
        // |-4| and |4| tie; the first one wins.
        assert_eq!(Reference.isamax(4, &x, 1), 1);
        assert_eq!(Reference.isamax(0, &x, 1), 0);
        assert_eq!(Reference.snrm2(0, &x, 1), 0.0);
    }

    #[test]
    fn swap_and_copy_with_increments() {
        let x = cells(&[1.0, 0.0, 2.0, 0.0]);
        let y = cells(&[7.0, 8.0]);
        Reference.sswap(2, &x, 2, &y, 1);
        assert_eq!(values(&x), vec![7.0, 0.0, 8.0, 0.0]);
        assert_eq!(values(&y), vec![1.0, 2.0]);

        Reference.scopy(2, &y, 1, &x, 2);
        assert_eq!(values(&x), vec![1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn gemm_row_major_no_trans() {
        let a = cells(&[1.0, 2.0, 3.0, 2.0, 3.0, 4.0]);
        let b = cells(&[1.0, 2.0, 3.0, 4.0, 2.0, 3.0, 4.0, 5.0, 3.0, 4.0, 5.0, 6.0]);
        let c = cells(&[0.0; 8]);
        Reference.sgemm(
            Layout::RowMajor,
            Transpose::NoTrans,
            Transpose::NoTrans,
            2,
            4,
            3,
            1.0,
            &a,
            3,
            &b,
            4,
            0.0,
            &c,
            4,
        );
        assert_eq!(
            values(&c),
            vec![14.0, 20.0, 26.0, 32.0, 20.0, 29.0, 38.0, 47.0]
        );
    }

    #[test]
    fn gemm_col_major_matches_row_major_of_transposes() {
        // Column-major A (2x2) = [[1, 2], [3, 4]] is stored as [1, 3, 2, 4].
        let a = cells(&[1.0, 3.0, 2.0, 4.0]);
        let b = cells(&[1.0, 0.0, 0.0, 1.0]);
        let c = cells(&[0.0; 4]);
        Reference.sgemm(
            Layout::ColMajor,
            Transpose::NoTrans,
            Transpose::NoTrans,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &c,
            2,
        );
        assert_eq!(values(&c), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn gemm_beta_zero_ignores_previous_output() {
        let a = cells(&[1.0]);
        let b = cells(&[2.0]);
        let c = cells(&[f32::NAN]);
        Reference.sgemm(
            Layout::RowMajor,
            Transpose::NoTrans,
            Transpose::NoTrans,
            1,
            1,
            1,
            1.0,
            &a,
            1,
            &b,
            1,
            0.0,
            &c,
            1,
        );
        assert_eq!(c[0].get(), 2.0);
    }

    #[test]
    fn gemv_trans_uses_stored_dimensions() {
        // A is 2x3 as stored; op(A) = A^T is 3x2.
        let a = cells(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let x = cells(&[1.0, 1.0]);
        let y = cells(&[1.0, 1.0, 1.0]);
        Reference.sgemv(
            Layout::RowMajor,
            Transpose::Trans,
            2,
            3,
            1.0,
            &a,
            3,
            &x,
            1,
            2.0,
            &y,
            1,
        );
        assert_eq!(values(&y), vec![7.0, 9.0, 11.0]);
    }

    #[test]
    fn ger_adds_outer_product() {
        let x = cells(&[1.0, 2.0]);
        let y = cells(&[3.0, 4.0, 5.0]);
        let a = cells(&[1.0; 6]);
        Reference.sger(Layout::RowMajor, 2, 3, 1.0, &x, 1, &y, 1, &a, 3);
        assert_eq!(values(&a), vec![4.0, 5.0, 6.0, 7.0, 9.0, 11.0]);
    }
}
