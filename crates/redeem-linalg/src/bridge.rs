//! Mapping from views to kernel arguments.
//!
//! Every view is addressed row-major. A transposed matrix keeps its physical
//! storage and is handed to the kernels with `Transpose::Trans` and the
//! leading dimension of the stored layout, so no data moves. The argument
//! records are plain values and can be inspected without calling a kernel.
use std::cell::Cell;

use log::trace;

use crate::buffer::SharedBuffer;
use crate::error::{ensure_shape, fail, LinalgError, Result};
use crate::kernels::{self, Layout, Transpose};
use crate::math::{Matrix, Vector};

/// Kernel arguments describing a vector operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorArgs {
    pub n: usize,
    pub offset: usize,
    pub inc: usize,
}

pub fn vector_args(v: &Vector) -> VectorArgs {
    VectorArgs {
        n: v.len(),
        offset: v.offset(),
        inc: v.stride(),
    }
}

/// Kernel arguments describing a matrix operand.
///
/// `rows` and `cols` are the stored (physical) dimensions; `trans` says
/// whether the logical matrix is the transpose of the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixArgs {
    pub layout: Layout,
    pub trans: Transpose,
    pub rows: usize,
    pub cols: usize,
    pub offset: usize,
    pub ld: usize,
}

impl MatrixArgs {
    /// The same storage entering the product as its transpose.
    pub fn transposed(self) -> Self {
        Self {
            trans: self.trans.flip(),
            ..self
        }
    }

    /// Logical `(rows, cols)` of `op(stored)`.
    pub fn op_shape(&self) -> (usize, usize) {
        match self.trans {
            Transpose::NoTrans => (self.rows, self.cols),
            Transpose::Trans => (self.cols, self.rows),
        }
    }
}

pub fn matrix_args(m: &Matrix) -> MatrixArgs {
    let (rows, cols) = if m.is_transposed() {
        (m.cols(), m.rows())
    } else {
        (m.rows(), m.cols())
    };
    MatrixArgs {
        layout: Layout::RowMajor,
        trans: Transpose::from_flag(m.is_transposed()),
        rows,
        cols,
        offset: m.as_vector().offset(),
        ld: m.ldim().max(1),
    }
}

/// Which operand is read first by `sgemm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmOrder {
    /// `C = op(A) * op(B)`
    Direct,
    /// `C^T = op(B)^T * op(A)^T`, used when the output is transposed.
    Swapped,
}

/// Arguments of `C = alpha * A * B + beta * C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmArgs {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub first: MatrixArgs,
    pub second: MatrixArgs,
    pub out: MatrixArgs,
    pub order: GemmOrder,
}

impl GemmArgs {
    pub fn new(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<Self> {
        if a.cols() != b.rows() {
            return Err(LinalgError::ShapeMismatch {
                op: "gemm",
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }
        if c.shape() != (a.rows(), b.cols()) {
            return Err(LinalgError::ShapeMismatch {
                op: "gemm",
                lhs: c.shape(),
                rhs: (a.rows(), b.cols()),
            });
        }

        let a_args = matrix_args(a);
        let b_args = matrix_args(b);
        let c_args = matrix_args(c);
        let k = a.cols();

        // A transposed output is written through its physical layout.
        let args = if c.is_transposed() {
            GemmArgs {
                m: c.cols(),
                n: c.rows(),
                k,
                first: b_args.transposed(),
                second: a_args.transposed(),
                out: c_args,
                order: GemmOrder::Swapped,
            }
        } else {
            GemmArgs {
                m: c.rows(),
                n: c.cols(),
                k,
                first: a_args,
                second: b_args,
                out: c_args,
                order: GemmOrder::Direct,
            }
        };
        Ok(args)
    }
}

/// Arguments of `y = alpha * A * x + beta * y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemvArgs {
    pub a: MatrixArgs,
    pub x: VectorArgs,
    pub y: VectorArgs,
}

impl GemvArgs {
    pub fn new(a: &Matrix, x: &Vector, y: &Vector) -> Result<Self> {
        if a.cols() != x.len() {
            return Err(LinalgError::ShapeMismatch {
                op: "gemv",
                lhs: a.shape(),
                rhs: (x.len(), 1),
            });
        }
        if a.rows() != y.len() {
            return Err(LinalgError::ShapeMismatch {
                op: "gemv",
                lhs: (y.len(), 1),
                rhs: (a.rows(), 1),
            });
        }
        Ok(GemvArgs {
            a: matrix_args(a),
            x: vector_args(x),
            y: vector_args(y),
        })
    }
}

/// Arguments of `A = alpha * x * y^T + A` on the stored layout of `A`.
///
/// `sger` has no transpose argument, so for a transposed `A` the update is
/// applied to the stored matrix as `y * x^T` and `swapped` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GerArgs {
    pub a: MatrixArgs,
    pub x: VectorArgs,
    pub y: VectorArgs,
    pub swapped: bool,
}

impl GerArgs {
    pub fn new(a: &Matrix, x: &Vector, y: &Vector) -> Result<Self> {
        if (x.len(), y.len()) != a.shape() {
            return Err(LinalgError::ShapeMismatch {
                op: "ger",
                lhs: a.shape(),
                rhs: (x.len(), y.len()),
            });
        }
        let a_args = matrix_args(a);
        let swapped = a.is_transposed();
        let (x, y) = if swapped {
            (vector_args(y), vector_args(x))
        } else {
            (vector_args(x), vector_args(y))
        };
        Ok(GerArgs {
            a: a_args,
            x,
            y,
            swapped,
        })
    }
}

fn tail(buffer: &SharedBuffer, offset: usize) -> &[Cell<f32>] {
    buffer.cells().get(offset..).unwrap_or(&[])
}

fn cells(v: &Vector) -> &[Cell<f32>] {
    tail(v.buffer(), v.offset())
}

fn matrix_cells(m: &Matrix) -> &[Cell<f32>] {
    cells(m.as_vector())
}

// ---------------------------------------------------------------------------
// Level 1
// ---------------------------------------------------------------------------

/// x = alpha * x
pub fn scal(alpha: f32, x: &Vector) {
    let kernels = kernels::active();
    trace!("{}: sscal n={} incx={}", kernels.name(), x.len(), x.stride());
    kernels.sscal(x.len(), alpha, cells(x), x.stride());
}

/// y = x
#[track_caller]
pub fn copy(x: &Vector, y: &Vector) {
    ensure_shape("copy", (y.len(), 1), (x.len(), 1));
    let kernels = kernels::active();
    trace!(
        "{}: scopy n={} incx={} incy={}",
        kernels.name(),
        x.len(),
        x.stride(),
        y.stride()
    );
    kernels.scopy(x.len(), cells(x), x.stride(), cells(y), y.stride());
}

/// x <-> y
#[track_caller]
pub fn swap(x: &Vector, y: &Vector) {
    ensure_shape("swap", (x.len(), 1), (y.len(), 1));
    let kernels = kernels::active();
    trace!(
        "{}: sswap n={} incx={} incy={}",
        kernels.name(),
        x.len(),
        x.stride(),
        y.stride()
    );
    kernels.sswap(x.len(), cells(x), x.stride(), cells(y), y.stride());
}

/// y = alpha * x + y
#[track_caller]
pub fn axpy(alpha: f32, x: &Vector, y: &Vector) {
    ensure_shape("axpy", (y.len(), 1), (x.len(), 1));
    let kernels = kernels::active();
    trace!(
        "{}: saxpy n={} incx={} incy={}",
        kernels.name(),
        x.len(),
        x.stride(),
        y.stride()
    );
    kernels.saxpy(x.len(), alpha, cells(x), x.stride(), cells(y), y.stride());
}

#[track_caller]
pub fn dot(x: &Vector, y: &Vector) -> f32 {
    ensure_shape("dot", (x.len(), 1), (y.len(), 1));
    let kernels = kernels::active();
    trace!(
        "{}: sdot n={} incx={} incy={}",
        kernels.name(),
        x.len(),
        x.stride(),
        y.stride()
    );
    kernels.sdot(x.len(), cells(x), x.stride(), cells(y), y.stride())
}

pub fn nrm2(x: &Vector) -> f32 {
    let kernels = kernels::active();
    trace!("{}: snrm2 n={} incx={}", kernels.name(), x.len(), x.stride());
    kernels.snrm2(x.len(), cells(x), x.stride())
}

pub fn asum(x: &Vector) -> f32 {
    let kernels = kernels::active();
    trace!("{}: sasum n={} incx={}", kernels.name(), x.len(), x.stride());
    kernels.sasum(x.len(), cells(x), x.stride())
}

/// Index of the first element with the largest magnitude; `None` when empty.
pub fn iamax(x: &Vector) -> Option<usize> {
    if x.is_empty() {
        return None;
    }
    let kernels = kernels::active();
    trace!("{}: isamax n={} incx={}", kernels.name(), x.len(), x.stride());
    Some(kernels.isamax(x.len(), cells(x), x.stride()))
}

// ---------------------------------------------------------------------------
// Level 2
// ---------------------------------------------------------------------------

/// y = alpha * A * x + beta * y
#[track_caller]
pub fn gemv(alpha: f32, a: &Matrix, x: &Vector, beta: f32, y: &Vector) {
    let args = GemvArgs::new(a, x, y).unwrap_or_else(|err| fail(err));
    if y.shares_buffer_with(a.as_vector()) || y.shares_buffer_with(x) {
        let scratch = y.deep_clone();
        gemv(alpha, a, x, beta, &scratch);
        copy(&scratch, y);
        return;
    }

    let kernels = kernels::active();
    trace!(
        "{}: sgemv trans={:?} m={} n={} lda={} incx={} incy={}",
        kernels.name(),
        args.a.trans,
        args.a.rows,
        args.a.cols,
        args.a.ld,
        args.x.inc,
        args.y.inc
    );
    kernels.sgemv(
        args.a.layout,
        args.a.trans,
        args.a.rows,
        args.a.cols,
        alpha,
        matrix_cells(a),
        args.a.ld,
        cells(x),
        args.x.inc,
        beta,
        cells(y),
        args.y.inc,
    );
}

/// A = alpha * x * y^T + A
#[track_caller]
pub fn ger(alpha: f32, x: &Vector, y: &Vector, a: &Matrix) {
    let args = GerArgs::new(a, x, y).unwrap_or_else(|err| fail(err));
    let storage = a.as_vector();
    if storage.shares_buffer_with(x) || storage.shares_buffer_with(y) {
        ger(alpha, &x.deep_clone(), &y.deep_clone(), a);
        return;
    }

    let (x, y) = if args.swapped { (y, x) } else { (x, y) };
    let kernels = kernels::active();
    trace!(
        "{}: sger m={} n={} lda={} incx={} incy={}",
        kernels.name(),
        args.a.rows,
        args.a.cols,
        args.a.ld,
        args.x.inc,
        args.y.inc
    );
    kernels.sger(
        args.a.layout,
        args.a.rows,
        args.a.cols,
        alpha,
        cells(x),
        args.x.inc,
        cells(y),
        args.y.inc,
        matrix_cells(a),
        args.a.ld,
    );
}

// ---------------------------------------------------------------------------
// Level 3
// ---------------------------------------------------------------------------

/// C = alpha * A * B + beta * C
#[track_caller]
pub fn gemm(alpha: f32, a: &Matrix, b: &Matrix, beta: f32, c: &Matrix) {
    let args = GemmArgs::new(a, b, c).unwrap_or_else(|err| fail(err));
    let out = c.as_vector();
    if out.shares_buffer_with(a.as_vector()) || out.shares_buffer_with(b.as_vector()) {
        let scratch = c.deep_clone();
        gemm(alpha, a, b, beta, &scratch);
        c.copy_from(&scratch);
        return;
    }

    let (first, second) = match args.order {
        GemmOrder::Direct => (a, b),
        GemmOrder::Swapped => (b, a),
    };
    let kernels = kernels::active();
    trace!(
        "{}: sgemm transa={:?} transb={:?} m={} n={} k={} lda={} ldb={} ldc={}",
        kernels.name(),
        args.first.trans,
        args.second.trans,
        args.m,
        args.n,
        args.k,
        args.first.ld,
        args.second.ld,
        args.out.ld
    );
    kernels.sgemm(
        args.out.layout,
        args.first.trans,
        args.second.trans,
        args.m,
        args.n,
        args.k,
        alpha,
        matrix_cells(first),
        args.first.ld,
        matrix_cells(second),
        args.second.ld,
        beta,
        matrix_cells(c),
        args.out.ld,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m23() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]]).unwrap()
    }

    fn m34() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 3.0, 4.0, 5.0],
            vec![3.0, 4.0, 5.0, 6.0],
        ])
        .unwrap()
    }

    #[test]
    fn matrix_args_follow_the_transpose_flag() {
        let m = m23();
        let args = matrix_args(&m);
        assert_eq!(args.layout, Layout::RowMajor);
        assert_eq!(args.trans, Transpose::NoTrans);
        assert_eq!((args.rows, args.cols, args.ld), (2, 3, 3));
        assert_eq!(args.op_shape(), (2, 3));

        let t = m.transpose();
        let args = matrix_args(&t);
        assert_eq!(args.trans, Transpose::Trans);
        assert_eq!((args.rows, args.cols, args.ld), (2, 3, 3));
        assert_eq!(args.op_shape(), (3, 2));
        assert_eq!(t.ldim(), 3);
    }

    #[test]
    fn vector_args_forward_the_window() {
        let v = Vector::from_vec((0..10).map(|i| i as f32).collect());
        let w = v.window(1, 3, 3).unwrap();
        assert_eq!(
            vector_args(&w),
            VectorArgs {
                n: 3,
                offset: 1,
                inc: 3
            }
        );
    }

    #[test]
    fn gemm_leading_dimensions_for_every_flag_combination() {
        for &ta in &[false, true] {
            for &tb in &[false, true] {
                for &tc in &[false, true] {
                    let a = if ta {
                        m23().transpose().deep_clone().transpose()
                    } else {
                        m23()
                    };
                    let b = if tb {
                        m34().transpose().deep_clone().transpose()
                    } else {
                        m34()
                    };
                    let c = if tc {
                        Matrix::zeros(4, 2).transpose()
                    } else {
                        Matrix::zeros(2, 4)
                    };
                    let args = GemmArgs::new(&a, &b, &c).unwrap();
                    // Stored row pitch of each operand.
                    let lda = if ta { 2 } else { 3 };
                    let ldb = if tb { 3 } else { 4 };
                    let ldc = if tc { 2 } else { 4 };
                    assert_eq!(args.k, 3);
                    assert_eq!(args.out.ld, ldc);
                    if tc {
                        assert_eq!(args.order, GemmOrder::Swapped);
                        assert_eq!((args.m, args.n), (4, 2));
                        assert_eq!(args.first.ld, ldb);
                        assert_eq!(args.second.ld, lda);
                        assert_eq!(args.first.trans, Transpose::from_flag(!tb));
                        assert_eq!(args.second.trans, Transpose::from_flag(!ta));
                    } else {
                        assert_eq!(args.order, GemmOrder::Direct);
                        assert_eq!((args.m, args.n), (2, 4));
                        assert_eq!(args.first.ld, lda);
                        assert_eq!(args.second.ld, ldb);
                        assert_eq!(args.first.trans, Transpose::from_flag(ta));
                        assert_eq!(args.second.trans, Transpose::from_flag(tb));
                    }
                    assert_eq!(args.first.op_shape(), (args.m, args.k));
                    assert_eq!(args.second.op_shape(), (args.k, args.n));
                }
            }
        }
    }

    #[test]
    fn gemm_args_reject_inner_dimension_mismatch() {
        let err = GemmArgs::new(&m23(), &m23(), &Matrix::zeros(2, 3)).unwrap_err();
        assert_eq!(
            err,
            LinalgError::ShapeMismatch {
                op: "gemm",
                lhs: (2, 3),
                rhs: (2, 3)
            }
        );
    }

    #[test]
    fn gemv_args_use_stored_dimensions() {
        let a = m23().transpose();
        let x = Vector::zeros(2);
        let y = Vector::zeros(3);
        let args = GemvArgs::new(&a, &x, &y).unwrap();
        assert_eq!((args.a.rows, args.a.cols), (2, 3));
        assert_eq!(args.a.trans, Transpose::Trans);
        assert!(GemvArgs::new(&a, &y, &y).is_err());
    }

    #[test]
    fn ger_args_swap_operands_for_transposed_target() {
        let a = Matrix::zeros(3, 2).transpose();
        let x = Vector::zeros(2);
        let y = Vector::zeros(3);
        let args = GerArgs::new(&a, &x, &y).unwrap();
        assert!(args.swapped);
        assert_eq!((args.a.rows, args.a.cols), (3, 2));
        assert_eq!(args.x.n, 3);
        assert_eq!(args.y.n, 2);
    }

    #[test]
    fn gemm_matches_the_worked_example() {
        let c = Matrix::zeros(2, 4);
        gemm(1.0, &m23(), &m34(), 0.0, &c);
        assert_eq!(
            c.to_rows(),
            vec![vec![14.0, 20.0, 26.0, 32.0], vec![20.0, 29.0, 38.0, 47.0]]
        );
    }

    #[test]
    fn gemm_into_an_aliased_output_uses_a_scratch_buffer() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let alias = a.clone();
        gemm(1.0, &a, &a, 0.0, &alias);
        assert_eq!(a.to_rows(), vec![vec![7.0, 10.0], vec![15.0, 22.0]]);
    }

    #[test]
    fn gemv_into_an_aliased_output_uses_a_scratch_buffer() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let x = a.row(0);
        gemv(1.0, &a, &x, 0.0, &x);
        assert_eq!(a.row(0).to_vec(), vec![5.0, 11.0]);
    }

    #[test]
    fn empty_vectors_have_no_amax_index() {
        assert_eq!(iamax(&Vector::zeros(0)), None);
        assert_eq!(nrm2(&Vector::zeros(0)), 0.0);
    }
}
