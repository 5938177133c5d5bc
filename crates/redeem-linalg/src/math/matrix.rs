use std::cell::Cell;
use std::fmt;

use crate::bridge;
use crate::error::{ensure_shape, fail, LinalgError, Result};
use crate::math::Vector;

/// Two-dimensional view: contiguous row-major storage plus a transpose flag.
///
/// A transposed matrix shares the storage of the matrix it was taken from;
/// element `(i, j)` lives at `data[i + rows * j]` instead of
/// `data[i * cols + j]`. Like [`Vector`], `Clone` aliases and
/// [`Matrix::deep_clone`] copies.
#[derive(Clone, Default)]
pub struct Matrix {
    data: Vector,
    rows: usize,
    cols: usize,
    transposed: bool,
}

fn element_count(rows: usize, cols: usize) -> usize {
    rows.checked_mul(cols).unwrap_or_else(|| {
        fail(LinalgError::ResourceExhaustion {
            requested: usize::MAX,
        })
    })
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: Vector::zeros(element_count(rows, cols)),
            rows,
            cols,
            transposed: false,
        }
    }

    pub fn from_shape_vec(shape: (usize, usize), values: Vec<f32>) -> Result<Self> {
        let (rows, cols) = shape;
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(LinalgError::ShapeMismatch {
                op: "from_shape_vec",
                lhs: shape,
                rhs: (values.len(), 1),
            });
        }
        Ok(Matrix {
            data: Vector::from_vec(values),
            rows,
            cols,
            transposed: false,
        })
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(LinalgError::ShapeMismatch {
                    op: "from_rows",
                    lhs: (1, row.len()),
                    rhs: (1, cols),
                });
            }
            values.extend_from_slice(row);
        }
        Matrix::from_shape_vec((rows.len(), cols), values)
    }

    /// View a contiguous vector as a `rows x cols` matrix without copying.
    pub fn from_vector(v: &Vector, rows: usize, cols: usize) -> Result<Self> {
        if !v.is_contiguous() {
            return Err(LinalgError::NonContiguous { stride: v.stride() });
        }
        if rows.checked_mul(cols) != Some(v.len()) {
            return Err(LinalgError::ShapeMismatch {
                op: "from_vector",
                lhs: (rows, cols),
                rhs: (v.len(), 1),
            });
        }
        Ok(Matrix {
            data: v.clone(),
            rows,
            cols,
            transposed: false,
        })
    }

    /// Move the view out, leaving `self` empty.
    pub fn take(&mut self) -> Matrix {
        std::mem::take(self)
    }

    /// Independent, non-transposed copy in logical row-major order.
    pub fn deep_clone(&self) -> Matrix {
        Matrix {
            data: Vector::from_vec(self.to_vec()),
            rows: self.rows,
            cols: self.cols,
            transposed: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Row pitch of the stored layout.
    pub fn ldim(&self) -> usize {
        if self.transposed {
            self.rows
        } else {
            self.cols
        }
    }

    /// Flat view of the stored elements.
    pub fn as_vector(&self) -> &Vector {
        &self.data
    }

    pub fn use_count(&self) -> usize {
        self.data.use_count()
    }

    pub fn shares_buffer_with(&self, other: &Matrix) -> bool {
        self.data.shares_buffer_with(&other.data)
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        if self.transposed {
            i + self.rows * j
        } else {
            i * self.cols + j
        }
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> &Cell<f32> {
        self.data.at(self.index(i, j))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.at(i, j).get()
    }

    #[inline]
    pub fn set(&self, i: usize, j: usize, value: f32) {
        self.at(i, j).set(value)
    }

    /// Values in logical row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.rows).flat_map(move |i| (0..self.cols).map(move |j| self.get(i, j)))
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// O(1) transpose sharing this matrix's storage.
    pub fn transpose(&self) -> Matrix {
        Matrix {
            data: self.data.clone(),
            rows: self.cols,
            cols: self.rows,
            transposed: !self.transposed,
        }
    }

    /// Reinterpret the stored elements as `rows x cols`, row-major.
    ///
    /// The result aliases this matrix and is never transposed. For a
    /// transposed matrix the stored order is reinterpreted, not the logical one.
    pub fn reshape(&self, rows: usize, cols: usize) -> Result<Matrix> {
        if rows.checked_mul(cols) != Some(self.size()) {
            return Err(LinalgError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape(),
                rhs: (rows, cols),
            });
        }
        Ok(Matrix {
            data: self.data.clone(),
            rows,
            cols,
            transposed: false,
        })
    }

    fn view(&self, offset: usize, stride: usize, len: usize) -> Vector {
        Vector::from_parts(
            self.data.buffer().clone(),
            self.data.offset() + offset,
            stride,
            len,
        )
    }

    /// Row `i` as an aliasing view.
    #[track_caller]
    pub fn row(&self, i: usize) -> Vector {
        if i >= self.rows {
            fail(LinalgError::IndexOutOfRange {
                index: i,
                len: self.rows,
            });
        }
        if self.transposed {
            self.view(i, self.rows, self.cols)
        } else {
            self.view(i * self.cols, 1, self.cols)
        }
    }

    /// Column `j` as an aliasing view.
    #[track_caller]
    pub fn col(&self, j: usize) -> Vector {
        if j >= self.cols {
            fail(LinalgError::IndexOutOfRange {
                index: j,
                len: self.cols,
            });
        }
        if self.transposed {
            self.view(j * self.rows, 1, self.rows)
        } else {
            self.view(j, self.cols, self.rows)
        }
    }

    #[track_caller]
    pub fn set_row(&self, i: usize, values: &Vector) {
        self.row(i).copy_from(values);
    }

    #[track_caller]
    pub fn set_col(&self, j: usize, values: &Vector) {
        self.col(j).copy_from(values);
    }

    // -----------------------------------------------------------------------
    // Level 2 / 3
    // -----------------------------------------------------------------------

    /// self = alpha * x * y^T + self
    #[track_caller]
    pub fn ger(&self, alpha: f32, x: &Vector, y: &Vector) {
        bridge::ger(alpha, x, y, self);
    }

    /// self = alpha * a * b + beta * self
    #[track_caller]
    pub fn gemm(&self, alpha: f32, a: &Matrix, b: &Matrix, beta: f32) {
        bridge::gemm(alpha, a, b, beta, self);
    }

    /// Matrix product.
    #[track_caller]
    pub fn dot(&self, other: &Matrix) -> Matrix {
        let out = Matrix::zeros(self.rows, other.cols);
        out.gemm(1.0, self, other, 0.0);
        out
    }

    /// Matrix-vector product.
    #[track_caller]
    pub fn dot_vector(&self, v: &Vector) -> Vector {
        let out = Vector::zeros(self.rows);
        out.gemv(1.0, self, v, 0.0);
        out
    }

    /// self = a * b
    #[track_caller]
    pub fn dot_into(&self, a: &Matrix, b: &Matrix) {
        self.gemm(1.0, a, b, 0.0);
    }

    /// x * y^T
    pub fn outer(x: &Vector, y: &Vector) -> Matrix {
        let out = Matrix::zeros(x.len(), y.len());
        out.ger(1.0, x, y);
        out
    }

    // -----------------------------------------------------------------------
    // Elementwise
    // -----------------------------------------------------------------------

    /// Run `f` over matching storage of `self` and `other`: the whole flat
    /// storage when both share a layout, row by row otherwise.
    #[track_caller]
    fn zip_rows<F>(&self, other: &Matrix, op: &'static str, f: F)
    where
        F: Fn(&Vector, &Vector),
    {
        ensure_shape(op, self.shape(), other.shape());
        if self.transposed == other.transposed {
            f(&self.data, &other.data);
        } else {
            for i in 0..self.rows {
                f(&self.row(i), &other.row(i));
            }
        }
    }

    /// Copy `other`'s logical elements into this matrix.
    #[track_caller]
    pub fn copy_from(&self, other: &Matrix) {
        self.zip_rows(other, "copy", |x, y| x.copy_from(y));
    }

    #[track_caller]
    pub fn add_inplace(&self, other: &Matrix) {
        self.zip_rows(other, "add", |x, y| x.add_inplace(y));
    }

    #[track_caller]
    pub fn sub_inplace(&self, other: &Matrix) {
        self.zip_rows(other, "sub", |x, y| x.sub_inplace(y));
    }

    #[track_caller]
    pub fn mul_inplace(&self, other: &Matrix) {
        self.zip_rows(other, "mul", |x, y| x.mul_inplace(y));
    }

    #[track_caller]
    pub fn div_inplace(&self, other: &Matrix) {
        self.zip_rows(other, "div", |x, y| x.div_inplace(y));
    }

    #[track_caller]
    pub fn pow_inplace(&self, other: &Matrix) {
        self.zip_rows(other, "pow", |x, y| x.pow_inplace(y));
    }

    pub fn add_scalar_inplace(&self, value: f32) {
        self.data.add_scalar_inplace(value);
    }

    pub fn sub_scalar_inplace(&self, value: f32) {
        self.data.sub_scalar_inplace(value);
    }

    pub fn mul_scalar_inplace(&self, value: f32) {
        self.data.mul_scalar_inplace(value);
    }

    pub fn div_scalar_inplace(&self, value: f32) {
        self.data.div_scalar_inplace(value);
    }

    pub fn pow_scalar_inplace(&self, value: f32) {
        self.data.pow_scalar_inplace(value);
    }

    pub fn rsub_scalar_inplace(&self, value: f32) {
        self.data.rsub_scalar_inplace(value);
    }

    pub fn rdiv_scalar_inplace(&self, value: f32) {
        self.data.rdiv_scalar_inplace(value);
    }

    pub fn rpow_scalar_inplace(&self, value: f32) {
        self.data.rpow_scalar_inplace(value);
    }

    pub fn neg_inplace(&self) {
        self.data.neg_inplace();
    }

    pub fn log_inplace(&self) {
        self.data.log_inplace();
    }

    pub fn apply_inplace<F>(&self, f: F)
    where
        F: FnMut(f32) -> f32,
    {
        self.data.apply_inplace(f);
    }

    fn map_clone<F>(&self, f: F) -> Matrix
    where
        F: FnOnce(&Matrix),
    {
        let out = self.deep_clone();
        f(&out);
        out
    }

    #[track_caller]
    pub fn mul(&self, other: &Matrix) -> Matrix {
        self.map_clone(|out| out.mul_inplace(other))
    }

    #[track_caller]
    pub fn div(&self, other: &Matrix) -> Matrix {
        self.map_clone(|out| out.div_inplace(other))
    }

    #[track_caller]
    pub fn pow(&self, other: &Matrix) -> Matrix {
        self.map_clone(|out| out.pow_inplace(other))
    }

    pub fn add_scalar(&self, value: f32) -> Matrix {
        self.map_clone(|out| out.add_scalar_inplace(value))
    }

    pub fn sub_scalar(&self, value: f32) -> Matrix {
        self.map_clone(|out| out.sub_scalar_inplace(value))
    }

    pub fn mul_scalar(&self, value: f32) -> Matrix {
        self.map_clone(|out| out.mul_scalar_inplace(value))
    }

    pub fn div_scalar(&self, value: f32) -> Matrix {
        self.map_clone(|out| out.div_scalar_inplace(value))
    }

    pub fn pow_scalar(&self, value: f32) -> Matrix {
        self.map_clone(|out| out.pow_scalar_inplace(value))
    }

    pub fn log(&self) -> Matrix {
        self.map_clone(Matrix::log_inplace)
    }

    pub fn apply<F>(&self, f: F) -> Matrix
    where
        F: FnMut(f32) -> f32,
    {
        self.map_clone(|out| out.apply_inplace(f))
    }

    // -----------------------------------------------------------------------
    // Reductions
    // -----------------------------------------------------------------------

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    pub fn max_coeff(&self) -> Option<f32> {
        self.max_coeff_index().map(|(value, _)| value)
    }

    pub fn min_coeff(&self) -> Option<f32> {
        self.min_coeff_index().map(|(value, _)| value)
    }

    /// Largest element and its `(row, col)`, scanning row by row; the first of
    /// equal maxima wins.
    pub fn max_coeff_index(&self) -> Option<(f32, (usize, usize))> {
        self.scan(|candidate, best| candidate > best)
    }

    /// Smallest element and its `(row, col)`, scanning row by row.
    pub fn min_coeff_index(&self) -> Option<(f32, (usize, usize))> {
        self.scan(|candidate, best| candidate < best)
    }

    /// Like [`Matrix::max_coeff_index`], but seeded with `(0, 0)` and
    /// compared only against elements with `i >= 1` and `j >= 1`, so
    /// the rest of row 0 and column 0 is never reported.
    pub fn max_coeff_index_interior(&self) -> Option<(f32, (usize, usize))> {
        self.scan_from(1, |candidate, best| candidate > best)
    }

    /// Minimum counterpart of [`Matrix::max_coeff_index_interior`].
    pub fn min_coeff_index_interior(&self) -> Option<(f32, (usize, usize))> {
        self.scan_from(1, |candidate, best| candidate < best)
    }

    fn scan<F>(&self, better: F) -> Option<(f32, (usize, usize))>
    where
        F: Fn(f32, f32) -> bool,
    {
        self.scan_from(0, better)
    }

    fn scan_from<F>(&self, start: usize, better: F) -> Option<(f32, (usize, usize))>
    where
        F: Fn(f32, f32) -> bool,
    {
        if self.is_empty() {
            return None;
        }
        let mut best = (self.get(0, 0), (0, 0));
        for i in start..self.rows {
            for j in start..self.cols {
                let value = self.get(i, j);
                if better(value, best.0) {
                    best = (value, (i, j));
                }
            }
        }
        Some(best)
    }
}

impl TryFrom<&Vector> for Matrix {
    type Error = LinalgError;

    /// Column-vector view aliasing `v`; strided vectors are rejected.
    fn try_from(v: &Vector) -> Result<Self> {
        Matrix::from_vector(v, v.len(), 1)
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Matrix) -> bool {
        self.shape() == other.shape() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

fn rows_eq<R: AsRef<[f32]>>(m: &Matrix, rows: &[R]) -> bool {
    m.rows == rows.len()
        && rows.iter().enumerate().all(|(i, row)| {
            let row = row.as_ref();
            row.len() == m.cols && row.iter().enumerate().all(|(j, &v)| m.get(i, j) == v)
        })
}

impl PartialEq<Vec<Vec<f32>>> for Matrix {
    fn eq(&self, other: &Vec<Vec<f32>>) -> bool {
        rows_eq(self, other)
    }
}

impl<const R: usize, const C: usize> PartialEq<[[f32; C]; R]> for Matrix {
    fn eq(&self, other: &[[f32; C]; R]) -> bool {
        rows_eq(self, other)
    }
}

/// Flat comparison in logical row-major order.
impl PartialEq<Vec<f32>> for Matrix {
    fn eq(&self, other: &Vec<f32>) -> bool {
        self.size() == other.len() && self.iter().zip(other.iter()).all(|(a, &b)| a == b)
    }
}

impl PartialEq<Matrix> for Vec<Vec<f32>> {
    fn eq(&self, other: &Matrix) -> bool {
        rows_eq(other, self)
    }
}

impl<const R: usize, const C: usize> PartialEq<Matrix> for [[f32; C]; R] {
    fn eq(&self, other: &Matrix) -> bool {
        rows_eq(other, self)
    }
}

impl PartialEq<Matrix> for Vec<f32> {
    fn eq(&self, other: &Matrix) -> bool {
        *other == *self
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, "\n ")?;
            }
            write!(f, "{}", self.row(i))?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("transposed", &self.transposed)
            .field("offset", &self.data.offset())
            .field("use_count", &self.use_count())
            .field("values", &self.to_rows())
            .finish()
    }
}
