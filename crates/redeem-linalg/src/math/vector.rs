use std::cell::Cell;
use std::fmt;
use std::iter::FromIterator;

use log::debug;

use crate::bridge::{self, vector_args};
use crate::buffer::SharedBuffer;
use crate::config;
use crate::elementwise::{self, can_vectorize, map_apply, zip_apply, LaneOp};
use crate::error::{ensure_shape, LinalgError, Result};
use crate::math::Matrix;

/// Strided view over a shared buffer.
///
/// Element `i` lives at `buffer[offset + stride * i]`. `Clone` aliases the
/// buffer; use [`Vector::deep_clone`] for an independent copy. All mutating
/// operations take `&self`: writes through one view are visible through every
/// other view of the same buffer.
#[derive(Clone)]
pub struct Vector {
    buffer: SharedBuffer,
    offset: usize,
    stride: usize,
    len: usize,
}

impl Default for Vector {
    fn default() -> Self {
        Vector::from_parts(SharedBuffer::default(), 0, 1, 0)
    }
}

impl Vector {
    pub(crate) fn from_parts(
        buffer: SharedBuffer,
        offset: usize,
        stride: usize,
        len: usize,
    ) -> Self {
        Vector {
            buffer,
            offset,
            stride,
            len,
        }
    }

    /// Fresh zero-filled vector.
    pub fn zeros(len: usize) -> Self {
        Vector::from_parts(SharedBuffer::zeroed(len), 0, 1, len)
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Vector::from_slice(&values)
    }

    pub fn from_slice(values: &[f32]) -> Self {
        Vector::from_parts(SharedBuffer::from_slice(values), 0, 1, values.len())
    }

    /// Sub-view of `len` elements starting at element `offset` of this view,
    /// stepping `stride` elements of this view at a time.
    ///
    /// The result aliases this view's buffer.
    pub fn window(&self, offset: usize, stride: usize, len: usize) -> Result<Vector> {
        if stride == 0 {
            return Err(LinalgError::InvalidParameter {
                name: "stride",
                value: 0.0,
            });
        }
        let out_of_range = LinalgError::IndexOutOfRange {
            index: offset,
            len: self.len,
        };
        if len == 0 {
            if offset > self.len {
                return Err(out_of_range);
            }
        } else {
            let last = stride
                .checked_mul(len - 1)
                .and_then(|span| span.checked_add(offset))
                .ok_or(out_of_range)?;
            if last >= self.len {
                return Err(LinalgError::IndexOutOfRange {
                    index: last,
                    len: self.len,
                });
            }
        }
        Ok(Vector::from_parts(
            self.buffer.clone(),
            self.offset + self.stride * offset,
            self.stride * stride,
            len,
        ))
    }

    /// Move the view out, leaving `self` empty.
    pub fn take(&mut self) -> Vector {
        std::mem::take(self)
    }

    /// Independent contiguous copy of the addressed elements.
    pub fn deep_clone(&self) -> Vector {
        Vector::from_vec(self.to_vec())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of element 0 in the backing buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Live handles to the backing buffer.
    pub fn use_count(&self) -> usize {
        self.buffer.use_count()
    }

    pub fn shares_buffer_with(&self, other: &Vector) -> bool {
        self.buffer.ptr_eq(&other.buffer)
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == 1
    }

    /// Length rounded up to the SIMD lane width.
    pub fn aligned_len(&self) -> usize {
        elementwise::aligned_len(self.len)
    }

    /// Cell holding element `i`.
    #[inline]
    pub fn at(&self, i: usize) -> &Cell<f32> {
        debug_assert!(i < self.len, "index {} out of range for length {}", i, self.len);
        &self.buffer.cells()[self.offset + self.stride * i]
    }

    #[inline]
    pub fn get(&self, i: usize) -> f32 {
        self.at(i).get()
    }

    #[inline]
    pub fn set(&self, i: usize, value: f32) {
        self.at(i).set(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    pub fn fill(&self, value: f32) {
        self.apply_inplace(|_| value);
    }

    fn cells(&self) -> &[Cell<f32>] {
        self.buffer.cells().get(self.offset..).unwrap_or(&[])
    }

    #[track_caller]
    fn zip_with<F>(&self, other: &Vector, op: &'static str, f: F)
    where
        F: FnMut(f32, f32) -> f32,
    {
        ensure_shape(op, (self.len, 1), (other.len, 1));
        zip_apply(self.len, self.cells(), self.stride, other.cells(), other.stride, f);
    }

    #[track_caller]
    fn zip_lanes(&self, other: &Vector, op: LaneOp, name: &'static str) {
        ensure_shape(name, (self.len, 1), (other.len, 1));
        let x = vector_args(self);
        let y = vector_args(other);
        let same_buffer = self.shares_buffer_with(other);
        if config::current().simd && can_vectorize(&x, &y, same_buffer) {
            debug!("{}: vectorised path, n={}", name, x.n);
            elementwise::lanes_apply(self.cells(), other.cells(), x.n, op);
        } else {
            debug!("{}: scalar path, n={} incx={} incy={}", name, x.n, x.inc, y.inc);
            zip_apply(x.n, self.cells(), x.inc, other.cells(), y.inc, |a, b| op.apply(a, b));
        }
    }

    // -----------------------------------------------------------------------
    // Level 1
    // -----------------------------------------------------------------------

    /// self = alpha * self
    pub fn scal(&self, alpha: f32) {
        bridge::scal(alpha, self);
    }

    /// Copy `other`'s elements into this view.
    #[track_caller]
    pub fn copy_from(&self, other: &Vector) {
        bridge::copy(other, self);
    }

    /// Exchange elements with `other`.
    #[track_caller]
    pub fn swap_with(&self, other: &Vector) {
        bridge::swap(self, other);
    }

    /// self = alpha * x + self
    #[track_caller]
    pub fn axpy(&self, alpha: f32, x: &Vector) {
        bridge::axpy(alpha, x, self);
    }

    #[track_caller]
    pub fn dot(&self, other: &Vector) -> f32 {
        bridge::dot(self, other)
    }

    #[track_caller]
    pub fn inner(&self, other: &Vector) -> f32 {
        self.dot(other)
    }

    /// Euclidean norm.
    pub fn nrm2(&self) -> f32 {
        bridge::nrm2(self)
    }

    /// Sum of absolute values.
    pub fn asum(&self) -> f32 {
        bridge::asum(self)
    }

    /// Index of the first element with the largest magnitude.
    pub fn iamax(&self) -> Option<usize> {
        bridge::iamax(self)
    }

    /// self = alpha * A * x + beta * self
    #[track_caller]
    pub fn gemv(&self, alpha: f32, a: &Matrix, x: &Vector, beta: f32) {
        bridge::gemv(alpha, a, x, beta, self);
    }

    /// Row vector times matrix, `self^T * m`.
    #[track_caller]
    pub fn dot_matrix(&self, m: &Matrix) -> Vector {
        let out = Vector::zeros(m.cols());
        out.gemv(1.0, &m.transpose(), self, 0.0);
        out
    }

    // -----------------------------------------------------------------------
    // Elementwise, in place
    // -----------------------------------------------------------------------

    #[track_caller]
    pub fn add_inplace(&self, other: &Vector) {
        ensure_shape("add", (self.len, 1), (other.len, 1));
        bridge::axpy(1.0, other, self);
    }

    #[track_caller]
    pub fn sub_inplace(&self, other: &Vector) {
        ensure_shape("sub", (self.len, 1), (other.len, 1));
        bridge::axpy(-1.0, other, self);
    }

    #[track_caller]
    pub fn mul_inplace(&self, other: &Vector) {
        self.zip_lanes(other, LaneOp::Mul, "mul");
    }

    #[track_caller]
    pub fn div_inplace(&self, other: &Vector) {
        self.zip_lanes(other, LaneOp::Div, "div");
    }

    #[track_caller]
    pub fn pow_inplace(&self, other: &Vector) {
        self.zip_with(other, "pow", f32::powf);
    }

    pub fn add_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| x + value);
    }

    pub fn sub_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| x - value);
    }

    pub fn mul_scalar_inplace(&self, value: f32) {
        self.scal(value);
    }

    pub fn div_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| x / value);
    }

    pub fn pow_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| x.powf(value));
    }

    /// self[i] = -self[i] + value
    pub fn rsub_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| -x + value);
    }

    /// self[i] = value / self[i]
    pub fn rdiv_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| value / x);
    }

    /// self[i] = value ^ self[i]
    pub fn rpow_scalar_inplace(&self, value: f32) {
        self.apply_inplace(|x| value.powf(x));
    }

    pub fn neg_inplace(&self) {
        self.apply_inplace(|x| -x);
    }

    /// Natural logarithm.
    pub fn log_inplace(&self) {
        self.apply_inplace(f32::ln);
    }

    pub fn apply_inplace<F>(&self, f: F)
    where
        F: FnMut(f32) -> f32,
    {
        map_apply(self.len, self.cells(), self.stride, f);
    }

    // -----------------------------------------------------------------------
    // Elementwise, by value
    // -----------------------------------------------------------------------

    #[track_caller]
    pub fn mul(&self, other: &Vector) -> Vector {
        let out = self.deep_clone();
        out.mul_inplace(other);
        out
    }

    #[track_caller]
    pub fn div(&self, other: &Vector) -> Vector {
        let out = self.deep_clone();
        out.div_inplace(other);
        out
    }

    #[track_caller]
    pub fn pow(&self, other: &Vector) -> Vector {
        let out = self.deep_clone();
        out.pow_inplace(other);
        out
    }

    pub fn add_scalar(&self, value: f32) -> Vector {
        self.apply(|x| x + value)
    }

    pub fn sub_scalar(&self, value: f32) -> Vector {
        self.apply(|x| x - value)
    }

    pub fn mul_scalar(&self, value: f32) -> Vector {
        let out = self.deep_clone();
        out.mul_scalar_inplace(value);
        out
    }

    pub fn div_scalar(&self, value: f32) -> Vector {
        self.apply(|x| x / value)
    }

    pub fn pow_scalar(&self, value: f32) -> Vector {
        self.apply(|x| x.powf(value))
    }

    pub fn log(&self) -> Vector {
        self.apply(f32::ln)
    }

    pub fn apply<F>(&self, f: F) -> Vector
    where
        F: FnMut(f32) -> f32,
    {
        self.iter().map(f).collect()
    }

    // -----------------------------------------------------------------------
    // Reductions
    // -----------------------------------------------------------------------

    pub fn sum(&self) -> f32 {
        self.iter().sum()
    }

    pub fn max_coeff(&self) -> Option<f32> {
        self.max_coeff_index().map(|(value, _)| value)
    }

    pub fn min_coeff(&self) -> Option<f32> {
        self.min_coeff_index().map(|(value, _)| value)
    }

    /// Largest element and its index; the first of equal maxima wins.
    pub fn max_coeff_index(&self) -> Option<(f32, usize)> {
        self.scan(|candidate, best| candidate > best)
    }

    /// Smallest element and its index; the first of equal minima wins.
    pub fn min_coeff_index(&self) -> Option<(f32, usize)> {
        self.scan(|candidate, best| candidate < best)
    }

    fn scan<F>(&self, better: F) -> Option<(f32, usize)>
    where
        F: Fn(f32, f32) -> bool,
    {
        let mut values = self.iter().enumerate();
        let (first_index, first) = values.next()?;
        let mut best = (first, first_index);
        for (i, value) in values {
            if better(value, best.0) {
                best = (value, i);
            }
        }
        Some(best)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(values: Vec<f32>) -> Self {
        Vector::from_vec(values)
    }
}

impl From<&[f32]> for Vector {
    fn from(values: &[f32]) -> Self {
        Vector::from_slice(values)
    }
}

impl From<&Vector> for Vec<f32> {
    fn from(v: &Vector) -> Self {
        v.to_vec()
    }
}

impl FromIterator<f32> for Vector {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        Vector::from_vec(iter.into_iter().collect())
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Vector) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl PartialEq<[f32]> for Vector {
    fn eq(&self, other: &[f32]) -> bool {
        self.len == other.len() && self.iter().zip(other.iter()).all(|(a, &b)| a == b)
    }
}

impl PartialEq<Vec<f32>> for Vector {
    fn eq(&self, other: &Vec<f32>) -> bool {
        *self == other[..]
    }
}

impl<const N: usize> PartialEq<[f32; N]> for Vector {
    fn eq(&self, other: &[f32; N]) -> bool {
        *self == other[..]
    }
}

impl PartialEq<Vector> for [f32] {
    fn eq(&self, other: &Vector) -> bool {
        *other == *self
    }
}

impl PartialEq<Vector> for Vec<f32> {
    fn eq(&self, other: &Vector) -> bool {
        *other == self[..]
    }
}

impl<const N: usize> PartialEq<Vector> for [f32; N] {
    fn eq(&self, other: &Vector) -> bool {
        *other == self[..]
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .field("use_count", &self.use_count())
            .field("values", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_composes_with_the_parent_view() {
        let v: Vector = (0..12).map(|i| i as f32).collect();
        let evens = v.window(0, 2, 6).unwrap();
        assert_eq!(evens, [0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let inner = evens.window(1, 2, 3).unwrap();
        assert_eq!((inner.offset(), inner.stride()), (2, 4));
        assert_eq!(inner, [2.0, 6.0, 10.0]);
        assert_eq!(v.use_count(), 3);
    }

    #[test]
    fn window_rejects_out_of_range_and_zero_stride() {
        let v = Vector::zeros(5);
        assert_eq!(
            v.window(1, 2, 3).unwrap_err(),
            LinalgError::IndexOutOfRange { index: 5, len: 5 }
        );
        assert!(matches!(
            v.window(0, 0, 1),
            Err(LinalgError::InvalidParameter { name: "stride", .. })
        ));
        assert!(v.window(5, 1, 0).unwrap().is_empty());
        assert!(v.window(6, 1, 0).is_err());
        assert!(v.window(1, usize::MAX, 3).is_err());
    }

    #[test]
    fn writes_through_a_window_are_visible_in_the_parent() {
        let v = Vector::zeros(4);
        let tail = v.window(2, 1, 2).unwrap();
        tail.fill(7.0);
        assert_eq!(v, [0.0, 0.0, 7.0, 7.0]);
    }

    #[test]
    fn take_leaves_an_empty_view() {
        let mut v = Vector::from_vec(vec![1.0, 2.0]);
        let moved = v.take();
        assert!(v.is_empty());
        assert_eq!(v.use_count(), 0);
        assert_eq!(moved, [1.0, 2.0]);
    }

    #[test]
    fn coefficient_scans_keep_the_first_occurrence() {
        let v = Vector::from_vec(vec![1.0, 5.0, -2.0, 5.0, -2.0]);
        assert_eq!(v.max_coeff_index(), Some((5.0, 1)));
        assert_eq!(v.min_coeff_index(), Some((-2.0, 2)));
        assert_eq!(Vector::zeros(0).max_coeff(), None);
    }

    #[test]
    fn display_is_space_separated() {
        let v = Vector::from_vec(vec![1.0, 2.5, -3.0]);
        assert_eq!(v.to_string(), "[1 2.5 -3]");
        assert_eq!(Vector::zeros(0).to_string(), "[]");
    }

    #[test]
    #[should_panic(expected = "shape mismatch in mul")]
    fn mul_inplace_rejects_length_mismatch() {
        Vector::zeros(3).mul_inplace(&Vector::zeros(4));
    }
}
