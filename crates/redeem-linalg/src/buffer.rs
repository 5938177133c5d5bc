//! Backing storage shared between views.
//!
//! A `Buffer` owns a fixed block of `f32` cells whose capacity is rounded up
//! to the SIMD lane width and zero-filled. A `SharedBuffer` is a
//! single-threaded reference-counted handle to it: cloning a handle aliases
//! the storage, and the storage is freed when the last handle is dropped.
//!
//! The counter is not atomic. `Rc` and `Cell` make every handle (and every
//! view built on one) `!Send` and `!Sync`, so a view graph cannot leave the
//! thread that created it; copy the values out with `to_vec` to hand data
//! across threads.
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::elementwise::checked_aligned_len;
use crate::error::{fail, LinalgError};

struct Buffer {
    data: Box<[Cell<f32>]>,
    len: usize,
}

impl Buffer {
    fn zeroed(len: usize) -> Self {
        let capacity = checked_aligned_len(len)
            .unwrap_or_else(|| fail(LinalgError::ResourceExhaustion { requested: len }));
        let mut data: Vec<Cell<f32>> = Vec::new();
        if data.try_reserve_exact(capacity).is_err() {
            fail(LinalgError::ResourceExhaustion {
                requested: capacity,
            });
        }
        data.resize_with(capacity, || Cell::new(0.0));
        log::trace!("allocated buffer: len={} capacity={}", len, capacity);
        Buffer {
            data: data.into_boxed_slice(),
            len,
        }
    }
}

/// Reference-counted handle to a backing buffer.
///
/// `Clone` is the aliasing copy (count + 1). `take` moves the storage out and
/// leaves an empty handle behind, and `Default` is that empty handle.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Option<Rc<Buffer>>,
}

impl SharedBuffer {
    /// Allocate `len` zeroed elements (plus zeroed lane padding).
    pub fn zeroed(len: usize) -> Self {
        Self {
            inner: Some(Rc::new(Buffer::zeroed(len))),
        }
    }

    /// Allocate a buffer holding a copy of `values`.
    pub fn from_slice(values: &[f32]) -> Self {
        let buffer = Buffer::zeroed(values.len());
        for (cell, &value) in buffer.data.iter().zip(values) {
            cell.set(value);
        }
        Self {
            inner: Some(Rc::new(buffer)),
        }
    }

    /// Steal the storage, leaving `self` empty with a use count of zero.
    pub fn take(&mut self) -> SharedBuffer {
        std::mem::take(self)
    }

    /// Number of live handles to the storage, 0 for an empty handle.
    pub fn use_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Rc::strong_count)
    }

    /// Logical number of elements.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |b| b.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated elements, including the lane padding.
    pub fn capacity(&self) -> usize {
        self.inner.as_ref().map_or(0, |b| b.data.len())
    }

    /// True when both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn cells(&self) -> &[Cell<f32>] {
        match &self.inner {
            Some(buffer) => &buffer.data,
            None => &[],
        }
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("use_count", &self.use_count())
            .finish()
    }
}
