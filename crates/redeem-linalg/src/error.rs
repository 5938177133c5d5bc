use std::error::Error;
use std::fmt;

/// Precondition violations raised by the view engine and the kernel bridge.
///
/// Arithmetic entry points treat these as fatal and panic with the
/// `Display` text; constructors that usually receive caller data return them
/// as `Err` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LinalgError {
    /// Operand lengths or shapes disagree. Vectors report `(len, 1)`.
    ShapeMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    IndexOutOfRange { index: usize, len: usize },
    /// The vectorised path was handed a length that is not a multiple of the lane width.
    UnalignedVectorizedAccess { len: usize, lanes: usize },
    /// A matrix can only alias a vector whose stride is 1.
    NonContiguous { stride: usize },
    /// Allocation failed or the requested element count overflowed.
    ResourceExhaustion { requested: usize },
    InvalidParameter { name: &'static str, value: f32 },
}

impl fmt::Display for LinalgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinalgError::ShapeMismatch { op, lhs, rhs } => write!(
                f,
                "shape mismatch in {}: ({}, {}) vs ({}, {})",
                op, lhs.0, lhs.1, rhs.0, rhs.1
            ),
            LinalgError::IndexOutOfRange { index, len } => {
                write!(f, "index out of range: {} >= {}", index, len)
            }
            LinalgError::UnalignedVectorizedAccess { len, lanes } => write!(
                f,
                "unaligned vectorized access: length {} is not a multiple of {} lanes",
                len, lanes
            ),
            LinalgError::NonContiguous { stride } => {
                write!(f, "expected contiguous storage, found stride {}", stride)
            }
            LinalgError::ResourceExhaustion { requested } => {
                write!(f, "failed to allocate {} elements", requested)
            }
            LinalgError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {}: {}", name, value)
            }
        }
    }
}

impl Error for LinalgError {}

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Abort the current operation with `err`.
#[cold]
#[track_caller]
pub(crate) fn fail(err: LinalgError) -> ! {
    panic!("{}", err)
}

/// Panic with `ShapeMismatch` unless both operands have the same shape.
#[inline]
#[track_caller]
pub(crate) fn ensure_shape(op: &'static str, lhs: (usize, usize), rhs: (usize, usize)) {
    if lhs != rhs {
        fail(LinalgError::ShapeMismatch { op, lhs, rhs });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_operation() {
        let err = LinalgError::ShapeMismatch {
            op: "gemm",
            lhs: (2, 3),
            rhs: (4, 5),
        };
        assert_eq!(err.to_string(), "shape mismatch in gemm: (2, 3) vs (4, 5)");
    }

    #[test]
    fn float_payloads_compare_by_value() {
        let err = LinalgError::InvalidParameter {
            name: "std_dev",
            value: -1.0,
        };
        assert_eq!(err.clone(), err);
        assert_ne!(
            err,
            LinalgError::InvalidParameter {
                name: "std_dev",
                value: f32::NAN
            }
        );
        assert_eq!(err.to_string(), "invalid parameter std_dev: -1");
    }

    #[test]
    #[should_panic(expected = "shape mismatch in axpy")]
    fn ensure_shape_panics_on_mismatch() {
        ensure_shape("axpy", (3, 1), (4, 1));
    }

    #[test]
    fn ensure_shape_accepts_equal_shapes() {
        ensure_shape("axpy", (3, 1), (3, 1));
    }
}
