//! Integration tests for the scalar and vectorised elementwise paths.

use redeem_linalg::config::{self, KernelConfig};
use redeem_linalg::elementwise::{aligned_len, LANES};
use redeem_linalg::{Matrix, Vector};

fn ramp(len: usize, scale: f32, shift: f32) -> Vector {
    (0..len).map(|i| i as f32 * scale + shift).collect()
}

fn scalar_only() -> KernelConfig {
    KernelConfig {
        simd: false,
        ..KernelConfig::default()
    }
}

/// Run `op` with the vectorised path allowed and forbidden, returning both results.
fn both_paths(len: usize, op: impl Fn(&Vector, &Vector)) -> (Vec<f32>, Vec<f32>) {
    let run = || {
        let x = ramp(len, 0.37, 1.0);
        let y = ramp(len, -0.11, 3.5);
        op(&x, &y);
        x.to_vec()
    };
    let fast = run();
    let slow = config::with(scalar_only(), run);
    (fast, slow)
}

// ---------------------------------------------------------------------------
// Path agreement
// ---------------------------------------------------------------------------

#[test]
fn multiply_agrees_for_aligned_and_misaligned_lengths() {
    for len in [0usize, 1, 7, 8, 9, 16, 31, 64] {
        let (fast, slow) = both_paths(len, |x, y| x.mul_inplace(y));
        assert_eq!(fast, slow, "len={}", len);
    }
}

#[test]
fn divide_agrees_for_aligned_and_misaligned_lengths() {
    for len in [1usize, 5, 8, 24, 33] {
        let (fast, slow) = both_paths(len, |x, y| x.div_inplace(y));
        assert_eq!(fast, slow, "len={}", len);
    }
}

#[test]
fn aligned_and_strided_operands_agree() {
    let contiguous = ramp(16, 0.5, 1.0);
    let other = ramp(16, 0.25, 2.0);
    let expected: Vec<f32> = contiguous
        .iter()
        .zip(other.iter())
        .map(|(a, b)| a * b)
        .collect();

    let spread = Vector::zeros(32);
    let strided = spread.window(0, 2, 16).unwrap();
    strided.copy_from(&contiguous);
    strided.mul_inplace(&other);
    assert_eq!(strided, expected);

    contiguous.mul_inplace(&other);
    assert_eq!(contiguous, expected);
}

#[test]
fn aligned_len_matches_lane_width() {
    assert_eq!(LANES, 8);
    assert_eq!(aligned_len(13), 16);
    assert_eq!(ramp(13, 1.0, 0.0).aligned_len(), 16);
}

// ---------------------------------------------------------------------------
// Aliasing on the fast path
// ---------------------------------------------------------------------------

#[test]
fn squaring_in_place_through_the_same_view() {
    let v = ramp(16, 1.0, 0.0);
    let alias = v.clone();
    v.mul_inplace(&alias);
    let expected: Vec<f32> = (0..16).map(|i| (i * i) as f32).collect();
    assert_eq!(v, expected);
}

#[test]
fn disjoint_halves_of_one_buffer() {
    let v = ramp(16, 1.0, 1.0);
    let low = v.window(0, 1, 8).unwrap();
    let high = v.window(8, 1, 8).unwrap();
    low.div_inplace(&high);
    let expected: Vec<f32> = (1..=8).map(|i| i as f32 / (i + 8) as f32).collect();
    assert_eq!(low, expected);
    assert_eq!(high.get(0), 9.0);
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

#[test]
fn matrix_multiply_matches_per_element_product() {
    let a = Matrix::from_shape_vec((4, 4), (0..16).map(|i| i as f32 + 1.0).collect()).unwrap();
    let b = a.transpose();
    let product = a.mul(&b);
    for i in 0..4 {
        for j in 0..4 {
            assert_eq!(product.get(i, j), a.get(i, j) * a.get(j, i));
        }
    }
}

#[test]
#[should_panic(expected = "shape mismatch in div")]
fn matrix_divide_rejects_shape_mismatch() {
    Matrix::zeros(2, 3).div_inplace(&Matrix::zeros(3, 3));
}
