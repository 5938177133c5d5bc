//! Random initialisers. The generator is always passed in by the caller.
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use statrs::distribution::Normal;

use crate::error::{LinalgError, Result};
use crate::math::{Matrix, Vector};

fn element_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols).ok_or(LinalgError::ResourceExhaustion {
        requested: usize::MAX,
    })
}

fn uniform_values<R: Rng + ?Sized>(
    len: usize,
    low: f32,
    high: f32,
    rng: &mut R,
) -> Result<Vec<f32>> {
    if !low.is_finite() {
        return Err(LinalgError::InvalidParameter { name: "low", value: low });
    }
    if !high.is_finite() || low >= high || !(high - low).is_finite() {
        return Err(LinalgError::InvalidParameter { name: "high", value: high });
    }
    let dist = Uniform::new(low, high);
    Ok(dist.sample_iter(rng).take(len).collect())
}

fn normal_values<R: Rng + ?Sized>(
    len: usize,
    mean: f32,
    std_dev: f32,
    rng: &mut R,
) -> Result<Vec<f32>> {
    if !mean.is_finite() {
        return Err(LinalgError::InvalidParameter { name: "mean", value: mean });
    }
    let invalid_std = LinalgError::InvalidParameter {
        name: "std_dev",
        value: std_dev,
    };
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return Err(invalid_std);
    }
    let dist = Normal::new(mean as f64, std_dev as f64).map_err(|_| invalid_std)?;
    Ok((0..len).map(|_| dist.sample(rng) as f32).collect())
}

impl Vector {
    /// `len` samples from `U[low, high)`.
    pub fn uniform<R: Rng + ?Sized>(
        len: usize,
        low: f32,
        high: f32,
        rng: &mut R,
    ) -> Result<Vector> {
        uniform_values(len, low, high, rng).map(Vector::from_vec)
    }

    /// `len` samples from `N(mean, std_dev^2)`.
    pub fn normal<R: Rng + ?Sized>(
        len: usize,
        mean: f32,
        std_dev: f32,
        rng: &mut R,
    ) -> Result<Vector> {
        normal_values(len, mean, std_dev, rng).map(Vector::from_vec)
    }
}

impl Matrix {
    pub fn uniform<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        low: f32,
        high: f32,
        rng: &mut R,
    ) -> Result<Matrix> {
        let values = uniform_values(element_count(rows, cols)?, low, high, rng)?;
        Matrix::from_shape_vec((rows, cols), values)
    }

    pub fn normal<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mean: f32,
        std_dev: f32,
        rng: &mut R,
    ) -> Result<Matrix> {
        let values = normal_values(element_count(rows, cols)?, mean, std_dev, rng)?;
        Matrix::from_shape_vec((rows, cols), values)
    }
}
