//! Forward pass of a two-layer perceptron built from shared views.
//!
//! Run with `REDEEM_LINALG_LOG=redeem_linalg=trace` to see every kernel call.
use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use redeem_linalg::config::KernelConfig;
use redeem_linalg::{config, logging, Matrix, Vector};

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// `activation(W * x + b)`
fn dense(weights: &Matrix, bias: &Vector, x: &Vector, activation: fn(f32) -> f32) -> Vector {
    let out = bias.deep_clone();
    out.gemv(1.0, weights, x, 1.0);
    out.apply_inplace(activation);
    out
}

fn main() -> Result<()> {
    logging::init();
    config::set(KernelConfig::from_env().context("reading kernel configuration")?);

    let mut rng = StdRng::seed_from_u64(2024);
    let (inputs, hidden, outputs) = (16, 32, 4);

    let w1 = Matrix::normal(hidden, inputs, 0.0, (2.0 / inputs as f32).sqrt(), &mut rng)?;
    let b1 = Vector::zeros(hidden);
    let w2 = Matrix::uniform(outputs, hidden, -0.1, 0.1, &mut rng)?;
    let b2 = Vector::zeros(outputs);

    // A batch stored column-major: each column of `batch` is one sample.
    let batch = Matrix::uniform(inputs, 8, 0.0, 1.0, &mut rng)?;
    for j in 0..batch.cols() {
        let x = batch.col(j);
        let h = dense(&w1, &b1, &x, relu);
        let y = dense(&w2, &b2, &h, sigmoid);
        let (score, class) = y.max_coeff_index().context("empty output layer")?;
        info!("sample {}: class {} (score {:.3})", j, class, score);
        println!("{} -> {}", j, y);
    }

    // The same layer applied to the whole batch at once.
    let activations = w1.dot(&batch);
    for j in 0..activations.cols() {
        activations.col(j).add_inplace(&b1);
    }
    activations.apply_inplace(relu);
    let scores = w2.dot(&activations);
    scores.apply_inplace(sigmoid);
    println!("batch scores (outputs x samples):\n{}", scores);
    Ok(())
}
