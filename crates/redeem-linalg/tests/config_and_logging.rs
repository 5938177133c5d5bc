//! Integration tests for kernel configuration and logger setup.

use std::io::Write;

use redeem_linalg::config::{self, Backend, KernelConfig};
use redeem_linalg::{kernels, logging, Vector};

// ---------------------------------------------------------------------------
// KernelConfig
// ---------------------------------------------------------------------------

#[test]
fn default_config() {
    let config = KernelConfig::default();
    assert_eq!(config.backend, Backend::Reference);
    assert!(config.simd);
}

#[test]
fn config_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"backend": "reference", "simd": false}}"#).unwrap();
    let config = KernelConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.backend, Backend::Reference);
    assert!(!config.simd);
}

#[test]
fn config_from_json_file_fills_missing_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"simd": false}}"#).unwrap();
    let config = KernelConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.backend, Backend::Reference);
}

#[test]
fn config_from_json_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = KernelConfig::from_json_file(&missing).unwrap_err();
    assert!(err.to_string().contains("Failed to open config file"));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"backend": "cuda"}"#).unwrap();
    let err = KernelConfig::from_json_file(&bad).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn config_serialises_backend_in_lowercase() {
    let json = serde_json::to_string(&KernelConfig::default()).unwrap();
    assert_eq!(json, r#"{"backend":"reference","simd":true}"#);
}

#[test]
fn backend_parsing() {
    assert_eq!("REFERENCE".parse::<Backend>(), Ok(Backend::Reference));
    let err = "mkl".parse::<Backend>().unwrap_err();
    assert!(err.contains("Unknown backend"));
}

// ---------------------------------------------------------------------------
// Thread-local activation
// ---------------------------------------------------------------------------

#[test]
fn set_returns_the_previous_config() {
    let scalar = KernelConfig {
        simd: false,
        ..KernelConfig::default()
    };
    let previous = config::set(scalar);
    assert_eq!(previous, KernelConfig::default());
    assert_eq!(config::current(), scalar);
    config::set(previous);
    assert_eq!(config::current(), KernelConfig::default());
}

#[test]
fn configuration_is_per_thread() {
    let scalar = KernelConfig {
        simd: false,
        ..KernelConfig::default()
    };
    config::with(scalar, || {
        let other = std::thread::spawn(config::current).join().unwrap();
        assert_eq!(other, KernelConfig::default());
        assert_eq!(config::current(), scalar);
    });
}

#[test]
fn provider_follows_the_active_backend() {
    assert_eq!(kernels::active().name(), "reference");
    assert_eq!(kernels::provider(Backend::Reference).name(), "reference");
    let v = Vector::from_vec(vec![1.0, 2.0]);
    assert_eq!(v.dot(&v), 5.0);
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[test]
fn logging_init_is_idempotent() {
    logging::init_with_default("redeem_linalg=trace");
    assert!(!logging::init());
    // Exercise the trace/debug call sites with a logger installed.
    let v = Vector::from_vec(vec![1.0; 8]);
    v.mul_inplace(&v.clone());
    assert_eq!(v.nrm2(), 8f32.sqrt());
}
