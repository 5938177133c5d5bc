use std::cell::Cell;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Environment variable naming the kernel provider.
pub const BACKEND_ENV: &str = "REDEEM_LINALG_BACKEND";
/// Environment variable toggling the vectorised elementwise path.
pub const SIMD_ENV: &str = "REDEEM_LINALG_SIMD";

/// Kernel provider used for Level-1/2/3 operations.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Portable Rust implementation, always available.
    #[default]
    Reference,
    /// System OpenBLAS library.
    #[cfg(feature = "openblas")]
    OpenBlas,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reference" => Ok(Backend::Reference),
            #[cfg(feature = "openblas")]
            "openblas" => Ok(Backend::OpenBlas),
            #[cfg(not(feature = "openblas"))]
            "openblas" => Err("backend openblas requires the `openblas` feature".to_string()),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Settings for kernel dispatch.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct KernelConfig {
    pub backend: Backend,
    /// Allow the vectorised multiply/divide path.
    pub simd: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            backend: Backend::Reference,
            simd: true,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by `REDEEM_LINALG_BACKEND` and `REDEEM_LINALG_SIMD`.
    pub fn from_env() -> Result<Self> {
        let mut config = KernelConfig::default();
        if let Ok(value) = env::var(BACKEND_ENV) {
            config.backend = value
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {}", BACKEND_ENV))?;
        }
        if let Ok(value) = env::var(SIMD_ENV) {
            config.simd = parse_switch(&value)
                .with_context(|| format!("invalid {}: {}", SIMD_ENV, value))?;
        }
        Ok(config)
    }

    /// Load a JSON configuration; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean switch, got {:?}", other)),
    }
}

thread_local! {
    static ACTIVE: Cell<KernelConfig> = Cell::new(KernelConfig::default());
}

/// Configuration in effect on the current thread.
pub fn current() -> KernelConfig {
    ACTIVE.with(Cell::get)
}

/// Replace the current thread's configuration, returning the previous one.
pub fn set(config: KernelConfig) -> KernelConfig {
    let previous = ACTIVE.with(|active| active.replace(config));
    if previous != config {
        info!(
            "kernel configuration: backend={:?} simd={}",
            config.backend, config.simd
        );
        if config.simd && !cfg!(feature = "simd") {
            warn!("simd enabled without the `simd` feature; using portable lane loops");
        }
    }
    previous
}

/// Run `f` with `config` active, restoring the previous configuration afterwards.
pub fn with<T>(config: KernelConfig, f: impl FnOnce() -> T) -> T {
    struct Restore(KernelConfig);

    impl Drop for Restore {
        fn drop(&mut self) {
            ACTIVE.with(|active| active.set(self.0));
        }
    }

    let _restore = Restore(set(config));
    f()
}
