use log::LevelFilter;

/// Environment variable holding the log filter, `env_logger` syntax.
pub const LOG_ENV: &str = "REDEEM_LINALG_LOG";

/// Filter used when `REDEEM_LINALG_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,redeem_linalg=info";

/// Install `env_logger` with the default filter.
///
/// Returns `false` if a logger was already installed.
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Install `env_logger`, falling back to `filter` when `REDEEM_LINALG_LOG` is unset.
pub fn init_with_default(filter: &str) -> bool {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or(LOG_ENV, filter))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_with_default("off");
        assert!(!init());
        assert!(!init_with_default("trace"));
    }
}
