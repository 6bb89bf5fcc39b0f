//! Process-wide logging setup

use tracing_subscriber::EnvFilter;

/// Builds the filter for a verbosity level
///
/// `quiet` wins over `verbose` and keeps errors only. `RUST_LOG`, when set,
/// overrides both.
pub fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scraper=info,warn"),
            1 => EnvFilter::new("shelf_scraper=debug,info"),
            2 => EnvFilter::new("shelf_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Installs the fmt subscriber
///
/// Safe to call more than once; only the first call installs anything.
///
/// # Returns
///
/// `true` if this call installed the subscriber
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(0, false);
        assert!(!init_logging(2, false));
    }
}
