//! Tracing initialization for the binary and for tests.

#[cfg(test)]
use once_cell::sync::Lazy;

/// Initialize tracing for the binary with environment-based filtering.
///
/// `RUST_LOG` controls output, e.g. `RUST_LOG=cwskim=debug` or
/// `RUST_LOG=cwskim::skimmer=trace`. Call this early in `main()`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cwskim=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing for tests; safe to call from every test.
#[cfg(test)]
pub fn init_test_tracing() {
    static TRACING: Lazy<()> = Lazy::new(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cwskim=warn"));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .try_init()
            .ok();
    });

    Lazy::force(&TRACING);
}
