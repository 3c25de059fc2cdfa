//! Logging and tracing configuration
//!
//! Logs go to stderr so they never mix with the report on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is WARN, or DEBUG for this crate when `verbose` is set.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("steprun=debug,warn")
        } else {
            EnvFilter::new("steprun=warn")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// Route panic messages into the log instead of stderr
///
/// Test bodies are allowed to panic; the executor turns the panic into a
/// failure and reports it, so the default hook output would be noise.
pub fn quiet_panics() {
    std::panic::set_hook(Box::new(|info| {
        tracing::debug!(panic = %info, "caught panic");
    }));
}
