//! Logging and tracing configuration
//!
//! Log lines go to stderr so that runner output and result listings on stdout
//! stay clean enough to pipe.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable that turns on debug output, kept from the Serverless
/// Framework convention
pub const DEBUG_ENV: &str = "SLS_DEBUG";

/// Whether `SLS_DEBUG` is set to anything
pub fn debug_requested() -> bool {
    std::env::var_os(DEBUG_ENV).is_some()
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies; `--verbose`
/// or `SLS_DEBUG` raise this crate to DEBUG.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose || debug_requested())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .compact(),
        )
        .init();
}

fn default_directives(debug: bool) -> &'static str {
    if debug {
        "serverless_tdd=debug,warn"
    } else {
        "serverless_tdd=info,warn"
    }
}
