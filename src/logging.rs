use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Output goes to stderr so command results on stdout stay
/// machine-readable.
pub fn init(level: &str) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bookshelf_lib={level},bookshelf={level}")));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    if let Err(e) = installed {
        tracing::debug!(error = %e, "global subscriber already set, keeping it");
    }
}
