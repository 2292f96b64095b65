//! Diagnostics go to stderr through `tracing`; the lists themselves are
//! printed on stdout by the `output` module.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a verbosity level. `RUST_LOG` wins when set and no
/// flag asked for something explicit.
pub fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("disneycards=error");
    }
    match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("disneycards=warn")),
        1 => EnvFilter::new("disneycards=info"),
        2 => EnvFilter::new("disneycards=debug"),
        _ => EnvFilter::new("disneycards=trace,reqwest=debug"),
    }
}

/// Installs the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init(verbose: u8, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}
