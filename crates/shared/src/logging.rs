use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide log subscriber. Call once, first thing in `main`.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks the level for
/// this workspace's crates.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default_filter = format!("shared={level},hn_summary={level},render_site={level},warn");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
