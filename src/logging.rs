use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber; stdout carries the protocol stream.
///
/// `RUST_LOG` selects the level; without it `info` is used. Calling this more
/// than once is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init();
}
