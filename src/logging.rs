use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber on stderr. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: Level) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
