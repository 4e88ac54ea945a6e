//! Log output for applications built on the engine.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging();
        init_logging();
        tracing::info!("still logging");
    }
}
