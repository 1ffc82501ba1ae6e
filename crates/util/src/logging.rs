//! Tracing subscriber setup for hosts embedding the bindings.

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber.
///
/// `RUST_LOG` takes precedence; `default_filter` (for example
/// `"fieldsync_engine=debug"`) applies when it is unset or invalid. Returns
/// `false` when a global subscriber was already installed, which makes the
/// call safe to repeat from tests.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        let _ = init_tracing("info");
        assert!(!init_tracing("debug"));
    }
}
