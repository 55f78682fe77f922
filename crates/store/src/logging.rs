//! Log output setup

use crate::LoggingSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Returns `false`
/// when a subscriber was already installed, in which case nothing changes.
pub fn init_logging(settings: &LoggingSettings) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let installed = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(settings.ansi))
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = %settings.filter, "logging initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        let settings = LoggingSettings {
            filter: "store=debug".to_string(),
            ansi: false,
        };
        init_logging(&settings);
        assert!(!init_logging(&settings));
    }
}
