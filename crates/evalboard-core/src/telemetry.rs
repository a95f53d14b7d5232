//! Log output for the `evalboard` binary and for embedders that want the same
//! format. Library code only emits events; installing a subscriber is left to
//! the process entry point.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the process-wide subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level` when set. With `json`, each event is one JSON
/// object per line. Returns `false` if a subscriber was already installed, in
/// which case the existing one is left alone.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let output = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let output = if json {
        output.json().boxed()
    } else {
        output.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_refused() {
        init_tracing(false, Level::WARN);
        assert!(!init_tracing(true, Level::DEBUG));
        tracing::info!(event = "telemetry.ready");
    }
}
