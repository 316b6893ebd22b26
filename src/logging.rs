//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "LINGUABOT_LOG";
pub const DEFAULT_FILTER: &str = "linguabot_lib=warn,linguabot=warn";

/// Installs the global subscriber.
///
/// Levels come from `LINGUABOT_LOG` (e.g. `LINGUABOT_LOG=linguabot_lib=debug`).
/// Output goes to stderr so it stays out of the conversation on stdout.
/// Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
