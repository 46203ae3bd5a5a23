use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g.
/// `TITANIC_BAYES_LOG=titanic_bayes=debug`.
pub const LOG_ENV: &str = "TITANIC_BAYES_LOG";

/// Installs a stderr fmt subscriber. Safe to call more than once.
///
/// Falls back to `titanic_bayes=info` when the variable is unset or invalid.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("titanic_bayes=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
