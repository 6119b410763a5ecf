use tokio::sync::RwLock;
use tracing::{debug, trace};
use tracing_subscriber::{prelude::*, EnvFilter};

fn do_init(quiet: bool) {
    let default_directive = if quiet { "info" } else { "debug" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Records own stdout, diagnostics go to stderr.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    debug!(%default_directive, "Logging with: stderr");
}

/// Initialize tracing.
///
/// Will only initialize once, so tests may call this.
pub async fn init(quiet: bool) {
    static TRACING_IS_INITIALIZED: RwLock<bool> = RwLock::const_new(false);

    let initialized = { *TRACING_IS_INITIALIZED.read().await };

    if !initialized {
        let mut initialized = TRACING_IS_INITIALIZED.write().await;

        // To avoid race condition between the `.read()` and the
        // `.write()`.
        if *initialized {
            return;
        }

        do_init(quiet);

        *initialized = true;
    }
}

/// Called right before the process exits.
pub fn shutdown() {
    trace!("Shutting down");
}
