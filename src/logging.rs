use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console and file logging.
///
/// Console verbosity follows `RUST_LOG` when set; otherwise `fightrec=info`,
/// or `fightrec=debug` when the run asked for verbose output. File output is
/// daily-rotated JSON under `logs/`, which is what run post-mortems read.
pub fn init_logging(verbose: bool) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "fightrec.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let default_directive = if verbose {
        "fightrec=debug"
    } else {
        "fightrec=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The guard must outlive the process or buffered file logs are dropped
    std::mem::forget(guard);
}
