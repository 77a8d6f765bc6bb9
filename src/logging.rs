use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "overlay.log";

/// Initialise logging. The default level is `info`; `debug` can be enabled
/// via the config file, which also lets `RUST_LOG` override the level.
///
/// With a `log_dir` the output goes to `overlay.log` there, since the GUI
/// subsystem has no console. Keep the returned guard alive for the life of
/// the process or buffered lines are lost.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // When debug logging is disabled we force `info` level regardless of the
    // `RUST_LOG` environment variable.
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
            None
        }
    }
}
