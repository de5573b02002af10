use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Default filter directive when `RUST_LOG` is not set.
pub fn default_directive(config: &LoggingConfig) -> &'static str {
    if config.debug {
        "todo_api=debug,tower_http=debug,sqlx=info,info"
    } else {
        "todo_api=info,tower_http=info,sqlx=warn,warn"
    }
}

/// Install the global subscriber.
///
/// Behind a front-end server the output goes to stderr without colours so
/// the fronting process can fold it into its own log. `LOG_FILE` adds a
/// second, plain-text sink.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let console = if config.behind_proxy {
        fmt::layer()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let file = match config.file.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?))
                .boxed(),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(())
}

fn open_log_file(path: &str) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {}", path, e))
}
