//! Logging configuration with journald support on Linux.
//!
//! Sets up tracing-based logging that goes to systemd's journal when it is
//! reachable and to a daily rolling file otherwise.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SCHOOLSHOTS_LOG";

/// Where log records end up when journald is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// A rolling file under the data directory. Used by the CLI, whose
    /// stdout carries command output.
    File,
    /// Standard error. Used by the server, which usually runs under a
    /// supervisor that captures it.
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system.
///
/// Log level can be controlled via the `SCHOOLSHOTS_LOG` environment
/// variable, e.g. `SCHOOLSHOTS_LOG=debug` or
/// `SCHOOLSHOTS_LOG=schoolshots=debug,tower_http=info`. Defaults to `info`.
pub fn init(log_dir: Option<PathBuf>, fallback: Fallback) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald_layer)
                .init();

            tracing::info!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    match fallback {
        Fallback::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();

            tracing::info!("Logging initialized with stderr backend");
        }
        Fallback::File => {
            let log_dir = log_dir.unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("schoolshots")
                    .join("logs")
            });

            std::fs::create_dir_all(&log_dir)?;

            let file_appender = tracing_appender::rolling::daily(&log_dir, "schoolshots.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The writer flushes until its guard drops; keep it for the process lifetime.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();

            tracing::info!("Logging initialized with file backend at {:?}", log_dir);
        }
    }

    Ok(())
}
