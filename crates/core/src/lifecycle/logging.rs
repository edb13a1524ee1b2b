//! Logging initialization: text or JSON lines, to stderr or a daily file.

use crate::config::{Config, LogFormat};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_FILE_NAME: &str = "batchgate.log";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Daily rotating `batchgate.log` under `dir`.
    File { dir: String },
}

impl LogOutput {
    pub fn from_config(config: &Config) -> Self {
        if config.logging_to_file {
            Self::File {
                dir: config
                    .log_dir
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            }
        } else {
            Self::Stderr
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. JSON output flattens event
/// fields and includes the current span, so the `request` span's `uri` and
/// the `job` span's `execution_id` appear on every line. The returned guard
/// must be held for the lifetime of the process so buffered file output is
/// flushed on shutdown.
pub fn init_logging(level: &str, format: LogFormat, output: &LogOutput) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard, ansi) = match output {
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), None, true),
        LogOutput::File { dir } => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(ansi && format == LogFormat::Text);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_from_config() {
        let mut config = Config::default();
        assert_eq!(LogOutput::from_config(&config), LogOutput::Stderr);

        config.logging_to_file = true;
        assert_eq!(
            LogOutput::from_config(&config),
            LogOutput::File {
                dir: "./logs".into()
            }
        );

        config.log_dir = Some("/var/log/batchgate".into());
        assert_eq!(
            LogOutput::from_config(&config),
            LogOutput::File {
                dir: "/var/log/batchgate".into()
            }
        );
    }
}
