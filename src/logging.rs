//! tracing 初始化：控制台输出，可选按天滚动的 JSON 文件日志
//!
//! 会话 tick 每秒执行一次，调度器自身的日志默认压到 warn，
//! 以免淹没眨眼与窗口事件。

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "blink-monitor";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 14;
const QUIET_TARGETS: &[&str] = &["tokio_cron_scheduler=warn"];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create rolling log file in {dir}: {source}")]
    FileAppender {
        dir: String,
        #[source]
        source: InitError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

impl LogConfig {
    fn default_directives(&self) -> String {
        std::iter::once(self.log_level.as_str())
            .chain(QUIET_TARGETS.iter().copied())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `RUST_LOG` 优先；否则使用配置级别并附加静音目标
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }

    fn file_appender(&self) -> Result<RollingFileAppender, LoggingError> {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(MAX_LOG_FILES)
            .build(&self.log_dir)
            .map_err(|source| LoggingError::FileAppender {
                dir: self.log_dir.clone(),
                source,
            })
    }
}

/// Install the global subscriber. A subscriber that is already installed
/// (repeated init in tests) is left in place.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let file_layer = if config.enable_file_logs {
        let appender = config.file_appender()?;
        Some(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .json(),
        )
    } else {
        None
    };

    let result = Registry::default()
        .with(config.env_filter())
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    match result {
        // 并发初始化时另一方已经装好
        Err(_) if tracing::dispatcher::has_been_set() => Ok(()),
        other => other.map_err(LoggingError::from),
    }
}
