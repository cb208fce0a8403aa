use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use blink_detector::config::{
    DEFAULT_BLINK_RATIO, DEFAULT_NORMAL_RATE_MIN, DEFAULT_SESSION_SECONDS,
    DEFAULT_TARGET_RATE_MAX, DEFAULT_WINDOW_SECONDS,
};
use blink_detector::DetectorConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub detector: DetectorConfig,
    pub worker: WorkerConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    /// 会话无活动超过该时长后由清理任务移除
    pub session_idle_ttl_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            is_leader: true,
            session_idle_ttl_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_sessions: usize,
    pub max_sse_connections: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1_000,
            max_sse_connections: 200,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let worker_defaults = WorkerConfig::default();
        let limit_defaults = LimitsConfig::default();

        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            detector: DetectorConfig {
                blink_ratio: env_or_parse("BLINK_RATIO", DEFAULT_BLINK_RATIO),
                window_seconds: env_or_parse("BLINK_WINDOW_SECS", DEFAULT_WINDOW_SECONDS),
                session_seconds: env_or_parse("BLINK_SESSION_SECS", DEFAULT_SESSION_SECONDS),
                normal_rate_min: env_or_parse("BLINK_NORMAL_RATE_MIN", DEFAULT_NORMAL_RATE_MIN),
                target_rate_max: env_or_parse("BLINK_TARGET_RATE_MAX", DEFAULT_TARGET_RATE_MAX),
            },
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", worker_defaults.is_leader),
                session_idle_ttl_secs: env_or_parse(
                    "SESSION_IDLE_TTL_SECS",
                    worker_defaults.session_idle_ttl_secs,
                ),
            },
            limits: LimitsConfig {
                max_sessions: env_or_parse("MAX_SESSIONS", limit_defaults.max_sessions),
                max_sse_connections: env_or_parse(
                    "MAX_SSE_CONNECTIONS",
                    limit_defaults.max_sse_connections,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
