//! 检测器配置
//!
//! 所有参数在构造检测器时一次性给定，运行期不再协商。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 闭眼阈值 = 校准最大值 × 该比例
pub const DEFAULT_BLINK_RATIO: f64 = 0.4;
/// 眨眼计数窗口（秒）
pub const DEFAULT_WINDOW_SECONDS: u64 = 60;
/// 单次监测会话总时长（秒）
pub const DEFAULT_SESSION_SECONDS: u64 = 5 * 60;
/// 正常眨眼频率下限（次/分钟）
pub const DEFAULT_NORMAL_RATE_MIN: f64 = 15.0;
/// 目标眨眼频率上限（次/分钟）
pub const DEFAULT_TARGET_RATE_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("blink ratio must lie strictly between 0 and 1, got {0}")]
    BlinkRatioOutOfRange(f64),
    #[error("window duration must be at least one second")]
    ZeroWindow,
    #[error("session duration must be at least one second")]
    ZeroSession,
    #[error("invalid normal blink-rate range [{min}, {max}]")]
    InvalidRateRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    pub blink_ratio: f64,
    pub window_seconds: u64,
    pub session_seconds: u64,
    #[serde(default = "default_normal_rate_min")]
    pub normal_rate_min: f64,
    #[serde(default = "default_target_rate_max")]
    pub target_rate_max: f64,
}

fn default_normal_rate_min() -> f64 {
    DEFAULT_NORMAL_RATE_MIN
}

fn default_target_rate_max() -> f64 {
    DEFAULT_TARGET_RATE_MAX
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blink_ratio: DEFAULT_BLINK_RATIO,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            session_seconds: DEFAULT_SESSION_SECONDS,
            normal_rate_min: DEFAULT_NORMAL_RATE_MIN,
            target_rate_max: DEFAULT_TARGET_RATE_MAX,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN 不满足任何比较，需单独拒绝
        if !(self.blink_ratio > 0.0 && self.blink_ratio < 1.0) {
            return Err(ConfigError::BlinkRatioOutOfRange(self.blink_ratio));
        }
        if self.window_seconds == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.session_seconds == 0 {
            return Err(ConfigError::ZeroSession);
        }
        let (min, max) = (self.normal_rate_min, self.target_rate_max);
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(ConfigError::InvalidRateRange { min, max });
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn session(&self) -> Duration {
        Duration::from_secs(self.session_seconds)
    }
}
