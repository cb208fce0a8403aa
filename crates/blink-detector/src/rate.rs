//! 眨眼频率统计
//!
//! 正常眨眼频率约为 15-20 次/分钟。长时间盯屏时频率明显下降，
//! 是视疲劳和干眼的常见诱因。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::sample::Timestamp;

/// 频率分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkRate {
    /// 眨眼过少
    Low,
    Normal,
    /// 高于目标上限
    High,
}

impl BlinkRate {
    pub fn classify(blinks_per_minute: f64, config: &DetectorConfig) -> Self {
        if blinks_per_minute < config.normal_rate_min {
            Self::Low
        } else if blinks_per_minute > config.target_rate_max {
            Self::High
        } else {
            Self::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// 将窗口内的计数换算为次/分钟
pub fn blinks_per_minute(count: u32, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    f64::from(count) * 60.0 / secs
}

/// 一个已结束的计数窗口
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRollover {
    pub count: u32,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub blinks_per_minute: f64,
    pub rate: BlinkRate,
}

impl WindowRollover {
    pub(crate) fn close(
        count: u32,
        window_start: Timestamp,
        window_end: Timestamp,
        config: &DetectorConfig,
    ) -> Self {
        let bpm = blinks_per_minute(count, window_end.saturating_since(window_start));
        Self {
            count,
            window_start,
            window_end,
            blinks_per_minute: bpm,
            rate: BlinkRate::classify(bpm, config),
        }
    }

    pub fn is_under_blinking(&self) -> bool {
        self.rate == BlinkRate::Low
    }
}
