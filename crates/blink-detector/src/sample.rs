//! 睁眼幅度样本与单调时间戳
//!
//! 样本在构造时完成校验：NaN、无穷大和负值在进入检测器之前就被拒绝，
//! 检测器内部因此无需再处理非法数值。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 非法样本
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    #[error("eye-openness value is not finite")]
    NotFinite,
    #[error("eye-openness value {0} is negative")]
    Negative(f64),
}

/// 单调时间戳，相对调用方选定的原点
///
/// 序列化为毫秒整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub const fn from_duration(offset: Duration) -> Self {
        Self(offset)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// 从浏览器的 `performance.now()` 风格浮点毫秒构造，非法值返回 `None`
    pub fn from_millis_f64(millis: f64) -> Option<Self> {
        if !millis.is_finite() || millis < 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(millis / 1000.0).ok().map(Self)
    }

    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }

    /// 自 `earlier` 起经过的时间；时钟回退时饱和为零
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Self::from_millis(millis)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.as_millis()
    }
}

/// 单眼单帧的睁眼幅度测量值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeOpennessSample {
    value: f64,
    timestamp: Timestamp,
}

impl EyeOpennessSample {
    pub fn new(value: f64, timestamp: Timestamp) -> Result<Self, SampleError> {
        if !value.is_finite() {
            return Err(SampleError::NotFinite);
        }
        if value < 0.0 {
            return Err(SampleError::Negative(value));
        }
        Ok(Self { value, timestamp })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}
