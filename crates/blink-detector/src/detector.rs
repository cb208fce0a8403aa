//! 眨眼检测状态机
//!
//! 两状态滞回：EyesOpen → EyesClosed 时计一次眨眼，重新睁眼不计数。
//! 连续多帧闭眼只在第一帧触发，避免同一次眨眼被重复统计。
//!
//! 闭眼阈值按用户自适应：检测器在线记录会话内观测到的最大睁眼幅度，
//! 阈值 = 最大值 × `blink_ratio`。校准值只增不减，直到 `reset`。
//!
//! 检测器不做 I/O、不持有锁，也不读取系统时间；所有时间都由调用方传入。

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DetectorConfig};
use crate::rate::WindowRollover;
use crate::sample::{EyeOpennessSample, Timestamp};

/// 保留的已结束窗口数量上限
const MAX_WINDOW_HISTORY: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkState {
    #[default]
    EyesOpen,
    EyesClosed,
}

impl BlinkState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EyesOpen => "eyes_open",
            Self::EyesClosed => "eyes_closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
}

/// 单次 `observe` 的结果
///
/// 无人脸、未校准、会话已结束都不是错误，而是显式的结果分支。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(
    tag = "outcome",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Observation {
    Evaluated {
        state: BlinkState,
        blink_detected: bool,
        window_count: u32,
    },
    NoFace {
        state: BlinkState,
        window_count: u32,
    },
    Uncalibrated {
        state: BlinkState,
        window_count: u32,
    },
    SessionOver {
        state: BlinkState,
        window_count: u32,
    },
}

impl Observation {
    pub fn state(&self) -> BlinkState {
        match *self {
            Self::Evaluated { state, .. }
            | Self::NoFace { state, .. }
            | Self::Uncalibrated { state, .. }
            | Self::SessionOver { state, .. } => state,
        }
    }

    pub fn window_count(&self) -> u32 {
        match *self {
            Self::Evaluated { window_count, .. }
            | Self::NoFace { window_count, .. }
            | Self::Uncalibrated { window_count, .. }
            | Self::SessionOver { window_count, .. } => window_count,
        }
    }

    pub fn blink_detected(&self) -> bool {
        matches!(
            self,
            Self::Evaluated {
                blink_detected: true,
                ..
            }
        )
    }
}

/// 单次 `tick` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub rollover: Option<WindowRollover>,
    pub status: SessionStatus,
    /// 本次 tick 恰好使会话结束
    pub just_completed: bool,
}

impl Tick {
    fn stale() -> Self {
        Self {
            rollover: None,
            status: SessionStatus::Completed,
            just_completed: false,
        }
    }
}

/// 供展示层读取的只读快照
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSnapshot {
    pub state: BlinkState,
    pub window_count: u32,
    pub window_start: Timestamp,
    pub session_blinks: u64,
    pub calibration: Option<f64>,
    pub threshold: Option<f64>,
    pub remaining_secs: u64,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, Default)]
struct CalibrationState {
    max: Option<f64>,
}

impl CalibrationState {
    fn update(&mut self, value: f64) {
        match self.max {
            Some(max) if value <= max => {}
            _ => self.max = Some(value),
        }
    }

    /// 未校准或最大值为零时没有可用阈值
    fn threshold(&self, ratio: f64) -> Option<f64> {
        self.max.filter(|max| *max > 0.0).map(|max| max * ratio)
    }
}

#[derive(Debug, Clone, Copy)]
struct BlinkCounter {
    count: u32,
    window_start: Timestamp,
}

impl BlinkCounter {
    fn starting_at(now: Timestamp) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    start: Timestamp,
    duration: Duration,
    completed: bool,
    total_blinks: u64,
    windows: VecDeque<WindowRollover>,
}

impl Session {
    fn starting_at(now: Timestamp, duration: Duration) -> Self {
        Self {
            start: now,
            duration,
            completed: false,
            total_blinks: 0,
            windows: VecDeque::new(),
        }
    }

    fn record_window(&mut self, rollover: WindowRollover) {
        if self.windows.len() >= MAX_WINDOW_HISTORY {
            self.windows.pop_front();
        }
        self.windows.push_back(rollover);
    }
}

/// 眨眼检测器，独占一次监测会话的全部状态
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    config: DetectorConfig,
    calibration: CalibrationState,
    state: BlinkState,
    counter: BlinkCounter,
    session: Session,
}

impl BlinkDetector {
    pub fn new(config: DetectorConfig, now: Timestamp) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calibration: CalibrationState::default(),
            state: BlinkState::EyesOpen,
            counter: BlinkCounter::starting_at(now),
            session: Session::starting_at(now, config.session()),
            config,
        })
    }

    /// 输入一帧测量值；`None` 表示该帧未检测到人脸
    ///
    /// 会话结束后无论是否有人脸都返回 `SessionOver`，直到 `reset`。
    pub fn observe(&mut self, sample: Option<EyeOpennessSample>) -> Observation {
        if self.session.completed {
            return Observation::SessionOver {
                state: self.state,
                window_count: self.counter.count,
            };
        }

        let Some(sample) = sample else {
            return Observation::NoFace {
                state: self.state,
                window_count: self.counter.count,
            };
        };

        let value = sample.value();
        self.calibration.update(value);

        let Some(threshold) = self.calibration.threshold(self.config.blink_ratio) else {
            return Observation::Uncalibrated {
                state: self.state,
                window_count: self.counter.count,
            };
        };

        let mut blink_detected = false;
        match self.state {
            BlinkState::EyesOpen if value < threshold => {
                blink_detected = true;
                self.counter.count = self.counter.count.saturating_add(1);
                self.session.total_blinks = self.session.total_blinks.saturating_add(1);
                self.state = BlinkState::EyesClosed;
            }
            BlinkState::EyesClosed if value >= threshold => {
                self.state = BlinkState::EyesOpen;
            }
            _ => {}
        }

        Observation::Evaluated {
            state: self.state,
            blink_detected,
            window_count: self.counter.count,
        }
    }

    /// 按时间推进：检查计数窗口是否结束、会话是否到期
    ///
    /// 与 `observe` 相互独立，样本停止输入时窗口照样滚动。
    pub fn tick(&mut self, now: Timestamp) -> Tick {
        if self.session.completed {
            return Tick::stale();
        }

        let mut rollover = None;
        if now.saturating_since(self.counter.window_start) >= self.config.window() {
            let closed = WindowRollover::close(
                self.counter.count,
                self.counter.window_start,
                now,
                &self.config,
            );
            self.session.record_window(closed);
            self.counter = BlinkCounter::starting_at(now);
            rollover = Some(closed);
        }

        let mut just_completed = false;
        if now.saturating_since(self.session.start) >= self.session.duration {
            self.session.completed = true;
            just_completed = true;
        }

        Tick {
            rollover,
            status: self.status(),
            just_completed,
        }
    }

    /// 清空校准、计数与会话，以 `now` 为起点重新开始
    pub fn reset(&mut self, now: Timestamp) {
        self.calibration = CalibrationState::default();
        self.state = BlinkState::EyesOpen;
        self.counter = BlinkCounter::starting_at(now);
        self.session = Session::starting_at(now, self.config.session());
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn window_count(&self) -> u32 {
        self.counter.count
    }

    pub fn window_start(&self) -> Timestamp {
        self.counter.window_start
    }

    pub fn session_start(&self) -> Timestamp {
        self.session.start
    }

    pub fn session_blinks(&self) -> u64 {
        self.session.total_blinks
    }

    pub fn calibration(&self) -> Option<f64> {
        self.calibration.max
    }

    pub fn threshold(&self) -> Option<f64> {
        self.calibration.threshold(self.config.blink_ratio)
    }

    pub fn is_complete(&self) -> bool {
        self.session.completed
    }

    pub fn status(&self) -> SessionStatus {
        if self.session.completed {
            SessionStatus::Completed
        } else {
            SessionStatus::Running
        }
    }

    /// 已结束的计数窗口，按时间先后排列
    pub fn windows(&self) -> impl ExactSizeIterator<Item = &WindowRollover> {
        self.session.windows.iter()
    }

    pub fn remaining(&self, now: Timestamp) -> Duration {
        if self.session.completed {
            return Duration::ZERO;
        }
        self.session
            .duration
            .saturating_sub(now.saturating_since(self.session.start))
    }

    /// 剩余整秒数，已过去的不足一秒部分不扣除
    pub fn remaining_secs(&self, now: Timestamp) -> u64 {
        if self.session.completed {
            return 0;
        }
        let elapsed = now.saturating_since(self.session.start).as_secs();
        self.session.duration.as_secs().saturating_sub(elapsed)
    }

    pub fn snapshot(&self, now: Timestamp) -> DetectorSnapshot {
        DetectorSnapshot {
            state: self.state,
            window_count: self.counter.count,
            window_start: self.counter.window_start,
            session_blinks: self.session.total_blinks,
            calibration: self.calibration.max,
            threshold: self.threshold(),
            remaining_secs: self.remaining_secs(now),
            status: self.status(),
        }
    }
}

/// 格式化为 `m:ss`
pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
