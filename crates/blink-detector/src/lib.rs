//! 眨眼监测库
//!
//! 将逐帧的睁眼幅度测量值转换为眨眼事件与每分钟眨眼次数，
//! 通过在线校准适应不同用户的眼睛大小。可编译为 WebAssembly 在浏览器端运行，
//! 也可作为普通 Rust 库由服务端持有。
//!
//! ## 模块
//! - `sample`: 样本与时间戳，边界校验
//! - `config`: 检测器配置
//! - `detector`: 两状态滞回眨眼状态机
//! - `rate`: 计数窗口与频率分级
//! - `landmarks`: 面部关键点 → 睁眼幅度
//! - `wasm`: 浏览器端导出

pub mod config;
pub mod detector;
pub mod landmarks;
pub mod rate;
pub mod sample;
pub mod wasm;

// 重新导出核心类型，方便外部使用
pub use config::{ConfigError, DetectorConfig};
pub use detector::{
    format_remaining, BlinkDetector, BlinkState, DetectorSnapshot, Observation, SessionStatus,
    Tick,
};
pub use rate::{BlinkRate, WindowRollover};
pub use sample::{EyeOpennessSample, SampleError, Timestamp};
