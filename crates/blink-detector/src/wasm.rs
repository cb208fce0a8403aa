//! 浏览器端导出
//!
//! 在摄像头所在页面直接运行检测器，时间戳使用 `performance.now()` 毫秒。

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::DetectorConfig;
use crate::detector::{BlinkDetector, Observation};
use crate::landmarks;
use crate::sample::{EyeOpennessSample, Timestamp};

/// 单帧检测结果
#[wasm_bindgen]
pub struct BlinkResult {
    pub blink_detected: bool,
    pub window_count: u32,
    /// 当前状态（0=EyesOpen, 1=EyesClosed）
    pub state: u8,
    /// 结果类别（0=Evaluated, 1=NoFace, 2=Uncalibrated, 3=SessionOver）
    pub outcome: u8,
}

impl From<Observation> for BlinkResult {
    fn from(obs: Observation) -> Self {
        let outcome = match obs {
            Observation::Evaluated { .. } => 0,
            Observation::NoFace { .. } => 1,
            Observation::Uncalibrated { .. } => 2,
            Observation::SessionOver { .. } => 3,
        };
        Self {
            blink_detected: obs.blink_detected(),
            window_count: obs.window_count(),
            state: obs.state() as u8,
            outcome,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotView {
    #[serde(flatten)]
    snapshot: crate::detector::DetectorSnapshot,
    remaining_display: String,
}

fn timestamp(ms: f64) -> Result<Timestamp, JsError> {
    Timestamp::from_millis_f64(ms).ok_or_else(|| JsError::new("invalid timestamp"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

/// 眨眼监测器
#[wasm_bindgen(js_name = "BlinkMonitor")]
pub struct WasmBlinkMonitor {
    inner: BlinkDetector,
}

#[wasm_bindgen(js_class = "BlinkMonitor")]
impl WasmBlinkMonitor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        blink_ratio: f64,
        window_seconds: u32,
        session_seconds: u32,
        now_ms: f64,
    ) -> Result<WasmBlinkMonitor, JsError> {
        let config = DetectorConfig {
            blink_ratio,
            window_seconds: u64::from(window_seconds),
            session_seconds: u64::from(session_seconds),
            ..DetectorConfig::default()
        };
        let inner = BlinkDetector::new(config, timestamp(now_ms)?)?;
        Ok(Self { inner })
    }

    /// `eye_opening` 为 `undefined` 表示该帧未检测到人脸
    pub fn update(
        &mut self,
        eye_opening: Option<f64>,
        timestamp_ms: f64,
    ) -> Result<BlinkResult, JsError> {
        let ts = timestamp(timestamp_ms)?;
        let sample = eye_opening
            .map(|value| EyeOpennessSample::new(value, ts))
            .transpose()?;
        Ok(self.inner.observe(sample).into())
    }

    /// 直接输入 Face Mesh 关键点（扁平 x,y 数组）；空数组视为无人脸
    #[wasm_bindgen(js_name = "updateLandmarks")]
    pub fn update_landmarks(
        &mut self,
        landmarks: &[f64],
        timestamp_ms: f64,
    ) -> Result<BlinkResult, JsError> {
        let sample = landmarks::sample_from_landmarks(landmarks, timestamp(timestamp_ms)?)?;
        Ok(self.inner.observe(sample).into())
    }

    pub fn tick(&mut self, now_ms: f64) -> Result<JsValue, JsError> {
        let tick = self.inner.tick(timestamp(now_ms)?);
        to_js(&tick)
    }

    pub fn snapshot(&self, now_ms: f64) -> Result<JsValue, JsError> {
        let snapshot = self.inner.snapshot(timestamp(now_ms)?);
        to_js(&SnapshotView {
            remaining_display: crate::format_remaining(snapshot.remaining_secs),
            snapshot,
        })
    }

    pub fn reset(&mut self, now_ms: f64) -> Result<(), JsError> {
        self.inner.reset(timestamp(now_ms)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "getBlinkCount")]
    pub fn get_blink_count(&self) -> u32 {
        self.inner.window_count()
    }

    #[wasm_bindgen(js_name = "getThreshold")]
    pub fn get_threshold(&self) -> Option<f64> {
        self.inner.threshold()
    }

    #[wasm_bindgen(js_name = "isComplete")]
    pub fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }
}
