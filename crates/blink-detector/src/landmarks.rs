//! 面部关键点 → 睁眼幅度
//!
//! 取 Face Mesh 上眼睑 159 与下眼睑 145 两个关键点的纵向距离，
//! 坐标为归一化图像坐标，因此结果与画面分辨率无关。

use crate::sample::{EyeOpennessSample, SampleError, Timestamp};

/// 上眼睑关键点索引
pub const UPPER_LID: usize = 159;
/// 下眼睑关键点索引
pub const LOWER_LID: usize = 145;
/// 每个关键点占用的浮点数个数 (x, y)
pub const LANDMARK_STRIDE: usize = 2;

fn landmark_y(landmarks: &[f64], index: usize) -> Option<f64> {
    landmarks.get(index * LANDMARK_STRIDE + 1).copied()
}

/// 计算睁眼幅度
///
/// 输入为扁平数组 `[x0, y0, x1, y1, ...]`；关键点不足或坐标非法时返回 `None`，
/// 与未检测到人脸同等对待。
pub fn eye_opening(landmarks: &[f64]) -> Option<f64> {
    let top = landmark_y(landmarks, UPPER_LID)?;
    let bottom = landmark_y(landmarks, LOWER_LID)?;
    let opening = (top - bottom).abs();
    opening.is_finite().then_some(opening)
}

/// 由一帧关键点构造样本；`Ok(None)` 表示该帧不可用
pub fn sample_from_landmarks(
    landmarks: &[f64],
    timestamp: Timestamp,
) -> Result<Option<EyeOpennessSample>, SampleError> {
    eye_opening(landmarks)
        .map(|opening| EyeOpennessSample::new(opening, timestamp))
        .transpose()
}
