use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use blink_detector::{format_remaining, BlinkDetector, DetectorSnapshot, Timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One monitoring session: a detector plus bookkeeping for the host.
///
/// The detector sits behind its own mutex so HTTP handlers and the tick
/// worker are serialized per session while sessions stay independent.
pub struct MonitorSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    detector: Mutex<BlinkDetector>,
    last_activity_ms: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: DetectorSnapshot,
    pub remaining_display: String,
}

impl MonitorSession {
    pub(crate) fn new(id: Uuid, detector: BlinkDetector, now: Timestamp) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            detector: Mutex::new(detector),
            last_activity_ms: AtomicU64::new(now.as_millis()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn detector(&self) -> &Mutex<BlinkDetector> {
        &self.detector
    }

    pub(crate) fn touch(&self, now: Timestamp) {
        self.last_activity_ms
            .fetch_max(now.as_millis(), Ordering::Relaxed);
    }

    pub fn idle_for(&self, now: Timestamp) -> Duration {
        let last = Timestamp::from_millis(self.last_activity_ms.load(Ordering::Relaxed));
        now.saturating_since(last)
    }

    /// Build a view from an already-locked detector.
    pub(crate) fn view_of(&self, detector: &BlinkDetector, now: Timestamp) -> SessionView {
        let snapshot = detector.snapshot(now);
        SessionView {
            id: self.id,
            created_at: self.created_at,
            remaining_display: format_remaining(snapshot.remaining_secs),
            snapshot,
        }
    }

    pub async fn view(&self, now: Timestamp) -> SessionView {
        let detector = self.detector.lock().await;
        self.view_of(&detector, now)
    }
}
