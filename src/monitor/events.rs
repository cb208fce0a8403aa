use blink_detector::{Timestamp, WindowRollover};
use serde::Serialize;
use uuid::Uuid;

/// Why a session left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Deleted,
    Idle,
}

/// Events fanned out to realtime subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum MonitorEvent {
    Blink {
        session_id: Uuid,
        window_count: u32,
        at: Timestamp,
    },
    WindowClosed {
        session_id: Uuid,
        rollover: WindowRollover,
    },
    SessionCompleted {
        session_id: Uuid,
        session_blinks: u64,
    },
    SessionReset {
        session_id: Uuid,
    },
    SessionRemoved {
        session_id: Uuid,
        reason: RemovalReason,
    },
}

impl MonitorEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Blink { session_id, .. }
            | Self::WindowClosed { session_id, .. }
            | Self::SessionCompleted { session_id, .. }
            | Self::SessionReset { session_id }
            | Self::SessionRemoved { session_id, .. } => *session_id,
        }
    }

    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blink { .. } => "blink",
            Self::WindowClosed { .. } => "window_closed",
            Self::SessionCompleted { .. } => "session_completed",
            Self::SessionReset { .. } => "session_reset",
            Self::SessionRemoved { .. } => "session_removed",
        }
    }
}
