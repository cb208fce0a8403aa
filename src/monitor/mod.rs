pub mod events;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use blink_detector::landmarks;
use blink_detector::{
    BlinkDetector, ConfigError, DetectorConfig, EyeOpennessSample, Observation, SampleError, Tick,
    Timestamp, WindowRollover,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::clock::Clock;

pub use events::{MonitorEvent, RemovalReason};
pub use session::{MonitorSession, SessionView};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("session limit reached: {0}")]
    TooManySessions(usize),
    #[error("invalid sample: {0}")]
    InvalidSample(#[from] SampleError),
}

/// Aggregate result of one scheduler pass over every session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    pub sessions: usize,
    pub rollovers: usize,
    pub under_blinking: usize,
    pub completed: usize,
}

/// Owns every live monitoring session, one detector each.
pub struct MonitorRegistry {
    config: DetectorConfig,
    // 启动时按配置校验并构造一次，新会话从它复制
    template: BlinkDetector,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<Uuid, Arc<MonitorSession>>>,
    events: broadcast::Sender<MonitorEvent>,
    max_sessions: usize,
}

impl MonitorRegistry {
    pub fn new(
        config: DetectorConfig,
        clock: Arc<dyn Clock>,
        max_sessions: usize,
    ) -> Result<Self, ConfigError> {
        let template = BlinkDetector::new(config, Timestamp::ZERO)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            template,
            clock,
            sessions: RwLock::new(HashMap::new()),
            events,
            max_sessions,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn create_session(&self) -> Result<SessionView, MonitorError> {
        let now = self.clock.now();
        let id = Uuid::new_v4();
        let mut detector = self.template.clone();
        detector.reset(now);
        let session = Arc::new(MonitorSession::new(id, detector, now));
        let view = session.view(now).await;

        {
            let mut sessions = self.sessions.write().await;
            if sessions.len() >= self.max_sessions {
                return Err(MonitorError::TooManySessions(self.max_sessions));
            }
            sessions.insert(id, session);
        }

        tracing::info!(session_id = %id, "Monitor session started");
        Ok(view)
    }

    pub async fn session(&self, id: Uuid) -> Result<Arc<MonitorSession>, MonitorError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(MonitorError::SessionNotFound(id))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionView, MonitorError> {
        let session = self.session(id).await?;
        Ok(session.view(self.clock.now()).await)
    }

    pub async fn list(&self) -> Vec<SessionView> {
        let now = self.clock.now();
        let mut views = Vec::new();
        for session in self.handles().await {
            views.push(session.view(now).await);
        }
        views.sort_by_key(|v| v.created_at);
        views
    }

    /// Feed one measured eye-opening value; `None` means no face in the frame.
    pub async fn observe(&self, id: Uuid, value: Option<f64>) -> Result<Observation, MonitorError> {
        let session = self.session(id).await?;
        let now = self.clock.now();
        let sample = value
            .map(|v| EyeOpennessSample::new(v, now))
            .transpose()?;
        Ok(self.observe_sample(&session, sample, now).await)
    }

    /// Feed a flat face-mesh landmark array; unusable meshes count as no face.
    pub async fn observe_landmarks(
        &self,
        id: Uuid,
        points: Option<&[f64]>,
    ) -> Result<Observation, MonitorError> {
        let session = self.session(id).await?;
        let now = self.clock.now();
        let sample = match points {
            Some(points) => landmarks::sample_from_landmarks(points, now)?,
            None => None,
        };
        Ok(self.observe_sample(&session, sample, now).await)
    }

    async fn observe_sample(
        &self,
        session: &MonitorSession,
        sample: Option<EyeOpennessSample>,
        now: Timestamp,
    ) -> Observation {
        let observation = {
            let mut detector = session.detector().lock().await;
            detector.observe(sample)
        };
        session.touch(now);

        if observation.blink_detected() {
            tracing::debug!(
                session_id = %session.id(),
                window_count = observation.window_count(),
                "Blink detected"
            );
            let _ = self.events.send(MonitorEvent::Blink {
                session_id: session.id(),
                window_count: observation.window_count(),
                at: now,
            });
        }
        observation
    }

    pub async fn reset(&self, id: Uuid) -> Result<SessionView, MonitorError> {
        let session = self.session(id).await?;
        let now = self.clock.now();
        let view = {
            let mut detector = session.detector().lock().await;
            detector.reset(now);
            session.view_of(&detector, now)
        };
        session.touch(now);

        tracing::info!(session_id = %id, "Monitor session reset");
        let _ = self.events.send(MonitorEvent::SessionReset { session_id: id });
        Ok(view)
    }

    pub async fn tick(&self, id: Uuid) -> Result<Tick, MonitorError> {
        let session = self.session(id).await?;
        Ok(self.tick_session(&session, self.clock.now()).await)
    }

    /// Advance every session to the current clock time.
    pub async fn tick_all(&self) -> TickSummary {
        let now = self.clock.now();
        let mut summary = TickSummary::default();
        for session in self.handles().await {
            let tick = self.tick_session(&session, now).await;
            summary.sessions += 1;
            if let Some(rollover) = tick.rollover {
                summary.rollovers += 1;
                if rollover.is_under_blinking() {
                    summary.under_blinking += 1;
                }
            }
            if tick.just_completed {
                summary.completed += 1;
            }
        }
        summary
    }

    async fn tick_session(&self, session: &MonitorSession, now: Timestamp) -> Tick {
        let (tick, session_blinks) = {
            let mut detector = session.detector().lock().await;
            let tick = detector.tick(now);
            (tick, detector.session_blinks())
        };
        let session_id = session.id();

        if let Some(rollover) = tick.rollover {
            if rollover.is_under_blinking() {
                tracing::warn!(
                    session_id = %session_id,
                    count = rollover.count,
                    per_minute = rollover.blinks_per_minute,
                    "Blink rate below normal range"
                );
            } else {
                tracing::info!(
                    session_id = %session_id,
                    count = rollover.count,
                    rate = rollover.rate.as_str(),
                    "Blink window closed"
                );
            }
            let _ = self
                .events
                .send(MonitorEvent::WindowClosed { session_id, rollover });
        }

        if tick.just_completed {
            tracing::info!(session_id = %session_id, session_blinks, "Monitor session completed");
            let _ = self.events.send(MonitorEvent::SessionCompleted {
                session_id,
                session_blinks,
            });
        }
        tick
    }

    pub async fn windows(&self, id: Uuid) -> Result<Vec<WindowRollover>, MonitorError> {
        let session = self.session(id).await?;
        let detector = session.detector().lock().await;
        Ok(detector.windows().copied().collect())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), MonitorError> {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %id, "Monitor session removed");
                let _ = self.events.send(MonitorEvent::SessionRemoved {
                    session_id: id,
                    reason: RemovalReason::Deleted,
                });
                Ok(())
            }
            None => Err(MonitorError::SessionNotFound(id)),
        }
    }

    /// Drop sessions with no samples or resets for at least `ttl`.
    pub async fn cleanup_idle(&self, ttl: Duration) -> usize {
        let now = self.clock.now();
        let mut expired = Vec::new();
        self.sessions.write().await.retain(|id, session| {
            let keep = session.idle_for(now) < ttl;
            if !keep {
                expired.push(*id);
            }
            keep
        });

        for session_id in &expired {
            tracing::info!(session_id = %session_id, "Idle monitor session expired");
            let _ = self.events.send(MonitorEvent::SessionRemoved {
                session_id: *session_id,
                reason: RemovalReason::Idle,
            });
        }
        expired.len()
    }

    async fn handles(&self) -> Vec<Arc<MonitorSession>> {
        self.sessions.read().await.values().cloned().collect()
    }
}
