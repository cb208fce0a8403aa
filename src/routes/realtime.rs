use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::extractors::SessionId;
use crate::monitor::MonitorEvent;
use crate::response::AppError;
use crate::state::AppState;

static SSE_CONNECTION_COUNT: AtomicUsize = AtomicUsize::new(0);

struct SseGuard;
impl Drop for SseGuard {
    fn drop(&mut self) {
        SSE_CONNECTION_COUNT.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sessions/:id/events", get(sse_handler))
}

pub async fn sse_handler(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // 先订阅再取快照，两者之间发布的事件不会丢失
    let mut events = state.monitor().subscribe();
    let initial = state.monitor().snapshot(session_id).await?;
    let initial = serde_json::to_string(&initial).map_err(|e| AppError::internal(&e.to_string()))?;

    let max_sse = state.config().limits.max_sse_connections;
    let current = SSE_CONNECTION_COUNT.fetch_add(1, Ordering::SeqCst);
    if current >= max_sse {
        SSE_CONNECTION_COUNT.fetch_sub(1, Ordering::SeqCst);
        return Err(AppError::too_many_requests(
            "RATE_LIMITED",
            "Too many SSE connections",
        ));
    }

    let guard = SseGuard;
    let mut shutdown_rx = state.shutdown_rx();

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok(Event::default().event("snapshot").data(initial));

        loop {
            tokio::select! {
                received = events.recv() => {
                    match received {
                        Ok(event) if event.session_id() == session_id => {
                            let removed = matches!(event, MonitorEvent::SessionRemoved { .. });
                            if let Ok(json) = serde_json::to_string(&event) {
                                yield Ok(Event::default().event(event.name()).data(json));
                            }
                            if removed {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(session_id = %session_id, skipped, "SSE subscriber lagged");
                            // 丢失的事件里可能包含会话移除
                            if state.monitor().session(session_id).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
