use crate::monitor::MonitorRegistry;

pub async fn run(monitor: &MonitorRegistry) {
    let summary = monitor.tick_all().await;
    if summary.rollovers > 0 || summary.completed > 0 {
        tracing::info!(
            sessions = summary.sessions,
            rollovers = summary.rollovers,
            under_blinking = summary.under_blinking,
            completed = summary.completed,
            "session_tick: done"
        );
    } else {
        tracing::trace!(sessions = summary.sessions, "session_tick: idle");
    }
}
