use std::time::Duration;

use crate::monitor::MonitorRegistry;

pub async fn run(monitor: &MonitorRegistry, idle_ttl: Duration) {
    tracing::debug!("session_cleanup: start");
    let cleaned = monitor.cleanup_idle(idle_ttl).await;
    tracing::info!(cleaned, "session_cleanup: done");
}
