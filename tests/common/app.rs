use std::sync::Arc;

use axum::Router;
use tokio::sync::broadcast;

use blink_detector::DetectorConfig;
use blink_monitor::clock::ManualClock;
use blink_monitor::config::{Config, LimitsConfig, WorkerConfig};
use blink_monitor::monitor::MonitorRegistry;
use blink_monitor::routes::build_router;
use blink_monitor::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub shutdown_tx: broadcast::Sender<()>,
}

fn test_config(max_sessions: usize) -> Config {
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        detector: DetectorConfig::default(),
        worker: WorkerConfig {
            is_leader: false,
            ..WorkerConfig::default()
        },
        limits: LimitsConfig {
            max_sessions,
            ..LimitsConfig::default()
        },
    }
}

pub fn spawn_with_limits(max_sessions: usize) -> TestApp {
    let config = test_config(max_sessions);
    let clock = Arc::new(ManualClock::new());
    let monitor = Arc::new(
        MonitorRegistry::new(config.detector, clock.clone(), config.limits.max_sessions)
            .expect("valid detector config"),
    );
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(monitor, &config, shutdown_tx.clone());
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        clock,
        shutdown_tx,
    }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with_limits(16)
}
