//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use logpaste_server::{
    config::RateLimitConfig, create_app, AppState, Config, Database, ManualClock, MemoryBackend,
};
use std::sync::Arc;

/// 2024-01-01T00:00:00Z.
const T0_MILLIS: i64 = 1_704_067_200_000;

pub(crate) struct TestApp {
    pub server: TestServer,
    pub clock: Arc<ManualClock>,
    pub db: Arc<Database>,
}

pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        db_path: String::from("/unused/in-memory"),
        ..Config::default()
    }
}

pub(crate) fn test_app_for_config(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::at_millis(T0_MILLIS));
    let db = Database::new(
        Arc::new(MemoryBackend::new()),
        clock.clone(),
        config.rate_limit,
    );
    let state = AppState::new(config, db);
    let db = state.db.clone();
    let app = create_app(state, false);
    let server = TestServer::new(app).expect("server");
    TestApp { server, clock, db }
}

pub(crate) fn setup_test_app() -> TestApp {
    test_app_for_config(test_config())
}

pub(crate) fn setup_test_app_with_limits(window_ms: u64, max_requests: u32) -> TestApp {
    test_app_for_config(Config {
        rate_limit: RateLimitConfig {
            window_ms,
            max_requests,
        },
        ..test_config()
    })
}
