//! Shared helpers for integration tests.

use plant_service::config::PlantConfig;
use plant_service::services::AiGateway;
use plant_service::startup::Application;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the application on a random port with the given gateway and return
/// the port number. `None` spawns the unconfigured gateway.
pub async fn spawn_app(gateway: Option<Arc<AiGateway>>) -> u16 {
    spawn_app_with_env(gateway, &[]).await
}

/// Like [`spawn_app`] but with extra environment overrides applied after the
/// test defaults, for tests that tighten a limit.
pub async fn spawn_app_with_env(
    gateway: Option<Arc<AiGateway>>,
    overrides: &[(&str, &str)],
) -> u16 {
    std::env::set_var("ENVIRONMENT", "test");
    std::env::set_var("APP__PORT", "0"); // Random port
    std::env::set_var("GEMINI_API_KEY", "");
    std::env::set_var("GEMINI_MODEL", "gemini-2.0-flash");
    std::env::set_var("RATE_LIMIT_PER_MINUTE", "10000");

    for (key, value) in overrides {
        std::env::set_var(key, value);
    }

    let config = PlantConfig::load().expect("Failed to load config");

    let gateway = gateway.unwrap_or_else(|| Arc::new(AiGateway::unconfigured()));
    let app = Application::build_with_gateway(config, gateway)
        .await
        .expect("Failed to build application");

    let port = app.port();

    // Spawn the server in the background
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    port
}
