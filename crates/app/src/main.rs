mod editors;
mod newspapers;
mod problem;
mod router;
mod seed;
mod subscribers;
mod telemetry;

use std::net::SocketAddr;

use tracing::{info, warn};

use presshub_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let state = router::AppState::new(metrics);
    if config.environment.is_development() && config.seed_demo {
        match seed::seed_demo_data(&mut state.write()) {
            Ok(()) => info!(stage = "seed", "demo fixtures loaded"),
            Err(err) => warn!(stage = "seed", %err, "demo fixtures skipped"),
        }
    }

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
