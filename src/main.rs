use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use nomnom_radar::config::RoutingConfig;
use nomnom_radar::routing::{ChEngine, RoutingFacade};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")).unwrap();
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = RoutingConfig::from_env();
    info!(
        target: "nomnom_radar",
        "nomnom-radar starting: RUST_LOG='{}', routing_enabled={}, data_path='{}', workers={}",
        rust_log, config.enabled, config.data_path, config.one_to_many_workers
    );

    let engine = ChEngine::new(config.clone());
    if config.enabled {
        match engine.load_data(&config.data_path) {
            Ok(()) => info!(target: "nomnom_radar", "routing graph loaded from '{}'", config.data_path),
            Err(e) => info!(target: "nomnom_radar", "routing graph not loaded ({e}); facade will fall back to haversine"),
        }
    }
    let facade = RoutingFacade::new(engine, config);
    info!(target: "nomnom_radar", "routing facade ready={}", facade.is_ready());

    Ok(())
}
