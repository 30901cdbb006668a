use std::sync::Arc;

use anyhow::Result;
use time::UtcOffset;
use ups_monitor::{
    acquire::Acquirer,
    api::{self, ApiState},
    config::AppConfig,
    observability,
    store::Store,
};

fn main() -> Result<()> {
    let cfg = AppConfig::load()?;
    observability::init_tracing(cfg.debug);

    // The platform refuses to report the local offset once the runtime has
    // spawned worker threads, so capture it before starting tokio.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cfg, offset))
}

async fn run(cfg: AppConfig, offset: UtcOffset) -> Result<()> {
    if let Some(metrics_cfg) = &cfg.metrics {
        observability::serve_metrics(&metrics_cfg.bind_addr)?;
    }

    let store = Store::connect(&cfg.store, cfg.rating.clone(), offset).await?;
    let acquirer = Arc::new(Acquirer::from_config(&cfg, offset));

    let app = api::router(ApiState { store, acquirer });
    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "serving UPS monitor API");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
