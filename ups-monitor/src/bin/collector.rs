use std::sync::Arc;

use anyhow::Result;
use time::UtcOffset;
use ups_monitor::{
    acquire::Acquirer, collector::Collector, config::AppConfig, observability, store::Store,
};

fn main() -> Result<()> {
    let cfg = AppConfig::load()?;
    observability::init_tracing(cfg.debug);

    // Capture the local offset before the runtime spawns worker threads, as
    // in the API server binary.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cfg, offset))
}

async fn run(cfg: AppConfig, offset: UtcOffset) -> Result<()> {
    tracing::info!("starting UPS data collector");

    if let Some(metrics_cfg) = &cfg.metrics {
        observability::serve_metrics(&metrics_cfg.bind_addr)?;
    }

    let store = Store::connect(&cfg.store, cfg.rating.clone(), offset).await?;
    let acquirer = Arc::new(Acquirer::from_config(&cfg, offset));

    Collector::new(acquirer, store, cfg.collector.clone(), cfg.store.retention_days)
        .run()
        .await;

    Ok(())
}
