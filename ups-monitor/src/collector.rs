use std::{sync::Arc, time::Duration};

use tokio::time::{sleep, Instant};

use crate::{
    acquire::{AcquireError, Acquirer},
    config::CollectorConfig,
    store::{Store, StoreError},
};

#[derive(thiserror::Error, Debug)]
enum TickError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("snapshot carried no STATUS field")]
    MissingStatus,
}

/// Drives the poll-append cycle: one acquisition per tick, flat backoff after
/// repeated failures, retention cleanup off the hot path on a last-run guard.
pub struct Collector {
    acquirer: Arc<Acquirer>,
    store: Store,
    cfg: CollectorConfig,
    retention_days: i64,
}

impl Collector {
    pub fn new(
        acquirer: Arc<Acquirer>,
        store: Store,
        cfg: CollectorConfig,
        retention_days: u32,
    ) -> Self {
        Self {
            acquirer,
            store,
            cfg,
            retention_days: i64::from(retention_days),
        }
    }

    /// Runs until the process is stopped. A failed tick is logged and
    /// counted; it never ends the loop.
    pub async fn run(self) {
        let interval = Duration::from_secs(self.cfg.interval_secs);
        let cleanup_every = Duration::from_secs(self.cfg.cleanup_interval_secs);
        let mut failures: u32 = 0;
        let mut last_cleanup = Instant::now();

        loop {
            match self.tick(&mut last_cleanup, cleanup_every).await {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    metrics::counter!("ups_poll_failures_total").increment(1);
                    tracing::warn!(
                        error = %e,
                        attempt = failures,
                        max = self.cfg.max_failures,
                        "failed to collect UPS data"
                    );
                }
            }

            if failures >= self.cfg.max_failures {
                tracing::warn!(
                    backoff_secs = self.cfg.backoff_secs,
                    "too many consecutive failures, pausing"
                );
                sleep(Duration::from_secs(self.cfg.backoff_secs)).await;
                failures = 0;
            }

            sleep(interval).await;
        }
    }

    async fn tick(
        &self,
        last_cleanup: &mut Instant,
        cleanup_every: Duration,
    ) -> Result<(), TickError> {
        let status = self.acquirer.acquire().await?;
        if status.status.as_deref().unwrap_or("").is_empty() {
            return Err(TickError::MissingStatus);
        }

        self.store.append(&status).await?;
        tracing::info!(
            status = status.status.as_deref().unwrap_or(""),
            load_pct = status.load_pct.as_deref().unwrap_or(""),
            watts = status.watts,
            "reading stored"
        );

        // Cleanup failures are logged but do not count toward backoff; only
        // acquisition and append failures do.
        if last_cleanup.elapsed() >= cleanup_every {
            *last_cleanup = Instant::now();
            match self.store.cleanup(self.retention_days).await {
                Ok(removed) => {
                    tracing::info!(
                        removed,
                        retention_days = self.retention_days,
                        "cleaned up old readings"
                    );
                }
                Err(e) => tracing::error!(error = %e, "retention cleanup failed"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        acquire::{SimulatedTransport, Transport, TransportError},
        config::RatingConfig,
        normalize::Normalizer,
    };
    use apcupsd_client::RawStatus;
    use sqlx::sqlite::SqlitePoolOptions;
    use time::UtcOffset;

    async fn memory_store() -> Store {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Store::with_pool(pool, RatingConfig::default(), 200, UtcOffset::UTC)
            .await
            .unwrap()
    }

    fn collector(transports: Vec<Box<dyn Transport>>, store: Store) -> Collector {
        let acquirer = Arc::new(Acquirer::new(
            transports,
            Normalizer::new(RatingConfig::default(), UtcOffset::UTC),
        ));
        Collector::new(acquirer, store, CollectorConfig::default(), 7)
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Transport for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self) -> Result<RawStatus, TransportError> {
            Err(TransportError::Malformed)
        }
    }

    #[tokio::test]
    async fn a_successful_tick_appends_one_reading() {
        let store = memory_store().await;
        let collector = collector(vec![Box::new(SimulatedTransport)], store.clone());

        let mut last_cleanup = Instant::now();
        collector
            .tick(&mut last_cleanup, Duration::from_secs(1800))
            .await
            .unwrap();

        let readings = store.history(1).await.unwrap();
        let stored: Vec<_> = readings
            .iter()
            .filter(|r| r.data.get("STATUS").is_some())
            .collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data["STATUS"], "ONBATT");
    }

    #[tokio::test]
    async fn an_exhausted_acquirer_fails_the_tick() {
        let store = memory_store().await;
        let collector = collector(vec![Box::new(Failing)], store.clone());

        let mut last_cleanup = Instant::now();
        let res = collector
            .tick(&mut last_cleanup, Duration::from_secs(1800))
            .await;

        assert!(matches!(res, Err(TickError::Acquire(_))));
        assert!(store.history(1).await.unwrap().is_empty());
    }
}
