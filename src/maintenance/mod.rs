//! Background maintenance for an open store.
//!
//! Two independent periodic workers run for the lifetime of the store:
//! - space reclamation, repeated back-to-back while it keeps freeing space
//! - forced durability sync
//!
//! Failures are logged and never reach the caller.


use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::metrics;
use crate::MaintenanceConfig;
use crate::Result;

/// Engine primitives the maintenance workers drive.
#[cfg_attr(test, automock)]
pub trait MaintenanceTarget: Send + Sync + 'static {
    /// Runs one reclamation pass. `Ok(true)` means space was reclaimed and
    /// another pass may free more.
    fn reclaim(
        &self,
        ratio: f64,
    ) -> Result<bool>;

    /// Forces buffered writes to durable storage.
    fn sync(&self) -> Result<()>;
}

/// Owns the running workers. Stopping is idempotent.
pub struct MaintenanceHandle {
    shutdown_tx: watch::Sender<()>,
    workers: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Spawns the reclamation and sync workers on `runtime`.
    pub fn spawn<T: MaintenanceTarget>(
        target: Arc<T>,
        config: &MaintenanceConfig,
        runtime: &Handle,
        record_metrics: bool,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let reclaim_worker = runtime.spawn(run_reclaim_worker(
            target.clone(),
            config.reclaim_interval(),
            config.reclaim_ratio,
            config.max_reclaim_passes,
            record_metrics,
            shutdown_rx.clone(),
        ));
        let sync_worker = runtime.spawn(run_sync_worker(
            target,
            config.sync_interval(),
            record_metrics,
            shutdown_rx,
        ));

        info!(
            reclaim_interval = ?config.reclaim_interval(),
            sync_interval = ?config.sync_interval(),
            "maintenance workers started"
        );

        Self {
            shutdown_tx,
            workers: vec![reclaim_worker, sync_worker],
        }
    }

    /// Signals both workers and waits until they have exited. A pass already
    /// running on the blocking pool finishes first.
    pub async fn shutdown(&mut self) {
        self.signal();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                error!(?e, "maintenance worker ended abnormally");
            }
        }
    }

    /// Signals both workers without waiting for them.
    pub fn signal(&self) {
        // Err only means every worker is already gone
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|w| w.is_finished())
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// First tick one full period after start, then every period.
fn periodic(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run_reclaim_worker<T: MaintenanceTarget>(
    target: Arc<T>,
    period: Duration,
    ratio: f64,
    max_passes: usize,
    record_metrics: bool,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let mut interval = periodic(period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let target = target.clone();
                match tokio::task::spawn_blocking(move || run_reclaim_cycle(&*target, ratio, max_passes)).await {
                    Ok(passes) => {
                        if record_metrics {
                            metrics::RECLAIM_PASSES.inc_by(passes as u64);
                        }
                    }
                    Err(e) => error!(?e, "reclaim cycle panicked"),
                }
            }
            _ = shutdown_rx.changed() => {
                info!("reclaim worker received shutdown signal");
                break;
            }
        }
    }

    debug!("reclaim worker stopped");
}

async fn run_sync_worker<T: MaintenanceTarget>(
    target: Arc<T>,
    period: Duration,
    record_metrics: bool,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let mut interval = periodic(period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let target = target.clone();
                let synced = tokio::task::spawn_blocking(move || target.sync()).await;
                match synced {
                    Ok(Ok(())) => debug!("sync data finished"),
                    Ok(Err(e)) => {
                        error!("sync data error occurred: {:?}", e);
                        if record_metrics {
                            metrics::SYNC_FAILURES.inc();
                        }
                    }
                    Err(e) => error!(?e, "sync task panicked"),
                }
            }
            _ = shutdown_rx.changed() => {
                info!("sync worker received shutdown signal");
                break;
            }
        }
    }

    debug!("sync worker stopped");
}

/// Runs reclamation passes while they report progress, at most `max_passes`
/// productive ones. Returns the number of productive passes.
pub(crate) fn run_reclaim_cycle<T: MaintenanceTarget + ?Sized>(
    target: &T,
    ratio: f64,
    max_passes: usize,
) -> usize {
    let mut passes = 0;

    while passes < max_passes {
        match target.reclaim(ratio) {
            Ok(true) => passes += 1,
            Ok(false) => break,
            Err(e) => {
                warn!("reclaim pass failed: {:?}", e);
                break;
            }
        }
    }

    if passes == max_passes {
        debug!(passes, "reclaim cycle hit its pass limit, continuing next tick");
    }
    passes
}
