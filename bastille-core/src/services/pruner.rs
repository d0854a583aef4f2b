//! Retention pruning for attempt logs and resolved lock records.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::Error;
use crate::config::PruneConfig;
use crate::repositories::{
    AttemptLogRepository, AttemptLogRepositoryProvider, LockRepository, LockRepositoryProvider,
    RepositoryProvider,
};

/// Outcome of a pruning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub attempt_logs_deleted: u64,
    pub lock_records_deleted: u64,
    /// True when pruning is disabled and nothing was touched.
    pub skipped: bool,
}

/// Deletes expired audit history per the retention policy.
///
/// Attempt logs are pruned by age alone. Lock records are pruned only once
/// resolved — explicitly unlocked before the cutoff, or expired before it.
/// An active, never-expiring lock is retained forever.
pub struct PrunerService<R: RepositoryProvider> {
    repositories: Arc<R>,
    config: PruneConfig,
}

impl<R: RepositoryProvider> PrunerService<R> {
    pub fn new(repositories: Arc<R>, config: PruneConfig) -> Self {
        Self {
            repositories,
            config,
        }
    }

    pub fn config(&self) -> &PruneConfig {
        &self.config
    }

    /// Delete attempt log entries older than the configured retention.
    pub async fn prune_attempt_logs(&self) -> Result<u64, Error> {
        let cutoff = Utc::now() - Duration::days(self.config.attempt_logs_days);
        self.repositories.attempt_logs().prune_before(cutoff).await
    }

    /// Delete resolved lock records older than the configured retention.
    pub async fn prune_lock_records(&self) -> Result<u64, Error> {
        let cutoff = Utc::now() - Duration::days(self.config.lock_records_days);
        self.repositories.locks().prune_before(cutoff).await
    }

    /// Run both pruning operations.
    ///
    /// When pruning is disabled by configuration this is a no-op that reports
    /// success with `skipped = true`.
    pub async fn run(&self) -> Result<PruneReport, Error> {
        if !self.config.enabled {
            tracing::info!("Pruning is disabled via configuration");
            return Ok(PruneReport {
                skipped: true,
                ..PruneReport::default()
            });
        }

        let attempt_logs_deleted = self.prune_attempt_logs().await?;
        let lock_records_deleted = self.prune_lock_records().await?;

        tracing::info!(
            attempt_logs = attempt_logs_deleted,
            lock_records = lock_records_deleted,
            "Pruned expired lockout history"
        );

        Ok(PruneReport {
            attempt_logs_deleted,
            lock_records_deleted,
            skipped: false,
        })
    }

    /// Spawn a background task that prunes once per day.
    ///
    /// The task stops when the shutdown receiver signals. Prune failures are
    /// logged and the task keeps running.
    pub fn start_prune_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repositories = Arc::clone(&self.repositories);
        let config = self.config.clone();

        const PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(24 * 3600);

        tokio::spawn(async move {
            let pruner = PrunerService::new(repositories, config);
            let mut interval_timer = tokio::time::interval(PRUNE_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        if let Err(e) = pruner.run().await {
                            tracing::warn!(error = %e, "Scheduled pruning failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down lockout pruning task");
                        break;
                    }
                }
            }
        })
    }
}
