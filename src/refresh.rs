use crate::dashboard::build_dashboard;
use crate::errors::FetchError;
use crate::fetch::SheetFetcher;
use crate::models::{Dashboard, RefreshOutcome, RefreshPhase, RefreshResponse, RefreshStatus};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct Refresher {
    fetcher: SheetFetcher,
    dashboard: RwLock<Option<Dashboard>>,
    status: Mutex<RefreshStatus>,
    in_flight: AtomicBool,
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Refresher {
    pub fn new(fetcher: SheetFetcher) -> Self {
        let status = RefreshStatus {
            source: fetcher.source().kind().to_string(),
            ..RefreshStatus::default()
        };
        Self {
            fetcher,
            dashboard: RwLock::new(None),
            status: Mutex::new(status),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn dashboard(&self) -> Option<Dashboard> {
        self.dashboard.read().await.clone()
    }

    pub async fn status(&self) -> RefreshStatus {
        let mut status = self.status.lock().await.clone();
        status.phase = if self.in_flight.load(Ordering::Acquire) {
            RefreshPhase::Fetching
        } else {
            RefreshPhase::Idle
        };
        status
    }

    fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(&self.in_flight))
    }

    /// Runs one refresh cycle. A failure keeps the previously published dashboard.
    pub async fn refresh_once(&self) -> RefreshResponse {
        let Some(_guard) = self.try_begin() else {
            let mut status = self.status.lock().await;
            status.skipped += 1;
            warn!("refresh already in flight, skipping this tick");
            return RefreshResponse {
                outcome: RefreshOutcome::Skipped,
                error: None,
            };
        };

        {
            let mut status = self.status.lock().await;
            status.cycles += 1;
        }

        let result = self.run_pipeline().await;

        let mut status = self.status.lock().await;
        match result {
            Ok(()) => {
                status.successes += 1;
                status.last_success_at = Some(Utc::now().to_rfc3339());
                status.last_error = None;
                RefreshResponse {
                    outcome: RefreshOutcome::Updated,
                    error: None,
                }
            }
            Err(err) => {
                error!("refresh from {} source failed: {err}", status.source);
                status.failures += 1;
                status.last_failure_at = Some(Utc::now().to_rfc3339());
                status.last_error = Some(err.to_string());
                RefreshResponse {
                    outcome: RefreshOutcome::Failed,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn run_pipeline(&self) -> Result<(), FetchError> {
        let data = self.fetcher.fetch().await?;
        let dashboard = build_dashboard(data);
        if dashboard.defaulted_fields > 0 {
            warn!(
                "{} fields defaulted to zero or empty across {} records",
                dashboard.defaulted_fields, dashboard.record_count
            );
        }
        info!("dashboard refreshed with {} records", dashboard.record_count);
        *self.dashboard.write().await = Some(dashboard);
        Ok(())
    }
}

/// Owns the repeating refresh task. Dropping it also ends the task, without waiting.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Ticks once immediately, then every `period`.
    pub fn start(refresher: Arc<Refresher>, period: Duration) -> Self {
        let (shutdown, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut cycles = JoinSet::new();

            info!("refresh scheduler started, every {}s", period.as_secs_f64());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let refresher = Arc::clone(&refresher);
                        cycles.spawn(async move {
                            refresher.refresh_once().await;
                        });
                    }
                    Some(_) = cycles.join_next(), if !cycles.is_empty() => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            cycles.shutdown().await;
            info!("refresh scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Stops ticking and aborts a cycle that is still in flight.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            error!("refresh scheduler task failed: {err}");
        }
    }
}
