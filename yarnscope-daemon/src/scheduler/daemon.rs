//! Dispatch daemon
//!
//! The single control loop of the monitor. Each cycle re-resolves the active
//! ResourceManager, refreshes the credential, polls one trailing window,
//! merges the retry backlog behind the fresh jobs, submits everything to the
//! worker pool, and paces itself so that cycle starts are a fixed interval
//! apart regardless of how long a cycle took.
//!
//! Failure policy per cycle: a poll failure abandons the cycle without
//! advancing the watermark and retries after the retry interval; a total
//! endpoint-resolution failure is an unrecoverable configuration error and
//! terminates the daemon. An expired cluster login surfaces as an
//! authentication error on the poll itself and is handled like any other
//! cycle-transient failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{debug, error, info};
use yarnscope_client::ResourceManagerClient;
use yarnscope_core::domain::AnalyticJob;

use crate::auth::TokenManager;
use crate::backlog::RetryBacklog;
use crate::config::Config;
use crate::resolver::{DiscoveryStrategy, EndpointResolver, ShellCommandRunner};
use crate::scheduler::worker::{self, WorkerContext};
use crate::service::{Analyzer, MetricsSink, ResultStore};
use crate::source::JobSource;

/// Delay between submissions while the daemon is still catching up after
/// process start, to avoid a REST-request burst against the history servers
/// when a large backlog of pre-existing jobs is dispatched at once.
const STARTUP_SUBMIT_THROTTLE: Duration = Duration::from_millis(1000);

/// The dispatch control loop and its worker pool.
pub struct DispatchDaemon {
    config: Config,
    client: Arc<ResourceManagerClient>,
    resolver: EndpointResolver,
    tokens: TokenManager,
    source: JobSource,
    backlog: Arc<RetryBacklog>,
    metrics: Arc<dyn MetricsSink>,
    worker_ctx: Arc<WorkerContext>,
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
    stop: watch::Receiver<bool>,
    /// Daemon start, millisecond epoch. Jobs that started after this instant
    /// mean the poller has caught up with the live cluster.
    started_at_ms: i64,
    /// True until the end of the first successful cycle.
    starting_up: bool,
    /// Set once the first post-startup job that started after the daemon
    /// itself is dispatched.
    caught_up_logged: bool,
}

impl DispatchDaemon {
    /// Builds the daemon, validating the configuration.
    ///
    /// A worker pool below 1 or a missing endpoint configuration fails here,
    /// before any cycle runs.
    pub fn new(
        config: Config,
        client: Arc<ResourceManagerClient>,
        analyzer: Arc<dyn Analyzer>,
        store: Arc<dyn ResultStore>,
        metrics: Arc<dyn MetricsSink>,
        stop: watch::Receiver<bool>,
    ) -> Result<Self> {
        config.validate().context("invalid daemon configuration")?;

        let strategy = if config.ha_enabled {
            DiscoveryStrategy::HaProbe(config.ha_candidates.clone())
        } else {
            DiscoveryStrategy::Fixed(
                config
                    .resource_manager_address
                    .clone()
                    .unwrap_or_default(),
            )
        };
        let resolver = EndpointResolver::new(
            strategy,
            config.discovery_command.clone(),
            Box::new(ShellCommandRunner),
        );

        let backlog = Arc::new(RetryBacklog::new());
        let source = JobSource::new(Arc::clone(&client), Arc::clone(&store), config.fetch_lag);
        let tokens = TokenManager::new(config.token_renewal_base);
        let semaphore = Arc::new(Semaphore::new(config.worker_count));
        let worker_ctx = Arc::new(WorkerContext {
            analyzer,
            store,
            metrics: Arc::clone(&metrics),
            backlog: Arc::clone(&backlog),
            max_retries: config.max_job_retries,
            pending: AtomicUsize::new(0),
        });

        Ok(Self {
            config,
            client,
            resolver,
            tokens,
            source,
            backlog,
            metrics,
            worker_ctx,
            semaphore,
            tasks: JoinSet::new(),
            stop,
            started_at_ms: 0,
            starting_up: true,
            caught_up_logged: false,
        })
    }

    /// Runs the dispatch loop until the stop signal is raised.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting dispatch daemon (fetch interval {:?}, retry interval {:?}, {} workers)",
            self.config.fetch_interval, self.config.retry_interval, self.config.worker_count
        );
        self.started_at_ms = Utc::now().timestamp_millis();
        self.starting_up = true;

        loop {
            if *self.stop.borrow() {
                break;
            }
            let cycle_start = Instant::now();
            self.reap_finished_tasks();

            let now_ms = Utc::now().timestamp_millis();
            self.tokens.ensure_fresh(now_ms);

            // Resolution probes are authenticated, hence the renewal check
            // above. A total resolution failure is fatal, not transient.
            let endpoint = self
                .resolver
                .resolve(self.client.as_ref(), self.tokens.token())
                .await
                .context("cannot determine an active ResourceManager endpoint")?;

            let window = self.source.next_window(now_ms);
            let fresh = match self
                .source
                .poll_new_jobs(&endpoint, self.tokens.token(), &window)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!("Error fetching job list, trying again later: {}", e);
                    // Watermark unchanged: the same window is retried.
                    self.pace(cycle_start, self.config.retry_interval).await;
                    continue;
                }
            };
            self.source.commit(&window);

            // Fresh jobs are dispatched ahead of retries.
            let mut batch = fresh;
            batch.extend(self.backlog.drain_all());
            self.metrics.set_retry_queue_size(self.backlog.len());

            self.dispatch_batch(batch).await;

            self.starting_up = false;
            self.pace(cycle_start, self.config.fetch_interval).await;
        }

        info!("Stop signal received, cancelling worker tasks");
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        info!("Dispatch daemon terminated");
        Ok(())
    }

    /// Submits a merged cycle batch to the worker pool, in order.
    ///
    /// While the daemon is still catching up (first successful cycle after
    /// process start) a fixed delay is inserted between submissions; from the
    /// second cycle on, submission is unthrottled for the rest of the process
    /// lifetime.
    async fn dispatch_batch(&mut self, batch: Vec<AnalyticJob>) {
        if !batch.is_empty() {
            info!("Dispatching {} job(s) to the worker pool", batch.len());
        }
        for job in batch {
            let caught_up = job.started_time >= self.started_at_ms;
            self.dispatch(job);
            if self.starting_up {
                time::sleep(STARTUP_SUBMIT_THROTTLE).await;
            } else if caught_up && !self.caught_up_logged {
                self.caught_up_logged = true;
                info!("Analysis dispatch has caught up with live cluster time");
            }
        }
    }

    /// Submits one job to the worker pool.
    ///
    /// The task queues behind the pool semaphore, so submission never blocks
    /// the daemon thread; the pending gauge tracks jobs not yet picked up.
    fn dispatch(&mut self, job: AnalyticJob) {
        let ctx = Arc::clone(&self.worker_ctx);
        let semaphore = Arc::clone(&self.semaphore);

        let queued = ctx.pending.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.set_submission_queue_size(queued);

        self.tasks.spawn(async move {
            // Err only when the semaphore is closed, which never happens
            // before abort_all tears the task down.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let queued = ctx.pending.fetch_sub(1, Ordering::SeqCst) - 1;
            ctx.metrics.set_submission_queue_size(queued);

            worker::process_job(job, &ctx).await;
        });
    }

    /// Sleeps so the next cycle starts `interval` after `cycle_start`.
    /// Already overran the interval: no sleep, no catch-up burst.
    async fn pace(&mut self, cycle_start: Instant, interval: Duration) {
        let deadline = cycle_start + interval;
        tokio::select! {
            _ = time::sleep_until(deadline) => {}
            _ = self.stop.changed() => {}
        }
    }

    /// Releases bookkeeping for worker tasks that have already finished.
    fn reap_finished_tasks(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{AtomicMetrics, ElapsedTimeAnalyzer, InMemoryResultStore};
    use yarnscope_core::domain::ApplicationType;

    fn collaborators() -> (
        Arc<ResourceManagerClient>,
        Arc<dyn Analyzer>,
        Arc<dyn ResultStore>,
        Arc<dyn MetricsSink>,
    ) {
        (
            Arc::new(ResourceManagerClient::new()),
            Arc::new(ElapsedTimeAnalyzer),
            Arc::new(InMemoryResultStore::new()),
            Arc::new(AtomicMetrics::new()),
        )
    }

    // The sender must outlive the daemon: a dropped stop channel reads as a
    // stop notification inside pace().
    fn daemon() -> (DispatchDaemon, watch::Sender<bool>) {
        let (client, analyzer, store, metrics) = collaborators();
        let (tx, rx) = watch::channel(false);
        let daemon =
            DispatchDaemon::new(Config::default(), client, analyzer, store, metrics, rx).unwrap();
        (daemon, tx)
    }

    fn job(app_id: &str, started_time: i64) -> AnalyticJob {
        AnalyticJob {
            app_id: app_id.to_string(),
            app_type: ApplicationType::Spark,
            user: "etl".to_string(),
            name: "nightly".to_string(),
            queue: "default".to_string(),
            tracking_url: None,
            started_time,
            finished_time: started_time + 4_000,
            retries: 0,
        }
    }

    #[tokio::test]
    async fn test_zero_worker_pool_fails_before_any_cycle() {
        let (client, analyzer, store, metrics) = collaborators();
        let (_tx, rx) = watch::channel(false);

        let mut config = Config::default();
        config.worker_count = 0;

        let daemon = DispatchDaemon::new(config, client, analyzer, store, metrics, rx);
        assert!(daemon.is_err());
    }

    #[tokio::test]
    async fn test_stop_signal_terminates_loop_without_polling() {
        let (client, analyzer, store, metrics) = collaborators();
        let (tx, rx) = watch::channel(false);

        let mut daemon =
            DispatchDaemon::new(Config::default(), client, analyzer, store, metrics, rx).unwrap();

        tx.send(true).unwrap();
        daemon.run().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_anchors_next_cycle_to_cycle_start() {
        let (mut daemon, _tx) = daemon();
        let cycle_start = Instant::now();

        // A cycle that took 10 s still yields a 60 s start-to-start gap.
        time::advance(Duration::from_secs(10)).await;
        daemon.pace(cycle_start, Duration::from_secs(60)).await;

        assert_eq!(Instant::now() - cycle_start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_after_overrun_skips_sleep() {
        let (mut daemon, _tx) = daemon();
        let cycle_start = Instant::now();

        // Cycle overran the interval; the next one starts immediately and
        // no shortened sleeps are inserted to make up lost ground.
        time::advance(Duration::from_secs(90)).await;
        let before = Instant::now();
        daemon.pace(cycle_start, Duration::from_secs(60)).await;

        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_throttle_applies_only_while_starting_up() {
        let (mut daemon, _tx) = daemon();
        daemon.started_at_ms = 1_000_000;

        let before = Instant::now();
        daemon
            .dispatch_batch(vec![job("app-1", 0), job("app-2", 0), job("app-3", 0)])
            .await;
        assert_eq!(Instant::now() - before, STARTUP_SUBMIT_THROTTLE * 3);

        // End of the first successful cycle: throttle off for good.
        daemon.starting_up = false;
        let before = Instant::now();
        daemon
            .dispatch_batch(vec![job("app-4", 0), job("app-5", 0)])
            .await;
        assert_eq!(Instant::now() - before, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caught_up_notice_fires_once() {
        let (mut daemon, _tx) = daemon();
        daemon.started_at_ms = 1_000_000;
        daemon.starting_up = false;

        // A job older than the daemon does not count as caught up.
        daemon.dispatch_batch(vec![job("app-1", 999_999)]).await;
        assert!(!daemon.caught_up_logged);

        daemon.dispatch_batch(vec![job("app-2", 1_000_000)]).await;
        assert!(daemon.caught_up_logged);

        // Later live jobs leave the latch set instead of re-announcing.
        daemon.dispatch_batch(vec![job("app-3", 2_000_000)]).await;
        assert!(daemon.caught_up_logged);
    }
}
