use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::state::{PollOutcome, PollerConfig, PollerState, StatusView};
use crate::api::ProvisioningApi;
use crate::error::Result;
use crate::model::{ProvisioningRecord, ProvisioningStatus};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Keeps one store's provisioning record fresh while the backend job is running.
///
/// The poller only reads. Stopping it never affects the job itself.
pub struct ProvisioningPoller<A: ProvisioningApi> {
    api: Arc<A>,
    store_id: String,
    config: PollerConfig,
    state: PollerState,
}

impl<A: ProvisioningApi> ProvisioningPoller<A> {
    pub fn new(api: Arc<A>, store_id: impl Into<String>, config: PollerConfig) -> Self {
        Self {
            api,
            store_id: store_id.into(),
            config,
            state: PollerState::new(),
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.config.auto_refresh = enabled;
    }

    /// Fetch the record once.
    ///
    /// A 404 becomes [`StatusView::NotActivated`]. Any other failure is kept in
    /// `last_error` and the previous view stays on screen. A 401 also sets
    /// `needs_login`, which ends auto-refresh.
    pub async fn refresh(&mut self) -> &StatusView {
        self.state.fetch_count += 1;

        match self.api.get_provisioning_status(&self.store_id).await {
            Ok(Some(record)) => {
                self.state.last_error = None;
                self.state.needs_login = false;
                self.observe(record);
            }
            Ok(None) => {
                self.state.last_error = None;
                self.state.needs_login = false;
                info!(store_id = %self.store_id, "merchant has not been activated");
                self.state.view = StatusView::NotActivated;
            }
            Err(e) => {
                if e.is_unauthorized() {
                    warn!(store_id = %self.store_id, "session rejected, stopping status refresh");
                    self.state.needs_login = true;
                } else {
                    error!(store_id = %self.store_id, error = %e, "failed to fetch provisioning status");
                }
                self.state.last_error = Some(e.to_string());
            }
        }

        &self.state.view
    }

    /// Auto-refresh is on, the session is valid and the last known status is still moving.
    pub fn should_poll(&self) -> bool {
        self.config.auto_refresh
            && !self.state.needs_login
            && matches!(
                self.state.view.status(),
                Some(ProvisioningStatus::Pending | ProvisioningStatus::InProgress)
            )
    }

    /// Re-trigger a failed job, then read the record again.
    ///
    /// The read that follows a successful retry replaces whatever was shown before,
    /// even when it has fewer steps complete. A failed retry leaves the view as it was.
    pub async fn retry(&mut self) -> Result<()> {
        self.state.retrying = true;
        info!(store_id = %self.store_id, "retrying provisioning");

        if let Err(e) = self.api.retry_provisioning(&self.store_id).await {
            error!(store_id = %self.store_id, error = %e, "retry failed");
            self.state.needs_login = e.is_unauthorized();
            self.state.last_error = Some(e.to_string());
            self.state.retrying = false;
            return Err(e);
        }

        self.refresh().await;
        self.state.retrying = false;
        Ok(())
    }

    /// Fetch once, then keep fetching on the configured interval until the job is
    /// terminal, auto-refresh is off, or `shutdown` flips to `true`.
    ///
    /// `on_update` sees the state after every fetch.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_update: F) -> PollOutcome
    where
        F: FnMut(&PollerState),
    {
        if *shutdown.borrow() {
            return PollOutcome::Stopped;
        }

        self.refresh().await;
        on_update(&self.state);

        let mut ticker = tokio::time::interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        while self.should_poll() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(store_id = %self.store_id, "status polling stopped");
                        return PollOutcome::Stopped;
                    }
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                    on_update(&self.state);
                }
            }
        }

        let outcome = self.outcome();
        debug!(store_id = %self.store_id, ?outcome, fetches = self.state.fetch_count, "poll loop finished");
        outcome
    }

    /// Run the poll loop on its own task.
    pub fn spawn(self) -> PollHandle
    where
        A: 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (view_tx, view_rx) = watch::channel(self.state.view.clone());

        let mut poller = self;
        let task = tokio::spawn(async move {
            poller
                .run(stop_rx, |state| {
                    view_tx.send_replace(state.view.clone());
                })
                .await
        });

        PollHandle {
            view: view_rx,
            stop: stop_tx,
            task: Some(task),
        }
    }

    fn outcome(&self) -> PollOutcome {
        if self.state.needs_login {
            return PollOutcome::Unauthorized;
        }
        match &self.state.view {
            StatusView::Record(record) if record.status.is_terminal() => {
                PollOutcome::Terminal(record.status)
            }
            StatusView::Record(_) => PollOutcome::Paused,
            StatusView::NotActivated => PollOutcome::NotActivated,
            StatusView::Loading => PollOutcome::Unavailable,
        }
    }

    fn observe(&mut self, record: ProvisioningRecord) {
        let flags = record.flags();
        let mut issues = Vec::new();

        if !flags.is_causally_ordered() {
            issues.push(format!(
                "step flags out of order in {} record: {:?}",
                record.status, flags
            ));
        }

        // A retry or rollback legitimately resets progress.
        if !self.state.retrying && record.status != ProvisioningStatus::Rollback {
            if let Some(previous) = self.state.view.record() {
                if flags.regresses_from(&previous.flags()) {
                    issues.push(format!(
                        "step flags regressed from {} to {} complete without a rollback",
                        previous.flags().completed_count(),
                        flags.completed_count()
                    ));
                }
                if previous.status.is_active()
                    && record.completion_percent < previous.completion_percent
                {
                    issues.push(format!(
                        "completion went backwards from {}% to {}%",
                        previous.completion_percent, record.completion_percent
                    ));
                }
            }
        }

        for message in issues {
            self.warn_read(message);
        }

        debug!(
            store_id = %self.store_id,
            status = %record.status,
            percent = record.completion_percent,
            step = %record.current_step,
            "provisioning status"
        );
        self.state.view = StatusView::Record(record);
    }

    fn warn_read(&mut self, message: String) {
        warn!(store_id = %self.store_id, "{}", message);
        self.state.warnings.push(message);
    }
}

/// Handle to a spawned poll loop. Dropping it stops the loop.
pub struct PollHandle {
    view: watch::Receiver<StatusView>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    /// Receiver that changes after every fetch.
    pub fn subscribe(&self) -> watch::Receiver<StatusView> {
        self.view.clone()
    }

    pub fn current(&self) -> StatusView {
        self.view.borrow().clone()
    }

    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the loop to return. `None` if the task panicked or was aborted.
    pub async fn join(mut self) -> Option<PollOutcome> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
