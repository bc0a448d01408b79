use std::time::Duration;

use crate::config::PollingConfig;
use crate::model::{ProvisioningRecord, ProvisioningStatus};

/// What the status view currently shows for one store.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusView {
    /// Nothing fetched yet.
    Loading,
    /// The backend has no provisioning record for the store (HTTP 404).
    NotActivated,
    Record(ProvisioningRecord),
}

impl StatusView {
    pub fn record(&self) -> Option<&ProvisioningRecord> {
        match self {
            StatusView::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<ProvisioningStatus> {
        self.record().map(|r| r.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.status().map_or(false, ProvisioningStatus::is_terminal)
    }
}

impl Default for StatusView {
    fn default() -> Self {
        StatusView::Loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub auto_refresh: bool,
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        PollerConfig {
            auto_refresh: config.auto_refresh,
            interval: config.interval(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollerState {
    pub view: StatusView,

    // Last fetch or retry failure. The view keeps showing the previous read.
    pub last_error: Option<String>,

    // Out-of-order reads noticed while polling
    pub warnings: Vec<String>,

    pub fetch_count: u32,
    pub retrying: bool,

    // The session was rejected; nothing is fetched again until the operator logs in.
    pub needs_login: bool,
}

impl PollerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Retry is only offered for a failed job.
    pub fn can_retry(&self) -> bool {
        self.view.status() == Some(ProvisioningStatus::Failed) && !self.retrying
    }
}

/// Why a poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal(ProvisioningStatus),
    NotActivated,
    /// The job is still running but auto-refresh is off.
    Paused,
    /// No record could be read at all.
    Unavailable,
    /// The backend rejected the session (HTTP 401).
    Unauthorized,
    /// The caller asked the loop to stop.
    Stopped,
}
