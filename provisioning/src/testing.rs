//! Scripted [`ProvisioningApi`] double shared by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::api::ProvisioningApi;
use crate::error::{AdminApiError, Result};
use crate::model::{
    ActivationConfig, ActivationReceipt, Deployment, ErrorLog, Plan, ProvisioningRecord,
    ProvisioningStatus, StoreSummary, Theme,
};

#[derive(Debug, Clone)]
pub enum StatusReply {
    Record(ProvisioningRecord),
    NotFound,
    Error(u16, String),
}

#[derive(Default)]
pub struct ScriptedApi {
    pub themes: Vec<Theme>,
    pub plans: Vec<Plan>,
    pub catalog_error: Option<String>,
    pub activate_delay: Duration,
    pub activate_error: Option<String>,
    pub retry_error: Option<String>,
    pub statuses: Mutex<VecDeque<StatusReply>>,
    pub last_status: Mutex<Option<StatusReply>>,
    pub calls: Mutex<Vec<String>>,
    pub activations: Mutex<Vec<ActivationConfig>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(themes: &[&str], plans: &[&str]) -> Self {
        Self {
            themes: themes.iter().map(|id| theme(id)).collect(),
            plans: plans.iter().map(|id| plan(id)).collect(),
            ..Self::default()
        }
    }

    /// Queue status replies. The most recent reply keeps repeating once the queue is drained.
    pub fn push_status(&self, reply: StatusReply) {
        self.statuses.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn activations(&self) -> Vec<ActivationConfig> {
        self.activations.lock().unwrap().clone()
    }

    fn record_call(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

#[async_trait]
impl ProvisioningApi for ScriptedApi {
    async fn get_themes(&self) -> Result<Vec<Theme>> {
        self.record_call("get_themes");
        match &self.catalog_error {
            Some(message) => Err(request_error(500, message)),
            None => Ok(self.themes.clone()),
        }
    }

    async fn get_plans(&self) -> Result<Vec<Plan>> {
        self.record_call("get_plans");
        Ok(self.plans.clone())
    }

    async fn activate_merchant(
        &self,
        store_id: &str,
        config: &ActivationConfig,
    ) -> Result<ActivationReceipt> {
        self.record_call("activate_merchant");
        self.activations.lock().unwrap().push(config.clone());
        if !self.activate_delay.is_zero() {
            tokio::time::sleep(self.activate_delay).await;
        }
        match &self.activate_error {
            Some(message) => Err(request_error(500, message)),
            None => Ok(ActivationReceipt {
                store_id: Some(store_id.to_string()),
                message: Some("Merchant activated successfully".to_string()),
                ..ActivationReceipt::default()
            }),
        }
    }

    async fn get_provisioning_status(&self, _store_id: &str) -> Result<Option<ProvisioningRecord>> {
        self.record_call("get_provisioning_status");
        let reply = {
            let mut last = self.last_status.lock().unwrap();
            if let Some(next) = self.statuses.lock().unwrap().pop_front() {
                *last = Some(next);
            }
            last.clone()
        };
        match reply {
            Some(StatusReply::Record(record)) => Ok(Some(record)),
            Some(StatusReply::NotFound) | None => Ok(None),
            Some(StatusReply::Error(status, message)) => Err(request_error(status, &message)),
        }
    }

    async fn retry_provisioning(&self, _store_id: &str) -> Result<()> {
        self.record_call("retry_provisioning");
        match &self.retry_error {
            Some(message) => Err(request_error(500, message)),
            None => Ok(()),
        }
    }
}

fn request_error(status: u16, message: &str) -> AdminApiError {
    match status {
        401 => AdminApiError::Unauthorized {
            message: message.to_string(),
        },
        _ => AdminApiError::Request {
            status,
            message: message.to_string(),
        },
    }
}

pub fn theme(id: &str) -> Theme {
    Theme {
        id: id.to_string(),
        name: format!("Theme {}", id),
        slug: id.to_lowercase(),
        description: None,
    }
}

pub fn plan(id: &str) -> Plan {
    Plan {
        id: id.to_string(),
        name: format!("Plan {}", id),
        slug: id.to_lowercase(),
        description: None,
        price: Some("49.00".to_string()),
        is_popular: false,
    }
}

pub fn record(status: ProvisioningStatus, flags: [bool; 5], percent: u8) -> ProvisioningRecord {
    ProvisioningRecord {
        id: "prov_1".to_string(),
        status,
        workspace_created: flags[0],
        dashboard_created: flags[1],
        website_deployed: flags[2],
        data_initialized: flags[3],
        credentials_sent: flags[4],
        current_step: String::new(),
        completion_percent: percent,
        error_log: None,
        retry_count: 0,
        started_at: None,
        completed_at: None,
        store: Some(StoreSummary {
            name: "Acme Toys".to_string(),
            subdomain: Some("acme-toys".to_string()),
            ..StoreSummary::default()
        }),
    }
}

pub fn failed(message: &str, retry_count: u32) -> ProvisioningRecord {
    ProvisioningRecord {
        error_log: Some(ErrorLog {
            message: message.to_string(),
            ..ErrorLog::default()
        }),
        retry_count,
        current_step: "DASHBOARD_CREATED".to_string(),
        ..record(ProvisioningStatus::Failed, [true, true, false, false, false], 40)
    }
}

pub fn completed() -> ProvisioningRecord {
    let mut rec = record(ProvisioningStatus::Completed, [true; 5], 100);
    rec.current_step = "COMPLETED".to_string();
    if let Some(store) = rec.store.as_mut() {
        store.deployment = Some(Deployment {
            merchant_id: Some("M-1001".to_string()),
            dashboard_url: "https://dashboard.orbit360.shop/acme-toys".to_string(),
            website_url: "acme-toys.orbit360.shop".to_string(),
        });
    }
    rec
}
