//! The slice of the admin API that activation and status polling depend on.
//!
//! [`crate::http_client::AdminApiClient`] is the production implementation; tests
//! substitute scripted doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ActivationConfig, ActivationReceipt, Plan, ProvisioningRecord, Theme};

#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    async fn get_themes(&self) -> Result<Vec<Theme>>;

    async fn get_plans(&self) -> Result<Vec<Plan>>;

    /// Start provisioning. The backend creates the record and returns without waiting
    /// for the job to finish.
    async fn activate_merchant(
        &self,
        store_id: &str,
        config: &ActivationConfig,
    ) -> Result<ActivationReceipt>;

    /// `Ok(None)` when the store has never been activated.
    async fn get_provisioning_status(&self, store_id: &str) -> Result<Option<ProvisioningRecord>>;

    async fn retry_provisioning(&self, store_id: &str) -> Result<()>;
}
