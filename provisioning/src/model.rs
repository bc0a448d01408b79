use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================
// Provisioning record
// ============================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Rollback,
}

impl ProvisioningStatus {
    /// COMPLETED, FAILED and ROLLBACK do not move again without an explicit retry.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProvisioningStatus::Completed | ProvisioningStatus::Failed | ProvisioningStatus::Rollback
        )
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProvisioningStatus::Pending => "PENDING",
            ProvisioningStatus::InProgress => "IN_PROGRESS",
            ProvisioningStatus::Completed => "COMPLETED",
            ProvisioningStatus::Failed => "FAILED",
            ProvisioningStatus::Rollback => "ROLLBACK",
        }
    }
}

impl fmt::Display for ProvisioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five units of provisioning work, in causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProvisioningStep {
    Workspace,
    Dashboard,
    Website,
    Data,
    Credentials,
}

impl ProvisioningStep {
    pub const ALL: [ProvisioningStep; 5] = [
        ProvisioningStep::Workspace,
        ProvisioningStep::Dashboard,
        ProvisioningStep::Website,
        ProvisioningStep::Data,
        ProvisioningStep::Credentials,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProvisioningStep::Workspace => "Workspace Created",
            ProvisioningStep::Dashboard => "Dashboard Created",
            ProvisioningStep::Website => "Website Deployed",
            ProvisioningStep::Data => "Data Initialized",
            ProvisioningStep::Credentials => "Credentials Sent",
        }
    }

    /// Percent the backend reports once this step lands. Advisory only; completion is
    /// always read from the flags.
    pub fn advisory_percent(self) -> u8 {
        match self {
            ProvisioningStep::Workspace => 25,
            ProvisioningStep::Dashboard => 40,
            ProvisioningStep::Website => 60,
            ProvisioningStep::Data => 80,
            ProvisioningStep::Credentials => 95,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of the five step flags, indexed in causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepFlags([bool; 5]);

impl StepFlags {
    pub fn new(flags: [bool; 5]) -> Self {
        Self(flags)
    }

    pub fn get(&self, step: ProvisioningStep) -> bool {
        self.0[step.index()]
    }

    pub fn completed_count(&self) -> usize {
        self.0.iter().filter(|done| **done).count()
    }

    /// No step is complete while an earlier one is not.
    pub fn is_causally_ordered(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] || !pair[1])
    }

    /// True when some flag that was set in `previous` is unset here.
    pub fn regresses_from(&self, previous: &StepFlags) -> bool {
        self.0
            .iter()
            .zip(previous.0.iter())
            .any(|(now, before)| *before && !*now)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLog {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[serde(default)]
    pub merchant_id: Option<String>,
    pub dashboard_url: String,
    pub website_url: String,
}

/// Denormalized store data on a provisioning record, filled in as steps land.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub theme: Option<ThemeSummary>,
    #[serde(default)]
    pub plan: Option<PlanSummary>,
    #[serde(default)]
    pub deployment: Option<Deployment>,
}

/// Backend-owned record of one store's provisioning job. Read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRecord {
    pub id: String,
    pub status: ProvisioningStatus,
    #[serde(default)]
    pub workspace_created: bool,
    #[serde(default)]
    pub dashboard_created: bool,
    #[serde(default)]
    pub website_deployed: bool,
    #[serde(default)]
    pub data_initialized: bool,
    #[serde(default)]
    pub credentials_sent: bool,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub completion_percent: u8,
    #[serde(default)]
    pub error_log: Option<ErrorLog>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub store: Option<StoreSummary>,
}

impl ProvisioningRecord {
    pub fn flags(&self) -> StepFlags {
        StepFlags([
            self.workspace_created,
            self.dashboard_created,
            self.website_deployed,
            self.data_initialized,
            self.credentials_sent,
        ])
    }

    pub fn is_step_complete(&self, step: ProvisioningStep) -> bool {
        self.flags().get(step)
    }

    /// Error text for a failed job. Only meaningful when the status is FAILED.
    pub fn error_message(&self) -> Option<&str> {
        if self.status != ProvisioningStatus::Failed {
            return None;
        }
        match &self.error_log {
            Some(log) if !log.message.is_empty() => Some(log.message.as_str()),
            _ => Some("An unknown error occurred"),
        }
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.store.as_ref().and_then(|s| s.deployment.as_ref())
    }
}

// ============================================
// Activation
// ============================================

/// The fixed set of integrations an operator can enable at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integration {
    Meta,
    Stripe,
    Payu,
    Cashfree,
    Razorpay,
    Phonepe,
    Analytics,
}

impl Integration {
    pub const ALL: [Integration; 7] = [
        Integration::Meta,
        Integration::Stripe,
        Integration::Payu,
        Integration::Cashfree,
        Integration::Razorpay,
        Integration::Phonepe,
        Integration::Analytics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Integration::Meta => "meta",
            Integration::Stripe => "stripe",
            Integration::Payu => "payu",
            Integration::Cashfree => "cashfree",
            Integration::Razorpay => "razorpay",
            Integration::Phonepe => "phonepe",
            Integration::Analytics => "analytics",
        }
    }
}

impl FromStr for Integration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Integration::ALL
            .into_iter()
            .find(|i| i.name() == wanted)
            .ok_or_else(|| format!("unknown integration '{}'", s))
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Integrations {
    pub meta: bool,
    pub stripe: bool,
    pub payu: bool,
    pub cashfree: bool,
    pub razorpay: bool,
    pub phonepe: bool,
    pub analytics: bool,
}

impl Integrations {
    pub fn get(&self, integration: Integration) -> bool {
        match integration {
            Integration::Meta => self.meta,
            Integration::Stripe => self.stripe,
            Integration::Payu => self.payu,
            Integration::Cashfree => self.cashfree,
            Integration::Razorpay => self.razorpay,
            Integration::Phonepe => self.phonepe,
            Integration::Analytics => self.analytics,
        }
    }

    pub fn set(&mut self, integration: Integration, enabled: bool) {
        let slot = match integration {
            Integration::Meta => &mut self.meta,
            Integration::Stripe => &mut self.stripe,
            Integration::Payu => &mut self.payu,
            Integration::Cashfree => &mut self.cashfree,
            Integration::Razorpay => &mut self.razorpay,
            Integration::Phonepe => &mut self.phonepe,
            Integration::Analytics => &mut self.analytics,
        };
        *slot = enabled;
    }

    pub fn enabled(&self) -> Vec<Integration> {
        Integration::ALL
            .into_iter()
            .filter(|i| self.get(*i))
            .collect()
    }
}

/// Operator-built activation settings. Created per dialog, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationConfig {
    pub theme_id: String,
    pub plan_id: String,
    pub subdomain: String,
    pub custom_domain: String,
    pub category: String,
    pub integrations: Integrations,
}

impl ActivationConfig {
    /// Wire payload; blank optional fields are omitted.
    pub fn to_request(&self) -> ActivateRequest {
        fn non_blank(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        ActivateRequest {
            theme_id: self.theme_id.clone(),
            plan_id: self.plan_id.clone(),
            subdomain: non_blank(&self.subdomain),
            domain: non_blank(&self.custom_domain),
            category: non_blank(&self.category),
            integrations: self.integrations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub theme_id: String,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub integrations: Integrations,
}

/// What the activate endpoint hands back once the job has been accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationReceipt {
    pub store_id: Option<String>,
    pub merchant_id: Option<String>,
    pub dashboard_url: Option<String>,
    pub website_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProvisionRequest {
    pub theme_id: String,
    pub plan_id: String,
    pub subdomain: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProvisionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub dashboard_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

// ============================================
// Catalogs and brands
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub onboarding_status: Option<String>,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingMerchant {
    #[serde(flatten)]
    pub store: Store,
    #[serde(default)]
    pub user: Option<AdminUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// ============================================
// Support tickets
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub store: Option<Store>,
    #[serde(default)]
    pub assigned_admin: Option<AdminUser>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    pub id: String,
    pub sender_type: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketNote {
    pub id: String,
    pub admin_id: String,
    pub note: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketDetail {
    pub ticket: SupportTicket,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default)]
    pub notes: Vec<TicketNote>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub store_id: Option<String>,
    pub assigned_admin_id: Option<String>,
}

impl TicketFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(store_id) = &self.store_id {
            pairs.push(("storeId", store_id.clone()));
        }
        if let Some(admin) = &self.assigned_admin_id {
            pairs.push(("assignedAdminId", admin.clone()));
        }
        pairs
    }
}

/// Prices arrive as decimal strings or as bare numbers depending on the endpoint.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
