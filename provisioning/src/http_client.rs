//! Authenticated HTTP client for the admin backend.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::ProvisioningApi;
use crate::config::ApiConfig;
use crate::credentials::CredentialProvider;
use crate::error::{AdminApiError, Result, GENERIC_FAILURE};
use crate::model::{
    ActivationConfig, ActivationReceipt, LegacyProvisionRequest, LegacyProvisionResponse,
    LoginResponse, PendingMerchant, Plan, ProvisioningRecord, Store, SupportTicket, Theme,
    TicketDetail, TicketFilter, TicketNote,
};

const LOGIN_FAILURE: &str = "Login failed";

/// Whether a request rides on the stored session. Only those drop it on a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Authenticated,
    Anonymous,
}

#[derive(Clone)]
pub struct AdminApiClient {
    base_url: String,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl AdminApiClient {
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        })
    }

    pub fn with_base_url(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        Self::new(&config, credentials)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.get().is_some()
    }

    /// Issue an authenticated request and return the decoded JSON body.
    ///
    /// Non-2xx responses become errors carrying the body's `message` (or `error`) field.
    /// A 401 clears the stored token before returning.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let mut builder = self.builder(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, path, GENERIC_FAILURE, Session::Authenticated).await
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        self.request::<()>(Method::GET, path, None).await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %path, "admin api request");

        let builder = self.client.request(method, url);
        match self.credentials.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        path: &str,
        fallback: &str,
        session: Session,
    ) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(%path, status = status.as_u16(), "admin api response");

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && session == Session::Authenticated {
                warn!(%path, "admin session rejected, clearing token");
                self.credentials.clear();
            }

            let body = response.text().await.unwrap_or_default();
            let message = extract_message(&body, fallback);
            return Err(match status {
                StatusCode::UNAUTHORIZED => AdminApiError::Unauthorized { message },
                StatusCode::NOT_FOUND => AdminApiError::NotFound { message },
                other => AdminApiError::Request {
                    status: other.as_u16(),
                    message,
                },
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

// ============================================
// Session
// ============================================

impl AdminApiClient {
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let path = "/api/admin/auth/login";
        let builder = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&json!({ "email": email, "password": password }));

        // Rejected credentials leave any existing session alone.
        let value = self.send(builder, path, LOGIN_FAILURE, Session::Anonymous).await?;
        let login: LoginResponse = serde_json::from_value(value)?;
        self.credentials.set(login.token.clone());
        info!(%email, "admin logged in");
        Ok(login)
    }

    pub fn logout(&self) {
        self.credentials.clear();
        info!("admin logged out");
    }
}

// ============================================
// Brands and catalogs
// ============================================

impl AdminApiClient {
    pub async fn get_brands(&self, is_active: Option<bool>) -> Result<Vec<Store>> {
        let path = "/api/admin/brands";
        let mut builder = self.builder(Method::GET, path);
        if let Some(active) = is_active {
            builder = builder.query(&[("isActive", active.to_string())]);
        }
        let value = self.send(builder, path, GENERIC_FAILURE, Session::Authenticated).await?;
        unwrap_envelope(value, "stores")
    }

    pub async fn get_brand(&self, brand_id: &str) -> Result<Store> {
        let value = self.get_json(&format!("/api/admin/brands/{}", brand_id)).await?;
        unwrap_envelope(value, "store")
    }

    pub async fn get_pending_merchants(&self) -> Result<Vec<PendingMerchant>> {
        let value = self.get_json("/api/admin/provisioning/pending").await?;
        unwrap_envelope(value, "merchants")
    }

    /// Older activation contract. The orchestrator uses
    /// [`ProvisioningApi::activate_merchant`]; this stays for backends that predate it.
    pub async fn provision_brand(
        &self,
        brand_id: &str,
        request: &LegacyProvisionRequest,
    ) -> Result<LegacyProvisionResponse> {
        let value = self
            .post_json(&format!("/api/admin/brands/{}/provision", brand_id), request)
            .await?;
        reject_unsuccessful(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================
// Support tickets
// ============================================

impl AdminApiClient {
    pub async fn get_tickets(&self, filter: &TicketFilter) -> Result<Vec<SupportTicket>> {
        let path = "/api/admin/tickets";
        let builder = self.builder(Method::GET, path).query(&filter.query_pairs());
        let value = self.send(builder, path, GENERIC_FAILURE, Session::Authenticated).await?;
        unwrap_envelope(value, "tickets")
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> Result<TicketDetail> {
        let value = self.get_json(&format!("/api/admin/tickets/{}", ticket_id)).await?;
        reject_unsuccessful(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn respond_to_ticket(&self, ticket_id: &str, message: &str) -> Result<SupportTicket> {
        let value = self
            .post_json(
                &format!("/api/admin/tickets/{}/respond", ticket_id),
                &json!({ "message": message }),
            )
            .await?;
        unwrap_envelope(value, "ticket")
    }

    pub async fn resolve_ticket(&self, ticket_id: &str) -> Result<SupportTicket> {
        let value = self
            .request::<()>(
                Method::POST,
                &format!("/api/admin/tickets/{}/resolve", ticket_id),
                None,
            )
            .await?;
        unwrap_envelope(value, "ticket")
    }

    pub async fn add_ticket_note(&self, ticket_id: &str, note: &str) -> Result<TicketNote> {
        let value = self
            .post_json(
                &format!("/api/admin/tickets/{}/notes", ticket_id),
                &json!({ "note": note }),
            )
            .await?;
        unwrap_envelope(value, "note")
    }
}

#[async_trait]
impl ProvisioningApi for AdminApiClient {
    async fn get_themes(&self) -> Result<Vec<Theme>> {
        let value = self.get_json("/api/admin/themes").await?;
        unwrap_envelope(value, "themes")
    }

    async fn get_plans(&self) -> Result<Vec<Plan>> {
        let value = self.get_json("/api/admin/plans").await?;
        unwrap_envelope(value, "plans")
    }

    async fn activate_merchant(
        &self,
        store_id: &str,
        config: &ActivationConfig,
    ) -> Result<ActivationReceipt> {
        let value = self
            .post_json(
                &format!("/api/provisioning/merchants/{}/activate", store_id),
                &config.to_request(),
            )
            .await?;
        reject_unsuccessful(&value)?;

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut receipt = match value.get("data") {
            Some(data) if !data.is_null() => serde_json::from_value(data.clone())?,
            _ => ActivationReceipt::default(),
        };
        if receipt.message.is_none() {
            receipt.message = message;
        }
        if receipt.store_id.is_none() {
            receipt.store_id = Some(store_id.to_string());
        }
        info!(%store_id, "merchant activation accepted");
        Ok(receipt)
    }

    async fn get_provisioning_status(&self, store_id: &str) -> Result<Option<ProvisioningRecord>> {
        let path = format!("/api/provisioning/merchants/{}/provisioning-status", store_id);
        let value = match self.get_json(&path).await {
            Ok(value) => value,
            Err(e) if e.is_not_found() => {
                debug!(%store_id, "no provisioning record yet");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if value.get("data").map_or(false, Value::is_null) {
            return Ok(None);
        }
        unwrap_envelope(value, "data").map(Some)
    }

    async fn retry_provisioning(&self, store_id: &str) -> Result<()> {
        let value = self
            .request::<()>(
                Method::POST,
                &format!("/api/provisioning/merchants/{}/retry-provisioning", store_id),
                None,
            )
            .await?;
        reject_unsuccessful(&value)?;
        info!(%store_id, "provisioning retry issued");
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
pub fn extract_message(body: &str, fallback: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .filter_map(|key| v.get(*key).and_then(Value::as_str))
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

fn reject_unsuccessful(value: &Value) -> Result<()> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = extract_message(&value.to_string(), GENERIC_FAILURE);
        return Err(AdminApiError::Rejected { message });
    }
    Ok(())
}

/// Unwrap `{success, data}` or an entity-named envelope such as `{themes: [...]}`.
pub fn unwrap_envelope<T: DeserializeOwned>(value: Value, key: &str) -> Result<T> {
    reject_unsuccessful(&value)?;

    let payload = match value {
        Value::Object(mut map) => map
            .remove("data")
            .filter(|v| !v.is_null())
            .or_else(|| map.remove(key)),
        _ => None,
    };

    let payload = payload.ok_or_else(|| AdminApiError::MissingField {
        field: key.to_string(),
    })?;
    Ok(serde_json::from_value(payload)?)
}
