use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::validation::{slugify, validate};
use super::{ActivationAction, ActivationStage, ActivationState, OptimisticProgress};
use crate::api::ProvisioningApi;
use crate::config::ActivationDefaults;
use crate::model::{ActivationReceipt, Integration};

type CompletionCallback = Box<dyn FnMut(&ActivationReceipt) + Send>;

/// Drives the activation dialog: `Config -> Progress -> Success`.
///
/// Closing and reopening is the only way back to `Config`.
pub struct ActivationManager<A: ProvisioningApi> {
    // Current state - single source of truth
    state: ActivationState,

    api: Arc<A>,
    defaults: ActivationDefaults,

    // Action queue for sequential processing
    pending_actions: VecDeque<ActivationAction>,
    is_processing: bool,

    on_complete: Option<CompletionCallback>,
}

impl<A: ProvisioningApi> ActivationManager<A> {
    pub fn new(api: Arc<A>, defaults: ActivationDefaults) -> Self {
        let mut state = ActivationState::default();
        state.optimistic_progress = OptimisticProgress::from_defaults(&defaults);

        Self {
            state,
            api,
            defaults,
            pending_actions: VecDeque::new(),
            is_processing: false,
            on_complete: None,
        }
    }

    /// Called once a submit succeeds, so the caller can refresh its merchant list.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ActivationReceipt) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Synchronous, just queues the action
    pub fn dispatch(&mut self, action: ActivationAction) {
        debug!(action = action.description(), "dispatching");
        self.pending_actions.push_back(action);
    }

    /// Processes one action from the queue
    pub async fn update(&mut self) {
        if self.is_processing {
            return;
        }

        if let Some(action) = self.pending_actions.pop_front() {
            self.is_processing = true;
            debug!(action = action.description(), "processing");

            self.handle_action(action).await;

            self.is_processing = false;
        }
    }

    /// Processes everything queued so far.
    pub async fn drain(&mut self) {
        while !self.pending_actions.is_empty() {
            self.update().await;
        }
    }

    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    pub fn has_pending_actions(&self) -> bool {
        !self.pending_actions.is_empty() || self.is_processing
    }

    pub fn clear_pending_actions(&mut self) {
        self.pending_actions.clear();
    }

    /// Store id to hand to the status poller once activation has been accepted.
    pub fn handoff(&self) -> Option<&str> {
        match self.state.stage {
            ActivationStage::Success => self.state.store_id.as_deref(),
            _ => None,
        }
    }

    async fn handle_action(&mut self, action: ActivationAction) {
        if !matches!(action, ActivationAction::ClearErrors) {
            self.state.validation_errors.clear();
        }

        if action.edits_form() && !self.accepts_edits() {
            return;
        }

        match action {
            ActivationAction::Open { store_id, business_name } => {
                self.handle_open(store_id, business_name).await;
            }
            ActivationAction::Close => {
                self.handle_close();
            }
            ActivationAction::SelectTheme { theme_id } => {
                self.state.form.theme_id = theme_id;
            }
            ActivationAction::SelectPlan { plan_id } => {
                self.state.form.plan_id = plan_id;
            }
            ActivationAction::SetSubdomain { subdomain } => {
                self.state.form.subdomain = subdomain;
            }
            ActivationAction::SetCustomDomain { domain } => {
                self.state.form.custom_domain = domain;
            }
            ActivationAction::SetCategory { category } => {
                self.state.form.category = category;
            }
            ActivationAction::ToggleIntegration { integration, enabled } => {
                self.handle_toggle_integration(integration, enabled);
            }
            ActivationAction::Submit => {
                self.handle_submit().await;
            }
            ActivationAction::ClearErrors => {
                self.state.clear_errors();
            }
        }
    }

    fn accepts_edits(&mut self) -> bool {
        if !self.state.is_open {
            self.state.add_error("Activation dialog is not open".to_string());
            return false;
        }
        if self.state.stage != ActivationStage::Config {
            self.state
                .add_error("Activation already submitted; close the dialog to start over".to_string());
            return false;
        }
        true
    }
}

// Action handler implementations
impl<A: ProvisioningApi> ActivationManager<A> {
    async fn handle_open(&mut self, store_id: String, business_name: String) {
        // Every open starts from a fresh form.
        self.reset();
        self.state.is_open = true;
        self.state.form.subdomain = slugify(&business_name);
        self.state.form.category = self.defaults.default_category.clone();
        self.state.store_id = Some(store_id.clone());
        self.state.business_name = business_name;
        self.state.set_loading(true);

        let (themes, plans) = tokio::join!(self.api.get_themes(), self.api.get_plans());

        match (themes, plans) {
            (Ok(themes), Ok(plans)) => {
                if let Some(first) = themes.first() {
                    self.state.form.theme_id = first.id.clone();
                }
                if let Some(first) = plans.first() {
                    self.state.form.plan_id = first.id.clone();
                }
                info!(
                    %store_id,
                    themes = themes.len(),
                    plans = plans.len(),
                    "activation options loaded"
                );
                self.state.themes = themes;
                self.state.plans = plans;
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(%store_id, error = %e, "failed to load themes and plans");
                self.state
                    .add_error(format!("Failed to load themes and plans: {}", e));
            }
        }

        self.state.set_loading(false);
    }

    fn handle_close(&mut self) {
        if self.state.stage == ActivationStage::Progress && self.state.is_loading {
            warn!("closing dialog while activation is in flight; the backend job continues");
        }
        self.reset();
        info!("activation dialog closed");
    }

    fn handle_toggle_integration(&mut self, integration: Integration, enabled: bool) {
        self.state.form.integrations.set(integration, enabled);
        debug!(%integration, enabled, "integration toggled");
    }

    async fn handle_submit(&mut self) {
        if !self.state.is_open {
            self.state.add_error("Activation dialog is not open".to_string());
            return;
        }
        if self.state.stage != ActivationStage::Config {
            self.state
                .add_error("Activation already submitted; close the dialog to start over".to_string());
            return;
        }

        if let Err(issues) = validate(&self.state.form) {
            self.state.validation_errors = issues.iter().map(|i| i.to_string()).collect();
            warn!(issues = ?issues, "activation form incomplete");
            return;
        }

        let Some(store_id) = self.state.store_id.clone() else {
            self.state.add_error("No merchant selected".to_string());
            return;
        };

        self.state.errors.clear();
        self.state.stage = ActivationStage::Progress;
        self.state.status_text = "Configuring store resources...".to_string();
        self.state.optimistic_progress.begin();
        self.state.set_loading(true);
        info!(%store_id, theme = %self.state.form.theme_id, plan = %self.state.form.plan_id, "submitting activation");

        let config = self.state.form.clone();
        let api = Arc::clone(&self.api);
        let request = api.activate_merchant(&store_id, &config);
        tokio::pin!(request);

        let period = self.defaults.ramp_interval().max(Duration::from_millis(1));
        let mut ramp = tokio::time::interval(period);
        // The first tick completes immediately.
        ramp.tick().await;

        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                _ = ramp.tick() => self.state.optimistic_progress.advance(),
            }
        };

        self.state.set_loading(false);

        match result {
            Ok(receipt) => {
                self.state.optimistic_progress.complete();
                self.state.status_text = "Ready to go live!".to_string();
                self.state.stage = ActivationStage::Success;
                info!(%store_id, "activation accepted, provisioning in progress");

                if let Some(callback) = self.on_complete.as_mut() {
                    callback(&receipt);
                }
                self.state.receipt = Some(receipt);
            }
            Err(e) => {
                error!(%store_id, error = %e, "activation failed");
                let message = if e.is_unauthorized() {
                    format!("{} (session expired, log in again)", e)
                } else {
                    e.to_string()
                };
                self.state.status_text = message.clone();
                self.state.add_error(message);
            }
        }
    }

    fn reset(&mut self) {
        self.state = ActivationState {
            optimistic_progress: OptimisticProgress::from_defaults(&self.defaults),
            ..ActivationState::default()
        };
    }
}
