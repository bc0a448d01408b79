use crate::config::ActivationDefaults;
use crate::model::{ActivationConfig, ActivationReceipt, Plan, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStage {
    Config,
    Progress,
    Success,
}

impl Default for ActivationStage {
    fn default() -> Self {
        Self::Config
    }
}

/// Client-only progress shown while the activate request is in flight.
///
/// Never read from or written to a provisioning record; the server's
/// `completionPercent` is tracked by the poller instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticProgress {
    value: u8,
    start: u8,
    step: u8,
    ceiling: u8,
}

impl OptimisticProgress {
    pub fn new(start: u8, step: u8, ceiling: u8) -> Self {
        let ceiling = ceiling.min(100);
        Self {
            value: 0,
            start: start.min(ceiling),
            step,
            ceiling,
        }
    }

    pub fn from_defaults(defaults: &ActivationDefaults) -> Self {
        Self::new(defaults.ramp_start, defaults.ramp_step, defaults.ramp_ceiling)
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn begin(&mut self) {
        self.value = self.start;
    }

    pub fn advance(&mut self) {
        self.value = self.value.saturating_add(self.step).min(self.ceiling);
    }

    pub fn complete(&mut self) {
        self.value = 100;
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

impl Default for OptimisticProgress {
    fn default() -> Self {
        Self::from_defaults(&ActivationDefaults::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivationState {
    // Dialog
    pub is_open: bool,
    pub stage: ActivationStage,
    pub store_id: Option<String>,
    pub business_name: String,

    // Catalogs loaded on open
    pub themes: Vec<Theme>,
    pub plans: Vec<Plan>,

    // Operator input
    pub form: ActivationConfig,

    // Feedback
    pub validation_errors: Vec<String>,
    pub errors: Vec<String>,
    pub status_text: String,
    pub optimistic_progress: OptimisticProgress,
    pub is_loading: bool,

    // Result of a successful submit
    pub receipt: Option<ActivationReceipt>,
}

impl ActivationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_errors(&mut self) {
        self.validation_errors.clear();
        self.errors.clear();
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.validation_errors.is_empty()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn selected_theme(&self) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == self.form.theme_id)
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == self.form.plan_id)
    }

    /// The submit failed and the dialog is waiting to be closed.
    pub fn is_failed(&self) -> bool {
        self.stage == ActivationStage::Progress && !self.is_loading && !self.errors.is_empty()
    }
}
