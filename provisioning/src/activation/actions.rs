use crate::model::Integration;

#[derive(Debug, Clone)]
pub enum ActivationAction {
    // Dialog lifecycle
    Open { store_id: String, business_name: String },
    Close,

    // Form edits
    SelectTheme { theme_id: String },
    SelectPlan { plan_id: String },
    SetSubdomain { subdomain: String },
    SetCustomDomain { domain: String },
    SetCategory { category: String },
    ToggleIntegration { integration: Integration, enabled: bool },

    Submit,

    ClearErrors,
}

impl ActivationAction {
    pub fn description(&self) -> &'static str {
        match self {
            ActivationAction::Open { .. } => "Opening activation dialog",
            ActivationAction::Close => "Closing activation dialog",
            ActivationAction::SelectTheme { .. } => "Selecting theme",
            ActivationAction::SelectPlan { .. } => "Selecting plan",
            ActivationAction::SetSubdomain { .. } => "Updating subdomain",
            ActivationAction::SetCustomDomain { .. } => "Updating custom domain",
            ActivationAction::SetCategory { .. } => "Updating category",
            ActivationAction::ToggleIntegration { .. } => "Toggling integration",
            ActivationAction::Submit => "Submitting activation",
            ActivationAction::ClearErrors => "Clearing errors",
        }
    }

    /// Actions that edit the form are only valid while the dialog is in `Config`.
    pub fn edits_form(&self) -> bool {
        matches!(
            self,
            ActivationAction::SelectTheme { .. }
                | ActivationAction::SelectPlan { .. }
                | ActivationAction::SetSubdomain { .. }
                | ActivationAction::SetCustomDomain { .. }
                | ActivationAction::SetCategory { .. }
                | ActivationAction::ToggleIntegration { .. }
        )
    }
}
