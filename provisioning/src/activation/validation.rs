use crate::error::ValidationIssue;
use crate::model::ActivationConfig;

/// Default subdomain for a business name: lowercase, anything outside `[a-z0-9]` becomes `-`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
        .collect()
}

/// Local checks run before any activation request is sent.
pub fn validate(config: &ActivationConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if config.theme_id.trim().is_empty() {
        issues.push(ValidationIssue::MissingTheme);
    }
    if config.plan_id.trim().is_empty() {
        issues.push(ValidationIssue::MissingPlan);
    }
    if config.subdomain.trim().is_empty() && config.custom_domain.trim().is_empty() {
        issues.push(ValidationIssue::MissingDomain);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
