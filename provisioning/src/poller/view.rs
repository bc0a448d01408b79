//! Plain-text rendering of a provisioning record for the terminal.

use std::fmt;

use super::state::{PollerState, StatusView};
use crate::model::{ProvisioningRecord, ProvisioningStatus, ProvisioningStep};

const BAR_WIDTH: usize = 30;

pub fn progress_bar(percent: u8) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Website URLs are stored without a scheme.
pub fn website_link(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusView::Loading => writeln!(f, "Loading provisioning status..."),
            StatusView::NotActivated => {
                writeln!(f, "No provisioning data available")?;
                writeln!(f, "This merchant has not been activated yet")
            }
            StatusView::Record(record) => render_record(f, record),
        }
    }
}

fn render_record(f: &mut fmt::Formatter<'_>, record: &ProvisioningRecord) -> fmt::Result {
    let store_name = record.store.as_ref().map(|s| s.name.as_str()).unwrap_or("");
    writeln!(f, "Provisioning Status: {}", record.status)?;
    if !store_name.is_empty() || !record.current_step.is_empty() {
        writeln!(f, "{} - {}", store_name, record.current_step)?;
    }
    writeln!(f)?;
    writeln!(f, "Overall Progress {}", progress_bar(record.completion_percent))?;
    writeln!(f)?;

    for step in ProvisioningStep::ALL {
        let mark = if record.is_step_complete(step) { "x" } else { " " };
        writeln!(f, "  [{}] {}", mark, step.label())?;
    }

    if let Some(message) = record.error_message() {
        writeln!(f)?;
        writeln!(f, "Provisioning Error: {}", message)?;
        if record.retry_count > 0 {
            writeln!(f, "Retry attempts: {}", record.retry_count)?;
        }
    }

    if record.status == ProvisioningStatus::Completed {
        if let Some(deployment) = record.deployment() {
            writeln!(f)?;
            writeln!(f, "Provisioning Completed")?;
            if let Some(merchant_id) = &deployment.merchant_id {
                writeln!(f, "  Merchant ID: {}", merchant_id)?;
            }
            writeln!(f, "  Dashboard:   {}", deployment.dashboard_url)?;
            writeln!(f, "  Website:     {}", website_link(&deployment.website_url))?;

            if let Some(store) = &record.store {
                if let Some(theme) = &store.theme {
                    writeln!(f, "  Theme:       {}", theme.name)?;
                }
                if let Some(plan) = &store.plan {
                    match &plan.price {
                        Some(price) => writeln!(f, "  Plan:        {} (${}/mo)", plan.name, price)?,
                        None => writeln!(f, "  Plan:        {}", plan.name)?,
                    }
                }
            }
        }
    }

    if let Some(started) = record.started_at {
        writeln!(f)?;
        writeln!(f, "Started:   {}", started.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    if let Some(completed) = record.completed_at {
        writeln!(f, "Completed: {}", completed.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }

    Ok(())
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.view)?;
        if self.can_retry() {
            writeln!(f, "Run `orbit-admin retry <store-id>` to retry provisioning.")?;
        }
        if let Some(error) = &self.last_error {
            writeln!(f, "Last refresh failed: {}", error)?;
        }
        if self.needs_login {
            writeln!(f, "Session expired. Run `orbit-admin login` and try again.")?;
        }
        Ok(())
    }
}
